use serde::{Serialize, Deserialize};

use crate::error::Result;
use crate::unit::Unit;

/// A serializable snapshot of a network: its boundary counts plus every unit
/// in index order.
///
/// The schedule is not stored; it is derived again from the connections
/// when the record is turned back into a [`Network`](crate::Network).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub input_count: usize,
    pub output_count: usize,
    pub units: Vec<Unit>,
}

impl NetworkRecord {
    /// Serializes the record to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    /// Deserializes a record from a JSON file.
    pub fn load_json(path: &str) -> Result<NetworkRecord> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}
