use serde::{Serialize, Deserialize};

use crate::batch::SharedErrors;
use crate::error::{check_in_range, check_len, Error, Result, STRICT};
use crate::unit::links::Links;

/// A cell whose values are supplied from outside the network.
///
/// Its forward pass leaves the caller's values in place and its backward
/// pass discards whatever error reached it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InputCell {
    index: usize,
    propagate_further: bool,
    connections: Links<usize>,
}

impl InputCell {
    pub fn new(index: usize) -> InputCell {
        InputCell { index, propagate_further: false, connections: Links::new() }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn propagate_further(&self) -> bool {
        self.propagate_further
    }

    pub fn set_propagate_further(&mut self, propagate_further: bool) {
        self.propagate_further = propagate_further;
    }

    /// Records a dependency on `source`. Returns false if already present.
    pub fn add_connection(&mut self, source: usize) -> Result<bool> {
        if STRICT && source == self.index {
            return Err(Error::InvalidIndex { index: source, reason: "a unit cannot feed itself" });
        }
        Ok(self.connections.insert(source))
    }

    pub fn remove_connection(&mut self, source: usize) -> bool {
        self.connections.remove(source).is_some()
    }

    pub fn can_update(&self, readiness: &[bool]) -> Result<bool> {
        self.connections.can_update(readiness)
    }

    pub fn connections(&self) -> Vec<usize> {
        self.connections.sources().collect()
    }

    /// Checks that the caller filled this cell's slot for the whole batch.
    pub fn forward(&self, values: &[Vec<f64>], batch_size: usize) -> Result<()> {
        if STRICT {
            if batch_size == 0 {
                return Err(Error::EmptyBatch);
            }
            check_in_range(self.index, values.len())?;
            check_len("input values", batch_size, values[self.index].len())?;
        }
        Ok(())
    }

    pub fn backward(&self, batch_size: usize, errors: &SharedErrors<'_>) -> Result<()> {
        if STRICT {
            if batch_size == 0 {
                return Err(Error::EmptyBatch);
            }
            errors.check_slots(std::iter::once(self.index), batch_size)?;
        }
        errors.zero(self.index);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_cell_has_identity_and_no_connections() {
        let cell = InputCell::new(3);
        assert_eq!(cell.index(), 3);
        assert!(!cell.propagate_further());
        assert!(cell.connections().is_empty());
        assert!(cell.can_update(&[false; 4]).unwrap());
    }

    #[test]
    fn connections_stay_sorted() {
        let mut cell = InputCell::new(0);
        assert!(cell.add_connection(4).unwrap());
        assert!(cell.add_connection(6).unwrap());
        assert!(cell.add_connection(1).unwrap());
        assert!(!cell.add_connection(4).unwrap());
        assert_eq!(cell.connections(), vec![1, 4, 6]);

        assert!(cell.remove_connection(4));
        assert_eq!(cell.connections(), vec![1, 6]);
        assert!(!cell.remove_connection(4));
        assert!(cell.remove_connection(6));
        assert!(cell.remove_connection(1));
        assert!(cell.connections().is_empty());
    }

    #[test]
    fn propagate_flag_toggles() {
        let mut cell = InputCell::new(0);
        cell.set_propagate_further(true);
        assert!(cell.propagate_further());
        cell.set_propagate_further(false);
        assert!(!cell.propagate_further());
    }

    #[test]
    fn backward_discards_error() {
        let cell = InputCell::new(1);
        let mut errors = vec![vec![1.0, 1.0], vec![2.0, -3.0]];
        let shared = SharedErrors::new(&mut errors);
        cell.backward(2, &shared).unwrap();
        let errors = shared.into_inner();
        assert_eq!(errors[1], vec![0.0, 0.0]);
        assert_eq!(errors[0], vec![1.0, 1.0]);
    }

    #[cfg(feature = "strict")]
    #[test]
    fn strict_checks() {
        let mut cell = InputCell::new(0);
        assert!(matches!(cell.add_connection(0), Err(Error::InvalidIndex { .. })));
        assert!(cell.add_connection(4).unwrap());
        assert!(matches!(cell.can_update(&[]), Err(Error::IndexOutOfRange { .. })));
        assert!(matches!(cell.forward(&[vec![0.0]], 2), Err(Error::StructuralMismatch { .. })));
        assert!(matches!(cell.forward(&[], 1), Err(Error::IndexOutOfRange { .. })));
    }
}
