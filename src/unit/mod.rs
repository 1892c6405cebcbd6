pub mod config;
pub mod input;
pub mod links;
pub mod neuron;

use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::batch::SharedErrors;
use crate::error::Result;

pub use config::NeuronConfig;
pub use input::InputCell;
pub use links::{Link, Links, Synapse};
pub use neuron::Neuron;

/// A node of the computation graph.
///
/// Units are stored by value and refer to each other only by index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Unit {
    Input(InputCell),
    Neuron(Neuron),
}

impl Unit {
    pub fn input(index: usize) -> Unit {
        Unit::Input(InputCell::new(index))
    }

    pub fn neuron(index: usize, propagate_further: bool, config: &NeuronConfig) -> Result<Unit> {
        Neuron::new(index, propagate_further, config).map(Unit::Neuron)
    }

    pub fn index(&self) -> usize {
        match self {
            Unit::Input(cell) => cell.index(),
            Unit::Neuron(neuron) => neuron.index(),
        }
    }

    pub fn propagate_further(&self) -> bool {
        match self {
            Unit::Input(cell) => cell.propagate_further(),
            Unit::Neuron(neuron) => neuron.propagate_further(),
        }
    }

    pub fn set_propagate_further(&mut self, propagate_further: bool) {
        match self {
            Unit::Input(cell) => cell.set_propagate_further(propagate_further),
            Unit::Neuron(neuron) => neuron.set_propagate_further(propagate_further),
        }
    }

    /// Upstream unit indices in ascending order.
    pub fn connections(&self) -> Vec<usize> {
        match self {
            Unit::Input(cell) => cell.connections(),
            Unit::Neuron(neuron) => neuron.connections(),
        }
    }

    pub fn add_connection(&mut self, source: usize) -> Result<bool> {
        match self {
            Unit::Input(cell) => cell.add_connection(source),
            Unit::Neuron(neuron) => neuron.add_connection(source),
        }
    }

    pub fn remove_connection(&mut self, source: usize) -> bool {
        match self {
            Unit::Input(cell) => cell.remove_connection(source),
            Unit::Neuron(neuron) => neuron.remove_connection(source),
        }
    }

    pub fn can_update(&self, readiness: &[bool]) -> Result<bool> {
        match self {
            Unit::Input(cell) => cell.can_update(readiness),
            Unit::Neuron(neuron) => neuron.can_update(readiness),
        }
    }

    /// Runs the unit's forward step, writing its output into its own slot.
    pub fn forward(&mut self, values: &mut [Vec<f64>], batch_size: usize) -> Result<()> {
        match self {
            Unit::Input(cell) => cell.forward(values, batch_size),
            Unit::Neuron(neuron) => neuron.forward(values, batch_size),
        }
    }

    /// Computes the unit's output without writing it. `None` means the unit
    /// does not produce values of its own.
    pub fn evaluate<R: Rng + ?Sized>(
        &mut self,
        values: &[Vec<f64>],
        batch_size: usize,
        rng: &mut R,
    ) -> Result<Option<Vec<f64>>> {
        match self {
            Unit::Input(cell) => cell.forward(values, batch_size).map(|()| None),
            Unit::Neuron(neuron) => neuron.evaluate(values, batch_size, rng).map(Some),
        }
    }

    pub fn backward(&mut self, values: &[Vec<f64>], batch_size: usize, errors: &SharedErrors<'_>) -> Result<()> {
        match self {
            Unit::Input(cell) => cell.backward(batch_size, errors),
            Unit::Neuron(neuron) => neuron.backward(values, batch_size, errors),
        }
    }

    pub fn as_neuron(&self) -> Option<&Neuron> {
        match self {
            Unit::Neuron(neuron) => Some(neuron),
            Unit::Input(_) => None,
        }
    }

    pub fn as_neuron_mut(&mut self) -> Option<&mut Neuron> {
        match self {
            Unit::Neuron(neuron) => Some(neuron),
            Unit::Input(_) => None,
        }
    }
}
