use std::ops::Range;

use crate::error::{Error, Result};
use crate::network::network::Network;
use crate::unit::{Neuron, NeuronConfig, Unit};

/// Assembles units into an arena before they are scheduled.
///
/// Inputs must be added before any neuron. The last `output_count` units
/// added become the network's outputs.
pub struct NetworkBuilder {
    config: NeuronConfig,
    units: Vec<Unit>,
    input_count: usize,
    output_count: usize,
}

impl NetworkBuilder {
    pub fn new(config: NeuronConfig) -> NetworkBuilder {
        NetworkBuilder { config, units: Vec::new(), input_count: 0, output_count: 0 }
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }

    pub fn add_input(&mut self) -> Result<usize> {
        if self.input_count != self.units.len() {
            return Err(Error::InvalidIndex {
                index: self.units.len(),
                reason: "inputs must be added before any neuron",
            });
        }
        let index = self.units.len();
        self.units.push(Unit::input(index));
        self.input_count += 1;
        Ok(index)
    }

    /// Adds `count` inputs and returns their index range.
    pub fn add_inputs(&mut self, count: usize) -> Result<Range<usize>> {
        let start = self.units.len();
        for _ in 0..count {
            self.add_input()?;
        }
        Ok(start..self.units.len())
    }

    pub fn add_neuron(&mut self, propagate_further: bool) -> Result<usize> {
        let index = self.units.len();
        self.units.push(Unit::neuron(index, propagate_further, &self.config)?);
        Ok(index)
    }

    /// Adds a prebuilt unit; its index must be the next free position.
    pub fn add_unit(&mut self, unit: Unit) -> Result<usize> {
        let index = self.units.len();
        if unit.index() != index {
            return Err(Error::InvalidIndex { index: unit.index(), reason: "expected the next free index" });
        }
        if matches!(unit, Unit::Input(_)) {
            if self.input_count != index {
                return Err(Error::InvalidIndex { index, reason: "inputs must be added before any neuron" });
            }
            self.input_count += 1;
        }
        self.units.push(unit);
        Ok(index)
    }

    pub fn unit_mut(&mut self, index: usize) -> Option<&mut Unit> {
        self.units.get_mut(index)
    }

    pub fn neuron_mut(&mut self, index: usize) -> Option<&mut Neuron> {
        self.units.get_mut(index).and_then(Unit::as_neuron_mut)
    }

    /// Connects `source` into `target`, drawing the weight at random for
    /// neurons.
    pub fn connect(&mut self, target: usize, source: usize) -> Result<bool> {
        self.check_pair(target, source)?;
        self.units[target].add_connection(source)
    }

    pub fn connect_weighted(&mut self, target: usize, source: usize, weight: f64) -> Result<bool> {
        self.check_pair(target, source)?;
        match self.units[target].as_neuron_mut() {
            Some(neuron) => neuron.add_connection_with_weight(source, weight),
            None => Err(Error::InvalidIndex { index: target, reason: "weighted connections need a neuron" }),
        }
    }

    fn check_pair(&self, target: usize, source: usize) -> Result<()> {
        for index in [target, source] {
            if index >= self.units.len() {
                return Err(Error::InvalidIndex { index, reason: "no such unit" });
            }
        }
        Ok(())
    }

    /// Marks the last `count` units as outputs.
    pub fn set_output_count(&mut self, count: usize) {
        self.output_count = count;
    }

    /// Appends fully connected neuron layers of the given sizes after the
    /// current units and makes the last layer the outputs. The first layer
    /// is fed by the inputs and does not propagate error further.
    pub fn dense_layers(&mut self, sizes: &[usize]) -> Result<()> {
        let mut previous = 0..self.units.len();
        for (l, &size) in sizes.iter().enumerate() {
            let start = self.units.len();
            for _ in 0..size {
                let index = self.add_neuron(l > 0)?;
                for source in previous.clone() {
                    self.connect(index, source)?;
                }
            }
            previous = start..self.units.len();
        }
        self.output_count = previous.len();
        Ok(())
    }

    /// Schedules the units and hands them to a [`Network`].
    pub fn build(self) -> Result<Network> {
        Network::from_units(self.input_count, self.output_count, self.units)
    }
}
