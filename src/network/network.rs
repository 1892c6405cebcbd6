use std::ops::Range;

#[cfg(feature = "parallel")]
use rayon::prelude::*;
use tracing::{debug, trace};

use crate::batch::{zeroed, SharedErrors};
use crate::error::{check_len, Error, Result, STRICT};
use crate::network::record::NetworkRecord;
use crate::network::schedule::build_waves;
use crate::unit::{Neuron, Unit};

/// A graph of units owned wave by wave.
///
/// The first `input_count` units (by index) are inputs and the last
/// `output_count` units are outputs. Cloning produces a fully independent
/// copy of every unit.
#[derive(Debug, Clone, PartialEq)]
pub struct Network {
    input_count: usize,
    output_count: usize,
    schedule: Vec<Vec<Unit>>,
    // unit index -> (wave, position in wave)
    slots: Vec<(usize, usize)>,
}

impl Network {
    /// Takes ownership of `units` (where `units[i]` has index `i`) and
    /// schedules them.
    pub fn from_units(input_count: usize, output_count: usize, units: Vec<Unit>) -> Result<Network> {
        for (position, unit) in units.iter().enumerate() {
            if unit.index() != position {
                return Err(Error::InvalidIndex {
                    index: unit.index(),
                    reason: "unit index does not match its position",
                });
            }
        }
        if STRICT {
            for neuron in units.iter().filter_map(Unit::as_neuron) {
                neuron.validate()?;
            }
        }
        if input_count + output_count > units.len() {
            return Err(Error::StructuralMismatch {
                what: "input and output units",
                expected: input_count + output_count,
                found: units.len(),
            });
        }

        let waves = build_waves(&units)?;
        let mut network = Network {
            input_count,
            output_count,
            schedule: Vec::new(),
            slots: Vec::new(),
        };
        network.install(units, waves);
        Ok(network)
    }

    /// Moves arena units into their waves and rebuilds the lookup table.
    fn install(&mut self, units: Vec<Unit>, waves: Vec<Vec<usize>>) {
        let mut arena: Vec<Option<Unit>> = units.into_iter().map(Some).collect();
        self.slots = vec![(0, 0); arena.len()];
        self.schedule = waves
            .iter()
            .enumerate()
            .map(|(w, wave)| {
                wave.iter()
                    .enumerate()
                    .filter_map(|(p, &index)| {
                        self.slots[index] = (w, p);
                        arena[index].take()
                    })
                    .collect()
            })
            .collect();
    }

    /// Moves every unit back into an arena ordered by index.
    fn take_units(&mut self) -> Vec<Unit> {
        let mut arena: Vec<Option<Unit>> = (0..self.slots.len()).map(|_| None).collect();
        for unit in std::mem::take(&mut self.schedule).into_iter().flatten() {
            let index = unit.index();
            arena[index] = Some(unit);
        }
        self.slots.clear();
        arena.into_iter().flatten().collect()
    }

    pub fn input_count(&self) -> usize {
        self.input_count
    }

    pub fn output_count(&self) -> usize {
        self.output_count
    }

    pub fn unit_count(&self) -> usize {
        self.slots.len()
    }

    pub fn wave_count(&self) -> usize {
        self.schedule.len()
    }

    pub fn input_indices(&self) -> Range<usize> {
        0..self.input_count
    }

    pub fn output_indices(&self) -> Range<usize> {
        self.unit_count() - self.output_count..self.unit_count()
    }

    /// Unit indices of every wave, in evaluation order.
    pub fn schedule(&self) -> Vec<Vec<usize>> {
        self.schedule
            .iter()
            .map(|wave| wave.iter().map(Unit::index).collect())
            .collect()
    }

    pub fn unit(&self, index: usize) -> Option<&Unit> {
        let &(w, p) = self.slots.get(index)?;
        Some(&self.schedule[w][p])
    }

    /// Mutable access for parameter changes. Use [`connect`](Self::connect)
    /// and [`disconnect`](Self::disconnect) for structural edits so the
    /// schedule stays valid.
    pub fn unit_mut(&mut self, index: usize) -> Option<&mut Unit> {
        let &(w, p) = self.slots.get(index)?;
        Some(&mut self.schedule[w][p])
    }

    pub fn neuron(&self, index: usize) -> Option<&Neuron> {
        self.unit(index).and_then(Unit::as_neuron)
    }

    pub fn neuron_mut(&mut self, index: usize) -> Option<&mut Neuron> {
        self.unit_mut(index).and_then(Unit::as_neuron_mut)
    }

    /// All units in schedule order.
    pub fn units(&self) -> impl Iterator<Item = &Unit> {
        self.schedule.iter().flatten()
    }

    // ── Structure ──────────────────────────────────────────────────────────

    /// Connects `source` into `target` (with a random weight for neurons)
    /// and reschedules. A connection that would close a cycle is rolled back
    /// and reported as [`Error::CyclicDependency`].
    pub fn connect(&mut self, target: usize, source: usize) -> Result<bool> {
        self.restructure(target, source, |unit| unit.add_connection(source))
    }

    /// Like [`connect`](Self::connect) with an explicit weight; `target` must
    /// be a neuron.
    pub fn connect_weighted(&mut self, target: usize, source: usize, weight: f64) -> Result<bool> {
        self.restructure(target, source, |unit| match unit.as_neuron_mut() {
            Some(neuron) => neuron.add_connection_with_weight(source, weight),
            None => Err(Error::InvalidIndex { index: target, reason: "weighted connections need a neuron" }),
        })
    }

    /// Removes the connection from `source` into `target` and reschedules.
    pub fn disconnect(&mut self, target: usize, source: usize) -> Result<bool> {
        self.restructure(target, source, |unit| Ok(unit.remove_connection(source)))
    }

    fn restructure<F>(&mut self, target: usize, source: usize, edit: F) -> Result<bool>
    where
        F: FnOnce(&mut Unit) -> Result<bool>,
    {
        for index in [target, source] {
            if index >= self.unit_count() {
                return Err(Error::InvalidIndex { index, reason: "no such unit" });
            }
        }

        let previous = self.schedule();
        let mut units = self.take_units();
        let changed = match edit(&mut units[target]) {
            Ok(changed) => changed,
            Err(e) => {
                self.install(units, previous);
                return Err(e);
            }
        };
        if !changed {
            self.install(units, previous);
            return Ok(false);
        }

        match build_waves(&units) {
            Ok(waves) => {
                debug!(unit = target, source, waves = waves.len(), "rescheduled after edit");
                self.install(units, waves);
                Ok(true)
            }
            Err(e) => {
                // Only an added connection can close a cycle.
                units[target].remove_connection(source);
                self.install(units, previous);
                Err(e)
            }
        }
    }

    /// Drops every unit and resets the boundary counts.
    pub fn clear(&mut self) {
        self.input_count = 0;
        self.output_count = 0;
        self.schedule.clear();
        self.slots.clear();
    }

    // ── Passes ─────────────────────────────────────────────────────────────

    /// Zeroed buffer with one slot per unit.
    pub fn new_values(&self, batch_size: usize) -> Vec<Vec<f64>> {
        zeroed(self.unit_count(), batch_size)
    }

    /// Evaluates every wave in order. Input slots of `values` must already
    /// hold the batch; every other slot is overwritten.
    pub fn forward(&mut self, values: &mut [Vec<f64>], batch_size: usize) -> Result<()> {
        if STRICT {
            if batch_size == 0 {
                return Err(Error::EmptyBatch);
            }
            check_len("value slots", self.unit_count(), values.len())?;
        }

        for (w, wave) in self.schedule.iter_mut().enumerate() {
            let outputs = evaluate_wave(wave, values, batch_size)?;
            for (unit, output) in wave.iter().zip(outputs) {
                if let Some(output) = output {
                    values[unit.index()] = output;
                }
            }
            trace!(wave = w, units = wave.len(), "forward wave done");
        }
        Ok(())
    }

    /// Runs every wave in reverse order so each unit sees the error from all
    /// of its consumers before it steps. `values` must be the buffer of the
    /// matching forward pass; `errors` ends up all zeros.
    ///
    /// A failure leaves the network partially updated.
    pub fn backward(&mut self, values: &[Vec<f64>], batch_size: usize, errors: &mut [Vec<f64>]) -> Result<()> {
        if STRICT {
            if batch_size == 0 {
                return Err(Error::EmptyBatch);
            }
            check_len("value slots", self.unit_count(), values.len())?;
            check_len("error slots", self.unit_count(), errors.len())?;
        }

        let shared = SharedErrors::new(errors);
        for (w, wave) in self.schedule.iter_mut().enumerate().rev() {
            backward_wave(wave, values, batch_size, &shared)?;
            trace!(wave = w, units = wave.len(), "backward wave done");
        }
        Ok(())
    }

    // ── Sample-major helpers ───────────────────────────────────────────────

    /// Copies sample-major inputs (`samples[s][i]`) into the input slots.
    pub fn load_inputs(&self, values: &mut [Vec<f64>], samples: &[Vec<f64>]) -> Result<()> {
        if STRICT {
            check_len("value slots", self.unit_count(), values.len())?;
            for sample in samples {
                check_len("input sample", self.input_count, sample.len())?;
            }
        }
        for i in self.input_indices() {
            values[i] = samples.iter().map(|sample| sample[i]).collect();
        }
        Ok(())
    }

    /// Reads the output slots back in sample-major order.
    pub fn outputs(&self, values: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let outputs = self.output_indices();
        if STRICT {
            check_len("value slots", self.unit_count(), values.len())?;
        }
        let batch_size = outputs.clone().next().map_or(0, |o| values[o].len());
        if STRICT {
            for o in outputs.clone() {
                check_len("output values", batch_size, values[o].len())?;
            }
        }
        Ok((0..batch_size)
            .map(|s| outputs.clone().map(|o| values[o][s]).collect())
            .collect())
    }

    /// One forward pass over sample-major inputs.
    pub fn predict(&mut self, samples: &[Vec<f64>]) -> Result<Vec<Vec<f64>>> {
        let mut values = self.new_values(samples.len());
        self.load_inputs(&mut values, samples)?;
        self.forward(&mut values, samples.len())?;
        self.outputs(&values)
    }

    // ── Persistence ────────────────────────────────────────────────────────

    /// Copies every unit, in index order, into a serializable record.
    pub fn to_record(&self) -> NetworkRecord {
        let mut units: Vec<Unit> = self.units().cloned().collect();
        units.sort_by_key(Unit::index);
        NetworkRecord {
            input_count: self.input_count,
            output_count: self.output_count,
            units,
        }
    }

    pub fn from_record(record: NetworkRecord) -> Result<Network> {
        Network::from_units(record.input_count, record.output_count, record.units)
    }

    /// Serializes every unit, weights included, to a pretty-printed JSON file.
    pub fn save_json(&self, path: &str) -> Result<()> {
        self.to_record().save_json(path)
    }

    /// Loads a file written by `save_json` and rebuilds the schedule.
    pub fn load_json(path: &str) -> Result<Network> {
        Network::from_record(NetworkRecord::load_json(path)?)
    }
}

#[cfg(feature = "parallel")]
fn evaluate_wave(wave: &mut [Unit], values: &[Vec<f64>], batch_size: usize) -> Result<Vec<Option<Vec<f64>>>> {
    wave.par_iter_mut()
        .map(|unit| unit.evaluate(values, batch_size, &mut rand::thread_rng()))
        .collect()
}

#[cfg(not(feature = "parallel"))]
fn evaluate_wave(wave: &mut [Unit], values: &[Vec<f64>], batch_size: usize) -> Result<Vec<Option<Vec<f64>>>> {
    let mut rng = rand::thread_rng();
    wave.iter_mut()
        .map(|unit| unit.evaluate(values, batch_size, &mut rng))
        .collect()
}

#[cfg(feature = "parallel")]
fn backward_wave(wave: &mut [Unit], values: &[Vec<f64>], batch_size: usize, errors: &SharedErrors<'_>) -> Result<()> {
    wave.par_iter_mut()
        .try_for_each(|unit| unit.backward(values, batch_size, errors))
}

#[cfg(not(feature = "parallel"))]
fn backward_wave(wave: &mut [Unit], values: &[Vec<f64>], batch_size: usize, errors: &SharedErrors<'_>) -> Result<()> {
    wave.iter_mut()
        .try_for_each(|unit| unit.backward(values, batch_size, errors))
}
