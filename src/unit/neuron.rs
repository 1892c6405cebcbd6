use rand::Rng;
use serde::{Serialize, Deserialize};

use crate::activation::{ActivationFunction, DerivativeInput};
use crate::batch::SharedErrors;
use crate::error::{check_in_range, check_len, Error, Result, STRICT};
use crate::unit::config::{non_negative, unit_interval, weight_range, NeuronConfig};
use crate::unit::links::{Links, Synapse};

/// A cell that computes `activation(bias + Σ weight·input)` over a batch and
/// learns its weights with momentum and weight decay.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Neuron {
    index: usize,
    propagate_further: bool,
    synapses: Links<Synapse>,
    bias: f64,
    previous_bias_delta: f64,
    learning_rate: f64,
    momentum: f64,
    weight_decay: f64,
    dropout_rate: f64,
    min_start_weight: f64,
    max_start_weight: f64,
    activation: ActivationFunction,
    // Pre-activation sums of the last forward pass; only filled for
    // activations whose derivative needs the raw input.
    #[serde(skip)]
    raw_pre_activation: Vec<f64>,
}

impl Neuron {
    /// Creates a neuron with no connections and a bias drawn uniformly from
    /// the configured start-weight range.
    pub fn new(index: usize, propagate_further: bool, config: &NeuronConfig) -> Result<Neuron> {
        if STRICT {
            config.validate()?;
        }
        let activation = config.activation_function()?;
        let bias = rand::thread_rng().gen_range(config.min_start_weight..=config.max_start_weight);

        Ok(Neuron {
            index,
            propagate_further,
            synapses: Links::new(),
            bias,
            previous_bias_delta: 0.0,
            learning_rate: config.learning_rate,
            momentum: config.momentum,
            weight_decay: config.weight_decay,
            dropout_rate: config.dropout_rate,
            min_start_weight: config.min_start_weight,
            max_start_weight: config.max_start_weight,
            activation,
            raw_pre_activation: Vec::new(),
        })
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

    // ── Connections ────────────────────────────────────────────────────────

    /// Adds a connection from `source` with a weight drawn uniformly from the
    /// start-weight range. Returns false if the connection already exists.
    pub fn add_connection(&mut self, source: usize) -> Result<bool> {
        if self.synapses.contains(source) {
            return Ok(false);
        }
        let weight = rand::thread_rng().gen_range(self.min_start_weight..=self.max_start_weight);
        self.add_connection_with_weight(source, weight)
    }

    /// Adds a connection from `source` with an explicit weight and a zero
    /// momentum memory. Returns false, changing nothing, if it already exists.
    pub fn add_connection_with_weight(&mut self, source: usize, weight: f64) -> Result<bool> {
        if STRICT && source == self.index {
            return Err(Error::InvalidIndex { index: source, reason: "a unit cannot feed itself" });
        }
        Ok(self.synapses.insert(Synapse::new(source, weight)))
    }

    /// Removes the connection from `source` together with its weight and
    /// momentum memory.
    pub fn remove_connection(&mut self, source: usize) -> bool {
        self.synapses.remove(source).is_some()
    }

    pub fn can_update(&self, readiness: &[bool]) -> Result<bool> {
        self.synapses.can_update(readiness)
    }

    pub fn connections(&self) -> Vec<usize> {
        self.synapses.sources().collect()
    }

    pub fn synapses(&self) -> &Links<Synapse> {
        &self.synapses
    }

    // ── Parameters ─────────────────────────────────────────────────────────

    /// Weights in connection order.
    pub fn weights(&self) -> Vec<f64> {
        self.synapses.iter().map(|s| s.weight).collect()
    }

    pub fn weight(&self, source: usize) -> Option<f64> {
        self.synapses.get(source).map(|s| s.weight)
    }

    /// Overwrites the weight of an existing connection. Returns false if there
    /// is no connection from `source`.
    pub fn set_weight(&mut self, source: usize, weight: f64) -> bool {
        match self.synapses.get_mut(source) {
            Some(synapse) => {
                synapse.weight = weight;
                true
            }
            None => false,
        }
    }

    /// Replaces all weights; `weights` must be in connection order.
    pub fn set_weights(&mut self, weights: &[f64]) -> Result<()> {
        if STRICT {
            check_len("weights", self.synapses.len(), weights.len())?;
        }
        for (synapse, &w) in self.synapses.iter_mut().zip(weights) {
            synapse.weight = w;
        }
        Ok(())
    }

    /// Momentum memory of every weight, in connection order.
    pub fn previous_weight_deltas(&self) -> Vec<f64> {
        self.synapses.iter().map(|s| s.previous_delta).collect()
    }

    pub fn set_previous_weight_deltas(&mut self, deltas: &[f64]) -> Result<()> {
        if STRICT {
            check_len("previous weight deltas", self.synapses.len(), deltas.len())?;
        }
        for (synapse, &d) in self.synapses.iter_mut().zip(deltas) {
            synapse.previous_delta = d;
        }
        Ok(())
    }

    pub fn bias(&self) -> f64 {
        self.bias
    }

    pub fn set_bias(&mut self, bias: f64) {
        self.bias = bias;
    }

    pub fn previous_bias_delta(&self) -> f64 {
        self.previous_bias_delta
    }

    pub fn set_previous_bias_delta(&mut self, delta: f64) {
        self.previous_bias_delta = delta;
    }

    pub fn learning_rate(&self) -> f64 {
        self.learning_rate
    }

    pub fn set_learning_rate(&mut self, learning_rate: f64) -> Result<()> {
        if STRICT {
            non_negative("learning_rate", learning_rate)?;
        }
        self.learning_rate = learning_rate;
        Ok(())
    }

    pub fn momentum(&self) -> f64 {
        self.momentum
    }

    pub fn set_momentum(&mut self, momentum: f64) -> Result<()> {
        if STRICT {
            non_negative("momentum", momentum)?;
        }
        self.momentum = momentum;
        Ok(())
    }

    pub fn weight_decay(&self) -> f64 {
        self.weight_decay
    }

    pub fn set_weight_decay(&mut self, weight_decay: f64) -> Result<()> {
        if STRICT {
            non_negative("weight_decay", weight_decay)?;
        }
        self.weight_decay = weight_decay;
        Ok(())
    }

    pub fn dropout_rate(&self) -> f64 {
        self.dropout_rate
    }

    pub fn set_dropout_rate(&mut self, dropout_rate: f64) -> Result<()> {
        if STRICT {
            unit_interval("dropout_rate", dropout_rate)?;
        }
        self.dropout_rate = dropout_rate;
        Ok(())
    }

    pub fn activation(&self) -> ActivationFunction {
        self.activation
    }

    /// Switches the activation. Any stored pre-activation sums are dropped,
    /// so a forward pass must run before the next backward pass.
    pub fn set_activation(&mut self, activation: ActivationFunction) {
        self.activation = activation;
        self.raw_pre_activation.clear();
    }

    pub fn raw_pre_activation(&self) -> &[f64] {
        &self.raw_pre_activation
    }

    /// Range checks for a neuron that did not come through [`Neuron::new`],
    /// such as one read back from JSON.
    pub fn validate(&self) -> Result<()> {
        non_negative("learning_rate", self.learning_rate)?;
        non_negative("momentum", self.momentum)?;
        non_negative("weight_decay", self.weight_decay)?;
        unit_interval("dropout_rate", self.dropout_rate)?;
        weight_range(self.min_start_weight, self.max_start_weight)?;
        if self.synapses.contains(self.index) {
            return Err(Error::InvalidIndex { index: self.index, reason: "a unit cannot feed itself" });
        }
        Ok(())
    }

    // ── Forward ────────────────────────────────────────────────────────────

    /// Computes this neuron's batch output and stores it in its own slot of
    /// `values`.
    pub fn forward(&mut self, values: &mut [Vec<f64>], batch_size: usize) -> Result<()> {
        let output = self.evaluate(values, batch_size, &mut rand::thread_rng())?;
        values[self.index] = output;
        Ok(())
    }

    /// Computes the batch output without writing it anywhere.
    ///
    /// Dropout zeroes each sample with probability `dropout_rate`; surviving
    /// samples are not rescaled.
    pub fn evaluate<R: Rng + ?Sized>(
        &mut self,
        values: &[Vec<f64>],
        batch_size: usize,
        rng: &mut R,
    ) -> Result<Vec<f64>> {
        if STRICT {
            self.check_forward(values, batch_size)?;
        }

        let mut output = vec![self.bias; batch_size];
        for synapse in &self.synapses {
            add_scaled(&mut output, &values[synapse.source], synapse.weight);
        }

        if self.activation.needs_raw_input() {
            self.raw_pre_activation.clone_from(&output);
        }
        for v in output.iter_mut() {
            *v = self.activation.function(*v);
        }

        if self.dropout_rate > 0.0 {
            for v in output.iter_mut() {
                if rng.gen::<f64>() < self.dropout_rate {
                    *v = 0.0;
                }
            }
        }

        Ok(output)
    }

    fn check_forward(&self, values: &[Vec<f64>], batch_size: usize) -> Result<()> {
        if batch_size == 0 {
            return Err(Error::EmptyBatch);
        }
        check_in_range(self.index, values.len())?;
        for source in self.synapses.sources() {
            check_in_range(source, values.len())?;
            check_len("input values", batch_size, values[source].len())?;
        }
        Ok(())
    }

    // ── Backward ───────────────────────────────────────────────────────────

    /// Consumes this neuron's accumulated error: updates bias and weights,
    /// pushes error onto upstream slots when `propagate_further` is set, and
    /// leaves its own error slot zeroed.
    ///
    /// `values` must still hold the outputs of the forward pass this error
    /// belongs to.
    pub fn backward(
        &mut self,
        values: &[Vec<f64>],
        batch_size: usize,
        errors: &SharedErrors<'_>,
    ) -> Result<()> {
        if STRICT {
            self.check_backward(values, batch_size, errors)?;
        }

        if self.synapses.is_empty() {
            errors.zero(self.index);
            return Ok(());
        }

        let own_error = errors.slot(self.index);
        let derivative_input: &[f64] = match self.activation.derivative_input() {
            DerivativeInput::Output => &values[self.index],
            DerivativeInput::Raw => &self.raw_pre_activation,
        };
        // error · f'(·) per sample, shared by the gradient and the propagated error.
        let delta: Vec<f64> = own_error
            .iter()
            .zip(derivative_input)
            .map(|(e, &x)| e * self.activation.derivative(x))
            .collect();
        let n = batch_size as f64;

        self.previous_bias_delta =
            self.momentum * self.previous_bias_delta + self.learning_rate * (own_error.iter().sum::<f64>() / n);
        self.previous_bias_delta -= self.weight_decay * self.bias;
        self.bias += self.previous_bias_delta;

        let mut outgoing = Vec::with_capacity(if self.propagate_further { self.synapses.len() } else { 0 });
        for synapse in self.synapses.iter_mut() {
            let upstream = &values[synapse.source];
            let gradient = delta.iter().zip(upstream).map(|(d, v)| d * v).sum::<f64>() / n;

            if self.propagate_further {
                outgoing.push((synapse.source, delta.iter().map(|d| d * synapse.weight).collect()));
            }

            synapse.previous_delta = self.momentum * synapse.previous_delta + self.learning_rate * gradient;
            synapse.previous_delta -= self.weight_decay * synapse.weight;
            synapse.weight += synapse.previous_delta;
        }

        errors.commit(self.index, &outgoing);
        Ok(())
    }

    fn check_backward(&self, values: &[Vec<f64>], batch_size: usize, errors: &SharedErrors<'_>) -> Result<()> {
        if batch_size == 0 {
            return Err(Error::EmptyBatch);
        }
        check_len("error slots", values.len(), errors.len())?;
        check_in_range(self.index, values.len())?;
        errors.check_slots(std::iter::once(self.index), batch_size)?;
        if self.synapses.is_empty() {
            return Ok(());
        }

        match self.activation.derivative_input() {
            DerivativeInput::Output => check_len("own values", batch_size, values[self.index].len())?,
            DerivativeInput::Raw => check_len("pre-activation sums", batch_size, self.raw_pre_activation.len())?,
        }
        for source in self.synapses.sources() {
            check_in_range(source, values.len())?;
            check_len("input values", batch_size, values[source].len())?;
        }
        errors.check_slots(self.synapses.sources(), batch_size)?;
        Ok(())
    }
}

/// `target[s] += source[s] * scale` for every sample.
fn add_scaled(target: &mut [f64], source: &[f64], scale: f64) {
    for (t, s) in target.iter_mut().zip(source) {
        *t += s * scale;
    }
}
