use serde::{Serialize, Deserialize};

use crate::activation::ActivationFunction;
use crate::error::{Error, Result};

/// Hyperparameters a neuron is created with.
///
/// Every field has a default, so a JSON file only needs to name the values
/// it changes:
///
/// ```json
/// { "learning_rate": 0.05, "activation": "tanh" }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeuronConfig {
    pub learning_rate: f64,
    pub momentum: f64,
    pub weight_decay: f64,
    /// Probability in [0, 1] that a sample's output is forced to zero.
    pub dropout_rate: f64,
    /// Lower bound for randomly drawn initial weights and bias.
    pub min_start_weight: f64,
    /// Upper bound for randomly drawn initial weights and bias.
    pub max_start_weight: f64,
    /// Registry name of the activation function.
    pub activation: String,
}

impl Default for NeuronConfig {
    fn default() -> Self {
        NeuronConfig {
            learning_rate: 0.2,
            momentum: 0.9,
            weight_decay: 0.0,
            dropout_rate: 0.0,
            min_start_weight: -1.0,
            max_start_weight: 1.0,
            activation: "sigmoid".to_string(),
        }
    }
}

impl NeuronConfig {
    pub fn with_learning_rate(mut self, learning_rate: f64) -> Self {
        self.learning_rate = learning_rate;
        self
    }

    pub fn with_momentum(mut self, momentum: f64) -> Self {
        self.momentum = momentum;
        self
    }

    pub fn with_weight_decay(mut self, weight_decay: f64) -> Self {
        self.weight_decay = weight_decay;
        self
    }

    pub fn with_dropout_rate(mut self, dropout_rate: f64) -> Self {
        self.dropout_rate = dropout_rate;
        self
    }

    pub fn with_weight_range(mut self, min: f64, max: f64) -> Self {
        self.min_start_weight = min;
        self.max_start_weight = max;
        self
    }

    pub fn with_activation(mut self, name: &str) -> Self {
        self.activation = name.to_string();
        self
    }

    /// Resolves the configured activation name.
    pub fn activation_function(&self) -> Result<ActivationFunction> {
        ActivationFunction::from_name(&self.activation)
    }

    /// Checks every numeric field against its allowed range.
    pub fn validate(&self) -> Result<()> {
        non_negative("learning_rate", self.learning_rate)?;
        non_negative("momentum", self.momentum)?;
        non_negative("weight_decay", self.weight_decay)?;
        unit_interval("dropout_rate", self.dropout_rate)?;
        weight_range(self.min_start_weight, self.max_start_weight)
    }

    pub fn save_json(&self, path: &str) -> Result<()> {
        let file = std::fs::File::create(path)?;
        let writer = std::io::BufWriter::new(file);
        serde_json::to_writer_pretty(writer, self)?;
        Ok(())
    }

    pub fn load_json(path: &str) -> Result<NeuronConfig> {
        let file = std::fs::File::open(path)?;
        let reader = std::io::BufReader::new(file);
        Ok(serde_json::from_reader(reader)?)
    }
}

pub(crate) fn non_negative(name: &'static str, value: f64) -> Result<()> {
    if !(value >= 0.0) {
        return Err(Error::InvalidParameter { name, value, reason: "must be >= 0" });
    }
    Ok(())
}

pub(crate) fn weight_range(min: f64, max: f64) -> Result<()> {
    if !(min <= max) {
        return Err(Error::InvalidParameter {
            name: "min_start_weight",
            value: min,
            reason: "must not exceed max_start_weight",
        });
    }
    Ok(())
}

pub(crate) fn unit_interval(name: &'static str, value: f64) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(Error::InvalidParameter { name, value, reason: "must lie in [0, 1]" });
    }
    Ok(())
}
