use serde::{Serialize, Deserialize};
use std::f64::consts::E;
use std::str::FromStr;

use crate::error::{Error, Result};

/// What a derivative expects as its argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DerivativeInput {
    /// The derivative is written in terms of the activation's output `f(x)`.
    Output,
    /// The derivative needs the raw pre-activation sum `x`.
    Raw,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum ActivationFunction {
    Sigmoid,
    Tanh,
    ReLU,
    LeakyReLU { alpha: f64 },
    Identity,
    Softplus,
}

impl ActivationFunction {
    /// Slope used when `leaky_relu` is looked up by name.
    pub const DEFAULT_LEAKY_ALPHA: f64 = 0.01;

    /// Looks up an activation by its registry name (case-insensitive).
    pub fn from_name(name: &str) -> Result<ActivationFunction> {
        match name.trim().to_ascii_lowercase().as_str() {
            "sigmoid" => Ok(ActivationFunction::Sigmoid),
            "tanh" => Ok(ActivationFunction::Tanh),
            "relu" => Ok(ActivationFunction::ReLU),
            "leaky_relu" => Ok(ActivationFunction::LeakyReLU { alpha: Self::DEFAULT_LEAKY_ALPHA }),
            "identity" | "linear" => Ok(ActivationFunction::Identity),
            "softplus" => Ok(ActivationFunction::Softplus),
            _ => Err(Error::ActivationNotFound(name.to_string())),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ActivationFunction::Sigmoid => "sigmoid",
            ActivationFunction::Tanh => "tanh",
            ActivationFunction::ReLU => "relu",
            ActivationFunction::LeakyReLU { .. } => "leaky_relu",
            ActivationFunction::Identity => "identity",
            ActivationFunction::Softplus => "softplus",
        }
    }

    /// Element-wise activation.
    pub fn function(&self, x: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => 1.0 / (1.0 + E.powf(-x)),
            ActivationFunction::Tanh => x.tanh(),
            ActivationFunction::ReLU => if x > 0.0 { x } else { 0.0 },
            ActivationFunction::LeakyReLU { alpha } => if x > 0.0 { x } else { alpha * x },
            ActivationFunction::Identity => x,
            ActivationFunction::Softplus => (1.0 + E.powf(x)).ln(),
        }
    }

    /// Element-wise derivative.
    ///
    /// The argument is the activation's output for `Sigmoid` and `Tanh` and
    /// the raw pre-activation sum for every other variant; see
    /// [`derivative_input`](Self::derivative_input).
    pub fn derivative(&self, v: f64) -> f64 {
        match self {
            ActivationFunction::Sigmoid => v * (1.0 - v),
            ActivationFunction::Tanh => 1.0 - v * v,
            ActivationFunction::ReLU => if v > 0.0 { 1.0 } else { 0.0 },
            ActivationFunction::LeakyReLU { alpha } => if v > 0.0 { 1.0 } else { *alpha },
            ActivationFunction::Identity => 1.0,
            ActivationFunction::Softplus => 1.0 / (1.0 + E.powf(-v)),
        }
    }

    pub fn derivative_input(&self) -> DerivativeInput {
        match self {
            ActivationFunction::Sigmoid | ActivationFunction::Tanh => DerivativeInput::Output,
            _ => DerivativeInput::Raw,
        }
    }

    /// True when the forward pass must keep the pre-activation sums around.
    pub fn needs_raw_input(&self) -> bool {
        self.derivative_input() == DerivativeInput::Raw
    }
}

impl Default for ActivationFunction {
    fn default() -> Self {
        ActivationFunction::Sigmoid
    }
}

impl FromStr for ActivationFunction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        ActivationFunction::from_name(s)
    }
}
