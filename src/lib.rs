//! # sparse-cells
//!
//! Feed-forward evaluation and backpropagation over explicitly wired,
//! sparsely connected cells. Every neuron keeps its own sorted list of
//! upstream connections; the network orders neurons into dependency waves
//! and evaluates each wave in parallel.
//!
//! ## Feature Flags
//!
//! - `strict` (default): bounds and length checks on every cell operation
//! - `parallel` (default): evaluate the units of a wave on the rayon pool

pub mod activation;
pub mod batch;
pub mod error;
pub mod loss;
pub mod network;
pub mod train;
pub mod unit;

// Convenience re-exports
pub use activation::activation::{ActivationFunction, DerivativeInput};
pub use batch::SharedErrors;
pub use error::{Error, Result};
pub use network::{Network, NetworkBuilder, NetworkRecord};
pub use train::trainer::train_batch;
pub use unit::{InputCell, Neuron, NeuronConfig, Synapse, Unit};
