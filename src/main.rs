use sparse_cells::{train_batch, NetworkBuilder, NeuronConfig};
use tracing_subscriber::EnvFilter;

// Trains a small sparse network on XOR. Set RUST_LOG=sparse_cells=debug to
// see scheduling, or =trace for every wave.
fn main() -> sparse_cells::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut builder = NetworkBuilder::new(NeuronConfig::default().with_learning_rate(0.5));
    builder.add_inputs(2)?;
    builder.dense_layers(&[3, 1])?;
    let mut network = builder.build()?;
    tracing::info!(
        units = network.unit_count(),
        waves = network.wave_count(),
        "network ready"
    );

    let inputs = vec![vec![0.0, 0.0], vec![0.0, 1.0], vec![1.0, 0.0], vec![1.0, 1.0]];
    let targets = vec![vec![0.0], vec![1.0], vec![1.0], vec![0.0]];

    for step in 0..5000 {
        let loss = train_batch(&mut network, &inputs, &targets)?;
        if step % 500 == 0 {
            tracing::info!(step, loss, "training");
        }
    }

    for (input, output) in inputs.iter().zip(network.predict(&inputs)?) {
        println!("Input: {:?} -> Output: {:.4}", input, output[0]);
    }
    Ok(())
}
