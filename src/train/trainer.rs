use crate::{
    error::{check_len, Result, STRICT},
    loss::mse::MseLoss,
    network::network::Network,
};

/// Runs one forward and one backward pass over a batch and returns the mean
/// loss measured before the update.
///
/// `samples[s]` holds the inputs and `targets[s]` the expected outputs of
/// sample `s`.
pub fn train_batch(
    network: &mut Network,
    samples: &[Vec<f64>],
    targets: &[Vec<f64>],
) -> Result<f64> {
    if STRICT {
        check_len("targets", samples.len(), targets.len())?;
        for target in targets {
            check_len("target sample", network.output_count(), target.len())?;
        }
    }

    let batch_size = samples.len();
    let mut values = network.new_values(batch_size);
    network.load_inputs(&mut values, samples)?;
    network.forward(&mut values, batch_size)?;

    // Output errors go straight into the output slots; everything upstream
    // is accumulated by the backward pass itself.
    let mut errors = network.new_values(batch_size);
    let mut total_loss = 0.0;
    for (s, (output, target)) in network.outputs(&values)?.iter().zip(targets).enumerate() {
        total_loss += MseLoss::loss(output, target);
        for (o, e) in network.output_indices().zip(MseLoss::error_signal(output, target)) {
            errors[o][s] = e;
        }
    }

    network.backward(&values, batch_size, &mut errors)?;
    Ok(total_loss / batch_size as f64)
}
