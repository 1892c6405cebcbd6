pub struct MseLoss;

impl MseLoss {
    /// Scalar MSE: mean((predicted - expected)²)
    pub fn loss(predicted: &[f64], expected: &[f64]) -> f64 {
        let n = predicted.len() as f64;
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>() / n
    }

    /// Per-output error signal fed to the backward pass: expected - predicted.
    ///
    /// Cells add `learning_rate · error` to their parameters, so the signal
    /// points towards the target (the negative MSE gradient, up to a factor).
    pub fn error_signal(predicted: &[f64], expected: &[f64]) -> Vec<f64> {
        predicted.iter().zip(expected.iter())
            .map(|(a, b)| b - a)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loss_and_signal() {
        let predicted = [0.5, 1.0];
        let expected = [1.0, 0.0];
        assert!((MseLoss::loss(&predicted, &expected) - 0.625).abs() < 1e-12);
        assert_eq!(MseLoss::error_signal(&predicted, &expected), vec![0.5, -1.0]);
    }
}
