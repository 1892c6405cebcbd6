//! Checks that the weight steps taken by a backward pass equal the analytic
//! descent direction of the mean squared error, estimated by central
//! differences.

use sparse_cells::{train_batch, ActivationFunction, Network, NetworkBuilder, NeuronConfig};

const EPSILON: f64 = 1e-6;
const TOLERANCE: f64 = 1e-6;

/// 0,1,2 inputs; 3 <- 0,1; 4 <- 1,2; 5 <- 0,2; 6 <- 3,4; 7 <- 3,5,6.
///
/// Unit 3 feeds both 6 and 7, so its error arrives from two waves.
fn sparse_network() -> Network {
    let config = NeuronConfig::default()
        .with_learning_rate(1.0)
        .with_momentum(0.0);
    let mut builder = NetworkBuilder::new(config);
    builder.add_inputs(3).unwrap();
    for _ in 3..8 {
        builder.add_neuron(true).unwrap();
    }

    let wiring = [
        (3, 0, 0.3), (3, 1, -0.6),
        (4, 1, 0.8), (4, 2, 0.25),
        (5, 0, -0.4), (5, 2, 0.9),
        (6, 3, 0.7), (6, 4, -0.5),
        (7, 3, 0.45), (7, 5, -0.35), (7, 6, 0.6),
    ];
    for (target, source, weight) in wiring {
        builder.connect_weighted(target, source, weight).unwrap();
    }
    for (index, bias) in [(3, 0.1), (4, -0.2), (5, 0.05), (6, 0.3), (7, -0.1)] {
        builder.neuron_mut(index).unwrap().set_bias(bias);
    }
    // Mix output-based and raw-based derivatives.
    builder.neuron_mut(4).unwrap().set_activation(ActivationFunction::Tanh);
    builder.neuron_mut(5).unwrap().set_activation(ActivationFunction::Softplus);
    builder.neuron_mut(6).unwrap().set_activation(ActivationFunction::Identity);
    builder.set_output_count(1);
    builder.build().unwrap()
}

fn samples() -> (Vec<Vec<f64>>, Vec<Vec<f64>>) {
    let inputs = vec![
        vec![0.2, -0.7, 1.0],
        vec![-1.0, 0.4, 0.3],
        vec![0.5, 0.5, -0.8],
    ];
    let targets = vec![vec![0.9], vec![0.1], vec![0.4]];
    (inputs, targets)
}

fn mean_squared_error(network: &Network, inputs: &[Vec<f64>], targets: &[Vec<f64>]) -> f64 {
    let outputs = network.clone().predict(inputs).unwrap();
    outputs
        .iter()
        .zip(targets)
        .map(|(o, t)| (o[0] - t[0]).powi(2))
        .sum::<f64>()
        / inputs.len() as f64
}

#[test]
fn weight_steps_follow_the_loss_gradient() {
    let network = sparse_network();
    let (inputs, targets) = samples();

    let mut trained = network.clone();
    train_batch(&mut trained, &inputs, &targets).unwrap();

    let mut checked = 0;
    for index in 3..8 {
        let neuron = network.neuron(index).unwrap();
        for source in neuron.connections() {
            let weight = neuron.weight(source).unwrap();

            let mut plus = network.clone();
            plus.neuron_mut(index).unwrap().set_weight(source, weight + EPSILON);
            let mut minus = network.clone();
            minus.neuron_mut(index).unwrap().set_weight(source, weight - EPSILON);
            let numeric = (mean_squared_error(&plus, &inputs, &targets)
                - mean_squared_error(&minus, &inputs, &targets))
                / (2.0 * EPSILON);

            // error = target - output, so a unit learning rate steps by
            // -½ dL/dw.
            let expected_step = -0.5 * numeric;
            let actual_step = trained.neuron(index).unwrap().weight(source).unwrap() - weight;
            assert!(
                (actual_step - expected_step).abs() < TOLERANCE,
                "weight {source}->{index}: step {actual_step}, expected {expected_step}"
            );
            checked += 1;
        }
    }
    assert_eq!(checked, 11);
}

#[test]
fn backward_pass_consumes_every_error() {
    let mut network = sparse_network();
    let (inputs, _) = samples();
    let mut values = network.new_values(inputs.len());
    network.load_inputs(&mut values, &inputs).unwrap();
    network.forward(&mut values, inputs.len()).unwrap();

    let mut errors = network.new_values(inputs.len());
    errors[7] = vec![0.3, -0.2, 0.1];
    network.backward(&values, inputs.len(), &mut errors).unwrap();
    assert!(errors.iter().flatten().all(|e| *e == 0.0));
}
