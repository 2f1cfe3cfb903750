//! Single-layer linear network with a softmax output.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::config::NetworkConfig;
use crate::error::{NutriclassError, Result};
use crate::ml::types::EpochStats;

/// Numerically stable softmax.
///
/// Subtracts the maximum score before exponentiating. If the denominator is
/// zero or not finite the uniform distribution is returned instead.
pub fn softmax(scores: &[f64]) -> Vec<f64> {
    if scores.is_empty() {
        return Vec::new();
    }

    let max = scores.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let exps: Vec<f64> = scores.iter().map(|s| (s - max).exp()).collect();
    let sum: f64 = exps.iter().sum();

    if !(sum > 0.0 && sum.is_finite()) {
        let uniform = 1.0 / scores.len() as f64;
        return vec![uniform; scores.len()];
    }

    exps.into_iter().map(|e| e / sum).collect()
}

/// Index and value of the largest entry. Ties go to the lowest index.
pub fn argmax(values: &[f64]) -> Option<(usize, f64)> {
    values
        .iter()
        .copied()
        .enumerate()
        .fold(None, |best, (idx, value)| match best {
            Some((_, best_value)) if best_value >= value => best,
            _ => Some((idx, value)),
        })
}

/// Outcome of one forward pass against a known label.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExampleOutcome {
    pub loss: f64,
    pub correct: bool,
}

/// Weights `[outputs][inputs]` and one bias per output.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinearNetwork {
    weights: Vec<Vec<f64>>,
    biases: Vec<f64>,
    learning_rate: f64,
    init_range: f64,
    log_epsilon: f64,
}

impl LinearNetwork {
    /// An empty, uninitialized network.
    pub fn new(config: &NetworkConfig) -> Self {
        LinearNetwork {
            weights: Vec::new(),
            biases: Vec::new(),
            learning_rate: config.learning_rate,
            init_range: config.init_range,
            log_epsilon: config.log_epsilon,
        }
    }

    /// Rebuild a network from persisted parameters.
    pub fn from_parameters(
        config: &NetworkConfig,
        weights: Vec<Vec<f64>>,
        biases: Vec<f64>,
    ) -> Result<Self> {
        if weights.len() != biases.len() {
            return Err(NutriclassError::corrupt(format!(
                "{} weight rows but {} biases",
                weights.len(),
                biases.len()
            )));
        }
        if let Some(first) = weights.first()
            && weights.iter().any(|row| row.len() != first.len())
        {
            return Err(NutriclassError::corrupt("ragged weight matrix"));
        }

        let mut network = Self::new(config);
        network.weights = weights;
        network.biases = biases;
        Ok(network)
    }

    /// Allocate `output_size` rows of `input_size` weights and fill every
    /// weight and bias uniformly in `[-init_range, init_range]`.
    pub fn initialize_weights<R: Rng + ?Sized>(
        &mut self,
        input_size: usize,
        output_size: usize,
        rng: &mut R,
    ) {
        let range = self.init_range;
        self.weights = (0..output_size)
            .map(|_| (0..input_size).map(|_| rng.random_range(-range..=range)).collect())
            .collect();
        self.biases = (0..output_size)
            .map(|_| rng.random_range(-range..=range))
            .collect();
    }

    /// Probability distribution over outputs for one input vector.
    pub fn forward(&self, input: &[f64]) -> Result<Vec<f64>> {
        self.check_input(input)?;

        let scores: Vec<f64> = self
            .weights
            .iter()
            .zip(&self.biases)
            .map(|(row, bias)| bias + row.iter().zip(input).map(|(w, x)| w * x).sum::<f64>())
            .collect();

        Ok(softmax(&scores))
    }

    /// Cross-entropy of `probabilities` against the one-hot target.
    pub fn loss(&self, probabilities: &[f64], target: usize) -> f64 {
        let p = probabilities.get(target).copied().unwrap_or(0.0);
        -p.max(self.log_epsilon).ln()
    }

    /// One SGD step on a single example.
    ///
    /// Loss and correctness come from the forward pass before the update.
    pub fn train_example(&mut self, input: &[f64], target: usize) -> Result<ExampleOutcome> {
        self.check_target(target)?;
        let probabilities = self.forward(input)?;
        let outcome = self.outcome(&probabilities, target);

        let lr = self.learning_rate;
        for (j, (row, bias)) in self.weights.iter_mut().zip(self.biases.iter_mut()).enumerate() {
            let expected = if j == target { 1.0 } else { 0.0 };
            let error = probabilities[j] - expected;
            for (weight, x) in row.iter_mut().zip(input) {
                *weight -= lr * error * x;
            }
            *bias -= lr * error;
        }

        Ok(outcome)
    }

    /// One pass over the dataset in order, updating after every example.
    pub fn train_epoch(
        &mut self,
        epoch: usize,
        features: &[Vec<f64>],
        labels: &[usize],
    ) -> Result<EpochStats> {
        Self::check_dataset(features, labels)?;

        let mut total_loss = 0.0;
        let mut correct = 0;
        for (input, &label) in features.iter().zip(labels) {
            let outcome = self.train_example(input, label)?;
            total_loss += outcome.loss;
            correct += usize::from(outcome.correct);
        }

        Ok(EpochStats::new(epoch, total_loss, correct, features.len()))
    }

    /// Loss and accuracy over a dataset without touching the weights.
    pub fn evaluate(&self, features: &[Vec<f64>], labels: &[usize]) -> Result<EpochStats> {
        Self::check_dataset(features, labels)?;

        let mut total_loss = 0.0;
        let mut correct = 0;
        for (input, &label) in features.iter().zip(labels) {
            self.check_target(label)?;
            let probabilities = self.forward(input)?;
            let outcome = self.outcome(&probabilities, label);
            total_loss += outcome.loss;
            correct += usize::from(outcome.correct);
        }

        Ok(EpochStats::new(0, total_loss, correct, features.len()))
    }

    pub fn weights(&self) -> &[Vec<f64>] {
        &self.weights
    }

    pub fn biases(&self) -> &[f64] {
        &self.biases
    }

    pub fn input_size(&self) -> usize {
        self.weights.first().map_or(0, Vec::len)
    }

    pub fn output_size(&self) -> usize {
        self.biases.len()
    }

    /// Weight entries plus biases.
    pub fn parameter_count(&self) -> usize {
        self.weights.iter().map(Vec::len).sum::<usize>() + self.biases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    fn outcome(&self, probabilities: &[f64], target: usize) -> ExampleOutcome {
        ExampleOutcome {
            loss: self.loss(probabilities, target),
            correct: argmax(probabilities).map(|(idx, _)| idx) == Some(target),
        }
    }

    fn check_input(&self, input: &[f64]) -> Result<()> {
        if input.len() != self.input_size() {
            return Err(NutriclassError::invalid_argument(format!(
                "input has {} features, network expects {}",
                input.len(),
                self.input_size()
            )));
        }
        Ok(())
    }

    fn check_target(&self, target: usize) -> Result<()> {
        if target >= self.output_size() {
            return Err(NutriclassError::invalid_argument(format!(
                "label {target} out of range for {} outputs",
                self.output_size()
            )));
        }
        Ok(())
    }

    fn check_dataset(features: &[Vec<f64>], labels: &[usize]) -> Result<()> {
        if features.len() != labels.len() {
            return Err(NutriclassError::invalid_argument(format!(
                "{} feature rows but {} labels",
                features.len(),
                labels.len()
            )));
        }
        Ok(())
    }
}
