use ahash::RandomState;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;

/// The activation functions a neuron can carry. Each function is
/// applied to the weighted input sum together with the neuron's
/// own bias term.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[non_exhaustive]
pub enum ActivationType {
    // tanh(x + bias)
    HyperbolicTangent,
    // 1 / (1 + exp(-x + bias))
    Sigmoid,
    // x + bias
    Identity,
    // 0 if x + bias < 0, else 1
    BinaryStep,
    // exp(-(x - bias)²)
    Gaussian,
    // v·tanh(ln(1 + exp(v))), v = x + bias
    Mish,
    // v / (1 + exp(-v)), v = x + bias
    Swish,
}

impl ActivationType {
    pub const ALL: [ActivationType; 7] = [
        ActivationType::HyperbolicTangent,
        ActivationType::Sigmoid,
        ActivationType::Identity,
        ActivationType::BinaryStep,
        ActivationType::Gaussian,
        ActivationType::Mish,
        ActivationType::Swish,
    ];

    /// Applies the function to the weighted input sum `x` using the
    /// neuron's `bias`.
    ///
    /// # Examples
    /// ```
    /// use synapneat::genomics::ActivationType;
    ///
    /// assert_eq!(ActivationType::Identity.apply(2.0, 0.5), 2.5);
    /// assert_eq!(ActivationType::BinaryStep.apply(-1.0, 0.0), 0.0);
    /// assert_eq!(ActivationType::Sigmoid.apply(0.0, 0.0), 0.5);
    /// ```
    pub fn apply(self, x: f32, bias: f32) -> f32 {
        match self {
            ActivationType::HyperbolicTangent => (x + bias).tanh(),
            ActivationType::Sigmoid => 1.0 / (1.0 + (-x + bias).exp()),
            ActivationType::Identity => x + bias,
            ActivationType::BinaryStep => {
                if x + bias < 0.0 {
                    0.0
                } else {
                    1.0
                }
            }
            ActivationType::Gaussian => (-(x - bias).powi(2)).exp(),
            ActivationType::Mish => {
                let v = x + bias;
                v * v.exp().ln_1p().tanh()
            }
            ActivationType::Swish => {
                let v = x + bias;
                v / (1.0 + (-v).exp())
            }
        }
    }

    fn default_weight(self) -> f32 {
        match self {
            ActivationType::HyperbolicTangent => 0.4,
            ActivationType::Sigmoid => 0.3,
            ActivationType::Identity => 0.05,
            ActivationType::BinaryStep => 0.05,
            ActivationType::Gaussian => 0.1,
            ActivationType::Mish => 0.0,
            ActivationType::Swish => 0.1,
        }
    }

    /// Draws a random activation function. Sampling weights default
    /// to the built-in ones and can be overridden per function.
    ///
    /// # Panics
    /// Panics if the override weights leave no function selectable.
    pub fn random<R: Rng>(
        rng: &mut R,
        overrides: &HashMap<ActivationType, f32, RandomState>,
    ) -> ActivationType {
        *Self::ALL
            .choose_weighted(rng, |a| {
                overrides.get(a).copied().unwrap_or_else(|| a.default_weight())
            })
            .unwrap_or_else(|e| panic!("invalid activation sampling weights: {}", e))
    }
}

/// Normalizes a slice of raw output values into a probability
/// distribution. Handy for interpreting multi-output phenotypes
/// as classifiers.
pub fn softmax(values: &[f32]) -> Vec<f32> {
    let max = values.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = values.iter().map(|v| (v - max).exp()).collect();
    let total: f32 = exps.iter().sum();
    exps.into_iter().map(|e| e / total).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;

    #[test]
    fn function_shapes() {
        assert_eq!(ActivationType::Identity.apply(1.0, 2.0), 3.0);
        assert_eq!(ActivationType::BinaryStep.apply(0.5, -1.0), 0.0);
        assert_eq!(ActivationType::BinaryStep.apply(0.5, 0.0), 1.0);
        assert_eq!(ActivationType::HyperbolicTangent.apply(0.0, 0.0), 0.0);
        assert!((ActivationType::Gaussian.apply(0.7, 0.7) - 1.0).abs() < 1e-6);
        assert!((ActivationType::Sigmoid.apply(0.0, 0.0) - 0.5).abs() < 1e-6);
        assert_eq!(ActivationType::Mish.apply(0.0, 0.0), 0.0);
        assert_eq!(ActivationType::Swish.apply(0.0, 0.0), 0.0);
    }

    #[test]
    fn overrides_steer_sampling() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut overrides: HashMap<ActivationType, f32, RandomState> = HashMap::default();
        for activation in ActivationType::ALL {
            overrides.insert(activation, 0.0);
        }
        overrides.insert(ActivationType::Gaussian, 1.0);
        for _ in 0..50 {
            assert_eq!(
                ActivationType::random(&mut rng, &overrides),
                ActivationType::Gaussian
            );
        }
    }

    #[test]
    fn default_weights_cover_every_function() {
        let mut rng = StdRng::seed_from_u64(7);
        let overrides = HashMap::default();
        for _ in 0..100 {
            ActivationType::random(&mut rng, &overrides);
        }
    }

    #[test]
    fn softmax_is_a_distribution() {
        let distribution = softmax(&[1.0, 2.0, 3.0]);
        let total: f32 = distribution.iter().sum();
        assert!((total - 1.0).abs() < 1e-6);
        assert!(distribution[2] > distribution[1] && distribution[1] > distribution[0]);
    }
}
