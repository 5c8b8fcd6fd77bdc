use crate::genomics::ActivationType;

use ahash::RandomState;

use std::collections::HashMap;

/// Parameters of crossover and the mutation battery.
///
/// Every `*_chance` is the independent probability of the matching
/// operator firing on a freshly bred child; structurally inapplicable
/// operators are skipped regardless of their chance.
#[derive(Clone, Debug)]
pub struct EvolutionConfig {
    /// Whether new synapses may close a cycle. The executor handles
    /// recurrence either way; this only gates the add-synapse
    /// operator.
    pub allow_recurrent: bool,
    /// Inclusive bounds for synapse weights.
    pub weight_range: (f32, f32),
    /// Cap on hidden neurons per genome. `None` leaves growth
    /// unbounded.
    pub max_hidden_neurons: Option<usize>,
    /// Chance of nudging a random enabled synapse's weight.
    pub weight_nudge_chance: f32,
    /// Chance of replacing a random enabled synapse's weight outright.
    pub weight_reset_chance: f32,
    /// Chance of replacing a random hidden neuron's activation
    /// function.
    pub activation_replace_chance: f32,
    /// Chance of nudging a random hidden neuron's bias term.
    pub bias_nudge_chance: f32,
    /// Chance of adding a synapse between two unconnected neurons.
    pub synapse_add_chance: f32,
    /// Chance of adding a direct stimulus-to-output synapse.
    pub direct_synapse_add_chance: f32,
    /// Chance of disabling a random enabled synapse.
    pub synapse_disable_chance: f32,
    /// Chance of enabling a random disabled synapse.
    pub synapse_enable_chance: f32,
    /// Chance of toggling a random synapse.
    pub synapse_toggle_chance: f32,
    /// Chance of splitting an enabled synapse with a new hidden
    /// neuron.
    pub neuron_add_chance: f32,
    /// Chance of removing a random hidden neuron and its synapses.
    pub neuron_remove_chance: f32,
    /// Per-function overrides of the activation sampling weights used
    /// when new or replaced neurons draw an activation function.
    pub activation_weight_overrides: HashMap<ActivationType, f32, RandomState>,
}

impl EvolutionConfig {
    /// Returns a config with all chances set to zero. Useful as a
    /// base for spelling out only the parameters under study.
    ///
    /// # Examples
    /// ```
    /// use synapneat::evolution::EvolutionConfig;
    ///
    /// let config = EvolutionConfig {
    ///     synapse_add_chance: 1.0,
    ///     ..EvolutionConfig::zero()
    /// };
    /// assert_eq!(config.weight_nudge_chance, 0.0);
    /// ```
    pub fn zero() -> EvolutionConfig {
        EvolutionConfig {
            allow_recurrent: false,
            weight_range: (0.0, 0.0),
            max_hidden_neurons: None,
            weight_nudge_chance: 0.0,
            weight_reset_chance: 0.0,
            activation_replace_chance: 0.0,
            bias_nudge_chance: 0.0,
            synapse_add_chance: 0.0,
            direct_synapse_add_chance: 0.0,
            synapse_disable_chance: 0.0,
            synapse_enable_chance: 0.0,
            synapse_toggle_chance: 0.0,
            neuron_add_chance: 0.0,
            neuron_remove_chance: 0.0,
            activation_weight_overrides: HashMap::default(),
        }
    }
}

impl Default for EvolutionConfig {
    fn default() -> EvolutionConfig {
        EvolutionConfig {
            allow_recurrent: false,
            weight_range: (-4.0, 4.0),
            max_hidden_neurons: None,
            weight_nudge_chance: 0.5,
            weight_reset_chance: 0.1,
            activation_replace_chance: 0.1,
            bias_nudge_chance: 0.3,
            synapse_add_chance: 0.2,
            direct_synapse_add_chance: 0.0,
            synapse_disable_chance: 0.3,
            synapse_enable_chance: 0.3,
            synapse_toggle_chance: 0.0,
            neuron_add_chance: 0.1,
            neuron_remove_chance: 0.1,
            activation_weight_overrides: HashMap::default(),
        }
    }
}
