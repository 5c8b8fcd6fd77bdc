use super::NeuronId;
use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Synapses are weighted, directed connections between neurons.
/// The innovation number records the synapse's historical origin,
/// which is what crossover and genetic distance align on.
///
/// # Examples
/// ```
/// use synapneat::genomics::{NeuronId, Synapse};
///
/// let synapse = Synapse::new(4, NeuronId::from(1), NeuronId::from(2), 0.25);
/// assert_eq!(synapse.innovation(), 4);
/// assert_eq!(synapse.weight(), 0.25);
/// assert!(synapse.is_enabled());
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Synapse {
    innovation: Innovation,
    source: NeuronId,
    target: NeuronId,
    weight: f32,
    enabled: bool,
}

impl Synapse {
    /// Creates an enabled synapse.
    pub fn new(innovation: Innovation, source: NeuronId, target: NeuronId, weight: f32) -> Synapse {
        Synapse {
            innovation,
            source,
            target,
            weight,
            enabled: true,
        }
    }

    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    pub fn source(&self) -> NeuronId {
        self.source
    }

    pub fn target(&self) -> NeuronId {
        self.target
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }

    pub fn set_weight(&mut self, weight: f32) {
        self.weight = weight;
    }

    /// Disabled synapses stay in the genome for historical alignment
    /// but carry no signal.
    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    pub fn disable(&mut self) {
        self.enabled = false;
    }

    pub fn toggle(&mut self) {
        self.enabled = !self.enabled;
    }
}

impl fmt::Display for Synapse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{} -> {}, w {}{}]",
            self.innovation,
            self.source,
            self.target,
            self.weight,
            if self.enabled { "" } else { ", disabled" }
        )
    }
}
