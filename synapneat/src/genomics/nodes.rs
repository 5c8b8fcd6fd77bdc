use super::ActivationType;

use serde::{Deserialize, Serialize};

use std::fmt;

/// Identifier for a neuron. Fresh ids are random 64-bit values, so
/// ids minted in different genomes never collide in practice, and
/// crossover can match neurons across parents by id alone.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NeuronId(u64);

impl NeuronId {
    /// Mints a new unique id.
    pub fn fresh() -> NeuronId {
        NeuronId(rand::random())
    }
}

impl From<u64> for NeuronId {
    fn from(value: u64) -> NeuronId {
        NeuronId(value)
    }
}

impl fmt::Display for NeuronId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A NeuronType indicates the role a neuron plays in the network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NeuronType {
    /// Constant-1 source. At most one per genome.
    Bias,
    /// Externally fed value source.
    Input,
    /// Internal neuron.
    Hidden,
    /// Observable result neuron.
    Output,
}

impl NeuronType {
    /// Bias and Input neurons inject values into the network and
    /// never receive synapses.
    pub fn is_stimulus(self) -> bool {
        matches!(self, NeuronType::Bias | NeuronType::Input)
    }
}

/// Neurons are the structural elements of genomes between which
/// synapses are created. Each neuron carries its own activation
/// function and bias term.
///
/// # Examples
/// ```
/// use synapneat::genomics::{ActivationType, Neuron, NeuronType};
///
/// let neuron = Neuron::new(NeuronType::Hidden, ActivationType::Sigmoid);
/// assert_eq!(neuron.kind(), NeuronType::Hidden);
/// assert_eq!(neuron.bias(), 0.0);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Neuron {
    id: NeuronId,
    kind: NeuronType,
    bias: f32,
    activation: ActivationType,
    label: Option<String>,
}

impl Neuron {
    /// Creates a neuron with a freshly minted id, zero bias and
    /// no label.
    pub fn new(kind: NeuronType, activation: ActivationType) -> Neuron {
        Neuron::with_id(NeuronId::fresh(), kind, activation)
    }

    /// Creates a neuron with an explicit id.
    ///
    /// # Examples
    /// ```
    /// use synapneat::genomics::{ActivationType, Neuron, NeuronId, NeuronType};
    ///
    /// let neuron = Neuron::with_id(NeuronId::from(7), NeuronType::Input, ActivationType::Identity);
    /// assert_eq!(neuron.id(), NeuronId::from(7));
    /// ```
    pub fn with_id(id: NeuronId, kind: NeuronType, activation: ActivationType) -> Neuron {
        Neuron {
            id,
            kind,
            bias: 0.0,
            activation,
            label: None,
        }
    }

    /// Attaches an opaque label. Labels are carried through
    /// serialization and crossover but never interpreted.
    pub fn with_label(mut self, label: impl Into<String>) -> Neuron {
        self.label = Some(label.into());
        self
    }

    pub fn id(&self) -> NeuronId {
        self.id
    }

    pub fn kind(&self) -> NeuronType {
        self.kind
    }

    /// Returns the neuron's bias term, passed to its activation
    /// function alongside the weighted input sum.
    pub fn bias(&self) -> f32 {
        self.bias
    }

    pub fn set_bias(&mut self, bias: f32) {
        self.bias = bias;
    }

    pub fn activation(&self) -> ActivationType {
        self.activation
    }

    pub fn set_activation(&mut self, activation: ActivationType) {
        self.activation = activation;
    }

    pub fn label(&self) -> Option<&str> {
        self.label.as_deref()
    }
}

impl fmt::Display for Neuron {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}[{:?}, {:?}, bias {}]",
            self.id, self.kind, self.activation, self.bias
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stimulus_types() {
        assert!(NeuronType::Bias.is_stimulus());
        assert!(NeuronType::Input.is_stimulus());
        assert!(!NeuronType::Hidden.is_stimulus());
        assert!(!NeuronType::Output.is_stimulus());
    }

    #[test]
    fn fresh_ids_are_distinct() {
        assert_ne!(NeuronId::fresh(), NeuronId::fresh());
    }

    #[test]
    fn labels_are_opaque_and_optional() {
        let plain = Neuron::new(NeuronType::Input, ActivationType::Identity);
        assert_eq!(plain.label(), None);
        let tagged = plain.clone().with_label("left eye");
        assert_eq!(tagged.label(), Some("left eye"));
        assert_eq!(tagged.id(), plain.id());
    }
}
