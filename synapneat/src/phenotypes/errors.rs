use crate::genomics::NeuronId;

use std::error::Error;
use std::fmt;

/// Reasons a genome is refused compilation. These arise routinely
/// from mutation and mark the genome as unfit rather than signalling
/// a bug.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StructuralError {
    /// A synapse targets a Bias or Input neuron.
    SynapseIntoStimulus(NeuronId),
    /// A synapse leaves an Output neuron.
    SynapseOutOfOutput(NeuronId),
    /// The genome holds more than one Bias neuron.
    MultipleBiasNeurons(usize),
}

impl fmt::Display for StructuralError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StructuralError::SynapseIntoStimulus(id) => {
                write!(f, "synapse targets stimulus neuron {}", id)
            }
            StructuralError::SynapseOutOfOutput(id) => {
                write!(f, "synapse leaves output neuron {}", id)
            }
            StructuralError::MultipleBiasNeurons(count) => {
                write!(f, "genome holds {} bias neurons, at most 1 allowed", count)
            }
        }
    }
}

impl Error for StructuralError {}

/// Failures while running a compiled phenotype.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunError {
    /// The input slice does not match the genome's Input neuron count.
    InputSizeMismatch { expected: usize, actual: usize },
}

impl fmt::Display for RunError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunError::InputSizeMismatch { expected, actual } => write!(
                f,
                "phenotype expects {} inputs, received {}",
                expected, actual
            ),
        }
    }
}

impl Error for RunError {}
