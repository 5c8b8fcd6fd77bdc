//! Genome representation: neurons, synapses, genotypes, the activation
//! function catalog, and the innovation registry that tags new synapses.

mod activation;
mod genes;
mod nodes;
mod registry;

pub use activation::{softmax, ActivationType};
pub use genes::Synapse;
pub use nodes::{Neuron, NeuronId, NeuronType};
pub use registry::InnovationRegistry;

use crate::Innovation;

use serde::{Deserialize, Serialize};

use std::fmt;
use std::hash::{Hash, Hasher};

/// Identifier for a genome, minted at construction and preserved
/// across clones. Two `GenomeId`s compare equal only when they
/// refer to the same underlying genome.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct GenomeId(u64);

impl GenomeId {
    fn fresh() -> GenomeId {
        GenomeId(rand::random())
    }
}

impl fmt::Display for GenomeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:016x}", self.0)
    }
}

/// A genome: the evolvable description of a network.
///
/// Genotypes carry a runtime-assigned [`GenomeId`]; equality and
/// hashing go over the id, never over structure. The id is not
/// serialized, so genomes loaded from a snapshot mint fresh ones.
///
/// # Examples
/// ```
/// use synapneat::genomics::{ActivationType, Genotype, Neuron, NeuronType, Synapse};
///
/// let input = Neuron::new(NeuronType::Input, ActivationType::Identity);
/// let output = Neuron::new(NeuronType::Output, ActivationType::Sigmoid);
/// let synapse = Synapse::new(0, input.id(), output.id(), 0.5);
///
/// let genome = Genotype::new(vec![input, output], vec![synapse]);
/// assert_eq!(genome.neurons().len(), 2);
/// assert_eq!(genome.generation(), 0);
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Genotype {
    #[serde(skip, default = "GenomeId::fresh")]
    id: GenomeId,
    neurons: Vec<Neuron>,
    synapses: Vec<Synapse>,
    fitness: f32,
    generation: u32,
    age: u32,
}

impl Genotype {
    /// Creates a first-generation genome from the passed neurons
    /// and synapses.
    pub fn new(neurons: Vec<Neuron>, synapses: Vec<Synapse>) -> Genotype {
        Genotype {
            id: GenomeId::fresh(),
            neurons,
            synapses,
            fitness: 0.0,
            generation: 0,
            age: 0,
        }
    }

    pub(crate) fn offspring(
        neurons: Vec<Neuron>,
        synapses: Vec<Synapse>,
        generation: u32,
        fitness: f32,
    ) -> Genotype {
        Genotype {
            id: GenomeId::fresh(),
            neurons,
            synapses,
            fitness,
            generation,
            age: 0,
        }
    }

    /// Returns the genome's identity handle.
    pub fn id(&self) -> GenomeId {
        self.id
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn synapses(&self) -> &[Synapse] {
        &self.synapses
    }

    pub(crate) fn neurons_mut(&mut self) -> &mut Vec<Neuron> {
        &mut self.neurons
    }

    pub(crate) fn synapses_mut(&mut self) -> &mut Vec<Synapse> {
        &mut self.synapses
    }

    /// Returns the neuron with the given id, if present.
    pub fn neuron(&self, id: NeuronId) -> Option<&Neuron> {
        self.neurons.iter().find(|n| n.id() == id)
    }

    pub(crate) fn neuron_mut(&mut self, id: NeuronId) -> Option<&mut Neuron> {
        self.neurons.iter_mut().find(|n| n.id() == id)
    }

    /// Returns the position of the neuron with the given id
    /// in the genome's neuron order.
    pub fn neuron_index(&self, id: NeuronId) -> Option<usize> {
        self.neurons.iter().position(|n| n.id() == id)
    }

    /// Returns an iterator over the genome's enabled synapses.
    pub fn enabled_synapses(&self) -> impl Iterator<Item = &Synapse> {
        self.synapses.iter().filter(|s| s.is_enabled())
    }

    /// Returns an iterator over the genome's neurons of the given type.
    pub fn neurons_of(&self, kind: NeuronType) -> impl Iterator<Item = &Neuron> {
        self.neurons.iter().filter(move |n| n.kind() == kind)
    }

    /// Whether any synapse, enabled or not, connects `source` to `target`.
    pub fn has_synapse(&self, source: NeuronId, target: NeuronId) -> bool {
        self.synapses
            .iter()
            .any(|s| s.source() == source && s.target() == target)
    }

    /// Returns the highest innovation number among the genome's
    /// synapses, or `None` for a synapse-less genome.
    pub fn max_innovation(&self) -> Option<Innovation> {
        self.synapses.iter().map(|s| s.innovation()).max()
    }

    /// Returns the genome's last recorded fitness.
    pub fn fitness(&self) -> f32 {
        self.fitness
    }

    /// Records a fitness measurement.
    pub fn set_fitness(&mut self, fitness: f32) {
        self.fitness = fitness;
    }

    /// Returns the generation the genome was bred in.
    pub fn generation(&self) -> u32 {
        self.generation
    }

    /// Returns the number of generations the genome has survived.
    pub fn age(&self) -> u32 {
        self.age
    }

    pub(crate) fn increment_age(&mut self) {
        self.age += 1;
    }
}

impl PartialEq for Genotype {
    fn eq(&self, other: &Genotype) -> bool {
        self.id == other.id
    }
}

impl Eq for Genotype {}

impl Hash for Genotype {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for Genotype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Genotype {} (gen {}, age {}, fitness {}):",
            self.id, self.generation, self.age, self.fitness
        )?;
        for neuron in &self.neurons {
            writeln!(f, "  {}", neuron)?;
        }
        for synapse in &self.synapses {
            writeln!(f, "  {}", synapse)?;
        }
        Ok(())
    }
}
