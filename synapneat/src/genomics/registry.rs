use super::{Genotype, NeuronId};
use crate::Innovation;

use ahash::RandomState;

use std::collections::HashMap;

/// The registry of synapse innovations. All mutation sites share one
/// registry, so synapses created between the same endpoint pair in
/// the same era receive the same innovation number and stay alignable
/// during crossover.
///
/// A registry must be seeded with [`rebuild`](InnovationRegistry::rebuild)
/// before its first query; querying an unseeded registry is a
/// programming error and panics.
///
/// # Examples
/// ```
/// use synapneat::genomics::{Genotype, InnovationRegistry, NeuronId};
///
/// let mut registry = InnovationRegistry::new();
/// registry.rebuild(std::iter::empty::<&Genotype>());
///
/// let a = registry.innovation(NeuronId::from(1), NeuronId::from(2));
/// let b = registry.innovation(NeuronId::from(1), NeuronId::from(2));
/// assert_eq!(a, b);
/// ```
pub struct InnovationRegistry {
    innovations: HashMap<(NeuronId, NeuronId), Innovation, RandomState>,
    next: Innovation,
    initialized: bool,
}

impl InnovationRegistry {
    pub fn new() -> InnovationRegistry {
        InnovationRegistry {
            innovations: HashMap::default(),
            next: 0,
            initialized: false,
        }
    }

    /// Clears the registry and reseeds it from the synapses of the
    /// passed genomes, keeping the first number seen per endpoint
    /// pair. Fresh numbers continue above the highest seeded one.
    pub fn rebuild<'a, I>(&mut self, genomes: I)
    where
        I: IntoIterator<Item = &'a Genotype>,
    {
        self.innovations.clear();
        self.next = 0;
        for genome in genomes {
            for synapse in genome.synapses() {
                self.innovations
                    .entry((synapse.source(), synapse.target()))
                    .or_insert_with(|| synapse.innovation());
                self.next = self.next.max(synapse.innovation() + 1);
            }
        }
        self.initialized = true;
    }

    /// Returns the innovation number for an endpoint pair, allocating
    /// the next free number for pairs unseen since the last rebuild.
    ///
    /// # Panics
    /// Panics if the registry has never been rebuilt.
    pub fn innovation(&mut self, source: NeuronId, target: NeuronId) -> Innovation {
        if !self.initialized {
            panic!("innovation registry queried before a rebuild");
        }
        let next = &mut self.next;
        *self.innovations.entry((source, target)).or_insert_with(|| {
            let allocated = *next;
            *next += 1;
            allocated
        })
    }
}

impl Default for InnovationRegistry {
    fn default() -> InnovationRegistry {
        InnovationRegistry::new()
    }
}
