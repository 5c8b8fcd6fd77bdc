//! Grouping of genomes into species by genetic distance.

mod config;

pub use config::{DistancePolicy, SpeciesConfig};

use crate::genomics::{Genotype, NeuronId, Synapse};
use crate::Innovation;

use ahash::RandomState;
use rand::prelude::*;
use serde::{Deserialize, Serialize};

use std::collections::{HashMap, HashSet};

/// Weight of the champion's fitness in a specie's blended average.
const CHAMPION_BLEND: f32 = 0.2;

const INITIAL_THRESHOLD: f32 = 3.0;
const MIN_THRESHOLD: f32 = 0.5;
const MAX_THRESHOLD: f32 = 4.0;

/// A group of reproductively compatible genomes, i.e. genomes within
/// the compatibility threshold of each other under the configured
/// distance policy.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Specie {
    genomes: Vec<Genotype>,
}

impl Specie {
    pub fn new(genomes: Vec<Genotype>) -> Specie {
        Specie { genomes }
    }

    pub fn genomes(&self) -> &[Genotype] {
        &self.genomes
    }

    pub fn into_genomes(self) -> Vec<Genotype> {
        self.genomes
    }

    pub fn len(&self) -> usize {
        self.genomes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.genomes.is_empty()
    }

    /// The specie's blended fitness: mostly the members' mean, with
    /// a bonus share for the champion, so a specie with one standout
    /// member outranks a uniformly mediocre one.
    ///
    /// # Examples
    /// ```
    /// use synapneat::genomics::Genotype;
    /// use synapneat::speciation::Specie;
    ///
    /// let mut weak = Genotype::new(vec![], vec![]);
    /// let mut strong = Genotype::new(vec![], vec![]);
    /// weak.set_fitness(0.0);
    /// strong.set_fitness(10.0);
    ///
    /// let specie = Specie::new(vec![weak, strong]);
    /// assert_eq!(specie.average_fitness(), 0.2 * 10.0 + 0.8 * 5.0);
    /// ```
    pub fn average_fitness(&self) -> f32 {
        if self.genomes.is_empty() {
            return 0.0;
        }
        let max = self.champion().fitness();
        let mean =
            self.genomes.iter().map(|g| g.fitness()).sum::<f32>() / self.genomes.len() as f32;
        CHAMPION_BLEND * max + (1.0 - CHAMPION_BLEND) * mean
    }

    /// Returns the specie's best-performing genome.
    ///
    /// # Panics
    /// Panics on an empty specie or uncomparable fitness values.
    pub fn champion(&self) -> &Genotype {
        self.genomes
            .iter()
            .max_by(|a, b| {
                a.fitness()
                    .partial_cmp(&b.fitness())
                    .unwrap_or_else(|| panic!("uncomparable fitness value detected"))
            })
            .expect("empty specie has no champion")
    }
}

/// Genetic distance between two genotypes:
///
/// ```text
/// (excess·cₑ + disjoint·c_d + activation_mismatch·cₐ + bias_diff·c_b) / norm
///     + c_w · avg_weight_diff
/// ```
///
/// computed over enabled synapses. Matched neurons are those present
/// in both genomes and touched by an active synapse; the activation
/// term is the fraction of them whose activation functions differ,
/// the bias term the average absolute difference of their bias terms.
/// A genome is at distance zero from itself.
pub fn genetic_distance(genome1: &Genotype, genome2: &Genotype, config: &SpeciesConfig) -> f32 {
    let boundary = genome1
        .max_innovation()
        .unwrap_or(0)
        .min(genome2.max_innovation().unwrap_or(0));

    let enabled1: HashMap<Innovation, &Synapse, RandomState> = genome1
        .enabled_synapses()
        .map(|s| (s.innovation(), s))
        .collect();
    let enabled2: HashMap<Innovation, &Synapse, RandomState> = genome2
        .enabled_synapses()
        .map(|s| (s.innovation(), s))
        .collect();

    let mut matched = 0usize;
    let mut weight_diff = 0.0f32;
    let mut disjoint = 0usize;
    let mut excess = 0usize;
    let mut active_endpoints: HashSet<NeuronId, RandomState> = HashSet::default();

    for (innovation, synapse) in &enabled1 {
        active_endpoints.insert(synapse.source());
        active_endpoints.insert(synapse.target());
        match enabled2.get(innovation) {
            Some(other) => {
                matched += 1;
                weight_diff += (synapse.weight() - other.weight()).abs();
            }
            None => {
                if *innovation <= boundary {
                    disjoint += 1;
                } else {
                    excess += 1;
                }
            }
        }
    }
    for (innovation, synapse) in &enabled2 {
        if enabled1.contains_key(innovation) {
            continue;
        }
        active_endpoints.insert(synapse.source());
        active_endpoints.insert(synapse.target());
        if *innovation <= boundary {
            disjoint += 1;
        } else {
            excess += 1;
        }
    }

    let avg_weight_diff = if matched > 0 {
        weight_diff / matched as f32
    } else {
        0.0
    };

    let mut matched_neurons = 0usize;
    let mut activation_mismatches = 0usize;
    let mut bias_diff = 0.0f32;
    for id in &active_endpoints {
        if let (Some(n1), Some(n2)) = (genome1.neuron(*id), genome2.neuron(*id)) {
            matched_neurons += 1;
            if n1.activation() != n2.activation() {
                activation_mismatches += 1;
            }
            bias_diff += (n1.bias() - n2.bias()).abs();
        }
    }
    let activation_diff = if matched_neurons > 0 {
        activation_mismatches as f32 / matched_neurons as f32
    } else {
        0.0
    };
    let bias_diff = if matched_neurons > 0 {
        bias_diff / matched_neurons as f32
    } else {
        0.0
    };

    (config.excess_coefficient * excess as f32
        + config.disjoint_coefficient * disjoint as f32
        + config.activation_coefficient * activation_diff
        + config.bias_coefficient * bias_diff)
        / config.normalization_factor
        + config.weight_coefficient * avg_weight_diff
}

/// Groups genomes into species, adapting the compatibility threshold
/// between passes to steer the specie count toward the configured
/// target.
pub struct SpeciesBuilder {
    config: SpeciesConfig,
    threshold: f32,
}

impl SpeciesBuilder {
    pub fn new(config: SpeciesConfig) -> SpeciesBuilder {
        SpeciesBuilder {
            config,
            threshold: INITIAL_THRESHOLD,
        }
    }

    /// Restores a previously adapted threshold, e.g. when resuming
    /// from a training snapshot.
    pub fn with_threshold(config: SpeciesConfig, threshold: f32) -> SpeciesBuilder {
        SpeciesBuilder { config, threshold }
    }

    /// The current compatibility threshold. Persist this alongside
    /// the population to resume grouping where it left off.
    pub fn threshold(&self) -> f32 {
        self.threshold
    }

    /// Assigns each genome to the closest existing group under the
    /// threshold, or opens a new group, then adapts the threshold.
    pub fn build(&mut self, genomes: Vec<Genotype>, rng: &mut impl Rng) -> Vec<Specie> {
        let mut groups: Vec<Vec<Genotype>> = Vec::new();
        for genome in genomes {
            let mut closest: Option<(usize, f32)> = None;
            for (index, members) in groups.iter().enumerate() {
                let distance = self.policy_distance(&genome, members, rng);
                if distance < self.threshold
                    && closest.map_or(true, |(_, best)| distance < best)
                {
                    closest = Some((index, distance));
                }
            }
            match closest {
                Some((index, _)) => groups[index].push(genome),
                None => groups.push(vec![genome]),
            }
        }
        self.adapt_threshold(groups.len());
        groups.into_iter().map(Specie::new).collect()
    }

    fn policy_distance(&self, genome: &Genotype, members: &[Genotype], rng: &mut impl Rng) -> f32 {
        match self.config.distance_policy {
            DistancePolicy::MinToAll => members
                .iter()
                .map(|member| genetic_distance(genome, member, &self.config))
                .fold(f32::INFINITY, f32::min),
            DistancePolicy::RandomMember => match members.choose(rng) {
                Some(member) => genetic_distance(genome, member, &self.config),
                None => f32::INFINITY,
            },
            DistancePolicy::HalfRandom => {
                let mut sample: Vec<&Genotype> = members.iter().collect();
                sample.shuffle(rng);
                sample.truncate((members.len() / 2).max(1));
                sample
                    .iter()
                    .map(|member| genetic_distance(genome, member, &self.config))
                    .fold(f32::INFINITY, f32::min)
            }
        }
    }

    fn adapt_threshold(&mut self, count: usize) {
        let target = self.config.target_count;
        let rate = self.config.threshold_adjustment_rate;
        if count > target {
            self.threshold += rate;
        }
        if count < target {
            self.threshold -= rate;
        }
        if count > 2 * target {
            // Badly fragmented; let the threshold escape the band.
            self.threshold += rate;
        } else {
            self.threshold = self.threshold.clamp(MIN_THRESHOLD, MAX_THRESHOLD);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ActivationType, Neuron, NeuronType};
    use rand::rngs::StdRng;

    fn neuron(id: u64, kind: NeuronType) -> Neuron {
        Neuron::with_id(NeuronId::from(id), kind, ActivationType::Identity)
    }

    fn genome_with(innovations: &[(Innovation, f32)]) -> Genotype {
        let neurons = vec![neuron(1, NeuronType::Input), neuron(2, NeuronType::Output)];
        let synapses = innovations
            .iter()
            .map(|&(innovation, weight)| {
                Synapse::new(innovation, NeuronId::from(1), NeuronId::from(2), weight)
            })
            .collect();
        Genotype::new(neurons, synapses)
    }

    #[test]
    fn distance_to_self_is_zero() {
        let genome = genome_with(&[(0, 1.0), (1, -0.5)]);
        assert_eq!(
            genetic_distance(&genome, &genome, &SpeciesConfig::default()),
            0.0
        );
    }

    #[test]
    fn disjoint_and_excess_are_split_by_the_shared_range() {
        // Genome 1 carries {0, 1, 2}, genome 2 {0, 3}: 1 and 2 are
        // disjoint, 3 is excess.
        let genome1 = genome_with(&[(0, 1.0), (1, 1.0), (2, 1.0)]);
        let genome2 = genome_with(&[(0, 1.0), (3, 1.0)]);
        let config = SpeciesConfig {
            excess_coefficient: 1.0,
            disjoint_coefficient: 1.0,
            weight_coefficient: 0.0,
            activation_coefficient: 0.0,
            bias_coefficient: 0.0,
            normalization_factor: 1.0,
            ..SpeciesConfig::default()
        };
        assert_eq!(genetic_distance(&genome1, &genome2, &config), 3.0);

        let excess_only = SpeciesConfig {
            disjoint_coefficient: 0.0,
            ..config.clone()
        };
        assert_eq!(genetic_distance(&genome1, &genome2, &excess_only), 1.0);
    }

    #[test]
    fn matched_weights_contribute_their_average_difference() {
        let genome1 = genome_with(&[(0, 1.0)]);
        let genome2 = genome_with(&[(0, 3.0)]);
        let config = SpeciesConfig {
            weight_coefficient: 0.4,
            ..SpeciesConfig::default()
        };
        let distance = genetic_distance(&genome1, &genome2, &config);
        assert!((distance - 0.8).abs() < 1e-6);
    }

    #[test]
    fn neuron_terms_compare_matched_neurons() {
        let genome1 = genome_with(&[(0, 1.0)]);
        let mut neurons = genome1.neurons().to_vec();
        neurons[1].set_activation(ActivationType::Sigmoid);
        neurons[1].set_bias(2.0);
        let genome2 = Genotype::new(neurons, genome1.synapses().to_vec());

        let config = SpeciesConfig {
            excess_coefficient: 0.0,
            disjoint_coefficient: 0.0,
            weight_coefficient: 0.0,
            activation_coefficient: 1.0,
            bias_coefficient: 0.4,
            normalization_factor: 1.0,
            ..SpeciesConfig::default()
        };
        // One mismatching activation out of two matched neurons, and
        // an average bias difference of one.
        let distance = genetic_distance(&genome1, &genome2, &config);
        assert!((distance - (0.5 + 0.4 * 1.0)).abs() < 1e-6);
    }

    #[test]
    fn identical_genomes_share_a_specie() {
        let mut rng = StdRng::seed_from_u64(0);
        let genome = genome_with(&[(0, 1.0)]);
        let genomes: Vec<Genotype> = (0..10).map(|_| genome.clone()).collect();
        let mut builder = SpeciesBuilder::new(SpeciesConfig::default());
        let species = builder.build(genomes, &mut rng);
        assert_eq!(species.len(), 1);
        assert_eq!(species[0].len(), 10);
    }

    #[test]
    fn incompatible_genomes_split_and_raise_the_threshold() {
        let mut rng = StdRng::seed_from_u64(1);
        // Disjoint innovation sets keep every pair far apart.
        let genomes: Vec<Genotype> = (0..20)
            .map(|i| genome_with(&[(i * 2, 1.0), (i * 2 + 1, 1.0)]))
            .collect();
        let config = SpeciesConfig {
            target_count: 2,
            ..SpeciesConfig::default()
        };
        let mut builder = SpeciesBuilder::new(config);
        let before = builder.threshold();
        let species = builder.build(genomes, &mut rng);
        assert!(species.len() > 2);
        assert!(builder.threshold() > before);
    }

    #[test]
    fn blended_average_fitness() {
        let mut members = Vec::new();
        for fitness in [0.0, 5.0, 10.0] {
            let mut genome = genome_with(&[(0, 1.0)]);
            genome.set_fitness(fitness);
            members.push(genome);
        }
        let specie = Specie::new(members);
        assert!((specie.average_fitness() - (0.2 * 10.0 + 0.8 * 5.0)).abs() < 1e-6);
        assert_eq!(specie.champion().fitness(), 10.0);
    }

    #[test]
    fn singleton_groups_survive_every_policy() {
        for policy in [
            DistancePolicy::MinToAll,
            DistancePolicy::RandomMember,
            DistancePolicy::HalfRandom,
        ] {
            let mut rng = StdRng::seed_from_u64(2);
            let config = SpeciesConfig {
                distance_policy: policy,
                ..SpeciesConfig::default()
            };
            let mut builder = SpeciesBuilder::new(config);
            let genomes = vec![genome_with(&[(0, 1.0)]), genome_with(&[(0, 1.0)])];
            let species = builder.build(genomes, &mut rng);
            assert_eq!(species.iter().map(Specie::len).sum::<usize>(), 2);
        }
    }
}
