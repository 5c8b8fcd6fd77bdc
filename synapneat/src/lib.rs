//! An implementation of NeuroEvolution of Augmenting Topologies in which
//! every neuron carries its own activation function and bias term.
//!
//! Genomes ([`Genotype`](genomics::Genotype)) are compiled into runnable
//! networks ([`Phenotype`](phenotypes::Phenotype)) through structural
//! validation, a backward walk from the output neurons and dead-code
//! elimination. Evolution proceeds through innovation-aligned crossover,
//! a battery of probability-gated mutation operators, speciation by
//! genetic distance with an adaptive compatibility threshold, and
//! fitness-proportional offspring allotment. A [`Trainer`](training::Trainer)
//! evaluates generations in parallel against a user-supplied
//! [`FitnessTask`](training::FitnessTask).
//!
//! # Example usage: evolution of a XOR approximator
//! ```no_run
//! use synapneat::evolution::EvolutionConfig;
//! use synapneat::genomics::{
//!     ActivationType, Genotype, InnovationRegistry, Neuron, NeuronType, Synapse,
//! };
//! use synapneat::phenotypes::Phenotype;
//! use synapneat::populations::Incubator;
//! use synapneat::speciation::{Specie, SpeciesBuilder, SpeciesConfig};
//! use synapneat::training::{
//!     CancellationToken, FitnessReport, FitnessTask, RoundRobin, Trainer, TrainingConfig,
//! };
//!
//! struct XorTask;
//!
//! impl FitnessTask for XorTask {
//!     fn initial_population(
//!         &self,
//!         count: usize,
//!         registry: &mut InnovationRegistry,
//!     ) -> Vec<Genotype> {
//!         (0..count)
//!             .map(|_| {
//!                 let input1 = Neuron::new(NeuronType::Input, ActivationType::Identity);
//!                 let input2 = Neuron::new(NeuronType::Input, ActivationType::Identity);
//!                 let hidden = Neuron::new(NeuronType::Hidden, ActivationType::HyperbolicTangent);
//!                 let output = Neuron::new(NeuronType::Output, ActivationType::HyperbolicTangent);
//!                 let synapse = Synapse::new(
//!                     registry.innovation(hidden.id(), output.id()),
//!                     hidden.id(),
//!                     output.id(),
//!                     0.0,
//!                 );
//!                 Genotype::new(vec![input1, input2, hidden, output], vec![synapse])
//!             })
//!             .collect()
//!     }
//!
//!     fn run_simulation(
//!         &self,
//!         contenders: &RoundRobin<Genotype>,
//!         _token: &CancellationToken,
//!     ) -> Vec<FitnessReport> {
//!         let genome = contenders.next();
//!         let cases = [
//!             ([0.0, 0.0], 0.0),
//!             ([0.0, 1.0], 1.0),
//!             ([1.0, 0.0], 1.0),
//!             ([1.0, 1.0], 0.0),
//!         ];
//!         let fitness = match Phenotype::compile(&genome) {
//!             Ok(mut phenotype) => {
//!                 let mut score = 0.0;
//!                 for (inputs, expected) in &cases {
//!                     phenotype.reset();
//!                     let outputs = phenotype.run(inputs).unwrap();
//!                     let output = outputs.values().copied().next().unwrap_or(0.0);
//!                     score += 1.0 - (expected - output).abs();
//!                 }
//!                 score / cases.len() as f32
//!             }
//!             Err(_) => 0.0,
//!         };
//!         vec![FitnessReport { genome, fitness }]
//!     }
//! }
//!
//! let mut rng = rand::thread_rng();
//! let mut registry = InnovationRegistry::new();
//! registry.rebuild(std::iter::empty::<&Genotype>());
//!
//! let task = XorTask;
//! let evolution_config = EvolutionConfig::default();
//! let trainer = Trainer::new(
//!     &task,
//!     TrainingConfig {
//!         simulations_at_once: 50,
//!         kill_rate: 0.5,
//!     },
//! );
//! let incubator = Incubator::new(&evolution_config);
//! let mut builder = SpeciesBuilder::new(SpeciesConfig::default());
//! let token = CancellationToken::new();
//!
//! let mut genomes = task.initial_population(50, &mut registry);
//! for _ in 0..100 {
//!     let evaluated = trainer.run(genomes, &token);
//!     let species = builder.build(evaluated, &mut rng);
//!     let next = incubator.build_new_population(species, 0.5, 50, &mut registry, &mut rng);
//!     genomes = next.into_iter().flat_map(Specie::into_genomes).collect();
//! }
//! ```

pub mod evolution;
pub mod genomics;
pub mod logging;
pub mod phenotypes;
pub mod populations;
pub mod speciation;
pub mod training;

/// Innovation numbers mark the historical origin of synapses,
/// which lets crossover and genetic distance align genomes
/// gene-by-gene without comparing structure.
pub type Innovation = u32;
