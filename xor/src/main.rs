use synapneat::evolution::EvolutionConfig;
use synapneat::genomics::{
    ActivationType, Genotype, InnovationRegistry, Neuron, NeuronId, NeuronType, Synapse,
};
use synapneat::logging::{EvolutionLogger, ReportingLevel};
use synapneat::phenotypes::Phenotype;
use synapneat::populations::Incubator;
use synapneat::speciation::{Specie, SpeciesBuilder, SpeciesConfig};
use synapneat::training::{
    CancellationToken, FitnessReport, FitnessTask, RoundRobin, Trainer, TrainingConfig,
    TrainingSnapshot,
};

use rand::prelude::*;

const POPULATION: usize = 50;
const MAX_ITERATIONS: u64 = 10_000;
const TARGET_FITNESS: f32 = 0.95;
const SNAPSHOT_PATH: &str = "xor_snapshot.ron";
const SNAPSHOT_EVERY: u64 = 100;
const REGISTRY_REBUILD_EVERY: u64 = 1_000;

const CASES: [([f32; 2], f32); 4] = [
    ([0.0, 0.0], 0.0),
    ([0.0, 1.0], 1.0),
    ([1.0, 0.0], 1.0),
    ([1.0, 1.0], 0.0),
];

struct XorTask;

impl XorTask {
    fn output_id() -> NeuronId {
        NeuronId::from(4)
    }
}

impl FitnessTask for XorTask {
    // Seed genomes share neuron ids so innovations align across the
    // population from the first generation.
    fn initial_population(
        &self,
        count: usize,
        registry: &mut InnovationRegistry,
    ) -> Vec<Genotype> {
        let left = NeuronId::from(0);
        let right = NeuronId::from(1);
        let hidden1 = NeuronId::from(2);
        let hidden2 = NeuronId::from(3);
        let output = XorTask::output_id();
        (0..count)
            .map(|_| {
                let neurons = vec![
                    Neuron::with_id(left, NeuronType::Input, ActivationType::Identity),
                    Neuron::with_id(right, NeuronType::Input, ActivationType::Identity),
                    Neuron::with_id(hidden1, NeuronType::Hidden, ActivationType::HyperbolicTangent),
                    Neuron::with_id(hidden2, NeuronType::Hidden, ActivationType::HyperbolicTangent),
                    Neuron::with_id(output, NeuronType::Output, ActivationType::HyperbolicTangent),
                ];
                let synapses = [hidden1, hidden2]
                    .iter()
                    .map(|&source| {
                        Synapse::new(registry.innovation(source, output), source, output, 0.0)
                    })
                    .collect();
                Genotype::new(neurons, synapses)
            })
            .collect()
    }

    fn run_simulation(
        &self,
        supply: &RoundRobin<Genotype>,
        _token: &CancellationToken,
    ) -> Vec<FitnessReport> {
        let genome = supply.next();
        let mut phenotype = match Phenotype::compile(&genome) {
            Ok(phenotype) => phenotype,
            Err(_) => {
                return vec![FitnessReport {
                    genome,
                    fitness: 0.0,
                }]
            }
        };

        let mut score = 0.0;
        for (inputs, expected) in CASES.iter() {
            phenotype.reset();
            let outputs = phenotype
                .run(inputs)
                .expect("the phenotype takes two inputs");
            let actual = outputs
                .get(&XorTask::output_id())
                .copied()
                .unwrap_or(0.0);
            score += 1.0 - (expected - actual).abs();
        }
        vec![FitnessReport {
            genome,
            fitness: score / CASES.len() as f32,
        }]
    }
}

fn read_snapshot(path: &str) -> Option<TrainingSnapshot> {
    let contents = std::fs::read_to_string(path).ok()?;
    ron::de::from_str(&contents).ok()
}

fn write_snapshot(path: &str, snapshot: &TrainingSnapshot) -> Result<(), String> {
    let contents = ron::ser::to_string(snapshot).map_err(|e| e.to_string())?;
    std::fs::write(path, contents).map_err(|e| e.to_string())
}

fn main() {
    let evolution_config = EvolutionConfig {
        direct_synapse_add_chance: 0.1,
        max_hidden_neurons: Some(8),
        ..EvolutionConfig::default()
    };
    let species_config = SpeciesConfig {
        target_count: 5,
        ..SpeciesConfig::default()
    };
    let training_config = TrainingConfig {
        simulations_at_once: 100,
        kill_rate: 0.5,
    };

    let task = XorTask;
    let trainer = Trainer::new(&task, training_config);
    let incubator = Incubator::new(&evolution_config);
    let mut registry = InnovationRegistry::new();
    let mut rng = rand::thread_rng();

    let (start_iteration, mut genomes, mut builder) = match read_snapshot(SNAPSHOT_PATH) {
        Some(snapshot) => {
            println!(
                "resuming from {} at iteration {}",
                SNAPSHOT_PATH, snapshot.iteration
            );
            let genomes: Vec<Genotype> = snapshot
                .species
                .into_iter()
                .flat_map(Specie::into_genomes)
                .collect();
            registry.rebuild(genomes.iter());
            let builder =
                SpeciesBuilder::with_threshold(species_config, snapshot.species_threshold);
            (snapshot.iteration + 1, genomes, builder)
        }
        None => {
            registry.rebuild(std::iter::empty::<&Genotype>());
            let genomes = task.initial_population(POPULATION, &mut registry);
            (0, genomes, SpeciesBuilder::new(species_config))
        }
    };

    let mut logger = EvolutionLogger::new(ReportingLevel::Champion);
    let token = CancellationToken::new();
    let mut best_fitness = f32::NEG_INFINITY;

    for iteration in start_iteration..MAX_ITERATIONS {
        let evaluated = trainer.run(genomes, &token);
        let species = builder.build(evaluated, &mut rng);
        logger.log(iteration, &species);
        let log = logger.last().expect("a generation was just logged");
        let champion_fitness = log.fitness.map(|stats| stats.maximum).unwrap_or(0.0);
        if champion_fitness > best_fitness {
            best_fitness = champion_fitness;
            println!("{}", log);
        }

        if iteration % SNAPSHOT_EVERY == 0 || champion_fitness >= TARGET_FITNESS {
            let snapshot = TrainingSnapshot {
                iteration,
                species_threshold: builder.threshold(),
                species: species.clone(),
            };
            if let Err(message) = write_snapshot(SNAPSHOT_PATH, &snapshot) {
                eprintln!("snapshot write failed: {}", message);
            }
        }

        if champion_fitness >= TARGET_FITNESS {
            if let Some(champion) = &log.champion {
                println!("solved at iteration {}:\n{}", iteration, champion);
            }
            return;
        }

        genomes = incubator
            .build_new_population(
                species,
                trainer.config().kill_rate,
                POPULATION,
                &mut registry,
                &mut rng,
            )
            .into_iter()
            .flat_map(Specie::into_genomes)
            .collect();
        if (iteration + 1) % REGISTRY_REBUILD_EVERY == 0 {
            registry.rebuild(genomes.iter());
        }
    }
    println!("iteration cap reached, best fitness {:.4}", best_fitness);
}
