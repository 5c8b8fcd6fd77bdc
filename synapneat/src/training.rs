//! Parallel fitness evaluation.
//!
//! A [`Trainer`] hands the population out to a user-supplied
//! [`FitnessTask`] through a shared [`RoundRobin`] supply, runs many
//! simulations in parallel with `rayon`, and folds the reported
//! fitness back into the genomes.

use crate::genomics::{GenomeId, Genotype, InnovationRegistry};
use crate::speciation::Specie;

use ahash::RandomState;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

/// Cooperative stop signal shared between a trainer and its task.
///
/// Cloning yields a handle to the same flag.
#[derive(Clone, Debug, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> CancellationToken {
        CancellationToken::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Thread-safe cyclic dispenser. Simulations draw their contestants
/// from here, so a population smaller than the simulation count still
/// gets every genome evaluated.
#[derive(Debug)]
pub struct RoundRobin<T: Clone> {
    items: Vec<T>,
    cursor: Mutex<usize>,
}

impl<T: Clone> RoundRobin<T> {
    pub fn new(items: Vec<T>) -> RoundRobin<T> {
        RoundRobin {
            items,
            cursor: Mutex::new(0),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Clones out the next item, wrapping around at the end.
    ///
    /// # Panics
    /// Panics if the dispenser is empty.
    pub fn next(&self) -> T {
        if self.items.is_empty() {
            panic!("cannot draw from an empty dispenser");
        }
        let mut cursor = self
            .cursor
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let item = self.items[*cursor].clone();
        *cursor = (*cursor + 1) % self.items.len();
        item
    }

    /// Draws `count` items in dispenser order.
    pub fn take(&self, count: usize) -> Vec<T> {
        (0..count).map(|_| self.next()).collect()
    }

    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// Fitness assigned to one genome by one simulation.
#[derive(Clone, Debug)]
pub struct FitnessReport {
    pub genome: Genotype,
    pub fitness: f32,
}

/// A user-defined evaluation problem.
///
/// Implementations are shared across worker threads, so any state
/// beyond the arguments must be `Sync`.
pub trait FitnessTask: Sync {
    /// Builds the starting population, registering its synapses with
    /// the innovation registry.
    fn initial_population(
        &self,
        count: usize,
        registry: &mut InnovationRegistry,
    ) -> Vec<Genotype>;

    /// Runs one simulation. Contestants are drawn from `supply`;
    /// long-running simulations should poll `token` and bail out
    /// early when it trips.
    fn run_simulation(
        &self,
        supply: &RoundRobin<Genotype>,
        token: &CancellationToken,
    ) -> Vec<FitnessReport>;
}

#[derive(Clone, Debug)]
pub struct TrainingConfig {
    /// Simulations run per generation. Must be at least the
    /// population size or some genomes go unevaluated.
    pub simulations_at_once: usize,
    /// Share of each specie culled between generations.
    pub kill_rate: f32,
}

impl Default for TrainingConfig {
    fn default() -> TrainingConfig {
        TrainingConfig {
            simulations_at_once: 100,
            kill_rate: 0.5,
        }
    }
}

/// Evaluates generations of genomes against a [`FitnessTask`].
pub struct Trainer<'a, T: FitnessTask> {
    task: &'a T,
    config: TrainingConfig,
}

impl<'a, T: FitnessTask> Trainer<'a, T> {
    pub fn new(task: &'a T, config: TrainingConfig) -> Trainer<'a, T> {
        Trainer { task, config }
    }

    pub fn config(&self) -> &TrainingConfig {
        &self.config
    }

    /// Runs one generation of simulations and returns the genomes
    /// with their fitness set and age bumped. A genome drawn by
    /// several simulations keeps the last fitness reported for it.
    ///
    /// Returns an empty vector if `token` trips before the
    /// evaluations finish.
    pub fn run(&self, genomes: Vec<Genotype>, token: &CancellationToken) -> Vec<Genotype> {
        debug_assert!(
            self.config.simulations_at_once >= genomes.len(),
            "fewer simulations than genomes leaves some unevaluated"
        );
        let supply = RoundRobin::new(genomes);
        let reports: Vec<FitnessReport> = (0..self.config.simulations_at_once)
            .into_par_iter()
            .flat_map(|_| {
                if token.is_cancelled() {
                    Vec::new()
                } else {
                    self.task.run_simulation(&supply, token)
                }
            })
            .collect();
        if token.is_cancelled() {
            return Vec::new();
        }

        let scores: HashMap<GenomeId, f32, RandomState> = reports
            .into_iter()
            .map(|report| (report.genome.id(), report.fitness))
            .collect();
        let mut genomes = supply.into_items();
        for genome in &mut genomes {
            if let Some(&fitness) = scores.get(&genome.id()) {
                genome.set_fitness(fitness);
            }
            genome.increment_age();
        }
        genomes
    }
}

/// Serializable capture of a training run, sufficient to resume it.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct TrainingSnapshot {
    pub iteration: u64,
    pub species_threshold: f32,
    pub species: Vec<Specie>,
}
