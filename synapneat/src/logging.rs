//! Per-generation statistics and champion tracking.

use crate::genomics::Genotype;
use crate::speciation::Specie;

use std::fmt;

/// Summary statistics over a set of fitness values.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Stats {
    pub maximum: f32,
    pub minimum: f32,
    pub mean: f32,
    pub median: f32,
}

impl Stats {
    /// Computes the statistics, or `None` for an empty set.
    pub fn from(values: impl Iterator<Item = f32>) -> Option<Stats> {
        let mut values: Vec<f32> = values.collect();
        if values.is_empty() {
            return None;
        }
        values.sort_by(|a, b| {
            a.partial_cmp(b)
                .unwrap_or_else(|| panic!("uncomparable fitness value detected"))
        });
        let median = if values.len() % 2 == 1 {
            values[values.len() / 2]
        } else {
            (values[values.len() / 2 - 1] + values[values.len() / 2]) / 2.0
        };
        Some(Stats {
            maximum: values[values.len() - 1],
            minimum: values[0],
            mean: values.iter().sum::<f32>() / values.len() as f32,
            median,
        })
    }
}

impl fmt::Display for Stats {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "max {:.4}, min {:.4}, mean {:.4}, median {:.4}",
            self.maximum, self.minimum, self.mean, self.median
        )
    }
}

/// How much each generation log retains.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportingLevel {
    /// Statistics plus a clone of the generation's fittest genome.
    Champion,
    /// Statistics only.
    SummaryOnly,
}

/// One generation's record.
#[derive(Clone, Debug)]
pub struct GenerationLog {
    pub iteration: u64,
    pub species_count: usize,
    pub specie_sizes: Vec<usize>,
    pub fitness: Option<Stats>,
    pub champion: Option<Genotype>,
}

impl fmt::Display for GenerationLog {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "generation {}: {} species {:?}",
            self.iteration, self.species_count, self.specie_sizes
        )?;
        if let Some(stats) = &self.fitness {
            write!(f, ", fitness {}", stats)?;
        }
        Ok(())
    }
}

/// Accumulates [`GenerationLog`]s over a training run.
pub struct EvolutionLogger {
    level: ReportingLevel,
    logs: Vec<GenerationLog>,
}

impl EvolutionLogger {
    pub fn new(level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            level,
            logs: Vec::new(),
        }
    }

    /// Records one generation.
    pub fn log(&mut self, iteration: u64, species: &[Specie]) {
        let fitness = Stats::from(
            species
                .iter()
                .flat_map(|s| s.genomes())
                .map(|g| g.fitness()),
        );
        let champion = match self.level {
            ReportingLevel::SummaryOnly => None,
            ReportingLevel::Champion => species
                .iter()
                .filter(|s| !s.is_empty())
                .map(|s| s.champion())
                .max_by(|a, b| {
                    a.fitness()
                        .partial_cmp(&b.fitness())
                        .unwrap_or_else(|| panic!("uncomparable fitness value detected"))
                })
                .cloned(),
        };
        self.logs.push(GenerationLog {
            iteration,
            species_count: species.len(),
            specie_sizes: species.iter().map(Specie::len).collect(),
            fitness,
            champion,
        });
    }

    pub fn logs(&self) -> &[GenerationLog] {
        &self.logs
    }

    pub fn last(&self) -> Option<&GenerationLog> {
        self.logs.last()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ActivationType, Neuron, NeuronId, NeuronType, Synapse};

    fn genome(fitness: f32) -> Genotype {
        let input = Neuron::with_id(NeuronId::from(1), NeuronType::Input, ActivationType::Identity);
        let output =
            Neuron::with_id(NeuronId::from(2), NeuronType::Output, ActivationType::Identity);
        let synapse = Synapse::new(0, NeuronId::from(1), NeuronId::from(2), 1.0);
        let mut genome = Genotype::new(vec![input, output], vec![synapse]);
        genome.set_fitness(fitness);
        genome
    }

    #[test]
    fn stats_summarize_the_distribution() {
        let stats = Stats::from([3.0, 1.0, 4.0, 2.0].into_iter()).unwrap();
        assert_eq!(stats.maximum, 4.0);
        assert_eq!(stats.minimum, 1.0);
        assert_eq!(stats.mean, 2.5);
        assert_eq!(stats.median, 2.5);
    }

    #[test]
    fn stats_of_nothing_are_nothing() {
        assert_eq!(Stats::from(std::iter::empty()), None);
    }

    #[test]
    fn the_champion_is_the_fittest_across_species() {
        let species = vec![
            Specie::new(vec![genome(1.0), genome(3.0)]),
            Specie::new(vec![genome(2.0)]),
        ];
        let mut logger = EvolutionLogger::new(ReportingLevel::Champion);
        logger.log(7, &species);
        let log = logger.last().unwrap();
        assert_eq!(log.iteration, 7);
        assert_eq!(log.specie_sizes, vec![2, 1]);
        assert_eq!(log.champion.as_ref().unwrap().fitness(), 3.0);
    }

    #[test]
    fn summary_only_drops_the_champion() {
        let species = vec![Specie::new(vec![genome(5.0)])];
        let mut logger = EvolutionLogger::new(ReportingLevel::SummaryOnly);
        logger.log(0, &species);
        let log = logger.last().unwrap();
        assert!(log.champion.is_none());
        assert_eq!(log.fitness.unwrap().maximum, 5.0);
    }
}
