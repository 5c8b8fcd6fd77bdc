//! Generation turnover: culling, offspring allotment and
//! reproduction.

use crate::evolution::{self, EvolutionConfig};
use crate::genomics::{Genotype, InnovationRegistry};
use crate::speciation::Specie;

use rand::prelude::*;

/// Share of the population fitness range a lone genome must clear to
/// keep its own specie through culling.
const DEFAULT_SINGLETON_RETENTION: f32 = 0.5;

/// Turns an evaluated, speciated generation into the next one.
pub struct Incubator<'a> {
    config: &'a EvolutionConfig,
    singleton_retention: f32,
}

impl<'a> Incubator<'a> {
    pub fn new(config: &'a EvolutionConfig) -> Incubator<'a> {
        Incubator {
            config,
            singleton_retention: DEFAULT_SINGLETON_RETENTION,
        }
    }

    /// Overrides the fitness-range share a singleton specie must
    /// clear to survive culling.
    pub fn with_singleton_retention(mut self, retention: f32) -> Incubator<'a> {
        self.singleton_retention = retention;
        self
    }

    /// Produces the next generation. Each specie is culled down to
    /// its fittest members, offspring counts are allotted in
    /// proportion to specie fitness, and species fill back up through
    /// crossover and mutation. The returned species hold exactly
    /// `target_count` genomes in total.
    pub fn build_new_population(
        &self,
        species: Vec<Specie>,
        kill_rate: f32,
        target_count: usize,
        registry: &mut InnovationRegistry,
        rng: &mut impl Rng,
    ) -> Vec<Specie> {
        let culled = self.cull(species, kill_rate, rng);
        let culled_total: usize = culled.iter().map(Specie::len).sum();
        if culled_total == target_count {
            return culled;
        }
        allot_offspring(culled, target_count, rng)
            .into_iter()
            .map(|(specie, count)| self.produce(specie, count, registry, rng))
            .collect()
    }

    fn cull(&self, species: Vec<Specie>, kill_rate: f32, rng: &mut impl Rng) -> Vec<Specie> {
        let total: usize = species.iter().map(Specie::len).sum();
        if total == 0 {
            return Vec::new();
        }
        let fitnesses = || species.iter().flat_map(|s| s.genomes()).map(|g| g.fitness());
        let best = fitnesses().fold(f32::NEG_INFINITY, f32::max);
        let worst = fitnesses().fold(f32::INFINITY, f32::min);
        let retention_bar = worst + (best - worst) * self.singleton_retention;

        let mut survivors = Vec::new();
        let mut graveyard: Vec<Genotype> = Vec::new();
        for specie in species {
            let mut genomes = specie.into_genomes();
            sort_by_fitness(&mut genomes, rng);
            let keep = ((genomes.len() as f32 * (1.0 - kill_rate)).round() as usize).max(1);
            graveyard.extend(genomes.split_off(keep.min(genomes.len())));
            if genomes.len() == 1 && genomes[0].fitness() <= retention_bar {
                // A lone genome earns its specie only by standing out.
                graveyard.extend(genomes);
                continue;
            }
            survivors.push(Specie::new(genomes));
        }
        if survivors.is_empty() {
            sort_by_fitness(&mut graveyard, rng);
            let keep = ((total as f32 * kill_rate).round() as usize).max(1);
            graveyard.truncate(keep);
            survivors.push(Specie::new(graveyard));
        }
        survivors
    }

    fn produce(
        &self,
        specie: Specie,
        count: usize,
        registry: &mut InnovationRegistry,
        rng: &mut impl Rng,
    ) -> Specie {
        let mut genomes = specie.into_genomes();
        if count <= genomes.len() {
            sort_by_fitness(&mut genomes, rng);
            genomes.truncate(count);
            return Specie::new(genomes);
        }
        if genomes.is_empty() {
            panic!("cannot breed offspring from an empty specie");
        }
        let mut children = Vec::with_capacity(count - genomes.len());
        for _ in 0..count - genomes.len() {
            let first = rng.gen_range(0..genomes.len());
            let second = if genomes.len() == 1 {
                first
            } else {
                let mut second = rng.gen_range(0..genomes.len() - 1);
                if second >= first {
                    second += 1;
                }
                second
            };
            let (parent1, parent2) = (&genomes[first], &genomes[second]);
            children.push(evolution::make_child(
                parent1,
                parent2,
                parent1.fitness() > parent2.fitness(),
                registry,
                self.config,
                rng,
            ));
        }
        genomes.extend(children);
        Specie::new(genomes)
    }
}

/// Distributes `target` offspring slots over the species in
/// proportion to their blended fitness. Rounding drift is repaired by
/// randomly adjusting entries until the sum is exact; species allotted
/// nothing are dropped. A population whose fitness sums to nothing
/// collapses into a single specie granted the full target.
fn allot_offspring(
    species: Vec<Specie>,
    target: usize,
    rng: &mut impl Rng,
) -> Vec<(Specie, usize)> {
    let total_fitness: f32 = species.iter().map(|s| s.average_fitness()).sum();
    if total_fitness.abs() < 1e-6 {
        let genomes: Vec<Genotype> = species.into_iter().flat_map(Specie::into_genomes).collect();
        return vec![(Specie::new(genomes), target)];
    }

    let shares: Vec<usize> = species
        .iter()
        .map(|s| (s.average_fitness() / total_fitness * target as f32).round() as usize)
        .collect();
    let mut allotments: Vec<(Specie, usize)> = species.into_iter().zip(shares).collect();
    if allotments.iter().all(|(_, share)| *share == 0) {
        let fittest = allotments
            .iter()
            .enumerate()
            .max_by(|(_, (a, _)), (_, (b, _))| {
                a.average_fitness()
                    .partial_cmp(&b.average_fitness())
                    .unwrap_or_else(|| panic!("uncomparable fitness value detected"))
            })
            .map(|(index, _)| index)
            .expect("no species to allot offspring to");
        allotments[fittest].1 = target;
    }
    allotments.retain(|(_, share)| *share > 0);

    let mut total: usize = allotments.iter().map(|(_, share)| *share).sum();
    while total != target {
        let index = rng.gen_range(0..allotments.len());
        if total < target {
            allotments[index].1 += 1;
            total += 1;
        } else if allotments[index].1 > 0 {
            allotments[index].1 -= 1;
            total -= 1;
        }
    }
    allotments.retain(|(_, share)| *share > 0);
    allotments
}

fn sort_by_fitness(genomes: &mut [Genotype], rng: &mut impl Rng) {
    // Shuffle first so the stable sort breaks fitness ties randomly.
    genomes.shuffle(rng);
    genomes.sort_by(|a, b| {
        b.fitness()
            .partial_cmp(&a.fitness())
            .unwrap_or_else(|| panic!("uncomparable fitness value detected"))
    });
}
