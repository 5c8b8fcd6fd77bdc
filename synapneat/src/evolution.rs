//! Crossover and the mutation battery.

mod config;

pub use config::EvolutionConfig;

use crate::genomics::{
    ActivationType, Genotype, InnovationRegistry, Neuron, NeuronId, NeuronType, Synapse,
};
use crate::Innovation;

use ahash::RandomState;
use rand::prelude::*;

use std::collections::{HashMap, HashSet};

const WEIGHT_NUDGE_POWER: f32 = 0.5;
const BIAS_NUDGE_POWER: f32 = 1.0;

/// Breeds a child by crossover of the parents followed by the
/// mutation battery.
pub fn make_child(
    parent1: &Genotype,
    parent2: &Genotype,
    prefer_parent1: bool,
    registry: &mut InnovationRegistry,
    config: &EvolutionConfig,
    rng: &mut impl Rng,
) -> Genotype {
    let child = crossover(parent1, parent2, prefer_parent1, rng);
    mutate(child, registry, config, rng)
}

/// Produces a child genome by aligning the parents' synapses on
/// innovation number.
///
/// Matched genes pick one parent's copy at random. Disjoint genes
/// (unmatched, within the shared innovation range) are always
/// inherited; excess genes (beyond the shared range) only from the
/// preferred parent. Neurons are the union of both parents' neurons,
/// kept when a surviving synapse references them or their type is
/// not Hidden.
///
/// The child receives a fresh identity, the preferred parent's
/// generation plus one, and the parents' average fitness as its
/// starting fitness.
pub fn crossover(
    parent1: &Genotype,
    parent2: &Genotype,
    prefer_parent1: bool,
    rng: &mut impl Rng,
) -> Genotype {
    let boundary = parent1
        .max_innovation()
        .unwrap_or(0)
        .min(parent2.max_innovation().unwrap_or(0));

    let by_innovation2: HashMap<Innovation, &Synapse, RandomState> = parent2
        .synapses()
        .iter()
        .map(|s| (s.innovation(), s))
        .collect();

    let mut synapses: Vec<Synapse> = Vec::new();
    let mut seen: HashSet<Innovation, RandomState> = HashSet::default();
    for synapse in parent1.synapses() {
        if !seen.insert(synapse.innovation()) {
            continue;
        }
        match by_innovation2.get(&synapse.innovation()) {
            Some(other) => {
                synapses.push(if rng.gen_bool(0.5) {
                    synapse.clone()
                } else {
                    (*other).clone()
                });
            }
            None => {
                if synapse.innovation() <= boundary || prefer_parent1 {
                    synapses.push(synapse.clone());
                }
            }
        }
    }
    for synapse in parent2.synapses() {
        if seen.contains(&synapse.innovation()) {
            continue;
        }
        if synapse.innovation() <= boundary || !prefer_parent1 {
            synapses.push(synapse.clone());
        }
    }

    let referenced: HashSet<NeuronId, RandomState> = synapses
        .iter()
        .flat_map(|s| [s.source(), s.target()])
        .collect();
    let mut neurons: Vec<Neuron> = Vec::new();
    let mut neuron_ids: HashSet<NeuronId, RandomState> = HashSet::default();
    for neuron in parent1.neurons().iter().chain(parent2.neurons()) {
        if !neuron_ids.insert(neuron.id()) {
            continue;
        }
        if referenced.contains(&neuron.id()) || neuron.kind() != NeuronType::Hidden {
            neurons.push(neuron.clone());
        }
    }

    let preferred = if prefer_parent1 { parent1 } else { parent2 };
    Genotype::offspring(
        neurons,
        synapses,
        preferred.generation() + 1,
        (parent1.fitness() + parent2.fitness()) / 2.0,
    )
}

/// Runs the mutation battery over a genome. Each operator fires
/// independently with its configured chance; operator eligibility is
/// judged against the genome entering the battery.
pub fn mutate(
    genome: Genotype,
    registry: &mut InnovationRegistry,
    config: &EvolutionConfig,
    rng: &mut impl Rng,
) -> Genotype {
    let has_enabled = genome.enabled_synapses().next().is_some();
    let has_disabled = genome.synapses().iter().any(|s| !s.is_enabled());
    let has_synapses = !genome.synapses().is_empty();
    let hidden_count = genome.neurons_of(NeuronType::Hidden).count();
    let under_cap = config
        .max_hidden_neurons
        .map_or(true, |cap| hidden_count < cap);

    let mut child = genome;
    if has_enabled && rng.gen::<f32>() < config.weight_nudge_chance {
        child = nudge_synapse_weight(child, config, rng);
    }
    if has_enabled && rng.gen::<f32>() < config.weight_reset_chance {
        child = reset_synapse_weight(child, config, rng);
    }
    if hidden_count > 0 && rng.gen::<f32>() < config.activation_replace_chance {
        child = replace_activation(child, config, rng);
    }
    if hidden_count > 0 && rng.gen::<f32>() < config.bias_nudge_chance {
        child = nudge_bias(child, rng);
    }
    if rng.gen::<f32>() < config.synapse_add_chance {
        child = add_synapse(child, registry, config, rng);
    }
    if rng.gen::<f32>() < config.direct_synapse_add_chance {
        child = add_direct_synapse(child, registry, config, rng);
    }
    if has_enabled && rng.gen::<f32>() < config.synapse_disable_chance {
        child = disable_synapse(child, rng);
    }
    if has_disabled && rng.gen::<f32>() < config.synapse_enable_chance {
        child = enable_synapse(child, rng);
    }
    if has_synapses && rng.gen::<f32>() < config.synapse_toggle_chance {
        child = toggle_synapse(child, rng);
    }
    if has_enabled && under_cap && rng.gen::<f32>() < config.neuron_add_chance {
        child = add_hidden_neuron(child, registry, config, rng);
    }
    if hidden_count > 0 && rng.gen::<f32>() < config.neuron_remove_chance {
        child = remove_hidden_neuron(child, rng);
    }
    child
}

fn enabled_indices(genome: &Genotype) -> Vec<usize> {
    genome
        .synapses()
        .iter()
        .enumerate()
        .filter(|(_, s)| s.is_enabled())
        .map(|(index, _)| index)
        .collect()
}

fn nudge_synapse_weight(
    mut child: Genotype,
    config: &EvolutionConfig,
    rng: &mut impl Rng,
) -> Genotype {
    let indices = enabled_indices(&child);
    let index = match indices.choose(rng) {
        Some(&index) => index,
        None => return child,
    };
    let (min, max) = config.weight_range;
    let delta = rng.gen_range(-1.0..1.0) * WEIGHT_NUDGE_POWER;
    let synapse = &mut child.synapses_mut()[index];
    let old = synapse.weight();
    let mut new = (old + delta).clamp(min, max);
    // A nudge swallowed by the clamp retries in the other direction.
    if (new - old).abs() < f32::EPSILON {
        new = (old - delta).clamp(min, max);
    }
    synapse.set_weight(new);
    child
}

fn reset_synapse_weight(
    mut child: Genotype,
    config: &EvolutionConfig,
    rng: &mut impl Rng,
) -> Genotype {
    let indices = enabled_indices(&child);
    let index = match indices.choose(rng) {
        Some(&index) => index,
        None => return child,
    };
    let weight = rng.gen_range(config.weight_range.0..=config.weight_range.1);
    child.synapses_mut()[index].set_weight(weight);
    child
}

fn replace_activation(mut child: Genotype, config: &EvolutionConfig, rng: &mut impl Rng) -> Genotype {
    let ids: Vec<NeuronId> = child.neurons_of(NeuronType::Hidden).map(|n| n.id()).collect();
    if let Some(&id) = ids.choose(rng) {
        let activation = ActivationType::random(rng, &config.activation_weight_overrides);
        if let Some(neuron) = child.neuron_mut(id) {
            neuron.set_activation(activation);
        }
    }
    child
}

fn nudge_bias(mut child: Genotype, rng: &mut impl Rng) -> Genotype {
    let ids: Vec<NeuronId> = child.neurons_of(NeuronType::Hidden).map(|n| n.id()).collect();
    if let Some(&id) = ids.choose(rng) {
        let delta = rng.gen_range(-1.0..1.0) * BIAS_NUDGE_POWER;
        if let Some(neuron) = child.neuron_mut(id) {
            let bias = neuron.bias();
            neuron.set_bias(bias + delta);
        }
    }
    child
}

fn add_synapse(
    mut child: Genotype,
    registry: &mut InnovationRegistry,
    config: &EvolutionConfig,
    rng: &mut impl Rng,
) -> Genotype {
    let mut sources: Vec<NeuronId> = child
        .neurons()
        .iter()
        .filter(|n| n.kind() != NeuronType::Output)
        .map(|n| n.id())
        .collect();
    sources.shuffle(rng);
    for source in sources {
        let mut targets: Vec<NeuronId> = child
            .neurons()
            .iter()
            .filter(|n| !n.kind().is_stimulus())
            .filter(|n| !child.has_synapse(source, n.id()))
            .map(|n| n.id())
            .collect();
        targets.shuffle(rng);
        let target = match targets.first() {
            Some(&target) => target,
            None => continue,
        };
        if !config.allow_recurrent && creates_cycle(&child, source, target) {
            continue;
        }
        let weight = rng.gen_range(config.weight_range.0..=config.weight_range.1);
        let innovation = registry.innovation(source, target);
        child
            .synapses_mut()
            .push(Synapse::new(innovation, source, target, weight));
        return child;
    }
    child
}

/// Whether adding `source -> target` would close a cycle, i.e.
/// whether `target` is already reachable walking synapses backward
/// from `source`. Disabled synapses count; re-enabling must not be
/// able to close a cycle later.
fn creates_cycle(child: &Genotype, source: NeuronId, target: NeuronId) -> bool {
    let mut visited: HashSet<NeuronId, RandomState> = HashSet::default();
    let mut stack = vec![source];
    while let Some(id) = stack.pop() {
        if id == target {
            return true;
        }
        if !visited.insert(id) {
            continue;
        }
        for synapse in child.synapses() {
            if synapse.target() == id {
                stack.push(synapse.source());
            }
        }
    }
    false
}

fn add_direct_synapse(
    mut child: Genotype,
    registry: &mut InnovationRegistry,
    config: &EvolutionConfig,
    rng: &mut impl Rng,
) -> Genotype {
    let mut sources: Vec<NeuronId> = child
        .neurons()
        .iter()
        .filter(|n| n.kind().is_stimulus())
        .map(|n| n.id())
        .collect();
    sources.shuffle(rng);
    for source in sources {
        let mut targets: Vec<NeuronId> = child
            .neurons_of(NeuronType::Output)
            .filter(|n| {
                !child
                    .synapses()
                    .iter()
                    .any(|s| s.is_enabled() && s.source() == source && s.target() == n.id())
            })
            .map(|n| n.id())
            .collect();
        targets.shuffle(rng);
        if let Some(&target) = targets.first() {
            // A matching disabled synapse is revived instead of duplicated.
            let existing = child
                .synapses()
                .iter()
                .position(|s| s.source() == source && s.target() == target);
            match existing {
                Some(index) => child.synapses_mut()[index].enable(),
                None => {
                    let weight = rng.gen_range(config.weight_range.0..=config.weight_range.1);
                    let innovation = registry.innovation(source, target);
                    child
                        .synapses_mut()
                        .push(Synapse::new(innovation, source, target, weight));
                }
            }
            return child;
        }
    }
    child
}

fn disable_synapse(mut child: Genotype, rng: &mut impl Rng) -> Genotype {
    let indices = enabled_indices(&child);
    if let Some(&index) = indices.choose(rng) {
        child.synapses_mut()[index].disable();
    }
    child
}

fn enable_synapse(mut child: Genotype, rng: &mut impl Rng) -> Genotype {
    let indices: Vec<usize> = child
        .synapses()
        .iter()
        .enumerate()
        .filter(|(_, s)| !s.is_enabled())
        .map(|(index, _)| index)
        .collect();
    if let Some(&index) = indices.choose(rng) {
        child.synapses_mut()[index].enable();
    }
    child
}

fn toggle_synapse(mut child: Genotype, rng: &mut impl Rng) -> Genotype {
    if child.synapses().is_empty() {
        return child;
    }
    let index = rng.gen_range(0..child.synapses().len());
    child.synapses_mut()[index].toggle();
    child
}

fn add_hidden_neuron(
    mut child: Genotype,
    registry: &mut InnovationRegistry,
    config: &EvolutionConfig,
    rng: &mut impl Rng,
) -> Genotype {
    let mut candidates = enabled_indices(&child);
    if candidates.is_empty() {
        return child;
    }
    // Prefer splitting synapses whose endpoints are not already
    // Hidden or Bias, so depth grows near the network's surface.
    candidates.shuffle(rng);
    let low_priority = |id: NeuronId| {
        matches!(
            child
                .neuron(id)
                .unwrap_or_else(|| panic!("synapse references missing neuron {}", id))
                .kind(),
            NeuronType::Hidden | NeuronType::Bias
        )
    };
    candidates.sort_by_key(|&index| {
        let synapse = &child.synapses()[index];
        low_priority(synapse.source()) || low_priority(synapse.target())
    });
    let take = rng.gen_range(1..=candidates.len());
    let index = match candidates[..take].choose(rng) {
        Some(&index) => index,
        None => return child,
    };

    let (source, target, weight) = {
        let synapse = &child.synapses()[index];
        (synapse.source(), synapse.target(), synapse.weight())
    };
    let neuron = Neuron::new(
        NeuronType::Hidden,
        ActivationType::random(rng, &config.activation_weight_overrides),
    );
    let id = neuron.id();
    let into_innovation = registry.innovation(source, id);
    let from_innovation = registry.innovation(id, target);

    child.synapses_mut()[index].disable();
    child.neurons_mut().push(neuron);
    child
        .synapses_mut()
        .push(Synapse::new(into_innovation, source, id, 1.0));
    child
        .synapses_mut()
        .push(Synapse::new(from_innovation, id, target, weight));
    child
}

fn remove_hidden_neuron(mut child: Genotype, rng: &mut impl Rng) -> Genotype {
    let ids: Vec<NeuronId> = child.neurons_of(NeuronType::Hidden).map(|n| n.id()).collect();
    if let Some(&id) = ids.choose(rng) {
        child.neurons_mut().retain(|n| n.id() != id);
        child
            .synapses_mut()
            .retain(|s| s.source() != id && s.target() != id);
    }
    child
}
