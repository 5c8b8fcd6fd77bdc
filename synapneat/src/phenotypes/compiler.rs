use super::{ExecutionDependency, ExecutionItem, Phenotype, StructuralError};
use crate::genomics::{Genotype, Neuron, NeuronType, Synapse};

use ahash::RandomState;

use std::collections::{HashMap, HashSet};

pub(super) fn compile(genome: &Genotype) -> Result<Phenotype, StructuralError> {
    validate(genome)?;

    let neurons = genome.neurons();
    let index_of: HashMap<_, _, RandomState> = neurons
        .iter()
        .enumerate()
        .map(|(index, neuron)| (neuron.id(), index))
        .collect();
    let lookup = |id| {
        *index_of
            .get(&id)
            .unwrap_or_else(|| panic!("synapse references missing neuron {}", id))
    };

    // Enabled incoming synapses per neuron, in synapse order.
    let mut incoming: Vec<Vec<(usize, f32)>> = vec![Vec::new(); neurons.len()];
    for synapse in genome.enabled_synapses() {
        incoming[lookup(synapse.target())].push((lookup(synapse.source()), synapse.weight()));
    }
    // Incoming over all synapses, for the recurrence walk.
    let mut incoming_all: Vec<Vec<usize>> = vec![Vec::new(); neurons.len()];
    for synapse in genome.synapses() {
        incoming_all[lookup(synapse.target())].push(lookup(synapse.source()));
    }

    // Backward walk from each output. Every visited neuron yields one
    // plan slot; the first walk to reach a neuron claims it.
    let mut plan_targets = Vec::new();
    let mut claimed: HashSet<usize, RandomState> = HashSet::default();
    for (output, _) in neurons
        .iter()
        .enumerate()
        .filter(|(_, n)| n.kind() == NeuronType::Output)
    {
        let mut walk = Vec::new();
        let mut visited: HashSet<usize, RandomState> = HashSet::default();
        let mut stack = vec![output];
        while let Some(index) = stack.pop() {
            if !visited.insert(index) {
                continue;
            }
            walk.push(index);
            for (source, _) in incoming[index].iter().rev() {
                stack.push(*source);
            }
        }
        walk.reverse();
        for index in walk {
            if claimed.insert(index) {
                plan_targets.push(index);
            }
        }
    }

    let (live_neurons, _) = prune_dead_neurons(neurons, genome.synapses());
    let live: HashSet<_, RandomState> = live_neurons.iter().map(|n| n.id()).collect();

    let plan = plan_targets
        .into_iter()
        .filter(|&target| live.contains(&neurons[target].id()))
        .map(|target| {
            let neuron = &neurons[target];
            let dependencies = incoming[target]
                .iter()
                .filter(|(source, _)| live.contains(&neurons[*source].id()))
                .map(|&(source, weight)| ExecutionDependency { source, weight })
                .collect();
            ExecutionItem {
                target,
                recurrent: !neuron.kind().is_stimulus()
                    && !reaches_stimulus(neurons, &incoming_all, target),
                activation: neuron.activation(),
                bias: neuron.bias(),
                dependencies,
            }
        })
        .collect();

    let input_slots = neurons
        .iter()
        .enumerate()
        .filter(|(_, n)| n.kind() == NeuronType::Input)
        .map(|(index, _)| index)
        .collect();
    let bias_slot = neurons.iter().position(|n| n.kind() == NeuronType::Bias);
    let output_slots = neurons
        .iter()
        .enumerate()
        .filter(|(_, n)| n.kind() == NeuronType::Output)
        .map(|(index, n)| (index, n.id()))
        .collect();

    Ok(Phenotype::assemble(
        plan,
        neurons.len(),
        input_slots,
        bias_slot,
        output_slots,
    ))
}

fn validate(genome: &Genotype) -> Result<(), StructuralError> {
    let bias_count = genome.neurons_of(NeuronType::Bias).count();
    if bias_count > 1 {
        return Err(StructuralError::MultipleBiasNeurons(bias_count));
    }
    for synapse in genome.synapses() {
        let source = genome
            .neuron(synapse.source())
            .unwrap_or_else(|| panic!("synapse references missing neuron {}", synapse.source()));
        let target = genome
            .neuron(synapse.target())
            .unwrap_or_else(|| panic!("synapse references missing neuron {}", synapse.target()));
        if target.kind().is_stimulus() {
            return Err(StructuralError::SynapseIntoStimulus(target.id()));
        }
        if source.kind() == NeuronType::Output {
            return Err(StructuralError::SynapseOutOfOutput(source.id()));
        }
    }
    Ok(())
}

/// Whether any backward path over the genome's synapses, enabled or
/// not, leads from `start` to a stimulus neuron without revisiting
/// a node.
fn reaches_stimulus(neurons: &[Neuron], incoming_all: &[Vec<usize>], start: usize) -> bool {
    let mut visited: HashSet<usize, RandomState> = HashSet::default();
    let mut stack = vec![start];
    while let Some(index) = stack.pop() {
        if !visited.insert(index) {
            continue;
        }
        for &source in &incoming_all[index] {
            if neurons[source].kind().is_stimulus() {
                return true;
            }
            stack.push(source);
        }
    }
    false
}

/// Removes neurons that cannot carry signal, iterating to a fixed
/// point: Bias/Input neurons need an enabled outgoing synapse, Hidden
/// neurons need both directions, Output neurons an enabled incoming
/// one. Synapses touching removed neurons are dropped along the way,
/// disabled synapses up front. Running the pass again on its own
/// output removes nothing.
pub fn prune_dead_neurons(neurons: &[Neuron], synapses: &[Synapse]) -> (Vec<Neuron>, Vec<Synapse>) {
    let mut neurons: Vec<Neuron> = neurons.to_vec();
    let mut synapses: Vec<Synapse> = synapses.iter().filter(|s| s.is_enabled()).cloned().collect();
    loop {
        let before = neurons.len();
        neurons.retain(|neuron| {
            let has_incoming = synapses.iter().any(|s| s.target() == neuron.id());
            let has_outgoing = synapses.iter().any(|s| s.source() == neuron.id());
            match neuron.kind() {
                NeuronType::Bias | NeuronType::Input => has_outgoing,
                NeuronType::Hidden => has_incoming && has_outgoing,
                NeuronType::Output => has_incoming,
            }
        });
        if neurons.len() == before {
            break;
        }
        let ids: HashSet<_, RandomState> = neurons.iter().map(|n| n.id()).collect();
        synapses.retain(|s| ids.contains(&s.source()) && ids.contains(&s.target()));
    }
    (neurons, synapses)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{ActivationType, NeuronId};
    use crate::phenotypes::RunError;

    // Bias 0, Inputs 1-3, Hidden 4-7, Outputs 8-10. Neuron 4 and 7
    // are dead ends, output 9 is starved, and 5 feeds itself.
    fn example_genotype() -> Genotype {
        let kinds = [
            NeuronType::Bias,
            NeuronType::Input,
            NeuronType::Input,
            NeuronType::Input,
            NeuronType::Hidden,
            NeuronType::Hidden,
            NeuronType::Hidden,
            NeuronType::Hidden,
            NeuronType::Output,
            NeuronType::Output,
            NeuronType::Output,
        ];
        let neurons = kinds
            .iter()
            .enumerate()
            .map(|(id, &kind)| Neuron::with_id(NeuronId::from(id as u64), kind, ActivationType::Identity))
            .collect();
        let synapses = vec![
            Synapse::new(0, NeuronId::from(0), NeuronId::from(4), 0.0),
            Synapse::new(1, NeuronId::from(0), NeuronId::from(8), 0.75),
            Synapse::new(2, NeuronId::from(1), NeuronId::from(6), -0.2),
            Synapse::new(3, NeuronId::from(2), NeuronId::from(6), 0.22),
            Synapse::new(4, NeuronId::from(5), NeuronId::from(5), -0.1),
            Synapse::new(5, NeuronId::from(5), NeuronId::from(6), 0.1),
            Synapse::new(6, NeuronId::from(6), NeuronId::from(10), 0.31),
            Synapse::new(7, NeuronId::from(7), NeuronId::from(6), 0.0),
        ];
        Genotype::new(neurons, synapses)
    }

    fn dependency_set(phenotype: &Phenotype, target: usize) -> Vec<usize> {
        let mut sources: Vec<usize> = phenotype
            .plan()
            .iter()
            .find(|item| item.target() == target)
            .unwrap_or_else(|| panic!("no plan item for neuron {}", target))
            .dependencies()
            .iter()
            .map(|d| d.source())
            .collect();
        sources.sort_unstable();
        sources
    }

    #[test]
    fn example_compiles_to_seven_items() {
        let phenotype = Phenotype::compile(&example_genotype()).unwrap();
        assert_eq!(phenotype.plan().len(), 7);
        assert_eq!(dependency_set(&phenotype, 5), vec![5]);
        assert_eq!(dependency_set(&phenotype, 6), vec![1, 2, 5]);
        assert_eq!(dependency_set(&phenotype, 8), vec![0]);
        assert_eq!(dependency_set(&phenotype, 10), vec![6]);
    }

    #[test]
    fn dead_neurons_never_reach_the_plan() {
        let phenotype = Phenotype::compile(&example_genotype()).unwrap();
        for dead in [3, 4, 7, 9] {
            assert!(phenotype.plan().iter().all(|item| item.target() != dead));
        }
    }

    #[test]
    fn self_loop_is_marked_recurrent() {
        let phenotype = Phenotype::compile(&example_genotype()).unwrap();
        for item in phenotype.plan() {
            assert_eq!(item.is_recurrent(), item.target() == 5, "neuron {}", item.target());
        }
    }

    #[test]
    fn synapse_into_stimulus_is_refused() {
        let mut genome = example_genotype();
        let mut synapses = genome.synapses().to_vec();
        synapses.push(Synapse::new(99, NeuronId::from(2), NeuronId::from(1), 0.0));
        genome = Genotype::new(genome.neurons().to_vec(), synapses);
        assert_eq!(
            Phenotype::compile(&genome).unwrap_err(),
            StructuralError::SynapseIntoStimulus(NeuronId::from(1))
        );
    }

    #[test]
    fn synapse_out_of_output_is_refused() {
        let mut genome = example_genotype();
        let mut synapses = genome.synapses().to_vec();
        synapses.push(Synapse::new(99, NeuronId::from(8), NeuronId::from(10), 0.0));
        genome = Genotype::new(genome.neurons().to_vec(), synapses);
        assert_eq!(
            Phenotype::compile(&genome).unwrap_err(),
            StructuralError::SynapseOutOfOutput(NeuronId::from(8))
        );
    }

    #[test]
    fn second_bias_is_refused() {
        let genome = example_genotype();
        let mut neurons = genome.neurons().to_vec();
        neurons.push(Neuron::with_id(
            NeuronId::from(11),
            NeuronType::Bias,
            ActivationType::Identity,
        ));
        let genome = Genotype::new(neurons, genome.synapses().to_vec());
        assert_eq!(
            Phenotype::compile(&genome).unwrap_err(),
            StructuralError::MultipleBiasNeurons(2)
        );
    }

    #[test]
    fn pruning_reaches_a_fixed_point() {
        let genome = example_genotype();
        let (neurons, synapses) = prune_dead_neurons(genome.neurons(), genome.synapses());
        assert_eq!(neurons.len(), 7);
        let live: Vec<u64> = (0..11)
            .filter(|&id| neurons.iter().any(|n| n.id() == NeuronId::from(id)))
            .collect();
        assert_eq!(live, vec![0, 1, 2, 5, 6, 8, 10]);

        let (again_neurons, again_synapses) = prune_dead_neurons(&neurons, &synapses);
        assert_eq!(again_neurons.len(), neurons.len());
        assert_eq!(again_synapses.len(), synapses.len());
    }

    #[test]
    fn example_runs_end_to_end() {
        let mut phenotype = Phenotype::compile(&example_genotype()).unwrap();
        let outputs = phenotype.run(&[1.0, 1.0, 1.0]).unwrap();
        assert_eq!(outputs.len(), 3);
        // Output 8 sees only the bias synapse.
        assert!((outputs[&NeuronId::from(8)] - 0.75).abs() < 1e-6);
        // Output 9 is starved.
        assert_eq!(outputs[&NeuronId::from(9)], 0.0);
        // Output 10: inputs 1 and 2 feed neuron 6; the self-loop on 5
        // contributes nothing on the first run.
        let expected = (1.0 * -0.2 + 1.0 * 0.22) * 0.31;
        assert!((outputs[&NeuronId::from(10)] - expected).abs() < 1e-6);
        assert_eq!(
            phenotype.run(&[1.0]),
            Err(RunError::InputSizeMismatch {
                expected: 3,
                actual: 1
            })
        );
    }
}
