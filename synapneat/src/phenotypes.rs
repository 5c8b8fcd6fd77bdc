//! Compilation of genotypes into runnable networks, and the networks
//! themselves.

mod compiler;
mod errors;

pub use compiler::prune_dead_neurons;
pub use errors::{RunError, StructuralError};

use crate::genomics::{ActivationType, Genotype, NeuronId};

use ahash::RandomState;

use std::collections::HashMap;

/// One weighted input of an execution item.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionDependency {
    pub(crate) source: usize,
    pub(crate) weight: f32,
}

impl ExecutionDependency {
    /// Index of the neuron whose activation is consumed.
    pub fn source(&self) -> usize {
        self.source
    }

    pub fn weight(&self) -> f32 {
        self.weight
    }
}

/// One step of a phenotype's execution plan: sum the dependencies'
/// activations, apply the target's activation function, and store
/// the result.
#[derive(Clone, Debug, PartialEq)]
pub struct ExecutionItem {
    pub(crate) target: usize,
    pub(crate) recurrent: bool,
    pub(crate) activation: ActivationType,
    pub(crate) bias: f32,
    pub(crate) dependencies: Vec<ExecutionDependency>,
}

impl ExecutionItem {
    /// Index of the neuron this item computes, in the genome's
    /// neuron order.
    pub fn target(&self) -> usize {
        self.target
    }

    /// Recurrent items write to the memory buffer instead of the
    /// activations, and take effect on the next run.
    pub fn is_recurrent(&self) -> bool {
        self.recurrent
    }

    pub fn dependencies(&self) -> &[ExecutionDependency] {
        &self.dependencies
    }
}

/// A compiled, runnable network.
///
/// Phenotypes are stateful: recurrent items write into a memory
/// buffer that is consumed at the start of the following run. Each
/// concurrent evaluation should therefore own its phenotype; they
/// are cheap to clone.
#[derive(Clone, Debug)]
pub struct Phenotype {
    plan: Vec<ExecutionItem>,
    activations: Vec<f32>,
    memory: Vec<Option<f32>>,
    input_slots: Vec<usize>,
    bias_slot: Option<usize>,
    output_slots: Vec<(usize, NeuronId)>,
}

impl Phenotype {
    /// Compiles a genome into a runnable network.
    ///
    /// # Errors
    /// Returns a [`StructuralError`] when the genome is structurally
    /// invalid: a synapse targets a Bias/Input neuron, a synapse
    /// leaves an Output neuron, or more than one Bias neuron exists.
    /// Such genomes are a normal outcome of mutation and are simply
    /// unfit for execution.
    ///
    /// # Panics
    /// Panics if a synapse references a neuron the genome does not
    /// contain.
    pub fn compile(genome: &Genotype) -> Result<Phenotype, StructuralError> {
        compiler::compile(genome)
    }

    /// Returns the execution plan.
    pub fn plan(&self) -> &[ExecutionItem] {
        &self.plan
    }

    /// Number of input values a run expects.
    pub fn input_count(&self) -> usize {
        self.input_slots.len()
    }

    /// Clears activations and memory, as if the phenotype had
    /// never run.
    pub fn reset(&mut self) {
        for activation in &mut self.activations {
            *activation = 0.0;
        }
        if let Some(bias) = self.bias_slot {
            self.activations[bias] = 1.0;
        }
        for slot in &mut self.memory {
            *slot = None;
        }
    }

    /// Executes one forward pass and returns the activation of every
    /// Output neuron. Output neurons removed by dead-code elimination
    /// report 0.0.
    ///
    /// # Errors
    /// Returns [`RunError::InputSizeMismatch`] when `inputs` does not
    /// match the genome's Input neuron count.
    pub fn run(&mut self, inputs: &[f32]) -> Result<HashMap<NeuronId, f32, RandomState>, RunError> {
        if inputs.len() != self.input_slots.len() {
            return Err(RunError::InputSizeMismatch {
                expected: self.input_slots.len(),
                actual: inputs.len(),
            });
        }

        for activation in &mut self.activations {
            *activation = 0.0;
        }
        if let Some(bias) = self.bias_slot {
            self.activations[bias] = 1.0;
        }
        for (slot, value) in self.input_slots.iter().zip(inputs) {
            self.activations[*slot] = *value;
        }
        for (slot, value) in self.memory.iter_mut().enumerate() {
            if let Some(value) = value.take() {
                self.activations[slot] = value;
            }
        }

        for item in &self.plan {
            // Stimulus leaves keep their seeded values.
            if item.dependencies.is_empty() {
                continue;
            }
            let sum: f32 = item
                .dependencies
                .iter()
                .map(|d| self.activations[d.source] * d.weight)
                .sum();
            let value = item.activation.apply(sum, item.bias);
            if item.recurrent {
                self.memory[item.target] = Some(value);
            } else {
                self.activations[item.target] = value;
            }
        }

        Ok(self
            .output_slots
            .iter()
            .map(|&(slot, id)| (id, self.activations[slot]))
            .collect())
    }

    pub(crate) fn assemble(
        plan: Vec<ExecutionItem>,
        neuron_count: usize,
        input_slots: Vec<usize>,
        bias_slot: Option<usize>,
        output_slots: Vec<(usize, NeuronId)>,
    ) -> Phenotype {
        let mut phenotype = Phenotype {
            plan,
            activations: vec![0.0; neuron_count],
            memory: vec![None; neuron_count],
            input_slots,
            bias_slot,
            output_slots,
        };
        if let Some(bias) = phenotype.bias_slot {
            phenotype.activations[bias] = 1.0;
        }
        phenotype
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::genomics::{Neuron, NeuronType, Synapse};

    fn feedforward_pair(weight: f32, output_bias: f32) -> Genotype {
        let input = Neuron::new(NeuronType::Input, ActivationType::Identity);
        let mut output = Neuron::new(NeuronType::Output, ActivationType::Identity);
        output.set_bias(output_bias);
        let synapse = Synapse::new(0, input.id(), output.id(), weight);
        Genotype::new(vec![input, output], vec![synapse])
    }

    #[test]
    fn input_size_mismatch_is_a_typed_error() {
        let genome = feedforward_pair(1.0, 0.0);
        let mut phenotype = Phenotype::compile(&genome).unwrap();
        assert_eq!(
            phenotype.run(&[1.0, 2.0]),
            Err(RunError::InputSizeMismatch {
                expected: 1,
                actual: 2
            })
        );
    }

    #[test]
    fn feedforward_values_flow_through() {
        let genome = feedforward_pair(2.0, 1.0);
        let output_id = genome.neurons()[1].id();
        let mut phenotype = Phenotype::compile(&genome).unwrap();
        let outputs = phenotype.run(&[3.0]).unwrap();
        assert_eq!(outputs[&output_id], 7.0);
    }

    #[test]
    fn bias_neuron_feeds_a_constant_one() {
        let bias = Neuron::new(NeuronType::Bias, ActivationType::Identity);
        let output = Neuron::new(NeuronType::Output, ActivationType::Identity);
        let output_id = output.id();
        let synapse = Synapse::new(0, bias.id(), output_id, 0.75);
        let genome = Genotype::new(vec![bias, output], vec![synapse]);

        let mut phenotype = Phenotype::compile(&genome).unwrap();
        let outputs = phenotype.run(&[]).unwrap();
        assert!((outputs[&output_id] - 0.75).abs() < 1e-6);
    }

    #[test]
    fn recurrent_memory_is_consumed_one_run_later() {
        // A self-looped hidden neuron with bias 1 counts runs; the
        // output mirrors the count with one run of delay.
        let bias = Neuron::new(NeuronType::Bias, ActivationType::Identity);
        let mut hidden = Neuron::new(NeuronType::Hidden, ActivationType::Identity);
        hidden.set_bias(1.0);
        let output = Neuron::new(NeuronType::Output, ActivationType::Identity);
        let output_id = output.id();
        let synapses = vec![
            Synapse::new(0, hidden.id(), hidden.id(), 1.0),
            Synapse::new(1, hidden.id(), output_id, 1.0),
            Synapse::new(2, bias.id(), output_id, 0.0),
        ];
        let genome = Genotype::new(vec![bias, hidden, output], synapses);

        let mut phenotype = Phenotype::compile(&genome).unwrap();
        let hidden_item = phenotype
            .plan()
            .iter()
            .find(|item| item.target() == 1)
            .unwrap();
        assert!(hidden_item.is_recurrent());

        assert_eq!(phenotype.run(&[]).unwrap()[&output_id], 0.0);
        assert_eq!(phenotype.run(&[]).unwrap()[&output_id], 1.0);
        assert_eq!(phenotype.run(&[]).unwrap()[&output_id], 2.0);

        phenotype.reset();
        assert_eq!(phenotype.run(&[]).unwrap()[&output_id], 0.0);
    }

    #[test]
    fn dead_outputs_report_zero() {
        let input = Neuron::new(NeuronType::Input, ActivationType::Identity);
        let fed = Neuron::new(NeuronType::Output, ActivationType::Identity);
        let starved = Neuron::new(NeuronType::Output, ActivationType::Identity);
        let fed_id = fed.id();
        let starved_id = starved.id();
        let synapse = Synapse::new(0, input.id(), fed_id, 1.0);
        let genome = Genotype::new(vec![input, fed, starved], vec![synapse]);

        let mut phenotype = Phenotype::compile(&genome).unwrap();
        let outputs = phenotype.run(&[5.0]).unwrap();
        assert_eq!(outputs[&fed_id], 5.0);
        assert_eq!(outputs[&starved_id], 0.0);
    }
}
