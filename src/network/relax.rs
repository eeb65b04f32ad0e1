use super::{activate, Evaluator};
use crate::{
    config::RelaxationConfig,
    constants::LINEAGE_BIAS_VALUE,
    error::{NeatError, Result},
    genotype::{Genotype, NodeId, NodeKind},
};
use fxhash::{FxHashMap, FxHashSet};
use rulinalg::matrix::{BaseMatrix, Matrix};

/// A genotype compiled into dense matrices. Node `k` of the phenotype is the `k`th kept node of
/// the genotype by ascending id. Hidden nodes that reach no output through a non-zero weight are
/// left out, whatever values they take never arrive at an output.
#[derive(Debug, Clone)]
pub struct Phenotype {
    /// 1d values of nodes 0-N
    y: Matrix<f64>,
    /// Nd weights between nodes indexed as [from, to], each divided by the in-degree of `to`
    w: Matrix<f64>,
    /// whether a node takes its value from its enabled incoming connections
    driven: Vec<bool>,
    inputs: Vec<usize>,
    outputs: Vec<usize>,
    bias: Option<usize>,
}

/// Every node with a path of enabled, non-zero connections into an output, outputs included
fn feeding_outputs(genotype: &Genotype) -> FxHashSet<NodeId> {
    let mut live = genotype
        .nodes()
        .iter()
        .filter(|(_, kind)| **kind == NodeKind::Output)
        .map(|(id, _)| *id)
        .collect::<FxHashSet<_>>();
    let mut frontier = live.iter().copied().collect::<Vec<_>>();
    while let Some(target) = frontier.pop() {
        for c in genotype.connections() {
            if c.enabled && c.weight != 0. && c.target == target && live.insert(c.source) {
                frontier.push(c.source);
            }
        }
    }
    live
}

impl Phenotype {
    pub fn from_genotype(genotype: &Genotype) -> Self {
        let live = feeding_outputs(genotype);
        let kept = genotype
            .nodes()
            .iter()
            .filter(|(id, kind)| {
                live.contains(*id) || matches!(kind, NodeKind::Bias | NodeKind::Input)
            })
            .map(|(id, kind)| (*id, *kind))
            .collect::<Vec<_>>();
        let n = kept.len();
        let index = kept
            .iter()
            .enumerate()
            .map(|(k, (id, _))| (*id, k))
            .collect::<FxHashMap<_, _>>();

        // connections from dropped nodes still count towards the in-degree, they carry nothing
        let mut in_degree = vec![0usize; n];
        let mut w = vec![0.; n * n];
        let enabled = genotype
            .connections()
            .iter()
            .filter(|c| c.enabled && genotype.nodes().contains_key(&c.source))
            .filter_map(|c| Some((index.get(&c.source).copied(), *index.get(&c.target)?, c.weight)))
            .collect::<Vec<_>>();
        for (_, to, _) in enabled.iter() {
            in_degree[*to] += 1;
        }
        for (from, to, weight) in enabled {
            if let Some(from) = from {
                w[from * n + to] += weight / in_degree[to] as f64;
            }
        }

        let mut inputs = Vec::new();
        let mut outputs = Vec::new();
        let mut bias = None;
        let mut driven = Vec::with_capacity(n);
        for (k, (_, kind)) in kept.iter().enumerate() {
            match kind {
                NodeKind::Bias => bias = Some(k),
                NodeKind::Input => inputs.push(k),
                NodeKind::Output => outputs.push(k),
                NodeKind::Hidden => (),
            }
            driven.push(in_degree[k] > 0 && matches!(kind, NodeKind::Hidden | NodeKind::Output));
        }

        Self {
            y: Matrix::zeros(1, n),
            w: Matrix::new(n, n, w),
            driven,
            inputs,
            outputs,
            bias,
        }
    }

    /// Number of nodes kept after dropping those that reach no output
    pub fn node_len(&self) -> usize {
        self.driven.len()
    }

    pub fn input_len(&self) -> usize {
        self.inputs.len()
    }

    pub fn output(&self) -> Vec<f64> {
        self.outputs.iter().map(|k| self.y.data()[*k]).collect()
    }

    pub fn flush(&mut self) {
        self.y = Matrix::zeros(1, self.y.cols());
    }

    fn bind(&mut self, input: &[f64]) {
        let y = self.y.mut_data();
        for (k, v) in self.inputs.iter().zip(input) {
            y[*k] = *v;
        }
        if let Some(k) = self.bias {
            y[k] = LINEAGE_BIAS_VALUE;
        }
    }

    /// Sweep every enabled connection at once until the outputs settle, from a zeroed state.
    /// Settled means the summed output moved by at most `epsilon` per output, and no kept node
    /// moved by more than `epsilon`.
    pub fn relax<F: Fn(f64) -> f64>(
        &mut self,
        input: &[f64],
        epsilon: f64,
        max_iterations: usize,
        σ: F,
    ) -> Result<Vec<f64>> {
        if input.len() != self.inputs.len() {
            return Err(NeatError::ArityMismatch {
                expected: self.inputs.len(),
                found: input.len(),
            });
        }

        self.flush();
        self.bind(input);
        let tolerance = epsilon * self.outputs.len() as f64;

        for _ in 0..max_iterations {
            let sum = &self.y * &self.w;
            let before = self.output().iter().sum::<f64>();

            let mut moved = 0f64;
            {
                let y = self.y.mut_data();
                for (k, v) in sum.data().iter().enumerate() {
                    if self.driven[k] {
                        let next = σ(*v);
                        moved = moved.max((next - y[k]).abs());
                        y[k] = next;
                    }
                }
            }

            let after = self.output().iter().sum::<f64>();
            if (after - before).abs() <= tolerance && moved <= epsilon {
                return Ok(self.output());
            }
        }

        Err(NeatError::ConvergenceFailure {
            iterations: max_iterations,
            outputs: self.output(),
        })
    }
}

/// The evaluator used by fitness functions. Activation defaults to the identity.
#[derive(Debug, Clone, Copy)]
pub struct Relaxation {
    pub epsilon: f64,
    pub max_iterations: usize,
    pub activation: fn(f64) -> f64,
}

impl Default for Relaxation {
    fn default() -> Self {
        Self::new(&RelaxationConfig::default())
    }
}

impl Relaxation {
    pub fn new(config: &RelaxationConfig) -> Self {
        Self {
            epsilon: config.epsilon,
            max_iterations: config.max_iterations,
            activation: activate::identity,
        }
    }

    pub fn with_activation(self, activation: fn(f64) -> f64) -> Self {
        Self { activation, ..self }
    }
}

impl Evaluator for Relaxation {
    fn evaluate(&self, genotype: &Genotype, inputs: &[f64]) -> Result<Vec<f64>> {
        Phenotype::from_genotype(genotype).relax(
            inputs,
            self.epsilon,
            self.max_iterations,
            self.activation,
        )
    }
}
