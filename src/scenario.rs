//! Driving a run: founders, then one evaluate and reproduce cycle per generation.

use crate::{
    config::RunConfig,
    error::Result,
    genotype::{Genotype, GenotypeSpec, NodeId, NodeKind},
    network::{activate, Evaluator, Relaxation},
    population::{founder_spec, Entrant, GenerationId, Ids, Individual, Population},
    random::WyRng,
    registry::Registry,
    reproduce::{reproduce, Newborn},
    species::SpeciesId,
    store::Repository,
};
use core::ops::ControlFlow;
use log::info;

#[cfg(feature = "parallel")]
use rayon::prelude::*;

/// A fitness function and the shape of the networks it scores
pub trait Scenario: Sync {
    /// input and output node counts
    fn io(&self) -> (usize, usize);

    fn eval(&self, genotype: &Genotype, evaluator: &impl Evaluator) -> f64;

    /// applied to every node the evaluator updates
    fn activation(&self) -> fn(f64) -> f64 {
        activate::identity
    }
}

/// What hooks see after every evaluation
#[derive(Debug, Clone, Copy)]
pub struct Stats<'a> {
    pub generation: GenerationId,
    pub species: usize,
    pub population: &'a Population,
}

impl<'a> Stats<'a> {
    pub fn fittest(&self) -> Option<&'a Individual> {
        self.population.fittest()
    }

    pub fn best_score(&self) -> Option<f64> {
        self.population.best_score()
    }
}

/// Called once per evaluated generation. Breaking ends the run before it reproduces.
pub trait Hook {
    fn on_generation(&mut self, stats: &Stats<'_>) -> ControlFlow<()>;
}

impl<F: FnMut(&Stats<'_>) -> ControlFlow<()>> Hook for F {
    fn on_generation(&mut self, stats: &Stats<'_>) -> ControlFlow<()> {
        self(stats)
    }
}

pub enum EvolutionTarget {
    Fitness(f64),
    Generation(usize),
}

impl EvolutionTarget {
    fn satisfied(&self, stats: &Stats<'_>) -> bool {
        match self {
            Self::Fitness(t) => stats.best_score().is_some_and(|s| s >= *t),
            Self::Generation(t) => *t <= stats.generation,
        }
    }
}

impl Hook for EvolutionTarget {
    fn on_generation(&mut self, stats: &Stats<'_>) -> ControlFlow<()> {
        if self.satisfied(stats) {
            ControlFlow::Break(())
        } else {
            ControlFlow::Continue(())
        }
    }
}

/// The state of one run. The run config is never cached here: every step that needs it reads
/// the latest one from the repository.
#[derive(Debug)]
pub struct Run<R: Repository> {
    registry: Registry,
    store: R,
    ids: Ids,
    population: Population,
    inputs: Vec<NodeId>,
    outputs: Vec<NodeId>,
    rng: WyRng,
}

impl<R: Repository> Run<R> {
    /// Create the founder nodes and generation 0: every input and the bias wired to every
    /// output, weights uniform in `[-1, 1]`
    pub fn initialize(scenario: &impl Scenario, mut store: R, mut rng: WyRng) -> Result<Self> {
        let config = store.load_config()?;
        let mut registry = Registry::new();
        let (i, o) = scenario.io();
        let inputs = (0..i)
            .map(|_| registry.create_node(NodeKind::Input))
            .collect::<Result<Vec<_>>>()?;
        let outputs = (0..o)
            .map(|_| registry.create_node(NodeKind::Output))
            .collect::<Result<Vec<_>>>()?;

        let mut entrants = Vec::with_capacity(config.population_size);
        for _ in 0..config.population_size {
            let spec = founder_spec(registry.bias(), &inputs, &outputs, &mut rng);
            entrants.push(Entrant {
                genotype: store_genotype(&mut store, &spec, &mut registry)?,
                species: None,
            });
        }

        let mut ids = Ids::default();
        let population = Population::assemble(entrants, &config, &mut ids)?;
        info!(
            "run {:x}: {} founders with {} inputs and {} outputs",
            registry.run_id(),
            population.len(),
            i,
            o
        );

        Ok(Self {
            registry,
            store,
            ids,
            population,
            inputs,
            outputs,
            rng,
        })
    }

    pub fn evaluator(&self, scenario: &impl Scenario) -> Result<Relaxation> {
        let config = self.store.load_config()?;
        Ok(Relaxation::new(&config.relaxation).with_activation(scenario.activation()))
    }

    /// Score every individual of the current population
    pub fn evaluate<S: Scenario>(&mut self, scenario: &S) -> Result<()> {
        let evaluator = self.evaluator(scenario)?;

        #[cfg(feature = "parallel")]
        self.population
            .individuals_mut()
            .par_iter_mut()
            .for_each(|ind| {
                let score = scenario.eval(ind.genotype(), &evaluator);
                ind.set_score(score)
            });

        #[cfg(not(feature = "parallel"))]
        for ind in self.population.individuals_mut() {
            let score = scenario.eval(ind.genotype(), &evaluator);
            ind.set_score(score)
        }

        Ok(())
    }

    /// Replace the population with the offspring of the current one
    pub fn advance(&mut self) -> Result<()> {
        let config = self.store.load_config()?;
        let newborns = reproduce(&self.population, &config, &mut self.registry, &mut self.rng)?;

        let mut entrants = Vec::with_capacity(newborns.len());
        for Newborn { spec, species } in newborns {
            entrants.push(Entrant {
                genotype: store_genotype(&mut self.store, &spec, &mut self.registry)?,
                species,
            });
        }

        self.population = Population::assemble(entrants, &config, &mut self.ids)?;
        info!(
            "generation {}: {} species, {} nodes, {} innovations",
            self.population.generation(),
            self.population.species().len(),
            self.registry.node_count(),
            self.registry.innovation_count()
        );
        Ok(())
    }

    pub fn config(&self) -> Result<RunConfig> {
        self.store.load_config()
    }

    pub fn population(&self) -> &Population {
        &self.population
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn store(&self) -> &R {
        &self.store
    }

    /// For pushing a new config between generations
    pub fn store_mut(&mut self) -> &mut R {
        &mut self.store
    }

    pub fn ids(&self) -> &Ids {
        &self.ids
    }

    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[NodeId] {
        &self.outputs
    }

    pub fn species_ids(&self) -> Vec<SpeciesId> {
        self.population.species().iter().map(|s| s.id).collect()
    }
}

fn store_genotype<R: Repository>(
    store: &mut R,
    spec: &GenotypeSpec,
    registry: &mut Registry,
) -> Result<Genotype> {
    let id = store.save_genotype(spec, registry)?;
    Genotype::from_spec(id, &store.load_genotype(id)?, registry)
}

/// Evaluate and reproduce until a hook breaks. Returns the generation the run stopped at, whose
/// population is evaluated and left in place.
pub fn evolve<S: Scenario, R: Repository>(
    run: &mut Run<R>,
    scenario: &S,
    hooks: &mut [&mut dyn Hook],
) -> Result<GenerationId> {
    loop {
        run.evaluate(scenario)?;

        let population = run.population();
        let stats = Stats {
            generation: population.generation(),
            species: population.species().len(),
            population,
        };
        let mut stop = false;
        for hook in hooks.iter_mut() {
            stop |= hook.on_generation(&stats).is_break();
        }
        if stop {
            return Ok(stats.generation);
        }

        run.advance()?;
    }
}
