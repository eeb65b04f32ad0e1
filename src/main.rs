//! Evolve a network for XOR. An optional first argument names a JSON run config; `LINEAGE_*`
//! variables override it, and `RUST_LOG` sets the log level.

use core::ops::ControlFlow;
use lineage::{
    activate::steep_sigmoid,
    evolve,
    export::to_dot,
    network::loss::decay_quadratic,
    random::default_rng,
    EvolutionTarget, Evaluator, Genotype, MemoryStore, Result, Run, RunConfig, Scenario, Stats,
};
use log::{error, info};
use std::{env, process::ExitCode};

const GENERATIONS: usize = 500;
const TARGET: f64 = 3.9;

struct Xor;

impl Scenario for Xor {
    fn io(&self) -> (usize, usize) {
        (2, 1)
    }

    fn eval(&self, genotype: &Genotype, evaluator: &impl Evaluator) -> f64 {
        [([0., 0.], 0.), ([1., 1.], 0.), ([0., 1.], 1.), ([1., 0.], 1.)]
            .iter()
            .map(|(x, want)| match evaluator.evaluate(genotype, x) {
                Ok(y) => decay_quadratic(*want, y[0]),
                Err(_) => 0.,
            })
            .sum()
    }

    fn activation(&self) -> fn(f64) -> f64 {
        steep_sigmoid
    }
}

fn report(stats: &Stats<'_>) -> ControlFlow<()> {
    if stats.generation % 10 == 0 {
        info!(
            "generation {}: best {:.4} across {} species",
            stats.generation,
            stats.best_score().unwrap_or(f64::NAN),
            stats.species
        );
    }
    ControlFlow::Continue(())
}

fn run() -> Result<()> {
    let config = match env::args().nth(1) {
        Some(path) => RunConfig::from_file(path)?,
        None => RunConfig::default(),
    }
    .with_env_overrides()?;

    let mut run = Run::initialize(&Xor, MemoryStore::with_config(config)?, default_rng())?;
    let generation = evolve(
        &mut run,
        &Xor,
        &mut [
            &mut EvolutionTarget::Fitness(TARGET),
            &mut EvolutionTarget::Generation(GENERATIONS),
            &mut report,
        ],
    )?;

    if let Some(fittest) = run.population().fittest() {
        println!(
            "fittest of generation {generation}: {:.4} with {} genes",
            fittest.score(),
            fittest.genotype().connections().len()
        );
        println!("{}", to_dot(fittest.genotype()));
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::init();
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{e}");
            ExitCode::FAILURE
        }
    }
}
