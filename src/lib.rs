#![allow(mixed_script_confusables)]
#![allow(confusable_idents)]

pub mod config;
pub mod constants;
pub mod crossover;
pub mod error;
pub mod export;
pub mod genotype;
pub mod mutate;
pub mod network;
pub mod population;
pub mod random;
pub mod registry;
pub mod reproduce;
pub mod scenario;
pub mod serialize;
pub mod species;
pub mod store;

pub use config::{AllocationPolicy, MutationRates, RelaxationConfig, RunConfig};
pub use error::{NeatError, Result};
pub use genotype::{ConnectionGene, Genotype, GenotypeSpec, NodeKind};
pub use network::{activate, Evaluator, Phenotype, Relaxation};
pub use population::{Individual, Population};
pub use registry::{Registry, SharedRegistry};
pub use scenario::{evolve, EvolutionTarget, Hook, Run, Scenario, Stats};
pub use species::Species;
pub use store::{MemoryStore, Repository};
