//! Run configuration. One active [RunConfig] exists per run; later configs may replace it, and
//! the orchestrator re-reads it from its repository before every reproduction step.

use crate::{
    constants::*,
    error::{NeatError, Result},
};
use serde::{Deserialize, Serialize};
use std::{env, fs, path::Path, str::FromStr};

/// Per-gene mutation rates. The four rates partition one uniform draw, so their sum must not
/// exceed 1.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MutationRates {
    pub split: f64,
    pub weight: f64,
    pub switch: f64,
    pub add: f64,
    pub weight_std: f64,
}

impl MutationRates {
    /// The combined probability that a gene mutates at all
    pub fn total(&self) -> f64 {
        self.split + self.weight + self.switch + self.add
    }
}

impl Default for MutationRates {
    fn default() -> Self {
        Self {
            split: LINEAGE_MUTATION_SPLIT_RATE,
            weight: LINEAGE_MUTATION_WEIGHT_RATE,
            switch: LINEAGE_MUTATION_SWITCH_RATE,
            add: LINEAGE_MUTATION_ADD_RATE,
            weight_std: LINEAGE_MUTATION_WEIGHT_STD,
        }
    }
}

/// How a population's offspring slots are divided between its species
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum AllocationPolicy {
    /// proportional to each specie's summed adjusted score
    #[default]
    AdjustedShare,
    /// the same number of slots for every specie
    Uniform,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RelaxationConfig {
    pub epsilon: f64,
    pub max_iterations: usize,
}

impl Default for RelaxationConfig {
    fn default() -> Self {
        Self {
            epsilon: LINEAGE_RELAXATION_EPSILON,
            max_iterations: LINEAGE_RELAXATION_MAX_ITERATIONS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunConfig {
    pub speciation_threshold: f64,
    pub population_size: usize,
    pub species_cull_rate: f64,
    pub cloning_rate: f64,
    pub interspecies_rate: f64,
    pub mutation: MutationRates,
    pub allocation: AllocationPolicy,
    pub relaxation: RelaxationConfig,
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            speciation_threshold: LINEAGE_SPECIATION_THRESHOLD,
            population_size: LINEAGE_POPULATION_SIZE,
            species_cull_rate: LINEAGE_SPECIES_CULL_RATE,
            cloning_rate: LINEAGE_CLONING_RATE,
            interspecies_rate: LINEAGE_INTERSPECIES_RATE,
            mutation: MutationRates::default(),
            allocation: AllocationPolicy::default(),
            relaxation: RelaxationConfig::default(),
        }
    }
}

fn check_rate(name: &str, v: f64) -> Result<()> {
    if (0. ..=1.).contains(&v) {
        Ok(())
    } else {
        Err(NeatError::InvalidConfig(format!(
            "{name} must lie in [0, 1], got {v}"
        )))
    }
}

impl RunConfig {
    /// Sum of the four per-gene mutation rates
    pub fn mutation_rate(&self) -> f64 {
        self.mutation.total()
    }

    pub fn validate(&self) -> Result<()> {
        check_rate("speciation_threshold", self.speciation_threshold)?;
        check_rate("species_cull_rate", self.species_cull_rate)?;
        check_rate("cloning_rate", self.cloning_rate)?;
        check_rate("interspecies_rate", self.interspecies_rate)?;
        check_rate("mutation.split", self.mutation.split)?;
        check_rate("mutation.weight", self.mutation.weight)?;
        check_rate("mutation.switch", self.mutation.switch)?;
        check_rate("mutation.add", self.mutation.add)?;

        if self.mutation_rate() > 1. + f64::EPSILON {
            return Err(NeatError::InvalidConfig(format!(
                "mutation rates sum to {}, which exceeds 1",
                self.mutation_rate()
            )));
        }

        if !(self.mutation.weight_std >= 0. && self.mutation.weight_std.is_finite()) {
            return Err(NeatError::InvalidConfig(format!(
                "mutation.weight_std must be a finite non-negative number, got {}",
                self.mutation.weight_std
            )));
        }

        if self.population_size < 2 {
            return Err(NeatError::InvalidConfig(format!(
                "population_size must be at least 2, got {}",
                self.population_size
            )));
        }

        if !(self.relaxation.epsilon > 0.) {
            return Err(NeatError::InvalidConfig(format!(
                "relaxation.epsilon must be positive, got {}",
                self.relaxation.epsilon
            )));
        }

        if self.relaxation.max_iterations == 0 {
            return Err(NeatError::InvalidConfig(
                "relaxation.max_iterations must be positive".into(),
            ));
        }

        Ok(())
    }

    /// Apply `LINEAGE_*` environment variables on top of this config. Unset variables are
    /// ignored, unparsable ones are an error.
    pub fn with_env_overrides(mut self) -> Result<Self> {
        fn read<T: FromStr>(key: &str) -> Result<Option<T>> {
            match env::var(key) {
                Ok(raw) => raw
                    .trim()
                    .parse()
                    .map(Some)
                    .map_err(|_| NeatError::InvalidConfig(format!("cannot parse {key}={raw}"))),
                Err(_) => Ok(None),
            }
        }

        if let Some(v) = read("LINEAGE_POPULATION_SIZE")? {
            self.population_size = v;
        }
        if let Some(v) = read("LINEAGE_SPECIATION_THRESHOLD")? {
            self.speciation_threshold = v;
        }
        if let Some(v) = read("LINEAGE_SPECIES_CULL_RATE")? {
            self.species_cull_rate = v;
        }
        if let Some(v) = read("LINEAGE_CLONING_RATE")? {
            self.cloning_rate = v;
        }
        if let Some(v) = read("LINEAGE_INTERSPECIES_RATE")? {
            self.interspecies_rate = v;
        }

        self.validate()?;
        Ok(self)
    }

    pub fn to_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_string()?)?;
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_str(&fs::read_to_string(path)?)
    }
}
