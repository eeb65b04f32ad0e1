//! Persistence of genotype descriptions and run configurations.

use crate::{
    config::RunConfig,
    error::{NeatError, Result},
    genotype::{Genotype, GenotypeId, GenotypeSpec},
    registry::Registry,
};
use log::debug;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Where a run keeps what it creates. Ids handed out by [Repository::save_genotype] are stable
/// and may be loaded again for as long as the repository lives.
pub trait Repository {
    fn load_genotype(&self, id: GenotypeId) -> Result<GenotypeSpec>;

    /// Validate `spec` against `registry`, registering any connection without an innovation id,
    /// and store its canonical form under a fresh id
    fn save_genotype(&mut self, spec: &GenotypeSpec, registry: &mut Registry) -> Result<GenotypeId>;

    /// The most recently pushed config
    fn load_config(&self) -> Result<RunConfig>;

    fn push_config(&mut self, config: RunConfig) -> Result<()>;
}

/// A repository held in memory, which may be dumped to and restored from a JSON file
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MemoryStore {
    genotypes: Vec<GenotypeSpec>,
    configs: Vec<RunConfig>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: RunConfig) -> Result<Self> {
        let mut store = Self::new();
        store.push_config(config)?;
        Ok(store)
    }

    pub fn genotype_count(&self) -> usize {
        self.genotypes.len()
    }

    /// Every config ever pushed, oldest first
    pub fn configs(&self) -> &[RunConfig] {
        &self.configs
    }

    pub fn to_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_string()?)?;
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_str(&fs::read_to_string(path)?)
    }
}

impl Repository for MemoryStore {
    fn load_genotype(&self, id: GenotypeId) -> Result<GenotypeSpec> {
        self.genotypes.get(id).cloned().ok_or(NeatError::NotFound {
            entity: "genotype",
            id,
        })
    }

    fn save_genotype(&mut self, spec: &GenotypeSpec, registry: &mut Registry) -> Result<GenotypeId> {
        if let Some(missing) = spec.parents.iter().find(|p| **p >= self.genotypes.len()) {
            return Err(NeatError::NotFound {
                entity: "genotype",
                id: *missing,
            });
        }

        let id = self.genotypes.len();
        let canonical = Genotype::from_spec(id, spec, registry)?.describe();
        self.genotypes.push(canonical);
        debug!("stored genotype {id}");
        Ok(id)
    }

    fn load_config(&self) -> Result<RunConfig> {
        self.configs.last().cloned().ok_or(NeatError::ConfigMissing)
    }

    fn push_config(&mut self, config: RunConfig) -> Result<()> {
        config.validate()?;
        self.configs.push(config);
        Ok(())
    }
}
