//! Individuals, and the populations that hold one generation of them.

use crate::{
    config::RunConfig,
    constants::LINEAGE_NEW_WEIGHT_BOUND,
    error::{NeatError, Result},
    genotype::{ConnectionSpec, Genotype, GenotypeSpec, NodeId},
    species::{assign_species, speciate, Species, SpeciesId},
};
use rand::Rng;
use serde::{Deserialize, Serialize};

pub type IndividualId = usize;
pub type PopulationId = usize;
pub type GenerationId = usize;

/// A monotonic id source
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence(usize);

impl Sequence {
    pub fn starting_at(next: usize) -> Self {
        Self(next)
    }

    pub fn next_id(&mut self) -> usize {
        let id = self.0;
        self.0 += 1;
        id
    }

    pub fn peek(&self) -> usize {
        self.0
    }
}

/// Id sources for every entity a run creates besides genotypes
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Ids {
    pub individual: Sequence,
    pub species: Sequence,
    pub population: Sequence,
    pub generation: Sequence,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Individual {
    id: IndividualId,
    genotype: Genotype,
    species: SpeciesId,
    population: PopulationId,
    score: f64,
}

impl Individual {
    #[inline]
    pub fn id(&self) -> IndividualId {
        self.id
    }

    #[inline]
    pub fn genotype(&self) -> &Genotype {
        &self.genotype
    }

    #[inline]
    pub fn species(&self) -> SpeciesId {
        self.species
    }

    #[inline]
    pub fn population(&self) -> PopulationId {
        self.population
    }

    /// The raw fitness, 0 until one is assigned
    #[inline]
    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn set_score(&mut self, score: f64) {
        self.score = score;
    }
}

/// A genotype on its way into a population, optionally with the species it should join
#[derive(Debug, Clone)]
pub struct Entrant {
    pub genotype: Genotype,
    pub species: Option<SpeciesId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    id: PopulationId,
    generation: GenerationId,
    individuals: Vec<Individual>,
}

impl Population {
    /// Create the population of a new generation. Entrants without a species are placed in the
    /// first species, in order of appearance, whose first member they are compatible with; failing
    /// that they found a new one.
    pub fn assemble(entrants: Vec<Entrant>, config: &RunConfig, ids: &mut Ids) -> Result<Self> {
        if entrants.len() != config.population_size {
            return Err(NeatError::SizeInconsistency {
                expected: config.population_size,
                found: entrants.len(),
            });
        }

        let id = ids.population.next_id();
        let generation = ids.generation.next_id();
        let mut individuals: Vec<Individual> = Vec::with_capacity(entrants.len());
        for Entrant { genotype, species } in entrants {
            let species = match species {
                Some(s) => s,
                None => {
                    let reprs = speciate(&individuals)
                        .into_iter()
                        .filter_map(|s| s.representative().map(|r| (s.id, r.genotype())))
                        .collect::<Vec<_>>();
                    assign_species(&genotype, reprs, config.speciation_threshold)
                        .unwrap_or_else(|| ids.species.next_id())
                }
            };

            individuals.push(Individual {
                id: ids.individual.next_id(),
                genotype,
                species,
                population: id,
                score: 0.,
            });
        }

        Ok(Self {
            id,
            generation,
            individuals,
        })
    }

    /// Confirm that a population, for example one loaded from disk, has the configured size
    pub fn check(&self, config: &RunConfig) -> Result<()> {
        if self.individuals.len() == config.population_size {
            Ok(())
        } else {
            Err(NeatError::SizeInconsistency {
                expected: config.population_size,
                found: self.individuals.len(),
            })
        }
    }

    #[inline]
    pub fn id(&self) -> PopulationId {
        self.id
    }

    #[inline]
    pub fn generation(&self) -> GenerationId {
        self.generation
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.individuals.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.individuals.is_empty()
    }

    pub fn individuals(&self) -> &[Individual] {
        &self.individuals
    }

    pub fn individuals_mut(&mut self) -> &mut [Individual] {
        &mut self.individuals
    }

    pub fn species(&self) -> Vec<Species<'_>> {
        speciate(&self.individuals)
    }

    pub fn best_score(&self) -> Option<f64> {
        self.individuals
            .iter()
            .map(Individual::score)
            .max_by(f64::total_cmp)
    }

    pub fn fittest(&self) -> Option<&Individual> {
        self.individuals
            .iter()
            .max_by(|l, r| l.score.total_cmp(&r.score))
    }
}

/// A minimal founder: every input and the bias wired to every output, each with a uniform weight
/// in `[-1, 1]`
pub fn founder_spec(
    bias: NodeId,
    inputs: &[NodeId],
    outputs: &[NodeId],
    rng: &mut impl Rng,
) -> GenotypeSpec {
    let mut connections = Vec::with_capacity((inputs.len() + 1) * outputs.len());
    for source in inputs.iter().chain([bias].iter()) {
        for target in outputs.iter() {
            let weight = rng.random_range(-LINEAGE_NEW_WEIGHT_BOUND..=LINEAGE_NEW_WEIGHT_BOUND);
            connections.push(ConnectionSpec::new(*source, *target, weight, true));
        }
    }
    GenotypeSpec::new(inputs.iter().chain(outputs.iter()).copied(), connections)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{genotype::test::registry_io, random::WyRng, registry::Registry};

    fn founders(
        registry: &mut Registry,
        inputs: &[NodeId],
        outputs: &[NodeId],
        count: usize,
    ) -> Vec<Entrant> {
        let mut rng = WyRng::seeded(0);
        (0..count)
            .map(|id| Entrant {
                genotype: Genotype::from_spec(
                    id,
                    &founder_spec(registry.bias(), inputs, outputs, &mut rng),
                    registry,
                )
                .unwrap(),
                species: None,
            })
            .collect()
    }

    #[test]
    fn test_founders_share_a_species() {
        let (mut r, i, o) = registry_io(2, 3);
        let config = RunConfig {
            population_size: 10,
            ..RunConfig::default()
        };
        let mut ids = Ids::default();
        let pop = Population::assemble(founders(&mut r, &i, &o, 10), &config, &mut ids).unwrap();

        assert_eq!(pop.len(), 10);
        assert_eq!(pop.species().len(), 1);
        assert_eq!(r.innovation_count(), 9);
        assert!(pop
            .individuals()
            .iter()
            .all(|ind| ind.genotype().connections().len() == 9 && ind.population() == pop.id()));
        assert_eq!(ids.species.peek(), 1);
        assert_eq!(ids.individual.peek(), 10);
        assert_eq!((pop.id(), pop.generation()), (0, 0));
    }

    #[test]
    fn test_size_checked() {
        let (mut r, i, o) = registry_io(1, 1);
        let config = RunConfig {
            population_size: 4,
            ..RunConfig::default()
        };
        assert_eq!(
            Population::assemble(founders(&mut r, &i, &o, 3), &config, &mut Ids::default()),
            Err(NeatError::SizeInconsistency {
                expected: 4,
                found: 3
            })
        );

        let pop =
            Population::assemble(founders(&mut r, &i, &o, 4), &config, &mut Ids::default())
                .unwrap();
        assert!(pop.check(&config).is_ok());
        assert!(pop
            .check(&RunConfig {
                population_size: 5,
                ..config
            })
            .is_err());
    }

    #[test]
    fn test_incompatible_entrant_founds_species() {
        let (mut r, i, o) = registry_io(3, 1);
        let config = RunConfig {
            population_size: 3,
            speciation_threshold: 0.1,
            ..RunConfig::default()
        };

        let mut entrants = founders(&mut r, &i, &o, 2);
        let sparse = GenotypeSpec::new([i[0], o[0]], [ConnectionSpec::new(i[0], o[0], 1., true)]);
        entrants.push(Entrant {
            genotype: Genotype::from_spec(2, &sparse, &mut r).unwrap(),
            species: None,
        });

        let pop = Population::assemble(entrants, &config, &mut Ids::default()).unwrap();
        let species = pop.individuals().iter().map(Individual::species).collect::<Vec<_>>();
        assert_eq!(species, vec![0, 0, 1]);
    }

    #[test]
    fn test_explicit_species_kept() {
        let (mut r, i, o) = registry_io(1, 1);
        let config = RunConfig {
            population_size: 2,
            ..RunConfig::default()
        };
        let mut entrants = founders(&mut r, &i, &o, 2);
        entrants[1].species = Some(7);

        let mut ids = Ids {
            species: Sequence::starting_at(8),
            ..Ids::default()
        };
        let pop = Population::assemble(entrants, &config, &mut ids).unwrap();
        assert_eq!(pop.individuals()[0].species(), 8);
        assert_eq!(pop.individuals()[1].species(), 7);
    }

    #[test]
    fn test_best_score() {
        let (mut r, i, o) = registry_io(1, 1);
        let config = RunConfig {
            population_size: 3,
            ..RunConfig::default()
        };
        let mut pop =
            Population::assemble(founders(&mut r, &i, &o, 3), &config, &mut Ids::default())
                .unwrap();
        for (k, ind) in pop.individuals_mut().iter_mut().enumerate() {
            ind.set_score(-(k as f64));
        }
        assert_eq!(pop.best_score(), Some(0.));
        assert_eq!(pop.fittest().map(Individual::id), Some(0));
    }
}
