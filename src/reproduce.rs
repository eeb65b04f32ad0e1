//! Reproduction at the species and population scale.

use crate::{
    config::{AllocationPolicy, RunConfig},
    constants::LINEAGE_PARTNER_RESAMPLE_LIMIT,
    crossover::crossover,
    error::{NeatError, Result},
    genotype::GenotypeSpec,
    mutate::mutate,
    population::{Individual, Population},
    random::happens,
    registry::Registry,
    species::{speciate, Species, SpeciesId},
};
use log::{debug, warn};
use rand::Rng;

/// The description of an individual of the next generation. Crossover children of two parents
/// from one species carry that species; every other newborn is assigned one by compatibility.
#[derive(Debug, Clone, PartialEq)]
pub struct Newborn {
    pub spec: GenotypeSpec,
    pub species: Option<SpeciesId>,
}

/// Every species of a population next to its culled parent pool
#[derive(Debug)]
pub struct Pools<'a> {
    pub species: Vec<Species<'a>>,
    pub culled: Vec<Species<'a>>,
}

impl<'a> Pools<'a> {
    pub fn new(individuals: &'a [Individual], cull_rate: f64) -> Self {
        let species = speciate(individuals);
        let culled = species.iter().map(|s| s.culled(cull_rate)).collect();
        Self { species, culled }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.species.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.species.is_empty()
    }
}

/// A member of `pool` other than `first`, drawn by roulette. After a bounded number of draws
/// that keep returning `first`, one of the others is picked uniformly.
fn distinct_partner<'a>(
    pool: &Species<'a>,
    first: &Individual,
    rng: &mut impl Rng,
) -> Option<&'a Individual> {
    let others = pool
        .members
        .iter()
        .filter(|m| m.id() != first.id())
        .copied()
        .collect::<Vec<_>>();
    if others.is_empty() {
        return None;
    }

    for _ in 0..LINEAGE_PARTNER_RESAMPLE_LIMIT {
        match pool.select_individual(rng) {
            Some(m) if m.id() != first.id() => return Some(m),
            _ => (),
        }
    }

    warn!(
        "species {} kept drawing individual {}, picking a partner uniformly",
        pool.id,
        first.id()
    );
    Some(others[rng.random_range(0..others.len())])
}

/// Produce one newborn from the species at `at`. With probability `cloning_rate` a selected
/// parent is mutated on its own. Otherwise it is crossed with a distinct partner, drawn from
/// another species with probability `interspecies_rate`, and the child is left unmutated.
pub fn create_newborn(
    pools: &Pools<'_>,
    at: usize,
    config: &RunConfig,
    registry: &mut Registry,
    rng: &mut impl Rng,
) -> Result<Newborn> {
    let culled = pools.culled.get(at).ok_or(NeatError::NotFound {
        entity: "species",
        id: at,
    })?;
    let first = culled.select_individual(rng).ok_or_else(|| {
        NeatError::Reproduction(format!("species {} has no members", culled.id))
    })?;

    if happens(rng, config.cloning_rate) {
        return Ok(Newborn {
            spec: mutate(first.genotype(), &config.mutation, registry, rng)?,
            species: None,
        });
    }

    let others = (0..pools.len()).filter(|k| *k != at).collect::<Vec<_>>();
    let chosen = if !others.is_empty() && happens(rng, config.interspecies_rate) {
        others[rng.random_range(0..others.len())]
    } else {
        at
    };

    let partner = match distinct_partner(&pools.culled[chosen], first, rng) {
        Some(p) => p,
        None => match distinct_partner(&pools.species[chosen], first, rng) {
            Some(p) => p,
            None if !others.is_empty() => {
                debug!(
                    "species {} holds a single individual, mating across species",
                    culled.id
                );
                let k = others[rng.random_range(0..others.len())];
                distinct_partner(&pools.culled[k], first, rng).ok_or_else(|| {
                    NeatError::Reproduction(format!("species {} has no members", pools.culled[k].id))
                })?
            }
            None => {
                return Err(NeatError::Reproduction(format!(
                    "individual {} has no partner to mate with",
                    first.id()
                )))
            }
        },
    };

    let spec = crossover(first.genotype(), partner.genotype(), rng)?;
    let species = (first.species() == partner.species()).then_some(first.species());
    Ok(Newborn { spec, species })
}

/// Split `total` offspring slots between species by largest remainder, so the counts always sum
/// to exactly `total`. Ties on the remainder go to the earlier species.
pub fn allocate(species: &[Species<'_>], total: usize, policy: AllocationPolicy) -> Vec<usize> {
    if species.is_empty() {
        return Vec::new();
    }

    let mut weights = match policy {
        AllocationPolicy::Uniform => vec![1.; species.len()],
        AllocationPolicy::AdjustedShare => species.iter().map(Species::fit_adjusted).collect(),
    };
    let min = weights.iter().copied().fold(f64::INFINITY, f64::min);
    if min < 0. {
        weights.iter_mut().for_each(|w| *w -= min);
    }
    let sum = weights.iter().sum::<f64>();
    if !(sum > 0. && sum.is_finite()) {
        weights = vec![1.; species.len()];
    }
    let sum = weights.iter().sum::<f64>();

    let quotas = weights
        .iter()
        .map(|w| total as f64 * w / sum)
        .collect::<Vec<_>>();
    let mut counts = quotas.iter().map(|q| q.floor() as usize).collect::<Vec<_>>();

    let mut order = (0..species.len()).collect::<Vec<_>>();
    order.sort_by(|l, r| {
        let fl = quotas[*l] - quotas[*l].floor();
        let fr = quotas[*r] - quotas[*r].floor();
        fr.total_cmp(&fl).then(l.cmp(r))
    });

    let assigned = counts.iter().sum::<usize>();
    for k in order.into_iter().cycle().take(total.saturating_sub(assigned)) {
        counts[k] += 1;
    }
    counts
}

/// Newborns for the whole next generation, exactly `population_size` of them
pub fn reproduce(
    population: &Population,
    config: &RunConfig,
    registry: &mut Registry,
    rng: &mut impl Rng,
) -> Result<Vec<Newborn>> {
    if population.is_empty() {
        return Err(NeatError::Reproduction("the population is empty".into()));
    }

    let pools = Pools::new(population.individuals(), config.species_cull_rate);
    let counts = allocate(&pools.species, config.population_size, config.allocation);

    let mut newborns = Vec::with_capacity(config.population_size);
    for (at, count) in counts.into_iter().enumerate() {
        for _ in 0..count {
            newborns.push(create_newborn(&pools, at, config, registry, rng)?);
        }
    }

    if newborns.len() != config.population_size {
        return Err(NeatError::SizeInconsistency {
            expected: config.population_size,
            found: newborns.len(),
        });
    }
    Ok(newborns)
}
