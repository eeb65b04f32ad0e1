//! Speciation, fitness sharing and parent selection.

use crate::{genotype::Genotype, population::Individual};
use log::warn;
use rand::Rng;

pub type SpeciesId = usize;

/// The members of one population who share a species id. Membership is stored on the individuals
/// themselves; a species is only ever a view over them.
#[derive(Debug, Clone)]
pub struct Species<'a> {
    pub id: SpeciesId,
    pub members: Vec<&'a Individual>,
}

impl<'a> Species<'a> {
    #[inline]
    pub fn len(&self) -> usize {
        self.members.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    /// The member new individuals are compared against
    #[inline]
    pub fn representative(&self) -> Option<&'a Individual> {
        self.members.first().copied()
    }

    /// Raw score shared across the species
    pub fn adjusted_score(&self, individual: &Individual) -> f64 {
        individual.score() / self.len() as f64
    }

    /// Sum of every member's adjusted score
    pub fn fit_adjusted(&self) -> f64 {
        let l = self.len() as f64;
        self.members.iter().fold(0., |acc, m| acc + m.score() / l)
    }

    pub fn best_score(&self) -> Option<f64> {
        self.members.iter().map(|m| m.score()).max_by(f64::total_cmp)
    }

    /// The best `cull_rate` fraction of members, best first. A non-empty species always keeps at
    /// least one member.
    pub fn culled(&self, cull_rate: f64) -> Species<'a> {
        let mut members = self.members.clone();
        members.sort_by(|l, r| r.score().total_cmp(&l.score()));
        let keep = ((members.len() as f64 * cull_rate).floor() as usize).max(1);
        members.truncate(keep);
        Species {
            id: self.id,
            members,
        }
    }

    /// Roulette selection over raw scores. The first member whose cumulative weight exceeds the
    /// draw is picked. Scores are shifted to be non-negative, and selection is uniform when every
    /// weight is zero.
    pub fn select_individual(&self, rng: &mut impl Rng) -> Option<&'a Individual> {
        let min = self.members.iter().map(|m| m.score()).min_by(f64::total_cmp)?;
        let shift = if min < 0. { -min } else { 0. };
        let total = self
            .members
            .iter()
            .fold(0., |acc, m| acc + m.score() + shift);

        if !(total > 0. && total.is_finite()) {
            if total != 0. {
                warn!("species {} has unusable scores, selecting uniformly", self.id);
            }
            return Some(self.members[rng.random_range(0..self.len())]);
        }

        let draw = rng.random::<f64>() * total;
        let mut cumulative = 0.;
        for m in self.members.iter() {
            cumulative += m.score() + shift;
            if cumulative > draw {
                return Some(*m);
            }
        }
        self.members.last().copied()
    }
}

/// Group individuals by their species id. Species are ordered by first appearance, members keep
/// their population order.
pub fn speciate(individuals: &[Individual]) -> Vec<Species<'_>> {
    let mut species: Vec<Species<'_>> = Vec::new();
    for individual in individuals {
        match species.iter_mut().find(|s| s.id == individual.species()) {
            Some(s) => s.members.push(individual),
            None => species.push(Species {
                id: individual.species(),
                members: vec![individual],
            }),
        }
    }
    species
}

/// The first species whose representative is compatible with `genotype`, compatibility having
/// to exceed `1 - threshold`
pub fn assign_species<'a>(
    genotype: &Genotype,
    representatives: impl IntoIterator<Item = (SpeciesId, &'a Genotype)>,
    threshold: f64,
) -> Option<SpeciesId> {
    let bar = 1. - threshold;
    representatives
        .into_iter()
        .find_map(|(id, repr)| (genotype.compatibility(repr) > bar).then_some(id))
}
