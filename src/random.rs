use crate::config::MutationRates;
use core::cmp::min;
use rand::{Rng, RngCore, SeedableRng};

/// The mutually exclusive outcomes a single connection gene may receive in one mutation pass
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MutationKind {
    Weight,
    Switch,
    Add,
    Split,
}

/// Cumulative thresholds over a single uniform roll. Events are tested in insertion order, and
/// the first whose cumulative threshold exceeds the roll wins. A roll past every threshold is no
/// event at all.
#[derive(Debug, Clone)]
pub struct Breakdown<K: Copy> {
    choices: Vec<(K, f64)>,
}

impl<K: Copy> Breakdown<K> {
    pub fn new(probabilities: impl IntoIterator<Item = (K, f64)>) -> Self {
        let mut t = 0.;
        Self {
            choices: probabilities
                .into_iter()
                .map(|(kind, p)| {
                    t += p;
                    (kind, t)
                })
                .collect(),
        }
    }

    pub fn pick(&self, roll: f64) -> Option<K> {
        self.choices
            .iter()
            .find_map(|(k, p)| (roll < *p).then_some(*k))
    }

    pub fn happens(&self, rng: &mut impl Rng) -> Option<K> {
        self.pick(rng.random())
    }
}

impl Breakdown<MutationKind> {
    /// weight-change, toggle, add, split, in that fixed order
    pub fn mutation(rates: &MutationRates) -> Self {
        Self::new([
            (MutationKind::Weight, rates.weight),
            (MutationKind::Switch, rates.switch),
            (MutationKind::Add, rates.add),
            (MutationKind::Split, rates.split),
        ])
    }
}

/// true with probability `p`
#[inline]
pub fn happens(rng: &mut impl Rng, p: f64) -> bool {
    rng.random::<f64>() < p
}

/// a fair coin
#[inline]
pub fn coin(rng: &mut impl Rng) -> bool {
    happens(rng, 0.5)
}

/// Small, fast and seedable. Runs are reproducible from a single u64.
#[derive(Debug, Clone)]
pub struct WyRng {
    state: u64,
}

impl WyRng {
    pub fn seeded(state: u64) -> Self {
        Self { state }
    }
}

impl RngCore for WyRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        const WY_CONST_0: u64 = 0x2d35_8dcc_aa6c_78a5;
        const WY_CONST_1: u64 = 0x8bb8_4b93_962e_acc9;
        self.state = self.state.wrapping_add(WY_CONST_0);
        let t = u128::from(self.state) * u128::from(self.state ^ WY_CONST_1);
        (t as u64) ^ (t >> 64) as u64
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        let mut idx = 0;
        while idx < dst.len() {
            let lim = min(8, dst.len() - idx);
            dst[idx..idx + lim].copy_from_slice(&self.next_u64().to_le_bytes()[..lim]);
            idx += lim;
        }
    }
}

impl SeedableRng for WyRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::seeded(u64::from_le_bytes(seed))
    }
}

/// A [WyRng] seeded from the thread-local generator
pub fn default_rng() -> WyRng {
    WyRng::seeded(rand::rng().next_u64())
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_breakdown_order() {
        let b = Breakdown::new([('w', 0.1), ('s', 0.2), ('a', 0.3), ('p', 0.1)]);
        assert_eq!(b.pick(0.), Some('w'));
        assert_eq!(b.pick(0.099), Some('w'));
        assert_eq!(b.pick(0.1), Some('s'));
        assert_eq!(b.pick(0.35), Some('a'));
        assert_eq!(b.pick(0.65), Some('p'));
        assert_eq!(b.pick(0.71), None);
        assert_eq!(b.pick(0.99), None);
    }

    #[test]
    fn test_breakdown_zero_rates() {
        let b = Breakdown::mutation(&MutationRates {
            split: 0.,
            weight: 0.,
            switch: 0.5,
            add: 0.,
            weight_std: 0.,
        });
        assert_eq!(b.pick(0.), Some(MutationKind::Switch));
        assert_eq!(b.pick(0.49), Some(MutationKind::Switch));
        assert_eq!(b.pick(0.5), None);
    }

    #[test]
    fn test_mutation_budget_boundary() {
        // dyadic rates, so every cumulative threshold is exact
        let b = Breakdown::mutation(&MutationRates {
            weight: 0.5,
            switch: 0.125,
            add: 0.0625,
            split: 0.0625,
            weight_std: 0.,
        });
        assert_eq!(b.pick(0.4999), Some(MutationKind::Weight));
        assert_eq!(b.pick(0.5), Some(MutationKind::Switch));
        assert_eq!(b.pick(0.625), Some(MutationKind::Add));
        assert_eq!(b.pick(0.6875), Some(MutationKind::Split));
        assert_eq!(b.pick(0.7499), Some(MutationKind::Split));
        assert_eq!(b.pick(0.75), None);
        assert_eq!(b.pick(0.9999), None);
    }

    #[test]
    fn test_wyrng_deterministic() {
        let mut l = WyRng::seeded(7);
        let mut r = WyRng::from_seed(7u64.to_le_bytes());
        for _ in 0..100 {
            assert_eq!(l.next_u64(), r.next_u64());
        }
        assert_ne!(WyRng::seeded(7).next_u64(), WyRng::seeded(8).next_u64());
    }

    #[test]
    fn test_fill_bytes_partial() {
        let mut expect = WyRng::seeded(3);
        let first = expect.next_u64().to_le_bytes();
        let second = expect.next_u64().to_le_bytes();

        let mut dst = [0u8; 11];
        WyRng::seeded(3).fill_bytes(&mut dst);
        assert_eq!(&dst[..8], &first[..]);
        assert_eq!(&dst[8..], &second[..3]);
    }

    #[test]
    fn test_deviation_happens() {
        let mut rng = WyRng::seeded(11);
        let samples = 100_000;
        for p in [0.01, 0.25, 0.5, 0.9] {
            let incidence = (0..samples).filter(|_| happens(&mut rng, p)).count() as f64;
            let expected = p * samples as f64;
            assert!(
                (expected - incidence).abs() < expected * 0.1,
                "{p}: {incidence} != {expected}"
            );
        }
    }
}
