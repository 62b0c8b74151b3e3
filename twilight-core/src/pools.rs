//! Remove-on-pick id pools and the shared bias-weighting primitive.
//!
//! Every pass that must not assign the same target twice (evolutions,
//! starters, encounters, fusion mapping) draws from a [`Pool`]: an explicit
//! vector arena consumed by index-based removal and rebuilt fresh per pass.
//!
//! All "favoured candidates get extra probability mass" behaviour in the
//! engine (moveset species bias, similar-species evolution bias,
//! cross-species exp-condition avoidance) funnels through
//! [`pick_weighted`], with one policy for degenerate weight sets: fall back
//! to a uniform draw.

use rand::rngs::StdRng;
use rand::Rng;

use crate::catalog::{stage_ids, Stage};

pub(crate) struct Pool {
    ids: Vec<u16>,
}

impl Pool {
    pub fn new(ids: Vec<u16>) -> Pool {
        Pool { ids }
    }

    /// The stage catalog intersected with the ids actually present in the
    /// loaded tables.
    pub fn for_stage<'a>(stage: Stage, present: impl Iterator<Item = &'a u16> + Clone) -> Pool {
        let ids = stage_ids(stage)
            .into_iter()
            .filter(|id| present.clone().any(|p| p == id))
            .collect();
        Pool { ids }
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    fn take_at(&mut self, index: usize) -> u16 {
        self.ids.swap_remove(index)
    }

    pub fn take_random(&mut self, rng: &mut StdRng) -> Option<u16> {
        if self.ids.is_empty() {
            return None;
        }
        let index = rng.gen_range(0..self.ids.len());
        Some(self.take_at(index))
    }

    /// Draw with aggregate-mass bias: candidates matching `favored` share
    /// `mass` of the total probability, the rest split the remainder.
    pub fn take_biased(
        &mut self,
        rng: &mut StdRng,
        mass: f64,
        favored: impl Fn(u16) -> bool,
    ) -> Option<u16> {
        if self.ids.is_empty() {
            return None;
        }
        let weights = aggregate_mass_weights(&self.ids, mass, favored);
        let index = pick_weighted(rng, &weights)?;
        Some(self.take_at(index))
    }

    /// Uniform draw restricted to candidates passing `filter`. `None` when
    /// no candidate qualifies (pool exhaustion for the caller to skip on).
    pub fn take_random_where(
        &mut self,
        rng: &mut StdRng,
        filter: impl Fn(u16) -> bool,
    ) -> Option<u16> {
        let candidates: Vec<usize> = self
            .ids
            .iter()
            .enumerate()
            .filter(|(_, id)| filter(**id))
            .map(|(i, _)| i)
            .collect();
        if candidates.is_empty() {
            return None;
        }
        let pick = candidates[rng.gen_range(0..candidates.len())];
        Some(self.take_at(pick))
    }
}

/// Weight vector where the favoured subset shares `mass` of the total and
/// everything else splits `1 - mass` evenly. Degenerate subsets (none or
/// all favoured) produce uniform weights.
pub(crate) fn aggregate_mass_weights(
    ids: &[u16],
    mass: f64,
    favored: impl Fn(u16) -> bool,
) -> Vec<f64> {
    let flags: Vec<bool> = ids.iter().map(|id| favored(*id)).collect();
    let favored_count = flags.iter().filter(|f| **f).count();

    if favored_count == 0 || favored_count == ids.len() {
        return vec![1.0; ids.len()];
    }

    let mass = mass.clamp(0.0, 1.0);
    let favored_weight = mass / favored_count as f64;
    let other_weight = (1.0 - mass) / (ids.len() - favored_count) as f64;
    flags
        .iter()
        .map(|f| if *f { favored_weight } else { other_weight })
        .collect()
}

/// Sample an index proportionally to `weights`. A non-positive total falls
/// back to a uniform draw; an empty slice yields `None`.
pub(crate) fn pick_weighted(rng: &mut StdRng, weights: &[f64]) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }

    let total: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
    if total <= 0.0 {
        return Some(rng.gen_range(0..weights.len()));
    }

    let mut roll = rng.gen_range(0.0..total);
    for (index, weight) in weights.iter().enumerate() {
        if !weight.is_finite() || *weight <= 0.0 {
            continue;
        }
        if roll < *weight {
            return Some(index);
        }
        roll -= weight;
    }
    // Floating-point slack lands on the last positive weight.
    weights
        .iter()
        .rposition(|w| w.is_finite() && *w > 0.0)
        .or(Some(weights.len() - 1))
}

/// Draw an index from a discrete distribution given as weights.
pub(crate) fn pick_discrete(rng: &mut StdRng, weights: &[f64]) -> usize {
    pick_weighted(rng, weights).unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;

    #[test]
    fn pool_never_repeats_within_a_pass() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut pool = Pool::new((1..=20).collect());
        let mut seen = Vec::new();
        while let Some(id) = pool.take_random(&mut rng) {
            assert!(!seen.contains(&id));
            seen.push(id);
        }
        assert_eq!(seen.len(), 20);
        assert!(pool.is_empty());
    }

    #[test]
    fn empty_favored_set_falls_back_to_uniform() {
        let ids: Vec<u16> = (1..=4).collect();
        let weights = aggregate_mass_weights(&ids, 0.9, |_| false);
        assert_eq!(weights, vec![1.0; 4]);
    }

    #[test]
    fn favored_subset_carries_the_aggregate_mass() {
        let ids: Vec<u16> = (1..=4).collect();
        let weights = aggregate_mass_weights(&ids, 0.9, |id| id <= 2);
        assert!((weights[0] - 0.45).abs() < 1e-12);
        assert!((weights[3] - 0.05).abs() < 1e-12);
        let total: f64 = weights.iter().sum();
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn biased_draw_prefers_favored_candidates() {
        let mut rng = StdRng::seed_from_u64(99);
        let mut hits = 0usize;
        for _ in 0..500 {
            let mut pool = Pool::new((1..=10).collect());
            let picked = pool.take_biased(&mut rng, 0.9, |id| id == 3).unwrap();
            if picked == 3 {
                hits += 1;
            }
        }
        // 90% aggregate mass on a single candidate.
        assert!(hits > 350, "only {hits}/500 favored picks");
    }

    #[test]
    fn filtered_draw_exhausts_to_none() {
        let mut rng = StdRng::seed_from_u64(3);
        let mut pool = Pool::new(vec![2, 4, 6]);
        assert!(pool.take_random_where(&mut rng, |id| id % 2 == 1).is_none());
        assert_eq!(pool.len(), 3);
    }
}
