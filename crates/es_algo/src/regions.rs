//! Regional swing: contiguous voter slices, each with one favored party.
//!
//! Contract:
//! - The pool holds `(party_index, slot)` entries, party-major, so entry 0
//!   is `(0, 0)` and the first region favors party 0.
//! - With `len` pool entries, region k covers `[k·N/len, (k+1)·N/len)`.
//! - Crossing a boundary consumes the current entry; the next one is drawn
//!   uniformly from what remains. Each party is therefore favored in exactly
//!   as many regions as it has slots.
//! - A party contributes at most `MAX_REGION_SLOTS` entries, and consuming an
//!   entry is O(1), so drawing a plan is linear in the pool size.
//!
//! Determinism:
//! - Boundaries depend only on `N` and the pool size.
//! - Draws come from the run's `SimRng`, made up front, so the plan can be
//!   walked (or split across workers) without touching the RNG again.

use serde::{Deserialize, Serialize};

use es_core::party::Party;
use es_core::rng::SimRng;
use es_core::variables::{RegionSlots, MAX_REGION_SLOTS};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub start: u64,
    pub end: u64,
    /// Index of the favored party in the active list.
    pub favored: usize,
}

/// All regions of one tabulation, in voter order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegionPlan {
    regions: Vec<Region>,
}

/// Pool entries a party contributes.
pub fn slots_for(party: &Party, slots: RegionSlots) -> u32 {
    match slots {
        RegionSlots::Fixed { per_party } => per_party.clamp(1, MAX_REGION_SLOTS),
        RegionSlots::ByPopularity { per_point } => {
            let n = (party.popularity() * per_point).round();
            if n >= 1.0 {
                n.min(f64::from(MAX_REGION_SLOTS)) as u32
            } else {
                1
            }
        }
    }
}

impl RegionPlan {
    /// Draw the plan for `parties` over `population` voters.
    pub fn draw(parties: &[Party], population: u64, slots: RegionSlots, rng: &mut SimRng) -> Self {
        let mut pool: Vec<(usize, u32)> = parties
            .iter()
            .enumerate()
            .flat_map(|(i, p)| (0..slots_for(p, slots)).map(move |s| (i, s)))
            .collect();

        let len = pool.len() as u128;
        let mut regions = Vec::with_capacity(pool.len());
        let mut current = 0usize;
        let mut k: u128 = 0;

        while !pool.is_empty() {
            let start = (k * population as u128 / len) as u64;
            let end = ((k + 1) * population as u128 / len) as u64;
            // Order of the remaining entries is irrelevant: the next pick is uniform.
            let (favored, _slot) = pool.swap_remove(current);
            regions.push(Region { start, end, favored });
            current = rng.choose_index(pool.len()).unwrap_or(0);
            k += 1;
        }

        Self { regions }
    }

    /// One region covering every voter.
    pub fn single(population: u64, favored: usize) -> Self {
        Self {
            regions: vec![Region { start: 0, end: population, favored }],
        }
    }

    #[inline]
    pub fn regions(&self) -> &[Region] {
        &self.regions
    }

    pub fn cursor(&self) -> RegionCursor<'_> {
        RegionCursor { plan: self, idx: 0 }
    }

    /// How many regions favor each party.
    pub fn favored_counts(&self, parties: usize) -> Vec<u32> {
        let mut out = vec![0u32; parties];
        for r in &self.regions {
            if let Some(c) = out.get_mut(r.favored) {
                *c += 1;
            }
        }
        out
    }
}

/// Sequential walker; voter indices must be visited in ascending order.
#[derive(Debug, Clone)]
pub struct RegionCursor<'a> {
    plan: &'a RegionPlan,
    idx: usize,
}

impl RegionCursor<'_> {
    pub fn favored_for(&mut self, i: u64) -> Option<usize> {
        let regions = &self.plan.regions;
        while self.idx < regions.len() && regions[self.idx].end <= i {
            self.idx += 1;
        }
        regions.get(self.idx).filter(|r| r.start <= i).map(|r| r.favored)
    }
}
