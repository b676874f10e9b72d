use itertools::Itertools;
use rand::seq::SliceRandom;
use rand::Rng;
use std::fmt;

/// Move codes for every combination a session can draw from
const STANDARD_COMBOS: [&[u8]; 15] = [
    &[1, 2, 3],
    &[1, 2, 3, 2],
    &[1, 6, 3],
    &[2, 3, 2],
    &[1, 2, 5, 2],
    &[3, 4, 2],
    &[1, 2, 3, 4],
    &[1, 2, 5],
    &[2, 5, 4],
    &[1, 6, 3, 2],
    &[1, 2, 1],
    &[2, 3, 2, 1],
    &[3, 2, 3],
    &[1, 4, 3, 2],
    &[1, 1, 2, 3],
];

/// An ordered sequence of move codes shown for one round.
///
/// Equality is by value: two combinations are the same when they have the
/// same length and the same codes in the same order.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Combination(Vec<u8>);

impl Combination {
    /// Returns `None` for an empty sequence or one containing a zero code.
    pub fn new(moves: &[u8]) -> Option<Self> {
        if moves.is_empty() || moves.contains(&0) {
            return None;
        }
        Some(Self(moves.to_vec()))
    }

    pub fn moves(&self) -> &[u8] {
        &self.0
    }

}

impl fmt::Display for Combination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.iter().join(" - "))
    }
}

/// The fixed set of combinations a session draws from
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<Combination>,
}

impl Catalog {
    /// Build a catalog from arbitrary entries. Invalid sequences are skipped.
    /// Returns `None` when nothing usable remains.
    pub fn from_moves(entries: &[&[u8]]) -> Option<Self> {
        let entries: Vec<Combination> = entries.iter().filter_map(|m| Combination::new(m)).collect();
        if entries.is_empty() {
            None
        } else {
            Some(Self { entries })
        }
    }

    pub fn entries(&self) -> &[Combination] {
        &self.entries
    }

    /// Entries not already present (by value) in `used`
    pub fn unused<'a>(&'a self, used: &[Combination]) -> Vec<&'a Combination> {
        self.entries
            .iter()
            .filter(|entry| !used.contains(entry))
            .collect()
    }

    fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> Combination {
        // entries is never empty, see the constructors
        self.entries
            .choose(rng)
            .cloned()
            .unwrap_or_else(|| self.entries[0].clone())
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self {
            entries: STANDARD_COMBOS
                .iter()
                .map(|moves| Combination(moves.to_vec()))
                .collect(),
        }
    }
}

/// Strategy for drawing the next combination of a session
pub trait ComboSelector {
    fn select<R: Rng + ?Sized>(
        &self,
        catalog: &Catalog,
        used: &[Combination],
        rng: &mut R,
    ) -> Combination;
}

/// Unrestricted draw from the whole catalog, used when a session restarts
pub struct RandomSelector;

impl ComboSelector for RandomSelector {
    fn select<R: Rng + ?Sized>(
        &self,
        catalog: &Catalog,
        _used: &[Combination],
        rng: &mut R,
    ) -> Combination {
        catalog.pick(rng)
    }
}

/// Prefers combinations not shown yet in this session.
///
/// Once every catalog entry has been used it falls back to an unrestricted
/// draw so that the session can always advance.
pub struct FreshSelector;

impl ComboSelector for FreshSelector {
    fn select<R: Rng + ?Sized>(
        &self,
        catalog: &Catalog,
        used: &[Combination],
        rng: &mut R,
    ) -> Combination {
        match catalog.unused(used).choose(rng) {
            Some(fresh) => (*fresh).clone(),
            None => RandomSelector.select(catalog, used, rng),
        }
    }
}

/// Draw the next combination, avoiding anything in `used` while possible
pub fn draw_next<R: Rng + ?Sized>(
    catalog: &Catalog,
    used: &[Combination],
    rng: &mut R,
) -> Combination {
    FreshSelector.select(catalog, used, rng)
}
