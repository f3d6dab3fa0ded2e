//! Array-level edits of choice logs
//!
//! A mutated log is fed back through a [`FileGuide`](crate::guide::FileGuide)
//! to obtain a variant of the artifact that produced it. The edits know
//! nothing about scopes, so a mutated log may nest differently from any run
//! of the generator; the file guide's [`SyncMode`](crate::guide::SyncMode)
//! decides how that is reconciled.

use crate::choices::Rec;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;

/// Longest slice removed or inserted by a single edit
const MAX_SLICE: usize = 10;

/// What a single edit did to a log
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mutation {
    /// The value at `index` was replaced
    ChangeOne { index: usize },
    /// `len` records starting at `start` were removed
    Remove { start: usize, len: usize },
    /// `len` fresh values were inserted at `index`
    Insert { index: usize, len: usize },
    /// The log offered nothing the chosen edit could work on
    Skipped,
}

/// Seeded source of random edits
#[derive(Debug, Clone)]
pub struct Mutator {
    rng: ChaCha8Rng,
}

impl Mutator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
        }
    }

    /// Replace the value of one randomly picked NUM record
    pub fn change_one(&mut self, recs: &mut [Rec]) -> Mutation {
        let nums: Vec<usize> = recs
            .iter()
            .enumerate()
            .filter(|(_, rec)| rec.is_num())
            .map(|(i, _)| i)
            .collect();
        if nums.is_empty() {
            return Mutation::Skipped;
        }
        let index = nums[self.rng.gen_range(0..nums.len())];
        recs[index] = Rec::Num(self.fresh_value());
        Mutation::ChangeOne { index }
    }

    /// Remove between one and ten consecutive records, always leaving at
    /// least one behind so the log can still be replayed
    pub fn remove_slice(&mut self, recs: &mut Vec<Rec>) -> Mutation {
        if recs.len() < 2 {
            return Mutation::Skipped;
        }
        let len = self.rng.gen_range(1..=MAX_SLICE).min(recs.len() - 1);
        let start = self.rng.gen_range(0..=recs.len() - len);
        recs.drain(start..start + len);
        Mutation::Remove { start, len }
    }

    /// Insert between one and ten fresh NUM records at a random position
    pub fn insert_slice(&mut self, recs: &mut Vec<Rec>) -> Mutation {
        let index = self.rng.gen_range(0..=recs.len());
        let len = self.rng.gen_range(1..=MAX_SLICE);
        let fresh: Vec<Rec> = (0..len).map(|_| Rec::Num(self.fresh_value())).collect();
        recs.splice(index..index, fresh);
        Mutation::Insert { index, len }
    }

    /// Apply one of the three edits, picked uniformly
    pub fn mutate(&mut self, recs: &mut Vec<Rec>) -> Mutation {
        let mutation = match self.rng.gen_range(0..3) {
            0 => self.change_one(recs),
            1 => self.remove_slice(recs),
            _ => self.insert_slice(recs),
        };
        log::debug!("mutate: {:?} ({} records now)", mutation, recs.len());
        mutation
    }

    fn fresh_value(&mut self) -> u64 {
        u64::from(self.rng.gen::<u32>())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn log() -> Vec<Rec> {
        vec![
            Rec::Start,
            Rec::Num(1),
            Rec::Num(2),
            Rec::End,
            Rec::Num(3),
        ]
    }

    #[test]
    fn test_change_one_only_touches_values() {
        let mut m = Mutator::new(1);
        for _ in 0..50 {
            let mut recs = log();
            match m.change_one(&mut recs) {
                Mutation::ChangeOne { index } => {
                    assert!(recs[index].is_num());
                    assert_eq!(recs.len(), 5);
                    assert_eq!(recs[0], Rec::Start);
                    assert_eq!(recs[3], Rec::End);
                }
                other => panic!("unexpected {:?}", other),
            }
        }
    }

    #[test]
    fn test_change_one_skips_logs_without_values() {
        let mut m = Mutator::new(2);
        let mut recs = vec![Rec::Start, Rec::End];
        assert_eq!(m.change_one(&mut recs), Mutation::Skipped);
        assert_eq!(m.change_one(&mut []), Mutation::Skipped);
    }

    #[test]
    fn test_remove_slice_stays_in_bounds() {
        let mut m = Mutator::new(3);
        for _ in 0..100 {
            let mut recs = log();
            match m.remove_slice(&mut recs) {
                Mutation::Remove { start, len } => {
                    assert!((1..=MAX_SLICE).contains(&len));
                    assert!(start + len <= 5);
                    assert_eq!(recs.len(), 5 - len);
                }
                other => panic!("unexpected {:?}", other),
            }
        }
        assert_eq!(m.remove_slice(&mut Vec::new()), Mutation::Skipped);
    }

    #[test]
    fn test_remove_slice_never_empties_a_log() {
        let mut m = Mutator::new(5);
        for _ in 0..100 {
            let mut single = vec![Rec::Num(3)];
            assert_eq!(m.remove_slice(&mut single), Mutation::Skipped);
            assert_eq!(single, vec![Rec::Num(3)]);

            let mut recs = log();
            m.remove_slice(&mut recs);
            assert!(!recs.is_empty());
        }
    }

    #[test]
    fn test_repeated_mutation_keeps_logs_replayable() {
        let mut m = Mutator::new(6);
        let mut recs = vec![Rec::Num(1), Rec::Num(2)];
        for _ in 0..500 {
            m.mutate(&mut recs);
            assert!(!recs.is_empty());
        }
    }

    #[test]
    fn test_insert_slice_adds_values() {
        let mut m = Mutator::new(4);
        let mut recs = Vec::new();
        match m.insert_slice(&mut recs) {
            Mutation::Insert { index, len } => {
                assert_eq!(index, 0);
                assert_eq!(recs.len(), len);
                assert!(recs.iter().all(Rec::is_num));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_same_seed_same_edits() {
        let run = |seed| {
            let mut m = Mutator::new(seed);
            let mut recs = log();
            for _ in 0..20 {
                m.mutate(&mut recs);
            }
            recs
        };
        assert_eq!(run(9), run(9));
    }
}
