//! Stateless baseline guide: every choice is an independent uniform draw.
//!
//! Useful as a point of comparison for the smarter guides and as the
//! delegate that [`SaverGuide`](super::SaverGuide) usually wraps.

use super::{draw_uniform, draw_unimportant, draw_weighted, Chooser, Guide, GuideStats};
use crate::error::GuideResult;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

/// Guide whose choosers draw every value from one shared PRNG
#[derive(Debug, Clone)]
pub struct DefaultGuide {
    rng: ChaCha8Rng,
    traversals: u64,
}

impl DefaultGuide {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            traversals: 0,
        }
    }

    /// Seed from operating-system entropy
    pub fn from_entropy() -> Self {
        Self {
            rng: ChaCha8Rng::from_entropy(),
            traversals: 0,
        }
    }

    /// Concrete chooser, for callers that do not need a trait object
    pub fn chooser(&mut self) -> DefaultChooser<'_> {
        self.traversals += 1;
        DefaultChooser { rng: &mut self.rng }
    }
}

impl Default for DefaultGuide {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl Guide for DefaultGuide {
    fn make_chooser(&mut self) -> GuideResult<Option<Box<dyn Chooser + '_>>> {
        Ok(Some(Box::new(self.chooser())))
    }

    fn name(&self) -> String {
        "default".to_string()
    }

    fn stats(&self) -> GuideStats {
        GuideStats {
            traversals: self.traversals,
            ..GuideStats::default()
        }
    }
}

/// Chooser of [`DefaultGuide`]; scopes are ignored
#[derive(Debug)]
pub struct DefaultChooser<'g> {
    rng: &'g mut ChaCha8Rng,
}

impl Chooser for DefaultChooser<'_> {
    fn choose(&mut self, n: u64) -> u64 {
        draw_uniform(self.rng, n)
    }

    fn choose_weighted(&mut self, weights: &[f64]) -> u64 {
        draw_weighted(self.rng, weights)
    }

    fn choose_unimportant(&mut self) -> u64 {
        draw_unimportant(self.rng)
    }

    fn finish(&mut self) -> GuideResult<()> {
        Ok(())
    }
}
