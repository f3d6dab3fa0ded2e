//! # Guides and choosers
//!
//! A generator never draws randomness directly. It asks a [`Chooser`] for
//! every decision, and the chooser's [`Guide`] decides what each decision
//! returns. One chooser covers one traversal of the generator's decision
//! tree; the guide outlives all of them and owns whatever state carries
//! over from one traversal to the next.
//!
//! ```no_run
//! use tree_guide::{BfsGuide, Chooser, Guide};
//!
//! fn generate(c: &mut dyn Chooser) -> u64 {
//!     if c.flip() { c.choose(3) } else { 10 + c.choose(2) }
//! }
//!
//! let mut guide = BfsGuide::new(7);
//! while let Some(mut chooser) = guide.make_chooser()? {
//!     generate(chooser.as_mut());
//!     chooser.finish()?;
//! }
//! # Ok::<(), tree_guide::GuideError>(())
//! ```
//!
//! Available guides:
//! - [`DefaultGuide`]: every choice is an independent uniform draw
//! - [`BfsGuide`]: exhaustive breadth-first exploration of the tree
//! - [`WeightedSamplerGuide`]: sampling steered by subtree size estimates
//! - [`SaverGuide`]: records the choices another guide makes
//! - [`FileGuide`]: replays a recorded choice log
//! - [`RoundRobinGuide`]: rotates traversals across several guides

pub mod bfs;
pub mod default;
pub mod file;
pub mod round_robin;
pub mod saver;
pub mod weighted;

pub use self::bfs::{BfsChooser, BfsGuide};
pub use self::default::{DefaultChooser, DefaultGuide};
pub use self::file::{FileChooser, FileGuide, SyncMode};
pub use self::round_robin::RoundRobinGuide;
pub use self::saver::{SaverChooser, SaverGuide};
pub use self::weighted::{WeightedSamplerChooser, WeightedSamplerGuide};

use crate::error::{GuideError, GuideResult};
use rand::distributions::{Distribution, WeightedIndex};
use rand::Rng;
use serde::Serialize;

/// Per-traversal cursor through the generator's decision tree
///
/// Dropping a chooser ends its traversal. Call [`Chooser::finish`] first to
/// learn about fatal errors; `Drop` can only log them.
pub trait Chooser {
    /// Return a value in `0..n`. Panics if `n == 0`.
    fn choose(&mut self, n: u64) -> u64;

    /// Shorthand for `choose(2) == 1`
    fn flip(&mut self) -> bool {
        self.choose(2) == 1
    }

    /// Return an index into `weights`, drawn in proportion to the weights
    /// where the guide makes a random decision. Panics on empty weights.
    fn choose_weighted(&mut self, weights: &[f64]) -> u64;

    /// Like [`Chooser::choose_weighted`] with integer counts
    fn choose_weighted_counts(&mut self, counts: &[u64]) -> u64 {
        self.choose_weighted(&normalize_counts(counts))
    }

    /// Return an arbitrary value that must not influence any later choice.
    ///
    /// The decision tree does not branch here, so generators may use it for
    /// literal constants or identifier names but never for control flow.
    fn choose_unimportant(&mut self) -> u64;

    /// Open a group of related choices, such as one grammar production
    fn begin_scope(&mut self) {}

    /// Close the innermost group opened by [`Chooser::begin_scope`]
    fn end_scope(&mut self) {}

    /// The first fatal error this traversal ran into, if any
    fn fault(&self) -> Option<&GuideError> {
        None
    }

    /// End the traversal and commit its bookkeeping to the guide.
    ///
    /// Idempotent. Choices made after `finish` are not recorded.
    fn finish(&mut self) -> GuideResult<()>;
}

/// Factory of choosers that owns cross-traversal exploration state
pub trait Guide {
    /// Start a new traversal.
    ///
    /// `Ok(None)` means the guide has nothing left to explore, which is a
    /// normal way for a driver loop to end.
    fn make_chooser(&mut self) -> GuideResult<Option<Box<dyn Chooser + '_>>>;

    /// Human-readable name for diagnostics
    fn name(&self) -> String;

    /// Whether `make_chooser` would report exhaustion right now
    fn is_exhausted(&self) -> bool {
        false
    }

    /// Instrumentation counters
    fn stats(&self) -> GuideStats {
        GuideStats::default()
    }
}

impl<G: Guide + ?Sized> Guide for &mut G {
    fn make_chooser(&mut self) -> GuideResult<Option<Box<dyn Chooser + '_>>> {
        (**self).make_chooser()
    }

    fn name(&self) -> String {
        (**self).name()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }

    fn stats(&self) -> GuideStats {
        (**self).stats()
    }
}

impl<G: Guide + ?Sized> Guide for Box<G> {
    fn make_chooser(&mut self) -> GuideResult<Option<Box<dyn Chooser + '_>>> {
        (**self).make_chooser()
    }

    fn name(&self) -> String {
        (**self).name()
    }

    fn is_exhausted(&self) -> bool {
        (**self).is_exhausted()
    }

    fn stats(&self) -> GuideStats {
        (**self).stats()
    }
}

/// Guide-local instrumentation
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GuideStats {
    /// Choosers handed out so far
    pub traversals: u64,
    /// Decision-tree nodes materialized so far
    pub total_nodes: u64,
    /// Frontier nodes that still have an unexplored branch
    pub pending_nodes: u64,
    /// Deepest level the breadth-first frontier has been drained from
    pub max_saved_level: Option<usize>,
    /// Values invented because the generator nested deeper than the log
    pub fill_ins: u64,
    /// Log values skipped because the log nested deeper than the generator
    pub discards: u64,
    /// Whether the guide has reported exhaustion
    pub exhausted: bool,
}

fn check_range(n: u64) {
    assert!(n > 0, "choose() needs at least one option");
}

fn check_weights(weights: &[f64]) {
    assert!(!weights.is_empty(), "choose_weighted() needs at least one weight");
}

/// Uniform draw from `0..n`
fn draw_uniform<R: Rng + ?Sized>(rng: &mut R, n: u64) -> u64 {
    check_range(n);
    rng.gen_range(0..n)
}

/// Index drawn in proportion to `weights`, uniform if they are degenerate
fn draw_weighted<R: Rng + ?Sized>(rng: &mut R, weights: &[f64]) -> u64 {
    check_weights(weights);
    match WeightedIndex::new(weights) {
        Ok(dist) => dist.sample(rng) as u64,
        Err(err) => {
            log::warn!("Degenerate weights {:?} ({}), drawing uniformly", weights, err);
            rng.gen_range(0..weights.len() as u64)
        }
    }
}

/// Full-width draw for choices that do not branch the tree
fn draw_unimportant<R: Rng + ?Sized>(rng: &mut R) -> u64 {
    rng.gen()
}

fn normalize_counts(counts: &[u64]) -> Vec<f64> {
    let total: f64 = counts.iter().map(|&c| c as f64).sum();
    if total == 0.0 {
        return vec![0.0; counts.len()];
    }
    counts.iter().map(|&c| c as f64 / total).collect()
}
