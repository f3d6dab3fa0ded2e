//! # Tree Guide
//!
//! Structured exploration of a generator's input space.
//!
//! A generator makes every decision through a [`Chooser`], which returns a
//! bounded integer for each branch point. The [`Guide`] behind the chooser
//! decides what those integers are: independent random draws
//! ([`DefaultGuide`]), an exhaustive breadth-first walk of the decision tree
//! ([`BfsGuide`]), sampling steered by estimated subtree sizes
//! ([`WeightedSamplerGuide`]), or a replay of a recorded choice log
//! ([`FileGuide`]). Recording is done by wrapping any guide in a
//! [`SaverGuide`], and [`RoundRobinGuide`] interleaves several guides.
//!
//! Recorded logs can be edited with [`mutate::Mutator`] and replayed
//! against a generator whose structure has since changed; see
//! [`SyncMode`] for how the replay copes with that.

pub mod choices;
pub mod config;
pub mod driver;
pub mod error;
pub mod guide;
pub mod mutate;
pub mod priq;

pub use choices::{format_choices, parse_choices, parse_choices_str, Rec};
pub use config::{GeneratorEnv, GuideConfig, GuideKind};
pub use driver::{explore, ExploreReport};
pub use error::{GuideError, GuideResult};
pub use guide::{
    BfsChooser, BfsGuide, Chooser, DefaultChooser, DefaultGuide, FileChooser, FileGuide, Guide,
    GuideStats, RoundRobinGuide, SaverChooser, SaverGuide, SyncMode, WeightedSamplerChooser,
    WeightedSamplerGuide,
};
pub use mutate::{Mutation, Mutator};
pub use priq::PriQ;
