//! Recording decorator
//!
//! [`SaverGuide`] wraps another guide and logs every value its choosers
//! hand out, together with scope brackets, so that a traversal can be
//! written next to the artifact it produced and replayed later by a
//! [`FileGuide`](super::FileGuide).

use super::{Chooser, Guide, GuideStats};
use crate::choices::{self, Rec, DEFAULT_LINE_LENGTH, DEFAULT_PREFIX};
use crate::error::{GuideError, GuideResult};

/// Guide that records the choices made through another guide
#[derive(Debug)]
pub struct SaverGuide<G: Guide> {
    inner: G,
    prefix: String,
    max_line_length: usize,
}

impl<G: Guide> SaverGuide<G> {
    pub fn new(inner: G) -> Self {
        Self {
            inner,
            prefix: DEFAULT_PREFIX.to_string(),
            max_line_length: DEFAULT_LINE_LENGTH,
        }
    }

    /// Use `prefix` at the start of every formatted line
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    pub fn with_line_length(mut self, max_line_length: usize) -> Self {
        self.max_line_length = max_line_length;
        self
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn inner(&self) -> &G {
        &self.inner
    }

    pub fn into_inner(self) -> G {
        self.inner
    }

    /// Concrete chooser, which gives access to the recorded choices
    pub fn chooser(&mut self) -> GuideResult<Option<SaverChooser<'_>>> {
        let inner = match self.inner.make_chooser()? {
            Some(inner) => inner,
            None => return Ok(None),
        };
        Ok(Some(SaverChooser {
            inner,
            saved: Vec::new(),
            prefix: self.prefix.clone(),
            max_line_length: self.max_line_length,
        }))
    }
}

impl<G: Guide> Guide for SaverGuide<G> {
    fn make_chooser(&mut self) -> GuideResult<Option<Box<dyn Chooser + '_>>> {
        Ok(self
            .chooser()?
            .map(|chooser| Box::new(chooser) as Box<dyn Chooser + '_>))
    }

    fn name(&self) -> String {
        format!("{} (wrapped by Saver)", self.inner.name())
    }

    fn is_exhausted(&self) -> bool {
        self.inner.is_exhausted()
    }

    fn stats(&self) -> GuideStats {
        self.inner.stats()
    }
}

/// Chooser of [`SaverGuide`]
pub struct SaverChooser<'a> {
    inner: Box<dyn Chooser + 'a>,
    saved: Vec<Rec>,
    prefix: String,
    max_line_length: usize,
}

impl<'a> SaverChooser<'a> {
    /// Records captured so far, in order
    pub fn choices(&self) -> &[Rec] {
        &self.saved
    }

    /// The records as a prefixed text block
    pub fn format_choices(&self) -> String {
        choices::format_choices(&self.saved, &self.prefix, self.max_line_length)
    }

    /// End the traversal and keep the log. A traversal that hit a fatal
    /// error yields that error instead.
    pub fn into_choices(mut self) -> GuideResult<Vec<Rec>> {
        self.inner.finish()?;
        Ok(self.saved)
    }

    fn record(&mut self, value: u64) -> u64 {
        self.saved.push(Rec::Num(value));
        value
    }
}

impl std::fmt::Debug for SaverChooser<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SaverChooser")
            .field("saved", &self.saved)
            .field("prefix", &self.prefix)
            .finish_non_exhaustive()
    }
}

impl Chooser for SaverChooser<'_> {
    fn choose(&mut self, n: u64) -> u64 {
        let value = self.inner.choose(n);
        self.record(value)
    }

    fn choose_weighted(&mut self, weights: &[f64]) -> u64 {
        let value = self.inner.choose_weighted(weights);
        self.record(value)
    }

    fn choose_weighted_counts(&mut self, counts: &[u64]) -> u64 {
        let value = self.inner.choose_weighted_counts(counts);
        self.record(value)
    }

    fn choose_unimportant(&mut self) -> u64 {
        let value = self.inner.choose_unimportant();
        self.record(value)
    }

    fn begin_scope(&mut self) {
        self.saved.push(Rec::Start);
        self.inner.begin_scope();
    }

    fn end_scope(&mut self) {
        self.saved.push(Rec::End);
        self.inner.end_scope();
    }

    fn fault(&self) -> Option<&GuideError> {
        self.inner.fault()
    }

    fn finish(&mut self) -> GuideResult<()> {
        self.inner.finish()
    }
}
