//! The standard exploration loop: one generator run per chooser until the
//! guide runs dry.

use crate::error::GuideResult;
use crate::guide::{Chooser, Guide};
use serde::Serialize;

/// Outcome of [`explore`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ExploreReport {
    /// Completed generator runs
    pub traversals: u64,
    /// Whether the loop ended because the guide had nothing left
    pub exhausted: bool,
}

/// Run `generate` once per chooser of `guide`, at most `limit` times.
///
/// A fatal error from any traversal ends the loop and is returned; the
/// guide is unusable afterwards.
pub fn explore<G, F>(guide: &mut G, limit: Option<u64>, mut generate: F) -> GuideResult<ExploreReport>
where
    G: Guide + ?Sized,
    F: FnMut(&mut dyn Chooser),
{
    let mut report = ExploreReport {
        traversals: 0,
        exhausted: false,
    };
    while limit.map_or(true, |max| report.traversals < max) {
        let Some(mut chooser) = guide.make_chooser()? else {
            report.exhausted = true;
            break;
        };
        generate(chooser.as_mut());
        chooser.finish()?;
        report.traversals += 1;
    }
    log::debug!(
        "Explored {} traversals with {} guide{}",
        report.traversals,
        guide.name(),
        if report.exhausted { " (exhausted)" } else { "" }
    );
    Ok(report)
}
