//! Round-robin combinator over several guides

use super::{Chooser, Guide, GuideStats};
use crate::error::GuideResult;

/// Hands out choosers from its sub-guides in turn, skipping exhausted ones
pub struct RoundRobinGuide<'a> {
    guides: Vec<Box<dyn Guide + 'a>>,
    current: usize,
}

impl<'a> RoundRobinGuide<'a> {
    pub fn new(guides: Vec<Box<dyn Guide + 'a>>) -> Self {
        Self { guides, current: 0 }
    }

    /// Add another guide at the end of the rotation
    pub fn push(&mut self, guide: impl Guide + 'a) {
        self.guides.push(Box::new(guide));
    }

    pub fn len(&self) -> usize {
        self.guides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.guides.is_empty()
    }
}

impl std::fmt::Debug for RoundRobinGuide<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<String> = self.guides.iter().map(|g| g.name()).collect();
        f.debug_struct("RoundRobinGuide")
            .field("guides", &names)
            .field("current", &self.current)
            .finish()
    }
}

impl Guide for RoundRobinGuide<'_> {
    fn make_chooser(&mut self) -> GuideResult<Option<Box<dyn Chooser + '_>>> {
        let count = self.guides.len();
        let start = self.current;
        // one full rotation, starting at the guide whose turn it is
        let (before, after) = self.guides.split_at_mut(start.min(count));
        for (offset, guide) in after.iter_mut().chain(before.iter_mut()).enumerate() {
            if let Some(chooser) = (**guide).make_chooser()? {
                let index = (start + offset) % count;
                log::trace!("round-robin: traversal from guide {}", index);
                self.current = (index + 1) % count;
                return Ok(Some(chooser));
            }
        }
        log::debug!("round-robin: none of {} guides has a traversal left", count);
        Ok(None)
    }

    fn name(&self) -> String {
        "round-robin".to_string()
    }

    fn is_exhausted(&self) -> bool {
        self.guides.iter().all(|g| g.is_exhausted())
    }

    fn stats(&self) -> GuideStats {
        let start = GuideStats {
            exhausted: self.is_exhausted(),
            ..GuideStats::default()
        };
        self.guides
            .iter()
            .map(|g| g.stats())
            .fold(start, |acc, s| GuideStats {
                traversals: acc.traversals + s.traversals,
                total_nodes: acc.total_nodes + s.total_nodes,
                pending_nodes: acc.pending_nodes + s.pending_nodes,
                max_saved_level: acc.max_saved_level.max(s.max_saved_level),
                fill_ins: acc.fill_ins + s.fill_ins,
                discards: acc.discards + s.discards,
                exhausted: acc.exhausted,
            })
    }
}
