//! Exhaustive breadth-first exploration of the decision tree
//!
//! The guide keeps an explicit record of every decision point any traversal
//! has reached. Nodes live in an arena and refer to each other by index;
//! a child slot is `None` until some traversal takes that branch. Nodes that
//! still have an untaken branch sit in a [`PriQ`] keyed by depth, so each new
//! traversal replays the path down to the shallowest such node, takes one of
//! its untaken branches, and continues randomly from there.
//!
//! Three things can happen when a chooser is requested:
//! 1. first call: a purely random traversal bootstraps the tree
//! 2. the frontier is nonempty: replay down to a frontier node and extend
//! 3. the frontier is empty: the tree is fully explored, `Ok(None)` forever

use super::{
    check_range, check_weights, draw_uniform, draw_unimportant, draw_weighted, Chooser, Guide,
    GuideStats,
};
use crate::error::{GuideError, GuideResult};
use crate::priq::PriQ;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

type NodeId = usize;

const ROOT: NodeId = 0;

#[derive(Debug, Clone)]
struct Node {
    parent: Option<NodeId>,
    children: Vec<Option<NodeId>>,
}

/// Breadth-first exhaustive guide
#[derive(Debug)]
pub struct BfsGuide {
    nodes: Vec<Node>,
    pending: PriQ<NodeId>,
    rng: ChaCha8Rng,
    started: bool,
    exhausted: bool,
    max_saved_level: Option<usize>,
    traversals: u64,
    poisoned: Option<GuideError>,
}

impl BfsGuide {
    pub fn new(seed: u64) -> Self {
        Self::with_rng(ChaCha8Rng::seed_from_u64(seed))
    }

    pub fn from_entropy() -> Self {
        Self::with_rng(ChaCha8Rng::from_entropy())
    }

    fn with_rng(rng: ChaCha8Rng) -> Self {
        // the root has a single slot standing for "before any choice"
        let root = Node {
            parent: None,
            children: vec![None],
        };
        Self {
            nodes: vec![root],
            pending: PriQ::new(),
            rng,
            started: false,
            exhausted: false,
            max_saved_level: None,
            traversals: 0,
            poisoned: None,
        }
    }

    /// Concrete chooser for the next traversal, `Ok(None)` once exhausted
    pub fn chooser(&mut self) -> GuideResult<Option<BfsChooser<'_>>> {
        if let Some(err) = &self.poisoned {
            return Err(err.poison("BFS"));
        }
        if self.exhausted {
            return Ok(None);
        }

        if !self.started {
            log::debug!("BFS: first traversal");
            self.started = true;
            self.traversals += 1;
            return Ok(Some(BfsChooser::new(self, Vec::new())));
        }

        let Some((target, level)) = self.pending.remove_head() else {
            log::debug!(
                "BFS: tree completely explored after {} traversals ({} nodes)",
                self.traversals,
                self.nodes.len()
            );
            self.exhausted = true;
            return Ok(None);
        };

        if self.max_saved_level.map_or(true, |max| level > max) {
            log::debug!("BFS: fully explored up to level {}", level);
        }
        debug_assert!(self.max_saved_level.map_or(true, |max| level >= max));
        self.max_saved_level = Some(level);

        let saved = self.path_to_frontier(target, level);
        self.traversals += 1;
        Ok(Some(BfsChooser::new(self, saved)))
    }

    /// Branch indices leading from the root to an untaken slot of `target`,
    /// in reverse order so the chooser can pop them off the end
    fn path_to_frontier(&mut self, target: NodeId, level: usize) -> Vec<usize> {
        let slots = &self.nodes[target].children;
        let untaken = slots.iter().filter(|slot| slot.is_none()).count();
        debug_assert!(untaken > 0, "frontier node without an untaken branch");
        // TODO pick a random untaken branch instead of the first one
        let first_untaken = slots.iter().position(Option::is_none).unwrap_or(0);
        if untaken > 1 {
            log::trace!("BFS: re-inserting node {} at level {}", target, level);
            self.pending.insert(target, level);
        }

        let mut saved = vec![first_untaken];
        let mut child = target;
        let mut parent = self.nodes[target].parent;
        while let Some(node) = parent {
            if node == ROOT {
                break;
            }
            let slot = self.nodes[node]
                .children
                .iter()
                .position(|&c| c == Some(child))
                .unwrap_or(0);
            saved.push(slot);
            child = node;
            parent = self.nodes[node].parent;
        }
        saved
    }

    fn alloc(&mut self, parent: NodeId, slots: u64) -> NodeId {
        let id = self.nodes.len();
        self.nodes.push(Node {
            parent: Some(parent),
            children: vec![None; slots as usize],
        });
        id
    }
}

impl Default for BfsGuide {
    fn default() -> Self {
        Self::from_entropy()
    }
}

impl Guide for BfsGuide {
    fn make_chooser(&mut self) -> GuideResult<Option<Box<dyn Chooser + '_>>> {
        Ok(self.chooser()?.map(|c| Box::new(c) as Box<dyn Chooser + '_>))
    }

    fn name(&self) -> String {
        "BFS".to_string()
    }

    fn is_exhausted(&self) -> bool {
        self.exhausted || (self.started && self.pending.is_empty())
    }

    fn stats(&self) -> GuideStats {
        GuideStats {
            traversals: self.traversals,
            total_nodes: self.nodes.len() as u64 - 1,
            pending_nodes: self.pending.len() as u64,
            max_saved_level: self.max_saved_level,
            exhausted: self.exhausted,
            ..GuideStats::default()
        }
    }
}

/// One traversal of a [`BfsGuide`]'s tree
#[derive(Debug)]
pub struct BfsChooser<'g> {
    guide: &'g mut BfsGuide,
    current: NodeId,
    last_choice: usize,
    level: usize,
    /// reversed: the next choice to replay is at the end
    saved: Vec<usize>,
    fault: Option<GuideError>,
    finished: bool,
}

impl<'g> BfsChooser<'g> {
    fn new(guide: &'g mut BfsGuide, saved: Vec<usize>) -> Self {
        Self {
            guide,
            current: ROOT,
            last_choice: 0,
            level: 0,
            saved,
            fault: None,
            finished: false,
        }
    }

    /// Current depth in the decision tree
    pub fn level(&self) -> usize {
        self.level
    }

    fn choose_internal(&mut self, n: u64, random: impl FnOnce(&mut ChaCha8Rng) -> u64) -> u64 {
        if self.fault.is_some() || self.finished {
            return random(&mut self.guide.rng);
        }

        let slot = self.guide.nodes[self.current].children[self.last_choice];
        let choice = match slot {
            Some(node) => {
                let expected = self.guide.nodes[node].children.len() as u64;
                // a revisited node always lies on the replayed path
                let replayed = if expected == n { self.saved.pop() } else { None };
                let Some(choice) = replayed else {
                    self.violation(expected, n);
                    return random(&mut self.guide.rng);
                };
                log::trace!("BFS: replaying choice {} of {} at level {}", choice, n, self.level);
                self.current = node;
                choice
            }
            None => {
                debug_assert!(self.saved.is_empty());
                let node = self.guide.alloc(self.current, n);
                self.guide.nodes[self.current].children[self.last_choice] = Some(node);
                if n > 1 {
                    log::trace!("BFS: new frontier node {} at level {} with degree {}", node, self.level, n);
                    self.guide.pending.insert(node, self.level);
                }
                self.current = node;
                random(&mut self.guide.rng) as usize
            }
        };

        self.last_choice = choice;
        self.level += 1;
        choice as u64
    }

    /// Latch a fatal branch-count mismatch and poison the guide
    fn violation(&mut self, expected: u64, actual: u64) {
        let err = GuideError::ProtocolViolation {
            depth: self.level,
            expected,
            actual,
        };
        log::error!("BFS: {}", err);
        self.guide.poisoned = Some(err.clone());
        self.fault = Some(err);
    }

    fn commit(&mut self) -> GuideResult<()> {
        if self.finished {
            return self.fault.clone().map_or(Ok(()), Err);
        }
        if self.fault.is_none() && !self.saved.is_empty() {
            // the generator stopped on the replayed path, short of the frontier
            let expected = self.guide.nodes[self.current].children[self.last_choice]
                .map_or(0, |node| self.guide.nodes[node].children.len() as u64);
            self.violation(expected, 0);
        }
        self.finished = true;
        if let Some(err) = &self.fault {
            return Err(err.clone());
        }
        // mark this leaf as visited without letting it branch any further
        if self.guide.nodes[self.current].children[self.last_choice].is_none() {
            let leaf = self.guide.alloc(self.current, 0);
            self.guide.nodes[self.current].children[self.last_choice] = Some(leaf);
        }
        log::trace!("BFS: traversal ended at level {}", self.level);
        Ok(())
    }
}

impl Chooser for BfsChooser<'_> {
    fn choose(&mut self, n: u64) -> u64 {
        check_range(n);
        self.choose_internal(n, |rng| draw_uniform(rng, n))
    }

    fn choose_weighted(&mut self, weights: &[f64]) -> u64 {
        check_weights(weights);
        self.choose_internal(weights.len() as u64, |rng| draw_weighted(rng, weights))
    }

    fn choose_unimportant(&mut self) -> u64 {
        draw_unimportant(&mut self.guide.rng)
    }

    fn fault(&self) -> Option<&GuideError> {
        self.fault.as_ref()
    }

    fn finish(&mut self) -> GuideResult<()> {
        self.commit()
    }
}

impl Drop for BfsChooser<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.commit() {
            log::error!("BFS traversal ended with a fatal error: {}", err);
        }
    }
}
