//! Cardinality-estimating sampler
//!
//! Instead of enumerating the tree, this guide keeps a sparse record of the
//! nodes it has visited, each annotated with an estimate of how many leaves
//! lie beneath it. Every decision either explores (takes a child that has
//! never been visited) or exploits (revisits a known child, chosen in
//! proportion to edge weight times estimated subtree size). When a traversal
//! ends, the estimates along its path are recomputed bottom-up, assuming the
//! children not yet visited look like the average of the visited ones.

use super::{
    check_range, check_weights, draw_uniform, draw_unimportant, draw_weighted, Chooser, Guide,
    GuideStats,
};
use crate::error::{GuideError, GuideResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::collections::BTreeMap;

type NodeId = usize;

const ROOT: NodeId = 0;

/// Explore freely while a node has at most this many known children
const EAGER_EXPLORE_LIMIT: usize = 5;

/// Chance of exploring once a node has more known children than the limit
const EXPLORE_PROBABILITY: f64 = 0.1;

#[derive(Debug, Clone, Default)]
struct Node {
    visited: bool,
    branch_factor: u64,
    /// scaled so they sum to `branch_factor`; empty means all weights are 1
    weights: Vec<f64>,
    children: BTreeMap<u64, NodeId>,
    size_estimate: f64,
}

impl Node {
    /// Record the shape of this node the first time it is reached. Returns
    /// the previous branch factor when a later visit disagrees with it.
    fn visit(&mut self, n: u64, weights: &[f64]) -> Result<(), u64> {
        if self.visited {
            return if n == self.branch_factor {
                Ok(())
            } else {
                Err(self.branch_factor)
            };
        }
        self.visited = true;
        self.branch_factor = n;
        if n == 0 {
            self.size_estimate = 1.0;
            return Ok(());
        }
        self.size_estimate = n as f64;
        let total: f64 = weights.iter().sum();
        if !weights.is_empty() && total > 0.0 && total.is_finite() {
            self.weights = weights.iter().map(|w| w / total * n as f64).collect();
        }
        Ok(())
    }

    fn weight(&self, i: u64) -> f64 {
        self.weights.get(i as usize).copied().unwrap_or(1.0)
    }

    fn fully_known(&self) -> bool {
        self.children.len() as u64 >= self.branch_factor
    }
}

/// Guide that samples the tree guided by online subtree-size estimates
#[derive(Debug)]
pub struct WeightedSamplerGuide {
    nodes: Vec<Node>,
    rng: ChaCha8Rng,
    traversals: u64,
    poisoned: Option<GuideError>,
}

impl WeightedSamplerGuide {
    pub fn new(seed: u64) -> Self {
        Self {
            nodes: vec![Node::default()],
            rng: ChaCha8Rng::seed_from_u64(seed),
            traversals: 0,
            poisoned: None,
        }
    }

    /// Concrete chooser for the next traversal
    pub fn chooser(&mut self) -> GuideResult<WeightedSamplerChooser<'_>> {
        if let Some(err) = &self.poisoned {
            return Err(err.poison("weighted sample"));
        }
        self.traversals += 1;
        Ok(WeightedSamplerChooser {
            guide: self,
            trail: vec![ROOT],
            fault: None,
            finished: false,
        })
    }

    /// Estimated number of leaves in the whole tree
    pub fn size_estimate(&self) -> Option<f64> {
        let root = &self.nodes[ROOT];
        root.visited.then_some(root.size_estimate)
    }

    /// Whether every leaf reachable from the root has been visited
    pub fn fully_explored(&self) -> bool {
        let mut stack = vec![ROOT];
        while let Some(id) = stack.pop() {
            let node = &self.nodes[id];
            if !node.visited || !node.fully_known() {
                return false;
            }
            stack.extend(node.children.values().copied());
        }
        true
    }

    fn alloc(&mut self) -> NodeId {
        self.nodes.push(Node::default());
        self.nodes.len() - 1
    }
}

impl Default for WeightedSamplerGuide {
    fn default() -> Self {
        Self::new(0)
    }
}

impl Guide for WeightedSamplerGuide {
    fn make_chooser(&mut self) -> GuideResult<Option<Box<dyn Chooser + '_>>> {
        Ok(Some(Box::new(self.chooser()?)))
    }

    fn name(&self) -> String {
        "weighted sample".to_string()
    }

    fn stats(&self) -> GuideStats {
        GuideStats {
            traversals: self.traversals,
            total_nodes: self.nodes.len() as u64,
            ..GuideStats::default()
        }
    }
}

/// One traversal of a [`WeightedSamplerGuide`]
#[derive(Debug)]
pub struct WeightedSamplerChooser<'g> {
    guide: &'g mut WeightedSamplerGuide,
    trail: Vec<NodeId>,
    fault: Option<GuideError>,
    finished: bool,
}

impl WeightedSamplerChooser<'_> {
    fn choose_internal(&mut self, n: u64, weights: &[f64]) -> u64 {
        check_range(n);
        if self.fault.is_some() || self.finished {
            return if weights.is_empty() {
                draw_uniform(&mut self.guide.rng, n)
            } else {
                draw_weighted(&mut self.guide.rng, weights)
            };
        }

        let current = *self.trail.last().unwrap_or(&ROOT);
        if let Err(expected) = self.guide.nodes[current].visit(n, weights) {
            self.violation(expected, n);
            return self.choose_internal(n, weights);
        }

        let node = &self.guide.nodes[current];
        let known = node.children.len();
        let explore = !node.fully_known()
            && (known <= EAGER_EXPLORE_LIMIT || self.guide.rng.gen::<f64>() <= EXPLORE_PROBABILITY);

        let (result, next) = if explore {
            let result = self.pick_unvisited(current);
            let child = self.guide.alloc();
            self.guide.nodes[current].children.insert(result, child);
            (result, child)
        } else {
            self.pick_known(current)
        };

        log::trace!(
            "weighted: {} child {} of {} at depth {}",
            if explore { "explored" } else { "exploited" },
            result,
            n,
            self.trail.len() - 1
        );
        self.trail.push(next);
        result
    }

    /// Draw among children never taken, by edge weight when there are weights
    fn pick_unvisited(&mut self, current: NodeId) -> u64 {
        let node = &self.guide.nodes[current];
        let open: Vec<u64> = (0..node.branch_factor)
            .filter(|i| !node.children.contains_key(i))
            .collect();
        let weights: Vec<f64> = open.iter().map(|&i| node.weight(i)).collect();
        let index = if weights.iter().any(|&w| w > 0.0) {
            draw_weighted(&mut self.guide.rng, &weights)
        } else {
            draw_uniform(&mut self.guide.rng, open.len() as u64)
        };
        open[index as usize]
    }

    /// Draw among known children by edge weight times estimated size
    fn pick_known(&mut self, current: NodeId) -> (u64, NodeId) {
        let nodes = &self.guide.nodes;
        let node = &nodes[current];
        let known: Vec<(u64, NodeId)> = node.children.iter().map(|(&i, &c)| (i, c)).collect();
        let weights: Vec<f64> = known
            .iter()
            .map(|&(i, c)| node.weight(i) * nodes[c].size_estimate)
            .collect();
        let index = draw_weighted(&mut self.guide.rng, &weights);
        known[index as usize]
    }

    fn violation(&mut self, expected: u64, actual: u64) {
        let err = GuideError::ProtocolViolation {
            depth: self.trail.len() - 1,
            expected,
            actual,
        };
        log::error!("weighted: {}", err);
        self.guide.poisoned = Some(err.clone());
        self.fault = Some(err);
    }

    /// Unwind the trail bottom-up, refreshing every size estimate on it
    fn commit(&mut self) -> GuideResult<()> {
        if self.finished {
            return self.fault.clone().map_or(Ok(()), Err);
        }
        self.finished = true;
        if self.fault.is_none() {
            if let Some(&leaf) = self.trail.last() {
                if let Err(expected) = self.guide.nodes[leaf].visit(0, &[]) {
                    self.violation(expected, 0);
                }
            }
        }
        if let Some(err) = &self.fault {
            return Err(err.clone());
        }

        self.trail.pop();
        while let Some(id) = self.trail.pop() {
            let nodes = &self.guide.nodes;
            let node = &nodes[id];
            let mut occupied = 0.0;
            let mut total = 0.0;
            for (&i, &child) in &node.children {
                let weight = node.weight(i);
                total += nodes[child].size_estimate * weight;
                occupied += weight;
            }
            if occupied > 0.0 {
                let estimate = node.branch_factor as f64 * total / occupied;
                self.guide.nodes[id].size_estimate = estimate;
            }
        }
        Ok(())
    }
}

impl Chooser for WeightedSamplerChooser<'_> {
    fn choose(&mut self, n: u64) -> u64 {
        self.choose_internal(n, &[])
    }

    fn choose_weighted(&mut self, weights: &[f64]) -> u64 {
        check_weights(weights);
        self.choose_internal(weights.len() as u64, weights)
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

impl Drop for WeightedSamplerChooser<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.commit() {
            log::error!("weighted sample traversal ended with a fatal error: {}", err);
        }
    }
}
