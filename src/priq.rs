//! Level-bucketed FIFO queue
//!
//! Items are filed under a level (tree depth) and handed back shallowest
//! level first. Within a level the order is first-in, first-out. The
//! shallowest nonempty level is cached and only recomputed, by scanning
//! forward, when that level runs dry, so the total scanning cost is bounded
//! by the number of insertions.

/// Number of consumed slots a bucket may accumulate before it is compacted
const MAX_FREE: usize = 256;

#[derive(Debug, Clone)]
struct Bucket<T> {
    items: Vec<T>,
    start: usize,
}

impl<T> Default for Bucket<T> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            start: 0,
        }
    }
}

impl<T> Bucket<T> {
    fn len(&self) -> usize {
        self.items.len() - self.start
    }
}

/// Sparse array of FIFO buckets indexed by level
#[derive(Debug, Clone)]
pub struct PriQ<T> {
    levels: Vec<Bucket<T>>,
    highest: Option<usize>,
    len: usize,
}

impl<T> Default for PriQ<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone> PriQ<T> {
    /// Remove the oldest item filed under `level`
    pub fn remove(&mut self, level: usize) -> Option<T> {
        let bucket = self.levels.get_mut(level)?;
        if bucket.len() == 0 {
            return None;
        }
        let item = bucket.items[bucket.start].clone();
        bucket.start += 1;
        if bucket.start > MAX_FREE {
            bucket.items.drain(..bucket.start);
            bucket.start = 0;
        }
        let now_empty = bucket.len() == 0;
        self.len -= 1;

        if now_empty && self.highest == Some(level) {
            self.highest = (level + 1..self.levels.len()).find(|&l| self.count(l) > 0);
        }
        Some(item)
    }

    /// Remove the oldest item from the shallowest nonempty level, returning
    /// it together with that level
    pub fn remove_head(&mut self) -> Option<(T, usize)> {
        let level = self.highest?;
        self.remove(level).map(|item| (item, level))
    }
}

impl<T> PriQ<T> {
    pub fn new() -> Self {
        Self {
            levels: Vec::new(),
            highest: None,
            len: 0,
        }
    }

    /// File `item` under `level`
    pub fn insert(&mut self, item: T, level: usize) {
        if level >= self.levels.len() {
            self.levels.resize_with(level + 1, Bucket::default);
        }
        self.levels[level].items.push(item);
        self.len += 1;
        if self.highest.map_or(true, |h| level < h) {
            self.highest = Some(level);
        }
    }

    /// Number of items currently filed under `level`
    pub fn count(&self, level: usize) -> usize {
        self.levels.get(level).map_or(0, Bucket::len)
    }

    /// Smallest level holding at least one item
    pub fn first_nonempty_level(&self) -> Option<usize> {
        self.highest
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
