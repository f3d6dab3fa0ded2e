//! Replay of recorded choice logs
//!
//! Every chooser of a [`FileGuide`] walks the same log from the start. The
//! log is a hint rather than a contract: it may have been mutated, or the
//! generator may have changed since it was written, so running off the end
//! of the log or reading an out-of-range value never fails. Values are
//! reduced into range and a missing value is invented.
//!
//! When the generator opens and closes scopes, the chooser tracks two
//! depths: the one implied by the `{`/`}` records consumed from the log and
//! the one implied by the generator's own `begin_scope`/`end_scope` calls.
//! [`SyncMode`] selects what happens when they disagree.

use super::{check_range, check_weights, Chooser, Guide, GuideStats};
use crate::choices::{parse_choices, Rec};
use crate::error::{GuideError, GuideResult};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::str::FromStr;

/// How a [`FileChooser`] reconciles log nesting with generator nesting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SyncMode {
    /// Ignore scopes and return the log's values in order
    None,
    /// Invent values while the generator is deeper than the log and skip
    /// log values while the log is deeper than the generator
    #[default]
    Resync,
    /// Like `Resync`, but both nestings must balance exactly
    Balance,
}

impl fmt::Display for SyncMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SyncMode::None => "none",
            SyncMode::Resync => "resync",
            SyncMode::Balance => "balance",
        })
    }
}

impl FromStr for SyncMode {
    type Err = GuideError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "none" => Ok(SyncMode::None),
            "resync" => Ok(SyncMode::Resync),
            "balance" => Ok(SyncMode::Balance),
            other => Err(GuideError::Config(format!("unknown sync mode '{}'", other))),
        }
    }
}

/// Guide whose choosers replay one choice log
#[derive(Debug)]
pub struct FileGuide {
    records: Vec<Rec>,
    sync: SyncMode,
    rng: ChaCha8Rng,
    traversals: u64,
    fill_ins: u64,
    discards: u64,
    poisoned: Option<GuideError>,
}

impl FileGuide {
    /// Replay `records`, which must not be empty
    pub fn from_records(records: Vec<Rec>) -> GuideResult<Self> {
        if records.is_empty() {
            return Err(GuideError::EmptyLog);
        }
        Ok(Self {
            records,
            sync: SyncMode::default(),
            rng: ChaCha8Rng::seed_from_u64(0),
            traversals: 0,
            fill_ins: 0,
            discards: 0,
            poisoned: None,
        })
    }

    /// Parse a formatted choice block from `reader`
    pub fn parse<R: BufRead>(reader: R, prefix: &str) -> GuideResult<Self> {
        Self::from_records(parse_choices(reader, prefix)?)
    }

    /// Parse the formatted choice block found in the file at `path`
    pub fn from_path(path: impl AsRef<Path>, prefix: &str) -> GuideResult<Self> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|err| {
            GuideError::Io(format!("cannot open choice file '{}': {}", path.display(), err))
        })?;
        log::debug!("Loading choices from {}", path.display());
        Self::parse(BufReader::new(file), prefix)
    }

    /// Seed for the values invented when the log runs short
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = ChaCha8Rng::seed_from_u64(seed);
        self
    }

    pub fn with_sync(mut self, sync: SyncMode) -> Self {
        self.sync = sync;
        self
    }

    pub fn set_sync(&mut self, sync: SyncMode) {
        self.sync = sync;
    }

    pub fn sync(&self) -> SyncMode {
        self.sync
    }

    /// The log being replayed
    pub fn choices(&self) -> &[Rec] {
        &self.records
    }

    /// Swap in a new log, for example a mutated copy of the current one.
    /// This also clears an earlier nesting failure.
    pub fn replace_choices(&mut self, records: Vec<Rec>) -> GuideResult<()> {
        if records.is_empty() {
            return Err(GuideError::EmptyLog);
        }
        self.records = records;
        self.poisoned = None;
        Ok(())
    }

    pub fn chooser(&mut self) -> GuideResult<FileChooser<'_>> {
        if let Some(err) = &self.poisoned {
            return Err(err.poison("file"));
        }
        self.traversals += 1;
        Ok(FileChooser {
            guide: self,
            pos: 0,
            counter: 0,
            file_depth: 0,
            generator_depth: 0,
            fill_ins: 0,
            discards: 0,
            warned: false,
            fault: None,
            finished: false,
        })
    }
}

impl Guide for FileGuide {
    fn make_chooser(&mut self) -> GuideResult<Option<Box<dyn Chooser + '_>>> {
        Ok(Some(Box::new(self.chooser()?)))
    }

    fn name(&self) -> String {
        "file".to_string()
    }

    fn stats(&self) -> GuideStats {
        GuideStats {
            traversals: self.traversals,
            fill_ins: self.fill_ins,
            discards: self.discards,
            ..GuideStats::default()
        }
    }
}

/// One replay of a [`FileGuide`]'s log
#[derive(Debug)]
pub struct FileChooser<'g> {
    guide: &'g mut FileGuide,
    pos: usize,
    /// fallback once the log is used up under `SyncMode::None`
    counter: u64,
    file_depth: i64,
    generator_depth: i64,
    fill_ins: u64,
    discards: u64,
    warned: bool,
    fault: Option<GuideError>,
    finished: bool,
}

impl FileChooser<'_> {
    /// Values invented because the generator was nested deeper than the log
    pub fn fill_ins(&self) -> u64 {
        self.fill_ins
    }

    /// Log values skipped because the log was nested deeper than the generator
    pub fn discards(&self) -> u64 {
        self.discards
    }

    pub fn file_depth(&self) -> i64 {
        self.file_depth
    }

    pub fn generator_depth(&self) -> i64 {
        self.generator_depth
    }

    fn log_exhausted(&mut self) {
        if !self.warned {
            log::warn!(
                "Choice log exhausted after {} records, inventing values",
                self.guide.records.len()
            );
            self.warned = true;
        }
    }

    /// The next raw value, before reduction into the requested range
    fn next_value(&mut self) -> u64 {
        if self.fault.is_some() || self.finished {
            return self.guide.rng.gen();
        }
        match self.guide.sync {
            SyncMode::None => self.next_in_order(),
            SyncMode::Resync | SyncMode::Balance => self.next_in_sync(),
        }
    }

    fn next_in_order(&mut self) -> u64 {
        while let Some(&rec) = self.guide.records.get(self.pos) {
            self.pos += 1;
            if let Rec::Num(value) = rec {
                return value;
            }
        }
        self.log_exhausted();
        let value = self.counter;
        self.counter += 1;
        value
    }

    /// Consume scope records until a value at the generator's depth turns
    /// up, or invent one when the log cannot provide it
    fn next_in_sync(&mut self) -> u64 {
        loop {
            let Some(&rec) = self.guide.records.get(self.pos) else {
                self.log_exhausted();
                return self.guide.rng.gen();
            };
            match rec {
                Rec::Start => {
                    self.file_depth += 1;
                    self.pos += 1;
                }
                Rec::End => {
                    self.file_depth -= 1;
                    self.pos += 1;
                }
                Rec::Num(value) => match self.file_depth.cmp(&self.generator_depth) {
                    Ordering::Equal => {
                        self.pos += 1;
                        return value;
                    }
                    Ordering::Less => {
                        self.fill_ins += 1;
                        log::trace!(
                            "file: fill-in at generator depth {} (log depth {})",
                            self.generator_depth,
                            self.file_depth
                        );
                        return self.guide.rng.gen();
                    }
                    Ordering::Greater => {
                        self.discards += 1;
                        log::trace!(
                            "file: discarding {} at log depth {} (generator depth {})",
                            value,
                            self.file_depth,
                            self.generator_depth
                        );
                        self.pos += 1;
                    }
                },
            }
        }
    }

    fn imbalance(&mut self) {
        let err = GuideError::NestingImbalance {
            file_depth: self.file_depth,
            generator_depth: self.generator_depth,
        };
        log::error!("file: {}", err);
        self.guide.poisoned = Some(err.clone());
        self.fault = Some(err);
    }

    fn commit(&mut self) -> GuideResult<()> {
        if self.finished {
            return self.fault.clone().map_or(Ok(()), Err);
        }
        if self.fault.is_none() && self.guide.sync == SyncMode::Balance {
            // the rest of the log must still nest properly
            for rec in &self.guide.records[self.pos..] {
                match rec {
                    Rec::Start => self.file_depth += 1,
                    Rec::End => self.file_depth -= 1,
                    Rec::Num(_) => {}
                }
                if self.file_depth < 0 {
                    break;
                }
            }
            self.pos = self.guide.records.len();
            if self.file_depth != 0 || self.generator_depth != 0 {
                self.imbalance();
            }
        }
        self.finished = true;
        self.guide.fill_ins += self.fill_ins;
        self.guide.discards += self.discards;
        if self.fill_ins > 0 || self.discards > 0 {
            log::debug!(
                "file: replay finished with {} fill-ins and {} discards",
                self.fill_ins,
                self.discards
            );
        }
        match &self.fault {
            Some(err) => Err(err.clone()),
            None => Ok(()),
        }
    }
}

impl Chooser for FileChooser<'_> {
    fn choose(&mut self, n: u64) -> u64 {
        check_range(n);
        self.next_value() % n
    }

    fn choose_weighted(&mut self, weights: &[f64]) -> u64 {
        check_weights(weights);
        self.next_value() % weights.len() as u64
    }

    fn choose_unimportant(&mut self) -> u64 {
        self.next_value()
    }

    fn begin_scope(&mut self) {
        if self.guide.sync != SyncMode::None {
            self.generator_depth += 1;
        }
    }

    fn end_scope(&mut self) {
        if self.guide.sync == SyncMode::None {
            return;
        }
        self.generator_depth -= 1;
        if self.guide.sync == SyncMode::Balance
            && self.generator_depth < 0
            && self.fault.is_none()
            && !self.finished
        {
            self.imbalance();
        }
    }

    fn fault(&self) -> Option<&GuideError> {
        self.fault.as_ref()
    }

    fn finish(&mut self) -> GuideResult<()> {
        self.commit()
    }
}

impl Drop for FileChooser<'_> {
    fn drop(&mut self) {
        if self.finished {
            return;
        }
        if let Err(err) = self.commit() {
            log::error!("replay ended with a fatal error: {}", err);
        }
    }
}
