//! Error types shared by every guide.
//!
//! Only conditions that make further exploration meaningless are errors.
//! Exhaustion is reported as `Ok(None)` from `Guide::make_chooser`, and soft
//! degradation during replay (a short or out-of-range log) is absorbed by the
//! file chooser and never surfaces here.

/// Result alias used throughout the crate
pub type GuideResult<T> = Result<T, GuideError>;

/// Fatal conditions raised by guides and choosers
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GuideError {
    /// A decision point was reached again with a different branch count.
    /// The generator's control flow is not a pure function of its choices.
    #[error("reached the same decision point again at depth {depth} with {actual} choices, previously {expected}")]
    ProtocolViolation {
        depth: usize,
        expected: u64,
        actual: u64,
    },

    /// A line of a serialized choice log could not be parsed
    #[error("malformed choice log at line {line} ({reason}): {content:?}")]
    MalformedLog {
        line: usize,
        content: String,
        reason: String,
    },

    /// The choice log parsed successfully but contained no records
    #[error("choice log contained no choices")]
    EmptyLog,

    /// Scope nesting did not balance under `SyncMode::Balance`
    #[error("unbalanced scope nesting: log depth {file_depth}, generator depth {generator_depth}")]
    NestingImbalance {
        file_depth: i64,
        generator_depth: i64,
    },

    /// The guide already hit a fatal error and refuses to hand out choosers
    #[error("guide '{guide}' is unusable after an earlier fatal error: {cause}")]
    Poisoned { guide: String, cause: String },

    /// A configuration value could not be understood
    #[error("invalid configuration: {0}")]
    Config(String),

    /// Reading a choice file or writing an artifact failed
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for GuideError {
    fn from(err: std::io::Error) -> Self {
        GuideError::Io(err.to_string())
    }
}

impl GuideError {
    /// Wrap this error as the cause of a poisoned guide
    pub(crate) fn poison(&self, guide: &str) -> GuideError {
        GuideError::Poisoned {
            guide: guide.to_string(),
            cause: self.to_string(),
        }
    }
}
