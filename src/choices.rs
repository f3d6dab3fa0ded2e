//! Choice logs and their text format
//!
//! A choice log is the ordered sequence of records a [`SaverGuide`]
//! captures during one traversal: every value handed back to the generator
//! plus the scope brackets around them. The text form is meant to be pasted
//! into a generated artifact as a comment block, so every line carries a
//! caller-chosen prefix:
//!
//! ```text
//! // BEGIN FORMATTED CHOICES
//! // {,1,0,{,7,},},3,
//! // END FORMATTED CHOICES
//! ```
//!
//! [`SaverGuide`]: crate::guide::SaverGuide

use crate::error::{GuideError, GuideResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::BufRead;

pub const BEGIN_MARKER: &str = "BEGIN FORMATTED CHOICES";
pub const END_MARKER: &str = "END FORMATTED CHOICES";

/// Wrap width used unless a caller asks for another one
pub const DEFAULT_LINE_LENGTH: usize = 70;

/// Line prefix used unless a caller asks for another one
pub const DEFAULT_PREFIX: &str = "// ";

/// One entry of a choice log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Rec {
    /// A scope was opened
    Start,
    /// A scope was closed
    End,
    /// A value returned by a choice
    Num(u64),
}

impl Rec {
    pub fn is_num(&self) -> bool {
        matches!(self, Rec::Num(_))
    }
}

impl fmt::Display for Rec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rec::Start => f.write_str("{"),
            Rec::End => f.write_str("}"),
            Rec::Num(v) => write!(f, "{}", v),
        }
    }
}

/// Render `recs` as a prefixed choice block.
///
/// Every token is followed by a comma. A line is broken before a token
/// that would make it reach `width` characters, prefix included.
pub fn format_choices(recs: &[Rec], prefix: &str, width: usize) -> String {
    let mut out = String::new();
    out.push_str(prefix);
    out.push_str(BEGIN_MARKER);
    out.push('\n');

    let mut line = prefix.to_string();
    for rec in recs {
        let item = format!("{},", rec);
        if line.len() > prefix.len() && line.len() + item.len() >= width {
            out.push_str(&line);
            out.push('\n');
            line.truncate(0);
            line.push_str(prefix);
        }
        line.push_str(&item);
    }
    if line.len() > prefix.len() {
        out.push_str(&line);
        out.push('\n');
    }

    out.push_str(prefix);
    out.push_str(END_MARKER);
    out.push('\n');
    out
}

/// Parse a choice block out of `reader`.
///
/// Lines before the begin marker are ignored, which lets the block sit at
/// the end of an arbitrary artifact. Every data line must start with
/// `prefix` and contain nothing but digits, commas and braces.
pub fn parse_choices<R: BufRead>(reader: R, prefix: &str) -> GuideResult<Vec<Rec>> {
    let mut recs = Vec::new();
    let mut in_data = false;
    let mut terminated = false;

    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        let lineno = index + 1;
        if !in_data {
            in_data = line.contains(BEGIN_MARKER);
            continue;
        }
        if line.contains(END_MARKER) {
            terminated = true;
            break;
        }
        parse_data_line(&line, lineno, prefix, &mut recs)?;
    }

    if !in_data {
        log::warn!("No '{}' marker found in choice log", BEGIN_MARKER);
    } else if !terminated {
        log::warn!("Choice log ended without an '{}' marker", END_MARKER);
    }
    if recs.is_empty() {
        return Err(GuideError::EmptyLog);
    }
    log::debug!("Parsed {} choice records", recs.len());
    Ok(recs)
}

/// Parse an in-memory choice block
pub fn parse_choices_str(text: &str, prefix: &str) -> GuideResult<Vec<Rec>> {
    parse_choices(text.as_bytes(), prefix)
}

fn parse_data_line(line: &str, lineno: usize, prefix: &str, recs: &mut Vec<Rec>) -> GuideResult<()> {
    let malformed = |reason: &str| GuideError::MalformedLog {
        line: lineno,
        content: line.to_string(),
        reason: reason.to_string(),
    };

    let body = line
        .strip_prefix(prefix)
        .ok_or_else(|| malformed("missing line prefix"))?;
    if let Some(bad) = body
        .chars()
        .find(|c| !(c.is_ascii_digit() || matches!(c, ',' | '{' | '}')))
    {
        return Err(malformed(&format!("unexpected character {:?}", bad)));
    }

    for token in body.split(',').filter(|t| !t.is_empty()) {
        let rec = match token {
            "{" => Rec::Start,
            "}" => Rec::End,
            digits => digits
                .parse::<u64>()
                .map(Rec::Num)
                .map_err(|_| malformed(&format!("bad token {:?}", digits)))?,
        };
        recs.push(rec);
    }
    Ok(())
}
