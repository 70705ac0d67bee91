//! Parsers turning raw upstream text into a uniform event stream.
//!
//! Two upstream formats are understood:
//!
//! - `hosts`: `<format_key> host [host...]` lines, as found in hosts(5)
//!   style blocklists. Lines starting with any other token are ignored.
//! - `raw`: one host per line with `#` comment lines.

use crate::config::BlacklistSource;
use crate::error::{BlackholeError, Result};

/// One item produced by a parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Comment text, without the leading `#`
    Comment(String),
    /// A host token as it appeared upstream (not yet normalized)
    Host(String),
}

/// Format dispatch for a source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserKind {
    Hosts { key: String },
    Raw,
}

impl ParserKind {
    /// Select the parser for a configured source
    pub fn for_source(source: &BlacklistSource) -> Result<Self> {
        match source.format.as_str() {
            "hosts" => match source.format_key.as_deref().map(str::trim) {
                Some(key) if !key.is_empty() => Ok(ParserKind::Hosts {
                    key: key.to_string(),
                }),
                _ => Err(BlackholeError::Config(format!(
                    "blacklist '{}' uses format 'hosts' but has no 'format_key'",
                    source.id
                ))),
            },
            "raw" => Ok(ParserKind::Raw),
            other => Err(BlackholeError::UnknownFormat {
                source_id: source.id.clone(),
                format: other.to_string(),
            }),
        }
    }

    /// Parse raw text into events, in input order
    pub fn parse(&self, raw: &str) -> Vec<Event> {
        match self {
            ParserKind::Hosts { key } => parse_hosts(raw, key),
            ParserKind::Raw => parse_raw(raw),
        }
    }
}

/// Parse a source's content, failing if it yields no hosts at all.
pub fn parse_source(source: &BlacklistSource, raw: &str) -> Result<Vec<Event>> {
    let events = ParserKind::for_source(source)?.parse(raw);
    if !events.iter().any(|e| matches!(e, Event::Host(_))) {
        return Err(BlackholeError::EmptySource {
            source_id: source.id.clone(),
        });
    }
    Ok(events)
}

fn parse_hosts(raw: &str, key: &str) -> Vec<Event> {
    let mut events = Vec::new();

    for line in raw.lines() {
        // Only a comment trailing a record body is kept; whole-line
        // comments fall through and are dropped by the key check.
        let (body, comment) = match line.find('#') {
            Some(pos) if !line[..pos].trim().is_empty() => {
                (&line[..pos], Some(line[pos + 1..].trim_start()))
            }
            _ => (line, None),
        };

        let mut tokens = body.split_whitespace();
        if tokens.next() != Some(key) {
            continue;
        }
        if let Some(comment) = comment {
            events.push(Event::Comment(comment.to_string()));
        }
        events.extend(tokens.map(|t| Event::Host(t.to_string())));
    }

    events
}

fn parse_raw(raw: &str) -> Vec<Event> {
    raw.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .map(|line| match line.strip_prefix('#') {
            Some(comment) => Event::Comment(comment.trim_start().to_string()),
            None => Event::Host(line.to_string()),
        })
        .collect()
}
