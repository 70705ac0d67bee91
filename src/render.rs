//! Output document builder for the supported DNS server targets.
//!
//! The document is an ordered list of lines that only ever grows: a seeded
//! header, then per-source banners, comments and records in the order they
//! were added. Nothing is written to disk here.

use chrono::{DateTime, Utc};
use std::path::Path;
use tracing::{debug, warn};

use crate::config::{Config, OutputConfig, SERIAL_PLACEHOLDER};
use crate::ledger::{ExclusionSet, Ledger, Verdict};

/// DNS protocol limit on a zone record line
const RPZ_MAX_RECORD_LEN: usize = 255;

const DIVIDER: &str = "------------------------------------------------------------";

/// Line conventions of an output target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    /// BIND response policy zone: `host RESPONSE`, `;` comments
    Rpz,
    /// hosts(5) file: `RESPONSE host`, `#` comments
    Hosts,
}

impl Target {
    pub fn comment_prefix(self) -> &'static str {
        match self {
            Target::Rpz => ";",
            Target::Hosts => "#",
        }
    }

    pub fn record(self, host: &str, response: &str) -> String {
        match self {
            Target::Rpz => format!("{} {}", host, response),
            Target::Hosts => format!("{} {}", response, host),
        }
    }

    /// Length at or above which a record line is flagged
    pub fn max_record_len(self) -> Option<usize> {
        match self {
            Target::Rpz => Some(RPZ_MAX_RECORD_LEN),
            Target::Hosts => None,
        }
    }
}

/// What happened to a host offered to the document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOutcome {
    Recorded,
    /// Recorded, with a marker comment in front
    RecordedTooLong,
    SeenBefore,
    Excluded,
}

/// Zone serial for `now`: epoch seconds, zero padded to ten digits
pub fn zone_serial(now: DateTime<Utc>) -> String {
    format!("{:010}", now.timestamp().max(0))
}

/// Incrementally built output document
#[derive(Debug)]
pub struct Document {
    target: Target,
    response: String,
    ledger: Ledger,
    lines: Vec<String>,
}

impl Document {
    /// Start a document of `target` whose first lines are `header`
    pub fn new(target: Target, header: Vec<String>, response: &str, ledger: Ledger) -> Self {
        Self {
            target,
            response: response.to_string(),
            ledger,
            lines: header,
        }
    }

    /// Zone document seeded from `template` with the serial substituted
    pub fn rpz(template: &str, now: DateTime<Utc>, response: &str, ledger: Ledger) -> Self {
        let header = template
            .replace(SERIAL_PLACEHOLDER, &zone_serial(now))
            .lines()
            .map(str::to_string)
            .collect();
        Self::new(Target::Rpz, header, response, ledger)
    }

    /// Hosts document seeded with a creation timestamp comment
    pub fn hosts(now: DateTime<Utc>, response: &str, ledger: Ledger) -> Self {
        let mut doc = Self::new(Target::Hosts, Vec::new(), response, ledger);
        doc.add_comment(&format!("Created {}", now.format("%Y-%m-%d %H:%M:%S UTC")));
        doc
    }

    /// Document for the configured output target
    pub fn for_config(config: &Config, now: DateTime<Utc>) -> Self {
        let ledger = Ledger::new(ExclusionSet::new(config.excluded_hosts()));
        match &config.output {
            OutputConfig::Rpz(rpz) => Self::rpz(&rpz.template, now, &config.defaultresponse, ledger),
            OutputConfig::Hosts(_) => Self::hosts(now, &config.defaultresponse, ledger),
        }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn lines(&self) -> &[String] {
        &self.lines
    }

    pub fn add_comment(&mut self, text: &str) {
        let prefix = self.target.comment_prefix();
        if text.is_empty() {
            self.lines.push(prefix.to_string());
        } else {
            self.lines.push(format!("{} {}", prefix, text));
        }
    }

    pub fn add_blank(&mut self) {
        self.lines.push(String::new());
    }

    /// Banner opening the block of one source
    pub fn add_banner(&mut self, source_id: &str, location: &str) {
        self.add_blank();
        self.add_comment(DIVIDER);
        self.add_comment(&format!("{}: {}", source_id, location));
        self.add_comment(DIVIDER);
        self.add_blank();
    }

    /// Offer a host from `source_id`; the outcome is always rendered
    pub fn add_host(&mut self, host: &str, source_id: &str) -> HostOutcome {
        match self.ledger.consider(host, source_id) {
            Verdict::SeenBefore { host, source_id } => {
                debug!("{} already listed by {}", host, source_id);
                self.add_comment(&format!("seen before in {}: {}", source_id, host));
                HostOutcome::SeenBefore
            }
            Verdict::Excluded { host } => {
                debug!("{} is excluded", host);
                self.add_comment(&format!("excluded: {}", host));
                HostOutcome::Excluded
            }
            Verdict::Accepted { host } => {
                let record = self.target.record(&host, &self.response);
                let too_long = self
                    .target
                    .max_record_len()
                    .is_some_and(|max| record.len() >= max);
                if too_long {
                    warn!("Record for {} is {} bytes long", host, record.len());
                    self.add_comment(&format!("too-long ({} bytes): {}", record.len(), host));
                }
                self.lines.push(record);
                if too_long {
                    HostOutcome::RecordedTooLong
                } else {
                    HostOutcome::Recorded
                }
            }
        }
    }

    /// Final text, one line per entry, newline terminated
    pub fn render(&self) -> String {
        let mut out = String::with_capacity(self.lines.iter().map(|l| l.len() + 1).sum());
        for line in &self.lines {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// named.conf fragment declaring the response policy zone
pub fn named_conf_snippet(zonename: &str, zonefile: &Path) -> String {
    format!(
        "// Generated by blackhole. Include this file from named.conf and add\n\
         //   response-policy {{ zone \"{zone}\"; }};\n\
         // to the options block.\n\
         zone \"{zone}\" {{\n\
         \ttype master;\n\
         \tfile \"{file}\";\n\
         \tallow-query {{ none; }};\n\
         }};\n",
        zone = zonename,
        file = zonefile.display()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 1, 12, 0, 0).unwrap()
    }

    fn rpz_doc() -> Document {
        Document::new(Target::Rpz, Vec::new(), "CNAME .", Ledger::default())
    }

    #[test]
    fn test_zone_serial_fixed_width() {
        assert_eq!(zone_serial(now()), "1709294400");
        assert_eq!(zone_serial(Utc.timestamp_opt(42, 0).unwrap()), "0000000042");
    }

    #[test]
    fn test_rpz_template_seeded_with_serial() {
        let doc = Document::rpz(
            "$TTL 1h\n@ SOA a. b. (%SERIAL% 1h 1h 1h 1h)",
            now(),
            "CNAME .",
            Ledger::default(),
        );
        assert_eq!(
            doc.lines(),
            ["$TTL 1h", "@ SOA a. b. (1709294400 1h 1h 1h 1h)"]
        );
    }

    #[test]
    fn test_hosts_seeded_with_timestamp() {
        let doc = Document::hosts(now(), "0.0.0.0", Ledger::default());
        assert_eq!(doc.lines(), ["# Created 2024-03-01 12:00:00 UTC"]);
    }

    #[test]
    fn test_for_config_follows_output_target() {
        let mut config = Config {
            defaultresponse: "0.0.0.0".to_string(),
            output: OutputConfig::Hosts(crate::config::HostsOutput::default()),
            ..Config::default()
        };
        config.exclusions.insert("keep.example".to_string(), true);

        let mut doc = Document::for_config(&config, now());
        assert_eq!(doc.lines()[0], "# Created 2024-03-01 12:00:00 UTC");
        assert_eq!(doc.add_host("keep.example", "a"), HostOutcome::Excluded);
        assert_eq!(doc.add_host("ads.example", "a"), HostOutcome::Recorded);
        assert!(doc.render().ends_with("0.0.0.0 ads.example\n"));

        config.output = OutputConfig::default();
        let doc = Document::for_config(&config, now());
        assert!(doc.render().contains("1709294400"));
    }

    #[test]
    fn test_record_conventions() {
        assert_eq!(Target::Rpz.record("a.example", "CNAME ."), "a.example CNAME .");
        assert_eq!(Target::Hosts.record("a.example", "0.0.0.0"), "0.0.0.0 a.example");
    }

    #[test]
    fn test_banner_order() {
        let mut doc = rpz_doc();
        doc.add_banner("A", "https://example.com/a");
        let lines = doc.lines();
        assert_eq!(lines.len(), 5);
        assert_eq!(lines[0], "");
        assert_eq!(lines[1], format!("; {}", DIVIDER));
        assert_eq!(lines[2], "; A: https://example.com/a");
        assert_eq!(lines[3], lines[1]);
        assert_eq!(lines[4], "");
    }

    #[test]
    fn test_add_host_outcomes_rendered() {
        let mut doc = Document::new(
            Target::Hosts,
            Vec::new(),
            "0.0.0.0",
            Ledger::new(ExclusionSet::new(["good.example"])),
        );
        assert_eq!(doc.add_host("bad.example", "A"), HostOutcome::Recorded);
        assert_eq!(doc.add_host("BAD.example", "B"), HostOutcome::SeenBefore);
        assert_eq!(doc.add_host("good.example", "B"), HostOutcome::Excluded);
        assert_eq!(
            doc.render(),
            "0.0.0.0 bad.example\n# seen before in A: bad.example\n# excluded: good.example\n"
        );
    }

    #[test]
    fn test_too_long_record_flagged_not_dropped() {
        let mut doc = rpz_doc();
        // "<host> CNAME ." is exactly 255 bytes
        let host = format!("{}.example", "a".repeat(255 - " CNAME .".len() - ".example".len()));
        assert_eq!(doc.add_host(&host, "A"), HostOutcome::RecordedTooLong);
        let lines = doc.lines();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with("; too-long (255 bytes)"));
        assert_eq!(lines[1], format!("{} CNAME .", host));
    }

    #[test]
    fn test_just_under_limit_not_flagged() {
        let mut doc = rpz_doc();
        let host = "a".repeat(254 - " CNAME .".len());
        assert_eq!(doc.add_host(&host, "A"), HostOutcome::Recorded);
        assert_eq!(doc.lines().len(), 1);
    }

    #[test]
    fn test_hosts_target_has_no_length_limit() {
        let mut doc = Document::new(Target::Hosts, Vec::new(), "0.0.0.0", Ledger::default());
        let host = "b".repeat(400);
        assert_eq!(doc.add_host(&host, "A"), HostOutcome::Recorded);
    }

    #[test]
    fn test_empty_comment() {
        let mut doc = rpz_doc();
        doc.add_comment("");
        assert_eq!(doc.lines(), [";"]);
    }

    #[test]
    fn test_named_conf_snippet() {
        let snippet = named_conf_snippet("rpz.blackhole", Path::new("/etc/bind/db.rpz"));
        assert!(snippet.contains("zone \"rpz.blackhole\" {"));
        assert!(snippet.contains("file \"/etc/bind/db.rpz\";"));
    }
}
