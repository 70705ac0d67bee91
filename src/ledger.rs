//! Host normalization, exclusions and first-seen-wins deduplication.

use std::collections::{HashMap, HashSet};

/// Always excluded, whatever the configuration says
const ALWAYS_EXCLUDED: &str = "localhost";

/// Normalize a host token: surrounding whitespace stripped, lowercased
pub fn normalize(host: &str) -> String {
    host.trim().to_lowercase()
}

/// Hosts that must never be emitted as records
#[derive(Debug, Clone)]
pub struct ExclusionSet {
    hosts: HashSet<String>,
}

impl ExclusionSet {
    pub fn new<'a>(hosts: impl IntoIterator<Item = &'a str>) -> Self {
        let mut hosts: HashSet<String> = hosts.into_iter().map(normalize).collect();
        hosts.insert(ALWAYS_EXCLUDED.to_string());
        Self { hosts }
    }

    pub fn contains(&self, normalized: &str) -> bool {
        self.hosts.contains(normalized)
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl Default for ExclusionSet {
    fn default() -> Self {
        Self::new(std::iter::empty())
    }
}

/// Outcome of offering a host to the ledger
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Recorded for this source; `host` is the normalized form
    Accepted { host: String },
    /// Already claimed by an earlier occurrence
    SeenBefore { host: String, source_id: String },
    Excluded { host: String },
}

/// Run-scoped record of which source first claimed each host.
///
/// Append-only: an entry is never overwritten, so attribution depends only
/// on the order in which hosts are offered.
#[derive(Debug, Default)]
pub struct Ledger {
    exclusions: ExclusionSet,
    seen: HashMap<String, String>,
}

impl Ledger {
    pub fn new(exclusions: ExclusionSet) -> Self {
        Self {
            exclusions,
            seen: HashMap::new(),
        }
    }

    /// Decide whether `host` from `source_id` becomes a record
    pub fn consider(&mut self, host: &str, source_id: &str) -> Verdict {
        let host = normalize(host);

        if let Some(original) = self.seen.get(&host) {
            return Verdict::SeenBefore {
                source_id: original.clone(),
                host,
            };
        }
        if self.exclusions.contains(&host) {
            return Verdict::Excluded { host };
        }

        self.seen.insert(host.clone(), source_id.to_string());
        Verdict::Accepted { host }
    }

    /// Source that claimed a (normalized) host, if any
    pub fn owner(&self, host: &str) -> Option<&str> {
        self.seen.get(host).map(String::as_str)
    }

    /// Number of accepted hosts
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize() {
        assert_eq!(normalize("  BAD.Example\t"), "bad.example");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn test_first_seen_wins() {
        let mut ledger = Ledger::default();
        assert_eq!(
            ledger.consider("bad.example", "A"),
            Verdict::Accepted {
                host: "bad.example".to_string()
            }
        );
        assert_eq!(
            ledger.consider("BAD.example", "B"),
            Verdict::SeenBefore {
                host: "bad.example".to_string(),
                source_id: "A".to_string()
            }
        );
        assert_eq!(ledger.owner("bad.example"), Some("A"));
        assert_eq!(ledger.len(), 1);
    }

    #[test]
    fn test_excluded() {
        let mut ledger = Ledger::new(ExclusionSet::new(["Good.Example"]));
        assert_eq!(
            ledger.consider("good.example", "A"),
            Verdict::Excluded {
                host: "good.example".to_string()
            }
        );
        // Exclusion does not claim the host
        assert!(ledger.owner("good.example").is_none());
        assert!(matches!(
            ledger.consider("good.example", "B"),
            Verdict::Excluded { .. }
        ));
    }

    #[test]
    fn test_localhost_always_excluded() {
        let set = ExclusionSet::new(std::iter::empty());
        assert!(set.contains("localhost"));
        assert_eq!(set.len(), 1);

        let mut ledger = Ledger::new(set);
        assert!(matches!(
            ledger.consider("LOCALHOST", "A"),
            Verdict::Excluded { .. }
        ));
    }

    #[test]
    fn test_seen_before_takes_precedence_over_exclusion_check() {
        let mut ledger = Ledger::default();
        ledger.consider("a.example", "A");
        assert!(matches!(
            ledger.consider("a.example", "A"),
            Verdict::SeenBefore { .. }
        ));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// A host is accepted at most once, and always for its first source
        #[test]
        fn prop_attribution_is_first_source(
            hosts in prop::collection::vec(("[a-c]{1,2}\\.example", 0usize..3), 0..50)
        ) {
            let mut ledger = Ledger::default();
            let mut first: HashMap<String, String> = HashMap::new();
            for (host, src) in &hosts {
                let source_id = format!("s{}", src);
                first.entry(normalize(host)).or_insert_with(|| source_id.clone());
                let _ = ledger.consider(host, &source_id);
            }
            for (host, source_id) in &first {
                prop_assert_eq!(ledger.owner(host), Some(source_id.as_str()));
            }
            prop_assert_eq!(ledger.len(), first.len());
        }
    }
}
