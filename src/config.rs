//! Configuration management for blackhole.

use anyhow::{Context, Result};
use serde::de::{MapAccess, Visitor};
use serde::{Deserialize, Deserializer};
use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::error::BlackholeError;
use crate::parser::ParserKind;

/// Placeholder substituted with the zone serial in the rpz template
pub const SERIAL_PLACEHOLDER: &str = "%SERIAL%";

const DEFAULT_RPZ_TEMPLATE: &str = "$TTL 2h
@ IN SOA localhost. root.localhost. (
        %SERIAL% ; serial
        1h ; refresh
        15m ; retry
        30d ; expire
        2h ) ; negative ttl
  IN NS localhost.";

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding cached upstream lists
    pub cachedir: PathBuf,

    /// File name prefix for cache entries
    pub cacheprefix: String,

    /// Cache freshness window in seconds
    pub cacheexpire: u64,

    /// Upstream blacklists, in processing order
    #[serde(deserialize_with = "deserialize_blacklists")]
    pub blacklists: Vec<BlacklistSource>,

    /// Hosts that are never emitted as records
    pub exclusions: HashMap<String, bool>,

    /// Literal hosts appended after all upstream sources
    pub localblacklist: Option<Vec<String>>,

    /// Record payload written for each accepted host
    pub defaultresponse: String,

    /// Output target settings
    pub output: OutputConfig,

    /// Identity of the file this configuration was loaded from
    #[serde(skip)]
    pub origin: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cachedir: PathBuf::from("/var/cache/blackhole"),
            cacheprefix: "bl-".to_string(),
            cacheexpire: 4 * 3600,
            blacklists: Vec::new(),
            exclusions: HashMap::new(),
            localblacklist: None,
            defaultresponse: String::new(),
            output: OutputConfig::default(),
            origin: "config".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from YAML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;
        let config = Self::from_yaml(&content, &path.display().to_string())
            .with_context(|| format!("Failed to load config file: {:?}", path))?;
        Ok(config)
    }

    /// Parse and validate configuration text. `origin` names the local
    /// blacklist block in the output.
    pub fn from_yaml(content: &str, origin: &str) -> Result<Self> {
        let mut config: Config =
            serde_yaml::from_str(content).context("Failed to parse configuration")?;
        config.origin = origin.to_string();
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values
    pub fn validate(&self) -> std::result::Result<(), BlackholeError> {
        if self.defaultresponse.trim().is_empty() {
            return Err(BlackholeError::Config(
                "'defaultresponse' is required".to_string(),
            ));
        }

        let has_local = self
            .localblacklist
            .as_ref()
            .is_some_and(|hosts| !hosts.is_empty());
        if self.blacklists.is_empty() && !has_local {
            return Err(BlackholeError::Config(
                "no 'blacklists' and no 'localblacklist' configured".to_string(),
            ));
        }

        if let Some(hosts) = &self.localblacklist {
            if let Some(pos) = hosts.iter().position(|h| h.trim().is_empty()) {
                return Err(BlackholeError::Config(format!(
                    "'localblacklist' entry {} is empty",
                    pos + 1
                )));
            }
        }

        if self.cacheprefix.contains('/') {
            return Err(BlackholeError::Config(format!(
                "'cacheprefix' must not contain '/': {}",
                self.cacheprefix
            )));
        }

        for source in &self.blacklists {
            if source.id.is_empty() || source.id.contains('/') {
                return Err(BlackholeError::Config(format!(
                    "invalid blacklist identifier '{}'",
                    source.id
                )));
            }
            if !source.url.starts_with("https://") && !source.url.starts_with("http://") {
                return Err(BlackholeError::Config(format!(
                    "blacklist '{}' URL must be http(s): {}",
                    source.id, source.url
                )));
            }
            ParserKind::for_source(source)?;
        }

        match &self.output {
            OutputConfig::Rpz(rpz) => {
                if !rpz.template.contains(SERIAL_PLACEHOLDER) {
                    return Err(BlackholeError::Config(format!(
                        "rpz 'template' must contain the serial placeholder {}",
                        SERIAL_PLACEHOLDER
                    )));
                }
                if rpz.zonefile.as_os_str().is_empty() {
                    return Err(BlackholeError::Config(
                        "rpz 'zonefile' is required".to_string(),
                    ));
                }
            }
            OutputConfig::Hosts(hosts) => {
                if hosts.hostsfile.as_os_str().is_empty() {
                    return Err(BlackholeError::Config(
                        "hosts 'hostsfile' is required".to_string(),
                    ));
                }
            }
        }

        Ok(())
    }

    /// Freshness window for cache entries
    pub fn cache_expiry(&self) -> Duration {
        Duration::from_secs(self.cacheexpire)
    }

    /// Configured exclusions (entries set to `true`)
    pub fn excluded_hosts(&self) -> impl Iterator<Item = &str> {
        self.exclusions
            .iter()
            .filter(|(_, excluded)| **excluded)
            .map(|(host, _)| host.as_str())
    }

    /// Generate default config with comments
    pub fn generate_default_yaml() -> String {
        include_str!("../templates/config.yaml").to_string()
    }
}

/// One upstream blacklist
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlacklistSource {
    pub id: String,
    pub url: String,
    pub format: String,
    pub format_key: Option<String>,
}

#[derive(Deserialize)]
struct BlacklistEntry {
    url: String,
    format: String,
    #[serde(default)]
    format_key: Option<String>,
}

/// Deserialize the `blacklists` mapping keeping document order, which is the
/// processing order of the run.
fn deserialize_blacklists<'de, D>(deserializer: D) -> Result<Vec<BlacklistSource>, D::Error>
where
    D: Deserializer<'de>,
{
    struct OrderedSources;

    impl<'de> Visitor<'de> for OrderedSources {
        type Value = Vec<BlacklistSource>;

        fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
            f.write_str("a mapping of blacklist id to {url, format, format_key}")
        }

        fn visit_unit<E>(self) -> Result<Self::Value, E> {
            Ok(Vec::new())
        }

        fn visit_map<A>(self, mut map: A) -> Result<Self::Value, A::Error>
        where
            A: MapAccess<'de>,
        {
            let mut sources: Vec<BlacklistSource> = Vec::new();
            while let Some((id, entry)) = map.next_entry::<String, BlacklistEntry>()? {
                if sources.iter().any(|s| s.id == id) {
                    return Err(serde::de::Error::custom(format!(
                        "duplicate blacklist id '{}'",
                        id
                    )));
                }
                sources.push(BlacklistSource {
                    id,
                    url: entry.url,
                    format: entry.format,
                    format_key: entry.format_key,
                });
            }
            Ok(sources)
        }
    }

    deserializer.deserialize_map(OrderedSources)
}

/// Output target selection
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "target", rename_all = "lowercase")]
pub enum OutputConfig {
    /// BIND response policy zone
    Rpz(RpzOutput),
    /// hosts(5) style file (dnsmasq addn-hosts, unbound, ...)
    Hosts(HostsOutput),
}

impl Default for OutputConfig {
    fn default() -> Self {
        OutputConfig::Rpz(RpzOutput::default())
    }
}

impl OutputConfig {
    /// Path of the rendered artifact
    pub fn path(&self) -> &Path {
        match self {
            OutputConfig::Rpz(rpz) => &rpz.zonefile,
            OutputConfig::Hosts(hosts) => &hosts.hostsfile,
        }
    }

    /// Command that makes the DNS server pick up the artifact
    pub fn reload_command(&self) -> &[String] {
        match self {
            OutputConfig::Rpz(rpz) => &rpz.reload,
            OutputConfig::Hosts(hosts) => &hosts.reload,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RpzOutput {
    pub zonefile: PathBuf,
    pub template: String,
    pub zonename: String,
    /// named.conf snippet created once if absent
    pub namedconf: Option<PathBuf>,
    pub reload: Vec<String>,
}

impl Default for RpzOutput {
    fn default() -> Self {
        Self {
            zonefile: PathBuf::from("/etc/bind/db.rpz.blackhole"),
            template: DEFAULT_RPZ_TEMPLATE.to_string(),
            zonename: "rpz.blackhole".to_string(),
            namedconf: None,
            reload: vec!["rndc".to_string(), "reload".to_string()],
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HostsOutput {
    pub hostsfile: PathBuf,
    pub reload: Vec<String>,
}

impl Default for HostsOutput {
    fn default() -> Self {
        Self {
            hostsfile: PathBuf::from("/etc/blackhole/hosts"),
            reload: Vec::new(),
        }
    }
}
