//! On-disk cache of raw upstream lists.
//!
//! Entries live at `<cachedir>/<cacheprefix><source id>` and are considered
//! fresh while their mtime is within the configured expiry. A cache entry is
//! always one complete response body: it is written to a temp file and
//! renamed into place.

use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tracing::{debug, info};

use crate::config::{BlacklistSource, Config};
use crate::error::{BlackholeError, Result};
use crate::fetcher::Retriever;
use crate::fs_abstraction::FileSystem;
use crate::utils::{format_age, format_bytes};
use crate::writer::with_suffix;

/// Freshness of one cache entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheState {
    Fresh { age: Duration },
    Stale { age: Duration },
    Missing,
}

/// Cache in front of a [`Retriever`]
pub struct SourceCache<'a> {
    fs: &'a dyn FileSystem,
    retriever: &'a dyn Retriever,
    dir: PathBuf,
    prefix: String,
    expiry: Duration,
}

impl<'a> SourceCache<'a> {
    pub fn new(
        fs: &'a dyn FileSystem,
        retriever: &'a dyn Retriever,
        dir: impl Into<PathBuf>,
        prefix: impl Into<String>,
        expiry: Duration,
    ) -> Self {
        Self {
            fs,
            retriever,
            dir: dir.into(),
            prefix: prefix.into(),
            expiry,
        }
    }

    /// Cache configured by `cachedir`, `cacheprefix` and `cacheexpire`
    pub fn from_config(
        config: &Config,
        fs: &'a dyn FileSystem,
        retriever: &'a dyn Retriever,
    ) -> Self {
        Self::new(
            fs,
            retriever,
            &config.cachedir,
            &config.cacheprefix,
            config.cache_expiry(),
        )
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Path of the entry for `source_id`
    pub fn entry_path(&self, source_id: &str) -> PathBuf {
        self.dir.join(format!("{}{}", self.prefix, source_id))
    }

    /// Freshness of the entry for `source_id` at `now`
    pub fn state_at(&self, source_id: &str, now: SystemTime) -> CacheState {
        let path = self.entry_path(source_id);
        if !self.fs.exists(&path) {
            return CacheState::Missing;
        }
        let Ok(modified) = self.fs.modified(&path) else {
            return CacheState::Missing;
        };
        // An mtime in the future counts as just written
        let age = now.duration_since(modified).unwrap_or(Duration::ZERO);
        if age <= self.expiry {
            CacheState::Fresh { age }
        } else {
            CacheState::Stale { age }
        }
    }

    pub fn state(&self, source_id: &str) -> CacheState {
        self.state_at(source_id, SystemTime::now())
    }

    /// Raw content of `source`, from cache when fresh, otherwise fetched
    /// and stored.
    pub async fn fetch(&self, source: &BlacklistSource) -> Result<String> {
        if !self.fs.exists(&self.dir) {
            debug!("Creating cache directory {:?}", self.dir);
            self.fs
                .create_dir_all(&self.dir)
                .map_err(|e| BlackholeError::io(&self.dir, e))?;
        }

        let path = self.entry_path(&source.id);
        if let CacheState::Fresh { age } = self.state(&source.id) {
            match self.fs.read_to_string(&path) {
                Ok(content) => {
                    info!(
                        "Using cached {} ({} old, {})",
                        source.id,
                        format_age(age),
                        format_bytes(content.len() as u64)
                    );
                    return Ok(content);
                }
                Err(e) => debug!("Unreadable cache entry {:?}: {}", path, e),
            }
        }

        info!("Fetching {} from {}", source.id, source.url);
        let content = self.retriever.get(&source.url).await?;
        self.store(&path, &content)?;
        info!("Fetched {} - {}", source.id, format_bytes(content.len() as u64));

        Ok(content)
    }

    fn store(&self, path: &Path, content: &str) -> Result<()> {
        let tmp = with_suffix(path, ".TMP");
        self.fs
            .write(&tmp, content.as_bytes())
            .map_err(|e| BlackholeError::io(&tmp, e))?;
        self.fs
            .rename(&tmp, path)
            .map_err(|e| BlackholeError::io(path, e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetcher::MockRetriever;
    use crate::fs_abstraction::{MockFileSystem, RealFileSystem};
    use std::fs::File;
    use tempfile::TempDir;

    const HOUR: Duration = Duration::from_secs(3600);

    fn source() -> BlacklistSource {
        BlacklistSource {
            id: "ads".to_string(),
            url: "https://example.com/ads.txt".to_string(),
            format: "raw".to_string(),
            format_key: None,
        }
    }

    fn age_file(path: &Path, age: Duration) {
        File::options()
            .write(true)
            .open(path)
            .unwrap()
            .set_modified(SystemTime::now() - age)
            .unwrap();
    }

    #[tokio::test]
    async fn test_fresh_entry_skips_network() {
        let dir = TempDir::new().unwrap();
        let mut retriever = MockRetriever::new();
        retriever.expect_get().never();

        let cache = SourceCache::new(&RealFileSystem, &retriever, dir.path(), "bl-", 4 * HOUR);
        let path = cache.entry_path("ads");
        std::fs::write(&path, "cached.example\n").unwrap();
        age_file(&path, 3 * HOUR);

        assert_eq!(cache.fetch(&source()).await.unwrap(), "cached.example\n");
    }

    #[tokio::test]
    async fn test_stale_entry_is_refetched_and_replaced() {
        let dir = TempDir::new().unwrap();
        let mut retriever = MockRetriever::new();
        retriever
            .expect_get()
            .withf(|url| url == "https://example.com/ads.txt")
            .times(1)
            .returning(|_| Ok("fresh.example\n".to_string()));

        let cache = SourceCache::new(&RealFileSystem, &retriever, dir.path(), "bl-", 4 * HOUR);
        let path = cache.entry_path("ads");
        std::fs::write(&path, "old.example\n").unwrap();
        age_file(&path, 5 * HOUR);

        assert_eq!(cache.fetch(&source()).await.unwrap(), "fresh.example\n");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "fresh.example\n");
        assert!(!with_suffix(&path, ".TMP").exists());
    }

    #[tokio::test]
    async fn test_first_run_creates_directory_and_entry() {
        let dir = TempDir::new().unwrap();
        let cache_dir = dir.path().join("nested/cache");
        let mut retriever = MockRetriever::new();
        retriever
            .expect_get()
            .times(1)
            .returning(|_| Ok("a.example\n".to_string()));

        let cache = SourceCache::new(&RealFileSystem, &retriever, &cache_dir, "bl-", HOUR);
        cache.fetch(&source()).await.unwrap();

        assert_eq!(
            std::fs::read_to_string(cache_dir.join("bl-ads")).unwrap(),
            "a.example\n"
        );
        assert!(matches!(cache.state("ads"), CacheState::Fresh { .. }));
    }

    #[tokio::test]
    async fn test_fetch_error_leaves_cache_untouched() {
        let dir = TempDir::new().unwrap();
        let mut retriever = MockRetriever::new();
        retriever.expect_get().returning(|url| {
            Err(BlackholeError::Fetch {
                status: 503,
                url: url.to_string(),
            })
        });

        let cache = SourceCache::new(&RealFileSystem, &retriever, dir.path(), "bl-", HOUR);
        let path = cache.entry_path("ads");
        std::fs::write(&path, "old.example\n").unwrap();
        age_file(&path, 2 * HOUR);

        let err = cache.fetch(&source()).await.unwrap_err();
        assert!(matches!(err, BlackholeError::Fetch { status: 503, .. }));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "old.example\n");
    }

    #[tokio::test]
    async fn test_failed_store_is_fatal() {
        let mut fs = MockFileSystem::new();
        fs.expect_exists().returning(|_| false);
        fs.expect_create_dir_all().returning(|_| Ok(()));
        fs.expect_write()
            .returning(|_, _| Err(std::io::Error::new(std::io::ErrorKind::Other, "read-only")));
        fs.expect_rename().never();

        let mut retriever = MockRetriever::new();
        retriever
            .expect_get()
            .returning(|_| Ok("a.example\n".to_string()));

        let cache = SourceCache::new(&fs, &retriever, "/cache", "bl-", HOUR);
        let err = cache.fetch(&source()).await.unwrap_err();
        assert!(matches!(err, BlackholeError::Io { .. }));
    }

    #[test]
    fn test_state_boundaries() {
        let mut fs = MockFileSystem::new();
        let now = SystemTime::now();
        fs.expect_exists().returning(|_| true);
        fs.expect_modified().returning(move |_| Ok(now - 4 * HOUR));
        let retriever = MockRetriever::new();

        let cache = SourceCache::new(&fs, &retriever, "/cache", "bl-", 4 * HOUR);
        assert_eq!(
            cache.state_at("ads", now),
            CacheState::Fresh { age: 4 * HOUR }
        );
        assert_eq!(
            cache.state_at("ads", now + Duration::from_secs(1)),
            CacheState::Stale {
                age: 4 * HOUR + Duration::from_secs(1)
            }
        );
    }

    #[test]
    fn test_entry_path() {
        let retriever = MockRetriever::new();
        let cache = SourceCache::new(&RealFileSystem, &retriever, "/var/cache/bh", "bl-", HOUR);
        assert_eq!(cache.entry_path("ads"), PathBuf::from("/var/cache/bh/bl-ads"));
        assert_eq!(cache.state("ads"), CacheState::Missing);
    }
}
