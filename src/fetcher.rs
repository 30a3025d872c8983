use camino::Utf8Path;
use chrono::Datelike;
use tracing::{debug, info};

use crate::domain::RetrievalRequest;
use crate::error::{CotError, RetrievalStatus};
use crate::resolver::{LocationResolver, RemoteLocation};
use crate::store::ArchiveCache;
use crate::transport::Transport;

/// Source of "now" for the current-year freshness rule.
pub trait Clock: Send + Sync {
    fn current_year(&self) -> i32;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn current_year(&self) -> i32 {
        chrono::Local::now().year()
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i32);

impl Clock for FixedClock {
    fn current_year(&self) -> i32 {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveOrigin {
    Cache,
    Network,
}

#[derive(Debug, Clone)]
pub struct FetchedArchive {
    pub location: RemoteLocation,
    pub origin: ArchiveOrigin,
    pub bytes: Vec<u8>,
}

pub struct ArchiveFetcher<T: Transport> {
    transport: T,
    resolver: LocationResolver,
}

impl<T: Transport> ArchiveFetcher<T> {
    pub fn new(transport: T, resolver: LocationResolver) -> Self {
        Self {
            transport,
            resolver,
        }
    }

    pub fn resolver(&self) -> &LocationResolver {
        &self.resolver
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Returns the archive bytes for `request`.
    ///
    /// A cached copy is used only when it exists, `force_refresh` is off and
    /// the request is not for `current_year`, which the publisher keeps
    /// appending to. Network results are written back whenever `cache_dir`
    /// is given, current year included.
    pub fn fetch(
        &self,
        request: &RetrievalRequest,
        cache_dir: Option<&Utf8Path>,
        force_refresh: bool,
        current_year: i32,
    ) -> Result<FetchedArchive, CotError> {
        let location = self.resolver.resolve(request)?;
        let cache = cache_dir.map(ArchiveCache::new);
        let cache_path = cache.as_ref().map(|cache| cache.archive_path(&location));

        if let (Some(cache), Some(path)) = (&cache, &cache_path) {
            let is_current = request.targets_year(current_year);
            if cache.exists(path) && !force_refresh && !is_current {
                debug!(%request, %path, "cache hit");
                let bytes = cache.read(path)?;
                return Ok(FetchedArchive {
                    location,
                    origin: ArchiveOrigin::Cache,
                    bytes,
                });
            }
            if is_current {
                debug!(%request, current_year, "current year archive; bypassing cache");
            }
        }

        let bytes = self.download(&location)?;
        info!(%request, url = %location, bytes = bytes.len(), "downloaded archive");

        if let (Some(cache), Some(path)) = (&cache, &cache_path) {
            cache.write(path, &bytes)?;
            debug!(%path, "archive cached");
        }

        Ok(FetchedArchive {
            location,
            origin: ArchiveOrigin::Network,
            bytes,
        })
    }

    fn download(&self, location: &RemoteLocation) -> Result<Vec<u8>, CotError> {
        let url = location.url();
        let response = self
            .transport
            .get(&url)
            .map_err(|status| CotError::RetrievalFailed {
                location: url.clone(),
                status,
            })?;
        if !response.is_success() {
            return Err(CotError::RetrievalFailed {
                location: url,
                status: RetrievalStatus::Http(response.status),
            });
        }
        Ok(response.bytes)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use assert_matches::assert_matches;
    use camino::Utf8PathBuf;

    use super::*;
    use crate::domain::ReportType;
    use crate::transport::HttpResponse;

    struct Recording {
        status: u16,
        urls: Mutex<Vec<String>>,
    }

    impl Transport for Recording {
        fn get(&self, url: &str) -> Result<HttpResponse, RetrievalStatus> {
            self.urls.lock().unwrap().push(url.to_string());
            Ok(HttpResponse {
                status: self.status,
                bytes: b"zip-bytes".to_vec(),
            })
        }
    }

    fn recording(status: u16) -> Recording {
        Recording {
            status,
            urls: Mutex::new(Vec::new()),
        }
    }

    #[test]
    fn no_cache_dir_always_downloads() {
        let fetcher = ArchiveFetcher::new(recording(200), LocationResolver::default());
        let request = RetrievalRequest::year(ReportType::LegacyFut, 2010);
        let first = fetcher.fetch(&request, None, false, 2026).unwrap();
        let second = fetcher.fetch(&request, None, false, 2026).unwrap();
        assert_eq!(first.origin, ArchiveOrigin::Network);
        assert_eq!(second.origin, ArchiveOrigin::Network);
        assert_eq!(fetcher.transport().urls.lock().unwrap().len(), 2);
    }

    #[test]
    fn force_refresh_skips_cache_and_rewrites() {
        let temp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        std::fs::write(dir.join("deacot2010.zip"), b"stale").unwrap();

        let fetcher = ArchiveFetcher::new(recording(200), LocationResolver::default());
        let request = RetrievalRequest::year(ReportType::LegacyFut, 2010);
        let fetched = fetcher.fetch(&request, Some(&dir), true, 2026).unwrap();

        assert_eq!(fetched.origin, ArchiveOrigin::Network);
        assert_eq!(std::fs::read(dir.join("deacot2010.zip")).unwrap(), b"zip-bytes");
    }

    #[test]
    fn failed_status_is_not_cached() {
        let temp = tempfile::tempdir().unwrap();
        let dir = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).unwrap();
        let fetcher = ArchiveFetcher::new(recording(404), LocationResolver::default());
        let request = RetrievalRequest::year(ReportType::DisaggregatedFut, 2031);

        let err = fetcher.fetch(&request, Some(&dir), false, 2026).unwrap_err();

        assert_matches!(
            err,
            CotError::RetrievalFailed { ref location, status: RetrievalStatus::Http(404) }
                if location.ends_with("fut_disagg_txt_2031.zip")
        );
        assert!(!dir.join("fut_disagg_txt_2031.zip").exists());
        assert_eq!(fetcher.transport().urls.lock().unwrap().len(), 1);
    }
}
