use camino::Utf8PathBuf;
use tracing::info;

use crate::aggregate::aggregate_years;
use crate::domain::{ReportType, RetrievalRequest};
use crate::error::CotError;
use crate::fetcher::{ArchiveFetcher, ArchiveOrigin, Clock, SystemClock};
use crate::reader::read_table;
use crate::resolver::LocationResolver;
use crate::table::ReportTable;
use crate::transport::Transport;

#[derive(Debug, Clone, Default)]
pub struct DownloadOptions {
    /// Where archives are cached. `None` disables caching entirely.
    pub cache_dir: Option<Utf8PathBuf>,
    pub force_refresh: bool,
}

#[derive(Debug, Clone)]
pub struct Download {
    pub request: RetrievalRequest,
    pub url: String,
    pub origin: ArchiveOrigin,
    pub table: ReportTable,
}

#[derive(Debug, Clone)]
pub struct DownloadSummary {
    pub report_type: String,
    pub target: String,
    pub url: String,
    pub origin: ArchiveOrigin,
    pub rows: usize,
    pub columns: usize,
}

impl From<&Download> for DownloadSummary {
    fn from(download: &Download) -> Self {
        Self {
            report_type: download.request.report_type.to_string(),
            target: download.request.target.to_string(),
            url: download.url.clone(),
            origin: download.origin,
            rows: download.table.len(),
            columns: download.table.columns().len(),
        }
    }
}

pub struct CotClient<T: Transport, C: Clock = SystemClock> {
    fetcher: ArchiveFetcher<T>,
    clock: C,
}

impl<T: Transport> CotClient<T, SystemClock> {
    pub fn new(transport: T, resolver: LocationResolver) -> Self {
        Self::with_clock(transport, resolver, SystemClock)
    }
}

impl<T: Transport, C: Clock> CotClient<T, C> {
    pub fn with_clock(transport: T, resolver: LocationResolver, clock: C) -> Self {
        Self {
            fetcher: ArchiveFetcher::new(transport, resolver),
            clock,
        }
    }

    pub fn fetcher(&self) -> &ArchiveFetcher<T> {
        &self.fetcher
    }

    /// Resolve, fetch and decode a single archive.
    pub fn download(
        &self,
        request: RetrievalRequest,
        options: &DownloadOptions,
    ) -> Result<Download, CotError> {
        let fetched = self.fetcher.fetch(
            &request,
            options.cache_dir.as_deref(),
            options.force_refresh,
            self.clock.current_year(),
        )?;
        let table = read_table(&fetched.bytes)?;
        info!(
            %request,
            origin = ?fetched.origin,
            rows = table.len(),
            columns = table.columns().len(),
            "report decoded"
        );
        Ok(Download {
            request,
            url: fetched.location.url(),
            origin: fetched.origin,
            table,
        })
    }

    pub fn download_year(
        &self,
        report_type: ReportType,
        year: i32,
        options: &DownloadOptions,
    ) -> Result<ReportTable, CotError> {
        self.download(RetrievalRequest::year(report_type, year), options)
            .map(|download| download.table)
    }

    pub fn download_bundle(
        &self,
        report_type: ReportType,
        options: &DownloadOptions,
    ) -> Result<ReportTable, CotError> {
        self.download(RetrievalRequest::bundle(report_type), options)
            .map(|download| download.table)
    }

    /// Years `start..=end` stacked in ascending order. Fails as a whole
    /// with `RangeFetchFailed` naming the first year that broke.
    pub fn download_year_range(
        &self,
        report_type: ReportType,
        start: i32,
        end: i32,
        options: &DownloadOptions,
    ) -> Result<ReportTable, CotError> {
        aggregate_years(start, end, |year| {
            self.download_year(report_type, year, options)
        })
    }
}
