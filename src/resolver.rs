use std::fmt;

use crate::catalog::{self, ReportTypeSpec};
use crate::domain::{ArchiveTarget, RetrievalRequest};
use crate::error::CotError;

pub const DEFAULT_BASE_URL: &str = "https://www.cftc.gov/files/dea/history/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteLocation {
    base_url: String,
    filename: String,
}

impl RemoteLocation {
    pub fn new(base_url: &str, filename: impl Into<String>) -> Self {
        let base_url = if base_url.ends_with('/') {
            base_url.to_string()
        } else {
            format!("{base_url}/")
        };
        Self {
            base_url,
            filename: filename.into(),
        }
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.base_url, self.filename)
    }
}

impl fmt::Display for RemoteLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.base_url, self.filename)
    }
}

#[derive(Debug, Clone)]
pub struct LocationResolver {
    base_url: String,
}

impl Default for LocationResolver {
    fn default() -> Self {
        Self::new(DEFAULT_BASE_URL)
    }
}

impl LocationResolver {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn resolve_year_location(&self, spec: &ReportTypeSpec, year: i32) -> RemoteLocation {
        RemoteLocation::new(&self.base_url, spec.year_filename(year))
    }

    pub fn resolve_bundle_location(
        &self,
        spec: &ReportTypeSpec,
    ) -> Result<RemoteLocation, CotError> {
        let filename = spec
            .bundle_filename
            .ok_or(CotError::BundleUnavailable(spec.report_type))?;
        Ok(RemoteLocation::new(&self.base_url, filename))
    }

    pub fn resolve(&self, request: &RetrievalRequest) -> Result<RemoteLocation, CotError> {
        let spec = catalog::spec_for(request.report_type);
        match request.target {
            ArchiveTarget::Year(year) => Ok(self.resolve_year_location(spec, year)),
            ArchiveTarget::Bundle => self.resolve_bundle_location(spec),
        }
    }
}
