use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use camino::Utf8PathBuf;
use serde::{Deserialize, Serialize};

use crate::domain::{ReportType, RetrievalRequest};
use crate::error::CotError;
use crate::resolver::DEFAULT_BASE_URL;
use crate::transport::TransportConfig;

pub const DEFAULT_CONFIG_FILE: &str = "cot.json";

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct Config {
    #[serde(default)]
    pub cache_dir: Option<String>,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub timeout_secs: Option<u64>,
    #[serde(default)]
    pub retries: Option<usize>,
    #[serde(default)]
    pub requests: Vec<RequestEntry>,
}

#[derive(Debug, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RequestEntry {
    Shorthand(String),
    Detailed(RequestEntryObject),
}

#[derive(Debug, Deserialize, Serialize)]
pub struct RequestEntryObject {
    pub report_type: String,
    #[serde(default)]
    pub year: Option<i32>,
    #[serde(default)]
    pub start_year: Option<i32>,
    #[serde(default)]
    pub end_year: Option<i32>,
    #[serde(default)]
    pub bundle: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfiguredRequest {
    Single(RetrievalRequest),
    Range {
        report_type: ReportType,
        start_year: i32,
        end_year: i32,
    },
}

impl ConfiguredRequest {
    pub fn label(&self) -> String {
        match self {
            ConfiguredRequest::Single(request) => {
                format!("{}_{}", request.report_type, request.target)
            }
            ConfiguredRequest::Range {
                report_type,
                start_year,
                end_year,
            } => format!("{report_type}_{start_year}_{end_year}"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    pub cache_dir: Option<Utf8PathBuf>,
    pub base_url: String,
    pub transport: TransportConfig,
    pub requests: Vec<ConfiguredRequest>,
}

impl Default for ResolvedConfig {
    fn default() -> Self {
        Self {
            cache_dir: None,
            base_url: DEFAULT_BASE_URL.to_string(),
            transport: TransportConfig::default(),
            requests: Vec::new(),
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    /// An explicit path must exist. Without one, `cot.json` in the working
    /// directory is used when present, defaults otherwise.
    pub fn resolve(path: Option<&str>) -> Result<ResolvedConfig, CotError> {
        let config_path = match path {
            Some(path) => PathBuf::from(path),
            None => PathBuf::from(DEFAULT_CONFIG_FILE),
        };

        if path.is_none() && !config_path.exists() {
            return Ok(ResolvedConfig::default());
        }

        let content = fs::read_to_string(&config_path)
            .map_err(|_| CotError::ConfigRead(config_path.clone()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| CotError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<ResolvedConfig, CotError> {
        let defaults = TransportConfig::default();
        let transport = TransportConfig {
            timeout: config
                .timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(defaults.timeout),
            retries: config.retries.unwrap_or(defaults.retries),
        };

        let requests = config
            .requests
            .into_iter()
            .map(|entry| match entry {
                RequestEntry::Shorthand(value) => Ok(ConfiguredRequest::Single(value.parse()?)),
                RequestEntry::Detailed(obj) => resolve_detailed(obj),
            })
            .collect::<Result<Vec<_>, CotError>>()?;

        Ok(ResolvedConfig {
            cache_dir: config.cache_dir.map(Utf8PathBuf::from),
            base_url: config
                .base_url
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            transport,
            requests,
        })
    }
}

fn resolve_detailed(obj: RequestEntryObject) -> Result<ConfiguredRequest, CotError> {
    let report_type: ReportType = obj.report_type.parse()?;
    match (obj.bundle, obj.year, obj.start_year, obj.end_year) {
        (true, None, None, None) => Ok(ConfiguredRequest::Single(RetrievalRequest::bundle(
            report_type,
        ))),
        (false, Some(year), None, None) => Ok(ConfiguredRequest::Single(
            RetrievalRequest::year(report_type, year),
        )),
        (false, None, Some(start_year), Some(end_year)) => {
            if start_year > end_year {
                return Err(CotError::InvalidYearRange {
                    start: start_year,
                    end: end_year,
                });
            }
            Ok(ConfiguredRequest::Range {
                report_type,
                start_year,
                end_year,
            })
        }
        _ => Err(CotError::InvalidRequest(format!(
            "{report_type}: set exactly one of `year`, `start_year`+`end_year` or `bundle`"
        ))),
    }
}
