#![allow(dead_code)]

use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::sync::Mutex;

use camino::Utf8PathBuf;
use zip::ZipWriter;
use zip::write::SimpleFileOptions;

use cftc_cot::error::RetrievalStatus;
use cftc_cot::transport::{HttpResponse, Transport};

pub const BASE: &str = "https://www.cftc.gov/files/dea/history/";

/// Serves canned responses by URL; anything unknown is a 404.
#[derive(Default)]
pub struct MockTransport {
    responses: HashMap<String, Result<HttpResponse, RetrievalStatus>>,
    calls: Mutex<Vec<String>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_archive(mut self, filename: &str, bytes: Vec<u8>) -> Self {
        self.responses.insert(
            format!("{BASE}{filename}"),
            Ok(HttpResponse { status: 200, bytes }),
        );
        self
    }

    pub fn with_status(mut self, filename: &str, status: u16) -> Self {
        self.responses.insert(
            format!("{BASE}{filename}"),
            Ok(HttpResponse {
                status,
                bytes: Vec::new(),
            }),
        );
        self
    }

    pub fn with_failure(mut self, url: &str, status: RetrievalStatus) -> Self {
        self.responses.insert(url.to_string(), Err(status));
        self
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.responses.insert(
            url.to_string(),
            Ok(HttpResponse {
                status: 200,
                bytes: html.as_bytes().to_vec(),
            }),
        );
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

impl Transport for MockTransport {
    fn get(&self, url: &str) -> Result<HttpResponse, RetrievalStatus> {
        self.calls.lock().unwrap().push(url.to_string());
        match self.responses.get(url) {
            Some(response) => response.clone(),
            None => Ok(HttpResponse {
                status: 404,
                bytes: b"Not Found".to_vec(),
            }),
        }
    }
}

pub fn zip_archive(entries: &[(&str, &[u8])]) -> Vec<u8> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    for (name, content) in entries {
        if name.ends_with('/') {
            writer
                .add_directory(*name, SimpleFileOptions::default())
                .unwrap();
            continue;
        }
        writer
            .start_file(*name, SimpleFileOptions::default())
            .unwrap();
        writer.write_all(content).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

/// Archive holding a small readme and one CSV data file.
pub fn report_archive(csv: &str) -> Vec<u8> {
    zip_archive(&[
        ("readme.txt", b"See explanatory notes."),
        ("annual.txt", csv.as_bytes()),
    ])
}

pub fn year_csv(year: i32) -> String {
    format!(
        "Market_and_Exchange_Names,Report_Date_as_YYYY-MM-DD,Open_Interest_All\n\
         \"WHEAT-SRW - CHICAGO BOARD OF TRADE\",{year}-01-07,{year}0\n\
         \"CORN - CHICAGO BOARD OF TRADE\",{year}-01-07,{year}1\n"
    )
}

pub fn temp_cache() -> (tempfile::TempDir, Utf8PathBuf) {
    let temp = tempfile::tempdir().unwrap();
    let dir = Utf8PathBuf::from_path_buf(temp.path().join("dataset")).unwrap();
    (temp, dir)
}
