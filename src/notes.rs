//! Best-effort scrape of the COT explanatory notes page.
//!
//! The page is maintained by hand and its markup changes without notice.
//! Nothing here returns an error to the caller: problems are collected as
//! [`NotesIssue`]s next to whatever could be extracted.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use tracing::warn;

use crate::table::ReportTable;
use crate::transport::Transport;

pub const EXPLANATORY_NOTES_URL: &str =
    "https://www.cftc.gov/MarketReports/CommitmentsofTraders/ExplanatoryNotes/index.htm";

pub const FALLBACK_SECTION: &str = "full_page_fallback";
pub const FALLBACK_TITLE: &str = "Explanatory Notes (fallback)";

static NON_ALNUM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[^a-z0-9]+").expect("valid regex"));
static WHITESPACE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExplanatoryNote {
    pub section: String,
    pub title: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotesIssue {
    FetchFailed(String),
    AccordionMissing,
    UnpairedTerm(String),
    InvalidSelector(String),
}

impl fmt::Display for NotesIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NotesIssue::FetchFailed(message) => write!(f, "notes page unavailable: {message}"),
            NotesIssue::AccordionMissing => {
                write!(f, "definition list not found; fell back to page text")
            }
            NotesIssue::UnpairedTerm(title) => write!(f, "term without definition: {title}"),
            NotesIssue::InvalidSelector(selector) => write!(f, "invalid selector: {selector}"),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExplanatoryNotes {
    pub notes: Vec<ExplanatoryNote>,
    pub issues: Vec<NotesIssue>,
}

impl ExplanatoryNotes {
    pub fn to_table(&self) -> ReportTable {
        ReportTable::new(
            vec!["section".to_string(), "title".to_string(), "text".to_string()],
            self.notes
                .iter()
                .map(|note| vec![note.section.clone(), note.title.clone(), note.text.clone()])
                .collect(),
        )
    }
}

pub struct NotesCollector<T: Transport> {
    transport: T,
    url: String,
}

impl<T: Transport> NotesCollector<T> {
    pub fn new(transport: T) -> Self {
        Self::with_url(transport, EXPLANATORY_NOTES_URL)
    }

    pub fn with_url(transport: T, url: impl Into<String>) -> Self {
        Self {
            transport,
            url: url.into(),
        }
    }

    pub fn fetch_explanatory_notes(&self) -> ExplanatoryNotes {
        let response = match self.transport.get(&self.url) {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                return failed(format!("{} returned HTTP status {}", self.url, response.status));
            }
            Err(status) => return failed(format!("{}: {status}", self.url)),
        };
        let html = String::from_utf8_lossy(&response.bytes);
        parse_notes(&html)
    }
}

fn failed(message: String) -> ExplanatoryNotes {
    warn!(%message, "explanatory notes unavailable");
    ExplanatoryNotes {
        notes: Vec::new(),
        issues: vec![NotesIssue::FetchFailed(message)],
    }
}

pub fn parse_notes(html: &str) -> ExplanatoryNotes {
    let document = Html::parse_document(html);
    let mut issues = Vec::new();

    let (Some(container_sel), Some(dt_sel)) = (
        selector(".ckeditor-accordion", &mut issues),
        selector("dt", &mut issues),
    ) else {
        return ExplanatoryNotes {
            notes: Vec::new(),
            issues,
        };
    };

    let Some(container) = document.select(&container_sel).next() else {
        warn!("notes accordion missing; using page text");
        let main = selector("main", &mut issues)
            .and_then(|main_sel| document.select(&main_sel).next())
            .unwrap_or_else(|| document.root_element());
        let text = WHITESPACE
            .replace_all(&joined_text(main), " ")
            .trim()
            .to_string();
        issues.push(NotesIssue::AccordionMissing);
        return ExplanatoryNotes {
            notes: vec![ExplanatoryNote {
                section: FALLBACK_SECTION.to_string(),
                title: FALLBACK_TITLE.to_string(),
                text,
            }],
            issues,
        };
    };

    let mut notes = Vec::new();
    for term in container.select(&dt_sel) {
        let title = joined_text(term);
        let Some(definition) = definition_for(term) else {
            issues.push(NotesIssue::UnpairedTerm(title));
            continue;
        };
        notes.push(ExplanatoryNote {
            section: section_key(&title),
            title,
            text: joined_text(definition),
        });
    }
    ExplanatoryNotes { notes, issues }
}

/// `Some Title (Part 2)` -> `some_title_part_2`.
pub fn section_key(title: &str) -> String {
    NON_ALNUM
        .replace_all(&title.to_lowercase(), "_")
        .trim_matches('_')
        .to_string()
}

fn selector(css: &str, issues: &mut Vec<NotesIssue>) -> Option<Selector> {
    match Selector::parse(css) {
        Ok(selector) => Some(selector),
        Err(_) => {
            issues.push(NotesIssue::InvalidSelector(css.to_string()));
            None
        }
    }
}

/// The next `<dd>` sibling, even past other `<dt>`s.
fn definition_for(term: ElementRef<'_>) -> Option<ElementRef<'_>> {
    term.next_siblings()
        .filter_map(ElementRef::wrap)
        .find(|element| element.value().name() == "dd")
}

fn joined_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|piece| !piece.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pairs_terms_with_definitions() {
        let html = r#"
            <html><body>
              <div class="ckeditor-accordion">
                <dt>Open Interest</dt>
                <dd>Total of all futures <b>not yet</b> offset.</dd>
                <dt>Reportable Positions</dt>
                <dd>Positions at or above the reporting level.</dd>
              </div>
            </body></html>
        "#;
        let notes = parse_notes(html);
        assert!(notes.issues.is_empty());
        assert_eq!(notes.notes.len(), 2);
        assert_eq!(notes.notes[0].section, "open_interest");
        assert_eq!(notes.notes[0].text, "Total of all futures not yet offset.");
        assert_eq!(notes.notes[1].title, "Reportable Positions");
    }

    #[test]
    fn consecutive_terms_share_the_next_definition() {
        let html = r#"
            <div class="ckeditor-accordion"><dt>Orphan</dt><dt>Kept</dt><dd>Yes</dd></div>
        "#;
        let notes = parse_notes(html);
        assert!(notes.issues.is_empty());
        assert_eq!(notes.notes.len(), 2);
        assert_eq!(notes.notes[0].title, "Orphan");
        assert_eq!(notes.notes[0].text, "Yes");
        assert_eq!(notes.notes[1].title, "Kept");
        assert_eq!(notes.notes[1].text, "Yes");
    }

    #[test]
    fn trailing_term_without_definition_is_reported() {
        let html = r#"
            <div class="ckeditor-accordion"><dt>Kept</dt><dd>Yes</dd><dt>Last</dt></div>
        "#;
        let notes = parse_notes(html);
        assert_eq!(notes.notes.len(), 1);
        assert_eq!(notes.notes[0].title, "Kept");
        assert_eq!(notes.issues, vec![NotesIssue::UnpairedTerm("Last".to_string())]);
    }

    #[test]
    fn section_keys_are_slugged() {
        assert_eq!(section_key("  Spreading (Futures & Options) "), "spreading_futures_options");
        assert_eq!(section_key("Title 1"), "title_1");
    }
}
