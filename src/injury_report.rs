use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use scraper::{Html, Selector};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::EdgeError;
use crate::http_client::fetch_text;
use crate::impact_registry::{BannedSet, ImpactRegistry, normalize_name};

pub const DEFAULT_STATUS_KEYWORDS: [&str; 4] = ["Out", "Doubtful", "Inactive", "Sidelined"];
pub const GAME_TIME_DECISION: &str = "GTD";

const NAME_SUFFIXES: [&str; 5] = ["jr", "sr", "ii", "iii", "iv"];

/// Visible text of an injury report, kept both whole and per table row.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InjuryReport {
    pub page_text: String,
    pub rows: Vec<String>,
}

impl InjuryReport {
    pub fn from_html(html: &str) -> Result<Self> {
        let document = Html::parse_document(html);
        let row_selector = Selector::parse("tr")
            .map_err(|e| anyhow::anyhow!("Failed to create row selector: {}", e))?;
        let body_selector = Selector::parse("body")
            .map_err(|e| anyhow::anyhow!("Failed to create body selector: {}", e))?;

        let rows = document
            .select(&row_selector)
            .map(|row| collapse_whitespace(row.text()))
            .filter(|text| !text.is_empty())
            .collect();
        let page_text = match document.select(&body_selector).next() {
            Some(body) => collapse_whitespace(body.text()),
            None => collapse_whitespace(document.root_element().text()),
        };
        Ok(Self { page_text, rows })
    }

    /// Plain-text reports: one row per non-blank line.
    pub fn from_plain_text(text: &str) -> Self {
        let rows = text
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(str::to_string)
            .collect();
        Self {
            page_text: text.to_string(),
            rows,
        }
    }

    fn looks_like_html(raw: &str) -> bool {
        let head = raw.trim_start();
        head.starts_with('<') || head.contains("<html") || head.contains("<tr")
    }

    pub fn parse(raw: &str) -> Result<Self> {
        if Self::looks_like_html(raw) {
            Self::from_html(raw)
        } else {
            Ok(Self::from_plain_text(raw))
        }
    }
}

fn collapse_whitespace<'a>(parts: impl Iterator<Item = &'a str>) -> String {
    parts
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Acquires the report text for a run.
pub trait ReportSource {
    fn fetch_report(&self) -> Result<InjuryReport, EdgeError>;
}

#[derive(Debug, Clone)]
pub struct HttpReportSource {
    pub url: String,
}

impl ReportSource for HttpReportSource {
    fn fetch_report(&self) -> Result<InjuryReport, EdgeError> {
        fetch_injury_report(&self.url)
    }
}

#[derive(Debug, Clone)]
pub struct FileReportSource {
    pub path: PathBuf,
}

impl ReportSource for FileReportSource {
    fn fetch_report(&self) -> Result<InjuryReport, EdgeError> {
        read_injury_report(&self.path)
    }
}

impl ReportSource for InjuryReport {
    fn fetch_report(&self) -> Result<InjuryReport, EdgeError> {
        Ok(self.clone())
    }
}

pub fn fetch_injury_report(url: &str) -> Result<InjuryReport, EdgeError> {
    fetch_text(url, &[])
        .and_then(|html| {
            info!(url, bytes = html.len(), "fetched injury report");
            InjuryReport::parse(&html)
        })
        .map_err(|err| EdgeError::source_unavailable("injury report", &err))
}

pub fn read_injury_report(path: &Path) -> Result<InjuryReport, EdgeError> {
    fs::read_to_string(path)
        .with_context(|| format!("read injury report {}", path.display()))
        .and_then(|raw| InjuryReport::parse(&raw))
        .map_err(|err| EdgeError::source_unavailable("injury report", &err))
}

/// Decides whether a star's name occurs in a unit of text.
pub trait NameMatcher {
    fn matches(&self, star: &str, text_tokens: &[String]) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NameMatch {
    /// Full name as a contiguous token sequence.
    #[default]
    Exact,
    /// Last name only, ignoring generational suffixes.
    Surname,
}

impl NameMatch {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "exact" | "full" => Some(Self::Exact),
            "surname" | "last" => Some(Self::Surname),
            _ => None,
        }
    }
}

impl NameMatcher for NameMatch {
    fn matches(&self, star: &str, text_tokens: &[String]) -> bool {
        let name = tokens(star);
        match self {
            NameMatch::Exact => contains_sequence(text_tokens, &name),
            NameMatch::Surname => {
                let Some(surname) = name
                    .iter()
                    .rev()
                    .find(|t| !NAME_SUFFIXES.contains(&t.as_str()))
                else {
                    return false;
                };
                text_tokens.iter().any(|t| t == surname)
            }
        }
    }
}

/// Granularity at which a name and a status keyword must co-occur.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MatchScope {
    #[default]
    Row,
    /// Whole page. A keyword anywhere plus a name anywhere is a hit, so
    /// unrelated mentions produce false positives.
    Page,
}

impl MatchScope {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "row" => Some(Self::Row),
            "page" => Some(Self::Page),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ClassifierConfig {
    pub scope: MatchScope,
    pub name_match: NameMatch,
    pub keywords: Vec<String>,
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            scope: MatchScope::Row,
            name_match: NameMatch::Exact,
            keywords: DEFAULT_STATUS_KEYWORDS.iter().map(|k| k.to_string()).collect(),
        }
    }
}

impl ClassifierConfig {
    pub fn with_game_time_decisions(mut self) -> Self {
        if !self
            .keywords
            .iter()
            .any(|k| k.eq_ignore_ascii_case(GAME_TIME_DECISION))
        {
            self.keywords.push(GAME_TIME_DECISION.to_string());
        }
        self
    }
}

pub struct Classifier {
    scope: MatchScope,
    keywords: Vec<Vec<String>>,
    matcher: Box<dyn NameMatcher>,
}

impl Classifier {
    pub fn new(cfg: &ClassifierConfig) -> Self {
        Self::with_matcher(cfg, Box::new(cfg.name_match))
    }

    pub fn with_matcher(cfg: &ClassifierConfig, matcher: Box<dyn NameMatcher>) -> Self {
        let keywords = cfg
            .keywords
            .iter()
            .map(|k| words(k))
            .filter(|k| !k.is_empty())
            .collect();
        Self {
            scope: cfg.scope,
            keywords,
            matcher,
        }
    }

    /// A failed acquisition degrades to an empty set.
    pub fn classify(
        &self,
        report: Result<InjuryReport, EdgeError>,
        registry: &ImpactRegistry,
    ) -> BannedSet {
        let report = match report {
            Ok(report) => report,
            Err(err) => {
                warn!(error = %err, "injury report unavailable, no players banned");
                return BannedSet::new();
            }
        };

        let units: Vec<&str> = match self.scope {
            MatchScope::Row => report.rows.iter().map(String::as_str).collect(),
            MatchScope::Page => vec![report.page_text.as_str()],
        };
        let flagged: Vec<Vec<String>> = units
            .iter()
            .map(|unit| words(unit))
            .filter(|unit| self.has_status_keyword(unit))
            .map(|unit| unit.iter().map(|w| w.to_ascii_lowercase()).collect())
            .collect();

        let mut banned = BannedSet::new();
        for star in registry.stars() {
            if flagged.iter().any(|unit| self.matcher.matches(star, unit)) {
                info!(star, "star inactive");
                banned.insert(star.to_string());
            }
        }
        debug!(units = units.len(), flagged = flagged.len(), banned = banned.len(), "classified report");
        banned
    }

    /// Keywords compare case-sensitively so prose such as "sat out" in a
    /// comment column does not read as the status "Out".
    fn has_status_keyword(&self, unit: &[String]) -> bool {
        self.keywords.iter().any(|k| contains_sequence(unit, k))
    }
}

pub fn classify(
    report: Result<InjuryReport, EdgeError>,
    registry: &ImpactRegistry,
    cfg: &ClassifierConfig,
) -> BannedSet {
    Classifier::new(cfg).classify(report, registry)
}

fn tokens(text: &str) -> Vec<String> {
    normalize_name(text)
        .split('_')
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Word tokens with original case; separators match `normalize_name`.
fn words(text: &str) -> Vec<String> {
    let mut out = Vec::new();
    let mut current = String::new();
    for ch in text.trim().chars() {
        if ch.is_ascii_alphanumeric() {
            current.push(ch);
        } else if ch == '.' || ch == '\'' {
            continue;
        } else if !current.is_empty() {
            out.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        out.push(current);
    }
    out
}

fn contains_sequence(haystack: &[String], needle: &[String]) -> bool {
    if needle.is_empty() || needle.len() > haystack.len() {
        return false;
    }
    haystack.windows(needle.len()).any(|w| w == needle)
}
