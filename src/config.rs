use std::env;
use std::path::PathBuf;

use crate::game_log::{DEFAULT_GAME_LOG_FILE, DEFAULT_GAME_LOG_URL};
use crate::injury_report::{ClassifierConfig, MatchScope, NameMatch};

const APP_DIR: &str = "injury_edge";
const DEFAULT_INJURY_REPORT_URL: &str = "https://www.espn.com/nba/injuries";
const DEFAULT_OUTPUT_PATH: &str = "injury_edge_board.csv";

#[derive(Debug, Clone, PartialEq)]
pub enum LinesConfig {
    Static,
    Csv(PathBuf),
    Http(String),
    /// Explicitly disabled; a run cannot proceed.
    None,
}

#[derive(Debug, Clone)]
pub struct RunConfig {
    pub injury_report_url: String,
    /// Offline report; takes precedence over the URL when set.
    pub injury_report_file: Option<PathBuf>,
    pub classifier: ClassifierConfig,
    pub lines: LinesConfig,
    pub lines_fallback_static: bool,
    pub exclude_banned_candidates: bool,
    pub impact_registry_path: Option<PathBuf>,
    pub weights_enabled: bool,
    pub weights_path: PathBuf,
    pub actuals_path: Option<PathBuf>,
    pub output_path: PathBuf,
}

impl RunConfig {
    pub fn from_env() -> Self {
        let mut classifier = ClassifierConfig::default();
        if let Some(scope) = env_string("INJURY_MATCH_SCOPE").and_then(|v| MatchScope::parse(&v)) {
            classifier.scope = scope;
        }
        if let Some(m) = env_string("INJURY_NAME_MATCH").and_then(|v| NameMatch::parse(&v)) {
            classifier.name_match = m;
        }
        if let Some(raw) = env_string("INJURY_STATUS_KEYWORDS") {
            let keywords = parse_keywords(&raw);
            if !keywords.is_empty() {
                classifier.keywords = keywords;
            }
        }
        if env_bool("INJURY_INCLUDE_GTD", false) {
            classifier = classifier.with_game_time_decisions();
        }

        Self {
            injury_report_url: env_string("INJURY_REPORT_URL")
                .unwrap_or_else(|| DEFAULT_INJURY_REPORT_URL.to_string()),
            injury_report_file: env_string("INJURY_REPORT_FILE").map(PathBuf::from),
            classifier,
            lines: lines_from_env(),
            lines_fallback_static: env_bool("LINES_FALLBACK_STATIC", false),
            exclude_banned_candidates: env_bool("EXCLUDE_BANNED_CANDIDATES", true),
            impact_registry_path: env_string("IMPACT_REGISTRY_PATH").map(PathBuf::from),
            weights_enabled: env_bool("WEIGHTS_ENABLED", true),
            weights_path: env_string("WEIGHTS_PATH")
                .map(PathBuf::from)
                .or_else(|| app_cache_dir().map(|d| d.join("weights.json")))
                .unwrap_or_else(|| PathBuf::from("weights.json")),
            actuals_path: env_string("ACTUALS_PATH").map(PathBuf::from),
            output_path: env_string("OUTPUT_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_PATH)),
        }
    }
}

#[derive(Debug, Clone)]
pub struct GameLogConfig {
    pub url: String,
    pub season: Option<String>,
    pub output_path: PathBuf,
}

impl GameLogConfig {
    pub fn from_env() -> Self {
        Self {
            url: env_string("GAME_LOG_URL").unwrap_or_else(|| DEFAULT_GAME_LOG_URL.to_string()),
            season: env_string("GAME_LOG_SEASON"),
            output_path: env_string("GAME_LOG_PATH")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from(DEFAULT_GAME_LOG_FILE)),
        }
    }
}

fn lines_from_env() -> LinesConfig {
    let kind = env_string("LINES_SOURCE")
        .unwrap_or_else(|| "static".to_string())
        .to_ascii_lowercase();
    parse_lines_config(
        &kind,
        env_string("LINES_CSV_PATH"),
        env_string("LINES_URL"),
    )
}

/// Unknown kinds and kinds missing their location resolve to `None`.
pub fn parse_lines_config(kind: &str, csv_path: Option<String>, url: Option<String>) -> LinesConfig {
    match kind.trim() {
        "static" => LinesConfig::Static,
        "csv" => csv_path
            .map(|p| LinesConfig::Csv(PathBuf::from(p)))
            .unwrap_or(LinesConfig::None),
        "http" => url.map(LinesConfig::Http).unwrap_or(LinesConfig::None),
        _ => LinesConfig::None,
    }
}

pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

pub fn app_cache_dir() -> Option<PathBuf> {
    if let Ok(base) = env::var("XDG_CACHE_HOME")
        && !base.trim().is_empty()
    {
        return Some(PathBuf::from(base).join(APP_DIR));
    }
    let home = env::var("HOME").ok()?;
    if home.trim().is_empty() {
        return None;
    }
    Some(PathBuf::from(home).join(".cache").join(APP_DIR))
}

fn env_string(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
}

fn env_bool(key: &str, default: bool) -> bool {
    env::var(key)
        .ok()
        .map(|v| {
            let t = v.trim().to_ascii_lowercase();
            !(t.is_empty() || t == "0" || t == "false" || t == "off" || t == "no")
        })
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lines_config_needs_location() {
        assert_eq!(parse_lines_config("static", None, None), LinesConfig::Static);
        assert_eq!(parse_lines_config("csv", None, None), LinesConfig::None);
        assert_eq!(
            parse_lines_config("csv", Some("l.csv".into()), None),
            LinesConfig::Csv(PathBuf::from("l.csv"))
        );
        assert_eq!(
            parse_lines_config("http", None, Some("http://x".into())),
            LinesConfig::Http("http://x".into())
        );
        assert_eq!(parse_lines_config("none", None, None), LinesConfig::None);
        assert_eq!(parse_lines_config("carrier-pigeon", None, None), LinesConfig::None);
    }

    #[test]
    fn keywords_split_on_commas() {
        assert_eq!(parse_keywords(" Out, Doubtful ,,GTD"), vec!["Out", "Doubtful", "GTD"]);
        assert!(parse_keywords(" , ").is_empty());
    }
}
