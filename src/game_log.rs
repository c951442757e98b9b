use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::{Datelike, NaiveDate, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use crate::error::EdgeError;
use crate::http_client::fetch_text;
use crate::impact_registry::normalize_name;

pub const DEFAULT_GAME_LOG_URL: &str = "https://stats.nba.com/stats/leaguegamelog";
pub const DEFAULT_GAME_LOG_FILE: &str = "nba_all_stats.csv";

const RESULT_SET_NAME: &str = "LeagueGameLog";
const PLAYER_COLUMN: &str = "PLAYER_NAME";
const DATE_COLUMN: &str = "GAME_DATE";
const POINTS_COLUMN: &str = "PTS";

const STATS_HEADERS: [(&str, &str); 4] = [
    ("Referer", "https://www.nba.com/"),
    ("Origin", "https://www.nba.com"),
    ("x-nba-stats-origin", "stats"),
    ("x-nba-stats-token", "true"),
];

/// Every player's game rows for one season, columns in feed order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GameLog {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl GameLog {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.eq_ignore_ascii_case(name))
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

#[derive(Debug, Deserialize)]
struct StatsResponse {
    #[serde(rename = "resultSets", default)]
    result_sets: Vec<StatsResultSet>,
}

#[derive(Debug, Deserialize)]
struct StatsResultSet {
    #[serde(default)]
    name: String,
    #[serde(default)]
    headers: Vec<String>,
    #[serde(rename = "rowSet", default)]
    row_set: Vec<Vec<Value>>,
}

/// Season label ("2025-26") containing `date`. Seasons start in October.
pub fn season_for(date: NaiveDate) -> String {
    let start = if date.month() >= 10 {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{}-{:02}", start, (start + 1) % 100)
}

pub fn current_season() -> String {
    season_for(Utc::now().date_naive())
}

pub fn fetch_league_game_log(base_url: &str, season: &str) -> Result<GameLog, EdgeError> {
    let url = format!(
        "{base_url}?Counter=0&Direction=DESC&LeagueID=00&PlayerOrTeam=P&Season={season}&SeasonType=Regular%20Season&Sorter=DATE"
    );
    fetch_text(&url, &STATS_HEADERS)
        .and_then(|body| parse_league_game_log_json(&body))
        .inspect(|log| info!(season, rows = log.rows.len(), "fetched league game log"))
        .map_err(|err| EdgeError::source_unavailable("game log", &err))
}

pub fn parse_league_game_log_json(raw: &str) -> Result<GameLog> {
    if raw.trim() == "null" {
        return Ok(GameLog::default());
    }
    let parsed: StatsResponse = serde_json::from_str(raw).context("invalid game log json")?;
    let Some(set) = parsed
        .result_sets
        .into_iter()
        .find(|s| s.name == RESULT_SET_NAME || s.name.is_empty())
    else {
        return Ok(GameLog::default());
    };
    let width = set.headers.len();
    let rows = set
        .row_set
        .into_iter()
        .map(|row| {
            let mut cells: Vec<String> = row.iter().map(cell_text).collect();
            cells.resize(width, String::new());
            cells
        })
        .collect();
    Ok(GameLog {
        headers: set.headers,
        rows,
    })
}

fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

pub fn write_game_log_csv<W: Write>(out: W, log: &GameLog) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    writer
        .write_record(&log.headers)
        .context("write game log header")?;
    for row in &log.rows {
        writer.write_record(row).context("write game log row")?;
    }
    writer.flush().context("flush game log")?;
    Ok(())
}

pub fn save_game_log(path: &Path, log: &GameLog) -> Result<()> {
    let file =
        File::create(path).with_context(|| format!("create game log {}", path.display()))?;
    write_game_log_csv(file, log)
}

pub fn read_game_log_csv<R: Read>(rdr: R) -> Result<GameLog> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_reader(rdr);
    let headers = reader
        .headers()
        .context("read game log header")?
        .iter()
        .map(str::to_string)
        .collect::<Vec<_>>();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record.context("invalid game log row")?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(GameLog { headers, rows })
}

/// Points scored in each player's most recent game in the log.
pub fn latest_points(log: &GameLog) -> Result<HashMap<String, f64>> {
    let player_idx = log
        .column(PLAYER_COLUMN)
        .with_context(|| format!("game log has no {PLAYER_COLUMN} column"))?;
    let date_idx = log
        .column(DATE_COLUMN)
        .with_context(|| format!("game log has no {DATE_COLUMN} column"))?;
    let pts_idx = log
        .column(POINTS_COLUMN)
        .with_context(|| format!("game log has no {POINTS_COLUMN} column"))?;

    // ISO dates order correctly as strings.
    let mut latest: HashMap<String, (String, String, f64)> = HashMap::new();
    for row in &log.rows {
        let (Some(player), Some(date), Some(pts)) =
            (row.get(player_idx), row.get(date_idx), row.get(pts_idx))
        else {
            continue;
        };
        let Ok(points) = pts.trim().parse::<f64>() else {
            continue;
        };
        let key = normalize_name(player);
        if key.is_empty() {
            continue;
        }
        let newer = latest
            .get(&key)
            .is_none_or(|(_, seen, _)| date.as_str() > seen.as_str());
        if newer {
            latest.insert(key, (player.trim().to_string(), date.clone(), points));
        }
    }
    Ok(latest
        .into_values()
        .map(|(player, _, points)| (player, points))
        .collect())
}

/// Where observed outcomes come from once games are played.
pub trait OutcomeSource {
    fn actuals(&self) -> Result<HashMap<String, f64>, EdgeError>;
}

/// Game log CSV written by `update_game_log`.
#[derive(Debug, Clone)]
pub struct GameLogOutcomes {
    path: PathBuf,
}

impl GameLogOutcomes {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutcomeSource for GameLogOutcomes {
    fn actuals(&self) -> Result<HashMap<String, f64>, EdgeError> {
        let result = File::open(&self.path)
            .with_context(|| format!("open game log {}", self.path.display()))
            .and_then(read_game_log_csv)
            .and_then(|log| latest_points(&log));
        match result {
            Ok(actuals) => {
                if actuals.is_empty() {
                    warn!(path = %self.path.display(), "game log has no point totals");
                }
                Ok(actuals)
            }
            Err(err) => Err(EdgeError::source_unavailable("game log", &err)),
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct StaticOutcomes {
    actuals: HashMap<String, f64>,
}

impl StaticOutcomes {
    pub fn new(actuals: HashMap<String, f64>) -> Self {
        Self { actuals }
    }
}

impl OutcomeSource for StaticOutcomes {
    fn actuals(&self) -> Result<HashMap<String, f64>, EdgeError> {
        Ok(self.actuals.clone())
    }
}
