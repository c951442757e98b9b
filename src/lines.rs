use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::EdgeError;
use crate::http_client::fetch_text;
use crate::impact_registry::{BannedSet, normalize_name};

const BUILTIN_LINES: &[(&str, f64)] = &[
    ("Tyrese Maxey", 24.5),
    ("Kelly Oubre Jr.", 14.5),
    ("Joel Embiid", 33.5),
    ("Damian Lillard", 25.5),
    ("Khris Middleton", 15.5),
    ("Bobby Portis", 12.5),
    ("Giannis Antetokounmpo", 30.5),
    ("Jamal Murray", 20.5),
    ("Michael Porter Jr.", 16.5),
    ("Nikola Jokic", 27.5),
    ("Anthony Davis", 25.5),
    ("Austin Reaves", 16.5),
    ("LeBron James", 25.5),
    ("Jonathan Kuminga", 15.5),
    ("Andrew Wiggins", 13.5),
    ("Stephen Curry", 27.5),
    ("Kyrie Irving", 24.5),
    ("P.J. Washington", 11.5),
    ("Devin Booker", 26.5),
    ("Bradley Beal", 17.5),
];

/// A player's point line as offered by the source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineEntry {
    #[serde(alias = "Player", alias = "name")]
    pub player: String,
    #[serde(rename = "line", alias = "Line", alias = "baseline", alias = "points")]
    pub baseline: f64,
}

impl LineEntry {
    pub fn new(player: impl Into<String>, baseline: f64) -> Self {
        Self {
            player: player.into(),
            baseline,
        }
    }
}

/// Anything that can yield the (player, baseline) roster for a run.
pub trait LineSource {
    fn name(&self) -> &str;
    fn fetch_lines(&self) -> Result<Vec<LineEntry>, EdgeError>;
}

#[derive(Debug, Clone)]
pub struct StaticLineSource {
    lines: Vec<LineEntry>,
}

impl StaticLineSource {
    pub fn new(lines: Vec<LineEntry>) -> Self {
        Self { lines }
    }

    pub fn builtin() -> Self {
        Self::new(
            BUILTIN_LINES
                .iter()
                .map(|(player, line)| LineEntry::new(*player, *line))
                .collect(),
        )
    }
}

impl LineSource for StaticLineSource {
    fn name(&self) -> &str {
        "static lines"
    }

    fn fetch_lines(&self) -> Result<Vec<LineEntry>, EdgeError> {
        Ok(sanitize(self.lines.clone()))
    }
}

/// `player,line` CSV on disk.
#[derive(Debug, Clone)]
pub struct CsvLineSource {
    path: PathBuf,
}

impl CsvLineSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl LineSource for CsvLineSource {
    fn name(&self) -> &str {
        "csv lines"
    }

    fn fetch_lines(&self) -> Result<Vec<LineEntry>, EdgeError> {
        let file = File::open(&self.path)
            .with_context(|| format!("open lines csv {}", self.path.display()))
            .map_err(|err| EdgeError::source_unavailable(self.name(), &err))?;
        parse_lines_csv(file)
            .with_context(|| format!("parse lines csv {}", self.path.display()))
            .map(sanitize)
            .map_err(|err| EdgeError::source_unavailable(self.name(), &err))
    }
}

/// JSON array of `{ "player": .., "line": .. }` served over HTTP.
#[derive(Debug, Clone)]
pub struct HttpLineSource {
    url: String,
}

impl HttpLineSource {
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }
}

impl LineSource for HttpLineSource {
    fn name(&self) -> &str {
        "lines feed"
    }

    fn fetch_lines(&self) -> Result<Vec<LineEntry>, EdgeError> {
        fetch_text(&self.url, &[])
            .and_then(|body| parse_lines_json(&body))
            .map(sanitize)
            .map_err(|err| EdgeError::source_unavailable(self.name(), &err))
    }
}

pub fn parse_lines_json(raw: &str) -> Result<Vec<LineEntry>> {
    if raw.trim() == "null" {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<LineEntry>>(raw).context("invalid lines json")
}

pub fn parse_lines_csv<R: Read>(rdr: R) -> Result<Vec<LineEntry>> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(rdr);
    let mut out = Vec::new();
    for row in reader.deserialize::<LineEntry>() {
        out.push(row.context("invalid lines row")?);
    }
    Ok(out)
}

/// Drops rows with an empty name or a negative / non-finite baseline.
fn sanitize(lines: Vec<LineEntry>) -> Vec<LineEntry> {
    lines
        .into_iter()
        .filter(|line| {
            let ok = !normalize_name(&line.player).is_empty()
                && line.baseline.is_finite()
                && line.baseline >= 0.0;
            if !ok {
                warn!(player = %line.player, baseline = line.baseline, "dropping invalid line");
            }
            ok
        })
        .collect()
}

/// Candidate set for projection, optionally without banned players.
pub fn candidates(lines: &[LineEntry], banned: &BannedSet, exclude_banned: bool) -> Vec<LineEntry> {
    if !exclude_banned || banned.is_empty() {
        return lines.to_vec();
    }
    let banned_norm: BannedSet = banned.iter().map(|s| normalize_name(s)).collect();
    let out: Vec<LineEntry> = lines
        .iter()
        .filter(|line| !banned_norm.contains(&normalize_name(&line.player)))
        .cloned()
        .collect();
    debug!(
        total = lines.len(),
        kept = out.len(),
        "filtered banned players from candidates"
    );
    out
}
