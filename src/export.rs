use std::fs::File;
use std::io::Write;
use std::path::Path;

use anyhow::{Context, Result};
use rust_xlsxwriter::{Workbook, Worksheet};
use serde::Serialize;
use tracing::info;

use crate::error::EdgeError;
use crate::projection::ProjectionResult;

pub const BOARD_COLUMNS: [&str; 6] = ["Player", "Line", "Boost", "Projection", "Edge", "Grade"];

#[derive(Debug, Serialize)]
struct BoardRow<'a> {
    #[serde(rename = "Player")]
    player: &'a str,
    #[serde(rename = "Line")]
    line: f64,
    #[serde(rename = "Boost")]
    boost: f64,
    #[serde(rename = "Projection")]
    projection: f64,
    #[serde(rename = "Edge")]
    edge: f64,
    #[serde(rename = "Grade")]
    grade: &'static str,
}

impl<'a> From<&'a ProjectionResult> for BoardRow<'a> {
    fn from(r: &'a ProjectionResult) -> Self {
        Self {
            player: &r.player,
            line: r.baseline,
            boost: r.boost,
            projection: r.projection,
            edge: round2(r.edge_pct),
            grade: r.grade.label(),
        }
    }
}

fn round2(v: f64) -> f64 {
    (v * 100.0).round() / 100.0
}

/// Writes the board, replacing any previous file. `.xlsx` gets a workbook,
/// anything else CSV.
pub fn write_board(path: &Path, results: &[ProjectionResult]) -> Result<(), EdgeError> {
    let is_xlsx = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("xlsx"));

    let written = if is_xlsx {
        write_board_xlsx(path, results)
    } else {
        File::create(path)
            .with_context(|| format!("create {}", path.display()))
            .and_then(|file| write_board_csv(file, results))
    };
    written.map_err(|err| EdgeError::Export {
        path: path.to_path_buf(),
        detail: format!("{err:#}"),
    })?;
    info!(path = %path.display(), rows = results.len(), "board written");
    Ok(())
}

pub fn write_board_csv<W: Write>(out: W, results: &[ProjectionResult]) -> Result<()> {
    let mut writer = csv::Writer::from_writer(out);
    if results.is_empty() {
        // serialize() only emits headers alongside the first row.
        writer
            .write_record(BOARD_COLUMNS)
            .context("write board header")?;
    }
    for result in results {
        writer
            .serialize(BoardRow::from(result))
            .context("write board row")?;
    }
    writer.flush().context("flush board")?;
    Ok(())
}

fn write_board_xlsx(path: &Path, results: &[ProjectionResult]) -> Result<()> {
    let mut workbook = Workbook::new();
    let sheet = workbook.add_worksheet();
    sheet.set_name("Board").context("name sheet")?;
    write_header(sheet)?;
    for (idx, result) in results.iter().enumerate() {
        let row = (idx + 1) as u32;
        let r = BoardRow::from(result);
        sheet.write_string(row, 0, r.player)?;
        sheet.write_number(row, 1, r.line)?;
        sheet.write_number(row, 2, r.boost)?;
        sheet.write_number(row, 3, r.projection)?;
        sheet.write_number(row, 4, r.edge)?;
        sheet.write_string(row, 5, r.grade)?;
    }
    workbook
        .save(path)
        .with_context(|| format!("save {}", path.display()))?;
    Ok(())
}

fn write_header(sheet: &mut Worksheet) -> Result<()> {
    for (col, name) in BOARD_COLUMNS.iter().enumerate() {
        sheet.write_string(0, col as u16, *name)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::Grade;

    #[test]
    fn empty_board_still_has_header() {
        let mut buf = Vec::new();
        write_board_csv(&mut buf, &[]).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        assert_eq!(text.trim_end(), "Player,Line,Boost,Projection,Edge,Grade");
    }

    #[test]
    fn edge_is_rounded_to_two_decimals() {
        let result = ProjectionResult {
            player: "T".into(),
            baseline: 15.0,
            boost: 1.0,
            projection: 16.0,
            edge_pct: 6.666_666,
            grade: Grade::Value,
        };
        let mut buf = Vec::new();
        write_board_csv(&mut buf, &[result]).expect("write");
        let text = String::from_utf8(buf).expect("utf8");
        let mut lines = text.lines();
        assert_eq!(lines.next(), Some("Player,Line,Boost,Projection,Edge,Grade"));
        assert_eq!(lines.next(), Some("T,15.0,1.0,16.0,6.67,VALUE"));
    }
}
