use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use tracing::error;

use injury_edge::config::{LinesConfig, RunConfig};
use injury_edge::error::EdgeError;
use injury_edge::injury_report::{MatchScope, NameMatch};
use injury_edge::pipeline::{Pipeline, RunReport};

#[derive(Debug, Parser)]
#[command(
    name = "injury_edge",
    about = "Boost teammate point lines for injured stars and grade the edge"
)]
struct Cli {
    /// Board path; `.xlsx` writes a workbook, anything else CSV.
    #[arg(long)]
    out: Option<PathBuf>,

    /// Read the injury report from a local HTML or text file.
    #[arg(long)]
    report_file: Option<PathBuf>,

    /// `player,line` CSV instead of the configured line source.
    #[arg(long, conflicts_with = "lines_url")]
    lines_csv: Option<PathBuf>,

    /// JSON lines feed instead of the configured line source.
    #[arg(long)]
    lines_url: Option<String>,

    /// Custom impact map (JSON).
    #[arg(long)]
    registry: Option<PathBuf>,

    #[arg(long, conflicts_with = "no_weights")]
    weights: Option<PathBuf>,

    /// Use registry boosts only; no weights are read or written.
    #[arg(long)]
    no_weights: bool,

    /// Game log CSV with observed points, used to correct the weights.
    #[arg(long)]
    actuals: Option<PathBuf>,

    /// `row` (default) or `page`.
    #[arg(long, value_parser = parse_scope)]
    scope: Option<MatchScope>,

    /// `exact` (default) or `surname`.
    #[arg(long, value_parser = parse_name_match)]
    name_match: Option<NameMatch>,

    /// Treat game-time decisions as inactive.
    #[arg(long)]
    include_gtd: bool,
}

fn parse_scope(raw: &str) -> Result<MatchScope, String> {
    MatchScope::parse(raw).ok_or_else(|| format!("unknown scope {raw:?}, expected row or page"))
}

fn parse_name_match(raw: &str) -> Result<NameMatch, String> {
    NameMatch::parse(raw)
        .ok_or_else(|| format!("unknown name match {raw:?}, expected exact or surname"))
}

impl Cli {
    fn apply(self, mut cfg: RunConfig) -> RunConfig {
        if let Some(out) = self.out {
            cfg.output_path = out;
        }
        if let Some(path) = self.report_file {
            cfg.injury_report_file = Some(path);
        }
        if let Some(path) = self.lines_csv {
            cfg.lines = LinesConfig::Csv(path);
        }
        if let Some(url) = self.lines_url {
            cfg.lines = LinesConfig::Http(url);
        }
        if let Some(path) = self.registry {
            cfg.impact_registry_path = Some(path);
        }
        if let Some(path) = self.weights {
            cfg.weights_path = path;
            cfg.weights_enabled = true;
        }
        if self.no_weights {
            cfg.weights_enabled = false;
        }
        if let Some(path) = self.actuals {
            cfg.actuals_path = Some(path);
        }
        if let Some(scope) = self.scope {
            cfg.classifier.scope = scope;
        }
        if let Some(m) = self.name_match {
            cfg.classifier.name_match = m;
        }
        if self.include_gtd {
            cfg.classifier = cfg.classifier.with_game_time_decisions();
        }
        cfg
    }
}

/// 0 for any written board (empty included), 2 when the run is
/// misconfigured, 1 for every other failure.
fn exit_status(outcome: &Result<RunReport, EdgeError>) -> u8 {
    match outcome {
        Ok(_) => 0,
        Err(EdgeError::FatalConfiguration(_)) => 2,
        Err(_) => 1,
    }
}

fn print_summary(report: &RunReport) {
    println!(
        "{} lines from {}, {} stars out, {} projected -> {}",
        report.lines_total,
        report.lines_source,
        report.banned.len(),
        report.results.len(),
        report.output_path.display()
    );
    for r in report.results.iter().filter(|r| r.boost > 0.0) {
        println!(
            "  {:<24} {:>5.1} +{:<4.1} -> {:>5.1}  {:>6.2}%  {}",
            r.player, r.baseline, r.boost, r.projection, r.edge_pct, r.grade
        );
    }
}

fn main() -> ExitCode {
    injury_edge::load_dotenv();
    injury_edge::init_tracing();

    let cfg = Cli::parse().apply(RunConfig::from_env());
    let outcome = Pipeline::from_config(&cfg).run();
    match &outcome {
        Ok(report) => print_summary(report),
        Err(err @ EdgeError::FatalConfiguration(_)) => error!(error = %err, "run aborted"),
        Err(err) => error!(error = %err, "run failed"),
    }
    ExitCode::from(exit_status(&outcome))
}

#[cfg(test)]
mod tests {
    use super::*;
    use injury_edge::impact_registry::BannedSet;

    fn empty_board() -> RunReport {
        RunReport {
            lines_source: "static lines".into(),
            lines_total: 0,
            banned: BannedSet::new(),
            results: Vec::new(),
            weights_changed: false,
            output_path: PathBuf::from("board.csv"),
        }
    }

    #[test]
    fn empty_board_exits_zero() {
        assert_eq!(exit_status(&Ok(empty_board())), 0);
    }

    #[test]
    fn fatal_configuration_exits_two() {
        let err = EdgeError::FatalConfiguration("no line source configured".into());
        assert_eq!(exit_status(&Err(err)), 2);
    }

    #[test]
    fn other_failures_exit_one() {
        let unreachable = EdgeError::SourceUnavailable {
            source_name: "http lines".into(),
            detail: "timeout".into(),
        };
        assert_eq!(exit_status(&Err(unreachable)), 1);
        assert_eq!(exit_status(&Err(EdgeError::NoCandidates)), 1);
    }

    #[test]
    fn cli_flags_override_environment() {
        let cli = Cli::parse_from(["injury_edge", "--no-weights", "--scope", "page", "--include-gtd"]);
        let cfg = cli.apply(RunConfig::from_env());
        assert!(!cfg.weights_enabled);
        assert_eq!(cfg.classifier.scope, MatchScope::Page);
        assert!(cfg.classifier.keywords.iter().any(|k| k == "GTD"));
    }
}
