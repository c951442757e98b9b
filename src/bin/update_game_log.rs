use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use injury_edge::config::GameLogConfig;
use injury_edge::game_log;

#[derive(Debug, Parser)]
#[command(name = "update_game_log", about = "Download the league player game log to CSV")]
struct Cli {
    /// Season label such as 2025-26; defaults to the current season.
    #[arg(long)]
    season: Option<String>,

    #[arg(long)]
    out: Option<PathBuf>,
}

fn main() -> Result<()> {
    injury_edge::load_dotenv();
    injury_edge::init_tracing();

    let cli = Cli::parse();
    let cfg = GameLogConfig::from_env();
    let season = cli
        .season
        .or(cfg.season)
        .unwrap_or_else(game_log::current_season);
    let out = cli.out.unwrap_or(cfg.output_path);

    let log = game_log::fetch_league_game_log(&cfg.url, &season)?;
    game_log::save_game_log(&out, &log)
        .with_context(|| format!("unable to write {}", out.display()))?;

    println!("NBA game log updated");
    println!("Season: {season}");
    println!("Rows: {}", log.rows.len());
    println!("Columns: {}", log.headers.len());
    println!("CSV: {}", out.display());
    Ok(())
}
