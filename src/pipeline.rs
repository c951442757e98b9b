use std::path::PathBuf;

use tracing::{info, warn};

use crate::config::{LinesConfig, RunConfig};
use crate::error::EdgeError;
use crate::export::write_board;
use crate::game_log::{GameLogOutcomes, OutcomeSource};
use crate::impact_registry::{BannedSet, ImpactRegistry, load_impact_registry};
use crate::injury_report::{Classifier, FileReportSource, HttpReportSource, ReportSource};
use crate::lines::{CsvLineSource, HttpLineSource, LineEntry, LineSource, StaticLineSource, candidates};
use crate::projection::{ProjectionResult, project};
use crate::weights::{WeightsMemory, WeightsStore, correct};

/// Outcome of one run.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub lines_source: String,
    pub lines_total: usize,
    pub banned: BannedSet,
    pub results: Vec<ProjectionResult>,
    pub weights_changed: bool,
    pub output_path: PathBuf,
}

/// One fetch -> classify -> project -> grade -> persist pass, with every
/// collaborator passed in explicitly.
pub struct Pipeline {
    pub registry: ImpactRegistry,
    pub classifier: Classifier,
    pub report: Box<dyn ReportSource>,
    pub lines: Option<Box<dyn LineSource>>,
    pub fallback_lines: Option<StaticLineSource>,
    pub exclude_banned_candidates: bool,
    pub weights: Option<WeightsStore>,
    pub outcomes: Option<Box<dyn OutcomeSource>>,
    pub output_path: PathBuf,
}

impl Pipeline {
    pub fn from_config(cfg: &RunConfig) -> Self {
        let report: Box<dyn ReportSource> = match &cfg.injury_report_file {
            Some(path) => Box::new(FileReportSource { path: path.clone() }),
            None => Box::new(HttpReportSource {
                url: cfg.injury_report_url.clone(),
            }),
        };
        let lines: Option<Box<dyn LineSource>> = match &cfg.lines {
            LinesConfig::Static => Some(Box::new(StaticLineSource::builtin())),
            LinesConfig::Csv(path) => Some(Box::new(CsvLineSource::new(path.clone()))),
            LinesConfig::Http(url) => Some(Box::new(HttpLineSource::new(url.clone()))),
            LinesConfig::None => None,
        };
        let fallback_lines = (cfg.lines_fallback_static && cfg.lines != LinesConfig::Static)
            .then(StaticLineSource::builtin);
        let outcomes: Option<Box<dyn OutcomeSource>> = match &cfg.actuals_path {
            Some(path) if cfg.weights_enabled => {
                Some(Box::new(GameLogOutcomes::new(path.clone())) as Box<dyn OutcomeSource>)
            }
            Some(path) => {
                warn!(
                    actuals = %path.display(),
                    "weights disabled, observed outcomes will not be applied"
                );
                None
            }
            None => None,
        };

        Self {
            registry: load_impact_registry(cfg.impact_registry_path.as_deref()),
            classifier: Classifier::new(&cfg.classifier),
            report,
            lines,
            fallback_lines,
            exclude_banned_candidates: cfg.exclude_banned_candidates,
            weights: cfg
                .weights_enabled
                .then(|| WeightsStore::new(cfg.weights_path.clone())),
            outcomes,
            output_path: cfg.output_path.clone(),
        }
    }

    /// Errors only when no board can be produced.
    pub fn run(&self) -> Result<RunReport, EdgeError> {
        let defaults = WeightsMemory::from_registry(&self.registry);
        let memory = self.weights.as_ref().map(|store| store.load(&defaults));

        let (lines_source, lines) = self.fetch_lines()?;
        let banned = self
            .classifier
            .classify(self.report.fetch_report(), &self.registry);

        let boosts = self.registry.boost_table(&banned, memory.as_ref());
        let pool = candidates(&lines, &banned, self.exclude_banned_candidates);
        let results = project(&pool, &boosts, &banned);
        if results.is_empty() {
            warn!(
                error = %EdgeError::NoCandidates,
                lines = lines.len(),
                banned = banned.len(),
                "writing empty board"
            );
        }
        write_board(&self.output_path, &results)?;

        let weights_changed = match memory {
            Some(memory) => self.learn(&memory, &results),
            None => false,
        };

        info!(
            source = %lines_source,
            lines = lines.len(),
            banned = banned.len(),
            projected = results.len(),
            weights_changed,
            "run complete"
        );
        Ok(RunReport {
            lines_source,
            lines_total: lines.len(),
            banned,
            results,
            weights_changed,
            output_path: self.output_path.clone(),
        })
    }

    fn fetch_lines(&self) -> Result<(String, Vec<LineEntry>), EdgeError> {
        let Some(source) = self.lines.as_ref() else {
            return Err(EdgeError::FatalConfiguration(
                "no line source configured".to_string(),
            ));
        };
        match source.fetch_lines() {
            Ok(lines) => Ok((source.name().to_string(), lines)),
            Err(err) if err.is_recoverable() => {
                let Some(fallback) = self.fallback_lines.as_ref() else {
                    return Err(err);
                };
                warn!(error = %err, "falling back to static lines");
                fallback
                    .fetch_lines()
                    .map(|lines| (fallback.name().to_string(), lines))
            }
            Err(err) => Err(err),
        }
    }

    /// Applies observed outcomes to the weights and persists them if any
    /// moved. Failures here never fail the run.
    fn learn(&self, memory: &WeightsMemory, results: &[ProjectionResult]) -> bool {
        let (Some(store), Some(outcomes)) = (self.weights.as_ref(), self.outcomes.as_ref()) else {
            return false;
        };
        let actuals = match outcomes.actuals() {
            Ok(actuals) => actuals,
            Err(err) => {
                warn!(error = %err, "skipping weight correction");
                return false;
            }
        };
        let (updated, changed) = correct(memory, results, &actuals);
        if !changed {
            return false;
        }
        match store.save(&updated) {
            Ok(()) => true,
            Err(err) => {
                warn!(error = %err, "weights not persisted");
                false
            }
        }
    }
}
