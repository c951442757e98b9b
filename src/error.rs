use std::path::PathBuf;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum EdgeError {
    /// Network or parse failure while acquiring the injury report, the lines
    /// or the game log.
    #[error("{source_name} unavailable: {detail}")]
    SourceUnavailable { source_name: String, detail: String },

    #[error("weights file {} unavailable: {detail}", .path.display())]
    PersistenceUnavailable { path: PathBuf, detail: String },

    #[error("no candidates left to project")]
    NoCandidates,

    #[error("fatal configuration: {0}")]
    FatalConfiguration(String),

    #[error("failed writing board {}: {detail}", .path.display())]
    Export { path: PathBuf, detail: String },
}

impl EdgeError {
    pub fn source_unavailable(source_name: impl Into<String>, err: &anyhow::Error) -> Self {
        Self::SourceUnavailable {
            source_name: source_name.into(),
            detail: format!("{err:#}"),
        }
    }

    pub fn persistence(path: impl Into<PathBuf>, err: &anyhow::Error) -> Self {
        Self::PersistenceUnavailable {
            path: path.into(),
            detail: format!("{err:#}"),
        }
    }

    /// Recoverable errors degrade the run instead of ending it.
    pub fn is_recoverable(&self) -> bool {
        matches!(
            self,
            Self::SourceUnavailable { .. } | Self::PersistenceUnavailable { .. } | Self::NoCandidates
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_unavailable_keeps_context_chain() {
        let err = anyhow::anyhow!("connection reset").context("injury report request failed");
        let edge = EdgeError::source_unavailable("injury report", &err);
        let msg = edge.to_string();
        assert!(msg.starts_with("injury report unavailable"));
        assert!(msg.contains("connection reset"));
        assert!(edge.is_recoverable());
    }

    #[test]
    fn fatal_configuration_is_not_recoverable() {
        assert!(!EdgeError::FatalConfiguration("no line source".into()).is_recoverable());
        assert!(EdgeError::NoCandidates.is_recoverable());
    }
}
