//! User-facing error kinds.
//!
//! [`LuvError`] marks problems with the user's project or machine (missing
//! manifest, missing entry file, missing tool). The CLI downcasts to it and
//! prints a one-line message instead of an "unexpected error" report.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LuvError {
    #[error("No luv.toml found. Run 'luv init' to create a new project.")]
    ProjectNotFound,

    #[error("No luv.toml found at {}", .0.display())]
    ManifestNotFound(PathBuf),

    #[error("Error reading luv.toml: {0}")]
    ManifestParse(String),

    #[error("TeX file not found: {}", .0.display())]
    EntryFileNotFound(PathBuf),

    #[error("Environment already exists at {}", .0.display())]
    EnvironmentExists(PathBuf),

    #[error("No environment found. Run 'luv init' first.")]
    EnvironmentMissing,

    #[error("{tool} not found. {hint}")]
    ToolNotFound { tool: String, hint: String },
}

impl LuvError {
    pub fn tlmgr_missing() -> Self {
        LuvError::ToolNotFound {
            tool: "tlmgr".to_string(),
            hint: "Please install TeX Live first.".to_string(),
        }
    }

    pub fn engine_missing(engine: &str) -> Self {
        LuvError::ToolNotFound {
            tool: format!("LaTeX engine '{}'", engine),
            hint: "Please install it first.".to_string(),
        }
    }
}
