//! The `luv.toml` project manifest.
//!
//! ```toml
//! [project]
//! texfile = "main.tex"
//! output_dir = "build"
//! engine = "pdflatex"
//! ```

use crate::error::LuvError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

pub const CONFIG_FILE_NAME: &str = "luv.toml";
pub const DEFAULT_TEXFILE: &str = "main.tex";
pub const DEFAULT_OUTPUT_DIR: &str = "build";

/// The typesetting engine used to compile the project.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Engine {
    #[default]
    Pdflatex,
    Xelatex,
    Lualatex,
    Latex,
}

impl Engine {
    pub const ALL: [Engine; 4] = [
        Engine::Pdflatex,
        Engine::Xelatex,
        Engine::Lualatex,
        Engine::Latex,
    ];

    /// The executable name.
    pub fn program(self) -> &'static str {
        match self {
            Engine::Pdflatex => "pdflatex",
            Engine::Xelatex => "xelatex",
            Engine::Lualatex => "lualatex",
            Engine::Latex => "latex",
        }
    }

    /// Extension of the document the engine writes. Plain `latex` produces DVI.
    pub fn output_extension(self) -> &'static str {
        match self {
            Engine::Latex => "dvi",
            _ => "pdf",
        }
    }
}

impl fmt::Display for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

impl FromStr for Engine {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Engine::ALL
            .into_iter()
            .find(|e| e.program() == s)
            .ok_or_else(|| {
                format!(
                    "unknown engine '{}' (expected one of: pdflatex, xelatex, lualatex, latex)",
                    s
                )
            })
    }
}

/// The `[project]` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProjectSection {
    pub texfile: String,
    pub output_dir: String,
    pub engine: Engine,
}

impl Default for ProjectSection {
    fn default() -> Self {
        Self {
            texfile: DEFAULT_TEXFILE.to_string(),
            output_dir: DEFAULT_OUTPUT_DIR.to_string(),
            engine: Engine::default(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectConfig {
    #[serde(default)]
    pub project: ProjectSection,
}

impl ProjectConfig {
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| LuvError::ManifestParse(e.to_string()).into())
    }

    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize luv.toml")
    }

    /// Loads the manifest at `path`.
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(LuvError::ManifestNotFound(path.to_path_buf()).into());
        }
        let content = std::fs::read_to_string(path)
            .map_err(|e| LuvError::ManifestParse(e.to_string()))?;
        Self::parse(&content)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        std::fs::write(path, self.to_toml()?)
            .with_context(|| format!("Failed to write {}", path.display()))
    }
}
