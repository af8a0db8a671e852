//! The `latex-requirements.txt` manifest.
//!
//! One package per line, `#` starts a comment line. Lines may carry a version
//! suffix (`pkg==1.0`, `pkg>=2`, `pkg<=3`) which tlmgr cannot use, so
//! [`package_name`] strips it before installation.

use anyhow::{Context, Result};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub const REQUIREMENTS_FILE_NAME: &str = "latex-requirements.txt";

const TEMPLATE: &str = "# LaTeX package requirements
# Add packages one per line, optionally with versions
# Example:
# amsmath
# graphicx
# hyperref
";

const GENERATED_HEADER: &str = "# LaTeX package requirements\n# Generated by 'luv resolve'\n\n";

/// Strips a `==`, `>=` or `<=` version constraint from a requirement line.
pub fn package_name(requirement: &str) -> &str {
    ["==", ">=", "<="]
        .iter()
        .fold(requirement, |name, op| name.split(op).next().unwrap_or(name))
        .trim()
}

/// Parses requirement lines, skipping blanks and comments.
pub fn parse(content: &str) -> Vec<String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect()
}

/// Renders a deduplicated, sorted requirements file.
pub fn render<I, S>(packages: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let unique: BTreeSet<String> = packages
        .into_iter()
        .map(|p| p.as_ref().trim().to_string())
        .filter(|p| !p.is_empty())
        .collect();

    let mut out = String::from(GENERATED_HEADER);
    for pkg in unique {
        out.push_str(&pkg);
        out.push('\n');
    }
    out
}

/// Handle on a project's requirements file.
#[derive(Debug, Clone)]
pub struct RequirementsFile {
    path: PathBuf,
}

impl RequirementsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn exists(&self) -> bool {
        self.path.exists()
    }

    /// Reads the requirement lines. A missing file has no requirements.
    pub fn read(&self) -> Result<Vec<String>> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }
        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read {}", self.path.display()))?;
        Ok(parse(&content))
    }

    pub fn write_template(&self) -> Result<()> {
        std::fs::write(&self.path, TEMPLATE)
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    /// Replaces the file with the sorted, deduplicated `packages`.
    pub fn write<I, S>(&self, packages: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        std::fs::write(&self.path, render(packages))
            .with_context(|| format!("Failed to write {}", self.path.display()))
    }

    /// Adds `packages` to the existing requirements. Returns the total count.
    pub fn merge<I, S>(&self, packages: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut all: BTreeSet<String> = self.read()?.into_iter().collect();
        all.extend(packages.into_iter().map(|p| p.as_ref().to_string()));
        self.write(&all)?;
        Ok(all.len())
    }

    /// Drops `package` from the requirements. Returns true if it was listed.
    pub fn remove(&self, package: &str) -> Result<bool> {
        let current = self.read()?;
        if !current.iter().any(|line| package_name(line) == package) {
            return Ok(false);
        }
        let kept: Vec<&String> = current
            .iter()
            .filter(|line| package_name(line) != package)
            .collect();
        self.write(kept)?;
        Ok(true)
    }
}
