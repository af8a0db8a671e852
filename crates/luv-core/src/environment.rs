//! Project-local LaTeX environment layout.
//!
//! ```text
//! <project>/
//! ├── luv.toml                 project manifest
//! ├── latex-requirements.txt   package requirements
//! └── .luv/
//!     ├── bin/
//!     ├── cache/
//!     └── texmf/               TEXMFHOME for tlmgr and the engines
//!         └── tex/latex/
//! ```

use crate::config::{ProjectConfig, CONFIG_FILE_NAME};
use crate::error::LuvError;
use crate::requirements::{RequirementsFile, REQUIREMENTS_FILE_NAME};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

pub const ENV_DIR_NAME: &str = ".luv";

/// Paths and lifecycle of a project's isolated environment.
#[derive(Debug, Clone)]
pub struct LatexEnvironment {
    project_root: PathBuf,
    luv_dir: PathBuf,
    texmf_dir: PathBuf,
}

impl LatexEnvironment {
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let luv_dir = project_root.join(ENV_DIR_NAME);
        let texmf_dir = luv_dir.join("texmf");
        Self {
            project_root,
            luv_dir,
            texmf_dir,
        }
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn luv_dir(&self) -> &Path {
        &self.luv_dir
    }

    /// The directory exported as `TEXMFHOME`.
    pub fn texmf_dir(&self) -> &Path {
        &self.texmf_dir
    }

    pub fn packages_dir(&self) -> PathBuf {
        self.texmf_dir.join("tex").join("latex")
    }

    pub fn bin_dir(&self) -> PathBuf {
        self.luv_dir.join("bin")
    }

    pub fn config_path(&self) -> PathBuf {
        self.project_root.join(CONFIG_FILE_NAME)
    }

    pub fn requirements(&self) -> RequirementsFile {
        RequirementsFile::new(self.project_root.join(REQUIREMENTS_FILE_NAME))
    }

    pub fn exists(&self) -> bool {
        self.luv_dir.is_dir() && self.texmf_dir.is_dir()
    }

    /// Fails with [`LuvError::EnvironmentMissing`] unless the environment exists.
    pub fn ensure_exists(&self) -> Result<()> {
        if self.exists() {
            Ok(())
        } else {
            Err(LuvError::EnvironmentMissing.into())
        }
    }

    /// Creates the `.luv` tree plus a default manifest and requirements file
    /// when they are absent.
    pub fn create(&self) -> Result<()> {
        if self.exists() {
            return Err(LuvError::EnvironmentExists(self.luv_dir.clone()).into());
        }

        log::info!("Creating LaTeX environment at {}", self.luv_dir.display());
        for dir in [self.packages_dir(), self.bin_dir(), self.luv_dir.join("cache")] {
            std::fs::create_dir_all(&dir)
                .with_context(|| format!("Failed to create {}", dir.display()))?;
        }

        let config_path = self.config_path();
        if !config_path.exists() {
            ProjectConfig::default().save(&config_path)?;
            log::info!("Created {}", config_path.display());
        }

        let requirements = self.requirements();
        if !requirements.exists() {
            requirements.write_template()?;
            log::info!("Created {}", requirements.path().display());
        }
        Ok(())
    }

    /// Deletes the `.luv` tree. Manifests are left alone.
    pub fn clean(&self) -> Result<()> {
        if !self.exists() {
            return Err(LuvError::EnvironmentMissing.into());
        }
        std::fs::remove_dir_all(&self.luv_dir)
            .with_context(|| format!("Failed to remove {}", self.luv_dir.display()))?;
        log::info!("Cleaned environment at {}", self.luv_dir.display());
        Ok(())
    }

    pub fn config(&self) -> Result<ProjectConfig> {
        ProjectConfig::load(&self.config_path())
    }

    pub fn save_config(&self, config: &ProjectConfig) -> Result<()> {
        config.save(&self.config_path())
    }

    /// Absolute path of the configured entry file, checked for existence.
    pub fn entry_file(&self, config: &ProjectConfig) -> Result<PathBuf> {
        let path = self.project_root.join(&config.project.texfile);
        if path.is_file() {
            Ok(path)
        } else {
            Err(LuvError::EntryFileNotFound(PathBuf::from(&config.project.texfile)).into())
        }
    }
}

/// Walks up from `start` looking for a directory that holds `luv.toml`.
pub fn find_project_root(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|dir| dir.join(CONFIG_FILE_NAME).is_file())
        .map(Path::to_path_buf)
}
