//! Package manager abstraction for the project-local TeX tree.
//!
//! ## Overview
//!
//! luv installs packages with TeX Live's `tlmgr` in *user mode*: every call
//! runs with `TEXMFHOME` pointing at `<project>/.luv/texmf`, so packages land
//! in the project and never touch the system distribution.
//!
//! ```text
//! ┌─────────────────┐
//! │ PackageManager  │  ← High-level facade
//! └────────┬────────┘
//!          │ Arc<dyn PackageBackend>
//!          ▼
//! ┌──────────────────┐
//! │ PackageBackend   │  ← Trait defining backend interface
//! └────────┬─────────┘
//!    ┌─────┴──────┬──────────────┐
//! TlmgrBackend  NoOpBackend  (test backends)
//! ```
//!
//! All process calls go through [`CommandExecutor`](crate::process::CommandExecutor),
//! so the output classification below is unit tested without TeX Live.
//!
//! ## Outcome classification
//!
//! tlmgr's exit codes are not a reliable success signal in user mode:
//!
//! - "already installed" in either stream is a successful no-op,
//! - a failed `updmap` after files were installed still counts as installed,
//! - "not present in repository" means the name is wrong and the caller may
//!   retry with a resolved package name,
//! - "not installed" on removal is a successful no-op.
//!
//! ## Examples
//!
//! ```no_run
//! use luv_core::package_manager::PackageManager;
//! use std::path::Path;
//!
//! let pm = PackageManager::detect(Path::new(".luv/texmf"));
//! if pm.is_available() {
//!     let status = pm.install("pgf")?;
//!     println!("{}: {:?}", status.name, status.state);
//! }
//! # Ok::<(), anyhow::Error>(())
//! ```

use crate::error::LuvError;
use crate::process::{
    captured_streams, is_not_found, CommandExecutor, Invocation, RealCommandExecutor,
};
use anyhow::{Context, Result};
use log::{info, warn};
use once_cell::sync::OnceCell;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Arc;

/// The state of a package installation operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstallState {
    /// The package was installed by this call.
    Complete,
    /// tlmgr reported the package as already present.
    AlreadyInstalled,
    /// Files were installed but the font map update (`updmap`) failed.
    FontMapWarning,
    /// The repository has no package by that name.
    NotFound,
    /// The installation failed (see [`InstallStatus::message`] for details).
    Failed,
}

impl InstallState {
    pub fn is_success(self) -> bool {
        matches!(
            self,
            InstallState::Complete | InstallState::AlreadyInstalled | InstallState::FontMapWarning
        )
    }
}

/// The result of a package installation attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallStatus {
    /// The name of the package that was installed (or attempted).
    pub name: String,
    pub state: InstallState,
    /// Captured tool output, populated for failures.
    pub message: Option<String>,
}

impl InstallStatus {
    fn new(name: &str, state: InstallState) -> Self {
        Self {
            name: name.to_string(),
            state,
            message: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemoveState {
    Removed,
    /// Nothing to do: the package was not installed.
    NotInstalled,
    Failed,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoveStatus {
    pub name: String,
    pub state: RemoveState,
    pub message: Option<String>,
}

/// Trait defining the interface for TeX package manager backends.
///
/// # Thread Safety
///
/// Implementations must be `Send + Sync`; the installer drives one backend
/// from several worker tasks at once.
pub trait PackageBackend: std::fmt::Debug + Send + Sync {
    /// Prepares the user-mode tree. Idempotent.
    fn init_user_tree(&self) -> Result<()>;

    /// Installs the specified package into the user tree.
    ///
    /// # Errors
    ///
    /// Returns [`LuvError::ToolNotFound`] if the package manager is missing.
    fn install(&self, package: &str) -> Result<InstallStatus>;

    /// Removes the specified package from the user tree.
    fn remove(&self, package: &str) -> Result<RemoveStatus>;

    /// Searches the repository for packages shipping `file`.
    ///
    /// Returns the raw result text, or `None` when the search tool is
    /// unavailable or found nothing.
    fn search_file(&self, file: &str) -> Result<Option<String>>;

    /// Returns a human-readable name for this backend (e.g., "tlmgr").
    fn name(&self) -> &'static str;
}

/// Backend implementation for the TeX Live Manager (`tlmgr`) in user mode.
#[derive(Debug)]
pub struct TlmgrBackend {
    path: PathBuf,
    texmf_home: PathBuf,
    executor: Arc<dyn CommandExecutor>,
    user_tree: OnceCell<()>,
}

impl TlmgrBackend {
    /// Creates a new `TlmgrBackend` for the given executable and user tree.
    pub fn new(path: PathBuf, texmf_home: PathBuf) -> Self {
        Self::with_executor(path, texmf_home, Arc::new(RealCommandExecutor))
    }

    /// Creates a new `TlmgrBackend` with a custom executor (for testing).
    pub fn with_executor(
        path: PathBuf,
        texmf_home: PathBuf,
        executor: Arc<dyn CommandExecutor>,
    ) -> Self {
        Self {
            path,
            texmf_home,
            executor,
            user_tree: OnceCell::new(),
        }
    }

    fn invocation(&self, args: &[&str]) -> Invocation {
        Invocation::new(&self.path)
            .args(args.iter().copied())
            .env("TEXMFHOME", self.texmf_home.as_os_str())
    }

    fn run(&self, args: &[&str]) -> Result<Output> {
        let invocation = self.invocation(args);
        self.executor.execute(&invocation).map_err(|e| {
            if is_not_found(&e) {
                LuvError::tlmgr_missing().into()
            } else {
                anyhow::Error::new(e).context(format!("Failed to run {}", invocation))
            }
        })
    }
}

/// Success states shared by both install attempts.
fn classify_install(output: &Output) -> Option<InstallState> {
    let (stdout, stderr) = captured_streams(output);
    if output.status.success() {
        Some(InstallState::Complete)
    } else if stdout.contains("already installed") || stderr.contains("already installed") {
        Some(InstallState::AlreadyInstalled)
    } else if stderr.contains("updmap") && stdout.contains("install:") {
        Some(InstallState::FontMapWarning)
    } else {
        None
    }
}

impl PackageBackend for TlmgrBackend {
    fn init_user_tree(&self) -> Result<()> {
        self.user_tree
            .get_or_try_init(|| {
                let output = self.run(&["init-usertree"])?;
                let (_, stderr) = captured_streams(&output);
                if !output.status.success() && !stderr.contains("already exists") {
                    warn!("tlmgr init-usertree returned: {}", stderr.trim());
                }
                Ok::<(), anyhow::Error>(())
            })
            .map(|_| ())
    }

    fn install(&self, package: &str) -> Result<InstallStatus> {
        self.init_user_tree()?;

        // --no-depends-at-all sidesteps dependency and updmap trouble in user mode.
        let output = self.run(&["--usermode", "install", "--no-depends-at-all", package])?;
        if let Some(state) = classify_install(&output) {
            return Ok(InstallStatus::new(package, state));
        }

        info!("Trying alternative installation method for {}...", package);
        let output = self.run(&["--usermode", "install", package])?;
        if let Some(state) = classify_install(&output) {
            return Ok(InstallStatus::new(package, state));
        }

        let (stdout, stderr) = captured_streams(&output);
        if stderr.contains("not present in repository") {
            return Ok(InstallStatus::new(package, InstallState::NotFound));
        }

        Ok(InstallStatus {
            name: package.to_string(),
            state: InstallState::Failed,
            message: Some(format!("{}{}", stdout, stderr).trim().to_string()),
        })
    }

    fn remove(&self, package: &str) -> Result<RemoveStatus> {
        let output = self.run(&["--usermode", "remove", package])?;
        let (stdout, stderr) = captured_streams(&output);

        let (state, message) = if output.status.success() {
            (RemoveState::Removed, None)
        } else if stdout.contains("not installed") || stderr.contains("not installed") {
            (RemoveState::NotInstalled, None)
        } else {
            (
                RemoveState::Failed,
                Some(format!("{}{}", stdout, stderr).trim().to_string()),
            )
        };

        Ok(RemoveStatus {
            name: package.to_string(),
            state,
            message,
        })
    }

    fn search_file(&self, file: &str) -> Result<Option<String>> {
        let invocation = Invocation::new(&self.path).args(["search", "--global", "--file", file]);
        let output = match self.executor.execute(&invocation) {
            Ok(output) => output,
            Err(e) if is_not_found(&e) => return Ok(None),
            Err(e) => {
                return Err(e).with_context(|| format!("Failed to run {}", invocation));
            }
        };

        let (stdout, _) = captured_streams(&output);
        if !output.status.success() || stdout.trim().is_empty() {
            return Ok(None);
        }
        Ok(Some(stdout))
    }

    fn name(&self) -> &'static str {
        "tlmgr"
    }
}

/// A backend used when no package manager is detected.
///
/// Searches find nothing; anything that would modify the tree fails with
/// [`LuvError::ToolNotFound`].
#[derive(Debug)]
pub struct NoOpBackend;

impl PackageBackend for NoOpBackend {
    fn init_user_tree(&self) -> Result<()> {
        Err(LuvError::tlmgr_missing().into())
    }
    fn install(&self, _package: &str) -> Result<InstallStatus> {
        Err(LuvError::tlmgr_missing().into())
    }
    fn remove(&self, _package: &str) -> Result<RemoveStatus> {
        Err(LuvError::tlmgr_missing().into())
    }
    fn search_file(&self, _file: &str) -> Result<Option<String>> {
        Ok(None)
    }
    fn name(&self) -> &'static str {
        "none"
    }
}

/// High-level facade for package management operations.
///
/// `PackageManager` is cheaply cloneable (uses `Arc` internally) and can be
/// shared across worker tasks.
#[derive(Clone, Debug)]
pub struct PackageManager {
    backend: Arc<dyn PackageBackend>,
}

impl PackageManager {
    /// Detects `tlmgr` on `PATH` and binds it to the given user tree.
    pub fn detect(texmf_home: &Path) -> Self {
        if let Ok(path) = which::which("tlmgr") {
            info!("Detected tlmgr at {:?}", path);
            return Self {
                backend: Arc::new(TlmgrBackend::new(path, texmf_home.to_path_buf())),
            };
        }

        warn!("No package manager detected");
        Self {
            backend: Arc::new(NoOpBackend),
        }
    }

    /// Creates a new `PackageManager` with a specific backend (useful for testing).
    pub fn with_backend(backend: Arc<dyn PackageBackend>) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> Arc<dyn PackageBackend> {
        Arc::clone(&self.backend)
    }

    pub fn init_user_tree(&self) -> Result<()> {
        self.backend.init_user_tree()
    }

    pub fn install(&self, package: &str) -> Result<InstallStatus> {
        self.backend.install(package)
    }

    pub fn remove(&self, package: &str) -> Result<RemoveStatus> {
        self.backend.remove(package)
    }

    pub fn search_file(&self, file: &str) -> Result<Option<String>> {
        self.backend.search_file(file)
    }

    /// Checks if a valid package manager backend is available.
    pub fn is_available(&self) -> bool {
        self.backend.name() != "none"
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }
}

#[cfg(test)]
mod tests;
