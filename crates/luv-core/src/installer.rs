//! Bounded, failure-tolerant installation of a requirements list.

use crate::package_manager::{InstallState, InstallStatus, PackageManager};
use crate::requirements::package_name;
use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::fmt;
use std::sync::Arc;

/// Upper bound on concurrent `tlmgr install` processes.
pub const INSTALL_CONCURRENCY: usize = 4;

/// Maps a name the repository did not know to a better candidate
/// (typically the package name resolver).
pub type NameFallback = Arc<dyn Fn(&str) -> Option<String> + Send + Sync>;

/// A package that could not be installed, with the reason.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallFailure {
    pub name: String,
    pub reason: String,
}

#[derive(Debug, Default)]
pub struct InstallReport {
    /// Successful installs, sorted by requested name.
    pub installed: Vec<InstallStatus>,
    /// Failures, sorted by requested name.
    pub failed: Vec<InstallFailure>,
}

impl InstallReport {
    pub fn is_success(&self) -> bool {
        self.failed.is_empty()
    }
}

#[derive(Clone)]
pub struct Installer {
    manager: PackageManager,
    fallback: Option<NameFallback>,
    concurrency: usize,
}

impl fmt::Debug for Installer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Installer")
            .field("manager", &self.manager)
            .field("fallback", &self.fallback.is_some())
            .field("concurrency", &self.concurrency)
            .finish()
    }
}

impl Installer {
    pub fn new(manager: PackageManager) -> Self {
        Self {
            manager,
            fallback: None,
            concurrency: INSTALL_CONCURRENCY,
        }
    }

    pub fn with_fallback(mut self, fallback: NameFallback) -> Self {
        self.fallback = Some(fallback);
        self
    }

    /// Installs `name`; if the repository rejects it, retries once with the
    /// fallback's suggestion.
    pub fn install_one(&self, name: &str) -> Result<InstallStatus> {
        log::info!("Installing package: {}", name);
        let status = self.manager.install(name)?;
        if status.state.is_success() {
            log_status(&status);
            return Ok(status);
        }

        let Some(fallback) = &self.fallback else {
            return Ok(status);
        };

        log::info!("Package {} not found, searching for it...", name);
        match fallback(name) {
            Some(resolved) if resolved != name => {
                log::info!("Found {} in package: {}", name, resolved);
                let retried = self.manager.install(&resolved)?;
                log_status(&retried);
                Ok(retried)
            }
            _ => {
                log::warn!("Could not resolve package for: {}", name);
                Ok(status)
            }
        }
    }

    /// Installs every requirement with at most [`INSTALL_CONCURRENCY`]
    /// installs in flight. Version suffixes are stripped first.
    ///
    /// A failing package never stops the others; only a failure to prepare
    /// the user tree (e.g. tlmgr missing) is returned as an error.
    pub async fn install_all(&self, requirements: &[String]) -> Result<InstallReport> {
        let names: Vec<String> = requirements
            .iter()
            .map(|r| package_name(r).to_string())
            .filter(|n| !n.is_empty())
            .collect();
        if names.is_empty() {
            return Ok(InstallReport::default());
        }

        let manager = self.manager.clone();
        tokio::task::spawn_blocking(move || manager.init_user_tree()).await??;

        let limit = self.concurrency.min(names.len()).max(1);
        let results: Vec<(String, Result<InstallStatus>)> = stream::iter(names)
            .map(|name| {
                let installer = self.clone();
                async move {
                    let task_name = name.clone();
                    let result = tokio::task::spawn_blocking(move || installer.install_one(&task_name))
                        .await
                        .map_err(anyhow::Error::from)
                        .and_then(|r| r);
                    (name, result)
                }
            })
            .buffer_unordered(limit)
            .collect()
            .await;

        let mut report = InstallReport::default();
        for (name, result) in results {
            match result {
                Ok(status) if status.state.is_success() => report.installed.push(status),
                Ok(status) => {
                    let reason = match status.state {
                        InstallState::NotFound => "not present in repository".to_string(),
                        _ => status.message.unwrap_or_else(|| "installation failed".into()),
                    };
                    log::warn!("Could not install {}: {}", name, reason);
                    report.failed.push(InstallFailure { name, reason });
                }
                Err(e) => {
                    log::warn!("Failed to install {}: {:#}", name, e);
                    report.failed.push(InstallFailure {
                        name,
                        reason: format!("{:#}", e),
                    });
                }
            }
        }
        report.installed.sort_by(|a, b| a.name.cmp(&b.name));
        report.failed.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(report)
    }
}

fn log_status(status: &InstallStatus) {
    match status.state {
        InstallState::Complete => log::info!("Successfully installed {}", status.name),
        InstallState::AlreadyInstalled => {
            log::info!("Package {} is already installed", status.name)
        }
        InstallState::FontMapWarning => log::info!(
            "Package {} installed but font map update failed (this is usually OK)",
            status.name
        ),
        InstallState::NotFound | InstallState::Failed => {}
    }
}
