//! Subcommands of the `luv` binary.
//!
//! Each command returns `Ok(ExitCode::FAILURE)` for failures it has already
//! reported; `Err` is left to the top level to print.

use anyhow::Result;
use clap::Subcommand;
use luv_core::config::ProjectConfig;
use luv_core::environment::{find_project_root, LatexEnvironment};
use luv_core::package_manager::PackageManager;
use luv_core::LuvError;
use luv_package::resolver::PackageNameResolver;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

mod add;
mod clean;
mod compile;
mod info;
mod init;
mod remove;
mod resolve;
mod sync;

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new LaTeX project in the current directory
    Init(init::InitCommand),
    /// Detect the packages the document needs
    Resolve(resolve::ResolveCommand),
    /// Install every package listed in latex-requirements.txt
    Sync,
    /// Install packages and add them to latex-requirements.txt
    Add(add::AddCommand),
    /// Remove packages from the environment
    Remove(remove::RemoveCommand),
    /// Delete the project's .luv environment
    Clean,
    /// Compile the document
    Compile(compile::CompileCommand),
    /// Show project configuration and packages
    Info,
}

impl Commands {
    /// Runs the command. Synchronous commands run on the blocking pool so
    /// the caller's task stays free to observe Ctrl-C.
    pub async fn execute(self) -> Result<ExitCode> {
        match self {
            Commands::Init(cmd) => blocking(move || cmd.execute()).await,
            Commands::Resolve(cmd) => cmd.execute(&Project::discover()?).await,
            Commands::Sync => sync::execute(&Project::discover()?).await,
            Commands::Add(cmd) => blocking(move || cmd.execute(&Project::discover()?)).await,
            Commands::Remove(cmd) => blocking(move || cmd.execute(&Project::discover()?)).await,
            Commands::Clean => blocking(|| clean::execute(&Project::discover()?)).await,
            Commands::Compile(cmd) => blocking(move || cmd.execute(&Project::discover()?)).await,
            Commands::Info => blocking(|| info::execute(&Project::discover()?)).await,
        }
    }
}

async fn blocking<F>(command: F) -> Result<ExitCode>
where
    F: FnOnce() -> Result<ExitCode> + Send + 'static,
{
    tokio::task::spawn_blocking(command).await?
}

/// An existing project found from the working directory.
pub struct Project {
    pub root: PathBuf,
    pub env: LatexEnvironment,
    pub config: ProjectConfig,
}

impl Project {
    pub fn discover() -> Result<Self> {
        let cwd = std::env::current_dir()?;
        let root = find_project_root(&cwd).ok_or(LuvError::ProjectNotFound)?;
        let env = LatexEnvironment::new(&root);
        let config = env.config()?;
        Ok(Self { root, env, config })
    }

    pub fn package_manager(&self) -> PackageManager {
        PackageManager::detect(self.env.texmf_dir())
    }

    pub fn name_resolver(&self, manager: &PackageManager) -> PackageNameResolver {
        PackageNameResolver::new(Arc::new(manager.clone()))
    }
}
