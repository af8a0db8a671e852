use crate::artifacts::ArtifactPaths;
use anyhow::Result;
use luv_core::config::{Engine, ProjectConfig};
use luv_core::environment::LatexEnvironment;
use luv_core::process::{is_not_found, CommandExecutor, Invocation, RealCommandExecutor};
use luv_core::LuvError;
use std::io;
use std::path::{Path, PathBuf};
use std::process::Output;
use std::sync::Arc;

/// A Compiler holds what is needed to run the TeX engine and its helper
/// tools against one project.
///
/// Every tool runs from the project root with `TEXMFHOME` pointing at the
/// project's private tree.
#[derive(Debug, Clone)]
pub struct Compiler {
    engine: Engine,
    project_root: PathBuf,
    texfile: String,
    output_dir: String,
    texmf_home: PathBuf,
    executor: Arc<dyn CommandExecutor>,
}

impl Compiler {
    pub fn new(
        engine: Engine,
        project_root: impl Into<PathBuf>,
        texfile: &str,
        output_dir: &str,
        texmf_home: impl Into<PathBuf>,
    ) -> Self {
        Self {
            engine,
            project_root: project_root.into(),
            texfile: texfile.to_string(),
            output_dir: output_dir.to_string(),
            texmf_home: texmf_home.into(),
            executor: Arc::new(RealCommandExecutor),
        }
    }

    pub fn from_environment(env: &LatexEnvironment, config: &ProjectConfig) -> Self {
        Self::new(
            config.project.engine,
            env.project_root(),
            &config.project.texfile,
            &config.project.output_dir,
            env.texmf_dir(),
        )
    }

    pub fn with_executor(mut self, executor: Arc<dyn CommandExecutor>) -> Self {
        self.executor = executor;
        self
    }

    pub fn engine(&self) -> Engine {
        self.engine
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn texfile(&self) -> &str {
        &self.texfile
    }

    pub fn texmf_home(&self) -> &Path {
        &self.texmf_home
    }

    pub fn artifacts(&self) -> ArtifactPaths {
        ArtifactPaths::new(
            &self.project_root,
            &self.output_dir,
            &self.texfile,
            self.engine.output_extension(),
        )
    }

    /// `<engine> -interaction=nonstopmode -output-directory=<out> <texfile>`
    pub fn engine_invocation(&self) -> Invocation {
        self.tool_invocation(self.engine.program()).args([
            "-interaction=nonstopmode".to_string(),
            format!("-output-directory={}", self.output_dir),
            self.texfile.clone(),
        ])
    }

    /// Bare invocation of `program` in the project's environment.
    pub fn tool_invocation(&self, program: impl Into<PathBuf>) -> Invocation {
        Invocation::new(program)
            .current_dir(&self.project_root)
            .env("TEXMFHOME", self.texmf_home.as_os_str())
    }

    /// Runs one engine pass. A missing engine binary is a user error.
    pub fn run_engine(&self) -> Result<Output> {
        let invocation = self.engine_invocation();
        self.executor.execute(&invocation).map_err(|e| {
            if is_not_found(&e) {
                LuvError::engine_missing(self.engine.program()).into()
            } else {
                anyhow::Error::new(e).context(format!("Failed to run {}", invocation))
            }
        })
    }

    /// Runs a helper tool; the raw I/O error is left to the caller.
    pub fn run_tool(&self, invocation: &Invocation) -> io::Result<Output> {
        self.executor.execute(invocation)
    }
}
