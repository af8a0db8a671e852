//! The compile pass state machine.
//!
//! A document with both a bibliography and citations gets four passes:
//!
//! 1. engine, to write the `.aux` file
//! 2. bibliography processor, only if the `.aux` file exists
//! 3. engine, to pull in the bibliography
//! 4. engine, to settle cross-references
//!
//! Everything else gets a single engine pass. Passes 1, 3 and 4 are judged by
//! whether the output document exists, not by exit code; engines exit
//! non-zero for recoverable problems all the time. A failing pass 2 only
//! produces a warning.

use crate::bibliography::{BibBackend, BibliographyNeeds};
use crate::compiler::Compiler;
use crate::warnings::{self, Advisory};
use anyhow::{Context, Result};
use luv_core::process::{
    captured_streams, find_program, is_executable, is_not_found, tail, Invocation,
};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Output;

/// Characters of each stream kept when a multi-pass compile fails.
pub const DIAGNOSTIC_TAIL: usize = 1000;

/// Characters of each stream logged when the bibliography processor fails.
const BIBLIOGRAPHY_TAIL: usize = 500;

const FATAL_MARKERS: &[&str] = &["Fatal error", "Emergency stop"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Single,
    Initial,
    Bibliography,
    Resolve,
    Final,
}

impl Pass {
    pub fn number(self) -> u8 {
        match self {
            Pass::Single | Pass::Initial => 1,
            Pass::Bibliography => 2,
            Pass::Resolve => 3,
            Pass::Final => 4,
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Pass::Single => "Compilation",
            Pass::Initial => "Initial compilation",
            Pass::Bibliography => "Processing bibliography",
            Pass::Resolve => "Resolving references",
            Pass::Final => "Final compilation",
        }
    }
}

impl fmt::Display for Pass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pass::Single => f.write_str("Single pass"),
            other => write!(f, "Pass {}", other.number()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SequenceState {
    #[default]
    Unstarted,
    Running(Pass),
    Succeeded,
    Failed(Pass),
}

/// Which sequence a document gets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompileMode {
    SinglePass,
    WithBibliography(BibBackend),
}

/// A failed engine pass and the output that explains it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PassFailure {
    pub pass: Pass,
    pub reason: String,
    pub stdout: String,
    pub stderr: String,
}

impl fmt::Display for PassFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.reason)?;
        writeln!(f, "STDOUT: {}", self.stdout)?;
        write!(f, "STDERR: {}", self.stderr)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompileReport {
    pub mode: CompileMode,
    /// Passes actually started, in order.
    pub passes: Vec<Pass>,
    pub state: SequenceState,
    pub failure: Option<PassFailure>,
    /// Non-fatal bibliography problems.
    pub bibliography_warnings: Vec<String>,
    /// Advisories from the last engine pass.
    pub advisories: Vec<Advisory>,
}

impl CompileReport {
    fn new(mode: CompileMode) -> Self {
        Self {
            mode,
            passes: Vec::new(),
            state: SequenceState::Unstarted,
            failure: None,
            bibliography_warnings: Vec::new(),
            advisories: Vec::new(),
        }
    }

    pub fn is_success(&self) -> bool {
        self.state == SequenceState::Succeeded
    }

    fn start(&mut self, pass: Pass) {
        log::info!("  {}: {}...", pass, pass.description());
        self.passes.push(pass);
        self.state = SequenceState::Running(pass);
    }

    fn fail(&mut self, failure: PassFailure) {
        self.state = SequenceState::Failed(failure.pass);
        self.failure = Some(failure);
    }

    fn bibliography_warning(&mut self, message: String) {
        log::warn!("{}", message);
        self.bibliography_warnings.push(message);
    }
}

/// First usable biber: `PATH`, then the project texmf tree, then `.luv/bin`.
pub fn locate_biber(texmf_home: &Path, bin_dir: &Path) -> Option<PathBuf> {
    find_program("biber").or_else(|| {
        [
            texmf_home.join("scripts").join("biber").join("biber"),
            bin_dir.join("biber"),
        ]
        .into_iter()
        .find(|p| is_executable(p))
    })
}

fn exit_code(output: &Output) -> String {
    output
        .status
        .code()
        .map_or_else(|| "none".to_string(), |c| c.to_string())
}

/// Drives a [`Compiler`] through the pass sequence.
#[derive(Debug, Clone)]
pub struct CompilationSequencer {
    compiler: Compiler,
    biber: Option<PathBuf>,
}

impl CompilationSequencer {
    /// Uses `biber` if given; `None` means biber is unavailable.
    pub fn new(compiler: Compiler, biber: Option<PathBuf>) -> Self {
        Self { compiler, biber }
    }

    pub fn compiler(&self) -> &Compiler {
        &self.compiler
    }

    /// Empties the output directory, keeping the directory itself.
    pub fn clean_output(&self) -> Result<()> {
        let dir = self.compiler.artifacts().output_path();
        if !dir.exists() {
            return Ok(());
        }
        log::info!("Cleaning build directory...");
        let entries =
            fs::read_dir(&dir).with_context(|| format!("Failed to read {}", dir.display()))?;
        for entry in entries {
            let path = entry?.path();
            let removed = if path.is_dir() {
                fs::remove_dir_all(&path)
            } else {
                fs::remove_file(&path)
            };
            removed.with_context(|| format!("Failed to remove {}", path.display()))?;
        }
        Ok(())
    }

    /// Inspects the entry file and picks the sequence.
    pub fn plan(&self) -> Result<CompileMode> {
        let entry = self.compiler.project_root().join(self.compiler.texfile());
        let bytes = fs::read(&entry).with_context(|| format!("Failed to read {}", entry.display()))?;
        let text = String::from_utf8_lossy(&bytes);

        let needs = BibliographyNeeds::detect(&text, self.compiler.project_root());
        Ok(if needs.needs_multipass() {
            CompileMode::WithBibliography(needs.backend)
        } else {
            CompileMode::SinglePass
        })
    }

    /// Compiles the document. `Err` is reserved for environment problems
    /// such as a missing engine; a document that fails to build yields a
    /// report in the `Failed` state.
    pub fn run(&self) -> Result<CompileReport> {
        let mode = self.plan()?;
        let output_dir = self.compiler.artifacts().output_path();
        fs::create_dir_all(&output_dir)
            .with_context(|| format!("Failed to create {}", output_dir.display()))?;

        log::info!(
            "Compiling {} with {}...",
            self.compiler.texfile(),
            self.compiler.engine()
        );
        let mut report = CompileReport::new(mode);
        match mode {
            CompileMode::SinglePass => {
                log::info!("No bibliography detected, running single pass...");
                self.run_single(&mut report)?;
            }
            CompileMode::WithBibliography(backend) => {
                log::info!("Bibliography detected, running full compilation sequence...");
                self.run_sequence(backend, &mut report)?;
            }
        }
        Ok(report)
    }

    fn run_single(&self, report: &mut CompileReport) -> Result<()> {
        report.start(Pass::Single);
        let output = self.compiler.run_engine()?;
        let (stdout, stderr) = captured_streams(&output);

        if output.status.success() {
            report.advisories = warnings::scan(&stdout);
            report.state = SequenceState::Succeeded;
        } else {
            report.fail(PassFailure {
                pass: Pass::Single,
                reason: "Compilation failed!".to_string(),
                stdout,
                stderr,
            });
        }
        Ok(())
    }

    fn run_sequence(&self, backend: BibBackend, report: &mut CompileReport) -> Result<()> {
        if self.compile_pass(Pass::Initial, report)?.is_none() {
            return Ok(());
        }

        if self.compiler.artifacts().aux_exists() {
            self.bibliography_pass(backend, report);
        } else {
            log::info!("  No .aux file found, skipping {}", backend);
        }

        if self.compile_pass(Pass::Resolve, report)?.is_none() {
            return Ok(());
        }

        if let Some(stdout) = self.compile_pass(Pass::Final, report)? {
            report.advisories = warnings::scan(&stdout);
            report.state = SequenceState::Succeeded;
        }
        Ok(())
    }

    /// Runs one engine pass of the sequence. Returns its stdout on success;
    /// on failure records it in `report` and returns `None`.
    fn compile_pass(&self, pass: Pass, report: &mut CompileReport) -> Result<Option<String>> {
        report.start(pass);
        let output = self.compiler.run_engine()?;
        let (stdout, stderr) = captured_streams(&output);
        let artifacts = self.compiler.artifacts();

        let reason = if !artifacts.document_exists() {
            format!(
                "LaTeX pass failed - no {} generated (return code {})",
                self.compiler.engine().output_extension().to_uppercase(),
                exit_code(&output)
            )
        } else if FATAL_MARKERS.iter().any(|m| stdout.contains(m)) {
            format!(
                "LaTeX pass failed with fatal error (return code {})",
                exit_code(&output)
            )
        } else {
            log::info!("  {} completed successfully", pass);
            return Ok(Some(stdout));
        };

        report.fail(PassFailure {
            pass,
            reason,
            stdout: tail(&stdout, DIAGNOSTIC_TAIL).to_string(),
            stderr: tail(&stderr, DIAGNOSTIC_TAIL).to_string(),
        });
        Ok(None)
    }

    fn bibliography_pass(&self, backend: BibBackend, report: &mut CompileReport) {
        report.start(Pass::Bibliography);
        let artifacts = self.compiler.artifacts();

        let invocation = match (backend, &self.biber) {
            (BibBackend::Biber, Some(biber)) => self
                .compiler
                .tool_invocation(biber)
                .arg(artifacts.biber_arg()),
            (BibBackend::Biber, None) => {
                report.bibliography_warning(
                    "biber not found; falling back to bibtex. bibtex does not understand \
                     biblatex data, so the bibliography may be incomplete. Install biber \
                     for full biblatex support."
                        .to_string(),
                );
                self.bibtex_invocation()
            }
            (BibBackend::Bibtex, _) => self.bibtex_invocation(),
        };
        let tool = invocation.program_name();

        match self.compiler.run_tool(&invocation) {
            Ok(output) if output.status.success() => {
                log::info!("  {} completed successfully", Pass::Bibliography);
            }
            Ok(output) => {
                let (stdout, stderr) = captured_streams(&output);
                log::debug!("{} STDOUT: {}", tool, tail(&stdout, BIBLIOGRAPHY_TAIL));
                log::debug!("{} STDERR: {}", tool, tail(&stderr, BIBLIOGRAPHY_TAIL));
                report.bibliography_warning(format!(
                    "{} failed with return code {}, continuing...",
                    tool,
                    exit_code(&output)
                ));
            }
            Err(e) if is_not_found(&e) => {
                report.bibliography_warning(format!(
                    "{} not found, skipping bibliography processing",
                    tool
                ));
            }
            Err(e) => {
                report.bibliography_warning(format!("Failed to run {}: {}", tool, e));
            }
        }
    }

    fn bibtex_invocation(&self) -> Invocation {
        self.compiler
            .tool_invocation(BibBackend::Bibtex.program())
            .arg(self.compiler.artifacts().bibtex_arg())
    }
}
