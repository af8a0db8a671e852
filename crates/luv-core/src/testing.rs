//! Test doubles shared by the luv crates.
//!
//! Enabled for this crate's own tests and, through the `test-utils` feature,
//! for the dev-dependencies of `luv-package`, `luv-build` and `luv-cli`.

use crate::process::{CommandExecutor, Invocation};
use std::fmt;
use std::io;
use std::process::{ExitStatus, Output};
use std::sync::Mutex;

/// Builds a fake process result.
pub fn output(status_code: i32, stdout: &str, stderr: &str) -> Output {
    #[cfg(unix)]
    let status = {
        use std::os::unix::process::ExitStatusExt;
        ExitStatus::from_raw(status_code << 8)
    };
    #[cfg(windows)]
    let status = {
        use std::os::windows::process::ExitStatusExt;
        ExitStatus::from_raw(status_code as u32)
    };

    Output {
        status,
        stdout: stdout.as_bytes().to_vec(),
        stderr: stderr.as_bytes().to_vec(),
    }
}

/// An `io::Error` as produced when the program does not exist.
pub fn not_found() -> io::Error {
    io::Error::new(io::ErrorKind::NotFound, "program not found")
}

type Handler = Box<dyn Fn(&Invocation) -> io::Result<Output> + Send + Sync>;

/// Executor that answers every invocation from a closure and records what was
/// asked of it.
pub struct ScriptedExecutor {
    handler: Handler,
    calls: Mutex<Vec<Invocation>>,
}

impl ScriptedExecutor {
    pub fn new<F>(handler: F) -> Self
    where
        F: Fn(&Invocation) -> io::Result<Output> + Send + Sync + 'static,
    {
        Self {
            handler: Box::new(handler),
            calls: Mutex::new(Vec::new()),
        }
    }

    /// Executor that always returns the same result.
    pub fn fixed(status_code: i32, stdout: &str, stderr: &str) -> Self {
        let (stdout, stderr) = (stdout.to_string(), stderr.to_string());
        Self::new(move |_| Ok(output(status_code, &stdout, &stderr)))
    }

    /// Executor for which every program is missing.
    pub fn missing() -> Self {
        Self::new(|_| Err(not_found()))
    }

    pub fn calls(&self) -> Vec<Invocation> {
        self.calls.lock().map(|c| c.clone()).unwrap_or_default()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().map(|c| c.len()).unwrap_or_default()
    }

    /// Number of recorded invocations whose program name is `program`.
    pub fn count_program(&self, program: &str) -> usize {
        self.calls()
            .iter()
            .filter(|inv| inv.program_name() == program)
            .count()
    }
}

impl fmt::Debug for ScriptedExecutor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScriptedExecutor")
            .field("calls", &self.call_count())
            .finish()
    }
}

impl CommandExecutor for ScriptedExecutor {
    fn execute(&self, invocation: &Invocation) -> io::Result<Output> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push(invocation.clone());
        }
        (self.handler)(invocation)
    }
}
