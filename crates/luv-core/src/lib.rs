//! # luv Core
//!
//! Project environments and package management for luv, the LaTeX project
//! virtualizer.
//!
//! ## Overview
//!
//! A luv project is a directory holding a `luv.toml` manifest, a
//! `latex-requirements.txt` package list and a private TeX tree under
//! `.luv/texmf`. This crate owns everything about that layout and about
//! talking to the package manager that fills the private tree. Dependency
//! detection lives in `luv-package`, compilation in `luv-build`.
//!
//! ## Modules
//!
//! - [`environment`] - The `.luv` directory layout and project discovery
//! - [`config`] - The `luv.toml` manifest
//! - [`requirements`] - The `latex-requirements.txt` manifest
//! - [`package_manager`] - `tlmgr` user-mode backend behind a trait
//! - [`installer`] - Bounded concurrent installation of a requirements list
//! - [`process`] - The [`CommandExecutor`](process::CommandExecutor) seam used for every external tool
//! - [`error`] - [`LuvError`](error::LuvError), the user/environment error kind
//!
//! ## Design Philosophy
//!
//! - **Testability**: All external commands run through a mockable executor
//! - **Best effort where it is safe**: lookups degrade to pass-through, never abort
//! - **Loud where it is not**: a missing tool or manifest is a typed user error
//!
//! ## Examples
//!
//! ```no_run
//! use luv_core::environment::LatexEnvironment;
//! use luv_core::package_manager::PackageManager;
//!
//! let env = LatexEnvironment::new(".");
//! env.create()?;
//!
//! let pm = PackageManager::detect(env.texmf_dir());
//! pm.install("booktabs")?;
//! # Ok::<(), anyhow::Error>(())
//! ```
//!
//! ## Feature Flags
//!
//! - `test-utils` - exports [`testing`], scripted executors for downstream tests

pub mod config;
pub mod environment;
pub mod error;
pub mod installer;
pub mod package_manager;
pub mod process;
pub mod requirements;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use error::LuvError;
