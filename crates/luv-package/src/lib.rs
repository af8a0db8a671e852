//! # luv Package
//!
//! Works out which LaTeX packages a project needs.
//!
//! A [`DependencyResolver`](engine::DependencyResolver) walks the include
//! graph of the entry file ([`include`]), collects `\usepackage` targets,
//! infers further packages from usage signatures ([`catalog`]) and maps every
//! candidate to the distribution package that ships it ([`resolver`]).
//!
//! ```no_run
//! use luv_core::package_manager::PackageManager;
//! use luv_package::engine::DependencyResolver;
//! use luv_package::resolver::PackageNameResolver;
//! use std::path::Path;
//! use std::sync::Arc;
//!
//! # async fn run() {
//! let pm = PackageManager::detect(Path::new(".luv/texmf"));
//! let mut deps = DependencyResolver::new(".", PackageNameResolver::new(Arc::new(pm)));
//! let packages = deps.resolve("main.tex").await;
//! # }
//! ```

pub mod catalog;
pub mod engine;
pub mod include;
pub mod resolver;

pub use engine::{DependencyResolver, ResolutionReport};
pub use resolver::{PackageLookup, PackageNameResolver, ResolutionCache};
