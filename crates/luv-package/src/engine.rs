use crate::catalog::PatternCatalog;
use crate::include::{DocumentTree, FsSource, IncludeWalker, SourceProvider};
use crate::resolver::PackageNameResolver;
use anyhow::Result;
use futures::stream::{self, StreamExt};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Maximum number of name lookups in flight.
pub const RESOLVE_CONCURRENCY: usize = 8;

/// Packages biblatex loads at runtime that are easy to miss.
pub const BIBLATEX_COMPANIONS: &[&str] = &["logreq", "etoolbox"];

static USEPACKAGE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\usepackage(?:\[[^\]]*\])?\{([^}]+)\}").expect("usepackage regex")
});

/// Names loaded with `\usepackage[opts]{a, b}` in `text`, in order.
pub fn explicit_packages(text: &str) -> Vec<String> {
    USEPACKAGE
        .captures_iter(text)
        .filter_map(|cap| cap.get(1))
        .flat_map(|m| m.as_str().split(','))
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}

/// What a resolution found, for display or `--json` output.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ResolutionReport {
    pub explicit: Vec<String>,
    pub inferred: Vec<String>,
    /// Identifier to canonical name, for identifiers that resolved at all.
    pub mappings: BTreeMap<String, String>,
    /// Set when biblatex pulled its companions into the inferred set.
    pub biblatex_companions: Vec<String>,
    pub packages: Vec<String>,
}

/// Detects the packages a document needs and resolves their installable names.
///
/// State is rebuilt from scratch by every [`resolve`](Self::resolve) call.
pub struct DependencyResolver {
    project_root: PathBuf,
    source: Arc<dyn SourceProvider>,
    catalog: PatternCatalog,
    resolver: PackageNameResolver,
    explicit: BTreeSet<String>,
    inferred: BTreeSet<String>,
    mappings: BTreeMap<String, String>,
    companions_added: bool,
    resolved: Vec<String>,
}

impl DependencyResolver {
    pub fn new(project_root: impl Into<PathBuf>, resolver: PackageNameResolver) -> Self {
        Self {
            project_root: project_root.into(),
            source: Arc::new(FsSource),
            catalog: PatternCatalog::builtin().clone(),
            resolver,
            explicit: BTreeSet::new(),
            inferred: BTreeSet::new(),
            mappings: BTreeMap::new(),
            companions_added: false,
            resolved: Vec::new(),
        }
    }

    pub fn with_source(mut self, source: Arc<dyn SourceProvider>) -> Self {
        self.source = source;
        self
    }

    pub fn with_catalog(mut self, catalog: PatternCatalog) -> Self {
        self.catalog = catalog;
        self
    }

    pub fn project_root(&self) -> &Path {
        &self.project_root
    }

    pub fn explicit(&self) -> &BTreeSet<String> {
        &self.explicit
    }

    pub fn inferred(&self) -> &BTreeSet<String> {
        &self.inferred
    }

    pub fn mappings(&self) -> &BTreeMap<String, String> {
        &self.mappings
    }

    pub fn companions_added(&self) -> bool {
        self.companions_added
    }

    /// True if the project root holds its own `<package>.sty`.
    pub fn has_local_override(&self, package: &str) -> bool {
        self.source
            .exists(&self.project_root.join(format!("{}.sty", package)))
    }

    /// Walks the include graph from `entry_file` (relative to the root).
    pub fn document_tree(&self, entry_file: &str) -> DocumentTree {
        IncludeWalker::new(&self.project_root, self.source.as_ref()).walk(entry_file)
    }

    /// Fills the explicit and inferred sets from `tree`, replacing any
    /// previous contents.
    pub fn scan(&mut self, tree: &DocumentTree) {
        self.explicit.clear();
        self.inferred.clear();
        self.mappings.clear();
        self.companions_added = false;
        self.resolved.clear();

        for text in tree.texts() {
            for name in explicit_packages(text) {
                if !self.has_local_override(&name) {
                    self.explicit.insert(name);
                }
            }
        }

        for entry in self.catalog.entries() {
            if self.explicit.contains(&entry.package) || self.has_local_override(&entry.package) {
                continue;
            }
            if tree.texts().any(|text| entry.matches(text)) {
                self.inferred.insert(entry.package.clone());
            }
        }

        log::debug!(
            "Scanned {} files: {} explicit, {} inferred",
            tree.files.len(),
            self.explicit.len(),
            self.inferred.len()
        );
    }

    /// Scans the document rooted at `entry_file` and returns the sorted,
    /// deduplicated names that need installing.
    ///
    /// Name lookups run concurrently; a lookup that fails is logged and
    /// left out without affecting the others.
    pub async fn resolve(&mut self, entry_file: &str) -> Vec<String> {
        let tree = self.document_tree(entry_file);
        self.scan(&tree);

        let candidates: Vec<String> = self.explicit.union(&self.inferred).cloned().collect();
        if candidates.is_empty() {
            return Vec::new();
        }

        log::info!("Resolving {} package names...", candidates.len());
        let limit = RESOLVE_CONCURRENCY.min(candidates.len());
        let resolver = self.resolver.clone();
        let results: Vec<(String, Result<Option<String>>)> = stream::iter(candidates.clone())
            .map(|name| {
                let resolver = resolver.clone();
                async move {
                    let id = name.clone();
                    let result = tokio::task::spawn_blocking(move || resolver.resolve_name(&id))
                        .await
                        .map_err(anyhow::Error::from)
                        .and_then(|r| r);
                    (name, result)
                }
            })
            .buffer_unordered(limit)
            .collect()
            .await;

        let mut resolved = BTreeSet::new();
        for (name, result) in results {
            match result {
                Ok(Some(canonical)) => {
                    self.mappings.insert(name, canonical.clone());
                    resolved.insert(canonical);
                }
                Ok(None) => log::debug!("{} ships with the kernel", name),
                Err(e) => log::warn!("Could not resolve {}: {:#}", name, e),
            }
        }

        if candidates.iter().any(|c| c == "biblatex") {
            for companion in BIBLATEX_COMPANIONS {
                self.inferred.insert(companion.to_string());
            }
            self.companions_added = true;
        }

        self.resolved = resolved.into_iter().collect();
        self.resolved.clone()
    }

    /// Summary of the last [`resolve`](Self::resolve) call.
    pub fn report(&self) -> ResolutionReport {
        ResolutionReport {
            explicit: self.explicit.iter().cloned().collect(),
            inferred: self.inferred.iter().cloned().collect(),
            mappings: self.mappings.clone(),
            biblatex_companions: if self.companions_added {
                BIBLATEX_COMPANIONS.iter().map(|s| s.to_string()).collect()
            } else {
                Vec::new()
            },
            packages: self.resolved.clone(),
        }
    }
}
