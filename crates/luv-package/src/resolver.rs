//! Maps a package identifier to the distribution package that ships it.
//!
//! The lookup asks the package manager which package contains
//! `/<identifier>.sty` and picks the most plausible owner from the answer.
//! Every failure mode degrades to "use the identifier as-is".

use crate::catalog::is_core_package;
use anyhow::Result;
use dashmap::DashMap;
use luv_core::package_manager::PackageManager;
use std::collections::HashMap;
use std::sync::Arc;

/// Owners that appear in search output but are never the answer.
const IGNORED_OWNERS: &[&str] = &["tlmgr", "texlive-base"];

/// Answers "which package contains this file".
///
/// `Ok(None)` means the lookup could not answer (tool missing, non-zero exit,
/// nothing printed); the raw output is returned otherwise.
pub trait PackageLookup: Send + Sync {
    fn search_file(&self, file: &str) -> Result<Option<String>>;
}

impl PackageLookup for PackageManager {
    fn search_file(&self, file: &str) -> Result<Option<String>> {
        PackageManager::search_file(self, file)
    }
}

/// Fixed namespace for tests and offline use: file name to search output.
#[derive(Debug, Default, Clone)]
pub struct StaticLookup {
    answers: HashMap<String, String>,
}

impl StaticLookup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `owner` as the package containing `/<identifier>.sty`.
    pub fn with_owner(mut self, identifier: &str, owner: &str) -> Self {
        self.answers.insert(
            style_file(identifier),
            format!("{}:\n\ttexmf-dist/tex/latex/{}/{}.sty\n", owner, owner, identifier),
        );
        self
    }

    /// Registers raw search output for `/<identifier>.sty`.
    pub fn with_output(mut self, identifier: &str, output: &str) -> Self {
        self.answers.insert(style_file(identifier), output.to_string());
        self
    }
}

impl PackageLookup for StaticLookup {
    fn search_file(&self, file: &str) -> Result<Option<String>> {
        Ok(self.answers.get(file).cloned())
    }
}

/// The file searched for when resolving `identifier`.
pub fn style_file(identifier: &str) -> String {
    format!("/{}.sty", identifier)
}

/// Owner packages listed in `tlmgr search --file` output, in output order.
///
/// Owner lines are unindented and end with a colon; the indented lines under
/// them are file paths.
pub fn parse_search_output(output: &str) -> Vec<String> {
    output
        .lines()
        .filter(|line| !line.starts_with(char::is_whitespace))
        .filter_map(|line| line.trim_end().strip_suffix(':'))
        .map(str::trim)
        .filter(|owner| !owner.is_empty() && !IGNORED_OWNERS.contains(owner))
        .map(str::to_string)
        .collect()
}

/// Picks the first candidate related to `identifier` by case-insensitive
/// substring containment in either direction, else the first candidate.
pub fn preferred_candidate<'a>(identifier: &str, candidates: &'a [String]) -> Option<&'a str> {
    let id = identifier.to_lowercase();
    candidates
        .iter()
        .find(|c| {
            let c = c.to_lowercase();
            c.contains(&id) || id.contains(&c)
        })
        .or_else(|| candidates.first())
        .map(String::as_str)
}

/// Memoized resolutions keyed by input identifier.
///
/// Shared between concurrent resolutions; lives as long as its owner.
#[derive(Debug, Default)]
pub struct ResolutionCache {
    entries: DashMap<String, Option<String>>,
}

impl ResolutionCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, identifier: &str) -> Option<Option<String>> {
        self.entries.get(identifier).map(|e| e.value().clone())
    }

    pub fn insert(&self, identifier: &str, resolved: Option<String>) {
        self.entries.insert(identifier.to_string(), resolved);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn clear(&self) {
        self.entries.clear();
    }
}

/// Resolves identifiers through a [`PackageLookup`], memoizing the results.
#[derive(Clone)]
pub struct PackageNameResolver {
    lookup: Arc<dyn PackageLookup>,
    cache: Arc<ResolutionCache>,
}

impl std::fmt::Debug for PackageNameResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PackageNameResolver")
            .field("cached", &self.cache.len())
            .finish()
    }
}

impl PackageNameResolver {
    pub fn new(lookup: Arc<dyn PackageLookup>) -> Self {
        Self::with_cache(lookup, Arc::new(ResolutionCache::new()))
    }

    pub fn with_cache(lookup: Arc<dyn PackageLookup>, cache: Arc<ResolutionCache>) -> Self {
        Self { lookup, cache }
    }

    pub fn cache(&self) -> &Arc<ResolutionCache> {
        &self.cache
    }

    /// Canonical package name for `identifier`.
    ///
    /// Returns `Ok(None)` for core packages, which need no installation.
    /// A lookup that cannot answer yields the identifier unchanged.
    pub fn resolve_name(&self, identifier: &str) -> Result<Option<String>> {
        if is_core_package(identifier) {
            return Ok(None);
        }
        if let Some(hit) = self.cache.get(identifier) {
            return Ok(hit);
        }

        let resolved = match self.lookup.search_file(&style_file(identifier))? {
            Some(output) => {
                let candidates = parse_search_output(&output);
                preferred_candidate(identifier, &candidates)
                    .unwrap_or(identifier)
                    .to_string()
            }
            None => identifier.to_string(),
        };

        if resolved != identifier {
            log::debug!("Resolved {} -> {}", identifier, resolved);
        }
        let resolved = Some(resolved);
        self.cache.insert(identifier, resolved.clone());
        Ok(resolved)
    }
}
