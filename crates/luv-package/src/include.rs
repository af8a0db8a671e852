//! Include graph traversal.
//!
//! Starting at the entry file, follows `\input`, `\include`, `\subfile` and
//! `\InputIfFileExists` directives. Targets without a `.tex` extension get one;
//! each target is looked up next to the including file first and relative to
//! the project root second. Missing and unreadable files contribute nothing.
//!
//! The walk is an explicit worklist, so neither include cycles nor deeply
//! nested documents can exhaust the stack.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::{HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

pub const SOURCE_EXTENSION: &str = ".tex";

static INCLUDE_DIRECTIVES: Lazy<Vec<Regex>> = Lazy::new(|| {
    [
        r"\\input\{([^}]+)\}",
        r"\\include\{([^}]+)\}",
        r"\\subfile\{([^}]+)\}",
        r"\\InputIfFileExists\{([^}]+)\}",
    ]
    .iter()
    .map(|p| Regex::new(p).expect("include directive regex"))
    .collect()
});

/// Read access to project files.
pub trait SourceProvider: Send + Sync {
    fn exists(&self, path: &Path) -> bool;

    /// File text, or `None` if it cannot be read.
    fn read(&self, path: &Path) -> Option<String>;
}

/// Reads from disk. Invalid UTF-8 is replaced, not rejected.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsSource;

impl SourceProvider for FsSource {
    fn exists(&self, path: &Path) -> bool {
        path.is_file()
    }

    fn read(&self, path: &Path) -> Option<String> {
        match std::fs::read(path) {
            Ok(bytes) => Some(String::from_utf8_lossy(&bytes).into_owned()),
            Err(e) => {
                log::debug!("Skipping unreadable {}: {}", path.display(), e);
                None
            }
        }
    }
}

/// In-memory file set keyed by normalized path.
#[derive(Debug, Default, Clone)]
pub struct MemorySource {
    files: HashMap<PathBuf, String>,
}

impl MemorySource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_file(mut self, path: impl AsRef<Path>, text: impl Into<String>) -> Self {
        self.insert(path, text);
        self
    }

    pub fn insert(&mut self, path: impl AsRef<Path>, text: impl Into<String>) {
        self.files.insert(normalize(path.as_ref()), text.into());
    }
}

impl SourceProvider for MemorySource {
    fn exists(&self, path: &Path) -> bool {
        self.files.contains_key(&normalize(path))
    }

    fn read(&self, path: &Path) -> Option<String> {
        self.files.get(&normalize(path)).cloned()
    }
}

/// Lexically resolves `.` and `..` components.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component);
                }
            }
            other => out.push(other),
        }
    }
    out
}

/// Include targets named in `text`, in directive order.
pub fn include_targets(text: &str) -> Vec<String> {
    INCLUDE_DIRECTIVES
        .iter()
        .flat_map(|re| re.captures_iter(text))
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().trim().to_string()))
        .filter(|t| !t.is_empty())
        .collect()
}

/// One visited file and its text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    pub path: PathBuf,
    pub text: String,
}

/// Every file reachable from an entry file.
#[derive(Debug, Clone, Default)]
pub struct DocumentTree {
    /// Readable files, in visit order.
    pub files: Vec<SourceFile>,
    /// Every path the walk resolved, including unreadable ones.
    pub visited: HashSet<PathBuf>,
}

impl DocumentTree {
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.text.as_str())
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.visited.contains(&normalize(path))
    }
}

/// Walks the include graph of a project.
pub struct IncludeWalker<'a> {
    root: PathBuf,
    source: &'a dyn SourceProvider,
}

impl<'a> IncludeWalker<'a> {
    pub fn new(root: impl Into<PathBuf>, source: &'a dyn SourceProvider) -> Self {
        Self {
            root: root.into(),
            source,
        }
    }

    /// Locates an include target as seen from `including_dir`.
    pub fn resolve_target(&self, including_dir: &Path, target: &str) -> PathBuf {
        let mut file = target.to_string();
        if !file.ends_with(SOURCE_EXTENSION) {
            file.push_str(SOURCE_EXTENSION);
        }
        let local = normalize(&including_dir.join(&file));
        if self.source.exists(&local) {
            local
        } else {
            normalize(&self.root.join(&file))
        }
    }

    /// Collects all files reachable from `entry` (relative to the root).
    pub fn walk(&self, entry: &str) -> DocumentTree {
        let mut tree = DocumentTree::default();
        let mut pending = vec![normalize(&self.root.join(entry))];

        while let Some(path) = pending.pop() {
            if tree.visited.contains(&path) || !self.source.exists(&path) {
                continue;
            }
            tree.visited.insert(path.clone());

            let Some(text) = self.source.read(&path) else {
                continue;
            };

            let dir = path.parent().map(Path::to_path_buf).unwrap_or_default();
            let mut targets: Vec<PathBuf> = include_targets(&text)
                .iter()
                .map(|t| self.resolve_target(&dir, t))
                .filter(|p| !tree.visited.contains(p))
                .collect();
            // Popped from the back; reverse to keep document order.
            targets.reverse();
            pending.extend(targets);

            tree.files.push(SourceFile { path, text });
        }

        log::debug!("Include walk from {} reached {} files", entry, tree.files.len());
        tree
    }
}
