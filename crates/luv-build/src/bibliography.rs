//! Decides whether a document needs a bibliography run, and with which tool.
//!
//! Only the entry file's text is inspected; `*.bib` files in the project root
//! also count as evidence that a bibliography is wanted.

use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt;
use std::path::Path;

static BIBLIOGRAPHY_SIGNATURES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\\bibliography\{",
        r"\\bibliographystyle\{",
        r"\\printbibliography",
        r"\\addbibresource\{",
    ])
});

static CITATION_SIGNATURES: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\\cite\{",
        r"\\citep\{",
        r"\\citet\{",
        r"\\citeauthor\{",
        r"\\autocite\{",
        r"\\textcite\{",
    ])
});

static BACKEND_BIBER: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"backend\s*=\s*biber").expect("backend regex"));
static BACKEND_BIBTEX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"backend\s*=\s*bibtex").expect("backend regex"));
static BIBLATEX: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\\usepackage(?:\[[^\]]*\])?\{(?:[^}]*,)?\s*biblatex\s*(?:,[^}]*)?\}")
        .expect("biblatex regex")
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("bibliography signature regex"))
        .collect()
}

/// Bibliography processor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BibBackend {
    #[default]
    Bibtex,
    Biber,
}

impl BibBackend {
    pub fn program(self) -> &'static str {
        match self {
            BibBackend::Bibtex => "bibtex",
            BibBackend::Biber => "biber",
        }
    }
}

impl fmt::Display for BibBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.program())
    }
}

/// What the entry file asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BibliographyNeeds {
    pub needs_bibliography: bool,
    pub has_citations: bool,
    pub backend: BibBackend,
}

impl BibliographyNeeds {
    /// Inspects `text` and the `*.bib` files under `project_root`.
    pub fn detect(text: &str, project_root: &Path) -> Self {
        Self {
            needs_bibliography: declares_bibliography(text) || has_bib_files(project_root),
            has_citations: has_citations(text),
            backend: select_backend(text),
        }
    }

    /// The four-pass sequence is only worth it with both a bibliography and
    /// something citing it.
    pub fn needs_multipass(&self) -> bool {
        self.needs_bibliography && self.has_citations
    }
}

pub fn declares_bibliography(text: &str) -> bool {
    BIBLIOGRAPHY_SIGNATURES.iter().any(|re| re.is_match(text))
}

pub fn has_citations(text: &str) -> bool {
    CITATION_SIGNATURES.iter().any(|re| re.is_match(text))
}

/// True if the project root directly contains a `*.bib` file.
pub fn has_bib_files(project_root: &Path) -> bool {
    let pattern = format!(
        "{}/*.bib",
        glob::Pattern::escape(&project_root.to_string_lossy())
    );
    match glob::glob(&pattern) {
        Ok(mut paths) => paths.any(|p| p.is_ok()),
        Err(e) => {
            log::debug!("Invalid bib glob {}: {}", pattern, e);
            false
        }
    }
}

/// Picks the processor: an explicit `backend=` option wins, then biblatex
/// (whose default is biber). Classic `\bibliographystyle` documents and
/// everything else get bibtex.
pub fn select_backend(text: &str) -> BibBackend {
    if BACKEND_BIBER.is_match(text) {
        BibBackend::Biber
    } else if BACKEND_BIBTEX.is_match(text) {
        BibBackend::Bibtex
    } else if BIBLATEX.is_match(text) {
        BibBackend::Biber
    } else {
        BibBackend::Bibtex
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_backend_decision_table() {
        let cases = [
            (r"\usepackage[backend=biber]{biblatex}", BibBackend::Biber),
            (r"\usepackage[backend=bibtex]{biblatex}", BibBackend::Bibtex),
            (r"\usepackage[style=apa, backend = bibtex]{biblatex}", BibBackend::Bibtex),
            (r"\usepackage{biblatex}", BibBackend::Biber),
            (r"\usepackage[style=ieee]{biblatex}", BibBackend::Biber),
            (r"\bibliographystyle{plain}", BibBackend::Bibtex),
            (r"\documentclass{article}", BibBackend::Bibtex),
        ];
        for (text, expected) in cases {
            assert_eq!(select_backend(text), expected, "{}", text);
        }
    }

    #[test]
    fn test_biblatex_name_must_be_exact() {
        assert_eq!(select_backend(r"\usepackage{biblatex-chicago}"), BibBackend::Bibtex);
        assert_eq!(select_backend(r"\usepackage{csquotes, biblatex}"), BibBackend::Biber);
    }

    #[test]
    fn test_signatures() {
        assert!(declares_bibliography(r"\bibliography{refs}"));
        assert!(declares_bibliography(r"\printbibliography[heading=none]"));
        assert!(declares_bibliography(r"\addbibresource{refs.bib}"));
        assert!(!declares_bibliography(r"\section{Bibliography}"));

        for cmd in ["cite", "citep", "citet", "citeauthor", "autocite", "textcite"] {
            assert!(has_citations(&format!(r"see \{}{{knuth84}}", cmd)), "{}", cmd);
        }
        assert!(!has_citations("no citations here"));
    }

    #[test]
    fn test_bib_file_counts_as_bibliography() {
        let dir = tempfile::tempdir().unwrap();
        let text = r"\cite{knuth84}";

        let needs = BibliographyNeeds::detect(text, dir.path());
        assert!(!needs.needs_bibliography);
        assert!(!needs.needs_multipass());

        fs::write(dir.path().join("refs.bib"), "@book{knuth84}").unwrap();
        let needs = BibliographyNeeds::detect(text, dir.path());
        assert!(needs.needs_bibliography);
        assert!(needs.needs_multipass());
    }

    #[test]
    fn test_bibliography_without_citations_is_single_pass() {
        let dir = tempfile::tempdir().unwrap();
        let needs = BibliographyNeeds::detect(r"\bibliography{refs}", dir.path());
        assert!(needs.needs_bibliography);
        assert!(!needs.has_citations);
        assert!(!needs.needs_multipass());
    }
}
