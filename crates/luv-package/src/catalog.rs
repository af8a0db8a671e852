//! Usage signatures that imply a package.
//!
//! The table below is heuristic and deliberately small: a signature matching
//! anywhere in the document text is enough to suggest the package. It is data,
//! not code; [`PatternCatalog::from_table`] builds a catalog from any table.

use once_cell::sync::Lazy;
use regex::Regex;

/// Packages that ship with the LaTeX kernel and never need installing.
pub const CORE_PACKAGES: &[&str] = &["fontenc", "inputenc", "textcomp", "ifthen", "calc", "url"];

pub fn is_core_package(name: &str) -> bool {
    CORE_PACKAGES.contains(&name)
}

/// Built-in signature table: package name and its usage patterns.
pub const BUILTIN_SIGNATURES: &[(&str, &[&str])] = &[
    // Math
    (
        "amsmath",
        &[
            r"\\begin\{align",
            r"\\begin\{equation",
            r"\\begin\{gather",
            r"\\begin\{multline",
            r"\\begin\{split\}",
        ],
    ),
    ("amssymb", &[r"\\mathbb\{", r"\\mathfrak\{", r"\\mathcal\{"]),
    ("amsthm", &[r"\\newtheorem", r"\\theoremstyle", r"\\begin\{proof\}"]),
    // Graphics and figures
    ("graphicx", &[r"\\includegraphics", r"\\rotatebox", r"\\scalebox"]),
    ("subfig", &[r"\\subfloat", r"\\subref"]),
    ("subcaption", &[r"\\subcaptionbox", r"\\begin\{subfigure\}"]),
    ("tikz", &[r"\\begin\{tikzpicture\}", r"\\tikz", r"\\usetikzlibrary"]),
    ("pgfplots", &[r"\\begin\{axis\}", r"\\addplot"]),
    // Tables
    ("booktabs", &[r"\\toprule", r"\\midrule", r"\\bottomrule"]),
    ("longtable", &[r"\\begin\{longtable\}"]),
    ("array", &[r"\\newcolumntype", r"\\arraybackslash"]),
    ("multirow", &[r"\\multirow"]),
    ("multicol", &[r"\\begin\{multicols\}"]),
    (
        "colortbl",
        &[
            r"\\rowcolor\{",
            r"\\columncolor\{",
            r"\\cellcolor\{",
            r"\\usepackage\[.*table.*\]\{xcolor\}",
        ],
    ),
    // References and citations
    ("hyperref", &[r"\\href\{", r"\\url\{", r"\\hyperlink", r"\\autoref"]),
    ("natbib", &[r"\\citep\{", r"\\citet\{", r"\\citeauthor"]),
    (
        "biblatex",
        &[r"\\printbibliography", r"\\addbibresource", r"\\usepackage.*biblatex"],
    ),
    ("logreq", &[r"\\usepackage.*biblatex"]),
    ("etoolbox", &[r"\\usepackage.*biblatex"]),
    ("cleveref", &[r"\\cref\{", r"\\Cref\{"]),
    // Languages
    ("babel", &[r"\\selectlanguage", r"\\foreignlanguage"]),
    // Layout and spacing
    ("geometry", &[r"\\newgeometry", r"\\restoregeometry"]),
    ("setspace", &[r"\\doublespacing", r"\\onehalfspacing", r"\\setstretch"]),
    ("fancyhdr", &[r"\\fancyhead", r"\\fancyfoot", r"\\pagestyle\{fancy\}"]),
    ("titlesec", &[r"\\titleformat", r"\\titlespacing"]),
    // Colors
    ("xcolor", &[r"\\textcolor\{", r"\\colorbox\{", r"\\definecolor"]),
    ("color", &[r"\\color\{"]),
    // Lists
    ("enumitem", &[r"\\setlist", r"\\newlist"]),
    // Code listings
    ("listings", &[r"\\begin\{lstlisting\}", r"\\lstinputlisting"]),
    ("minted", &[r"\\begin\{minted\}", r"\\mint\{"]),
    ("verbatim", &[r"\\begin\{verbatim\}"]),
    // Algorithms
    ("algorithm", &[r"\\begin\{algorithm\}"]),
    ("algorithmic", &[r"\\begin\{algorithmic\}"]),
    ("algorithmicx", &[r"\\algstore", r"\\algrestore"]),
    // Misc
    ("lipsum", &[r"\\lipsum"]),
    ("blindtext", &[r"\\blindtext", r"\\Blindtext"]),
    ("todonotes", &[r"\\todo\{", r"\\missingfigure"]),
    ("authblk", &[r"\\author\[", r"\\affil\{"]),
    ("float", &[r"\\newfloat", r"\\floatstyle"]),
    ("lineno", &[r"\\linenumbers", r"\\modulolinenumbers"]),
];

/// One package and the signatures that imply it.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub package: String,
    pub signatures: Vec<Regex>,
}

impl CatalogEntry {
    /// True if any signature occurs in `text`. Stops at the first hit.
    pub fn matches(&self, text: &str) -> bool {
        self.signatures.iter().any(|re| re.is_match(text))
    }
}

/// Compiled signature catalog, in table order.
#[derive(Debug, Clone, Default)]
pub struct PatternCatalog {
    entries: Vec<CatalogEntry>,
}

impl PatternCatalog {
    /// Compiles a catalog from a `(package, signatures)` table.
    pub fn from_table(table: &[(&str, &[&str])]) -> Result<Self, regex::Error> {
        let entries = table
            .iter()
            .map(|(package, patterns)| {
                let signatures = patterns
                    .iter()
                    .map(|p| Regex::new(p))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(CatalogEntry {
                    package: package.to_string(),
                    signatures,
                })
            })
            .collect::<Result<Vec<_>, regex::Error>>()?;
        Ok(Self { entries })
    }

    /// The built-in catalog, compiled once per process.
    pub fn builtin() -> &'static PatternCatalog {
        &BUILTIN
    }

    pub fn entries(&self) -> &[CatalogEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, package: &str) -> Option<&CatalogEntry> {
        self.entries.iter().find(|e| e.package == package)
    }
}

static BUILTIN: Lazy<PatternCatalog> = Lazy::new(|| {
    PatternCatalog::from_table(BUILTIN_SIGNATURES).expect("built-in signatures are valid regexes")
});
