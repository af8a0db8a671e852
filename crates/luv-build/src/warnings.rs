//! Advisory scan of engine output.

use std::fmt;

/// A common, usually harmless, problem reported in engine output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advisory {
    UndefinedReferences,
    UndefinedCitations,
    Rerun,
    MultiplyDefined,
}

impl Advisory {
    pub fn message(self) -> &'static str {
        match self {
            Advisory::UndefinedReferences => {
                "Undefined references detected - check your \\cite{} commands"
            }
            Advisory::UndefinedCitations => {
                "Undefined citations - check your bibliography file and citation keys"
            }
            Advisory::Rerun => "LaTeX suggests rerunning - this is normal for complex documents",
            Advisory::MultiplyDefined => {
                "Multiply defined labels - check for duplicate \\label{} commands"
            }
        }
    }
}

impl fmt::Display for Advisory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Case-insensitive scan; each advisory is tested independently.
pub fn scan(stdout: &str) -> Vec<Advisory> {
    let text = stdout.to_lowercase();
    let mut found = Vec::new();
    if text.contains("undefined references") {
        found.push(Advisory::UndefinedReferences);
    }
    if text.contains("citation") && text.contains("undefined") {
        found.push(Advisory::UndefinedCitations);
    }
    if text.contains("rerun") {
        found.push(Advisory::Rerun);
    }
    if text.contains("multiply defined") {
        found.push(Advisory::MultiplyDefined);
    }
    found
}
