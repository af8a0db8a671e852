use std::path::{Path, PathBuf};

/// Where a compilation's outputs land.
///
/// The engine runs from the project root with `-output-directory=<out>`, so
/// every output is `<root>/<out>/<stem>.<ext>` where `<stem>` is the entry
/// file's name without directory or extension.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactPaths {
    project_root: PathBuf,
    output_dir: String,
    stem: String,
    extension: &'static str,
}

impl ArtifactPaths {
    pub fn new(
        project_root: impl Into<PathBuf>,
        output_dir: &str,
        texfile: &str,
        extension: &'static str,
    ) -> Self {
        let stem = Path::new(texfile)
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_else(|| texfile.to_string());
        Self {
            project_root: project_root.into(),
            output_dir: output_dir.trim_end_matches('/').to_string(),
            stem,
            extension,
        }
    }

    pub fn stem(&self) -> &str {
        &self.stem
    }

    /// The output directory, as passed to tools run from the project root.
    pub fn output_dir(&self) -> &str {
        &self.output_dir
    }

    pub fn output_path(&self) -> PathBuf {
        self.project_root.join(&self.output_dir)
    }

    /// The typeset document (`.pdf`, or `.dvi` for plain latex).
    pub fn document(&self) -> PathBuf {
        self.output_path()
            .join(format!("{}.{}", self.stem, self.extension))
    }

    /// The cross-reference file the first pass writes.
    pub fn aux(&self) -> PathBuf {
        self.output_path().join(format!("{}.aux", self.stem))
    }

    /// bibtex argument: `<out>/<stem>.aux`, relative to the project root.
    pub fn bibtex_arg(&self) -> String {
        format!("{}/{}.aux", self.output_dir, self.stem)
    }

    /// biber argument: `<out>/<stem>`, relative to the project root.
    pub fn biber_arg(&self) -> String {
        format!("{}/{}", self.output_dir, self.stem)
    }

    pub fn document_exists(&self) -> bool {
        self.document().is_file()
    }

    pub fn aux_exists(&self) -> bool {
        self.aux().is_file()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths() {
        let paths = ArtifactPaths::new("/p", "build/", "chapters/thesis.tex", "pdf");
        assert_eq!(paths.stem(), "thesis");
        assert_eq!(paths.document(), PathBuf::from("/p/build/thesis.pdf"));
        assert_eq!(paths.aux(), PathBuf::from("/p/build/thesis.aux"));
        assert_eq!(paths.bibtex_arg(), "build/thesis.aux");
        assert_eq!(paths.biber_arg(), "build/thesis");
    }

    #[test]
    fn test_dvi_extension() {
        let paths = ArtifactPaths::new("/p", "out", "main.tex", "dvi");
        assert_eq!(paths.document(), PathBuf::from("/p/out/main.dvi"));
    }

    #[test]
    fn test_existence() {
        let dir = tempfile::tempdir().unwrap();
        let paths = ArtifactPaths::new(dir.path(), "build", "main.tex", "pdf");
        assert!(!paths.document_exists());

        std::fs::create_dir_all(paths.output_path()).unwrap();
        std::fs::write(paths.document(), b"%PDF").unwrap();
        assert!(paths.document_exists());
        assert!(!paths.aux_exists());
    }
}
