//! Compilation for luv projects.
//!
//! [`CompilationSequencer`] decides between a single engine pass and the
//! four-pass bibliography sequence, then drives the engine and the
//! bibliography processor through a [`Compiler`].

pub mod artifacts;
pub mod bibliography;
pub mod compiler;
pub mod sequencer;
pub mod warnings;

pub use artifacts::ArtifactPaths;
pub use bibliography::{BibBackend, BibliographyNeeds};
pub use compiler::Compiler;
pub use sequencer::{
    locate_biber, CompilationSequencer, CompileMode, CompileReport, Pass, PassFailure,
    SequenceState,
};
pub use warnings::Advisory;
