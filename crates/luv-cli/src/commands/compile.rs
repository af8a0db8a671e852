use super::Project;
use anyhow::Result;
use clap::Args;
use luv_build::{locate_biber, CompilationSequencer, Compiler};
use std::process::ExitCode;

#[derive(Args)]
pub struct CompileCommand {
    /// Empty the output directory first
    #[arg(long)]
    clean: bool,
}

impl CompileCommand {
    pub fn execute(self, project: &Project) -> Result<ExitCode> {
        project.env.ensure_exists()?;
        project.env.entry_file(&project.config)?;

        let compiler = Compiler::from_environment(&project.env, &project.config);
        let biber = locate_biber(project.env.texmf_dir(), &project.env.bin_dir());
        let sequencer = CompilationSequencer::new(compiler, biber);

        if self.clean {
            sequencer.clean_output()?;
        }

        let report = sequencer.run()?;
        if let Some(failure) = &report.failure {
            println!("{}", failure);
            return Ok(ExitCode::FAILURE);
        }

        println!(
            "Compilation successful! Output in {}/",
            project.config.project.output_dir
        );
        if !report.advisories.is_empty() {
            println!("\nWarnings detected:");
            for advisory in &report.advisories {
                println!("  • {}", advisory);
            }
            println!("\nTo debug: check the .log file in the build directory for details.");
        }
        Ok(ExitCode::SUCCESS)
    }
}
