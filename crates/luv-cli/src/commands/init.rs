use anyhow::Result;
use clap::Args;
use luv_core::config::{Engine, DEFAULT_TEXFILE};
use luv_core::environment::LatexEnvironment;
use std::process::ExitCode;

#[derive(Args)]
pub struct InitCommand {
    /// Main TeX file
    #[arg(long, default_value = DEFAULT_TEXFILE)]
    texfile: String,

    /// LaTeX engine
    #[arg(long, default_value_t = Engine::Pdflatex)]
    engine: Engine,
}

impl InitCommand {
    pub fn execute(self) -> Result<ExitCode> {
        let env = LatexEnvironment::new(std::env::current_dir()?);
        env.create()?;

        if self.texfile != DEFAULT_TEXFILE || self.engine != Engine::Pdflatex {
            let mut config = env.config()?;
            config.project.texfile = self.texfile.clone();
            config.project.engine = self.engine;
            env.save_config(&config)?;
            println!("Set texfile to {}", self.texfile);
            if self.engine != Engine::Pdflatex {
                println!("Set engine to {}", self.engine);
            }
        }

        println!("Environment created successfully!");
        Ok(ExitCode::SUCCESS)
    }
}
