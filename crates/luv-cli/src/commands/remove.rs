use super::Project;
use anyhow::Result;
use clap::Args;
use luv_core::package_manager::RemoveState;
use std::process::ExitCode;

#[derive(Args)]
pub struct RemoveCommand {
    /// Packages to remove
    #[arg(required = true, value_name = "PKG")]
    packages: Vec<String>,
}

impl RemoveCommand {
    pub fn execute(self, project: &Project) -> Result<ExitCode> {
        project.env.ensure_exists()?;
        let manager = project.package_manager();
        let resolver = project.name_resolver(&manager);
        let requirements = project.env.requirements();

        for package in &self.packages {
            let Some(resolved) = resolver.resolve_name(package)? else {
                println!("Skipping {} (core LaTeX package, cannot be removed)", package);
                continue;
            };

            println!("Removing package: {}", resolved);
            let status = manager.remove(&resolved)?;
            match status.state {
                RemoveState::Removed => {
                    println!("Successfully removed {}", resolved);
                    if requirements.remove(&resolved)? {
                        println!("Removed {} from latex-requirements.txt", resolved);
                    }
                }
                RemoveState::NotInstalled => println!("Package {} is not installed", resolved),
                RemoveState::Failed => {
                    println!("Warning: Could not remove {}", resolved);
                    if let Some(message) = status.message {
                        println!("tlmgr output: {}", message);
                    }
                }
            }
        }
        Ok(ExitCode::SUCCESS)
    }
}
