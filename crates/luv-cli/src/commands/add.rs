use super::Project;
use anyhow::Result;
use clap::Args;
use luv_core::installer::Installer;
use luv_core::requirements::package_name;
use std::process::ExitCode;
use std::sync::Arc;

#[derive(Args)]
pub struct AddCommand {
    /// Packages to install
    #[arg(required = true, value_name = "PKG")]
    packages: Vec<String>,
}

impl AddCommand {
    pub fn execute(self, project: &Project) -> Result<ExitCode> {
        project.env.ensure_exists()?;
        let manager = project.package_manager();
        let resolver = project.name_resolver(&manager);
        let fallback = resolver.clone();
        let installer = Installer::new(manager)
            .with_fallback(Arc::new(move |name: &str| fallback.resolve_name(name).ok().flatten()));
        let requirements = project.env.requirements();

        for package in &self.packages {
            let Some(resolved) = resolver.resolve_name(package)? else {
                println!("Skipping {} (core LaTeX package, no installation needed)", package);
                continue;
            };

            let status = installer.install_one(&resolved)?;
            if !status.state.is_success() {
                println!(
                    "Note: Package {} may already be installed or not available in this TeX Live version.",
                    resolved
                );
            }

            let listed = requirements.read()?;
            if !listed.iter().any(|line| package_name(line) == resolved) {
                requirements.merge([resolved.as_str()])?;
                println!("Added {} to latex-requirements.txt", resolved);
            }
        }
        Ok(ExitCode::SUCCESS)
    }
}
