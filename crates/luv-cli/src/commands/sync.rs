use super::Project;
use anyhow::Result;
use luv_core::installer::Installer;
use std::process::ExitCode;
use std::sync::Arc;

pub async fn execute(project: &Project) -> Result<ExitCode> {
    project.env.ensure_exists()?;
    let requirements = project.env.requirements().read()?;
    if requirements.is_empty() {
        println!("No requirements found.");
        return Ok(ExitCode::SUCCESS);
    }

    println!("Installing {} packages...", requirements.len());
    let manager = project.package_manager();
    let resolver = project.name_resolver(&manager);
    let installer = Installer::new(manager)
        .with_fallback(Arc::new(move |name: &str| resolver.resolve_name(name).ok().flatten()));

    let report = installer.install_all(&requirements).await?;
    if report.is_success() {
        println!("All packages installed successfully!");
    } else {
        println!(
            "\nWarning: Failed to install {} packages:",
            report.failed.len()
        );
        for failure in &report.failed {
            println!("  - {}", failure.name);
        }
        println!(
            "\nSome packages might have different names in TeX Live or be part of larger schemes."
        );
    }
    Ok(ExitCode::SUCCESS)
}
