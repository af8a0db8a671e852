use super::Project;
use anyhow::Result;
use std::process::ExitCode;

pub fn execute(project: &Project) -> Result<ExitCode> {
    let requirements = project.env.requirements().read()?;
    let settings = &project.config.project;

    println!("Project root: {}", project.root.display());
    println!("Environment: {}", project.env.luv_dir().display());
    println!("TeX file: {}", settings.texfile);
    println!("Engine: {}", settings.engine);
    println!("Output dir: {}", settings.output_dir);
    println!("Packages: {} installed", requirements.len());
    for pkg in &requirements {
        println!("  - {}", pkg);
    }
    Ok(ExitCode::SUCCESS)
}
