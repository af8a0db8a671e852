use super::Project;
use anyhow::Result;
use std::process::ExitCode;

pub fn execute(project: &Project) -> Result<ExitCode> {
    project.env.clean()?;
    Ok(ExitCode::SUCCESS)
}
