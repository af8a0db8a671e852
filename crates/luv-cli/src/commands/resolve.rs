//! `luv resolve`: detect the document's packages and reconcile them with
//! latex-requirements.txt.

use super::Project;
use anyhow::Result;
use clap::Args;
use luv_core::requirements::package_name;
use luv_package::catalog::is_core_package;
use luv_package::engine::{DependencyResolver, ResolutionReport};
use serde::Serialize;
use std::collections::BTreeSet;
use std::process::ExitCode;
use tokio::io::{AsyncBufReadExt, BufReader};

#[derive(Args)]
pub struct ResolveCommand {
    /// Add found packages to latex-requirements.txt without prompting
    /// (use --no-update to be asked instead)
    #[arg(long, overrides_with = "no_update")]
    update: bool,

    /// Ask before adding missing packages
    #[arg(long, overrides_with = "update")]
    no_update: bool,

    /// Show the analysis without touching any file
    #[arg(long)]
    dry_run: bool,

    /// Print the analysis as JSON
    #[arg(long)]
    json: bool,
}

/// What to do with packages missing from the requirements file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateMode {
    Always,
    Prompt,
    Never,
}

#[derive(Serialize)]
struct JsonOutput<'a> {
    #[serde(flatten)]
    report: &'a ResolutionReport,
    missing: &'a [String],
}

impl ResolveCommand {
    pub fn update_mode(&self) -> UpdateMode {
        if self.dry_run {
            UpdateMode::Never
        } else if self.no_update && !self.update {
            // Stdout carries the JSON document; there is nowhere to prompt.
            if self.json {
                UpdateMode::Never
            } else {
                UpdateMode::Prompt
            }
        } else {
            UpdateMode::Always
        }
    }

    pub async fn execute(self, project: &Project) -> Result<ExitCode> {
        let texfile = project.config.project.texfile.clone();
        project.env.entry_file(&project.config)?;

        log::info!("Analyzing {} and included files...", texfile);
        let manager = project.package_manager();
        let mut deps = DependencyResolver::new(&project.root, project.name_resolver(&manager));
        let packages = deps.resolve(&texfile).await;
        let report = deps.report();

        let requirements = project.env.requirements();
        let existing: BTreeSet<String> = requirements
            .read()?
            .iter()
            .map(|r| package_name(r).to_string())
            .collect();
        let missing: Vec<String> = packages
            .iter()
            .filter(|p| !existing.contains(*p))
            .cloned()
            .collect();

        if self.json {
            let output = JsonOutput {
                report: &report,
                missing: &missing,
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        } else {
            print_report(&report, &existing, &missing);
        }

        if missing.is_empty() {
            return Ok(ExitCode::SUCCESS);
        }

        let update = match self.update_mode() {
            UpdateMode::Always => true,
            UpdateMode::Never => false,
            UpdateMode::Prompt => confirm(missing.len()).await?,
        };
        if update {
            let total = requirements.merge(&packages)?;
            let message = format!(
                "Updated {} with {} packages",
                requirements.path().display(),
                total
            );
            if self.json {
                log::info!("{}", message);
            } else {
                println!("\n{}", message);
            }
        } else if self.dry_run && !self.json {
            println!(
                "\nUse 'luv resolve --update' to add {} missing packages to latex-requirements.txt",
                missing.len()
            );
        }
        Ok(ExitCode::SUCCESS)
    }
}

fn print_report(report: &ResolutionReport, existing: &BTreeSet<String>, missing: &[String]) {
    println!("\nFound {} installable packages:", report.packages.len());

    let line = |pkg: &str, fresh_marker: char| {
        let resolved = report.mappings.get(pkg)?;
        let status = if existing.contains(resolved) {
            '✓'
        } else {
            fresh_marker
        };
        Some(if resolved == pkg {
            format!("  {} {}", status, pkg)
        } else {
            format!("  {} {} → {}", status, pkg, resolved)
        })
    };

    if !report.explicit.is_empty() {
        println!("Explicitly declared packages:");
        for pkg in report.explicit.iter().filter(|p| !is_core_package(p)) {
            if let Some(text) = line(pkg.as_str(), '!') {
                println!("{}", text);
            }
        }
    }

    let suggested: Vec<String> = report
        .inferred
        .iter()
        .filter(|p| !is_core_package(p))
        .filter_map(|p| line(p.as_str(), '+'))
        .collect();
    if !suggested.is_empty() {
        println!("\nSuggested packages (based on usage patterns):");
        for text in suggested {
            println!("{}", text);
        }
    }

    if !report.biblatex_companions.is_empty() {
        println!(
            "  Added biblatex dependencies: {}",
            report.biblatex_companions.join(", ")
        );
    }

    if !missing.is_empty() {
        println!("\n{} packages not in latex-requirements.txt:", missing.len());
        for pkg in missing {
            println!("  - {}", pkg);
        }
    }
}

/// Asks on stdin; an empty answer means yes, end of input means no.
async fn confirm(count: usize) -> Result<bool> {
    print!(
        "\nAdd {} missing packages to latex-requirements.txt? [Y/n]: ",
        count
    );
    std::io::Write::flush(&mut std::io::stdout())?;

    let mut answer = String::new();
    let read = BufReader::new(tokio::io::stdin())
        .read_line(&mut answer)
        .await?;
    if read == 0 {
        println!("\nSkipping update.");
        return Ok(false);
    }
    Ok(matches!(answer.trim().to_lowercase().as_str(), "" | "y" | "yes"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[derive(Parser)]
    struct Wrapper {
        #[command(flatten)]
        cmd: ResolveCommand,
    }

    fn mode(args: &[&str]) -> UpdateMode {
        let mut argv = vec!["luv-resolve"];
        argv.extend_from_slice(args);
        Wrapper::parse_from(argv).cmd.update_mode()
    }

    #[test]
    fn test_update_modes() {
        assert_eq!(mode(&[]), UpdateMode::Always);
        assert_eq!(mode(&["--update"]), UpdateMode::Always);
        assert_eq!(mode(&["--no-update"]), UpdateMode::Prompt);
        assert_eq!(mode(&["--no-update", "--update"]), UpdateMode::Always);
        assert_eq!(mode(&["--dry-run"]), UpdateMode::Never);
        assert_eq!(mode(&["--update", "--dry-run"]), UpdateMode::Never);
    }

    #[test]
    fn test_json_output_never_prompts() {
        assert_eq!(mode(&["--json", "--no-update"]), UpdateMode::Never);
        assert_eq!(mode(&["--json"]), UpdateMode::Always);
        assert_eq!(mode(&["--json", "--no-update", "--update"]), UpdateMode::Always);
    }
}
