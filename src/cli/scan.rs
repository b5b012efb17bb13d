//! Scan command.

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use serde::Serialize;

use crate::cli::connect;
use crate::data::{to_yaml, write_yaml_file, RepositoryRecord, ScanReport};
use crate::git::commit::short_id;
use crate::git::ClassifiedCommit;

/// Classifies a repository's default-branch history without changing it.
#[derive(Parser)]
pub struct ScanCommand {
    /// Repository URL; registered automatically on first scan.
    pub url: String,

    /// Lists every examined commit, not only tool-generated ones.
    #[arg(long)]
    pub all: bool,

    /// Saves the full report to a YAML file for `cleanup --from-scan`.
    #[arg(long, short = 'o', value_name = "FILE")]
    pub output: Option<PathBuf>,
}

/// Printed form of a scan report.
#[derive(Serialize)]
struct ScanOutput<'a> {
    repository: &'a RepositoryRecord,
    examined: usize,
    commits: Vec<&'a ClassifiedCommit>,
}

impl ScanCommand {
    /// Executes the scan command.
    pub async fn execute(self) -> Result<()> {
        let scrubber = connect()?;
        let report = scrubber.scan(&self.url).await?;

        print!("{}", to_yaml(&self.view(&report))?);

        if let Some(path) = &self.output {
            write_yaml_file(&report, path)?;
            println!("💾 Report saved to: {}", path.display());
        }

        let found: Vec<&str> = report.tool_generated().map(|c| short_id(&c.id)).collect();
        if found.is_empty() {
            println!("✅ No tool-generated commits found.");
        } else {
            println!(
                "\n📝 Found {} tool-generated commits: {}",
                found.len(),
                found.join(" ")
            );
            println!(
                "Run `commit-scrub cleanup {} --from-scan <FILE>` or pass commit ids to rewrite them.",
                report.repository.url
            );
        }
        Ok(())
    }

    fn view<'a>(&self, report: &'a ScanReport) -> ScanOutput<'a> {
        ScanOutput {
            repository: &report.repository,
            examined: report.commits.len(),
            commits: report
                .commits
                .iter()
                .filter(|c| self.all || c.is_tool_generated)
                .collect(),
        }
    }
}
