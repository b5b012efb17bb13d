//! Cleanup command.

use std::collections::HashSet;
use std::io::{self, BufRead, IsTerminal, Write};
use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;

use crate::cli::connect;
use crate::data::{read_yaml_file, to_yaml, ScanReport};
use crate::git::commit::short_id;
use crate::git::{RepoLocator, RewriteMode};

/// Rewrites the default branch without the selected commits' tool metadata.
///
/// Every commit after the oldest target is recreated and the branch is
/// force-updated, so all commit ids from that point on change.
#[derive(Parser)]
pub struct CleanupCommand {
    /// Repository URL.
    pub url: String,

    /// Full ids of the commits to rewrite.
    #[arg(value_name = "COMMIT")]
    pub commits: Vec<String>,

    /// Targets every tool-generated commit listed in a saved scan report.
    #[arg(long, value_name = "FILE")]
    pub from_scan: Option<PathBuf>,

    /// Removes target commits instead of sanitizing their messages.
    #[arg(long)]
    pub drop: bool,

    /// Skips the confirmation prompt.
    #[arg(long, short = 'y')]
    pub yes: bool,
}

impl CleanupCommand {
    /// Executes the cleanup command.
    pub async fn execute(self) -> Result<()> {
        let targets = self.targets()?;
        if targets.is_empty() {
            bail!("No commits specified for cleanup. Pass commit ids or --from-scan <FILE>.");
        }

        let proceed = self.yes
            || self.confirm(
                &targets,
                io::stdin().is_terminal(),
                &mut io::BufReader::new(io::stdin()),
            )?;
        if !proceed {
            println!("Cleanup cancelled; nothing was changed.");
            return Ok(());
        }

        let scrubber = connect()?;
        let report = match scrubber.cleanup(&self.url, targets, self.mode()).await {
            Ok(report) => report,
            Err(err) => {
                if !err.is_before_write() {
                    eprintln!(
                        "note: some commits were recreated before the failure, but the branch was not moved"
                    );
                }
                return Err(err.into());
            }
        };

        print!("{}", to_yaml(&report)?);
        if report.result.rewritten_count > 0 {
            println!(
                "\n✅ Rewrote {} commits; branch now at {}",
                report.result.rewritten_count,
                short_id(&report.result.new_head_id)
            );
        } else {
            println!("\n⚠️  No commit messages needed changes; branch left untouched.");
        }
        Ok(())
    }

    fn mode(&self) -> RewriteMode {
        if self.drop {
            RewriteMode::Drop
        } else {
            RewriteMode::Sanitize
        }
    }

    /// Collects target ids from the arguments and the scan report, if given.
    fn targets(&self) -> Result<HashSet<String>> {
        let mut targets: HashSet<String> = self
            .commits
            .iter()
            .map(|c| c.trim().to_string())
            .filter(|c| !c.is_empty())
            .collect();

        if let Some(path) = &self.from_scan {
            let report: ScanReport = read_yaml_file(path)?;
            let expected = RepoLocator::parse(&self.url)?.canonical_url();
            if report.repository.url != expected {
                bail!(
                    "Scan report {} is for {}, not {}",
                    path.display(),
                    report.repository.url,
                    expected
                );
            }
            targets.extend(report.tool_generated().map(|c| c.id.clone()));
        }

        Ok(targets)
    }

    /// Shows the plan and asks before rewriting.
    ///
    /// `is_terminal` and `reader` are injected so tests can drive the prompt
    /// without real stdin.
    fn confirm(
        &self,
        targets: &HashSet<String>,
        is_terminal: bool,
        reader: &mut (dyn BufRead + Send),
    ) -> Result<bool> {
        let mut ids: Vec<&str> = targets.iter().map(|t| short_id(t)).collect();
        ids.sort_unstable();

        let action = match self.mode() {
            RewriteMode::Sanitize => "sanitize the messages of",
            RewriteMode::Drop => "drop",
        };
        println!("\n📝 About to {action} {} commits in {}:", ids.len(), self.url);
        for id in &ids {
            println!("   {id}");
        }
        println!("⚠️  The default branch will be force-updated; existing clones must reset to it.");

        if !is_terminal {
            eprintln!("warning: stdin is not interactive; pass --yes to run cleanup");
            return Ok(false);
        }

        loop {
            print!("❓ Rewrite history? [y/N] ");
            io::stdout().flush()?;

            let mut input = String::new();
            if reader.read_line(&mut input)? == 0 {
                eprintln!("warning: stdin closed, cancelling cleanup");
                return Ok(false);
            }

            match input.trim().to_lowercase().as_str() {
                "y" | "yes" => return Ok(true),
                "n" | "no" | "" => return Ok(false),
                _ => println!("Please answer 'y' or 'n'."),
            }
        }
    }
}
