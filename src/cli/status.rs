//! Connection status command.

use anyhow::Result;
use clap::Parser;

use crate::cli::connect;
use crate::data::{to_yaml, ConnectionStatus};

/// Checks whether the configured GitHub credential works.
#[derive(Parser)]
pub struct StatusCommand {}

impl StatusCommand {
    /// Executes the status command.
    pub async fn execute(self) -> Result<()> {
        let status = match connect() {
            Ok(scrubber) => scrubber.connection_status().await,
            Err(err) => ConnectionStatus {
                connected: false,
                login: None,
                name: None,
                avatar_url: None,
                error: Some(format!("{err:#}")),
            },
        };

        print!("{}", to_yaml(&status)?);
        Ok(())
    }
}
