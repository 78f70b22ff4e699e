//! Backup export / import.

use netgate_api::NetgateClient;
use netgate_core::Backup;

use crate::cli::{BackupArgs, BackupCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::util;

fn summary(backup: &Backup) -> String {
    fn count<T>(section: Option<&Vec<T>>) -> String {
        section.map_or_else(|| "-".into(), |s| s.len().to_string())
    }
    [
        format!("Rules:      {}", count(backup.firewall_rules.as_ref())),
        format!("Groups:     {}", count(backup.firewall_groups.as_ref())),
        format!("Interfaces: {}", count(backup.interfaces.as_ref())),
        format!("Routes:     {}", count(backup.routes.as_ref())),
        format!("Domains:    {}", count(backup.blocked_domains.as_ref())),
        format!(
            "NAT:        {}",
            backup.nat.as_ref().map_or("-", |n| if n.enabled { "enabled" } else { "disabled" })
        ),
    ]
    .join("\n")
}

pub async fn handle(
    client: &NetgateClient,
    args: BackupArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        BackupCommand::Export { file } => {
            let backup = client.export_backup().await?;
            match file {
                Some(path) => {
                    std::fs::write(&path, serde_json::to_string_pretty(&backup)?)?;
                    output::print_status(
                        &format!("Backup written to {}\n{}", path.display(), summary(&backup)),
                        global.quiet,
                    );
                }
                // Backups are JSON regardless of --output
                None => output::print_output(&serde_json::to_string_pretty(&backup)?, false),
            }
            Ok(())
        }

        BackupCommand::Import { file } => {
            let backup: Backup = util::read_json_file(&file)?;
            let prompt = format!(
                "Restore {}? Existing sections present in the file will be replaced.\n{}",
                file.display(),
                summary(&backup)
            );
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }
            let resp = client.import_backup(&backup).await?;
            output::print_status(&resp.message, global.quiet);
            Ok(())
        }
    }
}
