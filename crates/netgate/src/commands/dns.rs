//! DNS blocking command handlers.

use tabled::Tabled;

use netgate_api::NetgateClient;
use netgate_core::{BlockedDomain, DomainDraft};

use crate::cli::{DnsArgs, DnsCommand, GlobalOpts};
use crate::error::CliError;
use crate::output;

#[derive(Tabled)]
struct DomainRow {
    #[tabled(rename = "Domain")]
    domain: String,
    #[tabled(rename = "www.")]
    wildcard: String,
    #[tabled(rename = "Note")]
    note: String,
    #[tabled(rename = "Added")]
    added: String,
}

impl DomainRow {
    fn new(d: &BlockedDomain, color: bool) -> Self {
        Self {
            domain: d.domain.clone(),
            wildcard: output::yes_no(d.use_wildcard, color),
            note: d.note.clone(),
            added: d.created_at.format("%Y-%m-%d").to_string(),
        }
    }
}

pub async fn handle(
    client: &NetgateClient,
    args: DnsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        DnsCommand::List => {
            let color = output::should_color(&global.color);
            let domains = client.list_domains().await?;
            let out = output::render_list(
                &global.output,
                &domains,
                |d| DomainRow::new(d, color),
                |d| d.domain.clone(),
            )?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        DnsCommand::Block {
            domain,
            note,
            no_wildcard,
        } => {
            let blocked = client
                .block_domain(&DomainDraft {
                    domain,
                    note,
                    use_wildcard: !no_wildcard,
                })
                .await?;
            output::print_status(&format!("{} blocked", blocked.domain), global.quiet);
            Ok(())
        }

        DnsCommand::Unblock { domain } => {
            let resp = client.unblock_domain(&domain).await?;
            output::print_status(&resp.message, global.quiet);
            Ok(())
        }

        DnsCommand::Import { url } => {
            let added = client.import_adblock_list(&url).await?;
            output::print_status(&format!("{added} domain(s) imported"), global.quiet);
            Ok(())
        }

        DnsCommand::BlockDoh => {
            let added = client.block_doh().await?;
            let message = if added == 0 {
                "DNS-over-HTTPS blocking already enabled".to_owned()
            } else {
                format!("DNS-over-HTTPS blocking enabled ({added} rule(s) added)")
            };
            output::print_status(&message, global.quiet);
            Ok(())
        }
    }
}
