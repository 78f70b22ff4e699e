//! Rule group command handlers.

use tabled::Tabled;

use netgate_api::NetgateClient;
use netgate_core::{GroupDraft, GroupSummary, RuleGroup};

use crate::cli::{GlobalOpts, GroupsArgs, GroupsCommand};
use crate::error::CliError;
use crate::output;

use super::{rules, util};

#[derive(Tabled)]
struct GroupRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Rules")]
    rule_count: usize,
    #[tabled(rename = "Description")]
    description: String,
}

impl From<&GroupSummary> for GroupRow {
    fn from(g: &GroupSummary) -> Self {
        Self {
            id: g.group.id.to_string(),
            name: g.group.group_name.clone(),
            rule_count: g.rule_count,
            description: g.group.description.clone().unwrap_or_default(),
        }
    }
}

fn group_detail(g: &RuleGroup) -> String {
    format!(
        "ID:          {}\nName:        {}\nDescription: {}",
        g.id,
        g.group_name,
        g.description.as_deref().unwrap_or("-")
    )
}

pub async fn handle(
    client: &NetgateClient,
    args: GroupsArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        GroupsCommand::List => {
            let groups = client.list_groups().await?;
            let out = output::render_list(&global.output, &groups, |g| GroupRow::from(g), |g| {
                g.group.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Rules { id } => {
            let rules = client.group_rules(&util::entity_id(&id)).await?;
            rules::print_rules(&rules, global)
        }

        GroupsCommand::Create { name, description } => {
            let group = client
                .create_group(&GroupDraft {
                    group_name: name,
                    description,
                })
                .await?;
            output::print_status("Group created", global.quiet);
            let out = output::render_single(&global.output, &group, group_detail, |g| {
                g.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Update {
            id,
            name,
            description,
        } => {
            let group = client
                .update_group(
                    &util::entity_id(&id),
                    &GroupDraft {
                        group_name: name,
                        description,
                    },
                )
                .await?;
            output::print_status("Group updated", global.quiet);
            let out = output::render_single(&global.output, &group, group_detail, |g| {
                g.id.to_string()
            })?;
            output::print_output(&out, global.quiet);
            Ok(())
        }

        GroupsCommand::Delete { id } => {
            let prompt = format!("Delete group {id}? Its rules will be kept but ungrouped.");
            if !util::confirm(&prompt, global.yes)? {
                return Ok(());
            }
            let resp = client.delete_group(&util::entity_id(&id)).await?;
            output::print_status(&resp.message, global.quiet);
            Ok(())
        }

        GroupsCommand::Enable { id } => toggle(client, &id, true, global).await,
        GroupsCommand::Disable { id } => toggle(client, &id, false, global).await,
    }
}

async fn toggle(
    client: &NetgateClient,
    id: &str,
    enable: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let count = client
        .set_group_rules_enabled(&util::entity_id(id), enable)
        .await?;
    let state = if enable { "enabled" } else { "disabled" };
    output::print_status(&format!("{count} rule(s) {state}"), global.quiet);
    Ok(())
}
