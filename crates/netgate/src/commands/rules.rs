//! Firewall rule command handlers.

use tabled::Tabled;

use netgate_api::NetgateClient;
use netgate_core::{PortValue, Rule, RuleDraft, SourceIps};

use crate::cli::{GlobalOpts, RuleFields, RulesArgs, RulesCommand};
use crate::error::CliError;
use crate::output;

use super::util;

// ── Rule table row ──────────────────────────────────────────────────

#[derive(Tabled)]
struct RuleRow {
    #[tabled(rename = "Pri")]
    priority: i32,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Action")]
    action: String,
    #[tabled(rename = "Proto")]
    protocol: String,
    #[tabled(rename = "Dir")]
    direction: String,
    #[tabled(rename = "Source")]
    source: String,
    #[tabled(rename = "Port")]
    port: String,
    #[tabled(rename = "Schedule")]
    schedule: String,
    #[tabled(rename = "Enabled")]
    enabled: String,
}

impl RuleRow {
    fn new(r: &Rule, color: bool) -> Self {
        Self {
            priority: r.priority,
            id: r.id.to_string(),
            name: r.rule_name.clone(),
            action: output::paint_action(r.action, color),
            protocol: r.protocol.to_string(),
            direction: r.direction.to_string(),
            source: sources(r),
            port: r.port.clone().unwrap_or_else(|| "any".into()),
            schedule: schedule(r),
            enabled: output::yes_no(r.enabled, color),
        }
    }
}

fn sources(r: &Rule) -> String {
    if r.source_ips.is_empty() {
        "any".into()
    } else {
        r.source_ips.iter().cloned().collect::<Vec<_>>().join(",")
    }
}

fn schedule(r: &Rule) -> String {
    let (Some(start), Some(end)) = (r.schedule_start, r.schedule_end) else {
        return "always".into();
    };
    let days = r.days_of_week.indices();
    if days.is_empty() {
        format!("{start}-{end}")
    } else {
        let days: Vec<String> = days.iter().map(ToString::to_string).collect();
        format!("{start}-{end} [{}]", days.join(","))
    }
}

fn rule_detail(r: &Rule) -> String {
    [
        format!("ID:          {}", r.id),
        format!("Name:        {}", r.rule_name),
        format!("Priority:    {}", r.priority),
        format!("Action:      {}", r.action),
        format!("Protocol:    {}", r.protocol),
        format!("Direction:   {}", r.direction),
        format!("Profile:     {}", r.profile),
        format!("Source:      {}", sources(r)),
        format!("Port:        {}", r.port.as_deref().unwrap_or("any")),
        format!("Schedule:    {}", schedule(r)),
        format!("Group:       {}", util::or_dash(r.group_id.as_ref())),
        format!("Enabled:     {}", r.enabled),
        format!("Description: {}", r.description.as_deref().unwrap_or("-")),
        format!("Created:     {}", r.created_at.format("%Y-%m-%d %H:%M:%S UTC")),
    ]
    .join("\n")
}

/// Render a rule list in the selected format.
pub(super) fn print_rules(rules: &[Rule], global: &GlobalOpts) -> Result<(), CliError> {
    let color = output::should_color(&global.color);
    let out = output::render_list(
        &global.output,
        rules,
        |r| RuleRow::new(r, color),
        |r| r.id.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

fn print_rule(rule: &Rule, global: &GlobalOpts) -> Result<(), CliError> {
    let out = output::render_single(&global.output, rule, rule_detail, |r| r.id.to_string())?;
    output::print_output(&out, global.quiet);
    Ok(())
}

/// Overlay the flags that were given onto `draft`.
fn apply_fields(draft: &mut RuleDraft, fields: RuleFields) {
    if let Some(name) = fields.name {
        draft.rule_name = name;
    }
    if let Some(action) = fields.action {
        draft.action = Some(action.into());
    }
    if let Some(protocol) = fields.protocol {
        draft.protocol = Some(protocol.into());
    }
    if let Some(direction) = fields.direction {
        draft.direction = Some(direction.into());
    }
    if let Some(profile) = fields.net_profile {
        draft.profile = Some(profile.into());
    }
    if let Some(source) = fields.source {
        draft.source_ips = Some(SourceIps::Text(source));
    }
    if let Some(port) = fields.port {
        draft.port = Some(PortValue::Text(port));
    }
    if let Some(description) = fields.description {
        draft.description = Some(description);
    }
    if let Some(priority) = fields.priority {
        draft.priority = priority;
    }
    if fields.schedule_start.is_some() {
        draft.schedule_start = fields.schedule_start;
        draft.schedule_end = fields.schedule_end;
    }
    if let Some(days) = fields.days {
        draft.days_of_week = days;
    }
    if let Some(group) = fields.group {
        draft.group_id = Some(group);
    }
    if let Some(enabled) = fields.enabled {
        draft.enabled = enabled;
    }
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &NetgateClient,
    args: RulesArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match args.command {
        RulesCommand::List => {
            let rules = client.list_rules().await?;
            print_rules(&rules, global)
        }

        RulesCommand::Get { id } => {
            let rule = client.get_rule(&util::entity_id(&id)).await?;
            print_rule(&rule, global)
        }

        RulesCommand::Create { fields, from_file } => {
            let draft = match from_file {
                Some(path) => util::read_json_file(&path)?,
                None => {
                    let mut draft = RuleDraft::default();
                    apply_fields(&mut draft, fields);
                    draft
                }
            };
            let rule = client.create_rule(&draft).await?;
            output::print_status("Rule created", global.quiet);
            print_rule(&rule, global)
        }

        RulesCommand::Update {
            id,
            fields,
            from_file,
        } => {
            let id = util::entity_id(&id);
            let draft = match from_file {
                Some(path) => util::read_json_file(&path)?,
                None => {
                    let current = client.get_rule(&id).await?;
                    let mut draft = RuleDraft::from(&current);
                    apply_fields(&mut draft, fields);
                    draft
                }
            };
            let rule = client.update_rule(&id, &draft).await?;
            output::print_status("Rule updated", global.quiet);
            print_rule(&rule, global)
        }

        RulesCommand::Enable { id } => set_enabled(client, &id, true, global).await,
        RulesCommand::Disable { id } => set_enabled(client, &id, false, global).await,

        RulesCommand::Delete { id } => {
            if !util::confirm(&format!("Delete rule {id}?"), global.yes)? {
                return Ok(());
            }
            let resp = client.delete_rule(&util::entity_id(&id)).await?;
            output::print_status(&resp.message, global.quiet);
            Ok(())
        }

        RulesCommand::Reorder { ids } => {
            let ordered: Vec<_> = ids.iter().map(|id| util::entity_id(id)).collect();
            let resp = client.reorder_rules(ordered).await?;
            output::print_status(&resp.message, global.quiet);
            let rules = client.list_rules().await?;
            print_rules(&rules, global)
        }
    }
}

async fn set_enabled(
    client: &NetgateClient,
    id: &str,
    enabled: bool,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let id = util::entity_id(id);
    let current = client.get_rule(&id).await?;
    let mut draft = RuleDraft::from(&current);
    draft.enabled = enabled;
    client.update_rule(&id, &draft).await?;
    let state = if enabled { "enabled" } else { "disabled" };
    output::print_status(&format!("Rule {state}"), global.quiet);
    Ok(())
}
