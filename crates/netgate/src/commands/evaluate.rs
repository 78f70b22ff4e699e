//! Connection evaluation ("would this be allowed?").

use netgate_api::NetgateClient;
use netgate_core::{Connection, Decision};

use crate::cli::{EvaluateArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

fn decision_detail(d: &Decision, color: bool) -> String {
    let verdict = output::paint_action(d.action, color);
    match (&d.matched_rule_id, &d.rule_name) {
        (Some(id), Some(name)) => format!("{verdict}  (rule \"{name}\", {id})"),
        (Some(id), None) => format!("{verdict}  (rule {id})"),
        _ if d.default_applied => format!("{verdict}  (no rule matched, default action)"),
        _ => verdict,
    }
}

pub async fn handle(
    client: &NetgateClient,
    args: EvaluateArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    let connection = Connection {
        src_ip: args.src,
        protocol: args.protocol.into(),
        port: args.port,
        direction: args.direction.into(),
        profile: args.net_profile.into(),
    };
    let decision = client.evaluate(&connection).await?;

    let color = output::should_color(&global.color);
    let out = output::render_single(
        &global.output,
        &decision,
        |d| decision_detail(d, color),
        |d| d.action.to_string(),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use netgate_core::{EntityId, RuleAction};

    #[test]
    fn detail_names_the_matching_rule() {
        let d = Decision {
            action: RuleAction::Deny,
            matched_rule_id: Some(EntityId::from("r1")),
            rule_name: Some("block ssh".into()),
            default_applied: false,
        };
        assert_eq!(decision_detail(&d, false), "DENY  (rule \"block ssh\", r1)");
    }

    #[test]
    fn detail_flags_default_action() {
        let d = Decision {
            action: RuleAction::Allow,
            matched_rule_id: None,
            rule_name: None,
            default_applied: true,
        };
        assert!(decision_detail(&d, false).contains("default action"));
    }
}
