// ── Rule matcher ──
//
// First-match-wins decision engine. A `RuleMatcher` is compiled from an
// ordered rule set whenever the set changes: disabled rules are dropped,
// port and source filters are parsed once, and rules are bucketed by
// (direction, protocol) so an evaluation only walks the rules that can
// possibly apply. Bucket order is evaluation order.

use std::collections::HashMap;
use std::net::IpAddr;

use chrono::NaiveDateTime;
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::CoreError;
use crate::model::{Direction, EntityId, PortSpec, Profile, Protocol, Rule, RuleAction};
use crate::schedule::ScheduleWindow;

/// A connection attempt to classify.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub src_ip: IpAddr,
    pub protocol: Protocol,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
    pub direction: Direction,
    #[serde(default)]
    pub profile: Profile,
}

/// Outcome of evaluating a connection against the rule set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Decision {
    pub action: RuleAction,
    #[serde(default)]
    pub matched_rule_id: Option<EntityId>,
    #[serde(default)]
    pub rule_name: Option<String>,
    /// `true` when no rule matched and the configured default applied.
    #[serde(default)]
    pub default_applied: bool,
}

#[derive(Debug, Clone)]
struct CompiledRule {
    id: EntityId,
    rule_name: String,
    action: RuleAction,
    profile: Profile,
    window: Option<ScheduleWindow>,
    ports: Option<PortSpec>,
    /// `None` matches any source.
    sources: Option<Vec<IpNetwork>>,
}

impl CompiledRule {
    fn compile(rule: &Rule) -> Result<Self, CoreError> {
        let ports = rule.port.as_deref().map(PortSpec::parse).transpose()?;
        let sources = if rule.source_ips.is_empty() {
            None
        } else {
            let nets = rule
                .source_ips
                .iter()
                .map(|s| parse_source(s))
                .collect::<Result<Vec<_>, _>>()?;
            Some(nets)
        };

        Ok(Self {
            id: rule.id.clone(),
            rule_name: rule.rule_name.clone(),
            action: rule.action,
            profile: rule.profile,
            window: ScheduleWindow::of(rule),
            ports,
            sources,
        })
    }

    fn matches(&self, conn: &Connection, now: NaiveDateTime) -> bool {
        if self.window.is_some_and(|w| !w.contains(now)) {
            return false;
        }
        if let Some(ports) = &self.ports {
            match conn.port {
                Some(port) if ports.contains(port) => {}
                _ => return false,
            }
        }
        if let Some(sources) = &self.sources {
            if !sources.iter().any(|net| net.contains(conn.src_ip)) {
                return false;
            }
        }
        self.profile == Profile::Any || self.profile == conn.profile
    }
}

fn parse_source(raw: &str) -> Result<IpNetwork, CoreError> {
    if let Ok(addr) = raw.parse::<IpAddr>() {
        return Ok(IpNetwork::from(addr));
    }
    raw.parse::<IpNetwork>()
        .map_err(|_| CoreError::validation(format!("invalid source address '{raw}'")))
}

/// Compiled, immutable view of one rule set.
#[derive(Debug, Clone)]
pub struct RuleMatcher {
    rules: Vec<CompiledRule>,
    buckets: HashMap<(Direction, Protocol), Vec<usize>>,
    default_action: RuleAction,
}

impl RuleMatcher {
    /// Compile `rules`, which must already be in evaluation order.
    pub fn compile<'a>(rules: impl IntoIterator<Item = &'a Rule>, default_action: RuleAction) -> Self {
        let mut compiled = Vec::new();
        let mut buckets: HashMap<(Direction, Protocol), Vec<usize>> = HashMap::new();

        for rule in rules.into_iter().filter(|r| r.enabled) {
            let entry = match CompiledRule::compile(rule) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(rule_id = %rule.id, error = %e, "skipping rule that failed to compile");
                    continue;
                }
            };
            let idx = compiled.len();
            compiled.push(entry);

            let protocols: &[Protocol] = match rule.protocol {
                Protocol::Any => &[Protocol::Tcp, Protocol::Udp],
                Protocol::Tcp => &[Protocol::Tcp],
                Protocol::Udp => &[Protocol::Udp],
            };
            for &protocol in protocols {
                buckets
                    .entry((rule.direction, protocol))
                    .or_default()
                    .push(idx);
            }
        }

        Self {
            rules: compiled,
            buckets,
            default_action,
        }
    }

    pub fn default_action(&self) -> RuleAction {
        self.default_action
    }

    /// Number of enabled rules taking part in evaluation.
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Decide the fate of `conn` at local time `now`.
    pub fn decide(&self, conn: &Connection, now: NaiveDateTime) -> Result<Decision, CoreError> {
        if conn.protocol == Protocol::Any {
            return Err(CoreError::validation(
                "connection protocol must be TCP or UDP",
            ));
        }

        let hit = self
            .buckets
            .get(&(conn.direction, conn.protocol))
            .into_iter()
            .flatten()
            .map(|&idx| &self.rules[idx])
            .find(|rule| rule.matches(conn, now));

        Ok(match hit {
            Some(rule) => Decision {
                action: rule.action,
                matched_rule_id: Some(rule.id.clone()),
                rule_name: Some(rule.rule_name.clone()),
                default_applied: false,
            },
            None => Decision {
                action: self.default_action,
                matched_rule_id: None,
                rule_name: None,
                default_applied: true,
            },
        })
    }
}

impl Default for RuleMatcher {
    fn default() -> Self {
        Self::compile(std::iter::empty(), RuleAction::Deny)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{PortValue, RuleDraft, SourceIps};
    use chrono::{NaiveDate, Utc};

    fn rule(name: &str, seq: u64, f: impl FnOnce(&mut RuleDraft)) -> Rule {
        let mut draft = RuleDraft {
            rule_name: name.into(),
            protocol: Some(Protocol::Tcp),
            action: Some(RuleAction::Allow),
            direction: Some(Direction::In),
            ..RuleDraft::default()
        };
        f(&mut draft);
        draft
            .build(EntityId::from(name), Utc::now(), seq)
            .unwrap()
    }

    fn conn(ip: &str, protocol: Protocol, port: Option<u16>) -> Connection {
        Connection {
            src_ip: ip.parse().unwrap(),
            protocol,
            port,
            direction: Direction::In,
            profile: Profile::Public,
        }
    }

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 5, 15)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn empty_rule_set_applies_default() {
        let m = RuleMatcher::compile(std::iter::empty(), RuleAction::Deny);
        let d = m.decide(&conn("10.0.0.1", Protocol::Tcp, Some(80)), noon()).unwrap();
        assert_eq!(d.action, RuleAction::Deny);
        assert!(d.default_applied);
        assert_eq!(d.matched_rule_id, None);
    }

    #[test]
    fn first_rule_in_order_wins() {
        let rules = vec![
            rule("deny-web", 1, |d| {
                d.action = Some(RuleAction::Deny);
                d.port = Some(PortValue::Text("80".into()));
            }),
            rule("allow-all", 0, |_| {}),
        ];
        let m = RuleMatcher::compile(&rules, RuleAction::Deny);

        let d = m.decide(&conn("10.0.0.1", Protocol::Tcp, Some(80)), noon()).unwrap();
        assert_eq!(d.rule_name.as_deref(), Some("deny-web"));
        assert_eq!(d.action, RuleAction::Deny);

        let d = m.decide(&conn("10.0.0.1", Protocol::Tcp, Some(22)), noon()).unwrap();
        assert_eq!(d.rule_name.as_deref(), Some("allow-all"));
    }

    #[test]
    fn any_protocol_rule_matches_tcp_and_udp() {
        let rules = vec![rule("any", 0, |d| d.protocol = Some(Protocol::Any))];
        let m = RuleMatcher::compile(&rules, RuleAction::Deny);
        for p in [Protocol::Tcp, Protocol::Udp] {
            let d = m.decide(&conn("1.2.3.4", p, None), noon()).unwrap();
            assert_eq!(d.action, RuleAction::Allow);
        }
    }

    #[test]
    fn protocol_and_direction_must_match() {
        let rules = vec![rule("udp-out", 0, |d| {
            d.protocol = Some(Protocol::Udp);
            d.direction = Some(Direction::Out);
        })];
        let m = RuleMatcher::compile(&rules, RuleAction::Deny);
        assert!(
            m.decide(&conn("1.2.3.4", Protocol::Udp, None), noon())
                .unwrap()
                .default_applied
        );
    }

    #[test]
    fn source_matches_exact_and_cidr() {
        let rules = vec![rule("lan", 0, |d| {
            d.source_ips = Some(SourceIps::List(vec![
                "192.168.1.0/24".into(),
                "10.0.0.7".into(),
            ]));
        })];
        let m = RuleMatcher::compile(&rules, RuleAction::Deny);
        let allowed = |ip: &str| {
            !m.decide(&conn(ip, Protocol::Tcp, None), noon())
                .unwrap()
                .default_applied
        };
        assert!(allowed("192.168.1.42"));
        assert!(allowed("10.0.0.7"));
        assert!(!allowed("10.0.0.8"));
        assert!(!allowed("192.168.2.1"));
    }

    #[test]
    fn port_rule_needs_connection_port() {
        let rules = vec![rule("ssh", 0, |d| {
            d.port = Some(PortValue::Text("22,8000-8100".into()));
        })];
        let m = RuleMatcher::compile(&rules, RuleAction::Deny);
        let hit = |port| {
            !m.decide(&conn("1.1.1.1", Protocol::Tcp, port), noon())
                .unwrap()
                .default_applied
        };
        assert!(hit(Some(22)));
        assert!(hit(Some(8050)));
        assert!(!hit(Some(23)));
        assert!(!hit(None));
    }

    #[test]
    fn profile_any_matches_everything_else_must_be_equal() {
        let rules = vec![rule("private-only", 0, |d| d.profile = Some(Profile::Private))];
        let m = RuleMatcher::compile(&rules, RuleAction::Deny);
        let mut c = conn("1.1.1.1", Protocol::Tcp, None);
        assert!(m.decide(&c, noon()).unwrap().default_applied);
        c.profile = Profile::Private;
        assert!(!m.decide(&c, noon()).unwrap().default_applied);
    }

    #[test]
    fn disabled_and_inactive_rules_are_skipped() {
        let rules = vec![
            rule("off", 0, |d| {
                d.enabled = false;
                d.action = Some(RuleAction::Deny);
            }),
            rule("night", 1, |d| {
                d.action = Some(RuleAction::Deny);
                d.schedule_start = Some("00:00".into());
                d.schedule_end = Some("06:00".into());
            }),
            rule("fallback", 2, |_| {}),
        ];
        let m = RuleMatcher::compile(&rules, RuleAction::Deny);
        assert_eq!(m.len(), 2);
        let d = m.decide(&conn("1.1.1.1", Protocol::Tcp, None), noon()).unwrap();
        assert_eq!(d.rule_name.as_deref(), Some("fallback"));
    }

    #[test]
    fn any_protocol_connection_is_rejected() {
        let m = RuleMatcher::default();
        assert!(m.decide(&conn("1.1.1.1", Protocol::Any, None), noon()).is_err());
    }

    #[test]
    fn configured_default_is_used() {
        let m = RuleMatcher::compile(std::iter::empty(), RuleAction::Allow);
        let d = m.decide(&conn("1.1.1.1", Protocol::Udp, Some(53)), noon()).unwrap();
        assert_eq!(d.action, RuleAction::Allow);
    }
}
