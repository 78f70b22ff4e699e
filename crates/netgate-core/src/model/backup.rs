// ── Configuration backup document ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::dns::BlockedDomain;
use super::group::RuleGroup;
use super::network::{InterfaceConfig, NatConfig, StaticRoute};
use super::rule::RuleRecord;

/// Snapshot of every persisted resource.
///
/// On import each section that is present replaces the corresponding
/// resource wholesale; absent sections are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Backup {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exported_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interfaces: Option<Vec<InterfaceConfig>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_rules: Option<Vec<RuleRecord>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub firewall_groups: Option<Vec<RuleGroup>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<StaticRoute>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub blocked_domains: Option<Vec<BlockedDomain>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nat: Option<NatConfig>,
}

impl Backup {
    pub fn is_empty(&self) -> bool {
        self.interfaces.is_none()
            && self.firewall_rules.is_none()
            && self.firewall_groups.is_none()
            && self.routes.is_none()
            && self.blocked_domains.is_none()
            && self.nat.is_none()
    }
}
