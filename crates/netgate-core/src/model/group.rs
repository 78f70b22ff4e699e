// ── Rule groups ──

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::entity_id::EntityId;
use super::timestamp;
use crate::error::CoreError;

/// Named bucket of rules that can be toggled together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleGroup {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    pub group_name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub updated_at: Option<DateTime<Utc>>,
}

/// A group together with the number of rules currently pointing at it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSummary {
    #[serde(flatten)]
    pub group: RuleGroup,
    pub rule_count: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDraft {
    #[serde(default)]
    pub group_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl GroupDraft {
    pub fn new(group_name: impl Into<String>) -> Self {
        Self {
            group_name: group_name.into(),
            description: None,
        }
    }

    pub(crate) fn build(self, id: EntityId, created_at: DateTime<Utc>) -> Result<RuleGroup, CoreError> {
        let group_name = self.group_name.trim().to_owned();
        if group_name.is_empty() {
            return Err(CoreError::validation("group_name must not be empty"));
        }
        Ok(RuleGroup {
            id,
            group_name,
            description: self
                .description
                .map(|d| d.trim().to_owned())
                .filter(|d| !d.is_empty()),
            created_at,
            updated_at: None,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn group_name_is_required() {
        let err = GroupDraft::new("  ")
            .build(EntityId::generate(), Utc::now())
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
    }

    #[test]
    fn summary_flattens_group_fields() {
        let group = GroupDraft::new("office")
            .build(EntityId::from("g1"), Utc::now())
            .unwrap();
        let json = serde_json::to_value(GroupSummary {
            group,
            rule_count: 3,
        })
        .unwrap();
        assert_eq!(json["group_name"], "office");
        assert_eq!(json["_id"], "g1");
        assert_eq!(json["rule_count"], 3);
    }
}
