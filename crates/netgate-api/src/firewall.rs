// Firewall rule, rule-group and evaluation endpoints.

use reqwest::Method;

use netgate_core::{
    Connection, DataResponse, Decision, EnableRequest, EntityId, GroupDraft, GroupSummary,
    MessageResponse, ReorderRulesRequest, Rule, RuleDraft, RuleGroup,
};

use crate::client::NetgateClient;
use crate::error::Error;

impl NetgateClient {
    // ── Rules ────────────────────────────────────────────────────────

    /// All rules in evaluation order.
    pub async fn list_rules(&self) -> Result<Vec<Rule>, Error> {
        self.get("firewall/rules").await
    }

    pub async fn get_rule(&self, id: &EntityId) -> Result<Rule, Error> {
        self.get(&format!("firewall/rules/{id}")).await
    }

    pub async fn create_rule(&self, draft: &RuleDraft) -> Result<Rule, Error> {
        let resp: DataResponse<Rule> = self
            .send_json(Method::POST, "firewall/rules", draft)
            .await?;
        Ok(resp.data)
    }

    pub async fn update_rule(&self, id: &EntityId, draft: &RuleDraft) -> Result<Rule, Error> {
        let resp: DataResponse<Rule> = self
            .send_json(Method::PUT, &format!("firewall/rules/{id}"), draft)
            .await?;
        Ok(resp.data)
    }

    pub async fn delete_rule(&self, id: &EntityId) -> Result<MessageResponse, Error> {
        self.send_empty(Method::DELETE, &format!("firewall/rules/{id}"))
            .await
    }

    pub async fn reorder_rules(&self, ordered_ids: Vec<EntityId>) -> Result<MessageResponse, Error> {
        self.send_json(
            Method::PUT,
            "firewall/rules/order",
            &ReorderRulesRequest { ordered_ids },
        )
        .await
    }

    /// Classify a connection against the live rule set.
    pub async fn evaluate(&self, connection: &Connection) -> Result<Decision, Error> {
        self.send_json(Method::POST, "firewall/evaluate", connection)
            .await
    }

    // ── Groups ───────────────────────────────────────────────────────

    pub async fn list_groups(&self) -> Result<Vec<GroupSummary>, Error> {
        self.get("firewall/groups").await
    }

    pub async fn create_group(&self, draft: &GroupDraft) -> Result<RuleGroup, Error> {
        let resp: DataResponse<RuleGroup> = self
            .send_json(Method::POST, "firewall/groups", draft)
            .await?;
        Ok(resp.data)
    }

    pub async fn update_group(&self, id: &EntityId, draft: &GroupDraft) -> Result<RuleGroup, Error> {
        let resp: DataResponse<RuleGroup> = self
            .send_json(Method::PUT, &format!("firewall/groups/{id}"), draft)
            .await?;
        Ok(resp.data)
    }

    pub async fn delete_group(&self, id: &EntityId) -> Result<MessageResponse, Error> {
        self.send_empty(Method::DELETE, &format!("firewall/groups/{id}"))
            .await
    }

    /// Member rules of a group in evaluation order.
    pub async fn group_rules(&self, id: &EntityId) -> Result<Vec<Rule>, Error> {
        self.get(&format!("firewall/groups/{id}/rules")).await
    }

    /// Enable or disable every rule in a group; returns the number touched.
    pub async fn set_group_rules_enabled(&self, id: &EntityId, enable: bool) -> Result<usize, Error> {
        let resp: DataResponse<usize> = self
            .send_json(
                Method::PATCH,
                &format!("firewall/groups/{id}/rules/enable"),
                &EnableRequest { enable },
            )
            .await?;
        Ok(resp.data)
    }
}
