// Interface, NAT and static-route endpoints.

use reqwest::Method;

use netgate_core::{
    DataResponse, EntityId, InterfaceConfig, InterfaceDraft, MessageResponse, NatConfig,
    RouteDraft, StaticRoute,
};

use crate::client::NetgateClient;
use crate::error::Error;

impl NetgateClient {
    // ── Interfaces ───────────────────────────────────────────────────

    pub async fn list_interfaces(&self) -> Result<Vec<InterfaceConfig>, Error> {
        self.get("network/interfaces").await
    }

    /// Create or replace an interface keyed by its name.
    pub async fn save_interface(&self, draft: &InterfaceDraft) -> Result<InterfaceConfig, Error> {
        let resp: DataResponse<InterfaceConfig> = self
            .send_json(Method::POST, "network/interfaces", draft)
            .await?;
        Ok(resp.data)
    }

    pub async fn update_interface(
        &self,
        name: &str,
        draft: &InterfaceDraft,
    ) -> Result<InterfaceConfig, Error> {
        let resp: DataResponse<InterfaceConfig> = self
            .send_json(Method::PUT, &format!("network/interfaces/{name}"), draft)
            .await?;
        Ok(resp.data)
    }

    pub async fn delete_interface(&self, name: &str) -> Result<MessageResponse, Error> {
        self.send_empty(Method::DELETE, &format!("network/interfaces/{name}"))
            .await
    }

    // ── NAT ──────────────────────────────────────────────────────────

    pub async fn nat(&self) -> Result<NatConfig, Error> {
        self.get("nat").await
    }

    pub async fn set_nat(&self, config: &NatConfig) -> Result<NatConfig, Error> {
        let resp: DataResponse<NatConfig> = self.send_json(Method::PATCH, "nat", config).await?;
        Ok(resp.data)
    }

    // ── Static routes ────────────────────────────────────────────────

    pub async fn list_routes(&self) -> Result<Vec<StaticRoute>, Error> {
        self.get("routes").await
    }

    pub async fn create_route(&self, draft: &RouteDraft) -> Result<StaticRoute, Error> {
        let resp: DataResponse<StaticRoute> = self.send_json(Method::POST, "routes", draft).await?;
        Ok(resp.data)
    }

    pub async fn update_route(&self, id: &EntityId, draft: &RouteDraft) -> Result<StaticRoute, Error> {
        let resp: DataResponse<StaticRoute> = self
            .send_json(Method::PUT, &format!("routes/{id}"), draft)
            .await?;
        Ok(resp.data)
    }

    pub async fn delete_route(&self, id: &EntityId) -> Result<MessageResponse, Error> {
        self.send_empty(Method::DELETE, &format!("routes/{id}")).await
    }
}
