// DNS domain-blocking endpoints.

use reqwest::Method;

use netgate_core::{AdblockListRequest, BlockedDomain, DataResponse, DomainDraft, MessageResponse};

use crate::client::NetgateClient;
use crate::error::Error;

impl NetgateClient {
    pub async fn list_domains(&self) -> Result<Vec<BlockedDomain>, Error> {
        self.get("dns/domains").await
    }

    pub async fn block_domain(&self, draft: &DomainDraft) -> Result<BlockedDomain, Error> {
        let resp: DataResponse<BlockedDomain> = self
            .send_json(Method::POST, "dns/domains", draft)
            .await?;
        Ok(resp.data)
    }

    pub async fn unblock_domain(&self, domain: &str) -> Result<MessageResponse, Error> {
        self.send_empty(Method::DELETE, &format!("dns/domains/{domain}"))
            .await
    }

    /// Have the server download and merge a hosts/adblock list; returns
    /// the number of domains added.
    pub async fn import_adblock_list(&self, url: &str) -> Result<usize, Error> {
        let body = AdblockListRequest { url: url.to_owned() };
        let resp: DataResponse<usize> = self
            .send_json(Method::POST, "dns/adblocklist", &body)
            .await?;
        Ok(resp.data)
    }

    /// Install the DNS-over-HTTPS blocking rule; returns 1 if created, 0 if
    /// it already existed.
    pub async fn block_doh(&self) -> Result<usize, Error> {
        let resp: DataResponse<usize> = self.send_empty(Method::POST, "dns/doh-block").await?;
        Ok(resp.data)
    }
}
