// Service info, account, log and backup endpoints.

use reqwest::Method;

use netgate_core::{
    Backup, BlockedPacket, LogEntry, LogQuery, LoginRequest, MessageResponse, RegisterResponse,
    UserInfo,
};

use crate::client::NetgateClient;
use crate::error::Error;

impl NetgateClient {
    // ── Service ──────────────────────────────────────────────────────

    /// Unauthenticated liveness check.
    pub async fn root(&self) -> Result<MessageResponse, Error> {
        self.send_public::<_, ()>(Method::GET, "", None).await
    }

    // ── Accounts ─────────────────────────────────────────────────────

    /// Self-registration; only routed when the server allows it.
    pub async fn register(&self, username: &str, password: &str) -> Result<RegisterResponse, Error> {
        let body = LoginRequest {
            username: username.to_owned(),
            password: password.to_owned(),
        };
        self.send_public(Method::POST, "auth/register", Some(&body))
            .await
    }

    pub async fn me(&self) -> Result<UserInfo, Error> {
        self.get("auth/me").await
    }

    // ── Logs ─────────────────────────────────────────────────────────

    pub async fn logs(&self, query: &LogQuery) -> Result<Vec<LogEntry>, Error> {
        self.get_with_query("logs", query).await
    }

    /// Dropped packets, newest first.
    pub async fn blocked_packets(&self) -> Result<Vec<BlockedPacket>, Error> {
        self.get("logs/blocked").await
    }

    /// Raised alarms, newest first.
    pub async fn alerts(&self) -> Result<Vec<LogEntry>, Error> {
        self.get("logs/alerts").await
    }

    // ── Backup ───────────────────────────────────────────────────────

    pub async fn export_backup(&self) -> Result<Backup, Error> {
        self.get("backup/export").await
    }

    pub async fn import_backup(&self, backup: &Backup) -> Result<MessageResponse, Error> {
        self.send_json(Method::POST, "backup/import", backup).await
    }
}
