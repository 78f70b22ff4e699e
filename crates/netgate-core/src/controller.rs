// ── Controller ──
//
// Facade over the data store, the session registry and the log books.
// Mutations are serialized through a command channel; reads go straight
// to store snapshots.

use std::sync::Arc;

use chrono::{Local, NaiveDateTime, Utc};
use tokio::sync::{Mutex, mpsc, oneshot};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::auth::AuthService;
use crate::command::{Command, CommandEnvelope, CommandResult};
use crate::config::GatewayConfig;
use crate::error::CoreError;
use crate::logbook::LogBook;
use crate::matcher::{Connection, Decision};
use crate::model::dns::{DOH_GROUP_NAME, DOH_RESOLVERS};
use crate::model::log::DROP_MARKER;
use crate::model::{
    Backup, BlockedDomain, Direction, EntityId, GroupSummary, InterfaceConfig, NatConfig,
    PortValue, Protocol, Rule, RuleAction, RuleDraft, SourceIps, StaticRoute,
};
use crate::store::DataStore;

const COMMAND_CHANNEL_SIZE: usize = 64;

/// Name of the rule created by [`Command::BlockDoh`].
pub const DOH_RULE_NAME: &str = "Block DoH resolvers";

/// The main entry point for consumers.
///
/// Cheaply cloneable via `Arc<ControllerInner>`.
#[derive(Clone)]
pub struct Controller {
    inner: Arc<ControllerInner>,
}

struct ControllerInner {
    config: GatewayConfig,
    store: Arc<DataStore>,
    auth: AuthService,
    logs: LogBook,
    command_tx: mpsc::Sender<CommandEnvelope>,
    command_rx: Mutex<Option<mpsc::Receiver<CommandEnvelope>>>,
    cancel: CancellationToken,
    task_handles: Mutex<Vec<JoinHandle<()>>>,
}

impl Controller {
    /// Create a controller. Call [`start()`](Self::start) before
    /// executing commands.
    pub fn new(config: GatewayConfig) -> Self {
        let store = Arc::new(DataStore::new(config.default_action));
        let auth = AuthService::new(
            config.users.clone(),
            config.session_ttl,
            config.allow_registration,
        );
        let logs = LogBook::new(config.log_capacity, config.alarm);
        let (command_tx, command_rx) = mpsc::channel(COMMAND_CHANNEL_SIZE);

        Self {
            inner: Arc::new(ControllerInner {
                config,
                store,
                auth,
                logs,
                command_tx,
                command_rx: Mutex::new(Some(command_rx)),
                cancel: CancellationToken::new(),
                task_handles: Mutex::new(Vec::new()),
            }),
        }
    }

    pub fn config(&self) -> &GatewayConfig {
        &self.inner.config
    }

    pub fn store(&self) -> &Arc<DataStore> {
        &self.inner.store
    }

    pub fn auth(&self) -> &AuthService {
        &self.inner.auth
    }

    pub fn logs(&self) -> &LogBook {
        &self.inner.logs
    }

    /// Token cancelled on shutdown; background tasks owned by callers can
    /// hang off it.
    pub fn cancellation(&self) -> CancellationToken {
        self.inner.cancel.clone()
    }

    // ── Lifecycle ────────────────────────────────────────────────────

    /// Spawn the command processor.
    pub async fn start(&self) -> Result<(), CoreError> {
        let rx = self
            .inner
            .command_rx
            .lock()
            .await
            .take()
            .ok_or_else(|| CoreError::Internal("controller already started".into()))?;

        let handle = tokio::spawn(command_processor_task(self.clone(), rx));
        self.inner.task_handles.lock().await.push(handle);
        info!("controller started");
        Ok(())
    }

    /// Stop background tasks. Commands sent afterwards fail with
    /// [`CoreError::Unavailable`].
    pub async fn shutdown(&self) {
        self.inner.cancel.cancel();
        let handles: Vec<_> = self.inner.task_handles.lock().await.drain(..).collect();
        for handle in handles {
            let _ = handle.await;
        }
        info!("controller stopped");
    }

    // ── Command execution ────────────────────────────────────────────

    /// Execute a command and wait for its result.
    pub async fn execute(&self, cmd: Command) -> Result<CommandResult, CoreError> {
        if self.inner.cancel.is_cancelled() {
            return Err(CoreError::Unavailable);
        }

        let (tx, rx) = oneshot::channel();
        self.inner
            .command_tx
            .send(CommandEnvelope {
                command: cmd,
                response_tx: tx,
            })
            .await
            .map_err(|_| CoreError::Unavailable)?;

        rx.await.map_err(|_| CoreError::Unavailable)?
    }

    // ── Firewall reads ───────────────────────────────────────────────

    pub fn rules(&self) -> Vec<Arc<Rule>> {
        self.inner.store.firewall.list_rules()
    }

    pub fn rule(&self, id: &EntityId) -> Result<Arc<Rule>, CoreError> {
        self.inner.store.firewall.get_rule(id)
    }

    pub fn groups(&self) -> Vec<GroupSummary> {
        self.inner.store.firewall.list_groups()
    }

    pub fn group_rules(&self, id: &EntityId) -> Result<Vec<Arc<Rule>>, CoreError> {
        self.inner.store.firewall.group_rules(id)
    }

    /// Evaluate a connection at the current local time. Denied
    /// connections are recorded in the blocked-packet log.
    pub fn evaluate(&self, conn: &Connection) -> Result<Decision, CoreError> {
        self.evaluate_at(conn, Local::now().naive_local())
    }

    pub fn evaluate_at(&self, conn: &Connection, now: NaiveDateTime) -> Result<Decision, CoreError> {
        let decision = self.inner.store.firewall.decide(conn, now)?;
        if decision.action == RuleAction::Deny {
            self.inner
                .logs
                .record_blocked(&drop_line(conn, &decision), Utc::now());
        }
        Ok(decision)
    }

    /// Record a dropped-packet line coming from the kernel log.
    pub fn record_drop_line(&self, line: &str) {
        if line.contains(DROP_MARKER) {
            self.inner.logs.record_blocked(line, Utc::now());
        }
    }

    // ── Other reads ──────────────────────────────────────────────────

    pub fn interfaces(&self) -> Arc<Vec<Arc<InterfaceConfig>>> {
        self.inner.store.interfaces_snapshot()
    }

    pub fn nat(&self) -> NatConfig {
        self.inner.store.nat()
    }

    pub fn routes(&self) -> Arc<Vec<Arc<StaticRoute>>> {
        self.inner.store.routes_snapshot()
    }

    pub fn blocked_domains(&self) -> Arc<Vec<Arc<BlockedDomain>>> {
        self.inner.store.domains_snapshot()
    }

    pub fn blocklist_hosts(&self) -> String {
        self.inner.store.blocklist_hosts()
    }

    pub fn export_backup(&self) -> Backup {
        self.inner.store.export_backup()
    }

    async fn write_blocklist(&self) {
        let Some(path) = self.inner.config.blocklist_path.as_deref() else {
            return;
        };
        let hosts = self.blocklist_hosts();
        match tokio::fs::write(path, hosts).await {
            Ok(()) => debug!(path = %path.display(), "blocklist written"),
            Err(e) => warn!(path = %path.display(), error = %e, "failed to write blocklist"),
        }
    }
}

fn drop_line(conn: &Connection, decision: &Decision) -> String {
    let port = conn.port.map_or_else(|| "-".to_owned(), |p| p.to_string());
    let rule = decision.rule_name.as_deref().unwrap_or("default");
    format!(
        "{DROP_MARKER} DIR={} SRC={} PROTO={} DPT={port} PROFILE={} RULE=\"{rule}\"",
        conn.direction, conn.src_ip, conn.protocol, conn.profile
    )
}

fn doh_rule(group_id: &EntityId) -> RuleDraft {
    RuleDraft {
        rule_name: DOH_RULE_NAME.into(),
        source_ips: Some(SourceIps::List(
            DOH_RESOLVERS.iter().map(|s| (*s).to_owned()).collect(),
        )),
        port: Some(PortValue::Number(443)),
        protocol: Some(Protocol::Tcp),
        action: Some(RuleAction::Deny),
        direction: Some(Direction::Out),
        description: Some("Blocks HTTPS to public DNS-over-HTTPS resolvers".into()),
        group_id: Some(group_id.to_string()),
        ..RuleDraft::default()
    }
}

// ── Command processing ───────────────────────────────────────────────

async fn command_processor_task(controller: Controller, mut rx: mpsc::Receiver<CommandEnvelope>) {
    let cancel = controller.inner.cancel.clone();

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            envelope = rx.recv() => {
                let Some(envelope) = envelope else { break };
                let touches_blocklist = envelope.command.touches_blocklist();
                let result = route_command(&controller, envelope.command);
                // The hosts file is current by the time the caller sees the reply.
                if touches_blocklist && result.is_ok() {
                    controller.write_blocklist().await;
                }
                let _ = envelope.response_tx.send(result);
            }
        }
    }
}

/// Apply a command to the store.
fn route_command(controller: &Controller, cmd: Command) -> Result<CommandResult, CoreError> {
    let store = &controller.inner.store;
    let firewall = &store.firewall;
    debug!(?cmd, "executing command");

    match cmd {
        // ── Firewall rules ───────────────────────────────────────────
        Command::CreateRule(draft) => firewall.create_rule(draft).map(CommandResult::Rule),
        Command::UpdateRule { id, draft } => {
            firewall.update_rule(&id, draft).map(CommandResult::Rule)
        }
        Command::DeleteRule { id } => firewall.delete_rule(&id).map(CommandResult::Rule),
        Command::ReorderRules { ordered_ids } => {
            firewall.reorder_rules(&ordered_ids)?;
            Ok(CommandResult::Ok)
        }

        // ── Rule groups ──────────────────────────────────────────────
        Command::CreateGroup(draft) => firewall.create_group(draft).map(CommandResult::Group),
        Command::UpdateGroup { id, draft } => {
            firewall.update_group(&id, draft).map(CommandResult::Group)
        }
        Command::DeleteGroup { id } => firewall.delete_group(&id).map(CommandResult::Count),
        Command::SetGroupRulesEnabled { id, enabled } => firewall
            .set_group_rules_enabled(&id, enabled)
            .map(CommandResult::Count),

        // ── Interfaces and NAT ───────────────────────────────────────
        Command::SaveInterface(draft) => store.save_interface(draft).map(CommandResult::Interface),
        Command::UpdateInterface { name, draft } => store
            .update_interface(&name, draft)
            .map(CommandResult::Interface),
        Command::DeleteInterface { name } => {
            store.delete_interface(&name)?;
            Ok(CommandResult::Ok)
        }
        Command::SetNat(cfg) => store.set_nat(cfg).map(CommandResult::Nat),

        // ── Static routes ────────────────────────────────────────────
        Command::CreateRoute(draft) => store.create_route(draft).map(CommandResult::Route),
        Command::UpdateRoute { id, draft } => {
            store.update_route(&id, draft).map(CommandResult::Route)
        }
        Command::DeleteRoute { id } => {
            store.delete_route(&id)?;
            Ok(CommandResult::Ok)
        }

        // ── DNS blocking ─────────────────────────────────────────────
        Command::BlockDomain(draft) => store.block_domain(draft).map(CommandResult::Domain),
        Command::UnblockDomain { domain } => {
            store.unblock_domain(&domain)?;
            Ok(CommandResult::Ok)
        }
        Command::ImportBlocklist { contents } => {
            Ok(CommandResult::Count(store.import_blocklist(&contents)))
        }
        Command::BlockDoh => {
            let created = firewall.ensure_group_rule(
                DOH_GROUP_NAME,
                "Rules blocking DNS-over-HTTPS resolvers",
                DOH_RULE_NAME,
                |gid| doh_rule(&gid),
            )?;
            Ok(CommandResult::Count(usize::from(created)))
        }

        // ── Backup ───────────────────────────────────────────────────
        Command::ImportBackup(backup) => {
            store.import_backup(*backup)?;
            Ok(CommandResult::Ok)
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::config::AlarmConfig;
    use crate::model::{DomainDraft, GroupDraft, Profile};
    use chrono::{NaiveDate, TimeDelta};

    async fn started(config: GatewayConfig) -> Controller {
        let c = Controller::new(config);
        c.start().await.unwrap();
        c
    }

    fn draft(name: &str, action: RuleAction) -> RuleDraft {
        RuleDraft {
            rule_name: name.into(),
            protocol: Some(Protocol::Tcp),
            action: Some(action),
            direction: Some(Direction::In),
            ..RuleDraft::default()
        }
    }

    fn conn() -> Connection {
        Connection {
            src_ip: "203.0.113.9".parse().unwrap(),
            protocol: Protocol::Tcp,
            port: Some(22),
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

    #[tokio::test]
    async fn commands_flow_through_processor() {
        let c = started(GatewayConfig::default()).await;
        let CommandResult::Group(group) = c
            .execute(Command::CreateGroup(GroupDraft::new("ops")))
            .await
            .unwrap()
        else {
            panic!("expected group");
        };

        let mut d = draft("ssh", RuleAction::Allow);
        d.group_id = Some(group.id.to_string());
        c.execute(Command::CreateRule(d)).await.unwrap();

        let CommandResult::Count(n) = c
            .execute(Command::SetGroupRulesEnabled {
                id: group.id.clone(),
                enabled: false,
            })
            .await
            .unwrap()
        else {
            panic!("expected count");
        };
        assert_eq!(n, 1);
        assert!(!c.rules()[0].enabled);
        assert_eq!(c.groups()[0].rule_count, 1);
    }

    #[tokio::test]
    async fn execute_after_shutdown_is_unavailable() {
        let c = started(GatewayConfig::default()).await;
        c.shutdown().await;
        let err = c
            .execute(Command::CreateGroup(GroupDraft::new("x")))
            .await
            .unwrap_err();
        assert_eq!(err, CoreError::Unavailable);
    }

    #[tokio::test]
    async fn start_twice_fails() {
        let c = started(GatewayConfig::default()).await;
        assert!(c.start().await.is_err());
    }

    #[tokio::test]
    async fn denied_evaluation_is_logged_as_blocked() {
        let c = started(GatewayConfig::default()).await;
        c.execute(Command::CreateRule(draft("allow-web", RuleAction::Allow)))
            .await
            .unwrap();

        let d = c.evaluate_at(&conn(), noon()).unwrap();
        assert_eq!(d.action, RuleAction::Allow);
        assert!(c.logs().blocked().is_empty());

        let CommandResult::Rule(deny) = c
            .execute(Command::CreateRule(RuleDraft {
                priority: 1,
                ..draft("deny-ssh", RuleAction::Deny)
            }))
            .await
            .unwrap()
        else {
            panic!("expected rule");
        };
        let d = c.evaluate_at(&conn(), noon()).unwrap();
        assert_eq!(d.matched_rule_id, Some(deny.id));
        let blocked = c.logs().blocked();
        assert_eq!(blocked.len(), 1);
        assert!(blocked[0].raw_log_line.starts_with(DROP_MARKER));
        assert!(blocked[0].raw_log_line.contains("SRC=203.0.113.9"));
    }

    #[tokio::test]
    async fn repeated_drops_raise_one_alert() {
        let c = started(GatewayConfig {
            alarm: AlarmConfig {
                threshold: 2,
                window: TimeDelta::minutes(5),
            },
            ..GatewayConfig::default()
        })
        .await;
        for _ in 0..5 {
            c.evaluate_at(&conn(), noon()).unwrap();
        }
        assert_eq!(c.logs().blocked().len(), 5);
        assert_eq!(c.logs().alerts().len(), 1);
    }

    #[tokio::test]
    async fn doh_block_is_idempotent() {
        let c = started(GatewayConfig::default()).await;
        for expected in [1, 0] {
            let CommandResult::Count(n) = c.execute(Command::BlockDoh).await.unwrap() else {
                panic!("expected count");
            };
            assert_eq!(n, expected);
        }
        let groups = c.groups();
        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].group.group_name, DOH_GROUP_NAME);
        assert_eq!(groups[0].rule_count, 1);

        let rule = &c.rules()[0];
        assert_eq!(rule.action, RuleAction::Deny);
        assert_eq!(rule.direction, Direction::Out);
        assert_eq!(rule.port.as_deref(), Some("443"));
        assert!(rule.source_ips.contains("1.1.1.1"));
    }

    #[tokio::test]
    async fn hosts_file_follows_domain_commands() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blocklist.hosts");
        let c = started(GatewayConfig {
            blocklist_path: Some(path.clone()),
            ..GatewayConfig::default()
        })
        .await;

        let block = |domain: &str| {
            Command::BlockDomain(DomainDraft {
                domain: domain.into(),
                note: None,
                use_wildcard: false,
            })
        };
        // Queued back to back; the file reflects both once they reply.
        let (a, b) = tokio::join!(
            c.execute(block("ads.example")),
            c.execute(block("tracker.example"))
        );
        a.unwrap();
        b.unwrap();
        let hosts = std::fs::read_to_string(&path).unwrap();
        assert!(hosts.contains("127.0.0.1 ads.example\n"));
        assert!(hosts.contains("127.0.0.1 tracker.example\n"));

        c.execute(Command::UnblockDomain {
            domain: "ads.example".into(),
        })
        .await
        .unwrap();
        let hosts = std::fs::read_to_string(&path).unwrap();
        assert_eq!(hosts, "127.0.0.1 tracker.example\n");

        // A rejected command leaves the file alone.
        assert!(c.execute(block("")).await.is_err());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), hosts);
    }

    #[tokio::test]
    async fn drop_lines_without_marker_are_ignored() {
        let c = started(GatewayConfig::default()).await;
        c.record_drop_line("kernel: eth0 link up");
        c.record_drop_line("kernel: FWDROP: IN=eth0 SRC=198.51.100.4");
        assert_eq!(c.logs().blocked().len(), 1);
    }
}
