// ── Command API ──
//
// All write operations flow through a unified `Command` enum processed
// one at a time by the controller's command task.

pub mod requests;

use crate::error::CoreError;
use crate::model::{
    Backup, BlockedDomain, DomainDraft, EntityId, GroupDraft, InterfaceConfig, InterfaceDraft,
    NatConfig, RouteDraft, Rule, RuleDraft, RuleGroup, StaticRoute,
};

pub use requests::{
    AdblockListRequest, DataResponse, EnableRequest, ErrorResponse, LoginRequest,
    MessageResponse, RegisterResponse, ReorderRulesRequest,
};

/// A command envelope sent through the command channel.
/// Contains the command and a oneshot response channel.
pub(crate) struct CommandEnvelope {
    pub command: Command,
    pub response_tx: tokio::sync::oneshot::Sender<Result<CommandResult, CoreError>>,
}

/// All possible write operations against the gateway.
#[derive(Debug, Clone)]
pub enum Command {
    // ── Firewall rules ───────────────────────────────────────────────
    CreateRule(RuleDraft),
    UpdateRule {
        id: EntityId,
        draft: RuleDraft,
    },
    DeleteRule {
        id: EntityId,
    },
    ReorderRules {
        ordered_ids: Vec<EntityId>,
    },

    // ── Rule groups ──────────────────────────────────────────────────
    CreateGroup(GroupDraft),
    UpdateGroup {
        id: EntityId,
        draft: GroupDraft,
    },
    DeleteGroup {
        id: EntityId,
    },
    SetGroupRulesEnabled {
        id: EntityId,
        enabled: bool,
    },

    // ── Interfaces and NAT ───────────────────────────────────────────
    SaveInterface(InterfaceDraft),
    UpdateInterface {
        name: String,
        draft: InterfaceDraft,
    },
    DeleteInterface {
        name: String,
    },
    SetNat(NatConfig),

    // ── Static routes ────────────────────────────────────────────────
    CreateRoute(RouteDraft),
    UpdateRoute {
        id: EntityId,
        draft: RouteDraft,
    },
    DeleteRoute {
        id: EntityId,
    },

    // ── DNS blocking ─────────────────────────────────────────────────
    BlockDomain(DomainDraft),
    UnblockDomain {
        domain: String,
    },
    /// Contents of a downloaded hosts/adblock list.
    ImportBlocklist {
        contents: String,
    },
    BlockDoh,

    // ── Backup ───────────────────────────────────────────────────────
    ImportBackup(Box<Backup>),
}

impl Command {
    /// Whether a successful run changes the DNS blocklist.
    pub fn touches_blocklist(&self) -> bool {
        matches!(
            self,
            Self::BlockDomain(_)
                | Self::UnblockDomain { .. }
                | Self::ImportBlocklist { .. }
                | Self::ImportBackup(_)
        )
    }
}

/// Result of a successfully executed command.
#[derive(Debug, Clone)]
pub enum CommandResult {
    Ok,
    Rule(Rule),
    Group(RuleGroup),
    /// Number of entities affected.
    Count(usize),
    Interface(InterfaceConfig),
    Nat(NatConfig),
    Route(StaticRoute),
    Domain(BlockedDomain),
}
