// ── Gateway domain model ──
//
// Canonical types for everything the gateway stores. Drafts are the
// loosely shaped payloads clients submit; each has a `build` step that
// validates and normalizes it into the stored entity.

pub mod entity_id;

pub mod backup;
pub mod dns;
pub mod group;
pub mod log;
pub mod network;
pub mod port;
pub mod rule;
pub mod timestamp;
pub mod user;

// ── Re-exports ──────────────────────────────────────────────────────

pub use entity_id::EntityId;

pub use rule::{
    ClockTime, DEFAULT_PRIORITY, DaySet, Direction, PortValue, Profile, Protocol, Rule,
    RuleAction, RuleDraft, RuleRecord, SourceIps,
};
pub use port::PortSpec;
pub use group::{GroupDraft, GroupSummary, RuleGroup};

pub use network::{
    InterfaceConfig, InterfaceDraft, IpMode, NatConfig, RouteDraft, RouteMode, StaticRoute,
};
pub use dns::{BlockedDomain, DomainDraft};
pub use log::{BlockedPacket, LogEntry, LogLevel, LogQuery, RequestRecord};
pub use user::{AccessToken, Role, Session, User, UserInfo};
pub use backup::Backup;
