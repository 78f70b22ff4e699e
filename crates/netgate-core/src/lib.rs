//! Domain model and decision engine for the NetGate firewall appliance.
//!
//! This crate owns the business logic behind the management console:
//!
//! - **[`Controller`]**: Facade tying everything together. Mutations are
//!   typed [`Command`]s routed through an `mpsc` channel to a single
//!   command-processor task; reads go straight to store snapshots.
//!
//! - **[`DataStore`]**: Holds the firewall rule set ([`FirewallStore`]) and
//!   the auxiliary resources (interfaces, NAT, static routes, blocked
//!   domains). The rule set is published as one immutable
//!   [`FirewallState`] through `arc_swap`, so readers never observe a
//!   half-applied reorder, bulk toggle or group cascade.
//!
//! - **Ordering, schedules and matching**: [`ordering`] keeps rules in
//!   ascending priority with creation-order tie breaks, [`schedule`]
//!   decides whether a time-windowed rule is active, and [`RuleMatcher`]
//!   returns the first matching rule's action for a [`Connection`].
//!
//! - **Domain model** ([`model`]): Rules, groups, interfaces, routes,
//!   blocked domains and log records, with [`EntityId`] accepting both
//!   UUIDs and legacy string ids from older backups.

pub mod auth;
pub mod command;
pub mod config;
pub mod controller;
pub mod error;
pub mod logbook;
pub mod matcher;
pub mod model;
pub mod ordering;
pub mod schedule;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use auth::AuthService;
pub use command::requests::*;
pub use command::{Command, CommandResult};
pub use config::{AlarmConfig, GatewayConfig, UserSeed};
pub use controller::Controller;
pub use error::CoreError;
pub use logbook::LogBook;
pub use matcher::{Connection, Decision, RuleMatcher};
pub use store::{DataStore, FirewallState, FirewallStore};

// Re-export model types at the crate root for ergonomics.
pub use model::{
    AccessToken, Backup, BlockedDomain, BlockedPacket, ClockTime, DaySet, Direction, DomainDraft,
    EntityId, GroupDraft, GroupSummary, InterfaceConfig, InterfaceDraft, IpMode, LogEntry,
    LogLevel, LogQuery, NatConfig, PortSpec, PortValue, Profile, Protocol, RequestRecord, Role,
    RouteDraft, RouteMode, Rule, RuleAction, RuleDraft, RuleGroup, RuleRecord, Session,
    SourceIps, StaticRoute, UserInfo,
};
