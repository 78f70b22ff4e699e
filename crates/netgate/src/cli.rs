//! Clap derive structures for the `netgate` CLI.
//!
//! Defines the complete command tree, global flags, and shared types.

use std::net::IpAddr;
use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

use netgate_core::{Direction, LogLevel, Profile, Protocol, RouteMode, RuleAction};

// ── Top-Level CLI ────────────────────────────────────────────────────

/// netgate -- manage a NetGate firewall appliance from the terminal
#[derive(Debug, Parser)]
#[command(
    name = "netgate",
    version,
    about = "Manage NetGate firewall appliances from the command line",
    long_about = "Administer firewall rules, rule groups, interfaces, NAT, static routes,\n\
        DNS blocking, logs and backups on a NetGate management server.",
    propagate_version = true,
    subcommand_required = true,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Command,
}

// ── Global Options ───────────────────────────────────────────────────

#[derive(Debug, Args)]
pub struct GlobalOpts {
    /// Server profile to use
    #[arg(long, short = 'p', env = "NETGATE_PROFILE", global = true)]
    pub profile: Option<String>,

    /// Server URL (overrides profile)
    #[arg(long, short = 'c', env = "NETGATE_CONTROLLER", global = true)]
    pub controller: Option<String>,

    /// Console username (overrides profile)
    #[arg(long, short = 'u', env = "NETGATE_USERNAME", global = true)]
    pub username: Option<String>,

    /// Console password
    #[arg(long, env = "NETGATE_PASSWORD", global = true, hide_env_values = true)]
    pub password: Option<String>,

    /// Output format
    #[arg(
        long,
        short = 'o',
        env = "NETGATE_OUTPUT",
        default_value = "table",
        global = true
    )]
    pub output: OutputFormat,

    /// When to use color output
    #[arg(long, default_value = "auto", global = true)]
    pub color: ColorMode,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(long, short = 'v', action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Skip confirmation prompts
    #[arg(long, short = 'y', global = true)]
    pub yes: bool,

    /// Accept self-signed TLS certificates
    #[arg(long, short = 'k', env = "NETGATE_INSECURE", global = true)]
    pub insecure: bool,

    /// Trust an extra CA certificate (PEM) for the server's TLS
    #[arg(long, env = "NETGATE_CA_CERT", global = true, value_name = "PEM")]
    pub ca_cert: Option<PathBuf>,

    /// Request timeout in seconds (overrides profile)
    #[arg(long, env = "NETGATE_TIMEOUT", global = true)]
    pub timeout: Option<u64>,
}

// ── Output & Color Enums ─────────────────────────────────────────────

#[derive(Debug, Clone, ValueEnum)]
pub enum OutputFormat {
    /// Pretty table (default, interactive)
    Table,
    /// Pretty-printed JSON
    Json,
    /// Compact single-line JSON
    JsonCompact,
    /// YAML
    Yaml,
    /// Plain text, one value per line (scripting)
    Plain,
}

#[derive(Debug, Clone, ValueEnum)]
pub enum ColorMode {
    /// Auto-detect (color if terminal is interactive)
    Auto,
    /// Always emit color codes
    Always,
    /// Never emit color codes
    Never,
}

// ── Top-Level Command Enum ───────────────────────────────────────────

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Manage firewall rules
    #[command(alias = "rule", alias = "r")]
    Rules(RulesArgs),

    /// Manage rule groups
    #[command(alias = "group", alias = "g")]
    Groups(GroupsArgs),

    /// Evaluate a connection against the live rule set
    #[command(alias = "eval")]
    Evaluate(EvaluateArgs),

    /// Manage interface configuration
    #[command(alias = "if")]
    Interfaces(InterfacesArgs),

    /// View or change NAT masquerading
    Nat(NatArgs),

    /// Manage static routes
    Routes(RoutesArgs),

    /// Manage blocked domains
    Dns(DnsArgs),

    /// View request, blocked-packet and alert logs
    Logs(LogsArgs),

    /// Export or restore the appliance configuration
    Backup(BackupArgs),

    /// Check that the server is reachable
    Status,

    /// Show the authenticated user
    Whoami,

    /// Create a console account (when the server allows registration)
    Register {
        /// New username
        username: String,
    },

    /// Manage CLI configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

// ── Shared value enums ───────────────────────────────────────────────

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ActionArg {
    Allow,
    Deny,
}

impl From<ActionArg> for RuleAction {
    fn from(a: ActionArg) -> Self {
        match a {
            ActionArg::Allow => Self::Allow,
            ActionArg::Deny => Self::Deny,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProtocolArg {
    Tcp,
    Udp,
    Any,
}

impl From<ProtocolArg> for Protocol {
    fn from(p: ProtocolArg) -> Self {
        match p {
            ProtocolArg::Tcp => Self::Tcp,
            ProtocolArg::Udp => Self::Udp,
            ProtocolArg::Any => Self::Any,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum DirectionArg {
    In,
    Out,
}

impl From<DirectionArg> for Direction {
    fn from(d: DirectionArg) -> Self {
        match d {
            DirectionArg::In => Self::In,
            DirectionArg::Out => Self::Out,
        }
    }
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum ProfileArg {
    Any,
    Domain,
    Private,
    Public,
}

impl From<ProfileArg> for Profile {
    fn from(p: ProfileArg) -> Self {
        match p {
            ProfileArg::Any => Self::Any,
            ProfileArg::Domain => Self::Domain,
            ProfileArg::Private => Self::Private,
            ProfileArg::Public => Self::Public,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  RULES
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct RulesArgs {
    #[command(subcommand)]
    pub command: RulesCommand,
}

/// Rule fields settable from flags. On `update`, unset flags keep the
/// rule's current value.
#[derive(Debug, Args)]
pub struct RuleFields {
    /// Rule name
    #[arg(long)]
    pub name: Option<String>,

    /// Action applied on match
    #[arg(long, value_enum)]
    pub action: Option<ActionArg>,

    /// Transport protocol
    #[arg(long, value_enum)]
    pub protocol: Option<ProtocolArg>,

    /// Traffic direction
    #[arg(long, value_enum)]
    pub direction: Option<DirectionArg>,

    /// Network profile
    #[arg(long, value_enum)]
    pub net_profile: Option<ProfileArg>,

    /// Source addresses or CIDRs, comma-separated
    #[arg(long)]
    pub source: Option<String>,

    /// Port, range ("1000-2000") or list ("80,443")
    #[arg(long)]
    pub port: Option<String>,

    /// Free-form description
    #[arg(long)]
    pub description: Option<String>,

    /// Priority (lower is evaluated first)
    #[arg(long)]
    pub priority: Option<i32>,

    /// Schedule window start (HH:MM)
    #[arg(long, requires = "schedule_end")]
    pub schedule_start: Option<String>,

    /// Schedule window end (HH:MM)
    #[arg(long, requires = "schedule_start")]
    pub schedule_end: Option<String>,

    /// Active days, 0 = Monday .. 6 = Sunday (comma-separated)
    #[arg(long, value_delimiter = ',')]
    pub days: Option<Vec<u8>>,

    /// Group ID to place the rule in
    #[arg(long)]
    pub group: Option<String>,

    /// Enable or disable the rule
    #[arg(long, action = clap::ArgAction::Set)]
    pub enabled: Option<bool>,
}

#[derive(Debug, Subcommand)]
pub enum RulesCommand {
    /// List rules in evaluation order
    #[command(alias = "ls")]
    List,

    /// Show one rule
    Get {
        /// Rule ID
        id: String,
    },

    /// Create a rule
    Create {
        #[command(flatten)]
        fields: RuleFields,

        /// Create from a JSON file
        #[arg(long, short = 'F', conflicts_with_all = &["name", "action", "protocol", "direction"])]
        from_file: Option<PathBuf>,
    },

    /// Replace a rule's fields
    Update {
        /// Rule ID
        id: String,

        #[command(flatten)]
        fields: RuleFields,

        /// Load the full payload from a JSON file
        #[arg(long, short = 'F')]
        from_file: Option<PathBuf>,
    },

    /// Enable a rule
    Enable {
        /// Rule ID
        id: String,
    },

    /// Disable a rule
    Disable {
        /// Rule ID
        id: String,
    },

    /// Delete a rule
    #[command(alias = "rm")]
    Delete {
        /// Rule ID
        id: String,
    },

    /// Reorder rules; the listed IDs take priorities 1..n in order
    Reorder {
        /// Rule IDs in the desired order
        #[arg(required = true, value_delimiter = ',', num_args = 1..)]
        ids: Vec<String>,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  GROUPS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct GroupsArgs {
    #[command(subcommand)]
    pub command: GroupsCommand,
}

#[derive(Debug, Subcommand)]
pub enum GroupsCommand {
    /// List groups with their rule counts
    #[command(alias = "ls")]
    List,

    /// List the rules in a group
    Rules {
        /// Group ID
        id: String,
    },

    /// Create a group
    Create {
        /// Group name
        name: String,

        /// Group description
        #[arg(long)]
        description: Option<String>,
    },

    /// Rename or re-describe a group
    Update {
        /// Group ID
        id: String,

        /// New group name
        #[arg(long)]
        name: String,

        /// New description
        #[arg(long)]
        description: Option<String>,
    },

    /// Delete a group; its rules become ungrouped
    #[command(alias = "rm")]
    Delete {
        /// Group ID
        id: String,
    },

    /// Enable every rule in a group
    Enable {
        /// Group ID
        id: String,
    },

    /// Disable every rule in a group
    Disable {
        /// Group ID
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  EVALUATE
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct EvaluateArgs {
    /// Source address of the connection
    #[arg(long)]
    pub src: IpAddr,

    /// Transport protocol
    #[arg(long, value_enum)]
    pub protocol: ProtocolArg,

    /// Destination port
    #[arg(long)]
    pub port: Option<u16>,

    /// Traffic direction
    #[arg(long, value_enum, default_value = "in")]
    pub direction: DirectionArg,

    /// Network profile
    #[arg(long, value_enum, default_value = "any")]
    pub net_profile: ProfileArg,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  NETWORK
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct InterfacesArgs {
    #[command(subcommand)]
    pub command: InterfacesCommand,
}

#[derive(Debug, Subcommand)]
pub enum InterfacesCommand {
    /// List stored interface configurations
    #[command(alias = "ls")]
    List,

    /// Create or replace an interface configuration
    Set {
        /// Interface name (e.g. eth1)
        name: String,

        /// Use DHCP instead of a static address
        #[arg(long, conflicts_with_all = &["address", "netmask", "gateway"])]
        dhcp: bool,

        /// Static IPv4 address
        #[arg(long)]
        address: Option<String>,

        /// Subnet mask
        #[arg(long)]
        netmask: Option<String>,

        /// Default gateway
        #[arg(long)]
        gateway: Option<String>,

        /// Primary DNS server
        #[arg(long)]
        dns1: Option<String>,

        /// Secondary DNS server
        #[arg(long)]
        dns2: Option<String>,

        /// MTU
        #[arg(long)]
        mtu: Option<u32>,

        /// VLAN ID (1-4094)
        #[arg(long)]
        vlan: Option<u16>,

        /// Administratively disable the interface
        #[arg(long)]
        down: bool,

        /// Load the payload from a JSON file
        #[arg(long, short = 'F', conflicts_with_all = &["dhcp", "address", "netmask"])]
        from_file: Option<PathBuf>,
    },

    /// Remove an interface configuration
    #[command(alias = "rm")]
    Delete {
        /// Interface name
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct NatArgs {
    #[command(subcommand)]
    pub command: NatCommand,
}

#[derive(Debug, Subcommand)]
pub enum NatCommand {
    /// Show the NAT configuration
    Show,

    /// Enable masquerading from LAN out through WAN
    Enable {
        /// WAN interface
        #[arg(long)]
        wan: String,

        /// LAN interface
        #[arg(long)]
        lan: String,
    },

    /// Disable masquerading
    Disable,
}

#[derive(Debug, Args)]
pub struct RoutesArgs {
    #[command(subcommand)]
    pub command: RoutesCommand,
}

/// Route fields settable from flags.
#[derive(Debug, Args)]
pub struct RouteFields {
    /// Destination network address
    #[arg(long)]
    pub destination: String,

    /// Destination netmask
    #[arg(long)]
    pub mask: String,

    /// Next-hop gateway
    #[arg(long)]
    pub gateway: String,

    /// Route metric
    #[arg(long, default_value = "1")]
    pub metric: u32,

    /// Outgoing interface
    #[arg(long)]
    pub interface: Option<String>,

    /// Route mode
    #[arg(long, value_enum, default_value = "static")]
    pub mode: RouteModeArg,

    /// Mark as a failover route
    #[arg(long)]
    pub failover: bool,

    /// Create the route disabled
    #[arg(long)]
    pub disabled: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum RouteModeArg {
    Static,
    Dhcp,
}

impl From<RouteModeArg> for RouteMode {
    fn from(m: RouteModeArg) -> Self {
        match m {
            RouteModeArg::Static => Self::Static,
            RouteModeArg::Dhcp => Self::Dhcp,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum RoutesCommand {
    /// List static routes
    #[command(alias = "ls")]
    List,

    /// Add a static route
    Create {
        #[command(flatten)]
        fields: RouteFields,
    },

    /// Replace a static route
    Update {
        /// Route ID
        id: String,

        #[command(flatten)]
        fields: RouteFields,
    },

    /// Remove a static route
    #[command(alias = "rm")]
    Delete {
        /// Route ID
        id: String,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  DNS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct DnsArgs {
    #[command(subcommand)]
    pub command: DnsCommand,
}

#[derive(Debug, Subcommand)]
pub enum DnsCommand {
    /// List blocked domains
    #[command(alias = "ls")]
    List,

    /// Block a domain
    Block {
        /// Domain name
        domain: String,

        /// Note stored with the entry
        #[arg(long)]
        note: Option<String>,

        /// Do not also block the www. variant
        #[arg(long)]
        no_wildcard: bool,
    },

    /// Unblock a domain
    Unblock {
        /// Domain name
        domain: String,
    },

    /// Import an ad-block hosts list from a URL
    Import {
        /// List URL
        url: String,
    },

    /// Block known DNS-over-HTTPS resolvers
    BlockDoh,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  LOGS
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct LogsArgs {
    #[command(subcommand)]
    pub command: LogsCommand,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum LevelArg {
    Info,
    Warning,
    Error,
    Alert,
}

impl From<LevelArg> for LogLevel {
    fn from(l: LevelArg) -> Self {
        match l {
            LevelArg::Info => Self::Info,
            LevelArg::Warning => Self::Warning,
            LevelArg::Error => Self::Error,
            LevelArg::Alert => Self::Alert,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum LogsCommand {
    /// List log entries, newest first
    #[command(alias = "ls")]
    List {
        /// Only entries at this level
        #[arg(long, value_enum)]
        level: Option<LevelArg>,

        /// Only entries from this source address
        #[arg(long)]
        ip: Option<IpAddr>,

        /// Show at most this many entries
        #[arg(long, short = 'l')]
        limit: Option<usize>,
    },

    /// List blocked packets
    Blocked {
        /// Show at most this many entries
        #[arg(long, short = 'l')]
        limit: Option<usize>,
    },

    /// List raised alerts
    Alerts,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  BACKUP
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct BackupArgs {
    #[command(subcommand)]
    pub command: BackupCommand,
}

#[derive(Debug, Subcommand)]
pub enum BackupCommand {
    /// Export the configuration as JSON
    Export {
        /// Write to this file instead of stdout
        #[arg(long, short = 'f')]
        file: Option<PathBuf>,
    },

    /// Restore a configuration exported earlier
    Import {
        /// Backup file
        file: PathBuf,
    },
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
//  CONFIG
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Create initial config file with guided setup
    Init,

    /// Display current resolved configuration
    Show,

    /// Set a value on the active profile
    Set {
        /// Key: controller, username, password_env, insecure, ca_cert or timeout
        key: String,

        /// Value to set
        value: String,
    },

    /// List configured profiles
    Profiles,

    /// Set the default profile
    Use {
        /// Profile name to set as default
        name: String,
    },
}

#[derive(Debug, Args)]
pub struct CompletionsArgs {
    /// Shell to generate completions for
    pub shell: clap_complete::Shell,
}
