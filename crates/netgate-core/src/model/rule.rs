// ── Firewall rule domain types ──
//
// `RuleDraft` is the loosely shaped payload the console submits;
// `Rule` is the validated, normalized entity the store keeps. All
// field-level invariants are checked in `RuleDraft::build`.

use std::collections::BTreeSet;
use std::fmt;
use std::net::IpAddr;

use chrono::{DateTime, NaiveTime, Timelike, Utc, Weekday};
use ipnetwork::IpNetwork;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;
use super::port::PortSpec;
use super::timestamp;
use crate::error::CoreError;

/// Priority assigned when the draft does not carry one.
pub const DEFAULT_PRIORITY: i32 = 100;

// ── Enumerations ────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Protocol {
    Tcp,
    Udp,
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum RuleAction {
    Allow,
    Deny,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum Direction {
    In,
    Out,
}

/// Network profile a rule applies to.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[strum(ascii_case_insensitive)]
pub enum Profile {
    #[default]
    Any,
    Domain,
    Private,
    Public,
}

// ── Time of day ─────────────────────────────────────────────────────

/// Local wall-clock time, written as `HH:MM` on the wire. `24:00` is
/// accepted and names the end of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ClockTime(u32);

impl ClockTime {
    pub const END_OF_DAY: Self = Self(86_400);

    pub fn parse(raw: &str) -> Result<Self, CoreError> {
        let raw = raw.trim();
        if raw == "24:00" || raw == "24:00:00" {
            return Ok(Self::END_OF_DAY);
        }
        NaiveTime::parse_from_str(raw, "%H:%M")
            .or_else(|_| NaiveTime::parse_from_str(raw, "%H:%M:%S"))
            .map(Self::from)
            .map_err(|_| CoreError::validation(format!("invalid time '{raw}': expected HH:MM")))
    }

    /// Seconds since local midnight, `86400` for end of day.
    pub fn seconds_from_midnight(self) -> u32 {
        self.0
    }
}

impl From<NaiveTime> for ClockTime {
    fn from(t: NaiveTime) -> Self {
        Self(t.num_seconds_from_midnight())
    }
}

impl TryFrom<String> for ClockTime {
    type Error = CoreError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<ClockTime> for String {
    fn from(t: ClockTime) -> Self {
        t.to_string()
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (h, m, s) = (self.0 / 3600, self.0 / 60 % 60, self.0 % 60);
        if s == 0 {
            write!(f, "{h:02}:{m:02}")
        } else {
            write!(f, "{h:02}:{m:02}:{s:02}")
        }
    }
}

// ── Days of week ────────────────────────────────────────────────────

/// Set of weekdays, Monday = 0 through Sunday = 6. Serialized as a
/// sorted integer array.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct DaySet(u8);

impl DaySet {
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1u8 << day.num_days_from_monday()) != 0
    }

    /// Day indices in ascending order.
    pub fn indices(self) -> Vec<u8> {
        (0u8..7).filter(|d| self.0 & (1u8 << d) != 0).collect()
    }
}

impl TryFrom<Vec<u8>> for DaySet {
    type Error = CoreError;

    fn try_from(days: Vec<u8>) -> Result<Self, Self::Error> {
        let mut bits = 0u8;
        for day in days {
            if day > 6 {
                return Err(CoreError::validation(format!(
                    "day of week {day} out of range 0-6"
                )));
            }
            bits |= 1u8 << day;
        }
        Ok(Self(bits))
    }
}

impl From<DaySet> for Vec<u8> {
    fn from(days: DaySet) -> Self {
        days.indices()
    }
}

impl FromIterator<Weekday> for DaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        Self(
            iter.into_iter()
                .fold(0u8, |bits, d| bits | (1u8 << d.num_days_from_monday())),
        )
    }
}

// ── Loose input shapes ──────────────────────────────────────────────

/// Source addresses as submitted: either a JSON array or the raw
/// comma-separated text from the form field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SourceIps {
    List(Vec<String>),
    Text(String),
}

impl SourceIps {
    fn entries(&self) -> Vec<&str> {
        match self {
            Self::List(items) => items.iter().map(String::as_str).collect(),
            Self::Text(raw) => raw.split(',').collect(),
        }
    }
}

/// Port filter as submitted: older clients send a bare number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PortValue {
    Number(u32),
    Text(String),
}

// ── Rule ────────────────────────────────────────────────────────────

/// A single match-and-act firewall policy entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    pub rule_name: String,
    pub source_ips: BTreeSet<String>,
    pub port: Option<String>,
    pub protocol: Protocol,
    pub action: RuleAction,
    pub direction: Direction,
    pub profile: Profile,
    pub description: Option<String>,
    pub enabled: bool,
    pub priority: i32,
    pub schedule_start: Option<ClockTime>,
    pub schedule_end: Option<ClockTime>,
    #[serde(default)]
    pub days_of_week: DaySet,
    pub group_id: Option<EntityId>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,

    /// Creation sequence; breaks priority ties.
    #[serde(skip)]
    pub(crate) seq: u64,
}

impl Rule {
    pub fn has_schedule(&self) -> bool {
        self.schedule_start.is_some()
    }

    /// Creation sequence number within the current rule set.
    pub fn sequence(&self) -> u64 {
        self.seq
    }
}

/// Rule payload for create and full-replace update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleDraft {
    #[serde(default)]
    pub rule_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_ips: Option<SourceIps>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub port: Option<PortValue>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<Protocol>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub action: Option<RuleAction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub direction: Option<Direction>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile: Option<Profile>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
    #[serde(default = "default_priority")]
    pub priority: i32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_start: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_end: Option<String>,
    #[serde(default)]
    pub days_of_week: Vec<u8>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
}

fn default_enabled() -> bool {
    true
}

fn default_priority() -> i32 {
    DEFAULT_PRIORITY
}

impl Default for RuleDraft {
    fn default() -> Self {
        Self {
            rule_name: String::new(),
            source_ips: None,
            port: None,
            protocol: None,
            action: None,
            direction: None,
            profile: None,
            description: None,
            enabled: true,
            priority: DEFAULT_PRIORITY,
            schedule_start: None,
            schedule_end: None,
            days_of_week: Vec::new(),
            group_id: None,
        }
    }
}

impl From<&Rule> for RuleDraft {
    fn from(rule: &Rule) -> Self {
        Self {
            rule_name: rule.rule_name.clone(),
            source_ips: Some(SourceIps::List(rule.source_ips.iter().cloned().collect())),
            port: rule.port.clone().map(PortValue::Text),
            protocol: Some(rule.protocol),
            action: Some(rule.action),
            direction: Some(rule.direction),
            profile: Some(rule.profile),
            description: rule.description.clone(),
            enabled: rule.enabled,
            priority: rule.priority,
            schedule_start: rule.schedule_start.map(String::from),
            schedule_end: rule.schedule_end.map(String::from),
            days_of_week: rule.days_of_week.indices(),
            group_id: rule.group_id.as_ref().map(ToString::to_string),
        }
    }
}

impl RuleDraft {
    /// Validate and normalize the draft into a stored rule.
    ///
    /// Group existence is not checked here; the store does that against
    /// the rule set the rule is about to join.
    pub(crate) fn build(
        self,
        id: EntityId,
        created_at: DateTime<Utc>,
        seq: u64,
    ) -> Result<Rule, CoreError> {
        let rule_name = self.rule_name.trim().to_owned();
        if rule_name.is_empty() {
            return Err(CoreError::validation("rule_name must not be empty"));
        }

        let protocol = self
            .protocol
            .ok_or_else(|| CoreError::validation("protocol is required (TCP, UDP or ANY)"))?;
        let action = self
            .action
            .ok_or_else(|| CoreError::validation("action is required (ALLOW or DENY)"))?;
        let direction = self
            .direction
            .ok_or_else(|| CoreError::validation("direction is required (IN or OUT)"))?;

        let source_ips = normalize_source_ips(self.source_ips.as_ref())?;
        let port = normalize_port(self.port)?;
        let (schedule_start, schedule_end) =
            normalize_schedule(self.schedule_start.as_deref(), self.schedule_end.as_deref())?;
        let days_of_week = DaySet::try_from(self.days_of_week)?;

        Ok(Rule {
            id,
            rule_name,
            source_ips,
            port,
            protocol,
            action,
            direction,
            profile: self.profile.unwrap_or_default(),
            description: non_blank(self.description),
            enabled: self.enabled,
            priority: self.priority,
            schedule_start,
            schedule_end,
            days_of_week,
            group_id: non_blank(self.group_id).map(EntityId::from),
            created_at,
            updated_at: None,
            seq,
        })
    }
}

// ── Backup records ──────────────────────────────────────────────────

/// A rule as written to a backup file.
///
/// Backups from the older console omit `priority`, write `port` as a
/// number and carry naive timestamps. The record accepts all of that and
/// is rebuilt through the same validation as a fresh draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RuleRecord {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    #[serde(flatten)]
    pub draft: RuleDraft,
    #[serde(default = "Utc::now", deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(
        default,
        deserialize_with = "timestamp::deserialize_option",
        skip_serializing_if = "Option::is_none"
    )]
    pub updated_at: Option<DateTime<Utc>>,
}

impl From<&Rule> for RuleRecord {
    fn from(rule: &Rule) -> Self {
        Self {
            id: rule.id.clone(),
            draft: RuleDraft::from(rule),
            created_at: rule.created_at,
            updated_at: rule.updated_at,
        }
    }
}

impl RuleRecord {
    pub(crate) fn build(self, seq: u64) -> Result<Rule, CoreError> {
        let mut rule = self.draft.build(self.id, self.created_at, seq)?;
        rule.updated_at = self.updated_at;
        Ok(rule)
    }
}

// ── Normalization helpers ───────────────────────────────────────────

fn normalize_source_ips(input: Option<&SourceIps>) -> Result<BTreeSet<String>, CoreError> {
    let mut out = BTreeSet::new();
    let Some(input) = input else {
        return Ok(out);
    };
    for entry in input.entries().into_iter().map(str::trim) {
        if entry.is_empty() {
            continue;
        }
        if entry.parse::<IpAddr>().is_err() && entry.parse::<IpNetwork>().is_err() {
            return Err(CoreError::validation(format!(
                "source address '{entry}' is not an IP address or CIDR network"
            )));
        }
        out.insert(entry.to_owned());
    }
    Ok(out)
}

fn normalize_port(input: Option<PortValue>) -> Result<Option<String>, CoreError> {
    let raw = match input {
        None => return Ok(None),
        Some(PortValue::Number(n)) => n.to_string(),
        Some(PortValue::Text(s)) => s,
    };
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(None);
    }
    PortSpec::parse(raw)?;
    Ok(Some(raw.to_owned()))
}

fn normalize_schedule(
    start: Option<&str>,
    end: Option<&str>,
) -> Result<(Option<ClockTime>, Option<ClockTime>), CoreError> {
    let start = start.map(str::trim).filter(|s| !s.is_empty());
    let end = end.map(str::trim).filter(|s| !s.is_empty());
    match (start, end) {
        (None, None) => Ok((None, None)),
        (Some(start), Some(end)) => {
            let start = ClockTime::parse(start)?;
            let end = ClockTime::parse(end)?;
            if start >= end {
                return Err(CoreError::validation(format!(
                    "schedule_start ({start}) must be earlier than schedule_end ({end})"
                )));
            }
            Ok((Some(start), Some(end)))
        }
        _ => Err(CoreError::validation(
            "schedule_start and schedule_end must be set together",
        )),
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|s| s.trim().to_owned())
        .filter(|s| !s.is_empty())
}
