// ── Network configuration resources ──
//
// Interfaces, NAT and static routes. The gateway only stores and
// validates this configuration; applying it to the host is someone
// else's job.

use std::net::Ipv4Addr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use super::entity_id::EntityId;
use super::timestamp;
use crate::error::CoreError;

pub const MTU_RANGE: std::ops::RangeInclusive<u32> = 68..=65_535;
pub const VLAN_RANGE: std::ops::RangeInclusive<u16> = 1..=4094;
pub const METRIC_RANGE: std::ops::RangeInclusive<u32> = 1..=9999;

// ── Interfaces ──────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum IpMode {
    #[default]
    Static,
    Dhcp,
}

/// Stored configuration for one interface, keyed by `interface_name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InterfaceConfig {
    pub interface_name: String,
    pub ip_mode: IpMode,
    pub ip_address: Option<Ipv4Addr>,
    pub subnet_mask: Option<Ipv4Addr>,
    pub gateway: Option<Ipv4Addr>,
    pub dns_primary: Option<Ipv4Addr>,
    pub dns_secondary: Option<Ipv4Addr>,
    pub admin_enabled: bool,
    pub mtu: Option<u32>,
    pub vlan_id: Option<u16>,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InterfaceDraft {
    #[serde(default)]
    pub interface_name: String,
    #[serde(default)]
    pub ip_mode: IpMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subnet_mask: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_primary: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dns_secondary: Option<String>,
    #[serde(default = "default_true")]
    pub admin_enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mtu: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vlan_id: Option<u16>,
}

impl InterfaceDraft {
    pub(crate) fn build(self, now: DateTime<Utc>) -> Result<InterfaceConfig, CoreError> {
        let interface_name = self.interface_name.trim().to_owned();
        if interface_name.is_empty() {
            return Err(CoreError::validation("interface_name must not be empty"));
        }

        let ip_address = optional_ipv4("ip_address", self.ip_address.as_deref())?;
        let subnet_mask = optional_ipv4("subnet_mask", self.subnet_mask.as_deref())?;
        if self.ip_mode == IpMode::Static && (ip_address.is_none() || subnet_mask.is_none()) {
            return Err(CoreError::validation(
                "static mode requires ip_address and subnet_mask",
            ));
        }
        if let Some(mask) = subnet_mask {
            ensure_contiguous_mask(mask)?;
        }

        if let Some(mtu) = self.mtu {
            if !MTU_RANGE.contains(&mtu) {
                return Err(CoreError::validation(format!(
                    "mtu {mtu} out of range {}-{}",
                    MTU_RANGE.start(),
                    MTU_RANGE.end()
                )));
            }
        }
        if let Some(vlan) = self.vlan_id {
            if !VLAN_RANGE.contains(&vlan) {
                return Err(CoreError::validation(format!(
                    "vlan_id {vlan} out of range {}-{}",
                    VLAN_RANGE.start(),
                    VLAN_RANGE.end()
                )));
            }
        }

        Ok(InterfaceConfig {
            interface_name,
            ip_mode: self.ip_mode,
            ip_address,
            subnet_mask,
            gateway: optional_ipv4("gateway", self.gateway.as_deref())?,
            dns_primary: optional_ipv4("dns_primary", self.dns_primary.as_deref())?,
            dns_secondary: optional_ipv4("dns_secondary", self.dns_secondary.as_deref())?,
            admin_enabled: self.admin_enabled,
            mtu: self.mtu,
            vlan_id: self.vlan_id,
            updated_at: now,
        })
    }
}

impl From<&InterfaceConfig> for InterfaceDraft {
    fn from(cfg: &InterfaceConfig) -> Self {
        let text = |addr: Option<Ipv4Addr>| addr.map(|a| a.to_string());
        Self {
            interface_name: cfg.interface_name.clone(),
            ip_mode: cfg.ip_mode,
            ip_address: text(cfg.ip_address),
            subnet_mask: text(cfg.subnet_mask),
            gateway: text(cfg.gateway),
            dns_primary: text(cfg.dns_primary),
            dns_secondary: text(cfg.dns_secondary),
            admin_enabled: cfg.admin_enabled,
            mtu: cfg.mtu,
            vlan_id: cfg.vlan_id,
        }
    }
}

// ── NAT ─────────────────────────────────────────────────────────────

/// Connection-sharing settings: traffic from `lan` is masqueraded out `wan`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NatConfig {
    pub enabled: bool,
    #[serde(default)]
    pub wan: String,
    #[serde(default)]
    pub lan: String,
}

impl NatConfig {
    pub(crate) fn validated(self) -> Result<Self, CoreError> {
        let wan = self.wan.trim().to_owned();
        let lan = self.lan.trim().to_owned();
        if self.enabled {
            if wan.is_empty() || lan.is_empty() {
                return Err(CoreError::validation(
                    "enabling NAT requires both wan and lan interfaces",
                ));
            }
            if wan == lan {
                return Err(CoreError::conflict(
                    "WAN and LAN cannot be the same interface",
                ));
            }
        }
        Ok(Self {
            enabled: self.enabled,
            wan,
            lan,
        })
    }
}

// ── Static routes ───────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum RouteMode {
    #[default]
    Static,
    Dhcp,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StaticRoute {
    #[serde(rename = "_id", alias = "id")]
    pub id: EntityId,
    pub destination: Ipv4Addr,
    pub mask: Ipv4Addr,
    pub gateway: Ipv4Addr,
    #[serde(default = "default_metric")]
    pub metric: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub interface_name: Option<String>,
    #[serde(default)]
    pub mode: RouteMode,
    #[serde(default)]
    pub failover: bool,
    #[serde(deserialize_with = "timestamp::deserialize")]
    pub created_at: DateTime<Utc>,
    #[serde(default, deserialize_with = "timestamp::deserialize_option")]
    pub updated_at: Option<DateTime<Utc>>,
}

impl StaticRoute {
    /// Prefix length of the route mask.
    pub fn prefix_len(&self) -> u32 {
        u32::from(self.mask).count_ones()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDraft {
    #[serde(default)]
    pub destination: String,
    #[serde(default)]
    pub mask: String,
    #[serde(default)]
    pub gateway: String,
    #[serde(default = "default_metric")]
    pub metric: u32,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interface_name: Option<String>,
    #[serde(default)]
    pub mode: RouteMode,
    #[serde(default)]
    pub failover: bool,
}

impl Default for RouteDraft {
    fn default() -> Self {
        Self {
            destination: String::new(),
            mask: String::new(),
            gateway: String::new(),
            metric: default_metric(),
            enabled: true,
            interface_name: None,
            mode: RouteMode::Static,
            failover: false,
        }
    }
}

impl From<&StaticRoute> for RouteDraft {
    fn from(route: &StaticRoute) -> Self {
        Self {
            destination: route.destination.to_string(),
            mask: route.mask.to_string(),
            gateway: route.gateway.to_string(),
            metric: route.metric,
            enabled: route.enabled,
            interface_name: route.interface_name.clone(),
            mode: route.mode,
            failover: route.failover,
        }
    }
}

impl RouteDraft {
    pub(crate) fn build(
        self,
        id: EntityId,
        created_at: DateTime<Utc>,
    ) -> Result<StaticRoute, CoreError> {
        if self.mode == RouteMode::Dhcp {
            return Err(CoreError::Unsupported {
                operation: "DHCP-mode static routes".into(),
            });
        }

        let destination = required_ipv4("destination", &self.destination)?;
        let mask = required_ipv4("mask", &self.mask)?;
        ensure_contiguous_mask(mask)?;
        let gateway = required_ipv4("gateway", &self.gateway)?;

        if !METRIC_RANGE.contains(&self.metric) {
            return Err(CoreError::validation(format!(
                "metric {} out of range {}-{}",
                self.metric,
                METRIC_RANGE.start(),
                METRIC_RANGE.end()
            )));
        }

        Ok(StaticRoute {
            id,
            destination,
            mask,
            gateway,
            metric: self.metric,
            enabled: self.enabled,
            interface_name: self
                .interface_name
                .map(|s| s.trim().to_owned())
                .filter(|s| !s.is_empty()),
            mode: self.mode,
            failover: self.failover,
            created_at,
            updated_at: None,
        })
    }
}

fn default_true() -> bool {
    true
}

fn default_metric() -> u32 {
    1
}

// ── Address helpers ─────────────────────────────────────────────────

fn required_ipv4(field: &str, raw: &str) -> Result<Ipv4Addr, CoreError> {
    raw.trim()
        .parse()
        .map_err(|_| CoreError::validation(format!("{field} '{}' is not a valid IPv4 address", raw.trim())))
}

fn optional_ipv4(field: &str, raw: Option<&str>) -> Result<Option<Ipv4Addr>, CoreError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        None => Ok(None),
        Some(s) => required_ipv4(field, s).map(Some),
    }
}

fn ensure_contiguous_mask(mask: Ipv4Addr) -> Result<(), CoreError> {
    let bits = u32::from(mask);
    // A valid netmask is a run of ones followed by a run of zeros.
    if bits.leading_ones() + bits.trailing_zeros() == 32 {
        Ok(())
    } else {
        Err(CoreError::validation(format!(
            "subnet mask {mask} is not contiguous"
        )))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn static_iface() -> InterfaceDraft {
        InterfaceDraft {
            interface_name: "eth0".into(),
            ip_address: Some("192.168.1.1".into()),
            subnet_mask: Some("255.255.255.0".into()),
            admin_enabled: true,
            ..InterfaceDraft::default()
        }
    }

    #[test]
    fn static_interface_requires_address_and_mask() {
        let err = InterfaceDraft {
            subnet_mask: None,
            ..static_iface()
        }
        .build(Utc::now())
        .unwrap_err();
        assert!(err.to_string().contains("static mode"));
    }

    #[test]
    fn dhcp_interface_needs_no_address() {
        let cfg = InterfaceDraft {
            interface_name: "wan0".into(),
            ip_mode: IpMode::Dhcp,
            ..InterfaceDraft::default()
        }
        .build(Utc::now())
        .unwrap();
        assert_eq!(cfg.ip_address, None);
    }

    #[test]
    fn interface_rejects_bad_mtu_and_vlan() {
        assert!(
            InterfaceDraft {
                mtu: Some(10),
                ..static_iface()
            }
            .build(Utc::now())
            .is_err()
        );
        assert!(
            InterfaceDraft {
                vlan_id: Some(4095),
                ..static_iface()
            }
            .build(Utc::now())
            .is_err()
        );
    }

    #[test]
    fn non_contiguous_mask_is_rejected() {
        let err = InterfaceDraft {
            subnet_mask: Some("255.0.255.0".into()),
            ..static_iface()
        }
        .build(Utc::now())
        .unwrap_err();
        assert!(err.to_string().contains("contiguous"));
    }

    #[test]
    fn nat_same_interface_is_conflict() {
        let err = NatConfig {
            enabled: true,
            wan: "eth0".into(),
            lan: "eth0".into(),
        }
        .validated()
        .unwrap_err();
        assert!(matches!(err, CoreError::Conflict { .. }));
    }

    #[test]
    fn disabled_nat_accepts_empty_names() {
        assert!(NatConfig::default().validated().is_ok());
    }

    #[test]
    fn dhcp_route_is_unsupported() {
        let err = RouteDraft {
            mode: RouteMode::Dhcp,
            ..RouteDraft::default()
        }
        .build(EntityId::generate(), Utc::now())
        .unwrap_err();
        assert!(matches!(err, CoreError::Unsupported { .. }));
    }

    #[test]
    fn route_validates_addresses_and_metric() {
        let good = RouteDraft {
            destination: "10.10.0.0".into(),
            mask: "255.255.0.0".into(),
            gateway: "192.168.1.254".into(),
            ..RouteDraft::default()
        };
        let route = good.clone().build(EntityId::generate(), Utc::now()).unwrap();
        assert_eq!(route.prefix_len(), 16);
        assert_eq!(route.metric, 1);

        assert!(
            RouteDraft {
                gateway: "999.1.1.1".into(),
                ..good.clone()
            }
            .build(EntityId::generate(), Utc::now())
            .is_err()
        );
        assert!(
            RouteDraft {
                metric: 10_000,
                ..good
            }
            .build(EntityId::generate(), Utc::now())
            .is_err()
        );
    }
}
