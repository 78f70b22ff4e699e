// ── Central data store ──
//
// Owns every persisted resource: the transactional firewall rule set
// plus keyed collections for interfaces, routes and blocked domains.

use std::sync::Arc;

use arc_swap::ArcSwap;
use chrono::Utc;
use tracing::{debug, info};

use super::collection::EntityCollection;
use super::firewall::FirewallStore;
use crate::error::CoreError;
use crate::model::dns::{self, ADBLOCK_NOTE};
use crate::model::{
    Backup, BlockedDomain, DomainDraft, EntityId, InterfaceConfig, InterfaceDraft, NatConfig,
    RouteDraft, RuleAction, RuleRecord, StaticRoute,
};

/// Central store for all gateway configuration.
///
/// Reads are served from snapshots. Writes are expected to come from the
/// controller's command processor, one at a time.
pub struct DataStore {
    pub(crate) firewall: FirewallStore,
    pub(crate) interfaces: EntityCollection<InterfaceConfig>,
    pub(crate) routes: EntityCollection<StaticRoute>,
    pub(crate) domains: EntityCollection<BlockedDomain>,
    pub(crate) nat: ArcSwap<NatConfig>,
}

impl DataStore {
    pub fn new(default_action: RuleAction) -> Self {
        Self {
            firewall: FirewallStore::new(default_action),
            interfaces: EntityCollection::new(),
            routes: EntityCollection::new(),
            domains: EntityCollection::new(),
            nat: ArcSwap::from_pointee(NatConfig::default()),
        }
    }

    pub fn firewall(&self) -> &FirewallStore {
        &self.firewall
    }

    // ── Snapshot accessors ───────────────────────────────────────────

    pub fn interfaces_snapshot(&self) -> Arc<Vec<Arc<InterfaceConfig>>> {
        self.interfaces.snapshot()
    }

    pub fn routes_snapshot(&self) -> Arc<Vec<Arc<StaticRoute>>> {
        self.routes.snapshot()
    }

    pub fn domains_snapshot(&self) -> Arc<Vec<Arc<BlockedDomain>>> {
        self.domains.snapshot()
    }

    pub fn nat(&self) -> NatConfig {
        NatConfig::clone(&self.nat.load())
    }

    /// Blocklist in hosts-file format.
    pub fn blocklist_hosts(&self) -> String {
        let snap = self.domains.snapshot();
        dns::render_hosts(snap.iter().map(AsRef::as_ref))
    }

    // ── Interfaces ───────────────────────────────────────────────────

    /// Create or replace the interface named in the draft.
    pub(crate) fn save_interface(&self, draft: InterfaceDraft) -> Result<InterfaceConfig, CoreError> {
        let cfg = draft.build(Utc::now())?;
        let is_new = self.interfaces.upsert(cfg.interface_name.clone(), cfg.clone());
        debug!(interface = %cfg.interface_name, is_new, "interface saved");
        Ok(cfg)
    }

    /// Replace an existing interface. The path name wins over the body.
    pub(crate) fn update_interface(
        &self,
        name: &str,
        mut draft: InterfaceDraft,
    ) -> Result<InterfaceConfig, CoreError> {
        if !self.interfaces.contains(name) {
            return Err(CoreError::not_found("Interface", name));
        }
        name.clone_into(&mut draft.interface_name);
        self.save_interface(draft)
    }

    pub(crate) fn delete_interface(&self, name: &str) -> Result<(), CoreError> {
        self.interfaces
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| CoreError::not_found("Interface", name))
    }

    // ── NAT ──────────────────────────────────────────────────────────

    pub(crate) fn set_nat(&self, cfg: NatConfig) -> Result<NatConfig, CoreError> {
        let cfg = cfg.validated()?;
        self.nat.store(Arc::new(cfg.clone()));
        Ok(cfg)
    }

    // ── Static routes ────────────────────────────────────────────────

    pub(crate) fn create_route(&self, draft: RouteDraft) -> Result<StaticRoute, CoreError> {
        let route = draft.build(EntityId::generate(), Utc::now())?;
        self.routes.upsert(route.id.to_string(), route.clone());
        Ok(route)
    }

    pub(crate) fn update_route(&self, id: &EntityId, draft: RouteDraft) -> Result<StaticRoute, CoreError> {
        let key = id.to_string();
        let current = self
            .routes
            .get(&key)
            .ok_or_else(|| CoreError::not_found("Route", id))?;
        let mut route = draft.build(current.id.clone(), current.created_at)?;
        route.updated_at = Some(Utc::now());
        self.routes.upsert(key, route.clone());
        Ok(route)
    }

    pub(crate) fn delete_route(&self, id: &EntityId) -> Result<(), CoreError> {
        self.routes
            .remove(&id.to_string())
            .map(|_| ())
            .ok_or_else(|| CoreError::not_found("Route", id))
    }

    // ── Blocked domains ──────────────────────────────────────────────

    pub(crate) fn block_domain(&self, draft: DomainDraft) -> Result<BlockedDomain, CoreError> {
        let entry = draft.build(Utc::now())?;
        if self.domains.contains(&entry.domain) {
            return Err(CoreError::conflict(format!(
                "domain {} is already blocked",
                entry.domain
            )));
        }
        self.domains.upsert(entry.domain.clone(), entry.clone());
        Ok(entry)
    }

    pub(crate) fn unblock_domain(&self, domain: &str) -> Result<(), CoreError> {
        let domain = dns::normalize_domain(domain)?;
        self.domains
            .remove(&domain)
            .map(|_| ())
            .ok_or_else(|| CoreError::not_found("Domain", domain))
    }

    /// Add every domain in a downloaded list that is not yet blocked.
    /// Returns the number added.
    pub(crate) fn import_blocklist(&self, contents: &str) -> usize {
        let now = Utc::now();
        let mut added = 0;
        for domain in dns::parse_blocklist(contents) {
            if self.domains.contains(&domain) {
                continue;
            }
            let entry = BlockedDomain {
                id: EntityId::generate(),
                domain: domain.clone(),
                note: ADBLOCK_NOTE.into(),
                use_wildcard: false,
                created_at: now,
            };
            self.domains.upsert(domain, entry);
            added += 1;
        }
        info!(added, "blocklist imported");
        added
    }

    // ── Backup ───────────────────────────────────────────────────────

    pub fn export_backup(&self) -> Backup {
        let firewall = self.firewall.snapshot();
        Backup {
            exported_at: Some(Utc::now()),
            interfaces: Some(owned_vec(&self.interfaces.snapshot())),
            firewall_rules: Some(
                firewall
                    .rules()
                    .iter()
                    .map(|r| RuleRecord::from(&**r))
                    .collect(),
            ),
            firewall_groups: Some(owned_vec(firewall.groups())),
            routes: Some(owned_vec(&self.routes.snapshot())),
            blocked_domains: Some(owned_vec(&self.domains.snapshot())),
            nat: Some(self.nat()),
        }
    }

    /// Replace every section present in `backup`. Everything is validated
    /// before anything is replaced.
    pub(crate) fn import_backup(&self, backup: Backup) -> Result<(), CoreError> {
        let interfaces = backup
            .interfaces
            .map(|items| {
                items
                    .iter()
                    .map(|cfg| {
                        let built = InterfaceDraft::from(cfg).build(cfg.updated_at)?;
                        Ok((built.interface_name.clone(), built))
                    })
                    .collect::<Result<Vec<_>, CoreError>>()
            })
            .transpose()?;

        let routes = backup
            .routes
            .map(|items| {
                items
                    .iter()
                    .map(|r| {
                        let mut built = RouteDraft::from(r).build(r.id.clone(), r.created_at)?;
                        built.updated_at = r.updated_at;
                        Ok((built.id.to_string(), built))
                    })
                    .collect::<Result<Vec<_>, CoreError>>()
            })
            .transpose()?;

        let domains = backup
            .blocked_domains
            .map(|items| {
                items
                    .into_iter()
                    .map(|mut d| {
                        d.domain = dns::normalize_domain(&d.domain)?;
                        Ok((d.domain.clone(), d))
                    })
                    .collect::<Result<Vec<_>, CoreError>>()
            })
            .transpose()?;

        let nat = backup.nat.map(NatConfig::validated).transpose()?;

        if backup.firewall_groups.is_some() || backup.firewall_rules.is_some() {
            self.firewall
                .replace_all(backup.firewall_groups, backup.firewall_rules)?;
        }
        if let Some(items) = interfaces {
            self.interfaces.replace_all(items);
        }
        if let Some(items) = routes {
            self.routes.replace_all(items);
        }
        if let Some(items) = domains {
            self.domains.replace_all(items);
        }
        if let Some(nat) = nat {
            self.nat.store(Arc::new(nat));
        }
        info!("backup imported");
        Ok(())
    }
}

fn owned_vec<T: Clone>(snap: &[Arc<T>]) -> Vec<T> {
    snap.iter().map(|v| T::clone(v)).collect()
}
