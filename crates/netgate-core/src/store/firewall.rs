// ── Firewall rule set storage ──
//
// Rules, groups and the compiled matcher live together in one immutable
// `FirewallState`. Writers clone the state, mutate the clone, re-sort and
// recompile, then publish it with a single pointer swap. Readers load one
// snapshot and always see a consistent rule set.

use std::sync::{Arc, Mutex};

use arc_swap::ArcSwap;
use chrono::{NaiveDateTime, Utc};
use tracing::debug;

use crate::error::CoreError;
use crate::matcher::{Connection, Decision, RuleMatcher};
use crate::model::{
    EntityId, GroupDraft, GroupSummary, Rule, RuleAction, RuleDraft, RuleGroup, RuleRecord,
};
use crate::ordering;

/// One consistent version of the firewall configuration.
#[derive(Debug, Clone, Default)]
pub struct FirewallState {
    /// Evaluation order.
    rules: Vec<Arc<Rule>>,
    /// Creation order.
    groups: Vec<Arc<RuleGroup>>,
    matcher: Arc<RuleMatcher>,
    next_seq: u64,
}

impl FirewallState {
    pub fn rules(&self) -> &[Arc<Rule>] {
        &self.rules
    }

    pub fn groups(&self) -> &[Arc<RuleGroup>] {
        &self.groups
    }

    pub fn matcher(&self) -> &RuleMatcher {
        &self.matcher
    }

    pub fn rule(&self, id: &EntityId) -> Option<&Arc<Rule>> {
        self.rules.iter().find(|r| &r.id == id)
    }

    pub fn group(&self, id: &EntityId) -> Option<&Arc<RuleGroup>> {
        self.groups.iter().find(|g| &g.id == id)
    }

    pub fn group_by_name(&self, name: &str) -> Option<&Arc<RuleGroup>> {
        self.groups.iter().find(|g| g.group_name == name)
    }

    /// Rules belonging to `group_id`, in evaluation order.
    pub fn group_rules(&self, group_id: &EntityId) -> Vec<Arc<Rule>> {
        self.rules
            .iter()
            .filter(|r| r.group_id.as_ref() == Some(group_id))
            .cloned()
            .collect()
    }

    fn rule_index(&self, id: &EntityId) -> Result<usize, CoreError> {
        self.rules
            .iter()
            .position(|r| &r.id == id)
            .ok_or_else(|| CoreError::not_found("Rule", id))
    }

    fn group_index(&self, id: &EntityId) -> Result<usize, CoreError> {
        self.groups
            .iter()
            .position(|g| &g.id == id)
            .ok_or_else(|| CoreError::not_found("RuleGroup", id))
    }

    fn ensure_group_exists(&self, group_id: Option<&EntityId>) -> Result<(), CoreError> {
        match group_id {
            Some(id) if self.group(id).is_none() => Err(CoreError::validation(format!(
                "group_id {id} does not reference an existing group"
            ))),
            _ => Ok(()),
        }
    }

    fn take_seq(&mut self) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        seq
    }

    /// Restore evaluation order and rebuild the matcher.
    fn seal(&mut self, default_action: RuleAction) {
        ordering::sort_rules(&mut self.rules);
        self.matcher = Arc::new(RuleMatcher::compile(
            self.rules.iter().map(AsRef::as_ref),
            default_action,
        ));
    }
}

/// Transactional store for rules and rule groups.
pub struct FirewallStore {
    state: ArcSwap<FirewallState>,
    write_lock: Mutex<()>,
    default_action: RuleAction,
}

impl FirewallStore {
    pub fn new(default_action: RuleAction) -> Self {
        let mut state = FirewallState::default();
        state.seal(default_action);
        Self {
            state: ArcSwap::from_pointee(state),
            write_lock: Mutex::new(()),
            default_action,
        }
    }

    /// Current consistent snapshot.
    pub fn snapshot(&self) -> Arc<FirewallState> {
        self.state.load_full()
    }

    /// Apply `f` to a private copy of the state and publish it only if `f`
    /// succeeds.
    fn transact<R>(
        &self,
        f: impl FnOnce(&mut FirewallState) -> Result<R, CoreError>,
    ) -> Result<R, CoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| CoreError::Internal("firewall store lock poisoned".into()))?;

        let mut next = FirewallState::clone(&self.state.load());
        let out = f(&mut next)?;
        next.seal(self.default_action);
        self.state.store(Arc::new(next));
        Ok(out)
    }

    // ── Rules ────────────────────────────────────────────────────────

    /// All rules in evaluation order.
    pub fn list_rules(&self) -> Vec<Arc<Rule>> {
        self.snapshot().rules.clone()
    }

    pub fn get_rule(&self, id: &EntityId) -> Result<Arc<Rule>, CoreError> {
        self.snapshot()
            .rule(id)
            .cloned()
            .ok_or_else(|| CoreError::not_found("Rule", id))
    }

    pub fn create_rule(&self, draft: RuleDraft) -> Result<Rule, CoreError> {
        self.transact(|state| {
            let seq = state.take_seq();
            let rule = draft.build(EntityId::generate(), Utc::now(), seq)?;
            state.ensure_group_exists(rule.group_id.as_ref())?;
            debug!(rule_id = %rule.id, name = %rule.rule_name, "rule created");
            state.rules.push(Arc::new(rule.clone()));
            Ok(rule)
        })
    }

    /// Full replace. Identity, creation time and creation order are kept.
    pub fn update_rule(&self, id: &EntityId, draft: RuleDraft) -> Result<Rule, CoreError> {
        self.transact(|state| {
            let idx = state.rule_index(id)?;
            let current = &state.rules[idx];
            let mut rule = draft.build(current.id.clone(), current.created_at, current.seq)?;
            rule.updated_at = Some(Utc::now());
            state.ensure_group_exists(rule.group_id.as_ref())?;
            state.rules[idx] = Arc::new(rule.clone());
            Ok(rule)
        })
    }

    pub fn delete_rule(&self, id: &EntityId) -> Result<Rule, CoreError> {
        self.transact(|state| {
            let idx = state.rule_index(id)?;
            let removed = state.rules.remove(idx);
            Ok(Rule::clone(&removed))
        })
    }

    pub fn reorder_rules(&self, ordered_ids: &[EntityId]) -> Result<(), CoreError> {
        self.transact(|state| ordering::reprioritize(&mut state.rules, ordered_ids))
    }

    /// Evaluate a connection against the current rule set.
    pub fn decide(&self, conn: &Connection, now: NaiveDateTime) -> Result<Decision, CoreError> {
        self.snapshot().matcher.decide(conn, now)
    }

    // ── Groups ───────────────────────────────────────────────────────

    /// Groups in creation order with their current member counts.
    pub fn list_groups(&self) -> Vec<GroupSummary> {
        let state = self.snapshot();
        state
            .groups
            .iter()
            .map(|g| GroupSummary {
                group: RuleGroup::clone(g),
                rule_count: state
                    .rules
                    .iter()
                    .filter(|r| r.group_id.as_ref() == Some(&g.id))
                    .count(),
            })
            .collect()
    }

    pub fn group_rules(&self, id: &EntityId) -> Result<Vec<Arc<Rule>>, CoreError> {
        let state = self.snapshot();
        state.group_index(id)?;
        Ok(state.group_rules(id))
    }

    pub fn create_group(&self, draft: GroupDraft) -> Result<RuleGroup, CoreError> {
        self.transact(|state| {
            let group = draft.build(EntityId::generate(), Utc::now())?;
            state.groups.push(Arc::new(group.clone()));
            Ok(group)
        })
    }

    pub fn update_group(&self, id: &EntityId, draft: GroupDraft) -> Result<RuleGroup, CoreError> {
        self.transact(|state| {
            let idx = state.group_index(id)?;
            let current = &state.groups[idx];
            let mut group = draft.build(current.id.clone(), current.created_at)?;
            group.updated_at = Some(Utc::now());
            state.groups[idx] = Arc::new(group.clone());
            Ok(group)
        })
    }

    /// Delete a group and detach its member rules. Returns how many rules
    /// were detached.
    pub fn delete_group(&self, id: &EntityId) -> Result<usize, CoreError> {
        self.transact(|state| {
            let idx = state.group_index(id)?;
            state.groups.remove(idx);

            let mut detached = 0;
            for rule in &mut state.rules {
                if rule.group_id.as_ref() == Some(id) {
                    let rule = Arc::make_mut(rule);
                    rule.group_id = None;
                    rule.updated_at = Some(Utc::now());
                    detached += 1;
                }
            }
            Ok(detached)
        })
    }

    /// Enable or disable every rule in a group. Returns the number of
    /// member rules.
    pub fn set_group_rules_enabled(&self, id: &EntityId, enabled: bool) -> Result<usize, CoreError> {
        self.transact(|state| {
            state.group_index(id)?;
            let now = Utc::now();
            let mut count = 0;
            for rule in &mut state.rules {
                if rule.group_id.as_ref() == Some(id) {
                    count += 1;
                    if rule.enabled != enabled {
                        let rule = Arc::make_mut(rule);
                        rule.enabled = enabled;
                        rule.updated_at = Some(now);
                    }
                }
            }
            Ok(count)
        })
    }

    /// Find the group called `group_name`, creating it when missing, and
    /// make sure it holds a rule named `rule_name`. Returns `true` when the
    /// rule had to be created.
    pub fn ensure_group_rule(
        &self,
        group_name: &str,
        group_description: &str,
        rule_name: &str,
        draft: impl FnOnce(EntityId) -> RuleDraft,
    ) -> Result<bool, CoreError> {
        self.transact(|state| {
            let group_id = if let Some(group) = state.group_by_name(group_name) {
                group.id.clone()
            } else {
                let group = GroupDraft {
                    group_name: group_name.to_owned(),
                    description: Some(group_description.to_owned()),
                }
                .build(EntityId::generate(), Utc::now())?;
                let id = group.id.clone();
                state.groups.push(Arc::new(group));
                id
            };

            let present = state
                .rules
                .iter()
                .any(|r| r.group_id.as_ref() == Some(&group_id) && r.rule_name == rule_name);
            if present {
                return Ok(false);
            }

            let seq = state.take_seq();
            let rule = draft(group_id).build(EntityId::generate(), Utc::now(), seq)?;
            state.rules.push(Arc::new(rule));
            Ok(true)
        })
    }

    // ── Bulk replace ─────────────────────────────────────────────────

    /// Replace the whole rule set. Every rule is re-validated; any failure
    /// leaves the current set untouched.
    pub fn replace_all(
        &self,
        groups: Option<Vec<RuleGroup>>,
        rules: Option<Vec<RuleRecord>>,
    ) -> Result<(), CoreError> {
        self.transact(|state| {
            if let Some(groups) = groups {
                let mut fresh = Vec::with_capacity(groups.len());
                for group in groups {
                    let draft = GroupDraft {
                        group_name: group.group_name,
                        description: group.description,
                    };
                    let mut built = draft.build(group.id, group.created_at)?;
                    built.updated_at = group.updated_at;
                    fresh.push(Arc::new(built));
                }
                state.groups = fresh;
            }

            let mut rules = match rules {
                Some(rules) => rules,
                // Keep current rules, but they must still point at real groups.
                None => state.rules.iter().map(|r| RuleRecord::from(&**r)).collect(),
            };
            rules.sort_by_key(|r| r.created_at);

            state.rules.clear();
            state.next_seq = 0;
            for record in rules {
                let seq = state.take_seq();
                let built = record.build(seq)?;
                if let Some(gid) = built.group_id.as_ref() {
                    if state.group(gid).is_none() {
                        return Err(CoreError::validation(format!(
                            "rule '{}' references unknown group {gid}",
                            built.rule_name
                        )));
                    }
                }
                state.rules.push(Arc::new(built));
            }
            Ok(())
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Direction, Profile, Protocol, SourceIps};
    use chrono::NaiveDate;
    use pretty_assertions::assert_eq;

    fn draft(name: &str) -> RuleDraft {
        RuleDraft {
            rule_name: name.into(),
            protocol: Some(Protocol::Tcp),
            action: Some(RuleAction::Allow),
            direction: Some(Direction::In),
            ..RuleDraft::default()
        }
    }

    fn in_group(name: &str, group: &RuleGroup) -> RuleDraft {
        RuleDraft {
            group_id: Some(group.id.to_string()),
            ..draft(name)
        }
    }

    fn names(rules: &[Arc<Rule>]) -> Vec<String> {
        rules.iter().map(|r| r.rule_name.clone()).collect()
    }

    fn store() -> FirewallStore {
        FirewallStore::new(RuleAction::Deny)
    }

    #[test]
    fn list_is_priority_then_creation_order() {
        let s = store();
        s.create_rule(RuleDraft { priority: 50, ..draft("b") }).unwrap();
        s.create_rule(RuleDraft { priority: 10, ..draft("a") }).unwrap();
        s.create_rule(RuleDraft { priority: 50, ..draft("c") }).unwrap();
        s.create_rule(draft("d")).unwrap();

        let rules = s.list_rules();
        assert_eq!(names(&rules), vec!["a", "b", "c", "d"]);
        assert!(rules.windows(2).all(|w| w[0].priority <= w[1].priority));
    }

    #[test]
    fn reorder_then_list_matches_request() {
        let s = store();
        let r1 = s.create_rule(draft("r1")).unwrap();
        let r2 = s.create_rule(draft("r2")).unwrap();
        let r3 = s.create_rule(draft("r3")).unwrap();

        s.reorder_rules(&[r3.id, r1.id, r2.id]).unwrap();
        let rules = s.list_rules();
        assert_eq!(names(&rules), vec!["r3", "r1", "r2"]);
        assert!(rules.windows(2).all(|w| w[0].priority < w[1].priority));
    }

    #[test]
    fn update_keeps_identity_and_creation_order() {
        let s = store();
        let a = s.create_rule(draft("a")).unwrap();
        s.create_rule(draft("b")).unwrap();

        let updated = s
            .update_rule(&a.id, RuleDraft { description: Some("new".into()), ..draft("a2") })
            .unwrap();
        assert_eq!(updated.id, a.id);
        assert_eq!(updated.created_at, a.created_at);
        assert!(updated.updated_at.is_some());
        assert_eq!(names(&s.list_rules()), vec!["a2", "b"]);
    }

    #[test]
    fn update_and_delete_unknown_rule_is_not_found() {
        let s = store();
        let missing = EntityId::generate();
        assert!(matches!(
            s.update_rule(&missing, draft("x")),
            Err(CoreError::NotFound { .. })
        ));
        assert!(matches!(s.delete_rule(&missing), Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn deleting_twice_reports_not_found() {
        let s = store();
        let r = s.create_rule(draft("a")).unwrap();
        s.delete_rule(&r.id).unwrap();
        assert!(matches!(s.delete_rule(&r.id), Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn rule_with_unknown_group_is_rejected() {
        let s = store();
        let err = s
            .create_rule(RuleDraft {
                group_id: Some("nope".into()),
                ..draft("a")
            })
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert!(s.list_rules().is_empty());
    }

    #[test]
    fn group_toggle_only_touches_members() {
        let s = store();
        let g = s.create_group(GroupDraft::new("office")).unwrap();
        for name in ["m1", "m2", "m3"] {
            s.create_rule(in_group(name, &g)).unwrap();
        }
        s.create_rule(draft("outsider")).unwrap();

        let count = s.set_group_rules_enabled(&g.id, false).unwrap();
        assert_eq!(count, 3);

        let rules = s.list_rules();
        let disabled: Vec<_> = rules.iter().filter(|r| !r.enabled).collect();
        assert_eq!(disabled.len(), 3);
        assert!(disabled.iter().all(|r| r.group_id.as_ref() == Some(&g.id)));
        assert!(s.get_rule(&rules[3].id).unwrap().enabled);
    }

    #[test]
    fn deleting_group_detaches_its_rules() {
        let s = store();
        let g = s.create_group(GroupDraft::new("temp")).unwrap();
        let ids: Vec<EntityId> = ["a", "b", "c"]
            .into_iter()
            .map(|n| s.create_rule(in_group(n, &g)).unwrap().id)
            .collect();

        assert_eq!(s.delete_group(&g.id).unwrap(), 3);
        for id in &ids {
            assert_eq!(s.get_rule(id).unwrap().group_id, None);
        }
        assert!(s.list_groups().is_empty());
        assert!(matches!(s.group_rules(&g.id), Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn group_counts_are_derived() {
        let s = store();
        let g1 = s.create_group(GroupDraft::new("one")).unwrap();
        let g2 = s.create_group(GroupDraft::new("two")).unwrap();
        s.create_rule(in_group("a", &g1)).unwrap();
        s.create_rule(in_group("b", &g1)).unwrap();
        let moved = s.create_rule(in_group("c", &g2)).unwrap();
        s.update_rule(&moved.id, in_group("c", &g1)).unwrap();

        let counts: Vec<(String, usize)> = s
            .list_groups()
            .into_iter()
            .map(|g| (g.group.group_name, g.rule_count))
            .collect();
        assert_eq!(counts, vec![("one".into(), 3), ("two".into(), 0)]);
    }

    #[test]
    fn lower_priority_value_decides_regardless_of_creation_order() {
        let s = store();
        s.create_rule(RuleDraft {
            priority: 20,
            ..draft("allow-late")
        })
        .unwrap();
        s.create_rule(RuleDraft {
            priority: 10,
            action: Some(RuleAction::Deny),
            ..draft("deny-early")
        })
        .unwrap();

        let conn = Connection {
            src_ip: "192.168.1.5".parse().unwrap(),
            protocol: Protocol::Tcp,
            port: Some(443),
            direction: Direction::In,
            profile: Profile::Any,
        };
        let now = NaiveDate::from_ymd_opt(2024, 1, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap();
        let d = s.decide(&conn, now).unwrap();
        assert_eq!(d.action, RuleAction::Deny);
        assert_eq!(d.rule_name.as_deref(), Some("deny-early"));
    }

    #[test]
    fn snapshot_taken_before_reorder_is_unchanged() {
        let s = store();
        let a = s.create_rule(draft("a")).unwrap();
        let b = s.create_rule(draft("b")).unwrap();
        let before = s.snapshot();
        s.reorder_rules(&[b.id, a.id]).unwrap();
        assert_eq!(names(before.rules()), vec!["a", "b"]);
        assert_eq!(names(&s.list_rules()), vec!["b", "a"]);
    }

    #[test]
    fn source_ips_survive_a_round_trip() {
        let s = store();
        let r = s
            .create_rule(RuleDraft {
                source_ips: Some(SourceIps::Text("192.168.1.1, 10.0.0.1".into())),
                ..draft("src")
            })
            .unwrap();
        let stored = s.get_rule(&r.id).unwrap();
        let expected: Vec<&str> = vec!["10.0.0.1", "192.168.1.1"];
        assert_eq!(stored.source_ips.iter().map(String::as_str).collect::<Vec<_>>(), expected);
    }

    #[test]
    fn ensure_group_rule_is_idempotent() {
        let s = store();
        let make = |gid: EntityId| RuleDraft {
            group_id: Some(gid.to_string()),
            ..draft("block")
        };
        assert!(s.ensure_group_rule("G", "desc", "block", make).unwrap());
        assert!(!s.ensure_group_rule("G", "desc", "block", make).unwrap());
        assert_eq!(s.list_groups().len(), 1);
        assert_eq!(s.list_rules().len(), 1);
    }

    #[test]
    fn replace_all_rejects_dangling_group_reference() {
        let s = store();
        s.create_rule(draft("keep")).unwrap();

        let orphan = RuleDraft {
            group_id: Some("missing".into()),
            ..draft("orphan")
        }
        .build(EntityId::generate(), Utc::now(), 0)
        .unwrap();

        let err = s.replace_all(Some(vec![]), Some(vec![RuleRecord::from(&orphan)])).unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(names(&s.list_rules()), vec!["keep"]);
    }
}
