// ── Rule ordering ──
//
// Evaluation order is ascending `priority`, ties broken by creation
// sequence. Reprioritizing turns an explicit id list into fresh,
// contiguous priorities (1, 2, 3, ...) for the whole rule set.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use crate::error::CoreError;
use crate::model::{EntityId, Rule};

/// Sort rules into evaluation order. Stable.
pub fn sort_rules(rules: &mut [Arc<Rule>]) {
    rules.sort_by_key(|r| (r.priority, r.seq));
}

/// Reorder `rules` (currently in evaluation order) so that the rules named
/// in `ordered_ids` appear in exactly that relative order.
///
/// The listed rules are permuted among the positions they already occupy;
/// unlisted rules stay where they are. Afterwards every rule is renumbered
/// to a contiguous priority starting at 1. Nothing is modified on error.
pub fn reprioritize(rules: &mut Vec<Arc<Rule>>, ordered_ids: &[EntityId]) -> Result<(), CoreError> {
    if ordered_ids.is_empty() {
        return Err(CoreError::validation("ordered_ids must not be empty"));
    }

    let mut seen = HashSet::with_capacity(ordered_ids.len());
    if let Some(dup) = ordered_ids.iter().find(|id| !seen.insert(*id)) {
        return Err(CoreError::validation(format!(
            "duplicate rule id in ordering: {dup}"
        )));
    }

    let position: HashMap<&EntityId, usize> = rules
        .iter()
        .enumerate()
        .map(|(idx, rule)| (&rule.id, idx))
        .collect();

    let mut slots = Vec::with_capacity(ordered_ids.len());
    for id in ordered_ids {
        let idx = position
            .get(id)
            .copied()
            .ok_or_else(|| CoreError::not_found("Rule", id))?;
        slots.push(idx);
    }

    // Listed rules in requested order, dealt into their occupied slots in
    // ascending position order.
    let moved: Vec<Arc<Rule>> = slots.iter().map(|&idx| Arc::clone(&rules[idx])).collect();
    slots.sort_unstable();

    let mut reordered = rules.clone();
    for (slot, rule) in slots.into_iter().zip(moved) {
        reordered[slot] = rule;
    }

    renumber(&mut reordered)?;
    *rules = reordered;
    Ok(())
}

/// Assign priorities 1..=n following the current order.
fn renumber(rules: &mut [Arc<Rule>]) -> Result<(), CoreError> {
    for (idx, rule) in rules.iter_mut().enumerate() {
        let priority = i32::try_from(idx + 1)
            .map_err(|_| CoreError::Internal("rule count exceeds priority range".into()))?;
        if rule.priority != priority {
            Arc::make_mut(rule).priority = priority;
        }
    }
    Ok(())
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::{Direction, Protocol, RuleAction, RuleDraft};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn rule(id: &str, priority: i32, seq: u64) -> Arc<Rule> {
        Arc::new(
            RuleDraft {
                rule_name: id.into(),
                protocol: Some(Protocol::Tcp),
                action: Some(RuleAction::Allow),
                direction: Some(Direction::In),
                priority,
                ..RuleDraft::default()
            }
            .build(EntityId::from(id), Utc::now(), seq)
            .unwrap(),
        )
    }

    fn ids(rules: &[Arc<Rule>]) -> Vec<String> {
        rules.iter().map(|r| r.id.to_string()).collect()
    }

    fn priorities(rules: &[Arc<Rule>]) -> Vec<i32> {
        rules.iter().map(|r| r.priority).collect()
    }

    #[test]
    fn sort_orders_by_priority_then_creation() {
        let mut rules = vec![rule("c", 5, 2), rule("a", 10, 0), rule("b", 5, 1)];
        sort_rules(&mut rules);
        assert_eq!(ids(&rules), vec!["b", "c", "a"]);
    }

    #[test]
    fn full_reorder_yields_requested_sequence() {
        let mut rules = vec![rule("r1", 100, 0), rule("r2", 100, 1), rule("r3", 100, 2)];
        reprioritize(&mut rules, &["r3".into(), "r1".into(), "r2".into()]).unwrap();
        assert_eq!(ids(&rules), vec!["r3", "r1", "r2"]);
        assert_eq!(priorities(&rules), vec![1, 2, 3]);
    }

    #[test]
    fn subset_reorder_keeps_unlisted_positions() {
        let mut rules = vec![
            rule("a", 1, 0),
            rule("b", 2, 1),
            rule("c", 3, 2),
            rule("d", 4, 3),
        ];
        reprioritize(&mut rules, &["d".into(), "b".into()]).unwrap();
        assert_eq!(ids(&rules), vec!["a", "d", "c", "b"]);
        assert_eq!(priorities(&rules), vec![1, 2, 3, 4]);
    }

    #[test]
    fn duplicate_ids_are_rejected_without_changes() {
        let mut rules = vec![rule("a", 7, 0), rule("b", 9, 1)];
        let err = reprioritize(&mut rules, &["a".into(), "a".into()]).unwrap_err();
        assert!(matches!(err, CoreError::Validation { .. }));
        assert_eq!(priorities(&rules), vec![7, 9]);
    }

    #[test]
    fn unknown_id_is_not_found_without_changes() {
        let mut rules = vec![rule("a", 7, 0)];
        let err = reprioritize(&mut rules, &["a".into(), "zzz".into()]).unwrap_err();
        assert!(matches!(err, CoreError::NotFound { .. }));
        assert_eq!(priorities(&rules), vec![7]);
    }

    #[test]
    fn empty_list_is_rejected() {
        let mut rules = vec![rule("a", 7, 0)];
        assert!(reprioritize(&mut rules, &[]).is_err());
    }
}
