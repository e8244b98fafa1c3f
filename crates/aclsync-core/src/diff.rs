// ── Desired vs actual rule comparison ──

use std::collections::HashSet;

use tracing::debug;

use crate::model::{CanonicalRule, Delta};

/// Compute the rules to add and remove so that `actual` matches `desired`.
///
/// Membership is exact structural equality. Output keeps input order and
/// duplicates are not collapsed, so `diff(d, &[])` adds every element of `d`.
pub fn diff(desired: &[CanonicalRule], actual: &[CanonicalRule]) -> Delta {
    let desired_set: HashSet<&CanonicalRule> = desired.iter().collect();
    let actual_set: HashSet<&CanonicalRule> = actual.iter().collect();

    let (unchanged, to_add): (Vec<CanonicalRule>, Vec<CanonicalRule>) = desired
        .iter()
        .cloned()
        .partition(|rule| actual_set.contains(rule));

    let to_remove: Vec<CanonicalRule> = actual
        .iter()
        .filter(|rule| !desired_set.contains(rule))
        .cloned()
        .collect();

    debug!(
        add = to_add.len(),
        remove = to_remove.len(),
        unchanged = unchanged.len(),
        "computed delta"
    );

    Delta {
        to_add,
        to_remove,
        unchanged,
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::model::Protocol;

    fn tcp(prefix: &str, ports: &str) -> CanonicalRule {
        CanonicalRule::new(prefix, Protocol::Tcp, ports)
    }

    #[test]
    fn identical_lists_are_empty_delta() {
        let rules = vec![tcp("13.107.6.152/31", "80,443"), CanonicalRule::ip("10.0.0.0/8")];
        let delta = diff(&rules, &rules);
        assert!(delta.is_empty());
        assert_eq!(delta.unchanged, rules);
    }

    #[test]
    fn empty_device_adds_everything() {
        let desired = vec![
            tcp("13.107.6.152/31", "443"),
            tcp("13.107.6.152/31", "443"),
            CanonicalRule::ip("10.0.0.0/8"),
        ];
        let delta = diff(&desired, &[]);
        assert_eq!(delta.to_add, desired);
        assert!(delta.to_remove.is_empty());
    }

    #[test]
    fn empty_desired_removes_everything() {
        let actual = vec![tcp("13.107.6.152/31", "443"), CanonicalRule::ip("10.0.0.0/8")];
        let delta = diff(&[], &actual);
        assert!(delta.to_add.is_empty());
        assert_eq!(delta.to_remove, actual);
    }

    #[test]
    fn partial_overlap() {
        let desired = vec![tcp("a/32", "443"), tcp("b/32", "443"), tcp("c/32", "443")];
        let actual = vec![tcp("b/32", "443"), tcp("d/32", "443")];

        let delta = diff(&desired, &actual);

        assert_eq!(delta.to_add, vec![tcp("a/32", "443"), tcp("c/32", "443")]);
        assert_eq!(delta.to_remove, vec![tcp("d/32", "443")]);
        assert_eq!(delta.unchanged, vec![tcp("b/32", "443")]);
    }

    #[test]
    fn reordered_ports_cause_replace() {
        let delta = diff(
            &[tcp("13.107.6.152/31", "80,443")],
            &[tcp("13.107.6.152/31", "443,80")],
        );
        assert_eq!(delta.to_add, vec![tcp("13.107.6.152/31", "80,443")]);
        assert_eq!(delta.to_remove, vec![tcp("13.107.6.152/31", "443,80")]);
    }

    #[test]
    fn unnormalized_host_prefix_is_not_matched() {
        // The published list may omit /32; the switch always reports it.
        let delta = diff(
            &[CanonicalRule::ip("13.107.6.152")],
            &[CanonicalRule::ip("13.107.6.152/32")],
        );
        assert_eq!(delta.to_add.len(), 1);
        assert_eq!(delta.to_remove.len(), 1);
    }
}
