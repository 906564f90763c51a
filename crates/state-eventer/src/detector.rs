//! Change detection.
//!
//! Given one pending mutation, work out which registered paths observe a
//! different value afterwards and what the old/new pair is for each. The
//! result is ordered exact, then descendants (registration order), then
//! ancestors (nearest first), then paths beside the write whose array slot
//! was filled by padding; one [`Notification`] per path, fanned out to every
//! listener registered there.

use std::fmt;

use state_eventer_path::Path;
use state_eventer_value::{deep_equal, deep_equal_opt, StateValue};

use crate::error::Result;
use crate::identity;
use crate::index::{ListenerRecord, PathIndex};
use crate::snapshot::Snapshot;
use crate::tree::StateTree;

/// A single requested change.
#[derive(Debug, Clone)]
pub enum Mutation {
    Set { path: Path, value: StateValue },
    Delete { path: Path },
    ReplaceRoot { value: StateValue },
}

impl Mutation {
    /// A write at `path`; the root path becomes a root replacement.
    pub fn set(path: Path, value: StateValue) -> Self {
        if path.is_root() {
            Mutation::ReplaceRoot { value }
        } else {
            Mutation::Set { path, value }
        }
    }

    /// A deletion at `path`; deleting the root resets it to an empty object.
    pub fn delete(path: Path) -> Self {
        if path.is_root() {
            Mutation::ReplaceRoot {
                value: StateValue::object(),
            }
        } else {
            Mutation::Delete { path }
        }
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            Mutation::Set { path, .. } | Mutation::Delete { path } => Some(path),
            Mutation::ReplaceRoot { .. } => None,
        }
    }
}

impl fmt::Display for Mutation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Mutation::Set { path, .. } => write!(f, "set `{path}`"),
            Mutation::Delete { path } => write!(f, "unset `{path}`"),
            Mutation::ReplaceRoot { .. } => f.write_str("replace root"),
        }
    }
}

/// How a notified path relates to the mutated path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    Exact,
    Descendant,
    Ancestor,
    /// Neither above nor below the write, but inside an array the write grew.
    Padding,
}

#[derive(Debug, Clone)]
pub struct Notification {
    pub path: Path,
    pub tier: Tier,
    pub old_value: Option<StateValue>,
    /// Listeners at `path` when detection ran.
    pub listeners: Vec<ListenerRecord>,
}

pub struct ChangeDetector<'a> {
    index: &'a PathIndex,
    tree: &'a StateTree,
    snapshot: &'a Snapshot,
}

impl<'a> ChangeDetector<'a> {
    pub fn new(index: &'a PathIndex, tree: &'a StateTree, snapshot: &'a Snapshot) -> Self {
        Self {
            index,
            tree,
            snapshot,
        }
    }

    /// True when applying `mutation` would leave the tree deep-equal to the
    /// snapshot. Such a mutation must not be committed at all.
    pub fn is_noop(&self, mutation: &Mutation) -> bool {
        match mutation {
            Mutation::Set { path, value } => deep_equal_opt(self.snapshot.get(path), Some(value)),
            Mutation::Delete { path } => deep_equal_opt(
                self.snapshot.get(path),
                identity::deletion_result(self.snapshot.root(), path).as_ref(),
            ),
            Mutation::ReplaceRoot { value } => deep_equal(self.snapshot.root(), value),
        }
    }

    /// Computes the notifications for a mutation that is not a no-op.
    ///
    /// # Errors
    ///
    /// Propagates [`crate::StateError::PathConflict`] and
    /// [`crate::StateError::IndexOutOfRange`] from building the proposed
    /// tree.
    pub fn detect(&self, mutation: &Mutation) -> Result<Vec<Notification>> {
        match mutation {
            Mutation::ReplaceRoot { value } => Ok(self.detect_root(value)),
            Mutation::Set { path, value } => self.detect_at(path, Some(value), mutation),
            Mutation::Delete { path } => {
                let left = identity::deletion_result(self.snapshot.root(), path);
                self.detect_at(path, left.as_ref(), mutation)
            }
        }
    }

    fn detect_root(&self, new_root: &StateValue) -> Vec<Notification> {
        let mut out = Vec::new();
        let root = Path::root();
        self.push_if_changed(
            &mut out,
            &root,
            Tier::Exact,
            Some(self.snapshot.root()),
            Some(new_root),
        );
        for path in self.index.descendants_of(&root) {
            self.push_if_changed(
                &mut out,
                path,
                Tier::Descendant,
                self.snapshot.get(path),
                new_root.get_path(path),
            );
        }
        out
    }

    fn detect_at(
        &self,
        path: &Path,
        new_at_path: Option<&StateValue>,
        mutation: &Mutation,
    ) -> Result<Vec<Notification>> {
        let mut out = Vec::new();

        // Known to differ: no-op mutations never reach detection.
        let exact = self.index.exact(path);
        if !exact.is_empty() {
            out.push(Notification {
                path: path.clone(),
                tier: Tier::Exact,
                old_value: self.tree.get(path).cloned(),
                listeners: exact.to_vec(),
            });
        }

        for descendant in self.index.descendants_of(path) {
            let rest = descendant.strip_prefix(path).unwrap_or_default();
            self.push_if_changed(
                &mut out,
                descendant,
                Tier::Descendant,
                self.tree.get(descendant),
                new_at_path.and_then(|value| value.get(rest)),
            );
        }

        let ancestors = self.index.ancestor_chain_of(path);
        let beside = match mutation {
            Mutation::Set { .. } => self.padding_candidates(path),
            _ => Vec::new(),
        };
        if ancestors.is_empty() && beside.is_empty() {
            return Ok(out);
        }

        let proposed = self.proposed_root(mutation)?;
        for ancestor in &ancestors {
            self.push_if_changed(
                &mut out,
                ancestor,
                Tier::Ancestor,
                self.snapshot.get(ancestor),
                proposed.get_path(ancestor),
            );
        }
        for other in beside {
            self.push_if_changed(
                &mut out,
                other,
                Tier::Padding,
                self.snapshot.get(other),
                proposed.get_path(other),
            );
        }

        Ok(out)
    }

    /// Registered paths unrelated to `path` that live under one of its index
    /// segments. A write that grows the array there fills the skipped slots
    /// with `null`, so these can change without being on the written path.
    fn padding_candidates(&self, path: &Path) -> Vec<&'a Path> {
        let segments = path.segments();
        let arrays: Vec<Path> = (0..segments.len())
            .filter(|&i| segments[i].as_index().is_some())
            .map(|i| Path::from_segments(segments[..i].iter().cloned()))
            .collect();
        if arrays.is_empty() {
            return Vec::new();
        }
        self.index
            .all_registered_paths()
            .filter(|candidate| {
                *candidate != path
                    && !candidate.is_ancestor_of(path)
                    && !candidate.is_descendant_of(path)
                    && arrays.iter().any(|array| candidate.is_descendant_of(array))
            })
            .collect()
    }

    /// The snapshot with `mutation` applied. Only containers on the mutated
    /// path are copied; the live tree is never cloned.
    fn proposed_root(&self, mutation: &Mutation) -> Result<StateValue> {
        let base = self.snapshot.root();
        match mutation {
            Mutation::Set { path, value } => identity::write(base, path, value.clone()),
            Mutation::Delete { path } => {
                Ok(identity::delete(base, path).unwrap_or_else(|| base.clone()))
            }
            Mutation::ReplaceRoot { value } => Ok(value.clone()),
        }
    }

    fn push_if_changed(
        &self,
        out: &mut Vec<Notification>,
        path: &Path,
        tier: Tier,
        old: Option<&StateValue>,
        new: Option<&StateValue>,
    ) {
        if deep_equal_opt(old, new) {
            return;
        }
        let listeners = self.index.exact(path);
        if listeners.is_empty() {
            return;
        }
        out.push(Notification {
            path: path.clone(),
            tier,
            old_value: old.cloned(),
            listeners: listeners.to_vec(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::ChangeEvent;
    use crate::index::Callback;
    use state_eventer_value::state;
    use std::rc::Rc;

    fn p(s: &str) -> Path {
        Path::parse(s).unwrap()
    }

    fn noop() -> Callback {
        Rc::new(|_: &ChangeEvent| {})
    }

    struct Fixture {
        index: PathIndex,
        tree: StateTree,
        snapshot: Snapshot,
    }

    impl Fixture {
        fn new(root: StateValue, paths: &[&str]) -> Self {
            let mut index = PathIndex::new();
            for path in paths {
                index.register(p(path), noop());
            }
            let snapshot = Snapshot::of(&root);
            Self {
                index,
                tree: StateTree::new(root),
                snapshot,
            }
        }

        fn detector(&self) -> ChangeDetector<'_> {
            ChangeDetector::new(&self.index, &self.tree, &self.snapshot)
        }

        fn detect(&self, mutation: Mutation) -> Vec<(String, Tier)> {
            let detector = self.detector();
            assert!(!detector.is_noop(&mutation));
            detector
                .detect(&mutation)
                .unwrap()
                .into_iter()
                .map(|n| (n.path.as_str().to_string(), n.tier))
                .collect()
        }
    }

    #[test]
    fn test_fan_out_on_empty_state() {
        let fx = Fixture::new(StateValue::object(), &["a", "a.b", "a.b.c"]);
        let found = fx.detect(Mutation::set(p("a.b.c"), state!(123)));
        assert_eq!(
            found,
            vec![
                ("a.b.c".to_string(), Tier::Exact),
                ("a.b".to_string(), Tier::Ancestor),
                ("a".to_string(), Tier::Ancestor),
            ]
        );
    }

    #[test]
    fn test_sibling_write_skips_unaffected_descendant() {
        let fx = Fixture::new(state!({"a": {"b": {"c": 123}}}), &["a", "a.b", "a.b.c"]);
        let found = fx.detect(Mutation::set(p("a.b.d"), state!(456)));
        assert_eq!(
            found,
            vec![
                ("a.b".to_string(), Tier::Ancestor),
                ("a".to_string(), Tier::Ancestor),
            ]
        );
    }

    #[test]
    fn test_descendants_compare_against_new_subtree() {
        let fx = Fixture::new(
            state!({"a": {"b": {"c": 123, "d": 456}}}),
            &["a.b.c", "a.b.d", "a.b"],
        );
        let found = fx.detect(Mutation::set(p("a"), state!({"b": {"c": 123, "d": 0}})));
        assert_eq!(found, vec![("a.b.d".to_string(), Tier::Descendant), ("a.b".to_string(), Tier::Descendant)]);
    }

    #[test]
    fn test_delete_makes_descendants_absent() {
        let fx = Fixture::new(state!({"a": {"b": {"c": 1}}}), &["a.b.c"]);
        let detector = fx.detector();
        let found = detector.detect(&Mutation::delete(p("a"))).unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].tier, Tier::Descendant);
        assert_eq!(found[0].old_value, Some(state!(1)));
    }

    #[test]
    fn test_ancestor_values_come_from_snapshot() {
        let fx = Fixture::new(state!({"a": {"b": 1}}), &["a"]);
        let detector = fx.detector();
        let found = detector.detect(&Mutation::set(p("a.b"), state!(2))).unwrap();
        assert_eq!(found[0].old_value, Some(state!({"b": 1})));
        assert!(!found[0]
            .old_value
            .as_ref()
            .unwrap()
            .same_ref(fx.tree.get(&p("a")).unwrap()));
    }

    #[test]
    fn test_root_replacement_scopes_to_changed_paths() {
        let fx = Fixture::new(state!({"a": {"b": 2}, "k": 1}), &["a", "a.b", "k", "x"]);
        let found = fx.detect(Mutation::set(Path::root(), state!({"x": 5, "k": 1})));
        assert_eq!(
            found,
            vec![
                ("a".to_string(), Tier::Descendant),
                ("a.b".to_string(), Tier::Descendant),
                ("x".to_string(), Tier::Descendant),
            ]
        );
    }

    #[test]
    fn test_root_listener_sees_root_replacement_first() {
        let fx = Fixture::new(state!({"a": 1}), &["a", ""]);
        let found = fx.detect(Mutation::set(Path::root(), state!({"a": 2})));
        assert_eq!(
            found,
            vec![("".to_string(), Tier::Exact), ("a".to_string(), Tier::Descendant)]
        );
    }

    #[test]
    fn test_noop_detection() {
        let fx = Fixture::new(state!({"a": {"b": [1, 2]}}), &["a"]);
        let detector = fx.detector();
        assert!(detector.is_noop(&Mutation::set(p("a.b"), state!([1, 2]))));
        assert!(detector.is_noop(&Mutation::delete(p("a.x"))));
        assert!(detector.is_noop(&Mutation::set(Path::root(), state!({"a": {"b": [1, 2]}}))));
        assert!(!detector.is_noop(&Mutation::set(p("a.c"), state!(null))));
        assert!(!detector.is_noop(&Mutation::delete(p("a.b.0"))));
    }

    #[test]
    fn test_array_growth_notifies_padded_slots() {
        let fx = Fixture::new(state!({"list": [1]}), &["list.2", "list.0", "list.9", "list.2.x"]);
        let found = fx.detect(Mutation::set(p("list.4"), state!(9)));
        assert_eq!(found, vec![("list.2".to_string(), Tier::Padding)]);

        let detector = fx.detector();
        let found = detector.detect(&Mutation::set(p("list.4"), state!(9))).unwrap();
        assert_eq!(found[0].old_value, None);
    }

    #[test]
    fn test_padding_through_new_intermediate_array() {
        let fx = Fixture::new(state!({"a": 5}), &["a.0", "a.1.b"]);
        let found = fx.detect(Mutation::set(p("a.1.b"), state!(1)));
        assert_eq!(
            found,
            vec![
                ("a.1.b".to_string(), Tier::Exact),
                ("a.0".to_string(), Tier::Padding),
            ]
        );
    }

    #[test]
    fn test_write_inside_array_bounds_pads_nothing() {
        let fx = Fixture::new(state!({"list": [1, 2, 3]}), &["list.0", "list.2"]);
        let found = fx.detect(Mutation::set(p("list.1"), state!(9)));
        assert!(found.is_empty());
    }

    #[test]
    fn test_conflict_surfaces_from_proposed_tree() {
        let fx = Fixture::new(state!({"a": [1]}), &["a"]);
        let detector = fx.detector();
        assert!(detector.detect(&Mutation::set(p("a.x"), state!(1))).is_err());
    }
}
