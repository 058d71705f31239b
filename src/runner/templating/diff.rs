//! Minimal-churn matching of an old item sequence against a new one.
//!
//! Items are compared by identity: objects by pointer, primitives by value.
//! The common prefix and suffix are kept in place, the middle is aligned with
//! a longest common subsequence, and whatever is left is paired up by key as
//! moves. Every old item is either reused exactly once or removed, so the
//! number of views created is the smallest possible.

use crate::runner::ds::value::Value;
use std::collections::{HashMap, VecDeque};
use std::rc::Rc;

/// Above this many table cells the middle section skips the LCS pass and is
/// matched by key only. Still minimal in views created, just not in moves.
const LCS_CELL_LIMIT: usize = 1 << 20;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ItemKey {
    Undefined,
    Null,
    Boolean(bool),
    Number(u64),
    String(String),
    Object(usize),
}

impl ItemKey {
    pub fn of(value: &Value) -> ItemKey {
        match value {
            Value::Undefined => ItemKey::Undefined,
            Value::Null => ItemKey::Null,
            Value::Boolean(b) => ItemKey::Boolean(*b),
            Value::Number(n) => {
                let n = if *n == 0.0 {
                    0.0
                } else if n.is_nan() {
                    f64::NAN
                } else {
                    *n
                };
                ItemKey::Number(n.to_bits())
            }
            Value::String(s) => ItemKey::String(s.clone()),
            Value::Object(o) => ItemKey::Object(Rc::as_ptr(o) as *const () as usize),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SequenceDiff {
    /// For each new position, the old position reused there, or `None` when
    /// a new view is needed.
    pub sources: Vec<Option<usize>>,
    /// Old positions with no counterpart, ascending.
    pub removed: Vec<usize>,
    /// Reused items that changed relative order.
    pub moved: usize,
    /// Reused items that kept their relative order.
    pub kept: usize,
}

impl SequenceDiff {
    pub fn created(&self) -> usize {
        self.sources.iter().filter(|s| s.is_none()).count()
    }

    pub fn is_identity(&self) -> bool {
        self.removed.is_empty()
            && self
                .sources
                .iter()
                .enumerate()
                .all(|(i, s)| *s == Some(i))
    }
}

pub fn diff_sequences(old: &[ItemKey], new: &[ItemKey]) -> SequenceDiff {
    let mut sources = vec![None; new.len()];
    let mut used = vec![false; old.len()];

    let mut prefix = 0;
    while prefix < old.len() && prefix < new.len() && old[prefix] == new[prefix] {
        sources[prefix] = Some(prefix);
        used[prefix] = true;
        prefix += 1;
    }
    let mut suffix = 0;
    while suffix < old.len() - prefix
        && suffix < new.len() - prefix
        && old[old.len() - 1 - suffix] == new[new.len() - 1 - suffix]
    {
        sources[new.len() - 1 - suffix] = Some(old.len() - 1 - suffix);
        used[old.len() - 1 - suffix] = true;
        suffix += 1;
    }

    let old_mid = prefix..old.len() - suffix;
    let new_mid = prefix..new.len() - suffix;
    let mut kept = prefix + suffix;

    if old_mid.len() * new_mid.len() <= LCS_CELL_LIMIT {
        for (o, n) in longest_common_subsequence(&old[old_mid.clone()], &new[new_mid.clone()]) {
            sources[prefix + n] = Some(prefix + o);
            used[prefix + o] = true;
            kept += 1;
        }
    }

    let mut unmatched: HashMap<&ItemKey, VecDeque<usize>> = HashMap::new();
    for o in old_mid {
        if !used[o] {
            unmatched.entry(&old[o]).or_default().push_back(o);
        }
    }
    let mut moved = 0;
    for n in new_mid {
        if sources[n].is_some() {
            continue;
        }
        if let Some(o) = unmatched.get_mut(&new[n]).and_then(|q| q.pop_front()) {
            sources[n] = Some(o);
            used[o] = true;
            moved += 1;
        }
    }

    let removed = used
        .iter()
        .enumerate()
        .filter(|(_, u)| !**u)
        .map(|(i, _)| i)
        .collect();

    SequenceDiff {
        sources,
        removed,
        moved,
        kept,
    }
}

/// Index pairs `(old, new)` of one longest common subsequence, ascending.
fn longest_common_subsequence(old: &[ItemKey], new: &[ItemKey]) -> Vec<(usize, usize)> {
    let (rows, cols) = (old.len(), new.len());
    if rows == 0 || cols == 0 {
        return vec![];
    }
    // table[i][j] = LCS length of old[i..] and new[j..]
    let width = cols + 1;
    let mut table = vec![0u32; (rows + 1) * width];
    for i in (0..rows).rev() {
        for j in (0..cols).rev() {
            table[i * width + j] = if old[i] == new[j] {
                table[(i + 1) * width + j + 1] + 1
            } else {
                table[(i + 1) * width + j].max(table[i * width + j + 1])
            };
        }
    }
    let mut pairs = Vec::with_capacity(table[0] as usize);
    let (mut i, mut j) = (0, 0);
    while i < rows && j < cols {
        if old[i] == new[j] {
            pairs.push((i, j));
            i += 1;
            j += 1;
        } else if table[(i + 1) * width + j] >= table[i * width + j + 1] {
            i += 1;
        } else {
            j += 1;
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn keys(values: &[i32]) -> Vec<ItemKey> {
        values.iter().map(|v| ItemKey::of(&Value::from(*v))).collect()
    }

    #[test]
    fn test_reorder_reuses_both() {
        let d = diff_sequences(&keys(&[1, 2]), &keys(&[2, 1]));
        assert_eq!(d.sources, vec![Some(1), Some(0)]);
        assert!(d.removed.is_empty());
        assert_eq!(d.kept + d.moved, 2);
    }

    #[test]
    fn test_append_and_remove() {
        let d = diff_sequences(&keys(&[1, 2]), &keys(&[1, 2, 3]));
        assert_eq!(d.sources, vec![Some(0), Some(1), None]);
        assert_eq!(d.created(), 1);

        let d = diff_sequences(&keys(&[1, 2]), &keys(&[2]));
        assert_eq!(d.sources, vec![Some(1)]);
        assert_eq!(d.removed, vec![0]);
    }

    #[test]
    fn test_duplicates_match_in_order() {
        let d = diff_sequences(&keys(&[7, 7, 8]), &keys(&[8, 7, 7]));
        assert_eq!(d.sources, vec![Some(2), Some(0), Some(1)]);
        assert_eq!(d.kept, 2);
        assert_eq!(d.moved, 1);
    }

    #[test]
    fn test_negative_zero_and_nan_keys() {
        assert_eq!(ItemKey::of(&Value::Number(-0.0)), ItemKey::of(&Value::Number(0.0)));
        assert_eq!(
            ItemKey::of(&Value::Number(f64::NAN)),
            ItemKey::of(&Value::Number(-f64::NAN))
        );
    }

    #[test]
    fn test_unchanged_is_identity() {
        let d = diff_sequences(&keys(&[1, 2, 3]), &keys(&[1, 2, 3]));
        assert!(d.is_identity());
    }

    fn multiset_intersection(a: &[i32], b: &[i32]) -> usize {
        let mut counts: HashMap<i32, usize> = HashMap::new();
        for x in a {
            *counts.entry(*x).or_default() += 1;
        }
        let mut shared = 0;
        for y in b {
            if let Some(c) = counts.get_mut(y) {
                if *c > 0 {
                    *c -= 1;
                    shared += 1;
                }
            }
        }
        shared
    }

    proptest! {
        #[test]
        fn test_diff_is_a_minimal_matching(
            old in proptest::collection::vec(0..6i32, 0..12),
            new in proptest::collection::vec(0..6i32, 0..12),
        ) {
            let (ok, nk) = (keys(&old), keys(&new));
            let d = diff_sequences(&ok, &nk);

            prop_assert_eq!(d.sources.len(), new.len());
            let mut seen = vec![false; old.len()];
            for (n, s) in d.sources.iter().enumerate() {
                if let Some(o) = s {
                    prop_assert!(!seen[*o]);
                    seen[*o] = true;
                    prop_assert_eq!(&ok[*o], &nk[n]);
                }
            }
            let reused = seen.iter().filter(|s| **s).count();
            prop_assert_eq!(reused, multiset_intersection(&old, &new));
            prop_assert_eq!(reused, d.kept + d.moved);
            let removed: Vec<usize> = (0..old.len()).filter(|i| !seen[*i]).collect();
            prop_assert_eq!(d.removed, removed);
        }
    }
}
