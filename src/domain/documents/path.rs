use std::fmt;

use serde::{Deserialize, Serialize};

/// Width of a single path step. 62^7 sibling slots per parent.
pub const STEP_LEN: usize = 7;

const ALPHABET: &[u8; 62] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz";

/// Largest ordinal a single step can encode (62^7 - 1).
pub const MAX_STEP: u64 = 3_521_614_606_207;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PathError {
    #[error("path length {0} is not a multiple of the step width")]
    BadLength(usize),
    #[error("path contains a character outside the step alphabet: {0:?}")]
    BadChar(char),
    #[error("sibling steps exhausted under this parent")]
    StepOverflow,
}

/// Materialized path of a document in the forest.
///
/// A path is the concatenation of fixed-width base-62 steps, one per tree
/// level. Sibling order is the lexicographic order of the path strings,
/// which matches numeric step order because the alphabet is ASCII-sorted
/// (the `path` column uses C collation for the same reason).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TreePath(String);

impl TreePath {
    pub fn parse(s: &str) -> Result<Self, PathError> {
        if s.is_empty() || s.len() % STEP_LEN != 0 {
            return Err(PathError::BadLength(s.len()));
        }
        if let Some(c) = s.chars().find(|c| !ALPHABET.contains(&(*c as u8))) {
            return Err(PathError::BadChar(c));
        }
        Ok(Self(s.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Number of steps, which equals the node depth (roots have depth 1).
    pub fn depth(&self) -> u32 {
        (self.0.len() / STEP_LEN) as u32
    }

    pub fn is_root(&self) -> bool {
        self.0.len() == STEP_LEN
    }

    pub fn parent(&self) -> Option<TreePath> {
        if self.is_root() {
            None
        } else {
            Some(TreePath(self.0[..self.0.len() - STEP_LEN].to_string()))
        }
    }

    /// Strict ancestry: a path is not its own ancestor.
    pub fn is_ancestor_of(&self, other: &TreePath) -> bool {
        other.0.len() > self.0.len() && other.0.starts_with(&self.0)
    }

    pub fn is_descendant_of(&self, other: &TreePath) -> bool {
        other.is_ancestor_of(self)
    }

    /// All ancestor paths from root to parent, shortest first.
    pub fn ancestors(&self) -> Vec<TreePath> {
        let mut out = Vec::with_capacity(self.depth() as usize - 1);
        let mut len = STEP_LEN;
        while len < self.0.len() {
            out.push(TreePath(self.0[..len].to_string()));
            len += STEP_LEN;
        }
        out
    }

    pub fn last_step(&self) -> u64 {
        decode_step(&self.0[self.0.len() - STEP_LEN..])
            .expect("validated path holds decodable steps")
    }

    pub fn child(&self, ordinal: u64) -> Result<TreePath, PathError> {
        Ok(TreePath(format!("{}{}", self.0, encode_step(ordinal)?)))
    }

    pub fn next_sibling(&self) -> Result<TreePath, PathError> {
        let step = encode_step(self.last_step().checked_add(1).ok_or(PathError::StepOverflow)?)?;
        Ok(TreePath(format!(
            "{}{}",
            &self.0[..self.0.len() - STEP_LEN],
            step
        )))
    }

    /// Path of a new node inserted at `ordinal` under `parent` (None for a
    /// new root).
    pub fn for_insertion(parent: Option<&TreePath>, ordinal: u64) -> Result<TreePath, PathError> {
        match parent {
            Some(p) => p.child(ordinal),
            None => Ok(TreePath(encode_step(ordinal)?)),
        }
    }

    /// Rewrite this path (or any descendant path) from one subtree prefix
    /// to another. Panics if `self` is outside `old_prefix`; callers select
    /// by prefix first.
    pub fn rebase(&self, old_prefix: &TreePath, new_prefix: &TreePath) -> TreePath {
        assert!(self.0.starts_with(&old_prefix.0), "rebase outside subtree");
        TreePath(format!("{}{}", new_prefix.0, &self.0[old_prefix.0.len()..]))
    }
}

impl fmt::Display for TreePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for TreePath {
    type Error = PathError;
    fn try_from(value: String) -> Result<Self, Self::Error> {
        TreePath::parse(&value)
    }
}

impl From<TreePath> for String {
    fn from(value: TreePath) -> Self {
        value.0
    }
}

pub fn encode_step(ordinal: u64) -> Result<String, PathError> {
    if ordinal > MAX_STEP {
        return Err(PathError::StepOverflow);
    }
    let mut buf = [b'0'; STEP_LEN];
    let mut rest = ordinal;
    for slot in buf.iter_mut().rev() {
        *slot = ALPHABET[(rest % 62) as usize];
        rest /= 62;
    }
    Ok(String::from_utf8(buf.to_vec()).expect("alphabet is ASCII"))
}

pub fn decode_step(step: &str) -> Result<u64, PathError> {
    if step.len() != STEP_LEN {
        return Err(PathError::BadLength(step.len()));
    }
    let mut value: u64 = 0;
    for c in step.chars() {
        let digit = ALPHABET
            .iter()
            .position(|a| *a as char == c)
            .ok_or(PathError::BadChar(c))? as u64;
        value = value * 62 + digit;
    }
    Ok(value)
}

/// One subtree prefix rewrite inside a structural mutation. Applied in
/// order inside a single transaction by the repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathRewrite {
    pub old_prefix: TreePath,
    pub new_prefix: TreePath,
    pub depth_delta: i32,
}

/// Plan the insertion of `moving` at position `index` among `siblings`
/// (ordered paths of every child of `parent`, soft-deleted included, with
/// the moving node's own entry removed). Returns the rewrites to apply in
/// order, the last of which lands the moving subtree on its final path.
///
/// Occupied steps cascade one slot to the right until the first gap. When
/// the cascade would collide with the moving node's current path (same
/// parent), the node is parked past the last sibling first.
pub fn plan_insertion(
    siblings: &[TreePath],
    parent: Option<&TreePath>,
    index: usize,
    moving: &TreePath,
) -> Result<(TreePath, Vec<PathRewrite>), PathError> {
    let index = index.min(siblings.len());
    let steps: Vec<u64> = siblings.iter().map(|p| p.last_step()).collect();

    let desired = if index == siblings.len() {
        steps.last().map(|s| s + 1).unwrap_or(0)
    } else {
        steps[index]
    };

    let current_step = match parent {
        Some(p) if moving.parent().as_ref() == Some(p) => Some(moving.last_step()),
        None if moving.is_root() => Some(moving.last_step()),
        _ => None,
    };

    // Already in place: inserting a node onto its own step is a no-op.
    if current_step == Some(desired) {
        return Ok((moving.clone(), Vec::new()));
    }

    let final_path = TreePath::for_insertion(parent, desired)?;
    let new_depth = final_path.depth() as i32;
    let depth_delta = new_depth - moving.depth() as i32;

    // Cascade of occupied steps starting at the desired slot.
    let mut cascade: Vec<&TreePath> = Vec::new();
    let mut slot = desired;
    for (i, step) in steps.iter().enumerate().skip(index) {
        if *step == slot {
            cascade.push(&siblings[i]);
            slot = slot.checked_add(1).ok_or(PathError::StepOverflow)?;
        } else {
            break;
        }
    }
    if slot > MAX_STEP {
        return Err(PathError::StepOverflow);
    }

    let mut rewrites: Vec<PathRewrite> = Vec::new();
    let mut moving_from = moving.clone();

    // Park the node when a shifted sibling would land on its current step.
    if let Some(cur) = current_step {
        let collides = cascade
            .iter()
            .any(|p| p.last_step() + 1 == cur);
        if collides {
            let park_step = steps
                .last()
                .copied()
                .unwrap_or(0)
                .max(cur)
                .checked_add(1)
                .ok_or(PathError::StepOverflow)?;
            let park = TreePath::for_insertion(parent, park_step)?;
            rewrites.push(PathRewrite {
                old_prefix: moving_from.clone(),
                new_prefix: park.clone(),
                depth_delta: 0,
            });
            moving_from = park;
        }
    }

    // Shift right-to-left so each sibling moves into a free slot.
    for sib in cascade.iter().rev() {
        rewrites.push(PathRewrite {
            old_prefix: (*sib).clone(),
            new_prefix: sib.next_sibling()?,
            depth_delta: 0,
        });
    }

    rewrites.push(PathRewrite {
        old_prefix: moving_from,
        new_prefix: final_path.clone(),
        depth_delta,
    });

    Ok((final_path, rewrites))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(s: &str) -> TreePath {
        TreePath::parse(s).unwrap()
    }

    #[test]
    fn step_roundtrip_and_bounds() {
        assert_eq!(encode_step(0).unwrap(), "0000000");
        assert_eq!(encode_step(61).unwrap(), "000000z");
        assert_eq!(encode_step(62).unwrap(), "0000010");
        assert_eq!(decode_step("000000z").unwrap(), 61);
        assert_eq!(decode_step(&encode_step(MAX_STEP).unwrap()).unwrap(), MAX_STEP);
        assert_eq!(encode_step(MAX_STEP).unwrap(), "zzzzzzz");
        assert!(matches!(encode_step(MAX_STEP + 1), Err(PathError::StepOverflow)));
    }

    #[test]
    fn parse_rejects_bad_input() {
        assert!(TreePath::parse("").is_err());
        assert!(TreePath::parse("000").is_err());
        assert!(TreePath::parse("000000é0000000").is_err());
        assert!(TreePath::parse("0000000").is_ok());
    }

    #[test]
    fn sibling_order_is_lexicographic() {
        let a = p("0000000");
        let b = p("000000A");
        let c = p("000000a");
        assert!(a < b && b < c);
        assert_eq!(a.next_sibling().unwrap(), p("0000001"));
        assert_eq!(p("000000z").next_sibling().unwrap(), p("0000010"));
    }

    #[test]
    fn ancestry_predicates() {
        let root = p("0000000");
        let child = p("00000000000003");
        let grandchild = p("000000000000030000001");
        assert!(root.is_ancestor_of(&child));
        assert!(root.is_ancestor_of(&grandchild));
        assert!(child.is_ancestor_of(&grandchild));
        assert!(!child.is_ancestor_of(&root));
        assert!(!root.is_ancestor_of(&root));
        assert!(grandchild.is_descendant_of(&root));
        assert_eq!(grandchild.parent().unwrap(), child);
        assert_eq!(root.parent(), None);
        assert_eq!(grandchild.ancestors(), vec![root.clone(), child.clone()]);
        assert_eq!(grandchild.depth(), 3);
        assert!(root.is_root());
    }

    #[test]
    fn rebase_moves_descendants() {
        let old = p("0000000");
        let new = p("00000010000005");
        let leaf = p("00000000000002");
        assert_eq!(leaf.rebase(&old, &new), p("000000100000050000002"));
    }

    #[test]
    fn insertion_at_end_takes_next_free_step() {
        let parent = p("0000000");
        let sibs = vec![p("00000000000000"), p("00000000000001")];
        let moving = p("0000001");
        let (path, rewrites) = plan_insertion(&sibs, Some(&parent), 2, &moving).unwrap();
        assert_eq!(path, p("00000000000002"));
        assert_eq!(rewrites.len(), 1);
        assert_eq!(rewrites[0].depth_delta, 1);
    }

    #[test]
    fn insertion_before_sibling_shifts_it_into_gap() {
        let parent = p("0000000");
        let sibs = vec![p("00000000000000"), p("00000000000005")];
        let moving = p("0000001");
        // Insert before the second sibling: step 5 is occupied, 6 is free.
        let (path, rewrites) = plan_insertion(&sibs, Some(&parent), 1, &moving).unwrap();
        assert_eq!(path, p("00000000000005"));
        assert_eq!(rewrites.len(), 2);
        assert_eq!(rewrites[0].new_prefix, p("00000000000006"));
    }

    #[test]
    fn insertion_cascades_until_first_gap() {
        let parent = p("0000000");
        let sibs = vec![
            p("00000000000000"),
            p("00000000000001"),
            p("00000000000002"),
            p("00000000000009"),
        ];
        let moving = p("0000001");
        let (path, rewrites) = plan_insertion(&sibs, Some(&parent), 1, &moving).unwrap();
        assert_eq!(path, p("00000000000001"));
        // Two shifted siblings (2 -> 3 first, then 1 -> 2) plus the landing.
        assert_eq!(rewrites.len(), 3);
        assert_eq!(rewrites[0].old_prefix, p("00000000000002"));
        assert_eq!(rewrites[0].new_prefix, p("00000000000003"));
        assert_eq!(rewrites[1].old_prefix, p("00000000000001"));
        assert_eq!(rewrites[1].new_prefix, p("00000000000002"));
        assert_eq!(rewrites[2].new_prefix, path);
    }

    #[test]
    fn same_parent_move_is_noop_when_already_in_place() {
        let parent = p("0000000");
        let sibs = vec![p("00000000000000")];
        let moving = p("00000000000001");
        let (path, rewrites) = plan_insertion(&sibs, Some(&parent), 1, &moving).unwrap();
        assert_eq!(path, moving);
        assert!(rewrites.is_empty());
    }

    #[test]
    fn same_parent_collision_parks_the_node_first() {
        let parent = p("0000000");
        // Node sits at step 2; inserting at step 1 shifts 1 -> 2.
        let sibs = vec![p("00000000000000"), p("00000000000001")];
        let moving = p("00000000000002");
        let (path, rewrites) = plan_insertion(&sibs, Some(&parent), 1, &moving).unwrap();
        assert_eq!(path, p("00000000000001"));
        assert_eq!(rewrites.len(), 3);
        // Parked past the last sibling, then the shift, then the landing.
        assert_eq!(rewrites[0].old_prefix, moving);
        assert_eq!(rewrites[0].new_prefix, p("00000000000003"));
        assert_eq!(rewrites[1].old_prefix, p("00000000000001"));
        assert_eq!(rewrites[1].new_prefix, p("00000000000002"));
        assert_eq!(rewrites[2].old_prefix, p("00000000000003"));
        assert_eq!(rewrites[2].new_prefix, path);
    }

    #[test]
    fn root_insertion_without_parent() {
        let sibs = vec![p("0000000")];
        let moving = p("00000000000000");
        let (path, rewrites) = plan_insertion(&sibs, None, 1, &moving).unwrap();
        assert_eq!(path, p("0000001"));
        assert_eq!(rewrites.len(), 1);
        assert_eq!(rewrites[0].depth_delta, -1);
    }
}
