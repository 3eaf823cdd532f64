//! A lookup table in which items of two different types function as both key
//! and value.
//!
//! The canonical use in this crate is the capture binding table, which maps
//! signal names to program addresses and must be able to answer both
//! "which address does this signal watch?" and "which signal watches this
//! address?" while keeping both sides unique.

use std::fmt;
use std::hash::Hash;

use bimap::BiMap;

/// A two-sided map with uniqueness enforced on both sides.
///
/// Unlike a pair of `HashMap`s kept in sync by hand, an insertion either
/// succeeds on both sides or fails on both sides.
#[derive(Debug, Clone)]
pub struct BidirectionalLookup<L, R>
where
    L: Eq + Hash,
    R: Eq + Hash,
{
    inner: BiMap<L, R>,
}

/// Returned by [BidirectionalLookup::insert] when either side of the new
/// entry is already bound. Carries the rejected pair back to the caller.
#[derive(Debug, Clone, PartialEq)]
pub struct DuplicateEntry<L, R> {
    pub left: L,
    pub right: R,
}

impl<L, R> fmt::Display for DuplicateEntry<L, R>
where
    L: fmt::Display,
    R: fmt::Display,
{
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "duplicate entry: {} <-> {}", self.left, self.right)
    }
}

impl<L, R> BidirectionalLookup<L, R>
where
    L: Eq + Hash,
    R: Eq + Hash,
{
    pub fn new() -> BidirectionalLookup<L, R> {
        BidirectionalLookup {
            inner: BiMap::new(),
        }
    }

    /// Binds `left` and `right` to each other.
    ///
    /// # Errors
    /// Fails with [DuplicateEntry] if `left` or `right` already takes part in
    /// a binding. The existing entries are left untouched in that case.
    pub fn insert(&mut self, left: L, right: R) -> Result<(), DuplicateEntry<L, R>> {
        self.inner
            .insert_no_overwrite(left, right)
            .map_err(|(left, right)| DuplicateEntry { left, right })
    }

    /// Looks up the right-hand value bound to `left`.
    pub fn by_left(&self, left: &L) -> Option<&R> {
        self.inner.get_by_left(left)
    }

    /// Looks up the left-hand value bound to `right`.
    pub fn by_right(&self, right: &R) -> Option<&L> {
        self.inner.get_by_right(right)
    }

    /// Removes all entries from both directions.
    pub fn clear(&mut self) {
        self.inner = BiMap::new();
    }

    /// All left-hand values, in no significant order.
    pub fn left_values(&self) -> impl Iterator<Item = &L> {
        self.inner.left_values()
    }

    /// All right-hand values, in no significant order.
    pub fn right_values(&self) -> impl Iterator<Item = &R> {
        self.inner.right_values()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl<L, R> PartialEq for BidirectionalLookup<L, R>
where
    L: Eq + Hash,
    R: Eq + Hash,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self
                .inner
                .iter()
                .all(|(left, right)| other.by_left(left) == Some(right))
    }
}

impl<L, R> Default for BidirectionalLookup<L, R>
where
    L: Eq + Hash,
    R: Eq + Hash,
{
    fn default() -> Self {
        BidirectionalLookup::new()
    }
}
