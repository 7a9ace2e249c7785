//! Registration arena for live bursts.
//!
//! The scene is the collection the render loop traverses. Entries are keyed by
//! a generated [`BurstId`]; the spawner inserts and the lifecycle controller
//! removes by id. Ids are never reused, so a stale id can't alias a newer
//! burst.

use std::collections::BTreeMap;
use std::fmt;

/// Identifier of a burst registered in a [`Scene`].
///
/// Ids increase monotonically, so ordering by id is spawn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BurstId(u64);

impl BurstId {
    /// Raw numeric value, mostly for logging.
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for BurstId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "burst #{}", self.0)
    }
}

/// Id-indexed arena of renderables.
#[derive(Debug)]
pub struct Scene<R> {
    next_id: u64,
    entries: BTreeMap<BurstId, R>,
}

impl<R> Scene<R> {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self {
            next_id: 0,
            entries: BTreeMap::new(),
        }
    }

    /// Register a renderable and return its freshly generated id.
    pub fn add(&mut self, renderable: R) -> BurstId {
        let id = BurstId(self.next_id);
        self.next_id += 1;
        self.entries.insert(id, renderable);
        id
    }

    /// Unregister a renderable, handing ownership back to the caller.
    ///
    /// Returns `None` if the id is not registered (never added, or already
    /// removed).
    pub fn remove(&mut self, id: BurstId) -> Option<R> {
        self.entries.remove(&id)
    }

    /// Whether the id is currently registered.
    #[inline]
    pub fn contains(&self, id: BurstId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Whether this scene ever handed out the id.
    #[inline]
    pub fn was_issued(&self, id: BurstId) -> bool {
        id.0 < self.next_id
    }

    pub fn get(&self, id: BurstId) -> Option<&R> {
        self.entries.get(&id)
    }

    pub fn get_mut(&mut self, id: BurstId) -> Option<&mut R> {
        self.entries.get_mut(&id)
    }

    /// Number of registered renderables.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Iterate registered renderables in spawn order.
    pub fn iter(&self) -> impl Iterator<Item = (BurstId, &R)> {
        self.entries.iter().map(|(id, r)| (*id, r))
    }

    /// Ids of all registered renderables in spawn order.
    pub fn ids(&self) -> impl Iterator<Item = BurstId> + '_ {
        self.entries.keys().copied()
    }

    /// The oldest registered id, if any.
    pub fn oldest(&self) -> Option<BurstId> {
        self.entries.keys().next().copied()
    }
}

impl<R> Default for Scene<R> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_add_generates_distinct_ids() {
        let mut scene = Scene::new();
        let a = scene.add("a");
        let b = scene.add("b");
        assert_ne!(a, b);
        assert!(a < b);
        assert_eq!(scene.len(), 2);
    }

    #[test]
    fn test_remove_returns_renderable_once() {
        let mut scene = Scene::new();
        let id = scene.add(7);
        assert_eq!(scene.remove(id), Some(7));
        assert_eq!(scene.remove(id), None);
        assert!(!scene.contains(id));
        assert!(scene.was_issued(id));
    }

    #[test]
    fn test_ids_are_not_reused() {
        let mut scene = Scene::new();
        let first = scene.add(());
        scene.remove(first);
        let second = scene.add(());
        assert_ne!(first, second);
    }

    #[test]
    fn test_iteration_is_spawn_order() {
        let mut scene = Scene::new();
        let ids: Vec<_> = (0..5).map(|i| scene.add(i)).collect();
        scene.remove(ids[2]);
        let values: Vec<_> = scene.iter().map(|(_, v)| *v).collect();
        assert_eq!(values, vec![0, 1, 3, 4]);
        assert_eq!(scene.oldest(), Some(ids[0]));
    }

    #[test]
    fn test_unissued_id() {
        let mut scene: Scene<()> = Scene::new();
        let id = scene.add(());
        let other = Scene::<()>::new();
        assert!(!other.was_issued(id));
    }

    #[test]
    fn test_display() {
        let mut scene = Scene::new();
        scene.add(());
        let id = scene.add(());
        assert_eq!(id.to_string(), "burst #1");
        assert_eq!(id.get(), 1);
    }
}
