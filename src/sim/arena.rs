//! Live item container
//!
//! Items are keyed by id (stable iteration order) and indexed by family so the
//! magnet and growth effects never scan unrelated items.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;
use super::state::{Item, ItemFamily, ItemId, ItemKind, Motion};
use crate::error::EngineError;

/// Everything needed to create an item; the arena assigns the id
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ItemDraft {
    pub kind: ItemKind,
    pub bounds: Aabb,
    pub fall_duration_ms: u64,
    pub spawned_at: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Arena {
    items: BTreeMap<ItemId, Item>,
    by_family: HashMap<ItemFamily, BTreeSet<ItemId>>,
    max_population: usize,
    next_id: ItemId,
}

impl Arena {
    pub fn new(max_population: usize) -> Self {
        Self {
            items: BTreeMap::new(),
            by_family: HashMap::new(),
            max_population,
            next_id: 1,
        }
    }

    pub fn count(&self) -> usize {
        self.items.len()
    }

    pub fn max_population(&self) -> usize {
        self.max_population
    }

    pub fn is_full(&self) -> bool {
        self.count() >= self.max_population
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Add an item. Never blocks: a full arena rejects the insert.
    pub fn insert(&mut self, draft: ItemDraft) -> Result<ItemId, EngineError> {
        if self.is_full() {
            return Err(EngineError::CapacityExceeded {
                max: self.max_population,
            });
        }

        let id = self.next_id;
        self.next_id += 1;

        let item = Item {
            id,
            kind: draft.kind,
            bounds: draft.bounds,
            fall_duration_ms: draft.fall_duration_ms,
            spawned_at: draft.spawned_at,
            consumed: false,
            motion: Motion::Falling,
        };
        self.by_family
            .entry(draft.kind.family())
            .or_default()
            .insert(id);
        self.items.insert(id, item);
        Ok(id)
    }

    pub fn get(&self, id: ItemId) -> Option<&Item> {
        self.items.get(&id)
    }

    pub fn get_mut(&mut self, id: ItemId) -> Option<&mut Item> {
        self.items.get_mut(&id)
    }

    /// Check-and-remove. `None` if the item is already gone.
    pub fn remove(&mut self, id: ItemId) -> Option<Item> {
        let item = self.items.remove(&id)?;
        if let Some(ids) = self.by_family.get_mut(&item.kind.family()) {
            ids.remove(&id);
        }
        Some(item)
    }

    /// Claim an item for effect dispatch: marks it consumed and removes it.
    /// A second claim on the same id fails with `AlreadyResolved`.
    pub fn resolve(&mut self, id: ItemId) -> Result<Item, EngineError> {
        match self.items.get_mut(&id) {
            Some(item) if !item.consumed => item.consumed = true,
            _ => return Err(EngineError::AlreadyResolved(id)),
        }
        self.remove(id).ok_or(EngineError::AlreadyResolved(id))
    }

    /// Advance every live item to play time `now` and remove those whose fall
    /// finished unconsumed. Returns the escaped items.
    pub fn tick(&mut self, now: u64, track_height: f32, attract_target: Vec2) -> Vec<Item> {
        let mut escaped_ids = Vec::new();
        for item in self.items.values_mut() {
            item.advance(now, track_height, attract_target);
            if !item.consumed && item.motion == Motion::Falling && item.fall_complete(now) {
                escaped_ids.push(item.id);
            }
        }
        escaped_ids
            .into_iter()
            .filter_map(|id| self.remove(id))
            .collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    /// Read-only visit of every live item
    pub fn for_each(&self, mut visitor: impl FnMut(&Item)) {
        for item in self.items.values() {
            visitor(item);
        }
    }

    pub fn items_by_kind(&self, family: ItemFamily) -> impl Iterator<Item = &Item> {
        self.by_family
            .get(&family)
            .into_iter()
            .flat_map(|ids| ids.iter())
            .filter_map(|id| self.items.get(id))
    }

    pub fn count_by_kind(&self, family: ItemFamily) -> usize {
        self.by_family.get(&family).map_or(0, BTreeSet::len)
    }

    /// Resize every live item of a family. Returns `(id, new size)` per item.
    pub fn scale_family(&mut self, family: ItemFamily, factor: f32) -> Vec<(ItemId, Vec2)> {
        let Some(ids) = self.by_family.get(&family) else {
            return Vec::new();
        };
        let mut resized = Vec::with_capacity(ids.len());
        for id in ids {
            if let Some(item) = self.items.get_mut(id) {
                item.bounds = item.bounds.scaled(factor);
                resized.push((*id, item.bounds.size));
            }
        }
        resized
    }

    /// Drop every item (session teardown)
    pub fn clear(&mut self) -> Vec<ItemId> {
        let ids: Vec<ItemId> = self.items.keys().copied().collect();
        self.items.clear();
        self.by_family.clear();
        ids
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn draft(kind: ItemKind) -> ItemDraft {
        ItemDraft {
            kind,
            bounds: Aabb::new(0.0, 0.0, 100.0, 100.0),
            fall_duration_ms: 1000,
            spawned_at: 0,
        }
    }

    #[test]
    fn test_insert_respects_cap() {
        let mut arena = Arena::new(2);
        assert!(arena.insert(draft(ItemKind::Coin)).is_ok());
        assert!(arena.insert(draft(ItemKind::Hazard)).is_ok());
        assert_eq!(
            arena.insert(draft(ItemKind::Coin)),
            Err(EngineError::CapacityExceeded { max: 2 })
        );
        assert_eq!(arena.count(), 2);
    }

    #[test]
    fn test_remove_twice() {
        let mut arena = Arena::new(5);
        let id = arena.insert(draft(ItemKind::Coin)).unwrap();
        assert!(arena.remove(id).is_some());
        assert!(arena.remove(id).is_none());
        assert_eq!(arena.count_by_kind(ItemFamily::Coin), 0);
    }

    #[test]
    fn test_resolve_marks_consumed_once() {
        let mut arena = Arena::new(5);
        let id = arena.insert(draft(ItemKind::Coin)).unwrap();
        let item = arena.resolve(id).unwrap();
        assert!(item.consumed);
        assert_eq!(arena.resolve(id), Err(EngineError::AlreadyResolved(id)));
    }

    #[test]
    fn test_concurrent_resolution_dispatches_once() {
        let arena = Mutex::new(Arena::new(5));
        let id = arena.lock().unwrap().insert(draft(ItemKind::Coin)).unwrap();
        let dispatched = AtomicUsize::new(0);

        std::thread::scope(|scope| {
            for _ in 0..16 {
                scope.spawn(|| {
                    if arena.lock().unwrap().resolve(id).is_ok() {
                        dispatched.fetch_add(1, Ordering::SeqCst);
                    }
                });
            }
        });

        assert_eq!(dispatched.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_tick_removes_escaped() {
        let mut arena = Arena::new(5);
        let slow = arena
            .insert(ItemDraft {
                fall_duration_ms: 5000,
                ..draft(ItemKind::Coin)
            })
            .unwrap();
        let fast = arena.insert(draft(ItemKind::Hazard)).unwrap();

        let escaped = arena.tick(1000, 800.0, Vec2::ZERO);
        assert_eq!(escaped.len(), 1);
        assert_eq!(escaped[0].id, fast);
        assert!(arena.get(slow).is_some());
        assert!((arena.get(slow).unwrap().bounds.pos.y - 160.0).abs() < 0.001);
    }

    #[test]
    fn test_attracted_items_do_not_escape() {
        let mut arena = Arena::new(5);
        let id = arena.insert(draft(ItemKind::Coin)).unwrap();
        arena.get_mut(id).unwrap().motion = Motion::Attracted {
            from: Vec2::ZERO,
            started_at: 0,
            duration_ms: 5000,
        };
        assert!(arena.tick(2000, 800.0, Vec2::new(400.0, 400.0)).is_empty());
    }

    #[test]
    fn test_index_by_kind() {
        let mut arena = Arena::new(5);
        arena.insert(draft(ItemKind::Coin)).unwrap();
        arena.insert(draft(ItemKind::Hazard)).unwrap();
        arena.insert(draft(ItemKind::Coin)).unwrap();

        assert_eq!(arena.items_by_kind(ItemFamily::Coin).count(), 2);
        assert!(
            arena
                .items_by_kind(ItemFamily::Coin)
                .all(|item| item.kind == ItemKind::Coin)
        );
        assert_eq!(arena.items_by_kind(ItemFamily::Magnet).count(), 0);

        let mut seen = 0;
        arena.for_each(|_| seen += 1);
        assert_eq!(seen, 3);
    }

    #[test]
    fn test_scale_family_only_touches_family() {
        let mut arena = Arena::new(5);
        let hazard = arena.insert(draft(ItemKind::Hazard)).unwrap();
        let coin = arena.insert(draft(ItemKind::Coin)).unwrap();

        let resized = arena.scale_family(ItemFamily::Hazard, 2.0);
        assert_eq!(resized, vec![(hazard, Vec2::new(200.0, 200.0))]);
        assert_eq!(arena.get(coin).unwrap().bounds.size, Vec2::new(100.0, 100.0));
    }
}
