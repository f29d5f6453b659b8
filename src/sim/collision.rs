//! Collision detection between the actor and live items
//!
//! Two paths lead to a resolution:
//! - Touch: the item's box overlaps the actor's box.
//! - Magnet: while the magnet is active, falling coins within range are pulled
//!   toward the actor and resolve when the pull completes.
//!
//! These functions only find candidates. Claiming an item (and with it the
//! right to dispatch its effect) goes through [`Arena::resolve`], which
//! guarantees at most one dispatch per item.

use glam::Vec2;

use super::aabb::Aabb;
use super::arena::Arena;
use super::state::{ItemFamily, ItemId, Motion};

/// Ids of unconsumed items overlapping the actor, in id order
pub fn overlapping_items(arena: &Arena, actor: &Aabb) -> Vec<ItemId> {
    let mut hits = Vec::new();
    arena.for_each(|item| {
        if !item.consumed && item.bounds.overlaps(actor) {
            hits.push(item.id);
        }
    });
    hits
}

/// Falling coins whose centre is within `range` of the actor centre
pub fn attraction_candidates(arena: &Arena, actor_center: Vec2, range: f32) -> Vec<ItemId> {
    arena
        .items_by_kind(ItemFamily::Coin)
        .filter(|item| !item.consumed && item.motion == Motion::Falling)
        .filter(|item| item.bounds.center().distance(actor_center) <= range)
        .map(|item| item.id)
        .collect()
}

/// Attracted items whose pull finished by play time `now`
pub fn arrived_items(arena: &Arena, now: u64) -> Vec<ItemId> {
    arena
        .items_by_kind(ItemFamily::Coin)
        .filter(|item| !item.consumed && item.arrived(now))
        .map(|item| item.id)
        .collect()
}
