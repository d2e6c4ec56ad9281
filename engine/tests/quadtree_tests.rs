//! Quadtree Tests - Insert, Query, Update and Remove

use glam::Vec2;
use gl2d_engine::physics::{Aabb, Quadtree, QuadtreeConfig};
use proptest::prelude::*;

fn world_tree() -> Quadtree<u32> {
    Quadtree::new(
        Aabb::new(Vec2::splat(-100.0), Vec2::splat(100.0)),
        QuadtreeConfig::default(),
    )
}

fn query(tree: &Quadtree<u32>, bounds: Aabb) -> Vec<u32> {
    let mut out = Vec::new();
    tree.query(&bounds, &mut out);
    out
}

#[test]
fn test_query_finds_only_overlapping_items() {
    let mut tree = world_tree();
    tree.insert(Aabb::new(Vec2::new(-90.0, -90.0), Vec2::new(-80.0, -80.0)), 1);
    tree.insert(Aabb::new(Vec2::new(80.0, 80.0), Vec2::new(90.0, 90.0)), 2);

    assert_eq!(query(&tree, Aabb::new(Vec2::splat(-85.0), Vec2::splat(-70.0))), vec![1]);
    assert!(query(&tree, Aabb::new(Vec2::splat(-10.0), Vec2::splat(10.0))).is_empty());
}

#[test]
fn test_subdivides_past_capacity() {
    let mut tree = world_tree();
    for i in 0..20u32 {
        let x = -95.0 + i as f32 * 9.0;
        tree.insert(Aabb::new(Vec2::new(x, 10.0), Vec2::new(x + 1.0, 11.0)), i);
    }
    assert_eq!(tree.len(), 20);
    assert!(tree.node_count() > 1);

    let mut depths = Vec::new();
    tree.visit_nodes(|_, depth| depths.push(depth));
    assert_eq!(depths.len(), tree.node_count());
    assert!(depths.iter().all(|&d| d <= tree.config().max_depth));
}

#[test]
fn test_update_moves_item() {
    let mut tree = world_tree();
    let old = Aabb::new(Vec2::splat(-50.0), Vec2::splat(-49.0));
    let new = Aabb::new(Vec2::splat(49.0), Vec2::splat(50.0));
    tree.insert(old, 7);
    tree.update(old, new, 7);

    assert!(query(&tree, old).is_empty());
    assert_eq!(query(&tree, new), vec![7]);
    assert_eq!(tree.len(), 1);
}

#[test]
fn test_removal_merges_back_to_root() {
    let mut tree = world_tree();
    for i in 0..10u32 {
        let x = -90.0 + i as f32 * 18.0;
        let y = -90.0 + i as f32;
        tree.insert(Aabb::new(Vec2::new(x, y), Vec2::new(x + 2.0, y + 2.0)), i);
    }
    for i in 0..10u32 {
        assert!(tree.remove(i));
    }
    assert!(tree.is_empty());
    assert_eq!(tree.node_count(), 1);
    assert!(!tree.remove(3));
}

#[test]
fn test_prebuild_keeps_items_queryable() {
    let mut tree = world_tree();
    tree.set_bounds_with(Vec2::splat(-64.0), Vec2::splat(64.0), true);
    assert!(tree.node_count() > 1);
    tree.insert(Aabb::new(Vec2::splat(1.0), Vec2::splat(2.0)), 9);
    assert_eq!(query(&tree, Aabb::new(Vec2::ZERO, Vec2::splat(5.0))), vec![9]);
}

fn arb_item_bounds() -> impl Strategy<Value = Aabb> {
    (-95.0f32..90.0, -95.0f32..90.0, 0.1f32..5.0, 0.1f32..5.0)
        .prop_map(|(x, y, w, h)| Aabb::new(Vec2::new(x, y), Vec2::new(x + w, y + h)))
}

proptest! {
    #[test]
    fn prop_insert_query_round_trip(items in prop::collection::vec(arb_item_bounds(), 1..40)) {
        let mut tree = world_tree();
        for (i, bounds) in items.iter().enumerate() {
            tree.insert(*bounds, i as u32);
        }
        prop_assert_eq!(tree.len(), items.len());

        for (i, bounds) in items.iter().enumerate() {
            let found = query(&tree, *bounds);
            prop_assert!(found.contains(&(i as u32)));

            // A box just left of the item that cannot touch it
            let disjoint = Aabb::new(
                Vec2::new(bounds.min.x - 3.0, bounds.min.y),
                Vec2::new(bounds.min.x - 2.0, bounds.max.y),
            );
            prop_assert!(!query(&tree, disjoint).contains(&(i as u32)));
        }
    }

    #[test]
    fn prop_removed_items_never_return(
        items in prop::collection::vec(arb_item_bounds(), 1..30),
        moves in prop::collection::vec(arb_item_bounds(), 1..30),
    ) {
        let mut tree = world_tree();
        let mut current = items.clone();
        for (i, bounds) in items.iter().enumerate() {
            tree.insert(*bounds, i as u32);
        }
        for (k, new) in moves.iter().enumerate() {
            let i = k % current.len();
            tree.update(current[i], *new, i as u32);
            current[i] = *new;
        }

        let victim = 0u32;
        prop_assert!(tree.remove(victim));
        let everything = Aabb::new(Vec2::splat(-100.0), Vec2::splat(100.0));
        let found = query(&tree, everything);
        prop_assert!(!found.contains(&victim));
        prop_assert_eq!(found.len(), items.len() - 1);
    }
}
