//! Quadtree broad-phase
//!
//! A region quadtree mapping item bounds to small copyable handles (entity
//! ids, indices). Items live in the deepest node whose quadrant fully
//! contains them; straddling items stay at the parent.
//!
//! The engine rebuilds one tree per step, so the structure favours simple
//! insert/remove over incremental bookkeeping:
//!
//! - Leaves split into four quadrants (SW, SE, NW, NE) once they hold more
//!   than `max_objects_per_node` items, while shallower than `max_depth` and
//!   larger than `min_size`.
//! - Removal is a depth-first search with no secondary index; subtrees merge
//!   back into their parent once everything they hold fits in one node.
//! - Queries only descend into nodes whose region overlaps the query box.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::aabb::Aabb;

/// Containment slack for child placement and the subdivision size test.
const FIT_EPSILON: f32 = 1e-4;

/// Subdivision limits.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QuadtreeConfig {
    /// Deepest level a node may be created at (root is depth 0)
    pub max_depth: u32,
    /// Item count a leaf may hold before it splits
    pub max_objects_per_node: usize,
    /// Nodes at or below this width/height never split
    pub min_size: f32,
}

impl Default for QuadtreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 6,
            max_objects_per_node: 6,
            min_size: 1.0,
        }
    }
}

#[derive(Debug, Clone)]
struct Entry<T> {
    bounds: Aabb,
    item: T,
}

#[derive(Debug, Clone)]
struct Node<T> {
    bounds: Aabb,
    items: Vec<Entry<T>>,
    /// `None` for leaves; otherwise SW, SE, NW, NE
    children: Option<Box<[Node<T>; 4]>>,
}

impl<T: Copy + PartialEq> Node<T> {
    fn leaf(bounds: Aabb) -> Self {
        Self {
            bounds,
            items: Vec::new(),
            children: None,
        }
    }

    fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    fn can_subdivide(&self, depth: u32, config: &QuadtreeConfig) -> bool {
        if depth >= config.max_depth {
            return false;
        }
        let size = self.bounds.size();
        size.x > config.min_size + FIT_EPSILON && size.y > config.min_size + FIT_EPSILON
    }

    fn spawn_children(&mut self) {
        let Aabb { min, max } = self.bounds;
        let c = self.bounds.center();
        self.children = Some(Box::new([
            Node::leaf(Aabb::new(min, c)),
            Node::leaf(Aabb::new(Vec2::new(c.x, min.y), Vec2::new(max.x, c.y))),
            Node::leaf(Aabb::new(Vec2::new(min.x, c.y), Vec2::new(c.x, max.y))),
            Node::leaf(Aabb::new(c, max)),
        ]));
    }

    /// Index of the first child whose region fully contains `bounds`.
    fn pick_child(children: &[Node<T>; 4], bounds: &Aabb) -> Option<usize> {
        children.iter().position(|child| {
            let region = child.bounds.expanded(FIT_EPSILON);
            bounds.min.x >= region.min.x
                && bounds.min.y >= region.min.y
                && bounds.max.x <= region.max.x
                && bounds.max.y <= region.max.y
        })
    }

    fn insert(&mut self, entry: Entry<T>, depth: u32, config: &QuadtreeConfig) {
        if let Some(children) = self.children.as_deref_mut() {
            if let Some(index) = Self::pick_child(children, &entry.bounds) {
                children[index].insert(entry, depth + 1, config);
                return;
            }
        }

        self.items.push(entry);

        if self.is_leaf()
            && self.items.len() > config.max_objects_per_node
            && self.can_subdivide(depth, config)
        {
            self.subdivide(depth, config);
        }
    }

    /// Splits a leaf and pushes its items down where they fit.
    fn subdivide(&mut self, depth: u32, config: &QuadtreeConfig) {
        self.spawn_children();
        for entry in std::mem::take(&mut self.items) {
            self.insert(entry, depth, config);
        }
    }

    fn prebuild(&mut self, depth: u32, config: &QuadtreeConfig) {
        if !self.can_subdivide(depth, config) {
            return;
        }
        self.spawn_children();
        if let Some(children) = self.children.as_deref_mut() {
            for child in children {
                child.prebuild(depth + 1, config);
            }
        }
    }

    fn remove(&mut self, item: T, depth: u32, config: &QuadtreeConfig) -> bool {
        if let Some(pos) = self.items.iter().position(|e| e.item == item) {
            self.items.remove(pos);
            return true;
        }

        let Some(children) = self.children.as_deref_mut() else {
            return false;
        };
        let removed = children
            .iter_mut()
            .any(|child| child.remove(item, depth + 1, config));

        if removed {
            self.maybe_merge(depth, config);
        }
        removed
    }

    /// Collapses the subtree into this node once its items fit here.
    fn maybe_merge(&mut self, depth: u32, config: &QuadtreeConfig) {
        if self.is_leaf() {
            return;
        }
        let total = self.len();
        if total > config.max_objects_per_node && depth < config.max_depth {
            return;
        }
        if let Some(children) = self.children.take() {
            for mut child in *children {
                child.drain_into(&mut self.items);
            }
        }
    }

    /// Moves every item in this subtree into `out`.
    fn drain_into(&mut self, out: &mut Vec<Entry<T>>) {
        out.append(&mut self.items);
        if let Some(children) = self.children.take() {
            for mut child in *children {
                child.drain_into(out);
            }
        }
    }

    fn query(&self, bounds: &Aabb, out: &mut Vec<T>) {
        if !self.bounds.overlaps(bounds) {
            return;
        }
        out.extend(
            self.items
                .iter()
                .filter(|e| e.bounds.overlaps(bounds))
                .map(|e| e.item),
        );
        if let Some(children) = self.children.as_deref() {
            for child in children {
                child.query(bounds, out);
            }
        }
    }

    fn len(&self) -> usize {
        self.items.len()
            + self
                .children
                .as_deref()
                .map_or(0, |children| children.iter().map(Node::len).sum())
    }

    fn node_count(&self) -> usize {
        1 + self
            .children
            .as_deref()
            .map_or(0, |children| children.iter().map(Node::node_count).sum())
    }

    fn visit<F: FnMut(&Aabb, u32)>(&self, depth: u32, f: &mut F) {
        f(&self.bounds, depth);
        if let Some(children) = self.children.as_deref() {
            for child in children {
                child.visit(depth + 1, f);
            }
        }
    }
}

/// Spatial index from bounding boxes to copyable handles.
#[derive(Debug, Clone)]
pub struct Quadtree<T> {
    root: Node<T>,
    config: QuadtreeConfig,
}

impl<T: Copy + PartialEq> Quadtree<T> {
    /// Creates an empty tree covering `bounds`.
    pub fn new(bounds: Aabb, config: QuadtreeConfig) -> Self {
        Self {
            root: Node::leaf(bounds),
            config,
        }
    }

    pub fn config(&self) -> &QuadtreeConfig {
        &self.config
    }

    /// Region covered by the root node.
    pub fn bounds(&self) -> Aabb {
        self.root.bounds
    }

    /// Drops every item and every child node, keeping the root region.
    pub fn clear(&mut self) {
        self.root.items.clear();
        self.root.children = None;
    }

    /// Replaces the root region, discarding all stored items.
    pub fn set_bounds(&mut self, bounds: Aabb) {
        self.clear();
        self.root.bounds = bounds;
    }

    /// [`Quadtree::set_bounds`] from corners, optionally followed by [`Quadtree::prebuild`].
    pub fn set_bounds_with(&mut self, min: Vec2, max: Vec2, prebuild: bool) {
        self.set_bounds(Aabb::new(min, max));
        if prebuild {
            self.prebuild();
        }
    }

    /// Clears the tree and eagerly subdivides it down to the configured limits.
    pub fn prebuild(&mut self) {
        self.clear();
        self.root.prebuild(0, &self.config);
    }

    pub fn insert(&mut self, bounds: Aabb, item: T) {
        self.root.insert(Entry { bounds, item }, 0, &self.config);
    }

    /// Removes the first stored entry for `item`. Returns whether one was found.
    pub fn remove(&mut self, item: T) -> bool {
        self.root.remove(item, 0, &self.config)
    }

    /// Moves `item` to `new_bounds`.
    ///
    /// Implemented as remove + insert, so `_old_bounds` is only informative.
    pub fn update(&mut self, _old_bounds: Aabb, new_bounds: Aabb, item: T) {
        self.remove(item);
        self.insert(new_bounds, item);
    }

    /// Appends every item whose stored bounds overlap `bounds` to `out`.
    pub fn query(&self, bounds: &Aabb, out: &mut Vec<T>) {
        self.root.query(bounds, out);
    }

    /// Number of stored items.
    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of nodes, root included.
    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// Calls `f(bounds, depth)` for every node, depth-first.
    pub fn visit_nodes<F: FnMut(&Aabb, u32)>(&self, mut f: F) {
        self.root.visit(0, &mut f);
    }
}
