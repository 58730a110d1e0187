//! Octree over a static triangle soup
//!
//! Triangles are appended to an unbuilt root, then `build` recursively
//! splits any leaf holding more than the leaf budget into its eight
//! octants. A triangle straddling a split plane is copied into every child
//! it touches; children that end up empty are dropped. Once built the tree
//! is immutable and only answers nearest-hit ray and sphere queries.

use serde::{Deserialize, Serialize};
use sixdof_core::{aabox_tri_test, Aabb, Ray, RayHit, SphereHit, Triangle};

use glam::Vec3;

/// Slack added to node boxes when filtering and pruning, so hit points that
/// round onto a shared face are never lost between siblings.
const BOX_EPSILON: f32 = 1e-4;

/// Build limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OctreeConfig {
    /// Maximum subdivision depth
    pub max_depth: u32,
    /// A leaf with at most this many triangles is not split
    pub max_tris: usize,
}

impl Default for OctreeConfig {
    fn default() -> Self {
        Self {
            max_depth: 8,
            max_tris: 16,
        }
    }
}

/// Node counts of a built tree
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OctreeStats {
    pub nodes: usize,
    pub leaves: usize,
    /// Triangle references held by leaves, duplicates included
    pub triangles: usize,
    pub depth: u32,
}

/// Octree node. A node is either a leaf (`tris` is `Some`, no children)
/// or an internal node (`tris` is `None`).
#[derive(Debug, Clone)]
pub struct Octree {
    bounds: Aabb,
    children: [Option<Box<Octree>>; 8],
    tris: Option<Vec<Triangle>>,
}

impl Octree {
    /// Create an empty, unbuilt tree
    pub fn new() -> Self {
        Self {
            bounds: Aabb::EMPTY,
            children: Default::default(),
            tris: Some(Vec::new()),
        }
    }

    /// Collect triangles and build in one step
    pub fn from_triangles(tris: impl IntoIterator<Item = Triangle>, config: &OctreeConfig) -> Self {
        let mut tree = Self::new();
        for tri in tris {
            tree.add_triangle(tri);
        }
        tree.build(config.max_depth, config.max_tris);
        tree
    }

    fn with_triangles(bounds: Aabb, tris: Vec<Triangle>) -> Self {
        Self {
            bounds,
            children: Default::default(),
            tris: Some(tris),
        }
    }

    /// Node bounds
    pub fn bounds(&self) -> &Aabb {
        &self.bounds
    }

    /// True while the node still owns a triangle list
    pub fn is_leaf(&self) -> bool {
        self.tris.is_some()
    }

    /// Triangles of a leaf
    pub fn triangles(&self) -> &[Triangle] {
        self.tris.as_deref().unwrap_or(&[])
    }

    /// Child nodes in octant order
    pub fn children(&self) -> impl Iterator<Item = &Octree> {
        self.children.iter().flatten().map(|c| c.as_ref())
    }

    /// Append a triangle and grow the bounds. Only valid before `build`
    /// has split the node.
    pub fn add_triangle(&mut self, tri: Triangle) {
        let Some(tris) = self.tris.as_mut() else {
            log::error!("add_triangle called on a built octree node");
            return;
        };
        tris.push(tri);
        for v in tri.v {
            self.bounds.union_point(v);
        }
    }

    /// Recursively subdivide leaves holding more than `max_tris` triangles,
    /// at most `max_depth` levels deep
    pub fn build(&mut self, max_depth: u32, max_tris: usize) {
        let Some(count) = self.tris.as_ref().map(Vec::len) else {
            log::error!("build called on an already subdivided octree node");
            return;
        };
        if count <= max_tris || max_depth == 0 {
            return;
        }

        let Some(tris) = self.tris.take() else {
            return;
        };
        for (i, slot) in self.children.iter_mut().enumerate() {
            let bounds = self.bounds.octant(i);
            let test_box = bounds.expanded(BOX_EPSILON);
            let subset: Vec<Triangle> = tris
                .iter()
                .filter(|tri| aabox_tri_test(&test_box, tri))
                .copied()
                .collect();
            if subset.is_empty() {
                continue;
            }

            let mut child = Octree::with_triangles(bounds, subset);
            child.build(max_depth - 1, max_tris);
            *slot = Some(Box::new(child));
        }
    }

    /// Nearest triangle hit by `ray` with `t` in `(0, tmax]`. Ties keep the
    /// first triangle found, in octant order then leaf order.
    pub fn raytest(&self, ray: &Ray, tmax: f32) -> Option<RayHit> {
        if self.bounds.is_empty()
            || !ray.intersects_aabb(&self.bounds.expanded(BOX_EPSILON), tmax)
        {
            return None;
        }

        let mut best: Option<RayHit> = None;
        let mut limit = tmax;

        if let Some(tris) = &self.tris {
            for tri in tris {
                let Some(t) = tri.intersect_ray(ray, limit) else {
                    continue;
                };
                if best.is_none_or(|b| t < b.t) {
                    best = Some(RayHit {
                        t,
                        point: ray.at(t),
                        triangle: *tri,
                    });
                    limit = t;
                }
            }
            return best;
        }

        for child in self.children() {
            if let Some(hit) = child.raytest(ray, limit) {
                if best.is_none_or(|b| hit.t < b.t) {
                    limit = hit.t;
                    best = Some(hit);
                }
            }
        }
        best
    }

    /// Triangle closest to `center` among those within `radius`
    pub fn sphtest(&self, center: Vec3, radius: f32) -> Option<SphereHit> {
        if self.bounds.is_empty()
            || self.bounds.expanded(BOX_EPSILON).distance_squared(center) > radius * radius
        {
            return None;
        }

        let mut best: Option<SphereHit> = None;

        if let Some(tris) = &self.tris {
            for tri in tris {
                if let Some((point, dist_sq)) = tri.intersect_sphere(center, radius) {
                    if best.is_none_or(|b| dist_sq < b.dist_sq) {
                        best = Some(SphereHit {
                            dist_sq,
                            point,
                            triangle: *tri,
                        });
                    }
                }
            }
            return best;
        }

        for child in self.children() {
            if let Some(hit) = child.sphtest(center, radius) {
                if best.is_none_or(|b| hit.dist_sq < b.dist_sq) {
                    best = Some(hit);
                }
            }
        }
        best
    }

    /// Visit every leaf with its bounds and triangles
    pub fn visit_leaves<F: FnMut(&Aabb, &[Triangle])>(&self, f: &mut F) {
        match &self.tris {
            Some(tris) => f(&self.bounds, tris),
            None => {
                for child in self.children() {
                    child.visit_leaves(f);
                }
            }
        }
    }

    /// Node and triangle counts
    pub fn stats(&self) -> OctreeStats {
        let mut stats = OctreeStats::default();
        self.collect_stats(0, &mut stats);
        stats
    }

    fn collect_stats(&self, depth: u32, stats: &mut OctreeStats) {
        stats.nodes += 1;
        stats.depth = stats.depth.max(depth);
        if let Some(tris) = &self.tris {
            stats.leaves += 1;
            stats.triangles += tris.len();
        }
        for child in self.children() {
            child.collect_stats(depth + 1, stats);
        }
    }
}

impl Default for Octree {
    fn default() -> Self {
        Self::new()
    }
}
