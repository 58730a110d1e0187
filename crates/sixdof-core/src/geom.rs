//! Triangle primitive and the intersection tests built on it
//!
//! - Closest point on a triangle (Voronoi region walk)
//! - Ray/triangle, triangle/sphere
//! - Box/triangle separating axis test

use crate::math::{Aabb, Plane, Ray, Vec3, EPSILON};

/// Triangle with a cached face normal and an opaque tag identifying
/// whatever the triangle was taken from (the owning room in a level).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Triangle {
    /// Vertices, counter-clockwise around `normal`
    pub v: [Vec3; 3],
    /// Unit face normal. Zero or NaN for degenerate triangles.
    pub normal: Vec3,
    /// Back-reference for result attribution
    pub tag: u32,
}

/// Nearest ray hit on a triangle soup
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// Ray parameter of the hit
    pub t: f32,
    /// World-space hit point
    pub point: Vec3,
    /// The triangle that was struck
    pub triangle: Triangle,
}

/// Nearest triangle touching a sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SphereHit {
    /// Squared distance from the sphere center to `point`
    pub dist_sq: f32,
    /// Closest point on the triangle
    pub point: Vec3,
    /// The triangle that was touched
    pub triangle: Triangle,
}

impl Triangle {
    /// Build a triangle and compute its face normal
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self::with_tag(a, b, c, 0)
    }

    /// Build a tagged triangle
    pub fn with_tag(a: Vec3, b: Vec3, c: Vec3, tag: u32) -> Self {
        let normal = (b - a).cross(c - a).normalize();
        Self { v: [a, b, c], normal, tag }
    }

    /// Supporting plane
    pub fn plane(&self) -> Plane {
        Plane::new(self.normal, -self.normal.dot(self.v[0]))
    }

    /// Bounding box of the three vertices
    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.v)
    }

    /// Closest point on the triangle (boundary or interior) to `p`
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        let [a, b, c] = self.v;
        let ab = b - a;
        let ac = c - a;

        // vertex region A
        let ap = p - a;
        let d1 = ab.dot(ap);
        let d2 = ac.dot(ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return a;
        }

        // vertex region B
        let bp = p - b;
        let d3 = ab.dot(bp);
        let d4 = ac.dot(bp);
        if d3 >= 0.0 && d4 <= d3 {
            return b;
        }

        // edge region AB
        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v = d1 / (d1 - d3);
            return a + ab * v;
        }

        // vertex region C
        let cp = p - c;
        let d5 = ab.dot(cp);
        let d6 = ac.dot(cp);
        if d6 >= 0.0 && d5 <= d6 {
            return c;
        }

        // edge region AC
        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return a + ac * w;
        }

        // edge region BC
        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return b + (c - b) * w;
        }

        // face region
        let denom = 1.0 / (va + vb + vc);
        let v = vb * denom;
        let w = vc * denom;
        a + ab * v + ac * w
    }

    /// Triangle/sphere: closest point and its squared distance when
    /// `distance² <= radius²`
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<(Vec3, f32)> {
        let point = self.closest_point(center);
        let dist_sq = (point - center).length_squared();
        (dist_sq <= radius * radius).then_some((point, dist_sq))
    }

    /// Ray/triangle: plane hit at `t` in `(0, tmax]` followed by a
    /// barycentric containment test
    pub fn intersect_ray(&self, ray: &Ray, tmax: f32) -> Option<f32> {
        let ndotdir = self.normal.dot(ray.dir);
        if ndotdir.abs() <= EPSILON {
            return None;
        }

        let t = self.normal.dot(self.v[0] - ray.origin) / ndotdir;
        if t <= 0.0 || t > tmax {
            return None;
        }

        let bc = self.barycentric(ray.at(t));
        (bc.x >= 0.0 && bc.y >= 0.0 && bc.z >= 0.0).then_some(t)
    }

    /// Barycentric coordinates of a point in the triangle's plane
    pub fn barycentric(&self, p: Vec3) -> Vec3 {
        let [a, b, c] = self.v;
        let v0 = b - a;
        let v1 = c - a;
        let v2 = p - a;

        let d00 = v0.dot(v0);
        let d01 = v0.dot(v1);
        let d11 = v1.dot(v1);
        let d20 = v2.dot(v0);
        let d21 = v2.dot(v1);
        let denom = d00 * d11 - d01 * d01;

        let v = (d11 * d20 - d01 * d21) / denom;
        let w = (d00 * d21 - d01 * d20) / denom;
        Vec3::new(1.0 - v - w, v, w)
    }
}

/// Box/triangle separating axis test: 9 edge cross products, the 3 box
/// axes, then the triangle plane. Touching counts as overlap.
pub fn aabox_tri_test(aabb: &Aabb, tri: &Triangle) -> bool {
    // The axis tests below can reject triangles sitting wholly inside the
    // box when an edge is axis-aligned; accept those outright.
    if tri.v.iter().any(|&v| aabb.contains_point(v)) {
        return true;
    }

    let center = aabb.center();
    let h = aabb.half_extents();
    let v = [tri.v[0] - center, tri.v[1] - center, tri.v[2] - center];
    let edges = [v[1] - v[0], v[2] - v[1], v[0] - v[2]];

    for edge in edges {
        for box_axis in [Vec3::X, Vec3::Y, Vec3::Z] {
            let axis = box_axis.cross(edge);
            if axis.length_squared() <= EPSILON * EPSILON {
                continue;
            }
            let p0 = axis.dot(v[0]);
            let p1 = axis.dot(v[1]);
            let p2 = axis.dot(v[2]);
            let r = h.dot(axis.abs());
            if p0.min(p1).min(p2) > r || p0.max(p1).max(p2) < -r {
                return false;
            }
        }
    }

    for axis in 0..3 {
        let lo = v[0][axis].min(v[1][axis]).min(v[2][axis]);
        let hi = v[0][axis].max(v[1][axis]).max(v[2][axis]);
        if lo > h[axis] || hi < -h[axis] {
            return false;
        }
    }

    let normal = edges[0].cross(edges[1]);
    let r = h.dot(normal.abs());
    let s = normal.dot(v[0]);
    s.abs() <= r
}
