//! Math utilities
//!
//! Re-exports from glam plus the bounding volumes, planes, frusta and rays
//! shared by the octree, the room graph and the visibility pass.

pub use glam::{Mat3, Mat4, Quat, Vec2, Vec3, Vec4};

/// Tolerance used by the parallel/degenerate checks of the intersection tests
pub const EPSILON: f32 = 1e-5;

/// Axis-aligned bounding box
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Aabb {
    /// Minimum corner
    pub min: Vec3,
    /// Maximum corner
    pub max: Vec3,
}

impl Aabb {
    /// Empty box sentinel: min = +inf, max = -inf. Any union grows it.
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    /// Create an AABB from min and max corners
    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Create an AABB from center and half-extents
    pub fn from_center_half_extents(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            min: center - half_extents,
            max: center + half_extents,
        }
    }

    /// Smallest box containing every point of the iterator
    pub fn from_points(points: impl IntoIterator<Item = Vec3>) -> Self {
        let mut aabb = Self::EMPTY;
        for p in points {
            aabb.union_point(p);
        }
        aabb
    }

    /// Get the center of the AABB
    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    /// Get the half-extents of the AABB
    pub fn half_extents(&self) -> Vec3 {
        (self.max - self.min) * 0.5
    }

    /// Get the full size of the AABB
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Check if the AABB is empty
    pub fn is_empty(&self) -> bool {
        self.min.x > self.max.x || self.min.y > self.max.y || self.min.z > self.max.z
    }

    /// Check if a point is inside the AABB (boundary inclusive)
    pub fn contains_point(&self, point: Vec3) -> bool {
        point.x >= self.min.x && point.x <= self.max.x &&
        point.y >= self.min.y && point.y <= self.max.y &&
        point.z >= self.min.z && point.z <= self.max.z
    }

    /// Check if this AABB intersects another
    pub fn intersects(&self, other: &Aabb) -> bool {
        self.min.x <= other.max.x && self.max.x >= other.min.x &&
        self.min.y <= other.max.y && self.max.y >= other.min.y &&
        self.min.z <= other.max.z && self.max.z >= other.min.z
    }

    /// Grow the AABB to include a point
    pub fn union_point(&mut self, point: Vec3) {
        self.min = self.min.min(point);
        self.max = self.max.max(point);
    }

    /// Grow the AABB to include another box
    pub fn union(&mut self, other: &Aabb) {
        self.min = self.min.min(other.min);
        self.max = self.max.max(other.max);
    }

    /// Box grown by `amount` on every side
    pub fn expanded(&self, amount: f32) -> Aabb {
        Aabb {
            min: self.min - Vec3::splat(amount),
            max: self.max + Vec3::splat(amount),
        }
    }

    /// Squared distance from a point to the box (zero when inside)
    pub fn distance_squared(&self, point: Vec3) -> f32 {
        let closest = point.max(self.min).min(self.max);
        (point - closest).length_squared()
    }

    /// Transform the AABB by a matrix
    pub fn transform(&self, matrix: Mat4) -> Aabb {
        let corners = [
            Vec3::new(self.min.x, self.min.y, self.min.z),
            Vec3::new(self.max.x, self.min.y, self.min.z),
            Vec3::new(self.min.x, self.max.y, self.min.z),
            Vec3::new(self.max.x, self.max.y, self.min.z),
            Vec3::new(self.min.x, self.min.y, self.max.z),
            Vec3::new(self.max.x, self.min.y, self.max.z),
            Vec3::new(self.min.x, self.max.y, self.max.z),
            Vec3::new(self.max.x, self.max.y, self.max.z),
        ];

        let mut result = Aabb::EMPTY;
        for corner in corners {
            result.union_point(matrix.transform_point3(corner));
        }
        result
    }

    /// Octant `index` of the box, split at the midpoint on each axis.
    /// Bit 0 selects the upper x half, bit 1 y, bit 2 z.
    pub fn octant(&self, index: usize) -> Aabb {
        let mid = self.center();
        let pick = |bit: usize, lo: f32, m: f32, hi: f32| {
            if index & bit != 0 { (m, hi) } else { (lo, m) }
        };
        let (x0, x1) = pick(1, self.min.x, mid.x, self.max.x);
        let (y0, y1) = pick(2, self.min.y, mid.y, self.max.y);
        let (z0, z1) = pick(4, self.min.z, mid.z, self.max.z);
        Aabb::new(Vec3::new(x0, y0, z0), Vec3::new(x1, y1, z1))
    }
}

impl Default for Aabb {
    fn default() -> Self {
        Self::EMPTY
    }
}

/// Bounding sphere
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingSphere {
    /// Center of the sphere
    pub center: Vec3,
    /// Radius of the sphere
    pub radius: f32,
}

impl BoundingSphere {
    /// Create a new bounding sphere
    pub fn new(center: Vec3, radius: f32) -> Self {
        Self { center, radius }
    }

    /// Check if a point is inside the sphere
    pub fn contains_point(&self, point: Vec3) -> bool {
        (point - self.center).length_squared() <= self.radius * self.radius
    }

    /// Sphere/sphere overlap, touching counts
    pub fn intersects(&self, other: &BoundingSphere) -> bool {
        let distance_sq = (other.center - self.center).length_squared();
        let radius_sum = self.radius + other.radius;
        distance_sq <= radius_sum * radius_sum
    }

    /// Check if this sphere intersects an AABB
    pub fn intersects_aabb(&self, aabb: &Aabb) -> bool {
        aabb.distance_squared(self.center) <= self.radius * self.radius
    }
}

/// A plane in 3D space (ax + by + cz + d = 0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Plane {
    /// Normal vector
    pub normal: Vec3,
    /// Distance term `d`
    pub distance: f32,
}

impl Plane {
    /// Create a new plane
    pub fn new(normal: Vec3, distance: f32) -> Self {
        Self { normal, distance }
    }

    /// Create a plane from a point and normal
    pub fn from_point_normal(point: Vec3, normal: Vec3) -> Self {
        let normal = normal.normalize();
        Self {
            normal,
            distance: -normal.dot(point),
        }
    }

    /// Plane through three points, counter-clockwise winding faces the normal
    pub fn from_points(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self::from_point_normal(a, (b - a).cross(c - a))
    }

    /// Get the signed distance from a point to the plane
    pub fn distance_to_point(&self, point: Vec3) -> f32 {
        self.normal.dot(point) + self.distance
    }

    /// Rescale so the normal has unit length
    pub fn normalized(&self) -> Plane {
        let length = self.normal.length();
        if length > 0.0 {
            Plane::new(self.normal / length, self.distance / length)
        } else {
            *self
        }
    }
}

/// Frustum for culling
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Frustum planes (left, right, bottom, top, near, far), inside is positive
    pub planes: [Plane; 6],
}

impl Frustum {
    pub const LEFT: usize = 0;
    pub const RIGHT: usize = 1;
    pub const BOTTOM: usize = 2;
    pub const TOP: usize = 3;
    pub const NEAR: usize = 4;
    pub const FAR: usize = 5;

    /// Create a frustum from a view-projection matrix
    pub fn from_matrix(matrix: Mat4) -> Self {
        let rows = [
            matrix.row(0),
            matrix.row(1),
            matrix.row(2),
            matrix.row(3),
        ];

        let planes = [
            Self::normalize_plane(rows[3] + rows[0]),
            Self::normalize_plane(rows[3] - rows[0]),
            Self::normalize_plane(rows[3] + rows[1]),
            Self::normalize_plane(rows[3] - rows[1]),
            Self::normalize_plane(rows[3] + rows[2]),
            Self::normalize_plane(rows[3] - rows[2]),
        ];

        Self { planes }
    }

    fn normalize_plane(plane: Vec4) -> Plane {
        Plane::new(plane.truncate(), plane.w).normalized()
    }

    /// Check if a point is inside the frustum
    pub fn contains_point(&self, point: Vec3) -> bool {
        self.planes.iter().all(|p| p.distance_to_point(point) >= 0.0)
    }

    /// A sphere is kept unless it lies entirely outside some plane
    pub fn intersects_sphere(&self, sphere: &BoundingSphere) -> bool {
        self.planes
            .iter()
            .all(|p| p.distance_to_point(sphere.center) >= -sphere.radius)
    }
}

/// Ray segment. The direction is kept un-normalised: `t` is measured in
/// units of `dir`, so `t = 1` is the end of the movement vector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Ray {
    /// Ray origin
    pub origin: Vec3,
    /// Ray direction (length carries meaning)
    pub dir: Vec3,
}

impl Ray {
    /// Create a new ray
    pub fn new(origin: Vec3, dir: Vec3) -> Self {
        Self { origin, dir }
    }

    /// Segment from `a` to `b`
    pub fn between(a: Vec3, b: Vec3) -> Self {
        Self { origin: a, dir: b - a }
    }

    /// Get a point along the ray at parameter t
    pub fn at(&self, t: f32) -> Vec3 {
        self.origin + self.dir * t
    }

    /// Slab test: does the ray touch the box anywhere in `[0, tmax]`
    pub fn intersects_aabb(&self, aabb: &Aabb, tmax: f32) -> bool {
        let mut t0 = 0.0f32;
        let mut t1 = tmax;

        for axis in 0..3 {
            let origin = self.origin[axis];
            let dir = self.dir[axis];

            if dir.abs() < EPSILON {
                if origin < aabb.min[axis] || origin > aabb.max[axis] {
                    return false;
                }
                continue;
            }

            let inv = 1.0 / dir;
            let mut near = (aabb.min[axis] - origin) * inv;
            let mut far = (aabb.max[axis] - origin) * inv;
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }

            t0 = t0.max(near);
            t1 = t1.min(far);
            if t0 > t1 {
                return false;
            }
        }
        true
    }

    /// Ray/sphere over the bounded segment: returns the first root inside
    /// `[EPSILON, 1]`, `None` when both roots fall outside it.
    pub fn intersect_sphere(&self, sphere: &BoundingSphere) -> Option<f32> {
        let a = self.dir.length_squared();
        if a <= 0.0 {
            return None;
        }
        let oc = self.origin - sphere.center;
        let b = 2.0 * oc.dot(self.dir);
        let c = oc.length_squared() - sphere.radius * sphere.radius;
        let discriminant = b * b - 4.0 * a * c;
        if discriminant < 0.0 {
            return None;
        }

        let sqrt_d = discriminant.sqrt();
        let t0 = (-b - sqrt_d) / (2.0 * a);
        let t1 = (-b + sqrt_d) / (2.0 * a);
        let valid = |t: f32| (EPSILON..=1.0).contains(&t);

        if valid(t0) {
            Some(t0)
        } else if valid(t1) {
            Some(t1)
        } else {
            None
        }
    }
}
