//! Axis-aligned bounding boxes and bounding spheres used for extent
//! aggregation and projection sizing.

use glamx::Vec3;

/// An axis-aligned bounding box.
///
/// A freshly created box is *invalid* (`min` at `+inf`, `max` at `-inf`) so
/// that merging is a plain component-wise fold: merging anything into an
/// invalid box yields that thing's bounds.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AABox {
    /// The minimum corner.
    pub min: Vec3,
    /// The maximum corner.
    pub max: Vec3,
}

impl Default for AABox {
    fn default() -> Self {
        Self::new()
    }
}

impl AABox {
    /// Creates an invalid (empty) box that any merge will overwrite.
    pub fn new() -> AABox {
        AABox {
            min: Vec3::splat(f32::INFINITY),
            max: Vec3::splat(f32::NEG_INFINITY),
        }
    }

    /// Creates a box from two opposite corners.
    ///
    /// The corners do not need to be ordered.
    pub fn from_corners(a: Vec3, b: Vec3) -> AABox {
        AABox {
            min: a.min(b),
            max: a.max(b),
        }
    }

    /// Whether this box contains at least one point.
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.min.x <= self.max.x && self.min.y <= self.max.y && self.min.z <= self.max.z
    }

    /// Whether this box is invalid or has zero extent on every axis.
    #[inline]
    pub fn is_empty(&self) -> bool {
        !self.is_valid() || self.min == self.max
    }

    /// Grows the box to contain `p`.
    #[inline]
    pub fn merge_point(&mut self, p: Vec3) {
        self.min = self.min.min(p);
        self.max = self.max.max(p);
    }

    /// Grows the box to contain `other`.
    ///
    /// Merging an invalid box is a no-op.
    #[inline]
    pub fn merge(&mut self, other: &AABox) {
        if other.is_valid() {
            self.min = self.min.min(other.min);
            self.max = self.max.max(other.max);
        }
    }

    /// The center of the box, or the origin for an invalid box.
    #[inline]
    pub fn center(&self) -> Vec3 {
        if self.is_valid() {
            (self.min + self.max) * 0.5
        } else {
            Vec3::ZERO
        }
    }

    /// Clamps the box against the half-space `n·p + d >= 0`.
    ///
    /// Only axis-aligned normals actually cut the box; an oblique plane
    /// leaves it unchanged, which never under-estimates the extent.
    pub fn clamp_to_halfspace(&mut self, normal: Vec3, d: f32) {
        if !self.is_valid() {
            return;
        }

        for axis in 0..3 {
            let n = normal[axis];
            let others = normal[(axis + 1) % 3] == 0.0 && normal[(axis + 2) % 3] == 0.0;
            if !others || n == 0.0 {
                continue;
            }
            // n * p + d >= 0  =>  p >= -d / n (n > 0) or p <= -d / n (n < 0)
            let bound = -d / n;
            if n > 0.0 {
                self.min[axis] = self.min[axis].max(bound);
            } else {
                self.max[axis] = self.max[axis].min(bound);
            }
        }
    }
}

/// A sphere guaranteed to enclose some content, used to size projections.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BoundingSphere {
    /// The sphere center.
    pub center: Vec3,
    /// The sphere radius. Always strictly positive.
    pub radius: f32,
}

impl BoundingSphere {
    /// Encloses `bbox` as seen under a per-axis model `scale`.
    ///
    /// An empty or invalid box yields the minimal default extent (radius 1)
    /// so that downstream projection setup never divides by zero.
    pub fn enclosing(bbox: &AABox, scale: Vec3) -> BoundingSphere {
        if !bbox.is_valid() {
            return BoundingSphere {
                center: Vec3::ZERO,
                radius: 1.0,
            };
        }

        let half = (bbox.max - bbox.min) * 0.5 * scale;
        let radius = half.length();

        BoundingSphere {
            center: bbox.center(),
            radius: if radius > 0.0 { radius } else { 1.0 },
        }
    }
}
