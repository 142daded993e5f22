//! Clip-plane sets.
//!
//! Clip planes are lexically scoped: a subscene enables its sets on the way
//! down and the traversal truncates the context's clip stack back to the
//! enclosing mark on the way out, restoring the parent's clip state.

use crate::bounds::AABox;
use crate::node::{NodeId, SceneNode};
use glamx::{Vec3, Vec4};

/// A set of clip planes, each stored as the coefficients of
/// `a·x + b·y + c·z + d = 0`; the kept half-space is where the expression is
/// non-negative.
#[derive(Clone, Debug, PartialEq)]
pub struct ClipPlaneSet {
    id: NodeId,
    planes: Vec<Vec4>,
}

impl ClipPlaneSet {
    /// Creates a clip-plane set from plane coefficients.
    pub fn new(planes: Vec<Vec4>) -> ClipPlaneSet {
        ClipPlaneSet {
            id: NodeId::next(),
            planes,
        }
    }

    /// The planes in this set.
    #[inline]
    pub fn planes(&self) -> &[Vec4] {
        &self.planes
    }

    /// Replaces the planes in this set.
    pub fn set_planes(&mut self, planes: Vec<Vec4>) {
        self.planes = planes;
    }

    /// Shrinks `bbox` to the part kept by this set.
    ///
    /// Only axis-aligned planes cut the box.
    pub fn intersect_bbox(&self, bbox: &mut AABox) {
        for p in &self.planes {
            bbox.clamp_to_halfspace(Vec3::new(p.x, p.y, p.z), p.w);
        }
    }
}

impl SceneNode for ClipPlaneSet {
    fn id(&self) -> NodeId {
        self.id
    }

    fn type_name(&self) -> &'static str {
        "clipplanes"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn intersect_bbox_cuts_with_axis_aligned_planes() {
        let set = ClipPlaneSet::new(vec![
            Vec4::new(1.0, 0.0, 0.0, 0.5),  // keep x >= -0.5
            Vec4::new(0.0, -1.0, 0.0, 0.5), // keep y <= 0.5
        ]);
        let mut bbox = AABox::from_corners(Vec3::splat(-1.0), Vec3::splat(1.0));
        set.intersect_bbox(&mut bbox);
        assert_eq!(bbox.min, Vec3::new(-0.5, -1.0, -1.0));
        assert_eq!(bbox.max, Vec3::new(1.0, 0.5, 1.0));
    }
}
