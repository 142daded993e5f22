//! The drawable interface boundary.
//!
//! Geometry and material representation live outside this crate; a subscene
//! only needs to know a shape's bounds, its rendering-order requirements, and
//! how to ask it to draw itself against the current context.

use crate::bounds::AABox;
use crate::context::RenderContext;
use crate::node::SceneNode;

bitflags! {
    /// Capabilities of a shape that the traversal has to know about.
    #[derive(Copy, Clone, Debug, PartialEq, Eq)]
    pub struct ShapeFlags: u32 {
        /// The shape is transparent and must be depth-sorted back-to-front
        /// before rendering.
        const SORT = 1 << 0;
        /// The shape never contributes to bounding-box aggregation.
        const IGNORE_EXTENT = 1 << 1;
    }
}

/// A drawable object, owned by the external scene-object registry.
///
/// Subscenes reference shapes by identifier only; implementations keep their
/// own geometry, material, and GPU state.
pub trait Shape: SceneNode {
    /// This shape's bounds in model space.
    fn bounding_box(&self) -> AABox;

    /// Rendering capabilities. The default is an opaque shape that
    /// contributes to the extent.
    fn flags(&self) -> ShapeFlags {
        ShapeFlags::empty()
    }

    /// Draws the shape against the current viewport, matrices, clip planes,
    /// and lights held by `ctx`.
    fn render(&mut self, ctx: &mut RenderContext);
}
