//! The bounding-box decoration interface boundary.

use crate::bounds::AABox;
use crate::context::RenderContext;
use crate::node::SceneNode;

/// A decoration drawn around a subscene's aggregated bounding box (axes,
/// tick marks, box edges).
///
/// Concrete decorations live outside this crate; the traversal hands them
/// the data bounding box current at render time.
pub trait BBoxDeco: SceneNode {
    /// Draws the decoration for `bbox` against the current context state.
    fn render(&mut self, ctx: &mut RenderContext, bbox: &AABox);
}
