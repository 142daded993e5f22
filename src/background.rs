//! The background interface boundary.

use crate::context::RenderContext;
use crate::node::SceneNode;

/// A viewport background, rendered first within a subscene's resolved
/// viewport.
///
/// Concrete backgrounds (clear colors, sky spheres, gradients) live outside
/// this crate. A subscene without a background of its own inherits its
/// parent's for introspection purposes, but only renders the one it owns.
pub trait Background: SceneNode {
    /// Fills this subscene's viewport before any shape is drawn.
    fn render(&mut self, ctx: &mut RenderContext);
}
