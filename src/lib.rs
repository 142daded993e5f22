/*!
# viewtree

Composable, hierarchical viewport/camera trees for multi-panel 3D rendering.

**viewtree** is the scene-graph core of an interactive 3D rendering stack: a
tree of nested [`Subscene`]s, each owning its own viewport, projection and
model transform, which may be inherited from, modified relative to, or wholly
replaced against its parent. Split screens, insets and linked views all share
one underlying render surface; the tree resolves who draws where, with which
matrices, in which order.

The crate deliberately stops at the traversal boundary:

* drawable objects implement the [`Shape`] trait and live in a
  [`SceneObjects`] registry that the tree references by identifier only;
* the concrete rendering backend consumes the per-frame [`RenderContext`]
  that the traversal threads through the tree;
* windowing, input handling and asset loading are someone else's problem.

A frame is two passes over the tree, both plain recursive calls on the
caller's thread:

```
use viewtree::prelude::*;

let mut objects = SceneObjects::new();
let mut root = Subscene::root();

let mut inset = Subscene::new(Embedding::Modify, Embedding::Replace, Embedding::Replace, false);
inset.set_viewport(Rect::new(0.7, 0.7, 0.3, 0.3));
root.add_subscene(inset);

let mut ctx = RenderContext::new(800, 600);
ctx.begin_frame();
root.update(&objects, &mut ctx);
root.render(&mut objects, &mut ctx);
```

Transparent shapes are depth-sorted back-to-front per subscene; clip planes
and lights are lexically scoped to the subtree that declares them.

[`Subscene`]: crate::scene::Subscene
[`Shape`]: crate::shape::Shape
[`SceneObjects`]: crate::scene::SceneObjects
[`RenderContext`]: crate::context::RenderContext
*/
#[macro_use]
extern crate bitflags;

pub use glamx;

pub mod background;
pub mod bbox_deco;
pub mod bounds;
pub mod clip;
pub mod color;
pub mod context;
pub mod light;
pub mod node;
pub mod rect;
pub mod scene;
pub mod shape;
pub mod viewpoint;

/// The most commonly used types, re-exported.
pub mod prelude {
    pub use crate::background::Background;
    pub use crate::bbox_deco::BBoxDeco;
    pub use crate::bounds::{AABox, BoundingSphere};
    pub use crate::clip::ClipPlaneSet;
    pub use crate::color::Color;
    pub use crate::context::RenderContext;
    pub use crate::light::{Light, LightType, MAX_LIGHTS};
    pub use crate::node::{Attrib, NodeId, NodeKind, SceneNode};
    pub use crate::rect::{PixelRect, Rect};
    pub use crate::scene::{EmbedDim, Embedding, SceneObjects, Subscene};
    pub use crate::shape::{Shape, ShapeFlags};
    pub use crate::viewpoint::{Frustum, ModelViewpoint, UserViewpoint};
    pub use glamx::{Mat4, Quat, Vec2, Vec3, Vec4};
}
