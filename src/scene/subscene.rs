//! The subscene tree.
//!
//! Subscenes do their own projection. Each one can inherit, modify or
//! replace the viewport, projection and model matrices of its parent; the
//! root always replaces them, since it has nothing to inherit. A subscene
//! holds identifiers into the external [`SceneObjects`] registry; it never
//! owns a shape, light or viewpoint, only its child subscenes.

use crate::background::Background;
use crate::bbox_deco::BBoxDeco;
use crate::bounds::{AABox, BoundingSphere};
use crate::context::RenderContext;
use crate::node::{Attrib, NodeId, NodeKind, SceneNode};
use crate::rect::{PixelRect, Rect};
use crate::scene::objects::SceneObjects;
use crate::shape::{Shape, ShapeFlags};
use crate::viewpoint::{Frustum, DEFAULT_FOV};
use glamx::{Mat4, Vec3, Vec4};

/// How one dimension of a subscene relates to its parent's.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[repr(u8)]
pub enum Embedding {
    /// Use the parent's resolved value unchanged.
    Inherit = 1,
    /// Combine this subscene's own delta with the parent's resolved value.
    Modify = 2,
    /// Use this subscene's own value alone.
    Replace = 3,
}

/// Selects which of the three embedded dimensions an accessor refers to.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EmbedDim {
    /// The viewport rectangle.
    Viewport,
    /// The projection matrix.
    Projection,
    /// The model transform.
    Model,
}

/// State a parent hands to each child during `update`, already resolved.
#[derive(Copy, Clone)]
struct Inherited {
    pviewport: PixelRect,
    proj: Mat4,
    model: Mat4,
    observer: f32,
    user_viewpoint: Option<NodeId>,
    model_viewpoint: Option<NodeId>,
    background: Option<NodeId>,
    bbox_deco: Option<NodeId>,
}

/// A node of the viewport/camera tree.
///
/// The embedding policy and the ignore-extent flag are fixed at creation;
/// setters exist for explicit reconfiguration but invalidate the cached
/// bounding box and matrices until the next [`update`].
///
/// [`update`]: Subscene::update
pub struct Subscene {
    id: NodeId,
    parent: Option<NodeId>,

    do_viewport: Embedding,
    do_projection: Embedding,
    do_model: Embedding,

    /// This viewport on the (0,0) to (1,1) scale.
    viewport: Rect,
    /// The resolved viewport in pixels, recomputed every `update`.
    pviewport: PixelRect,

    proj_matrix: Mat4,
    model_matrix: Mat4,
    modelview: Mat4,
    zrow: Vec4,
    wrow: Vec4,
    observer: f32,

    // Identifier lists into the external registry; nothing here is owned.
    lights: Vec<NodeId>,
    shapes: Vec<NodeId>,
    unsorted_shapes: Vec<NodeId>,
    zsort_shapes: Vec<NodeId>,
    clip_planes: Vec<NodeId>,
    background: Option<NodeId>,
    bbox_deco: Option<NodeId>,
    user_viewpoint: Option<NodeId>,
    model_viewpoint: Option<NodeId>,

    // Effective references resolved through the parent chain at the last
    // update.
    eff_user_viewpoint: Option<NodeId>,
    eff_model_viewpoint: Option<NodeId>,
    eff_background: Option<NodeId>,
    eff_bbox_deco: Option<NodeId>,

    /// Subscenes whose interaction state mouse events on this one also
    /// drive. Stored by identifier so stale entries are detectable; initially
    /// contains only this subscene.
    mouse_listeners: Vec<NodeId>,

    children: Vec<Subscene>,

    data_bbox: AABox,
    ignore_extent: bool,
    bbox_changes: bool,
}

impl SceneNode for Subscene {
    fn id(&self) -> NodeId {
        self.id
    }

    fn type_name(&self) -> &'static str {
        "subscene"
    }
}

impl Subscene {
    /// Creates a subscene with the given embedding policy.
    ///
    /// The node starts unattached; [`add_subscene`] links it under a parent.
    /// A subscene that never gains a parent resolves every dimension as
    /// `Replace`, whatever its policy says.
    ///
    /// [`add_subscene`]: Subscene::add_subscene
    pub fn new(
        viewport: Embedding,
        projection: Embedding,
        model: Embedding,
        ignore_extent: bool,
    ) -> Subscene {
        let id = NodeId::next();
        Subscene {
            id,
            parent: None,
            do_viewport: viewport,
            do_projection: projection,
            do_model: model,
            viewport: Rect::full(),
            pviewport: PixelRect::default(),
            proj_matrix: Mat4::IDENTITY,
            model_matrix: Mat4::IDENTITY,
            modelview: Mat4::IDENTITY,
            zrow: Vec4::ZERO,
            wrow: Vec4::ZERO,
            observer: 0.0,
            lights: Vec::new(),
            shapes: Vec::new(),
            unsorted_shapes: Vec::new(),
            zsort_shapes: Vec::new(),
            clip_planes: Vec::new(),
            background: None,
            bbox_deco: None,
            user_viewpoint: None,
            model_viewpoint: None,
            eff_user_viewpoint: None,
            eff_model_viewpoint: None,
            eff_background: None,
            eff_bbox_deco: None,
            mouse_listeners: vec![id],
            children: Vec::new(),
            data_bbox: AABox::new(),
            ignore_extent,
            bbox_changes: true,
        }
    }

    /// Creates a root subscene: `Replace` on every dimension, covering the
    /// whole window.
    pub fn root() -> Subscene {
        Subscene::new(
            Embedding::Replace,
            Embedding::Replace,
            Embedding::Replace,
            false,
        )
    }

    /*
     *
     * Tree structure.
     *
     */

    /// The parent's identifier, or `None` for the root.
    #[inline]
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// The number of child subscenes.
    #[inline]
    pub fn child_count(&self) -> usize {
        self.children.len()
    }

    /// The `which`-th child.
    ///
    /// # Panics
    /// Panics if `which` is out of bounds; passing a valid index is the
    /// caller's precondition.
    #[inline]
    pub fn child(&self, which: usize) -> &Subscene {
        &self.children[which]
    }

    /// Mutable access to the `which`-th child.
    ///
    /// # Panics
    /// Panics if `which` is out of bounds.
    #[inline]
    pub fn child_mut(&mut self, which: usize) -> &mut Subscene {
        &mut self.children[which]
    }

    /// Attaches `subscene` as the last child, returning its identifier.
    pub fn add_subscene(&mut self, mut subscene: Subscene) -> NodeId {
        subscene.parent = Some(self.id);
        let id = subscene.id;
        self.children.push(subscene);
        self.bbox_changes = true;
        id
    }

    /// Recursively searches for the subscene with identifier `id`, which may
    /// be this one.
    pub fn get_subscene(&self, id: NodeId) -> Option<&Subscene> {
        if self.id == id {
            return Some(self);
        }
        self.children.iter().find_map(|c| c.get_subscene(id))
    }

    /// Mutable variant of [`get_subscene`].
    ///
    /// [`get_subscene`]: Subscene::get_subscene
    pub fn get_subscene_mut(&mut self, id: NodeId) -> Option<&mut Subscene> {
        if self.id == id {
            return Some(self);
        }
        self.children
            .iter_mut()
            .find_map(|c| c.get_subscene_mut(id))
    }

    /// Detaches the descendant with identifier `id` and returns it; the
    /// caller decides what to do with the subtree. Returns `None` when no
    /// descendant matches. A subscene cannot detach itself.
    pub fn hide_subscene(&mut self, id: NodeId) -> Option<Subscene> {
        if let Some(i) = self.children.iter().position(|c| c.id == id) {
            let mut detached = self.children.remove(i);
            detached.parent = None;
            self.bbox_changes = true;
            return Some(detached);
        }
        for c in &mut self.children {
            if let Some(detached) = c.hide_subscene(id) {
                self.bbox_changes = true;
                return Some(detached);
            }
        }
        None
    }

    /// Resolves, for window pixel coordinates, the most deeply nested
    /// subscene whose resolved viewport contains the point. Later siblings
    /// win over earlier ones, matching draw order; this subscene is the
    /// fallback when nothing contains the point.
    ///
    /// Viewports are resolved by [`update`], so the answer reflects the last
    /// updated frame.
    ///
    /// [`update`]: Subscene::update
    pub fn which_subscene(&self, x: i32, y: i32) -> NodeId {
        self.which_subscene_inner(x, y).unwrap_or(self.id)
    }

    fn which_subscene_inner(&self, x: i32, y: i32) -> Option<NodeId> {
        for c in self.children.iter().rev() {
            if let Some(hit) = c.which_subscene_inner(x, y) {
                return Some(hit);
            }
        }
        if self.pviewport.contains(x, y) {
            Some(self.id)
        } else {
            None
        }
    }

    /*
     *
     * Embedding and viewport configuration.
     *
     */

    /// The embedding mode of one dimension.
    pub fn embedding(&self, dim: EmbedDim) -> Embedding {
        match dim {
            EmbedDim::Viewport => self.do_viewport,
            EmbedDim::Projection => self.do_projection,
            EmbedDim::Model => self.do_model,
        }
    }

    /// Reconfigures the embedding mode of one dimension.
    ///
    /// A subscene with no parent still resolves every dimension as `Replace`.
    /// The cached bounding box and matrices are recomputed on the next
    /// [`update`].
    ///
    /// [`update`]: Subscene::update
    pub fn set_embedding(&mut self, dim: EmbedDim, mode: Embedding) {
        match dim {
            EmbedDim::Viewport => self.do_viewport = mode,
            EmbedDim::Projection => self.do_projection = mode,
            EmbedDim::Model => self.do_model = mode,
        }
        self.bbox_changes = true;
    }

    /// The relative viewport on the (0,0) to (1,1) scale.
    #[inline]
    pub fn viewport_rect(&self) -> Rect {
        self.viewport
    }

    /// Sets the relative viewport. Meaningful only when the viewport
    /// dimension is not inherited.
    pub fn set_viewport(&mut self, viewport: Rect) {
        self.viewport = viewport;
    }

    /// The viewport resolved to pixels by the last [`update`].
    ///
    /// [`update`]: Subscene::update
    #[inline]
    pub fn pixel_viewport(&self) -> PixelRect {
        self.pviewport
    }

    /// The projection matrix resolved by the last [`update`].
    ///
    /// [`update`]: Subscene::update
    #[inline]
    pub fn projection_matrix(&self) -> Mat4 {
        self.proj_matrix
    }

    /// The model matrix resolved by the last [`update`]. Excludes the viewer
    /// translation, which is what children inherit against.
    ///
    /// [`update`]: Subscene::update
    #[inline]
    pub fn model_matrix(&self) -> Mat4 {
        self.model_matrix
    }

    /// The full modelview (viewer translation times model matrix) resolved
    /// by the last [`update`].
    ///
    /// [`update`]: Subscene::update
    #[inline]
    pub fn modelview_matrix(&self) -> Mat4 {
        self.modelview
    }

    /// Whether this subscene's own shapes are excluded from bounding-box
    /// aggregation.
    #[inline]
    pub fn ignore_extent(&self) -> bool {
        self.ignore_extent
    }

    /// Sets the ignore-extent flag and invalidates the bounding box.
    pub fn set_ignore_extent(&mut self, ignore_extent: bool) {
        self.ignore_extent = ignore_extent;
        self.bbox_changes = true;
    }

    /*
     *
     * Object bookkeeping. The registry owns the objects; these lists hold
     * identifiers and never duplicates.
     *
     */

    /// Adds the shape with identifier `id`, classifying it for rendering
    /// order and growing the bounding box.
    pub fn add_shape(&mut self, objects: &SceneObjects, id: NodeId) {
        if self.shapes.contains(&id) {
            return;
        }
        let shape = match objects.shape(id) {
            Some(shape) => shape,
            None => {
                log::warn!("shape {} is not in the registry; not added", id);
                return;
            }
        };
        let flags = shape.flags();
        self.shapes.push(id);
        if flags.contains(ShapeFlags::SORT) {
            self.zsort_shapes.push(id);
        } else {
            self.unsorted_shapes.push(id);
        }
        if !self.ignore_extent && !flags.contains(ShapeFlags::IGNORE_EXTENT) {
            let mut grown = shape.bounding_box();
            for &cid in &self.clip_planes {
                if let Some(cp) = objects.clip_planes(cid) {
                    cp.intersect_bbox(&mut grown);
                }
            }
            self.data_bbox.merge(&grown);
        }
        self.bbox_changes = true;
    }

    /// Adds the light with identifier `id`.
    pub fn add_light(&mut self, objects: &SceneObjects, id: NodeId) {
        if self.lights.contains(&id) {
            return;
        }
        if objects.light(id).is_none() {
            log::warn!("light {} is not in the registry; not added", id);
            return;
        }
        self.lights.push(id);
    }

    /// Adds the clip-plane set with identifier `id` and re-derives the
    /// bounding box under the new clipping.
    pub fn add_clip_planes(&mut self, objects: &SceneObjects, id: NodeId) {
        if self.clip_planes.contains(&id) {
            return;
        }
        if objects.clip_planes(id).is_none() {
            log::warn!("clip-plane set {} is not in the registry; not added", id);
            return;
        }
        self.clip_planes.push(id);
        self.bbox_changes = true;
    }

    /// Installs the background with identifier `id`, replacing any previous
    /// one.
    pub fn add_background(&mut self, id: NodeId) {
        self.background = Some(id);
    }

    /// Installs the bounding-box decoration with identifier `id`, replacing
    /// any previous one.
    pub fn add_bbox_deco(&mut self, id: NodeId) {
        self.bbox_deco = Some(id);
    }

    /// Sets this subscene's own user viewpoint; `None` falls back to the
    /// parent's.
    pub fn set_user_viewpoint(&mut self, id: Option<NodeId>) {
        self.user_viewpoint = id;
    }

    /// Sets this subscene's own model viewpoint; `None` falls back to the
    /// parent's.
    pub fn set_model_viewpoint(&mut self, id: Option<NodeId>) {
        self.model_viewpoint = id;
        self.bbox_changes = true;
    }

    /// Hides the shape with identifier `id` everywhere in this subtree.
    /// The shape itself stays alive in the registry. Returns whether any
    /// entry matched.
    pub fn hide_shape(&mut self, id: NodeId) -> bool {
        let mut found = remove_id(&mut self.shapes, id);
        if found {
            remove_id(&mut self.unsorted_shapes, id);
            remove_id(&mut self.zsort_shapes, id);
        }
        for c in &mut self.children {
            found |= c.hide_shape(id);
        }
        if found {
            // A union cannot be shrunk in place; re-derive from membership.
            self.bbox_changes = true;
        }
        found
    }

    /// Hides the light with identifier `id` everywhere in this subtree.
    pub fn hide_light(&mut self, id: NodeId) -> bool {
        let mut found = remove_id(&mut self.lights, id);
        for c in &mut self.children {
            found |= c.hide_light(id);
        }
        found
    }

    /// Hides the clip-plane set with identifier `id` everywhere in this
    /// subtree.
    pub fn hide_clip_planes(&mut self, id: NodeId) -> bool {
        let mut found = remove_id(&mut self.clip_planes, id);
        for c in &mut self.children {
            found |= c.hide_clip_planes(id);
        }
        if found {
            self.bbox_changes = true;
        }
        found
    }

    /// Clears the background with identifier `id` everywhere in this
    /// subtree.
    pub fn hide_background(&mut self, id: NodeId) -> bool {
        let mut found = false;
        if self.background == Some(id) {
            self.background = None;
            found = true;
        }
        for c in &mut self.children {
            found |= c.hide_background(id);
        }
        found
    }

    /// Clears the bounding-box decoration with identifier `id` everywhere in
    /// this subtree.
    pub fn hide_bbox_deco(&mut self, id: NodeId) -> bool {
        let mut found = false;
        if self.bbox_deco == Some(id) {
            self.bbox_deco = None;
            found = true;
        }
        for c in &mut self.children {
            found |= c.hide_bbox_deco(id);
        }
        found
    }

    /// Clears any viewpoint reference with identifier `id` everywhere in
    /// this subtree.
    pub fn hide_viewpoint(&mut self, id: NodeId) -> bool {
        let mut found = false;
        if self.user_viewpoint == Some(id) {
            self.user_viewpoint = None;
            found = true;
        }
        if self.model_viewpoint == Some(id) {
            self.model_viewpoint = None;
            found = true;
        }
        for c in &mut self.children {
            found |= c.hide_viewpoint(id);
        }
        found
    }

    /*
     *
     * Resolved references.
     *
     */

    /// This subscene's background, or the inherited one resolved at the last
    /// update.
    pub fn background_id(&self) -> Option<NodeId> {
        self.background.or(self.eff_background)
    }

    /// This subscene's bounding-box decoration, or the inherited one.
    pub fn bbox_deco_id(&self) -> Option<NodeId> {
        self.bbox_deco.or(self.eff_bbox_deco)
    }

    /// This subscene's user viewpoint, or the inherited one.
    pub fn user_viewpoint_id(&self) -> Option<NodeId> {
        self.user_viewpoint.or(self.eff_user_viewpoint)
    }

    /// This subscene's model viewpoint, or the inherited one.
    pub fn model_viewpoint_id(&self) -> Option<NodeId> {
        self.model_viewpoint.or(self.eff_model_viewpoint)
    }

    /// Sets the user interaction matrix on the effective model viewpoint.
    pub fn set_user_matrix(&self, objects: &mut SceneObjects, m: Mat4) {
        if let Some(vp) = self
            .model_viewpoint_id()
            .and_then(|id| objects.model_viewpoint_mut(id))
        {
            vp.set_user_matrix(m);
        }
    }

    /// The user interaction matrix of the effective model viewpoint.
    pub fn user_matrix(&self, objects: &SceneObjects) -> Option<Mat4> {
        self.model_viewpoint_id()
            .and_then(|id| objects.model_viewpoint(id))
            .map(|vp| vp.user_matrix())
    }

    /// Sets the model scale on the effective model viewpoint.
    pub fn set_scale(&self, objects: &mut SceneObjects, scale: Vec3) {
        if let Some(vp) = self
            .model_viewpoint_id()
            .and_then(|id| objects.model_viewpoint_mut(id))
        {
            vp.set_scale(scale);
        }
    }

    /// The model scale of the effective model viewpoint.
    pub fn scale(&self, objects: &SceneObjects) -> Option<Vec3> {
        self.model_viewpoint_id()
            .and_then(|id| objects.model_viewpoint(id))
            .map(|vp| vp.scale())
    }

    /// Sets the model translation offset on the effective model viewpoint.
    pub fn set_position(&self, objects: &mut SceneObjects, position: Vec3) {
        if let Some(vp) = self
            .model_viewpoint_id()
            .and_then(|id| objects.model_viewpoint_mut(id))
        {
            vp.set_position(position);
        }
    }

    /// The model translation offset of the effective model viewpoint.
    pub fn position(&self, objects: &SceneObjects) -> Option<Vec3> {
        self.model_viewpoint_id()
            .and_then(|id| objects.model_viewpoint(id))
            .map(|vp| vp.position())
    }

    /*
     *
     * Mouse listener linkage. Interaction semantics live outside this crate;
     * these are identifiers only, resolved (and silently dropped when stale)
     * by the input-handling collaborator.
     *
     */

    /// The subscenes driven by mouse events on this one.
    #[inline]
    pub fn mouse_listeners(&self) -> &[NodeId] {
        &self.mouse_listeners
    }

    /// Replaces the mouse-listener list.
    pub fn set_mouse_listeners(&mut self, ids: Vec<NodeId>) {
        self.mouse_listeners = ids;
    }

    /// Converts window-relative pixel coordinates to coordinates relative to
    /// the bottom-left corner of this subscene's resolved viewport.
    #[inline]
    pub fn translate_coords(&self, x: i32, y: i32) -> (i32, i32) {
        (x - self.pviewport.x, y - self.pviewport.y)
    }

    /// Normalized device depth of the model-space point `v`, using the rows
    /// captured at the last [`update`].
    ///
    /// [`update`]: Subscene::update
    pub fn get_distance(&self, v: Vec3) -> f32 {
        let v = v.extend(1.0);
        self.zrow.dot(v) / self.wrow.dot(v)
    }

    /*
     *
     * Bounding-box maintenance.
     *
     */

    /// The aggregated bounding box as of the last recomputation.
    #[inline]
    pub fn data_bbox(&self) -> AABox {
        self.data_bbox
    }

    /// The aggregated bounding box, recomputed first if membership changed
    /// anywhere in the subtree.
    pub fn bounding_box(&mut self, objects: &SceneObjects) -> AABox {
        if self.bbox_dirty() {
            self.calc_data_bbox(objects);
        }
        self.data_bbox
    }

    /// Re-derives the bounding box from current membership, as after a hide:
    /// a union cannot be shrunk in place, so shrinking is a recomputation.
    /// The hide operations mark the subtree dirty instead of calling this;
    /// use it to get an up-to-date box without waiting for the next
    /// [`update`].
    ///
    /// [`update`]: Subscene::update
    pub fn shrink_bbox(&mut self, objects: &SceneObjects) {
        self.calc_data_bbox(objects);
    }

    /// Notification that content with bounds `bbox` was added at (or changed
    /// within) the descendant `target`. Grows the boxes along the path and,
    /// when `changes` is set, marks them for full recomputation. Returns
    /// whether `target` was found in this subtree.
    pub fn add_bbox(&mut self, target: NodeId, bbox: &AABox, changes: bool) -> bool {
        if self.id == target {
            if !self.ignore_extent {
                self.data_bbox.merge(bbox);
            }
            self.bbox_changes |= changes;
            return true;
        }
        for c in &mut self.children {
            if c.add_bbox(target, bbox, changes) {
                self.data_bbox.merge(&c.data_bbox);
                self.bbox_changes |= changes;
                return true;
            }
        }
        false
    }

    fn bbox_dirty(&self) -> bool {
        self.bbox_changes || self.children.iter().any(Subscene::bbox_dirty)
    }

    /// Full recomputation: the union of the visible, non-ignored own shapes
    /// and every child's box, clipped by this subscene's clip planes.
    fn calc_data_bbox(&mut self, objects: &SceneObjects) {
        let mut bbox = AABox::new();
        if !self.ignore_extent {
            for &id in &self.shapes {
                if let Some(shape) = objects.shape(id) {
                    if !shape.flags().contains(ShapeFlags::IGNORE_EXTENT) {
                        bbox.merge(&shape.bounding_box());
                    }
                }
            }
        }
        for c in &mut self.children {
            bbox.merge(&c.bounding_box(objects));
        }
        for &id in &self.clip_planes {
            if let Some(cp) = objects.clip_planes(id) {
                cp.intersect_bbox(&mut bbox);
            }
        }
        self.data_bbox = bbox;
        self.bbox_changes = false;
    }

    /*
     *
     * The update pass: resolve matrices and viewports, parent before child.
     *
     */

    /// Recomputes viewports, bounding spheres and matrices for this subtree
    /// in preparation for rendering. Call once per frame on the root, after
    /// [`RenderContext::begin_frame`].
    pub fn update(&mut self, objects: &SceneObjects, ctx: &mut RenderContext) {
        self.do_update(objects, ctx, None);
    }

    fn do_update(
        &mut self,
        objects: &SceneObjects,
        ctx: &mut RenderContext,
        inherited: Option<&Inherited>,
    ) {
        // Viewport first; everything else depends on its aspect ratio.
        self.pviewport = match self.effective_mode(self.do_viewport, inherited) {
            Embedding::Replace => ctx.rect.place(&self.viewport),
            Embedding::Modify => inherited.unwrap().pviewport.place(&self.viewport),
            Embedding::Inherit => inherited.unwrap().pviewport,
        };
        ctx.set_viewport(self.pviewport);

        self.eff_user_viewpoint = self
            .user_viewpoint
            .or_else(|| inherited.and_then(|i| i.user_viewpoint));
        self.eff_model_viewpoint = self
            .model_viewpoint
            .or_else(|| inherited.and_then(|i| i.model_viewpoint));
        self.eff_background = self
            .background
            .or_else(|| inherited.and_then(|i| i.background));
        self.eff_bbox_deco = self
            .bbox_deco
            .or_else(|| inherited.and_then(|i| i.bbox_deco));

        if self.bbox_dirty() {
            self.calc_data_bbox(objects);
        }

        let model_vp = self
            .eff_model_viewpoint
            .and_then(|id| objects.model_viewpoint(id));
        let scale = model_vp.map(|vp| vp.scale()).unwrap_or(Vec3::ONE);
        let sphere = BoundingSphere::enclosing(&self.data_bbox, scale);

        let frustum = match self.eff_user_viewpoint.and_then(|id| objects.user_viewpoint(id)) {
            Some(vp) => vp.frustum(&sphere, self.pviewport.aspect()),
            None => Frustum::enclosing(&sphere, self.pviewport.aspect(), DEFAULT_FOV, 1.0),
        };

        match self.effective_mode(self.do_projection, inherited) {
            Embedding::Inherit => {
                let i = inherited.unwrap();
                self.proj_matrix = i.proj;
                self.observer = i.observer;
            }
            Embedding::Modify => {
                self.proj_matrix = frustum.matrix() * inherited.unwrap().proj;
                self.observer = frustum.distance;
            }
            Embedding::Replace => {
                self.proj_matrix = frustum.matrix();
                self.observer = frustum.distance;
            }
        }

        // The local delta applies after the inherited transform: column
        // vectors, effective = local * inherited.
        let local = model_vp.map(|vp| vp.local_transform()).unwrap_or(Mat4::IDENTITY);
        self.model_matrix = match self.effective_mode(self.do_model, inherited) {
            Embedding::Inherit => inherited.unwrap().model,
            Embedding::Modify => local * inherited.unwrap().model,
            Embedding::Replace => local * Mat4::from_translation(-sphere.center),
        };
        self.modelview =
            Mat4::from_translation(Vec3::new(0.0, 0.0, -self.observer)) * self.model_matrix;

        ctx.set_matrices(self.modelview, self.proj_matrix);
        ctx.viewpoint = self.eff_user_viewpoint;
        self.zrow = ctx.zrow;
        self.wrow = ctx.wrow;

        let snapshot = Inherited {
            pviewport: self.pviewport,
            proj: self.proj_matrix,
            model: self.model_matrix,
            observer: self.observer,
            user_viewpoint: self.eff_user_viewpoint,
            model_viewpoint: self.eff_model_viewpoint,
            background: self.eff_background,
            bbox_deco: self.eff_bbox_deco,
        };
        for c in &mut self.children {
            c.do_update(objects, ctx, Some(&snapshot));
        }
    }

    fn effective_mode(&self, mode: Embedding, inherited: Option<&Inherited>) -> Embedding {
        if inherited.is_none() {
            Embedding::Replace
        } else {
            mode
        }
    }

    /*
     *
     * The render pass. Runs after `update`; clip planes and lights are
     * scoped to this subscene and its descendants and restored on the way
     * out.
     *
     */

    /// Renders this subtree against the state resolved by the last
    /// [`update`].
    ///
    /// [`update`]: Subscene::update
    pub fn render(&mut self, objects: &mut SceneObjects, ctx: &mut RenderContext) {
        ctx.subscene = Some(self.id);
        ctx.set_viewport(self.pviewport);
        ctx.set_matrices(self.modelview, self.proj_matrix);
        ctx.viewpoint = self.eff_user_viewpoint;

        let clip_mark = ctx.clip_mark();
        self.render_clip_planes(objects, ctx);

        let saved_lights = ctx.save_lights();
        self.setup_lights(objects, ctx);

        if let Some(id) = self.background {
            if let Some(bg) = objects.background_mut(id) {
                bg.render(ctx);
            }
        }
        if let Some(id) = self.bbox_deco {
            let bbox = self.data_bbox;
            if let Some(deco) = objects.bbox_deco_mut(id) {
                deco.render(ctx, &bbox);
            }
        }

        self.render_unsorted(objects, ctx);
        self.render_zsort(objects, ctx);

        for c in &mut self.children {
            c.render(objects, ctx);
        }

        self.disable_clip_planes(ctx, clip_mark);
        ctx.restore_lights(saved_lights);
    }

    /// Pushes this subscene's clip-plane sets onto the context, accumulating
    /// with the inherited ones.
    fn render_clip_planes(&self, objects: &SceneObjects, ctx: &mut RenderContext) {
        for &id in &self.clip_planes {
            if let Some(cp) = objects.clip_planes(id) {
                ctx.enable_clip_planes(cp.planes());
            }
        }
    }

    /// Restores the clip state the parent saw.
    fn disable_clip_planes(&self, ctx: &mut RenderContext, mark: usize) {
        ctx.disable_clip_planes(mark);
    }

    /// A non-empty local light list overrides the inherited set for this
    /// subtree; an empty one keeps the parent's lights bound.
    fn setup_lights(&self, objects: &SceneObjects, ctx: &mut RenderContext) {
        if self.lights.is_empty() {
            return;
        }
        ctx.clear_lights();
        for &id in &self.lights {
            if let Some(light) = objects.light(id) {
                if light.enabled {
                    ctx.bind_light(light);
                }
            }
        }
    }

    /// Opaque shapes, in insertion order.
    fn render_unsorted(&self, objects: &mut SceneObjects, ctx: &mut RenderContext) {
        for &id in &self.unsorted_shapes {
            if let Some(shape) = objects.shape_mut(id) {
                shape.render(ctx);
            }
        }
    }

    /// Transparent shapes, farthest first. The sort is stable, so shapes at
    /// equal depth keep their insertion order.
    fn render_zsort(&self, objects: &mut SceneObjects, ctx: &mut RenderContext) {
        let mut order: Vec<(NodeId, f32)> = self
            .zsort_shapes
            .iter()
            .filter_map(|&id| {
                objects
                    .shape(id)
                    .map(|s| (id, ctx.get_distance(s.bounding_box().center())))
            })
            .collect();
        order.sort_by(|a, b| b.1.total_cmp(&a.1));
        for (id, _) in order {
            if let Some(shape) = objects.shape_mut(id) {
                shape.render(ctx);
            }
        }
    }

    /*
     *
     * Introspection.
     *
     */

    /// The number of identifiers of the given category, optionally across
    /// the whole subtree.
    pub fn id_count(&self, kind: NodeKind, recursive: bool) -> usize {
        self.ids(kind, recursive).len()
    }

    /// The identifiers of the given category, optionally across the whole
    /// subtree.
    pub fn ids(&self, kind: NodeKind, recursive: bool) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.collect_ids(kind, recursive, &mut out);
        out
    }

    fn collect_ids(&self, kind: NodeKind, recursive: bool, out: &mut Vec<NodeId>) {
        match kind {
            NodeKind::Shapes => out.extend_from_slice(&self.shapes),
            NodeKind::Lights => out.extend_from_slice(&self.lights),
            NodeKind::ClipPlanes => out.extend_from_slice(&self.clip_planes),
            NodeKind::Background => out.extend(self.background),
            NodeKind::BBoxDeco => out.extend(self.bbox_deco),
            NodeKind::Subscene => out.extend(self.children.iter().map(|c| c.id)),
            NodeKind::UserViewpoint => out.extend(self.user_viewpoint),
            NodeKind::ModelViewpoint => out.extend(self.model_viewpoint),
        }
        if recursive {
            for c in &self.children {
                c.collect_ids(kind, recursive, out);
            }
        }
    }

    fn owned_ids(&self) -> Vec<(NodeId, NodeKind)> {
        let mut out = Vec::new();
        out.extend(self.lights.iter().map(|&id| (id, NodeKind::Lights)));
        out.extend(self.clip_planes.iter().map(|&id| (id, NodeKind::ClipPlanes)));
        out.extend(self.shapes.iter().map(|&id| (id, NodeKind::Shapes)));
        out.extend(self.background.map(|id| (id, NodeKind::Background)));
        out.extend(self.bbox_deco.map(|id| (id, NodeKind::BBoxDeco)));
        out.extend(self.children.iter().map(|c| (c.id, NodeKind::Subscene)));
        out
    }

    /// The number of values the numeric or text attribute holds.
    pub fn attribute_count(&self, attrib: Attrib) -> usize {
        match attrib {
            Attrib::Ids | Attrib::Types => self.owned_ids().len(),
            Attrib::Flags => 4,
            Attrib::Viewport => 4,
            Attrib::Bbox => 6,
        }
    }

    /// The `index`-th value of a numeric attribute. `bbox` stands in for the
    /// aggregated box when this subscene's own is empty.
    pub fn attribute(&self, bbox: &AABox, attrib: Attrib, index: usize) -> Option<f32> {
        match attrib {
            Attrib::Ids => self.owned_ids().get(index).map(|(id, _)| id.0 as f32),
            Attrib::Types => None,
            Attrib::Flags => [
                self.ignore_extent as u8 as f32,
                self.do_viewport as u8 as f32,
                self.do_projection as u8 as f32,
                self.do_model as u8 as f32,
            ]
            .get(index)
            .copied(),
            Attrib::Viewport => [
                self.pviewport.x as f32,
                self.pviewport.y as f32,
                self.pviewport.width as f32,
                self.pviewport.height as f32,
            ]
            .get(index)
            .copied(),
            Attrib::Bbox => {
                let b = if self.data_bbox.is_valid() {
                    self.data_bbox
                } else {
                    *bbox
                };
                [b.min.x, b.min.y, b.min.z, b.max.x, b.max.y, b.max.z]
                    .get(index)
                    .copied()
            }
        }
    }

    /// The `index`-th value of a text attribute.
    pub fn text_attribute(
        &self,
        objects: &SceneObjects,
        attrib: Attrib,
        index: usize,
    ) -> Option<String> {
        match attrib {
            Attrib::Types => {
                let (id, kind) = *self.owned_ids().get(index)?;
                let name = match kind {
                    NodeKind::Shapes => objects.shape(id).map(|s| s.type_name()),
                    NodeKind::Lights => objects.light(id).map(|l| l.type_name()),
                    NodeKind::ClipPlanes => objects.clip_planes(id).map(|c| c.type_name()),
                    NodeKind::Background => objects.background(id).map(|b| b.type_name()),
                    NodeKind::BBoxDeco => objects.bbox_deco(id).map(|d| d.type_name()),
                    _ => None,
                };
                Some(name.unwrap_or_else(|| kind.type_name()).to_string())
            }
            _ => None,
        }
    }
}

fn remove_id(list: &mut Vec<NodeId>, id: NodeId) -> bool {
    if let Some(i) = list.iter().position(|&x| x == id) {
        list.remove(i);
        true
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clip::ClipPlaneSet;
    use crate::light::Light;
    use crate::shape::Shape;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[derive(Clone, Debug, PartialEq)]
    struct RenderEvent {
        id: NodeId,
        clip_count: usize,
        light_ids: Vec<NodeId>,
    }

    type RenderLog = Rc<RefCell<Vec<RenderEvent>>>;

    struct TestShape {
        id: NodeId,
        bbox: AABox,
        flags: ShapeFlags,
        log: RenderLog,
    }

    impl TestShape {
        fn cube(center: Vec3, half: f32, flags: ShapeFlags, log: &RenderLog) -> TestShape {
            TestShape {
                id: NodeId::next(),
                bbox: AABox::from_corners(center - Vec3::splat(half), center + Vec3::splat(half)),
                flags,
                log: log.clone(),
            }
        }
    }

    impl SceneNode for TestShape {
        fn id(&self) -> NodeId {
            self.id
        }

        fn type_name(&self) -> &'static str {
            "triangles"
        }
    }

    impl Shape for TestShape {
        fn bounding_box(&self) -> AABox {
            self.bbox
        }

        fn flags(&self) -> ShapeFlags {
            self.flags
        }

        fn render(&mut self, ctx: &mut RenderContext) {
            self.log.borrow_mut().push(RenderEvent {
                id: self.id,
                clip_count: ctx.clip_planes().len(),
                light_ids: ctx.lights().iter().map(|l| l.id).collect(),
            });
        }
    }

    fn add_cube(
        sub: &mut Subscene,
        objects: &mut SceneObjects,
        center: Vec3,
        half: f32,
        flags: ShapeFlags,
        log: &RenderLog,
    ) -> NodeId {
        let id = objects.insert_shape(Box::new(TestShape::cube(center, half, flags, log)));
        sub.add_shape(objects, id);
        id
    }

    fn frame(root: &mut Subscene, objects: &SceneObjects) -> RenderContext {
        let mut ctx = RenderContext::new(800, 600);
        ctx.begin_frame();
        root.update(objects, &mut ctx);
        ctx
    }

    #[test]
    fn root_viewport_covers_window() {
        let objects = SceneObjects::new();
        let mut root = Subscene::root();
        frame(&mut root, &objects);
        assert_eq!(root.pixel_viewport(), PixelRect::new(0, 0, 800, 600));
    }

    #[test]
    fn modify_viewport_covers_right_half() {
        let objects = SceneObjects::new();
        let mut root = Subscene::root();
        let mut child = Subscene::new(
            Embedding::Modify,
            Embedding::Inherit,
            Embedding::Inherit,
            false,
        );
        child.set_viewport(Rect::new(0.5, 0.0, 0.5, 1.0));
        root.add_subscene(child);

        frame(&mut root, &objects);

        let child = root.child(0);
        assert_eq!(child.pixel_viewport(), PixelRect::new(400, 0, 400, 600));
    }

    #[test]
    fn inherit_matches_parent_exactly() {
        let log = RenderLog::default();
        let mut objects = SceneObjects::new();
        let mut root = Subscene::root();
        add_cube(
            &mut root,
            &mut objects,
            Vec3::new(1.0, 2.0, 3.0),
            2.0,
            ShapeFlags::empty(),
            &log,
        );
        root.add_subscene(Subscene::new(
            Embedding::Inherit,
            Embedding::Inherit,
            Embedding::Inherit,
            false,
        ));

        frame(&mut root, &objects);

        let child = root.child(0);
        assert_eq!(child.pixel_viewport(), root.pixel_viewport());
        assert_eq!(child.projection_matrix(), root.projection_matrix());
        assert_eq!(child.model_matrix(), root.model_matrix());
        assert_eq!(child.modelview_matrix(), root.modelview_matrix());
    }

    #[test]
    fn replace_ignores_parent_state() {
        let log = RenderLog::default();

        // A child replacing everything inside a parent with its own content
        // and viewport...
        let mut objects = SceneObjects::new();
        let mut root = Subscene::root();
        add_cube(
            &mut root,
            &mut objects,
            Vec3::new(-7.0, 0.0, 0.0),
            3.0,
            ShapeFlags::empty(),
            &log,
        );
        let mut child = Subscene::new(
            Embedding::Replace,
            Embedding::Replace,
            Embedding::Replace,
            false,
        );
        child.set_viewport(Rect::new(0.0, 0.0, 0.5, 0.5));
        let child_id = root.add_subscene(child);
        add_cube(
            root.get_subscene_mut(child_id).unwrap(),
            &mut objects,
            Vec3::new(5.0, 0.0, 0.0),
            1.0,
            ShapeFlags::empty(),
            &log,
        );
        frame(&mut root, &objects);

        // ...resolves exactly like a standalone subscene with the same
        // configuration.
        let mut solo_objects = SceneObjects::new();
        let mut solo = Subscene::root();
        solo.set_viewport(Rect::new(0.0, 0.0, 0.5, 0.5));
        add_cube(
            &mut solo,
            &mut solo_objects,
            Vec3::new(5.0, 0.0, 0.0),
            1.0,
            ShapeFlags::empty(),
            &log,
        );
        frame(&mut solo, &solo_objects);

        let child = root.get_subscene(child_id).unwrap();
        assert_eq!(child.pixel_viewport(), PixelRect::new(0, 0, 400, 300));
        assert_eq!(child.pixel_viewport(), solo.pixel_viewport());
        assert_eq!(child.projection_matrix(), solo.projection_matrix());
        assert_eq!(child.model_matrix(), solo.model_matrix());
    }

    #[test]
    fn data_bbox_is_union_of_own_and_children() {
        let log = RenderLog::default();
        let mut objects = SceneObjects::new();
        let mut root = Subscene::root();

        let own = add_cube(
            &mut root,
            &mut objects,
            Vec3::ZERO,
            1.0,
            ShapeFlags::empty(),
            &log,
        );
        let a = root.add_subscene(Subscene::new(
            Embedding::Inherit,
            Embedding::Inherit,
            Embedding::Inherit,
            false,
        ));
        let b = root.add_subscene(Subscene::new(
            Embedding::Inherit,
            Embedding::Inherit,
            Embedding::Inherit,
            false,
        ));
        add_cube(
            root.get_subscene_mut(a).unwrap(),
            &mut objects,
            Vec3::new(2.5, 0.0, 0.0),
            0.5,
            ShapeFlags::empty(),
            &log,
        );
        add_cube(
            root.get_subscene_mut(b).unwrap(),
            &mut objects,
            Vec3::new(-2.5, 0.0, 0.0),
            0.5,
            ShapeFlags::empty(),
            &log,
        );

        let bbox = root.bounding_box(&objects);
        assert_eq!(bbox.min, Vec3::new(-3.0, -1.0, -1.0));
        assert_eq!(bbox.max, Vec3::new(3.0, 1.0, 1.0));

        // Hiding the local shape leaves the union of the two children only.
        assert!(root.hide_shape(own));
        let bbox = root.bounding_box(&objects);
        assert_eq!(bbox.min, Vec3::new(-3.0, -0.5, -0.5));
        assert_eq!(bbox.max, Vec3::new(3.0, 0.5, 0.5));
    }

    #[test]
    fn adding_a_shape_never_shrinks_the_bbox() {
        let log = RenderLog::default();
        let mut objects = SceneObjects::new();
        let mut root = Subscene::root();
        add_cube(&mut root, &mut objects, Vec3::ZERO, 2.0, ShapeFlags::empty(), &log);
        let before = root.bounding_box(&objects);

        add_cube(
            &mut root,
            &mut objects,
            Vec3::new(0.5, 0.0, 0.0),
            0.1,
            ShapeFlags::empty(),
            &log,
        );
        let after = root.bounding_box(&objects);
        assert!(after.min.x <= before.min.x && after.max.x >= before.max.x);
        assert!(after.min.y <= before.min.y && after.max.y >= before.max.y);
        assert!(after.min.z <= before.min.z && after.max.z >= before.max.z);
    }

    #[test]
    fn hiding_the_last_shape_collapses_a_leaf_bbox() {
        let log = RenderLog::default();
        let mut objects = SceneObjects::new();
        let mut leaf = Subscene::root();
        let id = add_cube(&mut leaf, &mut objects, Vec3::ZERO, 1.0, ShapeFlags::empty(), &log);

        assert!(leaf.bounding_box(&objects).is_valid());
        assert!(leaf.hide_shape(id));
        assert!(!leaf.bounding_box(&objects).is_valid());
        assert!(objects.shape(id).is_some(), "hide must not destroy the shape");
    }

    #[test]
    fn zsort_renders_back_to_front_with_stable_ties() {
        let log = RenderLog::default();
        let mut objects = SceneObjects::new();
        let mut root = Subscene::root();

        let opaque = add_cube(&mut root, &mut objects, Vec3::ZERO, 0.5, ShapeFlags::empty(), &log);
        let near = add_cube(
            &mut root,
            &mut objects,
            Vec3::new(0.0, 0.0, 0.0),
            0.5,
            ShapeFlags::SORT,
            &log,
        );
        let far = add_cube(
            &mut root,
            &mut objects,
            Vec3::new(0.0, 0.0, -4.0),
            0.5,
            ShapeFlags::SORT,
            &log,
        );
        let mid_a = add_cube(
            &mut root,
            &mut objects,
            Vec3::new(0.5, 0.0, -2.0),
            0.5,
            ShapeFlags::SORT,
            &log,
        );
        let mid_b = add_cube(
            &mut root,
            &mut objects,
            Vec3::new(-0.5, 0.0, -2.0),
            0.5,
            ShapeFlags::SORT,
            &log,
        );

        let mut ctx = frame(&mut root, &objects);
        root.render(&mut objects, &mut ctx);

        let order: Vec<NodeId> = log.borrow().iter().map(|e| e.id).collect();
        assert_eq!(order, vec![opaque, far, mid_a, mid_b, near]);
    }

    #[test]
    fn which_subscene_returns_innermost_match() {
        let objects = SceneObjects::new();
        let mut root = Subscene::root();
        let mut child = Subscene::new(
            Embedding::Modify,
            Embedding::Inherit,
            Embedding::Inherit,
            false,
        );
        child.set_viewport(Rect::new(0.5, 0.0, 0.5, 1.0));
        let mut grandchild = Subscene::new(
            Embedding::Modify,
            Embedding::Inherit,
            Embedding::Inherit,
            false,
        );
        grandchild.set_viewport(Rect::new(0.5, 0.0, 0.5, 1.0));
        let gc_id = child.add_subscene(grandchild);
        let child_id = root.add_subscene(child);

        frame(&mut root, &objects);

        assert_eq!(root.which_subscene(700, 300), gc_id);
        assert_eq!(root.which_subscene(500, 300), child_id);
        assert_eq!(root.which_subscene(100, 300), root.id());
        // Outside every viewport the receiver is the fallback.
        assert_eq!(root.which_subscene(-5, -5), root.id());
    }

    #[test]
    fn hide_subscene_detaches_a_grandchild() {
        let mut root = Subscene::root();
        let mut child = Subscene::new(
            Embedding::Inherit,
            Embedding::Inherit,
            Embedding::Inherit,
            false,
        );
        let mut grandchild = Subscene::new(
            Embedding::Inherit,
            Embedding::Inherit,
            Embedding::Inherit,
            false,
        );
        grandchild.add_subscene(Subscene::new(
            Embedding::Inherit,
            Embedding::Inherit,
            Embedding::Inherit,
            false,
        ));
        let gc_id = child.add_subscene(grandchild);
        let child_id = root.add_subscene(child);

        assert_eq!(root.get_subscene(child_id).unwrap().child_count(), 1);
        let detached = root.hide_subscene(gc_id).expect("grandchild is present");
        assert_eq!(root.get_subscene(child_id).unwrap().child_count(), 0);
        assert!(root.get_subscene(gc_id).is_none());

        // The detached subtree is intact, just unreachable from the root.
        assert_eq!(detached.id(), gc_id);
        assert_eq!(detached.child_count(), 1);
        assert_eq!(detached.parent(), None);

        assert!(root.hide_subscene(gc_id).is_none());
    }

    #[test]
    fn clip_planes_and_lights_are_lexically_scoped() {
        let log = RenderLog::default();
        let mut objects = SceneObjects::new();
        let mut root = Subscene::root();

        let root_clip = objects.insert_clip_planes(ClipPlaneSet::new(vec![Vec4::X]));
        root.add_clip_planes(&objects, root_clip);
        let root_light = objects.insert_light(Light::default());
        root.add_light(&objects, root_light);
        let root_shape = add_cube(&mut root, &mut objects, Vec3::ZERO, 1.0, ShapeFlags::empty(), &log);

        let child_id = root.add_subscene(Subscene::new(
            Embedding::Inherit,
            Embedding::Inherit,
            Embedding::Inherit,
            false,
        ));
        let child_clip = objects.insert_clip_planes(ClipPlaneSet::new(vec![Vec4::Y, Vec4::Z]));
        let child_light = objects.insert_light(Light::default());
        {
            let child = root.get_subscene_mut(child_id).unwrap();
            child.add_clip_planes(&objects, child_clip);
            child.add_light(&objects, child_light);
        }
        let child_shape = add_cube(
            root.get_subscene_mut(child_id).unwrap(),
            &mut objects,
            Vec3::new(2.0, 0.0, 0.0),
            1.0,
            ShapeFlags::empty(),
            &log,
        );

        // A grandchild with no lights of its own inherits the child's.
        let gc_id = root
            .get_subscene_mut(child_id)
            .unwrap()
            .add_subscene(Subscene::new(
                Embedding::Inherit,
                Embedding::Inherit,
                Embedding::Inherit,
                false,
            ));
        let gc_shape = add_cube(
            root.get_subscene_mut(gc_id).unwrap(),
            &mut objects,
            Vec3::new(-2.0, 0.0, 0.0),
            1.0,
            ShapeFlags::empty(),
            &log,
        );

        let mut ctx = frame(&mut root, &objects);
        root.render(&mut objects, &mut ctx);

        let events = log.borrow();
        let event = |id: NodeId| events.iter().find(|e| e.id == id).unwrap().clone();

        assert_eq!(event(root_shape).clip_count, 1);
        assert_eq!(event(root_shape).light_ids, vec![root_light]);

        // Clip planes accumulate; a local light list overrides.
        assert_eq!(event(child_shape).clip_count, 3);
        assert_eq!(event(child_shape).light_ids, vec![child_light]);

        assert_eq!(event(gc_shape).clip_count, 3);
        assert_eq!(event(gc_shape).light_ids, vec![child_light]);

        // Everything scoped is unwound by the time the traversal returns.
        assert!(ctx.clip_planes().is_empty());
        assert!(ctx.lights().is_empty());
    }

    #[test]
    fn duplicate_adds_are_ignored() {
        let log = RenderLog::default();
        let mut objects = SceneObjects::new();
        let mut root = Subscene::root();
        let id = add_cube(&mut root, &mut objects, Vec3::ZERO, 1.0, ShapeFlags::empty(), &log);
        root.add_shape(&objects, id);
        assert_eq!(root.ids(NodeKind::Shapes, false), vec![id]);

        let light = objects.insert_light(Light::default());
        root.add_light(&objects, light);
        root.add_light(&objects, light);
        assert_eq!(root.ids(NodeKind::Lights, false), vec![light]);
    }

    #[test]
    fn stale_identifiers_resolve_as_absent() {
        let log = RenderLog::default();
        let mut objects = SceneObjects::new();
        let mut root = Subscene::root();
        let id = add_cube(&mut root, &mut objects, Vec3::ZERO, 1.0, ShapeFlags::empty(), &log);
        objects.remove_shape(id).unwrap();

        let mut ctx = frame(&mut root, &objects);
        root.render(&mut objects, &mut ctx);

        assert!(log.borrow().is_empty());
        assert!(!root.bounding_box(&objects).is_valid());
    }

    #[test]
    fn empty_scene_updates_to_finite_matrices() {
        let objects = SceneObjects::new();
        let mut root = Subscene::root();
        frame(&mut root, &objects);

        assert!(root.projection_matrix().is_finite());
        assert!(root.modelview_matrix().is_finite());
        assert!(root.get_distance(Vec3::ZERO).is_finite());
    }

    #[test]
    fn translate_coords_is_viewport_relative() {
        let objects = SceneObjects::new();
        let mut root = Subscene::root();
        let mut child = Subscene::new(
            Embedding::Modify,
            Embedding::Inherit,
            Embedding::Inherit,
            false,
        );
        child.set_viewport(Rect::new(0.5, 0.0, 0.5, 1.0));
        root.add_subscene(child);
        frame(&mut root, &objects);

        assert_eq!(root.child(0).translate_coords(500, 10), (100, 10));
        assert_eq!(root.translate_coords(500, 10), (500, 10));
    }

    #[test]
    fn mouse_listeners_start_with_self() {
        let mut sub = Subscene::root();
        assert_eq!(sub.mouse_listeners(), &[sub.id()]);

        let other = NodeId::next();
        sub.set_mouse_listeners(vec![sub.id(), other]);
        assert_eq!(sub.mouse_listeners(), &[sub.id(), other]);
    }

    #[test]
    fn ignore_extent_excludes_own_shapes_only() {
        let log = RenderLog::default();
        let mut objects = SceneObjects::new();
        let mut root = Subscene::root();
        root.set_ignore_extent(true);
        add_cube(
            &mut root,
            &mut objects,
            Vec3::new(100.0, 0.0, 0.0),
            1.0,
            ShapeFlags::empty(),
            &log,
        );
        let child_id = root.add_subscene(Subscene::new(
            Embedding::Inherit,
            Embedding::Inherit,
            Embedding::Inherit,
            false,
        ));
        add_cube(
            root.get_subscene_mut(child_id).unwrap(),
            &mut objects,
            Vec3::ZERO,
            1.0,
            ShapeFlags::empty(),
            &log,
        );

        let bbox = root.bounding_box(&objects);
        assert_eq!(bbox.min, Vec3::splat(-1.0));
        assert_eq!(bbox.max, Vec3::splat(1.0));
    }

    #[test]
    fn add_bbox_grows_the_whole_path() {
        let mut root = Subscene::root();
        let child_id = root.add_subscene(Subscene::new(
            Embedding::Inherit,
            Embedding::Inherit,
            Embedding::Inherit,
            false,
        ));

        let grown = AABox::from_corners(Vec3::ZERO, Vec3::splat(4.0));
        assert!(root.add_bbox(child_id, &grown, false));
        assert_eq!(root.data_bbox(), grown);
        assert_eq!(root.get_subscene(child_id).unwrap().data_bbox(), grown);

        assert!(!root.add_bbox(NodeId::next(), &grown, false));
    }

    #[test]
    fn get_ids_optionally_recurses() {
        let log = RenderLog::default();
        let mut objects = SceneObjects::new();
        let mut root = Subscene::root();
        let own = add_cube(&mut root, &mut objects, Vec3::ZERO, 1.0, ShapeFlags::empty(), &log);
        let child_id = root.add_subscene(Subscene::new(
            Embedding::Inherit,
            Embedding::Inherit,
            Embedding::Inherit,
            false,
        ));
        let nested = add_cube(
            root.get_subscene_mut(child_id).unwrap(),
            &mut objects,
            Vec3::ZERO,
            1.0,
            ShapeFlags::empty(),
            &log,
        );

        assert_eq!(root.ids(NodeKind::Shapes, false), vec![own]);
        assert_eq!(root.ids(NodeKind::Shapes, true), vec![own, nested]);
        assert_eq!(root.id_count(NodeKind::Subscene, false), 1);
    }

    #[test]
    fn attribute_surface_reports_state() {
        let log = RenderLog::default();
        let mut objects = SceneObjects::new();
        let mut root = Subscene::root();
        add_cube(&mut root, &mut objects, Vec3::ZERO, 1.0, ShapeFlags::empty(), &log);
        root.add_subscene(Subscene::new(
            Embedding::Inherit,
            Embedding::Inherit,
            Embedding::Inherit,
            false,
        ));
        frame(&mut root, &objects);

        let fallback = AABox::new();
        assert_eq!(root.attribute_count(Attrib::Flags), 4);
        assert_eq!(root.attribute(&fallback, Attrib::Flags, 0), Some(0.0));
        assert_eq!(root.attribute(&fallback, Attrib::Flags, 1), Some(3.0));
        assert_eq!(root.attribute(&fallback, Attrib::Viewport, 2), Some(800.0));
        assert_eq!(root.attribute(&fallback, Attrib::Bbox, 0), Some(-1.0));
        assert_eq!(root.attribute(&fallback, Attrib::Flags, 4), None);

        assert_eq!(root.attribute_count(Attrib::Types), 2);
        assert_eq!(
            root.text_attribute(&objects, Attrib::Types, 0),
            Some("triangles".to_string())
        );
        assert_eq!(
            root.text_attribute(&objects, Attrib::Types, 1),
            Some("subscene".to_string())
        );
    }

    #[test]
    fn viewpoint_accessors_delegate_through_the_registry() {
        use crate::viewpoint::ModelViewpoint;

        let mut objects = SceneObjects::new();
        let mut root = Subscene::root();
        let vp = objects.insert_model_viewpoint(ModelViewpoint::new());
        root.set_model_viewpoint(Some(vp));

        root.set_scale(&mut objects, Vec3::splat(2.0));
        assert_eq!(root.scale(&objects), Some(Vec3::splat(2.0)));

        let m = Mat4::from_translation(Vec3::X);
        root.set_user_matrix(&mut objects, m);
        assert_eq!(root.user_matrix(&objects), Some(m));

        assert!(root.hide_viewpoint(vp));
        assert_eq!(root.model_viewpoint_id(), None);
        assert_eq!(root.scale(&objects), None);
    }
}
