//! The mutable per-frame context threaded by reference through the whole
//! traversal.
//!
//! A `RenderContext` is owned by the frame driver, reset once per frame, and
//! passed down the subscene tree. Each subscene writes its resolved viewport
//! and matrices into it before drawing and relies on a stack discipline for
//! the lexically scoped state (clip planes and lights): push on descent,
//! truncate back to the saved mark on return. That discipline is a contract
//! of the traversal structure, not something enforced at runtime.

use crate::light::{BoundLight, Light, MAX_LIGHTS};
use crate::node::{NodeId, SceneNode};
use crate::rect::PixelRect;
use glamx::{Mat4, Vec3, Vec4};
use web_time::Instant;

/// Per-frame rendering state shared across the subscene traversal.
///
/// Matrices are column-major with the column-vector convention (`M * v`),
/// matching the math crate.
pub struct RenderContext {
    /// The subscene currently being rendered, if any.
    pub subscene: Option<NodeId>,
    /// The full window rectangle in pixels.
    pub rect: PixelRect,
    /// The user viewpoint active for the current subscene, if any.
    pub viewpoint: Option<NodeId>,
    /// Seconds since the context was created, updated by [`begin_frame`].
    ///
    /// [`begin_frame`]: RenderContext::begin_frame
    pub time: f64,
    /// The previous frame's `time`.
    pub last_time: f64,
    /// `time - last_time`.
    pub delta_time: f64,
    /// The current modelview matrix.
    pub modelview: Mat4,
    /// The current projection matrix.
    pub projection: Mat4,
    /// The active viewport as `[x, y, width, height]` in pixels.
    pub viewport: [i32; 4],
    /// Row 2 of `projection * modelview`, for eye-distance queries.
    pub zrow: Vec4,
    /// Row 3 of `projection * modelview`, for eye-distance queries.
    pub wrow: Vec4,
    /// Set when no real backend is attached; shapes may skip draw work.
    pub headless: bool,
    start: Instant,
    clip_planes: Vec<Vec4>,
    lights: Vec<BoundLight>,
}

impl RenderContext {
    /// Creates a context for a window of the given pixel size.
    pub fn new(width: i32, height: i32) -> RenderContext {
        RenderContext {
            subscene: None,
            rect: PixelRect::new(0, 0, width, height),
            viewpoint: None,
            time: 0.0,
            last_time: 0.0,
            delta_time: 0.0,
            modelview: Mat4::IDENTITY,
            projection: Mat4::IDENTITY,
            viewport: [0, 0, width, height],
            zrow: Vec4::ZERO,
            wrow: Vec4::ZERO,
            headless: false,
            start: Instant::now(),
            clip_planes: Vec::new(),
            lights: Vec::new(),
        }
    }

    /// Advances the frame clock. Call once at the top of each frame, before
    /// `update`.
    pub fn begin_frame(&mut self) {
        self.last_time = self.time;
        self.time = self.start.elapsed().as_secs_f64();
        self.delta_time = self.time - self.last_time;
    }

    /// Makes `rect` the active viewport.
    pub fn set_viewport(&mut self, rect: PixelRect) {
        self.viewport = [rect.x, rect.y, rect.width, rect.height];
    }

    /// Installs the matrices for the current subscene and refreshes the
    /// distance-query rows from their product.
    pub fn set_matrices(&mut self, modelview: Mat4, projection: Mat4) {
        self.modelview = modelview;
        self.projection = projection;
        let mvp = projection * modelview;
        self.zrow = mvp.row(2);
        self.wrow = mvp.row(3);
    }

    /// Normalized device depth of the model-space point `v`.
    ///
    /// Larger values are farther from the viewpoint, so sorting by
    /// descending distance renders back-to-front.
    pub fn get_distance(&self, v: Vec3) -> f32 {
        let v = v.extend(1.0);
        self.zrow.dot(v) / self.wrow.dot(v)
    }

    /// The current mark of the clip-plane stack.
    #[inline]
    pub fn clip_mark(&self) -> usize {
        self.clip_planes.len()
    }

    /// Pushes `planes` onto the clip-plane stack.
    pub fn enable_clip_planes(&mut self, planes: &[Vec4]) {
        self.clip_planes.extend_from_slice(planes);
    }

    /// Truncates the clip-plane stack back to `mark`.
    pub fn disable_clip_planes(&mut self, mark: usize) {
        self.clip_planes.truncate(mark);
    }

    /// All clip planes currently in effect.
    #[inline]
    pub fn clip_planes(&self) -> &[Vec4] {
        &self.clip_planes
    }

    /// Snapshot of the bound lights, for restoring after a subtree.
    pub fn save_lights(&self) -> Vec<BoundLight> {
        self.lights.clone()
    }

    /// Unbinds every light.
    pub fn clear_lights(&mut self) {
        self.lights.clear();
    }

    /// Binds `light` into the next free slot. Returns `false` without
    /// binding when all slots are taken.
    pub fn bind_light(&mut self, light: &Light) -> bool {
        let slot = self.lights.len();
        if slot >= MAX_LIGHTS {
            log::warn!("too many lights; {} not bound", light.id());
            return false;
        }
        self.lights.push(BoundLight {
            id: light.id(),
            slot,
            light: light.clone(),
        });
        true
    }

    /// Restores a snapshot taken with [`save_lights`].
    ///
    /// [`save_lights`]: RenderContext::save_lights
    pub fn restore_lights(&mut self, saved: Vec<BoundLight>) {
        self.lights = saved;
    }

    /// All lights currently bound.
    #[inline]
    pub fn lights(&self) -> &[BoundLight] {
        &self.lights
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn distance_is_ndc_depth() {
        let mut ctx = RenderContext::new(100, 100);
        let proj = Mat4::perspective_rh_gl(std::f32::consts::FRAC_PI_4, 1.0, 1.0, 10.0);
        ctx.set_matrices(Mat4::IDENTITY, proj);

        let near = ctx.get_distance(Vec3::new(0.0, 0.0, -2.0));
        let far = ctx.get_distance(Vec3::new(0.0, 0.0, -8.0));
        assert!(far > near);
        assert_relative_eq!(ctx.get_distance(Vec3::new(0.0, 0.0, -1.0)), -1.0, epsilon = 1.0e-4);
    }

    #[test]
    fn clip_stack_restores_to_mark() {
        let mut ctx = RenderContext::new(10, 10);
        ctx.enable_clip_planes(&[Vec4::X]);
        let mark = ctx.clip_mark();
        ctx.enable_clip_planes(&[Vec4::Y, Vec4::Z]);
        assert_eq!(ctx.clip_planes().len(), 3);
        ctx.disable_clip_planes(mark);
        assert_eq!(ctx.clip_planes(), &[Vec4::X]);
    }

    #[test]
    fn light_slots_are_bounded() {
        let mut ctx = RenderContext::new(10, 10);
        for _ in 0..MAX_LIGHTS {
            assert!(ctx.bind_light(&Light::default()));
        }
        assert!(!ctx.bind_light(&Light::default()));
        assert_eq!(ctx.lights().len(), MAX_LIGHTS);

        let saved = ctx.save_lights();
        ctx.clear_lights();
        assert!(ctx.lights().is_empty());
        ctx.restore_lights(saved);
        assert_eq!(ctx.lights().len(), MAX_LIGHTS);
    }
}
