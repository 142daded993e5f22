//! Camera descriptions: the user viewpoint (projection parameters) and the
//! model viewpoint (model transform parameters).
//!
//! A subscene references at most one of each by identifier and falls back to
//! its parent's when unset. The projection is derived per frame from the
//! subscene's bounding sphere so the whole extent stays visible.

use crate::bounds::BoundingSphere;
use crate::node::{NodeId, SceneNode};
use glamx::{Mat4, Vec3};

/// Field of view used to place the observer when the projection itself is
/// orthographic.
const ORTHO_OBSERVER_FOV: f32 = 45.0;

/// Field of view, in degrees, used when a subscene resolves no user
/// viewpoint at all.
pub const DEFAULT_FOV: f32 = 30.0;

/// The projection side of a camera: field of view and zoom.
///
/// A `fov` of zero selects an orthographic projection.
#[derive(Clone, Debug, PartialEq)]
pub struct UserViewpoint {
    id: NodeId,
    /// Vertical field of view in degrees, in `[0, 179]`. Zero means
    /// orthographic.
    pub fov: f32,
    /// Scales the frustum half-extent; values below one zoom in.
    pub zoom: f32,
}

impl Default for UserViewpoint {
    fn default() -> Self {
        Self {
            id: NodeId::next(),
            fov: DEFAULT_FOV,
            zoom: 1.0,
        }
    }
}

impl UserViewpoint {
    /// Creates a viewpoint with the given field of view in degrees.
    pub fn new(fov: f32) -> UserViewpoint {
        UserViewpoint {
            fov: fov.clamp(0.0, 179.0),
            ..Default::default()
        }
    }

    /// Sets the zoom factor.
    pub fn with_zoom(mut self, zoom: f32) -> Self {
        self.zoom = zoom;
        self
    }

    /// Derives the frustum that encloses `sphere` in a viewport with the
    /// given aspect ratio.
    pub fn frustum(&self, sphere: &BoundingSphere, aspect: f32) -> Frustum {
        Frustum::enclosing(sphere, aspect, self.fov, self.zoom)
    }
}

impl SceneNode for UserViewpoint {
    fn id(&self) -> NodeId {
        self.id
    }

    fn type_name(&self) -> &'static str {
        "userviewpoint"
    }
}

/// A derived view frustum, ready to be turned into a projection matrix.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Frustum {
    /// Near plane distance.
    pub znear: f32,
    /// Far plane distance.
    pub zfar: f32,
    /// Observer distance from the sphere center along `-z`.
    pub distance: f32,
    /// Effective vertical field of view in radians; zero for orthographic.
    pub fovy: f32,
    /// Half the viewport height in world units, orthographic only.
    pub half_height: f32,
    /// Viewport aspect ratio (width over height).
    pub aspect: f32,
}

impl Frustum {
    /// Derives the frustum that encloses `sphere` in a viewport with the
    /// given aspect ratio, for a field of view in degrees (zero selects an
    /// orthographic projection) and a zoom factor.
    pub fn enclosing(sphere: &BoundingSphere, aspect: f32, fov: f32, zoom: f32) -> Frustum {
        let r = sphere.radius;

        if fov <= 0.0 {
            let distance = r / (ORTHO_OBSERVER_FOV.to_radians() / 2.0).sin();
            return Frustum {
                znear: distance - r,
                zfar: distance + r,
                distance,
                fovy: 0.0,
                half_height: r * zoom,
                aspect,
            };
        }

        let half_fov = fov.clamp(1.0, 179.0).to_radians() / 2.0;
        let distance = r / half_fov.sin();
        let znear = (distance - r).max(distance / 100.0);
        let zfar = distance + r;
        // Zoom narrows the apparent field of view.
        let fovy = 2.0 * (half_fov.tan() * zoom).atan();

        Frustum {
            znear,
            zfar,
            distance,
            fovy,
            half_height: 0.0,
            aspect,
        }
    }

    /// Whether this is an orthographic frustum.
    #[inline]
    pub fn is_ortho(&self) -> bool {
        self.fovy <= 0.0
    }

    /// The GL-style projection matrix for this frustum.
    pub fn matrix(&self) -> Mat4 {
        if self.is_ortho() {
            let h = self.half_height;
            let w = h * self.aspect;
            Mat4::orthographic_rh_gl(-w, w, -h, h, self.znear, self.zfar)
        } else {
            Mat4::perspective_rh_gl(self.fovy, self.aspect, self.znear, self.zfar)
        }
    }
}

/// The model-transform side of a camera: a user rotation/interaction matrix,
/// a per-axis scale, and a translation offset.
#[derive(Clone, Debug, PartialEq)]
pub struct ModelViewpoint {
    id: NodeId,
    user_matrix: Mat4,
    scale: Vec3,
    position: Vec3,
}

impl Default for ModelViewpoint {
    fn default() -> Self {
        Self {
            id: NodeId::next(),
            user_matrix: Mat4::IDENTITY,
            scale: Vec3::ONE,
            position: Vec3::ZERO,
        }
    }
}

impl ModelViewpoint {
    /// Creates an identity model viewpoint.
    pub fn new() -> ModelViewpoint {
        Default::default()
    }

    /// Sets the user interaction matrix (typically a trackball rotation).
    pub fn set_user_matrix(&mut self, m: Mat4) {
        self.user_matrix = m;
    }

    /// The user interaction matrix.
    #[inline]
    pub fn user_matrix(&self) -> Mat4 {
        self.user_matrix
    }

    /// Sets the per-axis model scale.
    pub fn set_scale(&mut self, scale: Vec3) {
        self.scale = scale;
    }

    /// The per-axis model scale.
    #[inline]
    pub fn scale(&self) -> Vec3 {
        self.scale
    }

    /// Sets the model translation offset.
    pub fn set_position(&mut self, position: Vec3) {
        self.position = position;
    }

    /// The model translation offset.
    #[inline]
    pub fn position(&self) -> Vec3 {
        self.position
    }

    /// The local model transform: `user_matrix * scale * translate(position)`
    /// with column vectors, so the offset applies first and the user matrix
    /// last.
    pub fn local_transform(&self) -> Mat4 {
        self.user_matrix * Mat4::from_scale(self.scale) * Mat4::from_translation(self.position)
    }
}

impl SceneNode for ModelViewpoint {
    fn id(&self) -> NodeId {
        self.id
    }

    fn type_name(&self) -> &'static str {
        "modelviewpoint"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use glamx::Vec4;

    #[test]
    fn frustum_encloses_the_sphere() {
        let sphere = BoundingSphere {
            center: Vec3::ZERO,
            radius: 2.0,
        };
        let f = UserViewpoint::new(45.0).frustum(&sphere, 1.0);

        assert_relative_eq!(f.distance, 2.0 / (22.5f32.to_radians()).sin(), epsilon = 1.0e-5);
        assert!(f.znear <= f.distance - sphere.radius + 1.0e-5);
        assert!(f.zfar >= f.distance + sphere.radius - 1.0e-5);
        assert!(f.znear > 0.0);
    }

    #[test]
    fn near_plane_stays_positive_for_wide_fov() {
        let sphere = BoundingSphere {
            center: Vec3::ZERO,
            radius: 1.0,
        };
        // At 179 degrees the observer sits almost inside the sphere.
        let f = UserViewpoint::new(179.0).frustum(&sphere, 1.0);
        assert!(f.znear > 0.0);
        assert!(f.zfar > f.znear);
        assert!(f.matrix().is_finite());
    }

    #[test]
    fn zero_fov_is_orthographic() {
        let sphere = BoundingSphere {
            center: Vec3::ZERO,
            radius: 3.0,
        };
        let f = UserViewpoint::new(0.0).with_zoom(0.5).frustum(&sphere, 2.0);
        assert!(f.is_ortho());
        assert_relative_eq!(f.half_height, 1.5, epsilon = 1.0e-6);
        assert!(f.matrix().is_finite());
    }

    #[test]
    fn local_transform_applies_offset_first() {
        let mut mv = ModelViewpoint::new();
        mv.set_scale(Vec3::splat(2.0));
        mv.set_position(Vec3::new(1.0, 0.0, 0.0));

        let p = mv.local_transform() * Vec4::new(0.0, 0.0, 0.0, 1.0);
        // Offset by (1, 0, 0), then scaled by 2.
        assert_relative_eq!(p.x, 2.0, epsilon = 1.0e-6);
    }
}
