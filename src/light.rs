//! Lighting configuration for subscene trees.
//!
//! A subscene references lights by identifier; the lights themselves live in
//! the external scene-object registry. During the render traversal a
//! subscene's lights are bound into numbered slots on the context, scoped to
//! the subtree rooted at that subscene.

use crate::color::Color;
use crate::node::{NodeId, SceneNode};
use glamx::Vec3;

/// Maximum number of simultaneously bound lights.
pub const MAX_LIGHTS: usize = 8;

/// The type of light source.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum LightType {
    /// A point light emitting equally in all directions from a position.
    Point(Vec3),
    /// A directional light with parallel rays (like the sun).
    Directional(Vec3),
}

impl Default for LightType {
    fn default() -> Self {
        LightType::Directional(Vec3::new(0.0, 0.0, -1.0))
    }
}

/// A light source.
///
/// # Examples
/// ```
/// use viewtree::light::Light;
/// use viewtree::color;
/// use glamx::Vec3;
///
/// let lamp = Light::point(Vec3::new(0.0, 5.0, 0.0))
///     .with_color(color::WHITE)
///     .with_intensity(2.0);
/// let sun = Light::directional(Vec3::new(-1.0, -1.0, 0.0));
/// ```
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Light {
    id: NodeId,
    /// The type of light (point or directional).
    pub light_type: LightType,
    /// The color of the light (RGBA, each component 0.0-1.0).
    pub color: Color,
    /// The intensity multiplier for the light.
    pub intensity: f32,
    /// Whether the light is enabled. Disabled lights are skipped when a
    /// subscene binds its light set.
    pub enabled: bool,
    /// When set, the light's position/direction is interpreted in viewer
    /// space rather than model space, so the light follows the observer.
    pub viewpoint_relative: bool,
}

impl Default for Light {
    fn default() -> Self {
        Self {
            id: NodeId::next(),
            light_type: LightType::default(),
            color: crate::color::WHITE,
            intensity: 1.0,
            enabled: true,
            viewpoint_relative: false,
        }
    }
}

impl Light {
    /// Creates a point light at `position`.
    pub fn point(position: Vec3) -> Self {
        Self {
            light_type: LightType::Point(position),
            ..Default::default()
        }
    }

    /// Creates a directional light (like the sun).
    pub fn directional(dir: Vec3) -> Self {
        Self {
            light_type: LightType::Directional(dir),
            ..Default::default()
        }
    }

    /// Sets the light color.
    pub fn with_color(mut self, color: Color) -> Self {
        self.color = color;
        self
    }

    /// Sets the light intensity.
    pub fn with_intensity(mut self, intensity: f32) -> Self {
        self.intensity = intensity;
        self
    }

    /// Sets whether the light is enabled.
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Makes the light follow the observer.
    pub fn with_viewpoint_relative(mut self, viewpoint_relative: bool) -> Self {
        self.viewpoint_relative = viewpoint_relative;
        self
    }
}

impl SceneNode for Light {
    fn id(&self) -> NodeId {
        self.id
    }

    fn type_name(&self) -> &'static str {
        "light"
    }
}

/// A light bound into a numbered slot on the render context.
#[derive(Clone, Debug)]
pub struct BoundLight {
    /// The identifier of the bound light.
    pub id: NodeId,
    /// The slot the light occupies, in `0..MAX_LIGHTS`.
    pub slot: usize,
    /// The light parameters at binding time.
    pub light: Light,
}
