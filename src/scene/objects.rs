//! The scene-object registry.
//!
//! Every renderable object lives here, keyed by its stable identifier. The
//! subscene tree stores identifiers only: it never allocates or frees a
//! registry object, and a lookup that fails is treated as plain absence;
//! the entry is skipped, never dereferenced. Removing an object from the
//! registry is the caller's way of destroying it; hiding it in a subscene
//! leaves it available to the rest of the scene.

use crate::background::Background;
use crate::bbox_deco::BBoxDeco;
use crate::clip::ClipPlaneSet;
use crate::light::Light;
use crate::node::{NodeId, SceneNode};
use crate::shape::Shape;
use crate::viewpoint::{ModelViewpoint, UserViewpoint};
use std::collections::BTreeMap;

/// Owns the scene's objects; subscenes reference them by identifier.
///
/// Ordered maps keep identifier enumeration deterministic.
#[derive(Default)]
pub struct SceneObjects {
    shapes: BTreeMap<NodeId, Box<dyn Shape>>,
    lights: BTreeMap<NodeId, Light>,
    clip_planes: BTreeMap<NodeId, ClipPlaneSet>,
    backgrounds: BTreeMap<NodeId, Box<dyn Background>>,
    bbox_decos: BTreeMap<NodeId, Box<dyn BBoxDeco>>,
    user_viewpoints: BTreeMap<NodeId, UserViewpoint>,
    model_viewpoints: BTreeMap<NodeId, ModelViewpoint>,
}

impl SceneObjects {
    /// Creates an empty registry.
    pub fn new() -> SceneObjects {
        Default::default()
    }

    /// Stores `shape`, returning its identifier.
    pub fn insert_shape(&mut self, shape: Box<dyn Shape>) -> NodeId {
        let id = shape.id();
        self.shapes.insert(id, shape);
        id
    }

    /// The shape with identifier `id`, if it exists.
    pub fn shape(&self, id: NodeId) -> Option<&dyn Shape> {
        self.shapes.get(&id).map(|s| &**s)
    }

    /// Mutable access to the shape with identifier `id`.
    pub fn shape_mut(&mut self, id: NodeId) -> Option<&mut (dyn Shape + 'static)> {
        self.shapes.get_mut(&id).map(|s| &mut **s)
    }

    /// Destroys the shape with identifier `id`, returning it.
    pub fn remove_shape(&mut self, id: NodeId) -> Option<Box<dyn Shape>> {
        self.shapes.remove(&id)
    }

    /// Stores `light`, returning its identifier.
    pub fn insert_light(&mut self, light: Light) -> NodeId {
        let id = light.id();
        self.lights.insert(id, light);
        id
    }

    /// The light with identifier `id`, if it exists.
    pub fn light(&self, id: NodeId) -> Option<&Light> {
        self.lights.get(&id)
    }

    /// Mutable access to the light with identifier `id`.
    pub fn light_mut(&mut self, id: NodeId) -> Option<&mut Light> {
        self.lights.get_mut(&id)
    }

    /// Destroys the light with identifier `id`, returning it.
    pub fn remove_light(&mut self, id: NodeId) -> Option<Light> {
        self.lights.remove(&id)
    }

    /// Stores `planes`, returning its identifier.
    pub fn insert_clip_planes(&mut self, planes: ClipPlaneSet) -> NodeId {
        let id = planes.id();
        self.clip_planes.insert(id, planes);
        id
    }

    /// The clip-plane set with identifier `id`, if it exists.
    pub fn clip_planes(&self, id: NodeId) -> Option<&ClipPlaneSet> {
        self.clip_planes.get(&id)
    }

    /// Destroys the clip-plane set with identifier `id`, returning it.
    pub fn remove_clip_planes(&mut self, id: NodeId) -> Option<ClipPlaneSet> {
        self.clip_planes.remove(&id)
    }

    /// Stores `background`, returning its identifier.
    pub fn insert_background(&mut self, background: Box<dyn Background>) -> NodeId {
        let id = background.id();
        self.backgrounds.insert(id, background);
        id
    }

    /// The background with identifier `id`, if it exists.
    pub fn background(&self, id: NodeId) -> Option<&dyn Background> {
        self.backgrounds.get(&id).map(|b| &**b)
    }

    /// Mutable access to the background with identifier `id`.
    pub fn background_mut(&mut self, id: NodeId) -> Option<&mut (dyn Background + 'static)> {
        self.backgrounds.get_mut(&id).map(|b| &mut **b)
    }

    /// Destroys the background with identifier `id`, returning it.
    pub fn remove_background(&mut self, id: NodeId) -> Option<Box<dyn Background>> {
        self.backgrounds.remove(&id)
    }

    /// Stores `deco`, returning its identifier.
    pub fn insert_bbox_deco(&mut self, deco: Box<dyn BBoxDeco>) -> NodeId {
        let id = deco.id();
        self.bbox_decos.insert(id, deco);
        id
    }

    /// The bounding-box decoration with identifier `id`, if it exists.
    pub fn bbox_deco(&self, id: NodeId) -> Option<&dyn BBoxDeco> {
        self.bbox_decos.get(&id).map(|d| &**d)
    }

    /// Mutable access to the bounding-box decoration with identifier `id`.
    pub fn bbox_deco_mut(&mut self, id: NodeId) -> Option<&mut (dyn BBoxDeco + 'static)> {
        self.bbox_decos.get_mut(&id).map(|d| &mut **d)
    }

    /// Destroys the bounding-box decoration with identifier `id`.
    pub fn remove_bbox_deco(&mut self, id: NodeId) -> Option<Box<dyn BBoxDeco>> {
        self.bbox_decos.remove(&id)
    }

    /// Stores `viewpoint`, returning its identifier.
    pub fn insert_user_viewpoint(&mut self, viewpoint: UserViewpoint) -> NodeId {
        let id = viewpoint.id();
        self.user_viewpoints.insert(id, viewpoint);
        id
    }

    /// The user viewpoint with identifier `id`, if it exists.
    pub fn user_viewpoint(&self, id: NodeId) -> Option<&UserViewpoint> {
        self.user_viewpoints.get(&id)
    }

    /// Mutable access to the user viewpoint with identifier `id`.
    pub fn user_viewpoint_mut(&mut self, id: NodeId) -> Option<&mut UserViewpoint> {
        self.user_viewpoints.get_mut(&id)
    }

    /// Destroys the user viewpoint with identifier `id`, returning it.
    pub fn remove_user_viewpoint(&mut self, id: NodeId) -> Option<UserViewpoint> {
        self.user_viewpoints.remove(&id)
    }

    /// Stores `viewpoint`, returning its identifier.
    pub fn insert_model_viewpoint(&mut self, viewpoint: ModelViewpoint) -> NodeId {
        let id = viewpoint.id();
        self.model_viewpoints.insert(id, viewpoint);
        id
    }

    /// The model viewpoint with identifier `id`, if it exists.
    pub fn model_viewpoint(&self, id: NodeId) -> Option<&ModelViewpoint> {
        self.model_viewpoints.get(&id)
    }

    /// Mutable access to the model viewpoint with identifier `id`.
    pub fn model_viewpoint_mut(&mut self, id: NodeId) -> Option<&mut ModelViewpoint> {
        self.model_viewpoints.get_mut(&id)
    }

    /// Destroys the model viewpoint with identifier `id`, returning it.
    pub fn remove_model_viewpoint(&mut self, id: NodeId) -> Option<ModelViewpoint> {
        self.model_viewpoints.remove(&id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_after_remove_is_absence() {
        let mut objects = SceneObjects::new();
        let id = objects.insert_light(Light::default());
        assert!(objects.light(id).is_some());
        assert!(objects.remove_light(id).is_some());
        assert!(objects.light(id).is_none());
        assert!(objects.remove_light(id).is_none());
    }

    #[test]
    fn viewpoints_are_stored_by_their_own_id() {
        let mut objects = SceneObjects::new();
        let vp = UserViewpoint::new(60.0);
        let id = vp.id();
        assert_eq!(objects.insert_user_viewpoint(vp), id);
        assert_eq!(objects.user_viewpoint(id).unwrap().fov, 60.0);
    }
}
