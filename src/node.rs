//! Object identity and the introspection capability shared by every kind of
//! scene object.

use std::fmt;
use std::sync::atomic::{AtomicU32, Ordering};

static NEXT_ID: AtomicU32 = AtomicU32::new(1);

/// The stable integer identifier of a scene object.
///
/// Identifiers are allocated from a process-wide monotone counter and are
/// never reused, so a stale identifier can always be detected by a failed
/// lookup rather than by dereferencing anything.
#[derive(Copy, Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct NodeId(pub u32);

impl NodeId {
    /// Allocates a fresh identifier.
    pub fn next() -> NodeId {
        NodeId(NEXT_ID.fetch_add(1, Ordering::Relaxed))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The capability every scene object satisfies: a stable identifier plus a
/// type-name query used for identifier-based hide/lookup and introspection.
pub trait SceneNode {
    /// This object's stable identifier.
    fn id(&self) -> NodeId;

    /// The type name reported by introspection, e.g. `"light"`.
    fn type_name(&self) -> &'static str;
}

/// The category of a scene object, used to enumerate identifiers.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum NodeKind {
    /// Drawable shapes.
    Shapes,
    /// Light sources.
    Lights,
    /// Clip-plane sets.
    ClipPlanes,
    /// Backgrounds.
    Background,
    /// Bounding-box decorations.
    BBoxDeco,
    /// Nested subscenes.
    Subscene,
    /// User (projection) viewpoints.
    UserViewpoint,
    /// Model (transform) viewpoints.
    ModelViewpoint,
}

impl NodeKind {
    /// The default type name for objects of this category.
    pub fn type_name(self) -> &'static str {
        match self {
            NodeKind::Shapes => "shapes",
            NodeKind::Lights => "light",
            NodeKind::ClipPlanes => "clipplanes",
            NodeKind::Background => "background",
            NodeKind::BBoxDeco => "bboxdeco",
            NodeKind::Subscene => "subscene",
            NodeKind::UserViewpoint => "userviewpoint",
            NodeKind::ModelViewpoint => "modelviewpoint",
        }
    }
}

/// An attribute of aggregated subscene state retrievable through the generic
/// introspection surface.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Attrib {
    /// Identifiers of all directly-owned objects (numeric).
    Ids,
    /// Type names of all directly-owned objects (text).
    Types,
    /// The ignore-extent flag followed by the three embedding modes
    /// (numeric, modes encoded 1 = inherit, 2 = modify, 3 = replace).
    Flags,
    /// The resolved pixel viewport as `x, y, width, height` (numeric).
    Viewport,
    /// The data bounding box as `min.xyz, max.xyz` (numeric).
    Bbox,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_unique_and_increasing() {
        let a = NodeId::next();
        let b = NodeId::next();
        assert!(b > a);
        assert_ne!(a, b);
    }
}
