//! Everything related to the subscene tree.

pub use self::objects::SceneObjects;
pub use self::subscene::{EmbedDim, Embedding, Subscene};

mod objects;
mod subscene;
