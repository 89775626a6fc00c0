//! Owned scene-graph instances spawned from an imported model.

pub mod game_object;
pub mod instantiate;

pub use game_object::{GameObject, MeshRenderer};
