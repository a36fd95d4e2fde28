mod component;
mod engine;
mod render;
mod state;
mod types;

pub use component::ForceGraphCanvas;
pub use engine::{CanvasEngine, EventHandler};
