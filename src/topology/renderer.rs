//! The contract between the interaction controller and whatever draws the graph.

use super::graph::{GraphEdge, GraphNode};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Easing {
	EaseInQuad,
	EaseOutQuad,
}

impl Easing {
	/// Map linear progress `t` in `0..=1` onto eased progress.
	pub fn apply(self, t: f64) -> f64 {
		let t = t.clamp(0.0, 1.0);
		match self {
			Self::EaseInQuad => t * t,
			Self::EaseOutQuad => t * (2.0 - t),
		}
	}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FitAnimation {
	pub duration_ms: u32,
	pub easing: Easing,
}

/// Events a renderer reports back. Node lists hold the ids under the pointer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RendererEvent {
	Click(Vec<String>),
	DoubleClick(Vec<String>),
	Stabilized,
}

/// Commands the controller issues to the renderer.
pub trait GraphRenderer {
	/// Replace everything currently drawn.
	fn set_data(&mut self, nodes: &[GraphNode], edges: &[GraphEdge]);
	/// Global physics switch. Edges whose style disables physics stay disabled.
	fn set_physics(&mut self, enabled: bool);
	/// Select `ids`; with `focus` the edges touching them are emphasised too.
	fn select_nodes(&mut self, ids: &[String], focus: bool);
	fn unselect_all(&mut self);
	/// Animate the viewport onto `ids`, or onto every node when `ids` is empty.
	fn fit(&mut self, ids: &[String], animation: FitAnimation);
}
