use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData};

use super::types::{EdgeInfo, NodeInfo};
use crate::config::EngineConfig;
use crate::topology::{Easing, FitAnimation, GraphEdge, GraphNode, GraphRenderer};

pub const NODE_RADIUS: f64 = 8.0;
pub const HIT_RADIUS: f64 = 14.0;
pub const MIN_ZOOM: f64 = 0.1;
pub const MAX_ZOOM: f64 = 10.0;
/// Pointer travel, in screen pixels, after which a press no longer counts as a click.
const CLICK_SLOP: f64 = 4.0;
const LAYOUT_RADIUS: f64 = 150.0;

#[derive(Clone, Debug, PartialEq)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub moved: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub moved: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<DefaultNodeIdx>,
	pub neighbors: HashSet<DefaultNodeIdx>,
	pub highlight_t: f64,
	pub prev_node: Option<DefaultNodeIdx>,
	pub prev_neighbors: HashSet<DefaultNodeIdx>,
	delay_t: f64,
}

#[derive(Clone, Debug, Default)]
pub struct SelectionState {
	pub nodes: HashSet<DefaultNodeIdx>,
	/// Emphasise edges touching the selection.
	pub focus: bool,
}

#[derive(Clone, Debug)]
struct ViewAnimation {
	from: ViewTransform,
	to: ViewTransform,
	elapsed_ms: f64,
	duration_ms: f64,
	easing: Easing,
}

impl ViewAnimation {
	/// Advance by `dt_ms` and return the transform to show plus whether the animation ended.
	fn advance(&mut self, dt_ms: f64) -> (ViewTransform, bool) {
		self.elapsed_ms += dt_ms;
		let t = if self.duration_ms <= 0.0 {
			1.0
		} else {
			(self.elapsed_ms / self.duration_ms).min(1.0)
		};
		if t >= 1.0 {
			return (self.to.clone(), true);
		}
		let e = self.easing.apply(t);
		let lerp = |a: f64, b: f64| a + (b - a) * e;
		(
			ViewTransform {
				x: lerp(self.from.x, self.to.x),
				y: lerp(self.from.y, self.to.y),
				k: lerp(self.from.k, self.to.k),
			},
			false,
		)
	}
}

#[derive(Clone, Copy, Debug)]
struct Bounds {
	min_x: f64,
	min_y: f64,
	max_x: f64,
	max_y: f64,
}

impl Bounds {
	fn point(x: f64, y: f64) -> Self {
		Self {
			min_x: x,
			min_y: y,
			max_x: x,
			max_y: y,
		}
	}

	fn include(self, x: f64, y: f64) -> Self {
		Self {
			min_x: self.min_x.min(x),
			min_y: self.min_y.min(y),
			max_x: self.max_x.max(x),
			max_y: self.max_y.max(y),
		}
	}

	/// Transform that centres the box on a `width` x `height` viewport.
	fn fitted(self, width: f64, height: f64, margin: f64, max_zoom: f64) -> ViewTransform {
		let pad = 4.0 * NODE_RADIUS;
		let (bw, bh) = (self.max_x - self.min_x + pad, self.max_y - self.min_y + pad);
		let k = (margin * width / bw)
			.min(margin * height / bh)
			.clamp(MIN_ZOOM, max_zoom.max(MIN_ZOOM));
		let (cx, cy) = (
			(self.min_x + self.max_x) / 2.0,
			(self.min_y + self.max_y) / 2.0,
		);
		ViewTransform {
			x: width / 2.0 - cx * k,
			y: height / 2.0 - cy * k,
			k,
		}
	}
}

/// Counts calm ticks and fires once when the layout has come to rest.
#[derive(Clone, Debug, Default)]
struct Stability {
	calm_frames: u32,
	settled: bool,
}

impl Stability {
	fn observe(&mut self, movement: f64, threshold: f64, frames: u32) -> bool {
		if movement >= threshold {
			self.calm_frames = 0;
			self.settled = false;
			return false;
		}
		self.calm_frames = self.calm_frames.saturating_add(1);
		if self.settled || self.calm_frames < frames {
			return false;
		}
		self.settled = true;
		true
	}
}

pub struct ForceGraphState {
	pub graph: ForceGraph<NodeInfo, ()>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub selection: SelectionState,
	pub width: f64,
	pub height: f64,
	pub physics_enabled: bool,
	animation: Option<ViewAnimation>,
	stability: Stability,
	ids: HashMap<String, DefaultNodeIdx>,
	edges: Vec<EdgeInfo>,
	config: EngineConfig,
}

impl ForceGraphState {
	pub fn new(config: EngineConfig, width: f64, height: f64) -> Self {
		Self {
			graph: ForceGraph::new(config.simulation()),
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			selection: SelectionState::default(),
			width,
			height,
			physics_enabled: true,
			animation: None,
			stability: Stability::default(),
			ids: HashMap::new(),
			edges: Vec::new(),
			config,
		}
	}

	pub fn edges(&self) -> &[EdgeInfo] {
		&self.edges
	}

	pub fn node_positions(&self) -> HashMap<DefaultNodeIdx, (f64, f64)> {
		let mut positions = HashMap::new();
		self.graph.visit_nodes(|node| {
			positions.insert(node.index(), (node.x() as f64, node.y() as f64));
		});
		positions
	}

	fn positions_by_id(&self) -> HashMap<String, (f64, f64)> {
		let mut positions = HashMap::new();
		self.graph.visit_nodes(|node| {
			positions.insert(
				node.data.user_data.id.clone(),
				(node.x() as f64, node.y() as f64),
			);
		});
		positions
	}

	pub fn node_id(&self, idx: DefaultNodeIdx) -> Option<String> {
		let mut id = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				id = Some(node.data.user_data.id.clone());
			}
		});
		id
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = (node.x() as f64 - gx, node.y() as f64 - gy);
			// HIT_RADIUS is in world-space, scales with zoom like nodes
			if (dx * dx + dy * dy).sqrt() < HIT_RADIUS {
				found = Some(node.index());
			}
		});
		found
	}

	/// Ids of the nodes under a screen position, as reported in click events.
	pub fn ids_at(&self, sx: f64, sy: f64) -> Vec<String> {
		self.node_at_position(sx, sy)
			.and_then(|idx| self.node_id(idx))
			.into_iter()
			.collect()
	}

	pub fn press(&mut self, x: f64, y: f64) {
		self.drag.moved = false;
		self.pan.moved = false;
		if let Some(idx) = self.node_at_position(x, y) {
			self.drag.active = true;
			self.drag.node_idx = Some(idx);
			self.drag.start_x = x;
			self.drag.start_y = y;
			let drag = &mut self.drag;
			self.graph.visit_nodes(|node| {
				if node.index() == idx {
					drag.node_start_x = node.x();
					drag.node_start_y = node.y();
				}
			});
		} else {
			self.pan.active = true;
			self.pan.start_x = x;
			self.pan.start_y = y;
			self.pan.transform_start_x = self.transform.x;
			self.pan.transform_start_y = self.transform.y;
		}
	}

	pub fn drag_to(&mut self, x: f64, y: f64) {
		if !self.drag.active {
			let hovered = self.node_at_position(x, y);
			self.set_hover(hovered);
		}

		if self.drag.active {
			let Some(idx) = self.drag.node_idx else {
				return;
			};
			let (dx, dy) = (x - self.drag.start_x, y - self.drag.start_y);
			if dx.hypot(dy) > CLICK_SLOP {
				self.drag.moved = true;
			}
			let (nx, ny) = (
				self.drag.node_start_x + (dx / self.transform.k) as f32,
				self.drag.node_start_y + (dy / self.transform.k) as f32,
			);
			self.graph.visit_nodes_mut(|node| {
				if node.index() == idx {
					node.data.x = nx;
					node.data.y = ny;
					node.data.is_anchor = true;
				}
			});
			self.stability = Stability::default();
		} else if self.pan.active {
			let (dx, dy) = (x - self.pan.start_x, y - self.pan.start_y);
			if dx.hypot(dy) > CLICK_SLOP {
				self.pan.moved = true;
				self.animation = None;
			}
			self.transform.x = self.pan.transform_start_x + dx;
			self.transform.y = self.pan.transform_start_y + dy;
		}
	}

	pub fn release(&mut self) {
		if let (true, Some(idx)) = (self.drag.active, self.drag.node_idx) {
			self.graph.visit_nodes_mut(|node| {
				if node.index() == idx {
					node.data.is_anchor = node.data.user_data.fixed;
				}
			});
		}
		self.drag.active = false;
		self.drag.node_idx = None;
		self.pan.active = false;
	}

	pub fn leave(&mut self) {
		self.release();
		self.set_hover(None);
	}

	/// A press that turned into a drag or pan does not produce a click.
	pub fn click_suppressed(&self) -> bool {
		self.drag.moved || self.pan.moved
	}

	pub fn zoom_at(&mut self, x: f64, y: f64, delta_y: f64) {
		self.animation = None;
		let factor = if delta_y > 0.0 { 0.9 } else { 1.1 };
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = x - (x - self.transform.x) * ratio;
		self.transform.y = y - (y - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Save previous state for fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		self.hover.neighbors.clear();

		if let Some(idx) = node {
			if !was_hovering {
				self.hover.delay_t = 0.0;
			}
			for edge in &self.edges {
				if edge.from == idx {
					self.hover.neighbors.insert(edge.to);
				} else if edge.to == idx {
					self.hover.neighbors.insert(edge.from);
				}
			}
		}
	}

	pub fn is_highlighted(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	pub fn is_selected(&self, idx: DefaultNodeIdx) -> bool {
		self.selection.nodes.contains(&idx)
	}

	pub fn is_focused_edge(&self, edge: &EdgeInfo) -> bool {
		self.selection.focus && (self.is_selected(edge.from) || self.is_selected(edge.to))
	}

	pub fn is_animating_view(&self) -> bool {
		self.animation.is_some()
	}

	/// Advance one frame. Returns `true` on the tick the layout comes to rest.
	pub fn tick(&mut self, dt: f32) -> bool {
		self.advance_view(dt as f64 * 1000.0);
		self.advance_hover(dt as f64);

		if !self.physics_enabled {
			return false;
		}
		let before = self.node_positions();
		self.graph.update(dt);
		self.apply_gravity(dt);

		let mut movement = 0.0_f64;
		self.graph.visit_nodes(|node| {
			if let Some(&(x, y)) = before.get(&node.index()) {
				movement = movement.max((node.x() as f64 - x).hypot(node.y() as f64 - y));
			}
		});
		self.stability.observe(
			movement,
			self.config.stable_threshold as f64,
			self.config.stable_frames,
		)
	}

	fn advance_view(&mut self, dt_ms: f64) {
		let Some(animation) = self.animation.as_mut() else {
			return;
		};
		let (transform, finished) = animation.advance(dt_ms);
		self.transform = transform;
		if finished {
			self.animation = None;
		}
	}

	fn advance_hover(&mut self, dt: f64) {
		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	/// Edges never pull nodes together, so movable nodes drift toward the origin instead of
	/// being pushed apart forever.
	fn apply_gravity(&mut self, dt: f32) {
		let pull = (self.config.central_gravity * dt).clamp(0.0, 1.0);
		self.graph.visit_nodes_mut(|node| {
			if !node.data.is_anchor {
				node.data.x -= node.data.x * pull;
				node.data.y -= node.data.y * pull;
			}
		});
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}

impl GraphRenderer for ForceGraphState {
	fn set_data(&mut self, nodes: &[GraphNode], edges: &[GraphEdge]) {
		let previous = self.positions_by_id();
		let mut graph = ForceGraph::new(self.config.simulation());
		let mut ids = HashMap::with_capacity(nodes.len());

		let movable = nodes.iter().filter(|n| !n.fixed).count().max(1);
		let (mut ring_slot, mut fixed_slot) = (0_usize, 0_usize);
		for node in nodes {
			let (x, y) = match previous.get(&node.id) {
				Some(&position) => position,
				None if node.fixed => {
					fixed_slot += 1;
					((fixed_slot - 1) as f64 * 4.0 * NODE_RADIUS, 0.0)
				}
				None => {
					let angle = ring_slot as f64 * 2.0 * PI / movable as f64;
					ring_slot += 1;
					(LAYOUT_RADIUS * angle.cos(), LAYOUT_RADIUS * angle.sin())
				}
			};

			let idx = graph.add_node(NodeData {
				x: x as f32,
				y: y as f32,
				mass: node.mass as f32,
				is_anchor: node.fixed,
				user_data: NodeInfo::from_node(node),
			});
			ids.insert(node.id.clone(), idx);
		}

		let mut links = Vec::with_capacity(edges.len());
		for edge in edges {
			let (Some(&from), Some(&to)) = (ids.get(&edge.from), ids.get(&edge.to)) else {
				continue;
			};
			if edge.style.physics {
				graph.add_edge(from, to, EdgeData::default());
			}
			links.push(EdgeInfo::from_edge(edge, from, to));
		}

		self.graph = graph;
		self.ids = ids;
		self.edges = links;
		self.hover = HoverState::default();
		self.selection = SelectionState::default();
		self.drag = DragState::default();
		self.stability = Stability::default();
	}

	fn set_physics(&mut self, enabled: bool) {
		self.physics_enabled = enabled;
		if enabled {
			self.stability = Stability::default();
		}
	}

	fn select_nodes(&mut self, ids: &[String], focus: bool) {
		self.selection = SelectionState {
			nodes: ids
				.iter()
				.filter_map(|id| self.ids.get(id).copied())
				.collect(),
			focus,
		};
	}

	fn unselect_all(&mut self) {
		self.selection = SelectionState::default();
	}

	fn fit(&mut self, ids: &[String], animation: FitAnimation) {
		let wanted: Option<HashSet<DefaultNodeIdx>> = if ids.is_empty() {
			None
		} else {
			Some(ids.iter().filter_map(|id| self.ids.get(id).copied()).collect())
		};

		let mut bounds: Option<Bounds> = None;
		self.graph.visit_nodes(|node| {
			if wanted.as_ref().is_some_and(|w| !w.contains(&node.index())) {
				return;
			}
			let (x, y) = (node.x() as f64, node.y() as f64);
			bounds = Some(match bounds {
				Some(b) => b.include(x, y),
				None => Bounds::point(x, y),
			});
		});
		let Some(bounds) = bounds else {
			return;
		};

		let to = bounds.fitted(
			self.width,
			self.height,
			self.config.fit_margin,
			self.config.fit_max_zoom,
		);
		self.animation = Some(ViewAnimation {
			from: self.transform.clone(),
			to,
			elapsed_ms: 0.0,
			duration_ms: animation.duration_ms as f64,
			easing: animation.easing,
		});
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::topology::quality::classify;
	use crate::topology::{GraphEdge, GraphNode, NodeShape};

	fn node(id: &str, fixed: bool) -> GraphNode {
		GraphNode {
			id: id.into(),
			label: format!("<b>IEEE: </b>{id}"),
			shape: if fixed { NodeShape::Box } else { NodeShape::Circle },
			mass: if fixed { 2.0 } else { 5.0 },
			fixed,
			color: "#66FF99",
		}
	}

	fn edge(from: &str, to: &str) -> GraphEdge {
		GraphEdge {
			from: from.into(),
			to: to.into(),
			label: "200".into(),
			quality: 200.0,
			style: classify(200.0),
			arrow_from: false,
			dashes: false,
		}
	}

	fn state() -> ForceGraphState {
		ForceGraphState::new(EngineConfig::default(), 800.0, 600.0)
	}

	fn position_of(state: &ForceGraphState, id: &str) -> (f64, f64) {
		state.positions_by_id()[id]
	}

	const INSTANT: FitAnimation = FitAnimation {
		duration_ms: 0,
		easing: Easing::EaseOutQuad,
	};

	#[test]
	fn drops_edges_to_unknown_nodes() {
		let mut state = state();
		state.set_data(
			&[node("c", true), node("r", false)],
			&[edge("c", "r"), edge("r", "ghost")],
		);

		assert_eq!(state.edges().len(), 1);
		assert_eq!(state.node_positions().len(), 2);
	}

	#[test]
	fn fixed_node_is_anchored_at_origin() {
		let mut state = state();
		state.set_data(&[node("c", true)], &[]);
		for _ in 0..10 {
			state.tick(0.016);
		}
		assert_eq!(position_of(&state, "c"), (0.0, 0.0));
	}

	#[test]
	fn keeps_positions_across_set_data() {
		let mut state = state();
		state.set_data(&[node("c", true), node("r", false)], &[]);
		state.graph.visit_nodes_mut(|n| {
			if n.data.user_data.id == "r" {
				n.data.x = 42.0;
				n.data.y = -7.0;
			}
		});

		state.set_data(&[node("r", false), node("e", false)], &[]);

		assert_eq!(position_of(&state, "r"), (42.0, -7.0));
		assert!(state.ids.contains_key("e"));
		assert!(!state.ids.contains_key("c"));
	}

	#[test]
	fn selection_ignores_unknown_ids() {
		let mut state = state();
		state.set_data(&[node("c", true), node("r", false)], &[edge("c", "r")]);
		state.select_nodes(&["r".into(), "nope".into()], true);

		let r = state.ids["r"];
		assert_eq!(state.selection.nodes.len(), 1);
		assert!(state.is_selected(r));
		assert!(state.is_focused_edge(&state.edges()[0]));

		state.unselect_all();
		assert!(state.selection.nodes.is_empty());
		assert!(!state.is_focused_edge(&state.edges()[0]));
	}

	#[test]
	fn fit_single_node_centres_it() {
		let mut state = state();
		state.set_data(&[node("c", true)], &[]);
		state.fit(&["c".into()], INSTANT);
		state.tick(0.016);

		assert_eq!(
			state.transform,
			ViewTransform {
				x: 400.0,
				y: 300.0,
				k: 2.5,
			}
		);
		assert!(!state.is_animating_view());
	}

	#[test]
	fn fit_animates_over_duration() {
		let mut state = state();
		state.set_data(&[node("c", true)], &[]);
		state.fit(
			&["c".into()],
			FitAnimation {
				duration_ms: 500,
				easing: Easing::EaseInQuad,
			},
		);

		state.tick(0.25);
		assert!(state.is_animating_view());
		assert!(state.transform.k > 1.0 && state.transform.k < 2.5);

		state.tick(0.3);
		assert!(!state.is_animating_view());
		assert_eq!(state.transform.k, 2.5);
	}

	#[test]
	fn fit_to_unknown_nodes_is_a_no_op() {
		let mut state = state();
		state.set_data(&[node("c", true)], &[]);
		state.fit(&["missing".into()], INSTANT);
		assert!(!state.is_animating_view());
	}

	#[test]
	fn user_zoom_cancels_fit() {
		let mut state = state();
		state.set_data(&[node("c", true)], &[]);
		state.fit(&[], INSTANT);
		state.zoom_at(10.0, 10.0, 1.0);
		assert!(!state.is_animating_view());
	}

	#[test]
	fn reports_stabilized_once() {
		let mut state = state();
		state.set_data(&[node("c", true)], &[]);
		let frames = EngineConfig::default().stable_frames;

		let fired: Vec<bool> = (0..frames + 10).map(|_| state.tick(0.016)).collect();
		assert_eq!(fired.iter().filter(|&&f| f).count(), 1);
		assert!(fired[frames as usize - 1]);

		state.set_physics(false);
		state.set_physics(true);
		let again = (0..frames).filter(|_| state.tick(0.016)).count();
		assert_eq!(again, 1);
	}

	#[test]
	fn no_stabilization_without_physics() {
		let mut state = state();
		state.set_data(&[node("c", true)], &[]);
		state.set_physics(false);
		assert!((0..100).all(|_| !state.tick(0.016)));
	}

	#[test]
	fn drag_suppresses_click_and_restores_anchor() {
		let mut state = state();
		state.set_data(&[node("c", true), node("r", false)], &[]);
		let r = state.ids["r"];
		let (rx, ry) = position_of(&state, "r");
		let (sx, sy) = (rx + state.transform.x, ry + state.transform.y);

		state.press(sx, sy);
		assert_eq!(state.drag.node_idx, Some(r));
		state.drag_to(sx + 30.0, sy);
		state.release();

		assert!(state.click_suppressed());
		let mut anchored = true;
		state.graph.visit_nodes(|n| {
			if n.index() == r {
				anchored = n.data.is_anchor;
			}
		});
		assert!(!anchored);
		assert_eq!(position_of(&state, "r").0, rx + 30.0);

		state.press(sx + 30.0, sy);
		state.release();
		assert!(!state.click_suppressed());
		assert_eq!(state.ids_at(sx + 30.0, sy), vec!["r".to_string()]);
	}

	#[test]
	fn hover_collects_neighbours() {
		let mut state = state();
		state.set_data(
			&[node("c", true), node("r", false), node("e", false)],
			&[edge("c", "r")],
		);
		let (c, r, e) = (state.ids["c"], state.ids["r"], state.ids["e"]);

		state.set_hover(Some(c));
		assert!(state.is_highlighted(r));
		assert!(!state.is_highlighted(e));
	}
}
