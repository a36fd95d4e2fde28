use std::cell::RefCell;
use std::rc::Rc;

use super::state::ForceGraphState;
use crate::config::EngineConfig;
use crate::topology::{FitAnimation, GraphEdge, GraphNode, GraphRenderer, RendererEvent};

/// Receives clicks, double-clicks and stabilization from the canvas.
pub type EventHandler = Rc<dyn Fn(RendererEvent)>;

/// Shared handle to the canvas simulation.
///
/// Commands borrow the state only for their own duration; events are delivered after the
/// borrow is released, so a handler may issue commands straight back.
#[derive(Clone)]
pub struct CanvasEngine {
	state: Rc<RefCell<ForceGraphState>>,
	handler: Rc<RefCell<Option<EventHandler>>>,
}

impl CanvasEngine {
	pub fn new(config: EngineConfig) -> Self {
		Self {
			state: Rc::new(RefCell::new(ForceGraphState::new(config, 800.0, 600.0))),
			handler: Rc::new(RefCell::new(None)),
		}
	}

	/// Register the event handler. A later call replaces the earlier one.
	pub fn subscribe(&self, handler: EventHandler) {
		*self.handler.borrow_mut() = Some(handler);
	}

	pub(super) fn emit(&self, event: RendererEvent) {
		let handler = self.handler.borrow().clone();
		if let Some(handler) = handler {
			handler(event);
		}
	}

	pub(super) fn state(&self) -> &RefCell<ForceGraphState> {
		&self.state
	}
}

impl GraphRenderer for CanvasEngine {
	fn set_data(&mut self, nodes: &[GraphNode], edges: &[GraphEdge]) {
		self.state.borrow_mut().set_data(nodes, edges);
	}

	fn set_physics(&mut self, enabled: bool) {
		self.state.borrow_mut().set_physics(enabled);
	}

	fn select_nodes(&mut self, ids: &[String], focus: bool) {
		self.state.borrow_mut().select_nodes(ids, focus);
	}

	fn unselect_all(&mut self) {
		self.state.borrow_mut().unselect_all();
	}

	fn fit(&mut self, ids: &[String], animation: FitAnimation) {
		self.state.borrow_mut().fit(ids, animation);
	}
}
