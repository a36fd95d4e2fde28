//! Transient view state and the translation of user intent into renderer commands.

use std::cell::RefCell;

use log::{debug, info, warn};

use super::device::Device;
use super::error::TopologyError;
use super::renderer::{Easing, FitAnimation, GraphRenderer, RendererEvent};
use super::snapshot::TopologySnapshot;
use super::source::DeviceSource;

pub const DEFAULT_FIT_DURATION_MS: u32 = 500;

/// Interaction state that survives data refreshes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ViewState {
	pub filter: Option<String>,
	/// Registry id of the device the view is zoomed onto.
	pub zoom_target: Option<String>,
	pub physics_enabled: bool,
	pub auto_zoom: bool,
}

impl Default for ViewState {
	fn default() -> Self {
		Self {
			filter: None,
			zoom_target: None,
			physics_enabled: true,
			auto_zoom: true,
		}
	}
}

/// Request for the host application to open a device's detail view.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NavigationRequest {
	pub device_reg_id: String,
}

impl NavigationRequest {
	pub fn path(&self) -> String {
		format!("/config/devices/device/{}", self.device_reg_id)
	}
}

/// Issued when a fetch starts; responses carrying an outdated ticket are dropped.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct FetchTicket(u64);

pub struct InteractionController<R> {
	renderer: R,
	snapshot: TopologySnapshot,
	view: ViewState,
	fit_duration_ms: u32,
	issued: u64,
	applied: u64,
}

impl<R: GraphRenderer> InteractionController<R> {
	pub fn new(renderer: R, view: ViewState) -> Self {
		Self {
			renderer,
			snapshot: TopologySnapshot::default(),
			view,
			fit_duration_ms: DEFAULT_FIT_DURATION_MS,
			issued: 0,
			applied: 0,
		}
	}

	pub fn with_fit_duration(mut self, duration_ms: u32) -> Self {
		self.fit_duration_ms = duration_ms;
		self
	}

	pub fn view(&self) -> &ViewState {
		&self.view
	}

	pub fn snapshot(&self) -> &TopologySnapshot {
		&self.snapshot
	}

	pub fn renderer(&self) -> &R {
		&self.renderer
	}

	pub fn begin_fetch(&mut self) -> FetchTicket {
		self.issued += 1;
		FetchTicket(self.issued)
	}

	/// Rebuild the index and graph from `devices` and push them to the renderer.
	///
	/// Returns `false` when a newer fetch has already been applied and `devices` was dropped.
	pub fn apply_devices(&mut self, ticket: FetchTicket, devices: Vec<Device>) -> bool {
		if ticket.0 <= self.applied {
			warn!(
				"discarding stale device list (fetch {} after {})",
				ticket.0, self.applied
			);
			return false;
		}
		self.applied = ticket.0;

		let snapshot = TopologySnapshot::from_devices(devices);
		info!(
			"topology rebuilt: {} devices, {} links",
			snapshot.graph.nodes.len(),
			snapshot.graph.edges.len()
		);
		self.renderer
			.set_data(&snapshot.graph.nodes, &snapshot.graph.edges);
		self.snapshot = snapshot;
		true
	}

	pub fn set_filter(&mut self, text: &str) {
		if text.is_empty() {
			self.view.filter = None;
			self.renderer.unselect_all();
			return;
		}

		let matches = self.snapshot.graph.matching_nodes(text);
		debug!("filter {text:?} matched {} nodes", matches.len());
		self.view.filter = Some(text.to_string());
		self.view.zoom_target = None;
		self.zoom_out();
		self.renderer.select_nodes(&matches, true);
	}

	/// Zoom onto the device with `registry_id`, or out to the whole mesh for `None`.
	pub fn zoom_to_device(&mut self, registry_id: Option<&str>) {
		self.view.zoom_target = registry_id.filter(|id| !id.is_empty()).map(str::to_string);
		self.zoom_to_target();
	}

	pub fn set_auto_zoom(&mut self, enabled: bool) {
		self.view.auto_zoom = enabled;
	}

	/// Flip the global physics switch and return the new state.
	pub fn toggle_physics(&mut self) -> bool {
		self.set_physics(!self.view.physics_enabled);
		self.view.physics_enabled
	}

	pub fn set_physics(&mut self, enabled: bool) {
		self.view.physics_enabled = enabled;
		self.renderer.set_physics(enabled);
	}

	pub fn handle_event(&mut self, event: RendererEvent) -> Option<NavigationRequest> {
		match event {
			RendererEvent::Click(ids) => {
				if !self.view.auto_zoom {
					return None;
				}
				let registry_id = self.registry_id_for(&ids)?;
				self.view.zoom_target = Some(registry_id);
				self.zoom_to_target();
				None
			}
			RendererEvent::DoubleClick(ids) => {
				let device_reg_id = self.registry_id_for(&ids)?;
				Some(NavigationRequest { device_reg_id })
			}
			RendererEvent::Stabilized => {
				if self.view.zoom_target.is_some() {
					self.zoom_to_target();
				}
				None
			}
		}
	}

	fn registry_id_for(&self, ids: &[String]) -> Option<String> {
		let ieee = ids.first()?;
		let device = self.snapshot.index.by_ieee(ieee);
		if device.is_none() {
			debug!("ignoring event for unknown node {ieee}");
		}
		device.map(|d| d.device_reg_id.clone())
	}

	fn zoom_to_target(&mut self) {
		self.view.filter = None;
		let Some(registry_id) = &self.view.zoom_target else {
			self.zoom_out();
			return;
		};
		let Some(device) = self.snapshot.index.by_registry_id(registry_id) else {
			debug!("zoom target {registry_id} is not in the current device list");
			return;
		};
		let ids = [device.ieee.clone()];
		self.renderer.fit(
			&ids,
			FitAnimation {
				duration_ms: self.fit_duration_ms,
				easing: Easing::EaseInQuad,
			},
		);
	}

	fn zoom_out(&mut self) {
		self.renderer.fit(
			&[],
			FitAnimation {
				duration_ms: self.fit_duration_ms,
				easing: Easing::EaseOutQuad,
			},
		);
	}
}

/// Fetch the device list and rebuild the controller's model from it.
///
/// The controller is only borrowed around the fetch, never across it.
pub async fn load_devices<S, R>(
	source: &S,
	controller: &RefCell<InteractionController<R>>,
) -> Result<bool, TopologyError>
where
	S: DeviceSource,
	R: GraphRenderer,
{
	let ticket = controller.borrow_mut().begin_fetch();
	let devices = source.fetch_devices().await?;
	Ok(controller.borrow_mut().apply_devices(ticket, devices))
}

/// Have the backend rescan the mesh, then reload.
pub async fn refresh_topology<S, R>(
	source: &S,
	controller: &RefCell<InteractionController<R>>,
) -> Result<bool, TopologyError>
where
	S: DeviceSource,
	R: GraphRenderer,
{
	source.refresh_topology().await?;
	info!("topology scan finished, reloading devices");
	load_devices(source, controller).await
}

#[cfg(test)]
mod tests {
	use std::cell::Cell;

	use super::*;
	use crate::topology::device::{DeviceType, Relationship};
	use crate::topology::graph::{GraphEdge, GraphNode};
	use crate::topology::index::tests::{device, report};

	#[derive(Clone, Debug, PartialEq)]
	enum Command {
		SetData { nodes: usize, edges: usize },
		Physics(bool),
		Select(Vec<String>, bool),
		UnselectAll,
		Fit(Vec<String>, FitAnimation),
	}

	#[derive(Default)]
	struct Recorder {
		commands: Vec<Command>,
	}

	impl GraphRenderer for Recorder {
		fn set_data(&mut self, nodes: &[GraphNode], edges: &[GraphEdge]) {
			self.commands.push(Command::SetData {
				nodes: nodes.len(),
				edges: edges.len(),
			});
		}

		fn set_physics(&mut self, enabled: bool) {
			self.commands.push(Command::Physics(enabled));
		}

		fn select_nodes(&mut self, ids: &[String], focus: bool) {
			self.commands.push(Command::Select(ids.to_vec(), focus));
		}

		fn unselect_all(&mut self) {
			self.commands.push(Command::UnselectAll);
		}

		fn fit(&mut self, ids: &[String], animation: FitAnimation) {
			self.commands.push(Command::Fit(ids.to_vec(), animation));
		}
	}

	const ZOOM_IN: FitAnimation = FitAnimation {
		duration_ms: 500,
		easing: Easing::EaseInQuad,
	};
	const ZOOM_OUT: FitAnimation = FitAnimation {
		duration_ms: 500,
		easing: Easing::EaseOutQuad,
	};

	fn devices() -> Vec<Device> {
		let mut coordinator = device("c", "reg-c", DeviceType::Coordinator);
		coordinator.neighbors = vec![report("r", "150", Relationship::Sibling)];
		let mut router = device("r", "reg-r", DeviceType::Router);
		router.user_given_name = Some("Hall router".into());
		router.neighbors = vec![report("c", "200", Relationship::Sibling)];
		vec![coordinator, router]
	}

	fn loaded() -> InteractionController<Recorder> {
		let mut controller = InteractionController::new(Recorder::default(), ViewState::default());
		let ticket = controller.begin_fetch();
		assert!(controller.apply_devices(ticket, devices()));
		controller.renderer.commands.clear();
		controller
	}

	fn commands(controller: &InteractionController<Recorder>) -> &[Command] {
		&controller.renderer().commands
	}

	#[test]
	fn load_pushes_data() {
		let mut controller = InteractionController::new(Recorder::default(), ViewState::default());
		let ticket = controller.begin_fetch();
		controller.apply_devices(ticket, devices());

		assert_eq!(commands(&controller), [Command::SetData { nodes: 2, edges: 1 }]);
		assert_eq!(controller.snapshot().index.len(), 2);
	}

	#[test]
	fn stale_response_is_dropped() {
		let mut controller = InteractionController::new(Recorder::default(), ViewState::default());
		let first = controller.begin_fetch();
		let second = controller.begin_fetch();

		assert!(controller.apply_devices(second, devices()));
		assert!(!controller.apply_devices(first, Vec::new()));
		assert_eq!(controller.snapshot().index.len(), 2);
		assert_eq!(commands(&controller).len(), 1);
	}

	#[test]
	fn filter_selects_matches_and_zooms_out() {
		let mut controller = loaded();
		controller.zoom_to_device(Some("reg-c"));
		controller.renderer.commands.clear();

		controller.set_filter("HALL");

		assert_eq!(controller.view().filter.as_deref(), Some("HALL"));
		assert_eq!(controller.view().zoom_target, None);
		assert_eq!(
			commands(&controller),
			[
				Command::Fit(Vec::new(), ZOOM_OUT),
				Command::Select(vec!["r".into()], true),
			]
		);
	}

	#[test]
	fn filter_without_matches_still_clears_zoom() {
		let mut controller = loaded();
		controller.zoom_to_device(Some("reg-r"));
		controller.set_filter("garage");

		assert_eq!(controller.view().zoom_target, None);
		assert_eq!(
			commands(&controller).last(),
			Some(&Command::Select(Vec::new(), true))
		);
	}

	#[test]
	fn empty_filter_unselects() {
		let mut controller = loaded();
		controller.set_filter("hall");
		controller.renderer.commands.clear();

		controller.set_filter("");

		assert_eq!(controller.view().filter, None);
		assert_eq!(commands(&controller), [Command::UnselectAll]);
	}

	#[test]
	fn zoom_to_device_fits_node() {
		let mut controller = loaded();
		controller.set_filter("hall");
		controller.renderer.commands.clear();

		controller.zoom_to_device(Some("reg-r"));

		assert_eq!(controller.view().filter, None);
		assert_eq!(controller.view().zoom_target.as_deref(), Some("reg-r"));
		assert_eq!(commands(&controller), [Command::Fit(vec!["r".into()], ZOOM_IN)]);
	}

	#[test]
	fn zoom_to_nothing_fits_all() {
		let mut controller = loaded();
		controller.zoom_to_device(None);
		controller.zoom_to_device(Some(""));

		assert_eq!(controller.view().zoom_target, None);
		assert_eq!(
			commands(&controller),
			[Command::Fit(Vec::new(), ZOOM_OUT), Command::Fit(Vec::new(), ZOOM_OUT)]
		);
	}

	#[test]
	fn unknown_zoom_target_is_ignored() {
		let mut controller = loaded();
		controller.zoom_to_device(Some("gone"));

		assert_eq!(controller.view().zoom_target.as_deref(), Some("gone"));
		assert!(commands(&controller).is_empty());
	}

	#[test]
	fn click_zooms_when_auto_zoom_is_on() {
		let mut controller = loaded();
		let navigation = controller.handle_event(RendererEvent::Click(vec!["r".into()]));

		assert_eq!(navigation, None);
		assert_eq!(controller.view().zoom_target.as_deref(), Some("reg-r"));
		assert_eq!(commands(&controller), [Command::Fit(vec!["r".into()], ZOOM_IN)]);
	}

	#[test]
	fn click_ignored_without_auto_zoom_or_device() {
		let mut controller = loaded();
		controller.set_auto_zoom(false);
		controller.handle_event(RendererEvent::Click(vec!["r".into()]));
		controller.set_auto_zoom(true);
		controller.handle_event(RendererEvent::Click(vec!["unknown".into()]));
		controller.handle_event(RendererEvent::Click(Vec::new()));

		assert_eq!(controller.view().zoom_target, None);
		assert!(commands(&controller).is_empty());
	}

	#[test]
	fn double_click_requests_navigation() {
		let mut controller = loaded();
		let navigation = controller.handle_event(RendererEvent::DoubleClick(vec!["c".into()]));

		assert_eq!(
			navigation.as_ref().map(NavigationRequest::path).as_deref(),
			Some("/config/devices/device/reg-c")
		);
		assert_eq!(controller.view(), &ViewState::default());
		assert!(commands(&controller).is_empty());
		assert_eq!(
			controller.handle_event(RendererEvent::DoubleClick(vec!["x".into()])),
			None
		);
	}

	#[test]
	fn stabilized_reissues_pending_zoom() {
		let mut controller = loaded();
		controller.handle_event(RendererEvent::Stabilized);
		assert!(commands(&controller).is_empty());

		controller.zoom_to_device(Some("reg-c"));
		controller.handle_event(RendererEvent::Stabilized);
		assert_eq!(
			commands(&controller),
			[
				Command::Fit(vec!["c".into()], ZOOM_IN),
				Command::Fit(vec!["c".into()], ZOOM_IN),
			]
		);
	}

	#[test]
	fn physics_toggle() {
		let mut controller = loaded();
		assert!(!controller.toggle_physics());
		assert!(controller.toggle_physics());
		assert_eq!(
			commands(&controller),
			[Command::Physics(false), Command::Physics(true)]
		);
	}

	#[test]
	fn view_state_survives_reload() {
		let mut controller = loaded();
		controller.zoom_to_device(Some("reg-r"));
		controller.toggle_physics();
		let ticket = controller.begin_fetch();
		controller.apply_devices(ticket, devices());

		assert_eq!(controller.view().zoom_target.as_deref(), Some("reg-r"));
		assert!(!controller.view().physics_enabled);
	}

	struct FakeSource {
		devices: Vec<Device>,
		fail: bool,
		rescans: Cell<u32>,
	}

	impl DeviceSource for FakeSource {
		async fn fetch_devices(&self) -> Result<Vec<Device>, TopologyError> {
			if self.fail {
				return Err(TopologyError::Status {
					status: 503,
					url: "/api/zha/devices".into(),
				});
			}
			Ok(self.devices.clone())
		}

		async fn refresh_topology(&self) -> Result<(), TopologyError> {
			self.rescans.set(self.rescans.get() + 1);
			Ok(())
		}
	}

	#[test]
	fn refresh_rescans_then_reloads() {
		let source = FakeSource {
			devices: devices(),
			fail: false,
			rescans: Cell::new(0),
		};
		let controller = RefCell::new(InteractionController::new(
			Recorder::default(),
			ViewState::default(),
		));

		let applied = pollster::block_on(refresh_topology(&source, &controller)).unwrap();

		assert!(applied);
		assert_eq!(source.rescans.get(), 1);
		assert_eq!(controller.borrow().snapshot().graph.edges.len(), 1);
	}

	#[test]
	fn failed_fetch_keeps_previous_graph() {
		let controller = RefCell::new(loaded());
		let source = FakeSource {
			devices: Vec::new(),
			fail: true,
			rescans: Cell::new(0),
		};

		let outcome = pollster::block_on(load_devices(&source, &controller));

		assert!(matches!(outcome, Err(TopologyError::Status { status: 503, .. })));
		assert_eq!(controller.borrow().snapshot().index.len(), 2);
		assert!(commands(&controller.borrow()).is_empty());
	}
}
