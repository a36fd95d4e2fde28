use std::cell::RefCell;
use std::rc::{Rc, Weak};

use leptos::ev::{Event, MouseEvent};
use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_router::hooks::{use_navigate, use_query_map};
use log::{error, info};

use crate::components::force_graph::{CanvasEngine, ForceGraphCanvas};
use crate::config::VisualizationConfig;
use crate::topology::{
	HttpDeviceSource, InteractionController, RendererEvent, ViewState, load_devices,
	refresh_topology,
};

type Controller = InteractionController<CanvasEngine>;

/// Form state mirrored from the controller after every operation.
#[derive(Clone, Copy)]
struct ViewSignals {
	filter: RwSignal<String>,
	zoom_target: RwSignal<String>,
	auto_zoom: RwSignal<bool>,
	physics: RwSignal<bool>,
	picker: RwSignal<Vec<(String, String)>>,
}

impl ViewSignals {
	fn new(view: &ViewState) -> Self {
		let signals = Self {
			filter: RwSignal::new(String::new()),
			zoom_target: RwSignal::new(String::new()),
			auto_zoom: RwSignal::new(true),
			physics: RwSignal::new(true),
			picker: RwSignal::new(Vec::new()),
		};
		signals.sync(view);
		signals
	}

	fn sync(&self, view: &ViewState) {
		self.filter.set(view.filter.clone().unwrap_or_default());
		self.zoom_target.set(view.zoom_target.clone().unwrap_or_default());
		self.auto_zoom.set(view.auto_zoom);
		self.physics.set(view.physics_enabled);
	}
}

/// Full-screen map of the Zigbee mesh with search, zoom and refresh controls.
#[component]
pub fn NetworkVisualization() -> impl IntoView {
	let config = VisualizationConfig::from_document();
	let query = use_query_map();
	let navigate = use_navigate();

	let view_state = ViewState {
		zoom_target: query.get_untracked().get("zoom").filter(|id| !id.is_empty()),
		physics_enabled: config.physics,
		auto_zoom: config.auto_zoom,
		..ViewState::default()
	};
	let signals = ViewSignals::new(&view_state);
	let loading = RwSignal::new(false);
	let failure = RwSignal::new(None::<String>);

	let engine = CanvasEngine::new(config.engine.clone());
	let source = Rc::new(HttpDeviceSource::new(config.api_base.clone()));
	let controller: Rc<RefCell<Controller>> = Rc::new(RefCell::new(
		InteractionController::new(engine.clone(), view_state)
			.with_fit_duration(config.fit_duration_ms),
	));
	controller.borrow_mut().set_physics(config.physics);

	let weak: Weak<RefCell<Controller>> = Rc::downgrade(&controller);
	engine.subscribe(Rc::new(move |event: RendererEvent| {
		let Some(controller) = weak.upgrade() else {
			return;
		};
		let request = {
			let mut controller = controller.borrow_mut();
			let request = controller.handle_event(event);
			signals.sync(controller.view());
			request
		};
		if let Some(request) = request {
			info!("opening device {}", request.device_reg_id);
			navigate(&request.path(), Default::default());
		}
	}));

	let fetch = {
		let (controller, source) = (controller.clone(), source.clone());
		Rc::new(move |rescan: bool| {
			let (controller, source) = (controller.clone(), source.clone());
			loading.set(true);
			spawn_local(async move {
				let result = if rescan {
					refresh_topology(source.as_ref(), &controller).await
				} else {
					load_devices(source.as_ref(), &controller).await
				};
				match result {
					Ok(true) => {
						let controller = controller.borrow();
						signals.picker.set(controller.snapshot().index.picker_entries());
						signals.sync(controller.view());
						failure.set(None);
					}
					Ok(false) => {}
					Err(err) => {
						error!("loading the topology failed: {err}");
						failure.set(Some(err.to_string()));
					}
				}
				loading.set(false);
			});
		})
	};
	fetch(false);

	let controller_filter = controller.clone();
	let on_filter = move |ev: Event| {
		let text = event_target_value(&ev);
		let mut controller = controller_filter.borrow_mut();
		controller.set_filter(&text);
		signals.sync(controller.view());
	};

	let controller_zoom = controller.clone();
	let on_zoom = move |ev: Event| {
		let target = event_target_value(&ev);
		let mut controller = controller_zoom.borrow_mut();
		controller.zoom_to_device(Some(target.as_str()));
		signals.sync(controller.view());
	};

	let controller_auto = controller.clone();
	let on_auto_zoom = move |ev: Event| {
		let mut controller = controller_auto.borrow_mut();
		controller.set_auto_zoom(event_target_checked(&ev));
		signals.sync(controller.view());
	};

	let controller_physics = controller;
	let on_physics = move |_: MouseEvent| {
		let mut controller = controller_physics.borrow_mut();
		let enabled = controller.toggle_physics();
		info!("physics {}", if enabled { "enabled" } else { "disabled" });
		signals.sync(controller.view());
	};

	let on_refresh = move |_: MouseEvent| fetch(true);

	view! {
		<div class="fullscreen-graph">
			<ForceGraphCanvas engine=engine fullscreen=true />
			<div class="graph-overlay">
				<h1>"Zigbee network"</h1>
				<div class="graph-controls">
					<input
						type="search"
						placeholder="Search devices"
						prop:value=move || signals.filter.get()
						on:input=on_filter
					/>
					<select prop:value=move || signals.zoom_target.get() on:change=on_zoom>
						<option value="">"Whole network"</option>
						<For
							each=move || signals.picker.get()
							key=|(id, _)| id.clone()
							children=move |(id, name): (String, String)| {
								let selected = id.clone();
								view! {
									<option
										value=id
										selected=move || signals.zoom_target.get() == selected
									>
										{name}
									</option>
								}
							}
						/>
					</select>
					<label>
						<input
							type="checkbox"
							prop:checked=move || signals.auto_zoom.get()
							on:change=on_auto_zoom
						/>
						"Auto zoom"
					</label>
					<button on:click=on_physics>
						{move || if signals.physics.get() { "Freeze layout" } else { "Resume layout" }}
					</button>
					<button on:click=on_refresh disabled=move || loading.get()>
						{move || if loading.get() { "Scanning..." } else { "Refresh topology" }}
					</button>
				</div>
				<Show when=move || failure.get().is_some()>
					<p class="graph-error">
						{move || failure.get().unwrap_or_default()}
						<button on:click=move |_| failure.set(None)>"Dismiss"</button>
					</p>
				</Show>
				<p class="subtitle">
					"Click a device to zoom in. Double-click to open it. Scroll to zoom, drag to pan."
				</p>
			</div>
		</div>
	}
}
