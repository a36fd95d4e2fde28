//! Zigbee mesh topology map: device list in, interactive force-directed canvas out.

use leptos::prelude::*;
use leptos_meta::*;
use leptos_router::components::*;
use leptos_router::path;
use log::{Level, info};

pub mod components;
pub mod config;
mod pages;
pub mod topology;

use crate::pages::device::DeviceDetail;
use crate::pages::not_found::NotFound;
use crate::pages::visualization::NetworkVisualization;

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("Logging initialized");
}

/// Routes the network map, device detail pages and 404's
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />

		<Title text="Zigbee network" />

		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<Router>
			<Routes fallback=|| view! { <NotFound /> }>
				<Route path=path!("/") view=NetworkVisualization />
				<Route path=path!("/config/devices/device/:device_id") view=DeviceDetail />
			</Routes>
		</Router>
	}
}
