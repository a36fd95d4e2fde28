use leptos::prelude::*;
use leptos_router::components::A;
use leptos_router::hooks::use_params_map;

/// Landing view for a double-clicked device.
#[component]
pub fn DeviceDetail() -> impl IntoView {
	let params = use_params_map();
	let device_id = move || params.read().get("device_id").unwrap_or_default();

	view! {
		<div class="device-detail">
			<h1>"Device " {device_id}</h1>
			<A href=move || format!("/?zoom={}", device_id())>"Show on the network map"</A>
		</div>
	}
}
