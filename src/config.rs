//! Runtime configuration, read from an optional inline JSON block in the host page.

use force_graph::SimulationParameters;
use log::warn;
use serde::Deserialize;

/// Id of the `<script type="application/json">` element holding the configuration.
pub const CONFIG_ELEMENT_ID: &str = "mesh-topology-config";

#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct VisualizationConfig {
	/// Prefix for backend endpoints; empty means same origin.
	pub api_base: String,
	pub fit_duration_ms: u32,
	pub auto_zoom: bool,
	pub physics: bool,
	pub engine: EngineConfig,
}

impl Default for VisualizationConfig {
	fn default() -> Self {
		Self {
			api_base: String::new(),
			fit_duration_ms: 500,
			auto_zoom: true,
			physics: true,
			engine: EngineConfig::default(),
		}
	}
}

/// Tuning for the canvas engine.
#[derive(Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
	pub force_charge: f32,
	pub force_spring: f32,
	pub force_max: f32,
	pub node_speed: f32,
	pub damping_factor: f32,
	/// Pull of every movable node toward the origin, per second.
	pub central_gravity: f32,
	/// Largest per-tick movement that still counts as "at rest".
	pub stable_threshold: f32,
	/// Consecutive calm ticks before the layout is reported as stabilized.
	pub stable_frames: u32,
	/// Share of the viewport a fitted bounding box may fill.
	pub fit_margin: f64,
	pub fit_max_zoom: f64,
}

impl Default for EngineConfig {
	fn default() -> Self {
		Self {
			force_charge: 150.0,
			force_spring: 0.05,
			force_max: 100.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
			central_gravity: 0.3,
			stable_threshold: 0.05,
			stable_frames: 30,
			fit_margin: 0.9,
			fit_max_zoom: 2.5,
		}
	}
}

impl EngineConfig {
	pub fn simulation(&self) -> SimulationParameters {
		SimulationParameters {
			force_charge: self.force_charge,
			force_spring: self.force_spring,
			force_max: self.force_max,
			node_speed: self.node_speed,
			damping_factor: self.damping_factor,
		}
	}
}

impl VisualizationConfig {
	pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
		serde_json::from_str(text)
	}

	/// Read the page's configuration block, falling back to defaults when it is absent or bad.
	pub fn from_document() -> Self {
		let text = web_sys::window()
			.and_then(|window| window.document())
			.and_then(|document| document.get_element_by_id(CONFIG_ELEMENT_ID))
			.and_then(|element| element.text_content());
		let Some(text) = text else {
			return Self::default();
		};
		Self::from_json(&text).unwrap_or_else(|err| {
			warn!("ignoring invalid #{CONFIG_ELEMENT_ID}: {err}");
			Self::default()
		})
	}
}
