use thiserror::Error;
use wasm_bindgen::JsValue;

#[derive(Debug, Error)]
pub enum TopologyError {
	#[error("browser window is not available")]
	NoWindow,
	#[error("request failed: {0}")]
	Transport(String),
	#[error("{url} answered with HTTP {status}")]
	Status { status: u16, url: String },
	#[error("malformed device list: {0}")]
	Decode(#[from] serde_json::Error),
}

impl TopologyError {
	pub(crate) fn transport(value: JsValue) -> Self {
		Self::Transport(
			value
				.as_string()
				.unwrap_or_else(|| format!("{value:?}")),
		)
	}
}
