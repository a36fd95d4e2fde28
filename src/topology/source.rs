use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, RequestMode, Response};

use super::device::Device;
use super::error::TopologyError;

/// Backend that knows the mesh devices and their neighbour tables.
#[allow(async_fn_in_trait)]
pub trait DeviceSource {
	async fn fetch_devices(&self) -> Result<Vec<Device>, TopologyError>;
	/// Ask the backend to rescan neighbour tables. Completion does not imply fresh data has
	/// been fetched.
	async fn refresh_topology(&self) -> Result<(), TopologyError>;
}

pub const DEVICES_PATH: &str = "/api/zha/devices";
pub const TOPOLOGY_UPDATE_PATH: &str = "/api/zha/topology/update";

/// [`DeviceSource`] backed by the browser's `fetch`.
#[derive(Clone, Debug)]
pub struct HttpDeviceSource {
	base_url: String,
}

impl HttpDeviceSource {
	pub fn new(base_url: impl Into<String>) -> Self {
		Self {
			base_url: base_url.into(),
		}
	}

	fn url(&self, path: &str) -> String {
		format!("{}{}", self.base_url.trim_end_matches('/'), path)
	}

	async fn send(&self, method: &str, path: &str) -> Result<String, TopologyError> {
		let url = self.url(path);

		let opts = RequestInit::new();
		opts.set_method(method);
		opts.set_mode(RequestMode::Cors);
		let request =
			Request::new_with_str_and_init(&url, &opts).map_err(TopologyError::transport)?;

		let window = web_sys::window().ok_or(TopologyError::NoWindow)?;
		let response: Response = JsFuture::from(window.fetch_with_request(&request))
			.await
			.map_err(TopologyError::transport)?
			.dyn_into()
			.map_err(TopologyError::transport)?;
		if !response.ok() {
			return Err(TopologyError::Status {
				status: response.status(),
				url,
			});
		}

		let body = JsFuture::from(response.text().map_err(TopologyError::transport)?)
			.await
			.map_err(TopologyError::transport)?;
		Ok(body.as_string().unwrap_or_default())
	}
}

impl DeviceSource for HttpDeviceSource {
	async fn fetch_devices(&self) -> Result<Vec<Device>, TopologyError> {
		let body = self.send("GET", DEVICES_PATH).await?;
		Ok(serde_json::from_str(&body)?)
	}

	async fn refresh_topology(&self) -> Result<(), TopologyError> {
		self.send("POST", TOPOLOGY_UPDATE_PATH).await.map(drop)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn joins_base_and_path() {
		assert_eq!(HttpDeviceSource::new("").url(DEVICES_PATH), "/api/zha/devices");
		assert_eq!(
			HttpDeviceSource::new("http://hub.local:8123/").url(TOPOLOGY_UPDATE_PATH),
			"http://hub.local:8123/api/zha/topology/update"
		);
	}
}
