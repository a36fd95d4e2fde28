use serde::{Deserialize, Deserializer};
use serde_json::Value;

/// Role of a device in the mesh routing tree.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub enum DeviceType {
	Coordinator,
	Router,
	EndDevice,
	/// Reported role that this viewer does not know; styled like an end device.
	Other(String),
}

impl From<String> for DeviceType {
	fn from(value: String) -> Self {
		match value.as_str() {
			"Coordinator" => Self::Coordinator,
			"Router" => Self::Router,
			"EndDevice" => Self::EndDevice,
			_ => Self::Other(value),
		}
	}
}

impl DeviceType {
	pub fn as_str(&self) -> &str {
		match self {
			Self::Coordinator => "Coordinator",
			Self::Router => "Router",
			Self::EndDevice => "EndDevice",
			Self::Other(raw) => raw,
		}
	}
}

/// How the reporting device sees a neighbour.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(from = "Option<String>")]
pub enum Relationship {
	Child,
	Parent,
	Sibling,
	Other(String),
}

impl From<Option<String>> for Relationship {
	fn from(value: Option<String>) -> Self {
		match value.as_deref() {
			Some("Child") => Self::Child,
			Some("Parent") => Self::Parent,
			Some("Sibling") => Self::Sibling,
			_ => Self::Other(value.unwrap_or_default()),
		}
	}
}

impl Default for Relationship {
	fn default() -> Self {
		Self::Other(String::new())
	}
}

/// One entry of a device's neighbour table.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct NeighborReport {
	pub ieee: String,
	/// Link quality exactly as reported; parsed when styling edges. Missing reads as empty.
	#[serde(default, deserialize_with = "lqi_text")]
	pub lqi: String,
	#[serde(default)]
	pub relationship: Relationship,
}

/// A mesh device as returned by the backend.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct Device {
	pub ieee: String,
	pub device_reg_id: String,
	#[serde(default)]
	pub user_given_name: Option<String>,
	pub device_type: DeviceType,
	#[serde(default, deserialize_with = "lenient_nwk")]
	pub nwk: Option<u32>,
	#[serde(default)]
	pub manufacturer: Option<String>,
	#[serde(default)]
	pub model: Option<String>,
	#[serde(default)]
	pub area_id: Option<String>,
	pub available: bool,
	#[serde(default)]
	pub neighbors: Vec<NeighborReport>,
}

impl Device {
	/// Name shown in pickers: the user's name, else manufacturer and model, else the IEEE.
	pub fn display_name(&self) -> String {
		if let Some(name) = self.user_given_name.as_deref().filter(|n| !n.is_empty()) {
			return name.to_string();
		}
		match (&self.manufacturer, &self.model) {
			(Some(manufacturer), Some(model)) => format!("{manufacturer} {model}"),
			_ => self.ieee.clone(),
		}
	}
}

fn lqi_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
	Ok(match Value::deserialize(deserializer)? {
		Value::String(text) => text,
		Value::Null => String::new(),
		other => other.to_string(),
	})
}

fn lenient_nwk<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
	let value = Option::<Value>::deserialize(deserializer)?;
	Ok(value.as_ref().and_then(parse_nwk))
}

/// Network addresses arrive as numbers or hex strings; anything else is treated as absent.
fn parse_nwk(value: &Value) -> Option<u32> {
	match value {
		Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
		Value::String(text) => {
			let text = text.trim();
			let digits = text
				.strip_prefix("0x")
				.or_else(|| text.strip_prefix("0X"))
				.unwrap_or(text);
			u32::from_str_radix(digits, 16).ok()
		}
		_ => None,
	}
}
