//! Turns a device list and its neighbour tables into the node and edge sets handed to the
//! renderer.
//!
//! Neighbour tables are reported independently by every device. The same link may show up
//! from one side only, from both sides with different readings, or more than once. Each
//! unordered device pair collapses into a single [`GraphEdge`] styled after its weakest
//! reading.

use std::collections::HashMap;
use std::collections::hash_map::Entry;

use super::device::{Device, DeviceType, NeighborReport, Relationship};
use super::quality::{EdgeStyle, classify, parse_lqi, weaker};

pub const AVAILABLE_COLOR: &str = "#66FF99";
pub const UNAVAILABLE_COLOR: &str = "#FF9999";

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodeShape {
	Box,
	Ellipse,
	#[default]
	Circle,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphNode {
	/// IEEE address of the device.
	pub id: String,
	/// Multi-line label with `<b>`/`<i>` markup.
	pub label: String,
	pub shape: NodeShape,
	pub mass: f64,
	pub fixed: bool,
	pub color: &'static str,
}

#[derive(Clone, Debug, PartialEq)]
pub struct GraphEdge {
	pub from: String,
	pub to: String,
	/// Reported readings joined with `" & "` in the order they were seen.
	pub label: String,
	/// Weakest reading seen for this pair.
	pub quality: f64,
	pub style: EdgeStyle,
	/// Arrowhead at the `from` endpoint.
	pub arrow_from: bool,
	pub dashes: bool,
}

impl GraphEdge {
	fn reported(reporter: &Device, neighbor: &NeighborReport) -> Self {
		let quality = parse_lqi(&neighbor.lqi);
		let one_way = neighbor.relationship != Relationship::Child;
		Self {
			from: reporter.ieee.clone(),
			to: neighbor.ieee.clone(),
			label: neighbor.lqi.clone(),
			quality,
			style: classify(quality),
			arrow_from: one_way,
			dashes: one_way,
		}
	}

	/// Fold another reading of the same pair into this edge.
	///
	/// The style follows the weakest of every reading seen, not only the first and the newest.
	/// With three or more reports of one pair this can land a tier lower.
	fn absorb(&mut self, reporter: &Device, neighbor: &NeighborReport) {
		self.quality = weaker(self.quality, parse_lqi(&neighbor.lqi));
		self.style = classify(self.quality);
		self.label.push_str(" & ");
		self.label.push_str(&neighbor.lqi);
		if self.to == reporter.ieee {
			// Seen from both ends now: plain undirected link.
			self.arrow_from = false;
			self.dashes = false;
		}
	}

	pub fn touches(&self, id: &str) -> bool {
		self.from == id || self.to == id
	}
}

/// The derived node and edge sets for one device list.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TopologyGraph {
	pub nodes: Vec<GraphNode>,
	pub edges: Vec<GraphEdge>,
}

impl TopologyGraph {
	pub fn build(devices: &[Device]) -> Self {
		let nodes = devices.iter().map(node_for).collect();

		let mut edges: Vec<GraphEdge> = Vec::new();
		let mut pairs: HashMap<(&str, &str), usize> = HashMap::new();
		for device in devices {
			for neighbor in &device.neighbors {
				match pairs.entry(pair_key(&device.ieee, &neighbor.ieee)) {
					Entry::Occupied(slot) => edges[*slot.get()].absorb(device, neighbor),
					Entry::Vacant(slot) => {
						slot.insert(edges.len());
						edges.push(GraphEdge::reported(device, neighbor));
					}
				}
			}
		}

		Self { nodes, edges }
	}

	pub fn node(&self, id: &str) -> Option<&GraphNode> {
		self.nodes.iter().find(|node| node.id == id)
	}

	/// Ids of the nodes whose label contains `text`, ignoring case.
	pub fn matching_nodes(&self, text: &str) -> Vec<String> {
		let needle = text.to_lowercase();
		self.nodes
			.iter()
			.filter(|node| node.label.to_lowercase().contains(&needle))
			.map(|node| node.id.clone())
			.collect()
	}
}

fn pair_key<'a>(a: &'a str, b: &'a str) -> (&'a str, &'a str) {
	if a <= b { (a, b) } else { (b, a) }
}

fn node_for(device: &Device) -> GraphNode {
	let coordinator = device.device_type == DeviceType::Coordinator;
	GraphNode {
		id: device.ieee.clone(),
		label: node_label(device),
		shape: match device.device_type {
			DeviceType::Coordinator => NodeShape::Box,
			DeviceType::Router => NodeShape::Ellipse,
			_ => NodeShape::Circle,
		},
		mass: node_mass(device),
		fixed: coordinator,
		color: if device.available {
			AVAILABLE_COLOR
		} else {
			UNAVAILABLE_COLOR
		},
	}
}

fn node_mass(device: &Device) -> f64 {
	if !device.available {
		return 6.0;
	}
	match device.device_type {
		DeviceType::Coordinator => 2.0,
		DeviceType::Router => 4.0,
		_ => 5.0,
	}
}

fn node_label(device: &Device) -> String {
	let mut lines = Vec::new();
	if let Some(name) = &device.user_given_name {
		lines.push(format!("<b>{name}</b>"));
	}
	lines.push(format!("<b>IEEE: </b>{}", device.ieee));
	lines.push(format!(
		"<b>Device Type: </b>{}",
		device.device_type.as_str().replacen('_', " ", 1)
	));
	if let Some(nwk) = device.nwk {
		lines.push(format!("<b>NWK: </b>{}", padded_hex(nwk)));
	}
	lines.push(match (&device.manufacturer, &device.model) {
		(Some(manufacturer), Some(model)) => format!("<b>Device: </b>{manufacturer} {model}"),
		_ => "<b>Device is not in <i>'zigbee.db'</i></b>".to_string(),
	});
	if let Some(area) = device.area_id.as_deref().filter(|area| !area.is_empty()) {
		lines.push(format!("<b>Area ID: </b>{area}"));
	}
	lines.join("\n")
}

/// `0x`-prefixed hex, zero padded to four digits.
pub fn padded_hex(value: u32) -> String {
	format!("0x{value:04x}")
}
