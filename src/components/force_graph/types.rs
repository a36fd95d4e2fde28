use force_graph::DefaultNodeIdx;

use crate::topology::{GraphEdge, GraphNode, NodeShape};

/// Per-node payload carried through the simulation.
#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: String,
	/// Label lines with markup removed.
	pub lines: Vec<String>,
	pub shape: NodeShape,
	pub color: &'static str,
	pub fixed: bool,
}

impl NodeInfo {
	pub fn from_node(node: &GraphNode) -> Self {
		Self {
			id: node.id.clone(),
			lines: plain_lines(&node.label),
			shape: node.shape,
			color: node.color,
			fixed: node.fixed,
		}
	}
}

#[derive(Clone, Debug)]
pub struct EdgeInfo {
	pub from: DefaultNodeIdx,
	pub to: DefaultNodeIdx,
	pub label: String,
	pub color: &'static str,
	pub width: f64,
	pub arrow_from: bool,
	pub dashes: bool,
}

impl EdgeInfo {
	pub fn from_edge(edge: &GraphEdge, from: DefaultNodeIdx, to: DefaultNodeIdx) -> Self {
		Self {
			from,
			to,
			label: edge.label.clone(),
			color: edge.style.color,
			width: edge.style.width,
			arrow_from: edge.arrow_from,
			dashes: edge.dashes,
		}
	}
}

/// Split a label into lines and drop `<tag>` markup, which a canvas cannot draw.
pub fn plain_lines(label: &str) -> Vec<String> {
	label
		.lines()
		.map(|line| {
			let mut plain = String::with_capacity(line.len());
			let mut in_tag = false;
			for c in line.chars() {
				match c {
					'<' => in_tag = true,
					'>' if in_tag => in_tag = false,
					_ if !in_tag => plain.push(c),
					_ => {}
				}
			}
			plain
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_markup() {
		assert_eq!(
			plain_lines("<b>Porch</b>\n<b>IEEE: </b>00:11\n<b>Device is not in <i>'zigbee.db'</i></b>"),
			vec!["Porch", "IEEE: 00:11", "Device is not in 'zigbee.db'"]
		);
	}
}
