use super::device::Device;
use super::graph::TopologyGraph;
use super::index::DeviceIndex;

/// Device index and graph model derived from one fetch. Always replaced as a whole.
#[derive(Clone, Debug, Default)]
pub struct TopologySnapshot {
	pub index: DeviceIndex,
	pub graph: TopologyGraph,
}

impl TopologySnapshot {
	pub fn from_devices(devices: Vec<Device>) -> Self {
		let graph = TopologyGraph::build(&devices);
		Self {
			index: DeviceIndex::new(devices),
			graph,
		}
	}
}
