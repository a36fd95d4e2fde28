use std::collections::HashMap;

use super::device::Device;

/// Lookup tables over one device list, keyed by IEEE address and by registry id.
#[derive(Clone, Debug, Default)]
pub struct DeviceIndex {
	devices: Vec<Device>,
	by_ieee: HashMap<String, usize>,
	by_registry_id: HashMap<String, usize>,
}

impl DeviceIndex {
	pub fn new(devices: Vec<Device>) -> Self {
		let mut by_ieee = HashMap::with_capacity(devices.len());
		let mut by_registry_id = HashMap::with_capacity(devices.len());
		for (slot, device) in devices.iter().enumerate() {
			by_ieee.insert(device.ieee.clone(), slot);
			by_registry_id.insert(device.device_reg_id.clone(), slot);
		}
		Self {
			devices,
			by_ieee,
			by_registry_id,
		}
	}

	pub fn by_ieee(&self, ieee: &str) -> Option<&Device> {
		self.by_ieee.get(ieee).and_then(|&slot| self.devices.get(slot))
	}

	pub fn by_registry_id(&self, registry_id: &str) -> Option<&Device> {
		self.by_registry_id
			.get(registry_id)
			.and_then(|&slot| self.devices.get(slot))
	}

	pub fn devices(&self) -> &[Device] {
		&self.devices
	}

	pub fn len(&self) -> usize {
		self.devices.len()
	}

	pub fn is_empty(&self) -> bool {
		self.devices.is_empty()
	}

	/// `(registry id, display name)` pairs for the zoom picker, ordered by name.
	pub fn picker_entries(&self) -> Vec<(String, String)> {
		let mut entries: Vec<_> = self
			.devices
			.iter()
			.map(|d| (d.device_reg_id.clone(), d.display_name()))
			.collect();
		entries.sort_by(|a, b| a.1.to_lowercase().cmp(&b.1.to_lowercase()).then(a.0.cmp(&b.0)));
		entries
	}
}
