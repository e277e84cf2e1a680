// ── Device tree ──
//
// Device → Component → DataItem, built once from a probe response.
// Components own their children outright and never point back up, so
// the tree is a plain owned structure.

use serde::Serialize;

use super::DataItem;

/// A top-level device reported by the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Device {
    pub id: String,
    pub name: Option<String>,
    pub long_name: Option<String>,
    pub uuid: Option<String>,
    pub manufacturer: Option<String>,
    pub serial_number: Option<String>,
    pub description: Option<String>,
    pub components: Vec<Component>,
    pub data_items: Vec<DataItem>,
}

/// A structural part of a device (axis, controller, spindle, ...).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Component {
    pub id: String,
    /// Element name in the probe document, e.g. `Linear` or `Controller`.
    #[serde(rename = "type")]
    pub component_type: String,
    pub name: Option<String>,
    pub long_name: Option<String>,
    pub components: Vec<Component>,
    pub data_items: Vec<DataItem>,
}

/// Position of a data item inside a [`DeviceModel`].
///
/// `components` is the chain of child indices from the device down to the
/// component that owns the item; empty when the device owns it directly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemPath {
    pub(crate) device: usize,
    pub(crate) components: Vec<usize>,
    pub(crate) item: usize,
}

/// All devices of one agent, in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DeviceModel {
    devices: Vec<Device>,
}

impl DeviceModel {
    pub fn new(devices: Vec<Device>) -> Self {
        Self { devices }
    }

    pub fn devices(&self) -> &[Device] {
        &self.devices
    }

    pub fn device(&self, id: &str) -> Option<&Device> {
        self.devices.iter().find(|d| d.id == id)
    }

    /// Visit every data item depth-first: a device's own items, then its
    /// components in document order, each component's own items before
    /// its children.
    pub fn visit_data_items<'a>(&'a self, mut visit: impl FnMut(ItemPath, &'a DataItem)) {
        for (d, device) in self.devices.iter().enumerate() {
            for (i, item) in device.data_items.iter().enumerate() {
                visit(
                    ItemPath {
                        device: d,
                        components: Vec::new(),
                        item: i,
                    },
                    item,
                );
            }
            let mut trail = Vec::new();
            visit_components(d, &device.components, &mut trail, &mut visit);
        }
    }

    pub(crate) fn data_item(&self, path: &ItemPath) -> Option<&DataItem> {
        let device = self.devices.get(path.device)?;
        let (mut components, mut items) = (&device.components, &device.data_items);
        for &c in &path.components {
            let component = components.get(c)?;
            components = &component.components;
            items = &component.data_items;
        }
        items.get(path.item)
    }

    pub(crate) fn data_item_mut(&mut self, path: &ItemPath) -> Option<&mut DataItem> {
        let device = self.devices.get_mut(path.device)?;
        let Some((&first, rest)) = path.components.split_first() else {
            return device.data_items.get_mut(path.item);
        };
        let mut component = device.components.get_mut(first)?;
        for &c in rest {
            component = component.components.get_mut(c)?;
        }
        component.data_items.get_mut(path.item)
    }
}

fn visit_components<'a>(
    device: usize,
    components: &'a [Component],
    trail: &mut Vec<usize>,
    visit: &mut impl FnMut(ItemPath, &'a DataItem),
) {
    for (c, component) in components.iter().enumerate() {
        trail.push(c);
        for (i, item) in component.data_items.iter().enumerate() {
            visit(
                ItemPath {
                    device,
                    components: trail.clone(),
                    item: i,
                },
                item,
            );
        }
        visit_components(device, &component.components, trail, visit);
        trail.pop();
    }
}
