// ── Probe response → DeviceModel ──

use roxmltree::{Document, Node};

use super::{attr, find_descendant, local_name, text_content};
use crate::error::CoreError;
use crate::model::{Component, DataItem, Device, DeviceModel};

const DEVICES: &str = "Devices";
const COMPONENTS: &str = "Components";
const DATA_ITEMS: &str = "DataItems";
const DATA_ITEM: &str = "DataItem";
const DESCRIPTION: &str = "Description";

/// Parse a probe payload into a device model.
///
/// Every data item gets a history bounded at `buffer_size`. The first
/// `Devices` element anywhere in the document is used; each of its child
/// elements is a device.
pub fn parse_probe(xml: &str, buffer_size: usize) -> Result<DeviceModel, CoreError> {
    let doc = Document::parse(xml)
        .map_err(|e| CoreError::malformed_probe(format!("invalid XML: {e}")))?;

    let devices_node = find_descendant(doc.root(), DEVICES)
        .ok_or_else(|| CoreError::malformed_probe("no Devices element"))?;

    let devices = devices_node
        .children()
        .filter(Node::is_element)
        .map(|node| parse_device(node, buffer_size))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(DeviceModel::new(devices))
}

fn parse_device(node: Node<'_, '_>, buffer_size: usize) -> Result<Device, CoreError> {
    let id = required_id(node)?;
    let (components, data_items) = parse_children(node, buffer_size)?;

    let description_node = node
        .children()
        .find(|n| n.is_element() && local_name(*n) == DESCRIPTION);

    let description = description_node
        .map(text_content)
        .map(|text| text.trim().to_owned())
        .filter(|text| !text.is_empty());

    let from_description_or_device = |name: &str| {
        description_node
            .and_then(|d| attr(d, name))
            .or_else(|| attr(node, name))
    };

    Ok(Device {
        id,
        name: attr(node, "name"),
        long_name: long_name(node),
        uuid: attr(node, "uuid"),
        manufacturer: from_description_or_device("manufacturer"),
        serial_number: from_description_or_device("serialNumber"),
        description,
        components,
        data_items,
    })
}

fn parse_component(node: Node<'_, '_>, buffer_size: usize) -> Result<Component, CoreError> {
    let id = required_id(node)?;
    let (components, data_items) = parse_children(node, buffer_size)?;

    Ok(Component {
        id,
        component_type: local_name(node).to_owned(),
        name: attr(node, "name"),
        long_name: long_name(node),
        components,
        data_items,
    })
}

fn parse_data_item(node: Node<'_, '_>, buffer_size: usize) -> Result<DataItem, CoreError> {
    let mut item = DataItem::new(required_id(node)?, buffer_size);
    item.name = attr(node, "name");
    item.long_name = long_name(node);
    item.category = attr(node, "category");
    item.item_type = attr(node, "type");
    item.sub_type = attr(node, "subType");
    item.units = attr(node, "units");
    item.native_units = attr(node, "nativeUnits");
    Ok(item)
}

/// Collect the `Components` and `DataItems` containers directly under `node`.
fn parse_children(
    node: Node<'_, '_>,
    buffer_size: usize,
) -> Result<(Vec<Component>, Vec<DataItem>), CoreError> {
    let mut components = Vec::new();
    let mut data_items = Vec::new();

    for child in node.children().filter(Node::is_element) {
        match local_name(child) {
            COMPONENTS => {
                for c in child.children().filter(Node::is_element) {
                    components.push(parse_component(c, buffer_size)?);
                }
            }
            DATA_ITEMS => {
                for d in child
                    .children()
                    .filter(|n| n.is_element() && local_name(*n) == DATA_ITEM)
                {
                    data_items.push(parse_data_item(d, buffer_size)?);
                }
            }
            _ => {}
        }
    }

    Ok((components, data_items))
}

fn required_id(node: Node<'_, '_>) -> Result<String, CoreError> {
    attr(node, "id").ok_or_else(|| {
        let pos = node.document().text_pos_at(node.range().start);
        CoreError::malformed_probe(format!(
            "{} element at {pos} has no id attribute",
            local_name(node)
        ))
    })
}

fn long_name(node: Node<'_, '_>) -> Option<String> {
    attr(node, "longName").or_else(|| attr(node, "nativeName"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const PROBE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<m:MTConnectDevices xmlns:m="urn:mtconnect.org:MTConnectDevices:1.3">
  <m:Header creationTime="2024-03-09T16:23:30Z" instanceId="1" bufferSize="131072"/>
  <m:Devices>
    <m:Device id="d1" name="Mill-1" uuid="mill-001">
      <m:Description manufacturer="Acme" serialNumber="SN-42">Three axis mill</m:Description>
      <m:DataItems>
        <m:DataItem id="avail" type="AVAILABILITY" category="EVENT"/>
      </m:DataItems>
      <m:Components>
        <m:Axes id="ax" name="base">
          <m:Components>
            <m:Linear id="x" name="X" nativeName="X-Axis">
              <m:DataItems>
                <m:DataItem id="x1" name="Xact" type="POSITION" subType="ACTUAL"
                  category="SAMPLE" units="MILLIMETER" nativeUnits="MILLIMETER"/>
              </m:DataItems>
            </m:Linear>
          </m:Components>
        </m:Axes>
        <m:Controller id="cont">
          <m:DataItems>
            <m:DataItem id="mode" type="CONTROLLER_MODE" category="EVENT"/>
          </m:DataItems>
        </m:Controller>
      </m:Components>
    </m:Device>
  </m:Devices>
</m:MTConnectDevices>"#;

    #[test]
    fn builds_tree_ignoring_namespace_prefixes() {
        let model = parse_probe(PROBE, 10).unwrap();

        assert_eq!(model.devices().len(), 1);
        let device = &model.devices()[0];
        assert_eq!(device.id, "d1");
        assert_eq!(device.name.as_deref(), Some("Mill-1"));
        assert_eq!(device.uuid.as_deref(), Some("mill-001"));
        assert_eq!(device.manufacturer.as_deref(), Some("Acme"));
        assert_eq!(device.serial_number.as_deref(), Some("SN-42"));
        assert_eq!(device.description.as_deref(), Some("Three axis mill"));
        assert_eq!(device.data_items[0].id, "avail");

        let axes = &device.components[0];
        assert_eq!(axes.component_type, "Axes");
        let linear = &axes.components[0];
        assert_eq!(linear.component_type, "Linear");
        assert_eq!(linear.long_name.as_deref(), Some("X-Axis"));

        let x1 = &linear.data_items[0];
        assert_eq!(x1.name.as_deref(), Some("Xact"));
        assert_eq!(x1.item_type.as_deref(), Some("POSITION"));
        assert_eq!(x1.sub_type.as_deref(), Some("ACTUAL"));
        assert_eq!(x1.category.as_deref(), Some("SAMPLE"));
        assert_eq!(x1.units.as_deref(), Some("MILLIMETER"));
        assert_eq!(x1.buffer_size(), 10);

        assert_eq!(device.components[1].data_items[0].id, "mode");
    }

    #[test]
    fn missing_devices_element_is_malformed() {
        let err = parse_probe("<MTConnectDevices><Header/></MTConnectDevices>", 10).unwrap_err();
        assert!(matches!(err, CoreError::MalformedProbeResponse { .. }));
    }

    #[test]
    fn invalid_xml_is_malformed() {
        let err = parse_probe("<MTConnectDevices><Devices>", 10).unwrap_err();
        assert!(matches!(err, CoreError::MalformedProbeResponse { .. }));
    }

    #[test]
    fn component_without_id_is_malformed() {
        let xml = r#"<Devices><Device id="d1"><Components><Axes/></Components></Device></Devices>"#;
        let err = parse_probe(xml, 10).unwrap_err();
        match err {
            CoreError::MalformedProbeResponse { reason } => assert!(reason.contains("Axes")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn data_item_without_id_is_malformed() {
        let xml = r#"<Devices><Device id="d1"><DataItems><DataItem type="X"/></DataItems></Device></Devices>"#;
        assert!(parse_probe(xml, 10).is_err());
    }

    #[test]
    fn device_attributes_back_fill_description() {
        let xml = r#"<Devices><Device id="d1" manufacturer="Acme" serialNumber="7"/></Devices>"#;
        let model = parse_probe(xml, 10).unwrap();
        let device = &model.devices()[0];
        assert_eq!(device.manufacturer.as_deref(), Some("Acme"));
        assert_eq!(device.serial_number.as_deref(), Some("7"));
        assert!(device.description.is_none());
    }

    #[test]
    fn empty_devices_container_is_valid() {
        let model = parse_probe("<Devices/>", 10).unwrap();
        assert!(model.devices().is_empty());
    }
}
