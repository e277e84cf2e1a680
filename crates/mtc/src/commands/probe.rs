//! Probe command handler.

use serde::Serialize;
use tabled::Tabled;

use mtc_core::Device;

use crate::cli::{GlobalOpts, OutputFormat, ProbeArgs};
use crate::error::CliError;
use crate::output;

use super::{AgentClient, util};

// ── Table row ───────────────────────────────────────────────────────

/// One data item, flattened out of the device tree.
#[derive(Serialize)]
struct ItemEntry<'a> {
    device: &'a str,
    component: String,
    id: &'a str,
    name: Option<&'a str>,
    category: Option<&'a str>,
    #[serde(rename = "type")]
    item_type: Option<&'a str>,
    units: Option<&'a str>,
}

#[derive(Tabled)]
struct ItemRow {
    #[tabled(rename = "Device")]
    device: String,
    #[tabled(rename = "Component")]
    component: String,
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Category")]
    category: String,
    #[tabled(rename = "Type")]
    item_type: String,
    #[tabled(rename = "Units")]
    units: String,
}

impl From<&ItemEntry<'_>> for ItemRow {
    fn from(e: &ItemEntry<'_>) -> Self {
        Self {
            device: e.device.to_owned(),
            component: e.component.clone(),
            id: e.id.to_owned(),
            name: util::or_dash(e.name),
            category: util::or_dash(e.category),
            item_type: util::or_dash(e.item_type),
            units: util::or_dash(e.units),
        }
    }
}

fn entries<'a>(devices: &[&'a Device]) -> Vec<ItemEntry<'a>> {
    devices
        .iter()
        .copied()
        .flat_map(|device| {
            let label = device.name.as_deref().unwrap_or(&device.id);
            util::data_items_with_paths(device)
                .into_iter()
                .map(move |(component, item)| ItemEntry {
                    device: label,
                    component,
                    id: &item.id,
                    name: item.name.as_deref(),
                    category: item.category.as_deref(),
                    item_type: item.item_type.as_deref(),
                    units: item.units.as_deref(),
                })
        })
        .collect()
}

// ── Handler ─────────────────────────────────────────────────────────

pub async fn handle(
    client: &AgentClient,
    args: ProbeArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    client.probe().await?;
    let session = client.session().await;

    let devices: Vec<&Device> = session
        .devices()
        .iter()
        .filter(|d| {
            args.device
                .as_deref()
                .is_none_or(|want| d.id == want || d.name.as_deref() == Some(want))
        })
        .collect();

    if let (Some(want), true) = (&args.device, devices.is_empty()) {
        return Err(CliError::NotFound {
            resource_type: "device".into(),
            identifier: want.clone(),
        });
    }

    let format = global.output_format();
    let out = match format {
        // Tree-shaped formats keep the full device model.
        OutputFormat::Json | OutputFormat::JsonCompact | OutputFormat::Yaml => {
            output::render_single(&format, &devices, |_| Ok(String::new()))?
        }
        OutputFormat::Table | OutputFormat::Plain => {
            let entries = entries(&devices);
            output::render_list(&format, &entries, |e| ItemRow::from(e), |e| e.id.to_owned())?
        }
    };
    output::print_output(&out, global.quiet);
    Ok(())
}
