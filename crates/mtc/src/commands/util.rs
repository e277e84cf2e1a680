//! Shared helpers for command handlers.

use mtc_core::{ClientSession, Component, DataItem, Device, HttpFetcher};

use crate::error::CliError;

/// Fail with `NotFound` for the first id the probe did not produce.
pub fn check_ids(session: &ClientSession<HttpFetcher>, ids: &[String]) -> Result<(), CliError> {
    match ids.iter().find(|id| session.data_item(id).is_none()) {
        Some(missing) => Err(CliError::NotFound {
            resource_type: "data item".into(),
            identifier: missing.clone(),
        }),
        None => Ok(()),
    }
}

/// Whether `id` passes an (optional) id filter.
pub fn selected(ids: &[String], id: &str) -> bool {
    ids.is_empty() || ids.iter().any(|wanted| wanted == id)
}

/// Every data item of `device` with the component path leading to it,
/// e.g. `Axes[base]/Linear[X]`. Device-level items have an empty path.
pub fn data_items_with_paths(device: &Device) -> Vec<(String, &DataItem)> {
    let mut out: Vec<(String, &DataItem)> = device
        .data_items
        .iter()
        .map(|item| (String::new(), item))
        .collect();
    for component in &device.components {
        walk(component, "", &mut out);
    }
    out
}

fn walk<'a>(component: &'a Component, parent: &str, out: &mut Vec<(String, &'a DataItem)>) {
    let label = match component.name.as_deref() {
        Some(name) => format!("{}[{name}]", component.component_type),
        None => component.component_type.clone(),
    };
    let path = if parent.is_empty() {
        label
    } else {
        format!("{parent}/{label}")
    };

    out.extend(component.data_items.iter().map(|item| (path.clone(), item)));
    for child in &component.components {
        walk(child, &path, out);
    }
}

pub fn or_dash(value: Option<&str>) -> String {
    value.unwrap_or("-").to_owned()
}
