//! Current-values command handler.

use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use tabled::Tabled;
use tracing::warn;

use crate::cli::{CurrentArgs, GlobalOpts};
use crate::error::CliError;
use crate::output;

use super::{AgentClient, util};

/// A data item and its latest sample, if any.
#[derive(Serialize)]
struct ValueEntry {
    id: String,
    name: Option<String>,
    #[serde(rename = "type")]
    item_type: Option<String>,
    value: Option<String>,
    timestamp: Option<DateTime<Utc>>,
}

#[derive(Tabled)]
struct ValueRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Type")]
    item_type: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Timestamp")]
    timestamp: String,
}

impl From<&ValueEntry> for ValueRow {
    fn from(e: &ValueEntry) -> Self {
        Self {
            id: e.id.clone(),
            name: util::or_dash(e.name.as_deref()),
            item_type: util::or_dash(e.item_type.as_deref()),
            value: util::or_dash(e.value.as_deref()),
            timestamp: e.timestamp.map_or_else(
                || "-".into(),
                |ts| ts.to_rfc3339_opts(SecondsFormat::Millis, true),
            ),
        }
    }
}

pub async fn handle(
    client: &AgentClient,
    args: CurrentArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    client.probe().await?;
    {
        let session = client.session().await;
        util::check_ids(&session, &args.ids)?;
    }

    match client.current().await {
        Ok(report) => tracing::info!(sequence = report.cursor, "current values fetched"),
        Err(e) if e.cursor_advanced() => warn!(error = %e, "some current values were skipped"),
        Err(e) => return Err(e.into()),
    }

    let session = client.session().await;
    let entries: Vec<ValueEntry> = session
        .registry()
        .map(|r| r.ids())
        .unwrap_or_default()
        .iter()
        .filter(|id| util::selected(&args.ids, id))
        .filter_map(|id| session.data_item(id))
        .map(|item| ValueEntry {
            id: item.id.clone(),
            name: item.name.clone(),
            item_type: item.item_type.clone(),
            value: item.current().map(|s| s.value.clone()),
            timestamp: item.current().map(|s| s.timestamp),
        })
        .collect();

    let out = output::render_list(
        &global.output_format(),
        &entries,
        |e| ValueRow::from(e),
        |e| format!("{}={}", e.id, e.value.as_deref().unwrap_or("")),
    )?;
    output::print_output(&out, global.quiet);
    Ok(())
}
