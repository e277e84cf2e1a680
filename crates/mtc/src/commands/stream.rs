//! Stream command handler: follow data item changes until interrupted.

use chrono::SecondsFormat;
use owo_colors::OwoColorize;
use serde::Serialize;
use tokio::sync::broadcast::error::RecvError;
use tracing::{debug, warn};

use mtc_core::{DataItemSample, SessionEvent};

use crate::cli::{GlobalOpts, OutputFormat, StreamArgs};
use crate::error::CliError;
use crate::output;

use super::{AgentClient, util};

#[derive(Serialize)]
struct ChangeLine<'a> {
    id: &'a str,
    #[serde(flatten)]
    sample: &'a DataItemSample,
}

fn render_change(
    format: &OutputFormat,
    color: bool,
    id: &str,
    sample: &DataItemSample,
) -> Result<String, CliError> {
    let line = ChangeLine { id, sample };
    Ok(match format {
        OutputFormat::Table => {
            let ts = sample.timestamp.to_rfc3339_opts(SecondsFormat::Millis, true);
            if color {
                format!("{}  {:<20} {}", ts.dimmed(), id.cyan(), sample.value.bold())
            } else {
                format!("{ts}  {id:<20} {}", sample.value)
            }
        }
        OutputFormat::Json | OutputFormat::JsonCompact => serde_json::to_string(&line)?,
        OutputFormat::Yaml => format!("---\n{}", serde_yaml::to_string(&line)?.trim_end()),
        OutputFormat::Plain => format!("{id}={}", sample.value),
    })
}

pub async fn handle(
    client: &AgentClient,
    args: StreamArgs,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    client.probe().await?;
    {
        let session = client.session().await;
        util::check_ids(&session, &args.ids)?;
    }

    // Subscribe before the baseline so its values are printed too.
    let mut events = client.events();
    client.start_streaming().await?;
    if !global.quiet {
        eprintln!(
            "Streaming from {} every {}ms (Ctrl-C to stop)",
            client.config().agent_url,
            client.config().update_interval.as_millis()
        );
    }

    let format = global.output_format();
    let color = output::should_color(&global.color);
    let mut batches = 0u64;
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    let result = loop {
        tokio::select! {
            _ = &mut ctrl_c => break Ok(()),
            event = events.recv() => match event {
                Ok(SessionEvent::DataItemChanged { id, sample }) => {
                    if util::selected(&args.ids, &id) {
                        match render_change(&format, color, &id, &sample) {
                            Ok(line) => output::print_output(&line, global.quiet),
                            Err(e) => break Err(e),
                        }
                    }
                }
                Ok(SessionEvent::DataItemsChanged) => {
                    batches += 1;
                    if args.batches.is_some_and(|limit| batches >= limit) {
                        debug!(batches, "batch limit reached");
                        break Ok(());
                    }
                }
                Ok(SessionEvent::ProbeCompleted) => {}
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "output fell behind; some changes were not printed");
                }
                Err(RecvError::Closed) => break Ok(()),
            },
        }
    };

    client.stop_streaming().await;
    result
}
