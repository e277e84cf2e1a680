// ── Client session state machine ──
//
// Unprobed → Probed → Streaming, with Streaming able to fall back to
// Probed. The session owns the device model, the registry, the sequence
// cursor, and the notifier; it performs no scheduling of its own. The
// fetch is the only await point in any cycle, and parse + apply run to
// completion after it.

use serde::Serialize;
use tracing::{debug, info, warn};
use url::Url;

use mtc_api::{AgentEndpoints, Fetch};

use crate::config::ClientConfig;
use crate::error::CoreError;
use crate::model::{DataItem, DataItemSample, Device, DeviceModel};
use crate::notify::ChangeNotifier;
use crate::parse::{StreamHeader, StreamResponse, parse_probe, parse_stream};
use crate::store::DataItemRegistry;

/// Lifecycle state of a [`ClientSession`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, strum::Display)]
#[strum(serialize_all = "lowercase")]
pub enum SessionState {
    Unprobed,
    Probed,
    Streaming,
}

/// Result of one successfully applied current/sample response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// `lastSequence` reported by the response.
    pub last_sequence: u64,
    /// Cursor after the response was applied.
    pub cursor: u64,
    /// Number of updates appended to data item histories.
    pub applied: usize,
    /// Observations skipped because an earlier response already applied them.
    pub skipped: usize,
}

/// Probe output: the model plus its id index.
#[derive(Debug)]
struct Topology {
    model: DeviceModel,
    registry: DataItemRegistry,
}

/// One agent connection's model, cursor, and notification fan-out.
///
/// Requires exclusive access for every operation; hosts that poll from
/// several workers must serialize calls (see [`Client`](crate::Client)).
pub struct ClientSession<F> {
    fetcher: F,
    endpoints: AgentEndpoints,
    buffer_size: usize,
    state: SessionState,
    topology: Option<Topology>,
    cursor: Option<u64>,
    last_header: Option<StreamHeader>,
    notifier: ChangeNotifier,
}

impl<F: Fetch> ClientSession<F> {
    pub fn new(config: &ClientConfig, fetcher: F) -> Result<Self, CoreError> {
        config.validate()?;
        Ok(Self {
            fetcher,
            endpoints: config.endpoints()?,
            buffer_size: config.default_buffer_size,
            state: SessionState::Unprobed,
            topology: None,
            cursor: None,
            last_header: None,
            notifier: ChangeNotifier::new(),
        })
    }

    // ── Accessors ────────────────────────────────────────────────────

    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Last applied `lastSequence`, or `None` before the first response.
    pub fn cursor(&self) -> Option<u64> {
        self.cursor
    }

    pub fn endpoints(&self) -> &AgentEndpoints {
        &self.endpoints
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn model(&self) -> Option<&DeviceModel> {
        self.topology.as_ref().map(|t| &t.model)
    }

    /// Probed devices; empty before a successful probe.
    pub fn devices(&self) -> &[Device] {
        self.model().map_or(&[], DeviceModel::devices)
    }

    pub fn registry(&self) -> Option<&DataItemRegistry> {
        self.topology.as_ref().map(|t| &t.registry)
    }

    pub fn data_item(&self, id: &str) -> Option<&DataItem> {
        let topology = self.topology.as_ref()?;
        topology.registry.resolve(&topology.model, id)
    }

    /// Header of the most recently applied stream response.
    pub fn last_header(&self) -> Option<&StreamHeader> {
        self.last_header.as_ref()
    }

    pub fn notifier(&self) -> &ChangeNotifier {
        &self.notifier
    }

    /// Register or remove observers.
    pub fn notifier_mut(&mut self) -> &mut ChangeNotifier {
        &mut self.notifier
    }

    // ── Operations ───────────────────────────────────────────────────

    /// Fetch and parse the probe response, building the model and registry.
    ///
    /// Valid only from `Unprobed`; a failed probe leaves the session there.
    pub async fn probe(&mut self) -> Result<(), CoreError> {
        if self.state != SessionState::Unprobed {
            return Err(CoreError::InvalidTransition {
                state: self.state,
                operation: "probe",
            });
        }

        let url = self.endpoints.probe()?;
        let body = self.fetcher.fetch(&url).await?;
        let model = parse_probe(&body, self.buffer_size)?;
        let registry = DataItemRegistry::build(&model)?;

        info!(
            devices = model.devices().len(),
            data_items = registry.len(),
            "probe completed"
        );

        self.topology = Some(Topology { model, registry });
        self.cursor = None;
        self.last_header = None;
        self.state = SessionState::Probed;
        self.notifier.probe_completed();
        Ok(())
    }

    /// Fetch `current` and apply it.
    pub async fn current(&mut self) -> Result<CycleReport, CoreError> {
        self.ensure_probed()?;
        let url = self.endpoints.current()?;
        let body = self.fetcher.fetch(&url).await?;
        self.ingest(&body)
    }

    /// Establish a baseline with [`current`](Self::current) and enter `Streaming`.
    ///
    /// Returns `Ok(false)` without doing anything if already streaming.
    /// A baseline that hits an unknown data item still starts streaming,
    /// since the cursor was advanced.
    pub async fn start_streaming(&mut self) -> Result<bool, CoreError> {
        match self.state {
            SessionState::Unprobed => return Err(CoreError::NotProbed),
            SessionState::Streaming => return Ok(false),
            SessionState::Probed => {}
        }

        match self.current().await {
            Ok(report) => debug!(cursor = report.cursor, "streaming baseline established"),
            Err(e) if e.cursor_advanced() => {
                warn!(error = %e, "streaming baseline partially applied");
            }
            Err(e) => return Err(e),
        }

        self.state = SessionState::Streaming;
        info!("streaming started");
        Ok(true)
    }

    /// Leave `Streaming`. Returns `false` if the session was not streaming.
    pub fn stop_streaming(&mut self) -> bool {
        if self.state != SessionState::Streaming {
            return false;
        }
        self.state = SessionState::Probed;
        info!("streaming stopped");
        true
    }

    /// One streaming poll: fetch samples strictly after the cursor and apply them.
    ///
    /// Returns `Ok(None)` when the session is not streaming, so a tick that
    /// was already due when streaming stopped does nothing.
    pub async fn tick(&mut self) -> Result<Option<CycleReport>, CoreError> {
        if self.state != SessionState::Streaming {
            debug!(state = %self.state, "tick skipped");
            return Ok(None);
        }

        let url = self.next_sample_url()?;
        let body = self.fetcher.fetch(&url).await?;
        self.ingest(&body).map(Some)
    }

    /// The sample request the next tick will issue (`at = cursor + 1`).
    pub fn next_sample_url(&self) -> Result<Url, CoreError> {
        let at = self.cursor.unwrap_or(0).saturating_add(1);
        Ok(self.endpoints.sample(at)?)
    }

    /// Parse a raw current/sample payload and apply it.
    ///
    /// Parse failures leave the cursor and every history untouched.
    pub fn ingest(&mut self, body: &str) -> Result<CycleReport, CoreError> {
        self.ensure_probed()?;
        let response = parse_stream(body)?;
        self.apply(response)
    }

    /// Apply a parsed response in its (timestamp) order.
    ///
    /// Observations whose `sequence` is at or below the cursor were applied
    /// by an earlier response and are skipped. Observations without a
    /// `sequence` are always applied.
    ///
    /// Stops at the first update whose id is not registered: updates before
    /// it stay applied, the batch notification still fires for them, the
    /// cursor still advances to the response's `lastSequence`, and
    /// [`CoreError::UnknownDataItemId`] is returned.
    ///
    /// A response from a new agent instance restarts the sequence space:
    /// the cursor moves to its `lastSequence` even if that is lower.
    pub fn apply(&mut self, response: StreamResponse) -> Result<CycleReport, CoreError> {
        let restarted = self.instance_changed(&response.header);
        let last_sequence = response.last_sequence();
        let seen = if restarted { None } else { self.cursor };

        let Some(topology) = self.topology.as_mut() else {
            return Err(CoreError::NotProbed);
        };

        let mut applied = 0;
        let mut skipped = 0;
        let mut unknown = None;
        for update in response.updates {
            if update.sequence.zip(seen).is_some_and(|(seq, seen)| seq <= seen) {
                skipped += 1;
                continue;
            }
            let Some(item) = topology
                .registry
                .resolve_mut(&mut topology.model, &update.data_item_id)
            else {
                unknown = Some(update.data_item_id);
                break;
            };
            item.push_sample(DataItemSample::new(update.value, update.timestamp));
            self.notifier.data_item_changed(item);
            applied += 1;
        }

        if skipped > 0 {
            debug!(skipped, "already applied observations skipped");
        }
        if applied > 0 {
            self.notifier.data_items_changed();
        }

        let cursor = if restarted {
            self.reset_cursor(last_sequence)
        } else {
            self.advance_cursor(last_sequence)
        };
        self.last_header = Some(response.header);

        match unknown {
            Some(id) => {
                warn!(id = %id, applied, "update for unknown data item; rest of batch dropped");
                Err(CoreError::UnknownDataItemId {
                    id,
                    applied,
                    last_sequence,
                })
            }
            None => Ok(CycleReport {
                last_sequence,
                cursor,
                applied,
                skipped,
            }),
        }
    }

    /// Resize one data item's history. Shrinking drops its oldest samples.
    pub fn set_buffer_size(&mut self, id: &str, buffer_size: usize) -> Result<(), CoreError> {
        let topology = self.topology.as_mut().ok_or(CoreError::NotProbed)?;
        let item = topology
            .registry
            .resolve_mut(&mut topology.model, id)
            .ok_or_else(|| CoreError::DataItemNotFound { id: id.to_owned() })?;
        item.set_buffer_size(buffer_size)
    }

    // ── Helpers ──────────────────────────────────────────────────────

    fn ensure_probed(&self) -> Result<(), CoreError> {
        match self.state {
            SessionState::Unprobed => Err(CoreError::NotProbed),
            SessionState::Probed | SessionState::Streaming => Ok(()),
        }
    }

    /// Move the cursor forward to `last_sequence`; never backward.
    fn advance_cursor(&mut self, last_sequence: u64) -> u64 {
        let next = self.cursor.map_or(last_sequence, |c| c.max(last_sequence));
        if self.cursor == Some(next) {
            if last_sequence < next {
                debug!(cursor = next, last_sequence, "stale response; cursor kept");
            }
        } else {
            debug!(from = ?self.cursor, to = next, "cursor advanced");
        }
        self.cursor = Some(next);
        next
    }

    /// Adopt a restarted agent's `last_sequence` as the cursor.
    fn reset_cursor(&mut self, last_sequence: u64) -> u64 {
        info!(from = ?self.cursor, to = last_sequence, "cursor reset for new agent instance");
        self.cursor = Some(last_sequence);
        last_sequence
    }

    /// Whether `header` comes from a different agent instance than the
    /// last applied response.
    fn instance_changed(&self, header: &StreamHeader) -> bool {
        let previous = self
            .last_header
            .as_ref()
            .and_then(|h| h.instance_id.as_deref());
        match (previous, header.instance_id.as_deref()) {
            (Some(previous), Some(current)) if previous != current => {
                warn!(previous, current, "agent instance changed; sequence numbers restarted");
                true
            }
            _ => false,
        }
    }
}
