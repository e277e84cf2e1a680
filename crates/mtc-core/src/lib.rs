//! Device model and polling session for MTConnect agents.
//!
//! - **[`ClientSession`]** - The state machine (`Unprobed` → `Probed` →
//!   `Streaming`). [`probe()`](ClientSession::probe) builds the
//!   [`DeviceModel`] and [`DataItemRegistry`]; [`current()`](ClientSession::current)
//!   and [`tick()`](ClientSession::tick) fetch stream responses and apply
//!   them to per-item [`SampleHistory`] buffers, advancing a sequence cursor.
//!
//! - **[`Client`]** - Cloneable handle that shares one session with a
//!   background poller driven by a [`Scheduler`], and re-publishes
//!   notifications as [`SessionEvent`]s.
//!
//! - **[`ChangeNotifier`]** - Synchronous observer registry for
//!   probe-completed, per-item, and per-batch change events.
//!
//! - **Parsing** ([`parse`]) - Namespace-agnostic probe and stream readers.

pub mod client;
pub mod config;
pub mod error;
pub mod model;
pub mod notify;
pub mod parse;
pub mod scheduler;
pub mod session;
pub mod store;

// ── Primary re-exports ──────────────────────────────────────────────
pub use client::{Client, SessionEvent};
pub use config::{ClientConfig, DEFAULT_AGENT_URL, DEFAULT_UPDATE_INTERVAL};
pub use error::CoreError;
pub use model::{
    Component, DEFAULT_BUFFER_SIZE, DataItem, DataItemSample, Device, DeviceModel, ItemPath,
    SampleHistory,
};
pub use notify::{ChangeNotifier, EventKind, SubscriptionId};
pub use parse::{DataItemUpdate, StreamHeader, StreamResponse, parse_probe, parse_stream};
pub use scheduler::{Scheduler, Tick, TokioScheduler};
pub use session::{ClientSession, CycleReport, SessionState};
pub use store::DataItemRegistry;

// Transport types callers need to build a session.
pub use mtc_api::{AgentEndpoints, Fetch, HttpFetcher, SampleUrlStyle};
