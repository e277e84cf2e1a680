//! Shared fixtures: an in-memory agent and canned payloads.
#![allow(dead_code, clippy::unwrap_used)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use mtc_core::{ClientConfig, Fetch};
use url::Url;

pub const AGENT: &str = "http://agent.test/mill/";

pub const PROBE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MTConnectDevices xmlns="urn:mtconnect.org:MTConnectDevices:1.3">
  <Header creationTime="2024-03-09T16:23:30Z" instanceId="1455" bufferSize="131072"/>
  <Devices>
    <Device id="d1" name="Mill-1" uuid="mill-001">
      <DataItems>
        <DataItem id="avail" type="AVAILABILITY" category="EVENT"/>
      </DataItems>
      <Components>
        <Axes id="ax" name="base">
          <Components>
            <Linear id="x" name="X">
              <DataItems>
                <DataItem id="x1" name="Xact" type="POSITION" category="SAMPLE" units="MILLIMETER"/>
              </DataItems>
            </Linear>
          </Components>
        </Axes>
        <Controller id="cont">
          <DataItems>
            <DataItem id="mode" type="CONTROLLER_MODE" category="EVENT"/>
          </DataItems>
        </Controller>
      </Components>
    </Device>
  </Devices>
</MTConnectDevices>"#;

pub const DUPLICATE_PROBE: &str = r#"<MTConnectDevices><Devices>
  <Device id="d1"><DataItems><DataItem id="x1"/></DataItems></Device>
  <Device id="d2"><DataItems><DataItem id="x1"/></DataItems></Device>
</Devices></MTConnectDevices>"#;

/// A streams document with the given header sequence and
/// `(id, timestamp, value)` observations, in document order.
pub fn streams(last_sequence: u64, updates: &[(&str, &str, &str)]) -> String {
    streams_from_instance("1455", last_sequence, updates)
}

pub fn streams_from_instance(
    instance_id: &str,
    last_sequence: u64,
    updates: &[(&str, &str, &str)],
) -> String {
    let body: String = updates
        .iter()
        .map(|(id, ts, value)| {
            format!(r#"<Observation dataItemId="{id}" timestamp="{ts}">{value}</Observation>"#)
        })
        .collect();
    format!(
        r#"<MTConnectStreams xmlns="urn:mtconnect.org:MTConnectStreams:1.3">
  <Header instanceId="{instance_id}" lastSequence="{last_sequence}"/>
  <Streams><DeviceStream name="Mill-1"><ComponentStream componentId="x"><Samples>{body}</Samples></ComponentStream></DeviceStream></Streams>
</MTConnectStreams>"#
    )
}

/// Like [`streams_from_instance`], with a `sequence` attribute on every
/// `(id, sequence, timestamp, value)` observation.
pub fn sequenced(
    instance_id: &str,
    last_sequence: u64,
    updates: &[(&str, u64, &str, &str)],
) -> String {
    let body: String = updates
        .iter()
        .map(|(id, seq, ts, value)| {
            format!(
                r#"<Observation dataItemId="{id}" sequence="{seq}" timestamp="{ts}">{value}</Observation>"#
            )
        })
        .collect();
    format!(
        r#"<MTConnectStreams xmlns="urn:mtconnect.org:MTConnectStreams:1.3">
  <Header instanceId="{instance_id}" lastSequence="{last_sequence}"/>
  <Streams><DeviceStream name="Mill-1"><ComponentStream componentId="x"><Samples>{body}</Samples></ComponentStream></DeviceStream></Streams>
</MTConnectStreams>"#
    )
}

pub const OUT_OF_RANGE: &str = r#"<MTConnectError xmlns="urn:mtconnect.org:MTConnectError:1.3">
  <Header instanceId="9999"/>
  <Errors><Error errorCode="OUT_OF_RANGE">'at' must be less than or equal to 3.</Error></Errors>
</MTConnectError>"#;

pub fn config() -> ClientConfig {
    ClientConfig::for_agent(AGENT)
}

// ── ScriptedFetcher ─────────────────────────────────────────────────

/// In-memory agent: replies with queued bodies in order and records
/// every requested URL. Cloning shares the script.
#[derive(Debug, Clone, Default)]
pub struct ScriptedFetcher {
    inner: Arc<Script>,
}

#[derive(Debug, Default)]
struct Script {
    replies: Mutex<VecDeque<Result<String, mtc_api::Error>>>,
    requests: Mutex<Vec<String>>,
}

impl ScriptedFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reply(&self, body: impl Into<String>) -> &Self {
        self.inner.replies.lock().unwrap().push_back(Ok(body.into()));
        self
    }

    pub fn fail(&self, error: mtc_api::Error) -> &Self {
        self.inner.replies.lock().unwrap().push_back(Err(error));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.inner.requests.lock().unwrap().clone()
    }

    pub fn last_request(&self) -> Option<String> {
        self.inner.requests.lock().unwrap().last().cloned()
    }

    pub fn pending(&self) -> usize {
        self.inner.replies.lock().unwrap().len()
    }
}

impl Fetch for ScriptedFetcher {
    async fn fetch(&self, url: &Url) -> Result<String, mtc_api::Error> {
        self.inner.requests.lock().unwrap().push(url.to_string());
        self.inner
            .replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                Err(mtc_api::Error::HttpStatus {
                    status: 503,
                    url: url.to_string(),
                })
            })
    }
}
