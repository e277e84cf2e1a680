// ── Current/sample response → ordered updates ──

use chrono::{DateTime, Utc};
use roxmltree::{Document, Node};

use super::{attr, find_descendant, local_name, parse_timestamp, text_content};
use crate::error::CoreError;

const HEADER: &str = "Header";
const MTCONNECT_ERROR: &str = "MTConnectError";
const ERROR: &str = "Error";
const DATA_ITEM_ID: &str = "dataItemId";

/// Agent bookkeeping from the response `Header` element.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHeader {
    /// Sequence number of the newest observation the agent holds.
    pub last_sequence: u64,
    pub instance_id: Option<String>,
    pub first_sequence: Option<u64>,
    pub next_sequence: Option<u64>,
}

/// One observation addressed to a data item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataItemUpdate {
    pub data_item_id: String,
    pub timestamp: DateTime<Utc>,
    /// Raw text content of the observation element.
    pub value: String,
    /// Observation element name, e.g. `Position` or `Normal`.
    pub element: String,
    pub sequence: Option<u64>,
}

/// A parsed current/sample response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamResponse {
    pub header: StreamHeader,
    /// Sorted by timestamp ascending; ties keep document order.
    pub updates: Vec<DataItemUpdate>,
}

impl StreamResponse {
    pub fn last_sequence(&self) -> u64 {
        self.header.last_sequence
    }
}

/// Parse a current or sample payload.
///
/// Any element carrying a `dataItemId` attribute is an update. A header
/// with no updates is a valid "nothing new" response.
pub fn parse_stream(xml: &str) -> Result<StreamResponse, CoreError> {
    let doc = Document::parse(xml)
        .map_err(|e| CoreError::malformed_stream(format!("invalid XML: {e}")))?;
    let root = doc.root_element();

    if local_name(root) == MTCONNECT_ERROR {
        return Err(agent_error(root));
    }

    let header_node = find_descendant(root, HEADER)
        .ok_or_else(|| CoreError::malformed_stream("no Header element"))?;
    let header = parse_header(header_node)?;

    let mut updates = root
        .descendants()
        .filter(|n| n.is_element())
        .filter_map(|n| attr(n, DATA_ITEM_ID).map(|id| (n, id)))
        .map(|(n, id)| parse_update(n, id))
        .collect::<Result<Vec<_>, _>>()?;

    // Stable: equal timestamps keep document order.
    updates.sort_by_key(|u| u.timestamp);

    Ok(StreamResponse { header, updates })
}

fn parse_header(node: Node<'_, '_>) -> Result<StreamHeader, CoreError> {
    let raw = attr(node, "lastSequence")
        .ok_or_else(|| CoreError::malformed_stream("Header has no lastSequence attribute"))?;
    let last_sequence = raw.trim().parse::<u64>().map_err(|_| {
        CoreError::malformed_stream(format!("non-numeric lastSequence '{raw}'"))
    })?;

    Ok(StreamHeader {
        last_sequence,
        instance_id: attr(node, "instanceId"),
        first_sequence: attr(node, "firstSequence").and_then(|s| s.trim().parse().ok()),
        next_sequence: attr(node, "nextSequence").and_then(|s| s.trim().parse().ok()),
    })
}

fn parse_update(node: Node<'_, '_>, data_item_id: String) -> Result<DataItemUpdate, CoreError> {
    let raw = attr(node, "timestamp").unwrap_or_default();
    let Some(timestamp) = parse_timestamp(&raw) else {
        return Err(CoreError::MalformedTimestamp {
            data_item_id,
            value: raw,
        });
    };

    Ok(DataItemUpdate {
        data_item_id,
        timestamp,
        value: text_content(node),
        element: local_name(node).to_owned(),
        sequence: attr(node, "sequence").and_then(|s| s.trim().parse().ok()),
    })
}

fn agent_error(root: Node<'_, '_>) -> CoreError {
    match find_descendant(root, ERROR) {
        Some(node) => CoreError::AgentError {
            code: attr(node, "errorCode").unwrap_or_else(|| "UNKNOWN".into()),
            message: text_content(node).trim().to_owned(),
        },
        None => CoreError::AgentError {
            code: "UNKNOWN".into(),
            message: "agent returned an error document".into(),
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    const SAMPLE: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<MTConnectStreams xmlns="urn:mtconnect.org:MTConnectStreams:1.3">
  <Header instanceId="1455" lastSequence="30" firstSequence="1" nextSequence="31"/>
  <Streams>
    <DeviceStream name="Mill-1" uuid="mill-001">
      <ComponentStream component="Linear" componentId="x">
        <Samples>
          <Position dataItemId="x1" timestamp="2024-03-09T16:23:32Z" sequence="28">12.5</Position>
          <Position dataItemId="x1" timestamp="2024-03-09T16:23:30Z" sequence="26">10.0</Position>
        </Samples>
      </ComponentStream>
      <ComponentStream component="Controller" componentId="cont">
        <Events>
          <ControllerMode dataItemId="mode" timestamp="2024-03-09T16:23:31Z" sequence="27">AUTOMATIC</ControllerMode>
        </Events>
        <Condition>
          <Normal dataItemId="system" timestamp="2024-03-09T16:23:30Z" sequence="25" type="SYSTEM"/>
        </Condition>
      </ComponentStream>
    </DeviceStream>
  </Streams>
</MTConnectStreams>"#;

    fn ids(response: &StreamResponse) -> Vec<&str> {
        response
            .updates
            .iter()
            .map(|u| u.data_item_id.as_str())
            .collect()
    }

    #[test]
    fn header_fields_are_read() {
        let response = parse_stream(SAMPLE).unwrap();
        assert_eq!(
            response.header,
            StreamHeader {
                last_sequence: 30,
                instance_id: Some("1455".into()),
                first_sequence: Some(1),
                next_sequence: Some(31),
            }
        );
    }

    #[test]
    fn updates_sorted_by_timestamp_with_stable_ties() {
        let response = parse_stream(SAMPLE).unwrap();

        // x1@:30 precedes system@:30 in the document, so it stays first.
        assert_eq!(ids(&response), ["x1", "system", "mode", "x1"]);
        let values: Vec<&str> = response.updates.iter().map(|u| u.value.as_str()).collect();
        assert_eq!(values, ["10.0", "", "AUTOMATIC", "12.5"]);
    }

    #[test]
    fn update_carries_element_and_sequence() {
        let response = parse_stream(SAMPLE).unwrap();
        let mode = &response.updates[2];
        assert_eq!(mode.element, "ControllerMode");
        assert_eq!(mode.sequence, Some(27));
        assert_eq!(response.updates[1].element, "Normal");
    }

    #[test]
    fn header_without_updates_is_empty_response() {
        let xml = r#"<MTConnectStreams><Header lastSequence="10"/><Streams/></MTConnectStreams>"#;
        let response = parse_stream(xml).unwrap();
        assert_eq!(response.last_sequence(), 10);
        assert!(response.updates.is_empty());
    }

    #[test]
    fn missing_header_is_malformed() {
        let xml = r#"<MTConnectStreams><Streams/></MTConnectStreams>"#;
        let err = parse_stream(xml).unwrap_err();
        assert!(matches!(err, CoreError::MalformedStreamResponse { .. }));
    }

    #[test]
    fn missing_or_non_numeric_last_sequence_is_malformed() {
        for header in [r#"<Header/>"#, r#"<Header lastSequence="ten"/>"#] {
            let xml = format!("<MTConnectStreams>{header}</MTConnectStreams>");
            let err = parse_stream(&xml).unwrap_err();
            assert!(
                matches!(err, CoreError::MalformedStreamResponse { .. }),
                "{header}: {err:?}"
            );
        }
    }

    #[test]
    fn bad_timestamp_names_the_data_item() {
        let xml = r#"<MTConnectStreams><Header lastSequence="3"/>
            <Position dataItemId="x1" timestamp="03/09/2024 16:23">1</Position>
        </MTConnectStreams>"#;
        match parse_stream(xml).unwrap_err() {
            CoreError::MalformedTimestamp {
                data_item_id,
                value,
            } => {
                assert_eq!(data_item_id, "x1");
                assert_eq!(value, "03/09/2024 16:23");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn missing_timestamp_is_malformed_timestamp() {
        let xml = r#"<MTConnectStreams><Header lastSequence="3"/><Position dataItemId="x1">1</Position></MTConnectStreams>"#;
        assert!(matches!(
            parse_stream(xml).unwrap_err(),
            CoreError::MalformedTimestamp { .. }
        ));
    }

    #[test]
    fn agent_error_document_is_reported() {
        let xml = r#"<MTConnectError xmlns="urn:mtconnect.org:MTConnectError:1.3">
  <Header instanceId="1" />
  <Errors>
    <Error errorCode="OUT_OF_RANGE">'at' must be greater than 0</Error>
  </Errors>
</MTConnectError>"#;
        match parse_stream(xml).unwrap_err() {
            CoreError::AgentError { code, message } => {
                assert_eq!(code, "OUT_OF_RANGE");
                assert_eq!(message, "'at' must be greater than 0");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }
}
