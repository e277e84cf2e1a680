// ── Agent response parsing ──
//
// Agents vary XML namespaces across protocol versions, so every element
// and attribute lookup here matches on local name only.

mod probe;
mod stream;

use chrono::{DateTime, NaiveDateTime, Utc};
use roxmltree::Node;

pub use probe::parse_probe;
pub use stream::{DataItemUpdate, StreamHeader, StreamResponse, parse_stream};

/// Offset-less ISO-8601 form used by older agents; read as UTC.
const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.f";

/// Parse an observation timestamp.
///
/// Accepts RFC 3339 (with `Z` or a numeric offset) and the offset-less
/// ISO-8601 form. Nothing locale-dependent is tried.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(raw, NAIVE_TIMESTAMP_FORMAT)
        .ok()
        .map(|naive| naive.and_utc())
}

fn local_name<'a>(node: Node<'a, '_>) -> &'a str {
    node.tag_name().name()
}

/// First descendant element (including `node`) with the given local name.
fn find_descendant<'a, 'i>(node: Node<'a, 'i>, name: &str) -> Option<Node<'a, 'i>> {
    node.descendants()
        .find(|n| n.is_element() && local_name(*n) == name)
}

/// Attribute value by local name, ignoring any namespace prefix.
fn attr(node: Node<'_, '_>, name: &str) -> Option<String> {
    node.attributes()
        .find(|a| a.name() == name)
        .map(|a| a.value().to_owned())
}

/// Concatenated text of all descendant text nodes.
fn text_content(node: Node<'_, '_>) -> String {
    node.descendants()
        .filter(Node::is_text)
        .filter_map(|n| n.text())
        .collect()
}
