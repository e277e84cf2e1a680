// ── Data items and samples ──

use std::num::NonZeroUsize;

use chrono::{DateTime, Utc};
use serde::Serialize;

use super::SampleHistory;
use crate::error::CoreError;

/// One observed value of a data item, as reported by the agent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataItemSample {
    /// Raw text content of the observation element.
    pub value: String,
    /// Agent-side timestamp of the observation.
    pub timestamp: DateTime<Utc>,
}

impl DataItemSample {
    pub fn new(value: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            value: value.into(),
            timestamp,
        }
    }
}

/// The atomic measurement point of a device.
///
/// Identity and description come from the probe and never change; the
/// sample history is the only mutable part.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DataItem {
    /// Unique across the whole device model; the dispatch key for updates.
    pub id: String,
    pub name: Option<String>,
    pub long_name: Option<String>,
    pub category: Option<String>,
    #[serde(rename = "type")]
    pub item_type: Option<String>,
    pub sub_type: Option<String>,
    pub units: Option<String>,
    pub native_units: Option<String>,
    history: SampleHistory,
}

impl DataItem {
    /// Create a data item with no descriptive attributes and an empty
    /// history bounded at `buffer_size`.
    pub fn new(id: impl Into<String>, buffer_size: usize) -> Self {
        Self {
            id: id.into(),
            name: None,
            long_name: None,
            category: None,
            item_type: None,
            sub_type: None,
            units: None,
            native_units: None,
            history: SampleHistory::with_capacity(buffer_size),
        }
    }

    /// Configured history capacity.
    pub fn buffer_size(&self) -> usize {
        self.history.capacity()
    }

    /// Resize the history. Shrinking drops the oldest samples; zero is rejected.
    pub fn set_buffer_size(&mut self, buffer_size: usize) -> Result<(), CoreError> {
        let Some(capacity) = NonZeroUsize::new(buffer_size) else {
            return Err(CoreError::InvalidBufferSize {
                id: self.id.clone(),
            });
        };
        self.history.set_capacity(capacity);
        Ok(())
    }

    pub fn current(&self) -> Option<&DataItemSample> {
        self.history.current()
    }

    pub fn previous(&self) -> Option<&DataItemSample> {
        self.history.previous()
    }

    pub fn history(&self) -> &SampleHistory {
        &self.history
    }

    /// Display name: `name`, falling back to `id`.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(&self.id)
    }

    pub(crate) fn push_sample(&mut self, sample: DataItemSample) {
        self.history.push(sample);
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    fn filled(id: &str, buffer_size: usize, count: u32) -> DataItem {
        let mut item = DataItem::new(id, buffer_size);
        for n in 1..=count {
            let ts = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, n).unwrap();
            item.push_sample(DataItemSample::new(n.to_string(), ts));
        }
        item
    }

    #[test]
    fn buffer_size_can_shrink_per_item() {
        let mut item = filled("x1", 10, 6);

        item.set_buffer_size(3).unwrap();

        assert_eq!(item.buffer_size(), 3);
        let values: Vec<&str> = item.history().iter().map(|s| s.value.as_str()).collect();
        assert_eq!(values, ["4", "5", "6"]);
    }

    #[test]
    fn zero_buffer_size_is_rejected() {
        let mut item = filled("x1", 4, 2);

        let err = item.set_buffer_size(0).unwrap_err();

        assert!(matches!(err, CoreError::InvalidBufferSize { ref id } if id == "x1"));
        assert_eq!(item.buffer_size(), 4);
        assert_eq!(item.history().len(), 2);
    }
}
