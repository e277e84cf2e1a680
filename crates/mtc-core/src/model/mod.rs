// ── Device model ──
//
// The immutable topology an agent reports from `probe`, plus the bounded
// per-item sample history that streaming fills in.

pub mod data_item;
pub mod device;
pub mod history;

pub use data_item::{DataItem, DataItemSample};
pub use device::{Component, Device, DeviceModel, ItemPath};
pub use history::{DEFAULT_BUFFER_SIZE, SampleHistory};
