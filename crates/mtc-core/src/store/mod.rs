// ── Data item storage ──
//
// Id-indexed access to the probed device model.

mod registry;

pub use registry::DataItemRegistry;
