// mtc-api: Async HTTP transport for MTConnect agents

pub mod endpoints;
pub mod error;
pub mod fetch;
pub mod transport;

pub use endpoints::{AgentEndpoints, SampleUrlStyle};
pub use error::Error;
pub use fetch::{Fetch, HttpFetcher};
pub use transport::TransportConfig;
