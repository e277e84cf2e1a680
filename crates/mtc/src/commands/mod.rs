pub mod config_cmd;
pub mod current;
pub mod probe;
pub mod stream;

mod util;

use mtc_core::{Client, HttpFetcher};

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// The client every agent command runs against.
pub type AgentClient = Client<HttpFetcher>;

/// Route an agent command to its handler.
pub async fn dispatch(
    cmd: Command,
    client: &AgentClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Probe(args) => probe::handle(client, args, global).await,
        Command::Current(args) => current::handle(client, args, global).await,
        Command::Stream(args) => stream::handle(client, args, global).await,
        // Config and Completions are handled before dispatch
        Command::Config(_) | Command::Completions(_) => unreachable!(),
    }
}
