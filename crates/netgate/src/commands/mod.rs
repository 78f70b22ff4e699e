//! Command dispatch: bridges CLI args -> API calls -> output formatting.

pub mod backup;
pub mod config_cmd;
pub mod dns;
pub mod evaluate;
pub mod groups;
pub mod logs;
pub mod network;
pub mod rules;
pub mod system;
pub mod util;

use netgate_api::NetgateClient;

use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

/// Dispatch an authenticated command to the appropriate handler.
pub async fn dispatch(
    cmd: Command,
    client: &NetgateClient,
    global: &GlobalOpts,
) -> Result<(), CliError> {
    match cmd {
        Command::Rules(args) => rules::handle(client, args, global).await,
        Command::Groups(args) => groups::handle(client, args, global).await,
        Command::Evaluate(args) => evaluate::handle(client, args, global).await,
        Command::Interfaces(args) => network::handle_interfaces(client, args, global).await,
        Command::Nat(args) => network::handle_nat(client, args, global).await,
        Command::Routes(args) => network::handle_routes(client, args, global).await,
        Command::Dns(args) => dns::handle(client, args, global).await,
        Command::Logs(args) => logs::handle(client, args, global).await,
        Command::Backup(args) => backup::handle(client, args, global).await,
        Command::Whoami => system::whoami(client, global).await,
        // Handled before login
        Command::Status
        | Command::Register { .. }
        | Command::Config(_)
        | Command::Completions(_) => unreachable!(),
    }
}
