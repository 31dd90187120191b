//! Command dispatch.

pub mod artifacts;
pub mod config_cmd;
pub mod connection;
pub mod reports;
pub mod types;
pub mod util;

use crate::Context;
use crate::cli::{Command, GlobalOpts};
use crate::error::CliError;

pub async fn dispatch(cmd: Command, ctx: &Context, global: &GlobalOpts) -> Result<(), CliError> {
    match cmd {
        Command::Config(args) => config_cmd::handle(args, ctx, global).await,
        Command::Types(args) => types::handle(&args, ctx, global),
        Command::Test => connection::handle(ctx, global).await,
        Command::Generate(args) => reports::generate(args, ctx, global).await,
        Command::Batch(args) => reports::batch(args, ctx, global).await,
        Command::Search(args) => reports::search(args, ctx, global).await,
        Command::Filter(args) => reports::filter(args, ctx, global).await,
        Command::Reports(args) => artifacts::handle(args, ctx, global),
        Command::Completions(_) => Ok(()),
    }
}
