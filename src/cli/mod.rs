//! CLI module

pub mod commands;

pub use commands::Cli;

pub fn run(cli: Cli) -> anyhow::Result<()> {
    commands::run(cli)
}
