mod bootstrap;
mod cli;

pub use bootstrap::{Bootstrap, BootstrapOutcome};
pub use cli::{run, Cli};
