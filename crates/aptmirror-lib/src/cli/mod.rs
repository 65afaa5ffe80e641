mod args;
mod params;
mod resolved_command;
mod sync;

pub use args::{Args, Command, parse_args};
pub use params::SyncParams;
pub use resolved_command::{ResolvedCommand, resolve_command};
pub use sync::run_sync;
