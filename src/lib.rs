/*!
 * pspawn
 * Child processes through posix_spawnp with explicit descriptor wiring
 *
 * Requests are marshaled into a per-call arena, spawned, and wrapped in a
 * Process handle that waits, signals and finally reaps the child.
 */

pub mod config;
pub mod errors;
pub mod fd;
mod marshal;
pub mod named;
pub mod positional;
pub mod process;
pub mod request;
pub mod signals;
pub mod spawn;
pub mod tracer;

// Re-exports
pub use config::Config;
pub use errors::{ErrorCategory, SpawnError, SpawnResult};
pub use fd::{dup, pipe};
pub use process::{Process, ProcessState, WaitMode, SIGNALED_EXIT_CODE};
pub use request::{FileAction, SpawnRequest};
pub use signals::SignalSet;
pub use spawn::{run, spawn};
pub use tracer::init_tracing;
