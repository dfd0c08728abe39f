/*!
 * Process Module
 * Handle to a spawned child and its wait/signal/close lifecycle
 */

mod handle;
mod types;

pub use handle::Process;
pub use types::{ProcessState, WaitMode, SIGNALED_EXIT_CODE};
