//! JSON-lines host mode.
//!
//! The `voxring` binary is embedded by a host UI that owns the session
//! transport and the window. The host reports session lifecycle changes,
//! resizes and visibility over stdin; voxring answers with ring geometry,
//! session requests and capture notifications on stdout.
//!
//! Protocol:
//! - Each line is a JSON object
//! - Events (voxring → host): {"event": "...", ...}
//! - Commands (host → voxring): {"cmd": "...", ...}

mod protocol;
mod session;


pub use protocol::{Dispatch, HostCommand, HostEvent};
pub use session::{build_parts, run_host_loop, run_host_mode};
