mod descriptor;
mod handshake;
mod launcher;
mod orchestrate;
mod rexec;
mod state;

pub use descriptor::*;
pub use handshake::*;
pub use launcher::*;
pub use orchestrate::*;
pub use rexec::*;
pub use state::*;
