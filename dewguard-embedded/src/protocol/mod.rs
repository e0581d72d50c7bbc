pub mod codec;
pub mod command;
pub mod console;
pub mod handler;

pub use codec::{FrameBuf, FrameWriter, parse_field, parse_fields};
pub use command::Command;
pub use console::SerialConsole;
pub use handler::{BANNER, HELP, Response};
