mod display;
mod sink;
mod stream;

pub use display::{DisplayError, TerminalSink};
pub use sink::{RecordingSink, SimulatedFailure};
pub use stream::ScriptedStream;
