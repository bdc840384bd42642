//! In-process session: command/event protocol and the actor that runs the engine

pub mod handler;
pub mod protocol;

pub use handler::{GameSession, SessionError, SessionHandle};
pub use protocol::{Command, CommandOutcome, GameEvent, Rejection, SessionMsg};
