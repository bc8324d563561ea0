pub mod domain;
pub mod interpreter;
pub mod ports;

pub use domain::{Dream, Interpretation, PerspectiveText, User, UserCredentials};
pub use interpreter::{InterpretError, InterpretationRequester, Perspective};
pub use ports::{AuthStore, CompletionService, DreamStore, PortError, PortResult};
