//! Admin authentication

pub mod backend;
pub mod gate;
pub mod local;
pub mod password;

pub use backend::{AuthBackend, AuthEvent, AuthEventKind, Session, SessionSlot, User};
pub use gate::{AuthGate, AuthResult, GateDecision};
pub use local::{LocalAuth, store_credentials};
