//! Session, credential, and transport plumbing for the remote platform.

pub mod auth;
pub mod session;
pub mod transport;
