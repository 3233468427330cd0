// handlers/mod.rs - Two-tier handler layout
//
// Public (no auth) handlers acquire tokens; protected handlers require a
// valid bearer token and receive the caller's identity explicitly.

pub mod protected;
pub mod public;
