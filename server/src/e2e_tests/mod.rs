//! End-to-end tests at the handler level.
//!
//! Requests go through the real extractors and handlers with an in-memory
//! user store; only the network listener is skipped.

#![cfg(test)]

mod helpers;

mod test_current_user;
mod test_login;
mod test_register;
mod test_update_user;
