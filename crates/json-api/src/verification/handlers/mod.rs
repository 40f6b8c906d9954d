//! Verification Handlers

pub(crate) mod send;
pub(crate) mod verify;
