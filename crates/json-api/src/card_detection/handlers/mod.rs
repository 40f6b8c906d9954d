//! Card Detection Handlers
//!
//! Every route runs behind the user bearer middleware and only sees the caller's records.

pub(crate) mod check;
pub(crate) mod history;
pub(crate) mod products;
pub(crate) mod record;
pub(crate) mod regions;
pub(crate) mod result;
pub(crate) mod stats;
pub(crate) mod status;
pub(crate) mod summary;
