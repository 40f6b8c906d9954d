//! Card Detection Upstream Client

mod client;
mod config;
mod crypto;
mod errors;
pub mod regions;
mod types;

pub use client::*;
pub use config::*;
pub use crypto::{CardCrypto, CryptoError, ParamValue, SignParams};
pub use errors::*;
pub use types::{
    CardResult, CardStatus, CheckCardRequest, CheckCardResponse, CheckCardResultRequest,
    CheckCardResultResponse, ProductMark,
};
