//! # imagetyperz-client
//!
//! Async client for the [ImageTyperz](https://www.imagetyperz.com) CAPTCHA
//! solving service: submit image CAPTCHAs and reCAPTCHAs, poll for results,
//! and query the account balance.
//!
//! The vendor reports everything as plain text, including a transient
//! "not decoded yet" sentinel while human workers are on the job. The
//! `retrieve_*` operations surface that as [`Error::NotDecoded`]; the
//! `complete_*` operations absorb it into a polling loop and only return
//! once the job is terminal.
//!
//! ## Example
//!
//! ```no_run
//! use imagetyperz_client::{ImageTyperzClient, RecaptchaRequest, RecaptchaType};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ImageTyperzClient::new("ACCESS_TOKEN")?;
//!     println!("balance: {}", client.retrieve_balance().await?);
//!
//!     let request = RecaptchaRequest::new("https://example.com", "SITE_KEY")
//!         .with_kind(RecaptchaType::Invisible);
//!     let g_response = client.complete_recaptcha(&request).await?;
//!     println!("g-response: {g_response}");
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```

mod client;
mod types;

pub mod decode;
pub mod error;
pub mod poll;
pub mod transport;

pub use crate::client::{ImageTyperzClient, ImageTyperzClientBuilder, endpoints};

pub use crate::decode::{JobOutcome, SentinelTable};

pub use crate::error::{Error, Result, SubmissionError, SubmissionErrorKind};

pub use crate::poll::{DEFAULT_MAX_ATTEMPTS, DEFAULT_POLL_INTERVAL, PollConfig};

pub use crate::transport::{
    DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT, Params, ReqwestTransport, VendorTransport,
};

pub use crate::types::{
    Balance, ImageOptions, ImageSource, JobId, RecaptchaRequest, RecaptchaType,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
