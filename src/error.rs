//! Error taxonomy shared across the crate.
//!
//! The vendor reports everything in-band as plain text, so most of these
//! variants originate in the decoder rather than in HTTP status codes.
//! [`Error::NotDecoded`] is special: it is the expected "still being solved"
//! signal that drives the polling loop, not a failure.

use std::time::Duration;

use thiserror::Error;

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors surfaced by the client.
#[derive(Debug, Error)]
pub enum Error {
    /// Network, connection, or HTTP timeout failure. Never retried
    /// automatically, not even inside the `complete_*` polling loop.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Base URL or endpoint path could not be assembled.
    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The response body matched no known vendor format. Usually indicates
    /// vendor-contract skew rather than a caller mistake.
    #[error("undecodable vendor response: {body:?}")]
    Decode { body: String },

    /// The vendor explicitly rejected the request.
    #[error("vendor rejected the request: {0}")]
    Submission(#[from] SubmissionError),

    /// The CAPTCHA is still being worked on. Retry the retrieval after the
    /// poll interval; `complete_*` does this for you.
    #[error("captcha not decoded yet")]
    NotDecoded,

    /// Operation attempted after the client's transport was released.
    #[error("client is closed")]
    ClientClosed,

    /// The overall deadline for a `complete_*` call expired mid-poll.
    #[error("solve timed out after {0:?}")]
    SolveTimedOut(Duration),

    /// The resubmission budget of a `complete_*` call was exhausted.
    #[error("maximum submission attempts ({0}) reached")]
    MaxAttemptsReached(usize),

    /// Caller-supplied options failed boundary validation.
    #[error("invalid options: {0}")]
    InvalidOptions(String),
}

impl Error {
    /// Whether this error is the transient "poll again later" signal.
    pub fn is_not_decoded(&self) -> bool {
        matches!(self, Error::NotDecoded)
    }
}

/// A vendor-stated rejection, carrying the raw error code alongside its
/// mapped classification.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{code}")]
pub struct SubmissionError {
    pub kind: SubmissionErrorKind,
    /// Verbatim code from the response body, kept for unmapped sentinels.
    pub code: String,
}

impl SubmissionError {
    pub fn new(kind: SubmissionErrorKind, code: impl Into<String>) -> Self {
        Self {
            kind,
            code: code.into(),
        }
    }
}

/// Classification of the vendor error codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubmissionErrorKind {
    /// Access token is invalid.
    AuthenticationFailed,
    /// Request was malformed as a whole (historically returned when the
    /// token reached the vendor in a mangled form).
    InvalidRequest,
    /// Wrong domain for the submitted site key.
    InvalidDomain,
    /// Wrong reCAPTCHA site key.
    InvalidSiteKey,
    /// Unknown or expired captcha job id.
    InvalidCaptchaId,
    /// Workers did not complete the captcha in time.
    ImageTimedOut,
    /// Vendor temporarily blocked the originating proxy.
    AutomatedQueries,
    /// Submitted captcha is not an invisible reCAPTCHA.
    NotInvisible,
    /// Vendor-side overload.
    LimitExceeded,
    /// Account has no funds left.
    OutOfBalance,
    /// Code not present in the sentinel table.
    Other,
}

impl SubmissionErrorKind {
    /// Whether resubmitting the same job is worthwhile. Used by the
    /// `complete_*` convenience calls.
    pub fn is_resubmittable(&self) -> bool {
        matches!(
            self,
            SubmissionErrorKind::ImageTimedOut | SubmissionErrorKind::LimitExceeded
        )
    }
}
