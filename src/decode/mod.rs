//! Decoding of vendor response bodies.
//!
//! The vendor speaks plain text: a balance is a bare decimal, a submission
//! echoes the job id (optionally `id|answer` for image uploads), and every
//! failure is an `ERROR: <CODE>` marker embedded in the body. The sentinel
//! table mapping codes to classifications is extensible because the vendor
//! adds codes without versioning the API.

use std::collections::HashMap;

use crate::error::{Error, Result, SubmissionError, SubmissionErrorKind};
use crate::types::{Balance, JobId};

/// Marker prefixing every vendor error code.
pub const ERROR_MARKER: &str = "ERROR:";

/// Code meaning "still being solved". Matched exactly, per vendor contract;
/// it is the one code that is never a failure.
pub const NOT_DECODED_CODE: &str = "NOT_DECODED";

/// Maps vendor error codes to their classification.
#[derive(Debug, Clone)]
pub struct SentinelTable {
    codes: HashMap<String, SubmissionErrorKind>,
}

impl Default for SentinelTable {
    fn default() -> Self {
        let mut table = Self {
            codes: HashMap::new(),
        };
        table.insert("AUTHENTICATION_FAILED", SubmissionErrorKind::AuthenticationFailed);
        table.insert("INVALID_REQUEST", SubmissionErrorKind::InvalidRequest);
        table.insert("INVALID_DOMAIN", SubmissionErrorKind::InvalidDomain);
        table.insert("INVALID_SITEKEY", SubmissionErrorKind::InvalidSiteKey);
        table.insert("INVALID_CAPTCHA_ID", SubmissionErrorKind::InvalidCaptchaId);
        table.insert("IMAGE_TIMED_OUT", SubmissionErrorKind::ImageTimedOut);
        table.insert("AUTOMATED_QUERIES", SubmissionErrorKind::AutomatedQueries);
        table.insert("NOT_INVISIBLE", SubmissionErrorKind::NotInvisible);
        table.insert("LIMIT_EXCEED", SubmissionErrorKind::LimitExceeded);
        table.insert("OUT_OF_BALANCE", SubmissionErrorKind::OutOfBalance);
        table
    }
}

impl SentinelTable {
    /// Register or override a code mapping.
    pub fn insert(&mut self, code: impl Into<String>, kind: SubmissionErrorKind) {
        self.codes.insert(code.into(), kind);
    }

    /// Classify a code. Unmapped codes fall back to
    /// [`SubmissionErrorKind::Other`] instead of failing decode.
    pub fn classify(&self, code: &str) -> SubmissionErrorKind {
        self.codes
            .get(code)
            .copied()
            .unwrap_or(SubmissionErrorKind::Other)
    }
}

/// Outcome of a single status query for a submitted job.
#[derive(Debug, Clone, PartialEq)]
pub enum JobOutcome {
    /// Workers are still on it; poll again after the interval.
    NotReady,
    /// Terminal: the answer payload (captcha text or g-response).
    Solved(String),
    /// Terminal: the vendor gave up on the job.
    Failed(SubmissionError),
}

/// Extract the vendor error code from a body, if any.
fn error_code(text: &str) -> Option<&str> {
    text.split_once(ERROR_MARKER).map(|(_, code)| code.trim())
}

/// Turn an in-band error body into the matching [`Error`], or `None` when
/// the body carries no error marker.
fn vendor_error(text: &str, sentinels: &SentinelTable) -> Option<Error> {
    let code = error_code(text)?;
    if code == NOT_DECODED_CODE {
        return Some(Error::NotDecoded);
    }
    Some(Error::Submission(SubmissionError::new(
        sentinels.classify(code),
        code,
    )))
}

/// Parse a balance response: a bare decimal string.
pub fn decode_balance(text: &str, sentinels: &SentinelTable) -> Result<Balance> {
    if let Some(err) = vendor_error(text, sentinels) {
        return Err(err);
    }
    let raw = text.trim();
    if raw.is_empty() || raw.parse::<f64>().is_err() {
        return Err(Error::Decode { body: text.into() });
    }
    Ok(Balance::new(raw))
}

/// Parse a submission response into the vendor-issued job id.
///
/// Image uploads respond with `id|answer` when a worker was already free;
/// the trailing payload is ignored here and re-read through the result
/// endpoint so both captcha kinds share one lifecycle.
pub fn decode_submission(text: &str, sentinels: &SentinelTable) -> Result<JobId> {
    if let Some(err) = vendor_error(text, sentinels) {
        return Err(err);
    }
    let id = text.split('|').next().unwrap_or(text).trim();
    if id.is_empty() || !id.bytes().all(|b| b.is_ascii_digit()) {
        return Err(Error::Decode { body: text.into() });
    }
    Ok(JobId::new(id))
}

/// Parse a result-retrieval response.
///
/// Anything that is not an error marker is the answer itself, verbatim.
pub fn decode_result(text: &str, sentinels: &SentinelTable) -> JobOutcome {
    match vendor_error(text, sentinels) {
        Some(Error::NotDecoded) => JobOutcome::NotReady,
        Some(Error::Submission(err)) => JobOutcome::Failed(err),
        _ => JobOutcome::Solved(text.to_string()),
    }
}

/// Parse a fire-and-forget acknowledgement (e.g. a bad-image report).
/// Any body without an error marker counts as success.
pub fn decode_ack(text: &str, sentinels: &SentinelTable) -> Result<()> {
    match vendor_error(text, sentinels) {
        Some(err) => Err(err),
        None => Ok(()),
    }
}
