//! Core data types of the vendor API surface.

use bytes::Bytes;

use crate::error::{Error, Result};

/// Vendor-issued identifier of one CAPTCHA-solving job.
///
/// The vendor documents ids as integers but returns them as text; the id is
/// kept verbatim and only validated to be numeric at decode time.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JobId(String);

impl JobId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for JobId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Account balance in USD.
///
/// The vendor returns a plain decimal string. The verbatim text is preserved
/// so no precision is lost to float rounding; [`Balance::as_f64`] gives a
/// lossy numeric view for display and comparisons.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Balance(String);

impl Balance {
    pub(crate) fn new(raw: impl Into<String>) -> Self {
        Self(raw.into())
    }

    /// Exact decimal text as reported by the vendor.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Numeric view. Lossy for values with more precision than an `f64`.
    pub fn as_f64(&self) -> f64 {
        self.0.parse().unwrap_or_default()
    }
}

impl std::fmt::Display for Balance {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Flavour of the Google reCAPTCHA being solved.
///
/// A closed set: the vendor rejects anything outside these wire values, so
/// invalid kinds are caught at the type boundary instead of the API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RecaptchaType {
    /// Regular, visible-on-page-load reCAPTCHA v2.
    #[default]
    Normal,
    /// Invisible-until-form-submission reCAPTCHA v2.
    Invisible,
    /// Score-based reCAPTCHA v3.
    V3,
}

impl RecaptchaType {
    /// Integer the vendor expects in the `recaptchatype` field.
    pub fn wire_value(&self) -> &'static str {
        match self {
            RecaptchaType::Normal => "1",
            RecaptchaType::Invisible => "2",
            RecaptchaType::V3 => "3",
        }
    }
}

/// Where the CAPTCHA image comes from.
#[derive(Debug, Clone)]
pub enum ImageSource {
    /// Raw image bytes; base64-encoded before upload.
    Bytes(Bytes),
    /// Image contents already base64-encoded by the caller.
    Base64(String),
    /// Publicly reachable URL the vendor fetches the image from.
    Url(String),
}

/// Hints given to the human workers about the expected answer.
#[derive(Debug, Clone, Default)]
pub struct ImageOptions {
    pub case_sensitive: bool,
    /// The image shows a math expression; the answer is its result.
    pub math: bool,
    /// The answer contains at least one space.
    pub phrase: bool,
    pub digits_only: bool,
    pub letters_only: bool,
    pub min_length: Option<u32>,
    pub max_length: Option<u32>,
}

impl ImageOptions {
    pub(crate) fn validate(&self) -> Result<()> {
        if self.digits_only && self.letters_only {
            return Err(Error::InvalidOptions(
                "only one of digits_only or letters_only may be set".into(),
            ));
        }
        Ok(())
    }
}

/// Parameters of a reCAPTCHA job submission.
#[derive(Debug, Clone)]
pub struct RecaptchaRequest {
    pub page_url: String,
    pub site_key: String,
    pub kind: RecaptchaType,
    pub user_agent: Option<String>,
    /// `action` parameter of a v3 reCAPTCHA.
    pub action: Option<String>,
    /// Minimum score targeted for a v3 reCAPTCHA.
    pub min_score: Option<f32>,
    /// One-time `data-s` token some reCAPTCHAs generate per load.
    pub data_s: Option<String>,
}

impl RecaptchaRequest {
    pub fn new(page_url: impl Into<String>, site_key: impl Into<String>) -> Self {
        Self {
            page_url: page_url.into(),
            site_key: site_key.into(),
            kind: RecaptchaType::default(),
            user_agent: None,
            action: None,
            min_score: None,
            data_s: None,
        }
    }

    pub fn with_kind(mut self, kind: RecaptchaType) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = Some(user_agent.into());
        self
    }

    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.action = Some(action.into());
        self
    }

    pub fn with_min_score(mut self, score: f32) -> Self {
        self.min_score = Some(score);
        self
    }

    pub fn with_data_s(mut self, data_s: impl Into<String>) -> Self {
        self.data_s = Some(data_s.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recaptcha_types_serialize_to_vendor_integers() {
        assert_eq!(RecaptchaType::Normal.wire_value(), "1");
        assert_eq!(RecaptchaType::Invisible.wire_value(), "2");
        assert_eq!(RecaptchaType::V3.wire_value(), "3");
    }

    #[test]
    fn exclusive_charset_hints_are_rejected() {
        let options = ImageOptions {
            digits_only: true,
            letters_only: true,
            ..Default::default()
        };
        assert!(matches!(
            options.validate(),
            Err(Error::InvalidOptions(_))
        ));
    }

    #[test]
    fn default_image_options_are_valid() {
        assert!(ImageOptions::default().validate().is_ok());
    }

    #[test]
    fn balance_preserves_vendor_text() {
        let balance = Balance::new("8.8325");
        assert_eq!(balance.as_str(), "8.8325");
        assert_eq!(balance.to_string(), "8.8325");
        assert!((balance.as_f64() - 8.8325).abs() < f64::EPSILON);
    }

    #[test]
    fn recaptcha_request_builder_accumulates_fields() {
        let request = RecaptchaRequest::new("https://example.com", "sitekey")
            .with_kind(RecaptchaType::V3)
            .with_action("login")
            .with_min_score(0.7);
        assert_eq!(request.kind, RecaptchaType::V3);
        assert_eq!(request.action.as_deref(), Some("login"));
        assert_eq!(request.min_score, Some(0.7));
        assert!(request.data_s.is_none());
    }
}
