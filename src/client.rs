//! High level client facade.
//!
//! Wires the transport, decoder, and polling engine into the externally
//! visible operations: balance, submit, single-shot retrieve, and the
//! submit-and-poll `complete_*` conveniences.

use std::sync::Arc;
use std::time::{Duration, Instant};

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use url::Url;

use crate::decode::{self, JobOutcome, SentinelTable};
use crate::error::{Error, Result, SubmissionErrorKind};
use crate::poll::{self, PollConfig};
use crate::transport::{
    DEFAULT_BASE_URL, DEFAULT_HTTP_TIMEOUT, Params, ReqwestTransport, VendorTransport,
};
use crate::types::{Balance, ImageOptions, ImageSource, JobId, RecaptchaRequest};

/// Vendor endpoint paths, relative to the base URL.
pub mod endpoints {
    pub const BALANCE: &str = "/Forms/RequestBalanceToken.ashx";
    pub const IMAGE_UPLOAD: &str = "/Forms/UploadFileAndGetTextNEWToken.ashx";
    pub const IMAGE_UPLOAD_URL: &str = "/Forms/FileUploadAndGetTextCaptchaURLToken.ashx";
    pub const IMAGE_RESULT: &str = "/Forms/GetCaptchaResponseToken.ashx";
    pub const RECAPTCHA_UPLOAD: &str = "/captchaapi/UploadRecaptchaToken.ashx";
    pub const RECAPTCHA_RESULT: &str = "/captchaapi/GetRecaptchaTextToken.ashx";
    pub const BAD_IMAGE: &str = "/Forms/SetBadImageToken.ashx";
}

/// Fluent builder for [`ImageTyperzClient`].
pub struct ImageTyperzClientBuilder {
    access_token: String,
    base_url: String,
    http_timeout: Duration,
    poll: PollConfig,
    sentinels: SentinelTable,
    transport: Option<Arc<dyn VendorTransport>>,
}

impl ImageTyperzClientBuilder {
    pub fn new(access_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            http_timeout: DEFAULT_HTTP_TIMEOUT,
            poll: PollConfig::default(),
            sentinels: SentinelTable::default(),
            transport: None,
        }
    }

    /// Point the client somewhere other than the production vendor host.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Per-request HTTP timeout.
    pub fn with_http_timeout(mut self, timeout: Duration) -> Self {
        self.http_timeout = timeout;
        self
    }

    /// Wait between status queries inside `complete_*`.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll.interval = interval;
        self
    }

    /// Resubmission budget for expired jobs inside `complete_*`.
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.poll.max_attempts = attempts.max(1);
        self
    }

    /// Overall deadline for one `complete_*` call.
    pub fn with_solve_timeout(mut self, timeout: Duration) -> Self {
        self.poll.solve_timeout = Some(timeout);
        self
    }

    /// Register or override a vendor error-code mapping.
    pub fn with_sentinel(mut self, code: impl Into<String>, kind: SubmissionErrorKind) -> Self {
        self.sentinels.insert(code, kind);
        self
    }

    /// Substitute the transport. Mainly a test seam; the token and HTTP
    /// settings of this builder are ignored when set.
    pub fn with_transport(mut self, transport: Arc<dyn VendorTransport>) -> Self {
        self.transport = Some(transport);
        self
    }

    pub fn build(self) -> Result<ImageTyperzClient> {
        let transport = match self.transport {
            Some(transport) => transport,
            None => {
                let base_url = Url::parse(&self.base_url)?;
                Arc::new(ReqwestTransport::new(
                    self.access_token,
                    base_url,
                    self.http_timeout,
                )?)
            }
        };
        Ok(ImageTyperzClient {
            transport,
            poll: self.poll,
            sentinels: self.sentinels,
        })
    }
}

/// Async client for the ImageTyperz CAPTCHA-solving service.
///
/// One instance owns one connection pool and may serve any number of
/// concurrent submit/poll sequences. [`ImageTyperzClient::close`] releases
/// the pool; every operation afterwards fails with [`Error::ClientClosed`].
/// Dropping the client without closing releases the pool implicitly and
/// logs a warning.
pub struct ImageTyperzClient {
    transport: Arc<dyn VendorTransport>,
    poll: PollConfig,
    sentinels: SentinelTable,
}

impl ImageTyperzClient {
    /// Client with default configuration.
    pub fn new(access_token: impl Into<String>) -> Result<Self> {
        Self::builder(access_token).build()
    }

    pub fn builder(access_token: impl Into<String>) -> ImageTyperzClientBuilder {
        ImageTyperzClientBuilder::new(access_token)
    }

    /// Funds left in the authenticated account, in USD.
    pub async fn retrieve_balance(&self) -> Result<Balance> {
        let params: Params = vec![("action", "REQUESTBALANCE".into())];
        let body = self.transport.get(endpoints::BALANCE, params).await?;
        decode::decode_balance(&body, &self.sentinels)
    }

    /// Submit an image CAPTCHA job.
    pub async fn submit_image(
        &self,
        source: &ImageSource,
        options: &ImageOptions,
    ) -> Result<JobId> {
        options.validate()?;

        let (path, image_data) = match source {
            ImageSource::Url(url) => (endpoints::IMAGE_UPLOAD_URL, url.clone()),
            ImageSource::Base64(contents) => (endpoints::IMAGE_UPLOAD, contents.clone()),
            ImageSource::Bytes(bytes) => (endpoints::IMAGE_UPLOAD, BASE64.encode(bytes)),
        };

        let mut params: Params = vec![("action", "UPLOADCAPTCHA".into()), ("file", image_data)];
        if options.case_sensitive {
            params.push(("iscase", "1".into()));
        }
        if options.phrase {
            params.push(("isphrase", "1".into()));
        }
        if options.math {
            params.push(("ismath", "1".into()));
        }
        if options.digits_only {
            params.push(("alphanumeric", "1".into()));
        } else if options.letters_only {
            params.push(("alphanumeric", "2".into()));
        }
        if let Some(min) = options.min_length {
            params.push(("minlength", min.to_string()));
        }
        if let Some(max) = options.max_length {
            params.push(("maxlength", max.to_string()));
        }

        log::trace!("submitting image captcha job");
        let body = self.transport.post(path, params).await?;
        let job_id = decode::decode_submission(&body, &self.sentinels)?;
        log::debug!("submitted image captcha job {job_id}");
        Ok(job_id)
    }

    /// Submit a reCAPTCHA job.
    pub async fn submit_recaptcha(&self, request: &RecaptchaRequest) -> Result<JobId> {
        let mut params: Params = vec![
            ("action", "UPLOADCAPTCHA".into()),
            ("pageurl", request.page_url.clone()),
            ("googlekey", request.site_key.clone()),
            ("recaptchatype", request.kind.wire_value().into()),
        ];
        if let Some(ref user_agent) = request.user_agent {
            params.push(("useragent", user_agent.clone()));
        }
        if let Some(ref action) = request.action {
            params.push(("captchaaction", action.clone()));
        }
        if let Some(score) = request.min_score {
            params.push(("score", score.to_string()));
        }
        if let Some(ref data_s) = request.data_s {
            params.push(("data-s", data_s.clone()));
        }

        log::trace!("submitting recaptcha job for {}", request.page_url);
        let body = self.transport.post(endpoints::RECAPTCHA_UPLOAD, params).await?;
        let job_id = decode::decode_submission(&body, &self.sentinels)?;
        log::debug!("submitted recaptcha job {job_id}");
        Ok(job_id)
    }

    /// Single status query for a submitted image job. [`Error::NotDecoded`]
    /// means "not ready yet, retry after the poll interval".
    pub async fn retrieve_image(&self, job_id: &JobId) -> Result<String> {
        self.retrieve(endpoints::IMAGE_RESULT, job_id).await
    }

    /// Single status query for a submitted reCAPTCHA job. On success the
    /// answer is the g-response used to bypass the captcha on the page.
    pub async fn retrieve_recaptcha(&self, job_id: &JobId) -> Result<String> {
        self.retrieve(endpoints::RECAPTCHA_RESULT, job_id).await
    }

    async fn retrieve(&self, path: &'static str, job_id: &JobId) -> Result<String> {
        let params: Params = vec![
            ("action", "GETTEXT".into()),
            ("captchaid", job_id.to_string()),
        ];
        let body = self.transport.get(path, params).await?;
        match decode::decode_result(&body, &self.sentinels) {
            JobOutcome::NotReady => Err(Error::NotDecoded),
            JobOutcome::Solved(answer) => {
                log::debug!("retrieved job {job_id}");
                Ok(answer)
            }
            JobOutcome::Failed(err) => Err(Error::Submission(err)),
        }
    }

    /// Submit an image CAPTCHA and await its answer.
    ///
    /// Polls at the configured interval; resubmits on expiry codes up to the
    /// attempt budget; honours the configured solve timeout. Dropping the
    /// future cancels the poll without closing the client.
    pub async fn complete_image(
        &self,
        source: &ImageSource,
        options: &ImageOptions,
    ) -> Result<String> {
        poll::with_solve_deadline(self.poll.solve_timeout, async {
            let started = Instant::now();
            for attempt in 1..=self.poll.max_attempts {
                let job_id = self.submit_image(source, options).await?;
                match poll::poll_until_solved(self.poll.interval, || {
                    self.retrieve_image(&job_id)
                })
                .await
                {
                    Ok(answer) => {
                        log::info!(
                            "solved image job {job_id} in {:?}",
                            started.elapsed()
                        );
                        return Ok(answer);
                    }
                    Err(Error::Submission(err)) if err.kind.is_resubmittable() => {
                        log::debug!(
                            "image job {job_id} expired ({err}); attempt {attempt} of {}",
                            self.poll.max_attempts
                        );
                    }
                    Err(err) => return Err(err),
                }
            }
            Err(Error::MaxAttemptsReached(self.poll.max_attempts))
        })
        .await
    }

    /// Submit a reCAPTCHA and await its g-response.
    ///
    /// Same polling, resubmission, and cancellation contract as
    /// [`ImageTyperzClient::complete_image`].
    pub async fn complete_recaptcha(&self, request: &RecaptchaRequest) -> Result<String> {
        poll::with_solve_deadline(self.poll.solve_timeout, async {
            let started = Instant::now();
            for attempt in 1..=self.poll.max_attempts {
                let job_id = self.submit_recaptcha(request).await?;
                match poll::poll_until_solved(self.poll.interval, || {
                    self.retrieve_recaptcha(&job_id)
                })
                .await
                {
                    Ok(answer) => {
                        log::info!(
                            "solved recaptcha job {job_id} in {:?}",
                            started.elapsed()
                        );
                        return Ok(answer);
                    }
                    Err(Error::Submission(err)) if err.kind.is_resubmittable() => {
                        log::debug!(
                            "recaptcha job {job_id} expired ({err}); attempt {attempt} of {}",
                            self.poll.max_attempts
                        );
                    }
                    Err(err) => return Err(err),
                }
            }
            Err(Error::MaxAttemptsReached(self.poll.max_attempts))
        })
        .await
    }

    /// Flag a wrongly solved image so the vendor refunds it.
    pub async fn report_bad_image(&self, job_id: &JobId) -> Result<()> {
        let params: Params = vec![
            ("action", "SETBADIMAGE".into()),
            ("imageid", job_id.to_string()),
        ];
        let body = self.transport.post(endpoints::BAD_IMAGE, params).await?;
        decode::decode_ack(&body, &self.sentinels)
    }

    /// Release the transport. Idempotent; in-flight operations on other
    /// tasks finish with the pool handle they already cloned.
    pub async fn close(&self) {
        self.transport.close().await;
    }

    pub async fn is_closed(&self) -> bool {
        self.transport.is_closed().await
    }
}
