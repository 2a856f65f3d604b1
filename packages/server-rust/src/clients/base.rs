//! Shared HTTP plumbing for every upstream client.
//!
//! Each call picks up the active correlation context (if any): the
//! identifier goes out as the `x-request-id` header and the whole field bag
//! is attached to the call's start and end log lines as a JSON `context`
//! field. Calls made outside a
//! request (background work) simply go out without the header.

use std::time::{Duration, Instant};

use reqwest::Method;
use selfservice_core::{ContextFields, CorrelationId};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{error, info, warn};

use super::error::{error_message, ClientError};
use crate::context::{current, current_id, CORRELATION_HEADER};

/// Attempts made for a `GET` whose connection could not be established.
const MAX_GET_ATTEMPTS: u32 = 2;

/// Field key for the correlation identifier in log output.
pub const CORRELATION_ID_KEY: &str = "correlation_id";

/// Structured logging fields for an outbound call made right now.
///
/// The active request's context fields plus its correlation identifier;
/// empty outside a request.
#[must_use]
pub fn logging_fields() -> ContextFields {
    let mut fields = current().map(|ctx| ctx.fields).unwrap_or_default();
    if let Some(id) = current_id() {
        fields.insert(CORRELATION_ID_KEY, id.to_string());
    }
    fields
}

/// Percent-encodes `raw` as a single URL path segment.
///
/// Caller-supplied ids go through here so a `/`, `?` or `#` inside one
/// cannot change which upstream resource is addressed.
#[must_use]
pub fn path_segment(raw: &str) -> String {
    let mut url = reqwest::Url::parse("http://localhost/")
        .unwrap_or_else(|_| unreachable!("literal base url parses"));
    url.path_segments_mut()
        .unwrap_or_else(|()| unreachable!("http urls have path segments"))
        .pop_if_empty()
        .push(raw);
    url.path().trim_start_matches('/').to_string()
}

/// JSON-over-HTTP client bound to one upstream service.
#[derive(Debug, Clone)]
pub struct BaseClient {
    service: &'static str,
    base_url: String,
    http: reqwest::Client,
}

impl BaseClient {
    /// Creates a client for `service` rooted at `base_url`.
    ///
    /// # Errors
    ///
    /// Returns `ClientError::Build` if the TLS backend cannot be initialised.
    pub fn new(
        service: &'static str,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ClientError> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(ClientError::Build)?;
        Ok(Self {
            service,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    #[must_use]
    pub fn service(&self) -> &'static str {
        self.service
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// `GET` a JSON resource.
    ///
    /// # Errors
    ///
    /// Transport failures, non-2xx statuses, and undecodable bodies.
    pub async fn get_json<T: DeserializeOwned>(
        &self,
        path: &str,
        query: &[(&str, String)],
        description: &str,
    ) -> Result<T, ClientError> {
        let response = self
            .send(Method::GET, path, query, None::<&()>, description)
            .await?;
        self.decode(response).await
    }

    /// `POST` a JSON body and decode the JSON reply.
    ///
    /// # Errors
    ///
    /// Transport failures, non-2xx statuses, and undecodable bodies.
    pub async fn post_json<B, T>(&self, path: &str, body: &B, description: &str) -> Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self
            .send(Method::POST, path, &[], Some(body), description)
            .await?;
        self.decode(response).await
    }

    /// `PATCH` a JSON body, ignoring the reply body.
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx statuses.
    pub async fn patch<B>(&self, path: &str, body: &B, description: &str) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::PATCH, path, &[], Some(body), description)
            .await
            .map(drop)
    }

    /// `DELETE` with an optional JSON body, ignoring the reply body.
    ///
    /// # Errors
    ///
    /// Transport failures and non-2xx statuses.
    pub async fn delete<B>(&self, path: &str, body: Option<&B>, description: &str) -> Result<(), ClientError>
    where
        B: Serialize + ?Sized,
    {
        self.send(Method::DELETE, path, &[], body, description)
            .await
            .map(drop)
    }

    async fn decode<T: DeserializeOwned>(&self, response: reqwest::Response) -> Result<T, ClientError> {
        response.json::<T>().await.map_err(|source| ClientError::Decode {
            service: self.service,
            source,
        })
    }

    async fn send<B>(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, String)],
        body: Option<&B>,
        description: &str,
    ) -> Result<reqwest::Response, ClientError>
    where
        B: Serialize + ?Sized,
    {
        let url = self.url(path);
        let correlation_id = current_id();
        let fields = logging_fields();
        let correlation = correlation_id.as_ref().map(CorrelationId::as_str);

        info!(
            service = self.service,
            method = %method,
            url = %url,
            correlation_id = correlation,
            context = %fields,
            "calling {} to {}",
            self.service,
            description
        );

        let started = Instant::now();
        let mut attempt = 0;
        let result = loop {
            attempt += 1;
            let mut request = self.http.request(method.clone(), &url);
            if !query.is_empty() {
                request = request.query(query);
            }
            if let Some(id) = correlation {
                request = request.header(CORRELATION_HEADER, id);
            }
            if let Some(body) = body {
                request = request.json(body);
            }

            match request.send().await {
                Err(e) if e.is_connect() && method == Method::GET && attempt < MAX_GET_ATTEMPTS => {
                    warn!(
                        service = self.service,
                        url = %url,
                        correlation_id = correlation,
                        attempt,
                        error = %e,
                        "connection to {} failed, retrying",
                        self.service
                    );
                }
                other => break other,
            }
        };
        let elapsed = started.elapsed();
        let elapsed_ms = u64::try_from(elapsed.as_millis()).unwrap_or(u64::MAX);

        match result {
            Ok(response) => {
                let status = response.status();
                record_call(self.service, &method, &status.as_u16().to_string(), elapsed);
                info!(
                    service = self.service,
                    method = %method,
                    url = %url,
                    status = status.as_u16(),
                    elapsed_ms,
                    correlation_id = correlation,
                    context = %fields,
                    "{} to {} ended",
                    method,
                    url
                );
                if status.is_success() {
                    return Ok(response);
                }
                let body = response.text().await.unwrap_or_default();
                Err(ClientError::Status {
                    service: self.service,
                    status: status.as_u16(),
                    message: error_message(&body),
                })
            }
            Err(source) => {
                record_call(self.service, &method, "error", elapsed);
                error!(
                    service = self.service,
                    method = %method,
                    url = %url,
                    elapsed_ms,
                    correlation_id = correlation,
                    context = %fields,
                    error = %source,
                    "{} to {} failed",
                    method,
                    url
                );
                Err(ClientError::Transport {
                    service: self.service,
                    source,
                })
            }
        }
    }
}

fn record_call(service: &'static str, method: &Method, status: &str, elapsed: Duration) {
    metrics::counter!(
        "selfservice_upstream_requests_total",
        "service" => service,
        "method" => method.to_string(),
        "status" => status.to_string(),
    )
    .increment(1);
    metrics::histogram!(
        "selfservice_upstream_request_duration_seconds",
        "service" => service,
    )
    .record(elapsed.as_secs_f64());
}
