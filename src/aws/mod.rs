// Signed HTTP access to AWS services
//
// The S3 and Translate clients share one reqwest client and one credential
// set; every request is signed with SigV4 just before it is sent. Missing
// credentials only fail the first request that needs them.

pub mod sigv4;

use chrono::Utc;
use reqwest::{Client, Method, Response};
use std::time::Duration;
use tracing::debug;

use crate::config::AwsConfig;
use crate::error::{Result, TermsyncError};

/// Static AWS credentials
#[derive(Clone)]
pub struct Credentials {
    pub access_key_id: String,
    pub secret_access_key: String,
    pub session_token: Option<String>,
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"<redacted>")
            .field("session_token", &self.session_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

impl Credentials {
    /// Credentials from the configuration file, if present
    pub fn from_config(config: &AwsConfig) -> Option<Self> {
        match (&config.access_key_id, &config.secret_access_key) {
            (Some(id), Some(secret)) => Some(Self {
                access_key_id: id.clone(),
                secret_access_key: secret.clone(),
                session_token: config.session_token.clone(),
            }),
            _ => None,
        }
    }

    /// Credentials from the standard AWS environment variables
    pub fn from_env() -> Result<Self> {
        let access_key_id = std::env::var("AWS_ACCESS_KEY_ID")
            .map_err(|_| TermsyncError::Config("AWS_ACCESS_KEY_ID is not set".to_string()))?;
        let secret_access_key = std::env::var("AWS_SECRET_ACCESS_KEY")
            .map_err(|_| TermsyncError::Config("AWS_SECRET_ACCESS_KEY is not set".to_string()))?;
        let session_token = std::env::var("AWS_SESSION_TOKEN").ok().filter(|t| !t.is_empty());

        Ok(Self {
            access_key_id,
            secret_access_key,
            session_token,
        })
    }

    /// Configured credentials, falling back to the environment
    pub fn resolve(config: &AwsConfig) -> Result<Self> {
        match Self::from_config(config) {
            Some(credentials) => Ok(credentials),
            None => Self::from_env(),
        }
    }
}

/// A request ready to be signed and sent
pub struct AwsRequest {
    pub method: Method,
    /// Base URL without path, e.g. `https://translate.us-east-1.amazonaws.com`
    pub endpoint: String,
    /// URI-encoded path starting with `/`
    pub path: String,
    pub query: Vec<(String, String)>,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl AwsRequest {
    pub fn new(method: Method, endpoint: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method,
            endpoint: endpoint.into(),
            path: path.into(),
            query: Vec::new(),
            headers: Vec::new(),
            body: Vec::new(),
        }
    }

    pub fn query(mut self, name: &str, value: &str) -> Self {
        self.query.push((name.to_string(), value.to_string()));
        self
    }

    pub fn header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_string(), value.to_string()));
        self
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = body;
        self
    }
}

/// Shared signed HTTP transport
#[derive(Clone)]
pub struct AwsHttp {
    client: Client,
    credentials: Option<Credentials>,
    region: String,
}

impl AwsHttp {
    pub fn new(config: &AwsConfig, credentials: Option<Credentials>) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("termsync/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            credentials,
            region: config.region.clone(),
        })
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// Sign and send a request for `service`. The response is returned as-is;
    /// callers map status codes to their own error kinds.
    pub async fn send(&self, service: &str, request: AwsRequest) -> Result<Response> {
        let credentials = self.credentials.as_ref().ok_or_else(|| {
            TermsyncError::Config(
                "No AWS credentials: set aws.access_key_id and aws.secret_access_key, \
                 or AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY"
                    .to_string(),
            )
        })?;
        let host = host_of(&request.endpoint)?;
        let signing = sigv4::SigningRequest {
            method: request.method.as_str(),
            host: &host,
            path: &request.path,
            query: &request.query,
            headers: &request.headers,
            payload: &request.body,
        };
        let signed = sigv4::sign(&signing, credentials, &self.region, service, Utc::now());

        let mut url = format!("{}{}", request.endpoint.trim_end_matches('/'), request.path);
        if !request.query.is_empty() {
            // same encoding as the signature, so the server sees what was signed
            url.push('?');
            url.push_str(&sigv4::canonical_query(&request.query));
        }
        debug!("{} {} ({} bytes)", request.method, url, request.body.len());

        let mut builder = self.client.request(request.method.clone(), &url);
        for (name, value) in &signed.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }

        let response = builder.body(request.body).send().await?;
        Ok(response)
    }
}

/// Host (and port, if any) of an endpoint URL
pub fn host_of(endpoint: &str) -> Result<String> {
    let without_scheme = endpoint
        .split_once("://")
        .map(|(_, rest)| rest)
        .unwrap_or(endpoint);
    let host = without_scheme.split('/').next().unwrap_or_default();

    if host.is_empty() {
        return Err(TermsyncError::Config(format!("Invalid endpoint: {}", endpoint)));
    }
    Ok(host.to_string())
}
