use async_trait::async_trait;
use regex::Regex;
use reqwest::{Method, StatusCode};
use tracing::{debug, info};

use crate::aws::sigv4::encode_path;
use crate::aws::{AwsHttp, AwsRequest};
use crate::error::{Result, TermsyncError};
use super::{ObjectLocation, ObjectStore, ObjectSummary};

const SERVICE: &str = "s3";

/// S3 REST client
pub struct S3Store {
    http: AwsHttp,
    /// Custom endpoint for S3-compatible services; uses path-style addressing
    endpoint: Option<String>,
}

impl S3Store {
    pub fn new(http: AwsHttp, endpoint: Option<String>) -> Self {
        Self { http, endpoint }
    }

    /// Endpoint and path prefix for `bucket`
    fn bucket_endpoint(&self, bucket: &str) -> (String, String) {
        match &self.endpoint {
            Some(endpoint) => (
                endpoint.trim_end_matches('/').to_string(),
                format!("/{}", encode_path(bucket)),
            ),
            None => (
                format!("https://{}.s3.{}.amazonaws.com", bucket, self.http.region()),
                String::new(),
            ),
        }
    }

    fn object_request(&self, method: Method, location: &ObjectLocation) -> AwsRequest {
        let (endpoint, prefix) = self.bucket_endpoint(&location.bucket);
        let path = format!("{}/{}", prefix, encode_path(&location.key));
        AwsRequest::new(method, endpoint, path)
    }

    async fn error_body(response: reqwest::Response) -> String {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        let code = extract_tag(&body, "Code").unwrap_or_default();
        let message = extract_tag(&body, "Message").unwrap_or_default();
        if code.is_empty() {
            format!("HTTP {}", status)
        } else {
            format!("HTTP {} {}: {}", status, code, message)
        }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get_object(&self, location: &ObjectLocation) -> Result<Vec<u8>> {
        debug!("Fetching {}", location);
        let request = self.object_request(Method::GET, location);
        let response = self.http.send(SERVICE, request).await
            .map_err(|e| TermsyncError::Storage(format!("GET {} failed: {}", location, e)))?;

        match response.status() {
            status if status.is_success() => {
                let bytes = response.bytes().await
                    .map_err(|e| TermsyncError::Storage(format!("Failed to read {}: {}", location, e)))?;
                Ok(bytes.to_vec())
            }
            StatusCode::NOT_FOUND => Err(TermsyncError::NotFound(location.to_string())),
            _ => Err(TermsyncError::Storage(format!(
                "GET {} failed: {}", location, Self::error_body(response).await
            ))),
        }
    }

    async fn put_object(&self, location: &ObjectLocation, body: Vec<u8>, content_type: &str) -> Result<()> {
        let size = body.len();
        let request = self
            .object_request(Method::PUT, location)
            .header("content-type", content_type)
            .body(body);
        let response = self.http.send(SERVICE, request).await
            .map_err(|e| TermsyncError::Storage(format!("PUT {} failed: {}", location, e)))?;

        if !response.status().is_success() {
            return Err(TermsyncError::Storage(format!(
                "PUT {} failed: {}", location, Self::error_body(response).await
            )));
        }

        info!("Uploaded {} ({} bytes)", location, size);
        Ok(())
    }

    async fn list_objects(&self, bucket: &str, prefix: &str) -> Result<Vec<ObjectSummary>> {
        let mut objects = Vec::new();
        let mut continuation: Option<String> = None;

        loop {
            let (endpoint, path_prefix) = self.bucket_endpoint(bucket);
            let mut request = AwsRequest::new(Method::GET, endpoint, format!("{}/", path_prefix))
                .query("list-type", "2");
            if !prefix.is_empty() {
                request = request.query("prefix", prefix);
            }
            if let Some(token) = &continuation {
                request = request.query("continuation-token", token);
            }

            let response = self.http.send(SERVICE, request).await
                .map_err(|e| TermsyncError::Storage(format!("List s3://{} failed: {}", bucket, e)))?;

            match response.status() {
                status if status.is_success() => {}
                StatusCode::NOT_FOUND => {
                    return Err(TermsyncError::NotFound(format!("s3://{}", bucket)));
                }
                _ => {
                    return Err(TermsyncError::Storage(format!(
                        "List s3://{} failed: {}", bucket, Self::error_body(response).await
                    )));
                }
            }

            let body = response.text().await
                .map_err(|e| TermsyncError::Storage(format!("Failed to read listing: {}", e)))?;
            let page = parse_list_response(&body)?;
            objects.extend(page.objects);

            match page.next_token {
                Some(token) if page.truncated => continuation = Some(token),
                _ => break,
            }
        }

        debug!("Listed {} objects in s3://{}/{}", objects.len(), bucket, prefix);
        Ok(objects)
    }
}

/// One page of a ListObjectsV2 response
#[derive(Debug, Default)]
struct ListPage {
    objects: Vec<ObjectSummary>,
    truncated: bool,
    next_token: Option<String>,
}

fn parse_list_response(xml: &str) -> Result<ListPage> {
    let contents = Regex::new(r"(?s)<Contents>(.*?)</Contents>")
        .map_err(|e| TermsyncError::Storage(format!("Invalid listing pattern: {}", e)))?;

    let mut page = ListPage::default();
    for capture in contents.captures_iter(xml) {
        let block = &capture[1];
        let Some(key) = extract_tag(block, "Key") else {
            continue;
        };
        page.objects.push(ObjectSummary {
            key,
            size: extract_tag(block, "Size")
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            last_modified: extract_tag(block, "LastModified"),
        });
    }

    page.truncated = extract_tag(xml, "IsTruncated").as_deref() == Some("true");
    page.next_token = extract_tag(xml, "NextContinuationToken");
    Ok(page)
}

/// Text of the first `<tag>` element, with XML entities decoded
fn extract_tag(xml: &str, tag: &str) -> Option<String> {
    let open = format!("<{}>", tag);
    let close = format!("</{}>", tag);
    let start = xml.find(&open)? + open.len();
    let end = xml[start..].find(&close)? + start;
    Some(unescape_xml(&xml[start..end]))
}

fn unescape_xml(text: &str) -> String {
    text.replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&apos;", "'")
        .replace("&amp;", "&")
}
