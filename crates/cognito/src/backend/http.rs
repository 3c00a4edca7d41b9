//! HTTP backend speaking the JSON 1.1 protocol.
//!
//! Every operation is a `POST /` with the operation named in the
//! `X-Amz-Target` header and a JSON body. Errors come back as a non-2xx
//! status with a `{"__type": ..., "message": ...}` envelope.

use crate::backend::Backend;
use crate::error::{Error, Result};
use crate::types::{
    CreateResourceServerInput, DeleteResourceServerInput, DescribeResourceServerInput, Operation,
    ResourceServer, ResourceServerOutput, UpdateResourceServerInput,
};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Service prefix for the `X-Amz-Target` header.
const TARGET_PREFIX: &str = "AWSCognitoIdentityProviderService";

/// Content type of every request.
const CONTENT_TYPE: &str = "application/x-amz-json-1.1";

/// Per-request timeout.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Supplies authentication headers for outgoing requests.
///
/// Credential resolution is the caller's concern; the backend only asks for
/// the headers to attach to each request.
pub trait RequestAuth: Send + Sync {
    /// Headers to attach to a request for `operation` carrying `body`.
    fn headers(&self, operation: Operation, body: &str) -> Result<Vec<(String, String)>>;
}

/// Sends requests without authentication headers.
pub struct NoAuth;

impl RequestAuth for NoAuth {
    fn headers(&self, _operation: Operation, _body: &str) -> Result<Vec<(String, String)>> {
        Ok(Vec::new())
    }
}

/// Attaches one fixed header (e.g. `Authorization`) to every request.
pub struct StaticHeader {
    name: String,
    value: String,
}

impl StaticHeader {
    /// Create from a header name and value.
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }

    /// Parse a `Name: value` line.
    pub fn parse(line: &str) -> Result<Self> {
        let (name, value) = line
            .split_once(':')
            .ok_or_else(|| Error::Other(format!("invalid header '{line}', expected 'Name: value'")))?;
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Other(format!("invalid header '{line}', empty name")));
        }
        Ok(Self::new(name, value.trim()))
    }
}

impl RequestAuth for StaticHeader {
    fn headers(&self, _operation: Operation, _body: &str) -> Result<Vec<(String, String)>> {
        Ok(vec![(self.name.clone(), self.value.clone())])
    }
}

/// HTTP backend for the identity-provider service.
pub struct HttpBackend {
    agent: ureq::Agent,
    endpoint: String,
    auth: Box<dyn RequestAuth>,
}

impl HttpBackend {
    /// Create a backend for the regional public endpoint.
    pub fn for_region(region: &str) -> Self {
        Self::with_endpoint(regional_endpoint(region))
    }

    /// Create a backend against an explicit endpoint (e.g. a local emulator).
    pub fn with_endpoint(endpoint: impl Into<String>) -> Self {
        let agent: ureq::Agent = ureq::Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(Some(REQUEST_TIMEOUT))
            .build()
            .into();
        Self {
            agent,
            endpoint: endpoint.into(),
            auth: Box::new(NoAuth),
        }
    }

    /// Replace the request authentication.
    pub fn with_auth(mut self, auth: Box<dyn RequestAuth>) -> Self {
        self.auth = auth;
        self
    }

    /// The endpoint requests are sent to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn call<I, O>(&self, operation: Operation, input: &I) -> Result<O>
    where
        I: Serialize,
        O: DeserializeOwned,
    {
        let body = serde_json::to_string(input)?;
        log::trace!("{} request: {}", operation, body);

        let mut request = self
            .agent
            .post(&self.endpoint)
            .header("Content-Type", CONTENT_TYPE)
            .header("X-Amz-Target", target_header(operation));
        for (name, value) in self.auth.headers(operation, &body)? {
            request = request.header(name, value);
        }

        let mut response = request.send(body.as_bytes())?;
        let status = response.status().as_u16();
        let text = response.body_mut().read_to_string()?;
        log::trace!("{} response ({}): {}", operation, status, text);

        if !(200..300).contains(&status) {
            return Err(Error::from_api_response(status, &text));
        }

        // Delete answers with an empty body on some endpoints
        let text = if text.trim().is_empty() { "{}" } else { &text };
        Ok(serde_json::from_str(text)?)
    }
}

impl Backend for HttpBackend {
    fn create_resource_server(&self, input: &CreateResourceServerInput) -> Result<ResourceServer> {
        let out: ResourceServerOutput = self.call(Operation::CreateResourceServer, input)?;
        Ok(out.resource_server)
    }

    fn describe_resource_server(
        &self,
        input: &DescribeResourceServerInput,
    ) -> Result<ResourceServer> {
        let out: ResourceServerOutput = self.call(Operation::DescribeResourceServer, input)?;
        Ok(out.resource_server)
    }

    fn update_resource_server(&self, input: &UpdateResourceServerInput) -> Result<ResourceServer> {
        let out: ResourceServerOutput = self.call(Operation::UpdateResourceServer, input)?;
        Ok(out.resource_server)
    }

    fn delete_resource_server(&self, input: &DeleteResourceServerInput) -> Result<()> {
        let _: serde_json::Value = self.call(Operation::DeleteResourceServer, input)?;
        Ok(())
    }
}

/// Public endpoint for a region.
pub fn regional_endpoint(region: &str) -> String {
    format!("https://cognito-idp.{region}.amazonaws.com/")
}

fn target_header(operation: Operation) -> String {
    format!("{}.{}", TARGET_PREFIX, operation.name())
}
