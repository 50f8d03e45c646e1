use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// API request structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
    pub meta: RequestMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

/// Request metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RequestMeta {
    pub id: Uuid,
    pub endpoint: Endpoint,
    pub method: Method,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub target: Option<String>,
}

/// API response structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
    pub meta: ResponseMeta,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub errors: Option<Vec<ApiError>>,
}

/// Response metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResponseMeta {
    pub id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<Endpoint>,
    pub method: Method,
}

/// API error structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub detail: String,
}

/// API endpoint names
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum Endpoint {
    /// The system's designated mixer node
    AudioMixer,
    /// Control graph of a node
    ParameterWeb,
    /// A node handle
    Node,
    /// Value of a single control
    Parameter,
}

/// API methods
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Method {
    Read,
    Write,
    Release,
}

impl Request {
    /// Create a new request with the given endpoint and method
    pub fn new(endpoint: Endpoint, method: Method) -> Self {
        Self {
            meta: RequestMeta {
                id: Uuid::new_v4(),
                endpoint,
                method,
                target: None,
            },
            data: None,
        }
    }

    /// Set the target node or parameter
    pub fn with_target(mut self, target: impl Into<String>) -> Self {
        self.meta.target = Some(target.into());
        self
    }

    /// Set the request data
    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    /// Get the request ID
    pub fn id(&self) -> Uuid {
        self.meta.id
    }
}

impl Response {
    /// Build the reply to a request
    pub fn reply_to(request: &Request) -> Self {
        Self {
            meta: ResponseMeta {
                id: request.meta.id,
                endpoint: Some(request.meta.endpoint),
                method: request.meta.method,
            },
            data: None,
            errors: None,
        }
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn with_error(mut self, detail: impl Into<String>) -> Self {
        self.errors
            .get_or_insert_with(Vec::new)
            .push(ApiError { detail: detail.into() });
        self
    }

    /// Check if the response contains errors
    pub fn has_errors(&self) -> bool {
        self.errors.as_ref().is_some_and(|e| !e.is_empty())
    }

    /// Get the first error message, if any
    pub fn error_message(&self) -> Option<String> {
        self.errors
            .as_ref()
            .and_then(|e| e.first())
            .map(|e| e.detail.clone())
    }
}
