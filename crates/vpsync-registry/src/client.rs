//! Registry connection management and RPC surface.

use std::collections::BTreeMap;
use std::time::Duration;

use crate::types::{RemoteNode, SliceTag};
use crate::xmlrpc::{self, Value, XmlRpcError};

/// Errors from registry operations.
#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
    #[error("registry transport error: {0}")]
    Http(String),

    #[error("registry fault {code}: {message}")]
    Fault { code: i64, message: String },

    #[error("malformed registry response: {0}")]
    Codec(String),

    #[error("unexpected registry payload: {0}")]
    Decode(String),
}

/// Configuration for reaching the registry.
///
/// Credentials are supplied by the operator (config file or environment),
/// never compiled in.
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub api_url: String,
    pub username: String,
    pub password: String,
    /// Per-call timeout; every registry call is bounded by this.
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            api_url: "https://www.planet-lab.org/PLCAPI/".to_string(),
            username: String::new(),
            password: String::new(),
            timeout_secs: 30,
        }
    }
}

/// XML-RPC client for the node registry.
///
/// Clone is cheap (reqwest pools connections internally).
#[derive(Clone)]
pub struct RegistryClient {
    http: reqwest::Client,
    config: RegistryConfig,
}

impl RegistryClient {
    pub fn new(config: RegistryConfig) -> Result<Self, RegistryError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RegistryError::Http(e.to_string()))?;
        Ok(Self { http, config })
    }

    /// Verify the configured credentials.
    ///
    /// The registry reports bad credentials as a fault, not an error
    /// response; any fault here is folded into `Ok(false)` so the caller can
    /// shut down cleanly instead of crashing.
    pub async fn auth_check(&self) -> Result<bool, RegistryError> {
        match self.call("AuthCheck", &[self.auth_value()]).await {
            Ok(value) => {
                let authorized = value
                    .as_i64()
                    .map(|i| i != 0)
                    .or_else(|| value.as_bool())
                    .unwrap_or(false);
                Ok(authorized)
            }
            Err(RegistryError::Fault { code, message }) => {
                tracing::warn!(code, message = %message, "Registry rejected credentials");
                Ok(false)
            }
            Err(e) => Err(e),
        }
    }

    /// Fetch the full node listing.
    pub async fn get_nodes(&self) -> Result<Vec<RemoteNode>, RegistryError> {
        let value = self.call("GetNodes", &[self.auth_value()]).await?;
        let entries = value
            .as_array()
            .ok_or_else(|| RegistryError::Decode("GetNodes did not return an array".into()))?;
        entries.iter().map(RemoteNode::from_value).collect()
    }

    /// Fetch one tag for a batch of nodes in a single call.
    pub async fn get_slice_tags(
        &self,
        node_ids: &[i64],
        tagname: &str,
    ) -> Result<Vec<SliceTag>, RegistryError> {
        let mut filter = BTreeMap::new();
        filter.insert(
            "node_id".to_string(),
            Value::Array(node_ids.iter().copied().map(Value::Int).collect()),
        );
        filter.insert("tagname".to_string(), Value::string(tagname));

        let value = self
            .call("GetSliceTags", &[self.auth_value(), Value::Struct(filter)])
            .await?;
        let entries = value
            .as_array()
            .ok_or_else(|| RegistryError::Decode("GetSliceTags did not return an array".into()))?;
        entries.iter().map(SliceTag::from_value).collect()
    }

    /// Enroll hosts in a slice. Already-enrolled hosts are a no-op on the
    /// registry side, so retrying after a partial run is safe.
    pub async fn add_slice_to_nodes(
        &self,
        slice_id: i64,
        hostnames: &[String],
    ) -> Result<(), RegistryError> {
        let hosts = Value::Array(hostnames.iter().map(Value::string).collect());
        self.call(
            "AddSliceToNodes",
            &[self.auth_value(), Value::Int(slice_id), hosts],
        )
        .await?;
        Ok(())
    }

    fn auth_value(&self) -> Value {
        let mut auth = BTreeMap::new();
        auth.insert("AuthMethod".to_string(), Value::string("password"));
        auth.insert(
            "Username".to_string(),
            Value::string(&self.config.username),
        );
        auth.insert(
            "AuthString".to_string(),
            Value::string(&self.config.password),
        );
        Value::Struct(auth)
    }

    async fn call(&self, method: &str, params: &[Value]) -> Result<Value, RegistryError> {
        let body = xmlrpc::write_method_call(method, params)
            .map_err(|e| RegistryError::Codec(e.to_string()))?;
        tracing::debug!(method, url = %self.config.api_url, "Registry call");

        let response = self
            .http
            .post(&self.config.api_url)
            .header(reqwest::header::CONTENT_TYPE, "text/xml")
            .body(body)
            .send()
            .await
            .map_err(|e| RegistryError::Http(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Http(format!(
                "{method} returned HTTP {status}"
            )));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| RegistryError::Http(e.to_string()))?;

        match xmlrpc::parse_method_response(&bytes) {
            Ok(value) => Ok(value),
            Err(XmlRpcError::Fault { code, message }) => {
                Err(RegistryError::Fault { code, message })
            }
            Err(e) => Err(RegistryError::Codec(e.to_string())),
        }
    }
}
