//! JSON-over-HTTP store for a remote API.
//!
//! Each collection maps to an endpoint under the base URL:
//! - `save`: `POST /{endpoint}`
//! - `get`: `GET /{endpoint}?query`
//! - `update`: `PUT /{endpoint}/{id}`
//! - `delete_item`: `DELETE /{endpoint}/{id}`
//!
//! Any non-2xx status is [`StoreError::Status`]; transport failures are
//! [`StoreError::Network`].

use once_cell::sync::Lazy;
use serde_json::Value;
use std::env;
use ureq::http::Response;
use ureq::{Agent, Body};

use super::{Backend, Collection, Store, StoreError, StoreResult};

static USER_AGENT: Lazy<String> = Lazy::new(resolve_user_agent);

fn resolve_user_agent() -> String {
    env::var("WATTBOOK_USER_AGENT")
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| format!("wattbook/{}", env!("CARGO_PKG_VERSION")))
}

/// Store that forwards every operation to a REST API
#[derive(Clone)]
pub struct RestStore {
    agent: Agent,
    base_url: String,
}

impl RestStore {
    pub fn new(base_url: &str) -> Self {
        // Statuses are checked here so that 4xx/5xx map to StoreError::Status
        let agent: Agent = Agent::config_builder()
            .http_status_as_error(false)
            .build()
            .into();
        Self {
            agent,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, collection: Collection, id: Option<&str>) -> String {
        match id {
            Some(id) => format!("{}/{}/{}", self.base_url, collection.endpoint(), id),
            None => format!("{}/{}", self.base_url, collection.endpoint()),
        }
    }
}

fn network(err: ureq::Error) -> StoreError {
    StoreError::Network(err.to_string())
}

fn check_status(response: &Response<Body>) -> StoreResult<()> {
    let status = response.status();
    if status.is_success() {
        Ok(())
    } else {
        Err(StoreError::Status {
            code: status.as_u16(),
        })
    }
}

/// Decode a JSON body; an empty body reads as `null`
fn read_json(mut response: Response<Body>) -> StoreResult<Value> {
    check_status(&response)?;
    let text = response.body_mut().read_to_string().map_err(network)?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    Ok(serde_json::from_str(&text)?)
}

impl Store for RestStore {
    fn backend(&self) -> Backend {
        Backend::Api
    }

    fn save(&self, collection: Collection, data: &Value) -> StoreResult<Value> {
        let url = self.url(collection, None);
        log::debug!("POST {url}");
        let response = self
            .agent
            .post(&url)
            .header("User-Agent", USER_AGENT.as_str())
            .header("Accept", "application/json")
            .send_json(data)
            .map_err(network)?;
        read_json(response)
    }

    fn get(&self, collection: Collection, query: &[(&str, &str)]) -> StoreResult<Option<Value>> {
        let url = self.url(collection, None);
        log::debug!("GET {url} {query:?}");
        let mut request = self
            .agent
            .get(&url)
            .header("User-Agent", USER_AGENT.as_str())
            .header("Accept", "application/json");
        for (key, value) in query {
            request = request.query(*key, *value);
        }
        let response = request.call().map_err(network)?;
        match read_json(response)? {
            Value::Null => Ok(None),
            value => Ok(Some(value)),
        }
    }

    fn delete(&self, _collection: Collection) -> StoreResult<()> {
        Err(StoreError::Unsupported {
            operation: "delete without an item id",
            backend: Backend::Api,
        })
    }

    fn update(&self, collection: Collection, id: &str, data: &Value) -> StoreResult<Value> {
        let url = self.url(collection, Some(id));
        log::debug!("PUT {url}");
        let response = self
            .agent
            .put(&url)
            .header("User-Agent", USER_AGENT.as_str())
            .header("Accept", "application/json")
            .send_json(data)
            .map_err(network)?;
        read_json(response)
    }

    fn delete_item(&self, collection: Collection, id: &str) -> StoreResult<()> {
        let url = self.url(collection, Some(id));
        log::debug!("DELETE {url}");
        let response = self
            .agent
            .delete(&url)
            .header("User-Agent", USER_AGENT.as_str())
            .call()
            .map_err(network)?;
        check_status(&response)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn urls_join_endpoint_and_id() {
        let store = RestStore::new("http://localhost:3001/api/");
        assert_eq!(store.base_url(), "http://localhost:3001/api");
        assert_eq!(
            store.url(Collection::UsageHistory, None),
            "http://localhost:3001/api/usage-history"
        );
        assert_eq!(
            store.url(Collection::Equipment, Some("42")),
            "http://localhost:3001/api/equipment/42"
        );
    }

    #[test]
    fn clear_is_unsupported() {
        let store = RestStore::new("http://localhost:3001/api");
        let err = store.clear(&Collection::CALCULATOR).unwrap_err();
        assert!(matches!(
            err,
            StoreError::Unsupported { backend: Backend::Api, .. }
        ));
    }

    #[test]
    fn unreachable_host_is_network_error() {
        // Port 9 (discard) on localhost is closed on typical machines
        let store = RestStore::new("http://127.0.0.1:9/api");
        let err = store.get(Collection::Equipment, &[]).unwrap_err();
        assert!(matches!(err, StoreError::Network(_)), "got {err:?}");
    }
}
