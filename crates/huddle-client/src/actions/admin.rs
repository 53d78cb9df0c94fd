//! System console calls. Their payloads are not mirrored in the entity
//! cache; callers get them back directly and the request table records how
//! each call went.

use serde_json::Value;

use huddle_store::{RequestOp, Store};

use crate::actions::bind_request;
use crate::client::Client;
use crate::error::Result;

pub async fn get_config(client: &Client, store: &Store) -> Result<Value> {
    bind_request(client, store, RequestOp::GetConfig, client.get_config(), |_| Vec::new()).await
}

pub async fn update_config(client: &Client, store: &Store, config: &Value) -> Result<Value> {
    bind_request(
        client,
        store,
        RequestOp::UpdateConfig,
        client.update_config(config),
        |_| Vec::new(),
    )
    .await
}

pub async fn reload_config(client: &Client, store: &Store) -> Result<()> {
    bind_request(client, store, RequestOp::ReloadConfig, client.reload_config(), |_| Vec::new()).await
}

pub async fn get_logs(client: &Client, store: &Store, page: u32, per_page: u32) -> Result<Vec<String>> {
    bind_request(
        client,
        store,
        RequestOp::GetLogs,
        client.get_logs(page, per_page),
        |_| Vec::new(),
    )
    .await
}

pub async fn get_audits(client: &Client, store: &Store, page: u32, per_page: u32) -> Result<Vec<Value>> {
    bind_request(
        client,
        store,
        RequestOp::GetAudits,
        client.get_audits(page, per_page),
        |_| Vec::new(),
    )
    .await
}

pub async fn ping(client: &Client, store: &Store) -> Result<Value> {
    bind_request(client, store, RequestOp::Ping, client.ping(), |_| Vec::new()).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ClientConfig;
    use crate::testing::spawn_server;
    use huddle_store::RequestStatus;

    #[tokio::test]
    async fn test_failed_call_is_recorded() {
        let server = spawn_server().await;
        let client = Client::new(ClientConfig::new(server.url.clone())).unwrap();
        let store = Store::default();

        assert!(get_config(&client, &store).await.is_err());
        let state = store.get_state();
        let request = state.requests.get(RequestOp::GetConfig);
        assert_eq!(request.status, RequestStatus::Failure);
        assert!(request.error.is_some());

        // Not JSON: recorded as the localisable invalid-response error.
        assert!(ping(&client, &store).await.is_err());
        let request = store.get_state().requests.get(RequestOp::Ping);
        assert!(matches!(request.error, Some(huddle_store::StoredError::Intl(_))));
    }
}
