//! In-memory stand-in for the parts of Consul's HTTP API used by
//! `consul-data`: the KV store and the service catalog.

use std::{
    collections::{BTreeMap, HashMap},
    sync::Arc,
};

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::{net::TcpListener, sync::RwLock};
use tower_http::trace::TraceLayer;
use uuid::Uuid;

/// Largest value Consul accepts for a single key.
pub const MAX_VALUE_SIZE: usize = 512 * 1024;

/// KV entry as rendered by `GET /v1/kv/{key}` without `raw`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "PascalCase")]
pub struct KvPair {
    pub key: String,
    pub value: Option<String>,
    pub flags: u64,
    pub create_index: u64,
    pub modify_index: u64,
    pub lock_index: u64,
}

/// Body of `PUT /v1/catalog/register`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct RegisterRequest {
    pub node: String,
    pub address: String,
    #[serde(default)]
    pub datacenter: Option<String>,
    #[serde(default)]
    pub tagged_addresses: BTreeMap<String, String>,
    #[serde(default)]
    pub node_meta: BTreeMap<String, String>,
    #[serde(default)]
    pub service: Option<AgentService>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AgentService {
    #[serde(rename = "ID", default)]
    pub id: Option<String>,
    pub service: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub port: u16,
}

/// One row of `GET /v1/catalog/service/{service}`.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct CatalogService {
    #[serde(rename = "ID")]
    pub id: Uuid,
    pub node: String,
    pub address: String,
    pub datacenter: String,
    pub tagged_addresses: BTreeMap<String, String>,
    pub node_meta: BTreeMap<String, String>,
    #[serde(rename = "ServiceID")]
    pub service_id: String,
    pub service_name: String,
    pub service_tags: Vec<String>,
    pub service_address: String,
    pub service_port: u16,
    pub service_enable_tag_override: bool,
    pub create_index: u64,
    pub modify_index: u64,
}

#[derive(Debug)]
struct StoredValue {
    value: Bytes,
    create_index: u64,
    modify_index: u64,
}

#[derive(Debug, Default)]
pub struct Store {
    kv: BTreeMap<String, StoredValue>,
    node_ids: HashMap<String, Uuid>,
    services: Vec<CatalogService>,
    index: u64,
}

impl Store {
    fn next_index(&mut self) -> u64 {
        self.index += 1;
        self.index
    }
}

pub type Db = Arc<RwLock<Store>>;

#[derive(Debug, Deserialize)]
struct KvQuery {
    raw: Option<String>,
}

pub fn app() -> Router {
    let db: Db = Arc::new(RwLock::new(Store::default()));
    Router::new()
        .route("/v1/kv/{*key}", get(get_key).put(put_key).delete(delete_key))
        .route("/v1/catalog/register", put(register))
        .route("/v1/catalog/service/{service}", get(service_nodes))
        .layer(TraceLayer::new_for_http())
        .with_state(db)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

async fn get_key(
    State(db): State<Db>,
    Path(key): Path<String>,
    Query(query): Query<KvQuery>,
) -> Response {
    let store = db.read().await;
    let Some(stored) = store.kv.get(&key) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if query.raw.is_some() {
        return (StatusCode::OK, stored.value.clone()).into_response();
    }
    let pair = KvPair {
        key,
        value: Some(STANDARD.encode(&stored.value)),
        flags: 0,
        create_index: stored.create_index,
        modify_index: stored.modify_index,
        lock_index: 0,
    };
    Json(vec![pair]).into_response()
}

async fn put_key(State(db): State<Db>, Path(key): Path<String>, body: Bytes) -> Response {
    if body.len() > MAX_VALUE_SIZE {
        tracing::warn!(key = %key, size = body.len(), "rejecting oversized value");
        let reason = format!(
            "Request body({} bytes) too large, max size: {MAX_VALUE_SIZE} bytes",
            body.len()
        );
        return (StatusCode::PAYLOAD_TOO_LARGE, reason).into_response();
    }

    let mut store = db.write().await;
    let index = store.next_index();
    let create_index = store.kv.get(&key).map_or(index, |existing| existing.create_index);
    store.kv.insert(
        key,
        StoredValue {
            value: body,
            create_index,
            modify_index: index,
        },
    );
    (StatusCode::OK, "true").into_response()
}

async fn delete_key(State(db): State<Db>, Path(key): Path<String>) -> Response {
    let mut store = db.write().await;
    if store.kv.remove(&key).is_some() {
        store.next_index();
    }
    (StatusCode::OK, "true").into_response()
}

async fn register(State(db): State<Db>, Json(input): Json<RegisterRequest>) -> Response {
    let mut store = db.write().await;
    let index = store.next_index();
    let node_id = *store
        .node_ids
        .entry(input.node.clone())
        .or_insert_with(Uuid::new_v4);

    let Some(service) = input.service else {
        return (StatusCode::OK, "true").into_response();
    };
    let service_id = service.id.unwrap_or_else(|| service.service.clone());
    let existing = store
        .services
        .iter()
        .position(|entry| entry.node == input.node && entry.service_id == service_id);
    let create_index = existing.map_or(index, |pos| store.services[pos].create_index);

    let entry = CatalogService {
        id: node_id,
        node: input.node,
        address: input.address,
        datacenter: input.datacenter.unwrap_or_else(|| "dc1".to_string()),
        tagged_addresses: input.tagged_addresses,
        node_meta: input.node_meta,
        service_id,
        service_name: service.service,
        service_tags: service.tags,
        service_address: service.address,
        service_port: service.port,
        service_enable_tag_override: false,
        create_index,
        modify_index: index,
    };
    match existing {
        Some(pos) => store.services[pos] = entry,
        None => store.services.push(entry),
    }
    (StatusCode::OK, "true").into_response()
}

async fn service_nodes(
    State(db): State<Db>,
    Path(service): Path<String>,
) -> Json<Vec<CatalogService>> {
    let store = db.read().await;
    Json(
        store
            .services
            .iter()
            .filter(|entry| entry.service_name == service)
            .cloned()
            .collect(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kv_pair_serializes_with_consul_field_names() {
        let pair = KvPair {
            key: "foo".to_string(),
            value: Some(STANDARD.encode("bar")),
            flags: 0,
            create_index: 1,
            modify_index: 2,
            lock_index: 0,
        };
        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["Key"], "foo");
        assert_eq!(json["Value"], "YmFy");
        assert_eq!(json["CreateIndex"], 1);
        assert_eq!(json["ModifyIndex"], 2);
    }

    #[test]
    fn register_request_minimal_fields() {
        let input: RegisterRequest =
            serde_json::from_str(r#"{"Node":"n1","Address":"10.0.0.1"}"#).unwrap();
        assert_eq!(input.node, "n1");
        assert!(input.service.is_none());
        assert!(input.tagged_addresses.is_empty());
    }

    #[test]
    fn register_request_with_service() {
        let input: RegisterRequest = serde_json::from_str(
            r#"{"Node":"n1","Address":"10.0.0.1","Service":{"ID":"web-1","Service":"web","Port":80}}"#,
        )
        .unwrap();
        let service = input.service.unwrap();
        assert_eq!(service.id.as_deref(), Some("web-1"));
        assert_eq!(service.service, "web");
        assert_eq!(service.port, 80);
        assert!(service.tags.is_empty());
    }

    #[test]
    fn register_request_rejects_missing_node() {
        let result: Result<RegisterRequest, _> = serde_json::from_str(r#"{"Address":"10.0.0.1"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn catalog_service_uses_consul_id_casing() {
        let entry = CatalogService {
            id: Uuid::nil(),
            node: "n1".to_string(),
            address: "10.0.0.1".to_string(),
            datacenter: "dc1".to_string(),
            tagged_addresses: BTreeMap::new(),
            node_meta: BTreeMap::new(),
            service_id: "web-1".to_string(),
            service_name: "web".to_string(),
            service_tags: Vec::new(),
            service_address: String::new(),
            service_port: 80,
            service_enable_tag_override: false,
            create_index: 3,
            modify_index: 3,
        };
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["ID"], "00000000-0000-0000-0000-000000000000");
        assert_eq!(json["ServiceID"], "web-1");
        assert_eq!(json["ServiceName"], "web");
        assert_eq!(json["ServiceEnableTagOverride"], false);
    }
}
