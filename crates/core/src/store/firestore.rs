use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
#[cfg(not(target_arch = "wasm32"))]
use std::time::Duration;
use tracing::debug;

use crate::errors::CoreError;
use crate::models::record::{RawRecord, StoredRecord};
use crate::models::settings::FirestoreConfig;

use super::query::{Collection, DateFilter};
use super::traits::RemoteStore;

const BASE_URL: &str = "https://firestore.googleapis.com/v1";
const NAME: &str = "Firestore";

/// Top-level collection holding one document per user.
const USERS_COLLECTION: &str = "purchases";
const BUDGET_FIELD: &str = "monthlyBudget";

/// Fields the ledger query orders by, all descending.
const ORDER_FIELDS: [&str; 4] = ["year", "month", "day", "price"];

/// Cloud Firestore store, spoken to through its REST API.
///
/// - **Layout**: `purchases/{user}` holds the `monthlyBudget` field and two
///   sub-collections, `payments` and `incomes`.
/// - **Auth**: optional web API key (`key` query parameter) and optional
///   Firebase ID token (bearer).
/// - **Endpoints**: `:runQuery`, `:runAggregationQuery`, document
///   create / patch / delete / get.
pub struct FirestoreStore {
    client: Client,
    base_url: String,
    config: FirestoreConfig,
}

impl FirestoreStore {
    pub fn new(config: FirestoreConfig) -> Self {
        Self::with_base_url(config, BASE_URL)
    }

    /// Point the store at another endpoint (e.g., the local emulator).
    pub fn with_base_url(config: FirestoreConfig, base_url: impl Into<String>) -> Self {
        let builder = Client::builder();
        #[cfg(not(target_arch = "wasm32"))]
        let builder = builder.timeout(Duration::from_secs(30));
        Self {
            client: builder.build().unwrap_or_else(|_| Client::new()),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            config,
        }
    }

    fn user_document_url(&self) -> String {
        format!(
            "{}/projects/{}/databases/(default)/documents/{USERS_COLLECTION}/{}",
            self.base_url, self.config.project_id, self.config.user_key
        )
    }

    fn collection_url(&self, collection: Collection) -> String {
        format!("{}/{}", self.user_document_url(), collection.as_str())
    }

    fn document_url(&self, collection: Collection, id: &str) -> String {
        format!("{}/{id}", self.collection_url(collection))
    }

    fn request(&self, method: Method, url: &str) -> RequestBuilder {
        let mut builder = self.client.request(method, url);
        if let Some(key) = &self.config.api_key {
            builder = builder.query(&[("key", key)]);
        }
        if let Some(token) = &self.config.id_token {
            builder = builder.bearer_auth(token);
        }
        builder
    }

    /// Send a request and turn any non-2xx answer into `CoreError::Store`.
    async fn send(&self, builder: RequestBuilder) -> Result<reqwest::Response, CoreError> {
        check_status(builder.send().await?).await
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder) -> Result<T, CoreError> {
        self.send(builder)
            .await?
            .json()
            .await
            .map_err(|e| api_error(format!("Failed to parse response: {e}")))
    }

    async fn aggregate(
        &self,
        collection: Collection,
        filter: DateFilter,
        aggregation: Aggregation,
    ) -> Result<f64, CoreError> {
        let url = format!("{}:runAggregationQuery", self.user_document_url());
        let body = build_aggregation_query(collection, filter, aggregation);
        let entries: Vec<AggregationEntry> = self
            .send_json(self.request(Method::POST, &url).json(&body))
            .await?;
        parse_aggregate(&entries, aggregation.alias())
    }
}

// ── Firestore API response types ────────────────────────────────────

#[derive(Deserialize)]
struct Document {
    name: String,
    #[serde(default)]
    fields: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct RunQueryEntry {
    document: Option<Document>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AggregationResult {
    #[serde(default)]
    aggregate_fields: HashMap<String, Value>,
}

#[derive(Deserialize)]
struct AggregationEntry {
    result: Option<AggregationResult>,
}

/// Server-side aggregation kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Aggregation {
    SumOfPrices,
    Count,
}

impl Aggregation {
    fn alias(&self) -> &'static str {
        match self {
            Aggregation::SumOfPrices => "total",
            Aggregation::Count => "count",
        }
    }
}

// ── Typed value encoding ─────────────────────────────────────────────

fn api_error(message: String) -> CoreError {
    CoreError::Store {
        backend: NAME.into(),
        message,
    }
}

/// Pass a 2xx response through; turn anything else into `CoreError::Store`.
async fn check_status(resp: reqwest::Response) -> Result<reqwest::Response, CoreError> {
    let status = resp.status();
    if status.is_success() {
        return Ok(resp);
    }
    let body = resp.text().await.unwrap_or_default();
    Err(http_error(status, &body))
}

fn http_error(status: StatusCode, body: &str) -> CoreError {
    api_error(format!("HTTP {status}: {}", error_message(body)))
}

/// Pull `error.message` out of a Firestore error body, if there is one.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.to_string())
}

fn integer_value(v: i64) -> Value {
    // Firestore transmits 64-bit integers as strings.
    json!({ "integerValue": v.to_string() })
}

/// Read a Firestore numeric value (`integerValue` or `doubleValue`).
pub fn decode_number(value: &Value) -> Option<f64> {
    if let Some(d) = value.get("doubleValue") {
        return d.as_f64();
    }
    match value.get("integerValue")? {
        Value::String(s) => s.parse::<i64>().ok().map(|i| i as f64),
        v => v.as_i64().map(|i| i as f64),
    }
}

fn decode_integer(value: &Value) -> Option<i64> {
    match value.get("integerValue") {
        Some(Value::String(s)) => s.parse().ok(),
        Some(v) => v.as_i64(),
        None => value.get("doubleValue")?.as_f64().map(|d| d as i64),
    }
}

/// Encode a record as a Firestore document body (`{"fields": {...}}`).
/// Absent fields are omitted.
pub fn encode_fields(record: &RawRecord) -> Value {
    let mut fields = Map::new();
    if let Some(name) = &record.name {
        fields.insert("name".into(), json!({ "stringValue": name }));
    }
    if let Some(price) = record.price {
        fields.insert("price".into(), json!({ "doubleValue": price }));
    }
    if let Some(year) = record.year {
        fields.insert("year".into(), integer_value(i64::from(year)));
    }
    if let Some(month) = record.month {
        fields.insert("month".into(), integer_value(i64::from(month)));
    }
    if let Some(day) = record.day {
        fields.insert("day".into(), integer_value(i64::from(day)));
    }
    if let Some(category) = &record.category {
        fields.insert("category".into(), json!({ "stringValue": category }));
    }
    json!({ "fields": fields })
}

/// Decode a Firestore document into a stored record. The id is the last
/// segment of the document name.
pub fn decode_document(document: &Value) -> Result<StoredRecord, CoreError> {
    let doc: Document = serde_json::from_value(document.clone())
        .map_err(|e| CoreError::Deserialization(format!("Invalid Firestore document: {e}")))?;
    Ok(record_from_document(doc))
}

fn record_from_document(doc: Document) -> StoredRecord {
    let id = doc.name.rsplit('/').next().unwrap_or_default().to_string();
    let string = |key: &str| {
        doc.fields
            .get(key)
            .and_then(|v| v.get("stringValue"))
            .and_then(Value::as_str)
            .map(str::to_string)
    };
    let int = |key: &str| doc.fields.get(key).and_then(decode_integer);

    let record = RawRecord {
        name: string("name"),
        price: doc.fields.get("price").and_then(decode_number),
        year: int("year").and_then(|v| i32::try_from(v).ok()),
        month: int("month").and_then(|v| u32::try_from(v).ok()),
        day: int("day").and_then(|v| u32::try_from(v).ok()),
        category: string("category"),
    };
    StoredRecord::new(id, record)
}

// ── Query builders ───────────────────────────────────────────────────

/// `runQuery` body: the newest `limit` records of a collection.
pub fn build_ordered_query(collection: Collection, limit: usize) -> Value {
    let order_by: Vec<Value> = ORDER_FIELDS
        .iter()
        .map(|f| json!({ "field": { "fieldPath": f }, "direction": "DESCENDING" }))
        .collect();
    json!({
        "structuredQuery": {
            "from": [{ "collectionId": collection.as_str() }],
            "orderBy": order_by,
            "limit": limit,
        }
    })
}

fn build_where(filter: DateFilter) -> Option<Value> {
    let mut filters: Vec<Value> = filter
        .field_equalities()
        .into_iter()
        .map(|(field, value)| {
            json!({
                "fieldFilter": {
                    "field": { "fieldPath": field },
                    "op": "EQUAL",
                    "value": integer_value(value),
                }
            })
        })
        .collect();
    match filters.len() {
        0 => None,
        1 => filters.pop(),
        _ => Some(json!({ "compositeFilter": { "op": "AND", "filters": filters } })),
    }
}

/// `runAggregationQuery` body for a sum of prices or a count.
pub fn build_aggregation_query(
    collection: Collection,
    filter: DateFilter,
    aggregation: Aggregation,
) -> Value {
    let mut query = json!({ "from": [{ "collectionId": collection.as_str() }] });
    if let Some(where_clause) = build_where(filter) {
        query["where"] = where_clause;
    }
    let agg = match aggregation {
        Aggregation::SumOfPrices => {
            json!({ "alias": aggregation.alias(), "sum": { "field": { "fieldPath": "price" } } })
        }
        Aggregation::Count => json!({ "alias": aggregation.alias(), "count": {} }),
    };
    json!({
        "structuredAggregationQuery": {
            "structuredQuery": query,
            "aggregations": [agg],
        }
    })
}

fn parse_aggregate(entries: &[AggregationEntry], alias: &str) -> Result<f64, CoreError> {
    let value = entries
        .iter()
        .filter_map(|e| e.result.as_ref())
        .find_map(|r| r.aggregate_fields.get(alias))
        .ok_or_else(|| api_error(format!("Aggregation result '{alias}' missing")))?;
    // A sum over no documents comes back as nullValue.
    if value.get("nullValue").is_some() {
        return Ok(0.0);
    }
    decode_number(value).ok_or_else(|| api_error(format!("Aggregation '{alias}' is not a number")))
}

#[cfg_attr(target_arch = "wasm32", async_trait(?Send))]
#[cfg_attr(not(target_arch = "wasm32"), async_trait)]
impl RemoteStore for FirestoreStore {
    fn name(&self) -> &str {
        NAME
    }

    async fn fetch_ordered_batch(
        &self,
        collection: Collection,
        limit: usize,
    ) -> Result<Vec<StoredRecord>, CoreError> {
        let url = format!("{}:runQuery", self.user_document_url());
        let body = build_ordered_query(collection, limit);
        let entries: Vec<RunQueryEntry> = self
            .send_json(self.request(Method::POST, &url).json(&body))
            .await?;

        let records: Vec<StoredRecord> = entries
            .into_iter()
            .filter_map(|e| e.document)
            .map(record_from_document)
            .collect();
        debug!(collection = %collection, count = records.len(), "fetched ordered batch");
        Ok(records)
    }

    async fn add_record(
        &self,
        collection: Collection,
        record: &RawRecord,
    ) -> Result<String, CoreError> {
        let url = self.collection_url(collection);
        let doc: Document = self
            .send_json(self.request(Method::POST, &url).json(&encode_fields(record)))
            .await?;
        Ok(record_from_document(doc).id)
    }

    async fn delete_record(&self, collection: Collection, id: &str) -> Result<(), CoreError> {
        let url = self.document_url(collection, id);
        self.send(self.request(Method::DELETE, &url)).await?;
        Ok(())
    }

    async fn update_record(
        &self,
        collection: Collection,
        id: &str,
        record: &RawRecord,
    ) -> Result<(), CoreError> {
        // PATCH without an update mask replaces the whole document.
        let url = self.document_url(collection, id);
        self.send(self.request(Method::PATCH, &url).json(&encode_fields(record)))
            .await?;
        Ok(())
    }

    async fn sum_prices(
        &self,
        collection: Collection,
        filter: DateFilter,
    ) -> Result<f64, CoreError> {
        self.aggregate(collection, filter, Aggregation::SumOfPrices)
            .await
    }

    async fn count_records(&self, collection: Collection) -> Result<u64, CoreError> {
        let count = self
            .aggregate(collection, DateFilter::All, Aggregation::Count)
            .await?;
        Ok(count as u64)
    }

    async fn get_monthly_budget(&self) -> Result<f64, CoreError> {
        let url = self.user_document_url();
        let resp = self.request(Method::GET, &url).send().await?;
        // No user document yet means no budget was ever set.
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(0.0);
        }
        let doc: Document = check_status(resp)
            .await?
            .json()
            .await
            .map_err(|e| api_error(format!("Failed to parse user document: {e}")))?;
        Ok(doc
            .fields
            .get(BUDGET_FIELD)
            .and_then(decode_number)
            .unwrap_or(0.0))
    }

    async fn set_monthly_budget(&self, budget: f64) -> Result<(), CoreError> {
        let url = self.user_document_url();
        let body = json!({ "fields": { BUDGET_FIELD: { "doubleValue": budget } } });
        self.send(
            self.request(Method::PATCH, &url)
                .query(&[("updateMask.fieldPaths", BUDGET_FIELD)])
                .json(&body),
        )
        .await?;
        Ok(())
    }
}
