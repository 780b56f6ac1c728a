//! In-memory stand-in for a Cloudant account.
//!
//! # Design
//! Serves the slice of the CouchDB API the client integration tests drive:
//! server metadata, database lifecycle, document CRUD with revision checks,
//! `_all_docs`, `_bulk_docs`, standalone attachments, `_security`, and an
//! IAM-style token endpoint. All state lives behind one `RwLock`; there is no
//! revision tree, only the current leaf per document, which is enough to
//! produce the 404/409/412 outcomes real servers give.

use std::collections::BTreeMap;
use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Map, Value};
use tokio::{net::TcpListener, sync::RwLock};
use tracing::debug;
use uuid::Uuid;

pub const IAM_GRANT_TYPE: &str = "urn:ibm:params:oauth:grant-type:apikey";

/// A CouchDB-style error reply: `{"error": ..., "reason": ...}`.
#[derive(Debug)]
pub struct CouchError {
    status: StatusCode,
    error: &'static str,
    reason: String,
}

impl CouchError {
    fn new(status: StatusCode, error: &'static str, reason: impl Into<String>) -> Self {
        Self {
            status,
            error,
            reason: reason.into(),
        }
    }

    fn not_found(reason: &str) -> Self {
        Self::new(StatusCode::NOT_FOUND, "not_found", reason)
    }

    fn no_database() -> Self {
        Self::not_found("Database does not exist.")
    }

    fn conflict() -> Self {
        Self::new(StatusCode::CONFLICT, "conflict", "Document update conflict.")
    }

    fn bad_request(reason: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "bad_request", reason)
    }
}

impl IntoResponse for CouchError {
    fn into_response(self) -> Response {
        (self.status, Json(json!({"error": self.error, "reason": self.reason}))).into_response()
    }
}

type Reply = Result<Response, CouchError>;

#[derive(Debug, Clone)]
struct StoredAttachment {
    content_type: String,
    data: Vec<u8>,
    revpos: u64,
}

#[derive(Debug, Clone)]
struct StoredDoc {
    rev: String,
    deleted: bool,
    body: Map<String, Value>,
    attachments: BTreeMap<String, StoredAttachment>,
}

impl StoredDoc {
    fn generation(&self) -> u64 {
        rev_generation(&self.rev)
    }

    fn to_json(&self, id: &str) -> Value {
        let mut doc = Map::new();
        doc.insert("_id".to_string(), json!(id));
        doc.insert("_rev".to_string(), json!(self.rev));
        if !self.attachments.is_empty() {
            let stubs: Map<String, Value> = self
                .attachments
                .iter()
                .map(|(name, att)| {
                    let stub = json!({
                        "content_type": att.content_type,
                        "length": att.data.len(),
                        "revpos": att.revpos,
                        "stub": true
                    });
                    (name.clone(), stub)
                })
                .collect();
            doc.insert("_attachments".to_string(), Value::Object(stubs));
        }
        doc.extend(self.body.clone());
        Value::Object(doc)
    }
}

fn rev_generation(rev: &str) -> u64 {
    rev.split_once('-')
        .and_then(|(n, _)| n.parse().ok())
        .unwrap_or(0)
}

#[derive(Debug, Default)]
struct Database {
    docs: BTreeMap<String, StoredDoc>,
    security: Map<String, Value>,
    partitioned: bool,
    update_seq: u64,
}

impl Database {
    fn live_count(&self) -> usize {
        self.docs.values().filter(|d| !d.deleted).count()
    }

    /// Store `body` as the next revision of `id`. `rev` is the revision the
    /// caller claims to be replacing; it must match the current leaf unless
    /// the document is absent or deleted.
    fn write(&mut self, id: &str, rev: Option<&str>, mut body: Map<String, Value>) -> Result<String, CouchError> {
        let deleted = body.remove("_deleted").and_then(|v| v.as_bool()).unwrap_or(false);
        body.retain(|k, _| !k.starts_with('_'));

        let current = self.docs.get(id);
        let generation = match (current, rev) {
            (Some(doc), Some(rev)) if doc.rev == rev => doc.generation(),
            (Some(doc), None) if doc.deleted => doc.generation(),
            (None, None) => 0,
            _ => return Err(CouchError::conflict()),
        };
        let attachments = match current {
            Some(doc) if !deleted && !doc.deleted => doc.attachments.clone(),
            _ => BTreeMap::new(),
        };

        let new_rev = format!("{}-{}", generation + 1, Uuid::new_v4().simple());
        self.docs.insert(
            id.to_string(),
            StoredDoc {
                rev: new_rev.clone(),
                deleted,
                body,
                attachments,
            },
        );
        self.update_seq += 1;
        Ok(new_rev)
    }
}

type Accounts = Arc<RwLock<BTreeMap<String, Database>>>;

pub fn app() -> Router {
    let accounts: Accounts = Arc::new(RwLock::new(BTreeMap::new()));
    Router::new()
        .route("/", get(server_information))
        .route("/_all_dbs", get(all_dbs))
        .route("/_uuids", get(uuids))
        .route("/_up", get(up))
        .route("/identity/token", post(iam_token))
        .route(
            "/{db}",
            get(get_database)
                .put(put_database)
                .delete(delete_database)
                .post(post_document),
        )
        .route("/{db}/_all_docs", post(all_docs))
        .route("/{db}/_bulk_docs", post(bulk_docs))
        .route("/{db}/_security", get(get_security).put(put_security))
        .route(
            "/{db}/{doc_id}",
            get(get_document).put(put_document).delete(delete_document),
        )
        .route(
            "/{db}/{doc_id}/{attachment}",
            get(get_attachment).put(put_attachment).delete(delete_attachment),
        )
        .with_state(accounts)
}

pub async fn run(listener: TcpListener) -> Result<(), std::io::Error> {
    axum::serve(listener, app()).await
}

fn created(id: &str, rev: &str) -> Response {
    (StatusCode::CREATED, Json(json!({"ok": true, "id": id, "rev": rev}))).into_response()
}

/// Revision named by the `rev` query parameter or an `If-Match` header.
fn claimed_rev(query: &WriteQuery, headers: &HeaderMap) -> Option<String> {
    query.rev.clone().or_else(|| {
        headers
            .get(header::IF_MATCH)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim_matches('"').to_string())
    })
}

fn valid_db_name(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || "_$()+-/".contains(c))
}

async fn server_information() -> Json<Value> {
    Json(json!({
        "couchdb": "Welcome",
        "version": "3.3.3",
        "features": ["partitioned", "pluggable-storage-engines"],
        "vendor": {"name": "mock-server"}
    }))
}

async fn all_dbs(State(accounts): State<Accounts>) -> Json<Vec<String>> {
    Json(accounts.read().await.keys().cloned().collect())
}

#[derive(Deserialize)]
struct UuidsQuery {
    count: Option<usize>,
}

async fn uuids(Query(query): Query<UuidsQuery>) -> Reply {
    let count = query.count.unwrap_or(1);
    if count > 1000 {
        return Err(CouchError::bad_request("count parameter too large"));
    }
    let uuids: Vec<String> = (0..count).map(|_| Uuid::new_v4().simple().to_string()).collect();
    Ok(Json(json!({ "uuids": uuids })).into_response())
}

async fn up() -> Json<Value> {
    Json(json!({"status": "ok", "seeds": {}}))
}

#[derive(Deserialize)]
struct TokenRequest {
    grant_type: String,
    apikey: String,
}

async fn iam_token(Form(form): Form<TokenRequest>) -> Reply {
    if form.grant_type != IAM_GRANT_TYPE || form.apikey.is_empty() {
        return Err(CouchError::new(
            StatusCode::BAD_REQUEST,
            "invalid_grant",
            "unsupported grant type or missing apikey",
        ));
    }
    debug!("issuing IAM token");
    Ok(Json(json!({
        "access_token": format!("mock-{}", Uuid::new_v4().simple()),
        "token_type": "Bearer",
        "expires_in": 3600
    }))
    .into_response())
}

#[derive(Deserialize)]
struct PutDatabaseQuery {
    partitioned: Option<bool>,
}

async fn put_database(
    State(accounts): State<Accounts>,
    Path(db): Path<String>,
    Query(query): Query<PutDatabaseQuery>,
) -> Reply {
    if !valid_db_name(&db) {
        return Err(CouchError::new(
            StatusCode::BAD_REQUEST,
            "illegal_database_name",
            format!("Name: '{db}'. Only lowercase characters (a-z), digits (0-9), and any of the characters _, $, (, ), +, -, and / are allowed. Must begin with a letter."),
        ));
    }
    let mut dbs = accounts.write().await;
    if dbs.contains_key(&db) {
        return Err(CouchError::new(
            StatusCode::PRECONDITION_FAILED,
            "file_exists",
            "The database could not be created, the file already exists.",
        ));
    }
    debug!(%db, "creating database");
    dbs.insert(
        db,
        Database {
            partitioned: query.partitioned.unwrap_or(false),
            ..Database::default()
        },
    );
    Ok((StatusCode::CREATED, Json(json!({"ok": true}))).into_response())
}

async fn get_database(State(accounts): State<Accounts>, Path(db): Path<String>) -> Reply {
    let dbs = accounts.read().await;
    let database = dbs.get(&db).ok_or_else(CouchError::no_database)?;
    let deleted = database.docs.len() - database.live_count();
    let props = if database.partitioned {
        json!({"partitioned": true})
    } else {
        json!({})
    };
    Ok(Json(json!({
        "db_name": db,
        "doc_count": database.live_count(),
        "doc_del_count": deleted,
        "update_seq": format!("{}-mock", database.update_seq),
        "compact_running": false,
        "props": props,
        "cluster": {"n": 1, "q": 1, "r": 1, "w": 1}
    }))
    .into_response())
}

async fn delete_database(State(accounts): State<Accounts>, Path(db): Path<String>) -> Reply {
    match accounts.write().await.remove(&db) {
        Some(_) => Ok(Json(json!({"ok": true})).into_response()),
        None => Err(CouchError::no_database()),
    }
}

#[derive(Deserialize)]
struct WriteQuery {
    rev: Option<String>,
    batch: Option<String>,
}

async fn post_document(
    State(accounts): State<Accounts>,
    Path(db): Path<String>,
    Query(query): Query<WriteQuery>,
    Json(body): Json<Map<String, Value>>,
) -> Reply {
    let mut dbs = accounts.write().await;
    let database = dbs.get_mut(&db).ok_or_else(CouchError::no_database)?;
    let id = match body.get("_id").and_then(Value::as_str) {
        Some(id) => id.to_string(),
        None => Uuid::new_v4().simple().to_string(),
    };
    let rev = body.get("_rev").and_then(Value::as_str).map(str::to_string);
    let new_rev = database.write(&id, rev.as_deref(), body)?;
    if query.batch.as_deref() == Some("ok") {
        return Ok((StatusCode::ACCEPTED, Json(json!({"ok": true, "id": id})))
            .into_response());
    }
    Ok(created(&id, &new_rev))
}

#[derive(Deserialize)]
struct ReadQuery {
    rev: Option<String>,
}

async fn get_document(
    State(accounts): State<Accounts>,
    Path((db, doc_id)): Path<(String, String)>,
    Query(query): Query<ReadQuery>,
) -> Reply {
    let dbs = accounts.read().await;
    let database = dbs.get(&db).ok_or_else(CouchError::no_database)?;
    let doc = database
        .docs
        .get(&doc_id)
        .ok_or_else(|| CouchError::not_found("missing"))?;
    if doc.deleted {
        return Err(CouchError::not_found("deleted"));
    }
    if query.rev.as_deref().is_some_and(|rev| rev != doc.rev) {
        return Err(CouchError::not_found("missing"));
    }
    Ok((
        [(header::ETAG, format!("\"{}\"", doc.rev))],
        Json(doc.to_json(&doc_id)),
    )
        .into_response())
}

async fn put_document(
    State(accounts): State<Accounts>,
    Path((db, doc_id)): Path<(String, String)>,
    Query(query): Query<WriteQuery>,
    headers: HeaderMap,
    Json(body): Json<Map<String, Value>>,
) -> Reply {
    let mut dbs = accounts.write().await;
    let database = dbs.get_mut(&db).ok_or_else(CouchError::no_database)?;
    let rev = body
        .get("_rev")
        .and_then(Value::as_str)
        .map(str::to_string)
        .or_else(|| claimed_rev(&query, &headers));
    let new_rev = database.write(&doc_id, rev.as_deref(), body)?;
    Ok(created(&doc_id, &new_rev))
}

async fn delete_document(
    State(accounts): State<Accounts>,
    Path((db, doc_id)): Path<(String, String)>,
    Query(query): Query<WriteQuery>,
    headers: HeaderMap,
) -> Reply {
    let mut dbs = accounts.write().await;
    let database = dbs.get_mut(&db).ok_or_else(CouchError::no_database)?;
    match database.docs.get(&doc_id) {
        Some(doc) if !doc.deleted => {}
        _ => return Err(CouchError::not_found("missing")),
    }
    let rev = claimed_rev(&query, &headers).ok_or_else(CouchError::conflict)?;
    let mut tombstone = Map::new();
    tombstone.insert("_deleted".to_string(), Value::Bool(true));
    let new_rev = database.write(&doc_id, Some(&rev), tombstone)?;
    Ok(Json(json!({"ok": true, "id": doc_id, "rev": new_rev})).into_response())
}

async fn get_attachment(
    State(accounts): State<Accounts>,
    Path((db, doc_id, attachment)): Path<(String, String, String)>,
) -> Reply {
    let dbs = accounts.read().await;
    let database = dbs.get(&db).ok_or_else(CouchError::no_database)?;
    let att = database
        .docs
        .get(&doc_id)
        .filter(|d| !d.deleted)
        .and_then(|d| d.attachments.get(&attachment))
        .ok_or_else(|| CouchError::not_found("Document is missing attachment"))?;
    Ok(([(header::CONTENT_TYPE, att.content_type.clone())], att.data.clone()).into_response())
}

async fn put_attachment(
    State(accounts): State<Accounts>,
    Path((db, doc_id, attachment)): Path<(String, String, String)>,
    Query(query): Query<WriteQuery>,
    headers: HeaderMap,
    data: Bytes,
) -> Reply {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();
    let mut dbs = accounts.write().await;
    let database = dbs.get_mut(&db).ok_or_else(CouchError::no_database)?;
    let rev = claimed_rev(&query, &headers);
    let body = match database.docs.get(&doc_id) {
        Some(doc) if !doc.deleted => doc.body.clone(),
        _ => Map::new(),
    };
    let new_rev = database.write(&doc_id, rev.as_deref(), body)?;
    if let Some(doc) = database.docs.get_mut(&doc_id) {
        let revpos = doc.generation();
        doc.attachments.insert(
            attachment,
            StoredAttachment {
                content_type,
                data: data.to_vec(),
                revpos,
            },
        );
    }
    Ok(created(&doc_id, &new_rev))
}

async fn delete_attachment(
    State(accounts): State<Accounts>,
    Path((db, doc_id, attachment)): Path<(String, String, String)>,
    Query(query): Query<WriteQuery>,
    headers: HeaderMap,
) -> Reply {
    let mut dbs = accounts.write().await;
    let database = dbs.get_mut(&db).ok_or_else(CouchError::no_database)?;
    let body = match database.docs.get(&doc_id) {
        Some(doc) if !doc.deleted && doc.attachments.contains_key(&attachment) => doc.body.clone(),
        _ => return Err(CouchError::not_found("Document is missing attachment")),
    };
    let rev = claimed_rev(&query, &headers).ok_or_else(CouchError::conflict)?;
    let new_rev = database.write(&doc_id, Some(&rev), body)?;
    if let Some(doc) = database.docs.get_mut(&doc_id) {
        doc.attachments.remove(&attachment);
    }
    Ok(Json(json!({"ok": true, "id": doc_id, "rev": new_rev})).into_response())
}

#[derive(Deserialize, Default)]
#[serde(default)]
struct AllDocsBody {
    include_docs: bool,
    descending: bool,
    limit: Option<usize>,
    skip: usize,
    keys: Option<Vec<String>>,
    startkey: Option<String>,
    endkey: Option<String>,
}

fn all_docs_row(id: &str, doc: &StoredDoc, include_docs: bool) -> Value {
    let mut row = json!({"id": id, "key": id, "value": {"rev": doc.rev}});
    if doc.deleted {
        row["value"]["deleted"] = Value::Bool(true);
    }
    if include_docs {
        row["doc"] = if doc.deleted { Value::Null } else { doc.to_json(id) };
    }
    row
}

async fn all_docs(
    State(accounts): State<Accounts>,
    Path(db): Path<String>,
    Json(body): Json<AllDocsBody>,
) -> Reply {
    let dbs = accounts.read().await;
    let database = dbs.get(&db).ok_or_else(CouchError::no_database)?;
    let rows: Vec<Value> = match &body.keys {
        Some(keys) => keys
            .iter()
            .map(|key| match database.docs.get(key) {
                Some(doc) => all_docs_row(key, doc, body.include_docs),
                None => json!({"key": key, "error": "not_found"}),
            })
            .collect(),
        None => {
            let (low, high) = if body.descending {
                (body.endkey.as_deref(), body.startkey.as_deref())
            } else {
                (body.startkey.as_deref(), body.endkey.as_deref())
            };
            let mut live: Vec<(&String, &StoredDoc)> = database
                .docs
                .iter()
                .filter(|(_, doc)| !doc.deleted)
                .filter(|(id, _)| low.map_or(true, |l| id.as_str() >= l))
                .filter(|(id, _)| high.map_or(true, |h| id.as_str() <= h))
                .collect();
            if body.descending {
                live.reverse();
            }
            live.into_iter()
                .skip(body.skip)
                .take(body.limit.unwrap_or(usize::MAX))
                .map(|(id, doc)| all_docs_row(id, doc, body.include_docs))
                .collect()
        }
    };
    Ok(Json(json!({
        "total_rows": database.live_count(),
        "offset": body.skip,
        "rows": rows
    }))
    .into_response())
}

#[derive(Deserialize)]
struct BulkDocsBody {
    docs: Vec<Map<String, Value>>,
}

async fn bulk_docs(
    State(accounts): State<Accounts>,
    Path(db): Path<String>,
    Json(body): Json<BulkDocsBody>,
) -> Reply {
    let mut dbs = accounts.write().await;
    let database = dbs.get_mut(&db).ok_or_else(CouchError::no_database)?;
    let results: Vec<Value> = body
        .docs
        .into_iter()
        .map(|doc| {
            let id = match doc.get("_id").and_then(Value::as_str) {
                Some(id) => id.to_string(),
                None => Uuid::new_v4().simple().to_string(),
            };
            let rev = doc.get("_rev").and_then(Value::as_str).map(str::to_string);
            match database.write(&id, rev.as_deref(), doc) {
                Ok(rev) => json!({"ok": true, "id": id, "rev": rev}),
                Err(e) => json!({"id": id, "error": e.error, "reason": e.reason}),
            }
        })
        .collect();
    Ok((StatusCode::CREATED, Json(Value::Array(results))).into_response())
}

async fn get_security(State(accounts): State<Accounts>, Path(db): Path<String>) -> Reply {
    let dbs = accounts.read().await;
    let database = dbs.get(&db).ok_or_else(CouchError::no_database)?;
    Ok(Json(Value::Object(database.security.clone())).into_response())
}

async fn put_security(
    State(accounts): State<Accounts>,
    Path(db): Path<String>,
    Json(body): Json<Map<String, Value>>,
) -> Reply {
    let mut dbs = accounts.write().await;
    let database = dbs.get_mut(&db).ok_or_else(CouchError::no_database)?;
    database.security = body;
    Ok(Json(json!({"ok": true})).into_response())
}
