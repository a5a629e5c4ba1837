//! Resource routes served by local business handlers.
//!
//! The business logic behind these routes lives outside the gateway core.
//! Each route is bound to a placeholder that honors the handler contract:
//! reads and most writes reply `200 {}`, deletes and fire-and-forget
//! actions reply `200` with an empty body.

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::handler::Handler;
use crate::routing::{HttpMethod, PathParams, PermissionSet, RouteError, RouteTableBuilder};

use HttpMethod::{Delete, Get, Patch, Post};
use Reply::{Empty, Object};

pub const DOCUMENT_READ: &str = "document.read";
pub const DOCUMENT_WRITE: &str = "document.write";
pub const QA_READ: &str = "qa.read";
pub const USER_READ: &str = "user.read";

/// What a placeholder handler sends back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    /// `200` with `{}`.
    Object,
    /// `200` with no body.
    Empty,
}

/// `(method, template, scope, operation, reply)`
type ResourceRoute = (HttpMethod, &'static str, &'static str, &'static str, Reply);

pub const RESOURCE_ROUTES: &[ResourceRoute] = &[
    // Datasets
    (Get, "/api/v1/dataset/algos", DOCUMENT_READ, "dataset.list_algos", Object),
    (Get, "/api/v1/dataset/tags", DOCUMENT_READ, "dataset.all_tags", Object),
    (Get, "/api/v1/datasets", DOCUMENT_READ, "dataset.list", Object),
    (Post, "/api/v1/datasets", DOCUMENT_WRITE, "dataset.create", Object),
    (Get, "/api/v1/datasets/{dataset}", DOCUMENT_READ, "dataset.get", Object),
    (Delete, "/api/v1/datasets/{dataset}", DOCUMENT_WRITE, "dataset.delete", Empty),
    (Patch, "/api/v1/datasets/{dataset}", DOCUMENT_WRITE, "dataset.update", Object),
    (Post, "/api/v1/datasets/{dataset}:setDefault", DOCUMENT_WRITE, "dataset.set_default", Object),
    (Post, "/api/v1/datasets/{dataset}:unsetDefault", DOCUMENT_WRITE, "dataset.unset_default", Object),
    (Get, "/api/v1/datasets:allDefaultDatasets", DOCUMENT_READ, "dataset.all_defaults", Object),
    (Post, "/api/v1/datasets:presignUploadCoverImageUrl", DOCUMENT_WRITE, "dataset.presign_cover_upload", Object),
    (Post, "/api/v1/datasets:search", DOCUMENT_READ, "dataset.search", Object),
    (Post, "/api/v1/datasets/{dataset}/tasks:callback", DOCUMENT_WRITE, "dataset.task_callback", Empty),
    // Documents
    (Get, "/api/v1/datasets/{dataset}/documents", DOCUMENT_READ, "document.list", Object),
    (Post, "/api/v1/datasets/{dataset}/documents", DOCUMENT_WRITE, "document.create", Object),
    (Get, "/api/v1/datasets/{dataset}/documents/{document}", DOCUMENT_READ, "document.get", Object),
    (Delete, "/api/v1/datasets/{dataset}/documents/{document}", DOCUMENT_WRITE, "document.delete", Empty),
    (Patch, "/api/v1/datasets/{dataset}/documents/{document}", DOCUMENT_WRITE, "document.update", Object),
    (Post, "/api/v1/datasets/{dataset}/documents:search", DOCUMENT_READ, "document.search", Object),
    (Post, "/api/v1/documents:search", DOCUMENT_READ, "document.search_all", Object),
    (Post, "/api/v1/datasets/{dataset}:batchDelete", DOCUMENT_WRITE, "document.batch_delete", Empty),
    (Get, "/api/v1/document/creators", DOCUMENT_READ, "document.all_creators", Object),
    (Get, "/api/v1/document/tags", DOCUMENT_READ, "document.all_tags", Object),
    (Post, "/api/v1/datasets/{dataset}/documents/{document}/table:add", DOCUMENT_WRITE, "document.table_add", Empty),
    (Post, "/api/v1/datasets/{dataset}/documents/{document}/table:batchDelete", DOCUMENT_WRITE, "document.table_batch_delete", Empty),
    (Post, "/api/v1/datasets/{dataset}/documents/{document}/table:modify", DOCUMENT_WRITE, "document.table_modify", Object),
    (Get, "/api/v1/datasets/{dataset}/documents/{document}/table:search", DOCUMENT_READ, "document.table_search", Object),
    // Segments
    (Get, "/api/v1/datasets/{dataset}/documents/{document}/segments", DOCUMENT_READ, "segment.list", Object),
    (Get, "/api/v1/datasets/{dataset}/documents/{document}/segments/{segment}", DOCUMENT_READ, "segment.get", Object),
    (Post, "/api/v1/datasets/{dataset}/documents/{document}/segments/{segment}:edit", DOCUMENT_WRITE, "segment.edit", Object),
    (Post, "/api/v1/datasets/{dataset}/documents/{document}/segments/{segment}:modifyStatus", DOCUMENT_WRITE, "segment.modify_status", Empty),
    (Post, "/api/v1/datasets/{dataset}/documents/{document}/segments:search", DOCUMENT_READ, "segment.search", Object),
    (Delete, "/api/v1/datasets/{dataset}/group/{group}/documents/{document}/segments/{segment}", DOCUMENT_WRITE, "segment.delete", Empty),
    (Post, "/api/v1/segment/imageURIs:batchSign", DOCUMENT_READ, "segment.batch_sign_image_uri", Object),
    (Post, "/api/v1/segments:bulkDelete", DOCUMENT_WRITE, "segment.bulk_delete", Empty),
    (Post, "/api/v1/segments:hybrid", DOCUMENT_READ, "segment.hybrid_search", Object),
    (Post, "/api/v1/segments:scroll", DOCUMENT_READ, "segment.scroll", Object),
    // Tables
    (Get, "/api/v1/datasets/{dataset}/documents/{document}/table/meta", DOCUMENT_READ, "table.get_meta", Object),
    (Post, "/api/v1/table:findMeta", DOCUMENT_READ, "table.find_meta", Object),
    (Post, "/api/v1/table:query", DOCUMENT_READ, "table.query", Object),
    // Dataset members
    (Get, "/api/v1/datasets/{dataset}/members", DOCUMENT_READ, "member.list", Object),
    (Get, "/api/v1/datasets/{dataset}/members/{member}", DOCUMENT_READ, "member.get", Object),
    (Delete, "/api/v1/datasets/{dataset}/members/{member}", DOCUMENT_WRITE, "member.delete", Empty),
    (Patch, "/api/v1/datasets/{dataset}/members/{member}", DOCUMENT_WRITE, "member.update", Object),
    (Post, "/api/v1/datasets/{dataset}/members:search", DOCUMENT_READ, "member.search", Object),
    (Post, "/api/v1/datasets/{dataset}:batchAddMember", DOCUMENT_WRITE, "member.batch_add", Object),
    // Tasks
    (Get, "/api/v1/datasets/{dataset}/tasks", DOCUMENT_READ, "task.list", Object),
    (Post, "/api/v1/datasets/{dataset}/tasks", DOCUMENT_WRITE, "task.create", Object),
    (Get, "/api/v1/datasets/{dataset}/tasks/{task}", DOCUMENT_READ, "task.get", Object),
    (Delete, "/api/v1/datasets/{dataset}/tasks/{task}", DOCUMENT_WRITE, "task.delete", Empty),
    (Post, "/api/v1/datasets/{dataset}/tasks/{task}:cancel", DOCUMENT_WRITE, "task.cancel", Empty),
    (Post, "/api/v1/datasets/{dataset}/tasks/{task}:suspend", DOCUMENT_WRITE, "task.suspend", Empty),
    (Post, "/api/v1/datasets/{dataset}/tasks/{task}:resume", DOCUMENT_WRITE, "task.resume", Empty),
    (Post, "/api/v1/datasets/{dataset}/tasks/{task}:callback", DOCUMENT_WRITE, "task.callback", Empty),
    // Retrieval
    (Get, "/api/v1/search:allSearchHistory", QA_READ, "retrieval.all_search_history", Object),
    (Post, "/api/v1/search:searchKnowledge", QA_READ, "retrieval.search_knowledge", Object),
    (Delete, "/api/v1/searchHistories/{searchHistory}", QA_READ, "retrieval.delete_search_history", Empty),
    // RAG databases
    (Get, "/api/v1/rag/database/tags", DOCUMENT_READ, "database.tags", Object),
    (Post, "/api/v1/rag/databases", DOCUMENT_READ, "database.list", Object),
    (Post, "/api/v1/rag/databases/create", DOCUMENT_WRITE, "database.create", Object),
    (Get, "/api/v1/rag/databases/summary", DOCUMENT_READ, "database.summaries", Object),
    (Post, "/api/v1/rag/databases/validate-connection", DOCUMENT_WRITE, "database.validate_connection", Object),
    (Delete, "/api/v1/rag/databases/{database_id}", DOCUMENT_WRITE, "database.delete", Empty),
    (Post, "/api/v1/rag/databases/{database_id}/tables", DOCUMENT_READ, "database.tables", Object),
    (Post, "/api/v1/rag/databases/{database_id}/tables/{table_id}/cell", DOCUMENT_WRITE, "database.update_cell", Object),
    (Post, "/api/v1/rag/databases/{database_id}/tables/{table_id}/preview", DOCUMENT_READ, "database.preview_rows", Object),
    (Post, "/api/v1/rag/databases/{database_id}/update", DOCUMENT_WRITE, "database.update", Object),
    // Internal
    (Get, "/api/v1/inner/datasets/{dataset}:internal", DOCUMENT_READ, "inner.get_dataset", Object),
    (Post, "/api/v1/inner/rag:knowledgeRetrieve", QA_READ, "inner.knowledge_retrieve", Object),
    // Writer segment jobs
    (Post, "/api/v1/writerSegmentJob:submit", DOCUMENT_WRITE, "writer_segment_job.submit", Object),
    (Get, "/api/v1/writerSegmentJobs/{writerSegmentJob}", DOCUMENT_READ, "writer_segment_job.get", Object),
    // Probes
    (Get, "/api/hello", USER_READ, "probe.hello", Object),
    (Get, "/api/admin", DOCUMENT_WRITE, "probe.admin", Object),
];

/// Register every resource route.
pub fn register(builder: &mut RouteTableBuilder) -> Result<(), RouteError> {
    for &(method, template, scope, operation, reply) in RESOURCE_ROUTES {
        builder.register(method, template, [scope], placeholder(operation, reply))?;
    }

    // Unprotected liveness routes declare no scopes.
    builder.register(Get, "/hello", PermissionSet::none(), message("Hello from Backend"))?;
    builder.register(Get, "/admin", PermissionSet::none(), message("Admin only area"))?;
    Ok(())
}

/// Handler standing in for an external business handler.
pub fn placeholder(operation: &'static str, reply: Reply) -> impl Handler {
    move |request: Request<Body>| async move {
        let params = request.extensions().get::<PathParams>().cloned().unwrap_or_default();
        tracing::debug!(operation, params = ?params, "Resource handler invoked");
        match reply {
            Object => Json(json!({})).into_response(),
            Empty => StatusCode::OK.into_response(),
        }
    }
}

fn message(text: &'static str) -> impl Handler {
    move |_request: Request<Body>| async move { Json(json!({ "message": text })).into_response() }
}
