//! HTTP API for the registry node.
//!
//! All routes live under `/api/v1`. Callers identify themselves with
//! the `x-yatri-principal` header; role checks happen in the registry
//! layer. Registry errors map onto status codes by kind: validation
//! 422, authorization 403, state conflicts 409, lookup misses 404, and
//! a paused registry 503. Error bodies carry a human-readable message
//! and a stable machine code.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Path, Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use yatri_core::{
    CoreError, ExternalIdHash, IdentityStatus, Principal, RegistryId, Role, TripState, VerifierId,
};
use yatri_registry::{
    AlertEligibility, AuditEntry, BulkVerifyReport, EmergencyContact, ErrorKind, IdentityRecord,
    RegistrationRequest, RegistryError, RegistryEvent, RegistryStats, VerifierApplication,
    VerifierInfo,
};

use crate::node::{NodeError, RegistryNode};

/// Header naming the principal a request acts as.
pub const PRINCIPAL_HEADER: &str = "x-yatri-principal";

type ApiError = (StatusCode, Json<ErrorResponse>);

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct StatusResponse {
    version: String,
    uptime_secs: u64,
    total_records: u64,
    total_verifiers: u64,
    paused: bool,
}

#[derive(Debug, Serialize)]
struct RegisterResponse {
    registry_id: u64,
}

#[derive(Debug, Serialize)]
struct VerifyResponse {
    registry_id: u64,
    verified: bool,
}

#[derive(Debug, Deserialize)]
struct BulkVerifyRequest {
    ids: Vec<u64>,
}

#[derive(Debug, Deserialize)]
struct StatusChangeRequest {
    status: IdentityStatus,
    #[serde(default)]
    reason: String,
}

#[derive(Debug, Serialize)]
struct StatusChangeResponse {
    registry_id: u64,
    status: IdentityStatus,
}

#[derive(Debug, Serialize)]
struct ContactResponse {
    registry_id: u64,
    contacts: usize,
}

#[derive(Debug, Serialize)]
struct TripResponse {
    registry_id: u64,
    trip_state: TripState,
}

#[derive(Debug, Deserialize)]
struct EmergencyAccessRequest {
    reason: String,
}

#[derive(Debug, Serialize)]
struct VerifierRegisterResponse {
    verifier_id: String,
}

#[derive(Debug, Serialize)]
struct VerifierListResponse {
    verifiers: Vec<VerifierInfo>,
    count: usize,
}

#[derive(Debug, Deserialize)]
struct SetActiveRequest {
    active: bool,
}

#[derive(Debug, Serialize)]
struct VerifierActiveResponse {
    verifier_id: String,
    active: bool,
}

#[derive(Debug, Deserialize)]
struct RoleRequest {
    principal: String,
    role: String,
}

#[derive(Debug, Serialize)]
struct RoleResponse {
    principal: String,
    role: Role,
    held: bool,
}

#[derive(Debug, Serialize)]
struct PauseResponse {
    paused: bool,
}

#[derive(Debug, Deserialize)]
struct AuditQuery {
    limit: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct EventsQuery {
    since: Option<usize>,
}

fn error_response(status: StatusCode, code: &str, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
            code: code.to_string(),
        }),
    )
}

fn map_node_error(err: NodeError) -> ApiError {
    match err {
        NodeError::Registry(e) => map_registry_error(e),
        NodeError::Storage(e) => {
            tracing::error!(error = %e, "storage write failed");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORAGE_ERROR",
                "internal storage error",
            )
        }
    }
}

fn map_registry_error(err: RegistryError) -> ApiError {
    let status = match err.kind() {
        ErrorKind::Validation => StatusCode::UNPROCESSABLE_ENTITY,
        ErrorKind::Authorization => StatusCode::FORBIDDEN,
        ErrorKind::State => StatusCode::CONFLICT,
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::Paused => StatusCode::SERVICE_UNAVAILABLE,
    };
    error_response(status, err.code(), err.to_string())
}

/// Extract the acting principal from the request headers.
fn require_principal(headers: &HeaderMap) -> Result<Principal, ApiError> {
    let raw = headers
        .get(PRINCIPAL_HEADER)
        .and_then(|value| value.to_str().ok())
        .ok_or_else(|| {
            error_response(
                StatusCode::UNAUTHORIZED,
                "MISSING_PRINCIPAL",
                format!("the {PRINCIPAL_HEADER} header is required"),
            )
        })?;
    Principal::new(raw)
        .map_err(|e| error_response(StatusCode::UNAUTHORIZED, "MISSING_PRINCIPAL", e.to_string()))
}

fn parse_principal(raw: &str) -> Result<Principal, ApiError> {
    Principal::new(raw).map_err(|e| {
        error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_PRINCIPAL",
            e.to_string(),
        )
    })
}

fn parse_role(raw: &str) -> Result<Role, ApiError> {
    raw.parse().map_err(|e: CoreError| {
        error_response(StatusCode::UNPROCESSABLE_ENTITY, "INVALID_ROLE", e.to_string())
    })
}

fn parse_verifier_id(raw: &str) -> Result<VerifierId, ApiError> {
    raw.parse().map_err(|e: CoreError| {
        error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "INVALID_VERIFIER_ID",
            e.to_string(),
        )
    })
}

fn parse_external_hash(raw: &str) -> Result<ExternalIdHash, ApiError> {
    raw.parse().map_err(|e: CoreError| {
        error_response(StatusCode::UNPROCESSABLE_ENTITY, "INVALID_HASH", e.to_string())
    })
}

// ---- handlers ----

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

async fn node_status(State(node): State<Arc<RegistryNode>>) -> Json<StatusResponse> {
    let stats = node.registry().stats();
    Json(StatusResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_secs: node.uptime_secs(),
        total_records: stats.total_records,
        total_verifiers: stats.total_verifiers,
        paused: node.registry().is_paused(),
    })
}

async fn registry_stats(State(node): State<Arc<RegistryNode>>) -> Json<RegistryStats> {
    Json(node.registry().stats())
}

async fn register_record(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
    Json(request): Json<RegistrationRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    let actor = require_principal(&headers)?;
    let id = node
        .register_identity(&actor, request)
        .map_err(map_node_error)?;
    Ok(Json(RegisterResponse {
        registry_id: id.value(),
    }))
}

async fn get_record(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<IdentityRecord>, ApiError> {
    let actor = require_principal(&headers)?;
    node.registry()
        .record(&actor, RegistryId(id))
        .map(Json)
        .map_err(map_registry_error)
}

async fn record_by_owner(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
    Path(principal): Path<String>,
) -> Result<Json<IdentityRecord>, ApiError> {
    let actor = require_principal(&headers)?;
    let owner = parse_principal(&principal)?;
    node.registry()
        .record_by_owner(&actor, &owner)
        .map(Json)
        .map_err(map_registry_error)
}

async fn record_by_external(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
    Path(hash): Path<String>,
) -> Result<Json<IdentityRecord>, ApiError> {
    let actor = require_principal(&headers)?;
    let hash = parse_external_hash(&hash)?;
    node.registry()
        .record_by_external_id(&actor, &hash)
        .map(Json)
        .map_err(map_registry_error)
}

async fn alert_eligibility(
    State(node): State<Arc<RegistryNode>>,
    Path(id): Path<u64>,
) -> Result<Json<AlertEligibility>, ApiError> {
    node.registry()
        .alert_eligibility(RegistryId(id))
        .map(Json)
        .map_err(map_registry_error)
}

async fn verify_record(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<VerifyResponse>, ApiError> {
    let actor = require_principal(&headers)?;
    node.verify_identity(&actor, RegistryId(id))
        .map_err(map_node_error)?;
    Ok(Json(VerifyResponse {
        registry_id: id,
        verified: true,
    }))
}

async fn bulk_verify(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
    Json(request): Json<BulkVerifyRequest>,
) -> Result<Json<BulkVerifyReport>, ApiError> {
    let actor = require_principal(&headers)?;
    let ids: Vec<RegistryId> = request.ids.into_iter().map(RegistryId).collect();
    node.bulk_verify(&actor, &ids)
        .map(Json)
        .map_err(map_node_error)
}

async fn change_record_status(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(request): Json<StatusChangeRequest>,
) -> Result<Json<StatusChangeResponse>, ApiError> {
    let actor = require_principal(&headers)?;
    node.change_status(&actor, RegistryId(id), request.status, &request.reason)
        .map_err(map_node_error)?;
    Ok(Json(StatusChangeResponse {
        registry_id: id,
        status: request.status,
    }))
}

async fn add_contact(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(contact): Json<EmergencyContact>,
) -> Result<Json<ContactResponse>, ApiError> {
    let actor = require_principal(&headers)?;
    node.add_emergency_contact(&actor, RegistryId(id), contact)
        .map_err(map_node_error)?;
    let contacts = node
        .registry()
        .store()
        .get(RegistryId(id))
        .map(|record| record.emergency_contacts.len())
        .unwrap_or(0);
    Ok(Json(ContactResponse {
        registry_id: id,
        contacts,
    }))
}

async fn start_trip(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<TripResponse>, ApiError> {
    let actor = require_principal(&headers)?;
    node.start_trip(&actor, RegistryId(id))
        .map_err(map_node_error)?;
    Ok(Json(TripResponse {
        registry_id: id,
        trip_state: TripState::Active,
    }))
}

async fn end_trip(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
) -> Result<Json<TripResponse>, ApiError> {
    let actor = require_principal(&headers)?;
    node.end_trip(&actor, RegistryId(id))
        .map_err(map_node_error)?;
    Ok(Json(TripResponse {
        registry_id: id,
        trip_state: TripState::Ended,
    }))
}

async fn emergency_access(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
    Path(id): Path<u64>,
    Json(request): Json<EmergencyAccessRequest>,
) -> Result<Json<IdentityRecord>, ApiError> {
    let actor = require_principal(&headers)?;
    node.emergency_access(&actor, RegistryId(id), &request.reason)
        .map(Json)
        .map_err(map_node_error)
}

async fn register_verifier(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
    Json(application): Json<VerifierApplication>,
) -> Result<Json<VerifierRegisterResponse>, ApiError> {
    let actor = require_principal(&headers)?;
    let id = node
        .register_verifier(&actor, application)
        .map_err(map_node_error)?;
    Ok(Json(VerifierRegisterResponse {
        verifier_id: id.to_string(),
    }))
}

async fn list_verifiers(
    State(node): State<Arc<RegistryNode>>,
) -> Json<VerifierListResponse> {
    let verifiers = node.registry().verifiers();
    let count = verifiers.len();
    Json(VerifierListResponse { verifiers, count })
}

async fn set_verifier_active(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(request): Json<SetActiveRequest>,
) -> Result<Json<VerifierActiveResponse>, ApiError> {
    let actor = require_principal(&headers)?;
    let verifier_id = parse_verifier_id(&id)?;
    node.set_verifier_active(&actor, verifier_id, request.active)
        .map_err(map_node_error)?;
    Ok(Json(VerifierActiveResponse {
        verifier_id: id,
        active: request.active,
    }))
}

async fn grant_role(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
    Json(request): Json<RoleRequest>,
) -> Result<Json<RoleResponse>, ApiError> {
    let actor = require_principal(&headers)?;
    let principal = parse_principal(&request.principal)?;
    let role = parse_role(&request.role)?;
    node.grant_role(&actor, &principal, role)
        .map_err(map_node_error)?;
    Ok(Json(RoleResponse {
        principal: request.principal,
        role,
        held: true,
    }))
}

async fn revoke_role(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
    Json(request): Json<RoleRequest>,
) -> Result<Json<RoleResponse>, ApiError> {
    let actor = require_principal(&headers)?;
    let principal = parse_principal(&request.principal)?;
    let role = parse_role(&request.role)?;
    node.revoke_role(&actor, &principal, role)
        .map_err(map_node_error)?;
    Ok(Json(RoleResponse {
        principal: request.principal,
        role,
        held: false,
    }))
}

async fn audit_log(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
    Query(query): Query<AuditQuery>,
) -> Result<Json<Vec<AuditEntry>>, ApiError> {
    let actor = require_principal(&headers)?;
    node.registry()
        .roles()
        .ensure(&actor, Role::Admin)
        .map_err(map_registry_error)?;
    let limit = query.limit.unwrap_or(50);
    Ok(Json(node.registry().audit().recent(limit)))
}

async fn event_journal(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
    Query(query): Query<EventsQuery>,
) -> Result<Json<Vec<RegistryEvent>>, ApiError> {
    let actor = require_principal(&headers)?;
    node.registry()
        .roles()
        .ensure(&actor, Role::Admin)
        .map_err(map_registry_error)?;
    let since = query.since.unwrap_or(0);
    Ok(Json(node.registry().events().since(since)))
}

async fn pause_registry(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
) -> Result<Json<PauseResponse>, ApiError> {
    let actor = require_principal(&headers)?;
    node.pause(&actor).map_err(map_node_error)?;
    Ok(Json(PauseResponse { paused: true }))
}

async fn resume_registry(
    State(node): State<Arc<RegistryNode>>,
    headers: HeaderMap,
) -> Result<Json<PauseResponse>, ApiError> {
    let actor = require_principal(&headers)?;
    node.resume(&actor).map_err(map_node_error)?;
    Ok(Json(PauseResponse { paused: false }))
}

/// Build the API router.
pub fn build_router(node: Arc<RegistryNode>) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/status", get(node_status))
        .route("/api/v1/stats", get(registry_stats))
        .route("/api/v1/records", post(register_record))
        .route("/api/v1/records/bulk-verify", post(bulk_verify))
        .route("/api/v1/records/by-owner/{principal}", get(record_by_owner))
        .route("/api/v1/records/by-external/{hash}", get(record_by_external))
        .route("/api/v1/records/{id}", get(get_record))
        .route(
            "/api/v1/records/{id}/alert-eligibility",
            get(alert_eligibility),
        )
        .route("/api/v1/records/{id}/verify", post(verify_record))
        .route("/api/v1/records/{id}/status", post(change_record_status))
        .route("/api/v1/records/{id}/contacts", post(add_contact))
        .route("/api/v1/records/{id}/trip/start", post(start_trip))
        .route("/api/v1/records/{id}/trip/end", post(end_trip))
        .route(
            "/api/v1/records/{id}/emergency-access",
            post(emergency_access),
        )
        .route(
            "/api/v1/verifiers",
            post(register_verifier).get(list_verifiers),
        )
        .route("/api/v1/verifiers/{id}/active", post(set_verifier_active))
        .route("/api/v1/roles/grant", post(grant_role))
        .route("/api/v1/roles/revoke", post(revoke_role))
        .route("/api/v1/audit", get(audit_log))
        .route("/api/v1/events", get(event_journal))
        .route("/api/v1/registry/pause", post(pause_registry))
        .route("/api/v1/registry/resume", post(resume_registry))
        .with_state(node)
}

/// Bind the listener and serve the API until the task ends.
pub async fn start_api_server(addr: SocketAddr, node: Arc<RegistryNode>) -> Result<()> {
    let router = build_router(node);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind api listener on {addr}"))?;
    tracing::info!(%addr, "http api listening");
    axum::serve(listener, router)
        .await
        .context("api server terminated")?;
    Ok(())
}
