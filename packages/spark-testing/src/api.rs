//! Mock REST API handlers.
//!
//! - `POST /memberships`: create a membership
//! - `GET /memberships`: list memberships (`roomId`, `personId`, `personEmail`, `max`)
//! - `GET /memberships/:id`: get a membership
//! - `PUT /memberships/:id`: update the moderator flag
//! - `DELETE /memberships/:id`: delete a membership
//! - `POST /rooms`: fixture, creates a room the caller joins as moderator
//! - `POST /people`: fixture, registers a person
//! - `GET /people/me`: the token owner
//!
//! Errors use the service's body shape: `{"message", "errors", "trackingId"}`.

use axum::{
    extract::{Path, Query, Request, State},
    http::{header, HeaderValue, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;

use crate::state::{
    MembershipFilter, MembershipRecord, MockState, Person, PersonRef, Room, StoreError,
};

// ── Errors ───────────────────────────────────────────────────────────────────

/// Error response in the service's shape.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    message: String,
    retry_after: Option<u64>,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            message: message.into(),
            retry_after: None,
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Invalid(msg) => Self::new(StatusCode::BAD_REQUEST, msg),
            StoreError::NotFound(msg) => Self::new(StatusCode::NOT_FOUND, msg),
            StoreError::Conflict(msg) => Self::new(StatusCode::CONFLICT, msg),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let tracking_id = format!("MOCK_{}", Uuid::new_v4());
        let body = Json(json!({
            "message": self.message,
            "errors": [{ "description": self.message }],
            "trackingId": tracking_id,
        }));

        let mut response = (self.status, body).into_response();
        if let Ok(value) = HeaderValue::from_str(&tracking_id) {
            response.headers_mut().insert("trackingid", value);
        }
        if let Some(secs) = self.retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}

// ── Middleware ───────────────────────────────────────────────────────────────

/// Serve an injected fault if one is queued, then require the bearer token.
pub async fn require_token(
    State(state): State<MockState>,
    request: Request,
    next: Next,
) -> Response {
    if let Some(fault) = state.take_fault().await {
        tracing::debug!(status = fault.status, "Serving injected fault");
        return ApiError {
            status: StatusCode::from_u16(fault.status)
                .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
            message: fault.message,
            retry_after: fault.retry_after,
        }
        .into_response();
    }

    let expected = format!("Bearer {}", state.config.access_token);
    let authorized = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == expected);

    if !authorized {
        tracing::warn!(path = %request.uri().path(), "Rejected request without valid token");
        return ApiError::new(
            StatusCode::UNAUTHORIZED,
            "The request requires a valid access token set in the Authorization request header.",
        )
        .into_response();
    }

    next.run(request).await
}

// ── Request / Response Types ─────────────────────────────────────────────────

/// POST /memberships
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMembershipRequest {
    /// Target room.
    pub room_id: Option<String>,
    /// Person by id; exclusive with `person_email`.
    pub person_id: Option<String>,
    /// Person by email; exclusive with `person_id`.
    pub person_email: Option<String>,
    /// Defaults to false.
    pub is_moderator: Option<bool>,
}

/// PUT /memberships/:id
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMembershipRequest {
    /// Required.
    pub is_moderator: Option<bool>,
}

/// GET /memberships query string
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListMembershipsQuery {
    /// Only memberships of this room.
    pub room_id: Option<String>,
    /// Only memberships of this person.
    pub person_id: Option<String>,
    /// Only memberships of this email.
    pub person_email: Option<String>,
    /// Upper bound on results.
    pub max: Option<usize>,
}

/// List envelope.
#[derive(Debug, Serialize)]
pub struct ItemsResponse<T: Serialize> {
    /// Listed resources.
    pub items: Vec<T>,
}

/// POST /rooms
#[derive(Debug, Deserialize)]
pub struct CreateRoomRequest {
    /// Room title.
    pub title: String,
}

/// POST /people
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePersonRequest {
    /// Primary email.
    pub email: String,
    /// Defaults to the email's local part.
    pub display_name: Option<String>,
}

// ── Membership Handlers ──────────────────────────────────────────────────────

/// POST /memberships: Add a person (by id or by email) to a room.
pub async fn create_membership(
    State(state): State<MockState>,
    Json(req): Json<CreateMembershipRequest>,
) -> Result<Json<MembershipRecord>, ApiError> {
    let room_id = req
        .room_id
        .filter(|r| !r.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("roomId is required"))?;

    let person = match (req.person_id, req.person_email) {
        (Some(id), None) => PersonRef::Id(id),
        (None, Some(email)) => PersonRef::Email(email),
        (Some(_), Some(_)) => {
            return Err(ApiError::bad_request(
                "Specify either personId or personEmail, not both",
            ))
        }
        (None, None) => return Err(ApiError::bad_request("personId or personEmail is required")),
    };

    let record =
        state.create_membership(&room_id, person, req.is_moderator.unwrap_or(false))?;
    Ok(Json(record))
}

/// GET /memberships: List visible memberships, newest first.
pub async fn list_memberships(
    State(state): State<MockState>,
    Query(query): Query<ListMembershipsQuery>,
) -> Result<Json<ItemsResponse<MembershipRecord>>, ApiError> {
    let filter = MembershipFilter {
        room_id: query.room_id,
        person_id: query.person_id,
        person_email: query.person_email,
        max: query.max,
    };
    let items = state.list_memberships(&filter)?;
    Ok(Json(ItemsResponse { items }))
}

/// GET /memberships/:id
pub async fn get_membership(
    State(state): State<MockState>,
    Path(id): Path<String>,
) -> Result<Json<MembershipRecord>, ApiError> {
    Ok(Json(state.membership(&id)?))
}

/// PUT /memberships/:id: Only `isModerator` may change.
pub async fn update_membership(
    State(state): State<MockState>,
    Path(id): Path<String>,
    Json(req): Json<UpdateMembershipRequest>,
) -> Result<Json<MembershipRecord>, ApiError> {
    let is_moderator = req
        .is_moderator
        .ok_or_else(|| ApiError::bad_request("isModerator is required"))?;
    Ok(Json(state.update_membership(&id, is_moderator)?))
}

/// DELETE /memberships/:id
pub async fn delete_membership(
    State(state): State<MockState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.delete_membership(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// ── Fixture Handlers ─────────────────────────────────────────────────────────

/// POST /rooms
pub async fn create_room(
    State(state): State<MockState>,
    Json(req): Json<CreateRoomRequest>,
) -> Result<Json<Room>, ApiError> {
    Ok(Json(state.create_room(&req.title)?))
}

/// POST /people
pub async fn create_person(
    State(state): State<MockState>,
    Json(req): Json<CreatePersonRequest>,
) -> Result<Json<Person>, ApiError> {
    Ok(Json(
        state.create_person(&req.email, req.display_name.as_deref())?,
    ))
}

/// GET /people/me
pub async fn me(State(state): State<MockState>) -> Json<Person> {
    Json(state.me())
}

/// GET /health
pub async fn health() -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "service": "spark-mock-server",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
