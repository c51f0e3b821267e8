// Support ticket endpoint handlers

use axum::{extract::State, Json};
use chrono::Utc;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::error::ApiResult;
use crate::handlers::extract::{JsonBody, PathParam, QueryParams};
use crate::handlers::{enforce_rate_limit, AppState};
use crate::models::ticket::{
    CreateTicketRequest, TicketDetailResponse, TicketListQuery, TicketListResponse,
    TicketMessageRequest, TicketMessageResponse, TicketStatusRequest, TicketView,
};
use crate::models::PageParams;
use crate::services::ticket_service;

/// GET /api/tickets
pub async fn list_tickets(
    State(state): State<AppState>,
    user: AuthUser,
    QueryParams(params): QueryParams<TicketListQuery>,
) -> ApiResult<Json<TicketListResponse>> {
    let page = PageParams {
        limit: params.limit,
        offset: params.offset,
    };
    let tickets =
        ticket_service::list(&state.repositories, user.id, params.status, page).await?;
    Ok(Json(tickets))
}

/// POST /api/tickets
pub async fn create_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    JsonBody(body): JsonBody<CreateTicketRequest>,
) -> ApiResult<Json<TicketDetailResponse>> {
    enforce_rate_limit(&state, &user).await?;
    let detail = ticket_service::create(&state.repositories, user.id, body, Utc::now()).await?;
    Ok(Json(detail))
}

/// GET /api/tickets/{id}
pub async fn get_ticket(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(ticket_id): PathParam<Uuid>,
) -> ApiResult<Json<TicketDetailResponse>> {
    let detail = ticket_service::get(&state.repositories, user.id, ticket_id).await?;
    Ok(Json(detail))
}

/// POST /api/tickets/{id}/messages
pub async fn post_message(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(ticket_id): PathParam<Uuid>,
    JsonBody(body): JsonBody<TicketMessageRequest>,
) -> ApiResult<Json<TicketMessageResponse>> {
    enforce_rate_limit(&state, &user).await?;
    let reply = ticket_service::post_message(
        &state.repositories,
        user.id,
        ticket_id,
        &body.message,
        Utc::now(),
    )
    .await?;
    Ok(Json(reply))
}

/// PATCH /api/tickets/{id}/status
pub async fn update_status(
    State(state): State<AppState>,
    user: AuthUser,
    PathParam(ticket_id): PathParam<Uuid>,
    JsonBody(body): JsonBody<TicketStatusRequest>,
) -> ApiResult<Json<TicketView>> {
    enforce_rate_limit(&state, &user).await?;
    let ticket = ticket_service::update_status(
        &state.repositories,
        user.id,
        ticket_id,
        body.status,
        Utc::now(),
    )
    .await?;
    Ok(Json(ticket))
}
