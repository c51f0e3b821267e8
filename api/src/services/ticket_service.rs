// Support tickets: creation, threaded replies and status changes

use chrono::{DateTime, Utc};
use sea_orm::ActiveValue::Set;
use uuid::Uuid;

use crate::db::Repositories;
use crate::entity::{support_tickets, ticket_messages};
use crate::error::{ApiError, ApiResult};
use crate::models::ticket::{
    CreateTicketRequest, TicketDetailResponse, TicketListResponse, TicketMessageResponse,
    TicketMessageView, TicketStatus, TicketView,
};
use crate::models::PageParams;

const SUBJECT_MIN_CHARS: usize = 3;
const SUBJECT_MAX_CHARS: usize = 200;
const MESSAGE_MAX_CHARS: usize = 5000;

/// Trimmed subject, or why it was refused
pub fn validate_subject(subject: &str) -> ApiResult<String> {
    let subject = subject.trim();
    let len = subject.chars().count();
    if !(SUBJECT_MIN_CHARS..=SUBJECT_MAX_CHARS).contains(&len) {
        return Err(ApiError::BadRequest(format!(
            "O assunto deve ter entre {} e {} caracteres",
            SUBJECT_MIN_CHARS, SUBJECT_MAX_CHARS
        )));
    }
    Ok(subject.to_string())
}

pub fn validate_message(message: &str) -> ApiResult<String> {
    let message = message.trim();
    if message.is_empty() {
        return Err(ApiError::BadRequest(
            "A mensagem não pode estar vazia".to_string(),
        ));
    }
    if message.chars().count() > MESSAGE_MAX_CHARS {
        return Err(ApiError::BadRequest(format!(
            "A mensagem deve ter no máximo {} caracteres",
            MESSAGE_MAX_CHARS
        )));
    }
    Ok(message.to_string())
}

/// Status a ticket moves to after a reply, if it changes at all
pub fn status_after_reply(current: TicketStatus, is_staff: bool) -> Option<TicketStatus> {
    match (current, is_staff) {
        (TicketStatus::Open, true) => Some(TicketStatus::InProgress),
        (TicketStatus::Resolved, false) => Some(TicketStatus::Open),
        _ => None,
    }
}

/// Admins may set anything; owners may only close their own ticket
pub fn can_set_status(is_admin: bool, is_owner: bool, target: TicketStatus) -> bool {
    is_admin || (is_owner && target == TicketStatus::Closed)
}

/// Ticket the caller is allowed to see, plus whether they act as staff
async fn load_visible(
    repos: &Repositories,
    user_id: Uuid,
    ticket_id: Uuid,
) -> ApiResult<(support_tickets::Model, bool)> {
    let ticket = repos
        .tickets
        .get_ticket(ticket_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("Ticket não encontrado".to_string()))?;

    if ticket.user_id == user_id {
        let is_admin = repos.profiles.is_admin(user_id).await?;
        return Ok((ticket, is_admin));
    }
    if repos.profiles.is_admin(user_id).await? {
        return Ok((ticket, true));
    }
    Err(ApiError::Forbidden(
        "Você não tem acesso a este ticket".to_string(),
    ))
}

pub async fn create(
    repos: &Repositories,
    user_id: Uuid,
    request: CreateTicketRequest,
    now: DateTime<Utc>,
) -> ApiResult<TicketDetailResponse> {
    let subject = validate_subject(&request.subject)?;
    let body = validate_message(&request.message)?;

    let ticket = repos
        .tickets
        .insert_ticket(support_tickets::ActiveModel {
            id: Set(Uuid::new_v4()),
            user_id: Set(user_id),
            subject: Set(subject),
            category: Set(request.category.as_str().to_string()),
            priority: Set(request.priority.as_str().to_string()),
            status: Set(TicketStatus::Open.as_str().to_string()),
            created_at: Set(now),
            updated_at: Set(now),
            last_message_at: Set(now),
        })
        .await?;

    let message = match repos
        .tickets
        .insert_message(ticket_messages::ActiveModel {
            id: Set(Uuid::new_v4()),
            ticket_id: Set(ticket.id),
            sender_id: Set(user_id),
            is_staff: Set(false),
            message: Set(body),
            created_at: Set(now),
        })
        .await
    {
        Ok(message) => message,
        Err(e) => {
            tracing::error!("First message of ticket {} not saved: {}", ticket.id, e);
            if let Err(delete_err) = repos.tickets.delete_ticket(ticket.id).await {
                tracing::error!("Empty ticket {} left behind: {}", ticket.id, delete_err);
            }
            return Err(e.into());
        }
    };

    tracing::info!("Ticket {} opened by user {} ({})", ticket.id, user_id, ticket.category);

    Ok(TicketDetailResponse {
        ticket: TicketView::from(&ticket),
        messages: vec![TicketMessageView::from(&message)],
    })
}

pub async fn list(
    repos: &Repositories,
    user_id: Uuid,
    status: Option<TicketStatus>,
    page: PageParams,
) -> ApiResult<TicketListResponse> {
    let owner = if repos.profiles.is_admin(user_id).await? {
        None
    } else {
        Some(user_id)
    };
    let (limit, offset) = page.window();
    let tickets = repos
        .tickets
        .list_tickets(owner, status.map(|s| s.as_str()), limit, offset)
        .await?;

    Ok(TicketListResponse {
        total: tickets.len(),
        tickets: tickets.iter().map(TicketView::from).collect(),
        limit,
        offset,
    })
}

pub async fn get(
    repos: &Repositories,
    user_id: Uuid,
    ticket_id: Uuid,
) -> ApiResult<TicketDetailResponse> {
    let (ticket, _) = load_visible(repos, user_id, ticket_id).await?;
    let messages = repos.tickets.messages_for_ticket(ticket.id).await?;

    Ok(TicketDetailResponse {
        ticket: TicketView::from(&ticket),
        messages: messages.iter().map(TicketMessageView::from).collect(),
    })
}

pub async fn post_message(
    repos: &Repositories,
    user_id: Uuid,
    ticket_id: Uuid,
    message: &str,
    now: DateTime<Utc>,
) -> ApiResult<TicketMessageResponse> {
    let body = validate_message(message)?;
    let (mut ticket, is_staff) = load_visible(repos, user_id, ticket_id).await?;

    let current = TicketStatus::parse(&ticket.status).unwrap_or(TicketStatus::Open);
    if current == TicketStatus::Closed {
        return Err(ApiError::BadRequest(
            "Este ticket está fechado".to_string(),
        ));
    }

    let saved = repos
        .tickets
        .insert_message(ticket_messages::ActiveModel {
            id: Set(Uuid::new_v4()),
            ticket_id: Set(ticket.id),
            sender_id: Set(user_id),
            is_staff: Set(is_staff),
            message: Set(body),
            created_at: Set(now),
        })
        .await?;

    let next = status_after_reply(current, is_staff);
    repos
        .tickets
        .touch(ticket.id, next.map(|s| s.as_str()), now)
        .await?;

    if let Some(status) = next {
        tracing::debug!("Ticket {} moved {} -> {}", ticket.id, ticket.status, status.as_str());
        ticket.status = status.as_str().to_string();
    }
    ticket.last_message_at = now;
    ticket.updated_at = now;

    Ok(TicketMessageResponse {
        ticket: TicketView::from(&ticket),
        message: TicketMessageView::from(&saved),
    })
}

pub async fn update_status(
    repos: &Repositories,
    user_id: Uuid,
    ticket_id: Uuid,
    status: TicketStatus,
    now: DateTime<Utc>,
) -> ApiResult<TicketView> {
    let (mut ticket, is_admin) = load_visible(repos, user_id, ticket_id).await?;
    let is_owner = ticket.user_id == user_id;

    if !can_set_status(is_admin, is_owner, status) {
        return Err(ApiError::Forbidden(
            "Você só pode fechar seus próprios tickets".to_string(),
        ));
    }

    repos
        .tickets
        .set_status(ticket.id, status.as_str(), now)
        .await?;
    tracing::info!("Ticket {} set to {} by user {}", ticket.id, status.as_str(), user_id);

    ticket.status = status.as_str().to_string();
    ticket.updated_at = now;
    Ok(TicketView::from(&ticket))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::profiles;
    use crate::models::ticket::{TicketCategory, TicketPriority};
    use crate::services::wallet_service::tests::{
        exec, mock_repositories, transaction_log, where_clause,
    };
    use sea_orm::{DatabaseBackend, DbErr, MockDatabase};

    fn ticket(owner: Uuid, status: TicketStatus) -> support_tickets::Model {
        let now = Utc::now();
        support_tickets::Model {
            id: Uuid::new_v4(),
            user_id: owner,
            subject: "Pix não caiu".to_string(),
            category: "payment".to_string(),
            priority: "normal".to_string(),
            status: status.as_str().to_string(),
            created_at: now,
            updated_at: now,
            last_message_at: now,
        }
    }

    fn message(ticket_id: Uuid, sender: Uuid, is_staff: bool) -> ticket_messages::Model {
        ticket_messages::Model {
            id: Uuid::new_v4(),
            ticket_id,
            sender_id: sender,
            is_staff,
            message: "Olá".to_string(),
            created_at: Utc::now(),
        }
    }

    fn profile(id: Uuid, is_admin: bool) -> profiles::Model {
        let now = Utc::now();
        profiles::Model {
            id,
            display_name: None,
            is_premium: false,
            is_admin,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn test_subject_bounds() {
        assert!(validate_subject("oi").is_err());
        assert!(validate_subject("   oi   ").is_err());
        assert_eq!(validate_subject("  Boost  ").unwrap(), "Boost");
        assert!(validate_subject(&"a".repeat(200)).is_ok());
        assert!(validate_subject(&"a".repeat(201)).is_err());
        // Counted in characters, not bytes
        assert!(validate_subject(&"ç".repeat(200)).is_ok());
    }

    #[test]
    fn test_message_bounds() {
        assert!(validate_message("   ").is_err());
        assert!(validate_message("x").is_ok());
        assert!(validate_message(&"x".repeat(5000)).is_ok());
        assert!(validate_message(&"x".repeat(5001)).is_err());
    }

    #[test]
    fn test_reply_transitions() {
        assert_eq!(
            status_after_reply(TicketStatus::Open, true),
            Some(TicketStatus::InProgress)
        );
        assert_eq!(status_after_reply(TicketStatus::Open, false), None);
        assert_eq!(
            status_after_reply(TicketStatus::Resolved, false),
            Some(TicketStatus::Open)
        );
        assert_eq!(status_after_reply(TicketStatus::Resolved, true), None);
        assert_eq!(status_after_reply(TicketStatus::InProgress, true), None);
    }

    #[test]
    fn test_status_permissions() {
        assert!(can_set_status(true, false, TicketStatus::Resolved));
        assert!(can_set_status(false, true, TicketStatus::Closed));
        assert!(!can_set_status(false, true, TicketStatus::Resolved));
        assert!(!can_set_status(false, false, TicketStatus::Closed));
    }

    #[tokio::test]
    async fn test_create_opens_ticket_with_first_message() {
        let user = Uuid::new_v4();
        let t = ticket(user, TicketStatus::Open);
        let m = message(t.id, user, false);

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![t.clone()]])
            .append_query_results([vec![m.clone()]])
            .into_connection();
        let repos = Repositories::new(conn);

        let request = CreateTicketRequest {
            subject: "Pix não caiu".to_string(),
            category: TicketCategory::Payment,
            priority: TicketPriority::Normal,
            message: "Fiz um depósito ontem".to_string(),
        };
        let detail = create(&repos, user, request, Utc::now()).await.unwrap();
        assert_eq!(detail.ticket.status, "open");
        assert_eq!(detail.messages.len(), 1);
        assert!(!detail.messages[0].is_staff);
    }

    #[tokio::test]
    async fn test_get_foreign_ticket_is_forbidden() {
        let stranger = Uuid::new_v4();
        let t = ticket(Uuid::new_v4(), TicketStatus::Open);

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![t.clone()]])
            .append_query_results([vec![profile(stranger, false)]])
            .into_connection();
        let repos = Repositories::new(conn);

        let result = get(&repos, stranger, t.id).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_get_missing_ticket_is_not_found() {
        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([Vec::<support_tickets::Model>::new()])
            .into_connection();
        let repos = Repositories::new(conn);

        let result = get(&repos, Uuid::new_v4(), Uuid::new_v4()).await;
        assert!(matches!(result, Err(ApiError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_reply_to_closed_ticket_is_rejected() {
        let user = Uuid::new_v4();
        let t = ticket(user, TicketStatus::Closed);

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![t.clone()]])
            .append_query_results([vec![profile(user, false)]])
            .into_connection();
        let repos = Repositories::new(conn);

        let result = post_message(&repos, user, t.id, "alguma novidade?", Utc::now()).await;
        assert!(matches!(result, Err(ApiError::BadRequest(_))));
    }

    #[tokio::test]
    async fn test_staff_reply_moves_open_ticket_to_in_progress() {
        let admin = Uuid::new_v4();
        let t = ticket(Uuid::new_v4(), TicketStatus::Open);
        let m = message(t.id, admin, true);

        let (repos, conn) = mock_repositories(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![t.clone()]])
                .append_query_results([vec![profile(admin, true)]])
                .append_query_results([vec![m.clone()]])
                .append_exec_results([exec(1)]),
        );

        let reply = post_message(&repos, admin, t.id, "Estamos verificando", Utc::now())
            .await
            .unwrap();
        assert_eq!(reply.ticket.status, "in_progress");
        assert!(reply.message.is_staff);

        let log = transaction_log(repos, conn);
        assert_eq!(log.len(), 4);
    }

    #[tokio::test]
    async fn test_owner_reply_reopens_resolved_ticket() {
        let user = Uuid::new_v4();
        let t = ticket(user, TicketStatus::Resolved);
        let m = message(t.id, user, false);

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![t.clone()]])
            .append_query_results([vec![profile(user, false)]])
            .append_query_results([vec![m]])
            .append_exec_results([exec(1)])
            .into_connection();
        let repos = Repositories::new(conn);

        let reply = post_message(&repos, user, t.id, "Voltou a acontecer", Utc::now())
            .await
            .unwrap();
        assert_eq!(reply.ticket.status, "open");
    }

    #[tokio::test]
    async fn test_owner_cannot_resolve_own_ticket() {
        let user = Uuid::new_v4();
        let t = ticket(user, TicketStatus::Open);

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![t.clone()]])
            .append_query_results([vec![profile(user, false)]])
            .into_connection();
        let repos = Repositories::new(conn);

        let result = update_status(&repos, user, t.id, TicketStatus::Resolved, Utc::now()).await;
        assert!(matches!(result, Err(ApiError::Forbidden(_))));
    }

    #[tokio::test]
    async fn test_owner_can_close_own_ticket() {
        let user = Uuid::new_v4();
        let t = ticket(user, TicketStatus::InProgress);

        let conn = MockDatabase::new(DatabaseBackend::Postgres)
            .append_query_results([vec![t.clone()]])
            .append_query_results([vec![profile(user, false)]])
            .append_exec_results([exec(1)])
            .into_connection();
        let repos = Repositories::new(conn);

        let view = update_status(&repos, user, t.id, TicketStatus::Closed, Utc::now())
            .await
            .unwrap();
        assert_eq!(view.status, "closed");
    }

    #[tokio::test]
    async fn test_create_drops_ticket_when_first_message_fails() {
        let user = Uuid::new_v4();
        let t = ticket(user, TicketStatus::Open);

        let (repos, conn) = mock_repositories(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![t.clone()]])
                .append_query_errors([DbErr::Custom("insert failed".to_string())])
                .append_exec_results([exec(1)]),
        );

        let request = CreateTicketRequest {
            subject: "Boost sumiu".to_string(),
            category: TicketCategory::Boost,
            priority: TicketPriority::High,
            message: "Paguei e o evento não aparece em destaque".to_string(),
        };
        let result = create(&repos, user, request, Utc::now()).await;
        assert!(result.is_err());

        // ticket insert, failed message insert, delete of the empty ticket
        let log = transaction_log(repos, conn);
        assert_eq!(log.len(), 3);
        assert!(format!("{:?}", log[2]).contains("DELETE FROM"));
    }

    #[tokio::test]
    async fn test_admin_listing_is_paged() {
        let admin = Uuid::new_v4();
        let rows = vec![
            ticket(Uuid::new_v4(), TicketStatus::Open),
            ticket(Uuid::new_v4(), TicketStatus::InProgress),
        ];

        let (repos, conn) = mock_repositories(
            MockDatabase::new(DatabaseBackend::Postgres)
                .append_query_results([vec![profile(admin, true)]])
                .append_query_results([rows]),
        );

        let page = PageParams {
            limit: Some(500),
            offset: Some(40),
        };
        let listing = list(&repos, admin, None, page).await.unwrap();
        assert_eq!(listing.total, 2);
        assert_eq!((listing.limit, listing.offset), (100, 40));

        let log = transaction_log(repos, conn);
        let sql = format!("{:?}", log[1]);
        assert!(sql.contains("LIMIT"), "{}", sql);
        assert!(sql.contains("OFFSET"), "{}", sql);
        assert!(!where_clause(&log[1]).contains("user_id"));
    }
}
