// Support ticket models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::entity::{support_tickets, ticket_messages};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketStatus {
    Open,
    InProgress,
    Resolved,
    Closed,
}

impl TicketStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketStatus::Open => "open",
            TicketStatus::InProgress => "in_progress",
            TicketStatus::Resolved => "resolved",
            TicketStatus::Closed => "closed",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "open" => Some(TicketStatus::Open),
            "in_progress" => Some(TicketStatus::InProgress),
            "resolved" => Some(TicketStatus::Resolved),
            "closed" => Some(TicketStatus::Closed),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketCategory {
    Payment,
    Boost,
    Premium,
    Account,
    Event,
    #[default]
    Other,
}

impl TicketCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketCategory::Payment => "payment",
            TicketCategory::Boost => "boost",
            TicketCategory::Premium => "premium",
            TicketCategory::Account => "account",
            TicketCategory::Event => "event",
            TicketCategory::Other => "other",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TicketPriority {
    Low,
    #[default]
    Normal,
    High,
    Urgent,
}

impl TicketPriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            TicketPriority::Low => "low",
            TicketPriority::Normal => "normal",
            TicketPriority::High => "high",
            TicketPriority::Urgent => "urgent",
        }
    }
}

/// Request body for POST /api/tickets
#[derive(Debug, Deserialize)]
pub struct CreateTicketRequest {
    pub subject: String,
    #[serde(default)]
    pub category: TicketCategory,
    #[serde(default)]
    pub priority: TicketPriority,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TicketMessageRequest {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct TicketStatusRequest {
    pub status: TicketStatus,
}

#[derive(Debug, Deserialize, Default)]
pub struct TicketListQuery {
    pub status: Option<TicketStatus>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
}

#[derive(Debug, Serialize, Clone)]
pub struct TicketView {
    pub id: Uuid,
    pub user_id: Uuid,
    pub subject: String,
    pub category: String,
    pub priority: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub last_message_at: DateTime<Utc>,
}

impl From<&support_tickets::Model> for TicketView {
    fn from(m: &support_tickets::Model) -> Self {
        TicketView {
            id: m.id,
            user_id: m.user_id,
            subject: m.subject.clone(),
            category: m.category.clone(),
            priority: m.priority.clone(),
            status: m.status.clone(),
            created_at: m.created_at,
            updated_at: m.updated_at,
            last_message_at: m.last_message_at,
        }
    }
}

#[derive(Debug, Serialize, Clone)]
pub struct TicketMessageView {
    pub id: Uuid,
    pub sender_id: Uuid,
    pub is_staff: bool,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

impl From<&ticket_messages::Model> for TicketMessageView {
    fn from(m: &ticket_messages::Model) -> Self {
        TicketMessageView {
            id: m.id,
            sender_id: m.sender_id,
            is_staff: m.is_staff,
            message: m.message.clone(),
            created_at: m.created_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct TicketDetailResponse {
    pub ticket: TicketView,
    pub messages: Vec<TicketMessageView>,
}

#[derive(Debug, Serialize)]
pub struct TicketListResponse {
    pub total: usize,
    pub tickets: Vec<TicketView>,
    pub limit: u64,
    pub offset: u64,
}

#[derive(Debug, Serialize)]
pub struct TicketMessageResponse {
    pub ticket: TicketView,
    pub message: TicketMessageView,
}
