use std::io;
use std::time::Duration;

use derive_setters::Setters;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_ENDPOINT: &str = "https://jsonplaceholder.typicode.com/posts";

pub const HELP_TEXT: &str = "\
q            Quit
Up/k Down/j  Move cursor
Home/g End/G First / last row
PgUp PgDn    Scroll a screen
Enter        Select order
Esc/Bksp     Clear selection
Tab          Next sort column
s / S        Sort ascending / descending
n / p        Next / previous page
r            Refetch orders
c            Copy selected order
?            Show this help";

#[derive(Debug, Error)]
pub enum TVError {
    #[error("io error: {0}")]
    IoError(#[from] io::Error),
    #[error("http request failed: {0}")]
    HttpError(#[from] reqwest::Error),
    #[error("{url} answered with status {status}")]
    HttpStatus { status: u16, url: String },
    #[error("invalid json: {0}")]
    JsonError(#[from] serde_json::Error),
    #[error("invalid page request: {0}")]
    InvalidPageRequest(String),
    #[error("terminal unavailable: {0}")]
    TerminalUnavailable(io::Error),
    #[error("could not initialise logging: {0}")]
    LoggingFailed(String),
    #[error("clipboard error: {0}")]
    ClipboardError(String),
}

/// Derived from the order id, never stored upstream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[serde(rename = "Voltooid")]
    Completed,
    #[serde(rename = "In behandeling")]
    Pending,
    #[serde(rename = "Verzonden")]
    Shipped,
}

impl OrderStatus {
    pub fn label(&self) -> &'static str {
        match self {
            OrderStatus::Completed => "Voltooid",
            OrderStatus::Pending => "In behandeling",
            OrderStatus::Shipped => "Verzonden",
        }
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub id: u64,
    pub customer: String,
    pub status: OrderStatus,
}

/// Which slice of the upstream records to show.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PageRequest {
    pub page: usize,
    pub size: usize,
    pub sort: String,
}

impl PageRequest {
    pub fn new(page: usize, size: usize, sort: impl Into<String>) -> Result<Self, TVError> {
        if size == 0 {
            return Err(TVError::InvalidPageRequest(
                "page size must be larger than 0".into(),
            ));
        }
        Ok(Self {
            page,
            size,
            sort: sort.into(),
        })
    }
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: 0,
            size: 15,
            sort: "id".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrdersPage {
    pub orders: Vec<Order>,
    pub total: usize,
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct TVConfig {
    pub event_poll_time: u64,
    pub max_column_width: usize,
    pub stale_time: Duration,
    pub request_timeout: Duration,
    pub endpoint: String,
    pub request: PageRequest,
}

impl Default for TVConfig {
    fn default() -> Self {
        Self {
            event_poll_time: 100,
            max_column_width: 40,
            stale_time: Duration::ZERO,
            request_timeout: Duration::from_secs(30),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            request: PageRequest::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Message {
    Quit,
    MoveUp,
    MoveDown,
    MovePageUp,
    MovePageDown,
    MoveBeginning,
    MoveEnd,
    Select,
    ClearSelection,
    NextSortColumn,
    SortAscending,
    SortDescending,
    NextPage,
    PreviousPage,
    Refetch,
    FocusGained,
    CopySelection,
    Help,
    Exit,
    Resize(usize, usize),
}
