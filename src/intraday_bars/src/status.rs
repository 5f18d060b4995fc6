//! What a provider reports alongside its bars.
//!
//! A [`ProviderStatus`] is vendor metadata plus
//! human-readable warnings. Quota and unavailability are not errors; they
//! travel here next to a (possibly empty) [`BarTable`]. [`FetchOutcome`]
//! folds a status, a table and any transport error into one tagged value.

use std::fmt;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::{
    models::bar_table::BarTable,
    providers::{ProviderError, ProviderKind},
};

/// Sentinel code reported when a vendor refuses service for quota reasons.
pub const QUOTA_EXCEEDED_CODE: u16 = 666;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum StatusCode {
    /// Data came back; warnings may still be attached.
    Ok,
    /// The vendor (or the local session) declined for rate/quota reasons.
    QuotaExceeded,
    /// Nothing usable for the requested window.
    Unavailable,
}

impl StatusCode {
    pub fn code(self) -> u16 {
        match self {
            Self::Ok => 200,
            Self::QuotaExceeded => QUOTA_EXCEEDED_CODE,
            Self::Unavailable => 204,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ProviderStatus {
    pub provider: ProviderKind,
    pub code: StatusCode,
    /// Vendor metadata, passed through untouched.
    pub meta: Map<String, Value>,
    /// Warnings in the order they were raised.
    pub messages: Vec<String>,
}

impl ProviderStatus {
    pub fn ok(provider: ProviderKind) -> Self {
        Self {
            provider,
            code: StatusCode::Ok,
            meta: Map::new(),
            messages: Vec::new(),
        }
    }

    pub fn quota_exceeded(provider: ProviderKind, message: impl Into<String>) -> Self {
        let mut status = Self::ok(provider);
        status.code = StatusCode::QuotaExceeded;
        status.warn(message);
        status
    }

    pub fn with_meta(mut self, meta: Map<String, Value>) -> Self {
        self.meta = meta;
        self
    }

    /// Records a warning and logs it.
    pub fn warn(&mut self, message: impl Into<String>) {
        let message = message.into();
        warn!(provider = %self.provider, "{message}");
        self.messages.push(message);
    }

    /// Records that the window produced no rows.
    ///
    /// A quota status stays a quota status.
    pub fn mark_unavailable(&mut self, message: impl Into<String>) {
        if self.code == StatusCode::Ok {
            self.code = StatusCode::Unavailable;
        }
        self.warn(message);
    }

    pub fn is_ok(&self) -> bool {
        self.code == StatusCode::Ok
    }

    /// All warnings joined into one line.
    pub fn message(&self) -> String {
        self.messages.join("; ")
    }
}

/// A provider's answer: status plus the clipped table.
#[derive(Debug, Clone)]
pub struct BarResponse {
    pub status: ProviderStatus,
    pub table: BarTable,
}

impl BarResponse {
    pub fn new(status: ProviderStatus, table: BarTable) -> Self {
        Self { status, table }
    }

    pub fn quota_exceeded(
        provider: ProviderKind,
        table: BarTable,
        message: impl Into<String>,
    ) -> Self {
        Self::new(ProviderStatus::quota_exceeded(provider, message), table)
    }
}

/// Every way a fetch can end, as one value.
#[derive(Debug)]
pub enum FetchOutcome {
    Bars {
        table: BarTable,
        warnings: Vec<String>,
    },
    QuotaExceeded(String),
    Unavailable(String),
    TransportError(ProviderError),
}

impl FetchOutcome {
    pub fn table(&self) -> Option<&BarTable> {
        match self {
            Self::Bars { table, .. } => Some(table),
            _ => None,
        }
    }
}

impl From<BarResponse> for FetchOutcome {
    fn from(response: BarResponse) -> Self {
        let BarResponse { status, table } = response;
        match status.code {
            StatusCode::QuotaExceeded => Self::QuotaExceeded(status.message()),
            _ if table.is_empty() => {
                let message = if status.messages.is_empty() {
                    format!("{} returned no bars for {}", status.provider, table.symbol())
                } else {
                    status.message()
                };
                Self::Unavailable(message)
            }
            _ => Self::Bars {
                table,
                warnings: status.messages,
            },
        }
    }
}

impl From<Result<BarResponse, ProviderError>> for FetchOutcome {
    fn from(result: Result<BarResponse, ProviderError>) -> Self {
        match result {
            Ok(response) => response.into(),
            Err(err) => Self::TransportError(err),
        }
    }
}

impl fmt::Display for FetchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bars { table, warnings } => {
                write!(f, "{} bars for {}", table.len(), table.symbol())?;
                if !warnings.is_empty() {
                    write!(f, " ({})", warnings.join("; "))?;
                }
                Ok(())
            }
            Self::QuotaExceeded(msg) => write!(f, "quota exceeded: {msg}"),
            Self::Unavailable(msg) => write!(f, "unavailable: {msg}"),
            Self::TransportError(err) => write!(f, "transport error: {err}"),
        }
    }
}
