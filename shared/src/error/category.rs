//! Error category classification

use super::codes::ErrorCode;
use serde::{Deserialize, Serialize};

/// Error category classification based on error code ranges
///
/// Categories are determined by the leading digit of the error code:
/// - 0xxx: General errors
/// - 1xxx: Authentication errors
/// - 3xxx: Tenant / subscription errors
/// - 4xxx: Work order errors
/// - 5xxx: Billing errors
/// - 6xxx: Team errors
/// - 7xxx: Integration errors
/// - anything else: System errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// General errors (0xxx)
    General,
    /// Authentication errors (1xxx)
    Auth,
    /// Tenant and subscription errors (3xxx)
    Tenant,
    /// Work order errors (4xxx)
    WorkOrder,
    /// Billing errors (5xxx)
    Billing,
    /// Team errors (6xxx)
    Team,
    /// Third-party integration errors (7xxx)
    Integration,
    /// System errors (9xxx)
    System,
}

impl ErrorCategory {
    /// Determine category from error code value
    pub fn from_code(code: u16) -> Self {
        match code {
            0..1000 => Self::General,
            1000..2000 => Self::Auth,
            3000..4000 => Self::Tenant,
            4000..5000 => Self::WorkOrder,
            5000..6000 => Self::Billing,
            6000..7000 => Self::Team,
            7000..8000 => Self::Integration,
            _ => Self::System,
        }
    }

    /// Get the string name for this category
    pub fn name(&self) -> &'static str {
        match self {
            Self::General => "general",
            Self::Auth => "auth",
            Self::Tenant => "tenant",
            Self::WorkOrder => "work_order",
            Self::Billing => "billing",
            Self::Team => "team",
            Self::Integration => "integration",
            Self::System => "system",
        }
    }
}

impl ErrorCode {
    /// Get the category for this error code
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from_code(self.code())
    }
}
