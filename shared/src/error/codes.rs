//! Unified error codes for Workdesk
//!
//! This module defines all error codes returned by the cloud service and
//! consumed by the web console. Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 3xxx: Tenant / subscription errors
//! - 4xxx: Work order errors
//! - 5xxx: Billing errors
//! - 6xxx: Team errors
//! - 7xxx: Integration errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values for efficient serialization
/// and cross-language compatibility (Rust, TypeScript, etc.)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Validation failed
    ValidationFailed = 2,
    /// Resource already exists
    AlreadyExists = 4,
    /// Invalid request
    InvalidRequest = 5,
    /// Required field missing
    RequiredField = 7,

    // ==================== 1xxx: Auth ====================
    /// User is not authenticated
    NotAuthenticated = 1001,
    /// Invalid credentials (email/password)
    InvalidCredentials = 1002,
    /// Token has expired
    TokenExpired = 1003,
    /// Token is invalid
    TokenInvalid = 1004,
    /// Password too short
    PasswordTooShort = 1008,
    /// Too many attempts, try again later
    TooManyAttempts = 1009,

    // ==================== 3xxx: Tenant / Subscription ====================
    /// Work order quota for the current billing period is used up
    WorkOrderLimitReached = 3007,
    /// Team member quota is used up
    TeamMemberLimitReached = 3008,
    /// Feature not available in current subscription plan
    FeatureNotAvailable = 3010,
    /// Unknown plan tier
    UnknownPlan = 3012,

    // ==================== 4xxx: Work Order ====================
    /// Work order title missing or too long
    WorkOrderInvalidTitle = 4002,

    // ==================== 5xxx: Billing ====================
    /// Payment setup failed (Stripe)
    PaymentSetupFailed = 5001,
    /// Webhook signature invalid
    WebhookSignatureInvalid = 5002,

    // ==================== 6xxx: Team ====================
    /// Team member email already exists for tenant
    TeamMemberExists = 6002,

    // ==================== 7xxx: Integration ====================
    /// Accounting integration call failed
    IntegrationFailed = 7002,
    /// OAuth state parameter mismatch
    OAuthStateInvalid = 7003,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
    /// Database error
    DatabaseError = 9002,
    /// Configuration error
    ConfigError = 9005,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::InvalidRequest => "Invalid request",
            ErrorCode::RequiredField => "Required field is missing",

            // Auth
            ErrorCode::NotAuthenticated => "User is not authenticated",
            ErrorCode::InvalidCredentials => "Invalid email or password",
            ErrorCode::TokenExpired => "Authentication token has expired",
            ErrorCode::TokenInvalid => "Authentication token is invalid",
            ErrorCode::PasswordTooShort => "Password is too short",
            ErrorCode::TooManyAttempts => "Too many attempts, try again later",

            // Tenant / Subscription
            ErrorCode::WorkOrderLimitReached => {
                "Monthly work order limit reached for your plan"
            }
            ErrorCode::TeamMemberLimitReached => "Team member limit reached for your plan",
            ErrorCode::FeatureNotAvailable => "Feature not available in your plan",
            ErrorCode::UnknownPlan => "Unknown plan",

            // Work Order
            ErrorCode::WorkOrderInvalidTitle => "Work order title is invalid",

            // Billing
            ErrorCode::PaymentSetupFailed => "Payment setup failed",
            ErrorCode::WebhookSignatureInvalid => "Webhook signature is invalid",

            // Team
            ErrorCode::TeamMemberExists => "Team member already exists",

            // Integration
            ErrorCode::IntegrationFailed => "Accounting integration request failed",
            ErrorCode::OAuthStateInvalid => "OAuth state is invalid",

            // System
            ErrorCode::InternalError => "Internal server error",
            ErrorCode::DatabaseError => "Database error",
            ErrorCode::ConfigError => "Configuration error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            2 => Ok(ErrorCode::ValidationFailed),
            4 => Ok(ErrorCode::AlreadyExists),
            5 => Ok(ErrorCode::InvalidRequest),
            7 => Ok(ErrorCode::RequiredField),

            // Auth
            1001 => Ok(ErrorCode::NotAuthenticated),
            1002 => Ok(ErrorCode::InvalidCredentials),
            1003 => Ok(ErrorCode::TokenExpired),
            1004 => Ok(ErrorCode::TokenInvalid),
            1008 => Ok(ErrorCode::PasswordTooShort),
            1009 => Ok(ErrorCode::TooManyAttempts),

            // Tenant / Subscription
            3007 => Ok(ErrorCode::WorkOrderLimitReached),
            3008 => Ok(ErrorCode::TeamMemberLimitReached),
            3010 => Ok(ErrorCode::FeatureNotAvailable),
            3012 => Ok(ErrorCode::UnknownPlan),

            // Work Order
            4002 => Ok(ErrorCode::WorkOrderInvalidTitle),

            // Billing
            5001 => Ok(ErrorCode::PaymentSetupFailed),
            5002 => Ok(ErrorCode::WebhookSignatureInvalid),

            // Team
            6002 => Ok(ErrorCode::TeamMemberExists),

            // Integration
            7002 => Ok(ErrorCode::IntegrationFailed),
            7003 => Ok(ErrorCode::OAuthStateInvalid),

            // System
            9001 => Ok(ErrorCode::InternalError),
            9002 => Ok(ErrorCode::DatabaseError),
            9005 => Ok(ErrorCode::ConfigError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}
