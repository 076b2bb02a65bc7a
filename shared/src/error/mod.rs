//! Unified error system for Workdesk
//!
//! This module provides the error handling shared by every crate:
//! - [`ErrorCode`]: Standardized error codes for all error types
//! - [`ErrorCategory`]: Classification of errors by domain
//! - [`AppError`]: Rich error type with codes, messages, and details
//! - [`ErrorBody`]: JSON body of every error response
//!
//! # Error Code Ranges
//!
//! - 0xxx: General errors
//! - 1xxx: Authentication errors
//! - 3xxx: Tenant / subscription errors
//! - 4xxx: Work order errors
//! - 5xxx: Billing errors
//! - 6xxx: Team errors
//! - 7xxx: Integration errors
//! - 9xxx: System errors
//!
//! # Example
//!
//! ```
//! use shared::error::{AppError, ErrorBody, ErrorCode};
//!
//! // Create a plan-gate error with details for the upgrade prompt
//! let err = AppError::new(ErrorCode::WorkOrderLimitReached)
//!     .with_detail("limit", 1000)
//!     .with_detail("usage", 1000);
//!
//! let body = ErrorBody::from(err);
//! assert_eq!(body.code, 3007);
//! ```

mod category;
mod codes;
mod http;
mod types;

pub use category::ErrorCategory;
pub use codes::{ErrorCode, InvalidErrorCode};
pub use types::{AppError, ErrorBody};
