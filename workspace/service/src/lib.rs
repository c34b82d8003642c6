//! Business rules of the loan application.
//!
//! Services take an explicit [`RequestContext`] describing the caller and
//! return either an [`Outcome`] or a [`ServiceError`]; both carry a
//! [`Status`] the transport layer maps onto a response.

pub mod context;
pub mod error;
pub mod loans;
pub mod outcome;
pub mod password;
pub mod policy;
pub mod token;
pub mod users;
pub mod validation;

#[cfg(test)]
mod test_support;

pub use context::{RequestContext, Role};
pub use error::{Result, ServiceError, Status};
pub use loans::LoanService;
pub use outcome::Outcome;
pub use password::PasswordHasher;
pub use token::{Claims, IssuedToken, TokenIssuer};
pub use users::{LoginRequest, UserProfile, UserService};
pub use validation::{CreateLoanRequest, RegisterUserRequest, UpdateLoanRequest};
