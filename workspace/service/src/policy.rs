//! Role- and ownership-based access rules.
//!
//! - No IO
//! - No panics
//! - Gates are checked in order; the first failing gate decides the outcome

use model::entities::{loan, user};
use model::entities::loan::LoanStatus;
use tracing::debug;

use crate::context::{RequestContext, Role};
use crate::error::ServiceError;

/// Failure statuses a gate can produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DenialKind {
    NotFound,
    BadRequest,
    Forbidden,
}

/// Why a request was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Denial {
    pub kind: DenialKind,
    pub reason: &'static str,
}

impl Denial {
    const fn new(kind: DenialKind, reason: &'static str) -> Self {
        Self { kind, reason }
    }
}

impl From<Denial> for ServiceError {
    fn from(denial: Denial) -> Self {
        let reason = denial.reason.to_string();
        match denial.kind {
            DenialKind::NotFound => ServiceError::NotFound(reason),
            DenialKind::BadRequest => ServiceError::BadRequest(reason),
            DenialKind::Forbidden => ServiceError::Forbidden(reason),
        }
    }
}

pub type Decision<T = ()> = Result<T, Denial>;

pub const REQUESTER_NOT_FOUND: Denial = Denial::new(DenialKind::NotFound, "User ID not found.");
pub const ACCOUNTANT_ONLY: Denial =
    Denial::new(DenialKind::Forbidden, "Only accountants can perform this action.");
pub const FOREIGN_LOAN_READ: Denial =
    Denial::new(DenialKind::Forbidden, "You cannot access another user's loan.");
pub const BLOCKED_USER: Denial = Denial::new(
    DenialKind::Forbidden,
    "User is blocked and cannot perform this action.",
);
pub const FOREIGN_ACCOUNT_DELETE: Denial =
    Denial::new(DenialKind::Forbidden, "You cannot delete another user's account.");
pub const FOREIGN_LOAN_DELETE: Denial =
    Denial::new(DenialKind::Forbidden, "You cannot delete another user's loan.");
pub const REVIEWED_LOAN_DELETE: Denial = Denial::new(
    DenialKind::Forbidden,
    "You cannot delete loan that is approved or declined.",
);
pub const FOREIGN_LOAN_UPDATE: Denial =
    Denial::new(DenialKind::Forbidden, "You cannot update another user's loan.");
pub const REVIEWED_LOAN_UPDATE: Denial = Denial::new(
    DenialKind::Forbidden,
    "You can only update loans that are InProgress.",
);
pub const MISSING_STATUS: Denial =
    Denial::new(DenialKind::BadRequest, "Status is required for updating a loan.");

/// Which loans a requester may list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoanScope {
    All,
    OwnedBy(i32),
}

/// Resolves the requester's own user id.
pub fn requester_id(ctx: &RequestContext) -> Decision<i32> {
    ctx.requester_id.ok_or(REQUESTER_NOT_FOUND)
}

/// Gate for operations reserved to accountants at the transport boundary.
pub fn require_accountant(ctx: &RequestContext) -> Decision {
    match ctx.role {
        Role::Accountant => Ok(()),
        Role::RegularUser => Err(ACCOUNTANT_ONLY),
    }
}

pub fn list_loans(ctx: &RequestContext) -> Decision<LoanScope> {
    match ctx.role {
        Role::Accountant => Ok(LoanScope::All),
        Role::RegularUser => requester_id(ctx).map(LoanScope::OwnedBy),
    }
}

pub fn read_loan(ctx: &RequestContext, loan: &loan::Model) -> Decision {
    if ctx.role == Role::RegularUser {
        let requester = requester_id(ctx)?;
        if loan.user_id != requester {
            debug!(requester, loan_id = loan.id, "Denied read of foreign loan");
            return Err(FOREIGN_LOAN_READ);
        }
    }
    Ok(())
}

/// Gate for submitting a loan once the requester's record has been loaded.
pub fn create_loan(requester: &user::Model) -> Decision {
    if requester.is_blocked {
        return Err(BLOCKED_USER);
    }
    Ok(())
}

pub fn delete_user(ctx: &RequestContext, target_id: i32) -> Decision {
    if ctx.role == Role::RegularUser {
        let requester = requester_id(ctx)?;
        if requester != target_id {
            return Err(FOREIGN_ACCOUNT_DELETE);
        }
    }
    Ok(())
}

pub fn delete_loan(ctx: &RequestContext, loan: &loan::Model) -> Decision {
    if ctx.role == Role::RegularUser {
        let requester = requester_id(ctx)?;
        if loan.user_id != requester {
            return Err(FOREIGN_LOAN_DELETE);
        }
        if loan.status != LoanStatus::InProgress {
            return Err(REVIEWED_LOAN_DELETE);
        }
    }
    Ok(())
}

/// Decides the status a loan ends up with after an update.
///
/// Owners may only edit `InProgress` loans and never change the status.
/// Accountants must name the new status explicitly.
pub fn update_loan(
    ctx: &RequestContext,
    loan: &loan::Model,
    requested_status: Option<LoanStatus>,
) -> Decision<LoanStatus> {
    match ctx.role {
        Role::RegularUser => {
            // An unresolved requester owns nothing.
            if !ctx.is(loan.user_id) {
                return Err(FOREIGN_LOAN_UPDATE);
            }
            if loan.status != LoanStatus::InProgress {
                return Err(REVIEWED_LOAN_UPDATE);
            }
            Ok(loan.status)
        }
        Role::Accountant => requested_status.ok_or(MISSING_STATUS),
    }
}
