use model::entities::{loan, user};
use model::entities::loan::LoanStatus;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter, QueryOrder, Set,
};
use tracing::{debug, info, instrument, trace, warn};

use crate::context::RequestContext;
use crate::error::{Result, ServiceError};
use crate::outcome::Outcome;
use crate::policy::{self, LoanScope};
use crate::validation::{CreateLoanRequest, LoanTerms, UpdateLoanRequest};

const STALE_LOAN: &str = "Loan was changed by another request; reload it and try again.";

/// Loan operations. Each call runs its lookup, validation and policy gates
/// before touching the store, then performs at most one write.
#[derive(Debug, Clone)]
pub struct LoanService {
    db: DatabaseConnection,
}

impl LoanService {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Accountants see every loan; regular users see their own, and having
    /// none is reported as `NotFound`.
    #[instrument(skip(self))]
    pub async fn list_loans(&self, ctx: &RequestContext) -> Result<Outcome<Vec<loan::Model>>> {
        trace!("Entering list_loans function");
        let scope = policy::list_loans(ctx)?;

        let mut query = loan::Entity::find().order_by_asc(loan::Column::Id);
        if let LoanScope::OwnedBy(user_id) = scope {
            query = query.filter(loan::Column::UserId.eq(user_id));
        }
        let loans = query.all(&self.db).await?;

        if let LoanScope::OwnedBy(user_id) = scope {
            if loans.is_empty() {
                debug!("User {} has no loans", user_id);
                return Err(ServiceError::not_found("No loans found for this user."));
            }
        }

        info!("Retrieved {} loans", loans.len());
        Ok(Outcome::new("Loans retrieved successfully", loans))
    }

    #[instrument(skip(self))]
    pub async fn get_loan(&self, ctx: &RequestContext, id: i32) -> Result<Outcome<loan::Model>> {
        trace!("Entering get_loan function");
        let loan = loan::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("Loan not found."))?;

        policy::read_loan(ctx, &loan)?;

        debug!("Loan {} found for user {}", loan.id, loan.user_id);
        Ok(Outcome::new("Loan Identified Successfully!", loan))
    }

    /// Submits a loan for the requester. New loans always start `InProgress`.
    #[instrument(skip(self))]
    pub async fn create_loan(
        &self,
        ctx: &RequestContext,
        request: CreateLoanRequest,
    ) -> Result<Outcome<loan::Model>> {
        trace!("Entering create_loan function");
        let terms = request.terms()?;
        let requester_id = policy::requester_id(ctx)?;

        let requester = user::Entity::find_by_id(requester_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("User Not Found"))?;
        policy::create_loan(&requester)?;

        let new_loan = loan::ActiveModel {
            loan_type: Set(terms.loan_type),
            amount: Set(terms.amount),
            currency: Set(terms.currency),
            loan_period: Set(terms.loan_period),
            status: Set(LoanStatus::InProgress),
            user_id: Set(requester_id),
            ..Default::default()
        };

        trace!("Attempting to insert new loan into database");
        let created = new_loan.insert(&self.db).await?;
        info!(
            "Loan {} created for user {}: {} {} over {} months",
            created.id, created.user_id, created.amount, created.currency, created.loan_period
        );

        Ok(Outcome::new("Loan added successfully!", created))
    }

    /// Overwrites the loan terms. Owners keep the current status; accountants
    /// must set a new one.
    ///
    /// The write only applies if the loan still has the status seen at lookup,
    /// otherwise the call fails with `Conflict` and nothing changes.
    #[instrument(skip(self))]
    pub async fn update_loan(
        &self,
        ctx: &RequestContext,
        id: i32,
        request: UpdateLoanRequest,
    ) -> Result<Outcome<loan::Model>> {
        trace!("Entering update_loan function");
        let existing = loan::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("No loan found to update."))?;

        let (terms, requested_status) = request.terms()?;
        let status = policy::update_loan(ctx, &existing, requested_status)?;

        let updated = self.guarded_update(&existing, terms, status).await?;
        info!("Loan {} updated, status {}", id, updated.status);

        Ok(Outcome::new(format!("Successfully updated loan with id {}.", id), updated))
    }

    /// Removes a loan. Like updates, the delete is conditional on the status
    /// the policy gates were checked against.
    #[instrument(skip(self))]
    pub async fn delete_loan(&self, ctx: &RequestContext, id: i32) -> Result<Outcome<i32>> {
        trace!("Entering delete_loan function");
        let existing = loan::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("No loan with provided id."))?;

        policy::delete_loan(ctx, &existing)?;

        self.guarded_delete(&existing).await?;
        info!("Loan {} deleted", id);
        Ok(Outcome::new(format!("Successfully deleted loan with id {}", id), id))
    }

    /// Writes the new terms only if the loan still has the observed status.
    async fn guarded_update(
        &self,
        observed: &loan::Model,
        terms: LoanTerms,
        status: LoanStatus,
    ) -> Result<loan::Model> {
        let changes = loan::ActiveModel {
            loan_type: Set(terms.loan_type),
            amount: Set(terms.amount),
            currency: Set(terms.currency),
            loan_period: Set(terms.loan_period),
            status: Set(status),
            ..Default::default()
        };

        let result = loan::Entity::update_many()
            .set(changes)
            .filter(loan::Column::Id.eq(observed.id))
            .filter(loan::Column::Status.eq(observed.status))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            warn!("Loan {} changed since it was read; update dropped", observed.id);
            return Err(ServiceError::conflict(STALE_LOAN));
        }

        Ok(loan::Model {
            loan_type: terms.loan_type,
            amount: terms.amount,
            currency: terms.currency,
            loan_period: terms.loan_period,
            status,
            ..observed.clone()
        })
    }

    async fn guarded_delete(&self, observed: &loan::Model) -> Result<()> {
        let result = loan::Entity::delete_many()
            .filter(loan::Column::Id.eq(observed.id))
            .filter(loan::Column::Status.eq(observed.status))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            warn!("Loan {} changed since it was read; delete dropped", observed.id);
            return Err(ServiceError::conflict(STALE_LOAN));
        }
        Ok(())
    }
}
