use model::entities::{loan, user};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter,
    QueryOrder, Set, SqlErr, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, instrument, trace, warn};
use utoipa::ToSchema;

use crate::context::RequestContext;
use crate::error::{Result, ServiceError};
use crate::outcome::Outcome;
use crate::password::PasswordHasher;
use crate::policy;
use crate::token::{IssuedToken, TokenIssuer};
use crate::validation::RegisterUserRequest;

const INVALID_CREDENTIALS: &str = "Invalid username or password";
const USERNAME_TAKEN: &str = "Username already exists";

/// Request body for logging in
#[derive(Clone, Deserialize, Serialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A user together with every loan it owns.
#[derive(Debug, Clone, PartialEq)]
pub struct UserProfile {
    pub user: user::Model,
    pub loans: Vec<loan::Model>,
}

/// Registration, authentication and account management.
#[derive(Debug, Clone)]
pub struct UserService {
    db: DatabaseConnection,
    passwords: PasswordHasher,
    tokens: TokenIssuer,
}

impl UserService {
    pub fn new(db: DatabaseConnection, passwords: PasswordHasher, tokens: TokenIssuer) -> Self {
        Self {
            db,
            passwords,
            tokens,
        }
    }

    pub fn tokens(&self) -> &TokenIssuer {
        &self.tokens
    }

    /// Creates an unblocked account with a hashed password.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn register(&self, request: RegisterUserRequest) -> Result<Outcome<user::Model>> {
        trace!("Entering register function");
        let role = request.validated_role()?;

        let taken = user::Entity::find()
            .filter(user::Column::Username.eq(request.username.as_str()))
            .one(&self.db)
            .await?;
        if taken.is_some() {
            debug!("Username '{}' is already registered", request.username);
            return Err(ServiceError::conflict(USERNAME_TAKEN));
        }

        let password_hash = self.passwords.hash(&request.password).await?;
        let new_user = user::ActiveModel {
            first_name: Set(request.first_name),
            last_name: Set(request.last_name),
            username: Set(request.username),
            age: Set(request.age),
            salary: Set(request.salary),
            is_blocked: Set(false),
            password_hash: Set(password_hash),
            role: Set(role),
            ..Default::default()
        };

        // A concurrent registration can still win the race to the unique index.
        let created = new_user.insert(&self.db).await.map_err(|e| match e.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::conflict(USERNAME_TAKEN),
            _ => ServiceError::from(e),
        })?;

        info!("User {} registered as {}", created.id, created.role);
        Ok(Outcome::new("User added successfully!", created))
    }

    /// Verifies credentials and issues a bearer token. Unknown usernames and
    /// wrong passwords are indistinguishable to the caller, including in how
    /// long the check takes.
    #[instrument(skip(self, request), fields(username = %request.username))]
    pub async fn login(&self, request: LoginRequest) -> Result<Outcome<IssuedToken>> {
        trace!("Entering login function");
        let user = user::Entity::find()
            .filter(user::Column::Username.eq(request.username.as_str()))
            .one(&self.db)
            .await?;

        let stored_hash = user.as_ref().map(|user| user.password_hash.as_str());
        let matches = self.passwords.verify(&request.password, stored_hash).await?;

        let Some(user) = user.filter(|_| matches) else {
            warn!("Failed login attempt");
            return Err(ServiceError::unauthorized(INVALID_CREDENTIALS));
        };

        let issued = self.tokens.issue(&user)?;
        info!("User {} logged in", user.id);
        Ok(Outcome::new("Login successful", issued))
    }

    #[instrument(skip(self))]
    pub async fn current_user(&self, ctx: &RequestContext) -> Result<Outcome<UserProfile>> {
        trace!("Entering current_user function");
        let requester_id = policy::requester_id(ctx)?;

        let user = user::Entity::find_by_id(requester_id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("User Information Not Found"))?;

        let profile = self.profile(user).await?;
        Ok(Outcome::new("User information retrieved successfully", profile))
    }

    #[instrument(skip(self))]
    pub async fn list_users(&self) -> Result<Outcome<Vec<UserProfile>>> {
        trace!("Entering list_users function");
        let users = user::Entity::find()
            .order_by_asc(user::Column::Id)
            .find_with_related(loan::Entity)
            .all(&self.db)
            .await?;

        let profiles: Vec<UserProfile> = users
            .into_iter()
            .map(|(user, loans)| UserProfile { user, loans })
            .collect();

        info!("Retrieved {} users", profiles.len());
        Ok(Outcome::new("Users retrieved successfully", profiles))
    }

    #[instrument(skip(self))]
    pub async fn get_user(&self, id: i32) -> Result<Outcome<UserProfile>> {
        trace!("Entering get_user function");
        let user = user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("User not found"))?;

        let profile = self.profile(user).await?;
        Ok(Outcome::new("User retrieved successfully", profile))
    }

    /// Deletes the account and all of its loans in one transaction.
    #[instrument(skip(self))]
    pub async fn delete_user(&self, ctx: &RequestContext, id: i32) -> Result<Outcome<i32>> {
        trace!("Entering delete_user function");
        let target = user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("No user with provided id."))?;

        policy::delete_user(ctx, target.id)?;

        let txn = self.db.begin().await?;
        let loans = loan::Entity::delete_many()
            .filter(loan::Column::UserId.eq(id))
            .exec(&txn)
            .await?;
        let users = user::Entity::delete_by_id(id).exec(&txn).await?;

        if users.rows_affected == 0 {
            warn!("User {} disappeared before it could be deleted", id);
            txn.rollback().await?;
            return Err(ServiceError::not_found("No user with provided id."));
        }
        txn.commit().await?;

        info!("User {} deleted together with {} loans", id, loans.rows_affected);
        Ok(Outcome::new(format!("Successfully deleted user with id {}", id), id))
    }

    #[instrument(skip(self))]
    pub async fn change_blocked_status(
        &self,
        id: i32,
        is_blocked: bool,
    ) -> Result<Outcome<user::Model>> {
        trace!("Entering change_blocked_status function");
        let target = user::Entity::find_by_id(id)
            .one(&self.db)
            .await?
            .ok_or_else(|| ServiceError::not_found("No User With Provided Id"))?;

        let mut target: user::ActiveModel = target.into();
        target.is_blocked = Set(is_blocked);
        let updated = target.update(&self.db).await?;

        info!("User {} is_blocked set to {}", updated.id, updated.is_blocked);
        Ok(Outcome::new("Successfully Updated The User Status", updated))
    }

    async fn profile(&self, user: user::Model) -> Result<UserProfile> {
        let loans = user
            .find_related(loan::Entity)
            .order_by_asc(loan::Column::Id)
            .all(&self.db)
            .await?;
        Ok(UserProfile { user, loans })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::Role;
    use crate::error::Status;
    use crate::test_support::{loan_count, seed_loan, seed_user, setup_db, test_issuer};
    use model::entities::loan::LoanStatus;
    use rust_decimal::Decimal;

    async fn service() -> UserService {
        UserService::new(setup_db().await, PasswordHasher::new(4).unwrap(), test_issuer())
    }

    fn registration(username: &str) -> RegisterUserRequest {
        RegisterUserRequest {
            first_name: "Tamar".to_string(),
            last_name: "Gelashvili".to_string(),
            username: username.to_string(),
            age: 30,
            salary: Decimal::new(2500, 0),
            password: "supersecret".to_string(),
            role: "RegularUser".to_string(),
        }
    }

    fn login(username: &str, password: &str) -> LoginRequest {
        LoginRequest {
            username: username.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_stores_hashed_password_and_unblocked_user() {
        let service = service().await;

        let outcome = service.register(registration("tgelashvili")).await.unwrap();
        assert_eq!(outcome.message, "User added successfully!");

        let stored = user::Entity::find_by_id(outcome.data.id)
            .one(&service.db)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(stored.username, "tgelashvili");
        assert_eq!(stored.role, Role::RegularUser);
        assert!(!stored.is_blocked);
        assert_ne!(stored.password_hash, "supersecret");
        assert!(
            service
                .passwords
                .verify("supersecret", Some(&stored.password_hash))
                .await
                .unwrap()
        );
    }

    #[tokio::test]
    async fn test_register_duplicate_username_is_conflict() {
        let service = service().await;
        service.register(registration("tgelashvili")).await.unwrap();

        let err = service.register(registration("tgelashvili")).await.unwrap_err();
        assert_eq!(err.status(), Status::Conflict);
        assert_eq!(err.to_string(), "Username already exists");
        assert_eq!(user::Entity::find().all(&service.db).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_register_invalid_payload_is_bad_request() {
        let service = service().await;
        let request = RegisterUserRequest {
            age: 16,
            ..registration("tgelashvili")
        };

        let err = service.register(request).await.unwrap_err();
        assert_eq!(err.status(), Status::BadRequest);
        assert_eq!(err.to_string(), "User must be at least 18 years old");
        assert!(user::Entity::find().all(&service.db).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_login_issues_token_for_valid_credentials() {
        let service = service().await;
        let registered = service.register(registration("tgelashvili")).await.unwrap().data;

        let issued = service.login(login("tgelashvili", "supersecret")).await.unwrap().data;
        let claims = service.tokens().verify(&issued.token).unwrap();

        assert_eq!(claims.sub, registered.id.to_string());
        assert_eq!(claims.role, "RegularUser");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
        assert_eq!(
            claims.context().unwrap(),
            RequestContext::new(registered.id, Role::RegularUser)
        );
    }

    #[tokio::test]
    async fn test_login_rejects_wrong_password_and_unknown_user_alike() {
        let service = service().await;
        service.register(registration("tgelashvili")).await.unwrap();

        let wrong_password = service.login(login("tgelashvili", "not the password")).await.unwrap_err();
        let unknown_user = service.login(login("nobody-here", "supersecret")).await.unwrap_err();

        assert_eq!(wrong_password.status(), Status::Unauthorized);
        assert_eq!(unknown_user.status(), Status::Unauthorized);
        assert_eq!(wrong_password.to_string(), unknown_user.to_string());
    }

    #[tokio::test]
    async fn test_unknown_username_still_pays_for_a_hash_check() {
        let service = UserService::new(setup_db().await, PasswordHasher::new(10).unwrap(), test_issuer());
        service.register(registration("tgelashvili")).await.unwrap();

        let started = std::time::Instant::now();
        service.login(login("tgelashvili", "not the password")).await.unwrap_err();
        let wrong_password = started.elapsed();

        let started = std::time::Instant::now();
        service.login(login("nobody-here", "not the password")).await.unwrap_err();
        let unknown_user = started.elapsed();

        assert!(
            unknown_user * 4 >= wrong_password,
            "unknown user took {:?}, wrong password took {:?}",
            unknown_user,
            wrong_password
        );
    }

    #[tokio::test]
    async fn test_current_user_includes_loans() {
        let service = service().await;
        let user = seed_user(&service.db, "gkapanadze", Role::RegularUser, false).await;
        seed_loan(&service.db, user.id, LoanStatus::InProgress).await;
        seed_loan(&service.db, user.id, LoanStatus::Approved).await;

        let profile = service
            .current_user(&RequestContext::new(user.id, Role::RegularUser))
            .await
            .unwrap()
            .data;
        assert_eq!(profile.user.id, user.id);
        assert_eq!(profile.loans.len(), 2);

        let missing = service
            .current_user(&RequestContext::new(999, Role::RegularUser))
            .await
            .unwrap_err();
        assert_eq!(missing.status(), Status::NotFound);

        let unresolved = service
            .current_user(&RequestContext::unresolved(Role::RegularUser))
            .await
            .unwrap_err();
        assert_eq!(unresolved.status(), Status::NotFound);
    }

    #[tokio::test]
    async fn test_list_and_get_users_with_loans() {
        let service = service().await;
        let first = seed_user(&service.db, "gkapanadze", Role::RegularUser, false).await;
        let second = seed_user(&service.db, "accountant", Role::Accountant, false).await;
        seed_loan(&service.db, first.id, LoanStatus::InProgress).await;

        let profiles = service.list_users().await.unwrap().data;
        assert_eq!(profiles.len(), 2);
        assert_eq!(profiles[0].user.id, first.id);
        assert_eq!(profiles[0].loans.len(), 1);
        assert!(profiles[1].loans.is_empty());

        let profile = service.get_user(second.id).await.unwrap().data;
        assert_eq!(profile.user.username, "accountant");

        let err = service.get_user(999).await.unwrap_err();
        assert_eq!(err.status(), Status::NotFound);
    }

    #[tokio::test]
    async fn test_delete_user_removes_owned_loans() {
        let service = service().await;
        let owner = seed_user(&service.db, "gkapanadze", Role::RegularUser, false).await;
        let other = seed_user(&service.db, "nberidze", Role::RegularUser, false).await;
        seed_loan(&service.db, owner.id, LoanStatus::InProgress).await;
        seed_loan(&service.db, owner.id, LoanStatus::Declined).await;
        seed_loan(&service.db, other.id, LoanStatus::InProgress).await;

        let outcome = service
            .delete_user(&RequestContext::new(owner.id, Role::RegularUser), owner.id)
            .await
            .unwrap();
        assert_eq!(outcome.data, owner.id);
        assert_eq!(
            outcome.message,
            format!("Successfully deleted user with id {}", owner.id)
        );

        assert!(user::Entity::find_by_id(owner.id).one(&service.db).await.unwrap().is_none());
        assert_eq!(loan_count(&service.db).await, 1);
    }

    #[tokio::test]
    async fn test_delete_user_gates() {
        let service = service().await;
        let owner = seed_user(&service.db, "gkapanadze", Role::RegularUser, false).await;
        let other = seed_user(&service.db, "nberidze", Role::RegularUser, false).await;

        let missing = service
            .delete_user(&RequestContext::new(owner.id, Role::RegularUser), 999)
            .await
            .unwrap_err();
        assert_eq!(missing.status(), Status::NotFound);

        let foreign = service
            .delete_user(&RequestContext::new(owner.id, Role::RegularUser), other.id)
            .await
            .unwrap_err();
        assert_eq!(foreign.status(), Status::Forbidden);
        assert!(user::Entity::find_by_id(other.id).one(&service.db).await.unwrap().is_some());

        service
            .delete_user(&RequestContext::new(42, Role::Accountant), other.id)
            .await
            .unwrap();
        assert!(user::Entity::find_by_id(other.id).one(&service.db).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_change_blocked_status() {
        let service = service().await;
        let user = seed_user(&service.db, "gkapanadze", Role::RegularUser, false).await;

        let outcome = service.change_blocked_status(user.id, true).await.unwrap();
        assert_eq!(outcome.message, "Successfully Updated The User Status");
        assert!(outcome.data.is_blocked);

        let unblocked = service.change_blocked_status(user.id, false).await.unwrap();
        assert!(!unblocked.data.is_blocked);

        let err = service.change_blocked_status(999, true).await.unwrap_err();
        assert_eq!(err.status(), Status::NotFound);
        assert_eq!(err.to_string(), "No User With Provided Id");
    }
}
