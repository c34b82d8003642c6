//! Field rules for registration and loan payloads.
//!
//! Every rule is checked; the violations are reported in field declaration
//! order and joined into a single `BadRequest` message. Enum-valued fields
//! arrive as strings so an unknown name is a violation like any other.

use model::entities::loan::{Currency, LoanStatus, LoanType};
use model::entities::user::Role;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;
use tracing::debug;
use utoipa::ToSchema;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::error::{Result, ServiceError};

/// Loans must ask for strictly more than this amount.
pub const MIN_LOAN_AMOUNT: Decimal = Decimal::ONE_THOUSAND;

/// Separator between violation messages.
pub const VIOLATION_SEPARATOR: &str = "; ";

/// Request body for registering a new user
#[derive(Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct RegisterUserRequest {
    /// First name (at least 2 characters)
    #[validate(custom(function = "first_name_rule"))]
    pub first_name: String,
    /// Last name (at least 2 characters)
    #[validate(custom(function = "last_name_rule"))]
    pub last_name: String,
    /// Username (must be unique, at least 6 characters)
    #[validate(custom(function = "username_rule"))]
    pub username: String,
    /// Age in years (18 or older)
    #[validate(range(min = 18, message = "User must be at least 18 years old"))]
    pub age: i32,
    /// Monthly salary (zero or more)
    #[validate(custom(function = "non_negative_salary"))]
    pub salary: Decimal,
    /// Plain-text password (at least 8 characters), stored hashed
    #[validate(custom(function = "password_rule"))]
    pub password: String,
    /// `RegularUser` or `Accountant`
    #[validate(custom(function = "known_role"))]
    pub role: String,
}

impl RegisterUserRequest {
    const FIELDS: &'static [&'static str] = &[
        "first_name",
        "last_name",
        "username",
        "age",
        "salary",
        "password",
        "role",
    ];

    /// Every rule violated by this payload, in field order.
    pub fn violations(&self) -> Vec<String> {
        violations(self, Self::FIELDS)
    }

    /// Checks every rule and returns the requested role.
    pub fn validated_role(&self) -> Result<Role> {
        reject_violations(self.violations())?;
        parse(&self.role)
    }
}

impl fmt::Debug for RegisterUserRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RegisterUserRequest")
            .field("first_name", &self.first_name)
            .field("last_name", &self.last_name)
            .field("username", &self.username)
            .field("age", &self.age)
            .field("salary", &self.salary)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// Request body for submitting a loan
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema, Validate)]
pub struct CreateLoanRequest {
    /// `Auto`, `Rapid` or `Insurance`
    #[validate(custom(function = "known_loan_type"))]
    pub loan_type: String,
    /// Requested amount (greater than 1000)
    #[validate(custom(function = "amount_above_minimum"))]
    pub amount: Decimal,
    /// `GEL`, `EUR` or `USD`
    #[validate(custom(function = "known_currency"))]
    pub currency: String,
    /// Repayment period in months (1 or more)
    #[validate(range(min = 1, message = "Loan period must be at least 1 month"))]
    pub loan_period: i32,
}

impl CreateLoanRequest {
    /// Every rule violated by this payload, in field order.
    pub fn violations(&self) -> Vec<String> {
        violations(self, LOAN_FIELDS)
    }

    /// Checks every rule and returns the parsed loan terms.
    pub fn terms(&self) -> Result<LoanTerms> {
        reject_violations(self.violations())?;
        LoanTerms::parse(&self.loan_type, self.amount, &self.currency, self.loan_period)
    }
}

/// Request body for updating a loan.
///
/// Accountants must supply `status`; for the loan owner it is ignored.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema, Validate)]
pub struct UpdateLoanRequest {
    /// `Auto`, `Rapid` or `Insurance`
    #[validate(custom(function = "known_loan_type"))]
    pub loan_type: String,
    /// Requested amount (greater than 1000)
    #[validate(custom(function = "amount_above_minimum"))]
    pub amount: Decimal,
    /// `GEL`, `EUR` or `USD`
    #[validate(custom(function = "known_currency"))]
    pub currency: String,
    /// Repayment period in months (1 or more)
    #[validate(range(min = 1, message = "Loan period must be at least 1 month"))]
    pub loan_period: i32,
    /// `InProgress`, `Approved` or `Declined`
    pub status: Option<String>,
}

impl UpdateLoanRequest {
    /// Every rule violated by this payload, in field order.
    pub fn violations(&self) -> Vec<String> {
        let mut violations = violations(self, LOAN_FIELDS);
        if let Some(status) = &self.status {
            if let Err(error) = known_status(status) {
                violations.push(describe("status", &error));
            }
        }
        violations
    }

    /// Checks every rule and returns the parsed terms and requested status.
    pub fn terms(&self) -> Result<(LoanTerms, Option<LoanStatus>)> {
        reject_violations(self.violations())?;
        let terms =
            LoanTerms::parse(&self.loan_type, self.amount, &self.currency, self.loan_period)?;
        let status = self.status.as_deref().map(parse::<LoanStatus>).transpose()?;
        Ok((terms, status))
    }
}

const LOAN_FIELDS: &[&str] = &["loan_type", "amount", "currency", "loan_period"];

/// Validated, typed loan fields shared by create and update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoanTerms {
    pub loan_type: LoanType,
    pub amount: Decimal,
    pub currency: Currency,
    pub loan_period: i32,
}

impl LoanTerms {
    fn parse(loan_type: &str, amount: Decimal, currency: &str, loan_period: i32) -> Result<Self> {
        Ok(Self {
            loan_type: parse(loan_type)?,
            amount,
            currency: parse(currency)?,
            loan_period,
        })
    }
}

/// Runs the derived rules and flattens the errors into ordered messages.
fn violations<T: Validate>(payload: &T, field_order: &[&str]) -> Vec<String> {
    match payload.validate() {
        Ok(()) => Vec::new(),
        Err(errors) => messages(&errors, field_order),
    }
}

fn messages(errors: &ValidationErrors, field_order: &[&str]) -> Vec<String> {
    let mut fields: Vec<_> = errors.field_errors().into_iter().collect();
    fields.sort_by_key(|(field, _)| {
        let field: &str = field;
        field_order
            .iter()
            .position(|known| *known == field)
            .unwrap_or(field_order.len())
    });

    fields
        .into_iter()
        .flat_map(|(field, errors)| errors.iter().map(move |error| describe(&field, error)))
        .collect()
}

fn describe(field: &str, error: &ValidationError) -> String {
    match &error.message {
        Some(message) => message.to_string(),
        None => format!("{} is invalid", field),
    }
}

fn reject_violations(violations: Vec<String>) -> Result<()> {
    if violations.is_empty() {
        return Ok(());
    }
    debug!("Payload rejected with {} violation(s)", violations.len());
    Err(ServiceError::bad_request(violations.join(VIOLATION_SEPARATOR)))
}

fn parse<T: FromStr>(value: &str) -> Result<T> {
    value
        .parse()
        .map_err(|_| ServiceError::bad_request(format!("Unrecognized value '{}'", value)))
}

fn violation(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Whitespace-only text counts as missing; otherwise `min` characters are required.
fn text(
    value: &str,
    min: usize,
    required: &'static str,
    too_short: &'static str,
) -> std::result::Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(violation("required", required))
    } else if value.chars().count() < min {
        Err(violation("length", too_short))
    } else {
        Ok(())
    }
}

fn first_name_rule(value: &str) -> std::result::Result<(), ValidationError> {
    text(
        value,
        2,
        "First name is required",
        "First name must be at least 2 characters long",
    )
}

fn last_name_rule(value: &str) -> std::result::Result<(), ValidationError> {
    text(
        value,
        2,
        "Last name is required",
        "Last name must be at least 2 characters long",
    )
}

fn username_rule(value: &str) -> std::result::Result<(), ValidationError> {
    text(
        value,
        6,
        "Username is required",
        "Username must be at least 6 characters long",
    )
}

fn password_rule(value: &str) -> std::result::Result<(), ValidationError> {
    text(
        value,
        8,
        "Password is required",
        "Password must be at least 8 characters long",
    )
}

fn known<T: FromStr>(
    value: &str,
    code: &'static str,
    message: &'static str,
) -> std::result::Result<(), ValidationError> {
    value
        .parse::<T>()
        .map(|_| ())
        .map_err(|_| violation(code, message))
}

fn known_role(value: &str) -> std::result::Result<(), ValidationError> {
    known::<Role>(value, "role", "Role must be RegularUser or Accountant")
}

fn known_loan_type(value: &str) -> std::result::Result<(), ValidationError> {
    known::<LoanType>(value, "loan_type", "Loan type must be Auto, Rapid or Insurance")
}

fn known_currency(value: &str) -> std::result::Result<(), ValidationError> {
    known::<Currency>(value, "currency", "Currency must be GEL, EUR or USD")
}

fn known_status(value: &str) -> std::result::Result<(), ValidationError> {
    known::<LoanStatus>(
        value,
        "status",
        "Status must be InProgress, Approved or Declined",
    )
}

fn amount_above_minimum(amount: &Decimal) -> std::result::Result<(), ValidationError> {
    if *amount > MIN_LOAN_AMOUNT {
        Ok(())
    } else {
        Err(violation("amount", "Amount must be greater than 1000"))
    }
}

fn non_negative_salary(salary: &Decimal) -> std::result::Result<(), ValidationError> {
    if *salary >= Decimal::ZERO {
        Ok(())
    } else {
        Err(violation("salary", "Salary cannot be negative"))
    }
}
