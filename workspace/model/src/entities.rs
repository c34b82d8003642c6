//! SeaORM entities of the loan application.
//!
//! A user owns many loans; loans are removed together with their owner.

/// `Display` and `FromStr` through the enum's stored string value.
macro_rules! string_enum {
    ($($name:ty),*) => {$(
        impl ::std::fmt::Display for $name {
            fn fmt(&self, f: &mut ::std::fmt::Formatter<'_>) -> ::std::fmt::Result {
                f.write_str(&<Self as ::sea_orm::ActiveEnum>::to_value(self))
            }
        }

        impl ::std::str::FromStr for $name {
            type Err = ::sea_orm::DbErr;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                <Self as ::sea_orm::ActiveEnum>::try_from_value(&s.to_string())
            }
        }
    )*};
}

pub mod loan;
pub mod user;

pub mod prelude {
    //! A prelude module for easy importing of all entities.
    pub use super::loan::{Currency, Entity as Loan, LoanStatus, LoanType};
    pub use super::user::{Entity as User, Role};
}
