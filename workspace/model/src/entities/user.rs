use sea_orm::entity::prelude::*;

/// Access level of an account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::N(20))")]
pub enum Role {
    /// Works only with its own profile and loans.
    #[sea_orm(string_value = "RegularUser")]
    RegularUser,
    /// Reviews every loan and manages user accounts.
    #[sea_orm(string_value = "Accountant")]
    Accountant,
}

string_enum!(Role);

/// A registered account of the loan application.
///
/// The password is only ever stored as a salted hash.
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "users")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub first_name: String,
    pub last_name: String,
    #[sea_orm(unique)]
    pub username: String,
    pub age: i32,
    pub salary: Decimal,
    /// Blocked users cannot submit new loans.
    pub is_blocked: bool,
    pub password_hash: String,
    pub role: Role,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// A user owns any number of loans.
    #[sea_orm(has_many = "super::loan::Entity")]
    Loan,
}

impl Related<super::loan::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Loan.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
