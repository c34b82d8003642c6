pub mod auth;
pub mod health;
pub mod loans;
pub mod users;
