pub use model::entities::user::Role;

/// Identity of the caller, passed explicitly into every policy and service call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestContext {
    /// `None` when the token's subject claim is missing or not a user id.
    pub requester_id: Option<i32>,
    pub role: Role,
}

impl RequestContext {
    pub fn new(requester_id: i32, role: Role) -> Self {
        Self {
            requester_id: Some(requester_id),
            role,
        }
    }

    /// A caller whose subject claim could not be resolved to a user id.
    pub fn unresolved(role: Role) -> Self {
        Self {
            requester_id: None,
            role,
        }
    }

    /// True when the requester is the user with `user_id`.
    pub fn is(&self, user_id: i32) -> bool {
        self.requester_id == Some(user_id)
    }
}
