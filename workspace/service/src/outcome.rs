/// Successful result of a service operation.
///
/// Failures travel as [`crate::ServiceError`]; together they form the
/// status + message + optional entity triple handed to the transport layer.
#[derive(Debug, Clone, PartialEq)]
pub struct Outcome<T> {
    /// Human-readable confirmation
    pub message: String,
    /// The affected entity or collection
    pub data: T,
}

impl<T> Outcome<T> {
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }

    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> Outcome<U> {
        Outcome {
            message: self.message,
            data: f(self.data),
        }
    }
}
