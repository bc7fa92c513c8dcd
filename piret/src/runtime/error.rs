// Error handling for the Piret runtime

use crate::ast::Symbol;
use crate::runtime::values::Value;
use thiserror::Error;

pub type EvalResult<T> = Result<T, EvalError>;

/// Failures raised during evaluation.
///
/// Errors are raised at the point of detection and propagate unmodified to the
/// host; the runtime never recovers from them or logs them.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// Symbol resolution failed through locals, namespace and referred namespaces.
    #[error("{0}")]
    BindingNotFound(Symbol),

    /// Function or native call with the wrong argument count.
    #[error("wrong number of arguments ({received} for {expected})")]
    Arity { received: usize, expected: usize },

    /// Application attempted on a value that is not an operator.
    #[error("not callable: {0}")]
    NotCallable(Value),

    /// A special form was given a shape it cannot parse.
    #[error("malformed {form}: {message}")]
    MalformedForm { form: String, message: String },

    #[error("type error in {operation}: expected {expected}, got {actual}")]
    TypeError {
        expected: String,
        actual: String,
        operation: String,
    },

    #[error("evaluation depth limit of {0} exceeded")]
    RecursionLimit(usize),

    /// Internal runtime error, e.g. a poisoned namespace lock
    #[error("internal error: {0}")]
    Internal(String),
}

impl EvalError {
    pub fn malformed(form: &str, message: impl Into<String>) -> Self {
        EvalError::MalformedForm {
            form: form.to_string(),
            message: message.into(),
        }
    }

    pub fn poisoned<E: std::fmt::Display>(e: E) -> Self {
        EvalError::Internal(format!("RwLock poisoned: {}", e))
    }
}
