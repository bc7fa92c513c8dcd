//! Piret: an embeddable Lisp evaluation core.
//!
//! Source text is read into plain data ([`Value`]) and evaluated against a
//! [`Context`] rooted in a [`Namespace`]. Hosts usually go through a
//! [`Session`], which threads `ns` switches across top-level forms.

pub mod ast;
pub mod config;
pub mod error;
pub mod reader;
pub mod runtime;

pub use ast::{Keyword, Symbol};
pub use config::{EvaluatorConfig, PiretConfig, SessionConfig};
pub use error::PiretError;
pub use reader::{read, read_all, ReadError};
pub use runtime::{
    install_builtins, Arity, Context, Environment, EvalError, EvalResult, Evaluator, List,
    Namespace, NamespaceRegistry, NativeProcedure, Session, Value,
};
