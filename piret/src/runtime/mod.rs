//! Piret Runtime System
//!
//! The evaluator, the environment model it runs against and the builtin
//! library. [`Session`] ties them together for hosts that just want to feed
//! source text in and get values out.

pub mod environment;
pub mod error;
pub mod evaluator;
pub mod namespace;
pub mod param_binding;
pub mod special_forms;
pub mod stdlib;
pub mod values;

pub use environment::{Context, Environment};
pub use error::{EvalError, EvalResult};
pub use evaluator::Evaluator;
pub use namespace::{Binding, Namespace, NamespaceRegistry};
pub use param_binding::ParamList;
pub use special_forms::SpecialForm;
pub use stdlib::{install_builtins, StandardLibrary, BUILTIN_NAMESPACE};
pub use values::{Arity, Lambda, List, NativeProcedure, Value};

use crate::config::PiretConfig;
use crate::error::PiretError;
use crate::reader;
use std::sync::Arc;
use tracing::debug;

/// A top-level evaluation session.
///
/// Owns the registry, an evaluator and the current context. `ns` forms
/// evaluated through the session switch the context used for later forms.
#[derive(Debug)]
pub struct Session {
    registry: Arc<NamespaceRegistry>,
    evaluator: Evaluator,
    context: Arc<Context>,
}

impl Session {
    /// Create a session on a fresh registry.
    pub fn new(config: &PiretConfig) -> EvalResult<Self> {
        Self::with_registry(NamespaceRegistry::new(), config)
    }

    /// Create a session on an existing registry, e.g. [`NamespaceRegistry::global`].
    pub fn with_registry(registry: Arc<NamespaceRegistry>, config: &PiretConfig) -> EvalResult<Self> {
        let session = &config.session;
        let namespace = registry.namespace(&session.default_namespace)?;
        if session.refer_builtins {
            let builtins = registry.namespace(&session.builtin_namespace)?;
            StandardLibrary::install(&builtins)?;
            namespace.refer(&builtins)?;
        }
        debug!(namespace = %namespace.name(), "session started");
        Ok(Session {
            registry,
            evaluator: Evaluator::new(config.evaluator.clone()),
            context: Context::new(namespace),
        })
    }

    pub fn registry(&self) -> &Arc<NamespaceRegistry> {
        &self.registry
    }

    pub fn evaluator(&self) -> &Evaluator {
        &self.evaluator
    }

    pub fn context(&self) -> &Arc<Context> {
        &self.context
    }

    /// The namespace top-level definitions currently land in.
    pub fn namespace(&self) -> &Arc<Namespace> {
        self.context.namespace()
    }

    /// Evaluate one already-read top-level form.
    pub fn eval_form(&mut self, form: &Value) -> EvalResult<Value> {
        self.evaluator.evaluate_toplevel(&mut self.context, form)
    }

    /// Read and evaluate every form in `source`, returning the last value (nil if none).
    pub fn eval_str(&mut self, source: &str) -> Result<Value, PiretError> {
        let mut result = Value::Nil;
        for form in reader::read_all(source)? {
            result = self.eval_form(&form)?;
        }
        Ok(result)
    }
}
