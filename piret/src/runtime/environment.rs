// Lexical contexts layered on top of a root namespace

use crate::ast::Symbol;
use crate::runtime::error::{EvalError, EvalResult};
use crate::runtime::namespace::Namespace;
use crate::runtime::values::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock};

/// Anything symbols can be resolved against and defined into.
pub trait Environment {
    /// Resolve `symbol`, failing with `BindingNotFound` if nothing along the chain binds it.
    fn lookup(&self, symbol: &Symbol) -> EvalResult<Value>;

    /// Define `symbol` at the top of the root namespace and return its qualified symbol.
    fn define_here(&self, symbol: &Symbol, value: Value) -> EvalResult<Symbol>;
}

/// A lexical scope: a local frame, an optional parent context and the namespace
/// that roots the chain.
///
/// Frames only ever shadow; an ancestor's slot is never rebound from a child.
/// Contexts are shared by every closure created while they were live.
pub struct Context {
    parent: Option<Arc<Context>>,
    namespace: Arc<Namespace>,
    frame: RwLock<HashMap<Symbol, Value>>,
}

impl Context {
    /// Creates a root context directly on top of `namespace`.
    pub fn new(namespace: Arc<Namespace>) -> Arc<Self> {
        Arc::new(Context {
            parent: None,
            namespace,
            frame: RwLock::new(HashMap::new()),
        })
    }

    /// Creates a child context that inherits its parent's namespace.
    pub fn child(parent: &Arc<Context>) -> Arc<Self> {
        Self::with_namespace(parent, Arc::clone(&parent.namespace))
    }

    /// Creates a child context whose top-level definitions and namespace
    /// lookups target `namespace` instead of the parent's.
    pub fn with_namespace(parent: &Arc<Context>, namespace: Arc<Namespace>) -> Arc<Self> {
        Arc::new(Context {
            parent: Some(Arc::clone(parent)),
            namespace,
            frame: RwLock::new(HashMap::new()),
        })
    }

    pub fn namespace(&self) -> &Arc<Namespace> {
        &self.namespace
    }

    pub fn parent(&self) -> Option<&Arc<Context>> {
        self.parent.as_ref()
    }

    /// Bind `symbol` in this frame only, shadowing any ancestor binding.
    pub fn set_here(&self, symbol: &Symbol, value: Value) -> EvalResult<()> {
        self.frame
            .write()
            .map_err(EvalError::poisoned)?
            .insert(symbol.clone(), value);
        Ok(())
    }

    fn lookup_frames(&self, symbol: &Symbol) -> EvalResult<Option<Value>> {
        let mut current = Some(self);
        while let Some(ctx) = current {
            if let Some(value) = ctx.frame.read().map_err(EvalError::poisoned)?.get(symbol) {
                return Ok(Some(value.clone()));
            }
            current = ctx.parent.as_deref();
        }
        Ok(None)
    }
}

impl Environment for Context {
    fn lookup(&self, symbol: &Symbol) -> EvalResult<Value> {
        match self.lookup_frames(symbol)? {
            Some(value) => Ok(value),
            None => self.namespace.lookup(symbol),
        }
    }

    fn define_here(&self, symbol: &Symbol, value: Value) -> EvalResult<Symbol> {
        self.namespace.define_here(symbol, value)
    }
}

impl fmt::Debug for Context {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let names: Vec<String> = match self.frame.read() {
            Ok(frame) => frame.keys().map(|s| s.0.clone()).collect(),
            Err(_) => Vec::new(),
        };
        f.debug_struct("Context")
            .field("namespace", &self.namespace.name())
            .field("frame", &names)
            .field("has_parent", &self.parent.is_some())
            .finish()
    }
}
