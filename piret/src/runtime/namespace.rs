// Namespaces - named, mutable, top-level binding tables and the registry that owns them

use crate::ast::Symbol;
use crate::runtime::environment::Environment;
use crate::runtime::error::{EvalError, EvalResult};
use crate::runtime::values::Value;
use lazy_static::lazy_static;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, RwLock, Weak};
use tracing::{debug, trace};

lazy_static! {
    static ref GLOBAL_REGISTRY: Arc<NamespaceRegistry> = NamespaceRegistry::new();
}

/// Registry that owns every namespace of a run.
///
/// Namespaces are created on first reference and never removed.
#[derive(Debug)]
pub struct NamespaceRegistry {
    namespaces: RwLock<HashMap<String, Arc<Namespace>>>,
    this: Weak<NamespaceRegistry>,
}

impl NamespaceRegistry {
    /// Create a new, isolated registry.
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|this| NamespaceRegistry {
            namespaces: RwLock::new(HashMap::new()),
            this: this.clone(),
        })
    }

    /// The process-wide registry.
    pub fn global() -> Arc<Self> {
        Arc::clone(&GLOBAL_REGISTRY)
    }

    /// Fetch a namespace by name, creating it if it does not exist yet.
    pub fn namespace(&self, name: &str) -> EvalResult<Arc<Namespace>> {
        if let Some(ns) = self.get(name)? {
            return Ok(ns);
        }
        let mut namespaces = self.namespaces.write().map_err(EvalError::poisoned)?;
        let ns = namespaces.entry(name.to_string()).or_insert_with(|| {
            debug!(namespace = name, "creating namespace");
            Arc::new(Namespace {
                name: name.to_string(),
                bindings: RwLock::new(HashMap::new()),
                referred: RwLock::new(Vec::new()),
                registry: self.this.clone(),
            })
        });
        Ok(Arc::clone(ns))
    }

    /// Fetch a namespace by name without creating it.
    pub fn get(&self, name: &str) -> EvalResult<Option<Arc<Namespace>>> {
        Ok(self
            .namespaces
            .read()
            .map_err(EvalError::poisoned)?
            .get(name)
            .cloned())
    }

    pub fn names(&self) -> EvalResult<Vec<String>> {
        let mut names: Vec<String> = self
            .namespaces
            .read()
            .map_err(EvalError::poisoned)?
            .keys()
            .cloned()
            .collect();
        names.sort();
        Ok(names)
    }
}

/// Mutable holder of exactly one current value, owned by one namespace.
#[derive(Debug)]
pub struct Binding {
    symbol: Symbol,
    value: RwLock<Value>,
}

impl Binding {
    /// The fully qualified symbol this cell is bound to.
    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    pub fn get(&self) -> EvalResult<Value> {
        Ok(self.value.read().map_err(EvalError::poisoned)?.clone())
    }

    pub fn set(&self, value: Value) -> EvalResult<()> {
        *self.value.write().map_err(EvalError::poisoned)? = value;
        Ok(())
    }
}

/// A named, mutable mapping from local symbol name to binding cell.
///
/// Referred namespaces are held weakly: their cells stay owned by them and are
/// resolved at lookup time, so later updates in the source are observed.
pub struct Namespace {
    name: String,
    bindings: RwLock<HashMap<String, Arc<Binding>>>,
    referred: RwLock<Vec<Weak<Namespace>>>,
    registry: Weak<NamespaceRegistry>,
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Namespace").field("name", &self.name).finish()
    }
}

impl Namespace {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The registry this namespace belongs to.
    pub fn registry(&self) -> EvalResult<Arc<NamespaceRegistry>> {
        self.registry.upgrade().ok_or_else(|| {
            EvalError::Internal(format!("registry of namespace {} was dropped", self.name))
        })
    }

    /// The cell this namespace owns for `name`, ignoring referred namespaces.
    pub fn binding(&self, name: &str) -> EvalResult<Option<Arc<Binding>>> {
        Ok(self
            .bindings
            .read()
            .map_err(EvalError::poisoned)?
            .get(name)
            .cloned())
    }

    pub fn local_names(&self) -> EvalResult<Vec<String>> {
        let mut names: Vec<String> = self
            .bindings
            .read()
            .map_err(EvalError::poisoned)?
            .keys()
            .cloned()
            .collect();
        names.sort();
        Ok(names)
    }

    /// Make all of `other`'s current and future bindings visible here.
    ///
    /// Referring the same namespace again makes it the most recent one, so the latest refer wins.
    pub fn refer(&self, other: &Arc<Namespace>) -> EvalResult<()> {
        if std::ptr::eq(self, Arc::as_ptr(other)) {
            return Ok(());
        }
        let mut referred = self.referred.write().map_err(EvalError::poisoned)?;
        referred.retain(|weak| weak.upgrade().is_some_and(|ns| !Arc::ptr_eq(&ns, other)));
        referred.push(Arc::downgrade(other));
        debug!(namespace = %self.name, referred = %other.name, "refer");
        Ok(())
    }

    /// Resolve an unqualified name: own cells first, then referred namespaces, newest first.
    fn resolve(&self, name: &str) -> EvalResult<Option<Value>> {
        if let Some(cell) = self.binding(name)? {
            return cell.get().map(Some);
        }
        let referred: Vec<Arc<Namespace>> = self
            .referred
            .read()
            .map_err(EvalError::poisoned)?
            .iter()
            .rev()
            .filter_map(Weak::upgrade)
            .collect();
        for ns in referred {
            if let Some(cell) = ns.binding(name)? {
                return cell.get().map(Some);
            }
        }
        Ok(None)
    }

    /// Value of a cell this namespace owns; referred namespaces are not consulted.
    fn owned(&self, name: &str) -> EvalResult<Option<Value>> {
        match self.binding(name)? {
            Some(cell) => cell.get().map(Some),
            None => Ok(None),
        }
    }

    /// Index by local name, failing with binding-not-found on a miss.
    pub fn get(&self, name: &str) -> EvalResult<Value> {
        self.lookup(&Symbol::new(name))
    }
}

impl Environment for Namespace {
    fn lookup(&self, symbol: &Symbol) -> EvalResult<Value> {
        let found = match symbol.namespace() {
            None => self.resolve(symbol.as_str())?,
            Some(ns) if ns == self.name => self.owned(symbol.name())?,
            Some(ns) => match self.registry()?.get(ns)? {
                Some(target) => target.owned(symbol.name())?,
                None => None,
            },
        };
        found.ok_or_else(|| EvalError::BindingNotFound(symbol.clone()))
    }

    fn define_here(&self, symbol: &Symbol, value: Value) -> EvalResult<Symbol> {
        match symbol.namespace() {
            Some(ns) if ns != self.name => {
                return Err(EvalError::malformed(
                    "def",
                    format!("can't define {} in namespace {}", symbol, self.name),
                ))
            }
            _ => {}
        }
        let qualified = Symbol::qualified(&self.name, symbol.name());
        let mut bindings = self.bindings.write().map_err(EvalError::poisoned)?;
        match bindings.get(symbol.name()) {
            Some(cell) => cell.set(value)?,
            None => {
                bindings.insert(
                    symbol.name().to_string(),
                    Arc::new(Binding {
                        symbol: qualified.clone(),
                        value: RwLock::new(value),
                    }),
                );
            }
        }
        trace!(symbol = %qualified, "def");
        Ok(qualified)
    }
}
