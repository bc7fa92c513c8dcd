//! Piret Standard Library
//!
//! Native procedures installed into the builtin namespace. Each one honors the
//! same call contract as a user function: arity is checked by the evaluator,
//! arguments arrive evaluated and an optional block rides alongside.

use crate::ast::Symbol;
use crate::runtime::environment::Environment;
use crate::runtime::error::{EvalError, EvalResult};
use crate::runtime::evaluator::Evaluator;
use crate::runtime::namespace::{Namespace, NamespaceRegistry};
use crate::runtime::values::{Arity, List, NativeProcedure, Value};
use std::sync::Arc;
use tracing::debug;

pub const BUILTIN_NAMESPACE: &str = "piret.builtin";

/// Install the builtins into `piret.builtin` of `registry` and return that namespace.
///
/// Installing is an explicit host action; nothing is referred automatically.
pub fn install_builtins(registry: &NamespaceRegistry) -> EvalResult<Arc<Namespace>> {
    let namespace = registry.namespace(BUILTIN_NAMESPACE)?;
    StandardLibrary::install(&namespace)?;
    Ok(namespace)
}

pub struct StandardLibrary;

impl StandardLibrary {
    /// Defines every builtin procedure in `namespace`.
    pub fn install(namespace: &Namespace) -> EvalResult<()> {
        let natives = [
            NativeProcedure::new("list", Arity::Variadic(0), |_, args, _| Self::list(args)),
            NativeProcedure::new("apply", Arity::Variadic(2), Self::apply),
        ];
        for native in natives {
            let symbol = Symbol::new(&native.name);
            namespace.define_here(&symbol, Value::Native(native))?;
        }
        debug!(namespace = %namespace.name(), "installed builtins");
        Ok(())
    }

    // `(list x ...)` - its arguments as a list
    fn list(args: Vec<Value>) -> EvalResult<Value> {
        Ok(Value::List(args.into_iter().collect::<List>()))
    }

    // `(apply f a b ... coll)` - call f with a, b, ... followed by the items of coll
    fn apply(evaluator: &Evaluator, mut args: Vec<Value>, block: Option<Value>) -> EvalResult<Value> {
        Arity::Variadic(2).check(args.len())?;
        let spread = match args.pop() {
            None | Some(Value::Nil) => Vec::new(),
            Some(other) => other.sequence_items().ok_or_else(|| EvalError::TypeError {
                expected: "list or vector".to_string(),
                actual: other.type_name().to_string(),
                operation: "apply".to_string(),
            })?,
        };
        let operator = args.remove(0);
        args.extend(spread);
        evaluator.call(&operator, args, block)
    }
}
