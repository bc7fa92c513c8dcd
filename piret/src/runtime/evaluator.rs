// Piret Evaluator - walks reader data and produces values

use crate::config::EvaluatorConfig;
use crate::runtime::environment::{Context, Environment};
use crate::runtime::error::{EvalError, EvalResult};
use crate::runtime::special_forms::SpecialForm;
use crate::runtime::values::{Lambda, List, Value};
use std::cell::Cell;
use std::sync::Arc;
use tracing::{debug, trace};

/// Tree-walking evaluator.
///
/// The evaluator itself is stateless apart from its configuration and the
/// current nesting depth; all bindings live in the contexts and namespaces it
/// is handed.
#[derive(Debug)]
pub struct Evaluator {
    config: EvaluatorConfig,
    depth: Cell<usize>,
}

struct DepthGuard<'a> {
    depth: &'a Cell<usize>,
}

impl Drop for DepthGuard<'_> {
    fn drop(&mut self) {
        self.depth.set(self.depth.get().saturating_sub(1));
    }
}

impl Default for Evaluator {
    fn default() -> Self {
        Self::new(EvaluatorConfig::default())
    }
}

impl Evaluator {
    pub fn new(config: EvaluatorConfig) -> Self {
        Evaluator {
            config,
            depth: Cell::new(0),
        }
    }

    pub fn config(&self) -> &EvaluatorConfig {
        &self.config
    }

    fn enter(&self) -> EvalResult<DepthGuard<'_>> {
        let depth = self.depth.get() + 1;
        if depth > self.config.max_depth {
            return Err(EvalError::RecursionLimit(self.config.max_depth));
        }
        self.depth.set(depth);
        Ok(DepthGuard { depth: &self.depth })
    }

    /// Evaluate a single form in `ctx`.
    pub fn evaluate(&self, ctx: &Arc<Context>, form: &Value) -> EvalResult<Value> {
        let _guard = self.enter()?;
        match form {
            Value::Symbol(symbol) => ctx.lookup(symbol),
            Value::List(list) => match list.head() {
                // The empty list is a value, not an invocation
                None => Ok(form.clone()),
                Some(head) => self.eval_application(ctx, head, list.tail()),
            },
            Value::Vector(items) => items
                .iter()
                .map(|item| self.evaluate(ctx, item))
                .collect::<EvalResult<Vec<_>>>()
                .map(Value::Vector),
            _ => Ok(form.clone()),
        }
    }

    /// Evaluate `forms` in order and return the last value, or nil when empty.
    ///
    /// An `(ns name)` form switches the context used for the remaining forms
    /// without touching `ctx` itself.
    pub fn evaluate_body(&self, ctx: &Arc<Context>, forms: &[Value]) -> EvalResult<Value> {
        let mut current = Arc::clone(ctx);
        let mut result = Value::Nil;
        for form in forms {
            result = self.evaluate_toplevel(&mut current, form)?;
        }
        Ok(result)
    }

    /// Evaluate one form of a sequence. If it is an `ns` form, `ctx` is replaced
    /// by a child context targeting the named namespace.
    pub fn evaluate_toplevel(&self, ctx: &mut Arc<Context>, form: &Value) -> EvalResult<Value> {
        let args = match SpecialForm::Ns.arguments_of(form) {
            Some(args) => args,
            None => return self.evaluate(ctx, form),
        };
        let _guard = self.enter()?;
        let (name, namespace) = self.eval_ns(ctx, &args)?;
        debug!(from = %ctx.namespace().name(), to = %name, "switching namespace");
        *ctx = Context::with_namespace(ctx, namespace);
        Ok(Value::Symbol(name))
    }

    fn eval_application(&self, ctx: &Arc<Context>, head: &Value, args: List) -> EvalResult<Value> {
        // Special forms are checked before any lookup so bindings can't shadow them
        if let Some(special) = head.as_symbol().and_then(SpecialForm::from_symbol) {
            return self.eval_special_form(special, ctx, &args.to_vec());
        }

        let operator = self.evaluate(ctx, head)?;
        match &operator {
            Value::Macro(lambda) => {
                let expansion = self.expand(lambda, args)?;
                self.evaluate(ctx, &expansion)
            }
            Value::Function(_) | Value::Native(_) => {
                let args = args
                    .iter()
                    .map(|arg| self.evaluate(ctx, arg))
                    .collect::<EvalResult<Vec<_>>>()?;
                self.call(&operator, args, None)
            }
            _ => Err(EvalError::NotCallable(operator.clone())),
        }
    }

    /// Apply a function or native procedure to already evaluated arguments and
    /// an optional block.
    ///
    /// Calls count toward `max_depth` alongside nested evaluation.
    pub fn call(&self, operator: &Value, args: Vec<Value>, block: Option<Value>) -> EvalResult<Value> {
        let _guard = self.enter()?;
        match operator {
            Value::Function(lambda) => {
                let frame = Context::child(&lambda.context);
                lambda.params.bind(&frame, args, block)?;
                self.evaluate_body(&frame, &lambda.body)
            }
            Value::Native(native) => {
                native.arity.check(args.len())?;
                (native.func)(self, args, block)
            }
            other => Err(EvalError::NotCallable(other.clone())),
        }
    }

    /// Build a macro's expansion from the raw argument forms.
    ///
    /// The body runs in a child of the macro's defining context; the caller
    /// evaluates the returned form in its own context.
    pub fn expand(&self, mac: &Lambda, forms: List) -> EvalResult<Value> {
        let frame = Context::child(&mac.context);
        mac.params.bind(&frame, forms.to_vec(), None)?;
        let expansion = self.evaluate_body(&frame, &mac.body)?;
        match &mac.name {
            Some(name) => trace!(name = %name, expansion = %expansion, "macro expanded"),
            None => trace!(expansion = %expansion, "macro expanded"),
        }
        Ok(expansion)
    }
}
