// Special forms: the fixed table of forms the evaluator handles itself

use crate::ast::Symbol;
use crate::runtime::environment::{Context, Environment};
use crate::runtime::error::{EvalError, EvalResult};
use crate::runtime::evaluator::Evaluator;
use crate::runtime::namespace::Namespace;
use crate::runtime::param_binding::ParamList;
use crate::runtime::values::{Lambda, Value};
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecialForm {
    Quote,
    If,
    Do,
    Let,
    Fn,
    Def,
    Defmacro,
    Ns,
}

impl SpecialForm {
    pub fn from_symbol(symbol: &Symbol) -> Option<Self> {
        match symbol.as_str() {
            "quote" => Some(SpecialForm::Quote),
            "if" => Some(SpecialForm::If),
            "do" => Some(SpecialForm::Do),
            "let" => Some(SpecialForm::Let),
            "fn" => Some(SpecialForm::Fn),
            "def" => Some(SpecialForm::Def),
            "defmacro" => Some(SpecialForm::Defmacro),
            "ns" => Some(SpecialForm::Ns),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            SpecialForm::Quote => "quote",
            SpecialForm::If => "if",
            SpecialForm::Do => "do",
            SpecialForm::Let => "let",
            SpecialForm::Fn => "fn",
            SpecialForm::Def => "def",
            SpecialForm::Defmacro => "defmacro",
            SpecialForm::Ns => "ns",
        }
    }

    /// The argument forms of `form` if it is an invocation of this special form.
    pub fn arguments_of(&self, form: &Value) -> Option<Vec<Value>> {
        match form {
            Value::List(list) => {
                let head = list.head()?.as_symbol()?;
                if SpecialForm::from_symbol(head) == Some(*self) {
                    Some(list.tail().to_vec())
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

fn expect_args(form: SpecialForm, args: &[Value], min: usize, max: Option<usize>) -> EvalResult<()> {
    let n = args.len();
    if n < min || max.is_some_and(|max| n > max) {
        let expected = match max {
            Some(max) if max == min => format!("{}", min),
            Some(max) => format!("{} to {}", min, max),
            None => format!("at least {}", min),
        };
        return Err(EvalError::malformed(
            form.name(),
            format!("expected {} arguments, got {}", expected, n),
        ));
    }
    Ok(())
}

fn expect_symbol<'a>(form: SpecialForm, value: &'a Value, what: &str) -> EvalResult<&'a Symbol> {
    value.as_symbol().ok_or_else(|| {
        EvalError::malformed(
            form.name(),
            format!("{} must be a symbol, got {}", what, value),
        )
    })
}

impl Evaluator {
    pub(crate) fn eval_special_form(
        &self,
        form: SpecialForm,
        ctx: &Arc<Context>,
        args: &[Value],
    ) -> EvalResult<Value> {
        match form {
            SpecialForm::Quote => self.eval_quote(args),
            SpecialForm::If => self.eval_if(ctx, args),
            SpecialForm::Do => self.evaluate_body(ctx, args),
            SpecialForm::Let => self.eval_let(ctx, args),
            SpecialForm::Fn => self.eval_fn(ctx, args),
            SpecialForm::Def => self.eval_def(ctx, args),
            SpecialForm::Defmacro => self.eval_defmacro(ctx, args),
            SpecialForm::Ns => self.eval_ns(ctx, args).map(|(name, _)| Value::Symbol(name)),
        }
    }

    fn eval_quote(&self, args: &[Value]) -> EvalResult<Value> {
        expect_args(SpecialForm::Quote, args, 1, Some(1))?;
        Ok(args[0].clone())
    }

    fn eval_if(&self, ctx: &Arc<Context>, args: &[Value]) -> EvalResult<Value> {
        expect_args(SpecialForm::If, args, 2, Some(3))?;
        let condition = self.evaluate(ctx, &args[0])?;
        if condition.is_truthy() {
            self.evaluate(ctx, &args[1])
        } else if let Some(else_branch) = args.get(2) {
            self.evaluate(ctx, else_branch)
        } else {
            Ok(Value::Nil)
        }
    }

    fn eval_let(&self, ctx: &Arc<Context>, args: &[Value]) -> EvalResult<Value> {
        expect_args(SpecialForm::Let, args, 1, None)?;
        let bindings = args[0].sequence_items().ok_or_else(|| {
            EvalError::malformed(
                "let",
                format!("bindings must be a list or vector, got {}", args[0].type_name()),
            )
        })?;
        if bindings.len() % 2 != 0 {
            return Err(EvalError::malformed("let", "odd number of binding forms"));
        }

        // Each binding sees the ones before it; a repeated name just overwrites the slot
        let let_ctx = Context::child(ctx);
        for pair in bindings.chunks(2) {
            let symbol = expect_symbol(SpecialForm::Let, &pair[0], "binding name")?;
            if symbol.is_qualified() {
                return Err(EvalError::malformed(
                    "let",
                    format!("can't let qualified name {}", symbol),
                ));
            }
            let value = self.evaluate(&let_ctx, &pair[1])?;
            let_ctx.set_here(symbol, value)?;
        }
        self.evaluate_body(&let_ctx, &args[1..])
    }

    fn build_lambda(
        &self,
        form: SpecialForm,
        ctx: &Arc<Context>,
        name: Option<Symbol>,
        params: &Value,
        body: &[Value],
    ) -> EvalResult<Lambda> {
        Ok(Lambda {
            name,
            params: ParamList::parse(form.name(), params)?,
            body: body.to_vec(),
            context: Arc::clone(ctx),
        })
    }

    fn eval_fn(&self, ctx: &Arc<Context>, args: &[Value]) -> EvalResult<Value> {
        expect_args(SpecialForm::Fn, args, 1, None)?;
        let lambda = self.build_lambda(SpecialForm::Fn, ctx, None, &args[0], &args[1..])?;
        Ok(Value::Function(Arc::new(lambda)))
    }

    fn eval_def(&self, ctx: &Arc<Context>, args: &[Value]) -> EvalResult<Value> {
        expect_args(SpecialForm::Def, args, 2, Some(2))?;
        let symbol = expect_symbol(SpecialForm::Def, &args[0], "name")?;
        let value = self.evaluate(ctx, &args[1])?;
        ctx.define_here(symbol, value).map(Value::Symbol)
    }

    fn eval_defmacro(&self, ctx: &Arc<Context>, args: &[Value]) -> EvalResult<Value> {
        expect_args(SpecialForm::Defmacro, args, 2, None)?;
        let symbol = expect_symbol(SpecialForm::Defmacro, &args[0], "name")?;
        let name = Symbol::qualified(ctx.namespace().name(), symbol.name());
        let lambda = self.build_lambda(
            SpecialForm::Defmacro,
            ctx,
            Some(name),
            &args[1],
            &args[2..],
        )?;
        ctx.define_here(symbol, Value::Macro(Arc::new(lambda)))
            .map(Value::Symbol)
    }

    /// Fetch or create the namespace named by an `ns` form.
    pub(crate) fn eval_ns(
        &self,
        ctx: &Arc<Context>,
        args: &[Value],
    ) -> EvalResult<(Symbol, Arc<Namespace>)> {
        expect_args(SpecialForm::Ns, args, 1, Some(1))?;
        let symbol = expect_symbol(SpecialForm::Ns, &args[0], "namespace name")?;
        if symbol.is_qualified() {
            return Err(EvalError::malformed(
                "ns",
                format!("namespace name can't be qualified: {}", symbol),
            ));
        }
        let namespace = ctx.namespace().registry()?.namespace(symbol.as_str())?;
        Ok((symbol.clone(), namespace))
    }
}
