// Parameter specifications and the call/arity binding protocol

use crate::ast::Symbol;
use crate::runtime::environment::Context;
use crate::runtime::error::{EvalError, EvalResult};
use crate::runtime::values::{Arity, List, Value};

const REST_MARKER: &str = "&";
const BLOCK_MARKER: &str = "|";

/// Parsed `[fixed... & rest | block]` parameter vector.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ParamList {
    pub fixed: Vec<Symbol>,
    pub rest: Option<Symbol>,
    /// Out-of-band callable argument; never counted toward arity.
    pub block: Option<Symbol>,
}

#[derive(Clone, Copy, PartialEq)]
enum Slot {
    Fixed,
    Rest,
    AfterRest,
    Block,
    Done,
}

impl ParamList {
    /// Parses a parameter list or vector. `form` names the special form for error messages.
    pub fn parse(form: &str, spec: &Value) -> EvalResult<Self> {
        let items = spec.sequence_items().ok_or_else(|| {
            EvalError::malformed(
                form,
                format!("parameters must be a list or vector, got {}", spec.type_name()),
            )
        })?;

        let mut params = ParamList::default();
        let mut slot = Slot::Fixed;

        for item in &items {
            let symbol = item.as_symbol().ok_or_else(|| {
                EvalError::malformed(form, format!("parameter must be a symbol, got {}", item))
            })?;

            slot = match (symbol.as_str(), slot) {
                (REST_MARKER, Slot::Fixed) => Slot::Rest,
                (BLOCK_MARKER, Slot::Fixed | Slot::AfterRest) => Slot::Block,
                (REST_MARKER | BLOCK_MARKER, _) => {
                    return Err(EvalError::malformed(
                        form,
                        format!("misplaced `{}` in parameters {}", symbol, spec),
                    ))
                }
                (_, _) if symbol.is_qualified() => {
                    return Err(EvalError::malformed(
                        form,
                        format!("can't bind qualified symbol {}", symbol),
                    ))
                }
                (_, Slot::Fixed) => {
                    params.fixed.push(symbol.clone());
                    Slot::Fixed
                }
                (_, Slot::Rest) => {
                    params.rest = Some(symbol.clone());
                    Slot::AfterRest
                }
                (_, Slot::Block) => {
                    params.block = Some(symbol.clone());
                    Slot::Done
                }
                (_, Slot::AfterRest | Slot::Done) => {
                    return Err(EvalError::malformed(
                        form,
                        format!("unexpected parameter {} after rest/block", symbol),
                    ))
                }
            };
        }

        match slot {
            Slot::Rest => Err(EvalError::malformed(form, "`&` must be followed by a symbol")),
            Slot::Block => Err(EvalError::malformed(form, "`|` must be followed by a symbol")),
            _ => Ok(params),
        }
    }

    pub fn arity(&self) -> Arity {
        match self.rest {
            Some(_) => Arity::Variadic(self.fixed.len()),
            None => Arity::Fixed(self.fixed.len()),
        }
    }

    /// Binds positional arguments and the optional block into `frame`.
    ///
    /// Fixed parameters take the first `F` arguments, the rest parameter takes
    /// the remaining ones as a list, and the block parameter takes `block` (or nil).
    pub fn bind(&self, frame: &Context, args: Vec<Value>, block: Option<Value>) -> EvalResult<()> {
        self.arity().check(args.len())?;

        let mut args = args.into_iter();
        for (param, arg) in self.fixed.iter().zip(args.by_ref()) {
            frame.set_here(param, arg)?;
        }
        if let Some(rest) = &self.rest {
            frame.set_here(rest, Value::List(args.collect::<List>()))?;
        }
        if let Some(param) = &self.block {
            frame.set_here(param, block.unwrap_or(Value::Nil))?;
        }
        Ok(())
    }
}
