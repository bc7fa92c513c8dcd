// Runtime value system for Piret
// Programs are data: the reader produces these values and the evaluator consumes them.

use crate::ast::{Keyword, Symbol};
use crate::runtime::environment::Context;
use crate::runtime::error::{EvalError, EvalResult};
use crate::runtime::evaluator::Evaluator;
use crate::runtime::param_binding::ParamList;
use itertools::Itertools;
use std::fmt;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub enum Value {
    Nil,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Symbol(Symbol),
    Keyword(Keyword),
    List(List),
    Vector(Vec<Value>),
    Function(Arc<Lambda>),
    Macro(Arc<Lambda>),
    Native(NativeProcedure),
}

impl Value {
    /// Only an explicit `false` is falsy; `nil` counts as true.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Boolean(false))
    }

    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Boolean(_) => "boolean",
            Value::Integer(_) => "integer",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Symbol(_) => "symbol",
            Value::Keyword(_) => "keyword",
            Value::List(_) => "list",
            Value::Vector(_) => "vector",
            Value::Function(_) => "function",
            Value::Macro(_) => "macro",
            Value::Native(_) => "native",
        }
    }

    pub fn symbol(name: &str) -> Value {
        Value::Symbol(Symbol::new(name))
    }

    pub fn list<I: IntoIterator<Item = Value>>(items: I) -> Value {
        Value::List(items.into_iter().collect())
    }

    pub fn as_symbol(&self) -> Option<&Symbol> {
        match self {
            Value::Symbol(s) => Some(s),
            _ => None,
        }
    }

    /// Elements of a list or vector, the shapes accepted wherever a sequence of forms is expected.
    pub fn sequence_items(&self) -> Option<Vec<Value>> {
        match self {
            Value::List(list) => Some(list.to_vec()),
            Value::Vector(items) => Some(items.clone()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Integer(a), Value::Integer(b)) => a == b,
            (Value::Float(a), Value::Float(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Symbol(a), Value::Symbol(b)) => a == b,
            (Value::Keyword(a), Value::Keyword(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Vector(a), Value::Vector(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Arc::ptr_eq(a, b),
            (Value::Macro(a), Value::Macro(b)) => Arc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),
            Value::Boolean(b) => write!(f, "{}", b),
            Value::Integer(i) => write!(f, "{}", i),
            Value::Float(fl) => write!(f, "{:?}", fl),
            Value::String(s) => write!(f, "\"{}\"", escape(s)),
            Value::Symbol(s) => write!(f, "{}", s),
            Value::Keyword(k) => write!(f, "{}", k),
            Value::List(l) => write!(f, "{}", l),
            Value::Vector(v) => write!(f, "[{}]", v.iter().join(" ")),
            Value::Function(_) => write!(f, "#<fn>"),
            Value::Macro(m) => match &m.name {
                Some(name) => write!(f, "#<macro {}>", name),
                None => write!(f, "#<macro>"),
            },
            Value::Native(n) => write!(f, "#<native {}>", n.name),
        }
    }
}

fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Integer(n)
    }
}

impl From<f64> for Value {
    fn from(n: f64) -> Self {
        Value::Float(n)
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(s)
    }
}

impl From<List> for Value {
    fn from(list: List) -> Self {
        Value::List(list)
    }
}

// --- Pair lists ---

/// An immutable singly linked list of cons cells.
///
/// Construction, iteration, comparison, printing and dropping never recurse
/// along the spine, so lists of any length are safe.
#[derive(Clone, Default)]
pub struct List(Option<Arc<Cons>>);

pub struct Cons {
    head: Value,
    tail: List,
}

impl List {
    pub fn empty() -> Self {
        List(None)
    }

    pub fn cons(head: Value, tail: List) -> Self {
        List(Some(Arc::new(Cons { head, tail })))
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_none()
    }

    pub fn head(&self) -> Option<&Value> {
        self.0.as_deref().map(|c| &c.head)
    }

    /// Everything after the head; the empty list stays empty.
    pub fn tail(&self) -> List {
        match &self.0 {
            Some(c) => c.tail.clone(),
            None => List::empty(),
        }
    }

    pub fn iter(&self) -> Iter<'_> {
        Iter {
            next: self.0.as_deref(),
        }
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.iter().cloned().collect()
    }
}

impl FromIterator<Value> for List {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        let items: Vec<Value> = iter.into_iter().collect();
        items
            .into_iter()
            .rev()
            .fold(List::empty(), |tail, head| List::cons(head, tail))
    }
}

pub struct Iter<'a> {
    next: Option<&'a Cons>,
}

impl<'a> Iterator for Iter<'a> {
    type Item = &'a Value;

    fn next(&mut self) -> Option<Self::Item> {
        let cell = self.next?;
        self.next = cell.tail.0.as_deref();
        Some(&cell.head)
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        let (mut a, mut b) = (self, other);
        loop {
            match (&a.0, &b.0) {
                (None, None) => return true,
                (Some(x), Some(y)) => {
                    if Arc::ptr_eq(x, y) {
                        return true;
                    }
                    if x.head != y.head {
                        return false;
                    }
                    a = &x.tail;
                    b = &y.tail;
                }
                _ => return false,
            }
        }
    }
}

impl Drop for List {
    fn drop(&mut self) {
        // Unlink uniquely owned cells one at a time instead of recursing down the tail.
        let mut next = self.0.take();
        while let Some(cell) = next {
            match Arc::try_unwrap(cell) {
                Ok(mut cons) => next = cons.tail.0.take(),
                Err(_) => break,
            }
        }
    }
}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({})", self.iter().join(" "))
    }
}

// --- Functions, macros and natives ---

/// A closure: parameter specification, body forms and the defining context.
///
/// Functions and macros share this shape; the `Value` tag decides whether the
/// evaluator applies it to evaluated arguments or expands it over raw forms.
pub struct Lambda {
    pub name: Option<Symbol>,
    pub params: ParamList,
    pub body: Vec<Value>,
    pub context: Arc<Context>,
}

impl fmt::Debug for Lambda {
    // The defining context may (indirectly) contain this lambda, so it is not printed.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Lambda")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("body_len", &self.body.len())
            .finish()
    }
}

pub type NativeFn =
    dyn Fn(&Evaluator, Vec<Value>, Option<Value>) -> EvalResult<Value> + Send + Sync;

/// A host-provided procedure honoring the same call contract as user functions.
#[derive(Clone)]
pub struct NativeProcedure {
    pub name: String,
    pub arity: Arity,
    pub func: Arc<NativeFn>,
}

impl NativeProcedure {
    pub fn new<F>(name: &str, arity: Arity, func: F) -> Self
    where
        F: Fn(&Evaluator, Vec<Value>, Option<Value>) -> EvalResult<Value> + Send + Sync + 'static,
    {
        NativeProcedure {
            name: name.to_string(),
            arity,
            func: Arc::new(func),
        }
    }
}

impl fmt::Debug for NativeProcedure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeProcedure")
            .field("name", &self.name)
            .field("arity", &self.arity)
            .finish()
    }
}

impl PartialEq for NativeProcedure {
    fn eq(&self, other: &Self) -> bool {
        // Compare natives by name and arity, not by function pointer
        self.name == other.name && self.arity == other.arity
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Arity {
    Fixed(usize),
    /// Minimum number of arguments
    Variadic(usize),
}

impl Arity {
    pub fn check(&self, received: usize) -> EvalResult<()> {
        let (expected, ok) = match *self {
            Arity::Fixed(n) => (n, received == n),
            Arity::Variadic(n) => (n, received >= n),
        };
        if ok {
            Ok(())
        } else {
            Err(EvalError::Arity { received, expected })
        }
    }
}
