use piret::runtime::{Arity, Context, Environment, EvalError, Evaluator, NativeProcedure};
use piret::{install_builtins, read, NamespaceRegistry, Symbol, Value};
use pretty_assertions::assert_eq;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

struct Fixture {
    registry: Arc<NamespaceRegistry>,
    evaluator: Evaluator,
    context: Arc<Context>,
}

impl Fixture {
    fn new() -> Self {
        let registry = NamespaceRegistry::new();
        let builtins = install_builtins(&registry).unwrap();
        let ns = registry.namespace("user.spec").unwrap();
        ns.refer(&builtins).unwrap();
        Fixture {
            evaluator: Evaluator::default(),
            context: Context::new(ns),
            registry,
        }
    }

    fn eval(&self, src: &str) -> Result<Value, EvalError> {
        self.eval_in(&self.context, src)
    }

    fn eval_in(&self, ctx: &Arc<Context>, src: &str) -> Result<Value, EvalError> {
        self.evaluator.evaluate(ctx, &read(src).unwrap())
    }

    fn call(&self, src: &str, args: Vec<Value>) -> Result<Value, EvalError> {
        let f = self.eval(src).unwrap();
        self.evaluator.call(&f, args, None)
    }
}

/// A native that counts its calls and returns `result`.
fn counting(name: &str, result: Value) -> (Value, Arc<AtomicUsize>) {
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);
    let native = NativeProcedure::new(name, Arity::Variadic(0), move |_, _, _| {
        counter.fetch_add(1, Ordering::SeqCst);
        Ok(result.clone())
    });
    (Value::Native(native), calls)
}

fn s(text: &str) -> Value {
    Value::from(text)
}

// --- let ---

#[test]
fn let_makes_local_bindings() {
    let fx = Fixture::new();
    assert_eq!(fx.eval("(let (a 42) a)").unwrap(), Value::Integer(42));
    assert_eq!(fx.eval("(let (a 1 a 2) a)").unwrap(), Value::Integer(2));
}

#[test]
fn let_bindings_see_earlier_ones() {
    let fx = Fixture::new();
    assert_eq!(
        fx.eval("(let [a 1 b (list a a)] b)").unwrap(),
        read("(1 1)").unwrap()
    );
}

#[test]
fn let_odd_bindings_are_malformed() {
    let fx = Fixture::new();
    assert!(matches!(
        fx.eval("(let (a) a)"),
        Err(EvalError::MalformedForm { .. })
    ));
}

// --- quote ---

#[test]
fn quote_prevents_evaluation() {
    let fx = Fixture::new();
    assert_eq!(fx.eval("(quote lmnop)").unwrap(), read("lmnop").unwrap());
    assert_eq!(fx.eval("'(a b)").unwrap(), read("(a b)").unwrap());
}

// --- list ---

#[test]
fn list_creates_the_empty_list() {
    let fx = Fixture::new();
    assert_eq!(fx.eval("(list)").unwrap(), read("()").unwrap());
}

#[test]
fn list_creates_a_unary_list() {
    let fx = Fixture::new();
    assert_eq!(fx.eval("(list \"trent\")").unwrap(), read("(\"trent\")").unwrap());
    assert_eq!(
        fx.eval("(list true)").unwrap(),
        Value::list(vec![Value::Boolean(true)])
    );
}

#[test]
fn list_creates_an_n_ary_list() {
    let fx = Fixture::new();
    let form = Value::list(std::iter::once(Value::symbol("list")).chain((1..=50).map(Value::Integer)));
    assert_eq!(
        fx.evaluator.evaluate(&fx.context, &form).unwrap(),
        Value::list((1..=50).map(Value::Integer))
    );
}

// --- fn ---

#[test]
fn fn_creates_a_new_function() {
    let fx = Fixture::new();
    let f = fx.eval("(fn [] \"Mystik Spiral\")").unwrap();
    assert!(matches!(f, Value::Function(_)));
    assert_eq!(fx.evaluator.call(&f, vec![], None).unwrap(), s("Mystik Spiral"));

    // A function value in head position is applied directly
    let form = Value::list(vec![f]);
    assert_eq!(
        fx.evaluator.evaluate(&fx.context, &form).unwrap(),
        s("Mystik Spiral")
    );
}

#[test]
fn fn_checks_fixed_arity() {
    let fx = Fixture::new();
    let err = fx.call("(fn [])", vec![Value::Boolean(true)]).unwrap_err();
    assert_eq!(err.to_string(), "wrong number of arguments (1 for 0)");

    let err = fx
        .call("(fn [a b c])", vec![Value::symbol("x"), Value::symbol("y")])
        .unwrap_err();
    assert_eq!(err.to_string(), "wrong number of arguments (2 for 3)");
}

#[test]
fn fn_with_rest_accepts_any_extra_count() {
    let fx = Fixture::new();
    for n in [0, 1, 3, 10_000] {
        let args: Vec<Value> = (1..=n).map(Value::Integer).collect();
        let rest = fx.call("(fn [& rest] rest)", args).unwrap();
        match rest {
            Value::List(list) => assert_eq!(list.len(), n as usize),
            other => panic!("expected a list, got {}", other),
        }
    }
}

#[test]
fn fn_with_rest_still_requires_fixed_args() {
    let fx = Fixture::new();
    let err = fx.call("(fn [a b & rest] rest)", vec![Value::Integer(1)]).unwrap_err();
    assert_eq!(err.to_string(), "wrong number of arguments (1 for 2)");
}

#[test]
fn fn_binds_place_arguments() {
    let fx = Fixture::new();
    assert_eq!(
        fx.call("(fn [a] a)", vec![Value::symbol("zzz")]).unwrap(),
        Value::symbol("zzz")
    );
    assert_eq!(
        fx.call(
            "(fn [a b] (list a b))",
            vec![Value::symbol("daria"), Value::symbol("morgendorffer")]
        )
        .unwrap(),
        read("(daria morgendorffer)").unwrap()
    );
}

#[test]
fn fn_binds_rest_arguments() {
    let fx = Fixture::new();
    let result = fx
        .call(
            "(fn (y z & rest) (list y z rest))",
            vec![s("where"), s("is"), s("mordialloc"), s("gosh")],
        )
        .unwrap();
    assert_eq!(
        result,
        read("(\"where\" \"is\" (\"mordialloc\" \"gosh\"))").unwrap()
    );
}

#[test]
fn fn_binds_block_arguments() {
    let fx = Fixture::new();
    let (block, _) = counting("blk", Value::Nil);
    let f = fx.eval("(fn (a | b) [a b])").unwrap();
    let result = fx
        .evaluator
        .call(&f, vec![s("hello")], Some(block.clone()))
        .unwrap();
    assert_eq!(result, Value::Vector(vec![s("hello"), block]));

    // No block binds nil, and the block never counts toward arity
    let result = fx.evaluator.call(&f, vec![s("hello")], None).unwrap();
    assert_eq!(result, Value::Vector(vec![s("hello"), Value::Nil]));
}

#[test]
fn fn_closes_over_its_defining_context() {
    let fx = Fixture::new();
    let f = fx.eval("(let [x 1] (fn [] x))").unwrap();
    let caller = Context::child(&fx.context);
    caller.set_here(&Symbol::new("x"), Value::Integer(2)).unwrap();
    caller.set_here(&Symbol::new("f"), f).unwrap();
    assert_eq!(fx.eval_in(&caller, "(f)").unwrap(), Value::Integer(1));
}

// --- def ---

#[test]
fn def_makes_a_binding() {
    let fx = Fixture::new();
    assert_eq!(
        fx.eval("(def barge 'a)").unwrap(),
        read("user.spec/barge").unwrap()
    );
    assert_eq!(fx.eval("barge").unwrap(), read("a").unwrap());
    assert_eq!(fx.eval("user.spec/barge").unwrap(), read("a").unwrap());
}

#[test]
fn def_always_binds_at_the_top_of_the_namespace() {
    let fx = Fixture::new();
    let subcontext = Context::child(&fx.context);
    assert_eq!(
        fx.eval_in(&subcontext, "(def sarge 'b)").unwrap(),
        read("user.spec/sarge").unwrap()
    );
    assert_eq!(fx.eval("sarge").unwrap(), read("b").unwrap());
}

#[test]
fn def_inside_a_let_still_lands_in_the_namespace() {
    let fx = Fixture::new();
    fx.eval("(let [x 5] (def y x))").unwrap();
    assert_eq!(fx.eval("y").unwrap(), Value::Integer(5));
    assert!(fx.eval("x").is_err());
}

// --- if ---

#[test]
fn if_executes_one_branch_or_the_other() {
    let fx = Fixture::new();
    let (a, a_calls) = counting("a", Value::Nil);
    let (b, b_calls) = counting("b", Value::Nil);
    let subcontext = Context::child(&fx.context);
    subcontext.set_here(&Symbol::new("a"), a).unwrap();
    subcontext.set_here(&Symbol::new("b"), b).unwrap();

    fx.eval_in(&subcontext, "(if true (a) (b))").unwrap();
    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b_calls.load(Ordering::SeqCst), 0);

    fx.eval_in(&subcontext, "(if false (a) (b))").unwrap();
    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
    assert_eq!(b_calls.load(Ordering::SeqCst), 1);
}

#[test]
fn if_without_a_second_branch_does_nothing() {
    let fx = Fixture::new();
    assert_eq!(fx.eval("(if false (a))").unwrap(), Value::Nil);
}

// --- do ---

#[test]
fn do_returns_nil_with_no_arguments() {
    let fx = Fixture::new();
    assert_eq!(fx.eval("(do)").unwrap(), Value::Nil);
}

#[test]
fn do_evaluates_and_returns_one_argument() {
    let fx = Fixture::new();
    let (x, _) = counting("x", Value::Integer(4));
    let subcontext = Context::child(&fx.context);
    subcontext.set_here(&Symbol::new("x"), x).unwrap();
    assert_eq!(fx.eval_in(&subcontext, "(do (x))").unwrap(), Value::Integer(4));
}

#[test]
fn do_evaluates_every_argument_and_returns_the_last() {
    let fx = Fixture::new();
    let (a, a_calls) = counting("a", Value::Nil);
    let (b, _) = counting("b", Value::Integer(7));
    let subcontext = Context::child(&fx.context);
    subcontext.set_here(&Symbol::new("a"), a).unwrap();
    subcontext.set_here(&Symbol::new("b"), b).unwrap();
    assert_eq!(fx.eval_in(&subcontext, "(do (a) (b))").unwrap(), Value::Integer(7));
    assert_eq!(a_calls.load(Ordering::SeqCst), 1);
}

// --- ns ---

#[test]
fn ns_creates_a_new_context_pointing_at_the_namespace() {
    let fx = Fixture::new();
    assert!(fx.registry.get("user.spec2").unwrap().is_none());

    fx.eval("(do (ns user.spec2) (def nope 8))").unwrap();

    let spec2 = fx.registry.get("user.spec2").unwrap().unwrap();
    assert_eq!(spec2.get("nope").unwrap(), Value::Integer(8));
    assert_eq!(
        fx.context.lookup(&Symbol::new("nope")),
        Err(EvalError::BindingNotFound(Symbol::new("nope")))
    );
}

#[test]
fn ns_does_not_leak_into_later_definitions() {
    let fx = Fixture::new();
    fx.eval("(do (ns elsewhere) (def x 1))").unwrap();
    assert_eq!(fx.eval("(def y 2)").unwrap(), read("user.spec/y").unwrap());
    assert_eq!(fx.eval("elsewhere/x").unwrap(), Value::Integer(1));
}

#[test]
fn ns_returns_the_namespace_name() {
    let fx = Fixture::new();
    assert_eq!(fx.eval("(ns fresh)").unwrap(), Value::symbol("fresh"));
    assert!(fx.registry.get("fresh").unwrap().is_some());
}

// --- defmacro ---

#[test]
fn defmacro_returns_a_reference_to_the_macro() {
    let fx = Fixture::new();
    assert_eq!(
        fx.eval("(defmacro a [] 'b)").unwrap(),
        Value::symbol("user.spec/a")
    );
}

#[test]
fn defmacro_body_evaluates_in_the_defining_context() {
    let fx = Fixture::new();
    fx.eval("(defmacro a [] b)").unwrap();

    let err = fx.eval("(a)").unwrap_err();
    assert_eq!(err, EvalError::BindingNotFound(Symbol::new("b")));
    assert_eq!(err.to_string(), "b");

    // A caller-local `b` is not visible to the macro body
    let err = fx.eval("(let [b 4] (a))").unwrap_err();
    assert_eq!(err, EvalError::BindingNotFound(Symbol::new("b")));

    fx.eval("(def b 'c)").unwrap();
    assert!(fx.eval("(defmacro a [] b)").is_ok());
}

#[test]
fn defmacro_expansion_evaluates_in_the_calling_context() {
    let fx = Fixture::new();
    fx.eval("(def b 'c)").unwrap();
    fx.eval("(defmacro a [] b)").unwrap();

    let err = fx.eval("(a)").unwrap_err();
    assert_eq!(err, EvalError::BindingNotFound(Symbol::new("c")));
    assert_eq!(err.to_string(), "c");

    assert_eq!(fx.eval("(let [c 9] (a))").unwrap(), Value::Integer(9));
}

#[test]
fn macros_receive_unevaluated_forms() {
    let fx = Fixture::new();
    fx.eval("(defmacro unless [c then & more] (list 'if c (list 'do) then))").unwrap();
    assert_eq!(fx.eval("(unless false 1)").unwrap(), Value::Integer(1));
    assert_eq!(fx.eval("(unless true (undefined-thing))").unwrap(), Value::Nil);
}

// --- apply ---

fn apply_fixture() -> (Fixture, Arc<Context>) {
    let fx = Fixture::new();
    let subcontext = Context::child(&fx.context);
    let collect = NativeProcedure::new("a", Arity::Variadic(0), |_, args, _| Ok(Value::Vector(args)));
    subcontext
        .set_here(&Symbol::new("a"), Value::Native(collect))
        .unwrap();
    (fx, subcontext)
}

fn ints(values: &[i64]) -> Value {
    Value::Vector(values.iter().copied().map(Value::Integer).collect())
}

#[test]
fn apply_calls_a_function_with_the_argument_list() {
    let (fx, sub) = apply_fixture();
    assert_eq!(fx.eval_in(&sub, "(apply a [1 2 3])").unwrap(), ints(&[1, 2, 3]));
    assert_eq!(fx.eval_in(&sub, "(apply a '(1 2 3))").unwrap(), ints(&[1, 2, 3]));
    assert_eq!(fx.eval_in(&sub, "(apply a 1 2 3 [])").unwrap(), ints(&[1, 2, 3]));
}

#[test]
fn apply_calls_a_function_with_intermediate_arguments() {
    let (fx, sub) = apply_fixture();
    assert_eq!(
        fx.eval_in(&sub, "(apply a 8 9 [1 2 3])").unwrap(),
        ints(&[8, 9, 1, 2, 3])
    );
    assert_eq!(
        fx.eval_in(&sub, "(apply a 8 9 '(1 2 3))").unwrap(),
        ints(&[8, 9, 1, 2, 3])
    );
}

#[test]
fn apply_works_with_user_functions() {
    let fx = Fixture::new();
    assert_eq!(
        fx.eval("(apply (fn [x & more] (list more x)) 1 '(2 3))").unwrap(),
        read("((2 3) 1)").unwrap()
    );
}
