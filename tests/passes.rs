use lox_ast::{
    printer, value::NativeFunction, ClassKind, Expr, Interpreter, Resolver, RuntimeError, Token,
    TokenType, Value,
};
use pretty_assertions::assert_eq;
use proptest::prelude::*;

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_max_level(tracing::Level::TRACE)
        .with_test_writer()
        .try_init();
}

fn name(lexeme: &str) -> Token {
    Token::identifier(lexeme, 1)
}

fn op(token_type: TokenType, lexeme: &str) -> Token {
    Token::symbol(token_type, lexeme, 1)
}

fn negations(depth: usize, innermost: f64) -> Expr {
    let mut expr = Expr::literal(innermost);
    for _ in 0..depth {
        expr = Expr::unary(op(TokenType::Minus, "-"), expr);
    }
    expr
}

fn square(arguments: &[Value]) -> Result<Value, RuntimeError> {
    match arguments {
        [Value::Number(n)] => Ok(Value::Number(n * n)),
        _ => Err(RuntimeError::Native("square expects a number".to_string())),
    }
}

#[test]
fn three_passes_over_one_tree() {
    init_tracing();

    // square(this.side) >= limit or false
    let expr = Expr::logical(
        Expr::binary(
            Expr::call(
                Expr::variable(name("square")),
                op(TokenType::RightParen, ")"),
                vec![Expr::get(name("side"), Expr::this(op(TokenType::This, "this")))],
            ),
            op(TokenType::GreaterEqual, ">="),
            Expr::variable(name("limit")),
        ),
        op(TokenType::Or, "or"),
        Expr::literal(false),
    );

    assert_eq!(
        printer::print(&expr),
        "(logical left=(binary left=(call callee=(variable name=square) paren=) \
         args=[(get name=side object=(this keyword=this))]) op=>= right=(variable name=limit)) \
         op=or right=false)"
    );

    let mut resolver = Resolver::new();
    resolver.set_class_kind(ClassKind::Class);
    resolver.resolve(&expr).unwrap();
    let names: Vec<_> = resolver
        .bindings()
        .iter()
        .map(|binding| binding.name.lexeme.as_str())
        .collect();
    assert_eq!(names, vec!["square", "this", "limit"]);

    let square_box = lox_ast::value::Instance::new("Square");
    square_box.set("side", Value::Number(4.0));
    let mut interpreter = Interpreter::new().with_receiver(square_box.into_value());
    interpreter
        .globals_mut()
        .define("square", NativeFunction::new("square", 1, square).into_value());
    interpreter.globals_mut().define("limit", Value::Number(16.0));
    assert_eq!(interpreter.interpret(&expr).unwrap(), Value::Boolean(true));
}

#[test]
fn concurrent_evaluation_of_a_shared_tree() {
    let expr = negations(1_001, 7.0);
    let results: Vec<Value> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| Interpreter::new().interpret(&expr).unwrap()))
            .collect();
        handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .collect()
    });
    assert!(results.iter().all(|value| *value == Value::Number(-7.0)));
}

#[test]
fn very_deep_tree_evaluates_and_drops() {
    let expr = negations(50_000, 1.0);
    let mut interpreter = Interpreter::new();
    assert_eq!(interpreter.interpret(&expr).unwrap(), Value::Number(1.0));
    assert_eq!(interpreter.nodes_evaluated(), 50_001);
}

proptest! {
    #[test]
    fn negation_chain_matches_parity(depth in 0usize..64, n in -1000i32..1000) {
        let expr = negations(depth, f64::from(n));
        let mut interpreter = Interpreter::new();
        let expected = if depth % 2 == 0 { f64::from(n) } else { -f64::from(n) };
        prop_assert_eq!(interpreter.interpret(&expr).unwrap(), Value::Number(expected));
        prop_assert_eq!(interpreter.nodes_evaluated(), depth + 1);
    }

    #[test]
    fn binary_rendering_keeps_operands_in_place(a in -1000i32..1000, b in -1000i32..1000) {
        let expr = Expr::binary(
            Expr::literal(f64::from(a)),
            op(TokenType::Plus, "+"),
            Expr::literal(f64::from(b)),
        );
        prop_assert_eq!(
            printer::print(&expr),
            format!("(binary left={a} op=+ right={b})")
        );
    }

    #[test]
    fn failing_left_never_touches_right(right_value in -100i32..100) {
        let mut interpreter = Interpreter::new();
        interpreter.globals_mut().define("target", Value::Nil);
        let expr = Expr::binary(
            Expr::unary(op(TokenType::Minus, "-"), Expr::literal("not a number")),
            op(TokenType::Plus, "+"),
            Expr::assign(name("target"), Expr::literal(f64::from(right_value))),
        );
        let result = interpreter.interpret(&expr);
        prop_assert!(
            matches!(result, Err(RuntimeError::UnexpectedType(ref token, _)) if token.lexeme == "-"),
            "unexpected result: {:?}",
            result
        );
        prop_assert_eq!(interpreter.globals().get(&name("target")).unwrap(), Value::Nil);
        prop_assert_eq!(interpreter.nodes_evaluated(), 3);
    }
}
