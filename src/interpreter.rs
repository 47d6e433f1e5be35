//! Reference evaluator: walks an expression tree and produces a [`Value`].

use crate::{
    expr::{
        AssignExpr, BinaryExpr, CallExpr, Expr, GetExpr, GroupingExpr, LiteralExpr, LogicalExpr,
        SetExpr, SuperExpr, ThisExpr, UnaryExpr, VariableExpr, Visitor,
    },
    globals::Globals,
    token::{Token, TokenType},
    value::Value,
};

#[derive(Debug, Clone, thiserror::Error)]
pub enum RuntimeError {
    #[error("Line {}: Runtime Error: Division by zero: {}", .0.line, .0.lexeme)]
    DivisionByZero(Token),
    #[error("Line {}: Runtime Error: Undefined variable '{}'", .0.line, .0.lexeme)]
    UndefinedVariable(Token),
    #[error("Line {}: Runtime Error: Undefined property '{}'", .0.line, .0.lexeme)]
    UndefinedProperty(Token),
    #[error("Line {}: Runtime Error: Unexpected type for '{}': {}", .0.line, .0.lexeme, .1)]
    UnexpectedType(Token, String),
    #[error("Line {}: Runtime Error: Unknown operator '{}'", .0.line, .0.lexeme)]
    UnknownOperator(Token),
    #[error("Line {}: Runtime Error: Can only call functions and classes.", .0.line)]
    NotCallable(Token),
    #[error(
        "Line {}: Runtime Error: Expected {expected} arguments but got {found}.",
        .paren.line
    )]
    ArityMismatch {
        paren: Token,
        expected: usize,
        found: usize,
    },
    #[error("Line {}: Runtime Error: Can't use 'this' outside of a class.", .0.line)]
    InvalidThis(Token),
    #[error(
        "Line {}: Runtime Error: Can't use 'super' outside of a class with a superclass.",
        .0.line
    )]
    InvalidSuper(Token),
    #[error("Runtime Error: Expression nesting exceeds the limit of {0}.")]
    NestingTooDeep(usize),
    #[error("Runtime Error: {0}")]
    Native(String),
}

fn unexpected(operator: &Token, message: &str) -> RuntimeError {
    RuntimeError::UnexpectedType(operator.clone(), message.to_string())
}

#[derive(Default)]
pub struct Interpreter {
    globals: Globals,
    receiver: Option<Value>,
    max_depth: Option<usize>,
    depth: usize,
    evaluated: usize,
}

impl Interpreter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail with [`RuntimeError::NestingTooDeep`] instead of descending more
    /// than `limit` nodes deep.
    pub fn with_max_depth(mut self, limit: usize) -> Self {
        self.max_depth = Some(limit);
        self
    }

    /// The value `this` evaluates to.
    pub fn with_receiver(mut self, receiver: Value) -> Self {
        self.receiver = Some(receiver);
        self
    }

    pub fn with_globals(mut self, globals: Globals) -> Self {
        self.globals = globals;
        self
    }

    pub fn globals(&self) -> &Globals {
        &self.globals
    }

    pub fn globals_mut(&mut self) -> &mut Globals {
        &mut self.globals
    }

    /// Total number of nodes visited since this interpreter was created.
    pub fn nodes_evaluated(&self) -> usize {
        self.evaluated
    }

    pub fn interpret(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        tracing::trace!(kind = expr.kind_name(), "interpreting expression");
        self.depth = 0;
        let result = self.evaluate(expr);
        if let Err(error) = &result {
            tracing::debug!(%error, "evaluation failed");
        }
        result
    }

    fn evaluate(&mut self, expr: &Expr) -> Result<Value, RuntimeError> {
        if let Some(limit) = self.max_depth {
            if self.depth >= limit {
                return Err(RuntimeError::NestingTooDeep(limit));
            }
        }
        self.depth += 1;
        self.evaluated += 1;
        let result = expr.accept(self);
        self.depth -= 1;
        result
    }

    fn number_operands(
        operator: &Token,
        left: &Value,
        right: &Value,
    ) -> Result<(f64, f64), RuntimeError> {
        match (left, right) {
            (Value::Number(l), Value::Number(r)) => Ok((*l, *r)),
            _ => Err(unexpected(operator, "Operands must be numbers.")),
        }
    }
}

impl Visitor for Interpreter {
    type Output = Value;
    type Error = RuntimeError;

    fn visit_assign(&mut self, expr: &AssignExpr) -> Result<Value, RuntimeError> {
        let value = self.evaluate(expr.value())?;
        self.globals.assign(expr.name(), value.clone())?;
        Ok(value)
    }

    fn visit_binary(&mut self, expr: &BinaryExpr) -> Result<Value, RuntimeError> {
        let left = self.evaluate(expr.left())?;
        let right = self.evaluate(expr.right())?;
        let operator = expr.operator();

        match operator.token_type {
            TokenType::Plus => match (left, right) {
                (Value::Number(l), Value::Number(r)) => Ok(Value::Number(l + r)),
                (Value::String(l), Value::String(r)) => Ok(Value::String(l + &r)),
                _ => Err(unexpected(
                    operator,
                    "Operands must be two numbers or two strings.",
                )),
            },
            TokenType::Minus => {
                let (l, r) = Self::number_operands(operator, &left, &right)?;
                Ok(Value::Number(l - r))
            }
            TokenType::Star => {
                let (l, r) = Self::number_operands(operator, &left, &right)?;
                Ok(Value::Number(l * r))
            }
            TokenType::Slash => {
                let (l, r) = Self::number_operands(operator, &left, &right)?;
                if r == 0.0 {
                    return Err(RuntimeError::DivisionByZero(operator.clone()));
                }
                Ok(Value::Number(l / r))
            }
            TokenType::Greater => {
                let (l, r) = Self::number_operands(operator, &left, &right)?;
                Ok(Value::Boolean(l > r))
            }
            TokenType::GreaterEqual => {
                let (l, r) = Self::number_operands(operator, &left, &right)?;
                Ok(Value::Boolean(l >= r))
            }
            TokenType::Less => {
                let (l, r) = Self::number_operands(operator, &left, &right)?;
                Ok(Value::Boolean(l < r))
            }
            TokenType::LessEqual => {
                let (l, r) = Self::number_operands(operator, &left, &right)?;
                Ok(Value::Boolean(l <= r))
            }
            TokenType::EqualEqual => Ok(Value::Boolean(left == right)),
            TokenType::BangEqual => Ok(Value::Boolean(left != right)),
            _ => Err(RuntimeError::UnknownOperator(operator.clone())),
        }
    }

    fn visit_call(&mut self, expr: &CallExpr) -> Result<Value, RuntimeError> {
        let callee = self.evaluate(expr.callee())?;
        let arguments = expr
            .arguments()
            .iter()
            .map(|argument| self.evaluate(argument))
            .collect::<Result<Vec<_>, _>>()?;

        let Value::Callable(function) = callee else {
            return Err(RuntimeError::NotCallable(expr.paren().clone()));
        };
        if arguments.len() != function.arity() {
            return Err(RuntimeError::ArityMismatch {
                paren: expr.paren().clone(),
                expected: function.arity(),
                found: arguments.len(),
            });
        }
        function.call(arguments)
    }

    fn visit_get(&mut self, expr: &GetExpr) -> Result<Value, RuntimeError> {
        match self.evaluate(expr.object())? {
            Value::Instance(instance) => instance
                .get(&expr.name().lexeme)
                .ok_or_else(|| RuntimeError::UndefinedProperty(expr.name().clone())),
            _ => Err(unexpected(expr.name(), "Only instances have properties.")),
        }
    }

    fn visit_grouping(&mut self, expr: &GroupingExpr) -> Result<Value, RuntimeError> {
        self.evaluate(expr.expression())
    }

    fn visit_literal(&mut self, expr: &LiteralExpr) -> Result<Value, RuntimeError> {
        Ok(expr.value().clone())
    }

    fn visit_logical(&mut self, expr: &LogicalExpr) -> Result<Value, RuntimeError> {
        let left = self.evaluate(expr.left())?;
        let short_circuits = match expr.operator().token_type {
            TokenType::Or => left.is_truthy(),
            TokenType::And => !left.is_truthy(),
            _ => return Err(RuntimeError::UnknownOperator(expr.operator().clone())),
        };
        if short_circuits {
            Ok(left)
        } else {
            self.evaluate(expr.right())
        }
    }

    fn visit_set(&mut self, expr: &SetExpr) -> Result<Value, RuntimeError> {
        let Value::Instance(instance) = self.evaluate(expr.object())? else {
            return Err(unexpected(expr.name(), "Only instances have fields."));
        };
        let value = self.evaluate(expr.value())?;
        instance.set(expr.name().lexeme.clone(), value.clone());
        Ok(value)
    }

    fn visit_super(&mut self, expr: &SuperExpr) -> Result<Value, RuntimeError> {
        Err(RuntimeError::InvalidSuper(expr.keyword().clone()))
    }

    fn visit_this(&mut self, expr: &ThisExpr) -> Result<Value, RuntimeError> {
        self.receiver
            .clone()
            .ok_or_else(|| RuntimeError::InvalidThis(expr.keyword().clone()))
    }

    fn visit_unary(&mut self, expr: &UnaryExpr) -> Result<Value, RuntimeError> {
        let right = self.evaluate(expr.right())?;
        let operator = expr.operator();
        match operator.token_type {
            TokenType::Minus => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => Err(unexpected(operator, "Operand must be a number.")),
            },
            TokenType::Bang => Ok(Value::Boolean(!right.is_truthy())),
            _ => Err(RuntimeError::UnknownOperator(operator.clone())),
        }
    }

    fn visit_variable(&mut self, expr: &VariableExpr) -> Result<Value, RuntimeError> {
        self.globals.get(expr.name())
    }
}
