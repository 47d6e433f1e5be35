//! Expression nodes and the visitor that walks them.
//!
//! The node set is closed: [`Expr`] has one variant per syntactic form, each
//! wrapping a payload struct whose fields can only be read. Children are
//! boxed and owned by their parent, so a tree can never share a subtree or
//! contain a cycle.
//!
//! Passes implement [`Visitor`] and call [`Expr::accept`] on the root. The
//! visitor decides when to descend into children; the node only picks the
//! matching `visit_*` method and hands back whatever it returns.

use std::{fmt, mem};

use crate::{stack::ensure_sufficient_stack, token::Token, value::Value};

/// One operation over every kind of expression.
///
/// Every method is required, so a pass that forgets a node kind does not
/// compile:
///
/// ```compile_fail
/// use lox_ast::expr::{AssignExpr, Visitor};
///
/// struct OnlyAssignments;
///
/// impl Visitor for OnlyAssignments {
///     type Output = ();
///     type Error = ();
///
///     fn visit_assign(&mut self, _expr: &AssignExpr) -> Result<(), ()> {
///         Ok(())
///     }
/// }
/// ```
pub trait Visitor {
    type Output;
    type Error;

    fn visit_assign(&mut self, expr: &AssignExpr) -> Result<Self::Output, Self::Error>;
    fn visit_binary(&mut self, expr: &BinaryExpr) -> Result<Self::Output, Self::Error>;
    fn visit_call(&mut self, expr: &CallExpr) -> Result<Self::Output, Self::Error>;
    fn visit_get(&mut self, expr: &GetExpr) -> Result<Self::Output, Self::Error>;
    fn visit_grouping(&mut self, expr: &GroupingExpr) -> Result<Self::Output, Self::Error>;
    fn visit_literal(&mut self, expr: &LiteralExpr) -> Result<Self::Output, Self::Error>;
    fn visit_logical(&mut self, expr: &LogicalExpr) -> Result<Self::Output, Self::Error>;
    fn visit_set(&mut self, expr: &SetExpr) -> Result<Self::Output, Self::Error>;
    fn visit_super(&mut self, expr: &SuperExpr) -> Result<Self::Output, Self::Error>;
    fn visit_this(&mut self, expr: &ThisExpr) -> Result<Self::Output, Self::Error>;
    fn visit_unary(&mut self, expr: &UnaryExpr) -> Result<Self::Output, Self::Error>;
    fn visit_variable(&mut self, expr: &VariableExpr) -> Result<Self::Output, Self::Error>;
}

pub enum Expr {
    Assign(AssignExpr),
    Binary(BinaryExpr),
    Call(CallExpr),
    Get(GetExpr),
    Grouping(GroupingExpr),
    Literal(LiteralExpr),
    Logical(LogicalExpr),
    Set(SetExpr),
    Super(SuperExpr),
    This(ThisExpr),
    Unary(UnaryExpr),
    Variable(VariableExpr),
}

impl Expr {
    pub fn assign(name: Token, value: Expr) -> Self {
        AssignExpr::new(name, value).into()
    }

    pub fn binary(left: Expr, operator: Token, right: Expr) -> Self {
        BinaryExpr::new(left, operator, right).into()
    }

    pub fn call(callee: Expr, paren: Token, arguments: Vec<Expr>) -> Self {
        CallExpr::new(callee, paren, arguments).into()
    }

    pub fn get(name: Token, object: Expr) -> Self {
        GetExpr::new(name, object).into()
    }

    pub fn grouping(expression: Expr) -> Self {
        GroupingExpr::new(expression).into()
    }

    pub fn literal(value: impl Into<Value>) -> Self {
        LiteralExpr::new(value.into()).into()
    }

    pub fn logical(left: Expr, operator: Token, right: Expr) -> Self {
        LogicalExpr::new(left, operator, right).into()
    }

    pub fn set(name: Token, object: Expr, value: Expr) -> Self {
        SetExpr::new(name, object, value).into()
    }

    pub fn super_method(keyword: Token, method: Token) -> Self {
        SuperExpr::new(keyword, method).into()
    }

    pub fn this(keyword: Token) -> Self {
        ThisExpr::new(keyword).into()
    }

    pub fn unary(operator: Token, right: Expr) -> Self {
        UnaryExpr::new(operator, right).into()
    }

    pub fn variable(name: Token) -> Self {
        VariableExpr::new(name).into()
    }

    /// Dispatch to the visitor method for this node's kind.
    ///
    /// The visitor's result or error is returned as is. The stack is grown
    /// first if needed, so visitors that recurse through `accept` can handle
    /// arbitrarily deep trees.
    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        ensure_sufficient_stack(|| match self {
            Expr::Assign(expr) => expr.accept(visitor),
            Expr::Binary(expr) => expr.accept(visitor),
            Expr::Call(expr) => expr.accept(visitor),
            Expr::Get(expr) => expr.accept(visitor),
            Expr::Grouping(expr) => expr.accept(visitor),
            Expr::Literal(expr) => expr.accept(visitor),
            Expr::Logical(expr) => expr.accept(visitor),
            Expr::Set(expr) => expr.accept(visitor),
            Expr::Super(expr) => expr.accept(visitor),
            Expr::This(expr) => expr.accept(visitor),
            Expr::Unary(expr) => expr.accept(visitor),
            Expr::Variable(expr) => expr.accept(visitor),
        })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Assign(_) => "assign",
            Expr::Binary(_) => "binary",
            Expr::Call(_) => "call",
            Expr::Get(_) => "get",
            Expr::Grouping(_) => "grouping",
            Expr::Literal(_) => "literal",
            Expr::Logical(_) => "logical",
            Expr::Set(_) => "set",
            Expr::Super(_) => "super",
            Expr::This(_) => "this",
            Expr::Unary(_) => "unary",
            Expr::Variable(_) => "variable",
        }
    }

    /// Direct children, left to right in evaluation order.
    pub fn children(&self) -> Children<'_> {
        let (head, rest): ([Option<&Expr>; 2], &[Expr]) = match self {
            Expr::Assign(expr) => ([Some(expr.value()), None], &[]),
            Expr::Binary(expr) => ([Some(expr.left()), Some(expr.right())], &[]),
            Expr::Call(expr) => ([Some(expr.callee()), None], expr.arguments()),
            Expr::Get(expr) => ([Some(expr.object()), None], &[]),
            Expr::Grouping(expr) => ([Some(expr.expression()), None], &[]),
            Expr::Logical(expr) => ([Some(expr.left()), Some(expr.right())], &[]),
            Expr::Set(expr) => ([Some(expr.object()), Some(expr.value())], &[]),
            Expr::Unary(expr) => ([Some(expr.right()), None], &[]),
            Expr::Literal(_) | Expr::Super(_) | Expr::This(_) | Expr::Variable(_) => {
                ([None, None], &[])
            }
        };
        Children {
            head,
            index: 0,
            rest: rest.iter(),
        }
    }

    /// Pre-order walk of this node and everything below it.
    ///
    /// Uses an explicit stack, so it is safe on trees too deep to recurse.
    pub fn descendants(&self) -> Descendants<'_> {
        Descendants { stack: vec![self] }
    }

    pub fn node_count(&self) -> usize {
        self.descendants().count()
    }

    /// Length of the longest root-to-leaf path; a lone leaf has depth 1.
    pub fn depth(&self) -> usize {
        let mut deepest = 0;
        let mut stack = vec![(self, 1)];
        while let Some((expr, depth)) = stack.pop() {
            deepest = deepest.max(depth);
            stack.extend(expr.children().map(|child| (child, depth + 1)));
        }
        deepest
    }

    fn placeholder() -> Self {
        Expr::Literal(LiteralExpr { value: Value::Nil })
    }

    /// Move this node's children into `out`, leaving leaves in their place.
    fn detach_children(&mut self, out: &mut Vec<Expr>) {
        fn take(slot: &mut Expr) -> Expr {
            mem::replace(slot, Expr::placeholder())
        }

        match self {
            Expr::Assign(expr) => out.push(take(&mut expr.value)),
            Expr::Binary(expr) => {
                out.push(take(&mut expr.left));
                out.push(take(&mut expr.right));
            }
            Expr::Call(expr) => {
                out.push(take(&mut expr.callee));
                out.append(&mut expr.arguments);
            }
            Expr::Get(expr) => out.push(take(&mut expr.object)),
            Expr::Grouping(expr) => out.push(take(&mut expr.expression)),
            Expr::Logical(expr) => {
                out.push(take(&mut expr.left));
                out.push(take(&mut expr.right));
            }
            Expr::Set(expr) => {
                out.push(take(&mut expr.object));
                out.push(take(&mut expr.value));
            }
            Expr::Unary(expr) => out.push(take(&mut expr.right)),
            Expr::Literal(_) | Expr::Super(_) | Expr::This(_) | Expr::Variable(_) => {}
        }
    }
}

// The payload derives recurse back into these through their boxed children,
// so each level gets a stack check before descending.
impl Clone for Expr {
    fn clone(&self) -> Self {
        ensure_sufficient_stack(|| match self {
            Expr::Assign(expr) => Expr::Assign(expr.clone()),
            Expr::Binary(expr) => Expr::Binary(expr.clone()),
            Expr::Call(expr) => Expr::Call(expr.clone()),
            Expr::Get(expr) => Expr::Get(expr.clone()),
            Expr::Grouping(expr) => Expr::Grouping(expr.clone()),
            Expr::Literal(expr) => Expr::Literal(expr.clone()),
            Expr::Logical(expr) => Expr::Logical(expr.clone()),
            Expr::Set(expr) => Expr::Set(expr.clone()),
            Expr::Super(expr) => Expr::Super(expr.clone()),
            Expr::This(expr) => Expr::This(expr.clone()),
            Expr::Unary(expr) => Expr::Unary(expr.clone()),
            Expr::Variable(expr) => Expr::Variable(expr.clone()),
        })
    }
}

impl PartialEq for Expr {
    fn eq(&self, other: &Self) -> bool {
        ensure_sufficient_stack(|| match (self, other) {
            (Expr::Assign(a), Expr::Assign(b)) => a == b,
            (Expr::Binary(a), Expr::Binary(b)) => a == b,
            (Expr::Call(a), Expr::Call(b)) => a == b,
            (Expr::Get(a), Expr::Get(b)) => a == b,
            (Expr::Grouping(a), Expr::Grouping(b)) => a == b,
            (Expr::Literal(a), Expr::Literal(b)) => a == b,
            (Expr::Logical(a), Expr::Logical(b)) => a == b,
            (Expr::Set(a), Expr::Set(b)) => a == b,
            (Expr::Super(a), Expr::Super(b)) => a == b,
            (Expr::This(a), Expr::This(b)) => a == b,
            (Expr::Unary(a), Expr::Unary(b)) => a == b,
            (Expr::Variable(a), Expr::Variable(b)) => a == b,
            _ => false,
        })
    }
}

impl fmt::Debug for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        ensure_sufficient_stack(|| match self {
            Expr::Assign(expr) => f.debug_tuple("Assign").field(expr).finish(),
            Expr::Binary(expr) => f.debug_tuple("Binary").field(expr).finish(),
            Expr::Call(expr) => f.debug_tuple("Call").field(expr).finish(),
            Expr::Get(expr) => f.debug_tuple("Get").field(expr).finish(),
            Expr::Grouping(expr) => f.debug_tuple("Grouping").field(expr).finish(),
            Expr::Literal(expr) => f.debug_tuple("Literal").field(expr).finish(),
            Expr::Logical(expr) => f.debug_tuple("Logical").field(expr).finish(),
            Expr::Set(expr) => f.debug_tuple("Set").field(expr).finish(),
            Expr::Super(expr) => f.debug_tuple("Super").field(expr).finish(),
            Expr::This(expr) => f.debug_tuple("This").field(expr).finish(),
            Expr::Unary(expr) => f.debug_tuple("Unary").field(expr).finish(),
            Expr::Variable(expr) => f.debug_tuple("Variable").field(expr).finish(),
        })
    }
}

// Dropping a long chain of boxes recursively would overflow the stack, so
// children are unlinked onto a work list and released one at a time.
impl Drop for Expr {
    fn drop(&mut self) {
        let mut pending = Vec::new();
        self.detach_children(&mut pending);
        while let Some(mut expr) = pending.pop() {
            expr.detach_children(&mut pending);
        }
    }
}

pub struct Children<'a> {
    head: [Option<&'a Expr>; 2],
    index: usize,
    rest: std::slice::Iter<'a, Expr>,
}

impl<'a> Iterator for Children<'a> {
    type Item = &'a Expr;

    fn next(&mut self) -> Option<Self::Item> {
        while self.index < self.head.len() {
            let slot = self.head[self.index];
            self.index += 1;
            if slot.is_some() {
                return slot;
            }
        }
        self.rest.next()
    }
}

pub struct Descendants<'a> {
    stack: Vec<&'a Expr>,
}

impl<'a> Iterator for Descendants<'a> {
    type Item = &'a Expr;

    fn next(&mut self) -> Option<Self::Item> {
        let expr = self.stack.pop()?;
        let start = self.stack.len();
        self.stack.extend(expr.children());
        self.stack[start..].reverse();
        Some(expr)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AssignExpr {
    name: Token,
    value: Box<Expr>,
}

impl AssignExpr {
    pub fn new(name: Token, value: Expr) -> Self {
        Self {
            name,
            value: Box::new(value),
        }
    }

    pub fn name(&self) -> &Token {
        &self.name
    }

    pub fn value(&self) -> &Expr {
        &self.value
    }

    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_assign(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BinaryExpr {
    left: Box<Expr>,
    operator: Token,
    right: Box<Expr>,
}

impl BinaryExpr {
    pub fn new(left: Expr, operator: Token, right: Expr) -> Self {
        Self {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub fn left(&self) -> &Expr {
        &self.left
    }

    pub fn operator(&self) -> &Token {
        &self.operator
    }

    pub fn right(&self) -> &Expr {
        &self.right
    }

    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_binary(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    callee: Box<Expr>,
    paren: Token,
    arguments: Vec<Expr>,
}

impl CallExpr {
    /// `paren` is the closing parenthesis, kept for error locations.
    pub fn new(callee: Expr, paren: Token, arguments: Vec<Expr>) -> Self {
        Self {
            callee: Box::new(callee),
            paren,
            arguments,
        }
    }

    pub fn callee(&self) -> &Expr {
        &self.callee
    }

    pub fn paren(&self) -> &Token {
        &self.paren
    }

    pub fn arguments(&self) -> &[Expr] {
        &self.arguments
    }

    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_call(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GetExpr {
    name: Token,
    object: Box<Expr>,
}

impl GetExpr {
    pub fn new(name: Token, object: Expr) -> Self {
        Self {
            name,
            object: Box::new(object),
        }
    }

    pub fn name(&self) -> &Token {
        &self.name
    }

    pub fn object(&self) -> &Expr {
        &self.object
    }

    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_get(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct GroupingExpr {
    expression: Box<Expr>,
}

impl GroupingExpr {
    pub fn new(expression: Expr) -> Self {
        Self {
            expression: Box::new(expression),
        }
    }

    pub fn expression(&self) -> &Expr {
        &self.expression
    }

    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_grouping(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LiteralExpr {
    value: Value,
}

impl LiteralExpr {
    pub fn new(value: Value) -> Self {
        Self { value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_literal(self)
    }
}

/// `and` / `or`. Kept apart from [`BinaryExpr`] because the right operand
/// may never be evaluated.
#[derive(Debug, Clone, PartialEq)]
pub struct LogicalExpr {
    left: Box<Expr>,
    operator: Token,
    right: Box<Expr>,
}

impl LogicalExpr {
    pub fn new(left: Expr, operator: Token, right: Expr) -> Self {
        Self {
            left: Box::new(left),
            operator,
            right: Box::new(right),
        }
    }

    pub fn left(&self) -> &Expr {
        &self.left
    }

    pub fn operator(&self) -> &Token {
        &self.operator
    }

    pub fn right(&self) -> &Expr {
        &self.right
    }

    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_logical(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SetExpr {
    name: Token,
    object: Box<Expr>,
    value: Box<Expr>,
}

impl SetExpr {
    pub fn new(name: Token, object: Expr, value: Expr) -> Self {
        Self {
            name,
            object: Box::new(object),
            value: Box::new(value),
        }
    }

    pub fn name(&self) -> &Token {
        &self.name
    }

    pub fn object(&self) -> &Expr {
        &self.object
    }

    pub fn value(&self) -> &Expr {
        &self.value
    }

    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_set(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SuperExpr {
    keyword: Token,
    method: Token,
}

impl SuperExpr {
    pub fn new(keyword: Token, method: Token) -> Self {
        Self { keyword, method }
    }

    pub fn keyword(&self) -> &Token {
        &self.keyword
    }

    pub fn method(&self) -> &Token {
        &self.method
    }

    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_super(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ThisExpr {
    keyword: Token,
}

impl ThisExpr {
    pub fn new(keyword: Token) -> Self {
        Self { keyword }
    }

    pub fn keyword(&self) -> &Token {
        &self.keyword
    }

    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_this(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UnaryExpr {
    operator: Token,
    right: Box<Expr>,
}

impl UnaryExpr {
    pub fn new(operator: Token, right: Expr) -> Self {
        Self {
            operator,
            right: Box::new(right),
        }
    }

    pub fn operator(&self) -> &Token {
        &self.operator
    }

    pub fn right(&self) -> &Expr {
        &self.right
    }

    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_unary(self)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct VariableExpr {
    name: Token,
}

impl VariableExpr {
    pub fn new(name: Token) -> Self {
        Self { name }
    }

    pub fn name(&self) -> &Token {
        &self.name
    }

    pub fn accept<V: Visitor + ?Sized>(&self, visitor: &mut V) -> Result<V::Output, V::Error> {
        visitor.visit_variable(self)
    }
}

macro_rules! impl_from_payload {
    ($($payload:ident => $variant:ident),* $(,)?) => {
        $(
            impl From<$payload> for Expr {
                fn from(expr: $payload) -> Self {
                    Expr::$variant(expr)
                }
            }
        )*
    };
}

impl_from_payload! {
    AssignExpr => Assign,
    BinaryExpr => Binary,
    CallExpr => Call,
    GetExpr => Get,
    GroupingExpr => Grouping,
    LiteralExpr => Literal,
    LogicalExpr => Logical,
    SetExpr => Set,
    SuperExpr => Super,
    ThisExpr => This,
    UnaryExpr => Unary,
    VariableExpr => Variable,
}
