//! Static resolution of variable references to scope distances.
//!
//! Statements are handled outside this crate, so the caller drives scopes and
//! class context (`begin_scope`, `declare`, `define`, `set_class_kind`) and
//! hands expressions to [`Resolver::resolve`] as it meets them.

use rustc_hash::FxHashMap;

use crate::{
    expr::{
        AssignExpr, BinaryExpr, CallExpr, Expr, GetExpr, GroupingExpr, LiteralExpr, LogicalExpr,
        SetExpr, SuperExpr, ThisExpr, UnaryExpr, VariableExpr, Visitor,
    },
    token::Token,
};

#[derive(Debug, Clone, thiserror::Error)]
pub enum ResolveError {
    #[error(
        "Line {}: Resolve Error: Already a variable named '{}' in this scope.",
        .0.line, .0.lexeme
    )]
    AlreadyDeclared(Token),
    #[error(
        "Line {}: Resolve Error: Can't read local variable '{}' in its own initializer.",
        .0.line, .0.lexeme
    )]
    ReadInOwnInitializer(Token),
    #[error("Line {}: Resolve Error: Can't use 'this' outside of a class.", .0.line)]
    ThisOutsideClass(Token),
    #[error("Line {}: Resolve Error: Can't use 'super' outside of a class.", .0.line)]
    SuperOutsideClass(Token),
    #[error(
        "Line {}: Resolve Error: Can't use 'super' in a class with no superclass.",
        .0.line
    )]
    SuperWithoutSuperclass(Token),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ClassKind {
    #[default]
    None,
    Class,
    Subclass,
}

/// Where a name reference points.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: Token,
    /// Number of scopes between the reference and its declaration; `None`
    /// when the name was not found locally and is assumed global.
    pub depth: Option<usize>,
}

#[derive(Default)]
pub struct Resolver {
    // name -> finished initializing
    scopes: Vec<FxHashMap<String, bool>>,
    class: ClassKind,
    bindings: Vec<Binding>,
}

impl Resolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin_scope(&mut self) {
        self.scopes.push(FxHashMap::default());
    }

    pub fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Names declared at the top level are globals and are not tracked.
    pub fn declare(&mut self, name: &Token) -> Result<(), ResolveError> {
        let Some(scope) = self.scopes.last_mut() else {
            return Ok(());
        };
        if scope.contains_key(&name.lexeme) {
            return Err(ResolveError::AlreadyDeclared(name.clone()));
        }
        scope.insert(name.lexeme.clone(), false);
        Ok(())
    }

    pub fn define(&mut self, name: &Token) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.insert(name.lexeme.clone(), true);
        }
    }

    /// Returns the previous kind so the caller can restore it when the class
    /// body ends.
    pub fn set_class_kind(&mut self, kind: ClassKind) -> ClassKind {
        std::mem::replace(&mut self.class, kind)
    }

    pub fn resolve(&mut self, expr: &Expr) -> Result<(), ResolveError> {
        let result = self.resolve_expr(expr);
        if let Err(error) = &result {
            tracing::debug!(%error, "resolution failed");
        }
        result
    }

    fn resolve_expr(&mut self, expr: &Expr) -> Result<(), ResolveError> {
        expr.accept(self)
    }

    /// Bindings in the order their references were visited.
    pub fn bindings(&self) -> &[Binding] {
        &self.bindings
    }

    pub fn into_bindings(self) -> Vec<Binding> {
        self.bindings
    }

    fn resolve_local(&mut self, name: &Token) {
        let depth = self
            .scopes
            .iter()
            .rev()
            .position(|scope| scope.contains_key(&name.lexeme));
        tracing::trace!(name = %name.lexeme, ?depth, "resolved reference");
        self.bindings.push(Binding {
            name: name.clone(),
            depth,
        });
    }
}

impl Visitor for Resolver {
    type Output = ();
    type Error = ResolveError;

    fn visit_assign(&mut self, expr: &AssignExpr) -> Result<(), ResolveError> {
        self.resolve_expr(expr.value())?;
        self.resolve_local(expr.name());
        Ok(())
    }

    fn visit_binary(&mut self, expr: &BinaryExpr) -> Result<(), ResolveError> {
        self.resolve_expr(expr.left())?;
        self.resolve_expr(expr.right())
    }

    fn visit_call(&mut self, expr: &CallExpr) -> Result<(), ResolveError> {
        self.resolve_expr(expr.callee())?;
        for argument in expr.arguments() {
            self.resolve_expr(argument)?;
        }
        Ok(())
    }

    fn visit_get(&mut self, expr: &GetExpr) -> Result<(), ResolveError> {
        self.resolve_expr(expr.object())
    }

    fn visit_grouping(&mut self, expr: &GroupingExpr) -> Result<(), ResolveError> {
        self.resolve_expr(expr.expression())
    }

    fn visit_literal(&mut self, _expr: &LiteralExpr) -> Result<(), ResolveError> {
        Ok(())
    }

    fn visit_logical(&mut self, expr: &LogicalExpr) -> Result<(), ResolveError> {
        self.resolve_expr(expr.left())?;
        self.resolve_expr(expr.right())
    }

    fn visit_set(&mut self, expr: &SetExpr) -> Result<(), ResolveError> {
        self.resolve_expr(expr.object())?;
        self.resolve_expr(expr.value())
    }

    fn visit_super(&mut self, expr: &SuperExpr) -> Result<(), ResolveError> {
        match self.class {
            ClassKind::None => Err(ResolveError::SuperOutsideClass(expr.keyword().clone())),
            ClassKind::Class => Err(ResolveError::SuperWithoutSuperclass(
                expr.keyword().clone(),
            )),
            ClassKind::Subclass => {
                self.resolve_local(expr.keyword());
                Ok(())
            }
        }
    }

    fn visit_this(&mut self, expr: &ThisExpr) -> Result<(), ResolveError> {
        if self.class == ClassKind::None {
            return Err(ResolveError::ThisOutsideClass(expr.keyword().clone()));
        }
        self.resolve_local(expr.keyword());
        Ok(())
    }

    fn visit_unary(&mut self, expr: &UnaryExpr) -> Result<(), ResolveError> {
        self.resolve_expr(expr.right())
    }

    fn visit_variable(&mut self, expr: &VariableExpr) -> Result<(), ResolveError> {
        let name = expr.name();
        let declared_not_defined = self
            .scopes
            .last()
            .is_some_and(|scope| scope.get(&name.lexeme) == Some(&false));
        if declared_not_defined {
            return Err(ResolveError::ReadInOwnInitializer(name.clone()));
        }
        self.resolve_local(name);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::token::TokenType;

    fn name(lexeme: &str) -> Token {
        Token::identifier(lexeme, 1)
    }

    fn depths(resolver: &Resolver) -> Vec<(String, Option<usize>)> {
        resolver
            .bindings()
            .iter()
            .map(|binding| (binding.name.lexeme.clone(), binding.depth))
            .collect()
    }

    #[test]
    fn references_resolve_to_scope_distance() {
        let mut resolver = Resolver::new();
        resolver.begin_scope();
        resolver.declare(&name("outer")).unwrap();
        resolver.define(&name("outer"));
        resolver.begin_scope();
        resolver.declare(&name("inner")).unwrap();
        resolver.define(&name("inner"));

        // outer + inner + global
        let expr = Expr::binary(
            Expr::binary(
                Expr::variable(name("outer")),
                Token::symbol(TokenType::Plus, "+", 1),
                Expr::variable(name("inner")),
            ),
            Token::symbol(TokenType::Plus, "+", 1),
            Expr::variable(name("global")),
        );
        resolver.resolve(&expr).unwrap();

        assert_eq!(
            depths(&resolver),
            vec![
                ("outer".to_string(), Some(1)),
                ("inner".to_string(), Some(0)),
                ("global".to_string(), None),
            ]
        );
    }

    #[test]
    fn assignment_resolves_value_before_target() {
        let mut resolver = Resolver::new();
        resolver.begin_scope();
        for var in ["a", "b"] {
            resolver.declare(&name(var)).unwrap();
            resolver.define(&name(var));
        }
        resolver
            .resolve(&Expr::assign(name("a"), Expr::variable(name("b"))))
            .unwrap();
        assert_eq!(
            depths(&resolver),
            vec![("b".to_string(), Some(0)), ("a".to_string(), Some(0))]
        );
    }

    #[test]
    fn duplicate_local_declaration_fails() {
        let mut resolver = Resolver::new();
        resolver.declare(&name("a")).unwrap();
        resolver.declare(&name("a")).unwrap();

        resolver.begin_scope();
        resolver.declare(&name("a")).unwrap();
        assert!(matches!(
            resolver.declare(&name("a")),
            Err(ResolveError::AlreadyDeclared(_))
        ));
    }

    #[test]
    fn reading_in_own_initializer_fails() {
        let mut resolver = Resolver::new();
        resolver.begin_scope();
        resolver.declare(&name("a")).unwrap();
        let err = resolver.resolve(&Expr::variable(name("a"))).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Line 1: Resolve Error: Can't read local variable 'a' in its own initializer."
        );
    }

    #[test]
    fn this_and_super_need_class_context() {
        let this = Expr::this(Token::symbol(TokenType::This, "this", 3));
        let sup = Expr::super_method(Token::symbol(TokenType::Super, "super", 3), name("cook"));

        let mut resolver = Resolver::new();
        assert!(matches!(
            resolver.resolve(&this),
            Err(ResolveError::ThisOutsideClass(_))
        ));
        assert!(matches!(
            resolver.resolve(&sup),
            Err(ResolveError::SuperOutsideClass(_))
        ));

        assert_eq!(resolver.set_class_kind(ClassKind::Class), ClassKind::None);
        resolver.resolve(&this).unwrap();
        assert!(matches!(
            resolver.resolve(&sup),
            Err(ResolveError::SuperWithoutSuperclass(_))
        ));

        resolver.set_class_kind(ClassKind::Subclass);
        resolver.begin_scope();
        resolver.define(&Token::symbol(TokenType::Super, "super", 3));
        resolver.begin_scope();
        resolver.define(&Token::symbol(TokenType::This, "this", 3));
        resolver.resolve(&this).unwrap();
        resolver.resolve(&sup).unwrap();

        let resolved: Vec<_> = depths(&resolver).into_iter().skip(1).collect();
        assert_eq!(
            resolved,
            vec![("this".to_string(), Some(0)), ("super".to_string(), Some(1))]
        );
    }

    #[test]
    fn first_failure_stops_resolution() {
        let mut resolver = Resolver::new();
        let expr = Expr::call(
            Expr::this(Token::symbol(TokenType::This, "this", 1)),
            Token::symbol(TokenType::RightParen, ")", 1),
            vec![Expr::variable(name("later"))],
        );
        assert!(resolver.resolve(&expr).is_err());
        assert!(resolver.bindings().is_empty());
    }

    #[test]
    fn failing_right_operand_keeps_left_bindings() {
        let mut resolver = Resolver::new();
        resolver.begin_scope();
        resolver.declare(&name("a")).unwrap();
        resolver.define(&name("a"));

        // a + this, outside any class
        let this = Token::symbol(TokenType::This, "this", 5);
        let expr = Expr::binary(
            Expr::variable(name("a")),
            Token::symbol(TokenType::Plus, "+", 5),
            Expr::this(this.clone()),
        );
        let err = resolver.resolve(&expr).unwrap_err();

        assert!(matches!(err, ResolveError::ThisOutsideClass(token) if token == this));
        assert_eq!(depths(&resolver), vec![("a".to_string(), Some(0))]);
    }
}
