//! Expression trees for a tree-walking Lox interpreter.
//!
//! [`expr`] holds the closed set of node kinds and the [`Visitor`] trait
//! passes implement to walk them. [`printer`], [`interpreter`] and
//! [`resolver`] are the three passes shipped with the crate.

pub mod expr;
pub mod globals;
pub mod interpreter;
pub mod printer;
pub mod resolver;
pub mod stack;
pub mod token;
pub mod value;

pub use expr::{Expr, Visitor};
pub use interpreter::{Interpreter, RuntimeError};
pub use printer::AstPrinter;
pub use resolver::{Binding, ClassKind, ResolveError, Resolver};
pub use token::{Token, TokenType};
pub use value::Value;
