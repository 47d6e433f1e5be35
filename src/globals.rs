use rustc_hash::FxHashMap;

use crate::{interpreter::RuntimeError, token::Token, value::Value};

/// Flat variable table used by the [`Interpreter`](crate::interpreter::Interpreter).
///
/// There is no enclosing scope: block and function scoping belong to the
/// statement layer.
#[derive(Default)]
pub struct Globals {
    values: FxHashMap<String, Value>,
}

impl Globals {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn define(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }

    pub fn get(&self, name: &Token) -> Result<Value, RuntimeError> {
        self.values
            .get(&name.lexeme)
            .cloned()
            .ok_or_else(|| RuntimeError::UndefinedVariable(name.clone()))
    }

    /// Assignment never creates a variable; it must already be defined.
    pub fn assign(&mut self, name: &Token, value: Value) -> Result<(), RuntimeError> {
        match self.values.get_mut(&name.lexeme) {
            Some(slot) => {
                *slot = value;
                Ok(())
            }
            None => Err(RuntimeError::UndefinedVariable(name.clone())),
        }
    }

    pub fn contains(&self, name: &str) -> bool {
        self.values.contains_key(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assign_requires_existing_definition() {
        let mut globals = Globals::new();
        let name = Token::identifier("answer", 4);
        assert!(matches!(
            globals.assign(&name, Value::Number(42.0)),
            Err(RuntimeError::UndefinedVariable(token)) if token.line == 4
        ));

        globals.define("answer", Value::Nil);
        globals.assign(&name, Value::Number(42.0)).unwrap();
        assert_eq!(globals.get(&name).unwrap(), Value::Number(42.0));
        assert!(globals.contains("answer"));
    }

    #[test]
    fn get_of_unknown_name_fails() {
        let globals = Globals::new();
        let err = globals.get(&Token::identifier("ghost", 2)).unwrap_err();
        assert_eq!(err.to_string(), "Line 2: Runtime Error: Undefined variable 'ghost'");
    }
}
