//! Named variables and string rendering.
//!
//! A [`Variables`] scope collects named variables, resolves references
//! between their values, and substitutes `${name}` placeholders inside
//! arbitrary strings. Scopes are cheap to create and exclusively owned:
//! the inventory compiler gives every host replica its own scope so that
//! rendering one replica can never leak into another.

use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;

use crate::error::VariableError;

/// Placeholder pattern recognized inside string values: `${name}`.
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\$\{([^${}]+)\}").expect("placeholder pattern is valid"));

/// A named variable registered in a scope.
#[derive(Debug, Clone)]
pub struct Variable {
    name: String,
    description: String,
    value: String,
}

impl Variable {
    /// Creates a new variable.
    #[must_use]
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        value: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            value: value.into(),
        }
    }

    /// The variable name, as referenced by `${name}`.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Human-readable description of what the variable holds.
    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// The raw (possibly unresolved) value.
    #[must_use]
    pub fn value(&self) -> &str {
        &self.value
    }
}

/// A private variable scope: registration, resolution, and rendering.
#[derive(Debug, Default)]
pub struct Variables {
    vars: IndexMap<String, Variable>,
    resolved: IndexMap<String, String>,
    built: bool,
}

impl Variables {
    /// Creates an empty scope.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a variable. Names are unique within a scope.
    ///
    /// # Errors
    ///
    /// Returns [`VariableError::Duplicate`] if the name is already taken.
    pub fn register(&mut self, var: Variable) -> Result<(), VariableError> {
        if self.vars.contains_key(var.name()) {
            return Err(VariableError::Duplicate {
                name: var.name().to_string(),
            });
        }
        self.built = false;
        self.vars.insert(var.name().to_string(), var);
        Ok(())
    }

    /// Looks up a registered variable by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    /// Number of registered variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns true if no variables are registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Resolves references between registered variables.
    ///
    /// A variable value may itself contain `${other}` placeholders; they are
    /// resolved depth-first, in registration order.
    ///
    /// # Errors
    ///
    /// Returns [`VariableError::NotFound`] for a reference to an unregistered
    /// name and [`VariableError::CyclicReference`] when values reference each
    /// other cyclically.
    pub fn build(&mut self) -> Result<(), VariableError> {
        let mut resolved = IndexMap::new();
        let mut visiting = Vec::new();
        let names: Vec<String> = self.vars.keys().cloned().collect();
        for name in names {
            Self::resolve(&self.vars, &name, &mut resolved, &mut visiting)?;
        }
        self.resolved = resolved;
        self.built = true;
        Ok(())
    }

    /// Depth-first resolution of one variable, memoized in `resolved`.
    fn resolve(
        vars: &IndexMap<String, Variable>,
        name: &str,
        resolved: &mut IndexMap<String, String>,
        visiting: &mut Vec<String>,
    ) -> Result<String, VariableError> {
        if let Some(value) = resolved.get(name) {
            return Ok(value.clone());
        }
        if visiting.iter().any(|n| n == name) {
            return Err(VariableError::CyclicReference {
                name: name.to_string(),
            });
        }
        let Some(var) = vars.get(name) else {
            return Err(VariableError::NotFound {
                name: name.to_string(),
            });
        };

        visiting.push(name.to_string());
        let value = var.value.clone();
        let mut out = String::new();
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(&value) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&value[last..whole.start()]);
            let replacement = Self::resolve(vars, inner.as_str(), resolved, visiting)?;
            out.push_str(&replacement);
            last = whole.end();
        }
        out.push_str(&value[last..]);
        visiting.pop();

        resolved.insert(name.to_string(), out.clone());
        Ok(out)
    }

    /// Substitutes every `${name}` placeholder in `input` with its resolved
    /// value. Strings without placeholders are returned unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`VariableError::NotBuilt`] if variables were registered but
    /// [`Variables::build`] has not run, and [`VariableError::NotFound`] for
    /// a placeholder naming an unregistered variable.
    pub fn render(&self, input: &str) -> Result<String, VariableError> {
        if !self.built && !self.vars.is_empty() {
            return Err(VariableError::NotBuilt);
        }

        let mut out = String::new();
        let mut last = 0;
        for caps in PLACEHOLDER.captures_iter(input) {
            let (Some(whole), Some(inner)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            out.push_str(&input[last..whole.start()]);
            match self.resolved.get(inner.as_str()) {
                Some(value) => out.push_str(value),
                None => {
                    return Err(VariableError::NotFound {
                        name: inner.as_str().to_string(),
                    });
                }
            }
            last = whole.end();
        }
        out.push_str(&input[last..]);
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scope(pairs: &[(&str, &str)]) -> Variables {
        let mut vars = Variables::new();
        for (name, value) in pairs {
            vars.register(Variable::new(*name, "", *value)).unwrap();
        }
        vars
    }

    #[test]
    fn test_register_duplicate() {
        let mut vars = scope(&[("port", "11211")]);
        let err = vars
            .register(Variable::new("port", "", "11212"))
            .unwrap_err();
        assert!(matches!(err, VariableError::Duplicate { name } if name == "port"));
    }

    #[test]
    fn test_render_plain_string_unchanged() {
        let mut vars = scope(&[("port", "11211")]);
        vars.build().unwrap();
        assert_eq!(vars.render("no placeholders here").unwrap(), "no placeholders here");
    }

    #[test]
    fn test_render_substitutes() {
        let mut vars = scope(&[("seq", "3")]);
        vars.build().unwrap();
        assert_eq!(vars.render("PORT=1121${seq}").unwrap(), "PORT=11213");
        assert_eq!(vars.render("${seq}-${seq}").unwrap(), "3-3");
    }

    #[test]
    fn test_build_resolves_references() {
        let mut vars = scope(&[("base", "1121"), ("port", "${base}0")]);
        vars.build().unwrap();
        assert_eq!(vars.render("${port}").unwrap(), "11210");
    }

    #[test]
    fn test_build_detects_cycle() {
        let mut vars = scope(&[("a", "${b}"), ("b", "${a}")]);
        let err = vars.build().unwrap_err();
        assert!(matches!(err, VariableError::CyclicReference { .. }));
    }

    #[test]
    fn test_build_rejects_unknown_reference() {
        let mut vars = scope(&[("a", "${missing}")]);
        let err = vars.build().unwrap_err();
        assert!(matches!(err, VariableError::NotFound { name } if name == "missing"));
    }

    #[test]
    fn test_render_unknown_placeholder() {
        let mut vars = scope(&[("seq", "1")]);
        vars.build().unwrap();
        let err = vars.render("${other}").unwrap_err();
        assert!(matches!(err, VariableError::NotFound { name } if name == "other"));
    }

    #[test]
    fn test_render_before_build() {
        let vars = scope(&[("seq", "1")]);
        let err = vars.render("${seq}").unwrap_err();
        assert!(matches!(err, VariableError::NotBuilt));
    }

    #[test]
    fn test_empty_scope_renders_plain_strings() {
        let vars = Variables::new();
        assert!(vars.is_empty());
        assert_eq!(vars.render("plain").unwrap(), "plain");
    }

    #[test]
    fn test_get_returns_registered_variable() {
        let vars = scope(&[("seq", "2")]);
        assert_eq!(vars.len(), 1);
        assert_eq!(vars.get("seq").unwrap().value(), "2");
        assert!(vars.get("other").is_none());
    }
}
