//! Advisory duplicate-definition pass over top-level statements.
//!
//! Only top-level assignments and function definitions are recorded; nested
//! bodies are not visited. Findings never stop evaluation.

use std::collections::HashMap;
use std::fmt;

use crate::ast::{Program, Statement};
use crate::builtins::BuiltinFunction;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SymbolKind {
    Builtin,
    Variable,
    Function,
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Builtin => "builtin",
            Self::Variable => "variable",
            Self::Function => "function",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    pub kind: SymbolKind,
    /// Zero for builtins.
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefinitionWarning {
    pub name: String,
    pub line: usize,
    pub kind: SymbolKind,
    pub previous: Symbol,
}

impl fmt::Display for DefinitionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "line {}: {} '{}' is already defined in this scope",
            self.line, self.kind, self.name
        )?;
        match self.previous.kind {
            SymbolKind::Builtin => write!(f, " (builtin)"),
            kind => write!(f, " (as {kind} at line {})", self.previous.line),
        }
    }
}

pub struct DefinitionChecker {
    scope: HashMap<String, Symbol>,
    warnings: Vec<DefinitionWarning>,
}

impl DefinitionChecker {
    pub fn new() -> Self {
        let scope = BuiltinFunction::ALL
            .iter()
            .map(|builtin| {
                (
                    builtin.name().to_string(),
                    Symbol {
                        kind: SymbolKind::Builtin,
                        line: 0,
                    },
                )
            })
            .collect();
        Self {
            scope,
            warnings: Vec::new(),
        }
    }

    pub fn check(mut self, program: &Program) -> Vec<DefinitionWarning> {
        for statement in &program.statements {
            match statement {
                Statement::Assign { name, line, .. } => {
                    self.define(name, SymbolKind::Variable, *line)
                }
                Statement::FunctionDef(function) => {
                    self.define(&function.name, SymbolKind::Function, function.line)
                }
                _ => {}
            }
        }
        self.warnings
    }

    fn define(&mut self, name: &str, kind: SymbolKind, line: usize) {
        let symbol = Symbol { kind, line };
        if let Some(previous) = self.scope.insert(name.to_string(), symbol) {
            self.warnings.push(DefinitionWarning {
                name: name.to_string(),
                line,
                kind,
                previous,
            });
        }
    }
}

impl Default for DefinitionChecker {
    fn default() -> Self {
        Self::new()
    }
}

pub fn check_definitions(program: &Program) -> Vec<DefinitionWarning> {
    DefinitionChecker::new().check(program)
}
