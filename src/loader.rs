// loader.rs — Translation-unit dump loading
//
// Reads a serialized translation unit (JSON, as emitted by a frontend
// bridge) and validates it before analysis: arena indices in range, spans
// inside the source buffer, and call argument counts agreeing with
// declared arities.
//
// Preconditions: none.
// Postconditions: a returned unit is safe to traverse without bounds
//                 failures.
// Failure modes: io, malformed JSON, or validation errors, as `LoadError`.
// Side effects: reads the dump file.

use std::fmt;
use std::path::{Path, PathBuf};

use crate::ast::{Expr, ExprKind, Stmt, StmtKind, TranslationUnit};

// ── Errors ──────────────────────────────────────────────────────────────────

/// Errors that can occur while loading a translation-unit dump.
#[derive(Debug)]
pub enum LoadError {
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    Parse {
        path: PathBuf,
        message: String,
    },
    Invalid {
        path: PathBuf,
        message: String,
    },
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Io { path, source } => {
                write!(f, "failed to read {}: {}", path.display(), source)
            }
            LoadError::Parse { path, message } => {
                write!(f, "failed to parse {}: {}", path.display(), message)
            }
            LoadError::Invalid { path, message } => {
                write!(f, "invalid translation unit {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for LoadError {}

// ── Loading ─────────────────────────────────────────────────────────────────

/// Load and validate one translation-unit dump.
pub fn load_translation_unit(path: &Path) -> Result<TranslationUnit, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|e| LoadError::Io {
        path: path.to_path_buf(),
        source: e,
    })?;
    let tu: TranslationUnit = serde_json::from_str(&text).map_err(|e| LoadError::Parse {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;
    validate(&tu).map_err(|message| LoadError::Invalid {
        path: path.to_path_buf(),
        message,
    })?;
    Ok(tu)
}

/// Structural validation of a unit, also usable by bridges before handing
/// a constructed unit to the analyzer.
pub fn validate(tu: &TranslationUnit) -> Result<(), String> {
    for function in &tu.functions {
        if function.decl.0 as usize >= tu.fns.len() {
            return Err(format!("function id {} out of range", function.decl.0));
        }
        for stmt in &function.body {
            validate_stmt(tu, stmt)?;
        }
    }
    Ok(())
}

fn validate_stmt(tu: &TranslationUnit, stmt: &Stmt) -> Result<(), String> {
    check_span(tu, stmt.span.end)?;
    match &stmt.kind {
        StmtKind::Expr(e) => validate_expr(tu, e),
        StmtKind::Decl { var, init } => {
            if var.0 as usize >= tu.vars.len() {
                return Err(format!("variable id {} out of range", var.0));
            }
            init.as_ref().map_or(Ok(()), |e| validate_expr(tu, e))
        }
        StmtKind::If(ifstmt) => {
            validate_expr(tu, &ifstmt.cond)?;
            for s in &ifstmt.then_branch {
                validate_stmt(tu, s)?;
            }
            ifstmt
                .else_branch
                .as_deref()
                .map_or(Ok(()), |s| validate_stmt(tu, s))
        }
        StmtKind::While { cond, body } => {
            validate_expr(tu, cond)?;
            for s in body {
                validate_stmt(tu, s)?;
            }
            Ok(())
        }
        StmtKind::Block(stmts) => {
            for s in stmts {
                validate_stmt(tu, s)?;
            }
            Ok(())
        }
        StmtKind::Return(e) => e.as_ref().map_or(Ok(()), |e| validate_expr(tu, e)),
    }
}

fn validate_expr(tu: &TranslationUnit, expr: &Expr) -> Result<(), String> {
    check_span(tu, expr.span.end)?;
    match &expr.kind {
        ExprKind::Var(id) => {
            if id.0 as usize >= tu.vars.len() {
                return Err(format!("variable id {} out of range", id.0));
            }
            Ok(())
        }
        ExprKind::Call { callee, args } => {
            let Some(decl) = tu.fns.get(callee.0 as usize) else {
                return Err(format!("function id {} out of range", callee.0));
            };
            if let Some(arity) = decl.arity {
                if arity != args.len() {
                    return Err(format!(
                        "call to {} has {} arguments, declared arity is {}",
                        decl.name,
                        args.len(),
                        arity
                    ));
                }
            }
            for arg in args {
                validate_expr(tu, arg)?;
            }
            Ok(())
        }
        ExprKind::Binary { lhs, rhs, .. } => {
            validate_expr(tu, lhs)?;
            validate_expr(tu, rhs)
        }
        ExprKind::Unary { operand, .. } => validate_expr(tu, operand),
        ExprKind::Index { base, index } => {
            validate_expr(tu, base)?;
            validate_expr(tu, index)
        }
        ExprKind::IntLit(_) | ExprKind::FloatLit(_) => Ok(()),
    }
}

fn check_span(tu: &TranslationUnit, end: u32) -> Result<(), String> {
    if end as usize > tu.source.text.len() {
        return Err(format!(
            "span end {} exceeds source length {}",
            end,
            tu.source.text.len()
        ));
    }
    Ok(())
}
