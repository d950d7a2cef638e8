//! AST-rewrite id inlining.
//!
//! Used when no reserved placeholder name is configured. The module is parsed,
//! the define call `{prefix}__d(function (..., depMap) { ... })` is located to
//! learn the dependency-map parameter name, every `depMap[N]` inside the
//! factory is replaced with a numeric literal, and the code is regenerated.

use std::path::{Path, PathBuf};

use oxc_allocator::Allocator;
use oxc_ast::AstBuilder;
use oxc_ast::ast::*;
use oxc_ast_visit::{Visit, VisitMut, walk, walk_mut};
use oxc_codegen::{Codegen, CodegenOptions};
use oxc_parser::Parser;
use oxc_span::SourceType;

use crate::error::{OutputError, Result};

/// Code produced by the rewrite, with the generator's own source map
/// (rewritten code -> input code).
#[derive(Debug)]
pub(crate) struct Rewritten {
    pub code: String,
    pub map: Option<oxc_sourcemap::SourceMap>,
}

/// Finds the last parameter name of the define call's factory.
struct DefineCallFinder<'n> {
    define_name: &'n str,
    dependency_map: Option<String>,
}

impl<'a> Visit<'a> for DefineCallFinder<'_> {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if self.dependency_map.is_some() {
            return;
        }

        let is_define = matches!(
            &call.callee,
            Expression::Identifier(ident) if ident.name.as_str() == self.define_name
        );
        if is_define {
            let params = match call.arguments.first() {
                Some(Argument::FunctionExpression(func)) => Some(&func.params),
                Some(Argument::ArrowFunctionExpression(arrow)) => Some(&arrow.params),
                _ => None,
            };
            if let Some(param) = params.and_then(|p| p.items.last()) {
                self.dependency_map = param
                    .pattern
                    .get_identifier_name()
                    .map(|name| name.to_string());
                return;
            }
        }

        walk::walk_call_expression(self, call);
    }
}

/// Replaces `depMap[N]` with the N-th dependency id.
struct DependencyMapRewriter<'a, 'i> {
    ast: AstBuilder<'a>,
    path: &'i Path,
    dependency_map: &'i str,
    dependency_ids: &'i [u32],
    error: Option<OutputError>,
}

impl DependencyMapRewriter<'_, '_> {
    fn replacement(&self, member: &ComputedMemberExpression<'_>) -> Option<Result<u32>> {
        let Expression::Identifier(object) = &member.object else {
            return None;
        };
        if object.name.as_str() != self.dependency_map {
            return None;
        }
        let Expression::NumericLiteral(index) = &member.expression else {
            return None;
        };

        let value = index.value;
        let valid = value >= 0.0 && value.fract() == 0.0;
        let position = valid.then_some(value as usize);
        Some(
            position
                .and_then(|i| self.dependency_ids.get(i).copied())
                .ok_or_else(|| OutputError::DependencyIndexOutOfRange {
                    path: self.path.to_path_buf(),
                    index: position.unwrap_or(usize::MAX),
                    len: self.dependency_ids.len(),
                }),
        )
    }
}

impl<'a> VisitMut<'a> for DependencyMapRewriter<'a, '_> {
    fn visit_expression(&mut self, expr: &mut Expression<'a>) {
        if self.error.is_some() {
            return;
        }

        if let Expression::ComputedMemberExpression(member) = expr {
            match self.replacement(member) {
                Some(Ok(id)) => {
                    let span = member.span;
                    *expr = self.ast.expression_numeric_literal(
                        span,
                        f64::from(id),
                        None,
                        NumberBase::Decimal,
                    );
                    return;
                }
                Some(Err(err)) => {
                    self.error = Some(err);
                    return;
                }
                None => {}
            }
        }

        walk_mut::walk_expression(self, expr);
    }
}

/// Rewrite dependency-map references in `code` by parsing it.
pub(crate) fn inline_ids(
    path: &Path,
    code: &str,
    global_prefix: &str,
    dependency_ids: &[u32],
) -> Result<Rewritten> {
    let allocator = Allocator::default();
    let parsed = Parser::new(&allocator, code, SourceType::cjs()).parse();
    if parsed.panicked || !parsed.errors.is_empty() {
        let reason = parsed
            .errors
            .first()
            .map(|err| err.to_string())
            .unwrap_or_else(|| "parser panicked".to_string());
        return Err(OutputError::parse(path, reason));
    }
    let mut program = parsed.program;

    let define_name = format!("{global_prefix}__d");
    let mut finder = DefineCallFinder {
        define_name: &define_name,
        dependency_map: None,
    };
    finder.visit_program(&program);

    // No factory parameter to rewrite: nothing references dependency ids.
    let Some(dependency_map) = finder.dependency_map else {
        tracing::debug!(path = %path.display(), "no define call found, keeping code");
        return Ok(Rewritten {
            code: code.to_string(),
            map: None,
        });
    };

    let mut rewriter = DependencyMapRewriter {
        ast: AstBuilder::new(&allocator),
        path,
        dependency_map: &dependency_map,
        dependency_ids,
        error: None,
    };
    rewriter.visit_program(&mut program);
    if let Some(err) = rewriter.error {
        return Err(err);
    }

    let generated = Codegen::new()
        .with_options(CodegenOptions {
            source_map_path: Some(PathBuf::from(path)),
            ..CodegenOptions::default()
        })
        .build(&program);

    Ok(Rewritten {
        code: generated.code,
        map: generated.map,
    })
}
