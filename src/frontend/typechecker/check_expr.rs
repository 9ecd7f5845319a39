//! Second pass: function bodies, statements and expressions.

use crate::frontend::ast::{Body, Expr, FuncDecl, Spanned, Stmt};
use crate::frontend::diagnostics::{DiagId, DiagnosticEngine};
use crate::frontend::loaders::SymbolKind;
use crate::frontend::source::{BufferId, SourceRange};
use crate::frontend::symbols::{ModuleScope, Resolved};

use super::TypeChecker;

impl TypeChecker {
    pub(super) fn check_func(&mut self, func: &FuncDecl, buffer: BufferId, diags: &mut DiagnosticEngine) {
        let Body::Parsed(stmts) = &func.body else {
            return;
        };
        self.symbols.enter_function(func.params.iter().map(|p| p.node.clone()));
        for stmt in stmts {
            self.check_stmt(stmt, buffer, diags);
        }
        self.symbols.exit_function();
    }

    pub(super) fn check_stmt(&mut self, stmt: &Spanned<Stmt>, buffer: BufferId, diags: &mut DiagnosticEngine) {
        match &stmt.node {
            Stmt::Let { name, init, .. } => {
                self.check_expr(init, buffer, diags);
                self.symbols.bind_local(&name.node);
            }
            Stmt::Return(Some(expr)) | Stmt::Expr(expr) => self.check_expr(expr, buffer, diags),
            Stmt::Return(None) => {}
        }
    }

    pub(super) fn check_expr(&self, expr: &Spanned<Expr>, buffer: BufferId, diags: &mut DiagnosticEngine) {
        let site = SourceRange::new(buffer, expr.span);
        match &expr.node {
            Expr::Int(_) | Expr::Str(_) | Expr::Bool(_) => {}
            Expr::Name(name) => {
                if self.symbols.resolve(name).is_none() {
                    diags.diagnose(Some(site), DiagId::ErrorUnresolvedIdentifier, &[name]);
                }
            }
            Expr::Member(base, member) => match self.module_base(base) {
                Some((module, scope)) => {
                    if !scope.native && !scope.members.contains_key(&member.node) {
                        diags.diagnose(
                            Some(SourceRange::new(buffer, member.span)),
                            DiagId::ErrorNoMemberInModule,
                            &[&module, &member.node],
                        );
                    }
                }
                None => self.check_expr(base, buffer, diags),
            },
            Expr::Call(callee, args) => {
                for arg in args {
                    self.check_expr(arg, buffer, diags);
                }
                self.check_callee(callee, args.len(), buffer, diags);
            }
            Expr::Binary(_, lhs, rhs) => {
                self.check_expr(lhs, buffer, diags);
                self.check_expr(rhs, buffer, diags);
            }
        }
    }

    fn check_callee(&self, callee: &Spanned<Expr>, argc: usize, buffer: BufferId, diags: &mut DiagnosticEngine) {
        let site = SourceRange::new(buffer, callee.span);
        let (display, arity) = match &callee.node {
            Expr::Name(name) => match self.symbols.resolve(name) {
                None => {
                    diags.diagnose(Some(site), DiagId::ErrorUnresolvedIdentifier, &[name]);
                    return;
                }
                Some(Resolved::Local) => return,
                Some(Resolved::Module(_)) => {
                    diags.diagnose(Some(site), DiagId::ErrorNotCallable, &[name]);
                    return;
                }
                Some(Resolved::Global(symbol)) => match symbol.kind {
                    SymbolKind::Variable => return,
                    SymbolKind::Function | SymbolKind::Type => (name.clone(), symbol.arity),
                },
                Some(Resolved::Builtin(info)) => (name.clone(), info.arity),
            },
            Expr::Member(base, member) => {
                let Some((module, scope)) = self.module_base(base) else {
                    self.check_expr(callee, buffer, diags);
                    return;
                };
                // Reports a missing member.
                self.check_expr(callee, buffer, diags);
                if scope.native {
                    return;
                }
                match scope.members.get(&member.node) {
                    Some(symbol) if symbol.kind != SymbolKind::Variable => {
                        (format!("{module}.{}", member.node), symbol.arity)
                    }
                    _ => return,
                }
            }
            Expr::Int(v) => {
                diags.diagnose(Some(site), DiagId::ErrorNotCallable, &[v]);
                return;
            }
            Expr::Bool(v) => {
                diags.diagnose(Some(site), DiagId::ErrorNotCallable, &[v]);
                return;
            }
            Expr::Str(s) => {
                diags.diagnose(Some(site), DiagId::ErrorNotCallable, &[&format!("\"{s}\"")]);
                return;
            }
            Expr::Call(..) | Expr::Binary(..) => {
                self.check_expr(callee, buffer, diags);
                return;
            }
        };

        if let Some(expected) = arity {
            if expected != argc {
                diags.diagnose(Some(site), DiagId::ErrorCallArity, &[&display, &expected, &argc]);
            }
        }
    }

    /// `base` names an imported module that no local or global shadows.
    fn module_base<'s>(&'s self, base: &'s Spanned<Expr>) -> Option<(&'s str, &'s ModuleScope)> {
        let Expr::Name(name) = &base.node else {
            return None;
        };
        match self.symbols.resolve(name) {
            Some(Resolved::Module(scope)) => Some((name.as_str(), scope)),
            _ => None,
        }
    }
}
