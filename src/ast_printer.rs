//! Lisp‑style prefix printer for arena AST nodes, used by the `parse` CLI
//! subcommand and handy when debugging the parser.

use crate::ast::{Ast, Expr, ExprId, LiteralValue, Stmt, StmtId};

pub struct AstPrinter;

impl AstPrinter {
    pub fn print_stmt(ast: &Ast, id: StmtId) -> String {
        match ast.stmt(id) {
            Stmt::Expression(expr) => Self::print(ast, *expr),

            Stmt::Print(expr) => format!("(print {})", Self::print(ast, *expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(init) => format!("(var {} {})", name.lexeme, Self::print(ast, *init)),
                None => format!("(var {})", name.lexeme),
            },

            Stmt::Block(statements) => {
                let mut s = String::from("(block");
                for stmt in statements {
                    s.push(' ');
                    s.push_str(&Self::print_stmt(ast, *stmt));
                }
                s.push(')');
                s
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(eb) => format!(
                    "(if {} {} {})",
                    Self::print(ast, *condition),
                    Self::print_stmt(ast, *then_branch),
                    Self::print_stmt(ast, *eb)
                ),
                None => format!(
                    "(if {} {})",
                    Self::print(ast, *condition),
                    Self::print_stmt(ast, *then_branch)
                ),
            },

            Stmt::While {
                condition,
                body,
                increment,
            } => match increment {
                Some(inc) => format!(
                    "(while {} {} {})",
                    Self::print(ast, *condition),
                    Self::print_stmt(ast, *body),
                    Self::print(ast, *inc)
                ),
                None => format!(
                    "(while {} {})",
                    Self::print(ast, *condition),
                    Self::print_stmt(ast, *body)
                ),
            },

            Stmt::Break(_) => "(break)".into(),

            Stmt::Continue(_) => "(continue)".into(),

            Stmt::Function { name, params, body } => {
                let mut s = format!("(fun {} (", name.lexeme);
                for (i, param) in params.iter().enumerate() {
                    if i > 0 {
                        s.push(' ');
                    }
                    s.push_str(&param.lexeme);
                }
                s.push(')');
                for stmt in body {
                    s.push(' ');
                    s.push_str(&Self::print_stmt(ast, *stmt));
                }
                s.push(')');
                s
            }

            Stmt::Return { value, .. } => match value {
                Some(expr) => format!("(return {})", Self::print(ast, *expr)),
                None => "(return)".into(),
            },

            Stmt::Class {
                name,
                superclass,
                methods,
            } => {
                let mut s = format!("(class {}", name.lexeme);
                if let Some(sc) = superclass {
                    s.push_str(" < ");
                    s.push_str(&Self::print(ast, *sc));
                }
                for method in methods {
                    s.push(' ');
                    s.push_str(&Self::print_stmt(ast, *method));
                }
                s.push(')');
                s
            }
        }
    }

    pub fn print(ast: &Ast, id: ExprId) -> String {
        match ast.expr(id) {
            // ── literals ────────────────────────────────────────────────
            Expr::Literal(lit) => match lit {
                LiteralValue::True => "true".into(),

                LiteralValue::False => "false".into(),

                LiteralValue::Nil => "nil".into(),

                LiteralValue::Str(s) => s.clone(),

                LiteralValue::Number(n) => {
                    if n.fract() == 0.0 {
                        // 3.0 → 3.0 (prefix form keeps one decimal)
                        format!("{:.1}", n)
                    } else {
                        n.to_string()
                    }
                }
            },

            // ── grouping ────────────────────────────────────────────────
            Expr::Grouping(inner) => format!("(group {})", Self::print(ast, *inner)),

            // ── unary operator ──────────────────────────────────────────
            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, Self::print(ast, *right))
            }

            // ── binary / logical operators ──────────────────────────────
            Expr::Binary {
                left,
                operator,
                right,
            }
            | Expr::Logical {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                Self::print(ast, *left),
                Self::print(ast, *right)
            ),

            Expr::Ternary {
                condition,
                if_true,
                if_false,
            } => format!(
                "(?: {} {} {})",
                Self::print(ast, *condition),
                Self::print(ast, *if_true),
                Self::print(ast, *if_false)
            ),

            Expr::Variable(name) => name.lexeme.clone(),

            Expr::This(_) => "this".into(),

            Expr::Assign { name, value } => {
                format!("(= {} {})", name.lexeme, Self::print(ast, *value))
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut s = format!("(call {}", Self::print(ast, *callee));
                for arg in arguments {
                    s.push(' ');
                    s.push_str(&Self::print(ast, *arg));
                }
                s.push(')');
                s
            }

            Expr::Get { object, name } => {
                format!("(. {} {})", Self::print(ast, *object), name.lexeme)
            }

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(.= {} {} {})",
                Self::print(ast, *object),
                name.lexeme,
                Self::print(ast, *value)
            ),
        }
    }
}
