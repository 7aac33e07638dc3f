//! Programmatic AST construction
//!
//! Hands every node a fresh [`NodeId`] as it is built, so a tree made with
//! the builder can go straight to the resolver. Methods take `&self`, which
//! lets calls nest: `b.print(b.add(b.var("a"), b.number(1.0)))`.

use std::cell::Cell;
use std::rc::Rc;

use super::*;

pub struct Builder {
    next_id: Cell<u32>,
    line: Cell<u32>,
}

impl Builder {
    pub fn new() -> Self {
        Self::starting_at(1)
    }

    /// Builder whose first id is `first`; used to keep ids unique across
    /// programs fed to the same interpreter
    pub fn starting_at(first: u32) -> Self {
        Builder {
            next_id: Cell::new(first.max(1)),
            line: Cell::new(1),
        }
    }

    /// Line stamped on tokens built from now on
    pub fn at_line(&self, line: u32) -> &Self {
        self.line.set(line);
        self
    }

    /// The id the next node will receive
    pub fn next_id(&self) -> u32 {
        self.next_id.get()
    }

    fn fresh(&self) -> NodeId {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        NodeId(id)
    }

    fn token(&self, lexeme: &str) -> Token {
        Token::new(lexeme, self.line.get())
    }

    // ==================== EXPRESSIONS ====================

    pub fn literal(&self, value: Literal) -> Expr {
        Expr::Literal {
            id: self.fresh(),
            value,
        }
    }

    pub fn number(&self, n: f64) -> Expr {
        self.literal(Literal::Number(n))
    }

    pub fn string(&self, s: &str) -> Expr {
        self.literal(Literal::String(s.to_string()))
    }

    pub fn boolean(&self, b: bool) -> Expr {
        self.literal(Literal::Bool(b))
    }

    pub fn nil(&self) -> Expr {
        self.literal(Literal::Nil)
    }

    pub fn grouping(&self, expr: Expr) -> Expr {
        Expr::Grouping {
            id: self.fresh(),
            expr: Box::new(expr),
        }
    }

    pub fn unary(&self, op: UnaryOp, right: Expr) -> Expr {
        Expr::Unary {
            id: self.fresh(),
            op,
            line: self.line.get(),
            right: Box::new(right),
        }
    }

    pub fn not(&self, right: Expr) -> Expr {
        self.unary(UnaryOp::Not, right)
    }

    pub fn neg(&self, right: Expr) -> Expr {
        self.unary(UnaryOp::Neg, right)
    }

    pub fn binary(&self, left: Expr, op: BinaryOp, right: Expr) -> Expr {
        Expr::Binary {
            id: self.fresh(),
            left: Box::new(left),
            op,
            line: self.line.get(),
            right: Box::new(right),
        }
    }

    pub fn add(&self, left: Expr, right: Expr) -> Expr {
        self.binary(left, BinaryOp::Add, right)
    }

    pub fn sub(&self, left: Expr, right: Expr) -> Expr {
        self.binary(left, BinaryOp::Sub, right)
    }

    pub fn mul(&self, left: Expr, right: Expr) -> Expr {
        self.binary(left, BinaryOp::Mul, right)
    }

    pub fn less(&self, left: Expr, right: Expr) -> Expr {
        self.binary(left, BinaryOp::Lt, right)
    }

    pub fn equal(&self, left: Expr, right: Expr) -> Expr {
        self.binary(left, BinaryOp::Eq, right)
    }

    pub fn logical(&self, left: Expr, op: LogicalOp, right: Expr) -> Expr {
        Expr::Logical {
            id: self.fresh(),
            left: Box::new(left),
            op,
            right: Box::new(right),
        }
    }

    pub fn and(&self, left: Expr, right: Expr) -> Expr {
        self.logical(left, LogicalOp::And, right)
    }

    pub fn or(&self, left: Expr, right: Expr) -> Expr {
        self.logical(left, LogicalOp::Or, right)
    }

    pub fn var(&self, name: &str) -> Expr {
        Expr::Variable {
            id: self.fresh(),
            name: self.token(name),
        }
    }

    pub fn assign(&self, name: &str, value: Expr) -> Expr {
        Expr::Assign {
            id: self.fresh(),
            name: self.token(name),
            value: Box::new(value),
        }
    }

    pub fn call(&self, callee: Expr, arguments: Vec<Expr>) -> Expr {
        Expr::Call {
            id: self.fresh(),
            callee: Box::new(callee),
            line: self.line.get(),
            arguments,
        }
    }

    // ==================== STATEMENTS ====================

    pub fn expr_stmt(&self, expr: Expr) -> Stmt {
        Stmt::Expression {
            id: self.fresh(),
            expr,
        }
    }

    pub fn print(&self, expr: Expr) -> Stmt {
        Stmt::Print {
            id: self.fresh(),
            expr,
        }
    }

    pub fn var_decl(&self, name: &str, initializer: Option<Expr>) -> Stmt {
        Stmt::Var {
            id: self.fresh(),
            name: self.token(name),
            initializer,
        }
    }

    pub fn block(&self, statements: Vec<Stmt>) -> Stmt {
        Stmt::Block {
            id: self.fresh(),
            statements,
        }
    }

    pub fn if_stmt(&self, condition: Expr, then_branch: Stmt, else_branch: Option<Stmt>) -> Stmt {
        Stmt::If {
            id: self.fresh(),
            condition,
            then_branch: Box::new(then_branch),
            else_branch: else_branch.map(Box::new),
        }
    }

    pub fn while_stmt(&self, condition: Expr, body: Stmt) -> Stmt {
        Stmt::While {
            id: self.fresh(),
            condition,
            body: Box::new(body),
        }
    }

    pub fn function(&self, name: &str, params: &[&str], body: Vec<Stmt>) -> Stmt {
        Stmt::Function {
            id: self.fresh(),
            decl: Rc::new(FunctionDecl {
                name: self.token(name),
                params: params.iter().map(|p| self.token(p)).collect(),
                body,
            }),
        }
    }

    pub fn return_stmt(&self, value: Option<Expr>) -> Stmt {
        Stmt::Return {
            id: self.fresh(),
            keyword: self.token("return"),
            value,
        }
    }
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}
