//! Abstract Syntax Tree for Lox programs
//!
//! The evaluator consumes trees built elsewhere: by a parser, by
//! [`Builder`], or deserialized from JSON with [`load_json`]. Every
//! expression and statement carries a [`NodeId`] so the resolver's side
//! tables can be keyed by node identity.

pub mod builder;

use std::rc::Rc;

use crate::common::{NodeId, NodeIdGen};
use serde::{Deserialize, Serialize};

pub use builder::Builder;

/// A source token: the identifier or operator text plus its line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Token {
    pub lexeme: String,
    #[serde(default)]
    pub line: u32,
}

impl Token {
    pub fn new(lexeme: impl Into<String>, line: u32) -> Self {
        Token {
            lexeme: lexeme.into(),
            line,
        }
    }
}

impl std::fmt::Display for Token {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.lexeme)
    }
}

// ==================== EXPRESSIONS ====================

/// Expression
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Expr {
    /// Literal value
    Literal {
        #[serde(default)]
        id: NodeId,
        value: Literal,
    },
    /// Parenthesized expression
    Grouping {
        #[serde(default)]
        id: NodeId,
        expr: Box<Expr>,
    },
    /// Unary operation
    Unary {
        #[serde(default)]
        id: NodeId,
        op: UnaryOp,
        #[serde(default)]
        line: u32,
        right: Box<Expr>,
    },
    /// Binary operation (both operands always evaluated)
    Binary {
        #[serde(default)]
        id: NodeId,
        left: Box<Expr>,
        op: BinaryOp,
        #[serde(default)]
        line: u32,
        right: Box<Expr>,
    },
    /// Short-circuiting `and` / `or`
    Logical {
        #[serde(default)]
        id: NodeId,
        left: Box<Expr>,
        op: LogicalOp,
        right: Box<Expr>,
    },
    /// Variable reference
    Variable {
        #[serde(default)]
        id: NodeId,
        name: Token,
    },
    /// Assignment to a variable
    Assign {
        #[serde(default)]
        id: NodeId,
        name: Token,
        value: Box<Expr>,
    },
    /// Function call; `line` is the line of the closing paren
    Call {
        #[serde(default)]
        id: NodeId,
        callee: Box<Expr>,
        #[serde(default)]
        line: u32,
        arguments: Vec<Expr>,
    },
}

impl Expr {
    pub fn id(&self) -> NodeId {
        match self {
            Expr::Literal { id, .. }
            | Expr::Grouping { id, .. }
            | Expr::Unary { id, .. }
            | Expr::Binary { id, .. }
            | Expr::Logical { id, .. }
            | Expr::Variable { id, .. }
            | Expr::Assign { id, .. }
            | Expr::Call { id, .. } => *id,
        }
    }

    fn id_mut(&mut self) -> &mut NodeId {
        match self {
            Expr::Literal { id, .. }
            | Expr::Grouping { id, .. }
            | Expr::Unary { id, .. }
            | Expr::Binary { id, .. }
            | Expr::Logical { id, .. }
            | Expr::Variable { id, .. }
            | Expr::Assign { id, .. }
            | Expr::Call { id, .. } => id,
        }
    }
}

/// Literal values
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Literal {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    Not,
    Neg,
}

impl UnaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            UnaryOp::Not => "!",
            UnaryOp::Neg => "-",
        }
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    // Equality
    Eq,
    Ne,
    // Comparison
    Gt,
    Ge,
    Lt,
    Le,
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        match self {
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
            BinaryOp::Gt => ">",
            BinaryOp::Ge => ">=",
            BinaryOp::Lt => "<",
            BinaryOp::Le => "<=",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
        }
    }
}

/// Logical operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LogicalOp {
    And,
    Or,
}

// ==================== STATEMENTS ====================

/// Function declaration, shared between the statement and every closure built from it
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FunctionDecl {
    pub name: Token,
    pub params: Vec<Token>,
    pub body: Vec<Stmt>,
}

/// Statement
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum Stmt {
    /// Expression evaluated for its side effects
    Expression {
        #[serde(default)]
        id: NodeId,
        expr: Expr,
    },
    /// `print expr;`
    Print {
        #[serde(default)]
        id: NodeId,
        expr: Expr,
    },
    /// `var name = initializer;`
    Var {
        #[serde(default)]
        id: NodeId,
        name: Token,
        initializer: Option<Expr>,
    },
    /// `{ ... }`
    Block {
        #[serde(default)]
        id: NodeId,
        statements: Vec<Stmt>,
    },
    /// `if (condition) then else otherwise`
    If {
        #[serde(default)]
        id: NodeId,
        condition: Expr,
        then_branch: Box<Stmt>,
        else_branch: Option<Box<Stmt>>,
    },
    /// `while (condition) body`
    While {
        #[serde(default)]
        id: NodeId,
        condition: Expr,
        body: Box<Stmt>,
    },
    /// `fun name(params) { body }`
    Function {
        #[serde(default)]
        id: NodeId,
        decl: Rc<FunctionDecl>,
    },
    /// `return value;`
    Return {
        #[serde(default)]
        id: NodeId,
        keyword: Token,
        value: Option<Expr>,
    },
}

impl Stmt {
    pub fn id(&self) -> NodeId {
        match self {
            Stmt::Expression { id, .. }
            | Stmt::Print { id, .. }
            | Stmt::Var { id, .. }
            | Stmt::Block { id, .. }
            | Stmt::If { id, .. }
            | Stmt::While { id, .. }
            | Stmt::Function { id, .. }
            | Stmt::Return { id, .. } => *id,
        }
    }

    fn id_mut(&mut self) -> &mut NodeId {
        match self {
            Stmt::Expression { id, .. }
            | Stmt::Print { id, .. }
            | Stmt::Var { id, .. }
            | Stmt::Block { id, .. }
            | Stmt::If { id, .. }
            | Stmt::While { id, .. }
            | Stmt::Function { id, .. }
            | Stmt::Return { id, .. } => id,
        }
    }
}

// ==================== NUMBERING ====================

/// Give every node in `statements` a fresh id from `ids`.
///
/// Existing ids are overwritten. Function declarations shared with live
/// closures are cloned before renumbering.
pub fn assign_ids(statements: &mut [Stmt], ids: &mut NodeIdGen) {
    for stmt in statements {
        number_stmt(stmt, ids);
    }
}

fn number_stmt(stmt: &mut Stmt, ids: &mut NodeIdGen) {
    *stmt.id_mut() = ids.fresh();
    match stmt {
        Stmt::Expression { expr, .. } | Stmt::Print { expr, .. } => number_expr(expr, ids),
        Stmt::Var { initializer, .. } => {
            if let Some(init) = initializer {
                number_expr(init, ids);
            }
        }
        Stmt::Block { statements, .. } => assign_ids(statements, ids),
        Stmt::If {
            condition,
            then_branch,
            else_branch,
            ..
        } => {
            number_expr(condition, ids);
            number_stmt(then_branch, ids);
            if let Some(else_branch) = else_branch {
                number_stmt(else_branch, ids);
            }
        }
        Stmt::While {
            condition, body, ..
        } => {
            number_expr(condition, ids);
            number_stmt(body, ids);
        }
        Stmt::Function { decl, .. } => assign_ids(&mut Rc::make_mut(decl).body, ids),
        Stmt::Return { value, .. } => {
            if let Some(value) = value {
                number_expr(value, ids);
            }
        }
    }
}

fn number_expr(expr: &mut Expr, ids: &mut NodeIdGen) {
    *expr.id_mut() = ids.fresh();
    match expr {
        Expr::Literal { .. } | Expr::Variable { .. } => {}
        Expr::Grouping { expr, .. } => number_expr(expr, ids),
        Expr::Unary { right, .. } => number_expr(right, ids),
        Expr::Binary { left, right, .. } | Expr::Logical { left, right, .. } => {
            number_expr(left, ids);
            number_expr(right, ids);
        }
        Expr::Assign { value, .. } => number_expr(value, ids),
        Expr::Call {
            callee, arguments, ..
        } => {
            number_expr(callee, ids);
            for arg in arguments {
                number_expr(arg, ids);
            }
        }
    }
}

/// Parse a JSON program (an array of statements) and number its nodes
pub fn load_json(text: &str, ids: &mut NodeIdGen) -> Result<Vec<Stmt>, serde_json::Error> {
    let mut statements: Vec<Stmt> = serde_json::from_str(text)?;
    assign_ids(&mut statements, ids);
    Ok(statements)
}
