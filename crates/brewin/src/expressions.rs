use std::rc::Rc;

use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use strum::IntoStaticStr;

/// Shared handle to an expression node.
///
/// Expressions are reference-counted rather than boxed because v4 thunks hold
/// onto the deferred expression while the rest of the AST stays owned by the
/// program; a thunk forcing long after its statement finished must keep the
/// node alive.
pub(crate) type ExprRef = Rc<Expr>;

/// A parsed program: struct definitions followed by function definitions,
/// both in declaration order. Declaration order is semantic: call dispatch
/// picks the first function whose name and arity match.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Program {
    pub structs: Vec<StructDef>,
    pub functions: Vec<Rc<FuncDef>>,
}

/// `struct N { field: type; ... }`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct StructDef {
    pub name: Rc<str>,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FieldDef {
    pub name: Rc<str>,
    pub declared_type: TypeName,
}

/// `func name(params) [: return_type] { body }`
///
/// Annotations are always parsed; dialects below v3 never read them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct FuncDef {
    pub name: Rc<str>,
    pub params: Vec<Param>,
    pub return_type: Option<TypeName>,
    pub body: Vec<Stmt>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Param {
    pub name: Rc<str>,
    pub declared_type: Option<TypeName>,
}

/// A type annotation as written in source. Resolution against the struct
/// table (and rejection of unknown names) happens at program load.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum TypeName {
    Int,
    Bool,
    String,
    Void,
    Struct(Rc<str>),
}

/// A possibly-dotted variable path: `a` or `a.b.c`.
///
/// The first segment names the variable; the rest walk struct fields. Paths
/// are short in practice, so the segments live inline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct VarPath {
    pub segments: SmallVec<[Rc<str>; 2]>,
}

impl VarPath {
    /// The variable segment (everything left of the first dot).
    pub fn base(&self) -> &Rc<str> {
        &self.segments[0]
    }

    pub fn is_dotted(&self) -> bool {
        self.segments.len() > 1
    }

    /// Renders the path as written, for error messages.
    pub fn display(&self) -> String {
        self.segments.join(".")
    }
}

/// A function call: shared between call statements and call expressions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct CallExpr {
    pub name: Rc<str>,
    pub args: Vec<ExprRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum Expr {
    IntLiteral(i64),
    StringLiteral(Rc<str>),
    BoolLiteral(bool),
    NilLiteral,
    Var(VarPath),
    Unary {
        op: UnaryOp,
        operand: ExprRef,
    },
    Binary {
        op: BinaryOp,
        lhs: ExprRef,
        rhs: ExprRef,
    },
    Call(CallExpr),
    /// `new T` — allocates a struct with defaulted fields (v3).
    New {
        struct_name: Rc<str>,
    },
}

/// Binary operators, rendered as their source symbol in error messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, IntoStaticStr, Serialize, Deserialize)]
pub(crate) enum BinaryOp {
    #[strum(serialize = "+")]
    Add,
    #[strum(serialize = "-")]
    Sub,
    #[strum(serialize = "*")]
    Mul,
    #[strum(serialize = "/")]
    Div,
    #[strum(serialize = "==")]
    Eq,
    #[strum(serialize = "!=")]
    NotEq,
    #[strum(serialize = "<")]
    Less,
    #[strum(serialize = "<=")]
    LessEq,
    #[strum(serialize = ">")]
    Greater,
    #[strum(serialize = ">=")]
    GreaterEq,
    #[strum(serialize = "&&")]
    And,
    #[strum(serialize = "||")]
    Or,
}

impl BinaryOp {
    pub fn symbol(self) -> &'static str {
        self.into()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub(crate) enum UnaryOp {
    /// Arithmetic negation (`-x`).
    Neg,
    /// Boolean not (`!x`).
    Not,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) enum Stmt {
    /// `var x;` / `var x: T;`
    VarDef {
        name: Rc<str>,
        declared_type: Option<TypeName>,
    },
    /// `lhs = expr;` — in v4 the right-hand side is deferred into a thunk.
    Assign {
        target: VarPath,
        expr: ExprRef,
    },
    /// A call evaluated for its side effects; the result is discarded.
    Call(CallExpr),
    If {
        condition: ExprRef,
        then_body: Vec<Stmt>,
        else_body: Vec<Stmt>,
    },
    For {
        init: Box<Stmt>,
        condition: ExprRef,
        update: Box<Stmt>,
        body: Vec<Stmt>,
    },
    Return {
        expr: Option<ExprRef>,
    },
    Try {
        body: Vec<Stmt>,
        catchers: Vec<Catcher>,
    },
    Raise {
        expr: ExprRef,
    },
}

/// One `catch "tag" { body }` arm of a `try`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub(crate) struct Catcher {
    pub tag: Rc<str>,
    pub body: Vec<Stmt>,
}
