// AST (Abstract Syntax Tree) definitions for the Respawn language

use std::fmt;
use std::rc::Rc;

/// Source location information for error reporting
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    pub fn new(line: usize, column: usize) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}, column {}", self.line, self.column)
    }
}

/// Half-open source range: `end` points just past the last character.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn new(start: SourceLocation, end: SourceLocation) -> Self {
        Self { start, end }
    }

    /// Zero-width span at a single location
    pub fn point(location: SourceLocation) -> Self {
        Self {
            start: location,
            end: SourceLocation::new(location.line, location.column + 1),
        }
    }

    /// Smallest span covering both `self` and `other`
    pub fn to(self, other: SourceSpan) -> Self {
        Self {
            start: self.start.min(other.start),
            end: self.end.max(other.end),
        }
    }
}

/// The four scalar kinds of the language
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    Hp,
    Xp,
    Comms,
    Flag,
}

impl ScalarType {
    pub fn is_numeric(self) -> bool {
        matches!(self, ScalarType::Hp | ScalarType::Xp)
    }
}

impl fmt::Display for ScalarType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ScalarType::Hp => "hp",
            ScalarType::Xp => "xp",
            ScalarType::Comms => "comms",
            ScalarType::Flag => "flag",
        };
        f.write_str(name)
    }
}

/// Binary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Pow,
    // Comparison
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    // Logical
    And,
    Or,
}

impl BinOp {
    pub fn is_arithmetic(self) -> bool {
        matches!(
            self,
            BinOp::Add | BinOp::Sub | BinOp::Mul | BinOp::Div | BinOp::Mod | BinOp::Pow
        )
    }

    pub fn is_relational(self) -> bool {
        matches!(
            self,
            BinOp::Eq | BinOp::Ne | BinOp::Lt | BinOp::Le | BinOp::Gt | BinOp::Ge
        )
    }

    pub fn is_equality(self) -> bool {
        matches!(self, BinOp::Eq | BinOp::Ne)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            BinOp::Add => "+",
            BinOp::Sub => "-",
            BinOp::Mul => "*",
            BinOp::Div => "/",
            BinOp::Mod => "%",
            BinOp::Pow => "^",
            BinOp::Eq => "==",
            BinOp::Ne => "!=",
            BinOp::Lt => "<",
            BinOp::Le => "<=",
            BinOp::Gt => ">",
            BinOp::Ge => ">=",
            BinOp::And => "AND",
            BinOp::Or => "OR",
        }
    }
}

/// Unary operators
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnOp {
    Neg, // -x
    Not, // !x
}

/// Assignment operators (`:` and the compound forms)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignOp {
    Set,
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl AssignOp {
    /// The arithmetic operator a compound assignment applies, if any
    pub fn binary_op(self) -> Option<BinOp> {
        match self {
            AssignOp::Set => None,
            AssignOp::Add => Some(BinOp::Add),
            AssignOp::Sub => Some(BinOp::Sub),
            AssignOp::Mul => Some(BinOp::Mul),
            AssignOp::Div => Some(BinOp::Div),
            AssignOp::Mod => Some(BinOp::Mod),
        }
    }
}

/// Single-operand built-ins that map a scalar to a scalar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Conversion {
    ToHp,
    ToXp,
    ToComms,
    LevelUp,
    LevelDown,
}

impl Conversion {
    pub fn name(self) -> &'static str {
        match self {
            Conversion::ToHp => "toHp",
            Conversion::ToXp => "toXp",
            Conversion::ToComms => "toComms",
            Conversion::LevelUp => "levelUp",
            Conversion::LevelDown => "levelDown",
        }
    }
}

/// The two interactive input built-ins
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputKind {
    Load,
    LoadNum,
}

impl InputKind {
    pub fn name(self) -> &'static str {
        match self {
            InputKind::Load => "load",
            InputKind::LoadNum => "loadNum",
        }
    }
}

/// A reference to a whole array or to one row of a 2-D array
#[derive(Debug, Clone)]
pub struct ArrayRef {
    pub name: String,
    pub row: Option<Box<Expr>>,
    pub span: SourceSpan,
}

/// What `seek` looks for: a scalar element, or a whole row of a 2-D array
#[derive(Debug, Clone)]
pub enum SeekNeedle {
    Value(Box<Expr>),
    Row(Vec<Expr>),
}

/// Argument of `rounds(...)`
#[derive(Debug, Clone)]
pub enum RoundsTarget {
    Array(ArrayRef),
    Value(Box<Expr>),
}

/// Expressions
#[derive(Debug, Clone)]
pub enum Expr {
    HpLiteral(i64, SourceSpan),
    XpLiteral(f64, SourceSpan),
    CommsLiteral(String, SourceSpan),
    FlagLiteral(bool, SourceSpan),
    Dead(SourceSpan),
    Variable {
        name: String,
        span: SourceSpan,
    },
    /// `a[i]`, `m[i][j]`, or `s[i]` on a comms variable
    Index {
        name: String,
        indices: Vec<Expr>,
        span: SourceSpan,
    },
    Field {
        instance: String,
        field: String,
        span: SourceSpan,
    },
    Unary {
        op: UnOp,
        operand: Box<Expr>,
        span: SourceSpan,
    },
    Binary {
        op: BinOp,
        left: Box<Expr>,
        right: Box<Expr>,
        span: SourceSpan,
    },
    /// `a < b <= c`: every adjacent pair must hold
    Chain {
        operands: Vec<Expr>,
        ops: Vec<BinOp>,
        span: SourceSpan,
    },
    Call {
        name: String,
        args: Vec<Expr>,
        span: SourceSpan,
    },
    Convert {
        conversion: Conversion,
        operand: Box<Expr>,
        span: SourceSpan,
    },
    /// `expr.Nf`
    Format {
        operand: Box<Expr>,
        digits: usize,
        span: SourceSpan,
    },
    Rounds {
        target: RoundsTarget,
        span: SourceSpan,
    },
    Seek {
        array: ArrayRef,
        needle: SeekNeedle,
        span: SourceSpan,
    },
    Drop {
        array: ArrayRef,
        index: Option<Box<Expr>>,
        span: SourceSpan,
    },
}

impl Expr {
    pub fn span(&self) -> SourceSpan {
        match self {
            Expr::HpLiteral(_, span)
            | Expr::XpLiteral(_, span)
            | Expr::CommsLiteral(_, span)
            | Expr::FlagLiteral(_, span)
            | Expr::Dead(span) => *span,
            Expr::Variable { span, .. }
            | Expr::Index { span, .. }
            | Expr::Field { span, .. }
            | Expr::Unary { span, .. }
            | Expr::Binary { span, .. }
            | Expr::Chain { span, .. }
            | Expr::Call { span, .. }
            | Expr::Convert { span, .. }
            | Expr::Format { span, .. }
            | Expr::Rounds { span, .. }
            | Expr::Seek { span, .. }
            | Expr::Drop { span, .. } => *span,
        }
    }
}

/// Right-hand side of a declaration or assignment
#[derive(Debug, Clone)]
pub enum Rhs {
    Expr(Expr),
    Input {
        kind: InputKind,
        prompt: Box<Expr>,
        span: SourceSpan,
    },
}

impl Rhs {
    pub fn span(&self) -> SourceSpan {
        match self {
            Rhs::Expr(expr) => expr.span(),
            Rhs::Input { span, .. } => *span,
        }
    }
}

/// Initializer of a scalar declaration
#[derive(Debug, Clone)]
pub enum VarInit {
    /// No initializer: the type's default value
    Default,
    Dead,
    /// One right-hand side shared by every name (or spread from a multi-value recall)
    Shared(Rhs),
    /// One initializer per name
    Each(Vec<Expr>),
}

/// Declared size of one array dimension
#[derive(Debug, Clone, PartialEq)]
pub enum DimSize {
    Unsized,
    Fixed(usize),
    /// Bound from an `hp` variable once, at declaration
    Named(String, SourceSpan),
}

/// Array literal of rank 1 or 2
#[derive(Debug, Clone)]
pub enum ArrayLiteral {
    Flat(Vec<Expr>),
    Nested(Vec<Vec<Expr>>),
}

impl ArrayLiteral {
    pub fn rank(&self) -> usize {
        match self {
            ArrayLiteral::Flat(_) => 1,
            ArrayLiteral::Nested(_) => 2,
        }
    }
}

/// Initializer of an array declaration
#[derive(Debug, Clone)]
pub enum ArrayInit {
    Default,
    Dead,
    Literal(ArrayLiteral),
    Copy(String),
    DropRow {
        array: ArrayRef,
        index: Option<Box<Expr>>,
    },
}

/// Field of a `build` struct type
#[derive(Debug, Clone)]
pub struct FieldDecl {
    pub name: String,
    pub field_type: ScalarType,
    pub default: Option<Expr>,
    pub span: SourceSpan,
}

/// Function parameter
#[derive(Debug, Clone)]
pub struct Param {
    pub name: String,
    pub default: Option<Expr>,
}

/// Left-hand side of an assignment
#[derive(Debug, Clone)]
pub enum AssignTarget {
    Variable(String),
    Element { name: String, indices: Vec<Expr> },
    Field { instance: String, field: String },
    CommsChar { name: String, index: Box<Expr> },
}

impl AssignTarget {
    pub fn root_name(&self) -> &str {
        match self {
            AssignTarget::Variable(name)
            | AssignTarget::Element { name, .. }
            | AssignTarget::CommsChar { name, .. } => name,
            AssignTarget::Field { instance, .. } => instance,
        }
    }
}

/// What `join` appends
#[derive(Debug, Clone)]
pub enum JoinValue {
    Scalar(Expr),
    Row(Vec<Expr>),
}

/// One `choice` arm of a `flank`
#[derive(Debug, Clone)]
pub struct ChoiceArm {
    pub values: Vec<Expr>,
    pub body: Vec<Stmt>,
    pub span: SourceSpan,
}

/// Statements (and top-level items)
#[derive(Debug, Clone)]
pub enum Stmt {
    VarDecl {
        var_type: ScalarType,
        names: Vec<String>,
        init: VarInit,
        immutable: bool,
        span: SourceSpan,
    },
    ArrayDecl {
        element_type: ScalarType,
        name: String,
        dims: Vec<DimSize>,
        init: ArrayInit,
        immutable: bool,
        span: SourceSpan,
    },
    StructDef {
        name: String,
        fields: Vec<FieldDecl>,
        span: SourceSpan,
    },
    StructInstance {
        struct_name: String,
        name: String,
        args: Vec<Expr>,
        immutable: bool,
        span: SourceSpan,
    },
    FunctionDef {
        name: String,
        params: Vec<Param>,
        body: Rc<Vec<Stmt>>,
        span: SourceSpan,
    },
    Play {
        body: Vec<Stmt>,
        span: SourceSpan,
    },
    Assign {
        target: AssignTarget,
        op: AssignOp,
        value: Rhs,
        span: SourceSpan,
    },
    If {
        branches: Vec<(Expr, Vec<Stmt>)>,
        else_branch: Option<Vec<Stmt>>,
        span: SourceSpan,
    },
    Flank {
        subject: Expr,
        arms: Vec<ChoiceArm>,
        backup: Vec<Stmt>,
        span: SourceSpan,
    },
    For {
        counter: String,
        start: Expr,
        condition: Expr,
        update: Box<Stmt>,
        body: Vec<Stmt>,
        span: SourceSpan,
    },
    While {
        condition: Expr,
        body: Vec<Stmt>,
        span: SourceSpan,
    },
    Grind {
        body: Vec<Stmt>,
        condition: Expr,
        span: SourceSpan,
    },
    Checkpoint(SourceSpan),
    Resume(SourceSpan),
    Recall {
        values: Vec<Expr>,
        span: SourceSpan,
    },
    Shoot {
        value: Expr,
        newline: bool,
        span: SourceSpan,
    },
    Join {
        array: ArrayRef,
        value: JoinValue,
        span: SourceSpan,
    },
    /// Expression evaluated for effect (function calls, `drop`)
    Expr(Expr),
}

impl Stmt {
    pub fn span(&self) -> SourceSpan {
        match self {
            Stmt::VarDecl { span, .. }
            | Stmt::ArrayDecl { span, .. }
            | Stmt::StructDef { span, .. }
            | Stmt::StructInstance { span, .. }
            | Stmt::FunctionDef { span, .. }
            | Stmt::Play { span, .. }
            | Stmt::Assign { span, .. }
            | Stmt::If { span, .. }
            | Stmt::Flank { span, .. }
            | Stmt::For { span, .. }
            | Stmt::While { span, .. }
            | Stmt::Grind { span, .. }
            | Stmt::Recall { span, .. }
            | Stmt::Shoot { span, .. }
            | Stmt::Join { span, .. } => *span,
            Stmt::Checkpoint(span) | Stmt::Resume(span) => *span,
            Stmt::Expr(expr) => expr.span(),
        }
    }
}

/// A parsed and checked program: top-level items in document order
#[derive(Debug, Clone, Default)]
pub struct Program {
    pub items: Vec<Stmt>,
}

impl Program {
    pub fn new() -> Self {
        Program { items: Vec::new() }
    }
}
