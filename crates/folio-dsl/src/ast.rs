//! Syntax tree of block expressions.
//!
//! A block expression is a chain of bracketed segments joined by `&`/`|`,
//! e.g. `[?apple=red]&[?knife]`. Each segment is a condition (`?`) or an
//! instruction (`!`) over value expressions.

/// Binary operator between terms. Evaluated strictly left to right.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinOp {
    /// `+`: text union, integer addition.
    Union,
    /// `-`: text difference, integer subtraction.
    Difference,
    /// `/`: text intersection, integer division.
    Intersect,
    /// `*`: pairwise concatenation, integer multiplication.
    Concat,
}

/// Leaf of a value expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Primary {
    /// A literal text atom, or a noun name when used as a target.
    Atom(String),
    /// `#5`, `#-3`: an integer literal.
    Integer(i64),
    /// `#noun`: the integer part of a noun's value.
    IntegerOf(String),
    /// `@noun`: a noun's full value.
    Deref(String),
    /// `noun:verb` or `:verb`: run a verb, yielding whether it ran.
    VerbCall {
        /// Target noun; `None` means the current one.
        noun: Option<String>,
        /// Verb name.
        verb: String,
    },
    /// `( expr )`
    Group(Box<Expr>),
}

/// A primary, optionally applied as a function to an argument expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Item {
    /// A plain primary.
    Primary(Primary),
    /// `callee(args)`: the callee's atoms name functions chained over `args`.
    Call {
        /// Names of the functions to apply.
        callee: Primary,
        /// Argument expression; `None` for `callee()`.
        args: Option<Box<Expr>>,
    },
}

/// Comma-separated items, evaluated as their union.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Term(pub Vec<Item>);

/// A term followed by binary operations, folded left to right.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expr {
    /// Leftmost term.
    pub head: Term,
    /// Following operations, in source order.
    pub tail: Vec<(BinOp, Term)>,
}

impl Expr {
    /// An expression holding a single primary.
    pub fn primary(primary: Primary) -> Self {
        Self {
            head: Term(vec![Item::Primary(primary)]),
            tail: Vec::new(),
        }
    }

    /// The plain name this expression spells, if it is a lone atom.
    pub fn as_atom(&self) -> Option<&str> {
        match (self.head.0.as_slice(), self.tail.is_empty()) {
            ([Item::Primary(Primary::Atom(name))], true) => Some(name),
            _ => None,
        }
    }
}

/// Comparison operator of a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// `+=` or `=`: the subject holds every atom of the value.
    Contains,
    /// `-=`: the subject holds none of the value's atoms.
    NotContains,
    /// `==`
    Equals,
    /// `<>`
    NotEquals,
    /// `<=`
    EqualsOrLess,
    /// `>=`
    EqualsOrMore,
    /// `>`
    IsMore,
    /// `<`
    IsLess,
}

/// A condition segment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    /// An empty condition; always true.
    Always,
    /// `subject <cmp> value`. A missing subject means the current noun,
    /// a missing value means the empty value.
    Compare {
        /// Left-hand side.
        subject: Option<Expr>,
        /// Operator.
        comparison: Comparison,
        /// Right-hand side.
        value: Option<Expr>,
    },
    /// A bare expression, true when its value is non-empty.
    Bare(Expr),
}

/// Mutation applied by an instruction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InstructionOp {
    /// `+=`
    Add,
    /// `-=`
    Remove,
    /// `=`
    Assign,
}

/// What an instruction does before any break.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// `target <op> value`. A missing target means the current noun,
    /// a missing value means the empty value.
    Apply {
        /// Noun or nouns to mutate.
        target: Option<Expr>,
        /// Mutation.
        op: InstructionOp,
        /// Operand.
        value: Option<Expr>,
    },
    /// A bare expression, evaluated for its effects (verb calls, functions).
    Bare(Expr),
}

/// An instruction segment. A trailing run of `<` breaks out of that many
/// enclosing scopes after the action runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Instruction {
    /// The action; `None` for a bare break such as `[!<]`.
    pub action: Option<Action>,
    /// Number of trailing `<`.
    pub break_count: usize,
}

/// One bracketed segment of a chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// `[?...]`
    Condition(Condition),
    /// `[!...]`
    Instruction(Instruction),
    /// A segment that failed to parse; evaluates to false.
    Invalid,
}

/// Connector between chain segments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Connector {
    /// `&`
    And,
    /// `|`
    Or,
}

/// A full block expression.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chain {
    /// Leading segment.
    pub first: Segment,
    /// Remaining segments with the connector before each.
    pub rest: Vec<(Connector, Segment)>,
}

impl Chain {
    /// Whether every segment is a condition.
    pub fn is_condition(&self) -> bool {
        std::iter::once(&self.first)
            .chain(self.rest.iter().map(|(_, s)| s))
            .all(|s| matches!(s, Segment::Condition(_)))
    }
}
