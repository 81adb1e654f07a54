//! Postfix formula tokens.
//!
//! A formula arrives already parsed, as a sequence of tokens in reverse-Polish
//! order: operands push, operators and calls pop. The control tokens
//! (`AttrIf`, `AttrSkip`, `AttrSum`) follow the layout the legacy binary format
//! uses for lazily evaluated `IF`; their `skip` distances are counted in tokens.

use std::fmt;
use std::sync::Arc;

use gridcalc_common::{ArrayValue, CellRef, ErrorCode};

/// Shared, immutable token sequence for one formula.
pub type TokenStream = Arc<[Token]>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    Plus,
    Minus,
    Percent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Pow,
    Concat,
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    /// `A1:B2` built from two reference operands.
    Range,
    /// Space operator; overlap of two references.
    Intersect,
}

impl BinaryOp {
    pub fn is_comparison(self) -> bool {
        matches!(
            self,
            Self::Eq | Self::Ne | Self::Lt | Self::Le | Self::Gt | Self::Ge
        )
    }

    pub fn is_reference_op(self) -> bool {
        matches!(self, Self::Range | Self::Intersect)
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Pow => "^",
            Self::Concat => "&",
            Self::Eq => "=",
            Self::Ne => "<>",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Range => ":",
            Self::Intersect => " ",
        }
    }
}

/// How a call token names its function.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum FunctionId {
    Name(String),
    /// Function-table index of the legacy binary format.
    Index(u16),
}

impl From<&str> for FunctionId {
    fn from(name: &str) -> Self {
        FunctionId::Name(name.to_string())
    }
}

impl From<u16> for FunctionId {
    fn from(index: u16) -> Self {
        FunctionId::Index(index)
    }
}

impl fmt::Display for FunctionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionId::Name(n) => f.write_str(n),
            FunctionId::Index(i) => write!(f, "#{i}"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /* ───── literals ───── */
    Number(f64),
    Text(String),
    Bool(bool),
    Error(ErrorCode),
    /// An omitted argument (`IF(A1,,2)`).
    MissingArg,
    Array(ArrayValue),

    /* ───── references ───── */
    /// Cell on the formula's own sheet.
    Ref { row: u32, col: u32 },
    Area {
        first_row: u32,
        last_row: u32,
        first_col: u32,
        last_col: u32,
    },
    /// Cell through the extern-sheet table (possibly spanning sheets).
    Ref3d { extern_sheet: u32, row: u32, col: u32 },
    Area3d {
        extern_sheet: u32,
        first_row: u32,
        last_row: u32,
        first_col: u32,
        last_col: u32,
    },
    /// References whose target was deleted; they evaluate to `#REF!`.
    RefErr,
    AreaErr,
    DeletedRef3d { extern_sheet: u32 },
    DeletedArea3d { extern_sheet: u32 },
    /// Defined name.
    Name(String),

    /* ───── operators ───── */
    Unary(UnaryOp),
    Binary(BinaryOp),
    /// Display-only parentheses.
    Paren,

    /* ───── calls ───── */
    /// Call with the arity the function declares.
    Func(FunctionId),
    /// Call with an explicit argument count.
    FuncVar { id: FunctionId, argc: usize },

    /* ───── control ───── */
    /// Pops the `IF` condition; when false, skips `skip` tokens to the false branch.
    AttrIf { skip: usize },
    /// Unconditional forward jump of `skip` tokens.
    AttrSkip { skip: usize },
    /// `SUM` of the single operand on top of the stack.
    AttrSum,
}

impl Token {
    /// Cell reference on the formula's sheet from `A1` text.
    pub fn ref_a1(text: &str) -> Option<Token> {
        let cell = CellRef::parse_a1(0, text)?;
        Some(Token::Ref {
            row: cell.row,
            col: cell.col,
        })
    }

    /// Area reference on the formula's sheet from `A1:B2` text.
    pub fn area_a1(text: &str) -> Option<Token> {
        let (a, b) = text.split_once(':')?;
        let a = CellRef::parse_a1(0, a)?;
        let b = CellRef::parse_a1(0, b)?;
        Some(Token::Area {
            first_row: a.row.min(b.row),
            last_row: a.row.max(b.row),
            first_col: a.col.min(b.col),
            last_col: a.col.max(b.col),
        })
    }

    pub fn text(s: impl Into<String>) -> Token {
        Token::Text(s.into())
    }

    pub fn func(name: &str) -> Token {
        Token::Func(FunctionId::from(name))
    }

    pub fn call(name: &str, argc: usize) -> Token {
        Token::FuncVar {
            id: FunctionId::from(name),
            argc,
        }
    }

    /// Lay out `IF(condition, when_true[, when_false])` with the jump tokens
    /// a lazily evaluated `IF` uses:
    ///
    /// `cond AttrIf t.. AttrSkip [f.. AttrSkip] IF`
    ///
    /// Each branch ends in a skip that jumps past the call itself.
    pub fn lazy_if(
        condition: Vec<Token>,
        when_true: Vec<Token>,
        when_false: Option<Vec<Token>>,
    ) -> Vec<Token> {
        let mut out = condition;
        out.push(Token::AttrIf {
            skip: when_true.len() + 1,
        });
        out.extend(when_true);
        match when_false {
            Some(f) => {
                out.push(Token::AttrSkip { skip: f.len() + 2 });
                out.extend(f);
                out.push(Token::AttrSkip { skip: 1 });
                out.push(Token::call("IF", 3));
            }
            None => {
                out.push(Token::AttrSkip { skip: 1 });
                out.push(Token::call("IF", 2));
            }
        }
        out
    }

    pub fn is_operand(&self) -> bool {
        !matches!(
            self,
            Token::Unary(_)
                | Token::Binary(_)
                | Token::Paren
                | Token::Func(_)
                | Token::FuncVar { .. }
                | Token::AttrIf { .. }
                | Token::AttrSkip { .. }
                | Token::AttrSum
        )
    }

    pub fn function_id(&self) -> Option<&FunctionId> {
        match self {
            Token::Func(id) | Token::FuncVar { id, .. } => Some(id),
            _ => None,
        }
    }
}
