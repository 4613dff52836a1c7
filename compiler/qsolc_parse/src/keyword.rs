// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use enum_iterator::Sequence;
use std::{
    fmt::{self, Display, Formatter},
    str::FromStr,
};

#[derive(Clone, Copy, Debug, Eq, Hash, PartialEq, Sequence)]
pub enum Keyword {
    All,
    And,
    Any,
    Bool,
    Comp,
    Count,
    Elem,
    Else,
    Exists,
    False,
    Find,
    For,
    Forall,
    Function,
    If,
    In,
    Int,
    Laws,
    Mapping,
    Maximize,
    Minimize,
    Must,
    Nice,
    Not,
    Or,
    Param,
    Predicate,
    Problem,
    Real,
    Rep,
    Set,
    Should,
    Size,
    Subset,
    Sum,
    Then,
    True,
    Unknown,
    Use,
    View,
    Where,
}

impl Keyword {
    pub(super) fn as_str(self) -> &'static str {
        match self {
            Self::All => "all",
            Self::And => "and",
            Self::Any => "any",
            Self::Bool => "Bool",
            Self::Comp => "Comp",
            Self::Count => "count",
            Self::Elem => "Elem",
            Self::Else => "else",
            Self::Exists => "exists",
            Self::False => "false",
            Self::Find => "find",
            Self::For => "for",
            Self::Forall => "forall",
            Self::Function => "function",
            Self::If => "if",
            Self::In => "in",
            Self::Int => "Int",
            Self::Laws => "laws",
            Self::Mapping => "Mapping",
            Self::Maximize => "maximize",
            Self::Minimize => "minimize",
            Self::Must => "must",
            Self::Nice => "nice",
            Self::Not => "not",
            Self::Or => "or",
            Self::Param => "param",
            Self::Predicate => "predicate",
            Self::Problem => "problem",
            Self::Real => "Real",
            Self::Rep => "rep",
            Self::Set => "set",
            Self::Should => "should",
            Self::Size => "size",
            Self::Subset => "Subset",
            Self::Sum => "sum",
            Self::Then => "then",
            Self::True => "true",
            Self::Unknown => "unknown",
            Self::Use => "use",
            Self::View => "view",
            Self::Where => "where",
        }
    }
}

impl Display for Keyword {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Keyword {
    type Err = ();

    // Use a match expression so that the Rust compiler can optimize the string
    // comparisons better. Cases are ordered by rough frequency in QSOL sources so
    // fewer comparisons are needed on average.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in" => Ok(Self::In),
            "for" => Ok(Self::For),
            "must" => Ok(Self::Must),
            "sum" => Ok(Self::Sum),
            "if" => Ok(Self::If),
            "then" => Ok(Self::Then),
            "else" => Ok(Self::Else),
            "and" => Ok(Self::And),
            "or" => Ok(Self::Or),
            "not" => Ok(Self::Not),
            "forall" => Ok(Self::Forall),
            "exists" => Ok(Self::Exists),
            "where" => Ok(Self::Where),
            "set" => Ok(Self::Set),
            "param" => Ok(Self::Param),
            "find" => Ok(Self::Find),
            "count" => Ok(Self::Count),
            "size" => Ok(Self::Size),
            "Subset" => Ok(Self::Subset),
            "Mapping" => Ok(Self::Mapping),
            "problem" => Ok(Self::Problem),
            "minimize" => Ok(Self::Minimize),
            "maximize" => Ok(Self::Maximize),
            "should" => Ok(Self::Should),
            "nice" => Ok(Self::Nice),
            "Real" => Ok(Self::Real),
            "Bool" => Ok(Self::Bool),
            "Int" => Ok(Self::Int),
            "Elem" => Ok(Self::Elem),
            "true" => Ok(Self::True),
            "false" => Ok(Self::False),
            "any" => Ok(Self::Any),
            "all" => Ok(Self::All),
            "use" => Ok(Self::Use),
            "unknown" => Ok(Self::Unknown),
            "predicate" => Ok(Self::Predicate),
            "function" => Ok(Self::Function),
            "rep" => Ok(Self::Rep),
            "laws" => Ok(Self::Laws),
            "view" => Ok(Self::View),
            "Comp" => Ok(Self::Comp),
            _ => Err(()),
        }
    }
}
