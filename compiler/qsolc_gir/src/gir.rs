// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Ground IR node types. Labels follow the stable grammar `Name.has[s]` and
//! `Name.is[a,b]`; auxiliary binaries introduced by the backend are prefixed `aux:` and
//! slack binaries `slack_`.

#![warn(missing_docs)]

use qsolc_data_structures::span::Span;
pub use qsolc_kir::kir::{CmpOp, WeightKind};

/// The comparison tolerance shared by the grounder's constant folding and the
/// backend's encoding and feasibility checks. Values exactly on the boundary are
/// intentionally indeterminate.
pub const EPSILON: f64 = 1e-6;
use rustc_hash::FxHashMap;
use std::{
    fmt::{self, Display, Formatter},
    rc::Rc,
};

/// A handle to a declared binary variable.
#[derive(Clone, Copy, Debug, Eq, Hash, Ord, PartialEq, PartialOrd)]
pub struct VarId(usize);

impl From<VarId> for usize {
    fn from(value: VarId) -> Self {
        value.0
    }
}

impl Display for VarId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// What role a binary variable plays in the model.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum VarKind {
    /// A decision variable from a find; appears in the varmap.
    Primary,
    /// An auxiliary binary introduced by boolean linearization; excluded from the
    /// varmap.
    Aux,
    /// A slack binary introduced by inequality penalty conversion; excluded from the
    /// varmap.
    Slack,
}

/// A declared binary variable.
#[derive(Clone, Debug)]
pub struct VarDecl {
    /// The stable label, e.g. `Pick.has[i1]` or `aux:3`.
    pub label: Rc<str>,
    /// The user-level meaning, e.g. `Pick.has(i1)`; empty for aux/slack binaries.
    pub meaning: Rc<str>,
    /// The variable's role.
    pub kind: VarKind,
}

/// The variable universe of one ground problem. The grounder declares primary
/// variables; the backend extends the table with auxiliaries and slacks.
#[derive(Clone, Debug, Default)]
pub struct VarTable {
    vars: Vec<VarDecl>,
    by_label: FxHashMap<Rc<str>, VarId>,
}

impl VarTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a variable, returning its id. Declaring the same label twice returns
    /// the existing id.
    pub fn declare(&mut self, label: Rc<str>, meaning: Rc<str>, kind: VarKind) -> VarId {
        if let Some(&id) = self.by_label.get(&label) {
            return id;
        }
        let id = VarId(self.vars.len());
        self.by_label.insert(Rc::clone(&label), id);
        self.vars.push(VarDecl {
            label,
            meaning,
            kind,
        });
        id
    }

    /// Looks up a variable by label.
    #[must_use]
    pub fn find(&self, label: &str) -> Option<VarId> {
        self.by_label.get(label).copied()
    }

    /// The declaration for an id.
    #[must_use]
    pub fn get(&self, id: VarId) -> &VarDecl {
        &self.vars[id.0]
    }

    /// The number of declared variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Whether the table is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Iterates variables in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (VarId, &VarDecl)> {
        self.vars
            .iter()
            .enumerate()
            .map(|(index, decl)| (VarId(index), decl))
    }
}

/// A ground problem: finite constraints and objective over binary variables.
#[derive(Clone, Debug)]
pub struct GroundProblem {
    /// The problem's name.
    pub name: Rc<str>,
    /// The variable universe.
    pub vars: VarTable,
    /// The ground finds, in declaration order, with their variable blocks.
    pub finds: Vec<GroundFind>,
    /// The ground constraints.
    pub constraints: Vec<GroundConstraint>,
    /// The objective, if declared; already canonicalized to minimization.
    pub objective: Option<Expr>,
}

/// A find with its expanded variable block.
#[derive(Clone, Debug)]
pub struct GroundFind {
    /// The find's name.
    pub name: Rc<str>,
    /// The expanded block.
    pub kind: GroundFindKind,
}

/// The expanded variable block of a find.
#[derive(Clone, Debug)]
pub enum GroundFindKind {
    /// One membership binary per element.
    Subset {
        /// The elements of the underlying set, in order.
        elems: Vec<Rc<str>>,
        /// The membership variable for each element.
        vars: Vec<VarId>,
    },
    /// One assignment binary per domain-codomain pair. Every feasible solution sets
    /// exactly one variable per domain row (the one-hot law).
    Mapping {
        /// The domain elements, in order.
        domain: Vec<Rc<str>>,
        /// The codomain elements, in order.
        codomain: Vec<Rc<str>>,
        /// `vars[d][c]` is the binary for mapping domain element `d` to codomain
        /// element `c`.
        vars: Vec<Vec<VarId>>,
    },
}

/// A ground constraint.
#[derive(Clone, Debug)]
pub struct GroundConstraint {
    /// The constraint's weight kind.
    pub weight: WeightKind,
    /// The finite boolean expression.
    pub expr: Expr,
    /// The source span of the originating constraint.
    pub span: Span,
}

/// A ground expression.
#[derive(Clone, Debug)]
pub struct Expr {
    /// The source span, kept for backend diagnostics.
    pub span: Span,
    /// The expression kind.
    pub kind: ExprKind,
}

/// A ground expression kind. Every leaf is a constant or a binary variable.
#[derive(Clone, Debug)]
pub enum ExprKind {
    /// A numeric constant.
    Const(f64),
    /// A boolean constant.
    Bool(bool),
    /// A binary decision variable.
    Var(VarId),
    /// Arithmetic negation.
    Neg(Box<Expr>),
    /// Boolean negation.
    Not(Box<Expr>),
    /// Addition.
    Add(Box<Expr>, Box<Expr>),
    /// Subtraction.
    Sub(Box<Expr>, Box<Expr>),
    /// Multiplication.
    Mul(Box<Expr>, Box<Expr>),
    /// Division; the right-hand side is a non-zero constant after grounding.
    Div(Box<Expr>, Box<Expr>),
    /// Conjunction.
    And(Box<Expr>, Box<Expr>),
    /// Disjunction.
    Or(Box<Expr>, Box<Expr>),
    /// Implication.
    Implies(Box<Expr>, Box<Expr>),
    /// A canonical comparison.
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
    /// If-then-else.
    Ite(Box<Expr>, Box<Expr>, Box<Expr>),
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.kind {
            ExprKind::Const(value) => write!(f, "{value}"),
            ExprKind::Bool(value) => write!(f, "{value}"),
            ExprKind::Var(id) => write!(f, "{id}"),
            ExprKind::Neg(operand) => write!(f, "(- {operand})"),
            ExprKind::Not(operand) => write!(f, "(not {operand})"),
            ExprKind::Add(lhs, rhs) => write!(f, "({lhs} + {rhs})"),
            ExprKind::Sub(lhs, rhs) => write!(f, "({lhs} - {rhs})"),
            ExprKind::Mul(lhs, rhs) => write!(f, "({lhs} * {rhs})"),
            ExprKind::Div(lhs, rhs) => write!(f, "({lhs} / {rhs})"),
            ExprKind::And(lhs, rhs) => write!(f, "({lhs} and {rhs})"),
            ExprKind::Or(lhs, rhs) => write!(f, "({lhs} or {rhs})"),
            ExprKind::Implies(lhs, rhs) => write!(f, "({lhs} => {rhs})"),
            ExprKind::Cmp(op, lhs, rhs) => write!(f, "({lhs} {op} {rhs})"),
            ExprKind::Ite(cond, then, alt) => {
                write!(f, "(if {cond} then {then} else {alt})")
            }
        }
    }
}
