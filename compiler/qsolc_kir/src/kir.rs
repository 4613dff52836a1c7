// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! Kernel IR node types. Nodes are immutable after lowering; the grounder reads them
//! against a scenario to produce Ground IR.

#![warn(missing_docs)]

use indenter::{indented, Format, Indented};
use qsolc_data_structures::span::Span;
use std::{
    fmt::{self, Display, Formatter, Write},
    rc::Rc,
};

fn set_indentation<'a, 'b>(
    indent: Indented<'a, Formatter<'b>>,
    level: usize,
) -> Indented<'a, Formatter<'b>> {
    let inserter: Box<indenter::Inserter> = Box::new(move |_, f| {
        for _ in 0..level {
            write!(f, "    ")?;
        }
        Ok(())
    });
    indent.with_format(Format::Custom {
        inserter: Box::leak(inserter),
    })
}

/// A lowered problem: declarations plus normalized constraints and objective.
#[derive(Clone, Debug)]
pub struct KernelProblem {
    /// The problem's name.
    pub name: Rc<str>,
    /// Declared sets, in declaration order.
    pub sets: Vec<SetDef>,
    /// Declared parameters, in declaration order.
    pub params: Vec<ParamDef>,
    /// Declared finds, in declaration order. Only primitive finds remain.
    pub finds: Vec<FindDef>,
    /// The constraints, hard and soft.
    pub constraints: Vec<Constraint>,
    /// The objective, canonicalized to minimization; absent if the problem has none.
    pub objective: Option<Expr>,
}

impl Display for KernelProblem {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Kernel {}:", self.name)?;
        indent = set_indentation(indent, 1);
        for set in &self.sets {
            write!(indent, "\nset {}", set.name)?;
        }
        for param in &self.params {
            write!(indent, "\n{param}")?;
        }
        for find in &self.finds {
            write!(indent, "\n{find}")?;
        }
        for constraint in &self.constraints {
            write!(indent, "\n{constraint}")?;
        }
        if let Some(objective) = &self.objective {
            write!(indent, "\nminimize {objective}")?;
        }
        Ok(())
    }
}

/// A declared set.
#[derive(Clone, Debug)]
pub struct SetDef {
    /// The set's name.
    pub name: Rc<str>,
    /// The declaration span.
    pub span: Span,
}

/// A declared parameter.
#[derive(Clone, Debug)]
pub struct ParamDef {
    /// The parameter's name.
    pub name: Rc<str>,
    /// Index sets; empty for scalar parameters.
    pub index: Vec<Rc<str>>,
    /// The value type.
    pub ty: ParamTy,
    /// The default value, if declared.
    pub default: Option<ConstValue>,
    /// The declaration span.
    pub span: Span,
}

impl Display for ParamDef {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "param {}", self.name)?;
        if !self.index.is_empty() {
            write!(f, "(")?;
            for (i, set) in self.index.iter().enumerate() {
                if i > 0 {
                    write!(f, ", ")?;
                }
                write!(f, "{set}")?;
            }
            write!(f, ")")?;
        }
        write!(f, ": {:?}", self.ty)?;
        if let Some(default) = &self.default {
            write!(f, " = {default}")?;
        }
        Ok(())
    }
}

/// A parameter value type.
#[derive(Clone, Debug, PartialEq)]
pub enum ParamTy {
    /// A boolean.
    Bool,
    /// An integer, optionally bounded.
    Int(Option<(i64, i64)>),
    /// A real.
    Real,
    /// An element of the named set.
    Elem(Rc<str>),
}

/// A constant value carried by a parameter default.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ConstValue {
    /// A boolean constant.
    Bool(bool),
    /// A numeric constant.
    Num(f64),
}

impl Display for ConstValue {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ConstValue::Bool(value) => write!(f, "{value}"),
            ConstValue::Num(value) => write!(f, "{value}"),
        }
    }
}

/// A declared primitive find.
#[derive(Clone, Debug)]
pub struct FindDef {
    /// The find's name.
    pub name: Rc<str>,
    /// The find's kind.
    pub kind: FindKind,
    /// The declaration span.
    pub span: Span,
}

impl Display for FindDef {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.kind {
            FindKind::Subset(set) => write!(f, "find {}: Subset({set})", self.name),
            FindKind::Mapping(dom, cod) => {
                write!(f, "find {}: Mapping({dom} -> {cod})", self.name)
            }
        }
    }
}

/// The kind of a primitive find.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FindKind {
    /// A subset of the named set.
    Subset(Rc<str>),
    /// A total mapping from domain to codomain.
    Mapping(Rc<str>, Rc<str>),
}

/// How strongly a constraint binds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WeightKind {
    /// A hard constraint.
    Hard,
    /// A soft constraint weighted 10.0.
    Should,
    /// A soft constraint weighted 1.0.
    Nice,
}

/// A normalized constraint.
#[derive(Clone, Debug)]
pub struct Constraint {
    /// The constraint's weight kind.
    pub weight: WeightKind,
    /// The boolean constraint expression. Guards have been folded into implications.
    pub expr: Expr,
    /// The declaration span.
    pub span: Span,
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "{:?}:", self.weight)?;
        indent = set_indentation(indent, 1);
        write!(indent, "\n{}", self.expr)?;
        Ok(())
    }
}

/// A kernel expression.
#[derive(Clone, Debug)]
pub struct Expr {
    /// The source span, kept for backend diagnostics.
    pub span: Span,
    /// The expression kind.
    pub kind: ExprKind,
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// A canonical comparison sense. `>`, `>=`, and `!=` are rewritten during lowering.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum CmpOp {
    /// Strictly less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Equal within the backend tolerance.
    Eq,
}

impl Display for CmpOp {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            CmpOp::Lt => f.write_str("<"),
            CmpOp::Le => f.write_str("<="),
            CmpOp::Eq => f.write_str("="),
        }
    }
}

/// A kernel expression kind.
#[derive(Clone, Debug)]
pub enum ExprKind {
    /// A boolean constant.
    Bool(bool),
    /// A numeric constant.
    Num(f64),
    /// An iterator variable reference, bound by an enclosing quantifier or sum.
    Iter(Rc<str>),
    /// A parameter read; `args` are element-valued index expressions, empty for
    /// scalars.
    Param(Rc<str>, Vec<Expr>),
    /// The cardinality of a declared set; a constant after grounding.
    Size(Rc<str>),
    /// Subset membership: `find.has(elem)`.
    Has(Rc<str>, Box<Expr>),
    /// Mapping assignment: `find.is(a, b)`.
    Is(Rc<str>, Box<Expr>, Box<Expr>),
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
    /// Division.
    Div(Box<Expr>, Box<Expr>),
    /// Conjunction.
    And(Box<Expr>, Box<Expr>),
    /// Disjunction.
    Or(Box<Expr>, Box<Expr>),
    /// Implication.
    Implies(Box<Expr>, Box<Expr>),
    /// A canonical comparison.
    Cmp(CmpOp, Box<Expr>, Box<Expr>),
    /// If-then-else over numeric or boolean branches.
    Ite(Box<Expr>, Box<Expr>, Box<Expr>),
    /// Summation of the body over a set.
    Sum {
        /// The iterator variable.
        iter: Rc<str>,
        /// The set summed over.
        set: Rc<str>,
        /// The numeric body.
        body: Box<Expr>,
    },
    /// Universal quantification of the body over a set.
    Forall {
        /// The iterator variable.
        iter: Rc<str>,
        /// The set quantified over.
        set: Rc<str>,
        /// The boolean body.
        body: Box<Expr>,
    },
    /// Existential quantification of the body over a set.
    Exists {
        /// The iterator variable.
        iter: Rc<str>,
        /// The set quantified over.
        set: Rc<str>,
        /// The boolean body.
        body: Box<Expr>,
    },
}

impl Display for ExprKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ExprKind::Bool(value) => write!(f, "{value}"),
            ExprKind::Num(value) => write!(f, "{value}"),
            ExprKind::Iter(name) => write!(f, "{name}"),
            ExprKind::Param(name, args) => {
                write!(f, "{name}")?;
                if !args.is_empty() {
                    write!(f, "[")?;
                    for (i, arg) in args.iter().enumerate() {
                        if i > 0 {
                            write!(f, ", ")?;
                        }
                        write!(f, "{arg}")?;
                    }
                    write!(f, "]")?;
                }
                Ok(())
            }
            ExprKind::Size(set) => write!(f, "size({set})"),
            ExprKind::Has(find, elem) => write!(f, "{find}.has({elem})"),
            ExprKind::Is(find, a, b) => write!(f, "{find}.is({a}, {b})"),
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
            ExprKind::Ite(cond, then, alt) => write!(f, "(if {cond} then {then} else {alt})"),
            ExprKind::Sum { iter, set, body } => write!(f, "(sum {iter} in {set}: {body})"),
            ExprKind::Forall { iter, set, body } => {
                write!(f, "(forall {iter} in {set}: {body})")
            }
            ExprKind::Exists { iter, set, body } => {
                write!(f, "(exists {iter} in {set}: {body})")
            }
        }
    }
}
