// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

//! AST node types for QSOL. Every node carries a [`NodeId`] and a [`Span`]; ids are
//! placeholders until the [`crate::assigner`] pass replaces them with unique values.

#![warn(missing_docs)]

use indenter::{indented, Format, Indented};
use qsolc_data_structures::span::{Span, WithSpan};
use std::{
    cmp::Ordering,
    fmt::{self, Display, Formatter, Write},
    hash::{Hash, Hasher},
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

/// The unique identifier for an AST node.
#[derive(Clone, Copy, Debug)]
pub struct NodeId(u32);

impl NodeId {
    const DEFAULT_VALUE: u32 = u32::MAX;

    /// The ID of the first node.
    pub const FIRST: Self = Self(0);

    /// The successor of this ID.
    #[must_use]
    pub fn successor(self) -> Self {
        Self(self.0 + 1)
    }

    /// True if this is the default ID.
    #[must_use]
    pub fn is_default(self) -> bool {
        self.0 == Self::DEFAULT_VALUE
    }
}

impl Default for NodeId {
    fn default() -> Self {
        Self(Self::DEFAULT_VALUE)
    }
}

impl Display for NodeId {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        if self.is_default() {
            f.write_str("_id_")
        } else {
            self.0.fmt(f)
        }
    }
}

impl From<NodeId> for usize {
    fn from(value: NodeId) -> Self {
        assert!(!value.is_default(), "default node ID should be replaced");
        value.0 as usize
    }
}

impl From<usize> for NodeId {
    fn from(value: usize) -> Self {
        NodeId(u32::try_from(value).expect("node ID should fit into u32"))
    }
}

impl PartialEq for NodeId {
    fn eq(&self, other: &Self) -> bool {
        assert!(!self.is_default(), "default node ID should be replaced");
        self.0 == other.0
    }
}

impl Eq for NodeId {}

impl PartialOrd for NodeId {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for NodeId {
    fn cmp(&self, other: &Self) -> Ordering {
        assert!(!self.is_default(), "default node ID should be replaced");
        self.0.cmp(&other.0)
    }
}

impl Hash for NodeId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.hash(state);
    }
}

/// An identifier.
#[derive(Clone, Debug)]
pub struct Ident {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The identifier name.
    pub name: Rc<str>,
}

impl Default for Ident {
    fn default() -> Self {
        Ident {
            id: NodeId::default(),
            span: Span::default(),
            name: "".into(),
        }
    }
}

impl WithSpan for Ident {
    fn with_span(self, span: Span) -> Self {
        Self { span, ..self }
    }
}

impl Display for Ident {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Ident {} {} \"{}\"", self.id, self.span, self.name)
    }
}

/// A dotted module path, as written in a `use` item.
#[derive(Clone, Debug)]
pub struct Path {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The dot-separated segments.
    pub parts: Box<[Ident]>,
}

impl Path {
    /// The path joined with dots, e.g. `stdlib.constraints`.
    #[must_use]
    pub fn joined(&self) -> String {
        self.parts
            .iter()
            .map(|part| part.name.as_ref())
            .collect::<Vec<_>>()
            .join(".")
    }
}

impl Display for Path {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Path {} {} \"{}\"", self.id, self.span, self.joined())
    }
}

/// The root node of a QSOL program: the ordered list of top-level items after module
/// loading has concatenated all imports.
#[derive(Clone, Debug, Default)]
pub struct Program {
    /// The node ID.
    pub id: NodeId,
    /// The top-level items, imports first.
    pub items: Box<[Item]>,
}

impl Display for Program {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Program {}:", self.id)?;
        indent = set_indentation(indent, 1);
        for item in &*self.items {
            write!(indent, "\n{item}")?;
        }
        Ok(())
    }
}

/// A top-level item.
#[derive(Clone, Debug)]
pub struct Item {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The item kind.
    pub kind: Box<ItemKind>,
}

impl Display for Item {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Item {} {}:", self.id, self.span)?;
        indent = set_indentation(indent, 1);
        write!(indent, "\n{}", self.kind)?;
        Ok(())
    }
}

/// A top-level item kind.
#[derive(Clone, Debug)]
pub enum ItemKind {
    /// A `use` import of another module.
    Use(Path),
    /// A user-defined unknown.
    Unknown(Box<UnknownDef>),
    /// A predicate macro (boolean-valued).
    Predicate(Box<MacroDef>),
    /// A function macro (real-valued).
    Function(Box<MacroDef>),
    /// A problem definition.
    Problem(Box<ProblemDef>),
}

impl Display for ItemKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ItemKind::Use(path) => write!(f, "Use: {path}"),
            ItemKind::Unknown(def) => write!(f, "{def}"),
            ItemKind::Predicate(def) => write!(f, "Predicate: {def}"),
            ItemKind::Function(def) => write!(f, "Function: {def}"),
            ItemKind::Problem(def) => write!(f, "{def}"),
        }
    }
}

/// A user-defined unknown: a decision-structure constructor expanded by the elaborator
/// into primitive finds (`rep`), generated constraints (`laws`), and inlined accessors
/// (`view`).
#[derive(Clone, Debug)]
pub struct UnknownDef {
    /// The span.
    pub span: Span,
    /// The unknown's name.
    pub name: Ident,
    /// The set-name type parameters.
    pub ty_params: Box<[Ident]>,
    /// The internal representation finds.
    pub rep: Box<[RepFind]>,
    /// The invariants, generated as `must` constraints on the enclosing problem.
    pub laws: Box<[Expr]>,
    /// The public accessors.
    pub views: Box<[ViewDef]>,
}

impl Display for UnknownDef {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Unknown {} ({}):", self.name, self.span)?;
        indent = set_indentation(indent, 1);
        for param in &*self.ty_params {
            write!(indent, "\nty param: {param}")?;
        }
        for rep in &*self.rep {
            write!(indent, "\n{rep}")?;
        }
        for law in &*self.laws {
            write!(indent, "\nlaw: {law}")?;
        }
        for view in &*self.views {
            write!(indent, "\n{view}")?;
        }
        Ok(())
    }
}

/// A primitive find inside an unknown's `rep` block.
#[derive(Clone, Debug)]
pub struct RepFind {
    /// The span.
    pub span: Span,
    /// The find's name, private to the unknown.
    pub name: Ident,
    /// The find's type.
    pub ty: FindTy,
}

impl Display for RepFind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "rep find {}: {}", self.name, self.ty)
    }
}

/// A view member of an unknown definition.
#[derive(Clone, Debug)]
pub struct ViewDef {
    /// The span.
    pub span: Span,
    /// Whether the view is a predicate or a function.
    pub kind: MacroKind,
    /// The view member name.
    pub name: Ident,
    /// The formal parameters.
    pub params: Box<[MacroParam]>,
    /// The body, evaluated in the unknown's scope.
    pub body: Expr,
}

impl Display for ViewDef {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "view {:?} {}:", self.kind, self.name)?;
        indent = set_indentation(indent, 1);
        for param in &*self.params {
            write!(indent, "\n{param}")?;
        }
        write!(indent, "\n{}", self.body)?;
        Ok(())
    }
}

/// Whether a macro returns a boolean or a real.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum MacroKind {
    /// Boolean-valued.
    Predicate,
    /// Real-valued.
    Function,
}

/// A predicate or function macro definition.
#[derive(Clone, Debug)]
pub struct MacroDef {
    /// The span.
    pub span: Span,
    /// The macro's name.
    pub name: Ident,
    /// The formal parameters.
    pub params: Box<[MacroParam]>,
    /// The body expression, inlined at call sites.
    pub body: Expr,
}

impl Display for MacroDef {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Macro {} ({}):", self.name, self.span)?;
        indent = set_indentation(indent, 1);
        for param in &*self.params {
            write!(indent, "\n{param}")?;
        }
        write!(indent, "\n{}", self.body)?;
        Ok(())
    }
}

/// A macro formal parameter.
#[derive(Clone, Debug)]
pub struct MacroParam {
    /// The span.
    pub span: Span,
    /// The parameter name.
    pub name: Ident,
    /// The formal kind.
    pub kind: FormalKind,
}

impl Default for MacroParam {
    fn default() -> Self {
        MacroParam {
            span: Span::default(),
            name: Ident::default(),
            kind: FormalKind::default(),
        }
    }
}

impl WithSpan for MacroParam {
    fn with_span(self, span: Span) -> Self {
        Self { span, ..self }
    }
}

impl Display for MacroParam {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "param {}: {}", self.name, self.kind)
    }
}

/// The kind of a macro formal parameter.
#[derive(Clone, Debug, Default)]
pub enum FormalKind {
    /// A boolean value.
    #[default]
    Bool,
    /// A real value.
    Real,
    /// An element of the named set.
    Elem(Ident),
    /// A comprehension-shaped boolean argument, passed as an unexpanded tree.
    CompBool,
    /// A comprehension-shaped real argument, passed as an unexpanded tree.
    CompReal,
}

impl Display for FormalKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            FormalKind::Bool => f.write_str("Bool"),
            FormalKind::Real => f.write_str("Real"),
            FormalKind::Elem(set) => write!(f, "Elem({})", set.name),
            FormalKind::CompBool => f.write_str("Comp(Bool)"),
            FormalKind::CompReal => f.write_str("Comp(Real)"),
        }
    }
}

/// A problem definition.
#[derive(Clone, Debug)]
pub struct ProblemDef {
    /// The span.
    pub span: Span,
    /// The problem's name.
    pub name: Ident,
    /// The declarations, in source order.
    pub decls: Box<[Decl]>,
}

impl Display for ProblemDef {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Problem {} ({}):", self.name, self.span)?;
        indent = set_indentation(indent, 1);
        for decl in &*self.decls {
            write!(indent, "\n{decl}")?;
        }
        Ok(())
    }
}

/// A declaration inside a problem.
#[derive(Clone, Debug)]
pub struct Decl {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The declaration kind.
    pub kind: Box<DeclKind>,
}

impl Display for Decl {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Decl {} {}:", self.id, self.span)?;
        indent = set_indentation(indent, 1);
        write!(indent, "\n{}", self.kind)?;
        Ok(())
    }
}

/// A declaration kind.
#[derive(Clone, Debug)]
pub enum DeclKind {
    /// One or more set declarations: `set A, B;`.
    Set(Box<[Ident]>),
    /// A parameter declaration.
    Param(Box<ParamDecl>),
    /// A find (unknown) declaration.
    Find(Box<FindDecl>),
    /// A constraint.
    Constraint(Box<Constraint>),
    /// An objective.
    Objective(Box<Objective>),
}

impl Display for DeclKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            DeclKind::Set(names) => {
                write!(f, "Set:")?;
                for name in &**names {
                    write!(f, " {name}")?;
                }
                Ok(())
            }
            DeclKind::Param(param) => write!(f, "{param}"),
            DeclKind::Find(find) => write!(f, "{find}"),
            DeclKind::Constraint(constraint) => write!(f, "{constraint}"),
            DeclKind::Objective(objective) => write!(f, "{objective}"),
        }
    }
}

/// A parameter declaration.
#[derive(Clone, Debug)]
pub struct ParamDecl {
    /// The span.
    pub span: Span,
    /// The parameter's name.
    pub name: Ident,
    /// The index signature; empty for scalar parameters.
    pub index: Box<[Ident]>,
    /// The value type.
    pub ty: ValueTy,
    /// The default value, if declared.
    pub default: Option<Expr>,
}

impl Display for ParamDecl {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Param {}:", self.name)?;
        indent = set_indentation(indent, 1);
        for set in &*self.index {
            write!(indent, "\nindex: {set}")?;
        }
        write!(indent, "\ntype: {}", self.ty)?;
        if let Some(default) = &self.default {
            write!(indent, "\ndefault: {default}")?;
        }
        Ok(())
    }
}

/// A parameter value type.
#[derive(Clone, Debug)]
pub enum ValueTy {
    /// A boolean.
    Bool,
    /// An integer, optionally bounded to `[lo, hi]`.
    Int(Option<(i64, i64)>),
    /// A real number.
    Real,
    /// An element of the named set.
    Elem(Ident),
}

impl Display for ValueTy {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            ValueTy::Bool => f.write_str("Bool"),
            ValueTy::Int(None) => f.write_str("Int"),
            ValueTy::Int(Some((lo, hi))) => write!(f, "Int[{lo}..{hi}]"),
            ValueTy::Real => f.write_str("Real"),
            ValueTy::Elem(set) => write!(f, "Elem({})", set.name),
        }
    }
}

/// A find declaration.
#[derive(Clone, Debug)]
pub struct FindDecl {
    /// The span.
    pub span: Span,
    /// The find's name.
    pub name: Ident,
    /// The find's type.
    pub ty: FindTy,
}

impl Display for FindDecl {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Find {}: {}", self.name, self.ty)
    }
}

/// A find type.
#[derive(Clone, Debug)]
pub struct FindTy {
    /// The span.
    pub span: Span,
    /// The type kind.
    pub kind: FindTyKind,
}

impl Display for FindTy {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        self.kind.fmt(f)
    }
}

/// A find type kind.
#[derive(Clone, Debug)]
pub enum FindTyKind {
    /// A subset of the named set.
    Subset(Ident),
    /// A total mapping from domain to codomain.
    Mapping(Ident, Ident),
    /// A user-defined unknown applied to set arguments; removed by elaboration.
    Custom(Ident, Box<[Ident]>),
}

impl Display for FindTyKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            FindTyKind::Subset(set) => write!(f, "Subset({})", set.name),
            FindTyKind::Mapping(dom, cod) => write!(f, "Mapping({} -> {})", dom.name, cod.name),
            FindTyKind::Custom(name, args) => {
                write!(f, "Custom {}(", name.name)?;
                let mut first = true;
                for arg in &**args {
                    if !first {
                        f.write_str(", ")?;
                    }
                    write!(f, "{}", arg.name)?;
                    first = false;
                }
                f.write_str(")")
            }
        }
    }
}

/// A constraint declaration.
#[derive(Clone, Debug)]
pub struct Constraint {
    /// The span.
    pub span: Span,
    /// The constraint strength.
    pub strength: Strength,
    /// The constraint expression.
    pub expr: Expr,
    /// The optional guard; desugared into an implication.
    pub guard: Option<Expr>,
}

impl Display for Constraint {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Constraint ({:?}):", self.strength)?;
        indent = set_indentation(indent, 1);
        write!(indent, "\n{}", self.expr)?;
        if let Some(guard) = &self.guard {
            write!(indent, "\nguard: {guard}")?;
        }
        Ok(())
    }
}

/// How strongly a constraint binds.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Strength {
    /// A hard constraint.
    Must,
    /// A soft constraint with high weight.
    Should,
    /// A soft constraint with low weight.
    Nice,
}

/// An objective declaration.
#[derive(Clone, Debug)]
pub struct Objective {
    /// The span.
    pub span: Span,
    /// The optimization direction.
    pub dir: ObjDir,
    /// The objective expression.
    pub expr: Expr,
}

impl Display for Objective {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Objective ({:?}):", self.dir)?;
        indent = set_indentation(indent, 1);
        write!(indent, "\n{}", self.expr)?;
        Ok(())
    }
}

/// An optimization direction.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ObjDir {
    /// Minimize the objective expression.
    Minimize,
    /// Maximize the objective expression; canonicalized to minimization by lowering.
    Maximize,
}

/// An expression.
#[derive(Clone, Debug, Default)]
pub struct Expr {
    /// The node ID.
    pub id: NodeId,
    /// The span.
    pub span: Span,
    /// The expression kind.
    pub kind: Box<ExprKind>,
}

impl WithSpan for Expr {
    fn with_span(self, span: Span) -> Self {
        Self { span, ..self }
    }
}

impl Display for Expr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "Expr {} {}: {}", self.id, self.span, self.kind)
    }
}

/// An expression kind.
#[derive(Clone, Debug, Default)]
pub enum ExprKind {
    /// A literal.
    Lit(Lit),
    /// A reference to a name in scope: iterator, macro formal, scalar parameter, or find.
    Name(Ident),
    /// An indexed parameter read: `Param[i, j]`.
    Index(Ident, Box<[Expr]>),
    /// The cardinality of a declared set: `size(S)`.
    Size(Ident),
    /// A method call on a find: `S.has(x)`, `F.is(a, b)`, or a view accessor.
    Method(Box<MethodCall>),
    /// A macro call, possibly with comprehension-shaped arguments.
    Call(Ident, Box<[CallArg]>),
    /// A unary operation.
    UnOp(UnOp, Box<Expr>),
    /// A binary operation.
    BinOp(BinOp, Box<Expr>, Box<Expr>),
    /// A conditional: `if cond then a else b`.
    If(Box<Expr>, Box<Expr>, Box<Expr>),
    /// A quantifier: `forall x in S: body` or `exists x in S: body`.
    Quant(Box<QuantExpr>),
    /// An aggregate comprehension: `sum`, `count`, `any`, `all`.
    Agg(Box<AggExpr>),
    /// A parenthesized expression.
    Paren(Box<Expr>),
    /// An invalid expression produced by parser recovery.
    #[default]
    Err,
}

impl Display for ExprKind {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        match self {
            ExprKind::Lit(lit) => write!(indent, "Lit: {lit}")?,
            ExprKind::Name(name) => write!(indent, "Name: {name}")?,
            ExprKind::Index(name, args) => {
                write!(indent, "Index {}:", name.name)?;
                indent = set_indentation(indent, 1);
                for arg in &**args {
                    write!(indent, "\n{arg}")?;
                }
            }
            ExprKind::Size(set) => write!(indent, "Size: {}", set.name)?,
            ExprKind::Method(call) => write!(indent, "{call}")?,
            ExprKind::Call(name, args) => {
                write!(indent, "Call {}:", name.name)?;
                indent = set_indentation(indent, 1);
                for arg in &**args {
                    write!(indent, "\n{arg}")?;
                }
            }
            ExprKind::UnOp(op, operand) => {
                write!(indent, "UnOp ({op:?}):")?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{operand}")?;
            }
            ExprKind::BinOp(op, lhs, rhs) => {
                write!(indent, "BinOp ({op:?}):")?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{lhs}")?;
                write!(indent, "\n{rhs}")?;
            }
            ExprKind::If(cond, then, alt) => {
                write!(indent, "If:")?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{cond}")?;
                write!(indent, "\n{then}")?;
                write!(indent, "\n{alt}")?;
            }
            ExprKind::Quant(quant) => write!(indent, "{quant}")?,
            ExprKind::Agg(agg) => write!(indent, "{agg}")?,
            ExprKind::Paren(expr) => {
                write!(indent, "Paren:")?;
                indent = set_indentation(indent, 1);
                write!(indent, "\n{expr}")?;
            }
            ExprKind::Err => write!(indent, "Err")?,
        }
        Ok(())
    }
}

/// An argument at a macro call site.
#[derive(Clone, Debug)]
pub enum CallArg {
    /// An ordinary expression argument.
    Expr(Expr),
    /// A comprehension-shaped argument, passed unexpanded.
    Comp(Box<CompArg>),
}

impl Display for CallArg {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            CallArg::Expr(expr) => expr.fmt(f),
            CallArg::Comp(comp) => comp.fmt(f),
        }
    }
}

/// A comprehension-shaped macro argument: `expr for x in S [where c] [else e]`.
#[derive(Clone, Debug)]
pub struct CompArg {
    /// The span.
    pub span: Span,
    /// The comprehension body.
    pub body: Expr,
    /// The iterator variable.
    pub iter: Ident,
    /// The set iterated over.
    pub set: Ident,
    /// The filter condition, if present.
    pub cond: Option<Expr>,
    /// The alternative value for filtered-out elements, if present.
    pub alt: Option<Expr>,
}

impl Display for CompArg {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(
            indent,
            "Comp ({} in {}):",
            self.iter.name, self.set.name
        )?;
        indent = set_indentation(indent, 1);
        write!(indent, "\n{}", self.body)?;
        if let Some(cond) = &self.cond {
            write!(indent, "\nwhere: {cond}")?;
        }
        if let Some(alt) = &self.alt {
            write!(indent, "\nelse: {alt}")?;
        }
        Ok(())
    }
}

/// A method call on a find or a user-defined unknown view.
#[derive(Clone, Debug)]
pub struct MethodCall {
    /// The span.
    pub span: Span,
    /// The find the method is called on.
    pub target: Ident,
    /// The method name; `has` and `is` are primitive, anything else is a view accessor.
    pub name: Ident,
    /// The arguments.
    pub args: Box<[Expr]>,
}

impl Display for MethodCall {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(indent, "Method {}.{}:", self.target.name, self.name.name)?;
        indent = set_indentation(indent, 1);
        for arg in &*self.args {
            write!(indent, "\n{arg}")?;
        }
        Ok(())
    }
}

/// A quantified expression.
#[derive(Clone, Debug)]
pub struct QuantExpr {
    /// The span.
    pub span: Span,
    /// The quantifier.
    pub quant: Quant,
    /// The iterator variable.
    pub iter: Ident,
    /// The set iterated over.
    pub set: Ident,
    /// The boolean body.
    pub body: Expr,
}

impl Display for QuantExpr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        write!(
            indent,
            "Quant ({:?} {} in {}):",
            self.quant, self.iter.name, self.set.name
        )?;
        indent = set_indentation(indent, 1);
        write!(indent, "\n{}", self.body)?;
        Ok(())
    }
}

/// A quantifier.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum Quant {
    /// Universal.
    Forall,
    /// Existential.
    Exists,
}

/// An aggregate comprehension expression.
#[derive(Clone, Debug)]
pub struct AggExpr {
    /// The span.
    pub span: Span,
    /// The aggregate operator.
    pub op: AggOp,
    /// The comprehension the aggregate ranges over.
    pub comp: CompSpec,
}

impl Display for AggExpr {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let mut indent = set_indentation(indented(f), 0);
        match &self.comp {
            CompSpec::Range(range) => {
                write!(
                    indent,
                    "Agg ({:?} {} in {}):",
                    self.op, range.iter.name, range.set.name
                )?;
                indent = set_indentation(indent, 1);
                if let Some(body) = &range.body {
                    write!(indent, "\n{body}")?;
                }
                if let Some(cond) = &range.cond {
                    write!(indent, "\nwhere: {cond}")?;
                }
                if let Some(alt) = &range.alt {
                    write!(indent, "\nelse: {alt}")?;
                }
            }
            CompSpec::Splice(name) => {
                write!(indent, "Agg ({:?} splice {}):", self.op, name.name)?;
            }
        }
        Ok(())
    }
}

/// What an aggregate ranges over: an explicit comprehension, or a spliced
/// comprehension-shaped macro formal that elaboration replaces with one.
#[derive(Clone, Debug)]
pub enum CompSpec {
    /// An explicit comprehension over a declared set.
    Range(Box<CompRange>),
    /// A reference to a `Comp(...)` macro formal; removed by elaboration.
    Splice(Ident),
}

/// An explicit comprehension: `[body for] x in S [where c] [else e]`.
#[derive(Clone, Debug)]
pub struct CompRange {
    /// The body; absent for the `count(x in S)` shorthand.
    pub body: Option<Expr>,
    /// The iterator variable.
    pub iter: Ident,
    /// The set iterated over.
    pub set: Ident,
    /// The filter condition, if present.
    pub cond: Option<Expr>,
    /// The alternative value for filtered-out elements, if present.
    pub alt: Option<Expr>,
}

/// An aggregate operator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum AggOp {
    /// Numeric summation.
    Sum,
    /// Count of elements satisfying a condition; desugars to `sum`.
    Count,
    /// Existential over a comprehension; desugars to `exists`.
    Any,
    /// Universal over a comprehension; desugars to `forall`.
    All,
}

/// A unary operator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum UnOp {
    /// Arithmetic negation.
    Neg,
    /// Boolean negation.
    Not,
}

/// A binary operator.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum BinOp {
    /// Addition.
    Add,
    /// Subtraction.
    Sub,
    /// Multiplication.
    Mul,
    /// Division.
    Div,
    /// Conjunction.
    And,
    /// Disjunction.
    Or,
    /// Implication.
    Implies,
    /// Equality.
    Eq,
    /// Inequality.
    Ne,
    /// Less than.
    Lt,
    /// Less than or equal.
    Le,
    /// Greater than.
    Gt,
    /// Greater than or equal.
    Ge,
}

/// A literal.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Lit {
    /// A boolean literal.
    Bool(bool),
    /// An integer literal.
    Int(i64),
    /// A real literal.
    Real(f64),
}

impl Display for Lit {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            Lit::Bool(value) => write!(f, "Bool({value})"),
            Lit::Int(value) => write!(f, "Int({value})"),
            Lit::Real(value) => write!(f, "Real({value})"),
        }
    }
}
