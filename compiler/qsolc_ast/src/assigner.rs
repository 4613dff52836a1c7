// Copyright (c) QSOL Contributors.
// Licensed under the MIT License.

use crate::{
    ast::{Decl, Expr, Ident, Item, NodeId, Path, Program},
    mut_visit::{self, MutVisitor},
};

/// Replaces placeholder node ids with unique values. Runs once after parsing and again
/// after every elaboration round, so freshly substituted nodes also receive ids.
#[derive(Debug)]
pub struct Assigner {
    next_id: NodeId,
}

impl Assigner {
    #[must_use]
    pub fn new() -> Self {
        Self {
            next_id: NodeId::FIRST,
        }
    }

    pub fn next_id(&mut self) -> NodeId {
        let id = self.next_id;
        self.next_id = self.next_id.successor();
        id
    }

    fn assign(&mut self, id: &mut NodeId) {
        if id.is_default() {
            *id = self.next_id();
        }
    }
}

impl Default for Assigner {
    fn default() -> Self {
        Self::new()
    }
}

impl MutVisitor for Assigner {
    fn visit_program(&mut self, program: &mut Program) {
        self.assign(&mut program.id);
        mut_visit::walk_program(self, program);
    }

    fn visit_item(&mut self, item: &mut Item) {
        self.assign(&mut item.id);
        mut_visit::walk_item(self, item);
    }

    fn visit_decl(&mut self, decl: &mut Decl) {
        self.assign(&mut decl.id);
        mut_visit::walk_decl(self, decl);
    }

    fn visit_expr(&mut self, expr: &mut Expr) {
        self.assign(&mut expr.id);
        mut_visit::walk_expr(self, expr);
    }

    fn visit_path(&mut self, path: &mut Path) {
        self.assign(&mut path.id);
        mut_visit::walk_path(self, path);
    }

    fn visit_ident(&mut self, ident: &mut Ident) {
        self.assign(&mut ident.id);
        mut_visit::walk_ident(self, ident);
    }
}
