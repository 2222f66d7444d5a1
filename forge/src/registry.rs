//! Declaration and extern bookkeeping.
//!
//! A [`Registry`] holds a stack of symbol tables (the global table, plus one
//! per open calibration or subroutine scope) together with the program-wide
//! sets of used-but-undeclared variables, frames, waveforms, externs,
//! subroutines and defcals. All insertion-ordered, so rendering is stable.
//!
//! Statements never write to the registry directly. A [`Lowerer`] reads it,
//! lowers expressions to syntax nodes and records what it saw in a
//! [`Pending`] set; the program commits that set only once the whole
//! statement has been built, so a failed call leaves no trace.

use indexmap::IndexMap;
use oqforge_ir as ir;

use crate::call::{Callee, Extern, Subroutine};
use crate::error::{Error, Result};
use crate::expr::Expr;
use crate::types::VarType;
use crate::var::Var;

/// Which kind of scope owns a symbol table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TableKind {
    Global,
    /// `cal` and `defcal` bodies; declarations fold into the parent on close.
    Calibration,
    /// Loop bodies holding the loop variable; folds like `Calibration`.
    Block,
    /// Subroutine bodies; declarations are dropped on close.
    Isolated,
}

#[derive(Debug, Clone)]
struct SymbolTable {
    kind: TableKind,
    params: IndexMap<String, Var>,
    declared: IndexMap<String, Var>,
}

impl SymbolTable {
    fn new(kind: TableKind) -> Self {
        Self {
            kind,
            params: IndexMap::new(),
            declared: IndexMap::new(),
        }
    }

    fn get(&self, name: &str) -> Option<&Var> {
        self.declared.get(name).or_else(|| self.params.get(name))
    }
}

/// Key of a recorded defcal: (space-separated targets, gate name).
pub type DefcalKey = (String, String);

#[derive(Debug, Clone)]
pub(crate) struct Registry {
    tables: Vec<SymbolTable>,
    undeclared: IndexMap<String, Var>,
    frame_vars: IndexMap<String, Var>,
    waveform_vars: IndexMap<String, Var>,
    externs: IndexMap<String, Extern>,
    subroutines: IndexMap<String, Subroutine>,
    defcals: IndexMap<DefcalKey, ir::Statement>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            tables: vec![SymbolTable::new(TableKind::Global)],
            undeclared: IndexMap::new(),
            frame_vars: IndexMap::new(),
            waveform_vars: IndexMap::new(),
            externs: IndexMap::new(),
            subroutines: IndexMap::new(),
            defcals: IndexMap::new(),
        }
    }
}

fn collision(name: &str, existing: impl Into<String>) -> Error {
    Error::NameCollision {
        name: name.to_string(),
        existing: existing.into(),
    }
}

fn var_collision(var: &Var, existing: &Var) -> Result<()> {
    if existing == var {
        Ok(())
    } else {
        Err(collision(var.name(), format!("{} variable", existing.ty())))
    }
}

impl Registry {
    /// Find a symbol, innermost table first, then among undeclared uses.
    pub(crate) fn lookup(&self, name: &str) -> Option<&Var> {
        self.tables
            .iter()
            .rev()
            .find_map(|table| table.get(name))
            .or_else(|| self.undeclared.get(name))
    }

    pub(crate) fn is_declared(&self, name: &str) -> bool {
        self.tables.iter().any(|table| table.get(name).is_some())
    }

    /// Whether declarations in the innermost table end up in the global
    /// one once every open scope closes.
    fn folds_to_global(&self) -> bool {
        self.tables
            .iter()
            .skip(1)
            .all(|table| matches!(table.kind, TableKind::Calibration | TableKind::Block))
    }

    fn current(&mut self) -> &mut SymbolTable {
        if self.tables.is_empty() {
            self.tables.push(SymbolTable::new(TableKind::Global));
        }
        let last = self.tables.len() - 1;
        &mut self.tables[last]
    }

    fn global(&mut self) -> &mut SymbolTable {
        if self.tables.is_empty() {
            self.tables.push(SymbolTable::new(TableKind::Global));
        }
        &mut self.tables[0]
    }

    pub(crate) fn push_table(&mut self, kind: TableKind, params: &[Var]) {
        let mut table = SymbolTable::new(kind);
        for param in params {
            table.params.insert(param.name().to_string(), param.clone());
        }
        self.tables.push(table);
    }

    pub(crate) fn pop_table(&mut self) {
        if self.tables.len() <= 1 {
            return;
        }
        let Some(table) = self.tables.pop() else {
            return;
        };
        if matches!(table.kind, TableKind::Calibration | TableKind::Block) {
            let parent = self.current();
            for (name, var) in table.declared {
                parent.declared.entry(name).or_insert(var);
            }
        }
    }

    fn track(&mut self, var: &Var) {
        let tracked = match var.ty() {
            VarType::Frame => &mut self.frame_vars,
            VarType::Waveform => &mut self.waveform_vars,
            _ => return,
        };
        tracked
            .entry(var.name().to_string())
            .or_insert_with(|| var.clone());
    }

    pub(crate) fn commit(&mut self, pending: Pending) {
        for (var, declared) in pending.vars {
            self.track(&var);
            let name = var.name().to_string();
            if declared {
                if self.folds_to_global() {
                    self.undeclared.shift_remove(&name);
                }
                self.current().declared.entry(name).or_insert(var);
            } else if !self.is_declared(&name) {
                self.undeclared.entry(name).or_insert(var);
            }
        }
        for ext in pending.externs {
            self.externs.entry(ext.name().to_string()).or_insert(ext);
        }
        for sub in pending.subroutines {
            self.subroutines.entry(sub.name().to_string()).or_insert(sub);
        }
    }

    /// Used variables still waiting for a declaration, in first-use order.
    pub(crate) fn pending_declarations(&self) -> Vec<Var> {
        self.undeclared
            .values()
            .filter(|var| var.needs_declaration() && !self.is_declared(var.name()))
            .cloned()
            .collect()
    }

    pub(crate) fn check_defcal(&self, key: &DefcalKey, definition: &ir::Statement) -> Result<()> {
        match self.defcals.get(key) {
            Some(existing) if existing != definition => {
                Err(collision(&format!("{} {}", key.1, key.0), "defcal"))
            }
            _ => Ok(()),
        }
    }

    pub(crate) fn record_defcal(&mut self, key: DefcalKey, definition: ir::Statement) {
        self.defcals.entry(key).or_insert(definition);
    }

    /// Fold another top-level registry into this one, after checking that
    /// no name means two different things.
    pub(crate) fn merge(&mut self, other: &Registry) -> Result<()> {
        let other_vars = other
            .globals()
            .chain(other.undeclared.values())
            .chain(other.frame_vars.values())
            .chain(other.waveform_vars.values());
        for var in other_vars {
            if let Some(existing) = self.lookup(var.name()) {
                var_collision(var, existing)?;
            }
        }
        for (name, ext) in &other.externs {
            if self.externs.get(name).is_some_and(|existing| existing != ext) {
                return Err(collision(name, "extern"));
            }
        }
        for (name, sub) in &other.subroutines {
            if self.subroutines.get(name).is_some_and(|existing| existing != sub) {
                return Err(collision(name, "subroutine"));
            }
        }
        for (key, definition) in &other.defcals {
            self.check_defcal(key, definition)?;
        }

        for var in other.globals() {
            self.undeclared.shift_remove(var.name());
            self.global()
                .declared
                .entry(var.name().to_string())
                .or_insert_with(|| var.clone());
        }
        for (name, var) in &other.undeclared {
            if !self.is_declared(name) {
                self.undeclared
                    .entry(name.clone())
                    .or_insert_with(|| var.clone());
            }
        }
        for var in other.frame_vars.values().chain(other.waveform_vars.values()) {
            self.track(var);
        }
        for (name, ext) in &other.externs {
            self.externs
                .entry(name.clone())
                .or_insert_with(|| ext.clone());
        }
        for (name, sub) in &other.subroutines {
            self.subroutines
                .entry(name.clone())
                .or_insert_with(|| sub.clone());
        }
        for (key, definition) in &other.defcals {
            self.defcals
                .entry(key.clone())
                .or_insert_with(|| definition.clone());
        }
        Ok(())
    }

    /// Variables declared in the global table.
    pub(crate) fn globals(&self) -> impl Iterator<Item = &Var> {
        self.tables
            .first()
            .into_iter()
            .flat_map(|table| table.declared.values())
    }

    pub(crate) fn frame_vars(&self) -> impl Iterator<Item = &Var> {
        self.frame_vars.values()
    }

    pub(crate) fn waveform_vars(&self) -> impl Iterator<Item = &Var> {
        self.waveform_vars.values()
    }

    pub(crate) fn externs(&self) -> impl Iterator<Item = &Extern> {
        self.externs.values()
    }

    pub(crate) fn subroutines(&self) -> impl Iterator<Item = &Subroutine> {
        self.subroutines.values()
    }

    pub(crate) fn defcals(&self) -> &IndexMap<DefcalKey, ir::Statement> {
        &self.defcals
    }
}

/// Registrations produced while building one statement.
#[derive(Debug, Default)]
pub(crate) struct Pending {
    /// Variables in the order they were met; `true` marks a declaration.
    vars: Vec<(Var, bool)>,
    externs: Vec<Extern>,
    subroutines: Vec<Subroutine>,
}

/// Lowers builder values to syntax nodes against a read-only registry.
pub(crate) struct Lowerer<'a> {
    registry: &'a Registry,
    pending: Pending,
}

impl<'a> Lowerer<'a> {
    pub(crate) fn new(registry: &'a Registry) -> Self {
        Self {
            registry,
            pending: Pending::default(),
        }
    }

    pub(crate) fn finish(self) -> Pending {
        self.pending
    }

    fn existing(&self, name: &str) -> Option<&Var> {
        self.pending
            .vars
            .iter()
            .rev()
            .find(|(var, _)| var.name() == name)
            .map(|(var, _)| var)
            .or_else(|| self.registry.lookup(name))
    }

    /// Fail if `var`'s name already means a different variable.
    pub(crate) fn check(&self, var: &Var) -> Result<()> {
        match self.existing(var.name()) {
            Some(existing) => var_collision(var, existing),
            None => Ok(()),
        }
    }

    pub(crate) fn use_var(&mut self, var: &Var) -> Result<()> {
        self.check(var)?;
        self.pending.vars.push((var.clone(), false));
        Ok(())
    }

    /// Build the declaration of `var`, or `None` if it is already declared.
    pub(crate) fn declare(&mut self, var: &Var) -> Result<Option<ir::Statement>> {
        self.check(var)?;
        let declared_here = self
            .pending
            .vars
            .iter()
            .any(|(other, declared)| *declared && other.name() == var.name());
        if declared_here || self.registry.is_declared(var.name()) {
            return Ok(None);
        }
        let init = var.init().map(|init| self.expr(init)).transpose()?;
        self.pending.vars.push((var.clone(), true));
        Ok(Some(ir::Statement::Declaration {
            ty: var.ty().to_ir(),
            name: var.name().to_string(),
            init,
        }))
    }

    pub(crate) fn expr(&mut self, expr: &Expr) -> Result<ir::Expression> {
        self.visit(expr)?;
        Ok(expr.to_ir())
    }

    pub(crate) fn exprs(&mut self, exprs: &[Expr]) -> Result<Vec<ir::Expression>> {
        exprs.iter().map(|expr| self.expr(expr)).collect()
    }

    fn visit(&mut self, expr: &Expr) -> Result<()> {
        match expr {
            Expr::Literal(_) | Expr::Raw(_) => Ok(()),
            Expr::Var(var) => self.use_var(var),
            Expr::Index { target, index } => {
                self.visit(target)?;
                self.visit(index)
            }
            Expr::Unary { operand, .. } | Expr::Paren(operand) => self.visit(operand),
            Expr::Binary { lhs, rhs, .. } => {
                self.visit(lhs)?;
                self.visit(rhs)
            }
            Expr::Call(call) => {
                match &call.callee {
                    Callee::Builtin { .. } => {}
                    Callee::Extern(ext) => self.use_extern(ext)?,
                    Callee::Subroutine(sub) => self.use_subroutine(sub)?,
                }
                call.args.iter().try_for_each(|arg| self.visit(arg))
            }
        }
    }

    fn use_extern(&mut self, ext: &Extern) -> Result<()> {
        let existing = self
            .pending
            .externs
            .iter()
            .find(|other| other.name() == ext.name())
            .or_else(|| self.registry.externs.get(ext.name()));
        match existing {
            Some(existing) if existing != ext => Err(collision(ext.name(), "extern")),
            Some(_) => Ok(()),
            None => {
                self.pending.externs.push(ext.clone());
                Ok(())
            }
        }
    }

    fn use_subroutine(&mut self, sub: &Subroutine) -> Result<()> {
        let existing = self
            .pending
            .subroutines
            .iter()
            .find(|other| other.name() == sub.name())
            .or_else(|| self.registry.subroutines.get(sub.name()));
        match existing {
            Some(existing) if existing != sub => Err(collision(sub.name(), "subroutine")),
            Some(_) => Ok(()),
            None => {
                self.pending.subroutines.push(sub.clone());
                Ok(())
            }
        }
    }
}
