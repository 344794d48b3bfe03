//! `IRSB`, the super-block (§3, §4.3): an ordered statement sequence plus
//! the type environment for its SSA temporaries and a terminating `next`
//! expression.

use std::fmt;
use vexlift_types::IrType;

use crate::atoms::JumpKind;
use crate::error::IrError;
use crate::expr::IrExpr;
use crate::stmt::IrStmt;
use crate::temp::{IrTemp, IrTypeEnv};

#[derive(Debug, Clone, PartialEq)]
pub struct IrSb {
    type_env: IrTypeEnv,
    stmts: Vec<IrStmt>,
    next: IrExpr,
    jump_kind: JumpKind,
    offs_ip: u32,
}

impl IrSb {
    /// A fresh, empty super-block. `next` starts as a placeholder `Const(0)`
    /// of the given guest word type; the lifter is expected to overwrite it
    /// with [`IrSb::set_next`] before returning.
    pub fn new(guest_word_type: IrType, offs_ip: u32) -> Self {
        let placeholder = match guest_word_type {
            IrType::I64 => IrExpr::Const(crate::constant::IrConst::I64(0)),
            _ => IrExpr::Const(crate::constant::IrConst::I32(0)),
        };
        Self {
            type_env: IrTypeEnv::new(),
            stmts: Vec::new(),
            next: placeholder,
            jump_kind: JumpKind::Boring,
            offs_ip,
        }
    }

    pub fn type_env(&self) -> &IrTypeEnv {
        &self.type_env
    }

    pub fn new_temp(&mut self, ty: IrType) -> IrTemp {
        self.type_env.new_temp(ty)
    }

    pub fn type_of_temp(&self, t: IrTemp) -> Result<IrType, IrError> {
        self.type_env.get_type(t)
    }

    pub fn statements(&self) -> &[IrStmt] {
        &self.stmts
    }

    pub fn iter(&self) -> std::slice::Iter<'_, IrStmt> {
        self.stmts.iter()
    }

    pub fn add_statement(&mut self, stmt: IrStmt) {
        self.stmts.push(stmt);
    }

    pub fn insert_statement(&mut self, index: usize, stmt: IrStmt) {
        self.stmts.insert(index, stmt);
    }

    pub fn replace_statement(&mut self, index: usize, stmt: IrStmt) {
        self.stmts[index] = stmt;
    }

    pub fn remove_statement_at(&mut self, index: usize) -> IrStmt {
        self.stmts.remove(index)
    }

    pub fn clear_statements(&mut self) {
        self.stmts.clear();
    }

    pub fn next(&self) -> &IrExpr {
        &self.next
    }

    pub fn set_next(&mut self, next: IrExpr) {
        self.next = next;
    }

    pub fn jump_kind(&self) -> JumpKind {
        self.jump_kind
    }

    pub fn set_jump_kind(&mut self, jk: JumpKind) {
        self.jump_kind = jk;
    }

    pub fn offs_ip(&self) -> u32 {
        self.offs_ip
    }

    pub fn set_offs_ip(&mut self, offs_ip: u32) {
        self.offs_ip = offs_ip;
    }

    /// Produce a fully independent copy: the type environment, every
    /// statement and `next` are all cloned, sharing no mutable substructure
    /// with `self`.
    pub fn deep_copy(&self) -> Self {
        self.clone()
    }
}

impl fmt::Display for IrSb {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "------ Type Environment ------")?;
        for (t, ty) in self.type_env.iter() {
            writeln!(f, "{t}:{ty}")?;
        }
        writeln!(f, "------ Statements ------")?;
        for (i, stmt) in self.stmts.iter().enumerate() {
            writeln!(f, "{i:02}: {stmt}")?;
        }
        writeln!(f, "------ Exit ------")?;
        writeln!(f, "Next: {}", self.next)?;
        writeln!(f, "Jump Kind: {}", self.jump_kind)?;
        write!(f, "IP Offset: {}", self.offs_ip)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constant::IrConst;

    #[test]
    fn new_temp_delegates_to_type_env() {
        let mut sb = IrSb::new(IrType::I32, 0);
        let t = sb.new_temp(IrType::I64);
        assert_eq!(sb.type_of_temp(t).unwrap(), IrType::I64);
    }

    #[test]
    fn deep_copy_is_independent_and_structurally_equal() {
        let mut sb = IrSb::new(IrType::I32, 0);
        let t = sb.new_temp(IrType::I32);
        sb.add_statement(IrStmt::wr_tmp(t, IrExpr::Const(IrConst::I32(1))).unwrap());
        let copy = sb.deep_copy();
        assert_eq!(sb, copy);

        let mut mutated = sb.clone();
        mutated.add_statement(IrStmt::NoOp);
        assert_ne!(sb, mutated);
        assert_eq!(copy.statements().len(), 1);
    }

    #[test]
    fn empty_block_has_no_statements() {
        let sb = IrSb::new(IrType::I32, 0);
        assert_eq!(sb.statements().len(), 0);
    }

    #[test]
    fn pretty_print_begins_with_type_environment_header() {
        let sb = IrSb::new(IrType::I32, 0);
        let printed = sb.to_string();
        assert!(printed.starts_with("------ Type Environment ------"));
        assert!(printed.contains("------ Statements ------"));
        assert!(printed.contains("------ Exit ------"));
    }
}
