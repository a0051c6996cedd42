//! IR Instructions
//!
//! Three-address instructions: at most one operator each, operands are
//! literals or names, never nested expressions.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::types::{IoKind, Operand};
use crate::ast::BinaryOp;

/// An instruction in the IR
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "instr", rename_all = "snake_case")]
pub enum Instruction {
    /// `dst = src`
    Assign { dst: String, src: Operand },

    /// `dst = lhs op rhs`
    BinOp {
        dst: String,
        op: BinaryOp,
        lhs: Operand,
        rhs: Operand,
    },

    /// Jump to `label` when `cond` is falsy
    IfFalseGoto { cond: Operand, label: String },

    /// Unconditional jump
    Goto { label: String },

    /// Jump target; a no-op when executed
    Label { name: String },

    /// Print text as-is
    PrintLiteral { text: String },

    /// Print a variable formatted per `kind`
    PrintVar { kind: IoKind, var: String },

    /// Read a value for `var` from the input provider
    ScanVar { kind: IoKind, var: String },
}

impl Instruction {
    /// Label this instruction jumps to, if it is a jump
    pub fn jump_target(&self) -> Option<&str> {
        match self {
            Instruction::IfFalseGoto { label, .. } | Instruction::Goto { label } => Some(label),
            _ => None,
        }
    }

    pub fn is_label(&self) -> bool {
        matches!(self, Instruction::Label { .. })
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::Assign { dst, src } => write!(f, "{} = {}", dst, src),
            Instruction::BinOp { dst, op, lhs, rhs } => write!(f, "{} = {} {} {}", dst, lhs, op, rhs),
            Instruction::IfFalseGoto { cond, label } => write!(f, "ifFalse {} goto {}", cond, label),
            Instruction::Goto { label } => write!(f, "goto {}", label),
            Instruction::Label { name } => write!(f, "{}:", name),
            Instruction::PrintLiteral { text } => write!(f, "print {:?}", text),
            Instruction::PrintVar { kind, var } => write!(f, "print {} {}", kind, var),
            Instruction::ScanVar { kind, var } => write!(f, "scan {} {}", kind, var),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ir::Value;

    #[test]
    fn test_display() {
        let binop = Instruction::BinOp {
            dst: "t1".to_string(),
            op: BinaryOp::Add,
            lhs: Operand::name("x"),
            rhs: Operand::int(1),
        };
        assert_eq!(binop.to_string(), "t1 = x + 1");
        let assign = Instruction::Assign {
            dst: "c".to_string(),
            src: Operand::Literal(Value::Char('a')),
        };
        assert_eq!(assign.to_string(), "c = 'a'");
        let jump = Instruction::IfFalseGoto { cond: Operand::name("t1"), label: "L1".to_string() };
        assert_eq!(jump.to_string(), "ifFalse t1 goto L1");
        assert_eq!(jump.jump_target(), Some("L1"));
        assert_eq!(Instruction::Label { name: "L1".to_string() }.to_string(), "L1:");
        assert_eq!(
            Instruction::PrintLiteral { text: "hi\n".to_string() }.to_string(),
            "print \"hi\\n\""
        );
        assert_eq!(
            Instruction::ScanVar { kind: IoKind::Int, var: "n".to_string() }.to_string(),
            "scan %d n"
        );
    }
}
