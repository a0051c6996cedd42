//! IR Builder
//!
//! Appends instructions to the flat instruction buffer. Name generation for
//! temporaries and labels lives in the session, not here.

use tracing::trace;

use super::instr::Instruction;
use super::types::{IoKind, IrProgram, Operand};
use crate::ast::BinaryOp;

/// Builder for constructing IR
#[derive(Debug, Default)]
pub struct IrBuilder {
    instructions: Vec<Instruction>,
}

impl IrBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Finish building and return the program
    pub fn finish(self) -> IrProgram {
        IrProgram::new(self.instructions)
    }

    /// Index the next instruction will get
    pub fn position(&self) -> usize {
        self.instructions.len()
    }

    pub fn emit(&mut self, instr: Instruction) {
        trace!(index = self.instructions.len(), %instr, "emit");
        self.instructions.push(instr);
    }

    // ============ Data ============

    pub fn assign(&mut self, dst: impl Into<String>, src: Operand) {
        self.emit(Instruction::Assign { dst: dst.into(), src });
    }

    /// Emit `dst = lhs op rhs` and return `dst` as an operand
    pub fn binop(&mut self, dst: String, op: BinaryOp, lhs: Operand, rhs: Operand) -> Operand {
        self.emit(Instruction::BinOp {
            dst: dst.clone(),
            op,
            lhs,
            rhs,
        });
        Operand::Name(dst)
    }

    // ============ Control flow ============

    pub fn if_false_goto(&mut self, cond: Operand, label: &str) {
        self.emit(Instruction::IfFalseGoto {
            cond,
            label: label.to_string(),
        });
    }

    pub fn goto(&mut self, label: &str) {
        self.emit(Instruction::Goto {
            label: label.to_string(),
        });
    }

    pub fn label(&mut self, name: &str) {
        self.emit(Instruction::Label {
            name: name.to_string(),
        });
    }

    // ============ I/O ============

    pub fn print_literal(&mut self, text: impl Into<String>) {
        self.emit(Instruction::PrintLiteral { text: text.into() });
    }

    pub fn print_var(&mut self, kind: IoKind, var: impl Into<String>) {
        self.emit(Instruction::PrintVar {
            kind,
            var: var.into(),
        });
    }

    pub fn scan_var(&mut self, kind: IoKind, var: impl Into<String>) {
        self.emit(Instruction::ScanVar {
            kind,
            var: var.into(),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_appends_in_order() {
        let mut builder = IrBuilder::new();
        builder.label("L1");
        let t = builder.binop("t1".to_string(), BinaryOp::Lt, Operand::name("i"), Operand::int(3));
        assert_eq!(t, Operand::name("t1"));
        builder.if_false_goto(t, "L2");
        builder.goto("L1");
        builder.label("L2");
        assert_eq!(builder.position(), 5);

        let program = builder.finish();
        let text: Vec<String> = program.iter().map(|i| i.to_string()).collect();
        assert_eq!(text, vec!["L1:", "t1 = i < 3", "ifFalse t1 goto L2", "goto L1", "L2:"]);
    }
}
