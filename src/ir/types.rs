//! IR Types
//!
//! Values, operands and the flat instruction sequence.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::instr::Instruction;

/// A runtime value. The IR itself is untyped; values carry their own tag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Value {
    Int(i64),
    Char(char),
    Str(String),
}

impl Value {
    /// Zero, NUL and the empty string are false
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Int(n) => *n != 0,
            Value::Char(c) => *c != '\0',
            Value::Str(s) => !s.is_empty(),
        }
    }

    /// Integer view used by arithmetic. Characters count by code point;
    /// strings that are not numbers count as zero.
    pub fn as_int(&self) -> i64 {
        match self {
            Value::Int(n) => *n,
            Value::Char(c) => *c as i64,
            Value::Str(s) => s.trim().parse().unwrap_or(0),
        }
    }

    pub fn from_bool(b: bool) -> Self {
        Value::Int(b as i64)
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::Int(0)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(n) => write!(f, "{}", n),
            Value::Char(c) => write!(f, "{}", c),
            Value::Str(s) => write!(f, "{}", s),
        }
    }
}

/// An instruction operand: a literal, or the name of a variable/temporary
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Operand {
    Literal(Value),
    Name(String),
}

impl Operand {
    pub fn int(n: i64) -> Self {
        Operand::Literal(Value::Int(n))
    }

    pub fn name(name: impl Into<String>) -> Self {
        Operand::Name(name.into())
    }
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Literal(Value::Int(n)) => write!(f, "{}", n),
            Operand::Literal(Value::Char(c)) => write!(f, "{:?}", c),
            Operand::Literal(Value::Str(s)) => write!(f, "{:?}", s),
            Operand::Name(name) => write!(f, "{}", name),
        }
    }
}

/// Conversion used by `printf`/`scanf`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IoKind {
    /// `%d`
    Int,
    /// `%c`
    Char,
    /// `%s`
    Str,
}

impl IoKind {
    pub fn from_specifier(c: char) -> Option<Self> {
        match c {
            'd' => Some(IoKind::Int),
            'c' => Some(IoKind::Char),
            's' => Some(IoKind::Str),
            _ => None,
        }
    }

    pub fn specifier(self) -> &'static str {
        match self {
            IoKind::Int => "%d",
            IoKind::Char => "%c",
            IoKind::Str => "%s",
        }
    }
}

impl fmt::Display for IoKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.specifier())
    }
}

/// The output of lowering: a flat, ordered instruction list
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IrProgram {
    pub instructions: Vec<Instruction>,
}

impl IrProgram {
    pub fn new(instructions: Vec<Instruction>) -> Self {
        Self { instructions }
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Instruction> {
        self.instructions.iter()
    }

    /// Index of the `Label(name)` definition, if present
    pub fn label_index(&self, name: &str) -> Option<usize> {
        self.instructions
            .iter()
            .position(|i| matches!(i, Instruction::Label { name: n } if n == name))
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }
}

impl fmt::Display for IrProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&super::print_program(self))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truthiness() {
        assert!(!Value::Int(0).is_truthy());
        assert!(Value::Int(-3).is_truthy());
        assert!(!Value::Char('\0').is_truthy());
        assert!(Value::Char('a').is_truthy());
        assert!(!Value::Str(String::new()).is_truthy());
    }

    #[test]
    fn test_as_int() {
        assert_eq!(Value::Char('A').as_int(), 65);
        assert_eq!(Value::Str(" 12 ".to_string()).as_int(), 12);
        assert_eq!(Value::Str("abc".to_string()).as_int(), 0);
    }

    #[test]
    fn test_json_round_trip_keeps_order_and_labels() {
        use crate::ast::BinaryOp;

        let program = IrProgram::new(vec![
            Instruction::Label { name: "L1".to_string() },
            Instruction::BinOp {
                dst: "t1".to_string(),
                op: BinaryOp::Gt,
                lhs: Operand::name("a"),
                rhs: Operand::int(0),
            },
            Instruction::IfFalseGoto { cond: Operand::name("t1"), label: "L2".to_string() },
            Instruction::PrintVar { kind: IoKind::Char, var: "c".to_string() },
            Instruction::Assign { dst: "c".to_string(), src: Operand::Literal(Value::Char('\n')) },
            Instruction::Goto { label: "L1".to_string() },
            Instruction::Label { name: "L2".to_string() },
        ]);
        let json = program.to_json().unwrap();
        let back = IrProgram::from_json(&json).unwrap();
        assert_eq!(back, program);
        assert_eq!(back.label_index("L2"), Some(6));
    }
}
