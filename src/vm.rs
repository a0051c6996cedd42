//! Virtual machine for the three-address IR
//!
//! Execution happens in two stages. [`Vm::load`] builds the label table and
//! rejects programs whose jumps cannot be resolved. [`Vm::run`] is then a
//! plain fetch-decode-execute loop over a variable store, with the program
//! counter advanced by one or set by a jump.
//!
//! Runtime faults (division by zero, unreadable input) are recovered with a
//! default value and reported as warnings, unless strict arithmetic is on.

use std::collections::HashMap;

use thiserror::Error;
use tracing::{debug, info, trace};

use crate::ast::BinaryOp;
use crate::diagnostics::{Diagnostic, DiagnosticSink};
use crate::io::{InputProvider, Output};
use crate::ir::{Instruction, IoKind, IrProgram, Operand, Value};

/// Stored for `%c` when the input provider gives nothing to read
pub const CHAR_SENTINEL: char = '\0';

/// Errors that stop the VM, either before execution or as a fault during it
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VmError {
    #[error("label '{label}' is defined at instructions {first} and {second}")]
    DuplicateLabel {
        label: String,
        first: usize,
        second: usize,
    },

    #[error("instruction {at} jumps to undefined label '{label}'")]
    UndefinedLabel { label: String, at: usize },

    #[error("division by zero at instruction {at}")]
    DivisionByZero { at: usize },

    #[error("step limit of {limit} instructions exceeded")]
    StepLimitExceeded { limit: u64 },
}

/// Execution knobs
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VmConfig {
    /// Fault on division by zero instead of storing 0
    pub strict_arithmetic: bool,
    /// Fault after this many executed instructions
    pub step_limit: Option<u64>,
}

/// Where the machine is
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VmState {
    Running,
    /// The program counter ran off the end of the program
    Halted,
    Faulted(VmError),
}

/// Result of a run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Execution {
    pub state: VmState,
    /// Instructions executed
    pub steps: u64,
}

impl Execution {
    pub fn halted(&self) -> bool {
        self.state == VmState::Halted
    }
}

/// Label name -> instruction index
#[derive(Debug, Clone, Default)]
pub struct LabelTable {
    labels: HashMap<String, usize>,
}

impl LabelTable {
    /// Index every `Label` and check that every jump lands on one
    pub fn build(program: &IrProgram) -> Result<Self, VmError> {
        let mut labels = HashMap::new();
        for (index, instr) in program.iter().enumerate() {
            if let Instruction::Label { name } = instr {
                if let Some(&first) = labels.get(name) {
                    return Err(VmError::DuplicateLabel {
                        label: name.clone(),
                        first,
                        second: index,
                    });
                }
                labels.insert(name.clone(), index);
            }
        }

        for (at, instr) in program.iter().enumerate() {
            if let Some(label) = instr.jump_target() {
                if !labels.contains_key(label) {
                    return Err(VmError::UndefinedLabel {
                        label: label.to_string(),
                        at,
                    });
                }
            }
        }

        Ok(Self { labels })
    }

    pub fn resolve(&self, label: &str) -> Option<usize> {
        self.labels.get(label).copied()
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// The virtual machine
#[derive(Debug)]
pub struct Vm {
    program: IrProgram,
    labels: LabelTable,
    variables: HashMap<String, Value>,
    pc: usize,
    state: VmState,
    steps: u64,
    config: VmConfig,
}

impl Vm {
    /// Resolve labels and get ready to run from instruction 0
    pub fn load(program: IrProgram, config: VmConfig) -> Result<Self, VmError> {
        let labels = LabelTable::build(&program)?;
        debug!(instructions = program.len(), labels = labels.len(), "program loaded");
        Ok(Self {
            program,
            labels,
            variables: HashMap::new(),
            pc: 0,
            state: VmState::Running,
            steps: 0,
            config,
        })
    }

    /// Current value of a variable or temporary
    pub fn variable(&self, name: &str) -> Option<&Value> {
        self.variables.get(name)
    }

    /// Run until the program halts or faults
    pub fn run(
        &mut self,
        output: &mut dyn Output,
        input: &mut dyn InputProvider,
        diagnostics: &mut dyn DiagnosticSink,
    ) -> Execution {
        info!(instructions = self.program.len(), "starting execution");

        while self.state == VmState::Running {
            if self.pc >= self.program.len() {
                self.state = VmState::Halted;
                break;
            }
            if let Some(limit) = self.config.step_limit {
                if self.steps >= limit {
                    self.state = VmState::Faulted(VmError::StepLimitExceeded { limit });
                    break;
                }
            }

            if let Err(fault) = self.step(output, input, diagnostics) {
                self.state = VmState::Faulted(fault);
            }
            self.steps += 1;
        }

        info!(state = ?self.state, steps = self.steps, "execution finished");
        Execution {
            state: self.state.clone(),
            steps: self.steps,
        }
    }

    /// Execute the instruction at `pc`
    fn step(
        &mut self,
        output: &mut dyn Output,
        input: &mut dyn InputProvider,
        diagnostics: &mut dyn DiagnosticSink,
    ) -> Result<(), VmError> {
        let at = self.pc;
        let instr = &self.program.instructions[at];
        trace!(pc = at, %instr, "step");

        let mut next = at + 1;
        match instr {
            Instruction::Assign { dst, src } => {
                let value = resolve(&self.variables, src);
                self.variables.insert(dst.clone(), value);
            }
            Instruction::BinOp { dst, op, lhs, rhs } => {
                let lhs = resolve(&self.variables, lhs);
                let rhs = resolve(&self.variables, rhs);
                let value = match apply(*op, &lhs, &rhs) {
                    Some(value) => value,
                    None if self.config.strict_arithmetic => {
                        return Err(VmError::DivisionByZero { at });
                    }
                    None => {
                        diagnostics.report(Diagnostic::runtime(format!(
                            "division by zero in '{}' at instruction {}, using 0",
                            instr, at
                        )));
                        Value::Int(0)
                    }
                };
                self.variables.insert(dst.clone(), value);
            }
            Instruction::IfFalseGoto { cond, label } => {
                if !resolve(&self.variables, cond).is_truthy() {
                    next = self.jump_target(label, at)?;
                }
            }
            Instruction::Goto { label } => {
                next = self.jump_target(label, at)?;
            }
            Instruction::Label { .. } => {}
            Instruction::PrintLiteral { text } => output.emit(text),
            Instruction::PrintVar { kind, var } => {
                let value = self.variables.get(var).cloned().unwrap_or_default();
                output.emit(&format_value(*kind, &value));
            }
            Instruction::ScanVar { kind, var } => {
                let prompt = format!("Enter a value for '{}' ({}): ", var, kind);
                let response = input.request(&prompt);
                let value = read_value(*kind, var, response, diagnostics);
                self.variables.insert(var.clone(), value);
            }
        }

        self.pc = next;
        Ok(())
    }

    fn jump_target(&self, label: &str, at: usize) -> Result<usize, VmError> {
        self.labels.resolve(label).ok_or_else(|| VmError::UndefinedLabel {
            label: label.to_string(),
            at,
        })
    }
}

/// Literal operands are themselves; names read the store, defaulting to 0
fn resolve(variables: &HashMap<String, Value>, operand: &Operand) -> Value {
    match operand {
        Operand::Literal(value) => value.clone(),
        Operand::Name(name) => match variables.get(name) {
            Some(value) => value.clone(),
            None => {
                trace!(%name, "read of unbound name, using 0");
                Value::default()
            }
        },
    }
}

/// Apply a binary operator. `None` means division by zero.
fn apply(op: BinaryOp, lhs: &Value, rhs: &Value) -> Option<Value> {
    if let (Value::Str(a), Value::Str(b)) = (lhs, rhs) {
        if op.is_comparison() {
            return Some(Value::from_bool(compare(op, a, b)));
        }
    }

    let (a, b) = (lhs.as_int(), rhs.as_int());
    let value = match op {
        BinaryOp::Add => Value::Int(a.wrapping_add(b)),
        BinaryOp::Sub => Value::Int(a.wrapping_sub(b)),
        BinaryOp::Mul => Value::Int(a.wrapping_mul(b)),
        BinaryOp::Div => {
            if b == 0 {
                return None;
            }
            Value::Int(a.wrapping_div(b))
        }
        BinaryOp::And => Value::from_bool(lhs.is_truthy() && rhs.is_truthy()),
        BinaryOp::Or => Value::from_bool(lhs.is_truthy() || rhs.is_truthy()),
        _ => Value::from_bool(compare(op, &a, &b)),
    };
    Some(value)
}

fn compare<T: PartialOrd + ?Sized>(op: BinaryOp, a: &T, b: &T) -> bool {
    match op {
        BinaryOp::Eq => a == b,
        BinaryOp::Ne => a != b,
        BinaryOp::Lt => a < b,
        BinaryOp::Le => a <= b,
        BinaryOp::Gt => a > b,
        BinaryOp::Ge => a >= b,
        _ => false,
    }
}

/// Text for `printf` of a variable
pub fn format_value(kind: IoKind, value: &Value) -> String {
    match kind {
        IoKind::Int => value.as_int().to_string(),
        IoKind::Char => match value {
            Value::Char(c) => c.to_string(),
            Value::Int(n) => u32::try_from(*n)
                .ok()
                .and_then(char::from_u32)
                .map(String::from)
                .unwrap_or_default(),
            Value::Str(s) => s.chars().next().map(String::from).unwrap_or_default(),
        },
        IoKind::Str => value.to_string(),
    }
}

/// Turn an input response into a value, falling back to defaults
fn read_value(
    kind: IoKind,
    var: &str,
    response: Option<String>,
    diagnostics: &mut dyn DiagnosticSink,
) -> Value {
    let Some(text) = response else {
        diagnostics.report(Diagnostic::runtime(format!(
            "no input available for '{}', using the default",
            var
        )));
        return match kind {
            IoKind::Int => Value::Int(0),
            IoKind::Char => Value::Char(CHAR_SENTINEL),
            IoKind::Str => Value::Str(String::new()),
        };
    };

    match kind {
        IoKind::Int => match text.trim().parse::<i64>() {
            Ok(n) => Value::Int(n),
            Err(_) => {
                diagnostics.report(Diagnostic::runtime(format!(
                    "'{}' is not an integer for '{}', using 0",
                    text, var
                )));
                Value::Int(0)
            }
        },
        IoKind::Char => Value::Char(text.chars().next().unwrap_or(CHAR_SENTINEL)),
        IoKind::Str => Value::Str(text),
    }
}
