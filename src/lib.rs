//! cmini: a compiler and virtual machine for a small C subset
//!
//! Programs use `int`/`char` variables, arithmetic, comparisons and logic,
//! `if`/`else`, `while`, and `printf`/`scanf` with a single conversion.
//! They are compiled to a flat three-address IR and interpreted.
//!
//! # Architecture
//!
//! ```text
//! Source Code (.c)
//!       │
//!       ▼
//! ┌─────────────┐
//! │    Lexer    │  → Tokens
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │   Parser    │  → AST, declared-before-use checks
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │ IR Lowering │  → Three-address IR
//! └─────────────┘
//!       │
//!       ▼
//! ┌─────────────┐
//! │     VM      │  → Output via Output / InputProvider
//! └─────────────┘
//! ```
//!
//! Every stage reports into the [`Session`] that owns the symbol table and
//! the temporary/label counters for one translation unit.

pub mod span;
pub mod token;
pub mod lexer;
pub mod ast;
pub mod diagnostics;
pub mod session;
pub mod parser;
pub mod ir;
pub mod io;
pub mod vm;

use thiserror::Error;

// Re-exports for convenience
pub use diagnostics::{Diagnostic, Diagnostics, Phase, Severity};
pub use io::{BufferedOutput, InputProvider, Output, ScriptedInput, StdinInput, StdoutOutput};
pub use ir::{Instruction, IrProgram, Operand, Value};
pub use lexer::Lexer;
pub use session::{CompileError, Compilation, Session};
pub use span::Span;
pub use token::{Token, TokenKind};
pub use vm::{Execution, Vm, VmConfig, VmError, VmState};

/// Compiler version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Why a source text could not be run
#[derive(Error, Debug)]
pub enum RunError {
    /// Compilation stopped; `diagnostics` holds everything reported up to then
    #[error("{error}")]
    Compile {
        error: CompileError,
        diagnostics: Diagnostics,
    },

    #[error(transparent)]
    Load(#[from] VmError),
}

/// Everything a run produced
#[derive(Debug)]
pub struct RunReport {
    pub compilation: Compilation,
    pub execution: Execution,
    /// Compile-time diagnostics followed by runtime ones
    pub diagnostics: Diagnostics,
    pub vm: Vm,
}

/// Compile `source` in a fresh session and execute it
pub fn run_source(
    source: &str,
    config: VmConfig,
    output: &mut dyn Output,
    input: &mut dyn InputProvider,
) -> Result<RunReport, RunError> {
    let mut session = Session::new();
    let compilation = match session.compile(source) {
        Ok(compilation) => compilation,
        Err(error) => {
            return Err(RunError::Compile {
                error,
                diagnostics: session.take_diagnostics(),
            })
        }
    };
    let mut diagnostics = session.take_diagnostics();

    let mut vm = Vm::load(compilation.ir.clone(), config)?;
    let execution = vm.run(output, input, &mut diagnostics);

    Ok(RunReport {
        compilation,
        execution,
        diagnostics,
        vm,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::BinaryOp;
    use crate::ir::IoKind;

    fn run(source: &str, answers: &[&str]) -> (RunReport, BufferedOutput) {
        let mut output = BufferedOutput::new();
        let mut input = ScriptedInput::new(answers.iter().copied());
        let report = run_source(source, VmConfig::default(), &mut output, &mut input)
            .expect("program should compile and load");
        (report, output)
    }

    fn semantic(report: &RunReport) -> Vec<&Diagnostic> {
        report.diagnostics.in_phase(Phase::Semantic).collect()
    }

    #[test]
    fn test_sum_and_print() {
        let (report, output) = run("int x = 5; int y = 3; int z = x + y; printf(\"%d\", z);", &[]);
        let ir = &report.compilation.ir.instructions;

        let binops: Vec<_> = ir
            .iter()
            .filter(|i| matches!(i, Instruction::BinOp { .. }))
            .collect();
        assert_eq!(
            binops,
            vec![&Instruction::BinOp {
                dst: "t1".into(),
                op: BinaryOp::Add,
                lhs: Operand::name("x"),
                rhs: Operand::name("y"),
            }]
        );
        assert!(ir.contains(&Instruction::Assign { dst: "z".into(), src: Operand::name("t1") }));
        assert_eq!(
            ir.iter()
                .filter(|i| **i == Instruction::PrintVar { kind: IoKind::Int, var: "z".into() })
                .count(),
            1
        );

        assert!(report.execution.halted());
        assert_eq!(output.text(), "8");
        assert!(report.diagnostics.is_empty());
    }

    #[test]
    fn test_countdown_loop() {
        let source = "int a = 10; int n = 0; while (a > 0) { a = a - 1; n = n + 1; }";
        let (report, _) = run(source, &[]);
        assert!(report.execution.halted());
        assert_eq!(report.vm.variable("a"), Some(&Value::Int(0)));
        assert_eq!(report.vm.variable("n"), Some(&Value::Int(10)));
    }

    #[test]
    fn test_division_by_zero_is_recovered() {
        let (report, _) = run("int r = 10 / 0;", &[]);
        assert!(report.execution.halted());
        assert_eq!(report.vm.variable("r"), Some(&Value::Int(0)));

        let runtime: Vec<_> = report.diagnostics.in_phase(Phase::Runtime).collect();
        assert_eq!(runtime.len(), 1);
        assert_eq!(runtime[0].severity, Severity::Warning);
    }

    #[test]
    fn test_undeclared_scan_target_still_stored() {
        let (report, _) = run("scanf(\"%d\", &n);", &["7"]);
        let errors = semantic(&report);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("'n'"));
        assert_eq!(report.vm.variable("n"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_false_loop_never_runs_body() {
        let (report, output) = run("int a = 0; while (a > 0) { printf(\"body\"); a = a - 1; }", &[]);
        assert!(report.execution.halted());
        assert_eq!(output.text(), "");
        assert_eq!(report.vm.variable("a"), Some(&Value::Int(0)));
        // assign, start label, compare, ifFalse, end label
        assert_eq!(report.execution.steps, 5);
    }

    #[test]
    fn test_undeclared_use_reads_zero() {
        let (report, output) = run("int y = ghost + 2; printf(\"%d\", y);", &[]);
        let errors = semantic(&report);
        assert_eq!(errors.len(), 1);
        assert!(errors[0].message.contains("ghost"));
        assert_eq!(output.text(), "2");
    }

    #[test]
    fn test_declared_program_is_clean() {
        let source = r#"
            int main() {
                int i = 0;
                char c = 'a';
                while (i < 3) {
                    if (i == 1) {
                        printf("one\n");
                    } else {
                        printf("i = %d\n", i);
                    }
                    i = i + 1;
                }
                printf("%c", c);
                return 0;
            }
        "#;
        let (report, output) = run(source, &[]);
        assert!(semantic(&report).is_empty());
        assert_eq!(output.text(), "i = 0\none\ni = 2\na");
    }

    #[test]
    fn test_syntax_error_stops_the_unit() {
        let mut output = BufferedOutput::new();
        let mut input = ScriptedInput::default();
        let err = run_source("int x = ;", VmConfig::default(), &mut output, &mut input).unwrap_err();
        let RunError::Compile { error, diagnostics } = err else {
            panic!("expected a compile error, got {:?}", err);
        };
        assert!(matches!(error, CompileError::Syntax { .. }));
        assert_eq!(diagnostics.in_phase(Phase::Syntax).count(), 1);
    }

    #[test]
    fn test_strict_mode_faults() {
        let mut output = BufferedOutput::new();
        let mut input = ScriptedInput::default();
        let config = VmConfig { strict_arithmetic: true, ..VmConfig::default() };
        let report = run_source("int r = 1 / 0; printf(\"after\");", config, &mut output, &mut input).unwrap();
        assert!(matches!(report.execution.state, VmState::Faulted(VmError::DivisionByZero { .. })));
        assert_eq!(output.text(), "");
    }

    #[test]
    fn test_block_comments_are_ignored() {
        let source = "int x; /* set x\n to one */ x = 1; printf(\"%d\", x); /* trailing */";
        let (report, output) = run(source, &[]);
        assert!(report.diagnostics.is_empty());
        assert_eq!(output.text(), "1");
    }

    #[test]
    fn test_oversized_literal_saturates() {
        let (report, output) = run("int x = 99999999999999999999; printf(\"%d\", x);", &[]);
        let lexical: Vec<_> = report.diagnostics.in_phase(Phase::Lexical).collect();
        assert_eq!(lexical.len(), 1);
        assert!(lexical[0].message.contains("99999999999999999999"));
        assert_eq!(output.text(), i64::MAX.to_string());
    }

    #[test]
    fn test_string_conversion_of_declared_variable_is_clean() {
        let (report, output) = run("int n = 42; printf(\"n=%s\", n);", &[]);
        assert!(semantic(&report).is_empty());
        assert_eq!(output.text(), "n=42");
    }
}
