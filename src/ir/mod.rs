//! Three-address intermediate representation
//!
//! A flat, ordered list of instructions. Control flow is expressed only with
//! labels and jumps; there are no blocks and no nesting.

mod instr;
mod types;
mod builder;
mod lower;

pub use instr::*;
pub use types::*;
pub use builder::*;
pub use lower::*;

/// Render a program one instruction per line. Labels sit flush left,
/// everything else is indented under them.
pub fn print_program(program: &IrProgram) -> String {
    let mut output = String::new();
    for (index, instr) in program.iter().enumerate() {
        if instr.is_label() {
            output.push_str(&format!("{:>4}  {}\n", index, instr));
        } else {
            output.push_str(&format!("{:>4}      {}\n", index, instr));
        }
    }
    output
}
