//! The address-resolved program produced by the assembler.

use std::collections::HashMap;
use std::fmt;

use itertools::Itertools;

use crate::error::CompileError;
use crate::lookup::BidirectionalLookup;
use crate::source_map::SourceMap;

/// A single resolved instruction.
///
/// The machine has exactly one instruction: copy the bit literal to the
/// instruction at `copy`, then jump to `jump` if the bit was set, otherwise
/// fall through. The two address operands are concrete after assembly; the
/// bit token stays raw text and is only validated when the instruction is
/// executed, since the copy mechanism can rewrite it at any time.
#[derive(Debug, Clone, PartialEq)]
pub struct Instruction {
    /// Raw bit token. `"0"` or `"1"` in a well-formed program.
    pub bit: String,

    /// Address of the instruction whose bit token is overwritten.
    pub copy: usize,

    /// Branch target taken when the bit is set.
    pub jump: usize,
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{} {} {}", self.bit, self.copy, self.jump)
    }
}

/// A fully assembled program.
///
/// Produced as one immutable snapshot by [assemble](crate::assembler::assemble)
/// and moved into the execution worker wholesale, so a running program can
/// never observe a half-compiled state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Program {
    /// The executable instructions, indexed by processed address.
    pub instructions: Vec<Instruction>,

    /// Label name to processed address. Kept after assembly for diagnostics.
    pub labels: HashMap<String, usize>,

    /// Processed address to original 0-based source line.
    pub source_map: SourceMap,

    /// Signal name to captured address and back.
    pub captures: BidirectionalLookup<String, usize>,
}

impl Program {
    /// Assembles `source` into a program.
    ///
    /// Convenience wrapper around [crate::assembler::assemble].
    pub fn assemble(source: &str) -> Result<Program, CompileError> {
        crate::assembler::assemble(source)
    }

    /// The instruction stored at `address`.
    pub fn get(&self, address: usize) -> Option<&Instruction> {
        self.instructions.get(address)
    }

    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }

    /// Renders the resolved program, one instruction per line.
    pub fn dump(&self) -> String {
        self.instructions
            .iter()
            .map(|instruction| instruction.to_string())
            .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dump_renders_one_line_per_instruction() {
        let program = Program {
            instructions: vec![
                Instruction {
                    bit: "1".to_string(),
                    copy: 0,
                    jump: 0,
                },
                Instruction {
                    bit: "0".to_string(),
                    copy: 2,
                    jump: 1,
                },
            ],
            ..Program::default()
        };

        assert_eq!(program.dump(), "1 0 0\n0 2 1");
    }
}
