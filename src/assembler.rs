//! Assembly of raw source text into an address-resolved
//! [Program](crate::program::Program).
//!
//! Assembly is three sequential passes over the raw script:
//!
//! 1. **Label indexing**: strips comments, blank lines and directives,
//!    records label declarations against the address of their instruction and
//!    keeps per-instruction source-line provenance for breakpoint mapping.
//! 2. **Directives**: processes `#capture` lines into the signal binding
//!    table, using the label table from pass 1.
//! 3. **Address resolution**: rewrites both address operands of every
//!    instruction into concrete processed addresses.
//!
//! Any failure aborts the whole assembly; no partial program escapes.

use std::collections::HashMap;

use edit_distance::edit_distance;
use itertools::Itertools;
use nom::{
    branch::alt,
    bytes::complete::{tag, take_while1},
    combinator::{all_consuming, map, map_res, verify},
    sequence::{pair, preceded},
    IResult,
};
use slog::{o, trace, Discard, Logger};

use crate::error::CompileError;
use crate::lookup::BidirectionalLookup;
use crate::program::{Instruction, Program};
use crate::source_map::SourceMap;

/// Cleans up a single raw source line: tabs become spaces, runs of spaces
/// collapse into one, both ends are trimmed.
///
/// Both pass 1 and pass 2 normalize before tokenizing, so splitting on a
/// single space is reliable everywhere downstream.
pub fn normalize(line: &str) -> String {
    line.split(|c| c == ' ' || c == '\t')
        .filter(|token| !token.is_empty())
        .join(" ")
}

/// An address operand as written in the source.
#[derive(Debug, Clone, PartialEq)]
enum Operand {
    /// `+N` / `-N`, relative to the instruction's own address.
    Relative(i64),

    /// `#N`, used verbatim without consulting the label table.
    Absolute(usize),

    /// A label name to look up.
    Label(String),
}

fn decimal(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_digit(10))(input)
}

fn relative(input: &str) -> IResult<&str, Operand> {
    map_res(
        pair(alt((tag("+"), tag("-"))), decimal),
        |(sign, digits): (&str, &str)| {
            digits.parse::<i64>().map(|offset| match sign {
                "-" => Operand::Relative(-offset),
                _ => Operand::Relative(offset),
            })
        },
    )(input)
}

fn absolute(input: &str) -> IResult<&str, Operand> {
    map_res(preceded(tag("#"), decimal), |digits: &str| {
        digits.parse::<usize>().map(Operand::Absolute)
    })(input)
}

fn label(input: &str) -> IResult<&str, Operand> {
    map(
        verify(take_while1(|c: char| c != ' '), |name: &str| {
            !name.starts_with(|c| c == '#' || c == '+' || c == '-')
        }),
        |name: &str| Operand::Label(name.to_string()),
    )(input)
}

fn operand(input: &str) -> IResult<&str, Operand> {
    all_consuming(alt((absolute, relative, label)))(input)
}

/// Picks the declared label closest to `name`, if any is close enough to be
/// a plausible typo.
fn suggest_label(name: &str, labels: &HashMap<String, usize>) -> Option<String> {
    labels
        .keys()
        .map(|candidate| (edit_distance(name, candidate), candidate))
        .filter(|(distance, _)| *distance <= 2)
        .min_by_key(|(distance, _)| *distance)
        .map(|(_, candidate)| candidate.clone())
}

/// An instruction line that survived pass 1.
struct ProcessedLine {
    /// Normalized text, label token already stripped.
    text: String,

    /// 0-based line number in the raw source.
    source_line: usize,
}

/// Output of pass 1: the stripped program plus the label table.
struct Indexed {
    lines: Vec<ProcessedLine>,
    labels: HashMap<String, usize>,
}

fn pass_one(raw_lines: &[&str], logger: &Logger) -> Result<Indexed, CompileError> {
    let logger = logger.new(o!("pass" => 1));

    let mut lines: Vec<ProcessedLine> = Vec::new();
    let mut labels = HashMap::new();

    for (source_line, raw) in raw_lines.iter().enumerate() {
        let trimmed = raw.trim();

        // Blank lines and comments vanish here; directive lines survive only
        // until pass 2 reads them.
        if trimmed.is_empty() || trimmed.starts_with(';') || trimmed.starts_with('#') {
            continue;
        }

        let normalized = normalize(raw);
        let address = lines.len();
        let mut tokens = normalized.split(' ').collect::<Vec<_>>();

        if let Some(first) = tokens.first().copied() {
            if first.ends_with(':') {
                let name = &first[..first.len() - 1];

                if labels.insert(name.to_string(), address).is_some() {
                    return Err(CompileError::DuplicateLabel {
                        label: name.to_string(),
                        line: source_line,
                    });
                }

                trace!(logger, "label indexed"; "label" => name, "address" => address);

                tokens.remove(0);
            }
        }

        lines.push(ProcessedLine {
            text: tokens.join(" "),
            source_line,
        });
    }

    Ok(Indexed { lines, labels })
}

fn pass_two(
    raw_lines: &[&str],
    labels: &HashMap<String, usize>,
    logger: &Logger,
) -> Result<BidirectionalLookup<String, usize>, CompileError> {
    let logger = logger.new(o!("pass" => 2));

    let mut captures = BidirectionalLookup::new();

    for (source_line, raw) in raw_lines.iter().enumerate() {
        if !raw.trim().starts_with('#') {
            continue;
        }

        let directive = normalize(raw);
        let tokens = directive.split(' ').collect::<Vec<_>>();

        // Keywords are case-insensitive. Unrecognized directives are skipped
        // rather than rejected, so newer scripts still load on older builds.
        match tokens.first() {
            Some(keyword) if keyword.to_lowercase() == "#capture" => {
                if tokens.len() != 3 {
                    return Err(CompileError::CaptureArity { line: source_line });
                }

                let signal = tokens[1];
                let name = tokens[2];

                let address = match labels.get(name) {
                    Some(address) => *address,
                    None => {
                        return Err(CompileError::UnknownLabel {
                            suggestion: suggest_label(name, labels),
                            label: name.to_string(),
                            line: source_line,
                        })
                    }
                };

                captures
                    .insert(signal.to_string(), address)
                    .map_err(|entry| CompileError::DuplicateCaptureBinding {
                        signal: entry.left,
                        address: entry.right,
                    })?;

                trace!(logger, "capture bound"; "signal" => signal, "address" => address);
            }
            _ => (),
        }
    }

    Ok(captures)
}

/// Resolves one address operand against the instruction's own address and
/// the label table.
fn resolve_address(
    token: &str,
    address: usize,
    line: usize,
    labels: &HashMap<String, usize>,
) -> Result<usize, CompileError> {
    let (_, operand) = operand(token).map_err(|_| CompileError::InvalidOperand {
        line,
        token: token.to_string(),
    })?;

    match operand {
        Operand::Absolute(target) => Ok(target),
        Operand::Relative(offset) => {
            let target = address as i64 + offset;

            if target < 0 {
                return Err(CompileError::InvalidOperand {
                    line,
                    token: token.to_string(),
                });
            }

            Ok(target as usize)
        }
        Operand::Label(name) => match labels.get(&name) {
            Some(target) => Ok(*target),
            None => Err(CompileError::UnknownLabel {
                suggestion: suggest_label(&name, labels),
                label: name,
                line,
            }),
        },
    }
}

fn pass_three(indexed: &Indexed, logger: &Logger) -> Result<Vec<Instruction>, CompileError> {
    let logger = logger.new(o!("pass" => 3));

    let mut instructions = Vec::with_capacity(indexed.lines.len());

    for (address, processed) in indexed.lines.iter().enumerate() {
        // Errors report the line the user wrote, not the processed address.
        let line = processed.source_line;
        let tokens = processed.text.split(' ').collect::<Vec<_>>();

        if tokens.len() != 3 {
            return Err(CompileError::MalformedInstruction {
                line,
                text: processed.text.clone(),
            });
        }

        // The bit literal passes through unresolved; execution validates it,
        // since the copy mechanism may rewrite it between now and then.
        let copy = resolve_address(tokens[1], address, line, &indexed.labels)?;
        let jump = resolve_address(tokens[2], address, line, &indexed.labels)?;

        trace!(
            logger, "instruction resolved";
            "address" => address, "copy" => copy, "jump" => jump
        );

        instructions.push(Instruction {
            bit: tokens[0].to_string(),
            copy,
            jump,
        });
    }

    Ok(instructions)
}

/// Assembles `source` into an executable [Program].
pub fn assemble(source: &str) -> Result<Program, CompileError> {
    assemble_with_logger(source, None)
}

/// Assembles `source`, tracing every indexed label, capture binding and
/// resolved instruction to `logger`.
pub fn assemble_with_logger<L>(source: &str, logger: L) -> Result<Program, CompileError>
where
    L: Into<Option<Logger>>,
{
    let logger = logger
        .into()
        .unwrap_or(Logger::root(Discard, o!()))
        .new(o!("stage" => "assembly"));

    let raw_lines = source.lines().collect::<Vec<_>>();

    let indexed = pass_one(&raw_lines, &logger)?;
    let captures = pass_two(&raw_lines, &indexed.labels, &logger)?;
    let instructions = pass_three(&indexed, &logger)?;

    let source_map: SourceMap = indexed
        .lines
        .iter()
        .enumerate()
        .map(|(address, processed)| (address, processed.source_line))
        .collect();

    Ok(Program {
        instructions,
        labels: indexed.labels,
        source_map,
        captures,
    })
}
