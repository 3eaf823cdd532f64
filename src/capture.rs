//! ASCII waveform capture of bound signals.

use std::collections::HashMap;

use crate::lookup::BidirectionalLookup;
use crate::program::Instruction;

/// Width the signal name is padded to in front of its waveform.
const LABEL_WIDTH: usize = 6;

/// Accumulated waveforms, one per bound signal.
///
/// The engine samples every bound address once per executed instruction and
/// appends one character per sample: `-` while the bit stored there is set,
/// `_` while it is clear. Over the lifetime of a run this grows an ASCII
/// timing diagram per signal:
///
/// ```text
/// clk    -_-_-_-_
/// data   ___---__
/// ```
///
/// A fresh buffer is created for every run; waveforms are never persisted.
#[derive(Debug, Clone, Default)]
pub struct CaptureBuffer {
    waveforms: HashMap<String, String>,
}

impl CaptureBuffer {
    pub fn new() -> CaptureBuffer {
        CaptureBuffer {
            waveforms: HashMap::new(),
        }
    }

    /// Samples every address bound in `bindings` against the current program
    /// image, appending one character to each signal's waveform.
    ///
    /// First-time signals are seeded with their padded name so the waveform
    /// renders as a labeled trace.
    pub fn sample(
        &mut self,
        bindings: &BidirectionalLookup<String, usize>,
        instructions: &[Instruction],
    ) {
        for address in bindings.right_values() {
            let signal = match bindings.by_right(address) {
                Some(signal) => signal,
                None => continue,
            };

            let high = instructions
                .get(*address)
                .map(|instruction| instruction.bit == "1")
                .unwrap_or(false);

            let waveform = self
                .waveforms
                .entry(signal.clone())
                .or_insert_with(|| format!("{:<width$} ", signal, width = LABEL_WIDTH));

            waveform.push(if high { '-' } else { '_' });
        }
    }

    /// The waveform accumulated for `signal`, if it has been sampled.
    pub fn waveform(&self, signal: &str) -> Option<&str> {
        self.waveforms.get(signal).map(String::as_str)
    }

    /// Clones the buffer for publication in a capture-update event.
    pub fn snapshot(&self) -> HashMap<String, String> {
        self.waveforms.clone()
    }

    pub fn clear(&mut self) {
        self.waveforms.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn program(bits: &[&str]) -> Vec<Instruction> {
        bits.iter()
            .map(|bit| Instruction {
                bit: bit.to_string(),
                copy: 0,
                jump: 0,
            })
            .collect()
    }

    fn bindings(entries: &[(&str, usize)]) -> BidirectionalLookup<String, usize> {
        let mut lookup = BidirectionalLookup::new();
        for (signal, address) in entries {
            lookup.insert(signal.to_string(), *address).unwrap();
        }
        lookup
    }

    #[test]
    fn first_sample_seeds_the_padded_name() {
        let mut buffer = CaptureBuffer::new();
        buffer.sample(&bindings(&[("clk", 0)]), &program(&["1"]));

        assert_eq!(buffer.waveform("clk"), Some("clk    -"));
    }

    #[test]
    fn samples_follow_the_stored_bit() {
        let mut instructions = program(&["1", "0"]);
        let bindings = bindings(&[("clk", 0), ("data", 1)]);
        let mut buffer = CaptureBuffer::new();

        buffer.sample(&bindings, &instructions);
        instructions[0].bit = "0".to_string();
        instructions[1].bit = "1".to_string();
        buffer.sample(&bindings, &instructions);

        assert_eq!(buffer.waveform("clk"), Some("clk    -_"));
        assert_eq!(buffer.waveform("data"), Some("data   _-"));
    }

    #[test]
    fn waveform_grows_one_character_per_sample() {
        let instructions = program(&["1"]);
        let bindings = bindings(&[("s", 0)]);
        let mut buffer = CaptureBuffer::new();

        for _ in 0..5 {
            buffer.sample(&bindings, &instructions);
        }

        assert_eq!(buffer.waveform("s"), Some("s      -----"));
    }

    #[test]
    fn names_longer_than_the_pad_are_not_truncated() {
        let mut buffer = CaptureBuffer::new();
        buffer.sample(&bindings(&[("long_signal", 0)]), &program(&["0"]));

        assert_eq!(buffer.waveform("long_signal"), Some("long_signal _"));
    }

    #[test]
    fn clear_discards_accumulated_waveforms() {
        let mut buffer = CaptureBuffer::new();
        buffer.sample(&bindings(&[("clk", 0)]), &program(&["1"]));
        buffer.clear();

        assert_eq!(buffer.waveform("clk"), None);
        assert!(buffer.snapshot().is_empty());
    }
}
