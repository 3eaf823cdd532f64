//! Mapping between processed-program addresses and original source lines.

use std::collections::HashMap;
use std::iter::FromIterator;

/// Debug information produced by the first assembly pass.
///
/// Comment and blank lines never reach the processed program, so the
/// processed address of an instruction says nothing about where it was
/// written. This map records, for every processed address, the 0-based line
/// number the instruction occupied in the raw source. The engine uses it to
/// translate breakpoints (expressed in raw line numbers) into pause decisions,
/// and the assembler uses it to report errors against the line the user
/// actually wrote.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SourceMap {
    inner: HashMap<usize, usize>,
}

impl FromIterator<(usize, usize)> for SourceMap {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = (usize, usize)>,
    {
        SourceMap {
            inner: HashMap::from_iter(iter),
        }
    }
}

impl SourceMap {
    pub fn new() -> SourceMap {
        SourceMap {
            inner: HashMap::new(),
        }
    }

    /// Records that the instruction at `address` came from raw source line
    /// `line`.
    pub fn insert(&mut self, address: usize, line: usize) {
        self.inner.insert(address, line);
    }

    /// Returns the original 0-based source line of the instruction at
    /// `address`.
    pub fn get_source_line(&self, address: usize) -> Option<usize> {
        self.inner.get(&address).copied()
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.inner.iter().map(|(addr, line)| (*addr, *line))
    }
}
