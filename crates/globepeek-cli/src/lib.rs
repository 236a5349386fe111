//! Globe Peek CLI library.
//!
//! Terminal styling, output rendering and the persisted session file used by
//! the `globepeek` binary.

pub mod output;
pub mod session_file;
pub mod terminal;

#[cfg(test)]
pub(crate) mod test_helpers;
