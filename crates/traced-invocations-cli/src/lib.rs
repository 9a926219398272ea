//! Traced invocations CLI library.
//!
//! Rendering and input plumbing shared by the `traced-invocations-cli`
//! subcommands. Resolution and synthesis themselves live in
//! `traced_invocations_lib`.

pub mod inputs;
pub mod output;
