// One module per subcommand; main.rs parses arguments and dispatches here.

pub mod bundle;
pub mod outputs;
pub mod plan;
pub mod synth;
