mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use traced_invocations_cli::inputs::{environment_inputs, load_profile, InputFlags};
use traced_invocations_cli::output::OutputFormat;
use traced_invocations_lib::{resolve_with, EnvironmentInputs};

use commands::bundle::{handle_bundle, BundleOptions, RuntimeArg};
use commands::outputs::handle_outputs;
use commands::plan::handle_plan;
use commands::synth::handle_synth;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Resolve and synthesize the traced invocations stack"
)]
struct Cli {
    /// Target account id (overrides CDK_DEFAULT_ACCOUNT).
    #[arg(long, global = true)]
    account: Option<String>,

    /// Target region (overrides CDK_DEFAULT_REGION).
    #[arg(long, global = true)]
    region: Option<String>,

    /// Tracing API key (overrides DD_API_KEY).
    #[arg(long, global = true)]
    api_key: Option<String>,

    /// JSON stack profile overriding the built-in names and sizes.
    #[arg(long, global = true)]
    profile: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the resolved deployment plan.
    Plan {
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Synthesize the provisioning template.
    Synth {
        /// Directory holding one staged artifact directory per unit.
        #[arg(long, default_value = "assets")]
        asset_root: PathBuf,
        /// Write the template here instead of stdout.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Render the stack outputs for a deployed API base address.
    Outputs {
        /// Materialized base address of the REST API.
        #[arg(long)]
        api_url: String,
        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
    /// Build every unit's artifact in its toolchain container.
    Bundle {
        /// Workspace source tree mounted read-only into the container.
        #[arg(long)]
        source: PathBuf,
        /// Directory receiving one artifact directory per unit.
        #[arg(long)]
        out: PathBuf,
        /// Container runtime; detected when omitted (podman, then docker).
        #[arg(long, value_enum)]
        runtime: Option<RuntimeArg>,
        /// Executable to invoke in place of the runtime's binary.
        #[arg(long)]
        program: Option<String>,
    },
}

fn main() -> Result<()> {
    init_tracing();
    let cli = Cli::parse();

    let profile = load_profile(cli.profile.as_deref())?;
    let flags = InputFlags {
        account: cli.account,
        region: cli.region,
        api_key: cli.api_key,
    };
    let inputs = environment_inputs(flags, EnvironmentInputs::from_env());
    let plan = resolve_with(&profile, &inputs).context("failed to resolve deployment plan")?;

    match cli.command {
        Command::Plan { format } => handle_plan(&plan, format),
        Command::Synth { asset_root, output } => {
            handle_synth(&plan, &asset_root, output.as_deref())
        }
        Command::Outputs { api_url, format } => handle_outputs(&plan, &api_url, format),
        Command::Bundle {
            source,
            out,
            runtime,
            program,
        } => handle_bundle(
            &plan,
            BundleOptions {
                source: &source,
                out: &out,
                runtime,
                program: program.as_deref(),
            },
        ),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .finish();

    let _ = tracing::subscriber::set_global_default(subscriber);
}
