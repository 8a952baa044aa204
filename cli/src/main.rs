use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::EnvFilter;

use brine_fields::{CancellationToken, CodecConfig, FieldCodec, Value};

mod json;

use json::{values_from_json, Decoded};

/// Exit code of `verify` when the input does not match.
const MISMATCH_EXIT_CODE: u8 = 2;

#[derive(Parser, Debug)]
#[command(name = "bfields", version)]
#[command(about = "Check field definitions and encode, decode or verify binary messages", long_about = None)]
struct Cli {
    /// Verbose logging. Repeat for more (-v, -vv, -vvv). RUST_LOG overrides.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// JSON file with codec settings
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Compile a definition and print its fields as JSON
    Check {
        /// Definition text, or `@path` to read it from a file
        #[arg(short, long)]
        definition: String,
    },

    /// Encode a JSON array of values into a binary message
    Encode {
        /// Definition text, or `@path` to read it from a file
        #[arg(short, long)]
        definition: String,

        /// JSON file holding one value per field, in definition order
        #[arg(long)]
        values: PathBuf,

        /// Binary file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Decode a binary message and print it as a JSON object
    Decode {
        /// Definition text, or `@path` to read it from a file
        #[arg(short, long)]
        definition: String,

        /// Binary file to read
        #[arg(short, long)]
        input: PathBuf,
    },

    /// Compare a binary message with expected values and print every mismatch
    Verify {
        /// Definition text, or `@path` to read it from a file
        #[arg(short, long)]
        definition: String,

        /// Binary file to read
        #[arg(short, long)]
        input: PathBuf,

        /// JSON file holding the expected values, in definition order
        #[arg(short, long)]
        expected: PathBuf,
    },
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match cli.verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => ExitCode::from(code),
        Err(e) => {
            tracing::error!("{e:#}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> Result<u8> {
    let config = load_config(cli.config.as_deref()).await?;

    match cli.command {
        Commands::Check { definition } => {
            let codec = load_codec(&definition, config).await?;
            println!("{}", serde_json::to_string_pretty(codec.fields())?);
            Ok(0)
        }

        Commands::Encode {
            definition,
            values,
            output,
        } => {
            let codec = load_codec(&definition, config).await?;
            let values = read_values(&codec, &values).await?;
            let len = encode(&codec, &values, &output).await?;
            tracing::info!(bytes = len, output = %output.display(), "message written");
            Ok(0)
        }

        Commands::Decode { definition, input } => {
            let codec = load_codec(&definition, config).await?;
            let decoded = decode(&codec, &input).await?;
            println!("{}", decoded);
            Ok(0)
        }

        Commands::Verify {
            definition,
            input,
            expected,
        } => {
            let codec = load_codec(&definition, config).await?;
            let expected = read_values(&codec, &expected).await?;
            let (report, success) = verify(&codec, &expected, &input).await?;
            println!("{}", report);
            Ok(if success { 0 } else { MISMATCH_EXIT_CODE })
        }
    }
}

async fn load_config(path: Option<&Path>) -> Result<CodecConfig> {
    let Some(path) = path else {
        return Ok(CodecConfig::default());
    };
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    CodecConfig::from_json(&text).with_context(|| format!("parsing {}", path.display()))
}

/// `@path` reads the definition from a file; anything else is the text itself.
async fn load_codec(definition: &str, config: CodecConfig) -> Result<FieldCodec> {
    let text = match definition.strip_prefix('@') {
        Some(path) => fs::read_to_string(path)
            .await
            .with_context(|| format!("reading definition {}", path))?,
        None => definition.to_string(),
    };
    let codec = FieldCodec::with_config(text.trim(), config)?;
    tracing::debug!(definition = codec.definition(), fields = codec.fields().len(), "compiled");
    Ok(codec)
}

async fn read_values(codec: &FieldCodec, path: &Path) -> Result<Vec<Value>> {
    let text = fs::read_to_string(path)
        .await
        .with_context(|| format!("reading {}", path.display()))?;
    let json: serde_json::Value =
        serde_json::from_str(&text).with_context(|| format!("parsing {}", path.display()))?;
    values_from_json(codec.fields(), &json).with_context(|| format!("in {}", path.display()))
}

async fn encode(codec: &FieldCodec, values: &[Value], output: &Path) -> Result<u64> {
    let mut file = fs::File::create(output)
        .await
        .with_context(|| format!("creating {}", output.display()))?;
    codec.write(values, &mut file, &CancellationToken::new()).await?;
    file.flush().await?;
    Ok(file.metadata().await?.len())
}

async fn decode(codec: &FieldCodec, input: &Path) -> Result<String> {
    let mut file = fs::File::open(input)
        .await
        .with_context(|| format!("opening {}", input.display()))?;
    let result = codec.read(&mut file, &CancellationToken::new()).await;
    if !result.success {
        bail!(
            "{}: {}",
            result.error_code.map(|c| c.to_string()).unwrap_or_default(),
            result.error.unwrap_or_default()
        );
    }
    Ok(serde_json::to_string_pretty(&Decoded(&result))?)
}

async fn verify(codec: &FieldCodec, expected: &[Value], input: &Path) -> Result<(String, bool)> {
    let mut file = fs::File::open(input)
        .await
        .with_context(|| format!("opening {}", input.display()))?;
    let report = codec.verify(expected, &mut file, &CancellationToken::new()).await;
    Ok((serde_json::to_string_pretty(&report)?, report.success))
}
