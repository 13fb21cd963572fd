//! callflow-mermaid CLI
//!
//! Renders the call flow diagram of a voice app from an offline tenant
//! snapshot.
//!
//! # Usage
//!
//! ```bash
//! callflow-mermaid --input tenant.json --phone-number +15550100
//! ```

use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::{Parser, ValueEnum};
use heck::ToSnakeCase;

use callflow_generator_mermaid::{
    CallFlowGenerator, DirectoryProvider, DocType, RenderOptions, SnapshotProvider,
    VoiceAppSelector,
};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum DocTypeArg {
    Markdown,
    Mermaid,
}

impl From<DocTypeArg> for DocType {
    fn from(arg: DocTypeArg) -> Self {
        match arg {
            DocTypeArg::Markdown => DocType::Markdown,
            DocTypeArg::Mermaid => DocType::Mermaid,
        }
    }
}

/// Render a Mermaid call flow diagram from a tenant snapshot
#[derive(Parser)]
#[command(name = "callflow-mermaid")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to the tenant snapshot JSON file
    #[arg(short, long)]
    input: PathBuf,

    /// Phone number selecting the voice app to render
    #[arg(short, long)]
    phone_number: String,

    /// Output document type
    #[arg(long, value_enum, default_value_t = DocTypeArg::Markdown)]
    doc_type: DocTypeArg,

    /// Expand nested call queues reached through overflow/timeout targets
    #[arg(long)]
    show_nested_queues: bool,

    /// Annotate nested targets with additional top-level phone numbers
    #[arg(long)]
    show_nested_phone_numbers: bool,

    /// Maximum nested expansion depth
    #[arg(long, default_value_t = 1)]
    nested_depth: u32,

    /// Output file path; defaults to the voice app name in the current
    /// directory, with the extension implied by the document type
    #[arg(short, long)]
    output: Option<PathBuf>,
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let json = fs::read_to_string(&cli.input)
        .with_context(|| format!("Failed to read snapshot: {}", cli.input.display()))?;
    let provider = SnapshotProvider::from_json(&json)
        .with_context(|| format!("Failed to parse snapshot: {}", cli.input.display()))?;

    let app_name = match provider.find_voice_app_by_phone_number(&cli.phone_number) {
        Some(config) => config.app().name.clone(),
        None => {
            let known = provider
                .list_voice_apps()
                .into_iter()
                .map(|app| app.name)
                .collect::<Vec<_>>()
                .join(", ");
            bail!(
                "No voice app found for {}; known voice apps: {known}",
                cli.phone_number
            );
        }
    };

    let options = RenderOptions {
        doc_type: cli.doc_type.into(),
        show_nested_queues: cli.show_nested_queues,
        show_nested_phone_numbers: cli.show_nested_phone_numbers,
        nested_depth: cli.nested_depth,
    };

    let generator = CallFlowGenerator::new(options);
    let document = generator
        .generate(
            &provider,
            &VoiceAppSelector::PhoneNumber(cli.phone_number.clone()),
        )
        .with_context(|| format!("Failed to render call flow for {}", cli.phone_number))?;

    let path = cli.output.unwrap_or_else(|| {
        PathBuf::from(format!(
            "{}.{}",
            app_name.to_snake_case(),
            document.extension
        ))
    });
    fs::write(&path, &document.text)
        .with_context(|| format!("Failed to write file: {}", path.display()))?;

    println!("{}", path.display());
    Ok(())
}
