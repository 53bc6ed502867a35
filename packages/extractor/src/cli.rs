//! Command-line interface for the extractor.

use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand, ValueEnum};
use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::Value;

use crate::boundary::validate_html_payload;
use crate::canon::{
    place_definitions_from_json, profession_definitions_from_json, PlaceDefinition,
    ProfessionDefinition,
};
use crate::config::{DEFAULT_MAX_PAYLOAD_BYTES, DEFAULT_MAX_RESPONSE_SIZE};
use crate::error::Result;
use crate::extract::{extract_and_score, ExtractOptions, Extraction};
use crate::fields::field_values;
use crate::gedcom::generate_gedcom;
use crate::highlight::highlight_html;
use crate::http::{create_client, fetch_page};

/// Lignage extractor - Structured genealogical records from pasted HTML.
#[derive(Parser)]
#[command(name = "lignage-extractor")]
#[command(version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Extract one individual from an HTML page.
    Extract {
        #[command(flatten)]
        input: InputArgs,

        /// Output format
        #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,

        /// Print a readable field summary instead of the full record
        #[arg(long)]
        summary: bool,
    },

    /// Re-render the HTML with every extracted value marked.
    Highlight {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Export the extracted individual and relatives as GEDCOM 5.5.1.
    Gedcom {
        #[command(flatten)]
        input: InputArgs,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

/// Where the HTML comes from and how to read it.
#[derive(clap::Args)]
pub struct InputArgs {
    /// HTML file, or `-` for stdin
    #[arg(required_unless_present = "url")]
    pub file: Option<PathBuf>,

    /// Fetch the page from a URL instead of reading a file
    #[arg(long, conflicts_with = "file")]
    pub url: Option<String>,

    /// Source URL recorded on the individual (default: --url when given)
    #[arg(long)]
    pub source_url: Option<String>,

    /// JSON file with custom place definitions
    #[arg(long)]
    pub places: Option<PathBuf>,

    /// JSON file with custom profession definitions
    #[arg(long)]
    pub professions: Option<PathBuf>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Json,
    Yaml,
}

/// Run the CLI.
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Extract {
            input,
            format,
            summary,
        } => extract_command(&input, format, summary),
        Commands::Highlight { input, output } => {
            let (html, extraction) = load(&input)?;
            let marked = highlight_html(&html, extraction.record.provenance.spans());
            write_output(output.as_deref(), &marked)
        }
        Commands::Gedcom { input, output } => {
            let (_, extraction) = load(&input)?;
            write_output(output.as_deref(), &generate_gedcom(&extraction.record))
        }
    }
}

/// Execute the extract command.
fn extract_command(input: &InputArgs, format: OutputFormat, summary: bool) -> Result<()> {
    let (_, extraction) = load(input)?;

    if summary {
        print_summary(&extraction);
        return Ok(());
    }

    let rendered = match format {
        OutputFormat::Json => serde_json::to_string_pretty(&extraction)?,
        OutputFormat::Yaml => serde_yaml_ng::to_string(&extraction)?,
    };
    write_output(None, &rendered)
}

/// Read, validate and extract the input page.
fn load(input: &InputArgs) -> Result<(String, Extraction)> {
    let html = match &input.url {
        Some(url) => fetch_html(url)?,
        None => {
            let bytes = read_file(input.file.as_deref().unwrap_or(Path::new("-")))?;
            validate_html_payload(&bytes, None, DEFAULT_MAX_PAYLOAD_BYTES)?.to_string()
        }
    };

    let options = ExtractOptions {
        places: input.places.as_deref().map(load_places).transpose()?,
        professions: input.professions.as_deref().map(load_professions).transpose()?,
        source_url: input.source_url.clone().or_else(|| input.url.clone()),
        extracted_at: None,
    };

    let extraction = extract_and_score(&html, &options);
    tracing::info!(
        strategy = ?extraction.record.strategy,
        spans = extraction.record.provenance.len(),
        "Extraction finished"
    );
    Ok((html, extraction))
}

fn fetch_html(url: &str) -> Result<String> {
    let pb = ProgressBar::new_spinner();
    #[allow(clippy::expect_used)] // Static template string that is guaranteed to be valid
    pb.set_style(
        ProgressStyle::default_spinner()
            .template("{spinner:.green} {msg}")
            .expect("valid template"),
    );
    pb.set_message(format!("Fetching {url}..."));
    pb.enable_steady_tick(std::time::Duration::from_millis(100));

    let page = create_client().and_then(|client| fetch_page(&client, url, DEFAULT_MAX_RESPONSE_SIZE));
    pb.finish_and_clear();
    let page = page?;

    let html = validate_html_payload(&page.body, page.content_type.as_deref(), DEFAULT_MAX_PAYLOAD_BYTES)?;
    Ok(html.to_string())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    if path == Path::new("-") {
        let mut bytes = Vec::new();
        io::stdin().read_to_end(&mut bytes)?;
        return Ok(bytes);
    }
    Ok(fs::read(path)?)
}

fn load_places(path: &Path) -> Result<Vec<PlaceDefinition>> {
    let value: Value = serde_json::from_slice(&fs::read(path)?)?;
    Ok(place_definitions_from_json(&value))
}

fn load_professions(path: &Path) -> Result<Vec<ProfessionDefinition>> {
    let value: Value = serde_json::from_slice(&fs::read(path)?)?;
    Ok(profession_definitions_from_json(&value))
}

fn write_output(path: Option<&Path>, content: &str) -> Result<()> {
    match path {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!("{} {}", style("Saved to:").green().bold(), path.display());
        }
        None => {
            let mut stdout = io::stdout().lock();
            stdout.write_all(content.as_bytes())?;
            if !content.ends_with('\n') {
                stdout.write_all(b"\n")?;
            }
        }
    }
    Ok(())
}

fn print_summary(extraction: &Extraction) {
    let record = &extraction.record;
    let name = record.display_name().unwrap_or_else(|| "(unnamed)".to_string());
    println!("{}", style(name).bold());
    if let Some(strategy) = record.strategy {
        println!("  Strategy: {}", style(strategy).cyan());
    }
    println!("  Spans: {}", record.provenance.len());
    println!();

    for (descriptor, value) in field_values(record) {
        let Some(text) = display_value(&value) else {
            continue;
        };
        let confidence = extraction.confidence.get(descriptor.key).copied();
        let score = match confidence {
            Some(score) if score >= 0.8 => style(format!("{score:.2}")).green(),
            Some(score) if score >= 0.5 => style(format!("{score:.2}")).yellow(),
            Some(score) => style(format!("{score:.2}")).red(),
            None => style("  - ".to_string()).dim(),
        };
        println!("  {score}  {:<14} {text}", descriptor.label);
    }
}

/// One-line rendering of a field value, `None` when empty.
fn display_value(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        Value::Array(items) if items.is_empty() => None,
        Value::Array(items) => Some(
            items
                .iter()
                .filter_map(display_value)
                .collect::<Vec<_>>()
                .join("; "),
        ),
        Value::Object(map) => map
            .get("raw")
            .and_then(display_value)
            .or_else(|| map.get("place").and_then(display_value))
            .or_else(|| map.get("year").map(ToString::to_string)),
        other => Some(other.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parse_extract() {
        let cli = Cli::parse_from(["lignage-extractor", "extract", "page.html"]);

        let Commands::Extract {
            input,
            format,
            summary,
        } = cli.command
        else {
            panic!("expected extract command");
        };
        assert_eq!(input.file, Some(PathBuf::from("page.html")));
        assert!(input.url.is_none());
        assert_eq!(format, OutputFormat::Json);
        assert!(!summary);
    }

    #[test]
    fn test_cli_parse_extract_with_options() {
        let cli = Cli::parse_from([
            "lignage-extractor",
            "extract",
            "--url",
            "https://tree.example/p/1",
            "--format",
            "yaml",
            "--professions",
            "jobs.json",
            "--summary",
        ]);

        let Commands::Extract {
            input,
            format,
            summary,
        } = cli.command
        else {
            panic!("expected extract command");
        };
        assert!(input.file.is_none());
        assert_eq!(input.url.as_deref(), Some("https://tree.example/p/1"));
        assert_eq!(input.professions, Some(PathBuf::from("jobs.json")));
        assert_eq!(format, OutputFormat::Yaml);
        assert!(summary);
    }

    #[test]
    fn test_cli_requires_file_or_url() {
        assert!(Cli::try_parse_from(["lignage-extractor", "gedcom"]).is_err());
        assert!(Cli::try_parse_from([
            "lignage-extractor",
            "gedcom",
            "page.html",
            "--url",
            "https://tree.example/p/1"
        ])
        .is_err());
    }

    #[test]
    fn test_cli_parse_highlight_output() {
        let cli = Cli::parse_from(["lignage-extractor", "highlight", "-", "-o", "out.html"]);
        let Commands::Highlight { input, output } = cli.command else {
            panic!("expected highlight command");
        };
        assert_eq!(input.file, Some(PathBuf::from("-")));
        assert_eq!(output, Some(PathBuf::from("out.html")));
    }

    #[test]
    fn test_display_value() {
        assert_eq!(display_value(&Value::Null), None);
        assert_eq!(display_value(&serde_json::json!([])), None);
        assert_eq!(
            display_value(&serde_json::json!(["Pierre", "Paul"])).as_deref(),
            Some("Pierre; Paul")
        );
        assert_eq!(
            display_value(&serde_json::json!({"raw": "17 Mar 1901", "year": 1901})).as_deref(),
            Some("17 Mar 1901")
        );
        assert_eq!(display_value(&serde_json::json!({})), None);
    }
}
