//! CLI binary for clausewise.
//!
//! A thin shim over the library crate: maps flags to `AnalyzerConfig`,
//! renders progress, prints results.

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use clausewise::pipeline::input::load_document;
use clausewise::samples::SampleKind;
use clausewise::server::{serve, AppState};
use clausewise::{
    AnalysisClient, AnalyzerConfig, ClausewiseError, MemoryStore, ProcessingObserver,
    ProcessingOptions, ProcessingProgress, ProcessingStage, Processor, ProgressCallback,
    TextExtractor,
};
use indicatif::{ProgressBar, ProgressStyle};
use std::io;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers ──────────────────────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn yellow(s: &str) -> String {
    format!("\x1b[33m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}

// ── Progress rendering ───────────────────────────────────────────────────────

const TICKS: &[&str] = &["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"];

/// Percentage bar shared by extraction and analysis.
struct CliProgress {
    bar: ProgressBar,
}

impl CliProgress {
    fn new() -> Arc<Self> {
        let bar = ProgressBar::new(100);
        let style = ProgressStyle::with_template(
            "{spinner:.cyan} {prefix:.bold}  [{bar:42.green/238}] {pos:>3}%  {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏  ")
        .tick_strings(TICKS);
        bar.set_style(style);
        bar.set_prefix("Starting");
        bar.enable_steady_tick(Duration::from_millis(80));
        Arc::new(Self { bar })
    }

    fn show(&self, prefix: &'static str, progress: f32, message: &str) {
        self.bar.set_prefix(prefix);
        self.bar.set_position(progress.round().clamp(0.0, 100.0) as u64);
        self.bar.set_message(message.to_string());
    }

    fn finish(&self) {
        self.bar.finish_and_clear();
    }
}

impl clausewise::ExtractionProgressCallback for CliProgress {
    fn on_progress(&self, progress: &ProcessingProgress) {
        self.show("Extracting", progress.progress, &progress.message);
    }
}

impl ProcessingObserver for CliProgress {
    fn on_stage(&self, stage: ProcessingStage) {
        if stage == ProcessingStage::Analyze {
            self.bar.set_position(0);
        }
    }

    fn on_progress(&self, stage: ProcessingStage, progress: f32, message: &str) {
        let prefix = match stage {
            ProcessingStage::Analyze => "Analyzing",
            _ => "Extracting",
        };
        self.show(prefix, progress, message);
    }

    fn on_error(&self, error: &ClausewiseError) {
        self.bar.abandon_with_message(error.to_string());
    }
}

// ── Command line ─────────────────────────────────────────────────────────────

const AFTER_HELP: &str = r#"EXAMPLES:
  # Analyze a PDF and print the Analysis JSON
  clausewise analyze lease.pdf

  # Analyze pasted text in Hindi
  clausewise analyze --text "$(cat nda.txt)" --language hi

  # Try the built-in sample lease
  clausewise analyze --sample lease

  # Print the extracted text of a Word document
  clausewise extract contract.docx

  # Run the HTTP API on port 8080
  clausewise serve --port 8080

ENVIRONMENT VARIABLES:
  GEMINI_API_KEY          Google Gemini API key (default provider)
  OPENAI_API_KEY          OpenAI API key
  ANTHROPIC_API_KEY       Anthropic API key
  EDGEQUAKE_LLM_PROVIDER  Override provider (gemini, openai, anthropic, ollama)
  EDGEQUAKE_MODEL         Override model ID
  PDFIUM_LIB_PATH         Path to libpdfium (file or directory)
  PORT                    Server port for `serve` (default 3001)

Without any API key every analysis is the deterministic fallback
(confidence 0.75).
"#;

/// Plain-language analysis of legal documents.
#[derive(Parser, Debug)]
#[command(
    name = "clausewise",
    version,
    about = "Plain-language risk, obligation and action analysis for legal documents",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    #[command(flatten)]
    global: GlobalArgs,
}

#[derive(Args, Debug)]
struct GlobalArgs {
    /// LLM model ID (default: gemini-1.5-flash).
    #[arg(long, global = true, env = "CLAUSEWISE_MODEL")]
    model: Option<String>,

    /// LLM provider: gemini, openai, anthropic, ollama, azure.
    #[arg(long, global = true, env = "CLAUSEWISE_PROVIDER")]
    provider: Option<String>,

    /// LLM temperature (0.0–2.0).
    #[arg(long, global = true, env = "CLAUSEWISE_TEMPERATURE", default_value_t = 0.2)]
    temperature: f32,

    /// Max LLM output tokens.
    #[arg(long, global = true, env = "CLAUSEWISE_MAX_TOKENS", default_value_t = 4096)]
    max_tokens: usize,

    /// Model call timeout in seconds; on expiry the fallback is used.
    #[arg(long, global = true, env = "CLAUSEWISE_API_TIMEOUT", default_value_t = 60)]
    api_timeout: u64,

    /// Extraction timeout in seconds.
    #[arg(long, global = true, env = "CLAUSEWISE_EXTRACTION_TIMEOUT", default_value_t = 120)]
    extraction_timeout: u64,

    /// Path to libpdfium (file or directory).
    #[arg(long, global = true, env = "PDFIUM_LIB_PATH")]
    pdfium_lib: Option<PathBuf>,

    /// Disable the progress bar.
    #[arg(long, global = true, env = "CLAUSEWISE_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "CLAUSEWISE_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "CLAUSEWISE_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API.
    Serve {
        /// Port to listen on.
        #[arg(long, env = "PORT", default_value_t = 3001)]
        port: u16,

        /// Address to bind.
        #[arg(long, env = "CLAUSEWISE_HOST", default_value = "0.0.0.0")]
        host: std::net::IpAddr,
    },

    /// Print the plain text of a PDF or Word document.
    Extract {
        /// Local file path or HTTP/HTTPS URL.
        input: String,

        /// Download timeout in seconds.
        #[arg(long, env = "CLAUSEWISE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
        download_timeout: u64,
    },

    /// Analyze a document, pasted text or a built-in sample.
    Analyze {
        /// Local file path or HTTP/HTTPS URL.
        #[arg(conflicts_with_all = ["text", "sample"])]
        input: Option<String>,

        /// Analyze this text instead of a file.
        #[arg(long, conflicts_with = "sample")]
        text: Option<String>,

        /// Analyze a built-in sample: lease, nda or contract.
        #[arg(long)]
        sample: Option<SampleKind>,

        /// Output language (ISO code: en, hi, kn, gu, es, fr, de, zh, ja, ar).
        #[arg(short, long, env = "CLAUSEWISE_LANGUAGE", default_value = "en")]
        language: String,

        /// Document type hint used by the fallback analyzer.
        #[arg(long)]
        document_type: Option<String>,

        /// Print compact JSON instead of pretty-printed.
        #[arg(long)]
        compact: bool,

        /// Download timeout in seconds.
        #[arg(long, env = "CLAUSEWISE_DOWNLOAD_TIMEOUT", default_value_t = 120)]
        download_timeout: u64,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    let g = &cli.global;

    // ── Logging setup ────────────────────────────────────────────────────
    // The progress bar carries the feedback for one-shot commands, so INFO
    // logs are only shown for `serve` or when the bar is disabled.
    let is_serve = matches!(cli.command, Command::Serve { .. });
    let show_progress = !g.quiet && !g.no_progress && !is_serve;
    let filter = if g.verbose {
        "debug"
    } else if g.quiet || show_progress {
        "error"
    } else {
        "info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let config = build_config(g)?;

    match cli.command {
        Command::Serve { port, host } => {
            let processor = build_processor(config);
            let state = Arc::new(AppState::new(processor, Arc::new(MemoryStore::new())));
            serve(SocketAddr::new(host, port), state)
                .await
                .context("Server failed")?;
        }

        Command::Extract {
            ref input,
            download_timeout,
        } => {
            let doc = load_document(input, download_timeout)
                .await
                .context("Failed to load input")?;
            let progress = show_progress.then(CliProgress::new);
            let callback = progress.clone().map(|p| p as ProgressCallback);

            let extractor = TextExtractor::new(config);
            let result = extractor.extract(doc, callback).await;
            if let Some(p) = &progress {
                p.finish();
            }
            let extracted = result.context("Extraction failed")?;

            println!("{}", extracted.text);
            if !g.quiet {
                let pages = extracted
                    .page_count
                    .map(|n| format!(", {n} pages"))
                    .unwrap_or_default();
                eprintln!(
                    "{} {} chars{}",
                    green("✔"),
                    bold(&extracted.text.chars().count().to_string()),
                    pages
                );
                if extracted.ocr_required() {
                    eprintln!("{} document is image-based; OCR was not performed", yellow("⚠"));
                }
            }
        }

        Command::Analyze {
            input,
            text,
            sample,
            language,
            document_type,
            compact,
            download_timeout,
        } => {
            let processor = build_processor(config);
            let progress = show_progress.then(CliProgress::new);
            let observer = progress
                .clone()
                .map(|p| p as Arc<dyn ProcessingObserver>);
            let mut options = ProcessingOptions {
                document_type,
                language: Some(language),
            };

            let result = match (input, text, sample) {
                (Some(input), None, None) => {
                    let doc = load_document(&input, download_timeout)
                        .await
                        .context("Failed to load input")?;
                    processor.process_document(doc, &options, observer).await
                }
                (None, Some(text), None) => processor.process_text(&text, &options, observer).await,
                (None, None, Some(kind)) => {
                    options.document_type.get_or_insert_with(|| kind.document_type().to_string());
                    processor.process_text(kind.text(), &options, observer).await
                }
                _ => bail!("Provide exactly one of <INPUT>, --text or --sample"),
            };
            if let Some(p) = &progress {
                p.finish();
            }
            let outcome = result.context("Analysis failed")?;

            let json = if compact {
                serde_json::to_string(&outcome.analysis)
            } else {
                serde_json::to_string_pretty(&outcome.analysis)
            }
            .context("Failed to serialise analysis")?;
            println!("{json}");

            if !g.quiet && outcome.analysis.is_fallback() {
                eprintln!(
                    "{} model analysis unavailable; showing the generic fallback analysis",
                    yellow("⚠")
                );
            }
        }
    }

    Ok(())
}

/// Map CLI args to `AnalyzerConfig`.
fn build_config(g: &GlobalArgs) -> Result<AnalyzerConfig> {
    let mut builder = AnalyzerConfig::builder()
        .temperature(g.temperature)
        .max_tokens(g.max_tokens)
        .api_timeout_secs(g.api_timeout)
        .extraction_timeout_secs(g.extraction_timeout);
    if let Some(ref model) = g.model {
        builder = builder.model(model);
    }
    if let Some(ref provider) = g.provider {
        builder = builder.provider_name(provider);
    }
    if let Some(ref path) = g.pdfium_lib {
        builder = builder.pdfium_library_path(path);
    }
    builder.build().context("Invalid configuration")
}

fn build_processor(config: AnalyzerConfig) -> Processor {
    let client = AnalysisClient::from_config_or_fallback(&config);
    let extractor = TextExtractor::new(config.clone());
    Processor::new(config, extractor, client)
}
