//! CLI binary for simpleinsights.
//!
//! A thin shim over the library crate that maps CLI flags to
//! `PipelineConfig`, drives one `ToolSession` and writes its results.

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use simpleinsights::export::server;
use simpleinsights::pipeline::input::{load_file, load_files, parent_dir};
use simpleinsights::{
    AnalysisResult, ExportMode, FileValidator, HttpBackend, InBandHeuristic, Notice, NoticeLevel,
    PipelineConfig, PipelineObserver, PipelineState, ResultKind, ResultTab, StateStore, ToolKind,
    ToolSession,
};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

// ── ANSI colour helpers (no extra deps) ──────────────────────────────────────

fn green(s: &str) -> String {
    format!("\x1b[32m{s}\x1b[0m")
}
fn red(s: &str) -> String {
    format!("\x1b[31m{s}\x1b[0m")
}
fn dim(s: &str) -> String {
    format!("\x1b[2m{s}\x1b[0m")
}
fn bold(s: &str) -> String {
    format!("\x1b[1m{s}\x1b[0m")
}
fn cyan(s: &str) -> String {
    format!("\x1b[36m{s}\x1b[0m")
}

// ── CLI observer using indicatif ─────────────────────────────────────────────

/// Terminal observer: a percentage bar fed by the progress simulator and
/// one log line per notice.
struct CliObserver {
    bar: Option<ProgressBar>,
}

impl CliObserver {
    fn new(show_progress: bool) -> Arc<Self> {
        let bar = show_progress.then(|| {
            let bar = ProgressBar::new(100);
            let style = ProgressStyle::with_template(
                "{spinner:.cyan} {prefix:.bold}  \
                 [{bar:42.green/238}] {pos:>3}%  ⏱ {elapsed_precise}  {msg}",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▉▊▋▌▍▎▏  ")
            .tick_strings(&["⠋", "⠙", "⠹", "⠸", "⠼", "⠴", "⠦", "⠧", "⠇", "⠏", "⠿"]);
            bar.set_style(style);
            bar.set_prefix("Waiting");
            bar
        });
        Arc::new(Self { bar })
    }

    fn println(&self, line: String) {
        match self.bar {
            Some(ref bar) => bar.println(line),
            None => eprintln!("{line}"),
        }
    }

    fn finish(&self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
    }
}

impl PipelineObserver for CliObserver {
    fn on_state_change(&self, tool: ToolKind, state: PipelineState) {
        let Some(ref bar) = self.bar else { return };
        let prefix = match state {
            PipelineState::Idle => "Waiting",
            PipelineState::Uploading => "Uploading",
            PipelineState::Processing => "Analysing",
            PipelineState::Succeeded => "Done",
            PipelineState::Failed => "Failed",
        };
        bar.set_prefix(prefix);
        match state {
            PipelineState::Uploading | PipelineState::Processing => {
                bar.set_message(tool.title());
                bar.enable_steady_tick(Duration::from_millis(80));
            }
            _ => bar.disable_steady_tick(),
        }
    }

    fn on_progress(&self, _tool: ToolKind, percent: u8) {
        if let Some(ref bar) = self.bar {
            bar.set_position(u64::from(percent));
        }
    }

    fn on_notice(&self, _tool: ToolKind, notice: &Notice) {
        let mark = match notice.level {
            NoticeLevel::Success => green("✓"),
            NoticeLevel::Error => red("✗"),
            NoticeLevel::Warning => cyan("⚠"),
            NoticeLevel::Info => cyan("◆"),
        };
        self.println(format!(
            "  {} {}  {}",
            mark,
            bold(&notice.title),
            dim(&notice.message)
        ));
    }

    fn on_export_state(&self, _tool: ToolKind, exporting: bool) {
        if let Some(ref bar) = self.bar {
            if exporting {
                bar.set_prefix("Exporting");
                bar.enable_steady_tick(Duration::from_millis(80));
            } else {
                bar.disable_steady_tick();
            }
        }
    }
}

const AFTER_HELP: &str = r#"EXAMPLES:
  # Plain-English summary of a contract, written next to the input
  insights analyze legal contract.pdf

  # Summary plus risk analysis for one party, exported locally to PDF
  insights analyze legal contract.pdf --party Tenant --pdf local -o out/

  # Risk analysis of the last uploaded contract (reference kept in --state-dir)
  insights risk --party Landlord

  # Translate a document from a URL
  insights analyze translation https://example.com/letter.pdf --document-type legal

  # Several radiographs at once
  insights analyze orthodontic ceph.jpg pano.png intraoral.jpg --pdf server

  # Canned results, no network
  insights demo legal --risk

  # Check files without uploading anything
  insights validate medical report.pdf scan.png

  # Turn a saved result into a PDF
  insights export legal out/legal-plain.html --mode local

TOOLS:
  legal            Contract summary (+ party risk analysis)
  medical          Medical report summary
  translation      Document translation
  medical-report   Medical report summary via edge function (needs a key)
  orthodontic      Radiograph analysis, up to 10 JPEG/PNG images

ENVIRONMENT VARIABLES:
  INSIGHTS_API_URL         Upload and analysis API base URL
  INSIGHTS_FUNCTIONS_URL   Edge-function host
  INSIGHTS_PDF_URL         PDF rendering backend
  INSIGHTS_FUNCTIONS_KEY   Bearer token for edge functions
  INSIGHTS_STATE_DIR       Where the file reference and session id are kept
  INSIGHTS_DEMO            Serve canned results instead of calling backends
"#;

/// Analyse legal, medical and orthodontic documents with SimpleInsights.ai.
#[derive(Parser, Debug)]
#[command(
    name = "insights",
    version,
    about = "Analyse legal, medical and orthodontic documents with SimpleInsights.ai",
    long_about = "Upload a contract, medical report, document or radiographs to the \
SimpleInsights.ai backends, save the returned analysis as HTML and optionally export it \
to PDF, either rendered by the server or locally.",
    arg_required_else_help = true,
    color = clap::ColorChoice::Auto,
    after_long_help = AFTER_HELP
)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Upload and analysis API base URL.
    #[arg(long, global = true, env = "INSIGHTS_API_URL")]
    api_url: Option<String>,

    /// Edge-function host.
    #[arg(long, global = true, env = "INSIGHTS_FUNCTIONS_URL")]
    functions_url: Option<String>,

    /// PDF rendering backend base URL.
    #[arg(long, global = true, env = "INSIGHTS_PDF_URL")]
    pdf_url: Option<String>,

    /// Bearer token for edge functions.
    #[arg(long, global = true, env = "INSIGHTS_FUNCTIONS_KEY", hide_env_values = true)]
    functions_key: Option<String>,

    /// Upload size limit in MiB.
    #[arg(long, global = true, env = "INSIGHTS_MAX_SIZE_MB", default_value_t = 10,
          value_parser = clap::value_parser!(u64).range(1..=100))]
    max_size_mb: u64,

    /// Directory holding persisted state (file reference, session id).
    #[arg(long, global = true, env = "INSIGHTS_STATE_DIR", default_value = ".insights")]
    state_dir: PathBuf,

    /// Serve canned results instead of calling the backends.
    #[arg(long, global = true, env = "INSIGHTS_DEMO")]
    demo: bool,

    /// Treat only empty analysis bodies as failures (no keyword screening).
    #[arg(long, global = true, env = "INSIGHTS_EMPTY_ONLY_ERRORS")]
    empty_only_errors: bool,

    /// HTTP request timeout in seconds.
    #[arg(long, global = true, env = "INSIGHTS_TIMEOUT", default_value_t = 120)]
    timeout: u64,

    /// Disable progress bar.
    #[arg(long, global = true, env = "INSIGHTS_NO_PROGRESS")]
    no_progress: bool,

    /// Enable DEBUG-level tracing logs.
    #[arg(short, long, global = true, env = "INSIGHTS_VERBOSE")]
    verbose: bool,

    /// Suppress all output except errors.
    #[arg(short, long, global = true, env = "INSIGHTS_QUIET")]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Upload files and save the analysis.
    Analyze(AnalyzeArgs),
    /// Party-scoped risk analysis of the last uploaded contract.
    Risk(RiskArgs),
    /// Run a tool against canned content.
    Demo(DemoArgs),
    /// Check files against a tool's rules without uploading them.
    Validate(ValidateArgs),
    /// Export a saved HTML result to PDF.
    Export(ExportArgs),
}

#[derive(Args, Debug)]
struct AnalyzeArgs {
    #[arg(value_enum)]
    tool: ToolArg,

    /// Local paths or HTTP/HTTPS URLs.
    #[arg(required = true)]
    inputs: Vec<String>,

    /// Output directory. Default: next to the first input.
    #[arg(short, long, env = "INSIGHTS_OUTPUT")]
    output: Option<PathBuf>,

    /// Translation document type.
    #[arg(long, default_value = "general")]
    document_type: String,

    /// Also run the risk analysis for this party (legal only).
    #[arg(long)]
    party: Option<String>,

    /// Export the result to PDF.
    #[arg(long, value_enum)]
    pdf: Option<ModeArg>,
}

#[derive(Args, Debug)]
struct RiskArgs {
    /// Contracting party to analyse for.
    #[arg(long)]
    party: String,

    #[arg(short, long, env = "INSIGHTS_OUTPUT", default_value = ".")]
    output: PathBuf,

    #[arg(long, value_enum)]
    pdf: Option<ModeArg>,
}

#[derive(Args, Debug)]
struct DemoArgs {
    #[arg(value_enum)]
    tool: ToolArg,

    /// Run the risk demo (legal only).
    #[arg(long)]
    risk: bool,

    #[arg(short, long, env = "INSIGHTS_OUTPUT", default_value = ".")]
    output: PathBuf,

    #[arg(long, value_enum)]
    pdf: Option<ModeArg>,
}

#[derive(Args, Debug)]
struct ValidateArgs {
    #[arg(value_enum)]
    tool: ToolArg,

    #[arg(required = true)]
    inputs: Vec<String>,
}

#[derive(Args, Debug)]
struct ExportArgs {
    #[arg(value_enum)]
    tool: ToolArg,

    /// HTML file written by `analyze`, `risk` or `demo`.
    input: String,

    #[arg(long, value_enum, default_value = "server")]
    mode: ModeArg,

    /// The file holds a risk analysis.
    #[arg(long)]
    risk: bool,

    /// Output directory. Default: next to the input.
    #[arg(short, long, env = "INSIGHTS_OUTPUT")]
    output: Option<PathBuf>,
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ToolArg {
    Legal,
    Medical,
    Translation,
    MedicalReport,
    Orthodontic,
}

impl From<ToolArg> for ToolKind {
    fn from(v: ToolArg) -> Self {
        match v {
            ToolArg::Legal => ToolKind::Legal,
            ToolArg::Medical => ToolKind::Medical,
            ToolArg::Translation => ToolKind::Translation,
            ToolArg::MedicalReport => ToolKind::MedicalReport,
            ToolArg::Orthodontic => ToolKind::Orthodontic,
        }
    }
}

#[derive(clap::ValueEnum, Clone, Copy, Debug)]
enum ModeArg {
    Server,
    Local,
}

impl From<ModeArg> for ExportMode {
    fn from(v: ModeArg) -> Self {
        match v {
            ModeArg::Server => ExportMode::Server,
            ModeArg::Local => ExportMode::Local,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // ── Logging setup ────────────────────────────────────────────────────
    // Suppress INFO-level library logs when the progress bar is active;
    // the bar and the notices carry everything the user needs.
    let show_progress =
        !cli.quiet && !cli.no_progress && !matches!(cli.command, Command::Validate(_));
    let filter = if cli.verbose {
        "debug"
    } else if cli.quiet || show_progress {
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

    let config = build_config(&cli)?;

    match cli.command {
        Command::Validate(ref args) => validate(args, &config, cli.quiet).await,
        Command::Analyze(ref args) => {
            let out_dir = args
                .output
                .clone()
                .unwrap_or_else(|| parent_dir(&args.inputs[0]));
            let files = load_files(&args.inputs, config.request_timeout_secs)
                .await
                .context("Failed to read input")?;

            let observer = CliObserver::new(show_progress);
            let mut session = open_session(args.tool.into(), config, &observer)?;
            session.set_document_type(args.document_type.clone());

            let outcome = async {
                session
                    .select_files(files)
                    .await
                    .context("Analysis failed")?;
                if let Some(ref party) = args.party {
                    session
                        .run_risk_analysis(party)
                        .await
                        .context("Risk analysis failed")?;
                }
                Ok::<_, anyhow::Error>(())
            }
            .await;
            observer.finish();
            outcome?;

            save(&mut session, &out_dir, args.pdf, cli.quiet).await
        }
        Command::Risk(ref args) => {
            let observer = CliObserver::new(show_progress);
            let mut session = open_session(ToolKind::Legal, config, &observer)?;
            let outcome = session.run_risk_analysis(&args.party).await;
            observer.finish();
            outcome.context("Risk analysis failed")?;

            save(&mut session, &args.output, args.pdf, cli.quiet).await
        }
        Command::Demo(ref args) => {
            let mut config = config;
            config.demo = true;
            let observer = CliObserver::new(show_progress);
            let tool: ToolKind = args.tool.into();
            let mut session = open_session(tool, config, &observer)?;

            let outcome = async {
                session
                    .run_demo(session.profile().result_kind)
                    .await
                    .context("Demo failed")?;
                if args.risk {
                    session
                        .run_demo(ResultKind::Risk)
                        .await
                        .context("Risk demo failed")?;
                }
                Ok::<_, anyhow::Error>(())
            }
            .await;
            observer.finish();
            outcome?;

            save(&mut session, &args.output, args.pdf, cli.quiet).await
        }
        Command::Export(ref args) => {
            let saved = tokio::fs::read_to_string(&args.input)
                .await
                .with_context(|| format!("Failed to read {:?}", args.input))?;
            // `save` writes whole documents; only the result inside is re-exported
            let html = server::document_body(&saved);
            let out_dir = args.output.clone().unwrap_or_else(|| parent_dir(&args.input));
            let tool: ToolKind = args.tool.into();

            let observer = CliObserver::new(show_progress);
            let mut session = open_session(tool, config, &observer)?;
            let kind = if args.risk {
                ResultKind::Risk
            } else {
                session.profile().result_kind
            };
            session.restore_result(AnalysisResult::new(kind, html))?;

            let outcome = session.export(args.mode.into(), &out_dir).await;
            observer.finish();
            let path = outcome.context("Export failed")?;
            if !cli.quiet {
                eprintln!("{}  PDF  →  {}", green("✔"), bold(&path.display().to_string()));
            }
            Ok(())
        }
    }
}

/// Map CLI args to `PipelineConfig`.
fn build_config(cli: &Cli) -> Result<PipelineConfig> {
    let mut builder = PipelineConfig::builder()
        .max_file_bytes(cli.max_size_mb * 1024 * 1024)
        .request_timeout_secs(cli.timeout)
        .demo(cli.demo)
        .state_dir(&cli.state_dir);

    if let Some(ref url) = cli.api_url {
        builder = builder.api_url(url);
    }
    if let Some(ref url) = cli.functions_url {
        builder = builder.functions_url(url);
    }
    if let Some(ref url) = cli.pdf_url {
        builder = builder.pdf_renderer_url(url);
    }
    if let Some(ref key) = cli.functions_key {
        builder = builder.functions_key(key);
    }
    if cli.empty_only_errors {
        builder = builder.heuristic(InBandHeuristic::EmptyOnly);
    }

    builder.build().context("Invalid configuration")
}

fn open_session(
    tool: ToolKind,
    config: PipelineConfig,
    observer: &Arc<CliObserver>,
) -> Result<ToolSession> {
    let store = match config.state_dir {
        Some(ref dir) => StateStore::open(dir)
            .with_context(|| format!("Failed to open state directory {:?}", dir))?,
        None => StateStore::in_memory(),
    };
    let backend = HttpBackend::new(&config).context("Failed to build HTTP client")?;
    Ok(ToolSession::with_store(
        tool,
        config,
        Arc::new(backend),
        Arc::clone(observer) as Arc<dyn PipelineObserver>,
        Arc::new(store),
    ))
}

/// Write every result of `session` as standalone HTML, then the optional PDF.
async fn save(
    session: &mut ToolSession,
    out_dir: &Path,
    pdf: Option<ModeArg>,
    quiet: bool,
) -> Result<()> {
    let tool = session.tool();
    tokio::fs::create_dir_all(out_dir)
        .await
        .with_context(|| format!("Failed to create {:?}", out_dir))?;

    for tab in session.results().tabs() {
        let Some(html) = session.results().rendered(tab) else {
            continue;
        };
        let suffix = match tab {
            ResultTab::PlainEnglish => "plain",
            ResultTab::RiskAnalysis => "risk",
        };
        let path = out_dir.join(format!("{}-{}.html", tool.slug(), suffix));
        let document = server::build_document(tool.title(), &html, session.gallery());
        simpleinsights::export::write_atomic(&path, document.as_bytes())
            .with_context(|| format!("Failed to write {:?}", path))?;

        if !quiet {
            eprintln!(
                "{}  {}  →  {}",
                green("✔"),
                tab.label(),
                bold(&path.display().to_string())
            );
        }
    }

    if let Some(mode) = pdf {
        let path = session
            .export(mode.into(), out_dir)
            .await
            .context("Export failed")?;
        if !quiet {
            eprintln!("{}  PDF  →  {}", green("✔"), bold(&path.display().to_string()));
        }
    }

    if !quiet {
        if let Some(reference) = session.file_reference() {
            eprintln!("   {} {}", dim("file reference"), dim(reference.as_str()));
        }
    }
    Ok(())
}

/// Run a tool's validator over `inputs` and report each verdict.
async fn validate(args: &ValidateArgs, config: &PipelineConfig, quiet: bool) -> Result<()> {
    let tool: ToolKind = args.tool.into();
    let validator = FileValidator::for_tool(tool, config.max_file_bytes);
    let mut rejected = 0usize;

    for input in &args.inputs {
        let file = load_file(input, config.request_timeout_secs)
            .await
            .with_context(|| format!("Failed to read {input}"))?;
        match validator.validate(&file) {
            Ok(()) => {
                if !quiet {
                    eprintln!(
                        "  {} {:<40} {}",
                        green("✓"),
                        file.name,
                        dim(&format!("{} bytes", file.size()))
                    );
                }
            }
            Err(e) => {
                rejected += 1;
                eprintln!("  {} {:<40} {}", red("✗"), file.name, red(&e.to_string()));
            }
        }
    }

    if rejected > 0 {
        anyhow::bail!("{rejected} of {} files rejected for {tool}", args.inputs.len());
    }
    Ok(())
}
