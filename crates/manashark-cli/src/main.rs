use std::fs;
use std::io::{self, IsTerminal, Write};
use std::net::IpAddr;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use glob::glob;
use manashark_core::{
    DecodeError, Decoded, OPCODE_LEN, Origin, Renderer, Settings, SessionFilter, Style,
    format_bytes, records,
};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (",
    env!("MANASHARK_BUILD_COMMIT"),
    " ",
    env!("MANASHARK_BUILD_DATE"),
    ")"
);

#[derive(Parser, Debug)]
#[command(name = "manashark")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Decoder for ManaPlus client/server game traffic.",
    long_about = None,
    after_help = "Examples:\n  manashark pcap replay session.pcapng --host 52.174.196.146 --port 6901\n  manashark decode host 80007a8cf1345e\n  manashark opcodes --origin node"
)]
struct Cli {
    /// Log decoder internals to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Operations on PCAP/PCAPNG inputs.
    Pcap {
        #[command(subcommand)]
        command: PcapCommands,
    },
    /// Decode a single hex payload sent by `host` or `node`.
    Decode {
        /// Side that sent the payload (host or node)
        origin: Origin,

        /// Payload bytes as hex, e.g. 7d007d00
        payload: String,

        /// Disable ANSI colors
        #[arg(long)]
        no_color: bool,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },
    /// List the opcode tables.
    Opcodes {
        /// Only list one side's table
        #[arg(long)]
        origin: Option<Origin>,
    },
}

#[derive(Subcommand, Debug)]
enum PcapCommands {
    /// Decode every game segment of a capture file.
    #[command(
        after_help = "Examples:\n  manashark pcap replay session.pcapng --host 52.174.196.146\n  manashark pcap replay 'captures/*.pcap' --config manashark.toml --summary summary.json"
    )]
    Replay(ReplayArgs),
}

#[derive(Args, Debug)]
struct ReplayArgs {
    /// Path to a .pcap or .pcapng file (a glob matching one file is accepted)
    input: PathBuf,

    /// Settings file (TOML)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Server address; overrides the settings file
    #[arg(long)]
    host: Option<IpAddr>,

    /// Server port; overrides the settings file
    #[arg(long)]
    port: Option<u16>,

    /// Disable ANSI colors
    #[arg(long)]
    no_color: bool,

    /// Only print diagnostics for payloads that could not be fully decoded
    #[arg(long)]
    quiet: bool,

    /// Print events as JSON lines
    #[arg(long)]
    json: bool,

    /// Write a JSON summary of the replay to this path
    #[arg(long)]
    summary: Option<PathBuf>,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let result = match cli.command {
        Commands::Pcap { command } => match command {
            PcapCommands::Replay(args) => cmd_pcap_replay(args),
        },
        Commands::Decode {
            origin,
            payload,
            no_color,
            json,
        } => cmd_decode(origin, &payload, no_color, json),
        Commands::Opcodes { origin } => cmd_opcodes(origin),
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(io::stderr))
        .with(filter)
        .init();
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

/// How decoded segments are written to stdout.
#[derive(Debug, Clone, Copy)]
struct Output {
    renderer: Renderer,
    json: bool,
    quiet: bool,
}

impl Output {
    fn new(no_color: bool, json: bool, quiet: bool) -> Self {
        let style = if no_color || json || !io::stdout().is_terminal() {
            Style::Plain
        } else {
            Style::Ansi
        };
        Self {
            renderer: Renderer::new(style),
            json,
            quiet,
        }
    }

    fn emit(
        &self,
        out: &mut impl Write,
        origin: Origin,
        payload: &[u8],
        decoded: &Decoded,
    ) -> Result<()> {
        if !self.quiet {
            for event in &decoded.events {
                if self.json {
                    writeln!(out, "{}", serde_json::to_string(event)?)?;
                } else {
                    writeln!(out, "{}", self.renderer.render(event))?;
                }
            }
        }
        if let Some(err) = decoded.outcome.error() {
            if self.json {
                let stop = StopRecord::new(origin, payload, err);
                writeln!(out, "{}", serde_json::to_string(&stop)?)?;
            } else {
                writeln!(out, "{}", self.renderer.render_stop(origin, payload, err))?;
            }
        }
        Ok(())
    }
}

/// JSON form of a decode pass that stopped early.
#[derive(Debug, Serialize)]
struct StopRecord {
    origin: Origin,
    stop: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    opcode: Option<i16>,
    message: String,
    payload: String,
}

impl StopRecord {
    fn new(origin: Origin, payload: &[u8], err: &DecodeError) -> Self {
        let stop = match err {
            DecodeError::Underflow { .. } => "underflow",
            DecodeError::UnknownOpcode { .. } => "unknown_opcode",
            DecodeError::TruncatedRecord { .. } => "truncated_record",
        };
        Self {
            origin,
            stop,
            opcode: err.opcode(),
            message: err.to_string(),
            payload: format_bytes(payload),
        }
    }
}

fn cmd_pcap_replay(args: ReplayArgs) -> Result<ExitCode, CliError> {
    let resolved_input = resolve_input_path(&args.input)?;
    validate_input_file(&resolved_input)?;

    let settings = load_settings(args.config.as_deref())?.with_overrides(args.host, args.port);
    let host = settings.server.host.ok_or_else(|| {
        CliError::new(
            "no server host configured",
            Some("pass --host or set [server] host in the settings file".to_string()),
        )
    })?;
    let filter = SessionFilter::new(host, settings.server.port);
    debug!(?filter, input = %resolved_input.display(), "starting replay");

    if !args.quiet && !args.json {
        let port = filter
            .port
            .map_or_else(|| "any".to_string(), |p| p.to_string());
        let interface = settings.network.interface.as_deref().unwrap_or("-");
        eprintln!(
            "replaying {} (server {} port {}, interface {})",
            resolved_input.display(),
            host,
            port,
            interface
        );
    }

    let output = Output::new(args.no_color, args.json, args.quiet);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    let mut write_error = None;
    let summary = manashark_core::replay_pcap_file(&resolved_input, &filter, |segment| {
        if write_error.is_some() {
            return;
        }
        if let Err(err) = output.emit(&mut out, segment.origin, segment.payload, &segment.decoded)
        {
            write_error = Some(err);
        }
    })
    .context("PCAP/PCAPNG replay failed")?;
    if let Some(err) = write_error {
        return Err(err.context("failed to write output").into());
    }
    out.flush().context("failed to write output")?;

    if let Some(path) = args.summary.as_ref() {
        write_summary(path, &summary)?;
        if !args.quiet {
            eprintln!("OK: summary written -> {}", path.display());
        }
    }
    if !args.quiet && !args.json {
        eprintln!(
            "{} packets, {} segments decoded, {} events",
            summary.packets_seen, summary.segments_decoded, summary.events_total
        );
    }
    Ok(ExitCode::SUCCESS)
}

fn load_settings(path: Option<&Path>) -> Result<Settings, CliError> {
    let Some(path) = path else {
        return Ok(Settings::default());
    };
    Settings::load(path).map_err(|err| {
        CliError::new(
            format!("cannot load settings '{}': {}", path.display(), err),
            Some("expected a TOML file with [network] and [server] tables".to_string()),
        )
    })
}

fn write_summary(path: &Path, summary: &manashark_core::ReplaySummary) -> Result<(), CliError> {
    let json = serde_json::to_string_pretty(summary).context("JSON serialization failed")?;
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent).with_context(|| {
                format!("Failed to create output directory: {}", parent.display())
            })?;
        }
    }
    fs::write(path, json)
        .with_context(|| format!("Failed to write summary: {}", path.display()))?;
    Ok(())
}

fn cmd_decode(origin: Origin, hex: &str, no_color: bool, json: bool) -> Result<ExitCode, CliError> {
    let payload = parse_hex(hex)?;
    let decoded = manashark_core::decode(origin, &payload);

    let output = Output::new(no_color, json, false);
    let mut out = io::stdout().lock();
    output
        .emit(&mut out, origin, &payload, &decoded)
        .context("failed to write output")?;

    if decoded.outcome.is_complete() {
        Ok(ExitCode::SUCCESS)
    } else {
        Ok(ExitCode::from(1))
    }
}

fn cmd_opcodes(origin: Option<Origin>) -> Result<ExitCode, CliError> {
    let origins = match origin {
        Some(origin) => vec![origin],
        None => Origin::ALL.to_vec(),
    };
    let mut out = io::stdout().lock();
    let mut write = || -> Result<()> {
        writeln!(out, "{:<6} {:<8} {:>4}  TITLE", "ORIGIN", "OPCODE", "LEN")?;
        for origin in &origins {
            for (opcode, spec) in records(*origin) {
                writeln!(
                    out,
                    "{:<6} 0x{:04x}   {:>4}  {}",
                    origin.as_str(),
                    opcode,
                    OPCODE_LEN + spec.width(),
                    spec.title
                )?;
            }
        }
        Ok(())
    };
    write().context("failed to write output")?;
    Ok(ExitCode::SUCCESS)
}

fn parse_hex(input: &str) -> Result<Vec<u8>, CliError> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: Vec<u8> = trimmed
        .bytes()
        .filter(|b| !b.is_ascii_whitespace() && *b != b':')
        .collect();

    if let Some(bad) = trimmed
        .chars()
        .find(|c| !c.is_ascii_hexdigit() && !c.is_ascii_whitespace() && *c != ':')
    {
        return Err(CliError::new(
            format!("invalid hex digit '{bad}' in payload"),
            Some("pass bytes as hex, e.g. 7d007d00".to_string()),
        ));
    }
    if digits.len() % 2 != 0 {
        return Err(CliError::new(
            format!("odd number of hex digits ({})", digits.len()),
            Some("every byte needs two hex digits".to_string()),
        ));
    }

    digits
        .chunks_exact(2)
        .map(|pair| {
            let text = String::from_utf8_lossy(pair);
            u8::from_str_radix(&text, 16).map_err(|err| {
                CliError::new(
                    format!("invalid hex byte '{text}' in payload: {err}"),
                    Some("pass bytes as hex, e.g. 7d007d00".to_string()),
                )
            })
        })
        .collect()
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("input file not found: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("use a .pcap or .pcapng file".to_string()),
        ));
    }
    let ext = input
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();
    if ext != "pcap" && ext != "pcapng" {
        return Err(CliError::new(
            format!("unsupported input format '{}'", input.display()),
            Some("expected a .pcap or .pcapng file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern; expected .pcap or .pcapng".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut listed = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            if count > 3 {
                listed.push_str(", ...");
            }
            Err(CliError::new(
                format!(
                    "multiple files match pattern '{}' ({} matches); matches: {}",
                    pattern, count, listed
                ),
                Some("pass a single capture file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
