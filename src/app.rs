use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, ValueEnum};
use tracing::Level;

use crate::config::APP_NAME;
use crate::parameters::Parameters;
use crate::session::Session;
use crate::stats::Summary;
use crate::sweep;
use crate::ui::display::{render_report, render_sweep};
use crate::ui::progress::Bar;

const PARAMETER_HELP: &str = "\
Pass data in via standard input (or --input). One line of input represents one
WebSocket message. Stats about the speed, memory usage, and compression ratio
are printed at the end.

Optional parameters (key=val, in any combination, in any order):
  server: [true,false]; Default true;
    Simulate a server (vs client). Affects frame overhead stats.

  sending: [true,false]; Default true;
    Simulate sending (vs receiving). Affects memory usage stats.

  context_takeover: [true,false]; Default true;
    Reuse compression context between messages. A value of false is
    equivalent to negotiating the permessage-deflate setting of
    *_no_context_takeover. If this value is true a separate compression
    context must be maintained for each connection.

  speed_level: [0...9]; Default 6;
    A tuning parameter that trades compression quality vs CPU usage.
    A value of 0 indicates no compression at all. This value may be
    unilaterally set by a WebSocket endpoint without negotiation.

  window_bits: [8-15]; Default 15;
    Base 2 logarithm of the size to use for the LZ77 sliding window.
    Higher values use more memory but provide better compression. This
    value must be negotiated. A stream compressed with n bits can be
    decompressed only by an endpoint that uses at least that many.

  memory_level: [1-9]; Default 8;
    A tuning parameter that trades compression quality vs memory usage.
    A value of 1 indicates lowest memory usage but worst compression. A
    value of 9 indicates most memory usage but best compression. This
    parameter may be set unilaterally without negotiation.";

/// Output format of the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable report (table for a sweep)
    #[default]
    Text,
    /// Pretty-printed JSON
    Json,
}

#[derive(Parser)]
#[command(name = APP_NAME, version, about = "Simulate a WebSocket permessage-deflate connection over sample messages.", after_help = PARAMETER_HELP)]
pub struct App {
    /// Negotiation parameters as key=value pairs.
    #[arg(value_name = "KEY=VALUE")]
    params: Vec<String>,

    /// Read messages from a file instead of standard input.
    #[arg(short, long)]
    input: Option<PathBuf>,

    /// Output format.
    #[arg(short, long, value_enum, default_value_t)]
    format: OutputFormat,

    /// Run every window_bits/memory_level combination, with and without context takeover.
    #[arg(long)]
    sweep: bool,

    /// Log every processed message.
    #[arg(short, long)]
    verbose: bool,
}

impl App {
    pub fn init() -> Result<Self> {
        let app = Self::parse();
        let level = if app.verbose { Level::DEBUG } else { Level::INFO };
        let subscriber = tracing_subscriber::fmt().with_max_level(level).with_writer(io::stderr).with_file(true).with_line_number(true).finish();
        tracing::subscriber::set_global_default(subscriber)?;
        Ok(app)
    }

    pub fn execute(self) -> Result<()> {
        let params = Parameters::from_tokens(&self.params).context("invalid parameters")?;
        let reader = self.open_input()?;

        if self.sweep { Self::run_sweep(&params, reader, self.format) } else { Self::run_single(params, reader, self.format) }
    }

    fn open_input(&self) -> Result<Box<dyn BufRead>> {
        match &self.input {
            Some(path) => {
                let file = File::open(path).with_context(|| format!("failed to open input: {}", path.display()))?;
                Ok(Box::new(BufReader::new(file)))
            }
            None => Ok(Box::new(io::stdin().lock())),
        }
    }

    fn run_single(params: Parameters, reader: Box<dyn BufRead>, format: OutputFormat) -> Result<()> {
        let summary = simulate(params, reader)?;

        match format {
            OutputFormat::Text => println!("{}", render_report(&summary)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summary)?),
        }

        Ok(())
    }

    fn run_sweep(params: &Parameters, reader: Box<dyn BufRead>, format: OutputFormat) -> Result<()> {
        let messages = sweep::read_messages(reader).context("failed to read input")?;
        let total = sweep::grid(params)?.len() as u64;

        let bar = Bar::new(total, "Sweeping")?;
        let summaries = sweep::run(params, &messages, |summary| {
            bar.set_message(&format!("window_bits={} memory_level={}", summary.parameters.window_bits(), summary.parameters.memory_level()));
            bar.add(1);
        })?;
        bar.finish();

        match format {
            OutputFormat::Text => println!("{}", render_sweep(&summaries)),
            OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&summaries)?),
        }

        Ok(())
    }
}

/// Runs one session over every line of `reader` and summarizes it.
///
/// # Errors
/// Fails if the compression context cannot be created, the input cannot be read, or
/// any message fails to compress. No partial summary is produced.
pub fn simulate<R: BufRead>(params: Parameters, reader: R) -> Result<Summary> {
    let mut session = Session::new(params).context("failed to set up compression")?;
    session.process_lines(reader).context("simulation aborted")?;

    let records = session.finish();
    Ok(Summary::from_records(&params, &records))
}

#[cfg(test)]
mod tests {
    use std::io::{Cursor, Write};

    use super::*;
    use crate::error::SessionError;

    #[test]
    fn test_simulate_default_scenario() {
        let summary = simulate(Parameters::default(), Cursor::new("hello world\n\naaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa\n")).unwrap();

        assert_eq!(summary.messages, 3);
        assert_eq!(summary.total_payload, 43);
        assert!(summary.total_compressed_size < 43);
        assert_eq!(summary.memory.local, 262_144);
    }

    #[test]
    fn test_simulate_rejected_window() {
        let params = Parameters::from_tokens(["window_bits=8"]).unwrap();
        let error = simulate(params, Cursor::new("hello world\n")).unwrap_err();

        assert!(error.to_string().contains("failed to set up compression"));
        assert!(matches!(error.downcast_ref::<SessionError>(), Some(SessionError::Init { .. })));
    }

    #[test]
    fn test_parse_arguments() {
        let app = App::try_parse_from(["pmce-stats", "server=false", "window_bits=10", "--format", "json", "--sweep", "-v"]).unwrap();

        assert_eq!(app.params, vec!["server=false", "window_bits=10"]);
        assert_eq!(app.format, OutputFormat::Json);
        assert!(app.sweep);
        assert!(app.verbose);
        assert!(app.input.is_none());
    }

    #[test]
    fn test_invalid_parameters_abort_before_input() {
        let app = App::try_parse_from(["pmce-stats", "speed_level=10", "--input", "/nonexistent/messages.txt"]).unwrap();
        let error = app.execute().unwrap_err();

        assert!(format!("{error:#}").contains("speed level 10 out of range"));
    }

    #[test]
    fn test_execute_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "{{\"event\":\"tick\",\"value\":1}}").unwrap();
        writeln!(file, "{{\"event\":\"tick\",\"value\":2}}").unwrap();

        let path = file.path().to_str().unwrap().to_owned();
        let app = App::try_parse_from(["pmce-stats", "--input", path.as_str()]).unwrap();
        assert!(app.execute().is_ok());
    }

    #[test]
    fn test_missing_input_file() {
        let app = App::try_parse_from(["pmce-stats", "--input", "/nonexistent/messages.txt"]).unwrap();
        let error = app.execute().unwrap_err();

        assert!(error.to_string().contains("failed to open input"));
    }
}
