use dotenvy::dotenv;
use regex::Regex;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::sync::Arc;
use tracing::{error, info, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{prelude::*, EnvFilter, Layer};
use wiki_lookup_bot::config::Settings;
use wiki_lookup_bot::runner::run_bot;

/// Token patterns scrubbed from every log line, applied in order
struct RedactionPatterns {
    rules: Vec<(Regex, &'static str)>,
}

impl RedactionPatterns {
    /// Compile the token patterns
    ///
    /// # Errors
    ///
    /// Returns an error if any regex pattern is invalid
    fn new() -> Result<Self, regex::Error> {
        let rules = vec![
            // Bot API URLs: https://api.telegram.org/bot<token>/method
            (
                Regex::new(r"(https?://[^/]+/bot)([0-9]+:[A-Za-z0-9_-]+)(/['\s]*)")?,
                "$1[TELEGRAM_TOKEN]$3",
            ),
            (
                Regex::new(r"([0-9]{8,10}:[A-Za-z0-9_-]{35})")?,
                "[TELEGRAM_TOKEN]",
            ),
            (
                Regex::new(r"(bot[0-9]{8,10}:)[A-Za-z0-9_-]+")?,
                "$1[TELEGRAM_TOKEN]",
            ),
        ];
        Ok(Self { rules })
    }

    fn redact(&self, input: &str) -> String {
        self.rules
            .iter()
            .fold(input.to_string(), |text, (pattern, replacement)| {
                pattern.replace_all(&text, *replacement).into_owned()
            })
    }
}

struct RedactingWriter<W: Write> {
    inner: W,
    patterns: Arc<RedactionPatterns>,
}

impl<W: Write> RedactingWriter<W> {
    const fn new(inner: W, patterns: Arc<RedactionPatterns>) -> Self {
        Self { inner, patterns }
    }
}

impl<W: Write> Write for RedactingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let s = String::from_utf8_lossy(buf);
        let redacted = self.patterns.redact(&s);
        self.inner.write_all(redacted.as_bytes())?;
        // The caller's buffer was consumed even if the redacted length differs.
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

struct RedactingMakeWriter<F> {
    make_inner: F,
    patterns: Arc<RedactionPatterns>,
}

impl<F> RedactingMakeWriter<F> {
    const fn new(make_inner: F, patterns: Arc<RedactionPatterns>) -> Self {
        Self {
            make_inner,
            patterns,
        }
    }
}

impl<'a, F, W> tracing_subscriber::fmt::MakeWriter<'a> for RedactingMakeWriter<F>
where
    F: Fn() -> W + 'static,
    W: Write,
{
    type Writer = RedactingWriter<W>;

    fn make_writer(&'a self) -> Self::Writer {
        RedactingWriter::new((self.make_inner)(), self.patterns.clone())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenv().ok();

    let patterns = Arc::new(RedactionPatterns::new().map_err(|e| {
        eprintln!("Failed to compile regex patterns: {e}");
        e
    })?);

    // Dropped on every return path so buffered file logs reach LOG_FILE
    let _log_guard = init_logging(patterns);

    info!("Starting Wiki Lookup TG Bot...");

    let settings = match Settings::new() {
        Ok(settings) => {
            info!("Configuration loaded successfully.");
            Arc::new(settings)
        }
        Err(e) => {
            error!("Failed to load configuration: {}", e);
            return Err(e.into());
        }
    };

    run_bot(settings).await;

    Ok(())
}

fn init_logging(patterns: Arc<RedactionPatterns>) -> Option<WorkerGuard> {
    let debug_mode = std::env::var("DEBUG_MODE")
        .map(|v| v == "true" || v == "1")
        .unwrap_or(false);

    let filter = if debug_mode {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new("wiki_lookup_bot=info,teloxide=info,hyper=warn,reqwest=warn,tokio=warn")
        })
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_writer(RedactingMakeWriter::new(io::stderr, patterns.clone()));

    let (file_log, guard) = match open_log_file() {
        Some(file) => {
            let (layer, guard) = file_layer(file, patterns);
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_log)
        .init();

    guard
}

/// Redacted, non-blocking log layer writing to `file`.
///
/// Lines are buffered by a background worker until the returned guard drops.
fn file_layer<S>(
    file: File,
    patterns: Arc<RedactionPatterns>,
) -> (impl Layer<S>, WorkerGuard)
where
    S: Subscriber + for<'span> LookupSpan<'span>,
{
    let (non_blocking, guard) = tracing_appender::non_blocking(file);
    let layer = tracing_subscriber::fmt::layer()
        .with_ansi(false)
        .with_target(true)
        .with_writer(RedactingMakeWriter::new(
            move || non_blocking.clone(),
            patterns,
        ));
    (layer, guard)
}

/// Opens `LOG_FILE` for appending, if set.
fn open_log_file() -> Option<File> {
    let path = std::env::var("LOG_FILE").ok().filter(|p| !p.is_empty())?;
    match OpenOptions::new().create(true).append(true).open(&path) {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!("Failed to open log file {path}: {e}");
            None
        }
    }
}
