//! Process-wide `tracing` setup for `calcsite`.
//!
//! Events go to stderr so command output on stdout can be piped. A log file
//! can be attached after startup once the config has been read, and the level
//! can be raised at runtime (`--verbose`).

use std::fmt;
use std::fs::File;
use std::io::{self, IsTerminal, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, OnceLock, PoisonError};

use chrono::Local;
use thiserror::Error;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::{FormatEvent, FormatFields, Writer};
use tracing_subscriber::fmt::{FmtContext, MakeWriter};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Registry, reload};

const FALLBACK_LEVEL: &str = "info";

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("logging has not been initialized")]
    NotInitialized,

    #[error("invalid log level '{level}': {source}")]
    InvalidLevel {
        level: String,
        #[source]
        source: tracing_subscriber::filter::ParseError,
    },

    #[error("failed to swap log filter: {0}")]
    Reload(#[from] reload::Error),

    #[error("cannot open log file {}: {source}", path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

// --- Event format ---

/// `12:04:05.123  WARN calc_core::page: message key=value`
struct ConsoleFormat;

fn paint(
    writer: &mut Writer<'_>,
    code: &str,
    text: impl fmt::Display,
) -> fmt::Result {
    if writer.has_ansi_escapes() {
        write!(writer, "\x1b[{code}m{text}\x1b[0m")
    } else {
        write!(writer, "{text}")
    }
}

fn level_color(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "1;31",
        Level::WARN => "1;33",
        Level::INFO => "1;32",
        Level::DEBUG => "1;34",
        Level::TRACE => "1;35",
    }
}

impl<S, N> FormatEvent<S, N> for ConsoleFormat
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> fmt::Result {
        let meta = event.metadata();

        paint(&mut writer, "2", Local::now().format("%H:%M:%S%.3f"))?;
        write!(writer, " ")?;
        paint(&mut writer, level_color(meta.level()), format_args!("{:>5}", meta.level()))?;
        write!(writer, " ")?;
        paint(&mut writer, "36", format_args!("{}:", meta.target()))?;
        write!(writer, " ")?;

        ctx.field_format().format_fields(writer.by_ref(), event)?;
        writeln!(writer)
    }
}

// --- Log file ---

/// File target that can be attached after the subscriber is installed.
/// Writes are dropped while no file is attached.
#[derive(Clone, Default)]
struct LogFile(Arc<Mutex<Option<File>>>);

impl LogFile {
    fn attach(
        &self,
        file: File,
    ) {
        *self.0.lock().unwrap_or_else(PoisonError::into_inner) = Some(file);
    }
}

struct LogFileGuard<'a>(MutexGuard<'a, Option<File>>);

impl Write for LogFileGuard<'_> {
    fn write(
        &mut self,
        buf: &[u8],
    ) -> io::Result<usize> {
        match self.0.as_mut() {
            Some(file) => file.write(buf),
            None => Ok(buf.len()),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        self.0.as_mut().map_or(Ok(()), |file| file.flush())
    }
}

impl<'a> MakeWriter<'a> for LogFile {
    type Writer = LogFileGuard<'a>;

    fn make_writer(&'a self) -> Self::Writer {
        LogFileGuard(self.0.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

// --- Global handles ---

struct Handles {
    level: reload::Handle<EnvFilter, Registry>,
    file: LogFile,
}

static HANDLES: OnceLock<Handles> = OnceLock::new();

fn handles() -> Result<&'static Handles, LoggingError> {
    HANDLES.get().ok_or(LoggingError::NotInitialized)
}

/// `RUST_LOG` wins over the configured level; an unparsable level falls back
/// to `info`.
fn initial_filter(configured: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(configured))
        .unwrap_or_else(|_| EnvFilter::new(FALLBACK_LEVEL))
}

// --- Public API ---

/// Installs the global subscriber. Later calls are no-ops.
pub fn init_logging(level: &str) {
    let (filter, level_handle) = reload::Layer::new(initial_filter(level));
    let file = LogFile::default();

    let console = tracing_subscriber::fmt::layer()
        .event_format(ConsoleFormat)
        .with_ansi(io::stderr().is_terminal())
        .with_writer(io::stderr);
    let to_file = tracing_subscriber::fmt::layer()
        .event_format(ConsoleFormat)
        .with_ansi(false)
        .with_writer(file.clone());

    let installed = tracing_subscriber::registry()
        .with(filter)
        .with(console)
        .with(to_file)
        .try_init()
        .is_ok();
    if installed {
        let _ = HANDLES.set(Handles {
            level: level_handle,
            file,
        });
    }
}

/// Replaces the active filter. Takes a bare level (`debug`) or any
/// `EnvFilter` directive (`calc_core=trace,info`).
pub fn set_log_level(level: &str) -> Result<(), LoggingError> {
    let filter = EnvFilter::try_new(level).map_err(|source| LoggingError::InvalidLevel {
        level: level.to_string(),
        source,
    })?;
    handles()?.level.reload(filter)?;
    Ok(())
}

/// Appends every subsequent event to `path`, replacing any file attached
/// earlier. The parent directory must exist.
pub fn enable_file_logging(path: &Path) -> Result<(), LoggingError> {
    let handles = handles()?;
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|source| LoggingError::OpenFile {
            path: path.to_path_buf(),
            source,
        })?;
    handles.file.attach(file);
    Ok(())
}
