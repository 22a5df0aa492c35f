//! # Logger
//!
//! Terminal-first logging for the AUTD3 Server tasks.
//!
//! Builds run long external commands whose own output is streamed to the terminal, so
//! our records stay short: a level prefix and the message on stderr, no timestamps,
//! no targets. Colours follow whether stderr is a terminal. A rolling log file with
//! full metadata can be added with [`LoggerBuilder::file`].
//!
//! Without an explicit [`LoggerBuilder::env_filter`], `RUST_LOG` overrides the level.
//!
//! ## Example
//!
//! ```rust
//! # use autd_server_logger::Logger;
//! let _logger = Logger::builder("xtask")
//!     .verbosity(1, false)
//!     .init()
//!     .unwrap();
//! tracing::debug!("shown with -v");
//! ```

mod error;

pub use crate::error::LoggerError;
pub use tracing::level_filters::LevelFilter;
pub use tracing_appender::rolling::Rotation;

use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;
use tracing::Subscriber;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::RollingFileAppender;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{EnvFilter, Layer, fmt};

const DEFAULT_MAX_FILES: usize = 5;
const LOG_FILE_SUFFIX: &str = "log";

type BoxedLayer<S> = Box<dyn Layer<S> + Send + Sync + 'static>;

mod private {
    pub trait Sealed {}
}

/// Destination of log records besides the terminal.
pub trait Output: private::Sealed {
    #[doc(hidden)]
    fn file_layer<S>(&self, name: &str) -> Result<Option<(BoxedLayer<S>, WorkerGuard)>, LoggerError>
    where
        S: Subscriber + for<'a> LookupSpan<'a>;
}

/// Terminal only.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoFile;

/// Rolling files `<name>.<date>.log` in a directory.
#[derive(Debug, Clone)]
pub struct FileOutput {
    dir: PathBuf,
    rotation: Rotation,
    max_files: usize,
}

impl private::Sealed for NoFile {}
impl private::Sealed for FileOutput {}

impl Output for NoFile {
    fn file_layer<S>(&self, _name: &str) -> Result<Option<(BoxedLayer<S>, WorkerGuard)>, LoggerError>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        Ok(None)
    }
}

impl Output for FileOutput {
    fn file_layer<S>(&self, name: &str) -> Result<Option<(BoxedLayer<S>, WorkerGuard)>, LoggerError>
    where
        S: Subscriber + for<'a> LookupSpan<'a>,
    {
        if self.max_files == 0 {
            return Err(LoggerError::InvalidConfiguration {
                message: "at least one log file must be kept".into(),
                context: Some(self.dir.display().to_string().into()),
            });
        }
        fs::create_dir_all(&self.dir).map_err(|source| LoggerError::Io {
            source,
            context: Some(format!("creating {}", self.dir.display()).into()),
        })?;

        let appender = RollingFileAppender::builder()
            .rotation(self.rotation.clone())
            .filename_prefix(name)
            .filename_suffix(LOG_FILE_SUFFIX)
            .max_log_files(self.max_files)
            .build(&self.dir)?;
        let (writer, guard) = tracing_appender::non_blocking(appender);

        Ok(Some((fmt::layer().with_ansi(false).with_writer(writer).boxed(), guard)))
    }
}

/// Configures the process-wide subscriber. Obtained from [`Logger::builder`].
#[derive(Debug)]
#[must_use = "call `init` to install the subscriber"]
pub struct LoggerBuilder<O: Output = NoFile> {
    name: String,
    level: LevelFilter,
    directives: Option<String>,
    console: bool,
    ansi: bool,
    output: O,
}

impl<O: Output> LoggerBuilder<O> {
    /// Default level when neither `RUST_LOG` nor directives are given.
    pub const fn level(mut self, level: LevelFilter) -> Self {
        self.level = level;
        self
    }

    /// Sets the level from `-v` / `-q` style flags, see [`level_from_verbosity`].
    pub const fn verbosity(self, verbose: u8, quiet: bool) -> Self {
        self.level(level_from_verbosity(verbose, quiet))
    }

    /// Filter directives such as `autd_server_xtask=trace`; replaces `RUST_LOG`.
    pub fn env_filter(mut self, directives: impl Into<String>) -> Self {
        self.directives = Some(directives.into());
        self
    }

    pub const fn console(mut self, enabled: bool) -> Self {
        self.console = enabled;
        self
    }

    /// Forces colours on or off; the default follows whether stderr is a terminal.
    pub const fn ansi(mut self, enabled: bool) -> Self {
        self.ansi = enabled;
        self
    }

    fn filter(&self) -> Result<EnvFilter, LoggerError> {
        let builder = EnvFilter::builder().with_default_directive(self.level.into());
        match &self.directives {
            None => Ok(builder.from_env_lossy()),
            Some(directives) => builder.parse(directives).map_err(|e| LoggerError::InvalidConfiguration {
                message: format!("invalid filter '{directives}': {e}").into(),
                context: None,
            }),
        }
    }

    /// Installs the global subscriber.
    ///
    /// # Errors
    /// Returns [`LoggerError::InvalidConfiguration`] for an empty name, bad directives or
    /// when no output is enabled, [`LoggerError::Io`] / [`LoggerError::Appender`] if the
    /// log directory is unusable, and [`LoggerError::Subscriber`] if a subscriber is
    /// already installed.
    pub fn init(self) -> Result<Logger, LoggerError> {
        if self.name.trim().is_empty() {
            return Err(LoggerError::InvalidConfiguration {
                message: "logger name cannot be empty".into(),
                context: None,
            });
        }
        let filter = self.filter()?;

        let console = self.console.then(|| {
            fmt::layer()
                .without_time()
                .with_target(false)
                .with_ansi(self.ansi)
                .with_writer(std::io::stderr)
                .compact()
                .boxed()
        });
        let (file, guard) = self.output.file_layer(&self.name)?.unzip();

        if console.is_none() && file.is_none() {
            return Err(LoggerError::InvalidConfiguration {
                message: "console and file output are both disabled".into(),
                context: Some(self.name.into()),
            });
        }

        tracing_subscriber::registry().with(filter).with(console).with(file).try_init()?;
        Ok(Logger { guard })
    }
}

impl LoggerBuilder<NoFile> {
    /// Also writes records to rolling files in `dir`, created if missing.
    pub fn file(self, dir: impl Into<PathBuf>) -> LoggerBuilder<FileOutput> {
        LoggerBuilder {
            name: self.name,
            level: self.level,
            directives: self.directives,
            console: self.console,
            ansi: self.ansi,
            output: FileOutput { dir: dir.into(), rotation: Rotation::DAILY, max_files: DEFAULT_MAX_FILES },
        }
    }
}

impl LoggerBuilder<FileOutput> {
    pub fn rotation(mut self, rotation: Rotation) -> Self {
        self.output.rotation = rotation;
        self
    }

    /// Number of rotated files kept; older ones are deleted.
    pub const fn max_files(mut self, max: usize) -> Self {
        self.output.max_files = max;
        self
    }
}

/// Keeps the background file writer alive; drop it last.
#[must_use = "dropping the logger flushes and stops file output"]
#[derive(Debug)]
pub struct Logger {
    guard: Option<WorkerGuard>,
}

impl Logger {
    /// `name` prefixes the log files.
    pub fn builder(name: impl Into<String>) -> LoggerBuilder {
        LoggerBuilder {
            name: name.into(),
            level: LevelFilter::INFO,
            directives: None,
            console: true,
            ansi: std::io::stderr().is_terminal(),
            output: NoFile,
        }
    }

    #[must_use]
    pub const fn writes_file(&self) -> bool {
        self.guard.is_some()
    }
}

/// Maps `-v` counts and a quiet switch to a level.
///
/// Quiet shows errors only. Without flags the level is `INFO`; each `-v` goes one step
/// further (`DEBUG`, then `TRACE`).
#[must_use]
pub const fn level_from_verbosity(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::ERROR;
    }
    match verbose {
        0 => LevelFilter::INFO,
        1 => LevelFilter::DEBUG,
        _ => LevelFilter::TRACE,
    }
}
