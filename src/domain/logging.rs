//! Leveled, per-component logging behind a process-wide sink.
//!
//! The `log_*!` macros are the only entry points used by the rest of the
//! crate. Trace, debug and info calls compile away in release builds; warn
//! and error always reach the installed [`Logger`]. Nothing is formatted
//! unless the sink accepts the level.

use derive_more::Display;
use std::fmt;
use std::sync::OnceLock;

/// Severity, lowest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Display)]
pub enum LogLevel {
    #[display(fmt = "TRACE")]
    Trace,
    #[display(fmt = "DEBUG")]
    Debug,
    #[display(fmt = " INFO")]
    Info,
    #[display(fmt = " WARN")]
    Warn,
    #[display(fmt = "ERROR")]
    Error,
}

/// Layer and unit that produced a line, e.g. `APP:ChartOrchestrator`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum LogComponent {
    #[display(fmt = "DOM:{}", _0)]
    Domain(&'static str),
    #[display(fmt = "APP:{}", _0)]
    Application(&'static str),
    #[display(fmt = "INF:{}", _0)]
    Infrastructure(&'static str),
    #[display(fmt = "PRE:{}", _0)]
    Presentation(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub struct LogEntry {
    /// Milliseconds from the installed [`TimeProvider`].
    pub timestamp: u64,
    pub level: LogLevel,
    pub component: LogComponent,
    pub message: String,
}

impl LogEntry {
    /// `[12:00:01.250]  WARN APP:ChartOrchestrator: load failed: ...`
    pub fn format_line(&self) -> String {
        let ts = time_provider().format_timestamp(self.timestamp);
        format!("[{}] {} {}: {}", ts, self.level, self.component, self.message)
    }
}

pub trait TimeProvider: Send + Sync {
    fn current_timestamp(&self) -> u64;
    fn format_timestamp(&self, timestamp: u64) -> String;
}

/// Destination for log entries.
pub trait Logger: Send + Sync {
    /// Checked before the message is formatted.
    fn enabled(&self, _level: LogLevel) -> bool {
        true
    }

    fn log(&self, entry: LogEntry);
}

static LOGGER: OnceLock<Box<dyn Logger>> = OnceLock::new();
static TIME_PROVIDER: OnceLock<Box<dyn TimeProvider>> = OnceLock::new();

/// Install the sink. Only the first call wins; later ones are ignored.
pub fn init_logger(logger: Box<dyn Logger>) {
    let _ = LOGGER.set(logger);
}

/// Install the clock. Only the first call wins.
pub fn init_time_provider(time_provider: Box<dyn TimeProvider>) {
    let _ = TIME_PROVIDER.set(time_provider);
}

pub fn logger() -> &'static dyn Logger {
    LOGGER.get().map(|logger| logger.as_ref()).unwrap_or(&Discard)
}

pub fn time_provider() -> &'static dyn TimeProvider {
    TIME_PROVIDER.get().map(|provider| provider.as_ref()).unwrap_or(&Sequence)
}

/// Backend of the `log_*!` macros.
pub fn emit(level: LogLevel, component: LogComponent, args: fmt::Arguments<'_>) {
    emit_to(logger(), level, component, args);
}

fn emit_to(sink: &dyn Logger, level: LogLevel, component: LogComponent, args: fmt::Arguments<'_>) {
    if !sink.enabled(level) {
        return;
    }
    sink.log(LogEntry { timestamp: time_provider().current_timestamp(), level, component, message: args.to_string() });
}

/// Sink used before `init_logger` (native tests, early startup).
struct Discard;

impl Logger for Discard {
    fn enabled(&self, _level: LogLevel) -> bool {
        false
    }

    fn log(&self, _entry: LogEntry) {}
}

/// Counter clock used until a real one is installed.
struct Sequence;

impl TimeProvider for Sequence {
    fn current_timestamp(&self) -> u64 {
        use std::sync::atomic::{AtomicU64, Ordering};
        static NEXT: AtomicU64 = AtomicU64::new(0);
        NEXT.fetch_add(1, Ordering::Relaxed)
    }

    fn format_timestamp(&self, timestamp: u64) -> String {
        format!("#{:06}", timestamp)
    }
}

#[macro_export]
macro_rules! log_trace {
    ($component:expr, $($arg:tt)*) => {
        #[cfg(debug_assertions)]
        {
            $crate::domain::logging::emit($crate::domain::logging::LogLevel::Trace, $component, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_debug {
    ($component:expr, $($arg:tt)*) => {
        #[cfg(debug_assertions)]
        {
            $crate::domain::logging::emit($crate::domain::logging::LogLevel::Debug, $component, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_info {
    ($component:expr, $($arg:tt)*) => {
        #[cfg(debug_assertions)]
        {
            $crate::domain::logging::emit($crate::domain::logging::LogLevel::Info, $component, format_args!($($arg)*));
        }
    };
}

#[macro_export]
macro_rules! log_warn {
    ($component:expr, $($arg:tt)*) => {
        $crate::domain::logging::emit($crate::domain::logging::LogLevel::Warn, $component, format_args!($($arg)*))
    };
}

#[macro_export]
macro_rules! log_error {
    ($component:expr, $($arg:tt)*) => {
        $crate::domain::logging::emit($crate::domain::logging::LogLevel::Error, $component, format_args!($($arg)*))
    };
}
