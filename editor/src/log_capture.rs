use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::Instant;

/// Number of entries kept by the installed logger.
pub const LOG_CAPACITY: usize = 1_000;

/// A single captured log entry.
#[derive(Debug, Clone)]
pub struct LogEntry {
    pub level: log::Level,
    pub target: String,
    pub message: String,
    pub timestamp: Instant,
}

impl fmt::Display for LogEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:<5} {}] {}", self.level, self.target, self.message)
    }
}

/// Ring buffer of captured log entries.
#[derive(Debug)]
pub struct LogBuffer {
    entries: VecDeque<LogEntry>,
    max_capacity: usize,
}

impl LogBuffer {
    pub fn new(max_capacity: usize) -> Self {
        Self {
            entries: VecDeque::with_capacity(max_capacity.min(1024)),
            max_capacity,
        }
    }

    pub fn entries(&self) -> &VecDeque<LogEntry> {
        &self.entries
    }

    /// Entries at `level` or more severe.
    pub fn at_least(&self, level: log::Level) -> impl Iterator<Item = &LogEntry> {
        self.entries.iter().filter(move |e| e.level <= level)
    }

    pub fn push(&mut self, entry: LogEntry) {
        if self.entries.len() >= self.max_capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(entry);
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Global shared log buffer.
static LOG_BUFFER: OnceLock<Arc<Mutex<LogBuffer>>> = OnceLock::new();

/// Returns the shared log buffer handle, if [`install`] has run.
pub fn log_buffer() -> Option<Arc<Mutex<LogBuffer>>> {
    LOG_BUFFER.get().cloned()
}

/// Custom logger that wraps `env_logger` and captures entries to the ring buffer.
struct LogCapture {
    inner: env_logger::Logger,
    buffer: Arc<Mutex<LogBuffer>>,
}

impl log::Log for LogCapture {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &log::Record) {
        if self.inner.enabled(record.metadata()) {
            // Forward to env_logger (prints to stderr)
            self.inner.log(record);

            let entry = LogEntry {
                level: record.level(),
                target: record.target().to_owned(),
                message: format!("{}", record.args()),
                timestamp: Instant::now(),
            };
            if let Ok(mut buf) = self.buffer.lock() {
                buf.push(entry);
            }
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}

/// Installs the capturing logger.
///
/// `default_filter` applies when `RUST_LOG` is not set. Fails if a logger is
/// already installed.
pub fn install(default_filter: &str) -> Result<Arc<Mutex<LogBuffer>>, log::SetLoggerError> {
    let inner = env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .build();
    let max_level = inner.filter();

    let buffer = Arc::new(Mutex::new(LogBuffer::new(LOG_CAPACITY)));
    let logger = LogCapture {
        inner,
        buffer: Arc::clone(&buffer),
    };

    log::set_boxed_logger(Box::new(logger))?;
    log::set_max_level(max_level);
    // Only the first successful install gets here.
    let _ = LOG_BUFFER.set(Arc::clone(&buffer));
    Ok(buffer)
}
