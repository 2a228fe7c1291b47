use chrono::Local;
use log::warn;
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;
use std::sync::Mutex;

/// Injectable sink for per-strategy trade events. The engine records through
/// this; the default discards everything so backtests inside a parameter
/// search pay no I/O.
pub trait TradeLog: Send + Sync {
    fn record(&self, strategy: &str, tick: u64, event: &str);
}

/// Default no-op sink.
#[derive(Debug, Default)]
pub struct NullLog;

impl TradeLog for NullLog {
    fn record(&self, _strategy: &str, _tick: u64, _event: &str) {}
}

/// Appends timestamped lines to `<dir>/<strategy>.log`. Sink failures are
/// downgraded to warnings; a lost log line must not abort an otherwise
/// healthy run.
pub struct FileLog {
    dir: PathBuf,
    files: Mutex<HashMap<String, File>>,
}

impl FileLog {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            files: Mutex::new(HashMap::new()),
        }
    }
}

impl TradeLog for FileLog {
    fn record(&self, strategy: &str, tick: u64, event: &str) {
        let mut files = match self.files.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !files.contains_key(strategy) {
            if let Err(error) = fs::create_dir_all(&self.dir) {
                warn!("Failed to create trade log dir {:?}: {}", self.dir, error);
                return;
            }
            let path = self.dir.join(format!("{strategy}.log"));
            match OpenOptions::new().create(true).append(true).open(&path) {
                Ok(file) => {
                    files.insert(strategy.to_string(), file);
                }
                Err(error) => {
                    warn!("Failed to open trade log {:?}: {}", path, error);
                    return;
                }
            }
        }
        let file = files.get_mut(strategy).expect("inserted above");
        let timestamp = Local::now().format("%Y/%m/%d_%H:%M:%S%.6f");
        if let Err(error) = writeln!(file, "{timestamp} tick{tick}\t{event}") {
            warn!("Failed to write trade log line for {}: {}", strategy, error);
        }
    }
}
