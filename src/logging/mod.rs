use std::{
    fmt::Write as _,
    fs::{self, OpenOptions},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
    thread,
};

use chrono::{format::DelayedFormat, DateTime, Local};
use crossbeam_channel::{unbounded, Receiver, Sender};
use once_cell::sync::Lazy;

pub mod guard;

pub use guard::LogGuard;

static LOGGER: Lazy<Logger> = Lazy::new(|| Logger::new("quote_crawler"));

/// 一次寫入檔案的批次大小上限
const BATCH_CAPACITY: usize = 4096;

pub struct Logger {
    writer: Sender<LogMessage>,
}

impl Logger {
    fn new(log_name: &str) -> Self {
        let (tx, rx) = unbounded::<LogMessage>();
        let log_path = Self::get_log_path(log_name);

        // 寫入檔案的操作使用另一個線程處理
        thread::spawn(move || match log_path.and_then(|p| Self::open(&p)) {
            Some(writer) => Self::drain(rx, writer),
            None => {
                error_console("Failed to open the log file, falling back to console".to_string());
                for received in &rx {
                    println!("{}", received.line());
                }
            }
        });

        Logger { writer: tx }
    }

    fn open(log_path: &Path) -> Option<BufWriter<fs::File>> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(log_path)
            .map(BufWriter::new)
            .ok()
    }

    fn drain(rx: Receiver<LogMessage>, mut writer: BufWriter<fs::File>) {
        let mut batch = String::with_capacity(BATCH_CAPACITY);

        while let Ok(received) = rx.recv() {
            if writeln!(&mut batch, "{}", received.line()).is_err() {
                continue;
            }

            if rx.is_empty() || batch.len() >= BATCH_CAPACITY {
                if writer.write_all(batch.as_bytes()).is_err() || writer.flush().is_err() {
                    info_console(batch.clone());
                }

                batch.clear();
            }
        }
    }

    fn send(&self, level: log::Level, msg: String) {
        if let Err(why) = self.writer.send(LogMessage::new(level, msg)) {
            error_console(why.to_string());
        }
    }

    fn get_log_path(name: &str) -> Option<PathBuf> {
        let path = Path::new("log");

        if !path.exists() {
            fs::create_dir_all(path).ok()?;
        }

        let mut log_path = PathBuf::from(path);
        log_path.push(format!("{}_{}.log", name, Local::now().format("%Y-%m-%d")));

        Some(log_path)
    }
}

pub struct LogMessage {
    pub level: log::Level,
    pub msg: String,
    pub created_at: DateTime<Local>,
}

impl LogMessage {
    pub fn new(level: log::Level, msg: String) -> Self {
        LogMessage {
            level,
            msg,
            created_at: Local::now(),
        }
    }

    fn line(&self) -> String {
        format!(
            "{} {} {}",
            self.created_at.format("%F %X%.6f"),
            self.level,
            self.msg
        )
    }
}

pub fn info_file_async(log: impl Into<String>) {
    LOGGER.send(log::Level::Info, log.into());
}

pub fn warn_file_async(log: impl Into<String>) {
    LOGGER.send(log::Level::Warn, log.into());
}

pub fn error_file_async(log: impl Into<String>) {
    LOGGER.send(log::Level::Error, log.into());
}

pub fn debug_file_async(log: impl Into<String>) {
    LOGGER.send(log::Level::Debug, log.into());
}

pub fn info_console(log: String) {
    println!(
        "{} Info {}",
        Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
        log
    );
}

pub fn error_console(log: String) {
    eprintln!(
        "{} Error {}",
        DelayedFormat::to_string(&Local::now().format("%Y-%m-%d %H:%M:%S.%3f")),
        log
    );
}
