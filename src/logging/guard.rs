use std::{
    io::{self, Write},
    sync::{Mutex, PoisonError},
};

use chrono::Local;

use crate::logging;

/// Serializes writes to the shared diagnostic sink.
///
/// One guard is created per run and handed to every stock task, so concurrent
/// failures produce whole lines instead of interleaved fragments. The sink is
/// stderr in production; tests hand in a spy writer.
pub struct LogGuard {
    sink: Mutex<Box<dyn Write + Send>>,
}

impl LogGuard {
    pub fn new(sink: impl Write + Send + 'static) -> Self {
        LogGuard {
            sink: Mutex::new(Box::new(sink)),
        }
    }

    pub fn stderr() -> Self {
        Self::new(io::stderr())
    }

    /// Runs `action` while holding the lock and returns its result.
    ///
    /// Never call this around an `.await`; the lock is a blocking mutex.
    pub fn with_lock<R>(&self, action: impl FnOnce(&mut dyn Write) -> R) -> R {
        // 前一個持有者 panic 並不影響 sink 本身，繼續使用
        let mut sink = self.sink.lock().unwrap_or_else(PoisonError::into_inner);
        action(sink.as_mut())
    }

    /// Writes one timestamped diagnostic line and mirrors it to the file log.
    pub fn error(&self, msg: &str) {
        let written = self.with_lock(|sink| {
            writeln!(
                sink,
                "{} Error {}",
                Local::now().format("%Y-%m-%d %H:%M:%S.%3f"),
                msg
            )
            .and_then(|_| sink.flush())
        });

        if let Err(why) = written {
            logging::error_console(format!("Failed to write diagnostic because {:?}", why));
        }

        logging::error_file_async(msg.to_string());
    }
}

impl Default for LogGuard {
    fn default() -> Self {
        Self::stderr()
    }
}

#[cfg(test)]
pub(crate) mod spy {
    use std::{
        io::{self, Write},
        sync::{Arc, Mutex},
    };

    /// Captures everything written through a `LogGuard`, one byte per `write` call
    /// with a yield in between so an unguarded writer would interleave.
    #[derive(Clone, Default)]
    pub struct SpyWriter {
        buffer: Arc<Mutex<Vec<u8>>>,
    }

    impl SpyWriter {
        pub fn lines(&self) -> Vec<String> {
            let buffer = self.buffer.lock().unwrap();
            String::from_utf8_lossy(&buffer)
                .lines()
                .map(str::to_string)
                .collect()
        }
    }

    impl Write for SpyWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            match buf.first() {
                Some(byte) => {
                    self.buffer.lock().unwrap().push(*byte);
                    std::thread::yield_now();
                    Ok(1)
                }
                None => Ok(0),
            }
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{sync::Arc, thread};

    use super::{spy::SpyWriter, *};

    #[test]
    fn test_with_lock_returns_action_result() {
        let guard = LogGuard::new(SpyWriter::default());
        let n = guard.with_lock(|sink| sink.write(b"abc").unwrap());

        assert_eq!(n, 1);
    }

    #[test]
    fn test_concurrent_errors_never_interleave() {
        let spy = SpyWriter::default();
        let guard = Arc::new(LogGuard::new(spy.clone()));
        let k = 8;

        let handles: Vec<_> = (0..k)
            .map(|i| {
                let guard = Arc::clone(&guard);
                thread::spawn(move || guard.error(&format!("Error parsing stock SYM{i}: boom")))
            })
            .collect();

        for handle in handles {
            handle.join().unwrap();
        }

        let lines = spy.lines();
        assert_eq!(lines.len(), k);
        for i in 0..k {
            let expected = format!(" Error Error parsing stock SYM{i}: boom");
            assert_eq!(lines.iter().filter(|l| l.ends_with(&expected)).count(), 1);
        }
    }
}
