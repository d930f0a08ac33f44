use std::{
    io::{self, Write},
    time::{Duration, Instant},
};

use tokio_stream::{Stream, StreamExt};

use crate::declare::ResultMessage;

/// Prints results as they arrive and the total elapsed time at the end.
pub struct Reporter<W: Write> {
    out: W,
    started: Instant,
}

impl<W: Write> Reporter<W> {
    /// The clock starts here.
    pub fn new(out: W) -> Self {
        Reporter {
            out,
            started: Instant::now(),
        }
    }

    /// Prints every message until the stream ends; returns how many were printed.
    pub async fn drain<S>(&mut self, mut stream: S) -> io::Result<usize>
    where
        S: Stream<Item = ResultMessage> + Unpin,
    {
        let mut printed = 0;
        while let Some(msg) = stream.next().await {
            writeln!(self.out, "{}", msg)?;
            printed += 1;
        }

        self.out.flush()?;
        Ok(printed)
    }

    pub fn finish(mut self) -> io::Result<Duration> {
        let elapsed = self.started.elapsed();
        writeln!(self.out, "{}", elapsed_line(elapsed))?;
        self.out.flush()?;
        Ok(elapsed)
    }
}

fn elapsed_line(elapsed: Duration) -> String {
    format!(
        "Completed the code process, took: {:.6} seconds",
        elapsed.as_secs_f64()
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::declare::{Symbol, PREVIOUS_CLOSE};

    #[test]
    fn test_elapsed_line() {
        assert_eq!(
            elapsed_line(Duration::from_millis(1500)),
            "Completed the code process, took: 1.500000 seconds"
        );
    }

    #[tokio::test]
    async fn test_drain_then_finish() {
        let messages = vec![
            ResultMessage::new(Symbol::new("AAPL"), PREVIOUS_CLOSE, "150.00"),
            ResultMessage::new(Symbol::new("MSFT"), PREVIOUS_CLOSE, "410.20"),
        ];
        let mut out = Vec::new();

        let mut reporter = Reporter::new(&mut out);
        let printed = reporter.drain(tokio_stream::iter(messages)).await.unwrap();
        reporter.finish().unwrap();

        assert_eq!(printed, 2);
        let text = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = text.lines().collect();
        assert_eq!(lines[0], "AAPL Price for previous close is: 150.00");
        assert_eq!(lines[1], "MSFT Price for previous close is: 410.20");
        assert!(lines[2].starts_with("Completed the code process, took: "));
        assert!(lines[2].ends_with(" seconds"));
        assert_eq!(lines.len(), 3);
    }

    #[tokio::test]
    async fn test_empty_stream_still_reports_elapsed() {
        let mut out = Vec::new();

        let mut reporter = Reporter::new(&mut out);
        let printed = reporter
            .drain(tokio_stream::empty::<ResultMessage>())
            .await
            .unwrap();
        reporter.finish().unwrap();

        assert_eq!(printed, 0);
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Completed the code process, took: "));
    }
}
