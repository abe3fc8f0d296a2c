use std::io::{self, BufRead};
use std::sync::mpsc::{self, RecvTimeoutError, TryRecvError};
use std::thread;
use std::time::Duration;

use super::{LineSource, PollOutcome};

/// Standard input as a [`LineSource`] with a bounded readiness wait.
///
/// A pump thread blocks on `read_line` and feeds a channel; the reader side
/// waits with `recv_timeout`, so it never blocks past its poll interval. A
/// closed stdin drops the sender, which surfaces as `Eof`.
#[derive(Debug)]
pub struct StdinLineSource {
    rx: mpsc::Receiver<String>,
}

impl StdinLineSource {
    pub fn spawn() -> io::Result<Self> {
        let (tx, rx) = mpsc::channel();
        thread::Builder::new()
            .name("stdin-pump".to_string())
            .spawn(move || {
                let mut stdin = io::stdin().lock();
                let mut line = String::new();
                loop {
                    line.clear();
                    match stdin.read_line(&mut line) {
                        Ok(0) | Err(_) => break,
                        Ok(_) => {
                            let record = line.trim_end_matches(['\n', '\r']).to_string();
                            if tx.send(record).is_err() {
                                break;
                            }
                        }
                    }
                }
            })?;
        Ok(Self { rx })
    }

    #[cfg(test)]
    pub(crate) fn from_receiver(rx: mpsc::Receiver<String>) -> Self {
        Self { rx }
    }
}

impl LineSource for StdinLineSource {
    fn poll_line(&mut self, timeout: Duration) -> PollOutcome {
        match self.rx.recv_timeout(timeout) {
            Ok(line) => PollOutcome::Line(line),
            Err(RecvTimeoutError::Timeout) => PollOutcome::TimedOut,
            Err(RecvTimeoutError::Disconnected) => PollOutcome::Eof,
        }
    }

    fn try_line(&mut self) -> PollOutcome {
        match self.rx.try_recv() {
            Ok(line) => PollOutcome::Line(line),
            Err(TryRecvError::Empty) => PollOutcome::TimedOut,
            Err(TryRecvError::Disconnected) => PollOutcome::Eof,
        }
    }
}
