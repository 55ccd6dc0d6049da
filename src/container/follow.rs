use std::io::{self, BufRead, BufReader, Read};
use std::process::{Child, Command, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};

use super::engine::LineSource;
use super::types::LineRead;

/// How long a terminated follower gets to exit before it is killed.
const TERMINATE_GRACE: Duration = Duration::from_secs(2);
const REAP_INTERVAL: Duration = Duration::from_millis(50);

/// A running `logs -f` process whose stdout and stderr are merged into one
/// line stream.
///
/// Reader threads push lines into a channel, so a read is a bounded
/// `recv_timeout` rather than a blocking pipe read.
pub struct LogFollower {
    child: Child,
    rx: Receiver<io::Result<String>>,
    terminated: bool,
}

impl LogFollower {
    pub fn spawn(mut command: Command) -> Result<Self> {
        let mut child = command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .context("failed to spawn log follower")?;

        let stdout = child.stdout.take().context("follower stdout was not piped")?;
        let stderr = child.stderr.take().context("follower stderr was not piped")?;

        let (tx, rx) = mpsc::channel();
        forward_lines(stdout, tx.clone());
        forward_lines(stderr, tx);

        Ok(Self {
            child,
            rx,
            terminated: false,
        })
    }

    fn signal_terminate(&mut self) {
        #[cfg(unix)]
        {
            // SAFETY: kill(2) with a pid we spawned and still own (not yet reaped).
            let pid = self.child.id() as libc::pid_t;
            unsafe {
                libc::kill(pid, libc::SIGTERM);
            }
        }

        #[cfg(not(unix))]
        {
            let _ = self.child.kill();
        }
    }
}

impl LineSource for LogFollower {
    fn next_line(&mut self, timeout: Duration) -> io::Result<LineRead> {
        match self.rx.recv_timeout(timeout) {
            Ok(Ok(line)) => Ok(LineRead::Line(line)),
            Ok(Err(e)) => Err(e),
            Err(RecvTimeoutError::Timeout) => Ok(LineRead::Timeout),
            // Both reader threads hung up: the follower closed its output.
            Err(RecvTimeoutError::Disconnected) => Ok(LineRead::Closed),
        }
    }

    fn terminate(&mut self) {
        if self.terminated {
            return;
        }
        self.terminated = true;

        if let Ok(Some(_)) = self.child.try_wait() {
            return;
        }
        self.signal_terminate();

        let start = Instant::now();
        while start.elapsed() < TERMINATE_GRACE {
            match self.child.try_wait() {
                Ok(Some(_)) | Err(_) => return,
                Ok(None) => std::thread::sleep(REAP_INTERVAL),
            }
        }

        tracing::warn!("log follower ignored SIGTERM, killing it");
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

impl Drop for LogFollower {
    fn drop(&mut self) {
        self.terminate();
    }
}

/// Forward newline-delimited output to `tx` on a detached thread. Invalid
/// UTF-8 is replaced rather than reported.
fn forward_lines<R: Read + Send + 'static>(reader: R, tx: Sender<io::Result<String>>) {
    std::thread::spawn(move || {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();
        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf) {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(&buf)
                        .trim_end_matches(['\n', '\r'])
                        .to_string();
                    // Receiver may be dropped; stop reading if so.
                    if tx.send(Ok(line)).is_err() {
                        break;
                    }
                }
                Err(e) => {
                    let _ = tx.send(Err(e));
                    break;
                }
            }
        }
    });
}
