// src/probe/reader.rs

use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use super::{ReadinessProbe, StreamKind};

/// Spawn a task that drains `reader` line by line for the lifetime of the
/// process, logging each line and feeding it to `probe`.
///
/// The task ends on EOF or on the first read error; errors are logged and
/// never reach the caller. Invalid UTF-8 is replaced rather than treated as
/// an error so a stray byte cannot stop readiness detection.
pub fn spawn_drain<R>(
    app: String,
    stream: StreamKind,
    reader: R,
    probe: ReadinessProbe,
) -> JoinHandle<()>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    let line = String::from_utf8_lossy(trim_line_ending(&buf));
                    debug!(app = %app, %stream, "{}", line);
                    probe.feed(stream, &line);
                }
                Err(e) => {
                    warn!(app = %app, %stream, error = %e, "reading process output failed");
                    break;
                }
            }
        }

        debug!(app = %app, %stream, "stream drain ended");
    })
}

fn trim_line_ending(buf: &[u8]) -> &[u8] {
    let buf = buf.strip_suffix(b"\n").unwrap_or(buf);
    buf.strip_suffix(b"\r").unwrap_or(buf)
}
