//! Async worker output readers (non-UTF8-safe).
//!
//! The packaged worker bundles native PDF and OCR libraries that can emit
//! non-UTF8 bytes on stdout/stderr. `BufReader::lines()` would end the
//! reader task on the first invalid byte, so lines are read as bytes and
//! decoded lossily.

use std::sync::Arc;

use paperlink_core::{WorkerLogSinkPort, WorkerStream};
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio::task::JoinHandle;
use tracing::debug;

pub(crate) fn spawn_stream_reader(
    stream: impl AsyncRead + Unpin + Send + 'static,
    pid: u32,
    stream_type: WorkerStream,
    sink: Arc<dyn WorkerLogSinkPort>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut buf: Vec<u8> = Vec::with_capacity(1024);

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break, // EOF
                Ok(_) => {
                    sink.append(stream_type, decode_line(&mut buf));
                }
                Err(e) => {
                    debug!(
                        pid,
                        stream = stream_type.as_str(),
                        error = %e,
                        "worker output reader exiting due to read error"
                    );
                    break;
                }
            }
        }

        debug!(pid, stream = stream_type.as_str(), "worker output reader exiting");
    })
}

/// Strip the line terminator and decode lossily.
fn decode_line(buf: &mut Vec<u8>) -> String {
    if buf.last() == Some(&b'\n') {
        buf.pop();
        if buf.last() == Some(&b'\r') {
            buf.pop();
        }
    }
    String::from_utf8_lossy(buf).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder(Mutex<Vec<(WorkerStream, String)>>);

    impl WorkerLogSinkPort for Recorder {
        fn append(&self, stream: WorkerStream, line: String) {
            self.0.lock().unwrap().push((stream, line));
        }
    }

    #[test]
    fn test_decode_line_strips_crlf() {
        let mut buf = b"hello\r\n".to_vec();
        assert_eq!(decode_line(&mut buf), "hello");
    }

    #[test]
    fn test_decode_line_lossy() {
        let mut buf = vec![b'o', b'k', 0xff, b'\n'];
        assert_eq!(decode_line(&mut buf), "ok\u{fffd}");
    }

    #[tokio::test]
    async fn test_reader_forwards_every_line_in_order() {
        let recorder = Arc::new(Recorder::default());
        let input: &[u8] = b"first\nsecond\r\nlast without newline";

        spawn_stream_reader(input, 42, WorkerStream::Stderr, recorder.clone())
            .await
            .unwrap();

        let lines = recorder.0.lock().unwrap().clone();
        assert_eq!(
            lines,
            vec![
                (WorkerStream::Stderr, "first".to_string()),
                (WorkerStream::Stderr, "second".to_string()),
                (WorkerStream::Stderr, "last without newline".to_string()),
            ]
        );
    }
}
