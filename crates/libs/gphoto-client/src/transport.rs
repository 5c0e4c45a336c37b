//! Streaming byte transfer: a producer copies the source into a bounded pipe
//! while an HTTP request streams the pipe's other end to the server.

use std::io::{self, Read, Write};
use std::sync::mpsc;
use std::thread;

use crate::error::ClientError;
use crate::http::{ensure_success, HttpContext};
use crate::pipe::{pipe, PipeWriter};

/// Receives `(bytes_so_far, total_bytes)` after each chunk is accepted.
pub type Progress<'a> = &'a mut (dyn FnMut(u64, u64) + Send);

pub const OCTET_STREAM: &str = "application/octet-stream";

/// Copies `source` into `sink` in `chunk_size` pieces until the source is
/// exhausted, reporting progress after every accepted chunk.
///
/// Fails when the source yields more than `total` bytes. The caller checks
/// for a short source.
pub fn copy_with_progress<R, W>(
    source: &mut R,
    sink: &mut W,
    total: u64,
    chunk_size: usize,
    mut progress: Option<Progress<'_>>,
) -> Result<u64, ClientError>
where
    R: Read + ?Sized,
    W: Write + ?Sized,
{
    let mut buf = vec![0u8; chunk_size.max(1)];
    let mut copied = 0u64;
    loop {
        let read = match source.read(&mut buf) {
            Ok(0) => return Ok(copied),
            Ok(read) => read,
            Err(err) if err.kind() == io::ErrorKind::Interrupted => continue,
            Err(err) => {
                return Err(ClientError::copy_failure(format!("reading source: {err}")));
            }
        };
        if copied + read as u64 > total {
            return Err(ClientError::copy_failure(format!(
                "source yielded more than the declared {total} bytes"
            )));
        }
        let written = sink
            .write(&buf[..read])
            .map_err(|err| ClientError::copy_failure(format!("writing request body: {err}")))?;
        if written != read {
            return Err(ClientError::ShortWrite { written, expected: read });
        }
        copied += written as u64;
        if let Some(report) = progress.as_mut() {
            report(copied, total);
        }
    }
}

/// Status and body of a finished transfer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransferResponse {
    pub status: u16,
    pub body: String,
}

enum Outcome {
    Http(Result<TransferResponse, ClientError>),
    Copied(Result<u64, ClientError>),
    /// The request finished reading early; its own outcome decides.
    Detached,
}

/// Runs one producer/consumer transfer pair per call.
#[derive(Clone, Copy, Debug)]
pub struct Uploader<'a> {
    http: &'a HttpContext,
    chunk_size: usize,
    pipe_capacity: usize,
}

impl<'a> Uploader<'a> {
    pub fn new(http: &'a HttpContext, chunk_size: usize, pipe_capacity: usize) -> Self {
        Self { http, chunk_size, pipe_capacity }
    }

    /// Streams `total` bytes from `source` to `url` and returns the server's
    /// answer.
    ///
    /// Blocks until the HTTP request completes or the producer fails. A
    /// producer failure is returned in place of whatever the request ends
    /// with. Both workers have exited, and `progress` will not be called
    /// again, by the time this returns.
    pub fn transfer<R>(
        &self,
        url: &str,
        source: R,
        total: u64,
        progress: Option<Progress<'_>>,
    ) -> Result<TransferResponse, ClientError>
    where
        R: Read + Send,
    {
        let (writer, reader) = pipe(self.pipe_capacity);
        let (outcome_tx, outcome_rx) = mpsc::channel::<Outcome>();
        let producer_tx = outcome_tx.clone();
        let chunk_size = self.chunk_size;

        thread::scope(|scope| {
            scope.spawn(move || produce(source, writer, total, chunk_size, progress, producer_tx));

            scope.spawn(move || {
                let result = self
                    .http
                    .request("POST", url)
                    .set("Content-Type", OCTET_STREAM)
                    .set("Content-Length", &total.to_string())
                    .send(reader)
                    .map_err(|err| ClientError::transport(url, err))
                    .and_then(|response| ensure_success(url, response))
                    .and_then(|response| {
                        let status = response.status();
                        let body = response.into_string().map_err(|err| ClientError::Transport {
                            url: url.to_owned(),
                            message: format!("failed to read body: {err}"),
                        })?;
                        Ok(TransferResponse { status, body })
                    });
                let _ = outcome_tx.send(Outcome::Http(result));
            });

            loop {
                match outcome_rx.recv() {
                    Ok(Outcome::Http(result)) => break result,
                    Ok(Outcome::Copied(Err(err))) => break Err(err),
                    Ok(Outcome::Copied(Ok(bytes))) => {
                        log::debug!("producer finished after {bytes} bytes");
                    }
                    Ok(Outcome::Detached) => {}
                    Err(_) => {
                        break Err(ClientError::Transport {
                            url: url.to_owned(),
                            message: "transfer workers exited without an outcome".to_owned(),
                        })
                    }
                }
            }
        })
    }
}

fn produce<R: Read>(
    mut source: R,
    mut writer: PipeWriter,
    total: u64,
    chunk_size: usize,
    progress: Option<Progress<'_>>,
    outcome_tx: mpsc::Sender<Outcome>,
) {
    let result =
        copy_with_progress(&mut source, &mut writer, total, chunk_size, progress).and_then(|copied| {
            if copied == total {
                Ok(copied)
            } else {
                Err(ClientError::copy_failure(format!(
                    "source ended after {copied} of {total} bytes"
                )))
            }
        });
    match result {
        Ok(copied) => {
            drop(writer);
            let _ = outcome_tx.send(Outcome::Copied(Ok(copied)));
        }
        Err(_) if writer.is_closed() => {
            let _ = outcome_tx.send(Outcome::Detached);
        }
        Err(err) => {
            // Queue the copy error before failing the reader so it is seen first.
            let reason = err.to_string();
            let _ = outcome_tx.send(Outcome::Copied(Err(err)));
            writer.abort(reason);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    struct FailingReader {
        remaining: usize,
    }

    impl Read for FailingReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if self.remaining == 0 {
                return Err(io::Error::other("disk unplugged"));
            }
            let count = self.remaining.min(buf.len());
            buf[..count].fill(7);
            self.remaining -= count;
            Ok(count)
        }
    }

    struct HalfWriter;

    impl Write for HalfWriter {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            Ok(buf.len() / 2)
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn progress_is_monotonic_and_ends_at_total() {
        let data = vec![1u8; 100_000];
        let mut sink = Vec::new();
        let mut seen = Vec::new();
        let mut record = |done: u64, total: u64| seen.push((done, total));

        let copied =
            copy_with_progress(&mut Cursor::new(&data), &mut sink, 100_000, 32 * 1024, Some(&mut record))
                .unwrap();

        assert_eq!(copied, 100_000);
        assert_eq!(sink, data);
        assert_eq!(seen.len(), 4);
        assert!(seen.windows(2).all(|pair| pair[0].0 < pair[1].0));
        assert_eq!(seen.last(), Some(&(100_000, 100_000)));
    }

    #[test]
    fn read_error_aborts_the_copy() {
        let mut sink = Vec::new();
        let err = copy_with_progress(&mut FailingReader { remaining: 10 }, &mut sink, 100, 4, None)
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::CopyFailure);
        assert!(err.to_string().contains("disk unplugged"));
        assert_eq!(sink.len(), 10);
    }

    #[test]
    fn short_write_aborts_immediately() {
        let mut calls = 0;
        let mut count = |_: u64, _: u64| calls += 1;
        let err = copy_with_progress(
            &mut Cursor::new(vec![0u8; 64]),
            &mut HalfWriter,
            64,
            16,
            Some(&mut count),
        )
        .unwrap_err();
        assert!(matches!(err, ClientError::ShortWrite { written: 8, expected: 16 }));
        assert_eq!(calls, 0);
    }

    #[test]
    fn oversized_source_is_rejected_before_writing() {
        let mut sink = Vec::new();
        let err = copy_with_progress(&mut Cursor::new(vec![0u8; 20]), &mut sink, 10, 32, None)
            .unwrap_err();
        assert_eq!(err.kind(), crate::ErrorKind::CopyFailure);
        assert!(sink.is_empty());
    }

    #[test]
    fn empty_source_copies_nothing_and_reports_nothing() {
        let mut calls = 0;
        let mut count = |_: u64, _: u64| calls += 1;
        let mut sink = Vec::new();
        let copied =
            copy_with_progress(&mut io::empty(), &mut sink, 0, 32, Some(&mut count)).unwrap();
        assert_eq!(copied, 0);
        assert_eq!(calls, 0);
    }
}
