//! A bounded in-memory byte pipe between a producer thread and a reader
//! handed to the HTTP client as a request body.

use std::io::{self, Read, Write};
use std::sync::mpsc::{sync_channel, Receiver, SyncSender};

enum Frame {
    Data(Vec<u8>),
    Abort(String),
}

/// Creates a pipe holding at most `capacity` unread chunks.
pub fn pipe(capacity: usize) -> (PipeWriter, PipeReader) {
    let (sender, receiver) = sync_channel(capacity.max(1));
    let reader = PipeReader { receiver, pending: Vec::new(), offset: 0, aborted: None };
    (PipeWriter { sender, closed: false }, reader)
}

pub struct PipeWriter {
    sender: SyncSender<Frame>,
    closed: bool,
}

impl PipeWriter {
    /// Whether a write found the reader gone.
    pub fn is_closed(&self) -> bool {
        self.closed
    }

    /// Makes the reader fail with `reason` once it has drained earlier chunks.
    pub fn abort(self, reason: impl Into<String>) {
        // The reader may already be gone; nothing is waiting on it then.
        let _ = self.sender.send(Frame::Abort(reason.into()));
    }
}

impl Write for PipeWriter {
    /// Queues the whole buffer as one chunk, blocking while the pipe is full.
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        if self.sender.send(Frame::Data(buf.to_vec())).is_err() {
            self.closed = true;
            return Err(io::Error::new(io::ErrorKind::BrokenPipe, "pipe reader closed"));
        }
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Yields queued chunks in order. Returns end of stream once the writer is
/// dropped and every chunk has been read.
pub struct PipeReader {
    receiver: Receiver<Frame>,
    pending: Vec<u8>,
    offset: usize,
    aborted: Option<String>,
}

impl Read for PipeReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if buf.is_empty() {
            return Ok(0);
        }
        loop {
            if let Some(reason) = &self.aborted {
                return Err(io::Error::other(reason.clone()));
            }
            if self.offset < self.pending.len() {
                let available = &self.pending[self.offset..];
                let count = available.len().min(buf.len());
                buf[..count].copy_from_slice(&available[..count]);
                self.offset += count;
                return Ok(count);
            }
            match self.receiver.recv() {
                Ok(Frame::Data(chunk)) => {
                    self.pending = chunk;
                    self.offset = 0;
                }
                Ok(Frame::Abort(reason)) => self.aborted = Some(reason),
                Err(_) => return Ok(0),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::thread;
    use std::time::{Duration, Instant};

    fn wait_for(counter: &AtomicUsize, expected: usize) {
        let deadline = Instant::now() + Duration::from_secs(5);
        while counter.load(Ordering::SeqCst) < expected {
            assert!(Instant::now() < deadline, "writer stalled before {expected} chunks");
            thread::sleep(Duration::from_millis(5));
        }
    }

    #[test]
    fn bytes_arrive_in_order_across_small_reads() {
        let (mut writer, mut reader) = pipe(2);
        let producer = thread::spawn(move || {
            for chunk in [b"hello ".as_slice(), b"pipe", b" world"] {
                writer.write_all(chunk).unwrap();
            }
        });

        let mut received = Vec::new();
        let mut buf = [0u8; 3];
        loop {
            let read = reader.read(&mut buf).unwrap();
            if read == 0 {
                break;
            }
            received.extend_from_slice(&buf[..read]);
        }
        producer.join().unwrap();
        assert_eq!(received, b"hello pipe world");
    }

    #[test]
    fn writer_stays_at_most_capacity_chunks_ahead() {
        let (mut writer, mut reader) = pipe(2);
        let written = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&written);
        let producer = thread::spawn(move || {
            for chunk in [b"a", b"b", b"c", b"d"] {
                writer.write_all(chunk).unwrap();
                counter.fetch_add(1, Ordering::SeqCst);
            }
        });

        wait_for(&written, 2);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(written.load(Ordering::SeqCst), 2);

        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 1);
        assert_eq!(&buf[..1], b"a");
        wait_for(&written, 3);
        thread::sleep(Duration::from_millis(100));
        assert_eq!(written.load(Ordering::SeqCst), 3);

        let mut rest = Vec::new();
        reader.read_to_end(&mut rest).unwrap();
        producer.join().unwrap();
        assert_eq!(rest, b"bcd");
        assert_eq!(written.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn abort_surfaces_as_read_error_after_queued_data() {
        let (mut writer, mut reader) = pipe(4);
        writer.write_all(b"abc").unwrap();
        writer.abort("source vanished");

        let mut buf = [0u8; 8];
        assert_eq!(reader.read(&mut buf).unwrap(), 3);
        let err = reader.read(&mut buf).unwrap_err();
        assert_eq!(err.to_string(), "source vanished");
        assert!(reader.read(&mut buf).is_err());
    }

    #[test]
    fn writing_after_reader_drop_is_a_broken_pipe() {
        let (mut writer, reader) = pipe(1);
        drop(reader);
        let err = writer.write(b"x").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::BrokenPipe);
        assert!(writer.is_closed());
    }
}
