mod support;

use std::io::{self, Cursor, Read};

use gphoto_client::{ClientConfig, ClientError, ErrorKind, HttpContext, Uploader};
use support::{completion_body, MockServer, Reply};

const TEN_MIB: usize = 10 * 1024 * 1024;
const CHUNK: usize = 32 * 1024;

fn http() -> HttpContext {
    HttpContext::new(&ClientConfig::default())
}

/// Yields `good` bytes, then fails.
struct BrokenSource {
    good: usize,
}

impl Read for BrokenSource {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.good == 0 {
            return Err(io::Error::other("medium error"));
        }
        let count = self.good.min(buf.len());
        buf[..count].fill(0xAB);
        self.good -= count;
        Ok(count)
    }
}

#[test]
fn ten_mib_streams_in_chunks_with_monotonic_progress() {
    let server = MockServer::start(1, |request, _| {
        assert_eq!(request.method, "POST");
        assert_eq!(request.header("content-type"), Some("application/octet-stream"));
        assert_eq!(request.header("content-length"), Some("10485760"));
        assert_eq!(request.body.len(), TEN_MIB);
        Reply::ok(completion_body("tok"))
    });

    let data: Vec<u8> = (0..TEN_MIB).map(|index| (index % 251) as u8).collect();
    let mut seen = Vec::new();
    let mut record = |done: u64, total: u64| seen.push((done, total));

    let http = http();
    let response = Uploader::new(&http, CHUNK, 8)
        .transfer(&server.url("/put"), Cursor::new(data.clone()), TEN_MIB as u64, Some(&mut record))
        .unwrap();

    assert_eq!(response.status, 200);
    let requests = server.finish();
    assert_eq!(requests[0].body, data);

    assert!(!seen.is_empty() && seen.len() <= 320);
    assert!(seen.windows(2).all(|pair| pair[0].0 < pair[1].0));
    assert!(seen.iter().all(|(_, total)| *total == TEN_MIB as u64));
    assert_eq!(seen.last().map(|(done, _)| *done), Some(TEN_MIB as u64));

    let mut previous = 0;
    let delta_sum: u64 = seen
        .iter()
        .map(|(done, _)| {
            let delta = done - previous;
            previous = *done;
            delta
        })
        .sum();
    assert_eq!(delta_sum, TEN_MIB as u64);
}

#[test]
fn error_status_wins_even_when_the_producer_finished() {
    let server = MockServer::start(1, |request, _| {
        assert_eq!(request.body.len(), 4096);
        Reply::status(500, "backend unavailable")
    });

    let mut last = 0;
    let mut record = |done: u64, _: u64| last = done;
    let http = http();
    let err = Uploader::new(&http, 1024, 2)
        .transfer(&server.url("/put"), Cursor::new(vec![7u8; 4096]), 4096, Some(&mut record))
        .unwrap_err();

    assert!(matches!(err, ClientError::Status { status: 500, ref body, .. } if body == "backend unavailable"));
    assert_eq!(err.kind(), ErrorKind::TransportFailure);
    assert_eq!(last, 4096);
    server.finish();
}

#[test]
fn source_failure_is_reported_instead_of_the_http_outcome() {
    let server = MockServer::start(1, |_, _| Reply::ok(completion_body("never used")));

    let http = http();
    let err = Uploader::new(&http, CHUNK, 4)
        .transfer(&server.url("/put"), BrokenSource { good: 3 * CHUNK }, 8 * CHUNK as u64, None)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CopyFailure);
    assert!(err.to_string().contains("medium error"));
    server.finish();
}

#[test]
fn short_source_fails_instead_of_stalling_the_request() {
    let server = MockServer::start(1, |_, _| Reply::ok(completion_body("never used")));

    let http = http();
    let err = Uploader::new(&http, 256, 4)
        .transfer(&server.url("/put"), Cursor::new(vec![1u8; 600]), 1000, None)
        .unwrap_err();

    assert_eq!(err.kind(), ErrorKind::CopyFailure);
    assert!(err.to_string().contains("600 of 1000"));
    server.finish();
}
