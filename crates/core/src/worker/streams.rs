//! Raw readers for the worker's output and diagnostic streams.
//!
//! Both readers are lossy on invalid UTF-8 rather than failing: a stray
//! byte from a native library must not end the stream.

use std::pin::Pin;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, BufReader};
use tokio_stream::Stream;
use tracing::warn;

/// Read size for the diagnostic stream.
const CHUNK_SIZE: usize = 4096;

/// Stream of text items read from a worker pipe.
pub type TextStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Split a byte stream into lines, without their `\n` / `\r\n` terminators.
///
/// A final unterminated line is still yielded. The stream ends at EOF or on
/// the first read error.
pub fn lines<R>(reader: R) -> TextStream
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut reader = BufReader::new(reader);
        let mut buf = Vec::new();

        loop {
            buf.clear();
            match reader.read_until(b'\n', &mut buf).await {
                Ok(0) => break,
                Ok(_) => {
                    if buf.last() == Some(&b'\n') {
                        buf.pop();
                        if buf.last() == Some(&b'\r') {
                            buf.pop();
                        }
                    }
                    yield String::from_utf8_lossy(&buf).into_owned();
                }
                Err(e) => {
                    warn!(error = %e, "worker output stream read failed");
                    break;
                }
            }
        }
    };

    Box::pin(stream)
}

/// Yield text in the chunks the OS delivers them.
///
/// Chunks are not line-aligned. A multi-byte character split across two
/// reads is held back until it is complete.
pub fn chunks<R>(reader: R) -> TextStream
where
    R: AsyncRead + Unpin + Send + 'static,
{
    let stream = async_stream::stream! {
        let mut reader = reader;
        let mut buf = vec![0u8; CHUNK_SIZE];
        let mut pending: Vec<u8> = Vec::new();

        loop {
            let n = match reader.read(&mut buf).await {
                Ok(n) => n,
                Err(e) => {
                    warn!(error = %e, "worker diagnostic stream read failed");
                    0
                }
            };

            if n == 0 {
                if !pending.is_empty() {
                    yield String::from_utf8_lossy(&pending).into_owned();
                }
                break;
            }

            pending.extend_from_slice(&buf[..n]);
            let complete = complete_utf8_prefix(&pending);
            if complete == 0 {
                continue;
            }

            let rest = pending.split_off(complete);
            let chunk = std::mem::replace(&mut pending, rest);
            yield String::from_utf8_lossy(&chunk).into_owned();
        }
    };

    Box::pin(stream)
}

/// Length of the prefix of `bytes` that doesn't end inside a character.
///
/// Invalid sequences count as complete; only a truncated tail is held back.
fn complete_utf8_prefix(bytes: &[u8]) -> usize {
    match std::str::from_utf8(bytes) {
        Ok(_) => bytes.len(),
        Err(e) if e.error_len().is_none() => e.valid_up_to(),
        Err(_) => bytes.len(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::AsyncWriteExt;
    use tokio_stream::StreamExt;

    #[tokio::test]
    async fn test_lines_strips_terminators() {
        let input: &[u8] = b"one\r\ntwo\n\nthree";
        let collected: Vec<String> = lines(input).collect().await;

        assert_eq!(collected, vec!["one", "two", "", "three"]);
    }

    #[tokio::test]
    async fn test_lines_survive_invalid_utf8() {
        let input: &[u8] = b"ok\n\xff\xfe bad\nafter\n";
        let collected: Vec<String> = lines(input).collect().await;

        assert_eq!(collected.len(), 3);
        assert_eq!(collected[0], "ok");
        assert!(collected[1].ends_with(" bad"));
        assert_eq!(collected[2], "after");
    }

    #[tokio::test]
    async fn test_chunks_hold_back_split_character() {
        let (mut tx, rx) = tokio::io::duplex(64);
        let mut stream = chunks(rx);

        // "é" is 0xC3 0xA9; send it split across two writes
        tx.write_all(b"caf\xc3").await.unwrap();
        tx.flush().await.unwrap();
        let first = stream.next().await.unwrap();
        assert_eq!(first, "caf");

        tx.write_all(b"\xa9 50%").await.unwrap();
        drop(tx);
        let rest: Vec<String> = stream.collect().await;
        assert_eq!(rest.concat(), "é 50%");
    }

    #[test]
    fn test_complete_utf8_prefix() {
        assert_eq!(complete_utf8_prefix(b"abc"), 3);
        assert_eq!(complete_utf8_prefix(b"ab\xc3"), 2);
        assert_eq!(complete_utf8_prefix(b"\xff\xfe"), 2);
        assert_eq!(complete_utf8_prefix(b""), 0);
    }
}
