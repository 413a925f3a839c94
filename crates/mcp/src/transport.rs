//! Stdio message framing.
//!
//! Messages are normally newline-delimited JSON. A `Content-Length:` header
//! block followed by a blank line is accepted as well, and replies are
//! written back in whichever framing the request used.

use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader};

use crate::error::{Error, Result};

const CONTENT_LENGTH: &str = "content-length:";

/// How a message was delimited on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Framing {
    /// One JSON document per line.
    #[default]
    Line,
    /// `Content-Length: N\r\n\r\n` followed by N bytes.
    ContentLength,
}

/// A single decoded message.
#[derive(Debug, Clone)]
pub struct Frame {
    pub framing: Framing,
    pub payload: String,
}

/// Reads framed messages from an async byte stream.
pub struct FrameReader<R> {
    inner: BufReader<R>,
    max_size: usize,
}

impl<R: AsyncRead + Unpin> FrameReader<R> {
    pub fn new(reader: R, max_size: usize) -> Self {
        Self {
            inner: BufReader::new(reader),
            max_size,
        }
    }

    /// Read the next message. Returns `Ok(None)` on EOF.
    ///
    /// Oversized, non-UTF-8 or badly framed input is consumed and reported as
    /// [`Error::MessageTooLarge`] or [`Error::InvalidMessage`] so the caller
    /// can keep reading.
    pub async fn next_frame(&mut self) -> Result<Option<Frame>> {
        loop {
            let Some(line) = self.read_line().await? else {
                return Ok(None);
            };

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }

            if let Some(length) = parse_content_length(trimmed) {
                let length = length?;
                return self.read_sized(length).await.map(Some);
            }

            return Ok(Some(Frame {
                framing: Framing::Line,
                payload: trimmed.to_string(),
            }));
        }
    }

    /// Read one line, holding at most `max_size` bytes of it in memory.
    async fn read_line(&mut self) -> Result<Option<String>> {
        let limit = self.max_size as u64 + 1;
        let mut buf = Vec::new();
        if (&mut self.inner).take(limit).read_until(b'\n', &mut buf).await? == 0 {
            return Ok(None);
        }

        if buf.len() > self.max_size && buf.last() != Some(&b'\n') {
            let mut size = buf.len();
            loop {
                buf.clear();
                let n = (&mut self.inner).take(limit).read_until(b'\n', &mut buf).await?;
                size += n;
                if n == 0 || buf.last() == Some(&b'\n') {
                    break;
                }
            }
            return Err(Error::MessageTooLarge {
                size,
                max: self.max_size,
            });
        }

        String::from_utf8(buf)
            .map(Some)
            .map_err(|e| Error::InvalidMessage(format!("message is not UTF-8: {e}")))
    }

    async fn read_sized(&mut self, length: usize) -> Result<Frame> {
        // Skip any remaining headers up to the blank separator line.
        loop {
            let Some(header) = self.read_line().await? else {
                return Err(Error::InvalidMessage(
                    "unexpected EOF in message headers".to_string(),
                ));
            };
            if header.trim().is_empty() {
                break;
            }
        }

        if length > self.max_size {
            let mut discard = (&mut self.inner).take(length as u64);
            tokio::io::copy(&mut discard, &mut tokio::io::sink()).await?;
            return Err(Error::MessageTooLarge {
                size: length,
                max: self.max_size,
            });
        }

        let mut body = vec![0u8; length];
        self.inner.read_exact(&mut body).await?;
        let payload = String::from_utf8(body)
            .map_err(|e| Error::InvalidMessage(format!("message is not UTF-8: {e}")))?;

        Ok(Frame {
            framing: Framing::ContentLength,
            payload,
        })
    }
}

fn parse_content_length(line: &str) -> Option<Result<usize>> {
    let prefix = line.get(..CONTENT_LENGTH.len())?;
    if !prefix.eq_ignore_ascii_case(CONTENT_LENGTH) {
        return None;
    }
    let value = line[CONTENT_LENGTH.len()..].trim();
    Some(
        value
            .parse()
            .map_err(|_| Error::InvalidMessage(format!("bad Content-Length: {value}"))),
    )
}

/// Write one message using the given framing and flush.
pub async fn write_frame<W>(writer: &mut W, framing: Framing, payload: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    match framing {
        Framing::Line => {
            writer.write_all(payload.as_bytes()).await?;
            writer.write_all(b"\n").await?;
        }
        Framing::ContentLength => {
            let header = format!("Content-Length: {}\r\n\r\n", payload.len());
            writer.write_all(header.as_bytes()).await?;
            writer.write_all(payload.as_bytes()).await?;
        }
    }
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn reads_line_delimited_messages() {
        let input: &[u8] = b"{\"a\":1}\n\n{\"b\":2}\n";
        let mut reader = FrameReader::new(input, 1024);

        let first = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(first.framing, Framing::Line);
        assert_eq!(first.payload, "{\"a\":1}");

        let second = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(second.payload, "{\"b\":2}");

        assert!(reader.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn reads_content_length_messages() {
        let body = r#"{"jsonrpc":"2.0","id":1,"method":"ping"}"#;
        let raw = format!(
            "Content-Length: {}\r\nContent-Type: application/json\r\n\r\n{body}",
            body.len()
        );
        let mut reader = FrameReader::new(raw.as_bytes(), 1024);

        let frame = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(frame.framing, Framing::ContentLength);
        assert_eq!(frame.payload, body);
        assert!(reader.next_frame().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn oversized_message_is_skipped() {
        let raw = format!("Content-Length: 20\r\n\r\n{}{{\"ok\":true}}\n", "x".repeat(20));
        let mut reader = FrameReader::new(raw.as_bytes(), 16);

        let err = reader.next_frame().await.unwrap_err();
        assert!(matches!(err, Error::MessageTooLarge { size: 20, max: 16 }));

        let next = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(next.payload, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn writes_both_framings() {
        let mut out = Vec::new();
        write_frame(&mut out, Framing::Line, "{}").await.unwrap();
        write_frame(&mut out, Framing::ContentLength, "{}").await.unwrap();
        assert_eq!(out, b"{}\nContent-Length: 2\r\n\r\n{}");
    }

    #[tokio::test]
    async fn long_line_is_skipped_without_buffering_it() {
        let raw = format!("{}\n{{\"ok\":true}}\n", "x".repeat(100));
        let mut reader = FrameReader::new(raw.as_bytes(), 16);

        let err = reader.next_frame().await.unwrap_err();
        assert!(matches!(err, Error::MessageTooLarge { size: 101, max: 16 }));

        let next = reader.next_frame().await.unwrap().unwrap();
        assert_eq!(next.payload, "{\"ok\":true}");
    }

    #[tokio::test]
    async fn line_of_exactly_max_size_is_accepted() {
        let raw = format!("{}\n", "y".repeat(16));
        let mut reader = FrameReader::new(raw.as_bytes(), 16);
        assert_eq!(reader.next_frame().await.unwrap().unwrap().payload, "y".repeat(16));
    }

    #[tokio::test]
    async fn bad_input_is_reported_and_reading_continues() {
        let mut raw = b"{\"x\":\"".to_vec();
        raw.extend_from_slice(&[0xff, 0xfe]);
        raw.extend_from_slice(b"\"}\nContent-Length: abc\n{\"ok\":1}\n");
        let mut reader = FrameReader::new(raw.as_slice(), 1024);

        let err = reader.next_frame().await.unwrap_err();
        assert!(matches!(err, Error::InvalidMessage(ref m) if m.contains("UTF-8")));

        let err = reader.next_frame().await.unwrap_err();
        assert!(matches!(err, Error::InvalidMessage(ref m) if m.contains("Content-Length")));

        assert_eq!(reader.next_frame().await.unwrap().unwrap().payload, "{\"ok\":1}");
        assert!(reader.next_frame().await.unwrap().is_none());
    }
}
