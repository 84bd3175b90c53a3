//! Output transports.
//!
//! The router never writes to a socket itself. Streamed handler output and the
//! final response go through a [`Transport`], so the same router can sit behind
//! a real server, a plain writer, or an in-memory buffer in tests.

use std::io::Write;

use switchyard_core::SwitchyardResult;

use crate::response::Response;

/// Where handler output and finished responses go.
pub trait Transport {
    /// Passes a chunk of streamed handler output straight through.
    fn write_output(&mut self, chunk: &str) -> SwitchyardResult<()>;

    /// Delivers a finished response.
    fn send(&mut self, response: &Response) -> SwitchyardResult<()>;
}

/// A transport that keeps everything in memory.
#[derive(Debug, Default, Clone)]
pub struct BufferedTransport {
    output: String,
    sent: Vec<Response>,
}

impl BufferedTransport {
    /// Creates an empty buffer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the streamed output written so far.
    pub fn output(&self) -> &str {
        &self.output
    }

    /// Takes the streamed output, leaving the buffer empty.
    pub fn take_output(&mut self) -> String {
        std::mem::take(&mut self.output)
    }

    /// Returns every response sent through this transport.
    pub fn sent(&self) -> &[Response] {
        &self.sent
    }

    /// Returns the most recently sent response.
    pub fn last_sent(&self) -> Option<&Response> {
        self.sent.last()
    }
}

impl Transport for BufferedTransport {
    fn write_output(&mut self, chunk: &str) -> SwitchyardResult<()> {
        self.output.push_str(chunk);
        Ok(())
    }

    fn send(&mut self, response: &Response) -> SwitchyardResult<()> {
        self.sent.push(response.clone());
        Ok(())
    }
}

/// A transport that serializes to any [`Write`] as HTTP/1.1 text.
#[derive(Debug)]
pub struct WriterTransport<W: Write> {
    writer: W,
}

impl<W: Write> WriterTransport<W> {
    /// Wraps a writer.
    pub const fn new(writer: W) -> Self {
        Self { writer }
    }

    /// Returns a reference to the underlying writer.
    pub const fn get_ref(&self) -> &W {
        &self.writer
    }

    /// Unwraps the underlying writer.
    pub fn into_inner(self) -> W {
        self.writer
    }
}

impl<W: Write> Transport for WriterTransport<W> {
    fn write_output(&mut self, chunk: &str) -> SwitchyardResult<()> {
        self.writer.write_all(chunk.as_bytes())?;
        Ok(())
    }

    fn send(&mut self, response: &Response) -> SwitchyardResult<()> {
        write!(self.writer, "{}\r\n", response.status_line())?;
        for (name, value) in response.headers() {
            if *name == http::header::CONTENT_LENGTH {
                continue;
            }
            write!(self.writer, "{name}: ")?;
            self.writer.write_all(value.as_bytes())?;
            self.writer.write_all(b"\r\n")?;
        }
        write!(self.writer, "content-length: {}\r\n\r\n", response.body().len())?;
        self.writer.write_all(response.body().as_bytes())?;
        self.writer.flush()?;
        Ok(())
    }
}
