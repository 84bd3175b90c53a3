//! Output capture for one dispatch.
//!
//! Handlers contribute to the response in two ways: by returning a [`Reply`],
//! and by streaming text through [`HandlerContext::echo`](crate::HandlerContext::echo).
//! [`OutputCapture`] decides where streamed text goes and, once matching and
//! escalation are over, folds any buffered text into the response according
//! to the [`CaptureMode`].

use switchyard_core::{CaptureMode, SwitchyardResult};
use switchyard_http::{Response, Transport};

use crate::signal::Reply;

/// Per-dispatch output state.
#[derive(Debug)]
pub struct OutputCapture {
    mode: CaptureMode,
    discard: bool,
    buffer: String,
    overridden: bool,
}

impl OutputCapture {
    /// Creates the capture state for a dispatch.
    ///
    /// With `discard` set (a `HEAD` request), streamed output that would have
    /// gone to the transport is dropped instead.
    pub const fn new(mode: CaptureMode, discard: bool) -> Self {
        Self {
            mode,
            discard,
            buffer: String::new(),
            overridden: false,
        }
    }

    /// The active mode.
    pub const fn mode(&self) -> CaptureMode {
        self.mode
    }

    /// Text buffered so far. Always empty in [`CaptureMode::Direct`].
    pub fn buffered(&self) -> &str {
        &self.buffer
    }

    /// Routes one chunk of streamed output.
    pub fn write(&mut self, chunk: &str, transport: &mut dyn Transport) -> SwitchyardResult<()> {
        if self.mode.is_capturing() {
            self.buffer.push_str(chunk);
            Ok(())
        } else if self.discard {
            Ok(())
        } else {
            transport.write_output(chunk)
        }
    }

    /// Applies a handler's return value to the response.
    ///
    /// Replies are ignored while the response is locked. In
    /// [`CaptureMode::CaptureAndReplace`] text replies never reach the body,
    /// while a full response replacement discards what was streamed before it.
    pub fn absorb(&mut self, reply: Reply, response: &mut Response) -> SwitchyardResult<()> {
        if response.is_locked() {
            if reply != Reply::None {
                tracing::debug!("response locked, reply ignored");
            }
            return Ok(());
        }
        match reply {
            Reply::None => Ok(()),
            Reply::Text(_) if self.mode == CaptureMode::CaptureAndReplace => Ok(()),
            Reply::Text(text) => response.append(&text),
            Reply::Response(replacement) => {
                if self.mode == CaptureMode::CaptureAndReplace {
                    self.buffer.clear();
                    self.overridden = true;
                }
                response.replace_with(replacement)
            }
        }
    }

    /// Folds buffered output into the response.
    ///
    /// Returns the buffer for [`CaptureMode::CaptureAndReturn`], `None`
    /// otherwise. A locked response is left as it is.
    pub fn finish(&mut self, response: &mut Response) -> SwitchyardResult<Option<String>> {
        let buffer = std::mem::take(&mut self.buffer);
        if self.mode == CaptureMode::CaptureAndReturn {
            return Ok(Some(buffer));
        }
        if response.is_locked() {
            return Ok(None);
        }
        match self.mode {
            CaptureMode::CaptureAndReplace if self.overridden && buffer.is_empty() => {}
            CaptureMode::CaptureAndReplace => response.set_body(buffer)?,
            CaptureMode::CaptureAndPrepend => response.prepend(&buffer)?,
            CaptureMode::CaptureAndAppend => response.append(&buffer)?,
            CaptureMode::Direct | CaptureMode::CaptureAndReturn => {}
        }
        Ok(None)
    }
}
