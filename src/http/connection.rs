use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite};
use tokio::net::TcpStream;

use crate::http::parser::{ParseError, RequestHead, parse_request_head};
use crate::http::request::Request;
use crate::http::writer::ResponseWriter;
use crate::serve::StaticFiles;

/// Request heads larger than this are rejected; bodies are not counted
const MAX_HEAD_SIZE: usize = 64 * 1024;

const READ_CHUNK: usize = 4096;

pub struct Connection<S = TcpStream> {
    stream: S,
    buffer: Vec<u8>,
    state: ConnectionState,
    files: Arc<StaticFiles>,
}

pub enum ConnectionState {
    Reading,
    Processing(Request),
    Writing(ResponseWriter, bool), // bool = keep_alive?
    Closed,
}

impl<S> Connection<S>
where
    S: AsyncRead + AsyncWrite + Unpin,
{
    pub fn new(stream: S, files: Arc<StaticFiles>) -> Self {
        Self {
            stream,
            buffer: Vec::with_capacity(READ_CHUNK),
            state: ConnectionState::Reading,
            files,
        }
    }

    pub async fn run(&mut self) -> anyhow::Result<()> {
        loop {
            match &mut self.state {
                ConnectionState::Reading => {
                    self.state = match self.read_request().await? {
                        Some(req) => ConnectionState::Processing(req),
                        None => ConnectionState::Closed,
                    };
                }

                ConnectionState::Processing(req) => {
                    let response = self.files.handle(req).await;
                    let keep_alive = req.keep_alive();

                    tracing::debug!(
                        method = req.method.as_str(),
                        path = %req.path,
                        status = response.status.as_u16(),
                        bytes = response.body.len(),
                        "Served request"
                    );

                    let writer = ResponseWriter::new(&response);
                    self.state = ConnectionState::Writing(writer, keep_alive);
                }

                ConnectionState::Writing(writer, keep_alive) => {
                    writer.write_to_stream(&mut self.stream).await?;

                    self.state = if *keep_alive {
                        ConnectionState::Reading
                    } else {
                        ConnectionState::Closed
                    };
                }

                ConnectionState::Closed => {
                    break;
                }
            }
        }

        Ok(())
    }

    /// Read until a full request head is buffered; `None` once the client
    /// hangs up.
    ///
    /// The body is read off the stream and dropped, since files are served
    /// the same way whatever the request carries.
    pub async fn read_request(&mut self) -> anyhow::Result<Option<Request>> {
        loop {
            match parse_request_head(&self.buffer) {
                Ok(RequestHead {
                    request,
                    head_len,
                    content_length,
                }) => {
                    self.buffer.drain(..head_len);
                    self.discard_body(content_length).await?;
                    return Ok(Some(request));
                }

                Err(ParseError::Incomplete) => {
                    if self.buffer.len() > MAX_HEAD_SIZE {
                        anyhow::bail!("request head exceeds {} bytes", MAX_HEAD_SIZE);
                    }
                }

                Err(e) => {
                    return Err(anyhow::anyhow!("HTTP parse error: {:?}", e));
                }
            }

            let mut chunk = [0u8; READ_CHUNK];
            let n = self.stream.read(&mut chunk).await?;

            if n == 0 {
                return Ok(None);
            }

            self.buffer.extend_from_slice(&chunk[..n]);
        }
    }

    /// Skip `len` body bytes, first from the buffer and then from the stream.
    ///
    /// Never reads past the body, so a pipelined request behind it stays
    /// on the stream.
    async fn discard_body(&mut self, len: usize) -> anyhow::Result<()> {
        let buffered = self.buffer.len().min(len);
        self.buffer.drain(..buffered);

        let mut remaining = len - buffered;
        let mut chunk = [0u8; READ_CHUNK];
        while remaining > 0 {
            let want = remaining.min(READ_CHUNK);
            let n = self.stream.read(&mut chunk[..want]).await?;

            if n == 0 {
                anyhow::bail!("connection closed with {} body bytes outstanding", remaining);
            }

            remaining -= n;
        }

        Ok(())
    }
}
