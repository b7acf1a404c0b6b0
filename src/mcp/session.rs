//! Line-oriented session loop over an input and output stream

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, BufReader, Split};
use tokio::sync::watch;

use super::dispatcher::{DispatchOutcome, McpHandler};
use super::protocol::{decode_line, encode_response, Decoded, McpResponse};
use crate::error::{Result, ToolwireError};

/// Why a session ended without error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEnd {
    /// The input stream was exhausted
    Eof,
    /// The shutdown signal fired between messages
    Cancelled,
}

/// Counters for one session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    pub requests: u64,
    pub notifications: u64,
    pub dropped: u64,
}

/// MCP server driving one client connection
pub struct McpServer<H>
where
    H: McpHandler,
{
    handler: H,
    stats: SessionStats,
}

impl<H: McpHandler> McpServer<H> {
    /// Create a new MCP server
    pub fn new(handler: H) -> Self {
        Self {
            handler,
            stats: SessionStats::default(),
        }
    }

    pub fn stats(&self) -> SessionStats {
        self.stats
    }

    /// Run the server on process stdin/stdout
    pub async fn run_stdio(&mut self, shutdown: watch::Receiver<bool>) -> Result<SessionEnd> {
        let stdin = BufReader::new(tokio::io::stdin());
        let stdout = tokio::io::stdout();
        self.run(stdin, stdout, shutdown).await
    }

    /// Serve messages until the input ends or `shutdown` becomes `true`.
    ///
    /// Messages are processed strictly one at a time. The shutdown signal is
    /// only observed while waiting for the next line, never mid-dispatch.
    pub async fn run<R, W>(
        &mut self,
        reader: R,
        mut writer: W,
        mut shutdown: watch::Receiver<bool>,
    ) -> Result<SessionEnd>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let mut lines = reader.split(b'\n');

        loop {
            if *shutdown.borrow() {
                return Ok(SessionEnd::Cancelled);
            }

            let line = tokio::select! {
                biased;
                changed = shutdown.changed() => {
                    // A dropped sender can never signal again; keep serving.
                    if changed.is_ok() && *shutdown.borrow() {
                        tracing::info!("Shutdown requested, ending session");
                        return Ok(SessionEnd::Cancelled);
                    }
                    if changed.is_err() {
                        return self.drain(&mut lines, &mut writer).await;
                    }
                    continue;
                }
                line = lines.next_segment() => line?,
            };

            match line {
                Some(raw) => self.process_raw(raw, &mut writer).await?,
                None => {
                    tracing::info!(stats = ?self.stats, "Input closed, ending session");
                    return Ok(SessionEnd::Eof);
                }
            }
        }
    }

    /// Serve the rest of the input once no shutdown can arrive anymore
    async fn drain<R, W>(
        &mut self,
        lines: &mut Split<R>,
        writer: &mut W,
    ) -> Result<SessionEnd>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        while let Some(raw) = lines.next_segment().await? {
            self.process_raw(raw, writer).await?;
        }
        tracing::info!(stats = ?self.stats, "Input closed, ending session");
        Ok(SessionEnd::Eof)
    }

    /// Bytes that are not UTF-8 are peer noise like any other unreadable line
    async fn process_raw<W>(&mut self, raw: Vec<u8>, writer: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        match String::from_utf8(raw) {
            Ok(line) => self.process_line(&line, writer).await,
            Err(err) => {
                tracing::warn!("Dropping non UTF-8 line: {}", err.utf8_error());
                self.stats.dropped += 1;
                Ok(())
            }
        }
    }

    async fn process_line<W>(&mut self, line: &str, writer: &mut W) -> Result<()>
    where
        W: AsyncWrite + Unpin,
    {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            return Ok(());
        }

        let response = match decode_line(trimmed) {
            Ok(Decoded::Envelope(envelope)) => match self.handler.handle(&envelope) {
                DispatchOutcome::Responded(response) => {
                    self.stats.requests += 1;
                    response
                }
                DispatchOutcome::Suppressed => {
                    self.stats.notifications += 1;
                    return Ok(());
                }
            },
            Ok(Decoded::Invalid { id, reason }) => {
                tracing::warn!(%id, "Invalid request: {}", reason);
                self.stats.requests += 1;
                McpResponse::from_error(id, ToolwireError::InvalidRequest(reason))
            }
            Err(err) => {
                tracing::warn!("Dropping unreadable message: {}", err);
                self.stats.dropped += 1;
                return Ok(());
            }
        };

        write_line(writer, &encode_response(&response)?).await
    }
}

async fn write_line<W>(writer: &mut W, line: &str) -> Result<()>
where
    W: AsyncWrite + Unpin,
{
    writer.write_all(line.as_bytes()).await?;
    writer.write_all(b"\n").await?;
    writer.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::context::ServerContext;
    use crate::mcp::dispatcher::Dispatcher;
    use crate::mcp::protocol::Envelope;
    use serde_json::{json, Value};

    fn server() -> McpServer<Dispatcher> {
        McpServer::new(Dispatcher::new(ServerContext::builder("t", "0").build()))
    }

    async fn run_input(input: &str) -> (SessionEnd, Vec<Value>, SessionStats) {
        run_bytes(input.as_bytes()).await
    }

    async fn run_bytes(input: &[u8]) -> (SessionEnd, Vec<Value>, SessionStats) {
        let (_tx, rx) = watch::channel(false);
        let mut server = server();
        let mut output = Vec::new();
        let end = server.run(input, &mut output, rx).await.unwrap();
        let lines = String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|l| serde_json::from_str(l).unwrap())
            .collect();
        (end, lines, server.stats())
    }

    #[tokio::test]
    async fn test_eof_ends_session() {
        let (end, lines, _) = run_input("").await;
        assert_eq!(end, SessionEnd::Eof);
        assert!(lines.is_empty());
    }

    #[tokio::test]
    async fn test_request_notification_and_noise() {
        let input = concat!(
            "{\"jsonrpc\":\"2.0\",\"method\":\"notifications/initialized\"}\n",
            "not json at all\n",
            "\n",
            "{\"jsonrpc\":\"2.0\",\"id\":\"a\",\"method\":\"ping\"}\n",
        );
        let (end, lines, stats) = run_input(input).await;
        assert_eq!(end, SessionEnd::Eof);
        assert_eq!(lines, vec![json!({"jsonrpc": "2.0", "id": "a", "result": {}})]);
        assert_eq!(
            stats,
            SessionStats {
                requests: 1,
                notifications: 1,
                dropped: 1
            }
        );
    }

    #[tokio::test]
    async fn test_invalid_utf8_line_is_dropped() {
        let mut input = b"{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n".to_vec();
        input.extend_from_slice(b"\xff\xfe garbage\r\n");
        input.extend_from_slice(b"{\"jsonrpc\":\"2.0\",\"id\":2,\"method\":\"ping\"}\r\n");

        let (end, lines, stats) = run_bytes(&input).await;
        assert_eq!(end, SessionEnd::Eof);
        let ids: Vec<Value> = lines.iter().map(|l| l["id"].clone()).collect();
        assert_eq!(ids, vec![json!(1), json!(2)]);
        assert_eq!(stats.dropped, 1);
        assert_eq!(stats.requests, 2);
    }

    #[tokio::test]
    async fn test_final_line_without_newline_is_served() {
        let (_, lines, _) = run_input("{\"jsonrpc\":\"2.0\",\"id\":9,\"method\":\"ping\"}").await;
        assert_eq!(lines, vec![json!({"jsonrpc": "2.0", "id": 9, "result": {}})]);
    }

    #[tokio::test]
    async fn test_invalid_envelope_with_id_gets_invalid_request() {
        let (_, lines, _) = run_input("{\"jsonrpc\":\"1.0\",\"id\":5,\"method\":\"ping\"}\n").await;
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0]["id"], json!(5));
        assert_eq!(lines[0]["error"]["code"], json!(-32600));
    }

    #[tokio::test]
    async fn test_shutdown_before_start() {
        let (tx, rx) = watch::channel(false);
        tx.send(true).unwrap();
        let mut output = Vec::new();
        let line = serde_json::to_string(&Envelope::request(json!(1), "ping", None)).unwrap();
        let end = server().run(line.as_bytes(), &mut output, rx).await.unwrap();
        assert_eq!(end, SessionEnd::Cancelled);
        assert!(output.is_empty());
    }

    #[tokio::test]
    async fn test_shutdown_while_waiting_for_input() {
        let (tx, rx) = watch::channel(false);
        let (client, server_side) = tokio::io::duplex(1024);
        let (read_half, _write_half) = tokio::io::split(server_side);
        let _client = client;

        let handle = tokio::spawn(async move {
            let mut output = Vec::new();
            server()
                .run(BufReader::new(read_half), &mut output, rx)
                .await
        });

        tx.send(true).unwrap();
        let end = handle.await.unwrap().unwrap();
        assert_eq!(end, SessionEnd::Cancelled);
    }

    #[tokio::test]
    async fn test_dropped_shutdown_sender_keeps_serving() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let mut output = Vec::new();
        let input = "{\"jsonrpc\":\"2.0\",\"id\":1,\"method\":\"ping\"}\n";
        let end = server().run(input.as_bytes(), &mut output, rx).await.unwrap();
        assert_eq!(end, SessionEnd::Eof);
        assert_eq!(String::from_utf8(output).unwrap().lines().count(), 1);
    }
}
