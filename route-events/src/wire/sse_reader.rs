/********************************************************************************
 * Copyright (c) 2024 Contributors to the Eclipse Foundation
 *
 * See the NOTICE file(s) distributed with this work for additional
 * information regarding copyright ownership.
 *
 * This program and the accompanying materials are made available under the
 * terms of the Apache License Version 2.0 which is available at
 * https://www.apache.org/licenses/LICENSE-2.0
 *
 * SPDX-License-Identifier: Apache-2.0
 ********************************************************************************/

//! Line-based `text/event-stream` reader over a byte stream.

use super::{RawEvent, RawEventSource};
use crate::error::{BoxError, StreamError};
use crate::observability::events;
use crate::trace::{self, TraceSink};
use async_trait::async_trait;
use bytes::Bytes;
use futures::{Stream, StreamExt};
use std::mem;
use std::pin::Pin;
use std::sync::Arc;
use tracing::debug;

const COMPONENT: &str = "sse_reader";
const DEFAULT_EVENT_NAME: &str = "message";

/// Type-erased body of a streaming response.
pub type ByteStream = Pin<Box<dyn Stream<Item = Result<Bytes, BoxError>> + Send>>;

enum ReaderState {
    Open(ByteStream),
    Ended,
    Closed,
}

#[derive(Default)]
struct PendingFrame {
    name: Option<String>,
    data: Vec<String>,
    id: Option<String>,
    retry: Option<u64>,
}

impl PendingFrame {
    fn apply_line(&mut self, line: &str) -> Result<(), StreamError> {
        if line.starts_with(':') {
            return Ok(());
        }

        let (field, value) = match line.split_once(':') {
            Some((field, value)) => (field, value.strip_prefix(' ').unwrap_or(value)),
            None => (line, ""),
        };

        match field {
            "event" => self.name = Some(value.to_string()),
            "data" => self.data.push(value.to_string()),
            "id" => self.id = Some(value.to_string()),
            "retry" => {
                let retry = value.parse::<u64>().map_err(|_| {
                    StreamError::Framing(format!("invalid retry value '{value}'"))
                })?;
                self.retry = Some(retry);
            }
            _ => {}
        }
        Ok(())
    }

    /// Yields the frame when it carried a name or data, resetting state either way.
    fn dispatch(&mut self) -> Option<RawEvent> {
        let frame = mem::take(self);
        if frame.name.is_none() && frame.data.is_empty() {
            return None;
        }

        Some(RawEvent {
            name: frame
                .name
                .unwrap_or_else(|| DEFAULT_EVENT_NAME.to_string()),
            data: frame.data.join("\n").into_bytes(),
            id: frame.id,
            retry: frame.retry,
        })
    }
}

/// Reads frames from one streaming HTTP response.
pub struct SseEventReader {
    state: ReaderState,
    buffer: Vec<u8>,
    trace: Option<Arc<dyn TraceSink>>,
}

impl SseEventReader {
    pub fn new(stream: ByteStream, trace: Option<Arc<dyn TraceSink>>) -> Self {
        Self {
            state: ReaderState::Open(stream),
            buffer: Vec::new(),
            trace,
        }
    }

    /// Wraps any chunked byte stream, boxing its errors.
    pub fn from_stream<S, E>(stream: S, trace: Option<Arc<dyn TraceSink>>) -> Self
    where
        S: Stream<Item = Result<Bytes, E>> + Send + 'static,
        E: Into<BoxError>,
    {
        Self::new(Box::pin(stream.map(|chunk| chunk.map_err(Into::into))), trace)
    }

    /// Splits one line off the buffer. A trailing `\r` is held back until the next
    /// chunk shows whether it starts a `\r\n` pair.
    fn take_line(&mut self) -> Result<Option<String>, StreamError> {
        let Some(end) = self
            .buffer
            .iter()
            .position(|byte| *byte == b'\n' || *byte == b'\r')
        else {
            return Ok(None);
        };

        let terminator_len = match self.buffer[end] {
            b'\r' if end + 1 == self.buffer.len() => return Ok(None),
            b'\r' if self.buffer[end + 1] == b'\n' => 2,
            _ => 1,
        };

        let line: Vec<u8> = self.buffer.drain(..end + terminator_len).take(end).collect();
        String::from_utf8(line)
            .map(Some)
            .map_err(|err| StreamError::Framing(format!("line is not valid UTF-8: {err}")))
    }

    async fn next_line(&mut self) -> Result<Option<String>, StreamError> {
        loop {
            if let Some(line) = self.take_line()? {
                return Ok(Some(line));
            }

            let stream = match &mut self.state {
                ReaderState::Open(stream) => stream,
                ReaderState::Ended => return Ok(None),
                ReaderState::Closed => return Err(StreamError::Closed),
            };

            match stream.next().await {
                Some(Ok(chunk)) => self.buffer.extend_from_slice(&chunk),
                Some(Err(err)) => {
                    self.state = ReaderState::Ended;
                    return Err(StreamError::Connection(err));
                }
                None => {
                    // A lone `\r` at the very end still terminates its line.
                    if self.buffer.last() == Some(&b'\r') {
                        self.buffer.push(b'\n');
                        self.state = ReaderState::Ended;
                        continue;
                    }
                    self.state = ReaderState::Ended;
                    return Ok(None);
                }
            }
        }
    }

    async fn read_frame(&mut self) -> Result<RawEvent, StreamError> {
        if matches!(self.state, ReaderState::Closed) {
            return Err(StreamError::Closed);
        }

        let mut frame = PendingFrame::default();
        loop {
            let Some(line) = self.next_line().await? else {
                if !self.buffer.is_empty() || frame.name.is_some() || !frame.data.is_empty() {
                    debug!(
                        event = events::STREAM_PARTIAL_FRAME_DROPPED,
                        component = COMPONENT,
                        "stream ended inside a frame"
                    );
                }
                self.buffer.clear();
                return Err(StreamError::Eof);
            };

            if line.is_empty() {
                if let Some(event) = frame.dispatch() {
                    return Ok(event);
                }
                continue;
            }

            frame.apply_line(&line)?;
        }
    }
}

#[async_trait]
impl RawEventSource for SseEventReader {
    async fn next(&mut self) -> Result<RawEvent, StreamError> {
        let event = self.read_frame().await?;
        if let Some(sink) = self.trace.as_deref() {
            trace::trace_event(sink, &event);
        }
        Ok(event)
    }

    async fn close(&mut self) -> Result<(), StreamError> {
        self.state = ReaderState::Closed;
        self.buffer.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trace::WriterTraceSink;
    use futures::stream;
    use std::io;

    fn reader_from_chunks(chunks: &[&'static str]) -> SseEventReader {
        let chunks: Vec<Result<Bytes, io::Error>> = chunks
            .iter()
            .map(|chunk| Ok(Bytes::from_static(chunk.as_bytes())))
            .collect();
        SseEventReader::from_stream(stream::iter(chunks), None)
    }

    #[tokio::test]
    async fn reads_named_frame_with_data() {
        let mut reader = reader_from_chunks(&["event: Upsert\ndata: {\"route\":\"a.b\"}\n\n"]);

        let event = reader.next().await.expect("frame should parse");

        assert_eq!(event, RawEvent::new("Upsert", br#"{"route":"a.b"}"#.to_vec()));
    }

    #[tokio::test]
    async fn joins_data_lines_and_keeps_id_and_retry() {
        let mut reader =
            reader_from_chunks(&["id: 7\nretry: 1500\nevent: Delete\ndata: {\ndata: }\n\n"]);

        let event = reader.next().await.expect("frame should parse");

        assert_eq!(event.name, "Delete");
        assert_eq!(event.data, b"{\n}".to_vec());
        assert_eq!(event.id.as_deref(), Some("7"));
        assert_eq!(event.retry, Some(1500));
    }

    #[tokio::test]
    async fn reassembles_frames_split_across_chunks_and_crlf() {
        let mut reader = reader_from_chunks(&[
            "event: Ups",
            "ert\r",
            "\ndata: {}\r\n",
            "\r\nevent: Delete\rdata: {}\r\r",
        ]);

        assert_eq!(reader.next().await.unwrap().name, "Upsert");
        assert_eq!(reader.next().await.unwrap().name, "Delete");
        assert!(matches!(reader.next().await, Err(StreamError::Eof)));
    }

    #[tokio::test]
    async fn skips_comments_and_empty_frames() {
        let mut reader = reader_from_chunks(&[": keep-alive\n\nid: 1\n\ndata: x\n\n"]);

        let event = reader.next().await.expect("frame should parse");

        assert_eq!(event.name, DEFAULT_EVENT_NAME);
        assert_eq!(event.data, b"x".to_vec());
    }

    #[tokio::test]
    async fn yields_n_frames_then_one_terminal_error() {
        let mut reader = reader_from_chunks(&[
            "event: Upsert\ndata: 1\n\n",
            "event: Upsert\ndata: 2\n\n",
            "event: Delete\ndata: 3\n\n",
        ]);

        for _ in 0..3 {
            assert!(reader.next().await.is_ok());
        }
        assert!(matches!(reader.next().await, Err(StreamError::Eof)));
        assert!(matches!(reader.next().await, Err(StreamError::Eof)));
    }

    #[tokio::test]
    async fn empty_stream_ends_immediately() {
        let mut reader = reader_from_chunks(&[]);

        assert!(matches!(reader.next().await, Err(StreamError::Eof)));
    }

    #[tokio::test]
    async fn drops_partial_frame_at_end_of_stream() {
        let mut reader = reader_from_chunks(&["event: Upsert\ndata: {}"]);

        assert!(matches!(reader.next().await, Err(StreamError::Eof)));
    }

    #[tokio::test]
    async fn invalid_retry_is_a_framing_error() {
        let mut reader = reader_from_chunks(&["retry: soon\n\n"]);

        assert!(matches!(reader.next().await, Err(StreamError::Framing(_))));
    }

    #[tokio::test]
    async fn transport_error_is_terminal_connection_error() {
        let chunks: Vec<Result<Bytes, io::Error>> = vec![
            Ok(Bytes::from_static(b"event: Upsert\n")),
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer")),
        ];
        let mut reader = SseEventReader::from_stream(stream::iter(chunks), None);

        let err = reader.next().await.expect_err("read should fail");
        assert!(matches!(err, StreamError::Connection(_)));
        assert!(err.to_string().contains("reset by peer"));
    }

    #[tokio::test]
    async fn next_after_close_fails_deterministically() {
        let mut reader = reader_from_chunks(&["event: Upsert\ndata: {}\n\n"]);

        reader.close().await.expect("close should succeed");

        assert!(matches!(reader.next().await, Err(StreamError::Closed)));
        assert!(reader.close().await.is_ok());
        assert!(matches!(reader.next().await, Err(StreamError::Closed)));
    }

    #[tokio::test]
    async fn trace_sink_receives_each_frame() {
        let sink = Arc::new(WriterTraceSink::new(Vec::new()));
        let chunks: Vec<Result<Bytes, io::Error>> =
            vec![Ok(Bytes::from_static(b"event: Upsert\ndata: {\"ip\":\"1.2.3.4\"}\n\n"))];
        let mut reader = SseEventReader::from_stream(stream::iter(chunks), Some(sink.clone()));

        reader.next().await.expect("frame should parse");
        drop(reader);

        let sink = Arc::try_unwrap(sink).ok().expect("reader released the sink");
        let dump = String::from_utf8(sink.into_inner()).unwrap();
        assert!(dump.contains("EVENT: ["));
        assert!(dump.contains(r#""name":"Upsert""#));
    }
}
