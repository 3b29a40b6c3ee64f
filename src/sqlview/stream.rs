//! Lazy row stream over a CSV response body

use crate::decode::{CsvOptions, CsvRowDecoder};
use crate::error::{Error, Result};
use crate::types::Row;
use bytes::Bytes;
use futures::Stream;
use pin_project_lite::pin_project;
use std::collections::VecDeque;
use std::pin::Pin;
use std::task::{ready, Context, Poll};
use tracing::debug;

pin_project! {
    /// Rows decoded from a byte stream as the bytes arrive
    ///
    /// The body is dropped as soon as it is exhausted or fails, which
    /// releases the underlying connection.
    pub struct RowStream<S> {
        #[pin]
        body: Option<S>,
        decoder: CsvRowDecoder,
        ready: VecDeque<Row>,
        done: bool,
    }
}

impl<S> RowStream<S> {
    /// Wrap a byte stream
    pub fn new(body: S, options: CsvOptions) -> Self {
        Self {
            body: Some(body),
            decoder: CsvRowDecoder::new(options),
            ready: VecDeque::new(),
            done: false,
        }
    }

    /// True once the body has been released
    pub fn is_released(&self) -> bool {
        self.body.is_none()
    }

    /// Header row, once it has been read
    pub fn headers(&self) -> Option<&[String]> {
        self.decoder.headers()
    }
}

impl<S, E> Stream for RowStream<S>
where
    S: Stream<Item = std::result::Result<Bytes, E>>,
    E: Into<Error>,
{
    type Item = Result<Row>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut this = self.project();

        loop {
            if let Some(row) = this.ready.pop_front() {
                return Poll::Ready(Some(Ok(row)));
            }
            if *this.done {
                return Poll::Ready(None);
            }

            let Some(body) = this.body.as_mut().as_pin_mut() else {
                *this.done = true;
                continue;
            };

            let failure = match ready!(body.poll_next(cx)) {
                Some(Ok(chunk)) => match this.decoder.feed(&chunk) {
                    Ok(rows) => {
                        this.ready.extend(rows);
                        continue;
                    }
                    Err(e) => e,
                },
                Some(Err(e)) => e.into(),
                None => {
                    this.body.set(None);
                    *this.done = true;
                    match this.decoder.finish() {
                        Ok(rows) => {
                            debug!("SQL view body exhausted");
                            this.ready.extend(rows);
                            continue;
                        }
                        Err(e) => e,
                    }
                }
            };

            this.body.set(None);
            this.ready.clear();
            *this.done = true;
            return Poll::Ready(Some(Err(failure)));
        }
    }
}
