//! Streaming support for adapter responses
//!
//! Two regimes share the one streaming contract. Backends with genuine
//! incremental delivery have each frame normalized independently and
//! forwarded in arrival order. Single-completion backends get their one full
//! result wrapped into a one-increment stream. Neither regime assembles
//! partial tool-call arguments across increments: the bridged adapter only
//! ever emits whole tool calls per increment (guaranteed by its step cap),
//! and the native backend emits whole function-call parts per frame.

pub mod sse;

pub use sse::DataFrameParser;

use futures::stream;

use super::ResponseStream;
use crate::content::UnifiedResponse;

/// Satisfy the streaming contract for a backend that returns one complete
/// result per call: exactly one increment, then the end of the stream.
#[must_use]
pub fn single_increment(response: UnifiedResponse) -> ResponseStream {
    Box::pin(stream::once(async move { Ok(response) }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::{ContentPart, FinishReason};
    use futures::StreamExt;

    fn canned_response() -> UnifiedResponse {
        UnifiedResponse {
            parts: vec![ContentPart::text("done")],
            finish_reason: FinishReason::Stop,
            usage: None,
            error: None,
        }
    }

    #[tokio::test]
    async fn test_single_increment_then_completion() {
        let mut stream = single_increment(canned_response());

        let first = stream.next().await.expect("one increment").unwrap();
        assert_eq!(first.text_content(), "done");
        assert!(stream.next().await.is_none());
    }

    #[tokio::test]
    async fn test_abandoning_the_stream_is_quiet() {
        let mut stream = single_increment(canned_response());
        let _ = stream.next().await;
        drop(stream);
    }
}
