//! # Cursor to Server Stream Bridge
//!
//! Store cursors are pulled, gRPC server streams are pushed. The bridge spawns a task that pulls
//! one document at a time, encodes it and sends it into a bounded channel whose receiving half is
//! handed to `tonic` as the response stream.
//!
//! ## Protocol
//!
//! * Documents are emitted in cursor order, each one encoded with
//!   [`encode_document`](crate::codec::encode_document).
//! * The channel is bounded, so the cursor is never polled while the consumer is behind.
//! * Cursor exhaustion drops the sender, which ends the stream cleanly.
//! * A cursor error is sent as one terminal `Err(Status)` and nothing is read afterwards.
//! * When the peer goes away the receiver is dropped. The task notices on the next send, or while
//!   waiting on the cursor, and drops the cursor right away.
use crate::{codec::encode_document, service::ProxyError, store::DocumentCursor};
use futures_util::StreamExt;
use mongo_grpc_proto::pb::bson as wire;
use tokio::sync::mpsc;
use tokio_stream::wrappers::ReceiverStream;
use tonic::Status;
use tracing::{debug, error};

/// Channel capacity used when none is configured.
pub const DEFAULT_STREAM_CAPACITY: usize = 16;

pub type DocumentStream = ReceiverStream<Result<wire::Document, Status>>;

/// How a forwarding task finished.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Completion {
    /// The cursor was exhausted.
    Exhausted,
    /// The cursor failed and the error was forwarded.
    Failed,
    /// The consumer went away first.
    Cancelled,
}

/// Adapts `cursor` to a server stream backed by a channel of `capacity` slots.
pub fn bridge(cursor: DocumentCursor, capacity: usize) -> DocumentStream {
    let (tx, rx) = mpsc::channel(capacity.max(1));

    tokio::spawn(async move {
        let (completion, emitted) = forward(cursor, tx).await;
        debug!(?completion, emitted, "Find stream finished");
    });

    ReceiverStream::new(rx)
}

/// Moves documents from `cursor` to `tx` until one side is done.
///
/// Returns how the transfer ended and how many documents were sent.
pub(crate) async fn forward(
    mut cursor: DocumentCursor,
    tx: mpsc::Sender<Result<wire::Document, Status>>,
) -> (Completion, usize) {
    let mut emitted = 0;

    loop {
        let next = tokio::select! {
            biased;
            _ = tx.closed() => return (Completion::Cancelled, emitted),
            next = cursor.next() => next,
        };

        match next {
            Some(Ok(document)) => {
                if tx.send(Ok(encode_document(document))).await.is_err() {
                    return (Completion::Cancelled, emitted);
                }
                emitted += 1;
            }
            Some(Err(err)) => {
                error!(error = %err, emitted, "Cursor failed mid-stream");
                let status = Status::from(ProxyError::Stream(err));
                // A consumer that already left does not need the error either
                let _ = tx.send(Err(status)).await;
                return (Completion::Failed, emitted);
            }
            None => return (Completion::Exhausted, emitted),
        }
    }
}
