//! In-process prompt handling.

use async_trait::async_trait;
use skein_events::LocalReceiver;
use std::sync::Arc;
use tracing::{debug, trace, warn};

use crate::broker::PermissionBroker;
use crate::error::ApprovalError;
use crate::request::{ConfirmRequest, ConfirmResponse, ConfirmScope, Decision};

/// Presents confirmation prompts to the user.
///
/// Hosts that prompt in the same process implement this and hand it to
/// [`PermissionBroker::serve`]. Hosts with an out-of-process UI instead read
/// requests off the channel themselves and call
/// [`PermissionBroker::handle_payload`].
#[async_trait]
pub trait ConfirmHandler: Send + Sync {
    /// Show the prompt and wait for the user.
    ///
    /// Returns `None` if the prompt was dismissed without an answer.
    async fn confirm(&self, request: &ConfirmRequest) -> Option<ConfirmResponse>;
}

impl PermissionBroker {
    /// Answer requests arriving on `receiver` with `handler`.
    ///
    /// Each request is handled on its own task so a slow prompt does not
    /// hold up the others. A dismissed prompt resolves to
    /// [`Decision::AskAgain`]. Returns when the receiver closes.
    pub async fn serve(
        self: Arc<Self>,
        handler: Arc<dyn ConfirmHandler>,
        mut receiver: LocalReceiver,
    ) {
        while let Some(envelope) = receiver.recv().await {
            if envelope.stream != self.options().confirm_stream {
                trace!(stream = %envelope.stream, "ignoring envelope for another stream");
                continue;
            }
            let request: ConfirmRequest = match serde_json::from_value(envelope.payload)
                .map_err(ApprovalError::MalformedRequest)
            {
                Ok(request) => request,
                Err(e) => {
                    warn!(error = %e, "ignoring confirmation request");
                    continue;
                },
            };

            let broker = Arc::clone(&self);
            let handler = Arc::clone(&handler);
            tokio::spawn(async move {
                let response = match handler.confirm(&request).await {
                    Some(response) => response,
                    None => request.respond(Decision::AskAgain, ConfirmScope::Once),
                };
                broker.handle_response(response);
            });
        }
        debug!("confirmation receiver closed");
    }
}
