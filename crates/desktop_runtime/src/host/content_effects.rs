use futures::StreamExt;
use tracing::debug;

use super::{DesktopHostContext, DispatchOnDrop};
use crate::{
    generation::GenerationRequest, reducer::SessionAction, runtime_context::DesktopRuntime,
};

/// Streams one generation, forwarding fragments until the stream closes, fails, or the generation
/// is superseded. Dropping the stream on supersession cancels the underlying request.
pub(super) fn stream_content(
    host: &DesktopHostContext,
    runtime: &DesktopRuntime,
    request: GenerationRequest,
) {
    let generation_id = request.generation_id;
    if !runtime.is_generation_current(generation_id) {
        debug!(?generation_id, "generation superseded before streaming; skipping request");
        return;
    }
    let mut stream = host
        .content_stream_service()
        .stream_content(&request.history, request.max_history_length);
    let mut guard = DispatchOnDrop::new(
        runtime.downgrade(),
        SessionAction::GenerationAbandoned { generation_id },
    );
    let weak = runtime.downgrade();

    host.spawn(
        "content-stream",
        Box::pin(async move {
            while let Some(item) = stream.next().await {
                let Some(runtime) = weak.upgrade() else {
                    return;
                };
                if !runtime.is_generation_current(generation_id) {
                    debug!(?generation_id, "generation superseded; cancelling stream");
                    guard.disarm();
                    return;
                }
                match item {
                    Ok(fragment) => runtime.dispatch_action(SessionAction::ContentFragment {
                        generation_id,
                        fragment,
                    }),
                    Err(message) => {
                        guard.disarm();
                        runtime.dispatch_action(SessionAction::GenerationFailed {
                            generation_id,
                            message,
                        });
                        return;
                    }
                }
            }

            guard.disarm();
            if let Some(runtime) = weak.upgrade() {
                runtime.dispatch_action(SessionAction::GenerationCompleted { generation_id });
            }
        }),
    );
}
