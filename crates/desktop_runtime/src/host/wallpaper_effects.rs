use std::{rc::Rc, time::Duration};

use platform_host::IntervalTick;
use tracing::debug;

use super::{DesktopHostContext, DispatchOnDrop};
use crate::{
    reducer::SessionAction, runtime_context::DesktopRuntime, wallpaper::WallpaperRequestId,
};

pub(super) fn generate_wallpaper(
    host: &DesktopHostContext,
    runtime: &DesktopRuntime,
    request_id: WallpaperRequestId,
    prompt: String,
) {
    if !runtime.is_wallpaper_request_current(request_id) {
        debug!(?request_id, "wallpaper request no longer in flight; skipping generation");
        return;
    }
    let images = host.image_generation_service();
    let mut guard = DispatchOnDrop::new(
        runtime.downgrade(),
        SessionAction::WallpaperAbandoned { request_id },
    );
    let weak = runtime.downgrade();

    host.spawn(
        "wallpaper",
        Box::pin(async move {
            let result = images.generate_image(&prompt).await;
            guard.disarm();
            if let Some(runtime) = weak.upgrade() {
                runtime.dispatch_action(SessionAction::WallpaperGenerated { request_id, result });
            }
        }),
    );
}

/// Installs the refresh schedule. Replacing an existing handle drops and thereby cancels it.
pub(super) fn start_refresh(host: &DesktopHostContext, runtime: &DesktopRuntime, period: Duration) {
    let weak = runtime.downgrade();
    let tick: IntervalTick = Rc::new(move || {
        if let Some(runtime) = weak.upgrade() {
            runtime.request_wallpaper(None);
        }
    });
    let handle = host.scheduler().set_interval(period, tick);
    if host.replace_wallpaper_refresh(Some(handle)).is_some() {
        debug!("replaced existing wallpaper refresh schedule");
    }
    debug!(?period, "wallpaper refresh scheduled");
}

pub(super) fn stop_refresh(host: &DesktopHostContext) {
    if let Some(handle) = host.replace_wallpaper_refresh(None) {
        handle.cancel();
        debug!("wallpaper refresh cancelled");
    }
}
