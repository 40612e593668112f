//! Long-lived runtime handle wiring the session reducer to host services.
//!
//! [`DesktopRuntime`] owns the session state, the crash RNG, the effect queue, and the snapshot
//! observers. Every inbound operation becomes a [`SessionAction`]; the reducer runs with the
//! session borrowed, the borrow is released, observers see the new [`DesktopSnapshot`], and only
//! then are the resulting effects executed. Tasks and timers hold [`WeakDesktopRuntime`] handles,
//! so dropping the last runtime handle tears everything down.

use std::{
    cell::RefCell,
    rc::{Rc, Weak},
};

use platform_host::{HostServices, InteractionRecord};
use rand::{rngs::StdRng, SeedableRng};
use tracing::{info, warn};

use crate::{
    config::{ConfigError, RuntimeConfig},
    effect_executor::EffectQueue,
    generation::GenerationId,
    host::DesktopHostContext,
    model::{DesktopSession, DesktopSnapshot},
    reducer::{reduce_session, ReducerError, SessionAction},
    wallpaper::{prompt_for_hour, WallpaperRequestId},
};

/// Callback invoked with every changed [`DesktopSnapshot`].
pub type SnapshotObserver = Rc<dyn Fn(&DesktopSnapshot)>;

struct RuntimeInner {
    host: DesktopHostContext,
    session: RefCell<DesktopSession>,
    rng: RefCell<StdRng>,
    effects: EffectQueue,
    observers: RefCell<Vec<SnapshotObserver>>,
    last_published: RefCell<Option<DesktopSnapshot>>,
}

#[derive(Clone)]
/// Shared handle to one desktop session.
pub struct DesktopRuntime {
    inner: Rc<RuntimeInner>,
}

#[derive(Clone)]
/// Non-owning [`DesktopRuntime`] handle held by tasks and timers.
pub struct WeakDesktopRuntime {
    inner: Weak<RuntimeInner>,
}

impl WeakDesktopRuntime {
    pub fn upgrade(&self) -> Option<DesktopRuntime> {
        self.inner.upgrade().map(|inner| DesktopRuntime { inner })
    }
}

impl DesktopRuntime {
    /// Builds a runtime from validated configuration and injected host services.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `config` fails validation.
    pub fn new(config: RuntimeConfig, services: HostServices) -> Result<Self, ConfigError> {
        config.validate()?;
        let rng = match config.crash_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let session = DesktopSession::new(config.catalog(), config.session_settings());
        info!(
            apps = session.catalog.apps().len(),
            max_history_length = session.history.max_length(),
            statefulness = session.cache.is_enabled(),
            "desktop runtime created"
        );
        Ok(Self {
            inner: Rc::new(RuntimeInner {
                host: DesktopHostContext::new(services),
                session: RefCell::new(session),
                rng: RefCell::new(rng),
                effects: EffectQueue::default(),
                observers: RefCell::new(Vec::new()),
                last_published: RefCell::new(None),
            }),
        })
    }

    /// Publishes the initial snapshot and requests the first wallpaper.
    pub fn boot(&self) {
        self.publish(self.snapshot());
        self.request_wallpaper(None);
    }

    /// Dispatches an action, logging (rather than returning) reducer errors.
    pub fn dispatch_action(&self, action: SessionAction) {
        if let Err(err) = self.apply(action) {
            warn!("desktop reducer error: {err}");
        }
    }

    /// Opens `app_id`, serving cached content or starting a generation.
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError::UnknownApp`] when the id is not in the catalog.
    pub fn open_app(&self, app_id: &str) -> Result<(), ReducerError> {
        self.apply(SessionAction::OpenApp {
            app_id: app_id.to_string(),
        })
    }

    pub fn submit_interaction(&self, record: InteractionRecord) {
        self.dispatch_action(SessionAction::SubmitInteraction(record));
    }

    pub fn close_app(&self) {
        self.dispatch_action(SessionAction::CloseApp);
    }

    /// Changes the history bound, truncating the ledger immediately.
    ///
    /// # Errors
    ///
    /// Returns [`ReducerError::InvalidHistoryLength`] for values above 10; the bound is unchanged.
    pub fn set_max_history_length(&self, length: usize) -> Result<(), ReducerError> {
        self.apply(SessionAction::SetMaxHistoryLength { length })
    }

    pub fn set_statefulness(&self, enabled: bool) {
        self.dispatch_action(SessionAction::SetStatefulness { enabled });
    }

    /// Requests a wallpaper; a missing or blank prompt uses the time-of-day default.
    pub fn request_wallpaper(&self, prompt: Option<&str>) {
        let prompt = prompt
            .map(str::trim)
            .filter(|prompt| !prompt.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| prompt_for_hour(self.inner.host.clock().local_hour()));
        self.dispatch_action(SessionAction::RequestWallpaper { prompt });
    }

    pub fn set_auto_wallpaper(&self, enabled: bool) {
        self.dispatch_action(SessionAction::SetAutoWallpaper { enabled });
    }

    pub fn snapshot(&self) -> DesktopSnapshot {
        self.inner.session.borrow().snapshot()
    }

    /// Registers `observer` for every subsequent snapshot change.
    pub fn subscribe(&self, observer: impl Fn(&DesktopSnapshot) + 'static) {
        self.inner.observers.borrow_mut().push(Rc::new(observer));
    }

    pub fn downgrade(&self) -> WeakDesktopRuntime {
        WeakDesktopRuntime {
            inner: Rc::downgrade(&self.inner),
        }
    }

    pub fn host(&self) -> &DesktopHostContext {
        &self.inner.host
    }

    pub(crate) fn is_generation_current(&self, generation_id: GenerationId) -> bool {
        self.inner
            .session
            .borrow()
            .generation
            .is_current(generation_id)
    }

    pub(crate) fn is_wallpaper_request_current(&self, request_id: WallpaperRequestId) -> bool {
        self.inner.session.borrow().wallpaper.in_flight() == Some(request_id)
    }

    fn apply(&self, action: SessionAction) -> Result<(), ReducerError> {
        let (effects, snapshot) = {
            let mut session = self.inner.session.borrow_mut();
            let mut rng = self.inner.rng.borrow_mut();
            let effects = reduce_session(&mut session, action, &mut *rng)?;
            (effects, session.snapshot())
        };
        self.publish(snapshot);
        self.inner.effects.run(self, effects);
        Ok(())
    }

    fn publish(&self, snapshot: DesktopSnapshot) {
        {
            let mut last = self.inner.last_published.borrow_mut();
            if last.as_ref() == Some(&snapshot) {
                return;
            }
            *last = Some(snapshot.clone());
        }
        let observers = self.inner.observers.borrow().clone();
        for observer in observers {
            observer(&snapshot);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, collections::VecDeque, time::Duration};

    use futures::{
        channel::{mpsc, oneshot},
        executor::LocalPool,
        stream::StreamExt,
    };
    use platform_host::{
        ContentStream, ContentStreamService, FixedLocalClock, ImageGenerationFuture,
        ImageGenerationService, ManualIntervalScheduler, MemoryContentStreamService,
        MemoryImageGenerationService, PLACEHOLDER_PNG_BASE64,
    };
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        generation::{STREAM_ERROR_FRAGMENT, STREAM_FAILURE_MESSAGE},
        model::SessionState,
        wallpaper::WALLPAPER_FAILURE_MESSAGE,
    };

    type Fragment = Result<String, String>;

    #[derive(Default)]
    /// Content service whose streams are fed by the test through channels.
    struct ChannelContentService {
        pending: RefCell<VecDeque<mpsc::UnboundedReceiver<Fragment>>>,
        calls: Cell<usize>,
    }

    impl ChannelContentService {
        fn next_stream(&self) -> mpsc::UnboundedSender<Fragment> {
            let (tx, rx) = mpsc::unbounded();
            self.pending.borrow_mut().push_back(rx);
            tx
        }
    }

    impl ContentStreamService for ChannelContentService {
        fn stream_content(
            &self,
            _history: &[InteractionRecord],
            _max_history_length: usize,
        ) -> ContentStream {
            self.calls.set(self.calls.get() + 1);
            match self.pending.borrow_mut().pop_front() {
                Some(rx) => rx.boxed_local(),
                None => futures::stream::empty().boxed_local(),
            }
        }
    }

    #[derive(Default)]
    /// Image service whose answers are released by the test.
    struct GatedImageService {
        gates: RefCell<VecDeque<oneshot::Receiver<Fragment>>>,
        calls: Cell<usize>,
    }

    impl GatedImageService {
        fn next_gate(&self) -> oneshot::Sender<Fragment> {
            let (tx, rx) = oneshot::channel();
            self.gates.borrow_mut().push_back(rx);
            tx
        }
    }

    impl ImageGenerationService for GatedImageService {
        fn generate_image<'a>(&'a self, _prompt: &'a str) -> ImageGenerationFuture<'a, Fragment> {
            self.calls.set(self.calls.get() + 1);
            let gate = self.gates.borrow_mut().pop_front();
            Box::pin(async move {
                match gate {
                    Some(gate) => gate.await.unwrap_or_else(|_| Err("gate dropped".to_string())),
                    None => futures::future::pending().await,
                }
            })
        }
    }

    struct Harness {
        pool: LocalPool,
        runtime: DesktopRuntime,
        scheduler: ManualIntervalScheduler,
    }

    impl Harness {
        fn new(
            config: RuntimeConfig,
            content: Rc<dyn ContentStreamService>,
            images: Rc<dyn ImageGenerationService>,
        ) -> Self {
            let pool = LocalPool::new();
            let scheduler = ManualIntervalScheduler::default();
            let services = HostServices::headless(Rc::new(pool.spawner()))
                .with_content(content)
                .with_images(images)
                .with_scheduler(Rc::new(scheduler.clone()))
                .with_clock(Rc::new(FixedLocalClock::new(9)));
            let runtime = DesktopRuntime::new(config, services).expect("runtime");
            Self {
                pool,
                runtime,
                scheduler,
            }
        }

        fn settle(&mut self) {
            self.pool.run_until_stalled();
        }

        fn record_snapshots(&self) -> Rc<RefCell<Vec<DesktopSnapshot>>> {
            let seen = Rc::new(RefCell::new(Vec::new()));
            let sink = seen.clone();
            self.runtime
                .subscribe(move |snapshot| sink.borrow_mut().push(snapshot.clone()));
            seen
        }
    }

    fn seeded_config() -> RuntimeConfig {
        RuntimeConfig {
            crash_seed: Some(7),
            ..RuntimeConfig::default()
        }
    }

    #[test]
    fn streamed_fragments_publish_progressive_content() {
        let content = MemoryContentStreamService::default();
        content.push_fragments(["<p>Hello", " World</p>"]);
        let mut harness = Harness::new(
            seeded_config(),
            Rc::new(content.clone()),
            Rc::new(MemoryImageGenerationService::default()),
        );
        let seen = harness.record_snapshots();

        harness.runtime.open_app("notepad").expect("open");
        harness.settle();

        let transitions: Vec<(String, bool)> = seen
            .borrow()
            .iter()
            .map(|s| (s.content.clone(), s.loading))
            .collect();
        assert_eq!(
            transitions,
            vec![
                (String::new(), true),
                ("<p>Hello".to_string(), true),
                ("<p>Hello World</p>".to_string(), true),
                ("<p>Hello World</p>".to_string(), false),
            ]
        );
        let requests = content.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(
            requests[0].history,
            vec![InteractionRecord::app_open("notepad", "Notepad")]
        );
        assert_eq!(requests[0].max_history_length, 3);
    }

    #[test]
    fn failing_stream_without_fragments_clears_loading() {
        let content = MemoryContentStreamService::default();
        content.push_script(vec![Err("503".to_string())]);
        let mut harness = Harness::new(
            seeded_config(),
            Rc::new(content),
            Rc::new(MemoryImageGenerationService::default()),
        );

        harness.runtime.open_app("notepad").expect("open");
        assert!(harness.runtime.snapshot().loading);
        harness.settle();

        let snapshot = harness.runtime.snapshot();
        assert!(!snapshot.loading);
        assert_eq!(snapshot.content, STREAM_ERROR_FRAGMENT);
        assert_eq!(snapshot.error.as_deref(), Some(STREAM_FAILURE_MESSAGE));
    }

    #[test]
    fn observer_reopening_an_app_skips_the_superseded_stream_request() {
        let content = MemoryContentStreamService::default();
        let mut harness = Harness::new(
            seeded_config(),
            Rc::new(content.clone()),
            Rc::new(MemoryImageGenerationService::default()),
        );
        let weak = harness.runtime.downgrade();
        let switched = Cell::new(false);
        harness.runtime.subscribe(move |snapshot| {
            if snapshot.active_app.as_deref() == Some("notepad") && !switched.replace(true) {
                if let Some(runtime) = weak.upgrade() {
                    runtime.open_app("documents").expect("reopen");
                }
            }
        });

        harness.runtime.open_app("notepad").expect("open");
        harness.settle();

        let requested: Vec<Option<String>> = content
            .requests()
            .iter()
            .map(|request| request.history[0].app_context.clone())
            .collect();
        assert_eq!(requested, vec![Some("documents".to_string())]);
        let snapshot = harness.runtime.snapshot();
        assert_eq!(snapshot.active_app.as_deref(), Some("documents"));
        assert!(!snapshot.loading);
    }

    #[test]
    fn cached_path_is_served_without_calling_the_stream() {
        let content = MemoryContentStreamService::default();
        content.push_fragments(["<p>Notepad</p>"]);
        content.push_fragments(["<p>Saved</p>"]);
        let config = RuntimeConfig {
            statefulness_enabled: true,
            ..seeded_config()
        };
        let mut harness = Harness::new(
            config,
            Rc::new(content.clone()),
            Rc::new(MemoryImageGenerationService::default()),
        );
        let save = InteractionRecord::click("save", "Save").in_app("notepad");

        harness.runtime.open_app("notepad").expect("open");
        harness.settle();
        harness.runtime.submit_interaction(save.clone());
        harness.settle();
        assert_eq!(content.request_count(), 2);

        harness.runtime.close_app();
        harness.runtime.open_app("notepad").expect("reopen");
        let seen = harness.record_snapshots();
        harness.runtime.submit_interaction(save);
        harness.settle();

        assert_eq!(content.request_count(), 2);
        let seen = seen.borrow();
        assert!(seen.iter().all(|snapshot| !snapshot.loading));
        let last = seen.last().expect("published");
        assert_eq!(last.path_key.as_deref(), Some("notepad__save"));
        assert_eq!(last.content, "<p>Saved</p>");
    }

    #[test]
    fn latest_generation_wins_for_the_same_path() {
        let content = Rc::new(ChannelContentService::default());
        let first = content.next_stream();
        let second = content.next_stream();
        let config = RuntimeConfig {
            statefulness_enabled: true,
            ..seeded_config()
        };
        let mut harness = Harness::new(
            config,
            content.clone(),
            Rc::new(MemoryImageGenerationService::default()),
        );

        harness.runtime.open_app("notepad").expect("open");
        harness.settle();
        first
            .unbounded_send(Ok("<p>old".to_string()))
            .expect("send");
        harness.settle();
        harness.runtime.open_app("notepad").expect("reopen");
        harness.settle();

        second
            .unbounded_send(Ok("<p>new</p>".to_string()))
            .expect("send");
        drop(second);
        harness.settle();
        let _ = first.unbounded_send(Ok(" and late</p>".to_string()));
        drop(first);
        harness.settle();

        assert_eq!(harness.runtime.snapshot().content, "<p>new</p>");
        harness.runtime.close_app();
        harness.runtime.open_app("notepad").expect("cached open");
        assert_eq!(content.calls.get(), 2);
        assert_eq!(harness.runtime.snapshot().content, "<p>new</p>");
    }

    #[test]
    fn dropped_stream_task_releases_loading() {
        let content = Rc::new(ChannelContentService::default());
        let _tx = content.next_stream();
        let mut harness = Harness::new(
            seeded_config(),
            content,
            Rc::new(MemoryImageGenerationService::default()),
        );

        harness.runtime.open_app("notepad").expect("open");
        harness.settle();
        assert!(harness.runtime.snapshot().loading);

        let runtime = harness.runtime.clone();
        drop(harness.pool);
        assert!(!runtime.snapshot().loading);
    }

    #[test]
    fn wallpaper_requests_are_single_flight_until_released() {
        let images = Rc::new(GatedImageService::default());
        let gate = images.next_gate();
        let mut harness = Harness::new(
            seeded_config(),
            Rc::new(MemoryContentStreamService::default()),
            images.clone(),
        );

        harness.runtime.boot();
        harness.settle();
        assert!(harness.runtime.snapshot().wallpaper.generating);

        harness.runtime.request_wallpaper(Some("ocean"));
        harness.runtime.request_wallpaper(None);
        harness.settle();
        assert_eq!(images.calls.get(), 1);

        gate.send(Err("quota".to_string())).expect("release");
        harness.settle();
        let wallpaper = harness.runtime.snapshot().wallpaper;
        assert!(!wallpaper.generating);
        assert_eq!(wallpaper.url, None);
        assert_eq!(wallpaper.error.as_deref(), Some(WALLPAPER_FAILURE_MESSAGE));

        let gate = images.next_gate();
        harness.runtime.request_wallpaper(Some("  "));
        harness.settle();
        assert_eq!(images.calls.get(), 2);
        gate.send(Ok(PLACEHOLDER_PNG_BASE64.to_string()))
            .expect("release");
        harness.settle();
        let wallpaper = harness.runtime.snapshot().wallpaper;
        assert_eq!(
            wallpaper.url,
            Some(format!("data:image/png;base64,{PLACEHOLDER_PNG_BASE64}"))
        );
        assert_eq!(wallpaper.error, None);
    }

    #[test]
    fn blank_prompt_falls_back_to_time_of_day_default() {
        let images = MemoryImageGenerationService::default();
        let mut harness = Harness::new(
            seeded_config(),
            Rc::new(MemoryContentStreamService::default()),
            Rc::new(images.clone()),
        );

        harness.runtime.request_wallpaper(Some(""));
        harness.settle();
        harness.runtime.request_wallpaper(Some("a quiet harbor"));
        harness.settle();

        assert_eq!(
            images.prompts(),
            vec![prompt_for_hour(9), "a quiet harbor".to_string()]
        );
    }

    #[test]
    fn auto_refresh_toggling_never_leaks_schedules() {
        let images = MemoryImageGenerationService::default();
        let mut harness = Harness::new(
            seeded_config(),
            Rc::new(MemoryContentStreamService::default()),
            Rc::new(images.clone()),
        );

        for _ in 0..5 {
            harness.runtime.set_auto_wallpaper(true);
            harness.runtime.set_auto_wallpaper(true);
            assert_eq!(harness.scheduler.active_intervals(), 1);
            harness.runtime.set_auto_wallpaper(false);
            assert_eq!(harness.scheduler.active_intervals(), 0);
        }

        harness.runtime.set_auto_wallpaper(true);
        harness.scheduler.advance(Duration::from_secs(300));
        harness.settle();
        harness.scheduler.advance(Duration::from_secs(300));
        harness.settle();
        assert_eq!(images.request_count(), 2);
        assert!(harness.runtime.snapshot().wallpaper.auto_refresh_enabled);

        drop(harness.runtime);
        assert_eq!(harness.scheduler.active_intervals(), 0);
    }

    #[test]
    fn crash_hides_entries_and_disables_every_entry_point() {
        let content = MemoryContentStreamService::default();
        let images = MemoryImageGenerationService::default();
        let mut harness = Harness::new(
            seeded_config(),
            Rc::new(content.clone()),
            Rc::new(images.clone()),
        );
        harness.runtime.set_auto_wallpaper(true);
        harness.runtime.open_app("notepad").expect("open");
        harness.settle();

        harness.runtime.submit_interaction(InteractionRecord::click(
            "access_unstable_file_system32",
            "system32",
        ));
        let crashed = harness.runtime.snapshot();
        assert_eq!(crashed.session_state, SessionState::Crashed);
        assert!(crashed.crashed);
        assert!((2..=5).contains(&crashed.hidden_entries.len()));
        assert_eq!(harness.scheduler.active_intervals(), 0);

        harness.runtime.open_app("documents").expect("ignored");
        harness.runtime.submit_interaction(InteractionRecord::click("save", "Save"));
        harness.runtime.set_statefulness(true);
        harness
            .runtime
            .set_max_history_length(42)
            .expect("ignored while crashed");
        harness.runtime.request_wallpaper(Some("anything"));
        harness.runtime.set_auto_wallpaper(true);
        harness.runtime.close_app();
        harness.scheduler.advance(Duration::from_secs(3600));
        harness.settle();

        assert_eq!(harness.runtime.snapshot(), crashed);
        assert_eq!(content.request_count(), 1);
        assert_eq!(images.request_count(), 0);
    }

    #[test]
    fn invalid_operations_report_errors_and_keep_state() {
        let harness = Harness::new(
            seeded_config(),
            Rc::new(MemoryContentStreamService::default()),
            Rc::new(MemoryImageGenerationService::default()),
        );

        assert!(matches!(
            harness.runtime.set_max_history_length(11),
            Err(ReducerError::InvalidHistoryLength { requested: 11, .. })
        ));
        assert_eq!(harness.runtime.snapshot().max_history_length, 3);
        assert!(matches!(
            harness.runtime.open_app("nope"),
            Err(ReducerError::UnknownApp { .. })
        ));
    }

    #[test]
    fn invalid_config_is_rejected_at_construction() {
        let pool = LocalPool::new();
        let config = RuntimeConfig {
            initial_max_history_length: 11,
            ..RuntimeConfig::default()
        };
        let result = DesktopRuntime::new(config, HostServices::headless(Rc::new(pool.spawner())));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
    }

    #[test]
    fn close_button_interaction_clears_the_app() {
        let content = MemoryContentStreamService::default();
        content.push_fragments(["<p>Notepad</p>"]);
        let mut harness = Harness::new(
            seeded_config(),
            Rc::new(content),
            Rc::new(MemoryImageGenerationService::default()),
        );
        harness.runtime.open_app("notepad").expect("open");
        harness.settle();

        harness
            .runtime
            .submit_interaction(InteractionRecord::click("app_close_button", "Close"));
        let snapshot = harness.runtime.snapshot();
        assert_eq!(snapshot.active_app, None);
        assert_eq!(snapshot.content, "");
        assert!(snapshot.history.is_empty());
        assert_eq!(snapshot.path_key, None);
    }
}
