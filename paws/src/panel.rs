//! Clipboard panel
//!
//! The FFI object the host drives. All state sits behind one mutex; each
//! public call locks it, runs, collects the notifications the call produced,
//! unlocks, and only then talks to the host (listener callbacks and
//! `data_reborned`). A host may therefore call back into the panel from any
//! callback.
//!
//! Concurrency Model:
//! - Deferred tasks (removal commit/settle, time ticker, service polling) run
//!   on tokio and hold a `Weak` to the shared state
//! - Dropping the panel cancels them through a `CancellationToken`
//! - Uses the fallback runtime when called outside any runtime (e.g., from UniFFI)

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::codec;
use crate::config::PanelConfig;
use crate::connection::connect_when_ready;
use crate::interface::{
    ClipboardLoader, ItemView, PanelError, PanelKey, PanelListener, StoreChange, Theme, ViewEvent,
};
use crate::list_view::{ListView, RemovalTicket};
use crate::models::EntryId;
use crate::presenter::Activation;
use crate::scheduler::{DropGuard, Scheduler, TokioScheduler};
use crate::store::EntryStore;
use crate::time_label::Clock;

enum Notification {
    Store(StoreChange),
    View(ViewEvent),
}

/// Stands in for the clipboard service while the lock is held; reborn
/// buffers are forwarded once it is released.
struct RebornOutbox {
    loader: Arc<dyn ClipboardLoader>,
    buffers: Mutex<Vec<Vec<u8>>>,
}

impl RebornOutbox {
    fn new(loader: Arc<dyn ClipboardLoader>) -> Self {
        Self {
            loader,
            buffers: Mutex::new(Vec::new()),
        }
    }

    fn take(&self) -> Vec<Vec<u8>> {
        std::mem::take(&mut *self.buffers.lock())
    }
}

impl ClipboardLoader for RebornOutbox {
    fn is_valid(&self) -> bool {
        self.loader.is_valid()
    }

    fn subscribe(&self) {
        self.loader.subscribe();
    }

    fn data_reborned(&self, buffer: Vec<u8>) {
        self.buffers.lock().push(buffer);
    }
}

struct PanelState {
    store: EntryStore,
    view: ListView,
    reborn: Vec<Vec<u8>>,
}

impl PanelState {
    /// Feed journaled store changes to the view and gather everything the
    /// host should hear about, in order.
    fn collect_notifications(&mut self) -> Vec<Notification> {
        let mut out: Vec<Notification> = self
            .view
            .drain_events()
            .into_iter()
            .map(Notification::View)
            .collect();

        loop {
            let changes = self.store.drain_changes();
            if changes.is_empty() {
                break;
            }
            for change in changes {
                out.push(Notification::Store(change));
                self.view.apply_store_change(change, &self.store);
                out.extend(self.view.drain_events().into_iter().map(Notification::View));
            }
        }

        out
    }
}

pub(crate) struct PanelShared {
    state: Mutex<PanelState>,
    loader: Arc<dyn ClipboardLoader>,
    listener: Arc<dyn PanelListener>,
    config: PanelConfig,
    scheduler: Arc<dyn Scheduler>,
    subscribed: Arc<AtomicBool>,
    me: Weak<PanelShared>,
}

impl PanelShared {
    /// Run `f` under the lock, then deliver what it produced.
    fn mutate<R>(&self, f: impl FnOnce(&mut PanelState) -> R) -> R {
        let (result, reborn, notes) = {
            let mut state = self.state.lock();
            let result = f(&mut *state);
            let reborn = std::mem::take(&mut state.reborn);
            let notes = state.collect_notifications();
            (result, reborn, notes)
        };

        for buffer in reborn {
            self.loader.data_reborned(buffer);
        }
        for note in notes {
            match note {
                Notification::Store(change) => self.listener.on_store_change(change),
                Notification::View(event) => self.listener.on_view_event(event),
            }
        }
        result
    }

    fn read<R>(&self, f: impl FnOnce(&PanelState) -> R) -> R {
        let state = self.state.lock();
        f(&*state)
    }

    fn activate(&self, id: EntryId) -> Result<(), PanelError> {
        let loader = self.loader.clone();
        self.mutate(|state| {
            match state.view.activate(id, &mut state.store) {
                Activation::Promote(id) => {
                    let outbox = RebornOutbox::new(loader);
                    let outcome = state.store.promote(id, &outbox);
                    state.reborn.extend(outbox.take());
                    debug!(%id, ?outcome, "Promote");
                    outcome.map(|_| ())
                }
                Activation::Disabled => {
                    debug!(%id, "Activation of entry with deleted files");
                    Ok(())
                }
                Activation::Missing | Activation::Ignored => Ok(()),
            }
        })
    }

    fn close(&self, id: EntryId) {
        let Some(ticket) = self.mutate(|state| state.view.close_entry(id, &state.store)) else {
            return;
        };
        self.schedule_removal(ticket);
    }

    fn schedule_removal(&self, ticket: RemovalTicket) {
        let commit_after = Duration::from_millis(self.config.animation_ms);
        let settle_after =
            Duration::from_millis(self.config.animation_ms + self.config.settle_slack_ms);

        let weak = self.me.clone();
        self.scheduler.schedule(
            commit_after,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.mutate(|state| state.view.commit_removal(ticket, &mut state.store));
                }
            }),
        );

        let weak = self.me.clone();
        self.scheduler.schedule(
            settle_after,
            Box::new(move || {
                if let Some(shared) = weak.upgrade() {
                    shared.mutate(|state| state.view.settle_removal(ticket, &state.store));
                }
            }),
        );
    }

    fn refresh_times(&self) {
        self.mutate(|state| state.view.refresh_times(&state.store));
    }

    fn selected_id(state: &PanelState) -> Option<EntryId> {
        state.view.selection().and_then(|row| state.store.id_at(row))
    }
}

/// Clipboard history panel
#[derive(uniffi::Object)]
pub struct ClipboardPanel {
    shared: Arc<PanelShared>,
    _guard: DropGuard,
}

// Internal implementation (not exported via FFI)
impl ClipboardPanel {
    pub(crate) fn with_scheduler(
        loader: Arc<dyn ClipboardLoader>,
        listener: Arc<dyn PanelListener>,
        config: PanelConfig,
        scheduler: Arc<dyn Scheduler>,
        token: CancellationToken,
        clock: Clock,
    ) -> Result<Self, PanelError> {
        config.validate()?;
        let shared = Arc::new_cyclic(|me| PanelShared {
            state: Mutex::new(PanelState {
                store: EntryStore::new(),
                view: ListView::with_clock(config.clone(), clock),
                reborn: Vec::new(),
            }),
            loader,
            listener,
            config,
            scheduler,
            subscribed: Arc::new(AtomicBool::new(false)),
            me: me.clone(),
        });
        Ok(Self {
            shared,
            _guard: DropGuard::new(token),
        })
    }

    /// Tokio-backed panel: service polling plus the periodic time-label tick
    pub(crate) fn start(
        loader: Arc<dyn ClipboardLoader>,
        listener: Arc<dyn PanelListener>,
        config: PanelConfig,
        clock: Clock,
    ) -> Result<Self, PanelError> {
        let token = CancellationToken::new();
        let scheduler = Arc::new(TokioScheduler::new(token.clone()));
        let poll = Duration::from_millis(config.poll_interval_ms);
        let refresh = Duration::from_millis(config.refresh_interval_ms);

        let panel = Self::with_scheduler(
            loader.clone(),
            listener,
            config,
            scheduler.clone(),
            token,
            clock,
        )?;

        scheduler.spawn(connect_when_ready(
            loader,
            poll,
            panel.shared.subscribed.clone(),
        ));

        let weak = Arc::downgrade(&panel.shared);
        scheduler.every(refresh, move || match weak.upgrade() {
            Some(shared) => {
                shared.refresh_times();
                true
            }
            None => false,
        });

        Ok(panel)
    }

    fn id_at(&self, row: u64) -> Option<EntryId> {
        let row = usize::try_from(row).ok()?;
        self.shared.read(|state| state.store.id_at(row))
    }
}

#[uniffi::export]
impl ClipboardPanel {
    /// Create a panel and start waiting for the clipboard service
    #[uniffi::constructor]
    pub fn new(
        loader: Arc<dyn ClipboardLoader>,
        listener: Arc<dyn PanelListener>,
        config: PanelConfig,
    ) -> Result<Self, PanelError> {
        Self::start(loader, listener, config, Clock::system())
    }

    /// A snapshot buffer from the clipboard service. Returns the new entry id,
    /// or None when the buffer was dropped (corrupt or unsupported kind).
    pub fn data_coming(&self, buffer: Vec<u8>) -> Option<u64> {
        let entry = match codec::decode_snapshot(&buffer) {
            Ok(entry) => entry,
            Err(e) => {
                debug!("Dropping undecodable snapshot: {}", e);
                return None;
            }
        };
        self.shared
            .mutate(|state| state.store.insert_front(entry))
            .map(EntryId::get)
    }

    pub fn row_count(&self) -> u64 {
        self.shared.read(|state| state.store.len() as u64)
    }

    pub fn entry_id_at(&self, row: u64) -> Option<u64> {
        self.id_at(row).map(EntryId::get)
    }

    /// View of a materialized row; rows outside the viewport have none
    pub fn row_view(&self, row: u64) -> Option<ItemView> {
        let id = self.id_at(row)?;
        self.shared.read(|state| {
            state
                .view
                .presenter(id)
                .map(|p| p.view(&self.shared.config))
        })
    }

    pub fn visible_views(&self) -> Vec<ItemView> {
        self.shared.read(|state| state.view.views())
    }

    pub fn selected_row(&self) -> Option<u64> {
        self.shared
            .read(|state| state.view.selection().map(|r| r as u64))
    }

    pub fn is_input_grabbed(&self) -> bool {
        self.shared.read(|state| state.view.is_input_grabbed())
    }

    pub fn is_subscribed(&self) -> bool {
        self.shared.subscribed.load(Ordering::SeqCst)
    }

    /// Returns true when the key was handled
    pub fn key_pressed(&self, key: PanelKey) -> Result<bool, PanelError> {
        match key {
            PanelKey::Up => {
                self.shared.mutate(|state| state.view.move_up(&state.store));
                Ok(true)
            }
            PanelKey::Down => {
                self.shared.mutate(|state| state.view.move_down(&state.store));
                Ok(true)
            }
            PanelKey::Tab => {
                self.shared
                    .mutate(|state| state.view.toggle_close_focus(&state.store));
                Ok(true)
            }
            PanelKey::Enter | PanelKey::Return => {
                let (selected, close_focus) = self.shared.read(|state| {
                    (
                        PanelShared::selected_id(state),
                        state.view.selected_close_focused(&state.store),
                    )
                });
                let Some(id) = selected else {
                    return Ok(false);
                };
                if close_focus {
                    self.shared.close(id);
                } else {
                    self.shared.activate(id)?;
                }
                Ok(true)
            }
            PanelKey::Other => Ok(false),
        }
    }

    /// Pointer position relative to the viewport's top edge
    pub fn pointer_moved(&self, y: f64) {
        self.shared
            .mutate(|state| state.view.pointer_moved(y, &state.store));
    }

    pub fn pointer_left(&self) {
        self.shared.mutate(|state| state.view.pointer_left());
    }

    pub fn double_clicked(&self, row: u64) -> Result<(), PanelError> {
        match self.id_at(row) {
            Some(id) => self.shared.activate(id),
            None => Ok(()),
        }
    }

    pub fn close_clicked(&self, row: u64) {
        if let Some(id) = self.id_at(row) {
            self.shared.close(id);
        }
    }

    pub fn scroll_by(&self, delta: f64) {
        self.shared
            .mutate(|state| state.view.scroll_by(delta, &state.store));
    }

    pub fn resize(&self, viewport_height: f64) {
        self.shared
            .mutate(|state| state.view.resize(viewport_height, &state.store));
    }

    /// The host made the panel visible
    pub fn shown(&self) {
        self.shared.mutate(|state| state.view.show(&state.store));
        info!(event_type = "panel_lifecycle", action = "shown", "Panel shown");
    }

    /// Forced time-label refresh, on top of the periodic tick
    pub fn refresh_times(&self) {
        self.shared.refresh_times();
    }

    pub fn theme_changed(&self, theme: Theme) {
        self.shared
            .mutate(|state| state.view.set_theme(theme, &state.store));
    }

    pub fn clear(&self) {
        self.shared.mutate(|state| state.store.clear());
    }
}

impl Drop for ClipboardPanel {
    fn drop(&mut self) {
        let pending = self.shared.read(|state| state.view.is_input_grabbed());
        if pending {
            warn!("Panel dropped with a removal in flight");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scheduler::manual::ManualScheduler;
    use crate::store::tests::RecordingLoader;

    #[derive(Default)]
    struct RecordingListener {
        changes: Mutex<Vec<StoreChange>>,
        events: Mutex<Vec<ViewEvent>>,
    }

    impl PanelListener for RecordingListener {
        fn on_store_change(&self, change: StoreChange) {
            self.changes.lock().push(change);
        }

        fn on_view_event(&self, event: ViewEvent) {
            self.events.lock().push(event);
        }
    }

    struct Harness {
        panel: ClipboardPanel,
        loader: Arc<RecordingLoader>,
        listener: Arc<RecordingListener>,
        scheduler: Arc<ManualScheduler>,
    }

    fn harness() -> Harness {
        let loader = Arc::new(RecordingLoader::default());
        let listener = Arc::new(RecordingListener::default());
        let scheduler = Arc::new(ManualScheduler::default());
        let panel = ClipboardPanel::with_scheduler(
            loader.clone(),
            listener.clone(),
            PanelConfig::default(),
            scheduler.clone(),
            CancellationToken::new(),
            Clock::system(),
        )
        .unwrap();
        Harness {
            panel,
            loader,
            listener,
            scheduler,
        }
    }

    fn text_snapshot(text: &str) -> Vec<u8> {
        codec::encode_snapshot(&crate::models::ClipboardEntry::new_text(text)).unwrap()
    }

    fn texts(panel: &ClipboardPanel) -> Vec<String> {
        panel
            .shared
            .read(|state| state.store.iter().map(|e| e.text.clone()).collect())
    }

    #[test]
    fn test_data_coming_filters_bad_buffers() {
        let h = harness();
        assert!(h.panel.data_coming(b"garbage".to_vec()).is_none());
        assert!(h.panel.data_coming(br#"{"kind":"html"}"#.to_vec()).is_none());
        assert_eq!(h.panel.row_count(), 0);
        assert!(h.listener.changes.lock().is_empty());

        let id = h.panel.data_coming(text_snapshot("hi")).unwrap();
        assert_eq!(h.panel.entry_id_at(0), Some(id));
        assert_eq!(
            *h.listener.changes.lock(),
            vec![StoreChange::Inserted { row: 0 }, StoreChange::DataChanged]
        );
        let view = h.panel.row_view(0).unwrap();
        assert_eq!(view.caption, "2 characters");
    }

    #[test]
    fn test_end_to_end_scenario() {
        let h = harness();
        let a = h.panel.data_coming(text_snapshot("A")).unwrap();
        h.panel.data_coming(text_snapshot("B")).unwrap();
        let c = h.panel.data_coming(text_snapshot("C")).unwrap();
        assert_eq!(texts(&h.panel), vec!["C", "B", "A"]);
        h.listener.changes.lock().clear();

        // Remove B through its close button
        h.panel.close_clicked(1);
        assert!(h.panel.is_input_grabbed());
        assert_eq!(h.scheduler.pending(), vec![Duration::from_millis(300), Duration::from_millis(310)]);
        h.scheduler.run_all();
        assert_eq!(texts(&h.panel), vec!["C", "A"]);
        assert_eq!(h.listener.changes.lock()[0], StoreChange::Removed { row: 1 });
        assert!(!h.panel.is_input_grabbed());

        // Promoting the live entry changes nothing
        h.listener.changes.lock().clear();
        h.panel.double_clicked(0).unwrap();
        assert_eq!(texts(&h.panel), vec!["C", "A"]);
        assert!(h.loader.reborned.lock().is_empty());
        assert_eq!(*h.listener.changes.lock(), vec![StoreChange::Reborn]);
        assert_eq!(h.panel.entry_id_at(0), Some(c));

        // Promoting A hands its payload back
        h.panel.double_clicked(1).unwrap();
        assert_eq!(texts(&h.panel), vec!["C"]);
        let sent = h.loader.reborned.lock();
        assert_eq!(sent.len(), 1);
        let decoded = codec::decode_snapshot(&sent[0]).unwrap();
        assert_eq!(decoded.text, "A");
        assert!(h.panel.entry_id_at(1).is_none());
        assert_ne!(h.panel.entry_id_at(0), Some(a));
    }

    #[test]
    fn test_close_events_reach_listener_in_order() {
        let h = harness();
        h.panel.data_coming(text_snapshot("A"));
        h.panel.data_coming(text_snapshot("B"));
        h.listener.events.lock().clear();

        h.panel.close_clicked(0);
        {
            let events = h.listener.events.lock();
            assert!(matches!(events[0], ViewEvent::RowClosing { .. }));
            assert_eq!(events[1], ViewEvent::InputGrabbed);
            assert!(events
                .iter()
                .any(|e| matches!(e, ViewEvent::RowsShifting { shifts } if shifts.len() == 1)));
        }

        h.scheduler.run_all();
        let events = h.listener.events.lock();
        assert!(events.contains(&ViewEvent::InputReleased));
        assert!(events.contains(&ViewEvent::SelectionChanged { row: Some(0) }));
    }

    #[test]
    fn test_pointer_ignored_while_removal_in_flight() {
        let h = harness();
        for t in ["A", "B", "C"] {
            h.panel.data_coming(text_snapshot(t));
        }
        h.panel.close_clicked(0);
        h.panel.pointer_moved(250.0);
        assert_eq!(h.panel.selected_row(), None);

        h.scheduler.run_all();
        h.panel.pointer_moved(250.0);
        assert_eq!(h.panel.selected_row(), Some(1));
    }

    #[test]
    fn test_keyboard_close_and_activate() {
        let h = harness();
        h.panel.data_coming(text_snapshot("A"));
        h.panel.data_coming(text_snapshot("B"));
        h.panel.shown();
        assert_eq!(h.panel.selected_row(), Some(0));

        // Enter without close focus activates the live entry: no service call
        assert!(h.panel.key_pressed(PanelKey::Enter).unwrap());
        assert!(h.loader.reborned.lock().is_empty());

        h.panel.key_pressed(PanelKey::Down).unwrap();
        h.panel.key_pressed(PanelKey::Tab).unwrap();
        assert!(h.panel.row_view(1).unwrap().close_focused);
        h.panel.key_pressed(PanelKey::Return).unwrap();
        h.scheduler.run_all();
        assert_eq!(texts(&h.panel), vec!["B"]);

        assert!(!h.panel.key_pressed(PanelKey::Other).unwrap());
    }

    #[test]
    fn test_keys_on_empty_panel() {
        let h = harness();
        h.panel.key_pressed(PanelKey::Up).unwrap();
        h.panel.key_pressed(PanelKey::Down).unwrap();
        assert!(!h.panel.key_pressed(PanelKey::Enter).unwrap());
        assert_eq!(h.panel.selected_row(), None);
        assert!(h.listener.events.lock().is_empty());
    }

    #[test]
    fn test_clear_during_removal_is_tolerated() {
        let h = harness();
        h.panel.data_coming(text_snapshot("A"));
        h.panel.data_coming(text_snapshot("B"));
        h.panel.close_clicked(1);
        h.panel.clear();
        h.scheduler.run_all();
        assert_eq!(h.panel.row_count(), 0);
        assert!(!h.panel.is_input_grabbed());
        assert_eq!(h.panel.selected_row(), None);
    }

    #[test]
    fn test_tasks_after_drop_do_nothing() {
        let h = harness();
        h.panel.data_coming(text_snapshot("A"));
        h.panel.close_clicked(0);
        let scheduler = h.scheduler.clone();
        drop(h);
        scheduler.run_all();
    }

    #[test]
    fn test_clicks_ignored_while_removal_in_flight() {
        let h = harness();
        for t in ["A", "B", "C", "D"] {
            h.panel.data_coming(text_snapshot(t));
        }
        h.panel.shown();
        h.panel.close_clicked(1);
        assert_eq!(h.scheduler.pending().len(), 2);
        h.listener.events.lock().clear();

        // Second close on the same slot, a double-click and Enter all bounce
        h.panel.close_clicked(1);
        h.panel.double_clicked(1).unwrap();
        h.panel.key_pressed(PanelKey::Enter).unwrap();
        assert_eq!(h.scheduler.pending().len(), 2);
        assert!(h.loader.reborned.lock().is_empty());
        assert!(!h
            .listener
            .events
            .lock()
            .iter()
            .any(|e| matches!(e, ViewEvent::RowsShifting { .. } | ViewEvent::RowClosing { .. })));
        assert_eq!(texts(&h.panel), vec!["D", "C", "B", "A"]);

        h.scheduler.run_all();
        assert_eq!(texts(&h.panel), vec!["D", "B", "A"]);
        let views = h.panel.visible_views();
        let ys: Vec<f64> = views.iter().map(|v| v.y).collect();
        assert_eq!(ys, vec![0.0, 210.0, 420.0]);

        // Input is back: the row now in that slot can be promoted
        h.panel.double_clicked(1).unwrap();
        assert_eq!(h.loader.reborned.lock().len(), 1);
        assert_eq!(texts(&h.panel), vec!["D", "A"]);
    }

    #[test]
    fn test_shown_refreshes_time_labels() {
        use chrono::{Local, TimeZone};

        let noon = Local.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let now = Arc::new(Mutex::new(noon));
        let clock_now = now.clone();
        let listener = Arc::new(RecordingListener::default());
        let panel = ClipboardPanel::with_scheduler(
            Arc::new(RecordingLoader::default()),
            listener.clone(),
            PanelConfig::default(),
            Arc::new(ManualScheduler::default()),
            CancellationToken::new(),
            Clock::from_fn(move || *clock_now.lock()),
        )
        .unwrap();

        let entry = crate::models::ClipboardEntry::new_text("A")
            .with_created_at(noon.with_timezone(&chrono::Utc));
        panel.data_coming(codec::encode_snapshot(&entry).unwrap());
        assert_eq!(panel.row_view(0).unwrap().time_label, "Just now");

        *now.lock() = noon + chrono::Duration::minutes(5);
        listener.events.lock().clear();
        panel.shown();
        assert_eq!(panel.row_view(0).unwrap().time_label, "5 minutes ago");
        assert!(listener.events.lock().iter().any(|e| matches!(
            e,
            ViewEvent::RowUpdated { view } if view.time_label == "5 minutes ago"
        )));
    }

    #[tokio::test(start_paused = true)]
    async fn test_minute_tick_refreshes_time_labels() {
        use chrono::{Local, TimeZone};

        let noon = Local.with_ymd_and_hms(2024, 3, 15, 12, 0, 0).unwrap();
        let started = tokio::time::Instant::now();
        let clock = Clock::from_fn(move || {
            noon + chrono::Duration::from_std(started.elapsed()).unwrap()
        });
        let panel = ClipboardPanel::start(
            Arc::new(RecordingLoader::default()),
            Arc::new(RecordingListener::default()),
            PanelConfig::default(),
            clock,
        )
        .unwrap();

        let entry = crate::models::ClipboardEntry::new_text("A")
            .with_created_at(noon.with_timezone(&chrono::Utc));
        panel.data_coming(codec::encode_snapshot(&entry).unwrap());
        assert_eq!(panel.row_view(0).unwrap().time_label, "Just now");

        tokio::time::sleep(Duration::from_secs(59)).await;
        assert_eq!(panel.row_view(0).unwrap().time_label, "Just now");

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(panel.row_view(0).unwrap().time_label, "1 minute ago");
    }

    /// Listener that calls back into the panel from inside a notification
    struct ReentrantListener {
        panel: Mutex<Option<Weak<PanelShared>>>,
        rows_seen: Mutex<Vec<usize>>,
    }

    impl PanelListener for ReentrantListener {
        fn on_store_change(&self, _change: StoreChange) {
            if let Some(shared) = self.panel.lock().as_ref().and_then(Weak::upgrade) {
                let rows = shared.read(|state| state.store.len());
                self.rows_seen.lock().push(rows);
            }
        }

        fn on_view_event(&self, _event: ViewEvent) {}
    }

    #[test]
    fn test_listener_may_reenter_panel() {
        let listener = Arc::new(ReentrantListener {
            panel: Mutex::new(None),
            rows_seen: Mutex::new(Vec::new()),
        });
        let panel = ClipboardPanel::with_scheduler(
            Arc::new(RecordingLoader::default()),
            listener.clone(),
            PanelConfig::default(),
            Arc::new(ManualScheduler::default()),
            CancellationToken::new(),
            Clock::system(),
        )
        .unwrap();
        *listener.panel.lock() = Some(Arc::downgrade(&panel.shared));

        panel.data_coming(text_snapshot("A"));
        assert_eq!(*listener.rows_seen.lock(), vec![1, 1]);
    }

    #[test]
    fn test_invalid_config_is_rejected() {
        let config = PanelConfig {
            animation_ms: 0,
            ..PanelConfig::default()
        };
        let result = ClipboardPanel::with_scheduler(
            Arc::new(RecordingLoader::default()),
            Arc::new(RecordingListener::default()),
            config,
            Arc::new(ManualScheduler::default()),
            CancellationToken::new(),
            Clock::system(),
        );
        assert!(matches!(result, Err(PanelError::InvalidConfig(_))));
    }
}
