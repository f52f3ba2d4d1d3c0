//! Virtualized list view
//!
//! Owns selection, scrolling, the presenter cache and the removal
//! choreography. The view never owns entries: every operation that needs one
//! borrows the `EntryStore` and looks it up by id, so presenters can never
//! outlive the data they show.
//!
//! Host-facing notifications are queued as `ViewEvent`s and drained by the
//! panel after each call.
//!
//! Removal runs as a small state machine per ticket:
//!
//! ```text
//! begin_removal     Triggered -> Shifting   input grabbed, rows below slide up
//! commit_removal    -> Committed            entry dropped from the store, view reset
//! settle_removal    -> Settling             input released, selection re-derived
//! ```
//!
//! Commit and settle are driven by deferred tasks and may run in either order;
//! the record is dropped once both have happened. Each step re-checks that its
//! ticket is still known and that the entry may have vanished in between.

use std::collections::HashMap;
use std::ops::Range;

use tracing::debug;

use crate::config::PanelConfig;
use crate::interface::{CloseAnimation, ItemView, RowShift, StoreChange, Theme, ViewEvent};
use crate::models::EntryId;
use crate::presenter::{Activation, ItemPresenter, RenderContext};
use crate::store::EntryStore;
use crate::time_label::Clock;

/// Handle for one in-flight removal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RemovalTicket(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemovalPhase {
    Triggered,
    Shifting,
    Settling,
    Committed,
}

#[derive(Debug)]
struct Removal {
    ticket: RemovalTicket,
    id: EntryId,
    row: usize,
    phase: RemovalPhase,
    committed: bool,
    settled: bool,
    /// Presenters this removal materialized to slide in from below
    transients: Vec<EntryId>,
}

#[derive(Debug)]
pub struct ListView {
    config: PanelConfig,
    theme: Theme,
    clock: Clock,
    presenters: HashMap<EntryId, ItemPresenter>,
    selection: Option<usize>,
    scroll_offset: f64,
    viewport_height: f64,
    input_locks: usize,
    removals: Vec<Removal>,
    next_ticket: u64,
    events: Vec<ViewEvent>,
}

impl ListView {
    pub fn new(config: PanelConfig) -> Self {
        Self::with_clock(config, Clock::system())
    }

    pub fn with_clock(config: PanelConfig, clock: Clock) -> Self {
        let viewport_height = f64::from(config.viewport_height);
        Self {
            config,
            theme: Theme::default(),
            clock,
            presenters: HashMap::new(),
            selection: None,
            scroll_offset: 0.0,
            viewport_height,
            input_locks: 0,
            removals: Vec::new(),
            next_ticket: 0,
            events: Vec::new(),
        }
    }

    fn ctx(&self) -> RenderContext<'_> {
        RenderContext {
            config: &self.config,
            theme: self.theme,
            now: self.clock.now(),
        }
    }

    fn pitch(&self) -> f64 {
        self.config.row_pitch()
    }

    fn row_y(&self, row: usize) -> f64 {
        row as f64 * self.pitch()
    }

    pub fn selection(&self) -> Option<usize> {
        self.selection
    }

    pub fn scroll_offset(&self) -> f64 {
        self.scroll_offset
    }

    pub fn theme(&self) -> Theme {
        self.theme
    }

    pub fn is_input_grabbed(&self) -> bool {
        self.input_locks > 0
    }

    pub fn presenter(&self, id: EntryId) -> Option<&ItemPresenter> {
        self.presenters.get(&id)
    }

    pub fn is_materialized(&self, id: EntryId) -> bool {
        self.presenters.contains_key(&id)
    }

    pub fn removal_phase(&self, ticket: RemovalTicket) -> Option<RemovalPhase> {
        self.removals
            .iter()
            .find(|r| r.ticket == ticket)
            .map(|r| r.phase)
    }

    /// Views of every live presenter, top to bottom
    pub fn views(&self) -> Vec<ItemView> {
        let mut views: Vec<ItemView> = self
            .presenters
            .values()
            .map(|p| p.view(&self.config))
            .collect();
        views.sort_by(|a, b| a.y.total_cmp(&b.y));
        views
    }

    pub fn drain_events(&mut self) -> Vec<ViewEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit_update(&mut self, id: EntryId) {
        if let Some(p) = self.presenters.get(&id) {
            self.events.push(ViewEvent::RowUpdated {
                view: p.view(&self.config),
            });
        }
    }

    fn destroy_presenter(&mut self, id: EntryId) {
        if self.presenters.remove(&id).is_some() {
            self.events.push(ViewEvent::RowDestroyed { entry_id: id.get() });
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // VIRTUALIZATION
    // ═══════════════════════════════════════════════════════════════════════════

    /// Rows intersecting the viewport
    pub fn visible_rows(&self, count: usize) -> Range<usize> {
        if count == 0 {
            return 0..0;
        }
        let pitch = self.pitch();
        let start = (self.scroll_offset / pitch).floor() as usize;
        let end = ((self.scroll_offset + self.viewport_height) / pitch).ceil() as usize;
        start.min(count)..end.min(count)
    }

    fn max_scroll(&self, count: usize) -> f64 {
        if count == 0 {
            return 0.0;
        }
        let content = count as f64 * self.pitch() - f64::from(self.config.item_spacing);
        (content - self.viewport_height).max(0.0)
    }

    /// Create presenters for rows that became visible, drop those that
    /// scrolled out or lost their entry, and move the rest to their slots.
    pub fn sync_viewport(&mut self, store: &EntryStore) {
        let visible = self.visible_rows(store.len());

        let stale: Vec<EntryId> = self
            .presenters
            .values()
            .filter(|p| match store.row_of(p.id()) {
                None => true,
                Some(row) => !p.is_transient() && !visible.contains(&row),
            })
            .map(|p| p.id())
            .collect();
        for id in stale {
            self.destroy_presenter(id);
        }

        for row in visible {
            let Some(id) = store.id_at(row) else { break };
            let y = self.row_y(row);
            match self.presenters.get_mut(&id) {
                Some(p) if p.is_transient() => {}
                Some(p) => {
                    if p.row() != row || p.y() != y {
                        p.place(row, y);
                        self.emit_update(id);
                    }
                }
                None => {
                    let Some(entry) = store.get(id) else { continue };
                    let presenter = ItemPresenter::new(entry, id, row, y, self.ctx());
                    self.presenters.insert(id, presenter);
                    self.emit_update(id);
                }
            }
        }

        self.sync_hover(store);
    }

    /// The selected row is the hovered one; everything else is idle.
    fn sync_hover(&mut self, store: &EntryStore) {
        let selected = self.selection.and_then(|r| store.id_at(r));
        let changed: Vec<EntryId> = self
            .presenters
            .values_mut()
            .filter_map(|p| {
                let want = Some(p.id()) == selected;
                if p.is_hovered() == want {
                    return None;
                }
                if want {
                    p.set_hovered(true);
                } else {
                    p.focus_out();
                }
                Some(p.id())
            })
            .collect();
        for id in changed {
            self.emit_update(id);
        }
    }

    fn clamp_selection(&mut self, count: usize) -> Option<usize> {
        match self.selection {
            Some(_) if count == 0 => None,
            Some(row) => Some(row.min(count - 1)),
            None => None,
        }
    }

    fn set_selection(&mut self, row: Option<usize>, store: &EntryStore) {
        let row = row.filter(|r| *r < store.len());
        if row != self.selection {
            self.selection = row;
            self.events.push(ViewEvent::SelectionChanged {
                row: row.map(|r| r as u64),
            });
        }
        self.sync_hover(store);
    }

    /// React to one journaled store change
    pub fn apply_store_change(&mut self, change: StoreChange, store: &EntryStore) {
        match change {
            StoreChange::Inserted { row } => {
                let row = row as usize;
                if let Some(sel) = self.selection.filter(|sel| *sel >= row) {
                    self.selection = Some(sel + 1);
                    self.events.push(ViewEvent::SelectionChanged {
                        row: self.selection.map(|r| r as u64),
                    });
                }
                for removal in self.removals.iter_mut().filter(|r| r.row >= row) {
                    removal.row += 1;
                }
                self.sync_viewport(store);
            }
            StoreChange::Removed { row } => {
                let row = row as usize;
                let next = match self.selection {
                    Some(sel) if sel > row => Some(sel - 1),
                    Some(_) if store.is_empty() => None,
                    Some(sel) => Some(sel.min(store.len() - 1)),
                    None => None,
                };
                if next != self.selection {
                    self.selection = next;
                    self.events.push(ViewEvent::SelectionChanged {
                        row: next.map(|r| r as u64),
                    });
                }
                for removal in self.removals.iter_mut().filter(|r| r.row > row) {
                    removal.row -= 1;
                }
                self.clamp_scroll(store.len());
                self.sync_viewport(store);
            }
            StoreChange::Reset => {
                let ids: Vec<EntryId> = self.presenters.keys().copied().collect();
                for id in ids {
                    self.destroy_presenter(id);
                }
                let clamped = self.clamp_selection(store.len());
                if clamped != self.selection {
                    self.selection = clamped;
                    self.events.push(ViewEvent::SelectionChanged {
                        row: clamped.map(|r| r as u64),
                    });
                }
                self.clamp_scroll(store.len());
                self.sync_viewport(store);
            }
            StoreChange::DataChanged | StoreChange::Reborn => {}
        }
    }

    fn clamp_scroll(&mut self, count: usize) {
        let clamped = self.scroll_offset.clamp(0.0, self.max_scroll(count));
        if clamped != self.scroll_offset {
            self.scroll_offset = clamped;
            self.events.push(ViewEvent::Scrolled { offset: clamped });
        }
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // INPUT
    // ═══════════════════════════════════════════════════════════════════════════

    /// Up: previous row, wrapping to the last one
    pub fn move_up(&mut self, store: &EntryStore) {
        let count = store.len();
        if count == 0 {
            return;
        }
        let target = match self.selection {
            Some(sel) if sel > 0 && sel < count => sel - 1,
            _ => count - 1,
        };
        self.set_selection(Some(target), store);
    }

    /// Down: next row, wrapping to the first one
    pub fn move_down(&mut self, store: &EntryStore) {
        let count = store.len();
        if count == 0 {
            return;
        }
        let target = match self.selection {
            Some(sel) if sel + 1 < count => sel + 1,
            _ => 0,
        };
        self.set_selection(Some(target), store);
    }

    pub fn select(&mut self, row: Option<usize>, store: &EntryStore) {
        self.set_selection(row, store);
    }

    /// Row under a viewport-relative pointer position, if any
    pub fn row_at(&self, y: f64, count: usize) -> Option<usize> {
        let content_y = self.scroll_offset + y;
        if content_y < 0.0 {
            return None;
        }
        let pitch = self.pitch();
        let row = (content_y / pitch).floor() as usize;
        let within = content_y - row as f64 * pitch;
        (row < count && within < f64::from(self.config.item_height)).then_some(row)
    }

    /// Hover follows the pointer, except while a removal holds the input grab.
    pub fn pointer_moved(&mut self, y: f64, store: &EntryStore) {
        if self.is_input_grabbed() {
            return;
        }
        if let Some(row) = self.row_at(y, store.len()) {
            self.set_selection(Some(row), store);
        }
    }

    /// Pointer left the panel: rows drop their hover look, selection stays.
    pub fn pointer_left(&mut self) {
        let changed: Vec<EntryId> = self
            .presenters
            .values_mut()
            .filter(|p| p.is_hovered())
            .map(|p| {
                p.focus_out();
                p.id()
            })
            .collect();
        for id in changed {
            self.emit_update(id);
        }
    }

    pub fn scroll_by(&mut self, delta: f64, store: &EntryStore) {
        let next = (self.scroll_offset + delta).clamp(0.0, self.max_scroll(store.len()));
        if next != self.scroll_offset {
            self.scroll_offset = next;
            self.events.push(ViewEvent::Scrolled { offset: next });
            self.sync_viewport(store);
        }
    }

    pub fn resize(&mut self, viewport_height: f64, store: &EntryStore) {
        self.viewport_height = viewport_height.max(0.0);
        self.clamp_scroll(store.len());
        self.sync_viewport(store);
    }

    /// Panel became visible: fresh time labels, top of the list, first row
    /// selected.
    pub fn show(&mut self, store: &EntryStore) {
        self.refresh_times(store);
        if self.scroll_offset != 0.0 {
            self.scroll_offset = 0.0;
            self.events.push(ViewEvent::Scrolled { offset: 0.0 });
        }
        self.sync_viewport(store);
        self.set_selection((!store.is_empty()).then_some(0), store);
    }

    pub fn refresh_times(&mut self, store: &EntryStore) {
        let now = self.clock.now();
        let mut changed = Vec::new();
        for p in self.presenters.values_mut() {
            if let Some(entry) = store.get(p.id()) {
                let before = p.time_label().to_string();
                p.refresh_time(entry, now);
                if p.time_label() != before {
                    changed.push(p.id());
                }
            }
        }
        for id in changed {
            self.emit_update(id);
        }
    }

    pub fn set_theme(&mut self, theme: Theme, store: &EntryStore) {
        if theme == self.theme {
            return;
        }
        self.theme = theme;
        let ctx = RenderContext {
            config: &self.config,
            theme,
            now: self.clock.now(),
        };
        let mut changed = Vec::new();
        for p in self.presenters.values_mut() {
            if let Some(entry) = store.get(p.id()) {
                p.on_theme_changed(entry, ctx);
                changed.push(p.id());
            }
        }
        for id in changed {
            self.emit_update(id);
        }
    }

    /// Tab on the selected row; returns the new close-focus state
    pub fn toggle_close_focus(&mut self, store: &EntryStore) -> bool {
        let Some(id) = self.selection.and_then(|r| store.id_at(r)) else {
            return false;
        };
        let Some(p) = self.presenters.get_mut(&id) else {
            return false;
        };
        let focused = p.toggle_close_focus();
        self.emit_update(id);
        focused
    }

    pub fn selected_close_focused(&self, store: &EntryStore) -> bool {
        self.selection
            .and_then(|r| store.id_at(r))
            .and_then(|id| self.presenters.get(&id))
            .map(|p| p.close_focused())
            .unwrap_or(false)
    }

    /// Primary activation of a row's presenter. Rows that are not
    /// materialized get a throwaway presenter for the check. Nothing is
    /// activated while a removal holds the input grab.
    pub fn activate(&mut self, id: EntryId, store: &mut EntryStore) -> Activation {
        if self.is_input_grabbed() {
            debug!(%id, "Activation ignored while input is grabbed");
            return Activation::Ignored;
        }
        let ctx = RenderContext {
            config: &self.config,
            theme: self.theme,
            now: self.clock.now(),
        };
        let outcome = match self.presenters.get_mut(&id) {
            Some(p) => p.activate(store, ctx),
            None => {
                let (Some(row), Some(entry)) = (store.row_of(id), store.get(id)) else {
                    return Activation::Missing;
                };
                let mut scratch = ItemPresenter::new(entry, id, row, self.row_y(row), ctx);
                return scratch.activate(store, ctx);
            }
        };
        if outcome == Activation::Disabled {
            self.emit_update(id);
        }
        outcome
    }

    // ═══════════════════════════════════════════════════════════════════════════
    // REMOVAL CHOREOGRAPHY
    // ═══════════════════════════════════════════════════════════════════════════

    /// Start removing `id`: grab input and slide every materialized row below
    /// it up by one pitch. The first row below that has no presenter yet gets
    /// a transient one so the gap fills from below.
    pub fn begin_removal(&mut self, id: EntryId, store: &EntryStore) -> Option<RemovalTicket> {
        let Some(row) = store.row_of(id) else {
            debug!(%id, "Removal requested for absent entry");
            return None;
        };

        self.next_ticket += 1;
        let ticket = RemovalTicket(self.next_ticket);
        let mut removal = Removal {
            ticket,
            id,
            row,
            phase: RemovalPhase::Triggered,
            committed: false,
            settled: false,
            transients: Vec::new(),
        };

        self.input_locks += 1;
        if self.input_locks == 1 {
            self.events.push(ViewEvent::InputGrabbed);
        }

        let pitch = self.pitch();
        let duration_ms = self.config.animation_ms;
        let mut shifts = Vec::new();
        for i in row + 1..store.len() {
            let Some(next) = store.id_at(i) else { break };
            match self.presenters.get_mut(&next) {
                Some(p) => {
                    let from_y = p.y();
                    p.place(p.row(), from_y - pitch);
                    shifts.push(RowShift {
                        entry_id: next.get(),
                        row: i as u64,
                        from_y,
                        to_y: from_y - pitch,
                        duration_ms,
                        transient: p.is_transient(),
                    });
                }
                None => {
                    let Some(entry) = store.get(next) else { break };
                    let from_y = self.row_y(i);
                    let mut p = ItemPresenter::new(entry, next, i, from_y - pitch, self.ctx());
                    p.set_transient(true);
                    self.presenters.insert(next, p);
                    removal.transients.push(next);
                    self.emit_update(next);
                    shifts.push(RowShift {
                        entry_id: next.get(),
                        row: i as u64,
                        from_y,
                        to_y: from_y - pitch,
                        duration_ms,
                        transient: true,
                    });
                    break;
                }
            }
        }

        self.events.push(ViewEvent::RowsShifting { shifts });
        removal.phase = RemovalPhase::Shifting;
        self.removals.push(removal);
        Some(ticket)
    }

    fn finish_if_done(&mut self, ticket: RemovalTicket) {
        self.removals
            .retain(|r| r.ticket != ticket || !(r.committed && r.settled));
    }

    /// Animation over: drop the entry from the store (if still there) and
    /// tear down the transient presenters this removal created. The store's `Reset` rebuilds the rest.
    pub fn commit_removal(&mut self, ticket: RemovalTicket, store: &mut EntryStore) -> bool {
        let Some(removal) = self.removals.iter_mut().find(|r| r.ticket == ticket) else {
            debug!(?ticket, "Commit for unknown removal ignored");
            return false;
        };
        if removal.committed {
            return false;
        }
        removal.committed = true;
        removal.phase = RemovalPhase::Committed;
        let id = removal.id;
        let transients = std::mem::take(&mut removal.transients);

        for t in transients {
            if self.presenters.get(&t).is_some_and(|p| p.is_transient()) {
                self.destroy_presenter(t);
            }
        }

        let removed = store.commit_removal(id);
        if !removed {
            // Gone through another path; no Reset will follow
            self.sync_viewport(store);
        }
        self.finish_if_done(ticket);
        removed
    }

    /// Release the input grab and select what now sits at the removed row,
    /// or the row above it.
    pub fn settle_removal(&mut self, ticket: RemovalTicket, store: &EntryStore) -> bool {
        let Some(removal) = self.removals.iter_mut().find(|r| r.ticket == ticket) else {
            debug!(?ticket, "Settle for unknown removal ignored");
            return false;
        };
        if removal.settled {
            return false;
        }
        removal.settled = true;
        if !removal.committed {
            removal.phase = RemovalPhase::Settling;
        }
        let row = removal.row;

        self.input_locks = self.input_locks.saturating_sub(1);
        if self.input_locks == 0 {
            self.events.push(ViewEvent::InputReleased);
        }

        let target = if store.is_empty() {
            None
        } else {
            Some(row.min(store.len() - 1))
        };
        self.set_selection(target, store);
        self.finish_if_done(ticket);
        true
    }

    /// Presenter geometry for the close animation of `id`
    pub fn close_animation(&self, id: EntryId) -> Option<CloseAnimation> {
        self.presenters.get(&id).map(|p| p.close(&self.config))
    }

    /// Close button: hand the fade to the host and start the removal. Ignored
    /// while another removal holds the input grab.
    pub fn close_entry(&mut self, id: EntryId, store: &EntryStore) -> Option<RemovalTicket> {
        if self.is_input_grabbed() {
            debug!(%id, "Close ignored while input is grabbed");
            return None;
        }
        store.row_of(id)?;
        if let Some(animation) = self.close_animation(id) {
            self.events.push(ViewEvent::RowClosing { animation });
        }
        self.begin_removal(id, store)
    }
}
