use std::sync::atomic::{AtomicU64, Ordering};

use tokio::sync::watch;

use crate::domain::DocumentId;

/// The authoritative state of an entity service.
///
/// `items` is the list projection, `selected_id` the entity the user picked
/// and `current` its full detail once loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListState<I, D> {
    /// List projections in display order.
    pub items: Vec<I>,
    /// The selected entity.
    pub selected_id: Option<DocumentId>,
    /// Full detail of the selected entity; `None` while nothing is
    /// selected or when it does not exist.
    pub current: Option<D>,
}

impl<I, D> Default for ListState<I, D> {
    fn default() -> Self {
        Self {
            items: Vec::new(),
            selected_id: None,
            current: None,
        }
    }
}

/// A watch channel holding a [`ListState`], plus the selection ticket.
///
/// Every selection draws a ticket; a detail result is applied only if no
/// later selection was made while it was loading.
#[derive(Debug)]
pub(crate) struct StateCell<I, D> {
    sender: watch::Sender<ListState<I, D>>,
    ticket: AtomicU64,
}

impl<I, D> StateCell<I, D> {
    pub(crate) fn new() -> Self {
        Self {
            sender: watch::Sender::new(ListState::default()),
            ticket: AtomicU64::new(0),
        }
    }

    pub(crate) fn subscribe(&self) -> watch::Receiver<ListState<I, D>> {
        self.sender.subscribe()
    }

    pub(crate) fn selected_id(&self) -> Option<DocumentId> {
        self.sender.borrow().selected_id.clone()
    }

    /// Reads the current state without cloning it.
    pub(crate) fn with<R>(&self, f: impl FnOnce(&ListState<I, D>) -> R) -> R {
        f(&self.sender.borrow())
    }

    pub(crate) fn set_items(&self, items: Vec<I>) {
        self.sender.send_modify(|state| state.items = items);
    }

    /// Records a new selection and returns its ticket.
    pub(crate) fn begin_select(&self, id: &DocumentId) -> u64 {
        let ticket = self.ticket.fetch_add(1, Ordering::SeqCst) + 1;
        self.sender
            .send_modify(|state| state.selected_id = Some(id.clone()));
        ticket
    }

    /// Applies a detail result, unless a later selection superseded it.
    ///
    /// Returns whether the result was applied.
    pub(crate) fn finish_select(&self, ticket: u64, detail: Option<D>) -> bool {
        self.sender.send_if_modified(|state| {
            if self.ticket.load(Ordering::SeqCst) == ticket {
                state.current = detail;
                true
            } else {
                false
            }
        })
    }

    /// Whether `ticket` is still the latest selection.
    pub(crate) fn is_latest(&self, ticket: u64) -> bool {
        self.ticket.load(Ordering::SeqCst) == ticket
    }

    /// Drops the selection and any detail still loading.
    pub(crate) fn clear_selection(&self) {
        self.ticket.fetch_add(1, Ordering::SeqCst);
        self.sender.send_modify(|state| {
            state.selected_id = None;
            state.current = None;
        });
    }

    /// Selects an entity whose detail is already at hand.
    pub(crate) fn select_now(&self, id: &DocumentId, detail: Option<D>) {
        let ticket = self.begin_select(id);
        self.finish_select(ticket, detail);
    }
}

impl<I: Clone, D: Clone> StateCell<I, D> {
    pub(crate) fn snapshot(&self) -> ListState<I, D> {
        self.sender.borrow().clone()
    }
}
