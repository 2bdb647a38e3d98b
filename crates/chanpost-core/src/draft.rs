//! Draft data model, composition state machine, and the per-operator store.
//!
//! A draft is the exclusive property of its owner: the store hands out
//! mutations only under its lock, and the dispatcher serializes events per
//! operator, so item/cursor updates are never contended.

use std::collections::HashMap;

use tokio::sync::Mutex;

use crate::{
    buttons::{parse_button_lines, ParseReport},
    domain::{FileId, UserId},
    errors::ValidationError,
    Error, Result,
};

/// An external-link button attached to a post item.
///
/// Immutable once constructed; buttons are removed only by popping the last
/// one, never edited in place. Operator input goes through
/// [`crate::buttons::parse_button_lines`], which enforces the label/scheme
/// invariants before construction.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LinkButton {
    label: String,
    url: String,
}

impl LinkButton {
    pub fn new(label: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            url: url.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// One image+caption+buttons unit within a draft.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostItem {
    pub media: FileId,
    pub caption: String,
    pub buttons: Vec<LinkButton>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftMode {
    Single,
    Multiple,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DraftState {
    AwaitingMedia,
    Editing,
    AwaitingLink,
}

/// The editable view for the current cursor position.
#[derive(Clone, Copy, Debug)]
pub struct EditView<'a> {
    pub item: &'a PostItem,
    pub position: usize,
    pub total: usize,
    pub show_prev: bool,
    pub show_next: bool,
}

/// An in-progress, unpublished batch of post items owned by one operator.
#[derive(Clone, Debug)]
pub struct PostDraft {
    owner: UserId,
    mode: DraftMode,
    items: Vec<PostItem>,
    cursor: usize,
    state: DraftState,
}

impl PostDraft {
    fn new(owner: UserId, mode: DraftMode) -> Self {
        Self {
            owner,
            mode,
            items: Vec::new(),
            cursor: 0,
            state: DraftState::AwaitingMedia,
        }
    }

    pub fn owner(&self) -> UserId {
        self.owner
    }

    pub fn mode(&self) -> DraftMode {
        self.mode
    }

    pub fn state(&self) -> DraftState {
        self.state
    }

    pub fn items(&self) -> &[PostItem] {
        &self.items
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Accept a new image+caption from the operator.
    ///
    /// Appends a fresh item, jumps the cursor to it, and moves to `Editing`.
    /// Returns the new item count. Single mode caps the draft at one item.
    pub fn receive_media(&mut self, media: FileId, caption: &str) -> Result<usize> {
        if caption.trim().is_empty() {
            return Err(ValidationError::MissingCaption.into());
        }
        if self.mode == DraftMode::Single && !self.items.is_empty() {
            return Err(ValidationError::SingleModeExceeded.into());
        }

        self.items.push(PostItem {
            media,
            caption: caption.to_string(),
            buttons: Vec::new(),
        });
        self.cursor = self.items.len() - 1;
        self.state = DraftState::Editing;
        Ok(self.items.len())
    }

    /// `Editing -> AwaitingLink`. Returns false (and stays put) from any
    /// other state; `AwaitingLink` is never entered from `AwaitingMedia`.
    pub fn begin_link_entry(&mut self) -> bool {
        if self.state != DraftState::Editing {
            return false;
        }
        self.state = DraftState::AwaitingLink;
        true
    }

    /// `AwaitingLink -> Editing`. No-op in any other state.
    pub fn finish_link_entry(&mut self) {
        if self.state == DraftState::AwaitingLink {
            self.state = DraftState::Editing;
        }
    }

    /// Parse a link submission into the current item's buttons.
    ///
    /// Only meaningful while `AwaitingLink`; other states report nothing
    /// added so the caller can ignore stray text.
    pub fn add_buttons(&mut self, text: &str) -> ParseReport {
        if self.state != DraftState::AwaitingLink || self.items.is_empty() {
            return ParseReport::default();
        }
        let buttons = &mut self.items[self.cursor].buttons;
        parse_button_lines(text, buttons)
    }

    /// Pop the most recently added button of the current item.
    pub fn delete_last_button(&mut self) -> Result<LinkButton> {
        let removed = self
            .items
            .get_mut(self.cursor)
            .and_then(|item| item.buttons.pop());
        removed.ok_or_else(|| ValidationError::NothingToDelete.into())
    }

    /// Move the cursor forward; saturating no-op at the last item.
    pub fn next(&mut self) {
        if self.cursor + 1 < self.items.len() {
            self.cursor += 1;
        }
    }

    /// Move the cursor back; saturating no-op at index 0.
    pub fn prev(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
        }
    }

    /// The rendered view for the current cursor, `None` while no item exists.
    pub fn view(&self) -> Option<EditView<'_>> {
        let item = self.items.get(self.cursor)?;
        Some(EditView {
            item,
            position: self.cursor,
            total: self.items.len(),
            show_prev: self.cursor > 0,
            show_next: self.cursor + 1 < self.items.len(),
        })
    }
}

/// Process-wide mapping from operator to at most one active draft.
///
/// Injected everywhere (never ambient global state) so each test gets an
/// isolated instance.
#[derive(Debug, Default)]
pub struct DraftStore {
    inner: Mutex<HashMap<UserId, PostDraft>>,
}

impl DraftStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a fresh draft, unconditionally replacing any existing one.
    pub async fn start(&self, owner: UserId, mode: DraftMode) {
        let mut map = self.inner.lock().await;
        map.insert(owner, PostDraft::new(owner, mode));
    }

    /// Remove the owner's draft. Returns false if there was none.
    pub async fn discard(&self, owner: UserId) -> bool {
        self.inner.lock().await.remove(&owner).is_some()
    }

    pub async fn contains(&self, owner: UserId) -> bool {
        self.inner.lock().await.contains_key(&owner)
    }

    /// Run `f` against the owner's draft under the store lock.
    pub async fn with<R>(&self, owner: UserId, f: impl FnOnce(&mut PostDraft) -> R) -> Result<R> {
        let mut map = self.inner.lock().await;
        let draft = map.get_mut(&owner).ok_or(Error::SessionExpired)?;
        Ok(f(draft))
    }

    /// Clone the owner's draft (publisher works from a snapshot).
    pub async fn snapshot(&self, owner: UserId) -> Result<PostDraft> {
        let map = self.inner.lock().await;
        map.get(&owner).cloned().ok_or(Error::SessionExpired)
    }
}
