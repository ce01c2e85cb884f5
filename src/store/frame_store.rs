use std::collections::HashSet;

use crate::{
    codec::payload::EncodedImage,
    foundation::{
        core::epoch_millis,
        error::{FlipbookError, FlipbookResult},
    },
    store::{
        frame::{Frame, FrameId},
        storage::StorageBackend,
    },
};

/// Storage key of the persisted frame sequence.
pub const FRAMES_STORAGE_KEY: &str = "flipbook.frames";

/// Handle returned by [`FrameStore::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Listener = Box<dyn FnMut(&[Frame])>;

/// Authoritative ordered frame sequence with durable persistence.
///
/// Every mutation serializes the full sequence and writes it under one key before the in-memory
/// state changes. A failed write leaves both the record and the in-memory sequence as they were.
/// Mutations take `&mut self`; callers serialize them.
pub struct FrameStore {
    backend: Box<dyn StorageBackend>,
    key: String,
    frames: Vec<Frame>,
    last_created_at: i64,
    listeners: Vec<(SubscriptionId, Listener)>,
    next_subscription: u64,
}

impl std::fmt::Debug for FrameStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FrameStore")
            .field("key", &self.key)
            .field("frames", &self.frames.len())
            .field("listeners", &self.listeners.len())
            .finish()
    }
}

impl FrameStore {
    /// Open the store under [`FRAMES_STORAGE_KEY`], hydrating any persisted sequence.
    pub fn open(backend: impl StorageBackend + 'static) -> Self {
        Self::open_with_key(backend, FRAMES_STORAGE_KEY)
    }

    /// Open the store under a custom key.
    ///
    /// An absent, unreadable or corrupt record hydrates as an empty sequence.
    pub fn open_with_key(backend: impl StorageBackend + 'static, key: impl Into<String>) -> Self {
        let key = key.into();
        let frames = hydrate(&backend, &key);
        let last_created_at = frames.iter().map(Frame::created_at).max().unwrap_or(0);
        tracing::debug!(key = %key, frames = frames.len(), "frame store opened");

        Self {
            backend: Box::new(backend),
            key,
            frames,
            last_created_at,
            listeners: Vec::new(),
            next_subscription: 0,
        }
    }

    /// Storage key this store persists under.
    pub fn storage_key(&self) -> &str {
        &self.key
    }

    /// Owned snapshot of the sequence; mutating it does not affect the store.
    pub fn list(&self) -> Vec<Frame> {
        self.frames.clone()
    }

    /// Borrowed view of the sequence.
    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames.len()
    }

    /// `true` when the sequence is empty.
    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Frame with `id`, if present.
    pub fn get(&self, id: &FrameId) -> Option<&Frame> {
        self.frames.iter().find(|f| f.id() == id)
    }

    /// Position of the frame with `id`, if present.
    pub fn index_of(&self, id: &FrameId) -> Option<usize> {
        self.frames.iter().position(|f| f.id() == id)
    }

    /// Last frame of the sequence: the onion-skin reference for the next capture.
    pub fn latest(&self) -> Option<&Frame> {
        self.frames.last()
    }

    /// Append a new frame holding `image`.
    #[tracing::instrument(skip(self, image), fields(key = %self.key, len = image.len()))]
    pub fn add(&mut self, image: EncodedImage) -> FlipbookResult<Frame> {
        let created_at = epoch_millis().max(self.last_created_at);
        let frame = Frame::new(FrameId::generate(), image, created_at);

        let mut next = self.frames.clone();
        next.push(frame.clone());
        self.commit(next)?;

        self.last_created_at = created_at;
        tracing::info!(id = %frame.id(), frames = self.frames.len(), "frame added");
        Ok(frame)
    }

    /// Remove the frame with `id`. Returns `false` (and writes nothing) when it is absent.
    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub fn delete(&mut self, id: &FrameId) -> FlipbookResult<bool> {
        let Some(index) = self.index_of(id) else {
            tracing::debug!("delete of unknown frame ignored");
            return Ok(false);
        };

        let mut next = self.frames.clone();
        next.remove(index);
        self.commit(next)?;

        tracing::info!(index, frames = self.frames.len(), "frame deleted");
        Ok(true)
    }

    /// Move the frame at `from` to `to`, shifting the frames in between.
    ///
    /// Out-of-range indices (and `from == to`) leave the store untouched and return `false`.
    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub fn reorder(&mut self, from: usize, to: usize) -> FlipbookResult<bool> {
        let len = self.frames.len();
        if from >= len || to >= len || from == to {
            return Ok(false);
        }

        let mut next = self.frames.clone();
        let frame = next.remove(from);
        next.insert(to, frame);
        self.commit(next)?;

        tracing::info!("frame moved");
        Ok(true)
    }

    /// Remove every frame.
    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub fn clear_all(&mut self) -> FlipbookResult<()> {
        self.commit(Vec::new())?;
        tracing::info!("frames cleared");
        Ok(())
    }

    /// Delete the persisted record and empty the sequence.
    ///
    /// Unlike [`FrameStore::clear_all`], nothing is left under the key afterwards.
    #[tracing::instrument(skip(self), fields(key = %self.key))]
    pub fn purge(&mut self) -> FlipbookResult<()> {
        self.backend.remove(&self.key)?;
        self.frames.clear();
        self.last_created_at = 0;
        for (_, listener) in &mut self.listeners {
            listener(&self.frames);
        }
        tracing::info!("frame record purged");
        Ok(())
    }

    /// Register a listener called with the full sequence after every successful mutation.
    pub fn subscribe(&mut self, listener: impl FnMut(&[Frame]) + 'static) -> SubscriptionId {
        let id = SubscriptionId(self.next_subscription);
        self.next_subscription += 1;
        self.listeners.push((id, Box::new(listener)));
        id
    }

    /// Remove a listener. Returns `false` if it was not registered.
    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        let before = self.listeners.len();
        self.listeners.retain(|(sid, _)| *sid != id);
        self.listeners.len() != before
    }

    fn commit(&mut self, next: Vec<Frame>) -> FlipbookResult<()> {
        let json = serde_json::to_string(&next)
            .map_err(|e| FlipbookError::serde(format!("serialize frames: {e}")))?;

        if let Err(e) = self.backend.write(&self.key, &json) {
            tracing::warn!(error = %e, bytes = json.len(), "frame sequence not persisted");
            return Err(e);
        }

        self.frames = next;
        for (_, listener) in &mut self.listeners {
            listener(&self.frames);
        }
        Ok(())
    }
}

fn hydrate(backend: &dyn StorageBackend, key: &str) -> Vec<Frame> {
    let raw = match backend.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return Vec::new(),
        Err(e) => {
            tracing::warn!(key, error = %e, "frame record unreadable, starting empty");
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Frame>>(&raw) {
        Ok(frames) if has_duplicate_ids(&frames) => {
            tracing::warn!(key, "frame record has duplicate ids, starting empty");
            Vec::new()
        }
        Ok(frames) => frames,
        Err(e) => {
            tracing::warn!(key, error = %e, "frame record corrupt, starting empty");
            Vec::new()
        }
    }
}

fn has_duplicate_ids(frames: &[Frame]) -> bool {
    let mut seen = HashSet::with_capacity(frames.len());
    !frames.iter().all(|f| seen.insert(f.id()))
}

#[cfg(test)]
#[path = "../../tests/unit/store/frame_store.rs"]
mod tests;
