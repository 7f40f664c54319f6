//! Declarative-sync bridge: reconciles externally supplied configuration
//! against the scene.
//!
//! The bridge observes six independent inputs — background image reference,
//! background fill color, one pending text spec, one pending emoji, one
//! pending image reference, and two advisory lists (palette, emoji pool). The
//! three slot-bound inputs follow the same algorithm on every change: evict
//! the slot's occupant, stop if the new value is empty, insert the new layer,
//! and notify listeners only when the value differs from the last one that
//! actually landed in that slot.
//!
//! Image inputs resolve asynchronously through the host. Every request is
//! stamped with a monotonically increasing generation; a completion whose
//! generation is no longer current is discarded, so a slow older fetch can
//! never clobber a newer one.

#[cfg(test)]
#[path = "sync_test.rs"]
mod sync_test;

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::consts::MAX_UPLOAD_BYTES;
use crate::scene::{Script, Slot};

/// The pending free-text specification supplied by the host.
///
/// Applied by the explicit add-text action, not by any singleton slot.
/// Absent fields fall back to engine defaults (and the advisory palette for
/// color).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextSpec {
    pub value: String,
    pub font_size: Option<f64>,
    pub color: Option<String>,
    pub bold: Option<bool>,
    pub italic: Option<bool>,
    pub underline: Option<bool>,
    pub script: Option<Script>,
}

/// Rejection reasons for a local file upload, surfaced to the user verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UploadError {
    #[error("That image is too large ({size_bytes} bytes). The limit is 10 MB.")]
    TooLarge { size_bytes: u64 },
    #[error("Only image files can be added to the design (got \"{mime}\").")]
    NotAnImage { mime: String },
}

/// Validate a local file before any scene mutation or decode attempt.
///
/// # Errors
///
/// Returns [`UploadError`] when the file exceeds the 10 MB cap or its MIME
/// type is not `image/*`.
pub fn validate_upload(mime: &str, size_bytes: u64) -> Result<(), UploadError> {
    if !mime.starts_with("image/") {
        return Err(UploadError::NotAnImage { mime: mime.to_owned() });
    }
    if size_bytes > MAX_UPLOAD_BYTES {
        return Err(UploadError::TooLarge { size_bytes });
    }
    Ok(())
}

/// Where an asynchronous image resolution should land.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadTarget {
    /// One of the singleton slots; subject to stale-response suppression.
    Slot(Slot),
    /// A free-standing layer from an explicit user add; never deduplicated.
    Free,
}

/// An outstanding image request for a slot.
#[derive(Debug, Clone)]
struct PendingSlotLoad {
    generation: u64,
    url: String,
    notify: bool,
}

/// A committed image resolution, ready to become a layer.
#[derive(Debug, Clone)]
pub(crate) struct CommittedLoad {
    pub url: String,
    pub slot: Option<Slot>,
    pub notify: bool,
}

/// Runtime state of the declarative-sync bridge.
#[derive(Debug, Default)]
pub struct SyncBridge {
    /// Pending free-text spec for the next explicit add-text action.
    pub pending_text: Option<TextSpec>,
    /// Advisory palette; the head color styles default-added text.
    pub palette: Vec<String>,
    /// Advisory pool for the explicit add-random-emoji action.
    pub emoji_pool: Vec<String>,
    last_applied: HashMap<Slot, String>,
    slot_loads: HashMap<Slot, PendingSlotLoad>,
    free_loads: HashMap<u64, String>,
    next_generation: u64,
}

impl SyncBridge {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a synchronous slot application (emoji) and report whether a
    /// layer-added notification is due. Re-applying the current value is not
    /// a new occupant and emits nothing.
    pub fn note_applied(&mut self, slot: Slot, value: &str) -> bool {
        let changed = self.last_applied.get(&slot).map(String::as_str) != Some(value);
        self.last_applied.insert(slot, value.to_owned());
        changed
    }

    /// Forget a slot's applied value and cancel any outstanding request, so a
    /// later re-application of the same value counts as a new occupant.
    pub fn forget_slot(&mut self, slot: Slot) {
        self.last_applied.remove(&slot);
        self.slot_loads.remove(&slot);
    }

    /// Begin an asynchronous image resolution for a slot, superseding any
    /// outstanding request for the same slot. Returns the generation the host
    /// must echo back on completion.
    ///
    /// The dedupe record is stamped at commit time, not here: a duplicate
    /// request for a value that never committed must still notify when the
    /// surviving request lands.
    pub fn begin_slot_load(&mut self, slot: Slot, url: &str) -> u64 {
        let notify = self.last_applied.get(&slot).map(String::as_str) != Some(url);
        let generation = self.next_gen();
        self.slot_loads.insert(
            slot,
            PendingSlotLoad { generation, url: url.to_owned(), notify },
        );
        generation
    }

    /// Begin an asynchronous image resolution for a free-standing layer.
    pub fn begin_free_load(&mut self, url: &str) -> u64 {
        let generation = self.next_gen();
        self.free_loads.insert(generation, url.to_owned());
        generation
    }

    /// Commit a finished resolution. Returns `None` when the completion is
    /// stale (a newer request superseded it) or unknown, in which case the
    /// result must be dropped.
    pub(crate) fn commit_load(&mut self, target: LoadTarget, generation: u64) -> Option<CommittedLoad> {
        match target {
            LoadTarget::Slot(slot) => {
                let current = self.slot_loads.get(&slot)?;
                if current.generation != generation {
                    return None;
                }
                let pending = self.slot_loads.remove(&slot)?;
                self.last_applied.insert(slot, pending.url.clone());
                Some(CommittedLoad {
                    url: pending.url,
                    slot: Some(slot),
                    notify: pending.notify,
                })
            }
            LoadTarget::Free => self.free_loads.remove(&generation).map(|url| CommittedLoad {
                url,
                slot: None,
                notify: true,
            }),
        }
    }

    /// Abandon a failed resolution. Returns the URL when the failure matched
    /// the current request (for logging); stale failures are ignored. The
    /// slot is left empty, not reverted — its previous occupant was already
    /// evicted when the new value arrived.
    pub fn fail_load(&mut self, target: LoadTarget, generation: u64) -> Option<String> {
        match target {
            LoadTarget::Slot(slot) => {
                if self.slot_loads.get(&slot)?.generation != generation {
                    return None;
                }
                self.last_applied.remove(&slot);
                self.slot_loads.remove(&slot).map(|p| p.url)
            }
            LoadTarget::Free => self.free_loads.remove(&generation),
        }
    }

    /// Whether a slot has an outstanding (uncommitted) image request.
    #[must_use]
    pub fn load_in_flight(&self, slot: Slot) -> bool {
        self.slot_loads.contains_key(&slot)
    }

    fn next_gen(&mut self) -> u64 {
        self.next_generation += 1;
        self.next_generation
    }
}
