//! Browser-backed snapshot persistence with a debounced writer.

use gloo_timers::future::TimeoutFuture;
use leptos::prelude::*;
use log::warn;
use wasm_bindgen_futures::spawn_local;

use crate::canvas::persistence::{
	self, Snapshot, SnapshotBackend, SNAPSHOT_DEBOUNCE_MS, SNAPSHOT_KEY,
};
use crate::canvas::CanvasStore;

/// `localStorage` implementation of the snapshot seam. Storage being
/// unavailable (private mode, disabled) degrades to a warning, never an
/// error.
#[derive(Clone, Copy, Debug, Default)]
pub struct BrowserStorage;

impl BrowserStorage {
	fn storage() -> Option<web_sys::Storage> {
		web_sys::window()?.local_storage().ok().flatten()
	}
}

impl SnapshotBackend for BrowserStorage {
	fn read(&self) -> Option<String> {
		Self::storage()?.get_item(SNAPSHOT_KEY).ok().flatten()
	}

	fn write(&self, snapshot: &str) {
		let Some(storage) = Self::storage() else {
			warn!("localStorage unavailable, skipping snapshot write");
			return;
		};
		if let Err(err) = storage.set_item(SNAPSHOT_KEY, snapshot) {
			warn!("failed to write snapshot: {err:?}");
		}
	}
}

/// Restore the previous session's snapshot, if any.
pub fn restore_last_session(store: RwSignal<CanvasStore>) {
	store.update(|s| persistence::restore(s, &BrowserStorage));
}

/// Write a snapshot after every committed mutation to persisted state,
/// coalescing bursts (drag deltas) into one write per debounce window.
pub fn spawn_autosave(store: RwSignal<CanvasStore>) {
	let pending = StoredValue::new(false);
	let last_written = StoredValue::new(0u64);
	Effect::new(move |_| {
		let revision = store.with(|s| s.revision());
		if revision == last_written.get_value() || pending.get_value() {
			return;
		}
		pending.set_value(true);
		spawn_local(async move {
			TimeoutFuture::new(SNAPSHOT_DEBOUNCE_MS).await;
			pending.set_value(false);
			let json = store
				.try_with_untracked(|s| {
					last_written.set_value(s.revision());
					Snapshot::capture(s).to_json()
				})
				.flatten();
			if let Some(json) = json {
				BrowserStorage.write(&json);
			}
		});
	});
}
