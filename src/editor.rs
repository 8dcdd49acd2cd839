//! URL editor workflow of the popup.
//!
//! Binds a [`UrlStateModel`] to one tab through a [`Client`] and keeps the
//! host history in a [`KeyValueStore`].
//!
//! | Action | Records history | Browser call |
//! |--------|-----------------|--------------|
//! | [`open`](Editor::open) | once | `getURL` |
//! | [`refresh`](Editor::refresh) | no | `getURL` |
//! | [`reload_page`](Editor::reload_page) | yes, before sending | `reloadPage` with URL |
//! | [`open_page`](Editor::open_page) | yes, before sending | `openURL` |
//! | [`reload`](Editor::reload) | no | `reloadPage` without URL |
//! | [`back`](Editor::back) / [`forward`](Editor::forward) | no | `forwardAndBack` |
//!
//! Field and parameter edits go through [`model_mut`](Editor::model_mut)
//! and never record anything on their own.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use tracing::{debug, info};

use crate::error::Result;
use crate::history::{HistoryStore, Suggestions};
use crate::identifiers::TabId;
use crate::options::HistoryLimits;
use crate::protocol::HistoryAction;
use crate::storage::KeyValueStore;
use crate::transport::Client;
use crate::uri::UrlStateModel;

// ============================================================================
// Editor
// ============================================================================

/// One popup session editing the URL of one tab.
pub struct Editor {
    client: Client,
    tab_id: TabId,
    model: UrlStateModel,
    history: HistoryStore,
    storage: Arc<dyn KeyValueStore>,
}

impl std::fmt::Debug for Editor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Editor")
            .field("tab_id", &self.tab_id)
            .field("url", &self.model.url())
            .field("hosts", &self.history.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Editor - Lifecycle
// ============================================================================

impl Editor {
    /// Opens the editor on `tab_id`.
    ///
    /// Loads the stored history, reads the tab's URL and records that visit.
    ///
    /// # Errors
    ///
    /// Returns storage and channel errors, or
    /// [`Error::MalformedUrl`](crate::Error::MalformedUrl) if the tab shows
    /// something that is not an absolute URL.
    pub async fn open(
        client: Client,
        tab_id: TabId,
        storage: Arc<dyn KeyValueStore>,
        limits: HistoryLimits,
    ) -> Result<Self> {
        limits.validate()?;
        let history = HistoryStore::load(storage.as_ref(), limits)?;

        let mut editor = Self {
            client,
            tab_id,
            model: UrlStateModel::new(),
            history,
            storage,
        };

        editor.refresh().await?;
        editor.commit()?;

        info!(tab_id = %tab_id, host = %editor.model.host(), "Editor opened");
        Ok(editor)
    }

    /// Re-reads the tab's URL into the model without recording it.
    ///
    /// # Errors
    ///
    /// Channel errors, or `MalformedUrl` with the model left unchanged.
    pub async fn refresh(&mut self) -> Result<()> {
        let url = self.client.get_url(self.tab_id).await?;
        self.model.load(&url)
    }

    /// Records the current state and persists the history if it changed.
    ///
    /// # Errors
    ///
    /// Returns an error if the history cannot be written.
    pub fn commit(&mut self) -> Result<bool> {
        let changed = self.model.commit(&mut self.history);
        if changed {
            self.history.save(self.storage.as_ref())?;
        }
        debug!(tab_id = %self.tab_id, changed, "Visit committed");
        Ok(changed)
    }
}

// ============================================================================
// Editor - Accessors
// ============================================================================

impl Editor {
    /// Returns the edited tab.
    #[inline]
    #[must_use]
    pub fn tab_id(&self) -> TabId {
        self.tab_id
    }

    /// Returns the model.
    #[inline]
    #[must_use]
    pub fn model(&self) -> &UrlStateModel {
        &self.model
    }

    /// Returns the model for editing.
    #[inline]
    pub fn model_mut(&mut self) -> &mut UrlStateModel {
        &mut self.model
    }

    /// Returns the host history.
    #[inline]
    #[must_use]
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Returns suggestions for the current host and focused key.
    #[must_use]
    pub fn suggestions(&self) -> Suggestions {
        self.model.suggestions(&self.history)
    }
}

// ============================================================================
// Editor - Navigation
// ============================================================================

impl Editor {
    /// Records the current URL, then loads it in the tab.
    ///
    /// # Errors
    ///
    /// Storage or channel errors.
    pub async fn reload_page(&mut self) -> Result<bool> {
        self.commit()?;
        self.client
            .reload_page(self.tab_id, Some(self.model.url()))
            .await
    }

    /// Records the current URL, then opens it in a new tab.
    ///
    /// # Errors
    ///
    /// Storage or channel errors.
    pub async fn open_page(&mut self) -> Result<bool> {
        self.commit()?;
        self.client.open_url(self.tab_id, self.model.url()).await
    }

    /// Reloads the tab as it is.
    ///
    /// # Errors
    ///
    /// Channel errors.
    pub async fn reload(&self) -> Result<bool> {
        self.client.reload_page(self.tab_id, None).await
    }

    /// Goes back in the tab's history.
    ///
    /// # Errors
    ///
    /// Channel errors.
    pub async fn back(&self) -> Result<()> {
        self.client
            .forward_and_back(self.tab_id, HistoryAction::Back)
            .await
    }

    /// Goes forward in the tab's history.
    ///
    /// # Errors
    ///
    /// Channel errors.
    pub async fn forward(&self) -> Result<()> {
        self.client
            .forward_and_back(self.tab_id, HistoryAction::Forward)
            .await
    }
}

// ============================================================================
// Editor - Host Record
// ============================================================================

impl Editor {
    /// Returns the current host's record as pretty JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_host(&self) -> Result<String> {
        self.history.export_host(self.model.host())
    }

    /// Replaces the current host's record with manually edited JSON.
    ///
    /// Blank text deletes the record.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidRecordShape`](crate::Error::InvalidRecordShape)
    /// with the history unchanged, or a storage error.
    pub fn replace_host(&mut self, text: &str) -> Result<()> {
        self.history.replace_host(self.model.host(), text)?;
        self.history.save(self.storage.as_ref())
    }

    /// Deletes the current host's record.
    ///
    /// # Errors
    ///
    /// Returns a storage error.
    pub fn delete_host(&mut self) -> Result<bool> {
        let deleted = self.history.delete_host(self.model.host());
        if deleted {
            self.history.save(self.storage.as_ref())?;
        }
        Ok(deleted)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    use crate::capture::manager::tests::RecordingInterceptor;
    use crate::error::Error;
    use crate::options::Options;
    use crate::storage::{HOST_DATA_KEY, MemoryStore};
    use crate::transport::Hub;
    use crate::transport::testing::FakeTabs;
    use crate::uri::UrlField;

    fn tab() -> TabId {
        TabId::new(1).expect("non-zero tab id")
    }

    async fn open_on(url: &str) -> (Editor, Arc<FakeTabs>, Arc<MemoryStore>) {
        let tabs = Arc::new(FakeTabs::with_tab(tab(), url));
        let hub = Hub::spawn(tabs.clone(), Arc::new(RecordingInterceptor::default()), Options::default())
            .expect("spawn");
        let storage = Arc::new(MemoryStore::new());
        let editor = Editor::open(hub.client(), tab(), storage.clone(), HistoryLimits::default())
            .await
            .expect("open");
        (editor, tabs, storage)
    }

    #[tokio::test]
    async fn test_open_records_visit_once() {
        let (editor, tabs, storage) = open_on("https://x.com/p?a=1&b=2#frag").await;

        let hints = editor.suggestions();
        assert_eq!(hints.param_keys, vec!["a", "b"]);
        assert_eq!(hints.param_values, vec!["1"]);
        assert_eq!(hints.paths, vec!["/p"]);
        assert!(tabs.actions().is_empty());
        assert!(storage.get(HOST_DATA_KEY).expect("get").is_some());
    }

    #[tokio::test]
    async fn test_edits_commit_only_on_reload_page() {
        let (mut editor, tabs, _) = open_on("https://x.com/p?a=1").await;

        let id = editor.model().params()[0].id;
        assert!(editor.model_mut().set_param_value(id, "2"));
        assert!(editor.model_mut().edit_field(UrlField::Path, "/q"));
        assert_eq!(editor.suggestions().paths, vec!["/p"]);

        assert!(editor.reload_page().await.expect("reload_page"));
        assert_eq!(editor.suggestions().paths, vec!["/q", "/p"]);
        assert_eq!(editor.suggestions().param_values, vec!["2", "1"]);
        assert_eq!(tabs.actions(), vec!["navigate 1 https://x.com/q?a=2"]);
    }

    #[tokio::test]
    async fn test_open_page_commits_then_opens() {
        let (mut editor, tabs, _) = open_on("https://x.com/").await;

        editor.model_mut().edit_field(UrlField::Fragment, "top");
        assert!(editor.open_page().await.expect("open_page"));

        assert_eq!(editor.suggestions().fragments, vec!["top"]);
        assert_eq!(tabs.actions(), vec!["open 1 https://x.com/#top"]);
    }

    #[tokio::test]
    async fn test_plain_navigation_never_commits() {
        let (editor, tabs, _) = open_on("https://x.com/p").await;
        let before = editor.history().get("x.com").cloned();

        editor.reload().await.expect("reload");
        editor.back().await.expect("back");
        editor.forward().await.expect("forward");

        assert_eq!(editor.history().get("x.com").cloned(), before);
        assert_eq!(tabs.actions(), vec!["reload 1", "back 1", "forward 1"]);
    }

    #[tokio::test]
    async fn test_refresh_preserves_param_ids() {
        let (mut editor, _, _) = open_on("https://x.com/?a=1").await;
        let id = editor.model().params()[0].id;

        editor.reload_page().await.expect("reload_page");
        editor.refresh().await.expect("refresh");
        assert_eq!(editor.model().params()[0].id, id);
    }

    #[tokio::test]
    async fn test_host_record_editing() {
        let (mut editor, _, storage) = open_on("https://x.com/p?a=1").await;

        let exported = editor.export_host().expect("export");
        editor.replace_host(&exported).expect("identity replace");

        let err = editor.replace_host(r#"{"param": [], "path": [], "fragment": []}"#).unwrap_err();
        assert!(matches!(err, Error::InvalidRecordShape { .. }));
        assert_eq!(editor.suggestions().paths, vec!["/p"]);

        editor
            .replace_host(r#"{"param": {"z": ["9"]}, "path": ["/z"], "fragment": []}"#)
            .expect("replace");
        assert_eq!(editor.suggestions().param_keys, vec!["z"]);

        assert!(editor.delete_host().expect("delete"));
        assert!(!editor.delete_host().expect("delete twice"));

        let reloaded = HistoryStore::load(storage.as_ref(), HistoryLimits::default()).expect("load");
        assert!(reloaded.get("x.com").is_none());
    }

    #[tokio::test]
    async fn test_open_fails_on_non_url() {
        let tabs = Arc::new(FakeTabs::with_tab(tab(), "not a url"));
        let hub = Hub::spawn(tabs, Arc::new(RecordingInterceptor::default()), Options::default())
            .expect("spawn");

        let err = Editor::open(hub.client(), tab(), Arc::new(MemoryStore::new()), HistoryLimits::default())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::MalformedUrl { .. }));
    }
}
