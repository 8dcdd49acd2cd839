//! In-memory browser used by the hub and editor tests.

use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::{Error, Result};
use crate::identifiers::TabId;
use crate::protocol::{LinkCategory, LinkMap, link_entries};

use super::hub::TabController;

/// Tabs with a current URL each. Every mutating call is logged.
#[derive(Debug, Default)]
pub(crate) struct FakeTabs {
    urls: Mutex<FxHashMap<TabId, String>>,
    log: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl FakeTabs {
    pub(crate) fn with_tab(tab_id: TabId, url: &str) -> Self {
        let tabs = Self::default();
        tabs.urls.lock().insert(tab_id, url.to_string());
        tabs
    }

    pub(crate) fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub(crate) fn actions(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    fn record(&self, tab_id: TabId, action: &str) -> Result<()> {
        if !self.urls.lock().contains_key(&tab_id) {
            return Err(Error::tab_not_found(tab_id));
        }
        self.log.lock().push(action.to_string());
        Ok(())
    }
}

#[async_trait]
impl TabController for FakeTabs {
    async fn get_url(&self, tab_id: TabId) -> Result<String> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.urls
            .lock()
            .get(&tab_id)
            .cloned()
            .ok_or_else(|| Error::tab_not_found(tab_id))
    }

    async fn navigate(&self, tab_id: TabId, url: &str) -> Result<()> {
        self.record(tab_id, &format!("navigate {tab_id} {url}"))?;
        self.urls.lock().insert(tab_id, url.to_string());
        Ok(())
    }

    async fn reload(&self, tab_id: TabId) -> Result<()> {
        self.record(tab_id, &format!("reload {tab_id}"))
    }

    async fn open(&self, tab_id: TabId, url: &str) -> Result<()> {
        self.record(tab_id, &format!("open {tab_id} {url}"))
    }

    async fn go_back(&self, tab_id: TabId) -> Result<()> {
        self.record(tab_id, &format!("back {tab_id}"))
    }

    async fn go_forward(&self, tab_id: TabId) -> Result<()> {
        self.record(tab_id, &format!("forward {tab_id}"))
    }

    async fn links(&self, tab_id: TabId, categories: &[LinkCategory]) -> Result<LinkMap> {
        self.get_url(tab_id).await?;
        Ok(categories
            .iter()
            .map(|category| {
                let urls = match category {
                    LinkCategory::A => vec!["https://a/1", "", "https://a/2"],
                    LinkCategory::Img => vec!["https://img/1"],
                    LinkCategory::Iframe => vec![],
                };
                (*category, link_entries(urls))
            })
            .collect())
    }
}
