//! Shared utilities for demos.
//!
//! Provides common functionality used across all demos:
//! - Command-line argument parsing
//! - Logging initialization
//! - A simulated browser with one tab

#![allow(dead_code)]

// ============================================================================
// Imports
// ============================================================================

use async_trait::async_trait;
use parking_lot::Mutex;
use tracing_subscriber::EnvFilter;

use url_workbench::protocol::{LinkCategory, LinkMap, link_entries};
use url_workbench::{Error, InterceptId, RequestInterceptor, Result, TabController, TabId};

// ============================================================================
// Types
// ============================================================================

/// Command-line arguments for demos.
#[derive(Debug, Clone)]
pub struct Args {
    pub debug: bool,
}

impl Args {
    /// Parse command-line arguments.
    pub fn parse() -> Self {
        let args: Vec<String> = std::env::args().collect();
        Self {
            debug: args.iter().any(|a| a == "--debug"),
        }
    }
}

// ============================================================================
// Functions
// ============================================================================

/// Initialize tracing/logging.
pub fn init_logging(debug: bool) {
    let filter = if debug {
        "url_workbench=debug"
    } else {
        "url_workbench=info"
    };

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::new(filter))
        .with_target(false)
        .init();
}

// ============================================================================
// SimulatedBrowser
// ============================================================================

/// One tab whose URL changes on navigation. Prints every browser call.
pub struct SimulatedBrowser {
    tab_id: TabId,
    url: Mutex<String>,
    intercepts: Mutex<u32>,
}

impl SimulatedBrowser {
    pub fn new(tab_id: TabId, url: &str) -> Self {
        Self {
            tab_id,
            url: Mutex::new(url.to_string()),
            intercepts: Mutex::new(0),
        }
    }

    fn check(&self, tab_id: TabId) -> Result<()> {
        if tab_id == self.tab_id {
            Ok(())
        } else {
            Err(Error::tab_not_found(tab_id))
        }
    }
}

#[async_trait]
impl TabController for SimulatedBrowser {
    async fn get_url(&self, tab_id: TabId) -> Result<String> {
        self.check(tab_id)?;
        Ok(self.url.lock().clone())
    }

    async fn navigate(&self, tab_id: TabId, url: &str) -> Result<()> {
        self.check(tab_id)?;
        println!("        [browser] navigate tab {tab_id} → {url}");
        *self.url.lock() = url.to_string();
        Ok(())
    }

    async fn reload(&self, tab_id: TabId) -> Result<()> {
        self.check(tab_id)?;
        println!("        [browser] reload tab {tab_id}");
        Ok(())
    }

    async fn open(&self, tab_id: TabId, url: &str) -> Result<()> {
        self.check(tab_id)?;
        println!("        [browser] open {url} next to tab {tab_id}");
        Ok(())
    }

    async fn go_back(&self, tab_id: TabId) -> Result<()> {
        self.check(tab_id)?;
        println!("        [browser] back in tab {tab_id}");
        Ok(())
    }

    async fn go_forward(&self, tab_id: TabId) -> Result<()> {
        self.check(tab_id)?;
        println!("        [browser] forward in tab {tab_id}");
        Ok(())
    }

    async fn links(&self, tab_id: TabId, categories: &[LinkCategory]) -> Result<LinkMap> {
        self.check(tab_id)?;
        Ok(categories
            .iter()
            .map(|category| (*category, link_entries(["https://example.com/about"])))
            .collect())
    }
}

impl RequestInterceptor for SimulatedBrowser {
    fn install(&self, tab_id: TabId) -> Result<InterceptId> {
        self.check(tab_id)?;
        let mut count = self.intercepts.lock();
        *count += 1;
        println!("        [browser] request listener #{count} installed on tab {tab_id}");
        Ok(InterceptId::new(format!("listener-{count}")))
    }

    fn remove(&self, id: &InterceptId) {
        println!("        [browser] request listener {id} removed");
    }
}
