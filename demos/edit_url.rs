//! URL editing demonstration.
//!
//! Demonstrates:
//! - Opening the editor on a tab (records the visit once)
//! - Field and parameter edits with stable parameter ids
//! - Replaying the edited URL and reading host suggestions
//! - Editing the host record as JSON
//!
//! Usage:
//!   cargo run --example edit_url
//!   cargo run --example edit_url -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use common::{Args, SimulatedBrowser};
use url_workbench::{Editor, HistoryLimits, Hub, MemoryStore, Options, TabId, UrlField};

// ============================================================================
// Constants
// ============================================================================

const START_URL: &str = "https://shop.example.com/search?q=shoes&page=1#results";

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    let args = Args::parse();
    common::init_logging(args.debug);

    if let Err(e) = run().await {
        eprintln!("\n[ERROR] {e:#}");
        std::process::exit(1);
    }
}

async fn run() -> anyhow::Result<()> {
    println!("=== URL Editing ===\n");

    // ========================================================================
    // Setup
    // ========================================================================

    let tab_id = TabId::new(1).ok_or_else(|| anyhow::anyhow!("tab id must be non-zero"))?;
    let browser = Arc::new(SimulatedBrowser::new(tab_id, START_URL));
    let hub = Hub::spawn(browser.clone(), browser, Options::default())?;

    let mut editor = Editor::open(
        hub.client(),
        tab_id,
        Arc::new(MemoryStore::new()),
        HistoryLimits::default(),
    )
    .await?;
    println!("[Setup] Editing {}", editor.model().url());

    // ========================================================================
    // Edits
    // ========================================================================

    println!("\n[Edit] Parameters:");
    for entry in editor.model().params() {
        println!("        {} = {} ({})", entry.key, entry.value, entry.id);
    }

    let page = editor
        .model()
        .params()
        .iter()
        .find(|entry| entry.key == "page")
        .map(|entry| entry.id)
        .ok_or_else(|| anyhow::anyhow!("page parameter missing"))?;

    editor.model_mut().set_param_value(page, "2");
    editor.model_mut().add_param_with("sort", "price");
    editor.model_mut().edit_field(UrlField::Path, "/catalog");
    println!("        → {}", editor.model().url());

    // ========================================================================
    // Replay
    // ========================================================================

    println!("\n[Replay] Reloading the tab at the edited URL...");
    editor.reload_page().await?;

    editor.model_mut().focus_key("page");
    let hints = editor.suggestions();
    println!("        keys:      {:?}", hints.param_keys);
    println!("        page:      {:?}", hints.param_values);
    println!("        paths:     {:?}", hints.paths);
    println!("        fragments: {:?}", hints.fragments);

    // ========================================================================
    // Host Record
    // ========================================================================

    println!("\n[Record] Stored JSON for {}:", editor.model().host());
    println!("{}", editor.export_host()?);

    if let Err(e) = editor.replace_host(r#"{"param": {"q": "boots"}, "path": [], "fragment": []}"#) {
        println!("        ✓ Rejected bad edit: {e}");
    }

    hub.shutdown();
    println!("\n=== Done ===");
    Ok(())
}
