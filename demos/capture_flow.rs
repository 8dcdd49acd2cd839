//! Request capture demonstration.
//!
//! Demonstrates:
//! - Storing named capture rules
//! - Opening a capture session through a popup port
//! - Regex filtering and de-duplication of observed requests
//! - Session hand-over between ports and stop on disconnect
//!
//! Usage:
//!   cargo run --example capture_flow
//!   cargo run --example capture_flow -- --debug

mod common;

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;

use serde_json::json;

use common::{Args, SimulatedBrowser};
use url_workbench::protocol::{Event, ListenerControl};
use url_workbench::{CaptureRules, Hub, MemoryStore, Options, TabId, validate_pattern};

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
    println!("=== Request Capture ===\n");

    // ========================================================================
    // Rules
    // ========================================================================

    let storage = MemoryStore::new();
    let mut rules = CaptureRules::load(&storage)?;
    rules.add("dev", "api", r"^https://api\.example\.com/")?;
    rules.add("dev", "login", r"/sso/callback\?ticket=")?;
    rules.save(&storage)?;

    if let Err(e) = validate_pattern("(unclosed") {
        println!("[Rules] ✓ Invalid pattern reported: {e}");
    }

    let pattern = rules
        .pattern("dev", "api")
        .ok_or_else(|| anyhow::anyhow!("rule dev/api missing"))?
        .to_string();
    println!("[Rules] Using dev/api → {pattern}\n");

    // ========================================================================
    // Session
    // ========================================================================

    let tab_id = TabId::new(7).ok_or_else(|| anyhow::anyhow!("tab id must be non-zero"))?;
    let browser = Arc::new(SimulatedBrowser::new(tab_id, "https://example.com/"));
    let hub = Hub::spawn(browser.clone(), browser, Options::default())?;
    let client = hub.client();

    println!("[Session] Opening capture from popup A...");
    let popup_a = hub.connect();
    popup_a.post(ListenerControl::open(tab_id, pattern.as_str()))?;

    for url in [
        "https://api.example.com/v1/user",
        "https://cdn.example.com/app.js",
        "https://api.example.com/v1/user",
        "https://api.example.com/v1/cart",
    ] {
        hub.dispatch_event(Event::new(
            "webRequest.beforeRequest",
            json!({"tabId": tab_id.as_u32(), "url": url, "method": "GET"}),
        ))?;
    }

    let captured = client.get_request_url("api").await?;
    println!("        ✓ {} requests captured", captured.len());
    for event in &captured {
        println!("          {} {}", event.method, event.url);
    }

    // ========================================================================
    // Hand-over
    // ========================================================================

    println!("\n[Session] Popup B takes over...");
    let popup_b = hub.connect();
    popup_b.post(ListenerControl::open(tab_id, pattern.as_str()))?;
    drop(popup_a);
    println!(
        "        ✓ Buffer after hand-over: {}",
        client.get_request_url("api").await?.len()
    );

    drop(popup_b);
    println!(
        "        ✓ Buffer after popup B closed: {}",
        client.get_request_url("api").await?.len()
    );

    hub.shutdown();
    println!("\n=== Done ===");
    Ok(())
}
