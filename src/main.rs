// src/main.rs
// =============================================================================
// This is the entry point of our CLI application.
//
// What happens here:
// 1. Parse command-line arguments using clap
// 2. Dispatch to the appropriate subcommand handler
// 3. Collect results and print them
// 4. Exit with proper code (0 = success, 1 = no preview / unsafe, 2 = error)
//
// The heavy lifting lives in the library (safety guard, redirect walk,
// extraction); this file only shells out to it and formats results.
// =============================================================================

mod cli;

use clap::Parser; // Parser trait enables the parse() method
use cli::{Cli, Commands};

use anyhow::Result;
use futures::stream::{self, StreamExt}; // StreamExt gives us .buffer_unordered()
use serde::Serialize;

use audiolink_preview::{is_http_url, DnsResolver, LinkMetadataService, Metadata, SafeUrlGuard};

// How many previews we fetch at once. Preview fetches are heavier than
// simple liveness checks (full body download + HTML parse), so the cap is
// modest
const FETCH_CONCURRENCY: usize = 8;

// The #[tokio::main] attribute transforms our async main into a real main
// function. It creates a tokio runtime and runs our async code inside it
#[tokio::main]
async fn main() {
    let exit_code = match run().await {
        Ok(code) => code,
        Err(e) => {
            // If an unexpected error occurred, print it and exit with code 2
            eprintln!("Error: {}", e);
            2
        }
    };

    std::process::exit(exit_code);
}

// Returns:
//   Ok(0) = every URL produced a preview / the URL is safe
//   Ok(1) = at least one URL produced no preview / the URL is unsafe
//   Err   = unexpected error (exit code 2)
async fn run() -> Result<i32> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch { urls, json } => handle_fetch(urls, json).await,
        Commands::Check { url } => handle_check(&url).await,
    }
}

// One row of `fetch` output: either a preview or the reason there is none
#[derive(Debug, Serialize)]
struct PreviewResult {
    url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Metadata>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl PreviewResult {
    fn has_preview(&self) -> bool {
        self.metadata.is_some()
    }
}

// Handles the 'fetch' subcommand
async fn handle_fetch(urls: Vec<String>, json: bool) -> Result<i32> {
    if !json {
        println!("🔍 Fetching preview metadata for {} URL(s)...\n", urls.len());
    }

    let service = LinkMetadataService::new()?;

    // Run fetches concurrently. Each task gets its own clone of the service
    // (cheap: the HTTP client is reference-counted internally)
    let futures = urls.into_iter().map(|url| {
        let service = service.clone();
        async move {
            // The boundary contract: only well-formed absolute http/https
            // URLs are ever handed to the service
            if !is_http_url(&url) {
                return PreviewResult {
                    url,
                    metadata: None,
                    error: Some("not an absolute http/https URL".to_string()),
                };
            }
            match service.fetch(&url).await {
                Ok(metadata) => PreviewResult {
                    url,
                    metadata: Some(metadata),
                    error: None,
                },
                Err(e) => PreviewResult {
                    url,
                    metadata: None,
                    error: Some(e.to_string()),
                },
            }
        }
    });

    let results: Vec<PreviewResult> = stream::iter(futures)
        .buffer_unordered(FETCH_CONCURRENCY)
        .collect()
        .await;

    print_results(&results, json)?;

    let missing_count = results.iter().filter(|r| !r.has_preview()).count();
    if missing_count > 0 {
        Ok(1) // Exit code 1 = at least one URL yielded no preview
    } else {
        Ok(0)
    }
}

// Handles the 'check' subcommand
//
// Runs only the safety guard: parse, blocklist, resolve, classify. Nothing
// is ever fetched
async fn handle_check(url: &str) -> Result<i32> {
    let guard = SafeUrlGuard::new(DnsResolver::new()?);

    match guard.check(url).await {
        Ok(()) => {
            println!("✅ safe to fetch: {}", url);
            Ok(0)
        }
        Err(e) => {
            println!("❌ refused: {}", e);
            Ok(1)
        }
    }
}

// Prints the results either as a table or JSON
fn print_results(results: &[PreviewResult], json: bool) -> Result<()> {
    if json {
        // Serialize results to JSON and print
        let json_output = serde_json::to_string_pretty(results)?;
        println!("{}", json_output);
    } else {
        // Print human-readable table
        print_table(results);
    }
    Ok(())
}

// Prints results as a human-readable table in the terminal
fn print_table(results: &[PreviewResult]) {
    println!("{:<50} {:<12} {:<40}", "URL", "STATUS", "DETAIL");
    println!("{}", "=".repeat(102));

    for result in results {
        let (status, detail) = match (&result.metadata, &result.error) {
            (Some(metadata), _) => (
                "✅ PREVIEW",
                metadata
                    .title
                    .clone()
                    .unwrap_or_else(|| "(no title)".to_string()),
            ),
            (None, Some(error)) => ("❌ NONE", error.clone()),
            (None, None) => ("❌ NONE", String::new()),
        };

        // Truncate URL if too long for display
        let url_display = if result.url.len() > 47 {
            format!("{}...", &result.url[..47])
        } else {
            result.url.clone()
        };

        println!("{:<50} {:<12} {:<40}", url_display, status, detail);
    }

    println!();

    // Print summary
    let preview_count = results.iter().filter(|r| r.has_preview()).count();
    let missing_count = results.len() - preview_count;

    println!("📊 Summary:");
    println!("   ✅ Previews: {}", preview_count);
    println!("   ❌ Without:  {}", missing_count);
    println!("   📋 Total:    {}", results.len());
}
