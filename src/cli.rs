// src/cli.rs
// =============================================================================
// This file defines our command-line interface using the `clap` crate.
//
// clap is a popular Rust library for parsing command-line arguments.
// We use the "derive" API which lets us define the CLI structure using
// Rust structs and attributes (the #[...] things).
//
// The binary is a thin shell over the library: `fetch` runs the real
// preview pipeline, `check` runs only the safety guard so you can see why
// a URL would be refused without ever connecting to it.
// =============================================================================

use clap::{Parser, Subcommand};

// This struct represents our entire CLI application
//
// #[derive(Parser)] tells clap to automatically generate parsing code
// The #[command(...)] attributes configure how the CLI behaves
#[derive(Parser, Debug)]
#[command(
    name = "audiolink-preview",
    version = "0.1.0",
    about = "Fetch link preview metadata without becoming an SSRF proxy",
    long_about = "audiolink-preview safely fetches preview metadata (title, description, image) \
                  for untrusted http/https URLs. Hostnames are resolved and every resolved \
                  address is classified before any connection; redirects are walked manually \
                  and re-checked at each hop."
)]
pub struct Cli {
    // The #[command(subcommand)] attribute tells clap that this field
    // will hold one of the subcommands defined in the Commands enum
    #[command(subcommand)]
    pub command: Commands,
}

// This enum defines our subcommands (fetch, check)
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch preview metadata for one or more URLs
    ///
    /// Example: audiolink-preview fetch https://www.rust-lang.org
    Fetch {
        /// URLs to fetch (absolute http or https)
        ///
        /// Positional, at least one required
        #[arg(required = true)]
        urls: Vec<String>,

        /// Output results in JSON format instead of a table
        ///
        /// This is an optional flag: --json
        #[arg(long)]
        json: bool,
    },

    /// Check whether a URL would be allowed, without fetching it
    ///
    /// Example: audiolink-preview check http://169.254.169.254/
    Check {
        /// URL to run through the safety guard
        url: String,
    },
}
