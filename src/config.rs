//! Configuration management for the image loader.
//!
//! This module provides:
//! - [`ServiceConfig`]: library-side settings for [`ImageLoadService`](crate::ImageLoadService)
//! - [`Config`]: the command-line configuration, parsed with clap
//!
//! # Environment Variables
//!
//! Every CLI option can also be set through an environment variable with the
//! `IMGLOAD_` prefix:
//!
//! - `IMGLOAD_ROOT` - Root directory served by the `file` scheme (default: .)
//! - `IMGLOAD_CACHE_CAPACITY` - Max cached load handles (default: 1000)
//! - `IMGLOAD_NO_CACHE` - Resolve without caching results (default: false)
//! - `IMGLOAD_OPTIONS` - Load options as JSON (default: {})

use std::path::PathBuf;

use clap::Parser;

use crate::cache::DEFAULT_IMAGE_CACHE_CAPACITY;
use crate::loader::LoadOptions;

// =============================================================================
// Service Configuration
// =============================================================================

/// Settings for building an [`ImageLoadService`](crate::ImageLoadService).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Maximum number of cached load handles
    pub cache_capacity: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            cache_capacity: DEFAULT_IMAGE_CACHE_CAPACITY,
        }
    }
}

// =============================================================================
// CLI Arguments
// =============================================================================

/// Image loader - resolve image ids through registered scheme loaders.
///
/// Loads each IMAGE_ID (for example `file:ct/slice-001.png`) and prints the
/// resulting image geometry.
#[derive(Parser, Debug, Clone)]
#[command(name = "image-loader")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    /// Image ids to load.
    #[arg(required = true)]
    pub image_ids: Vec<String>,

    /// Root directory for `file:` image ids.
    #[arg(long, default_value = ".", env = "IMGLOAD_ROOT")]
    pub root: PathBuf,

    /// Maximum number of cached load handles.
    #[arg(long, default_value_t = DEFAULT_IMAGE_CACHE_CAPACITY, env = "IMGLOAD_CACHE_CAPACITY")]
    pub cache_capacity: usize,

    /// Resolve images without storing them in the cache.
    #[arg(long, default_value_t = false, env = "IMGLOAD_NO_CACHE")]
    pub no_cache: bool,

    /// Load options as a JSON object, e.g. '{"priority": 1, "requestType": "prefetch"}'.
    #[arg(long, default_value = "{}", env = "IMGLOAD_OPTIONS")]
    pub options: String,

    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.cache_capacity == 0 {
            return Err("cache_capacity must be greater than 0".to_string());
        }

        if !self.root.is_dir() {
            return Err(format!(
                "Root directory '{}' does not exist. Set --root or IMGLOAD_ROOT",
                self.root.display()
            ));
        }

        if self.image_ids.iter().any(|id| id.is_empty()) {
            return Err("Image ids must not be empty".to_string());
        }

        self.load_options()?;

        Ok(())
    }

    /// Parse the `--options` JSON into [`LoadOptions`].
    pub fn load_options(&self) -> Result<LoadOptions, String> {
        serde_json::from_str(&self.options).map_err(|e| format!("Invalid --options JSON: {e}"))
    }

    /// Library-side settings.
    pub fn service_config(&self) -> ServiceConfig {
        ServiceConfig {
            cache_capacity: self.cache_capacity,
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
