// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2026 Aivory, Inc.

//! Immutable agent configuration, resolved once at `init` time.
//!
//! Explicit `InitOptions` fields take priority over their matching
//! `AIVORY_*` environment variable, which takes priority over the documented
//! default (§6 Configuration).

use rand::Rng;

use crate::identity::Identity;
use crate::release::{self, ReleaseOverrides, ReleaseRecord};

pub const DEFAULT_COLLECTOR_URL: &str = "wss://api.aivory.net/ws/agent";
pub const DEFAULT_ENVIRONMENT: &str = "production";
pub const DEFAULT_SAMPLING_RATE: f64 = 1.0;
pub const DEFAULT_MAX_CAPTURE_DEPTH: usize = 10;
pub const DEFAULT_MAX_STRING_LENGTH: usize = 1000;
pub const DEFAULT_MAX_COLLECTION_SIZE: usize = 100;
pub const DEFAULT_SCOPE_DEPTH: u8 = 0;

/// Explicit options passed to `init(options)`. Every field is optional; the
/// matching `AIVORY_*` env var or documented default fills the gap.
#[derive(Debug, Clone, Default)]
pub struct InitOptions {
    pub api_key: Option<String>,
    pub collector_url: Option<String>,
    pub environment: Option<String>,
    pub sampling_rate: Option<f64>,
    pub max_capture_depth: Option<usize>,
    pub max_string_length: Option<usize>,
    pub max_collection_size: Option<usize>,
    pub scope_depth: Option<u8>,
    pub debug: Option<bool>,
    pub enable_breakpoints: Option<bool>,
    pub enable_sourcemaps: Option<bool>,
    pub release: ReleaseOverrides,
}

/// Error produced while resolving `InitOptions` into a [`Config`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    MissingApiKey,
    SamplingRateOutOfRange(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::MissingApiKey => write!(
                f,
                "no API key provided (set `api_key` in init options or AIVORY_API_KEY)"
            ),
            Self::SamplingRateOutOfRange(v) => {
                write!(f, "sampling_rate must be within [0, 1], got {v}")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Immutable, shared configuration for the lifetime of an initialized agent.
#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub collector_url: String,
    pub environment: String,
    pub sampling_rate: f64,
    pub max_capture_depth: usize,
    pub max_string_length: usize,
    pub max_collection_size: usize,
    pub scope_depth: u8,
    pub debug: bool,
    pub enable_breakpoints: bool,
    pub enable_sourcemaps: bool,
    pub identity: Identity,
    pub release: ReleaseRecord,
}

impl Config {
    /// Resolve an immutable [`Config`] from explicit options, falling back
    /// to `AIVORY_*` environment variables and documented defaults.
    pub fn resolve(options: InitOptions) -> Result<Self, ConfigError> {
        Self::resolve_with(options, |name| std::env::var(name).ok())
    }

    /// Testable core of [`resolve`], parameterized over the environment lookup.
    pub fn resolve_with(
        options: InitOptions,
        get_env: impl Fn(&str) -> Option<String> + Copy,
    ) -> Result<Self, ConfigError> {
        let api_key = options
            .api_key
            .or_else(|| get_env("AIVORY_API_KEY"))
            .ok_or(ConfigError::MissingApiKey)?;

        let collector_url = options
            .collector_url
            .or_else(|| get_env("AIVORY_BACKEND_URL"))
            .unwrap_or_else(|| DEFAULT_COLLECTOR_URL.to_owned());

        let environment = options
            .environment
            .or_else(|| get_env("AIVORY_ENVIRONMENT"))
            .unwrap_or_else(|| DEFAULT_ENVIRONMENT.to_owned());

        let sampling_rate = options
            .sampling_rate
            .or_else(|| get_env("AIVORY_SAMPLING_RATE").and_then(|s| s.parse().ok()))
            .unwrap_or(DEFAULT_SAMPLING_RATE);
        if !(0.0..=1.0).contains(&sampling_rate) {
            return Err(ConfigError::SamplingRateOutOfRange(sampling_rate.to_string()));
        }

        let max_capture_depth = options
            .max_capture_depth
            .or_else(|| get_env("AIVORY_MAX_DEPTH").and_then(|s| s.parse().ok()))
            .unwrap_or(DEFAULT_MAX_CAPTURE_DEPTH);

        let max_string_length = options
            .max_string_length
            .or_else(|| get_env("AIVORY_MAX_STRING_LENGTH").and_then(|s| s.parse().ok()))
            .unwrap_or(DEFAULT_MAX_STRING_LENGTH);

        let max_collection_size = options
            .max_collection_size
            .or_else(|| get_env("AIVORY_MAX_COLLECTION_SIZE").and_then(|s| s.parse().ok()))
            .unwrap_or(DEFAULT_MAX_COLLECTION_SIZE);

        let scope_depth = options
            .scope_depth
            .or_else(|| get_env("AIVORY_SCOPE_DEPTH").and_then(|s| s.parse().ok()))
            .unwrap_or(DEFAULT_SCOPE_DEPTH);

        let debug = options
            .debug
            .or_else(|| get_env("AIVORY_DEBUG").map(|s| parse_bool(&s)))
            .unwrap_or(false);

        let enable_breakpoints = options
            .enable_breakpoints
            .or_else(|| get_env("AIVORY_ENABLE_BREAKPOINTS").map(|s| parse_bool(&s)))
            .unwrap_or(true);

        let enable_sourcemaps = options
            .enable_sourcemaps
            .or_else(|| get_env("AIVORY_ENABLE_SOURCEMAPS").map(|s| parse_bool(&s)))
            .unwrap_or(true);

        let release = release::resolve_with(&options.release, get_env);

        Ok(Self {
            api_key,
            collector_url,
            environment,
            sampling_rate,
            max_capture_depth,
            max_string_length,
            max_collection_size,
            scope_depth,
            debug,
            enable_breakpoints,
            enable_sourcemaps,
            identity: Identity::generate(),
            release,
        })
    }

    /// Uniform sampling predicate: `true` admits the event.
    pub fn sample(&self) -> bool {
        if self.sampling_rate >= 1.0 {
            return true;
        }
        if self.sampling_rate <= 0.0 {
            return false;
        }
        rand::rng().random::<f64>() < self.sampling_rate
    }
}

fn parse_bool(s: &str) -> bool {
    matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on")
}

#[cfg(test)]
#[path = "config_tests.rs"]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests;
