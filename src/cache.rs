//! Cache-busting asset versions.
//!
//! Every asset request carries a `v=<unix seconds>` query parameter so that
//! browsers and proxies never serve a stale model or environment map.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CacheBuster {
    version: u64,
}

impl CacheBuster {
    pub fn new(version: u64) -> Self {
        Self { version }
    }

    /// A version derived from the current wall clock. It changes every second.
    pub fn now() -> Self {
        let millis = web_time_millis();
        Self::new(millis / 1000)
    }

    pub fn version(&self) -> u64 {
        self.version
    }

    /// Appends the version to `path`, keeping any query that is already there.
    pub fn versioned(&self, path: &str) -> String {
        let separator = if path.contains('?') { '&' } else { '?' };
        format!("{path}{separator}v={}", self.version)
    }
}

/// Drops the query part of an asset path, which only matters to HTTP caches.
pub fn strip_query(path: &str) -> &str {
    match path.split_once('?') {
        Some((file, _)) => file,
        None => path,
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn web_time_millis() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(target_arch = "wasm32")]
fn web_time_millis() -> u64 {
    js::date_now() as u64
}

#[cfg(target_arch = "wasm32")]
mod js {
    use wasm_bindgen::prelude::*;

    #[wasm_bindgen]
    extern "C" {
        #[wasm_bindgen(js_namespace = Date, js_name = now)]
        pub fn date_now() -> f64;
    }
}
