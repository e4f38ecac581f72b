use crate::cache::strip_query;

/// Bytes received so far for an asset and, when known, its full size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Progress {
    pub loaded: u64,
    pub total: Option<u64>,
}

impl Progress {
    pub fn percent(&self) -> Option<f64> {
        match self.total {
            Some(0) => Some(100.0),
            Some(total) => Some(self.loaded as f64 / total as f64 * 100.0),
            None => None,
        }
    }
}

/// Chunk size used for native reads so progress can be reported.
#[cfg(not(target_arch = "wasm32"))]
const READ_CHUNK: usize = 256 * 1024;

#[cfg(target_arch = "wasm32")]
fn format_url(file_name: &str) -> anyhow::Result<reqwest::Url> {
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no browser window"))?;
    let href = window
        .location()
        .href()
        .map_err(|_| anyhow::anyhow!("page location is unavailable"))?;
    let base = reqwest::Url::parse(&href)?;
    Ok(base.join(file_name)?)
}

/// Resolves `uri` (as found inside a glTF file) against the file's own path.
pub fn resolve_relative(base_file: &str, uri: &str) -> String {
    let base = strip_query(base_file);
    match base.rfind('/') {
        Some(idx) => format!("{}/{}", &base[..idx], uri),
        None => uri.to_string(),
    }
}

pub async fn load_binary(file_name: &str) -> anyhow::Result<Vec<u8>> {
    load_binary_with_progress(file_name, |_| ()).await
}

/// Fetches an asset, calling `on_progress` as data arrives.
///
/// On the web `file_name` is resolved against the page URL and may carry a
/// query string; natively it is a path relative to the working directory and
/// any query is ignored.
pub async fn load_binary_with_progress(
    file_name: &str,
    mut on_progress: impl FnMut(Progress),
) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = {
        let url = format_url(file_name)?;
        let response = reqwest::get(url).await?.error_for_status()?;
        let total = response.content_length();
        let data = response.bytes().await?.to_vec();
        on_progress(Progress {
            loaded: data.len() as u64,
            total: total.or(Some(data.len() as u64)),
        });
        data
    };
    #[cfg(not(target_arch = "wasm32"))]
    let data = {
        use std::io::Read;

        let path = std::path::Path::new(strip_query(file_name));
        let mut file = std::fs::File::open(path)
            .map_err(|e| anyhow::anyhow!("cannot open {}: {}", path.display(), e))?;
        let total = file.metadata().ok().map(|m| m.len());
        let mut data = Vec::with_capacity(total.unwrap_or_default() as usize);
        let mut chunk = vec![0u8; READ_CHUNK];
        loop {
            let read = file.read(&mut chunk)?;
            if read == 0 {
                break;
            }
            data.extend_from_slice(&chunk[..read]);
            on_progress(Progress {
                loaded: data.len() as u64,
                total,
            });
        }
        data
    };

    Ok(data)
}
