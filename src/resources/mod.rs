/**
 * This module contains all logic for loading textures, fonts and materials from external files
 * and for building the procedural meshes the scene is made of.
 */
pub mod font;
pub mod material;
pub mod mesh;
pub mod texture;

use std::future::Future;

/// Where raw asset bytes come from.
///
/// The cache and the label builder only ever see this seam, so tests can serve assets from
/// memory while the app reads files (native) or fetches them from the page origin (web).
pub trait AssetSource {
    fn fetch(&self, url: &str) -> impl Future<Output = anyhow::Result<Vec<u8>>>;
}

/// The platform source: files below `root` natively, `<origin>/<root>/` in the browser.
#[derive(Clone, Debug)]
pub struct PlatformSource {
    root: String,
}

impl PlatformSource {
    pub fn new(root: impl Into<String>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetSource for PlatformSource {
    fn fetch(&self, url: &str) -> impl Future<Output = anyhow::Result<Vec<u8>>> {
        load_binary(&self.root, url)
    }
}

fn is_absolute_url(file_name: &str) -> bool {
    file_name.starts_with("http://") || file_name.starts_with("https://")
}

#[cfg(target_arch = "wasm32")]
fn format_url(root: &str, file_name: &str) -> anyhow::Result<reqwest::Url> {
    if is_absolute_url(file_name) {
        return Ok(reqwest::Url::parse(file_name)?);
    }
    let window = web_sys::window().ok_or_else(|| anyhow::anyhow!("no window"))?;
    let origin = window
        .location()
        .origin()
        .map_err(|_| anyhow::anyhow!("page origin is not readable"))?;
    let base = reqwest::Url::parse(&format!("{}/{}/", origin, root.trim_matches('/')))?;
    Ok(base.join(file_name)?)
}

async fn fetch_remote(url: reqwest::Url) -> anyhow::Result<Vec<u8>> {
    let response = reqwest::get(url).await?.error_for_status()?;
    Ok(response.bytes().await?.to_vec())
}

/// Reads `file_name` relative to `root`. Absolute `http(s)` URLs are fetched as-is on both
/// platforms.
pub async fn load_binary(root: &str, file_name: &str) -> anyhow::Result<Vec<u8>> {
    #[cfg(target_arch = "wasm32")]
    let data = fetch_remote(format_url(root, file_name)?).await?;
    #[cfg(not(target_arch = "wasm32"))]
    let data = if is_absolute_url(file_name) {
        fetch_remote(reqwest::Url::parse(file_name)?).await?
    } else {
        let path = std::path::Path::new(root).join(file_name);
        tokio::fs::read(&path).await?
    };

    Ok(data)
}

#[cfg(test)]
pub(crate) mod testing {
    use std::{cell::RefCell, collections::HashMap, rc::Rc};

    use futures::channel::oneshot;

    use super::AssetSource;

    /// In-memory source that counts fetches and can hold a URL back until released.
    #[derive(Clone, Default)]
    pub(crate) struct MemorySource {
        files: Rc<RefCell<HashMap<String, Vec<u8>>>>,
        fetches: Rc<RefCell<HashMap<String, usize>>>,
        gates: Rc<RefCell<HashMap<String, oneshot::Receiver<()>>>>,
    }

    impl MemorySource {
        pub(crate) fn with_png(self, url: &str) -> Self {
            self.files.borrow_mut().insert(url.to_string(), tiny_png());
            self
        }

        pub(crate) fn with_bytes(self, url: &str, bytes: Vec<u8>) -> Self {
            self.files.borrow_mut().insert(url.to_string(), bytes);
            self
        }

        /// Holds `url` back until the returned sender fires.
        pub(crate) fn gate(&self, url: &str) -> oneshot::Sender<()> {
            let (tx, rx) = oneshot::channel();
            self.gates.borrow_mut().insert(url.to_string(), rx);
            tx
        }

        pub(crate) fn fetches(&self, url: &str) -> usize {
            self.fetches.borrow().get(url).copied().unwrap_or(0)
        }
    }

    impl AssetSource for MemorySource {
        async fn fetch(&self, url: &str) -> anyhow::Result<Vec<u8>> {
            *self.fetches.borrow_mut().entry(url.to_string()).or_default() += 1;
            let gate = self.gates.borrow_mut().remove(url);
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            self.files
                .borrow()
                .get(url)
                .cloned()
                .ok_or_else(|| anyhow::anyhow!("404: {url}"))
        }
    }

    pub(crate) fn tiny_png() -> Vec<u8> {
        let img = image::RgbaImage::from_pixel(2, 2, image::Rgba([10, 200, 30, 255]));
        let mut bytes = std::io::Cursor::new(Vec::new());
        img.write_to(&mut bytes, image::ImageFormat::Png)
            .expect("encode test png");
        bytes.into_inner()
    }
}
