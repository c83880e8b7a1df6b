//! Texture loading, caching and batch preloading.
//!
//! [`TextureCache`] decodes images into CPU-side [`Texture`]s keyed by URL. Loads for the same
//! URL coalesce into one fetch, finished textures are kept for the lifetime of the cache and a
//! preload batch reports progress as the share of settled requests. Material construction never
//! talks to the cache directly: it goes through the [`TextureSet`] handed out by
//! [`TextureCache::ready`] once no batch is outstanding.

use std::{
    cell::RefCell,
    collections::{HashMap, HashSet},
    fmt::Debug,
    rc::Rc,
};

use futures::{
    FutureExt,
    future::{LocalBoxFuture, Shared},
};

use crate::resources::{AssetSource, material::MaterialDescriptor};

/// The six maps a PBR material is assembled from, in `<material>_<channel>.png` naming order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Channel {
    Albedo,
    Ao,
    Height,
    Metallic,
    Normal,
    Roughness,
}

impl Channel {
    pub const ALL: [Channel; 6] = [
        Channel::Albedo,
        Channel::Ao,
        Channel::Height,
        Channel::Metallic,
        Channel::Normal,
        Channel::Roughness,
    ];

    pub fn suffix(self) -> &'static str {
        match self {
            Channel::Albedo => "albedo",
            Channel::Ao => "ao",
            Channel::Height => "height",
            Channel::Metallic => "metallic",
            Channel::Normal => "normal-ogl",
            Channel::Roughness => "roughness",
        }
    }
}

pub fn channel_url(material: &str, channel: Channel) -> String {
    format!("{}_{}.png", material, channel.suffix())
}

/// All six channel URLs of one material.
pub fn material_urls(material: &str) -> Vec<String> {
    Channel::ALL
        .iter()
        .map(|&channel| channel_url(material, channel))
        .collect()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WrapMode {
    Repeat,
    Clamp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FilterMode {
    Linear,
    Nearest,
}

/// Sampling configuration fixed once when a texture is created.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TextureSettings {
    pub wrap: WrapMode,
    pub repeat: [f32; 2],
    pub filter: FilterMode,
}

impl Default for TextureSettings {
    fn default() -> Self {
        Self {
            wrap: WrapMode::Clamp,
            repeat: [1.0, 1.0],
            filter: FilterMode::Linear,
        }
    }
}

impl TextureSettings {
    pub fn tiled(times: f32) -> Self {
        Self {
            wrap: WrapMode::Repeat,
            repeat: [times, times],
            filter: FilterMode::Linear,
        }
    }
}

/// A decoded image plus the sampling settings it was configured with.
pub struct Texture {
    url: String,
    image: image::RgbaImage,
    settings: TextureSettings,
}

impl Texture {
    pub fn from_bytes(url: &str, bytes: &[u8], settings: TextureSettings) -> anyhow::Result<Self> {
        let img = image::load_from_memory(bytes)?;
        Ok(Self::new(url, img.to_rgba8(), settings))
    }

    pub fn new(url: &str, image: image::RgbaImage, settings: TextureSettings) -> Self {
        Self {
            url: url.to_string(),
            image,
            settings,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn image(&self) -> &image::RgbaImage {
        &self.image
    }

    pub fn dimensions(&self) -> (u32, u32) {
        self.image.dimensions()
    }

    pub fn settings(&self) -> TextureSettings {
        self.settings
    }
}

impl Debug for Texture {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Texture")
            .field("url", &self.url)
            .field("dimensions", &self.image.dimensions())
            .field("settings", &self.settings)
            .finish()
    }
}

#[derive(Clone, Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to fetch {url}: {cause}")]
    Fetch { url: String, cause: String },
    #[error("failed to decode {url}: {cause}")]
    Decode { url: String, cause: String },
    #[error("{} of the requested assets failed to load", .failed.len())]
    Batch { failed: Vec<LoadError> },
}

impl LoadError {
    /// URLs that caused this error, flattened for batches.
    pub fn urls(&self) -> Vec<&str> {
        match self {
            LoadError::Fetch { url, .. } | LoadError::Decode { url, .. } => vec![url.as_str()],
            LoadError::Batch { failed } => failed.iter().flat_map(LoadError::urls).collect(),
        }
    }
}

type PendingLoad = Shared<LocalBoxFuture<'static, Result<Rc<Texture>, LoadError>>>;

#[derive(Default)]
struct Batch {
    requested: usize,
    settled: usize,
    outstanding: HashSet<String>,
}

#[derive(Default)]
struct CacheState {
    loaded: HashMap<String, Rc<Texture>>,
    in_flight: HashMap<String, PendingLoad>,
    batch: Batch,
}

impl CacheState {
    fn settle(&mut self, url: &str) -> bool {
        let counted = self.batch.outstanding.remove(url);
        if counted {
            self.batch.settled += 1;
        }
        counted
    }
}

impl Batch {
    fn percentage(&self) -> f32 {
        if self.requested == 0 || self.settled == self.requested {
            return 100.0;
        }
        self.settled as f32 / self.requested as f32 * 100.0
    }
}

type ProgressListener = Rc<dyn Fn(f32)>;

/// URL-keyed texture cache with coalesced loads and batch progress.
///
/// Clones share the same state. All state is touched from one thread only: loads are plain
/// `!Send` futures and no borrow of the state is held across an await point.
pub struct TextureCache<S: AssetSource> {
    source: Rc<S>,
    settings_rule: Rc<dyn Fn(&str) -> TextureSettings>,
    on_progress: ProgressListener,
    state: Rc<RefCell<CacheState>>,
}

impl<S: AssetSource> Clone for TextureCache<S> {
    fn clone(&self) -> Self {
        Self {
            source: self.source.clone(),
            settings_rule: self.settings_rule.clone(),
            on_progress: self.on_progress.clone(),
            state: self.state.clone(),
        }
    }
}

impl<S: AssetSource + 'static> TextureCache<S> {
    pub fn new(source: S) -> Self {
        Self {
            source: Rc::new(source),
            settings_rule: Rc::new(|_| TextureSettings::default()),
            on_progress: Rc::new(|_| ()),
            state: Default::default(),
        }
    }

    /// Decides the wrap/repeat/filter settings of every texture this cache creates.
    pub fn with_settings(mut self, rule: impl Fn(&str) -> TextureSettings + 'static) -> Self {
        self.settings_rule = Rc::new(rule);
        self
    }

    /// Called with the batch percentage every time a URL of the current batch settles.
    pub fn with_progress(mut self, listener: impl Fn(f32) + 'static) -> Self {
        self.on_progress = Rc::new(listener);
        self
    }

    /// Returns the cached texture or loads it, sharing one fetch between concurrent callers.
    pub async fn load(&self, url: &str) -> Result<Rc<Texture>, LoadError> {
        let pending = {
            let mut state = self.state.borrow_mut();
            if let Some(texture) = state.loaded.get(url) {
                return Ok(texture.clone());
            }
            match state.in_flight.get(url) {
                Some(pending) => pending.clone(),
                None => {
                    let pending = self.start_load(url);
                    state.in_flight.insert(url.to_string(), pending.clone());
                    pending
                }
            }
        };
        pending.await
    }

    fn start_load(&self, url: &str) -> PendingLoad {
        let source = self.source.clone();
        let state = self.state.clone();
        let settings = (self.settings_rule)(url);
        let on_progress = self.on_progress.clone();
        let url = url.to_string();
        async move {
            let result = match source.fetch(&url).await {
                Ok(bytes) => Texture::from_bytes(&url, &bytes, settings)
                    .map(Rc::new)
                    .map_err(|e| LoadError::Decode {
                        url: url.clone(),
                        cause: e.to_string(),
                    }),
                Err(e) => Err(LoadError::Fetch {
                    url: url.clone(),
                    cause: format!("{e:#}"),
                }),
            };
            let progress = {
                let mut state = state.borrow_mut();
                state.in_flight.remove(&url);
                match &result {
                    Ok(texture) => {
                        state.loaded.insert(url.clone(), texture.clone());
                    }
                    Err(e) => log::warn!("{}", e),
                }
                state.settle(&url).then(|| state.batch.percentage())
            };
            // The listener may read the cache, so it runs after the borrow is released
            if let Some(progress) = progress {
                log::debug!("texture batch {:.0}% done", progress);
                on_progress(progress);
            }
            result
        }
        .boxed_local()
        .shared()
    }

    /// Loads every URL concurrently as one batch.
    ///
    /// Progress restarts at zero. The batch fails if any load fails, but every texture that
    /// did load stays cached.
    pub async fn preload_all(&self, urls: &[String]) -> Result<(), LoadError> {
        {
            let mut state = self.state.borrow_mut();
            let unique: HashSet<String> = urls.iter().cloned().collect();
            let outstanding = unique
                .iter()
                .filter(|url| !state.loaded.contains_key(url.as_str()))
                .cloned()
                .collect::<HashSet<_>>();
            state.batch = Batch {
                requested: unique.len(),
                settled: unique.len() - outstanding.len(),
                outstanding,
            };
        }
        log::info!("preloading {} textures", urls.len());

        let results = futures::future::join_all(urls.iter().map(|url| self.load(url))).await;
        let failed: Vec<LoadError> = results.into_iter().filter_map(Result::err).collect();
        if failed.is_empty() {
            log::info!("all textures loaded");
            Ok(())
        } else {
            Err(LoadError::Batch { failed })
        }
    }

    /// Percentage of the current batch that has settled, in `[0, 100]`.
    pub fn progress(&self) -> f32 {
        self.state.borrow().batch.percentage()
    }

    pub fn get(&self, url: &str) -> Option<Rc<Texture>> {
        self.state.borrow().loaded.get(url).cloned()
    }

    /// The readiness gate: a snapshot of every loaded texture, available once no batch load
    /// is outstanding.
    pub fn ready(&self) -> Option<TextureSet> {
        let state = self.state.borrow();
        if !state.batch.outstanding.is_empty() {
            return None;
        }
        Some(TextureSet {
            textures: state.loaded.clone(),
        })
    }
}

/// Synchronous access to preloaded textures.
#[derive(Clone, Debug, Default)]
pub struct TextureSet {
    textures: HashMap<String, Rc<Texture>>,
}

impl TextureSet {
    pub fn get(&self, url: &str) -> Option<Rc<Texture>> {
        self.textures.get(url).cloned()
    }

    pub fn len(&self) -> usize {
        self.textures.len()
    }

    pub fn is_empty(&self) -> bool {
        self.textures.is_empty()
    }

    /// Assembles the six `<name>_<channel>.png` maps into a material. Missing maps stay empty.
    pub fn material(&self, name: &str, displacement_scale: f32, flat: bool) -> MaterialDescriptor {
        let map = |channel| self.get(&channel_url(name, channel));
        crate::resources::material::make_material(
            map(Channel::Albedo),
            map(Channel::Ao),
            map(Channel::Height),
            displacement_scale,
            map(Channel::Metallic),
            map(Channel::Normal),
            map(Channel::Roughness),
            flat,
        )
    }
}
