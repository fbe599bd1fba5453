//! Image loading use case.
//!
//! Resolves an image from the memory cache, falling back to the network, and
//! publishes every state change into the caller's binding.

use std::sync::Arc;

use reqwest::Url;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::JoinHandle;
use tracing::{debug, trace, warn};

use crate::application::services::{Binding, CancelHandle, MemoryPressure};
use crate::domain::entities::{Image, ImageCacheKey, ImageLoadable, ImageSource};
use crate::domain::errors::ImageError;
use crate::domain::loadable::Loadable;
use crate::domain::ports::{ImageCacheRepository, ImageWebRepository};

/// Width images are downscaled to unless configured otherwise.
pub const DEFAULT_TARGET_WIDTH: u32 = 300;

/// Loads images into observable state slots.
pub trait ImagesInteractor: Send + Sync {
    /// Starts loading `url` into `image`.
    ///
    /// With no URL the slot is reset to [`Loadable::NotRequested`] and an
    /// already-cancelled handle is returned. Otherwise the slot moves to
    /// `IsLoading` immediately and to `Loaded` or `Failed` when the load
    /// finishes, unless the returned handle is cancelled first.
    fn load(&self, image: &Binding<ImageLoadable>, url: Option<Url>) -> CancelHandle;
}

/// Interactor backed by a memory cache and a web repository.
pub struct RealImagesInteractor {
    web_repository: Arc<dyn ImageWebRepository>,
    memory_cache: Arc<dyn ImageCacheRepository>,
    target_width: Option<u32>,
    memory_warning_subscription: JoinHandle<()>,
}

impl std::fmt::Debug for RealImagesInteractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealImagesInteractor")
            .field("target_width", &self.target_width)
            .finish_non_exhaustive()
    }
}

impl RealImagesInteractor {
    /// Creates the interactor and subscribes the cache to memory warnings.
    ///
    /// Must be called within a tokio runtime. The subscription lives until
    /// the interactor is dropped.
    #[must_use]
    pub fn new(
        web_repository: Arc<dyn ImageWebRepository>,
        memory_cache: Arc<dyn ImageCacheRepository>,
        memory_warning: &MemoryPressure,
    ) -> Self {
        let memory_warning_subscription =
            Self::purge_on_memory_warning(Arc::clone(&memory_cache), memory_warning);

        Self {
            web_repository,
            memory_cache,
            target_width: Some(DEFAULT_TARGET_WIDTH),
            memory_warning_subscription,
        }
    }

    /// Sets the width loaded images are downscaled to. `None` keeps the
    /// original size.
    #[must_use]
    pub const fn with_target_width(mut self, width: Option<u32>) -> Self {
        self.target_width = width;
        self
    }

    fn purge_on_memory_warning(
        memory_cache: Arc<dyn ImageCacheRepository>,
        memory_warning: &MemoryPressure,
    ) -> JoinHandle<()> {
        let mut rx = memory_warning.subscribe();
        tokio::spawn(async move {
            loop {
                match rx.recv().await {
                    Ok(()) => memory_cache.purge_cache().await,
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Memory warnings lagged, purging once");
                        memory_cache.purge_cache().await;
                    }
                    Err(RecvError::Closed) => break,
                }
            }
        })
    }

    async fn resolve(
        web_repository: &dyn ImageWebRepository,
        memory_cache: &dyn ImageCacheRepository,
        url: &Url,
        key: &ImageCacheKey,
        target_width: Option<u32>,
    ) -> Result<(Image, ImageSource), ImageError> {
        match memory_cache.cached_image(key).await {
            Ok(image) => Ok((image, ImageSource::MemoryCache)),
            Err(miss) => {
                trace!(key = %key, reason = %miss, "Falling back to network");
                let image = web_repository.load(url, target_width).await?;
                Ok((image, ImageSource::Network))
            }
        }
    }
}

impl Drop for RealImagesInteractor {
    fn drop(&mut self) {
        self.memory_warning_subscription.abort();
    }
}

impl ImagesInteractor for RealImagesInteractor {
    fn load(&self, image: &Binding<ImageLoadable>, url: Option<Url>) -> CancelHandle {
        let Some(url) = url else {
            image.set(Loadable::NotRequested);
            return CancelHandle::cancelled();
        };

        image.set(image.get().refreshing());

        let handle = CancelHandle::new();
        let task_handle = handle.clone();
        let binding = image.clone();
        let web_repository = Arc::clone(&self.web_repository);
        let memory_cache = Arc::clone(&self.memory_cache);
        let target_width = self.target_width;

        tokio::spawn(async move {
            let key = ImageCacheKey::from(&url);
            let result = Self::resolve(
                web_repository.as_ref(),
                memory_cache.as_ref(),
                &url,
                &key,
                target_width,
            )
            .await;

            match result {
                Ok((loaded, source)) => {
                    debug!(key = %key, source = %source, "Image resolved");
                    if source == ImageSource::Network {
                        memory_cache.cache(loaded.clone(), key.clone()).await;
                    }
                    let published = task_handle
                        .run_unless_cancelled(|| binding.set(Loadable::Loaded(loaded)));
                    if !published {
                        trace!(key = %key, "Load cancelled, state left untouched");
                    }
                }
                Err(error) => {
                    warn!(key = %key, error = %error, "Image load failed");
                    task_handle.run_unless_cancelled(|| binding.set(Loadable::Failed(error)));
                }
            }
        });

        handle
    }
}

/// Interactor that never loads anything. Used where images are not shown.
#[derive(Debug, Default, Clone, Copy)]
pub struct StubImagesInteractor;

impl ImagesInteractor for StubImagesInteractor {
    fn load(&self, _image: &Binding<ImageLoadable>, _url: Option<Url>) -> CancelHandle {
        CancelHandle::cancelled()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ResponseIssue;
    use crate::domain::ports::mocks::MockImageWebRepository;
    use crate::infrastructure::image::MemoryImageCache;
    use std::time::Duration;
    use tokio::sync::{Notify, mpsc};

    const TIMEOUT: Duration = Duration::from_secs(2);

    fn test_image(width: u32, height: u32) -> Image {
        Arc::new(image::DynamicImage::new_rgb8(width, height))
    }

    fn png_url() -> Url {
        Url::parse("https://image.service.com/myimage.png").unwrap()
    }

    fn make_interactor(
        web: Arc<MockImageWebRepository>,
        cache: Arc<MemoryImageCache>,
        memory_warning: &MemoryPressure,
    ) -> RealImagesInteractor {
        RealImagesInteractor::new(web, cache, memory_warning)
    }

    async fn next_state(rx: &mut mpsc::UnboundedReceiver<ImageLoadable>) -> ImageLoadable {
        tokio::time::timeout(TIMEOUT, rx.recv())
            .await
            .expect("timed out waiting for state")
            .expect("binding dropped")
    }

    #[tokio::test]
    async fn test_missing_url_resets_state() {
        let web = Arc::new(MockImageWebRepository::new(Ok(test_image(1, 1))));
        let cache = Arc::new(MemoryImageCache::new(10));
        let interactor = make_interactor(web.clone(), cache, &MemoryPressure::new());
        let binding = Binding::new(Loadable::Loaded(test_image(2, 2)));

        let handle = interactor.load(&binding, None);

        assert!(handle.is_cancelled());
        assert_eq!(binding.get(), Loadable::NotRequested);
        tokio::task::yield_now().await;
        assert_eq!(web.calls(), 0);
    }

    #[tokio::test]
    async fn test_network_load_publishes_loading_then_loaded_and_caches() {
        let image = test_image(40, 40);
        let web = Arc::new(MockImageWebRepository::new(Ok(image.clone())));
        let cache = Arc::new(MemoryImageCache::new(10));
        let interactor = make_interactor(web.clone(), cache.clone(), &MemoryPressure::new());
        let binding = Binding::default();
        let mut rx = binding.subscribe();

        let _handle = interactor.load(&binding, Some(png_url()));

        assert_eq!(next_state(&mut rx).await, Loadable::IsLoading { last: None });
        assert_eq!(next_state(&mut rx).await, Loadable::Loaded(image.clone()));
        assert!(rx.try_recv().is_err());
        assert_eq!(web.calls(), 1);

        let key = ImageCacheKey::new("https://image.service.com/myimage.png");
        assert_eq!(cache.cached_image(&key).await, Ok(image));
    }

    #[tokio::test]
    async fn test_reload_after_loaded_hits_cache() {
        let image = test_image(8, 8);
        let web = Arc::new(MockImageWebRepository::new(Ok(image.clone())));
        let cache = Arc::new(MemoryImageCache::new(10));
        let interactor = make_interactor(web.clone(), cache, &MemoryPressure::new());
        let binding = Binding::default();
        let mut rx = binding.subscribe();

        let _first = interactor.load(&binding, Some(png_url()));
        assert!(next_state(&mut rx).await.is_loading());
        assert_eq!(next_state(&mut rx).await, Loadable::Loaded(image.clone()));

        let _second = interactor.load(&binding, Some(png_url()));
        assert_eq!(
            next_state(&mut rx).await,
            Loadable::IsLoading {
                last: Some(image.clone())
            }
        );
        assert_eq!(next_state(&mut rx).await, Loadable::Loaded(image));
        assert_eq!(web.calls(), 1);
    }

    #[tokio::test]
    async fn test_cache_hit_skips_network() {
        let cached = test_image(10, 10);
        let web = Arc::new(MockImageWebRepository::new(Ok(test_image(1, 1))));
        let cache = Arc::new(MemoryImageCache::new(10));
        cache
            .cache(cached.clone(), ImageCacheKey::from(&png_url()))
            .await;
        let interactor = make_interactor(web.clone(), cache, &MemoryPressure::new());
        let binding = Binding::default();
        let mut rx = binding.subscribe();

        let _handle = interactor.load(&binding, Some(png_url()));

        assert_eq!(next_state(&mut rx).await, Loadable::IsLoading { last: None });
        assert_eq!(next_state(&mut rx).await, Loadable::Loaded(cached));
        assert_eq!(web.calls(), 0);
    }

    #[tokio::test]
    async fn test_failure_publishes_loading_then_failed() {
        let error = ImageError::from(ResponseIssue::MissingToken);
        let web = Arc::new(MockImageWebRepository::new(Err(error.clone())));
        let cache = Arc::new(MemoryImageCache::new(10));
        let interactor = make_interactor(web, cache, &MemoryPressure::new());
        let previous = test_image(3, 3);
        let binding = Binding::new(Loadable::Loaded(previous.clone()));
        let mut rx = binding.subscribe();

        let _handle = interactor.load(&binding, Some(png_url()));

        assert_eq!(
            next_state(&mut rx).await,
            Loadable::IsLoading {
                last: Some(previous)
            }
        );
        assert_eq!(next_state(&mut rx).await, Loadable::Failed(error));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_cancel_suppresses_late_write() {
        let release = Arc::new(Notify::new());
        let image = test_image(5, 5);
        let web = Arc::new(
            MockImageWebRepository::new(Ok(image.clone())).held_by(Arc::clone(&release)),
        );
        let cache = Arc::new(MemoryImageCache::new(10));
        let interactor = make_interactor(web, cache.clone(), &MemoryPressure::new());
        let binding = Binding::default();
        let mut rx = binding.subscribe();

        let handle = interactor.load(&binding, Some(png_url()));
        assert_eq!(next_state(&mut rx).await, Loadable::IsLoading { last: None });

        handle.cancel();
        release.notify_one();

        let key = ImageCacheKey::from(&png_url());
        tokio::time::timeout(TIMEOUT, async {
            while cache.cached_image(&key).await.is_err() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("network result was not cached");

        assert!(rx.try_recv().is_err());
        assert_eq!(binding.get(), Loadable::IsLoading { last: None });
    }

    #[tokio::test]
    async fn test_memory_warning_purges_cache() {
        let web = Arc::new(MockImageWebRepository::new(Ok(test_image(1, 1))));
        let cache = Arc::new(MemoryImageCache::new(10));
        let key = ImageCacheKey::new("https://example.com/a.png");
        cache.cache(test_image(1, 1), key.clone()).await;
        let memory_warning = MemoryPressure::new();
        let _interactor = make_interactor(web, cache.clone(), &memory_warning);

        assert_eq!(memory_warning.notify(), 1);

        tokio::time::timeout(TIMEOUT, async {
            while cache.cached_image(&key).await.is_ok() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("cache was not purged");
    }

    #[tokio::test]
    async fn test_dropping_interactor_ends_subscription() {
        let web = Arc::new(MockImageWebRepository::new(Ok(test_image(1, 1))));
        let cache = Arc::new(MemoryImageCache::new(10));
        let memory_warning = MemoryPressure::new();
        let interactor = make_interactor(web, cache, &memory_warning);

        drop(interactor);

        tokio::time::timeout(TIMEOUT, async {
            while memory_warning.notify() > 0 {
                tokio::task::yield_now().await;
            }
        })
        .await
        .expect("subscription outlived the interactor");
    }

    #[test]
    fn test_stub_interactor_does_nothing() {
        let binding = Binding::new(Loadable::Loaded(test_image(1, 1)));
        let handle = StubImagesInteractor.load(&binding, Some(png_url()));
        assert!(handle.is_cancelled());
        assert!(binding.get().is_loaded());
    }
}
