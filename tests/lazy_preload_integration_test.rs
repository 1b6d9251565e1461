//! Lazy loading against the geometric viewport, and preloading through the
//! HTTP resource loader.

mod common;

use std::io::Cursor;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use cacheway::domain::models::{
    AssetCompletion, PreloadConfig, PreloadResource, ProxyResponse, Rect, RegionId, ResourceKind,
    PLACEHOLDER_SVG,
};
use cacheway::infrastructure::http::HttpResourceLoader;
use cacheway::infrastructure::viewport::ScrollViewport;
use cacheway::services::{
    image_cache_key, CriticalPathLoader, ImageState, LazyImageLoader, LazyImageOptions,
    ResourcePreloader,
};
use cacheway::ObjectCache;
use common::{setup_test_logging, RecordingLoader, ScriptedFetcher};
use image::{ImageBuffer, ImageFormat, Rgb};
use url::Url;

fn png_bytes() -> Vec<u8> {
    let img = ImageBuffer::from_pixel(2, 2, Rgb([200u8, 10, 10]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

fn media_fetcher() -> ScriptedFetcher {
    ScriptedFetcher::new()
        .route(
            "https://media.example.org/hero.png",
            ProxyResponse::new(200, png_bytes()).with_header("content-type", "image/png"),
        )
        .route(
            "https://media.example.org/logo.svg",
            ProxyResponse::new(200, PLACEHOLDER_SVG).with_header("content-type", "image/svg+xml"),
        )
        .route(
            "https://media.example.org/corrupt.jpg",
            ProxyResponse::new(200, "not an image").with_header("content-type", "image/jpeg"),
        )
        .route("https://media.example.org/app.js", ProxyResponse::new(200, "boot()"))
}

fn base() -> Url {
    Url::parse("https://media.example.org/").unwrap()
}

async fn settle_tasks() {
    for _ in 0..10 {
        tokio::task::yield_now().await;
    }
}

#[tokio::test]
async fn test_image_loads_once_scrolled_into_view() {
    setup_test_logging();
    let viewport = ScrollViewport::new(800.0, 600.0);
    let cache = Arc::new(ObjectCache::<Bytes>::new(10));
    let loader = Arc::new(RecordingLoader::default());
    let lazy = LazyImageLoader::new(cache.clone(), loader.clone(), Arc::new(viewport.clone()));

    let region = RegionId::new();
    viewport.place(region, Rect::new(0.0, 1_500.0, 300.0, 200.0));
    let mut image = lazy.mount(LazyImageOptions::new("gallery/7.png", region));

    settle_tasks().await;
    assert_eq!(image.state(), ImageState::PlaceholderShown);
    assert_eq!(image.view().source.as_ref(), PLACEHOLDER_SVG.as_bytes());
    assert!(loader.images.lock().unwrap().is_empty());

    // Still outside the 50px margin.
    viewport.scroll_to(800.0);
    settle_tasks().await;
    assert!(loader.images.lock().unwrap().is_empty());

    viewport.scroll_to(1_000.0);
    let view = image.settled().await;
    assert_eq!(view.state, ImageState::Loaded);
    assert_eq!(view.source.as_ref(), b"image:gallery/7.png");
    assert!(cache.has(&image_cache_key("gallery/7.png")));

    // One-shot: scrolling away and back does not load again.
    viewport.scroll_to(0.0);
    viewport.scroll_to(1_000.0);
    settle_tasks().await;
    assert_eq!(loader.images.lock().unwrap().len(), 1);
    assert!(!image.is_observing());
    assert_eq!(viewport.active_observations(), 0);
}

#[tokio::test]
async fn test_second_mount_of_same_image_hits_cache() {
    let viewport = ScrollViewport::new(800.0, 600.0);
    let cache = Arc::new(ObjectCache::<Bytes>::new(10));
    let loader = Arc::new(RecordingLoader::default());
    let lazy = LazyImageLoader::new(cache, loader.clone(), Arc::new(viewport.clone()));

    let first_region = RegionId::new();
    let second_region = RegionId::new();
    viewport.place(first_region, Rect::new(0.0, 0.0, 300.0, 200.0));
    viewport.place(second_region, Rect::new(320.0, 0.0, 300.0, 200.0));

    let mut first = lazy.mount(LazyImageOptions::new("avatar.png", first_region));
    assert_eq!(first.settled().await.state, ImageState::Loaded);

    let mut second = lazy.mount(LazyImageOptions::new("avatar.png", second_region));
    assert_eq!(second.settled().await.state, ImageState::Loaded);
    assert_eq!(loader.images.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_unmounted_image_releases_observation() {
    let viewport = ScrollViewport::new(800.0, 600.0);
    let loader = Arc::new(RecordingLoader::default());
    let lazy = LazyImageLoader::new(
        Arc::new(ObjectCache::new(10)),
        loader.clone(),
        Arc::new(viewport.clone()),
    );

    let region = RegionId::new();
    viewport.place(region, Rect::new(0.0, 5_000.0, 300.0, 200.0));
    let image = lazy.mount(LazyImageOptions::new("far.png", region));
    assert_eq!(viewport.active_observations(), 1);

    image.unmount();
    settle_tasks().await;
    assert_eq!(viewport.active_observations(), 0);

    viewport.scroll_to(5_000.0);
    settle_tasks().await;
    assert!(loader.images.lock().unwrap().is_empty());
}

#[tokio::test]
async fn test_http_loader_decodes_and_rejects_images() {
    let loader = HttpResourceLoader::new(Arc::new(media_fetcher())).with_base(base());
    let viewport = ScrollViewport::new(800.0, 600.0);
    let lazy = LazyImageLoader::new(
        Arc::new(ObjectCache::new(10)),
        Arc::new(loader),
        Arc::new(viewport),
    );

    let mut hero = lazy.mount(LazyImageOptions::new("hero.png", RegionId::new()).high_priority());
    let mut corrupt = lazy.mount(LazyImageOptions::new("corrupt.jpg", RegionId::new()).high_priority());

    let hero = hero.settled().await;
    assert_eq!(hero.state, ImageState::Loaded);
    assert_eq!(hero.source.as_ref(), png_bytes().as_slice());

    let corrupt = corrupt.settled().await;
    assert_eq!(corrupt.state, ImageState::Failed);
    assert_eq!(corrupt.source.as_ref(), PLACEHOLDER_SVG.as_bytes());
}

#[tokio::test]
async fn test_awaited_preload_through_http_loader() {
    let loader = Arc::new(HttpResourceLoader::new(Arc::new(media_fetcher())).with_base(base()));
    let preloader = ResourcePreloader::with_config(
        loader,
        PreloadConfig {
            asset_completion: AssetCompletion::Awaited,
            ..PreloadConfig::default()
        },
    );

    let resources = vec![
        PreloadResource::style("missing.css"),
        PreloadResource::script("app.js").high(),
        PreloadResource::image("hero.png").high(),
        PreloadResource::image("logo.svg"),
    ];

    let handle = preloader.start(&resources);
    let report = handle.wait().await;

    let mut loaded = report.loaded.clone();
    loaded.sort();
    assert_eq!(loaded, vec!["app.js", "hero.png", "logo.svg"]);
    assert_eq!(report.failed.len(), 1);
    assert_eq!(report.failed[0].0, "missing.css");
    assert!(!report.is_complete());
}

#[tokio::test(start_paused = true)]
async fn test_optimistic_assets_settle_without_waiting_for_network() {
    let loader = Arc::new(RecordingLoader::default());
    let preloader = ResourcePreloader::new(loader.clone());

    let handle = preloader.start(&[
        PreloadResource::script("broken.js"),
        PreloadResource::new("theme.css", ResourceKind::Style),
    ]);
    assert!(handle.is_loading());

    tokio::time::sleep(Duration::from_millis(150)).await;
    let status = handle.status();
    assert!(!status.is_loading);
    assert!(status.loaded.contains("broken.js"));
    assert!(status.loaded.contains("theme.css"));

    let report = handle.wait().await;
    assert!(report.is_complete());
    assert_eq!(loader.assets.lock().unwrap().len(), 2);
}

#[tokio::test]
async fn test_critical_path_signals_ready_even_when_an_image_fails() {
    let loader = Arc::new(RecordingLoader::default());
    let critical = CriticalPathLoader::new(loader.clone());

    let mut ready = critical.start(vec!["hero.png".to_string(), "broken.png".to_string()]);
    ready.wait_for(|ready| *ready).await.unwrap();

    let mut requested = loader.images.lock().unwrap().clone();
    requested.sort();
    assert_eq!(requested, vec!["broken.png", "hero.png"]);
}
