mod common;

use carrot_orbit::{
    SceneConfig,
    resources::{
        PlatformSource,
        font::load_font,
        material::MaterialKey,
        texture::{Channel, LoadError, TextureCache, channel_url},
    },
    scene::director::SceneDirector,
};
use common::AssetDir;

#[tokio::test]
async fn preloads_planet_maps_from_disk() {
    let dir = AssetDir::new();
    let config = SceneConfig {
        asset_root: dir.root(),
        ..SceneConfig::default()
    };
    dir.write_material(&config.planet_material, &[]);
    dir.write_material(&config.moon_material, &[]);
    dir.write_material(&config.cloud_material, &[]);

    let rule = config.clone();
    let cache = TextureCache::new(PlatformSource::new(config.asset_root.clone()))
        .with_settings(move |url| rule.texture_settings(url));
    cache
        .preload_all(&config.texture_urls())
        .await
        .expect("all maps present");
    assert_eq!(cache.progress(), 100.0);

    let textures = cache.ready().expect("no batch outstanding");
    assert_eq!(textures.len(), 18);

    let scene = SceneDirector::new(&config, &textures);
    let grass = &scene.materials()[&MaterialKey::Grass];
    assert!(grass.maps().iter().all(Option::is_some));
    assert_eq!(grass.uv_repeat(), [8.0, 8.0]);
    assert_eq!(
        grass.albedo.as_ref().map(|t| t.dimensions()),
        Some((4, 4))
    );
    let paper = &scene.materials()[&MaterialKey::Cloud];
    assert!(paper.maps().iter().all(Option::is_some));
    assert_eq!(paper.uv_repeat(), [1.0, 1.0]);
    assert_eq!(paper.metalness, 0.0);
}

#[tokio::test]
async fn missing_maps_are_reported_and_left_out() {
    let dir = AssetDir::new();
    let config = SceneConfig {
        asset_root: dir.root(),
        ..SceneConfig::default()
    };
    dir.write_material(&config.planet_material, &[Channel::Height]);
    dir.write_material(&config.moon_material, &[]);
    dir.write_material(&config.cloud_material, &[]);
    // Not an image at all
    std::fs::write(
        dir.path().join(channel_url(&config.moon_material, Channel::Ao)),
        b"not a png",
    )
    .expect("write junk");

    let cache = TextureCache::new(PlatformSource::new(config.asset_root.clone()));
    let err = cache
        .preload_all(&config.texture_urls())
        .await
        .expect_err("two maps are broken");
    let mut failed = err.urls();
    failed.sort();
    assert_eq!(
        failed,
        vec![
            "peeling-painted-metal_ao.png",
            "stylized-grass1_height.png",
        ]
    );
    assert_eq!(cache.progress(), 100.0);

    let textures = cache.ready().expect("failed loads still settle");
    assert_eq!(textures.len(), 16);
    let scene = SceneDirector::new(&config, &textures);
    let grass = &scene.materials()[&MaterialKey::Grass];
    assert!(grass.height.is_none());
    assert!(grass.albedo.is_some());
}

#[test]
fn asset_dirs_do_not_share_files() {
    let first = AssetDir::new();
    let second = AssetDir::new();
    assert_ne!(first.path(), second.path());
    first.write_png("a.png", [0, 0, 0, 255]);
    assert!(!second.path().join("a.png").exists());

    let path = first.path().to_path_buf();
    drop(first);
    assert!(!path.exists());
}

#[tokio::test]
async fn unreadable_font_is_a_load_error() {
    let dir = AssetDir::new();
    let source = PlatformSource::new(dir.root());

    let missing = load_font(&source, "fonts/none.ttf").await;
    assert!(matches!(missing, Err(LoadError::Fetch { .. })));

    std::fs::write(dir.path().join("broken.ttf"), b"definitely not a font").expect("write font");
    let broken = load_font(&source, "broken.ttf").await;
    assert!(matches!(broken, Err(LoadError::Decode { .. })));
}

#[tokio::test]
async fn absolute_font_urls_are_fetched_over_http() {
    use tokio::{
        io::{AsyncReadExt, AsyncWriteExt},
        net::TcpListener,
    };

    let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
    let addr = listener.local_addr().expect("local addr");
    let server = tokio::spawn(async move {
        let (mut stream, _) = listener.accept().await.expect("accept");
        let mut request = [0u8; 1024];
        let _ = stream.read(&mut request).await;
        let body = b"definitely not a font";
        let head = format!(
            "HTTP/1.1 200 OK\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
            body.len()
        );
        stream.write_all(head.as_bytes()).await.expect("write head");
        stream.write_all(body).await.expect("write body");
    });

    // The asset root is ignored for absolute URLs
    let dir = AssetDir::new();
    let source = PlatformSource::new(dir.root());
    let fetched = load_font(&source, &format!("http://{}/font.ttf", addr)).await;
    // The bytes arrived, they are just not a font
    assert!(matches!(fetched, Err(LoadError::Decode { .. })));
    server.await.expect("server task");
}
