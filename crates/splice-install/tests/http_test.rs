//! End-to-end install over HTTP: catalog, manifest and chunks served by a
//! mock chunk store.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

mod common;

use common::{Fixture, guid};
use splice_formats::chunk::encode_chunk;
use splice_install::{InstallConfig, InstallError, Installer, ManifestStore, default_fetcher};
use splice_protocol::{
    CdnChunkFetcher, CdnClient, HttpClient, ManifestClient, RetryPolicy, RetryingFetcher,
    parse_base_urls,
};
use std::time::Duration;
use tempfile::TempDir;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn catalog_json(manifest_uri: &str) -> String {
    format!(
        r#"{{
            "elements": [{{
                "appName": "SpliceTest",
                "labelName": "Live",
                "buildVersion": "1.0.0-CL-1",
                "manifests": [{{
                    "uri": "{manifest_uri}",
                    "queryParams": [{{ "name": "token", "value": "abc" }}]
                }}]
            }}]
        }}"#
    )
}

fn store(config: &InstallConfig) -> ManifestStore {
    let http = HttpClient::with_config(&config.http_config()).expect("http client");
    ManifestStore::new(ManifestClient::new(http, RetryPolicy::none()))
}

#[tokio::test]
async fn install_from_catalog() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let fixture = Fixture::new()
        .chunk(1, b"HelloWorld", false)
        .chunk(2, &b"zlib ".repeat(64), true)
        .file("a.txt", &[(1, 0, 5), (1, 5, 5)])
        .file("bin/z.dat", &[(2, 0, 320), (1, 0, 5)]);
    let manifest_json = fixture.manifest_json();
    let (manifest, _) = fixture.build();

    Mock::given(method("GET"))
        .and(path("/catalog"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(catalog_json(&format!("{}/Builds/b.manifest", server.uri()))),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/Builds/b.manifest"))
        .and(query_param("token", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(manifest_json.clone()))
        .expect(1)
        .mount(&server)
        .await;

    for (id, payload, compress) in [
        (1, b"HelloWorld".to_vec(), false),
        (2, b"zlib ".repeat(64), true),
    ] {
        let chunk = manifest.chunk(&guid(id)).expect("chunk in manifest");
        Mock::given(method("GET"))
            .and(path(format!("/CloudDir/{}", chunk.path())))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_bytes(encode_chunk(guid(id), &payload, compress).unwrap()),
            )
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = InstallConfig::new(
        dir.path().join("files"),
        dir.path().join("cache"),
        [format!("{}/CloudDir", server.uri())],
    );
    config.catalog_url = Some(format!("{}/catalog", server.uri()));
    config.validate().unwrap();

    let loaded = store(&config).load(&config).await.unwrap();
    assert_eq!(loaded.files().len(), 2);
    assert!(config.manifest_cache_path().exists());
    assert!(config.catalog_cache_path().exists());

    // Served from the cache directory this time
    let cached = store(&config).load(&config).await.unwrap();
    assert_eq!(cached.build_version(), "1.0.0-CL-1");

    let http = HttpClient::new().unwrap();
    let installer = Installer::new(config.clone(), default_fetcher(&config, http).unwrap());
    let summary = installer.run(&loaded).await.unwrap();

    assert!(summary.is_success(), "{summary:?}");
    assert_eq!(summary.chunks_fetched, 2);
    assert_eq!(
        tokio::fs::read(dir.path().join("files/a.txt")).await.unwrap(),
        b"HelloWorld"
    );
    let mut expected = b"zlib ".repeat(64);
    expected.extend_from_slice(b"Hello");
    assert_eq!(
        tokio::fs::read(dir.path().join("files/bin/z.dat"))
            .await
            .unwrap(),
        expected
    );
}

#[tokio::test]
async fn missing_chunk_fails_file_after_retries() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let (manifest, _) = Fixture::new()
        .chunk(1, b"payload", false)
        .file("a", &[(1, 0, 7)])
        .build();

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let mut config = InstallConfig::new(
        dir.path().join("files"),
        dir.path().join("cache"),
        [server.uri()],
    );
    config.retries = 2;

    let bases = parse_base_urls(config.urls.as_slice()).unwrap();
    let fetcher = RetryingFetcher::new(
        CdnChunkFetcher::new(CdnClient::new(HttpClient::new().unwrap()), bases).unwrap(),
        RetryPolicy {
            max_attempts: config.retries,
            initial_backoff: Duration::from_millis(1),
            max_backoff: Duration::from_millis(2),
            multiplier: 2.0,
            jitter: false,
        },
    );
    let summary = Installer::new(config, fetcher).run(&manifest).await.unwrap();

    assert_eq!(summary.failed.len(), 1);
    assert!(summary.failed[0].reason.contains("503"), "{}", summary.failed[0].reason);
    assert!(!dir.path().join("files/a").exists());
}

#[tokio::test]
async fn manifest_by_id_uses_first_base_url() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let json = Fixture::new()
        .chunk(1, b"x", false)
        .file("x", &[(1, 0, 1)])
        .manifest_json();
    Mock::given(method("GET"))
        .and(path("/CloudDir/build-42.manifest"))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(json))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = InstallConfig::new(
        dir.path().join("files"),
        dir.path().join("cache"),
        [
            format!("{}/CloudDir", server.uri()),
            "http://second.invalid".to_string(),
        ],
    );
    config.manifest_id = Some("build-42".to_string());

    let manifest = store(&config).load(&config).await.unwrap();
    assert_eq!(manifest.files()[0].file_name, "x");
    assert!(!config.manifest_cache_path().exists());
}

#[tokio::test]
async fn catalog_with_two_elements_is_rejected() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let element = r#"{ "appName": "A", "labelName": "L", "buildVersion": "1",
                       "manifests": [{ "uri": "http://x/m" }] }"#;
    Mock::given(method("GET"))
        .and(path("/catalog"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(format!(r#"{{ "elements": [{element}, {element}] }}"#)),
        )
        .mount(&server)
        .await;

    let mut config = InstallConfig::new(
        dir.path().join("files"),
        dir.path().join("cache"),
        [server.uri()],
    );
    config.catalog_url = Some(format!("{}/catalog", server.uri()));

    assert!(matches!(
        store(&config).load(&config).await,
        Err(InstallError::UnsupportedCatalog(_))
    ));
    assert!(!config.catalog_cache_path().exists());
}
