//! End-to-end harvest runs over a stubbed transport.

use async_trait::async_trait;
use serde_json::json;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use dkan_harvester::{
    CatalogIdentifier, ContentSource, DkanClient, FailureStage, HarvestPipeline, License,
    MemorySink, PackageNormalizer, SourceFailure, StaticLicenseRegistry, TransportError,
};

const BASE: &str = "http://dkan.test";

struct StubSite {
    pages: HashMap<String, Result<String, TransportError>>,
    requested: Mutex<Vec<String>>,
}

impl StubSite {
    fn new() -> Self {
        Self {
            pages: HashMap::new(),
            requested: Mutex::new(Vec::new()),
        }
    }

    fn page(mut self, path: &str, body: serde_json::Value) -> Self {
        self.pages.insert(format!("{BASE}{path}"), Ok(body.to_string()));
        self
    }

    fn failing(mut self, path: &str, error: TransportError) -> Self {
        self.pages.insert(format!("{BASE}{path}"), Err(error));
        self
    }

    fn requested(&self) -> Vec<String> {
        self.requested.lock().unwrap().clone()
    }
}

#[async_trait]
impl ContentSource for StubSite {
    async fn get_content(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.requested.lock().unwrap().push(url.to_string());
        match self.pages.get(url) {
            Some(Ok(body)) => Ok(body.clone().into_bytes()),
            Some(Err(e)) => Err(e.clone()),
            None => Err(TransportError::Status { status: 404 }),
        }
    }
}

fn normalizer() -> PackageNormalizer {
    PackageNormalizer::new(Arc::new(StaticLicenseRegistry::new(vec![License::new(
        "cc-zero", "CC0",
    )])))
}

#[tokio::test]
async fn harvests_good_package_and_records_transport_failure() {
    let site = StubSite::new()
        .page("/api/3/action/package_list", json!({"result": ["a", "b"]}))
        .page(
            "/api/3/action/package_show/a",
            json!({"result": [{
                "title": "Budget Data",
                "license_title": "CC0",
                "resources": [{"title": "data.csv", "mimetype": "text/csv"}]
            }]}),
        )
        .failing(
            "/api/3/action/package_show/b",
            TransportError::Request("connection reset by peer".to_string()),
        );

    let pipeline = HarvestPipeline::new(DkanClient::new(site), normalizer(), MemorySink::new());
    let report = pipeline.run_source(BASE).await.unwrap();

    assert_eq!(report.imported, vec![CatalogIdentifier::from("a")]);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].identifier, CatalogIdentifier::from("b"));
    assert_eq!(report.failures[0].stage, FailureStage::Fetch);
    assert!(report.failures[0].reason.contains("connection reset by peer"));

    let packages = pipeline.sink().packages();
    let output = serde_json::to_value(&packages[0].1).unwrap();
    assert_eq!(output["name"], json!("budget-data"));
    assert_eq!(output["license_id"], json!("cc-zero"));
    assert_eq!(output["extras"], json!({}));
    assert_eq!(
        output["resources"],
        json!([{
            "title": "data.csv",
            "description": "data.csv",
            "format": "CSV",
            "mimetype": "text/csv"
        }])
    );
}

#[tokio::test]
async fn private_package_without_resources_is_not_emitted() {
    let site = StubSite::new()
        .page("/api/3/action/package_list", json!({"result": ["hidden"]}))
        .page(
            "/api/3/action/package_show/hidden",
            json!({"result": [{"title": "Hidden", "private": true}]}),
        );

    let pipeline = HarvestPipeline::new(DkanClient::new(site), normalizer(), MemorySink::new());
    let report = pipeline.run_source(BASE).await.unwrap();

    assert!(report.imported.is_empty());
    assert!(pipeline.sink().packages().is_empty());
    let reasons = report.failure_reasons();
    assert_eq!(reasons.len(), 1);
    assert!(reasons[0].1.contains("Dataset has no resources"));
    assert_eq!(pipeline.sink().object_errors()[0].0, CatalogIdentifier::from("hidden"));
}

#[tokio::test]
async fn unreachable_catalog_aborts_before_any_fetch() {
    let site = StubSite::new().failing(
        "/api/3/action/package_list",
        TransportError::Status { status: 500 },
    );

    let pipeline = HarvestPipeline::new(DkanClient::new(site), normalizer(), MemorySink::new());
    let err = pipeline.run_source(BASE).await.unwrap_err();

    assert!(matches!(err, SourceFailure::Unreachable { .. }));
    assert_eq!(pipeline.sink().gather_errors().len(), 1);
    assert!(pipeline.sink().packages().is_empty());
}

#[tokio::test]
async fn concurrent_run_reports_every_identifier_once() {
    let ids: Vec<String> = (0..20).map(|i| format!("pkg-{i}")).collect();
    let mut site = StubSite::new().page("/api/3/action/package_list", json!({ "result": ids.clone() }));
    for (i, id) in ids.iter().enumerate() {
        let record = if i % 5 == 0 {
            json!({"title": format!("Broken {i}")})
        } else {
            json!({
                "title": format!("Dataset {i}"),
                "private": true,
                "resources": [{"title": "file", "mimetype": "application/json", "revision_id": "r"}]
            })
        };
        site = site.page(
            &format!("/api/3/action/package_show/{id}"),
            json!({ "result": [record] }),
        );
    }

    let pipeline = HarvestPipeline::new(DkanClient::new(site), normalizer(), MemorySink::new())
        .with_concurrency(4);
    let report = pipeline.run_source(BASE).await.unwrap();

    assert_eq!(report.enumerated, 20);
    assert_eq!(report.imported.len(), 16);
    assert_eq!(report.failures.len(), 4);
    assert!(report.skipped.is_empty());

    for (_, package) in pipeline.sink().packages() {
        assert_eq!(package.private, Some(false));
        assert_eq!(package.resources[0].format, "JSON");
        let resource = serde_json::to_value(&package.resources[0]).unwrap();
        assert!(resource.get("revision_id").is_none());
    }
}

#[tokio::test]
async fn trailing_slash_in_base_url_is_ignored() {
    let site = StubSite::new()
        .page("/api/3/action/package_list", json!({"result": ["a"]}))
        .page(
            "/api/3/action/package_show/a",
            json!({"result": [{"name": "a", "resources": [{"title": "r"}]}]}),
        );
    let client = DkanClient::new(site);

    let pipeline = HarvestPipeline::new(client, normalizer(), MemorySink::new());
    let report = pipeline.run_source("http://dkan.test/").await.unwrap();

    assert_eq!(report.imported.len(), 1);
}

#[tokio::test]
async fn each_identifier_fetched_once() {
    let site = Arc::new(
        StubSite::new()
            .page("/api/3/action/package_list", json!({"result": ["a", "b"]}))
            .failing("/api/3/action/package_show/a", TransportError::Timeout),
    );

    let pipeline = HarvestPipeline::new(
        DkanClient::new(SharedSite(site.clone())),
        normalizer(),
        MemorySink::new(),
    );
    let report = pipeline.run_source(BASE).await.unwrap();

    assert_eq!(report.failures.len(), 2);
    assert_eq!(
        site.requested(),
        vec![
            format!("{BASE}/api/3/action/package_list"),
            format!("{BASE}/api/3/action/package_show/a"),
            format!("{BASE}/api/3/action/package_show/b"),
        ]
    );
}

struct SharedSite(Arc<StubSite>);

#[async_trait]
impl ContentSource for SharedSite {
    async fn get_content(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.0.get_content(url).await
    }
}
