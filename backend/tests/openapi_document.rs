//! Consistency checks over the published OpenAPI document.

use std::collections::HashSet;

use crm_backend::ApiDoc;
use rstest::{fixture, rstest};
use serde_json::Value;
use utoipa::OpenApi;

const METHODS: [&str; 5] = ["get", "post", "put", "patch", "delete"];

#[fixture]
fn document() -> Value {
    serde_json::to_value(ApiDoc::openapi()).expect("document serialises")
}

fn operations(doc: &Value) -> Vec<(String, &str, &Value)> {
    doc["paths"]
        .as_object()
        .expect("paths object")
        .iter()
        .flat_map(|(path, item)| {
            METHODS.iter().filter_map(move |method| {
                item.get(*method)
                    .map(|operation| (path.clone(), *method, operation))
            })
        })
        .collect()
}

#[rstest]
fn every_route_is_versioned_or_a_probe(document: Value) {
    for (path, method, _) in operations(&document) {
        assert!(
            path.starts_with("/api/v1/") || path.starts_with("/health/"),
            "{method} {path} is outside the versioned API"
        );
    }
}

#[rstest]
fn operation_ids_are_unique(document: Value) {
    let mut seen = HashSet::new();
    for (path, method, operation) in operations(&document) {
        if let Some(id) = operation["operationId"].as_str() {
            assert!(seen.insert(id.to_owned()), "{method} {path} reuses {id}");
        }
    }
}

#[rstest]
fn every_operation_is_tagged(document: Value) {
    let declared: HashSet<&str> = document["tags"]
        .as_array()
        .expect("tags array")
        .iter()
        .filter_map(|tag| tag["name"].as_str())
        .collect();
    for (path, method, operation) in operations(&document) {
        let tags = operation["tags"].as_array().expect("operation tags");
        assert!(!tags.is_empty(), "{method} {path} has no tag");
        for tag in tags {
            let name = tag.as_str().expect("tag name");
            assert!(declared.contains(name), "{method} {path} uses undeclared tag {name}");
        }
    }
}

#[rstest]
#[case("/api/v1/cron/{job}", "post", "CronBearer")]
fn cron_uses_bearer_security(
    document: Value,
    #[case] path: &str,
    #[case] method: &str,
    #[case] scheme: &str,
) {
    let security = &document["paths"][path][method]["security"];
    let schemes: Vec<&str> = security
        .as_array()
        .expect("security requirements")
        .iter()
        .filter_map(|requirement| requirement.as_object())
        .flat_map(|requirement| requirement.keys().map(String::as_str))
        .collect();
    assert_eq!(schemes, vec![scheme]);
}

#[rstest]
fn every_resource_area_is_documented(document: Value) {
    let paths = document["paths"].as_object().expect("paths object");
    for prefix in [
        "/api/v1/customers",
        "/api/v1/jobs",
        "/api/v1/invoices",
        "/api/v1/opportunities",
        "/api/v1/reviews",
        "/api/v1/messages",
        "/api/v1/promotions",
        "/api/v1/tickets",
        "/api/v1/conversations",
    ] {
        assert!(
            paths.keys().any(|path| path.starts_with(prefix)),
            "no operations under {prefix}"
        );
    }
}
