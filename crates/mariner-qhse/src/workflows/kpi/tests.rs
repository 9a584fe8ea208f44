use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use super::*;

#[derive(Default, Clone)]
struct MemoryKpiRepository {
    sheets: Arc<Mutex<BTreeMap<i32, KpiSheet>>>,
}

impl KpiRepository for MemoryKpiRepository {
    fn insert(&self, sheet: KpiSheet) -> Result<KpiSheet, KpiRepositoryError> {
        let mut guard = self.sheets.lock().expect("kpi mutex poisoned");
        if guard.contains_key(&sheet.year) {
            return Err(KpiRepositoryError::Conflict);
        }
        guard.insert(sheet.year, sheet.clone());
        Ok(sheet)
    }

    fn update(&self, sheet: KpiSheet) -> Result<(), KpiRepositoryError> {
        let mut guard = self.sheets.lock().expect("kpi mutex poisoned");
        match guard.get_mut(&sheet.year) {
            Some(existing) => {
                *existing = sheet;
                Ok(())
            }
            None => Err(KpiRepositoryError::NotFound),
        }
    }

    fn fetch(&self, year: i32) -> Result<Option<KpiSheet>, KpiRepositoryError> {
        Ok(self.sheets.lock().expect("kpi mutex poisoned").get(&year).cloned())
    }

    fn years(&self) -> Result<Vec<i32>, KpiRepositoryError> {
        Ok(self.sheets.lock().expect("kpi mutex poisoned").keys().copied().collect())
    }
}

fn service() -> KpiService<MemoryKpiRepository> {
    KpiService::new(Arc::new(MemoryKpiRepository::default()))
}

#[test]
fn seeding_creates_standard_indicators_once() {
    let service = service();
    let mut targets = BTreeMap::new();
    targets.insert(Indicator::DrillsCompleted, 48.0);

    let sheet = service.seed(2025, SeedRequest { targets }).expect("seeded");

    assert_eq!(sheet.entries.len(), Indicator::ALL.len());
    assert_eq!(
        sheet.entry(Indicator::DrillsCompleted).and_then(|entry| entry.target),
        Some(48.0)
    );
    assert_eq!(sheet.entry(Indicator::Ltif).and_then(|entry| entry.target), None);

    assert!(matches!(
        service.seed(2025, SeedRequest::default()),
        Err(KpiError::AlreadySeeded(2025))
    ));
    assert!(service.seed(2026, SeedRequest::default()).is_ok());
    assert_eq!(service.years().expect("years"), vec![2025, 2026]);
}

#[test]
fn seeding_validates_year_and_targets() {
    let service = service();
    assert!(matches!(
        service.seed(1850, SeedRequest::default()),
        Err(KpiError::Validation(_))
    ));

    let mut targets = BTreeMap::new();
    targets.insert(Indicator::OilSpills, -1.0);
    assert!(matches!(
        service.seed(2025, SeedRequest { targets }),
        Err(KpiError::Validation(_))
    ));
}

#[test]
fn quarterly_actuals_update_annual_figure() {
    let service = service();
    service.seed(2025, SeedRequest::default()).expect("seeded");

    service
        .record_quarter(2025, "near-miss-reports", 1, Some(14.0))
        .expect("q1");
    let sheet = service
        .record_quarter(2025, "NEAR-MISS-REPORTS", 2, Some(9.0))
        .expect("q2");
    let entry = sheet.entry(Indicator::NearMissReports).expect("entry");
    assert_eq!(entry.quarters, [Some(14.0), Some(9.0), None, None]);
    assert_eq!(entry.annual(), Some(23.0));

    let cleared = service
        .record_quarter(2025, "near-miss-reports", 1, None)
        .expect("cleared");
    assert_eq!(
        cleared.entry(Indicator::NearMissReports).and_then(KpiEntry::annual),
        Some(9.0)
    );
}

#[test]
fn quarterly_actuals_reject_bad_input() {
    let service = service();
    service.seed(2025, SeedRequest::default()).expect("seeded");

    assert!(matches!(
        service.record_quarter(2025, "ltif", 5, Some(1.0)),
        Err(KpiError::InvalidQuarter(5))
    ));
    assert!(matches!(
        service.record_quarter(2025, "fuel-burn", 1, Some(1.0)),
        Err(KpiError::UnknownIndicator(_))
    ));
    assert!(matches!(
        service.record_quarter(2025, "ltif", 1, Some(f64::NAN)),
        Err(KpiError::Validation(_))
    ));
    assert!(matches!(
        service.record_quarter(2024, "ltif", 1, Some(1.0)),
        Err(KpiError::NotSeeded(2024))
    ));
}

#[test]
fn export_writes_one_row_per_indicator() {
    let service = service();
    let mut targets = BTreeMap::new();
    targets.insert(Indicator::DrillsCompleted, 48.0);
    service.seed(2025, SeedRequest { targets }).expect("seeded");
    service
        .record_quarter(2025, "drills-completed", 1, Some(12.0))
        .expect("q1");

    let csv = service.export_csv(2025).expect("export");
    let lines: Vec<&str> = csv.lines().collect();

    assert_eq!(lines[0], "year,indicator,label,unit,target,q1,q2,q3,q4,annual");
    assert_eq!(lines.len(), Indicator::ALL.len() + 1);
    assert!(lines.contains(&"2025,drills-completed,Drills completed,count,48,12,,,,12"));
}

fn request(method: &str, uri: &str, body: Option<Value>) -> Request<Body> {
    let builder = Request::builder().method(method).uri(uri);
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .expect("request builds"),
        None => builder.body(Body::empty()).expect("request builds"),
    }
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 256 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&bytes).expect("json payload")
}

#[tokio::test]
async fn seed_endpoint_conflicts_on_second_call() {
    let router = kpi_router(Arc::new(service()));

    let response = router
        .clone()
        .oneshot(request("POST", "/api/v1/kpi/2025/seed", None))
        .await
        .expect("router executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    assert_eq!(body["data"]["year"], json!(2025));
    assert_eq!(body["data"]["entries"].as_array().map(Vec::len), Some(7));

    let response = router
        .oneshot(request("POST", "/api/v1/kpi/2025/seed", None))
        .await
        .expect("router executes");
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(json_body(response).await["success"], json!(false));
}

#[tokio::test]
async fn seed_endpoint_rejects_invalid_targets_without_seeding() {
    let router = kpi_router(Arc::new(service()));

    for body in [
        json!({ "targets": { "fuel-burn": 5.0 } }),
        json!({ "targets": { "ltif": "low" } }),
    ] {
        let response = router
            .clone()
            .oneshot(request("POST", "/api/v1/kpi/2025/seed", Some(body)))
            .await
            .expect("router executes");
        assert!(response.status().is_client_error());
        assert_eq!(json_body(response).await["success"], json!(false));
    }

    let response = router
        .clone()
        .oneshot(request("GET", "/api/v1/kpi", None))
        .await
        .expect("router executes");
    assert_eq!(json_body(response).await["data"], json!([]));

    let response = router
        .oneshot(request(
            "POST",
            "/api/v1/kpi/2025/seed",
            Some(json!({ "targets": { "ltif": 0.5 } })),
        ))
        .await
        .expect("router executes");
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = json_body(response).await;
    let ltif = body["data"]["entries"]
        .as_array()
        .and_then(|entries| {
            entries
                .iter()
                .find(|entry| entry["indicator"] == json!("ltif"))
                .cloned()
        })
        .expect("ltif entry");
    assert_eq!(ltif["target"], json!(0.5));
}

#[tokio::test]
async fn quarter_endpoint_records_actuals() {
    let router = kpi_router(Arc::new(service()));
    router
        .clone()
        .oneshot(request(
            "POST",
            "/api/v1/kpi/2025/seed",
            Some(json!({ "targets": { "oil-spills": 0.0 } })),
        ))
        .await
        .expect("router executes");

    let response = router
        .clone()
        .oneshot(request(
            "PUT",
            "/api/v1/kpi/2025/indicators/oil-spills/quarters/3",
            Some(json!({ "value": 1.0 })),
        ))
        .await
        .expect("router executes");
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    let entry = body["data"]["entries"]
        .as_array()
        .and_then(|entries| {
            entries
                .iter()
                .find(|entry| entry["indicator"] == json!("oil-spills"))
                .cloned()
        })
        .expect("oil spill entry");
    assert_eq!(entry["quarters"], json!([null, null, 1.0, null]));
    assert_eq!(entry["annual"], json!(1.0));
    assert_eq!(entry["target"], json!(0.0));

    let response = router
        .oneshot(request(
            "PUT",
            "/api/v1/kpi/2025/indicators/oil-spills/quarters/0",
            Some(json!({ "value": 1.0 })),
        ))
        .await
        .expect("router executes");
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn missing_sheet_and_export_headers() {
    let router = kpi_router(Arc::new(service()));

    let response = router
        .clone()
        .oneshot(request("GET", "/api/v1/kpi/2031", None))
        .await
        .expect("router executes");
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    router
        .clone()
        .oneshot(request("POST", "/api/v1/kpi/2031/seed", None))
        .await
        .expect("router executes");
    let response = router
        .oneshot(request("GET", "/api/v1/kpi/2031/export", None))
        .await
        .expect("router executes");
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response
            .headers()
            .get(header::CONTENT_DISPOSITION)
            .and_then(|value| value.to_str().ok()),
        Some("attachment; filename=\"kpi-2031.csv\"")
    );
}
