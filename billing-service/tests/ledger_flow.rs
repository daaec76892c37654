use billing_service::{
    report::{self, CsvRenderer, ExportFilter, ReportError, TextRenderer},
    service::{BillingService, ServiceError},
    validation::{BillingForm, Field},
};
use meter_client::{
    db,
    domain::{BlockRule, Locale, WindowKind},
};
use time::macros::datetime;

fn form(block: &str, meter: &str) -> BillingForm {
    BillingForm {
        block: block.to_string(),
        meter_reading: meter.to_string(),
        tariff_rate: "2.0".to_string(),
        vat_percent: "15".to_string(),
        additional_fee: "50".to_string(),
    }
}

async fn service() -> BillingService {
    let pool = db::connect_in_memory().await.unwrap();
    BillingService::new(pool, BlockRule::default())
}

#[tokio::test]
async fn first_and_second_submission_are_priced_against_the_ledger() {
    let svc = service().await;

    let first = svc
        .submit(&form("355/10", "120"), datetime!(2024-01-01 09:00:00))
        .await
        .unwrap();
    assert_eq!(first.previous_reading, 0.0);
    assert_eq!(first.bill.consumption, 120.0);
    assert_eq!(first.bill.base_charge, 240.0);
    assert!((first.bill.vat_amount - 36.0).abs() < 1e-9);
    assert!((first.reading.final_payment - 326.0).abs() < 1e-9);

    let second = svc
        .submit(&form("355/10", "150"), datetime!(2024-02-01 09:00:00))
        .await
        .unwrap();
    assert_eq!(second.previous_reading, 120.0);
    assert_eq!(second.bill.consumption, 30.0);

    let lower = svc
        .submit(&form("355/10", "100"), datetime!(2024-03-01 09:00:00))
        .await
        .unwrap();
    assert_eq!(lower.bill.consumption, 0.0);
    assert_eq!(lower.reading.final_payment, 50.0);
}

#[tokio::test]
async fn invalid_form_is_not_stored() {
    let svc = service().await;

    let err = svc
        .submit(&form("355/99", ""), datetime!(2024-01-01 09:00:00))
        .await
        .unwrap_err();
    match err {
        ServiceError::Validation(errors) => {
            assert!(errors.for_field(Field::Block).is_some());
            assert!(errors.for_field(Field::MeterReading).is_some());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(svc.all().await.unwrap().is_empty());
}

#[tokio::test]
async fn history_recomputes_vat_and_exposes_drift_after_delete() {
    let svc = service().await;
    let first = svc
        .submit(&form("355/10", "120"), datetime!(2024-01-01 09:00:00))
        .await
        .unwrap();
    svc.submit(&form("355/10", "150"), datetime!(2024-02-01 09:00:00))
        .await
        .unwrap();

    let rows = svc.history("355/10").await.unwrap();
    assert_eq!(rows.len(), 2);
    let (newest, breakdown) = &rows[0];
    assert_eq!(newest.meter_reading, 150.0);
    assert!((breakdown.vat_amount - 9.0).abs() < 1e-9);
    assert!(!breakdown.diverges());

    assert!(svc.delete(first.reading.id).await.unwrap());
    assert!(!svc.delete(first.reading.id).await.unwrap());

    let rows = svc.history("355/10").await.unwrap();
    assert_eq!(rows.len(), 1);
    let (_, breakdown) = &rows[0];
    assert_eq!(breakdown.consumption, 150.0);
    assert!(breakdown.diverges());
}

#[tokio::test]
async fn window_listing_uses_the_given_clock() {
    let svc = service().await;
    svc.submit(&form("355/1", "10"), datetime!(2024-06-01 00:00:00))
        .await
        .unwrap();
    svc.submit(&form("355/2", "20"), datetime!(2024-06-10 08:00:00))
        .await
        .unwrap();

    let now = datetime!(2024-06-10 12:00:00);
    assert_eq!(svc.window(WindowKind::Day, now).await.unwrap().len(), 1);
    assert_eq!(svc.window(WindowKind::Month, now).await.unwrap().len(), 2);
}

#[tokio::test]
async fn locale_toggle_persists() {
    let svc = service().await;
    assert_eq!(svc.locale().await.unwrap(), Locale::En);
    assert_eq!(svc.toggle_locale().await.unwrap(), Locale::Am);
    assert_eq!(svc.locale().await.unwrap(), Locale::Am);
}

#[tokio::test]
async fn export_writes_a_file_per_filter() {
    let svc = service().await;
    svc.submit(&form("355/10", "120"), datetime!(2024-01-01 09:00:00))
        .await
        .unwrap();
    svc.submit(&form("355/11", "80"), datetime!(2024-01-02 09:00:00))
        .await
        .unwrap();

    let dir = tempfile::tempdir().unwrap();
    let now = datetime!(2024-01-02 10:00:00);

    let path = report::export_report(
        svc.pool(),
        &ExportFilter::parse("355/10"),
        now,
        Locale::En,
        &CsvRenderer,
        dir.path(),
    )
    .await
    .unwrap();
    assert_eq!(
        path.file_name().unwrap().to_str().unwrap(),
        "property_data_355_10_2024-01-02_10-00-00.csv"
    );
    let csv = std::fs::read_to_string(&path).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(
        lines[1],
        "355/10,120.0,2.0,15.0(36.0),50.0,326.0,2024-01-01,09:00:00"
    );

    let path = report::export_report(
        svc.pool(),
        &ExportFilter::All,
        now,
        Locale::Am,
        &TextRenderer::default(),
        dir.path(),
    )
    .await
    .unwrap();
    let text = std::fs::read_to_string(&path).unwrap();
    assert!(text.starts_with("የቤት ቁጥር"));
    assert!(text.contains("355/11"));
}

#[tokio::test]
async fn export_with_no_rows_reports_no_data() {
    let svc = service().await;
    let dir = tempfile::tempdir().unwrap();

    let res = report::export_report(
        svc.pool(),
        &ExportFilter::Window(WindowKind::Day),
        datetime!(2024-01-02 10:00:00),
        Locale::En,
        &CsvRenderer,
        dir.path(),
    )
    .await;

    assert!(matches!(res, Err(ReportError::NoData)));
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
}
