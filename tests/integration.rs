//! Integration tests for TradeSight

use std::io::Write;
use std::path::PathBuf;

use tempfile::NamedTempFile;
use tradesight::output::Section;
use tradesight::{
    analyze_routes, forecast_sales, monthly_totals, load_shipments, run, segment_customers,
    AnalyticsError, EngineConfig, Pipeline, Request, RouteFilter, YearMonth,
};

const SHIPMENT_HEADER: &str = "date,value,type,origin,O_Country,destination";

/// Create a customer CSV with four loose groups and a couple of incomplete rows
fn create_customer_csv() -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(
        file,
        "customer_id,order_value_usd,satisfaction_score,lead_time_days"
    )
    .unwrap();

    let groups = [
        (250.0, 4.6, 6.0),
        (4800.0, 4.1, 14.0),
        (1200.0, 2.2, 30.0),
        (9000.0, 1.5, 45.0),
    ];
    for i in 0..24 {
        let (value, score, lead) = groups[i % 4];
        let jitter = (i / 4) as f64;
        writeln!(
            file,
            "C{:03},{},{},{}",
            i,
            value + 10.0 * jitter,
            score + 0.01 * jitter,
            lead + 0.5 * jitter
        )
        .unwrap();
    }
    writeln!(file, "C900,,4.0,10").unwrap();
    writeln!(file, "C901,500.0,,10").unwrap();

    file
}

/// Deterministic shipment history: `months` months starting Jan 2022
fn create_shipment_csv(months: usize) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", SHIPMENT_HEADER).unwrap();

    let destinations = ["Dubai", "Colombo", "Singapore", "Dubai", "Rotterdam", "Dubai"];
    let mut state: u64 = 11;
    for m in 0..months {
        let year = 2022 + (m / 12) as i32;
        let month = (m % 12) + 1;
        let season = (2.0 * std::f64::consts::PI * month as f64 / 12.0).cos();
        for (n, day) in [3, 17].iter().enumerate() {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            let noise = (state >> 11) as f64 / (1u64 << 53) as f64 - 0.5;
            let value = 5000.0 + 40.0 * m as f64 + 900.0 * season + 300.0 * noise;
            let destination = destinations[(m + n) % destinations.len()];
            writeln!(
                file,
                "{:04}-{:02}-{:02},{:.2},Export,Mumbai,India,{}",
                year, month, day, value, destination
            )
            .unwrap();
        }
        writeln!(
            file,
            "{:04}-{:02}-25,750.00,Import,Mumbai,India,Dubai",
            year, month
        )
        .unwrap();
    }

    file
}

fn write_shipments(rows: &[&str]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "{}", SHIPMENT_HEADER).unwrap();
    for row in rows {
        writeln!(file, "{}", row).unwrap();
    }
    file
}

#[test]
fn test_end_to_end_report() {
    let customers = create_customer_csv();
    let shipments = create_shipment_csv(36);

    let request = Request {
        customers: customers.path().to_path_buf(),
        shipments: shipments.path().to_path_buf(),
        pipelines: Pipeline::ALL.to_vec(),
    };
    let report = run(&request, &EngineConfig::default());
    assert!(report.errors().is_empty(), "errors: {:?}", report.errors());

    let json = report.to_json().unwrap();

    let segments = json["customer_segmentation"].as_array().unwrap();
    assert_eq!(segments.len(), 24);
    for point in segments {
        assert!(point["x"].is_f64());
        assert!(point["y"].is_f64());
        assert!(point["cluster"].as_u64().unwrap() < 4);
    }

    let routes = &json["trade_route_analysis"];
    assert_eq!(routes["labels"][0], "Dubai");
    assert_eq!(
        routes["labels"].as_array().unwrap().len(),
        routes["data"].as_array().unwrap().len()
    );

    let forecast = &json["forecast"];
    assert_eq!(
        forecast["labels"],
        serde_json::json!(["Jan 2025", "Feb 2025", "Mar 2025", "Apr 2025", "May 2025", "Jun 2025"])
    );
    for key in ["forecast_data", "confidence_lower", "confidence_upper"] {
        assert_eq!(forecast[key].as_array().unwrap().len(), 6);
    }
}

#[test]
fn test_segmentation_is_deterministic_and_complete() {
    let customers = create_customer_csv();
    let config = EngineConfig::default();

    let first = segment_customers(customers.path(), &config).unwrap();
    let second = segment_customers(customers.path(), &config).unwrap();

    // the two incomplete rows are dropped, every other row has exactly one label
    assert_eq!(first.points.len(), 24);
    assert_eq!(first.model.cluster_sizes().iter().sum::<usize>(), 24);
    assert_eq!(first.model.labels, second.model.labels);

    // rows of the same generated group share a cluster
    for i in 4..24 {
        assert_eq!(first.points[i].cluster, first.points[i % 4].cluster);
    }
}

#[test]
fn test_segmentation_needs_at_least_k_customers() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "order_value_usd,satisfaction_score,lead_time_days").unwrap();
    writeln!(file, "100.0,4.0,3").unwrap();
    writeln!(file, "200.0,3.0,5").unwrap();

    let result = segment_customers(file.path(), &EngineConfig::default());
    assert!(matches!(
        result,
        Err(AnalyticsError::InsufficientData {
            records: 2,
            required: 4
        })
    ));
}

#[test]
fn test_route_filter_example() {
    let shipments = write_shipments(&[
        "2024-01-02,10.0,Export,Mumbai,India,Dubai",
        "2024-01-03,10.0,Export,Mumbai,India,Dubai",
        "2024-01-04,10.0,Export,Mumbai,India,Colombo",
        "2024-01-05,10.0,Import,Mumbai,India,Dubai",
    ]);

    let summary = analyze_routes(shipments.path(), &RouteFilter::default()).unwrap();
    assert_eq!(summary.labels(), vec!["Dubai", "Colombo"]);
    assert_eq!(summary.counts(), vec![2, 1]);
}

#[test]
fn test_route_filter_without_matches_is_empty() {
    let shipments = write_shipments(&["2024-01-02,10.0,Export,Chennai,India,Dubai"]);
    let summary = analyze_routes(shipments.path(), &RouteFilter::default()).unwrap();
    assert!(summary.is_empty());
}

#[test]
fn test_monthly_aggregation_from_csv() {
    let shipments = write_shipments(&[
        "2024-01-05,100.0,Export,Mumbai,India,Dubai",
        "2024-01-20,50.0,Export,Mumbai,India,Dubai",
    ]);

    let records = load_shipments(shipments.path()).unwrap();
    let series = monthly_totals(&records);
    assert_eq!(series.months, vec![YearMonth::new(2024, 1)]);
    assert_eq!(series.totals, vec![150.0]);
}

#[test]
fn test_constant_history_forecast() {
    let rows: Vec<String> = (0..30)
        .map(|m| {
            format!(
                "{:04}-{:02}-10,2500.0,Export,Mumbai,India,Dubai",
                2021 + m / 12,
                m % 12 + 1
            )
        })
        .collect();
    let refs: Vec<&str> = rows.iter().map(String::as_str).collect();
    let shipments = write_shipments(&refs);

    let forecast = forecast_sales(shipments.path(), &EngineConfig::default()).unwrap();
    assert_eq!(forecast.points.len(), 6);

    let mut previous_width = 0.0;
    for point in &forecast.points {
        assert!((point.point - 2500.0).abs() < 1e-6);
        let width = point.upper - point.lower;
        assert!(width >= 0.0 && width >= previous_width);
        previous_width = width;
    }
}

#[test]
fn test_forecast_intervals_widen_with_horizon() {
    let shipments = create_shipment_csv(36);
    let forecast = forecast_sales(shipments.path(), &EngineConfig::default()).unwrap();

    let mut previous_width = 0.0;
    for point in &forecast.points {
        assert!(point.lower <= point.point && point.point <= point.upper);
        let width = point.upper - point.lower;
        assert!(width >= previous_width - 1e-9);
        previous_width = width;
    }
}

#[test]
fn test_insufficient_history() {
    let shipments = create_shipment_csv(10);
    let result = forecast_sales(shipments.path(), &EngineConfig::default());
    assert!(matches!(
        result,
        Err(AnalyticsError::InsufficientHistory { actual: 10, .. })
    ));
}

#[test]
fn test_malformed_date_fails_forecast() {
    let shipments = write_shipments(&[
        "2024-01-05,100.0,Export,Mumbai,India,Dubai",
        "2024-13-45,50.0,Export,Mumbai,India,Dubai",
    ]);

    let result = forecast_sales(shipments.path(), &EngineConfig::default());
    assert!(matches!(
        result,
        Err(AnalyticsError::MalformedRecord { field: "date", .. })
    ));
}

#[test]
fn test_malformed_shipment_row_only_fails_forecast() {
    let customers = create_customer_csv();
    let shipments = write_shipments(&[
        "2024-01-02,10.0,Export,Mumbai,India,Dubai",
        "13/45/2024,10.0,Import,Chennai,India,Dubai",
        "2024-01-04,,Export,Mumbai,India,Colombo",
        "2024-01-05,10.0,Export,Mumbai,India,Dubai",
    ]);

    let request = Request {
        customers: customers.path().to_path_buf(),
        shipments: shipments.path().to_path_buf(),
        pipelines: Pipeline::ALL.to_vec(),
    };
    let report = run(&request, &EngineConfig::default());
    let json = report.to_json().unwrap();

    assert_eq!(
        json["trade_route_analysis"],
        serde_json::json!({"labels": ["Dubai", "Colombo"], "data": [2, 1]})
    );
    assert!(json["forecast"]["error"]
        .as_str()
        .unwrap()
        .contains("malformed record"));
    assert!(matches!(report.customer_segmentation, Some(Section::Ok(_))));
    assert_eq!(report.errors().len(), 1);
}

#[test]
fn test_blank_destination_cells_are_not_ranked() {
    let shipments = write_shipments(&[
        "2024-01-02,10.0,Export,Mumbai,India,",
        "2024-01-03,10.0,Export,Mumbai,India,",
        "2024-01-04,10.0,Export,Mumbai,India,",
        "2024-01-05,10.0,Export,Mumbai,India,Dubai",
    ]);

    let summary = analyze_routes(shipments.path(), &RouteFilter::default()).unwrap();
    assert_eq!(summary.labels(), vec!["Dubai"]);
    assert_eq!(summary.counts(), vec![1]);
}

#[test]
fn test_missing_shipment_column() {
    let mut file = NamedTempFile::new().unwrap();
    writeln!(file, "date,value,type,origin,destination").unwrap();
    writeln!(file, "2024-01-05,100.0,Export,Mumbai,Dubai").unwrap();

    match analyze_routes(file.path(), &RouteFilter::default()) {
        Err(AnalyticsError::Schema { column, .. }) => assert_eq!(column, "O_Country"),
        other => panic!("expected schema error, got {:?}", other),
    }
}

#[test]
fn test_forecast_failure_does_not_block_segmentation() {
    let customers = create_customer_csv();
    let shipments = create_shipment_csv(10);

    let request = Request {
        customers: customers.path().to_path_buf(),
        shipments: shipments.path().to_path_buf(),
        pipelines: vec![Pipeline::Segmentation, Pipeline::Forecast],
    };
    let report = run(&request, &EngineConfig::default());

    assert!(matches!(report.customer_segmentation, Some(Section::Ok(_))));
    let json = report.to_json().unwrap();
    assert!(json["forecast"]["error"]
        .as_str()
        .unwrap()
        .contains("insufficient history"));
    assert!(json.get("trade_route_analysis").is_none());
}

#[test]
fn test_missing_inputs_fail_every_section() {
    let request = Request {
        customers: PathBuf::from("/nonexistent/customer.csv"),
        shipments: PathBuf::from("/nonexistent/shipment.csv"),
        pipelines: Pipeline::ALL.to_vec(),
    };
    let report = run(&request, &EngineConfig::default());
    assert!(report.all_failed());
    assert!(report
        .errors()
        .iter()
        .all(|(_, message)| message.contains("not found")));
}
