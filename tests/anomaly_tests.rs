use logsift::anomaly;
use logsift::parser;
use logsift::{AnomalyKind, LogRecord, Severity};

fn parse_all(lines: &[String]) -> Vec<LogRecord> {
    let refs: Vec<&str> = lines.iter().map(String::as_str).collect();
    parser::parse_lines(&refs, true)
}

fn timed_lines(times: &[f64]) -> Vec<String> {
    times
        .iter()
        .enumerate()
        .map(|(i, t)| format!("2024-01-01 10:00:{:02} INFO GET /api/items time={t}", i % 60))
        .collect()
}

fn kinds(rec: &LogRecord) -> Vec<AnomalyKind> {
    rec.anomalies.iter().map(|a| a.kind).collect()
}

#[test]
fn single_slow_request_is_flagged() {
    let mut times: Vec<f64> = (0..19).map(|i| 0.09 + (i % 3) as f64 * 0.01).collect();
    times.push(50.0);
    let mut recs = parse_all(&timed_lines(&times));
    assert_eq!(recs.len(), 20);

    let flagged = anomaly::detect_response_time_anomalies(&mut recs);
    assert_eq!(flagged, 1);
    assert_eq!(kinds(&recs[19]), vec![AnomalyKind::SlowResponse]);
    assert!(recs[..19].iter().all(|r| r.anomalies.is_empty()));

    let a = &recs[19].anomalies[0];
    assert_eq!(a.severity, Severity::High);
    assert_eq!(a.value, Some(50.0));
    assert!(a.threshold.unwrap() < 50.0);
    assert!(a.message.starts_with("Slow response time (50.000s) exceeds threshold of "));
}

#[test]
fn too_few_response_times_yield_nothing() {
    let mut recs = parse_all(&timed_lines(&[0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 0.1, 90.0]));
    assert_eq!(anomaly::detect_response_time_anomalies(&mut recs), 0);
    assert!(recs.iter().all(|r| r.anomalies.is_empty()));
}

#[test]
fn uniform_response_times_yield_nothing() {
    let mut recs = parse_all(&timed_lines(&[0.25; 15]));
    assert_eq!(anomaly::detect_response_time_anomalies(&mut recs), 0);
}

#[test]
fn adjacent_errors_form_a_cluster() {
    let lines: Vec<String> = vec![
        "2024-01-01 10:00:00 INFO start".into(),
        "2024-01-01 10:00:01 ERROR db down".into(),
        "2024-01-01 10:00:02 ERROR db down".into(),
        "2024-01-01 10:00:03 ERROR db down".into(),
        "2024-01-01 10:00:04 INFO recovered".into(),
    ];
    let mut recs = parse_all(&lines);
    assert_eq!(anomaly::detect_error_clusters(&mut recs), 1);
    for rec in &recs[1..4] {
        let a = &rec.anomalies[0];
        assert_eq!(a.kind, AnomalyKind::ErrorCluster);
        assert_eq!(a.cluster, Some(1));
        assert_eq!(a.cluster_size, Some(3));
        assert_eq!(a.message, "Part of error cluster #1 with 3 errors");
    }
    assert!(recs[0].anomalies.is_empty());
    assert!(recs[4].anomalies.is_empty());
}

#[test]
fn distant_errors_split_clusters() {
    let mut lines: Vec<String> = Vec::new();
    for i in 0..3 {
        lines.push(format!("2024-01-01 10:00:0{i} ERROR first burst"));
    }
    for i in 0..20 {
        lines.push(format!("2024-01-01 10:01:{i:02} INFO quiet"));
    }
    for i in 0..4 {
        lines.push(format!("2024-01-01 10:02:0{i} ERROR second burst"));
    }
    let mut recs = parse_all(&lines);
    assert_eq!(anomaly::detect_error_clusters(&mut recs), 2);
    let second = recs.last().unwrap();
    assert_eq!(second.anomalies[0].cluster, Some(2));
    assert_eq!(second.anomalies[0].cluster_size, Some(4));
}

#[test]
fn small_error_groups_are_not_clusters() {
    let mut lines: Vec<String> = Vec::new();
    for burst in 0..3 {
        lines.push(format!("2024-01-01 10:0{burst}:00 ERROR a"));
        lines.push(format!("2024-01-01 10:0{burst}:01 ERROR b"));
        for i in 0..12 {
            lines.push(format!("2024-01-01 10:0{burst}:{:02} INFO filler", i + 10));
        }
    }
    let mut recs = parse_all(&lines);
    assert_eq!(anomaly::detect_error_clusters(&mut recs), 0);
}

#[test]
fn clustering_needs_timestamp_on_first_error() {
    let lines: Vec<String> = vec![
        "ERROR no clock".into(),
        "2024-01-01 10:00:01 ERROR b".into(),
        "2024-01-01 10:00:02 ERROR c".into(),
    ];
    let mut recs = parse_all(&lines);
    assert_eq!(anomaly::detect_error_clusters(&mut recs), 0);
    assert!(recs.iter().all(|r| r.anomalies.is_empty()));
}

#[test]
fn frequent_server_errors_are_flagged() {
    let mut lines: Vec<String> = (0..18).map(|_| "GET /a status=200".to_string()).collect();
    lines.push("GET /a status=503".into());
    lines.push("GET /a status=503".into());
    let mut recs = parse_all(&lines);
    assert_eq!(anomaly::detect_status_code_anomalies(&mut recs), 1);

    let flagged: Vec<&LogRecord> = recs.iter().filter(|r| !r.anomalies.is_empty()).collect();
    assert_eq!(flagged.len(), 2);
    let a = &flagged[0].anomalies[0];
    assert_eq!(a.kind, AnomalyKind::HighErrorRate);
    assert_eq!(a.severity, Severity::High);
    assert_eq!(a.status, Some(503));
    assert_eq!(a.message, "High rate of 503 errors (10.0% of requests)");
}

#[test]
fn frequent_client_errors_are_medium_severity() {
    let mut lines: Vec<String> = (0..7).map(|_| "GET /a status=200".to_string()).collect();
    lines.extend((0..3).map(|_| "GET /missing status=404".to_string()));
    let mut recs = parse_all(&lines);
    assert_eq!(anomaly::detect_status_code_anomalies(&mut recs), 1);
    let a = &recs[9].anomalies[0];
    assert_eq!(a.kind, AnomalyKind::HighClientErrorRate);
    assert_eq!(a.severity, Severity::Medium);
    assert!((a.percentage.unwrap() - 30.0).abs() < 1e-9);
}

#[test]
fn rare_client_errors_are_ignored() {
    let mut lines: Vec<String> = (0..9).map(|_| "GET /a status=200".to_string()).collect();
    lines.push("GET /missing status=404".into());
    let mut recs = parse_all(&lines);
    assert_eq!(anomaly::detect_status_code_anomalies(&mut recs), 0);
}

#[test]
fn status_rules_need_ten_samples() {
    let lines: Vec<String> = (0..9).map(|_| "GET /a status=500".to_string()).collect();
    let mut recs = parse_all(&lines);
    assert_eq!(anomaly::detect_status_code_anomalies(&mut recs), 0);
}

#[test]
fn passes_only_append() {
    let lines: Vec<String> = (0..20)
        .map(|i| {
            let status = if i >= 18 { 500 } else { 200 };
            let time = if i == 19 { 40.0 } else { 0.1 };
            format!("2024-01-01 10:00:{i:02} INFO GET /api/items status={status} time={time}")
        })
        .collect();
    let mut recs = parse_all(&lines);
    anomaly::detect_anomalies(&mut recs);
    assert_eq!(kinds(&recs[19]), vec![AnomalyKind::SlowResponse, AnomalyKind::HighErrorRate]);
    assert_eq!(kinds(&recs[18]), vec![AnomalyKind::HighErrorRate]);
    assert!(recs[..18].iter().all(|r| r.anomalies.is_empty()));
}

#[test]
fn codes_above_599_are_not_server_errors() {
    let mut lines: Vec<String> = (0..9).map(|_| "GET /a status=200".to_string()).collect();
    lines.push("GET /a status=999".into());
    lines.push("GET /a status=999".into());
    let mut recs = parse_all(&lines);
    assert_eq!(recs.iter().filter(|r| r.status_code == Some(999)).count(), 2);
    assert_eq!(anomaly::detect_status_code_anomalies(&mut recs), 0);
    assert!(recs.iter().all(|r| r.anomalies.is_empty()));
}
