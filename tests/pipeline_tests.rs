use logsift::{detect_format, parse, parse_lines, validate_input, AnalysisError, AnomalyKind, LogFormat};

const CUSTOM_LINE: &str = "[26/Feb/2025:08:48:45 +0100] lims.local to: 127.0.0.1:8891 - 10.138.100.157 - - {GET /path HTTP/1.1} - 200 - 0.302 - 21141";

#[test]
fn two_line_application_log() {
    let result = parse("2024-01-01 10:00:00 ERROR disk full\n2024-01-01 10:00:01 INFO ok\n", false);
    assert_eq!(result.total_logs, 2);
    assert!(!result.full_analysis);
    let levels = result.aggregations.level_distribution.unwrap();
    assert_eq!(levels.len(), 2);
    assert!(levels.iter().any(|l| l.level == "ERROR" && l.count == 1));
    assert!(levels.iter().any(|l| l.level == "INFO" && l.count == 1));
    assert!(result.sampling.is_none());
}

#[test]
fn custom_server_line_end_to_end() {
    assert_eq!(detect_format(&[CUSTOM_LINE]), LogFormat::CustomServer);

    let result = parse(CUSTOM_LINE, false);
    assert_eq!(result.total_logs, 1);
    let rec = result.sample_log.unwrap();
    assert_eq!(rec.status_code, Some(200));
    assert_eq!(rec.path.as_deref(), Some("/path"));
    assert!((rec.response_time.unwrap() - 0.302).abs() < 1e-9);
    // record statistics supersede the line-sample label
    assert_eq!(result.format, LogFormat::ServerLogs);
}

#[test]
fn slow_outlier_flagged_in_full_mode() {
    let mut lines: Vec<String> = (0..19)
        .map(|i| format!("2024-01-01 10:00:{i:02} INFO GET /api time=0.1{}", i % 3))
        .collect();
    lines.push("2024-01-01 10:00:19 INFO GET /api time=50".to_string());

    let result = parse_lines(&lines, true);
    assert!(result.full_analysis);
    let entries = result.aggregations.anomalies.unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].line_number, 20);
    assert_eq!(entries[0].anomalies[0].kind, AnomalyKind::SlowResponse);

    let summary = result.aggregations.anomaly_summary.unwrap();
    assert_eq!(summary.len(), 1);
    assert_eq!(summary[0].kind, AnomalyKind::SlowResponse);
    assert_eq!(summary[0].count, 1);
}

#[test]
fn quick_mode_skips_anomaly_detection() {
    let mut lines: Vec<String> = (0..19).map(|i| format!("GET /api time=0.1 id={i}")).collect();
    lines.push("GET /api time=50".to_string());
    let result = parse_lines(&lines, false);
    assert!(result.aggregations.anomalies.is_none());
    assert!(result.aggregations.anomaly_summary.is_none());
    assert!(result.sample_log.unwrap().anomalies.is_empty());
}

#[test]
fn text_and_line_inputs_agree() {
    let text = "INFO a\nGET /x status=404\n2024-01-01 10:00:00 WARN c";
    let lines: Vec<&str> = text.split('\n').collect();
    assert_eq!(parse(text, true), parse_lines(&lines, true));
}

#[test]
fn analysis_is_repeatable() {
    let text = "2024-01-01 10:00:00 ERROR a\n2024-01-01 10:00:01 ERROR b\n2024-01-01 10:00:02 ERROR c\nGET /x status=500";
    assert_eq!(parse(text, true), parse(text, true));
    assert_eq!(parse(text, false), parse(text, false));
}

#[test]
fn many_lines_are_reported_as_sample() {
    let text: String = (0..20_000).map(|i| format!("INFO event {i}\n")).collect();
    let result = parse(&text, false);
    assert_eq!(result.total_logs, logsift::parser::LINE_CAP);
    let info = result.sampling.as_ref().unwrap();
    assert!(info.is_sample);
    assert_eq!(info.sample_size, logsift::parser::LINE_CAP);
    assert_eq!(info.full_size, 20_000);
    assert_eq!(info.sampling_ratio, 1.33);

    let json = serde_json::to_value(&result).unwrap();
    assert_eq!(json["isSample"], true);
    assert_eq!(json["fullSize"], 20_000);
}

#[test]
fn full_mode_retains_every_record() {
    let text: String = (0..20_000).map(|i| format!("INFO event {i}\n")).collect();
    let result = parse(&text, true);
    assert_eq!(result.total_logs, 20_000);
    assert!(result.sampling.is_none());
}

#[test]
fn unparseable_input_yields_empty_result() {
    let result = parse("hello\nworld\n", false);
    assert_eq!(result.total_logs, 0);
    assert_eq!(result.format, LogFormat::Generic);
    assert!(result.sample_log.is_none());
}

#[test]
fn blank_input_is_rejected_before_analysis() {
    assert_eq!(validate_input("  \n\t").unwrap_err(), AnalysisError::EmptyInput);
    assert_eq!(validate_input("INFO x").unwrap(), "INFO x");
}
