use logsift::masking::{pattern_key, redact_line};

#[test]
fn redacts_ip_and_long_numbers() {
    assert_eq!(redact_line("conn 10.0.0.1 id 123456 port 80"), "conn [IP] id [ID] port 80");
}

#[test]
fn removes_timestamps() {
    assert_eq!(redact_line("[26/Feb/2025:08:48:45 +0100] GET /"), " GET /");
    assert_eq!(redact_line("2024-01-01T10:00:00.123Z started"), " started");
    assert_eq!(redact_line("2024-01-01 10:00:00 started"), " started");
}

#[test]
fn pattern_key_takes_leading_tokens() {
    assert_eq!(pattern_key("  a  b c d e f g").as_deref(), Some("a b c d e"));
    assert_eq!(pattern_key("short one").as_deref(), Some("short one"));
    assert_eq!(pattern_key("   "), None);
}

#[test]
fn non_ascii_digits_are_left_alone() {
    assert_eq!(redact_line("job ١٢٣٤٥ from ١٠.٠.٠.١"), "job ١٢٣٤٥ from ١٠.٠.٠.١");
}
