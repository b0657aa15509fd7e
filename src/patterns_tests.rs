#[cfg(test)]
mod field_rule_tests {
    use crate::patterns::{self, Field};

    #[test]
    fn every_field_has_rules() {
        for field in Field::ALL {
            assert!(!field.rules().is_empty(), "{field:?} has no rules");
        }
    }

    #[test]
    fn iso_timestamp_wins_over_bare_time() {
        let c = patterns::extract(Field::Timestamp, "2023-04-17T12:34:56.789Z worker started at 12:00:00").unwrap();
        assert_eq!(c.value, "2023-04-17T12:34:56.789Z");
    }

    #[test]
    fn bracketed_timestamp_excludes_brackets() {
        let c = patterns::extract(Field::Timestamp, "[26/Feb/2025:08:48:45 +0100] host").unwrap();
        assert_eq!(c.value, "26/Feb/2025:08:48:45 +0100");
    }

    #[test]
    fn milliseconds_are_scaled_to_seconds() {
        let c = patterns::extract(Field::ResponseTime, "handled request in 250ms").unwrap();
        assert_eq!(c.value, "250");
        let secs = c.as_f64().unwrap();
        assert!((secs - 0.25).abs() < 1e-9);
    }

    #[test]
    fn explicit_time_key_is_taken_as_seconds() {
        let c = patterns::extract(Field::ResponseTime, "GET /a time=1.5").unwrap();
        assert_eq!(c.as_f64(), Some(1.5));
    }

    #[test]
    fn non_numeric_capture_has_no_numeric_reading() {
        let c = patterns::Capture { value: "abc", scale: None };
        assert_eq!(c.as_f64(), None);
    }

    #[test]
    fn ip_addresses_are_listed_in_order() {
        let ips: Vec<&str> = patterns::ip_addresses("from 10.0.0.1 via 192.168.1.20 to 10.0.0.1").collect();
        assert_eq!(ips, vec!["10.0.0.1", "192.168.1.20", "10.0.0.1"]);
    }

    #[test]
    fn method_inside_braces_is_found() {
        let c = patterns::extract(Field::HttpMethod, "x {DELETE /items/4 HTTP/1.1} - 204").unwrap();
        assert_eq!(c.value, "DELETE");
    }

    #[test]
    fn lowercase_level_is_not_a_level() {
        assert!(patterns::extract(Field::Level, "error: something").is_none());
        assert_eq!(patterns::extract(Field::Level, "[WARN] disk").unwrap().value, "WARN");
    }

    #[test]
    fn error_message_takes_rest_of_line() {
        let c = patterns::extract(Field::ErrorMessage, "db Error: connection refused by peer").unwrap();
        assert_eq!(c.value, "connection refused by peer");
    }
}
