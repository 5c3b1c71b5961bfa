use crate::ipoc::{ConfigError, GatewayConfig, GatewaySettings, IpocConfig};

#[test]
fn defaults_are_valid() {
    let cfg = IpocConfig::default();
    assert!(cfg.validate().is_ok());
    assert_eq!(cfg.gateway.min_pending, 1);
    assert_eq!(cfg.gateway.max_pending, 2);
    assert_eq!(cfg.gateway.response_size_budget, 8_000);
    assert_eq!(cfg.client.interest_lifetime_ms, 4_000);
}

#[test]
fn partial_json_falls_back_to_defaults() {
    let cfg = IpocConfig::from_json_str(r#"{ "gateway": { "max_pending": 4 }, "seed": 7 }"#)
        .expect("valid config");
    assert_eq!(cfg.gateway.max_pending, 4);
    assert_eq!(cfg.gateway.min_pending, 1);
    assert_eq!(cfg.seed, 7);
    assert_eq!(cfg.client.name, "/ndnSIM/11/0/0/12");
}

#[test]
fn invalid_values_are_rejected() {
    let cases = [
        r#"{ "gateway": { "min_pending": 3, "max_pending": 2 } }"#,
        r#"{ "link": { "loss_rate": 1.0 } }"#,
        r#"{ "client": { "timer0_us": 0 } }"#,
        r#"{ "client": { "max_credit": 2, "initial_credit": -3 } }"#,
        r#"{ "client": { "interest_lifetime_ms": 500 } }"#,
        r#"{ "traffic": { "pkt_bytes": 10 } }"#,
    ];
    for raw in cases {
        assert!(
            matches!(IpocConfig::from_json_str(raw), Err(ConfigError::Invalid(_))),
            "{raw} should be rejected"
        );
    }
}

#[test]
fn malformed_json_and_missing_file_are_reported() {
    assert!(matches!(
        IpocConfig::from_json_str("{ not json"),
        Err(ConfigError::Json(_))
    ));
    assert!(matches!(
        IpocConfig::from_json_file("/definitely/not/here.json"),
        Err(ConfigError::Io { .. })
    ));
}

#[test]
fn bad_names_surface_as_name_errors() {
    let cfg = GatewayConfig {
        prefix: "/bad/%zz".to_string(),
        ..GatewayConfig::default()
    };
    assert!(matches!(
        GatewaySettings::from_config(&cfg),
        Err(ConfigError::Name(_))
    ));
}

#[test]
fn time_accessors_convert_units() {
    let cfg = IpocConfig::default();
    assert_eq!(cfg.client.timer0().as_micros(), cfg.client.timer0_us);
    assert_eq!(cfg.gateway.timeout_margin().as_millis(), 1_000);
    assert_eq!(cfg.link.bandwidth_bps(), 100_000_000);
}
