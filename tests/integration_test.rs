use agentkey::config::Config;

#[test]
fn test_config_validation_requires_key_for_remote_api() {
    let config = Config {
        api_key: None,
        ..Config::default()
    };

    assert!(config.validate().is_err());
}

#[test]
fn test_config_validation_allows_local_endpoint_without_api_key() {
    let config = Config {
        api_key: None,
        api_url: "http://localhost:8000/v1beta".to_string(),
        ..Config::default()
    };

    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_offline_needs_no_key() {
    let config = Config {
        api_key: None,
        offline: true,
        ..Config::default()
    };

    assert!(config.validate().is_ok());
}

#[test]
fn test_config_validation_rejects_whitespace_trigger() {
    let config = Config {
        trigger: "/ /".to_string(),
        offline: true,
        ..Config::default()
    };

    let error = config.validate().expect_err("whitespace trigger");
    assert!(error.to_string().contains("AGENTKEY_TRIGGER"));
}

#[test]
fn test_config_validation_rejects_non_http_url() {
    let config = Config {
        api_key: Some("k".to_string()),
        api_url: "ftp://generativelanguage.googleapis.com".to_string(),
        ..Config::default()
    };

    assert!(config.validate().is_err());
}
