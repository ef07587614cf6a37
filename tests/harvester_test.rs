/// Harvester entry points that do not need a live browser.
use listing_scout::core::config::{PageAdvance, ScoutConfig};
use listing_scout::{HarvestError, Harvester};

#[test]
fn test_missing_credentials_fail_before_browser_launch() {
    std::env::remove_var("LISTING_SCOUT_USERNAME");
    std::env::remove_var("LISTING_SCOUT_PASSWORD");
    let harvester = Harvester::new(ScoutConfig::default());

    let result = tokio_test::block_on(
        harvester.run("https://www.linkedin.com/jobs/search/?keywords=rust", 1),
    );
    let err = tokio_test::assert_err!(result);
    assert!(matches!(err, HarvestError::MissingCredentials));
    assert!(err.is_configuration());
}

#[test]
fn test_config_file_selects_pagination() {
    let config: ScoutConfig = serde_json::from_str(
        r#"{"pagination": "next_page_control", "timings": {"detail_timeout_secs": 4}}"#,
    )
    .unwrap();
    let harvester = Harvester::new(config);
    assert_eq!(harvester.pagination(), PageAdvance::NextPageControl);
    assert_eq!(harvester.timings().detail_timeout.as_secs(), 4);
}
