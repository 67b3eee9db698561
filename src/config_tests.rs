//! Tests for configuration

#[cfg(test)]
mod tests {
    use super::super::config::*;
    use std::io::Write;

    #[test]
    fn test_data_config_defaults() {
        let config: DataConfig = toml::from_str("").unwrap();
        assert_eq!(config.yahoo_url, "https://query1.finance.yahoo.com");
        assert_eq!(config.binance_url, "https://api.binance.com");
        assert_eq!(config.fred_url, "https://fred.stlouisfed.org");
        assert_eq!(config.request_timeout_secs, 30);
        assert_eq!(config.max_retries, 2);
        assert_eq!(config.retry_backoff_ms, 500);
        assert_eq!(config.max_concurrent_fetches, 4);
        assert!(config.user_agent.starts_with("portfolio-optimizer/"));
    }

    #[test]
    fn test_optimizer_config_defaults() {
        let config = OptimizerConfig::default();
        assert_eq!(config.max_weight, 0.7);
        assert_eq!(config.max_iterations, 200);
        assert_eq!(config.time_limit_secs, 10.0);
    }

    #[test]
    fn test_partial_sections() {
        let toml_str = r#"
[optimizer]
max_weight = 0.5

[analysis]
risk_free_rate = 0.045

[pipeline]
run_timeout_secs = 60
"#;
        let config: Config = toml::from_str(toml_str).unwrap();
        assert_eq!(config.optimizer.max_weight, 0.5);
        assert_eq!(config.optimizer.max_iterations, 200);
        assert_eq!(config.analysis.risk_free_rate, 0.045);
        assert_eq!(config.pipeline.run_timeout_secs, 60);
        assert_eq!(config.data.max_retries, 2);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = Config::default();
        config.optimizer.max_weight = 1.5;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.analysis.risk_free_rate = -0.01;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.data.max_concurrent_fetches = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.pipeline.run_timeout_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let config = Config::load(path.to_str().unwrap()).unwrap();
        assert_eq!(config.optimizer.max_weight, 0.7);
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(
            file,
            r#"
[data]
yahoo_url = "http://localhost:9000"
max_concurrent_fetches = 2

[optimizer]
max_iterations = 50
"#
        )
        .unwrap();

        let config = Config::load(file.path().to_str().unwrap()).unwrap();
        assert_eq!(config.data.yahoo_url, "http://localhost:9000");
        assert_eq!(config.data.max_concurrent_fetches, 2);
        assert_eq!(config.optimizer.max_iterations, 50);
        assert_eq!(config.pipeline.run_timeout_secs, 300);
    }

    #[test]
    fn test_load_rejects_invalid_file() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "[optimizer]\nmax_weight = 0.0").unwrap();

        assert!(Config::load(file.path().to_str().unwrap()).is_err());
    }
}
