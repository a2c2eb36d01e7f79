#[cfg(test)]
mod tests {
    use crate::cli::{Client, MeasureArgs, MinifierKind};
    use crate::config::loading::env_key_to_field;
    use crate::config::*;
    use crate::error::CliError;
    use heft_stats::{InstallClient, Minifier, StatsOptions};
    use serial_test::serial;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    fn write_config(dir: &Path, contents: &str) {
        std::fs::write(dir.join(CONFIG_FILE_NAME), contents).unwrap();
    }

    #[test]
    fn test_default_config_serialization() {
        let json = serde_json::to_string_pretty(&HeftConfig::default()).unwrap();
        insta::assert_snapshot!(json, @r###"
        {
          "client": "npm",
          "minifier": "compress",
          "installTimeout": 60000,
          "limitConcurrency": false,
          "splitCustomImports": false,
          "includeDependencySizes": true,
          "calcParse": false,
          "debug": false
        }
        "###);
    }

    #[test]
    fn test_defaults_match_engine_defaults() {
        assert_eq!(StatsOptions::from(HeftConfig::default()), StatsOptions::default());
    }

    #[test]
    fn test_env_key_to_field() {
        assert_eq!(env_key_to_field("INSTALL_TIMEOUT"), "installTimeout");
        assert_eq!(env_key_to_field("client"), "client");
        assert_eq!(env_key_to_field("CALC_PARSE"), "calcParse");
    }

    #[test]
    fn test_overrides_from_args() {
        let args = MeasureArgs {
            package: "react".into(),
            client: Some(Client::Yarn),
            minifier: Some(MinifierKind::Fast),
            imports: vec!["map".into()],
            split: true,
            no_dependency_sizes: true,
            ..Default::default()
        };
        let overrides = CliOverrides::from(&args);
        assert_eq!(overrides.client, Some(InstallClient::Yarn));
        assert_eq!(overrides.minifier, Some(Minifier::Fast));
        assert_eq!(overrides.custom_imports, Some(vec!["map".to_string()]));
        assert_eq!(overrides.split_custom_imports, Some(true));
        assert_eq!(overrides.include_dependency_sizes, Some(false));
        assert_eq!(overrides.debug, None);

        let json = serde_json::to_value(CliOverrides::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    #[serial]
    fn test_file_layer() {
        let dir = TempDir::new().unwrap();
        write_config(dir.path(), r#"{"client": "pnpm", "installTimeout": 1000, "calcParse": true}"#);

        let config = HeftConfig::load(&CliOverrides::default(), None, dir.path()).unwrap();
        assert_eq!(config.client, InstallClient::Pnpm);
        assert_eq!(config.install_timeout, 1000);
        assert!(config.calc_parse);
        assert!(config.include_dependency_sizes);
    }

    #[test]
    #[serial]
    fn test_cli_overrides_file() {
        let dir = TempDir::new().unwrap();
        write_config(dir.path(), r#"{"client": "pnpm", "minifier": "fast"}"#);

        let overrides = CliOverrides {
            client: Some(InstallClient::Yarn),
            ..Default::default()
        };
        let config = HeftConfig::load(&overrides, None, dir.path()).unwrap();
        assert_eq!(config.client, InstallClient::Yarn);
        assert_eq!(config.minifier, Minifier::Fast);
    }

    #[test]
    #[serial]
    fn test_env_overrides_file_but_not_cli() {
        let dir = TempDir::new().unwrap();
        write_config(dir.path(), r#"{"installTimeout": 1000, "client": "pnpm"}"#);

        unsafe {
            std::env::set_var("HEFT_INSTALL_TIMEOUT", "2500");
            std::env::set_var("HEFT_CLIENT", "yarn");
            std::env::set_var("HEFT_LOG", "debug");
        }
        let overrides = CliOverrides {
            client: Some(InstallClient::Npm),
            ..Default::default()
        };
        let result = HeftConfig::load(&overrides, None, dir.path());
        unsafe {
            std::env::remove_var("HEFT_INSTALL_TIMEOUT");
            std::env::remove_var("HEFT_CLIENT");
            std::env::remove_var("HEFT_LOG");
        }

        let config = result.unwrap();
        assert_eq!(config.install_timeout, 2500);
        assert_eq!(config.client, InstallClient::Npm);
    }

    #[test]
    #[serial]
    fn test_unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        write_config(dir.path(), r#"{"clinet": "pnpm"}"#);

        let err = HeftConfig::load(&CliOverrides::default(), None, dir.path()).unwrap_err();
        assert!(matches!(err, CliError::Config(ConfigError::Invalid { .. })));
        assert!(err.to_string().contains("clinet"));
    }

    #[test]
    #[serial]
    fn test_explicit_config_must_exist() {
        let dir = TempDir::new().unwrap();
        let err = HeftConfig::load(
            &CliOverrides::default(),
            Some(Path::new("missing.json")),
            dir.path(),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            CliError::Config(ConfigError::NotFound(ref path)) if *path == dir.path().join("missing.json")
        ));
    }

    #[test]
    #[serial]
    fn test_explicit_config_path() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ci.json"), r#"{"debug": true, "tmpDir": "/var/tmp/heft"}"#)
            .unwrap();

        let config =
            HeftConfig::load(&CliOverrides::default(), Some(Path::new("ci.json")), dir.path())
                .unwrap();
        assert!(config.debug);
        assert_eq!(config.tmp_dir, Some(PathBuf::from("/var/tmp/heft")));
    }

    #[test]
    fn test_validation() {
        assert!(HeftConfig::default().validate().is_ok());

        let zero_timeout = HeftConfig {
            install_timeout: 0,
            ..Default::default()
        };
        assert!(zero_timeout.validate().is_err());

        let zero_concurrency = HeftConfig {
            network_concurrency: Some(0),
            ..Default::default()
        };
        assert!(zero_concurrency.validate().is_err());

        let bad_import = HeftConfig {
            custom_imports: Some(vec!["map".into(), "not-an-identifier".into()]),
            ..Default::default()
        };
        let err = bad_import.validate().unwrap_err();
        assert!(err.to_string().contains("not-an-identifier"));
    }
}
