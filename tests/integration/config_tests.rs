use clap::Parser;
use dupefind::actions::RemovalMode;
use dupefind::cli::{Cli, Commands};
use dupefind::config::{Config, ConfigError};
use dupefind::output::OutputFormat;
use dupefind::scanner::DigestAlgorithm;
use figment::providers::Serialized;
use figment::{Figment, Jail};
use std::path::Path;

#[test]
fn test_config_defaults_round_trip_through_figment() {
    let config: Config = Figment::from(Serialized::defaults(Config::default()))
        .extract()
        .unwrap();
    assert_eq!(config, Config::default());
}

#[test]
fn test_config_from_toml_file() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "dupefind.toml",
            r#"
algorithm = "sha512"
min_size = 4096
verify = true
skip_hidden = true
ignore_patterns = ["*.tmp", "target/"]
output = "json"
removal = "trash"
"#,
        )?;

        let config = Config::load(Some(Path::new("dupefind.toml"))).map_err(|e| e.to_string())?;
        assert_eq!(config.algorithm, DigestAlgorithm::Sha512);
        assert_eq!(config.min_size, 4096);
        assert!(config.verify);
        assert!(config.skip_hidden);
        assert_eq!(config.ignore_patterns, vec!["*.tmp", "target/"]);
        assert_eq!(config.output, OutputFormat::Json);
        assert_eq!(config.removal, RemovalMode::Trash);
        // Unset keys keep their defaults.
        assert!(!config.follow_symlinks);
        Ok(())
    });
}

#[test]
fn test_env_overrides_file() {
    Jail::expect_with(|jail| {
        jail.create_file("dupefind.toml", "algorithm = \"md5\"\nio_threads = 8\n")?;
        jail.set_env("DUPEFIND_ALGORITHM", "sha1");
        jail.set_env("DUPEFIND_IO_THREADS", "2");

        let config = Config::load(Some(Path::new("dupefind.toml"))).map_err(|e| e.to_string())?;
        assert_eq!(config.algorithm, DigestAlgorithm::Sha1);
        assert_eq!(config.io_threads, 2);
        Ok(())
    });
}

#[test]
fn test_cli_overrides_env_and_file() {
    Jail::expect_with(|jail| {
        jail.create_file("dupefind.toml", "min_size = 100\noutput = \"csv\"\n")?;
        jail.set_env("DUPEFIND_ALGORITHM", "sha1");

        let cli = Cli::try_parse_from([
            "dupefind", "scan", "/p", "--algorithm", "blake3", "--min-size", "1KiB",
        ])
        .map_err(|e| e.to_string())?;
        let Commands::Scan(args) = cli.command else {
            return Err("expected scan command".into());
        };

        let config = Config::load(Some(Path::new("dupefind.toml")))
            .map_err(|e| e.to_string())?
            .with_scan_args(&args);
        assert_eq!(config.algorithm, DigestAlgorithm::Blake3);
        assert_eq!(config.min_size, 1024);
        assert_eq!(config.output, OutputFormat::Csv);
        Ok(())
    });
}

#[test]
fn test_invalid_value_is_an_error() {
    Jail::expect_with(|jail| {
        jail.create_file("dupefind.toml", "algorithm = \"crc32\"\n")?;
        let result = Config::load(Some(Path::new("dupefind.toml")));
        assert!(matches!(result, Err(ConfigError::Invalid(_))));
        Ok(())
    });
}

#[test]
fn test_zero_io_threads_is_an_error() {
    Jail::expect_with(|jail| {
        jail.create_file("dupefind.toml", "io_threads = 0\n")?;
        let result = Config::load(Some(Path::new("dupefind.toml")));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { key: "io_threads", .. })
        ));
        Ok(())
    });
}

#[test]
fn test_config_serializes_to_toml() {
    let config = Config {
        algorithm: DigestAlgorithm::Md5,
        ignore_patterns: vec!["*.bak".to_string()],
        ..Config::default()
    };
    let text = toml::to_string(&config).unwrap();
    assert!(text.contains("algorithm = \"md5\""));
    assert!(text.contains("ignore_patterns = [\"*.bak\"]"));
}

#[test]
fn test_no_flags_override_file_switches() {
    Jail::expect_with(|jail| {
        jail.create_file(
            "dupefind.toml",
            "verify = true\nskip_hidden = true\nfollow_symlinks = true\n",
        )?;

        let cli = Cli::try_parse_from([
            "dupefind",
            "scan",
            "/p",
            "--no-verify",
            "--no-skip-hidden",
        ])
        .map_err(|e| e.to_string())?;
        let Commands::Scan(args) = cli.command else {
            return Err("expected scan command".into());
        };

        let config = Config::load(Some(Path::new("dupefind.toml")))
            .map_err(|e| e.to_string())?
            .with_scan_args(&args);
        assert!(!config.verify);
        assert!(!config.skip_hidden);
        // Not named on the command line, so the file still decides.
        assert!(config.follow_symlinks);
        Ok(())
    });
}
