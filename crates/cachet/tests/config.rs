mod fixtures;

use cachet::config::{Map, load_config_from};
use cachet::container::OsRandom;
use cachet::csrf::Csrf;
use cachet::session::Sessions;
use cachet::{CachetConfig, ConfigError};
use fixtures::{CACHET_TOML, SECRET_KEY, write_config};
use serial_test::serial;
use std::time::Duration;

fn env(pairs: &[(&str, &str)]) -> Map<String, String> {
    pairs.iter().map(|(k, v)| ((*k).to_owned(), (*v).to_owned())).collect()
}

#[test]
#[serial]
fn loads_every_section_from_toml() {
    let (_dir, path) = write_config("cachet.toml", CACHET_TOML);
    let config = CachetConfig::load(&path).expect("config");

    assert_eq!(config.log.level, "debug");
    assert_eq!(config.log.filter.as_deref(), Some("cachet_http=trace,info"));
    assert_eq!(config.session.max_age, Duration::from_secs(86_400));
    assert_eq!(config.session.refresh, Duration::from_secs(1_800));
    assert_eq!(config.session.header_scheme.as_deref(), Some("Bearer"));
    assert_eq!(config.session.cookie.name, "sid");
    assert_eq!(config.session.cookie.path, "/");
    assert_eq!(config.session.container.key.as_deref(), Some(SECRET_KEY));
    assert_eq!(config.csrf.ttl, Duration::from_secs(7_200));

    let methods: Vec<String> = config.csrf.methods().expect("methods").iter().map(ToString::to_string).collect();
    assert_eq!(methods, ["POST", "PATCH"]);

    let sessions = Sessions::from_config(&config.session, OsRandom::shared()).expect("sessions");
    assert_eq!(sessions.max_age(), Duration::from_secs(86_400));
    Csrf::new(&config.csrf, OsRandom::shared()).expect("csrf");
}

#[test]
fn environment_overrides_the_file() {
    let (_dir, path) = write_config("cachet.toml", CACHET_TOML);
    let config: CachetConfig = load_config_from(
        &path,
        env(&[("CACHET__LOG__LEVEL", "warn"), ("CACHET__LOG__JSON", "true"), ("CACHET__CSRF__TTL", "15m")]),
    )
    .expect("config");

    assert_eq!(config.log.level, "warn");
    assert!(config.log.json);
    assert_eq!(config.csrf.ttl, Duration::from_secs(900));
    assert_eq!(config.session.cookie.name, "sid");
}

#[test]
fn other_prefixes_are_ignored() {
    let (_dir, path) = write_config("cachet.toml", CACHET_TOML);
    let config: CachetConfig =
        load_config_from(&path, env(&[("APP__LOG__LEVEL", "error")])).expect("config");
    assert_eq!(config.log.level, "debug");
}

#[test]
fn json_files_work_too() {
    let (_dir, path) = write_config(
        "cachet.json",
        r#"{ "session": { "container": { "type": "jwt", "key": "shared-secret" } } }"#,
    );
    let config: CachetConfig = load_config_from(&path, Map::new()).expect("config");

    assert_eq!(config.session.container.kind, "jwt");
    assert_eq!(config.csrf, cachet::csrf::CsrfConfig::default());
}

#[test]
#[serial]
fn missing_file_is_an_error() {
    let dir = tempfile::tempdir().expect("temp dir");
    let err = CachetConfig::load(dir.path().join("absent.toml")).expect_err("missing file");
    assert!(matches!(err, ConfigError::Config { .. }), "{err}");
}

#[test]
#[serial]
fn invalid_sections_are_reported() {
    let (_dir, path) = write_config("cachet.toml", "[session.cookie]\nsame-site = \"sometimes\"\n");
    let err = CachetConfig::load(&path).expect_err("bad same-site");
    assert!(matches!(err, ConfigError::Session { .. }), "{err}");

    let (_dir, path) = write_config("cachet.toml", "[log]\nlevel = \"chatty\"\n");
    let err = CachetConfig::load(&path).expect_err("bad level");
    assert!(matches!(err, ConfigError::Log { .. }), "{err}");
}
