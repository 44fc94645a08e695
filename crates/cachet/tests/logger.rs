mod fixtures;

use cachet::CachetConfig;
use fixtures::write_config;
use serial_test::serial;

#[test]
#[serial]
fn log_section_drives_the_subscriber() {
    let (dir, path) = write_config("cachet.toml", "[log]\nlevel = \"trace\"\n");
    let mut config = CachetConfig::load(&path).expect("config");
    config.log.directory = Some(dir.path().join("logs"));

    let logger = cachet::init_logger("cachet-facade", &config).expect("logger");
    assert!(logger.guard().is_some());
    assert!(dir.path().join("logs").is_dir());
    assert!(cachet::is_enabled("session"));
}
