mod fixtures;

use cachet_session::{SessionError, with_validator};
use fixtures::{at, config, setup_sessions};
use proptest::prelude::*;
use std::time::Duration;

proptest! {
    #[test]
    fn refresh_clears_the_refresh_requirement(
        start in 1_000_000i64..2_000_000_000,
        age in 1u64..604_800,
    ) {
        let sessions = setup_sessions(&config());
        let session = sessions.create_at(at(start)).unwrap();
        let refresh = sessions.refresh_interval().as_secs();
        let now = at(start + i64::try_from(age).unwrap());

        prop_assert_eq!(session.refresh_required_at(now), age > refresh);

        let before = session.header();
        session.refresh_at(now).unwrap();
        let after = session.header();

        prop_assert_eq!(after.nonce, before.nonce + 1);
        prop_assert_eq!(after.valid_after, now);
        prop_assert_eq!(after.valid_before, now + chrono::Duration::from_std(sessions.max_age()).unwrap());
        prop_assert!(!session.refresh_required_at(now));
    }
}

#[test]
fn saved_session_loads_into_a_fresh_one() {
    let sessions = setup_sessions(&config());
    let source = sessions.create().expect("create");
    source.set_string(1, "user-42").expect("set");
    let token = source.save().expect("save");

    let target = sessions.create().expect("create");
    target.load(&token).expect("load");
    assert_eq!(target.data(), source.data());
    target.validate().expect("still inside the window");
}

#[test]
fn failed_load_leaves_the_session_fresh() {
    let sessions = setup_sessions(&config());
    let session = sessions.create().expect("create");
    let before = session.data();

    let err = session.load(b"AAAA").expect_err("garbage");
    assert!(err.is_format_or_decrypt(), "{err}");
    assert_eq!(session.data(), before);
}

#[test]
fn expired_sessions_are_recoverable() {
    let sessions = setup_sessions(&config());
    let session = sessions.create_at(at(1_000)).expect("create");

    let err = session.validate_at(at(1_000 + 8 * 24 * 3_600)).expect_err("expired");
    assert!(err.is_invalid() && err.is_recoverable());
}

#[test]
fn validators_see_the_loaded_payload() {
    let sessions = setup_sessions(&config()).with_options([with_validator(|s| {
        match s.get_string(1).as_deref() {
            Some("banned") => Err(SessionError::rejected("account banned")),
            _ => Ok(()),
        }
    })]);

    let issued = sessions.create().expect("create");
    issued.set_string(1, "banned").expect("set");
    let token = issued.save().expect("save");

    let incoming = sessions.create().expect("create");
    incoming.load(&token).expect("load");
    let err = incoming.validate().expect_err("validator rejects");
    assert!(matches!(err, SessionError::Validator { .. }));
}

#[test]
fn zero_max_age_is_a_configuration_error() {
    let bad = cachet_session::SessionConfig { max_age: Duration::ZERO, ..config() };
    let err = cachet_session::Sessions::from_config(&bad, cachet_container::OsRandom::shared())
        .expect_err("zero max-age");
    assert!(matches!(err, SessionError::Configuration { .. }));
}
