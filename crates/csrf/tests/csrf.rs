mod fixtures;

use cachet_container::ContainerError;
use cachet_csrf::CsrfError;
use fixtures::{at, setup_csrf};
use proptest::prelude::*;
use std::time::Duration;

const HOUR: Duration = Duration::from_secs(3_600);
const T0: i64 = 1_700_000_000;

#[test]
fn token_is_bound_to_source_subject_and_ttl() {
    let csrf = setup_csrf(HOUR);
    let token = csrf.sign_at("1.2.3.4", "/checkout", at(T0)).expect("sign");

    csrf.validate_at("1.2.3.4", "/checkout", &token, at(T0 + 30 * 60)).expect("valid at +30m");

    let err = csrf.validate_at("1.2.3.4", "/checkout", &token, at(T0 + 2 * 3_600)).expect_err("+2h");
    assert!(matches!(err, CsrfError::Container { source: ContainerError::Expired { .. }, .. }), "{err}");

    let err = csrf.validate_at("5.6.7.8", "/checkout", &token, at(T0 + 60)).expect_err("other source");
    assert!(matches!(err, CsrfError::SourceMismatch { .. }), "{err}");
}

#[test]
fn subject_mismatch_is_reported_separately() {
    let csrf = setup_csrf(HOUR);
    let token = csrf.sign_at("1.2.3.4", "/checkout", at(T0)).expect("sign");

    let err = csrf.validate_at("1.2.3.4", "/admin", &token, at(T0 + 60)).expect_err("other subject");
    assert!(matches!(err, CsrfError::SubjectMismatch { .. }), "{err}");
}

#[test]
fn token_is_reusable_within_its_window() {
    let csrf = setup_csrf(HOUR);
    let token = csrf.sign_at("1.2.3.4", "/checkout", at(T0)).expect("sign");
    for offset in [1, 60, 3_599] {
        csrf.validate_at("1.2.3.4", "/checkout", &token, at(T0 + offset)).expect("replay");
    }
}

#[test]
fn tokens_differ_per_signature() {
    let csrf = setup_csrf(HOUR);
    let a = csrf.sign_at("1.2.3.4", "/checkout", at(T0)).expect("sign");
    let b = csrf.sign_at("1.2.3.4", "/checkout", at(T0)).expect("sign");
    assert_ne!(a, b);
    assert_ne!(
        csrf.unpack(&a).expect("a").header().nonce,
        csrf.unpack(&b).expect("b").header().nonce
    );
}

#[test]
fn foreign_key_cannot_forge_tokens() {
    let ours = setup_csrf(HOUR);
    let theirs = cachet_csrf::Csrf::new(
        &cachet_csrf::CsrfConfig { ttl: HOUR, ..cachet_csrf::CsrfConfig::with_key("ffffffffffffffffffffffffffffffff") },
        fixtures::counting_random(),
    )
    .expect("csrf");

    let forged = theirs.sign_at("1.2.3.4", "/checkout", at(T0)).expect("sign");
    let err = ours.validate_at("1.2.3.4", "/checkout", &forged, at(T0 + 1)).expect_err("forged");
    assert!(matches!(err, CsrfError::Container { source: ContainerError::Decrypt { .. }, .. }), "{err}");
    assert!(err.is_rejection());
}

#[test]
fn garbage_token_is_a_format_error() {
    let csrf = setup_csrf(HOUR);
    let err = csrf.validate("1.2.3.4", "/checkout", "%%%").expect_err("garbage");
    assert!(matches!(err, CsrfError::Container { source: ContainerError::Format { .. }, .. }), "{err}");
}

proptest! {
    #[test]
    fn any_signed_pair_validates_and_only_that_pair(
        source in "[0-9a-f:.]{1,39}",
        subject in "/[a-z0-9/?=&]{0,48}",
        other in "[0-9a-f:.]{1,39}",
    ) {
        let csrf = setup_csrf(HOUR);
        let token = csrf.sign_at(&source, &subject, at(T0)).unwrap();

        prop_assert!(csrf.validate_at(&source, &subject, &token, at(T0 + 1)).is_ok());
        if other != source {
            let rejected = matches!(
                csrf.validate_at(&other, &subject, &token, at(T0 + 1)),
                Err(CsrfError::SourceMismatch { .. })
            );
            prop_assert!(rejected);
        }
    }
}
