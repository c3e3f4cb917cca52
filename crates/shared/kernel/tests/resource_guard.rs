use wayfare_kernel::domain::constants::{BOOKING, USER};
use wayfare_kernel::security::resource::ResourceGuard;

#[test]
fn resource_guard_validates_and_prefixes() {
    assert_eq!(ResourceGuard::verify("booking:WF-7KQ2MZ9X", BOOKING).unwrap(), "booking:WF-7KQ2MZ9X");
    assert_eq!(ResourceGuard::verify("WF-7KQ2MZ9X", BOOKING).unwrap(), "booking:WF-7KQ2MZ9X");
    assert!(ResourceGuard::verify("user:WF-7KQ2MZ9X", BOOKING).is_err());
}

#[test]
fn key_returns_the_bare_record_key() {
    assert_eq!(ResourceGuard::key("user:firebase-uid-1", USER).unwrap(), "firebase-uid-1");
    assert!(ResourceGuard::key("migration:booking:001", USER).is_err());
}
