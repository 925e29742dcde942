//! Tests for the development identity provider.

use parlor::{AuthError, DevIdentity, IdentityProvider};

#[test]
fn test_token_with_display_name() {
    let profile = DevIdentity::new()
        .resolve("alice:Alice Smith")
        .expect("Resolve failed");
    assert_eq!(profile.user_id, "alice");
    assert_eq!(profile.username, "alice");
    assert_eq!(profile.display_name, "Alice Smith");
    assert!(profile.avatar_url.is_none());
}

#[test]
fn test_bare_token_defaults_display_name() {
    let profile = DevIdentity::new().resolve("bob").expect("Resolve failed");
    assert_eq!(profile.user_id, "bob");
    assert_eq!(profile.display_name, "bob");
}

#[test]
fn test_token_is_trimmed() {
    let profile = DevIdentity::new()
        .resolve("  carol  ")
        .expect("Resolve failed");
    assert_eq!(profile.user_id, "carol");
}

#[test]
fn test_malformed_tokens_rejected() {
    let identity = DevIdentity::new();
    assert_eq!(identity.resolve("").unwrap_err(), AuthError::InvalidToken);
    assert_eq!(identity.resolve("   ").unwrap_err(), AuthError::InvalidToken);
    assert_eq!(identity.resolve(":name").unwrap_err(), AuthError::InvalidToken);
    assert_eq!(identity.resolve("id:").unwrap_err(), AuthError::InvalidToken);
}
