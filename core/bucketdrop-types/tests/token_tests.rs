use bucketdrop_types::TokenSource;
use std::collections::HashSet;

#[test]
fn tokens_are_unique_and_increasing() {
    let mut source = TokenSource::new();
    let a = source.next_token();
    let b = source.next_token();
    assert_ne!(a, b);
    assert!(b > a);
}

#[test]
fn new_source_starts_in_session_zero() {
    let mut source = TokenSource::new();
    assert_eq!(source.next_token().to_string(), "s0#1");
}

#[test]
fn begin_session_invalidates_old_tokens() {
    let mut source = TokenSource::new();
    let old = source.next_token();
    assert!(source.is_current_session(old));

    source.begin_session();
    assert!(!source.is_current_session(old));

    let fresh = source.next_token();
    assert_eq!(fresh.to_string(), "s1#2");
    assert!(source.is_current_session(fresh));
    assert!(fresh > old);
}

#[test]
fn many_tokens_never_collide() {
    let mut source = TokenSource::new();
    let mut seen = HashSet::new();
    for i in 0..200 {
        if i % 50 == 0 {
            source.begin_session();
        }
        assert!(seen.insert(source.next_token()));
    }
}

#[test]
fn display_includes_session_and_seq() {
    let mut source = TokenSource::new();
    source.begin_session();
    let token = source.next_token();
    assert_eq!(token.to_string(), "s1#1");
}
