use proptest::prelude::*;
use std::time::Duration;

use callverify_types::{ContactStatus, Handle, Identity, Timestamp};

proptest! {
    /// Timestamp ordering: from_millis(a) <= from_millis(b) iff a <= b.
    #[test]
    fn timestamp_ordering(a in 0u64..u64::MAX, b in 0u64..u64::MAX) {
        let ta = Timestamp::from_millis(a);
        let tb = Timestamp::from_millis(b);
        prop_assert_eq!(ta <= tb, a <= b);
        prop_assert_eq!(ta == tb, a == b);
    }

    /// Adding a duration and measuring it back gives the same duration.
    #[test]
    fn timestamp_add_then_elapsed(start in 0u64..1_000_000_000_000, delta in 0u64..10_000_000) {
        let t = Timestamp::from_millis(start);
        let later = t.saturating_add(Duration::from_millis(delta));
        prop_assert_eq!(t.elapsed_since(later), Duration::from_millis(delta));
        prop_assert_eq!(later.remaining_from(t), Duration::ZERO);
    }

    /// Handles never carry surrounding whitespace.
    #[test]
    fn handle_is_always_trimmed(raw in "[ \t]{0,3}[a-z_0-9]{1,12}[ \t]{0,3}") {
        let h = Handle::new(&raw).unwrap();
        prop_assert_eq!(h.as_str(), raw.trim());
    }

    /// Any status string outside the known set decodes as Unknown.
    #[test]
    fn unknown_status_strings(status in "[a-z ]{1,12}") {
        let json = format!(
            r#"{{"handle":"h","display_name":"H","contact_status":"{status}"}}"#
        );
        let identity: Identity = serde_json::from_str(&json).unwrap();
        let expected = match status.as_str() {
            "active" => ContactStatus::Active,
            "suspended" => ContactStatus::Suspended,
            _ => ContactStatus::Unknown,
        };
        prop_assert_eq!(identity.contact_status, expected);
    }
}
