//! Unit tests for the identifiers module
//!
//! Covers engine-issued UUID identifiers and caller-supplied claim identifiers.

use core_kernel::{ClaimId, ConnectionId, TaskId};
use proptest::prelude::*;
use uuid::Uuid;

mod task_id_tests {
    use super::*;

    #[test]
    fn test_new_generates_unique_ids() {
        let id1 = TaskId::new();
        let id2 = TaskId::new();
        assert_ne!(id1, id2);
    }

    #[test]
    fn test_new_v7_generates_time_ordered_ids() {
        let id1 = TaskId::new_v7();
        std::thread::sleep(std::time::Duration::from_millis(1));
        let id2 = TaskId::new_v7();
        let uuid1: Uuid = id1.into();
        let uuid2: Uuid = id2.into();
        assert!(uuid1 < uuid2);
    }

    #[test]
    fn test_prefix() {
        assert_eq!(TaskId::prefix(), "TASK");
        assert_eq!(ConnectionId::prefix(), "CONN");
    }

    #[test]
    fn test_from_str_with_and_without_prefix() {
        let original = TaskId::new();
        let with_prefix: TaskId = original.to_string().parse().unwrap();
        let bare: TaskId = original.as_uuid().to_string().parse().unwrap();
        assert_eq!(original, with_prefix);
        assert_eq!(original, bare);
    }

    #[test]
    fn test_from_str_rejects_garbage() {
        assert!("TASK-not-a-uuid".parse::<TaskId>().is_err());
    }

    #[test]
    fn test_json_is_bare_uuid() {
        let id = TaskId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{}\"", id.as_uuid()));
        let deserialized: TaskId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, deserialized);
    }
}

mod claim_id_tests {
    use super::*;

    #[test]
    fn test_generated_ids_are_prefixed_and_unique() {
        let a = ClaimId::generate();
        let b = ClaimId::generate();
        assert!(a.as_str().starts_with("CLM-"));
        assert_ne!(a, b);
    }

    #[test]
    fn test_caller_supplied_id_is_kept() {
        let id: ClaimId = "POLICY-SYS-42".parse().unwrap();
        assert_eq!(id.to_string(), "POLICY-SYS-42");
    }

    #[test]
    fn test_json_rejects_blank_id() {
        let result: Result<ClaimId, _> = serde_json::from_str("\"  \"");
        assert!(result.is_err());
    }

    #[test]
    fn test_json_serialization() {
        let id = ClaimId::new("CLM-001").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"CLM-001\"");
        let back: ClaimId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }

    proptest! {
        #[test]
        fn prop_non_blank_ids_are_accepted_trimmed(raw in "[A-Za-z0-9-]{1,24}", pad in 0usize..4) {
            let padded = format!("{}{}{}", " ".repeat(pad), raw, " ".repeat(pad));
            let id = ClaimId::new(padded).unwrap();
            prop_assert_eq!(id.as_str(), raw.as_str());
        }
    }
}
