// ABOUTME: Integration tests for domain types and their serialized forms.
// ABOUTME: Tests selector parsing, workload and pod serde, and readiness counting.

use rollstep::types::*;
use std::collections::BTreeMap;

mod selector_tests {
    use super::*;

    #[test]
    fn map_and_string_forms_are_equal() {
        let from_map: LabelSelector = serde_yaml::from_str("{ version: v2, app: web }").unwrap();
        let from_str: LabelSelector = serde_yaml::from_str("\"app=web,version=v2\"").unwrap();
        assert_eq!(from_map, from_str);
        assert_eq!(from_map.to_string(), "app=web,version=v2");
    }

    #[test]
    fn serializes_as_map() {
        let selector: LabelSelector = "app=web".parse().unwrap();
        let json = serde_json::to_value(&selector).unwrap();
        assert_eq!(json, serde_json::json!({ "app": "web" }));
    }

    #[test]
    fn prefixed_keys_are_allowed() {
        let selector: LabelSelector = "example.com/tier=front".parse().unwrap();
        assert_eq!(selector.get("example.com/tier"), Some("front"));
    }

    #[test]
    fn empty_term_is_rejected() {
        let err = "app=web,,version=v1".parse::<LabelSelector>().unwrap_err();
        assert_eq!(err, SelectorError::EmptyTerm);
    }
}

mod workload_tests {
    use super::*;

    #[test]
    fn missing_fields_default_to_empty() {
        let workload: ReplicatedWorkload = serde_yaml::from_str("replicas: 2").unwrap();
        assert!(workload.name.is_empty());
        assert!(workload.selector.is_empty());
        assert!(!workload.is_addressable());
        assert_eq!(workload.resource_version, None);
    }

    #[test]
    fn revision_is_not_serialized_when_absent() {
        let selector: LabelSelector = "app=web".parse().unwrap();
        let workload = ReplicatedWorkload::new("web-v1", selector, 1);
        let json = serde_json::to_value(&workload).unwrap();
        assert!(json.get("resource_version").is_none());
        assert_eq!(json["name"], "web-v1");
    }

    #[test]
    fn with_replicas_drops_revision() {
        let selector: LabelSelector = "app=web".parse().unwrap();
        let mut workload = ReplicatedWorkload::new("web-v1", selector, 3);
        workload.resource_version = Some("42".to_string());

        let scaled = workload.with_replicas(0);
        assert_eq!(scaled.replicas, 0);
        assert_eq!(scaled.resource_version, None);
        assert_eq!(scaled.name, workload.name);
    }
}

mod pod_tests {
    use super::*;

    fn pod(phase: PodPhase, ready: bool) -> Pod {
        Pod {
            name: PodName::new("web-v1-0"),
            labels: BTreeMap::new(),
            phase,
            ready,
        }
    }

    #[test]
    fn only_running_ready_pods_count() {
        let pods = vec![
            pod(PodPhase::Running, true),
            pod(PodPhase::Running, false),
            pod(PodPhase::Pending, true),
            pod(PodPhase::Failed, false),
            pod(PodPhase::Running, true),
        ];
        assert_eq!(ready_count(&pods), 2);
    }

    #[test]
    fn phase_uses_lowercase_names() {
        let phase: PodPhase = serde_json::from_str("\"succeeded\"").unwrap();
        assert_eq!(phase, PodPhase::Succeeded);
        assert_eq!(serde_json::to_string(&PodPhase::Running).unwrap(), "\"running\"");
    }
}

mod counts_tests {
    use super::*;

    #[test]
    fn displays_both_sides() {
        let counts = ReplicaCounts::new(2, 1);
        assert_eq!(counts.to_string(), "old=2, new=1");
        assert_eq!(counts.total(), 3);
    }
}
