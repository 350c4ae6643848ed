use crate::domain::models::{
    BucketLocation, CopyFailure, MAX_SUBJECT_LEN, RoutingRule, RoutingRuleParseErr, RoutingRules,
    RunOutcome, RunStatus,
};
use cool_asserts::assert_matches;

fn failure(key: &str) -> CopyFailure {
    CopyFailure {
        key: key.to_string(),
        destination: "backup-docs".to_string(),
        error: "access denied".to_string(),
    }
}

#[test]
fn it_routes_to_first_matching_rule() {
    let rules = RoutingRules::new(vec![
        RoutingRule::new("docs/archive/", "archive-bucket"),
        RoutingRule::new("docs/", "docs-bucket"),
        RoutingRule::new("media/", "media-bucket"),
    ]);

    assert_eq!(
        rules.route("docs/archive/2020.pdf").map(|r| r.destination.as_str()),
        Some("archive-bucket")
    );
    assert_eq!(
        rules.route("docs/readme.md").map(|r| r.destination.as_str()),
        Some("docs-bucket")
    );
    assert_eq!(
        rules.route("media/cat.png").map(|r| r.destination.as_str()),
        Some("media-bucket")
    );
    assert_eq!(rules.route("tmp/scratch"), None);
    // prefixes are literal, not path aware
    assert_eq!(rules.route("docs"), None);
}

#[test]
fn empty_rules_route_nothing() {
    let rules = RoutingRules::default();
    assert!(rules.is_empty());
    assert_eq!(rules.route("anything"), None);
}

#[test]
fn it_parses_rules_in_order() {
    let rules: RoutingRules = " docs/=docs-bucket, media/= media-bucket ,,logs/=a=b"
        .parse()
        .unwrap();

    assert_eq!(
        rules.iter().cloned().collect::<Vec<_>>(),
        vec![
            RoutingRule::new("docs/", "docs-bucket"),
            RoutingRule::new("media/", "media-bucket"),
            RoutingRule::new("logs/", "a=b"),
        ]
    );
}

#[test]
fn prefix_whitespace_is_kept_inside_an_entry() {
    let rules: RoutingRules = " my docs/=docs-bucket, media/ =media-bucket".parse().unwrap();

    assert_eq!(
        rules.iter().cloned().collect::<Vec<_>>(),
        vec![
            RoutingRule::new("my docs/", "docs-bucket"),
            RoutingRule::new("media/ ", "media-bucket"),
        ]
    );
    assert_eq!(rules.route("media/c.png"), None);
    assert_eq!(
        rules.route("my docs/a.txt").map(|rule| rule.destination.as_str()),
        Some("docs-bucket")
    );
}

#[test]
fn it_parses_blank_value_as_no_rules() {
    let rules: RoutingRules = "  ".parse().unwrap();
    assert_eq!(rules.len(), 0);
}

#[test]
fn it_rejects_malformed_rules() {
    assert_eq!(
        "docs/".parse::<RoutingRules>(),
        Err(RoutingRuleParseErr::MissingSeparator("docs/".to_string()))
    );
    assert_eq!(
        "=docs-bucket".parse::<RoutingRules>(),
        Err(RoutingRuleParseErr::EmptyPrefix("=docs-bucket".to_string()))
    );
    assert_eq!(
        "docs/=".parse::<RoutingRules>(),
        Err(RoutingRuleParseErr::EmptyDestination("docs/=".to_string()))
    );
}

#[test]
fn location_displays_prefix() {
    assert_eq!(BucketLocation::new("src").to_string(), "s3://src");
    assert_eq!(
        BucketLocation::new("src").with_prefix("daily/").to_string(),
        "s3://src/daily/"
    );
    assert_eq!(BucketLocation::new("src").with_prefix("").prefix, None);
}

#[test]
fn status_is_derived_from_counts() {
    assert_eq!(RunOutcome::from_counts(0, 0, 0, vec![]).status, RunStatus::Success);
    assert_eq!(RunOutcome::from_counts(0, 7, 0, vec![]).status, RunStatus::Success);
    assert_eq!(RunOutcome::from_counts(3, 1, 0, vec![]).status, RunStatus::Success);
    assert_eq!(
        RunOutcome::from_counts(2, 0, 0, vec![failure("a")]).status,
        RunStatus::PartialFailure
    );
    assert_eq!(
        RunOutcome::from_counts(0, 4, 0, vec![failure("a"), failure("b")]).status,
        RunStatus::Failure
    );
    assert_eq!(
        RunOutcome::from_counts(2, 0, 5, vec![]).status,
        RunStatus::PartialFailure
    );
    assert_eq!(
        RunOutcome::from_counts(0, 0, 5, vec![]).status,
        RunStatus::PartialFailure
    );
    assert_eq!(
        RunOutcome::from_counts(0, 0, 5, vec![failure("a")]).status,
        RunStatus::Failure
    );
}

#[test]
fn errors_are_sorted_by_key() {
    let outcome = RunOutcome::from_counts(1, 0, 0, vec![failure("z"), failure("a"), failure("m")]);
    assert_matches!(outcome.errors.as_slice(), [a, m, z] => {
        assert_eq!(a.key, "a");
        assert_eq!(m.key, "m");
        assert_eq!(z.key, "z");
    });
    assert_eq!(outcome.matched(), 4);
}

#[test]
fn enumeration_failure_is_total() {
    let outcome = RunOutcome::enumeration_failed("service unavailable");
    assert_matches!(outcome, RunOutcome { status: RunStatus::Failure, copied: 0, skipped: 0, not_attempted: 0, errors, enumeration_error: Some(e) } => {
        assert!(errors.is_empty());
        assert_eq!(e, "service unavailable");
    });
}

#[test]
fn notification_lists_counts() {
    let source = BucketLocation::new("prod-uploads");
    let message = RunOutcome::from_counts(12, 3, 0, vec![]).notification(&source, 10);

    assert_eq!(message.subject, "[bucket-backup] SUCCESS: s3://prod-uploads");
    assert!(message.body.contains("finished with status SUCCESS"));
    assert!(message.body.contains("Copied: 12"));
    assert!(message.body.contains("Skipped (no matching prefix): 3"));
    assert!(message.body.contains("Failed: 0"));
    assert!(!message.body.contains("Errors:"));
}

#[test]
fn notification_truncates_error_list() {
    let source = BucketLocation::new("prod-uploads");
    let errors = (0..5).map(|i| failure(&format!("docs/{i}"))).collect();
    let message = RunOutcome::from_counts(1, 0, 0, errors).notification(&source, 2);

    assert!(message.subject.starts_with("[bucket-backup] PARTIAL_FAILURE"));
    assert!(message.body.contains("- docs/0 -> backup-docs: access denied"));
    assert!(message.body.contains("- docs/1 -> backup-docs: access denied"));
    assert!(!message.body.contains("docs/2"));
    assert!(message.body.contains("... and 3 more"));
}

#[test]
fn notification_includes_enumeration_error() {
    let source = BucketLocation::new("prod-uploads").with_prefix("daily/");
    let message = RunOutcome::enumeration_failed("throttled").notification(&source, 10);

    assert_eq!(message.subject, "[bucket-backup] FAILURE: s3://prod-uploads/daily/");
    assert!(message.body.contains("Listing the source failed: throttled"));
}

#[test]
fn notification_subject_is_bounded() {
    let source = BucketLocation::new("b".repeat(63)).with_prefix("p".repeat(200));
    let message = RunOutcome::from_counts(0, 0, 0, vec![]).notification(&source, 10);
    assert_eq!(message.subject.chars().count(), MAX_SUBJECT_LEN);
}

#[test]
fn outcome_displays_one_line_summary() {
    let outcome = RunOutcome::from_counts(2, 1, 0, vec![failure("a")]);
    assert_eq!(
        outcome.to_string(),
        "PARTIAL_FAILURE: copied=2 skipped=1 failed=1 not_attempted=0"
    );
}
