//! Property tests for the pure scoring and reduction functions.

use blastradius::assurance::{AssuranceModel, AssuranceState, DependencyEdge, EdgeField};
use blastradius::impact::{self, severity, ImpactRecord, SeverityLevel};
use blastradius::narrative::{HeaderNarrativeParser, NarrativeParser};
use proptest::prelude::*;

// ---------------------------------------------------------------------------
// Strategies
// ---------------------------------------------------------------------------

fn arb_name() -> impl Strategy<Value = Option<String>> {
    prop_oneof![
        Just(None),
        Just(Some(String::new())),
        "[A-Ca-c]{1,2}".prop_map(Some),
    ]
}

fn arb_record() -> impl Strategy<Value = ImpactRecord> {
    (arb_name(), arb_name(), arb_name()).prop_map(|(application, process, service)| ImpactRecord {
        application,
        process,
        service,
    })
}

fn arb_edge() -> impl Strategy<Value = DependencyEdge> {
    ("[a-z]{3,8}", 0.1f64..=1.0, 0.0f64..=1.0, 0.0f64..=1.0)
        .prop_map(|(name, c, h, r)| DependencyEdge::new(name, c, h, r))
}

// ---------------------------------------------------------------------------
// Impact sets
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn reduce_has_no_duplicates_or_empties(records in prop::collection::vec(arb_record(), 0..40)) {
        let set = impact::reduce(&records);
        for list in [&set.applications, &set.processes, &set.services] {
            prop_assert!(list.iter().all(|v| !v.is_empty()));
            for (i, v) in list.iter().enumerate() {
                prop_assert!(!list[i + 1..].contains(v));
            }
        }
    }

    #[test]
    fn reduce_preserves_first_seen_order(records in prop::collection::vec(arb_record(), 0..40)) {
        let set = impact::reduce(&records);
        let mut expected: Vec<String> = Vec::new();
        for r in &records {
            if let Some(a) = r.application.as_ref().filter(|a| !a.is_empty()) {
                if !expected.contains(a) {
                    expected.push(a.clone());
                }
            }
        }
        prop_assert_eq!(set.applications, expected);
    }
}

// ---------------------------------------------------------------------------
// Severity
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn severity_is_pure(a in 0usize..50, p in 0usize..50, s in 0usize..50) {
        prop_assert_eq!(severity::classify(a, p, s), severity::classify(a, p, s));
    }

    #[test]
    fn severity_follows_the_ladder(a in 0usize..30, p in 0usize..30, s in 0usize..30) {
        let score = 4 * s + 2 * a + p;
        let expected = if score >= 20 || (s >= 3 && a >= 4) {
            SeverityLevel::Critical
        } else if score >= 12 || (s == 2 && a >= 4) || a >= 5 {
            SeverityLevel::High
        } else if score >= 6 || (a >= 3 && p >= 3) {
            SeverityLevel::Medium
        } else if score > 0 {
            SeverityLevel::Low
        } else {
            SeverityLevel::Safe
        };
        let result = severity::classify(a, p, s);
        prop_assert_eq!(result.level, expected);
        prop_assert_eq!(result.score as usize, score);
        prop_assert!(!result.reasons.is_empty());
    }

    #[test]
    fn more_services_never_lower_severity(a in 0usize..20, p in 0usize..20, s in 0usize..20) {
        prop_assert!(severity::level(a, p, s + 1) >= severity::level(a, p, s));
    }
}

// ---------------------------------------------------------------------------
// Assurance
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn score_is_always_in_range(edges in prop::collection::vec(arb_edge(), 0..12)) {
        let state = AssuranceState::compute(edges);
        prop_assert!(state.score <= 100);
    }

    #[test]
    fn raising_health_never_lowers_score(
        edges in prop::collection::vec(arb_edge(), 1..8),
        idx in any::<prop::sample::Index>(),
        bump in 0.0f64..=1.0,
    ) {
        let mut model = AssuranceModel::new(edges);
        let i = idx.index(model.edges().len());
        let before_total = model.state().total_impact;
        let before_score = model.score();
        let health = model.edges()[i].health;

        model.update(i, EdgeField::Health, health + bump).unwrap();
        prop_assert!(model.state().total_impact <= before_total + 1e-9);
        prop_assert!(model.score() >= before_score);
    }

    #[test]
    fn update_only_touches_one_edge(
        edges in prop::collection::vec(arb_edge(), 2..8),
        idx in any::<prop::sample::Index>(),
        value in -2.0f64..3.0,
    ) {
        let mut model = AssuranceModel::new(edges);
        let before = model.edges().to_vec();
        let i = idx.index(before.len());

        model.update(i, EdgeField::Redundancy, value).unwrap();
        for (j, (old, new)) in before.iter().zip(model.edges()).enumerate() {
            if j == i {
                prop_assert_eq!(new.redundancy, value.clamp(0.0, 1.0));
                prop_assert_eq!(new.health, old.health);
            } else {
                prop_assert_eq!(old, new);
            }
        }
    }

    #[test]
    fn clamped_inputs_stay_in_domain(c in -5.0f64..5.0, h in -5.0f64..5.0, r in -5.0f64..5.0) {
        let e = DependencyEdge::new("x", c, h, r);
        prop_assert!((0.1..=1.0).contains(&e.criticality));
        prop_assert!((0.0..=1.0).contains(&e.health));
        prop_assert!((0.0..=1.0).contains(&e.redundancy));
    }
}

// ---------------------------------------------------------------------------
// Narrative
// ---------------------------------------------------------------------------

proptest! {
    #[test]
    fn parser_never_panics_and_fills_every_field(text in ".{0,300}") {
        let sections = HeaderNarrativeParser.parse(&text);
        for field in sections.fields() {
            prop_assert!(!field.is_empty());
        }
    }

    #[test]
    fn well_formed_sections_roundtrip(
        bodies in prop::collection::vec("[a-z][a-z ]{0,20}[a-z]", 5),
    ) {
        let headers = blastradius::narrative::HEADERS;
        let text: String = headers
            .iter()
            .zip(&bodies)
            .map(|(h, b)| format!("{}: {}\n", h, b))
            .collect();
        let sections = HeaderNarrativeParser.parse(&text);
        // A body that happens to spell out a header legitimately splits differently.
        let collides = bodies.iter().any(|b| {
            let squashed = b.replace(' ', "");
            headers
                .iter()
                .any(|h| squashed.contains(&h.to_lowercase().replace(' ', "")))
        });
        prop_assume!(!collides);
        for (field, body) in sections.fields().iter().zip(&bodies) {
            prop_assert_eq!(*field, body.trim());
        }
    }
}
