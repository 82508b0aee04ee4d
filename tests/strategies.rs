use std::str::FromStr;
use std::sync::Arc;

use kindling::agenda::Strategy;
use kindling::construct::{Fact, RuleBase, Term};
use kindling::engine::{NullSink, Session};
use kindling::error::KindlingError;
use kindling::tinder::Engine;

fn fact(functor: &str, args: &[&str]) -> Fact {
    let terms = args.iter().map(|a| Term::symbol(a)).collect();
    Fact::new(Term::apply(functor, terms)).expect("ground compound")
}

// Two rules concluding the same advisory fact from disjoint single
// conditions; the earlier-declared rule has the lower priority.
fn advisor_base() -> Arc<RuleBase> {
    let mut base = RuleBase::new();
    base.create_rule(
        String::from("low-gpa-needs-review"),
        vec![Term::apply("low-gpa", vec![Term::variable("student")])],
        vec![Term::apply("needs-advisor-review", vec![Term::variable("student")])],
        1,
    )
    .expect("rule ok");
    base.create_rule(
        String::from("probation-needs-review"),
        vec![Term::apply("on-probation", vec![Term::variable("student")])],
        vec![Term::apply("needs-advisor-review", vec![Term::variable("student")])],
        9,
    )
    .expect("rule ok");
    Arc::new(base)
}

fn advisor_facts() -> Vec<Fact> {
    vec![fact("low-gpa", &["Bob"]), fact("on-probation", &["Bob"])]
}

#[test]
fn priority_and_order_pick_different_first_activations() {
    let mut by_priority = Session::new(advisor_facts(), advisor_base(), Strategy::Priority, None);
    by_priority.infer(&mut NullSink).expect("run ok");
    assert!(
        by_priority.fired_keys()[0].to_string().starts_with("probation-needs-review"),
        "priority 9 beats priority 1"
    );

    let mut by_order = Session::new(advisor_facts(), advisor_base(), Strategy::Order, None);
    by_order.infer(&mut NullSink).expect("run ok");
    assert!(
        by_order.fired_keys()[0].to_string().starts_with("low-gpa-needs-review"),
        "the earlier-declared rule wins regardless of priority"
    );

    assert_ne!(
        by_priority.fired_keys()[0].to_string(),
        by_order.fired_keys()[0].to_string(),
        "the two strategies must diverge on this input"
    );
}

#[test]
fn specificity_inverts_the_priority_keys() {
    // single-condition rule with the higher priority, double-condition rule
    // with the lower: priority picks the former, specificity the latter
    let build = || {
        let mut base = RuleBase::new();
        base.create_rule(
            String::from("single-condition"),
            vec![Term::apply("a", vec![Term::variable("x")])],
            vec![Term::apply("single-fired", vec![Term::variable("x")])],
            9,
        )
        .expect("rule ok");
        base.create_rule(
            String::from("double-condition"),
            vec![
                Term::apply("a", vec![Term::variable("x")]),
                Term::apply("b", vec![Term::variable("x")]),
            ],
            vec![Term::apply("double-fired", vec![Term::variable("x")])],
            5,
        )
        .expect("rule ok");
        Arc::new(base)
    };
    let facts = vec![fact("a", &["k"]), fact("b", &["k"])];

    let mut by_priority = Session::new(facts.clone(), build(), Strategy::Priority, None);
    by_priority.infer(&mut NullSink).expect("run ok");
    assert!(by_priority.fired_keys()[0].to_string().starts_with("single-condition"));

    let mut by_specificity = Session::new(facts, build(), Strategy::Specificity, None);
    by_specificity.infer(&mut NullSink).expect("run ok");
    assert!(by_specificity.fired_keys()[0].to_string().starts_with("double-condition"));

    // equal priorities: specificity is what breaks the tie under priority too
    let mut tie_base = RuleBase::new();
    for (name, conditions) in [
        ("lone", vec![Term::apply("a", vec![Term::variable("x")])]),
        (
            "paired",
            vec![
                Term::apply("a", vec![Term::variable("x")]),
                Term::apply("b", vec![Term::variable("x")]),
            ],
        ),
    ] {
        tie_base
            .create_rule(
                String::from(name),
                conditions,
                vec![Term::apply(name, vec![Term::variable("x")])],
                5,
            )
            .expect("rule ok");
    }
    let facts = vec![fact("a", &["k"]), fact("b", &["k"])];
    let mut tied = Session::new(facts, Arc::new(tie_base), Strategy::Priority, None);
    tied.infer(&mut NullSink).expect("run ok");
    assert!(tied.fired_keys()[0].to_string().starts_with("paired"));
}

#[test]
fn remaining_ties_fall_to_declaration_order() {
    let mut base = RuleBase::new();
    for name in ["first-twin", "second-twin"] {
        base.create_rule(
            String::from(name),
            vec![Term::apply("spark", vec![Term::variable("x")])],
            vec![Term::apply(name, vec![Term::variable("x")])],
            0,
        )
        .expect("rule ok");
    }
    let mut session = Session::new(vec![fact("spark", &["s"])], Arc::new(base), Strategy::Priority, None);
    session.infer(&mut NullSink).expect("run ok");
    assert!(session.fired_keys()[0].to_string().starts_with("first-twin"));
}

#[test]
fn identical_runs_are_identical() {
    let run = || {
        let mut session = Session::new(advisor_facts(), advisor_base(), Strategy::Specificity, None);
        session.infer(&mut NullSink).expect("run ok");
        let fired: Vec<String> = session.fired_keys().iter().map(|k| k.to_string()).collect();
        let memory: Vec<String> = session.memory().facts().iter().map(|f| f.to_string()).collect();
        (fired, memory)
    };
    assert_eq!(run(), run(), "same facts, rules and strategy must replay exactly");
}

#[test]
fn unknown_strategy_is_a_config_error() {
    let err = Strategy::from_str("bogus").expect_err("must fail");
    assert!(matches!(err, KindlingError::Config(_)));

    // the same failure surfaces through a script, at the infer statement
    let mut engine = Engine::new();
    let err = engine
        .execute_collect("fact a(b); rule r when a(?x) then c(?x); infer bogus;")
        .expect_err("must fail");
    assert!(format!("{}", err).contains("unknown conflict resolution strategy"));
}
