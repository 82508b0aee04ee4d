use std::sync::Arc;

use kindling::agenda::Strategy;
use kindling::construct::{Fact, RuleBase, Term};
use kindling::engine::{DEFAULT_STEP_LIMIT, Halt, NullSink, Session};
use kindling::tinder::Engine;

fn fact(functor: &str, args: &[&str]) -> Fact {
    let terms = args.iter().map(|a| Term::symbol(a)).collect();
    Fact::new(Term::apply(functor, terms)).expect("ground compound")
}

// A self-feeding rule: every firing mints a structurally new fact, so the
// agenda never empties and only the step ceiling stops the run.
fn growing_base() -> Arc<RuleBase> {
    let mut base = RuleBase::new();
    base.create_rule(
        String::from("grow"),
        vec![Term::apply("chain", vec![Term::variable("n")])],
        vec![Term::apply(
            "chain",
            vec![Term::apply("next", vec![Term::variable("n")])],
        )],
        0,
    )
    .expect("rule ok");
    Arc::new(base)
}

#[test]
fn a_runaway_rule_base_hits_the_step_limit() {
    let mut session = Session::new(
        vec![fact("chain", &["zero"])],
        growing_base(),
        Strategy::Priority,
        Some(5),
    );
    let halt = session.infer(&mut NullSink).expect("run ok");
    assert_eq!(halt, Halt::StepLimit { limit: 5 });
    assert_eq!(session.fired_keys().len(), 5);
    assert_eq!(session.memory().len(), 6, "the given fact plus one per fired cycle");
    assert!(session.memory().facts().last().unwrap().to_string().contains("next(next(next(next(next("));
}

#[test]
fn the_step_limit_halt_is_distinguishable_and_sticky() {
    let mut session = Session::new(
        vec![fact("chain", &["zero"])],
        growing_base(),
        Strategy::Priority,
        Some(3),
    );
    let first = session.infer(&mut NullSink).expect("run ok");
    let second = session.infer(&mut NullSink).expect("run ok");
    assert_eq!(first, Halt::StepLimit { limit: 3 });
    assert_eq!(second, Halt::StepLimit { limit: 3 }, "no further work once the ceiling is reached");
    assert_eq!(session.fired_keys().len(), 3);
}

#[test]
fn the_default_step_limit_applies_when_no_override_is_given() {
    let session = Session::new(Vec::new(), growing_base(), Strategy::Priority, None);
    assert_eq!(session.step_limit(), DEFAULT_STEP_LIMIT);
}

#[test]
fn an_unbound_consequent_variable_passes_through_as_a_literal() {
    // a latent authoring bug the engine deliberately does not detect: the
    // consequent references ?ghost, which no condition binds
    let mut base = RuleBase::new();
    base.create_rule(
        String::from("haunted"),
        vec![Term::apply("p", vec![Term::variable("x")])],
        vec![Term::apply("q", vec![Term::variable("x"), Term::variable("ghost")])],
        0,
    )
    .expect("rule ok");
    let mut session = Session::new(vec![fact("p", &["a"])], Arc::new(base), Strategy::Priority, None);
    session.infer(&mut NullSink).expect("run ok");
    let rendered: Vec<String> = session.memory().facts().iter().map(|f| f.to_string()).collect();
    assert!(rendered.contains(&String::from("q(a, ?ghost)")), "memory: {:?}", rendered);
}

#[test]
fn a_firing_with_no_new_assertions_does_not_halt_the_loop() {
    // two rules conclude the same fact from different givens: the second
    // firing asserts nothing new, yet the run continues to a normal halt
    let mut engine = Engine::new();
    let result = engine
        .execute_collect(
            r#"
fact c-one(a), c-two(a);
rule from-one when c-one(?x) then d(?x);
rule from-two when c-two(?x) then d(?x);
infer order;
"#,
        )
        .expect("script ok");
    let run = &result.runs[0];
    assert_eq!(run.cycles, 2, "both activations fire");
    assert_eq!(run.asserted, vec![String::from("d(a)")], "the fact is asserted once");
    assert!(matches!(run.halt, Halt::Quiescent { .. }));
}

#[test]
fn a_limit_clause_overrides_the_engine_default() {
    let mut engine = Engine::with_step_limit(2);
    let result = engine
        .execute_collect(
            r#"
fact chain(zero);
rule grow when chain(?n) then chain(next(?n));
infer priority;
infer priority limit 4;
"#,
        )
        .expect("script ok");
    assert_eq!(result.runs[0].halt, Halt::StepLimit { limit: 2 });
    assert_eq!(result.runs[1].halt, Halt::StepLimit { limit: 4 });
}

#[test]
fn sessions_are_independent() {
    // two sessions over the same inputs share nothing: firing history in
    // one never refracts the other
    let facts = vec![fact("chain", &["zero"])];
    let base = growing_base();
    let mut first = Session::new(facts.clone(), Arc::clone(&base), Strategy::Priority, Some(2));
    let mut second = Session::new(facts, base, Strategy::Priority, Some(2));
    first.infer(&mut NullSink).expect("run ok");
    second.infer(&mut NullSink).expect("run ok");
    assert_eq!(first.fired_keys().len(), 2);
    assert_eq!(second.fired_keys().len(), 2);
    assert_eq!(
        first.fired_keys()[0].to_string(),
        second.fired_keys()[0].to_string()
    );
}
