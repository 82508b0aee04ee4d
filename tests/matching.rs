use kindling::construct::{Fact, Term, WorkingMemory};
use kindling::matcher::match_conditions;

fn fact(functor: &str, args: &[&str]) -> Fact {
    let terms = args.iter().map(|a| Term::symbol(a)).collect();
    Fact::new(Term::apply(functor, terms)).expect("ground compound")
}

fn cond(functor: &str, vars: &[&str]) -> Term {
    Term::apply(functor, vars.iter().map(|v| Term::variable(v)).collect())
}

#[test]
fn zero_conditions_yield_exactly_one_empty_match() {
    let mut memory = WorkingMemory::new();
    memory.assert_fact(fact("p", &["a"]));
    let matches = match_conditions(&[], &memory);
    assert_eq!(matches.len(), 1);
    assert!(matches[0].bindings.is_empty());
    assert!(matches[0].supports.is_empty());
}

#[test]
fn every_combination_is_enumerated_in_memory_order() {
    let mut memory = WorkingMemory::new();
    memory.assert_fact(fact("p", &["a"]));
    memory.assert_fact(fact("p", &["b"]));
    let conditions = vec![cond("p", &["x"]), cond("p", &["y"])];
    let matches = match_conditions(&conditions, &memory);
    assert_eq!(matches.len(), 4, "two facts x two conditions");
    let rendered: Vec<(String, String)> = matches
        .iter()
        .map(|m| {
            (
                m.bindings.get("x").unwrap().to_string(),
                m.bindings.get("y").unwrap().to_string(),
            )
        })
        .collect();
    let expected = vec![
        (String::from("a"), String::from("a")),
        (String::from("a"), String::from("b")),
        (String::from("b"), String::from("a")),
        (String::from("b"), String::from("b")),
    ];
    assert_eq!(rendered, expected, "working-memory order within a condition, condition order across");
}

#[test]
fn supports_follow_condition_order() {
    let mut memory = WorkingMemory::new();
    memory.assert_fact(fact("p", &["a"]));
    memory.assert_fact(fact("q", &["b"]));
    let conditions = vec![cond("q", &["y"]), cond("p", &["x"])];
    let matches = match_conditions(&conditions, &memory);
    assert_eq!(matches.len(), 1);
    let supports: Vec<String> = matches[0].supports.iter().map(|f| f.to_string()).collect();
    assert_eq!(supports, vec![String::from("q(b)"), String::from("p(a)")]);
}

#[test]
fn shared_variables_join_across_conditions() {
    let mut memory = WorkingMemory::new();
    memory.assert_fact(fact("edge", &["a", "b"]));
    memory.assert_fact(fact("edge", &["b", "c"]));
    let conditions = vec![
        Term::apply("edge", vec![Term::variable("x"), Term::variable("y")]),
        Term::apply("edge", vec![Term::variable("y"), Term::variable("z")]),
    ];
    let matches = match_conditions(&conditions, &memory);
    assert_eq!(matches.len(), 1, "only the chained pair joins");
    assert_eq!(matches[0].bindings.get("x"), Some(&Term::symbol("a")));
    assert_eq!(matches[0].bindings.get("z"), Some(&Term::symbol("c")));
}

#[test]
fn sibling_candidates_never_see_each_others_bindings() {
    // Regression-shaped: a partial binding from a failing branch must not
    // survive into the next candidate fact's attempt.
    let mut memory = WorkingMemory::new();
    memory.assert_fact(fact("p", &["a"]));
    memory.assert_fact(fact("q", &["b"]));
    let joined = vec![cond("p", &["x"]), cond("q", &["x"])];
    assert!(match_conditions(&joined, &memory).is_empty(), "a and b do not join");

    let mut agreeing = WorkingMemory::new();
    agreeing.assert_fact(fact("p", &["a"]));
    agreeing.assert_fact(fact("q", &["a"]));
    assert_eq!(match_conditions(&joined, &agreeing).len(), 1);
}

#[test]
fn arity_mismatch_contributes_no_match() {
    // malformed shapes are not errors, they just fail to unify
    let mut memory = WorkingMemory::new();
    memory.assert_fact(fact("p", &["a", "b"]));
    let conditions = vec![cond("p", &["x"])];
    assert!(match_conditions(&conditions, &memory).is_empty());
}
