//! End-to-end saturation scenarios, driven through the TPTP frontend

use satforge::saturation::SaturationResult;
use satforge::{parse_problem, Prover, ProverConfig, SelectionStrategy};

fn run(input: &str) -> (SaturationResult, Prover) {
    run_with(input, ProverConfig::default())
}

fn run_with(input: &str, config: ProverConfig) -> (SaturationResult, Prover) {
    let parsed = parse_problem(input).expect("parse failure");
    let mut prover = Prover::new(parsed.ctx, config);
    prover.add_passive(parsed.clauses);
    let result = prover.saturate();
    (result, prover)
}

fn assert_refutation(result: &SaturationResult) {
    match result {
        SaturationResult::Refutation(proof) => {
            let last = proof.steps.last().expect("empty proof");
            assert!(last.is_empty(), "proof must end in the empty clause");
        }
        other => panic!("expected refutation, got {:?}", other),
    }
}

#[test]
fn reflexivity_is_refuted_immediately() {
    let (result, prover) = run("cnf(goal, negated_conjecture, a != a).");
    assert_refutation(&result);
    assert!(prover.state.stats.iterations <= 1);
}

#[test]
fn modus_ponens_via_superposition() {
    let (result, _) = run("
        cnf(fact, axiom, p(a)).
        cnf(rule, axiom, ~p(X) | q(X)).
        cnf(goal, negated_conjecture, ~q(a)).
    ");
    assert_refutation(&result);
}

#[test]
fn group_inverse_involution() {
    // Group axioms; conjecture inv(inv(X)) = X
    let (result, _) = run("
        cnf(left_identity, axiom, mult(e, X) = X).
        cnf(left_inverse, axiom, mult(inv(X), X) = e).
        cnf(associativity, axiom, mult(mult(X, Y), Z) = mult(X, mult(Y, Z))).
        cnf(goal, negated_conjecture, inv(inv(a)) != a).
    ");
    assert_refutation(&result);
}

#[test]
fn saturation_without_refutation() {
    let (result, prover) = run("cnf(fact, axiom, p(a)).");
    assert!(matches!(result, SaturationResult::Saturated));
    assert_eq!(prover.state.stats.iterations, 1);
}

#[test]
fn demodulation_rewrites_before_activation() {
    // f(a) = b demodulates p(f(a)); saturation then refutes against ~p(b)
    let (result, prover) = run("
        cnf(eq, axiom, f(a) = b).
        cnf(fact, axiom, p(f(a))).
        cnf(goal, negated_conjecture, ~p(b)).
    ");
    assert_refutation(&result);
    assert!(
        prover.state.stats.forward_simplified + prover.state.stats.backward_simplified > 0,
        "demodulation should have fired"
    );
}

#[test]
fn subsumed_clause_is_discarded() {
    // p(X) subsumes p(a) | q(b); the problem stays satisfiable
    let (result, prover) = run("
        cnf(wide, axiom, p(a) | q(b)).
        cnf(unit, axiom, p(X)).
    ");
    assert!(matches!(result, SaturationResult::Saturated));
    let stats = &prover.state.stats;
    assert!(
        stats.forward_subsumed + stats.backward_subsumed > 0,
        "expected a subsumption, stats: {:?}",
        stats
    );
}

#[test]
fn propositional_chain() {
    let (result, _) = run("
        cnf(c1, axiom, p | q).
        cnf(c2, axiom, ~p | r).
        cnf(c3, axiom, ~q | r).
        cnf(goal, negated_conjecture, ~r).
    ");
    assert_refutation(&result);
}

#[test]
fn equality_chain_with_functions() {
    let (result, _) = run("
        cnf(c1, axiom, g(a) = b).
        cnf(c2, axiom, f(b) = c).
        cnf(goal, negated_conjecture, f(g(a)) != c).
    ");
    assert_refutation(&result);
}

#[test]
fn no_selection_strategy_still_completes() {
    let mut config = ProverConfig::default();
    config.selection = SelectionStrategy::NoSelection;
    let (result, _) = run_with(
        "
        cnf(fact, axiom, p(a)).
        cnf(rule, axiom, ~p(X) | q(X)).
        cnf(goal, negated_conjecture, ~q(a)).
        ",
        config,
    );
    assert_refutation(&result);
}

#[test]
fn lpo_ordering_proves_equality_problems() {
    let mut config = ProverConfig::default();
    config.ordering = satforge::OrderingKind::Lpo;
    let (result, _) = run_with(
        "
        cnf(c1, axiom, f(a) = b).
        cnf(goal, negated_conjecture, f(f(a)) != f(b)).
        ",
        config,
    );
    assert_refutation(&result);
}

#[test]
fn proof_parents_are_older_than_conclusions() {
    let (result, _) = run("
        cnf(fact, axiom, p(a)).
        cnf(rule, axiom, ~p(X) | q(X)).
        cnf(goal, negated_conjecture, ~q(a)).
    ");
    match result {
        SaturationResult::Refutation(proof) => {
            for clause in &proof.steps {
                let id = clause.id.unwrap();
                for &parent in clause.proof.parents() {
                    assert!(parent < id, "parent {} not older than {}", parent, id);
                }
            }
        }
        other => panic!("expected refutation, got {:?}", other),
    }
}

#[test]
fn step_limit_reports_resource_out() {
    let mut config = ProverConfig::default();
    config.max_steps = 3;
    let (result, _) = run_with(
        "
        cnf(c1, axiom, p(a)).
        cnf(c2, axiom, ~p(X) | p(f(X))).
        ",
        config,
    );
    assert!(matches!(
        result,
        SaturationResult::ResourceOut(satforge::LimitReason::Steps)
    ));
}

#[test]
fn dollar_false_input_is_immediately_unsat() {
    let (result, _) = run("cnf(goal, negated_conjecture, $false).");
    assert_refutation(&result);
}

#[test]
fn tautologies_do_not_pollute_the_active_set() {
    let (result, prover) = run("
        cnf(taut, axiom, p(a) | ~p(a)).
        cnf(fact, axiom, q(b)).
    ");
    assert!(matches!(result, SaturationResult::Saturated));
    assert!(prover.state.stats.tautologies_deleted > 0);
}
