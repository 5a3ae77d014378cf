use std::sync::Arc;
use std::time::Duration;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::*;
use crate::graph::NodeId;
use crate::instance::InstanceBuilder;
use crate::testutil::{
    brute_force, random_mandatory, random_plain, random_signals, FailingOracle, StubOracle,
};

const SEED: u64 = 20160309;

/// Path A-B-C-D with vertex weights [2, -1, -1, 3] and zero edges.
fn example_path() -> (Instance, Vec<NodeId>) {
    let mut b = InstanceBuilder::new();
    let n: Vec<NodeId> = [2.0, -1.0, -1.0, 3.0]
        .into_iter()
        .map(|w| b.add_weighted_node(w))
        .collect();
    for p in n.windows(2) {
        b.add_weighted_edge(p[0], p[1], 0.0);
    }
    (b.build().expect("valid"), n)
}

/// Two triangles that no reduction touches.
fn two_triangles() -> Instance {
    let mut b = InstanceBuilder::new();
    for _ in 0..2 {
        let t: Vec<NodeId> = [3.0, -1.0, 2.0]
            .into_iter()
            .map(|w| b.add_weighted_node(w))
            .collect();
        for i in 0..3 {
            b.add_weighted_edge(t[i], t[(i + 1) % 3], -0.5);
        }
    }
    b.build().expect("valid")
}

fn cfg_off() -> SolverCfg {
    SolverCfg {
        preprocess_level: PreprocessLevel::Off,
        ..SolverCfg::default()
    }
}

#[test]
fn example_path_scores_three() {
    let (inst, _) = example_path();
    for level in [PreprocessLevel::Off, PreprocessLevel::Full] {
        let cfg = SolverCfg {
            preprocess_level: level,
            ..SolverCfg::default()
        };
        let sol = Solver::new(cfg).solve(&inst).expect("solves");
        assert_eq!(sol.score, 3.0);
        assert!(sol.optimal);
        assert!(inst.graph().is_connected_selection(&sol.elements));
    }
}

#[test]
fn minimisation_drops_free_padding() {
    let (inst, n) = example_path();
    let cfg = SolverCfg {
        epsilon: 0.01,
        ..SolverCfg::default()
    };
    let sol = Solver::new(cfg).solve(&inst).expect("solves");
    assert_eq!(sol.elements, vec![Elem::Node(n[3])]);
    assert_eq!(sol.score, 3.0);
}

#[test]
fn minimisation_trades_up_to_epsilon_for_fewer_edges() {
    // A(3) -[0.001]- B(0): dropping the edge loses less than epsilon.
    let mut b = InstanceBuilder::new();
    let a = b.add_weighted_node(3.0);
    let other = b.add_weighted_node(0.0);
    b.add_weighted_edge(a, other, 0.001);
    let inst = b.build().expect("valid");
    let cfg = SolverCfg {
        epsilon: 0.1,
        ..SolverCfg::default()
    };
    let sol = Solver::new(cfg).solve(&inst).expect("solves");
    assert_eq!(sol.elements, vec![Elem::Node(a)]);
    assert_eq!(sol.score, 3.0);

    let tight = SolverCfg {
        epsilon: 0.0005,
        ..SolverCfg::default()
    };
    let sol = Solver::new(tight).solve(&inst).expect("solves");
    assert_eq!(sol.elements.len(), 3);
    assert!((sol.score - 3.001).abs() < 1e-12);
}

#[test]
fn optimality_is_the_conjunction_of_workers() {
    let inst = two_triangles();
    for flag in [true, false] {
        let solver = Solver::with_oracle(cfg_off(), Arc::new(StubOracle { optimal: flag }));
        let sol = solver.solve(&inst).expect("stub never fails");
        assert_eq!(sol.optimal, flag);
        assert_eq!(sol.stats.workers, 2);
        // The greedy answer survives: 3 + 2 - 0.5 on one triangle.
        assert_eq!(sol.score, 4.5);
    }

    // A lone vertex is trivially optimal, the triangle is not.
    let mut b = InstanceBuilder::new();
    b.add_weighted_node(1.0);
    let t: Vec<NodeId> = (0..3).map(|_| b.add_weighted_node(1.0)).collect();
    for i in 0..3 {
        b.add_weighted_edge(t[i], t[(i + 1) % 3], 0.0);
    }
    let inst = b.build().expect("valid");
    let solver = Solver::with_oracle(cfg_off(), Arc::new(StubOracle { optimal: false }));
    assert!(!solver.solve(&inst).expect("solves").optimal);
}

#[test]
fn mandatory_signal_forces_a_costly_vertex() {
    // A(5) - B(-3) - C(-1), and C carries a mandatory signal.
    let mut b = InstanceBuilder::new();
    let a = b.add_weighted_node(5.0);
    let mid = b.add_weighted_node(-3.0);
    let c = b.add_weighted_node(-1.0);
    b.add_weighted_edge(a, mid, 0.0);
    b.add_weighted_edge(mid, c, 0.0);
    let must = b.add_signal(f64::INFINITY);
    b.attach(c, must);
    let inst = b.build().expect("valid");
    for cfg in [cfg_off(), SolverCfg::default()] {
        let sol = Solver::new(cfg).solve(&inst).expect("solve");
        assert_eq!(sol.score, 1.0);
        assert!(sol.elements.contains(&Elem::Node(c)));
        assert_eq!(sol.elements.len(), 5);
        assert!(sol.optimal);
    }
}

#[test]
fn mandatory_leaf_alone_beats_its_folded_neighbour() {
    // 0(-2) - 1(-1, mandatory) -[-2]- 2(1): only {1} is optimal.
    let mut b = InstanceBuilder::new();
    let a = b.add_weighted_node(-2.0);
    let must = b.add_weighted_node(-1.0);
    let c = b.add_weighted_node(1.0);
    b.add_weighted_edge(a, must, 0.0);
    b.add_weighted_edge(must, c, -2.0);
    let sig = b.add_signal(f64::INFINITY);
    b.attach(must, sig);
    let inst = b.build().expect("valid");
    for level in [PreprocessLevel::Off, PreprocessLevel::Local, PreprocessLevel::Full] {
        let cfg = SolverCfg {
            preprocess_level: level,
            ..SolverCfg::default()
        };
        let sol = Solver::new(cfg).solve(&inst).expect("solves");
        assert_eq!(sol.elements, vec![Elem::Node(must)], "{level:?}");
        assert_eq!(sol.score, -1.0);
        assert!(sol.optimal);
    }
}

#[test]
fn exact_solves_with_mandatory_signals_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(SEED + 3);
    let mut checked = 0;
    while checked < 30 {
        let n = rng.gen_range(1..=7);
        let m = rng.gen_range(0..=9);
        let inst = random_mandatory(&mut rng, n, m);
        if brute_force(&inst).0 == f64::NEG_INFINITY {
            continue;
        }
        checked += 1;
        for cfg in [
            cfg_off(),
            SolverCfg::default(),
            SolverCfg {
                split_threshold: 3,
                threads: 2,
                ..SolverCfg::default()
            },
        ] {
            let sol = Solver::new(cfg.clone()).solve(&inst).expect("solves");
            assert_eq!(inst.uncovered(&sol.elements), 0, "{cfg:?}");
            check_exact(&inst, cfg);
        }
    }
}

#[test]
fn failing_oracle_names_the_component() {
    let inst = two_triangles();
    let solver = Solver::with_oracle(cfg_off(), Arc::new(FailingOracle));
    match solver.solve(&inst) {
        Err(MwcsError::WorkerFailed { component, source }) => {
            assert_eq!(component, 0);
            assert!(matches!(*source, MwcsError::Oracle { .. }));
        }
        other => panic!("expected a worker failure, got {other:?}"),
    }
}

#[test]
fn exhausted_budget_degrades_to_heuristics() {
    let inst = two_triangles();
    let cfg = SolverCfg {
        time_limit: Some(Duration::ZERO),
        ..cfg_off()
    };
    let sol = Solver::new(cfg).solve(&inst).expect("timeouts are not errors");
    assert!(!sol.optimal);
    assert_eq!(sol.score, 4.5);
}

#[test]
fn invalid_configurations_are_rejected() {
    let (inst, _) = example_path();
    let cfg = SolverCfg {
        threads: 0,
        ..SolverCfg::default()
    };
    assert!(matches!(
        Solver::new(cfg).solve(&inst),
        Err(MwcsError::InvalidConfig { .. })
    ));

    let mut rng = StdRng::seed_from_u64(SEED);
    let shared = loop {
        let cand = random_signals(&mut rng, 5, 6);
        if !cand.signals().is_plain() {
            break cand;
        }
    };
    let cfg = SolverCfg {
        strategy: Strategy::Bicomponent,
        ..SolverCfg::default()
    };
    assert!(matches!(
        Solver::new(cfg).solve(&shared),
        Err(MwcsError::InvalidConfig { .. })
    ));
}

fn check_exact(inst: &Instance, cfg: SolverCfg) {
    let (expected, _) = brute_force(inst);
    let sol = Solver::new(cfg.clone()).solve(inst).expect("solves");
    assert!(sol.optimal, "{cfg:?}");
    assert!(inst.graph().is_connected_selection(&sol.elements));
    assert!((inst.score(&sol.elements) - sol.score).abs() < 1e-9);
    assert!(
        (sol.score - expected).abs() < 1e-6,
        "got {} expected {expected} with {cfg:?}",
        sol.score
    );
}

#[test]
fn exact_solves_match_brute_force() {
    let mut rng = StdRng::seed_from_u64(SEED);
    for round in 0..40 {
        let n = rng.gen_range(1..=7);
        let m = rng.gen_range(0..=9);
        let plain = round % 2 == 0;
        let inst = if plain {
            random_plain(&mut rng, n, m)
        } else {
            random_signals(&mut rng, n, m)
        };
        check_exact(&inst, cfg_off());
        check_exact(&inst, SolverCfg::default());
        check_exact(
            &inst,
            SolverCfg {
                split_threshold: 3,
                threads: 2,
                ..cfg_off()
            },
        );
        if plain {
            check_exact(
                &inst,
                SolverCfg {
                    strategy: Strategy::Bicomponent,
                    ..cfg_off()
                },
            );
        }
    }
}

#[test]
fn heuristic_mode_is_feasible_and_bounded() {
    let mut rng = StdRng::seed_from_u64(SEED + 7);
    let cfg = SolverCfg {
        heuristic_only: true,
        ..cfg_off()
    };
    for _ in 0..40 {
        let n = rng.gen_range(2..=7);
        let m = rng.gen_range(1..=9);
        let inst = random_signals(&mut rng, n, m);
        let (expected, _) = brute_force(&inst);
        let sol = Solver::new(cfg.clone()).solve(&inst).expect("solves");
        assert!(inst.graph().is_connected_selection(&sol.elements));
        assert!(sol.score <= expected + 1e-9);
    }
}
