use loadout_core::constants::{NUM_PIECES, TUNING_SLOTS};
use loadout_core::{
    Archetype, ArmorSet, CustomOverride, Origin, SearchConfig, SlotBudget, SolveResponse, Solver,
    SolverConfiguration, Stat, StatVector, TuneRequest, TuningPlan, TuningRow, TuningRows,
    derive_rows,
};

fn solver() -> Solver {
    Solver::new(SearchConfig::with_beam_widths(&[60, 240])).unwrap()
}

fn no_tuning(targets: StatVector) -> SolverConfiguration {
    SolverConfiguration {
        targets,
        tuning: TuningPlan::Manual {
            rows: TuningRows::new(),
        },
        ..SolverConfiguration::default()
    }
}

fn assert_shape(response: &SolveResponse) {
    assert_eq!(response.chosen_pieces.len(), NUM_PIECES);
    let exotics = response
        .chosen_pieces
        .iter()
        .filter(|p| p.archetype.is_exotic())
        .count();
    assert_eq!(exotics, 1, "exactly one exotic per loadout");
    assert_eq!(response.totals_final, response.totals_raw.floored());
}

#[test]
fn all_zero_targets_accept_any_loadout() {
    let response = solver().solve(&no_tuning(StatVector::zero())).unwrap();
    assert!(response.feasible);
    assert_shape(&response);
    for (_, value) in response.totals_final.iter() {
        assert!(value >= 0);
    }
}

#[test]
fn single_extreme_target_stacks_weapons() {
    let config = no_tuning(StatVector::from_pairs(&[(Stat::Weapons, 200)]));
    let response = solver().solve(&config).unwrap();
    assert_shape(&response);
    assert!(response.feasible);
    assert_eq!(response.totals_final[Stat::Weapons], 200);
    for piece in &response.chosen_pieces {
        assert_eq!(piece.archetype.set_name(), ArmorSet::Gunner.name());
        let boost = piece.boost.expect("every slot carries a boost");
        assert_eq!(boost.stat, Stat::Weapons);
    }
}

#[test]
fn single_extreme_target_is_infeasible_with_minor_slots() {
    let config = SolverConfiguration {
        minor_slots: 5,
        ..no_tuning(StatVector::from_pairs(&[(Stat::Weapons, 200)]))
    };
    let response = solver().solve(&config).unwrap();
    assert_shape(&response);
    assert!(!response.feasible);
    // Capped armor plus five minor boosts.
    assert_eq!(response.totals_final[Stat::Weapons], 175);
    assert_eq!(response.beam_width, 240);
}

#[test]
fn least_favored_stat_only_ever_donates() {
    let request = TuneRequest {
        armor: StatVector::from_pairs(&[(Stat::Class, 60), (Stat::Super, 60)]),
        targets: StatVector::from_pairs(&[(Stat::Class, 150), (Stat::Super, 150)]),
        fragments: StatVector::zero(),
        budget: SlotBudget::from_minor(0),
        least_favored: Some(Stat::Class),
    };
    let rows = derive_rows(&request, TUNING_SLOTS);
    assert_eq!(
        rows[0],
        TuningRow::general(Some(Stat::Super), Some(Stat::Class))
    );
    assert!(rows[1..].iter().all(TuningRow::is_noop));

    let config = SolverConfiguration {
        targets: request.targets,
        tuning: TuningPlan::Auto {
            least_favored: Some(Stat::Class),
        },
        ..SolverConfiguration::default()
    };
    let response = solver().solve(&config).unwrap();
    assert_shape(&response);
    for row in response.active_tuning_rows() {
        assert_ne!(row.plus, Some(Stat::Class));
        assert_eq!(row.minus, Some(Stat::Class));
    }
}

#[test]
fn custom_exotic_is_the_only_exotic_path() {
    let vector = StatVector::from_pairs(&[
        (Stat::Health, 10),
        (Stat::Grenade, 30),
        (Stat::Super, 30),
        (Stat::Weapons, 5),
    ]);
    let config = SolverConfiguration {
        custom_exotic: CustomOverride::enabled(vector),
        ..no_tuning(StatVector::from_pairs(&[
            (Stat::Grenade, 120),
            (Stat::Super, 100),
        ]))
    };
    let response = solver().solve(&config).unwrap();
    assert_shape(&response);
    let Some(exotic) = response.exotic() else {
        panic!("loadout is missing its exotic");
    };
    assert_eq!(exotic.archetype, Archetype::custom_exotic(vector));
    assert_eq!(exotic.archetype.origin, Origin::Custom);
    assert!(
        response
            .chosen_pieces
            .iter()
            .filter(|p| p.archetype.is_exotic())
            .all(|p| p.archetype.origin == Origin::Custom)
    );
}

#[test]
fn fragments_and_tuning_can_close_the_gap() {
    // Five majors on capped armor reach 200 in one stat and nothing else.
    let targets = StatVector::from_pairs(&[(Stat::Weapons, 200), (Stat::Grenade, 160)]);
    let without = solver().solve(&no_tuning(targets)).unwrap();
    assert!(!without.feasible);

    let config = SolverConfiguration {
        fragments: StatVector::from_pairs(&[(Stat::Weapons, 30), (Stat::Grenade, 30)]),
        tuning: TuningPlan::Auto {
            least_favored: None,
        },
        ..no_tuning(targets)
    };
    let with = solver().solve(&config).unwrap();
    assert_shape(&with);
    assert!(with.feasible, "{:?}", with.totals_final);
}
