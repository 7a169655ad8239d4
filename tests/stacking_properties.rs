use eva_fitting::dogma::stacking::{
    calculate_optimal_module_count, calculate_stacking_penalties, penalty_factor,
    stacking_penalty_table, StackableModule,
};
use proptest::prelude::*;

fn approx_eq(a: f64, b: f64, tol: f64) {
    assert!((a - b).abs() <= tol, "expected {b}, got {a}");
}

fn row(module_type_id: u32, group: i32, bonus: f64) -> StackableModule {
    StackableModule {
        module_type_id,
        effect_id: 1,
        attribute_id: 64,
        stacking_group_id: group,
        bonus_amount: bonus,
    }
}

#[test]
fn three_equal_bonuses_keep_about_81_percent() {
    let analysis = calculate_stacking_penalties(&[row(1, 1, 10.0), row(1, 1, 10.0), row(1, 1, 10.0)]);
    // 1 + e^(-1/7.1289) + e^(-4/7.1289) over 3.
    approx_eq(analysis.efficiency_percentage, 81.2, 0.2);
    approx_eq(analysis.total_penalized_bonus, 24.397, 1e-3);
}

#[test]
fn penalty_table_matches_the_formula() {
    let table = stacking_penalty_table(6);
    assert_eq!(table.len(), 6);
    approx_eq(table[0].effectiveness_percentage, 100.0, 1e-12);
    approx_eq(table[1].effectiveness_percentage, 86.912, 1e-3);
    approx_eq(table[2].effectiveness_percentage, 57.058, 1e-3);
    approx_eq(table[3].effectiveness_percentage, 28.295, 1e-3);
    approx_eq(table[4].effectiveness_percentage, 10.599, 1e-3);
    approx_eq(table[5].effectiveness_percentage, 3.000, 1e-3);
    for row in &table {
        approx_eq(row.effectiveness_percentage + row.penalty_percentage, 100.0, 1e-9);
    }
}

#[test]
fn one_module_is_always_the_optimum() {
    let optimal = calculate_optimal_module_count(10.0, 1_000_000.0);
    assert_eq!(optimal.count, 1);
    approx_eq(optimal.efficiency, 10.0 / 1_000_000.0, 1e-15);
}

fn rows_strategy() -> impl Strategy<Value = Vec<StackableModule>> {
    prop::collection::vec((1u32..6, -2i32..4, -50.0f64..50.0), 0..12).prop_map(|entries| {
        entries
            .into_iter()
            .map(|(type_id, group, bonus)| row(type_id, group, bonus))
            .collect()
    })
}

proptest! {
    #[test]
    fn every_input_row_is_returned_once(rows in rows_strategy()) {
        let analysis = calculate_stacking_penalties(&rows);
        prop_assert_eq!(analysis.bonuses.len(), rows.len());
        let ordered = analysis.in_input_order();
        for (index, bonus) in ordered.iter().enumerate() {
            prop_assert_eq!(bonus.input_index, index);
            prop_assert_eq!(bonus.original_bonus, rows[index].bonus_amount);
        }
    }

    #[test]
    fn penalties_follow_strength_order(rows in rows_strategy()) {
        let analysis = calculate_stacking_penalties(&rows);
        for bonus in &analysis.bonuses {
            match bonus.position {
                None => {
                    prop_assert!(bonus.stacking_group_id <= 0 || rows[bonus.input_index].stacking_group_id <= 0);
                    prop_assert_eq!(bonus.penalty_factor, 1.0);
                    prop_assert_eq!(bonus.penalized_bonus, bonus.original_bonus);
                }
                Some(position) => {
                    prop_assert_eq!(bonus.penalty_factor, penalty_factor(position));
                    // Every stronger bonus in the same group sits at an earlier position.
                    for other in analysis.bonuses.iter().filter(|b| b.stacking_group_id == bonus.stacking_group_id) {
                        if let Some(other_position) = other.position {
                            if other.original_bonus.abs() > bonus.original_bonus.abs() {
                                prop_assert!(other_position < position);
                            }
                        }
                    }
                }
            }
            prop_assert!(bonus.penalized_bonus.abs() <= bonus.original_bonus.abs() + 1e-12);
        }
    }

    #[test]
    fn efficiency_is_bounded(rows in rows_strategy()) {
        let analysis = calculate_stacking_penalties(&rows);
        prop_assert!(analysis.efficiency_percentage >= 0.0);
        prop_assert!(analysis.efficiency_percentage <= 100.0 + 1e-9);
        prop_assert!(analysis.total_penalized_bonus <= analysis.total_original_bonus + 1e-9);
    }

    #[test]
    fn results_are_deterministic(rows in rows_strategy()) {
        prop_assert_eq!(calculate_stacking_penalties(&rows), calculate_stacking_penalties(&rows));
    }

    #[test]
    fn penalty_factor_decreases_with_position(position in 0usize..20) {
        prop_assert!(penalty_factor(position + 1) < penalty_factor(position));
        prop_assert!(penalty_factor(position) > 0.0);
    }
}
