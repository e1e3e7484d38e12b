mod common;

use common::{build_one_cell, category, ConstantForcing};
use tubewell_core::{
    clock::DayInfo,
    config::SimConfig,
    engine::SimEngine,
    error::SimError,
    event::SimEvent,
    forcing::{CropDemand, CropIncome, Forcing, WaterSupply},
    state::{CellSetup, CellState},
    subcategory::SubcategoryLayout,
};

#[test]
fn tick_events_are_bracketed_by_start_and_completion() {
    let mut engine = build_one_cell("events", SimConfig::default_test());
    let events = engine.tick(&mut ConstantForcing::dry()).unwrap();

    assert_eq!(events.first(), Some(&SimEvent::TickStarted { tick: 1 }));
    assert_eq!(events.last(), Some(&SimEvent::TickCompleted { tick: 1 }));
    // 1 January 2000 opens the year in the test calendar.
    assert!(events
        .iter()
        .any(|e| e.type_name() == "agricultural_year_started"));
}

#[test]
fn run_ticks_announces_the_run_once() {
    let mut engine = build_one_cell("announce", SimConfig::default_test());
    let mut forcing = ConstantForcing::dry();

    let first = engine.run_ticks(3, &mut forcing).unwrap();
    assert!(matches!(
        first.first(),
        Some(SimEvent::RunInitialized { cells: 1, farms, .. }) if *farms == 80.0
    ));

    let second = engine.run_ticks(3, &mut forcing).unwrap();
    assert!(second.iter().all(|e| e.type_name() != "run_initialized"));
    assert_eq!(engine.current_tick(), 6);
}

#[test]
fn build_rejects_cells_that_do_not_match_the_categories() {
    let cells = vec![CellSetup { categories: vec![category(10_000.0, 5.0, 0.0, 0.1)] }];
    let result = SimEngine::build("bad".into(), 1, SimConfig::default_test(), &cells);
    assert!(matches!(result, Err(SimError::InvalidCell { cell: 0, .. })));
}

#[test]
fn build_rejects_invalid_configuration() {
    let mut config = SimConfig::default_test();
    config.categories.clear();
    let result = SimEngine::build("bad".into(), 1, config, &common::one_cell());
    assert!(matches!(result, Err(SimError::InvalidConfig { .. })));
}

/// Returns one demand entry too few.
struct ShortForcing;

impl Forcing for ShortForcing {
    fn water_supply(&mut self, _day: &DayInfo, _cell: &CellState) -> WaterSupply {
        WaterSupply::default()
    }

    fn irrigation_demand(
        &mut self,
        _day: &DayInfo,
        layout: &SubcategoryLayout,
        cell: &CellState,
    ) -> Vec<CropDemand> {
        vec![CropDemand::default(); layout.len() * cell.crop_count - 1]
    }

    fn crop_income(
        &mut self,
        _day: &DayInfo,
        layout: &SubcategoryLayout,
        cell: &CellState,
    ) -> Vec<CropIncome> {
        vec![CropIncome::default(); layout.len() * cell.crop_count]
    }
}

#[test]
fn malformed_forcing_is_reported_not_absorbed() {
    let mut engine = build_one_cell("short", SimConfig::default_test());
    let err = engine.tick(&mut ShortForcing).unwrap_err();
    assert!(matches!(err, SimError::ShapeMismatch { what: "irrigation demand", .. }));
}

#[test]
fn farm_totals_hold_across_years() {
    let mut config = SimConfig::default_test();
    config.accounting.initial_savings_per_farm = 50_000.0;
    let mut engine = build_one_cell("totals", config);
    let layout = engine.layout().clone();
    let before: Vec<f64> = (0..layout.category_count())
        .map(|c| engine.cells()[0].category_total(&layout, c))
        .collect();

    engine.run_ticks(366 + 365 + 365, &mut ConstantForcing::dry()).unwrap();

    for (c, total) in before.iter().enumerate() {
        assert_eq!(engine.cells()[0].category_total(&layout, c), *total);
    }
    assert!(engine.cells()[0].cash.iter().all(|a| a.savings_account >= 0.0));
}

#[test]
fn test_engine_runs_a_year_of_synthetic_forcing() {
    use tubewell_core::forcing::{SyntheticForcing, SyntheticForcingParams};

    let mut engine = SimEngine::build_test("synthetic".into(), 11).unwrap();
    let config = engine.config().clone();
    let mut forcing = SyntheticForcing::new(
        SyntheticForcingParams::default(),
        engine.seed(),
        config.calendar.start_of_agricultural_year,
        config.crop_count(),
    );

    let events = engine.run_ticks(366, &mut forcing).unwrap();

    let settlements = events
        .iter()
        .filter(|e| matches!(e, SimEvent::AccountsSettled { .. }))
        .count();
    assert_eq!(settlements, engine.cells().len());
    // The second test cell has an empty large-farm category.
    let empty = &engine.cells()[1];
    for i in engine.layout().category_range(1) {
        assert_eq!(empty.farm_count[i], 0.0);
    }
}
