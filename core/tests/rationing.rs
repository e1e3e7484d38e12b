mod common;

use common::{build_one_cell, ConstantForcing};
use tubewell_core::{
    config::SimConfig,
    event::SimEvent,
    forcing::{CropDemand, WaterSupply},
    irrigation_subsystem::{
        canal_allotments, diesel_pump_cost, max_groundwater_supply, reset_water_accounts,
        IrrigationRationer,
    },
    state::CropWaterAccount,
    subcategory::{Subcategory, SubcategoryLayout},
};

fn rationer() -> IrrigationRationer {
    let config = SimConfig::default();
    IrrigationRationer::new(config.tubewell, config.pumping_cost)
}

fn sub(wells: u32, has_canal: bool) -> Subcategory {
    Subcategory { category: 0, wells, has_canal }
}

fn supply(canal_volume: f64, groundwater_depth: f64) -> WaterSupply {
    WaterSupply { canal_volume, groundwater_depth, diesel_price: 60.0 }
}

#[test]
fn well_capacity_follows_the_discharge_curve() {
    let litres = max_groundwater_supply(12.0, 7.5, 10.0);
    assert!((litres - 1019.577).abs() < 0.01, "got {litres}");

    // Deeper water table, less water.
    assert!(max_groundwater_supply(12.0, 7.5, 30.0) < litres);
    assert_eq!(max_groundwater_supply(12.0, 7.5, 0.0), 0.0);
}

#[test]
fn canal_is_used_before_groundwater() {
    // 5 mm over 1 ha = 50 m³.
    let demand = [CropDemand { requested_depth: 5.0, crop_area: 10_000.0 }];
    let outcome = rationer().ration(sub(1, true), 1.0, &demand, 30.0, 10.0);

    assert_eq!(outcome.canal_volume, 30.0);
    assert!((outcome.groundwater_volume - 20.0).abs() < 1e-9);
    assert!(outcome.crop_unmet[0] < 1e-9);
    assert!((outcome.realized_depth[0] - 5.0).abs() < 1e-9);
}

#[test]
fn canal_alone_leaves_the_rest_unmet() {
    let demand = [CropDemand { requested_depth: 5.0, crop_area: 10_000.0 }];
    let outcome = rationer().ration(sub(0, true), 0.0, &demand, 30.0, 10.0);

    assert_eq!(outcome.canal_volume, 30.0);
    assert_eq!(outcome.groundwater_volume, 0.0);
    assert!((outcome.crop_unmet[0] - 20.0).abs() < 1e-9);
    assert!((outcome.realized_depth[0] - 3.0).abs() < 1e-9);
}

#[test]
fn farms_without_canal_access_ignore_the_canal() {
    let demand = [CropDemand { requested_depth: 5.0, crop_area: 10_000.0 }];
    let outcome = rationer().ration(sub(0, false), 0.0, &demand, 1_000.0, 10.0);

    assert_eq!(outcome.total_volume(), 0.0);
    assert_eq!(outcome.realized_depth, vec![0.0]);
    assert!((outcome.crop_unmet[0] - 50.0).abs() < 1e-9);
}

#[test]
fn groundwater_is_capped_by_well_capacity() {
    // 10 mm over 100 ha = 10 000 m³, far more than two wells lift.
    let demand = [
        CropDemand { requested_depth: 10.0, crop_area: 600_000.0 },
        CropDemand { requested_depth: 10.0, crop_area: 400_000.0 },
    ];
    let outcome = rationer().ration(sub(1, true), 2.0, &demand, 100.0, 10.0);

    let capacity = 2.0 * max_groundwater_supply(12.0, 7.5, 10.0);
    assert_eq!(outcome.canal_volume, 100.0);
    assert!((outcome.groundwater_volume - capacity).abs() < 1e-6);
    assert!(outcome.total_volume() <= 100.0 + capacity + 1e-9);

    // Shared by demand share; every crop gets the same depth.
    assert!((outcome.crop_volume[0] / outcome.crop_volume[1] - 1.5).abs() < 1e-9);
    assert!((outcome.realized_depth[0] - outcome.realized_depth[1]).abs() < 1e-9);

    let total_demand = 10_000.0;
    let served: f64 = outcome.crop_volume.iter().sum();
    let unmet: f64 = outcome.crop_unmet.iter().sum();
    assert!((served - outcome.total_volume()).abs() < 1e-9);
    assert!((served + unmet - total_demand).abs() < 1e-6);
    assert!(outcome.realized_depth.iter().all(|d| *d <= 10.0));
}

#[test]
fn crops_without_area_get_nothing() {
    let demand = [
        CropDemand { requested_depth: 8.0, crop_area: 0.0 },
        CropDemand { requested_depth: 4.0, crop_area: 10_000.0 },
    ];
    let outcome = rationer().ration(sub(1, true), 1.0, &demand, 500.0, 10.0);

    assert_eq!(outcome.crop_volume[0], 0.0);
    assert_eq!(outcome.realized_depth[0], 0.0);
    assert!((outcome.realized_depth[1] - 4.0).abs() < 1e-9);
    // Canal delivery never exceeds demand.
    assert!((outcome.canal_volume - 40.0).abs() < 1e-9);
}

#[test]
fn canal_feed_is_split_by_demand() {
    // Two categories, one well at most: indices 0..4 and 4..8.
    let layout = SubcategoryLayout::new(&[1, 1]);
    let demand = [30.0, 60.0, 0.0, 20.0, 10.0, 90.0, 5.0, 0.0];
    let allotments = canal_allotments(&layout, &demand, 100.0);

    for (s, sub) in layout.iter() {
        if !sub.has_canal {
            assert_eq!(allotments[s], 0.0);
        }
        assert!(allotments[s] <= demand[s] + 1e-9);
    }
    // Canal demand 60 + 20 + 90 = 170, so each gets 100/170 of its ask.
    assert!((allotments[1] - 60.0 * 100.0 / 170.0).abs() < 1e-9);
    assert!((allotments.iter().sum::<f64>() - 100.0).abs() < 1e-9);

    // A feed larger than demand is capped at demand.
    let plenty = canal_allotments(&layout, &demand, 1_000.0);
    assert!((plenty.iter().sum::<f64>() - 170.0).abs() < 1e-9);
}

#[test]
fn cell_canal_delivery_never_exceeds_the_feed() {
    let mut engine = build_one_cell("feed", SimConfig::default_test());
    let mut forcing = ConstantForcing {
        supply: supply(100.0, 0.0),
        requested_depth: 50.0,
        ..ConstantForcing::dry()
    };

    for _ in 0..10 {
        engine.tick(&mut forcing).unwrap();
        let daily = &engine.cells()[0].daily;
        let delivered: f64 = daily.canal_volume.iter().sum();
        // Demand far exceeds the feed, so all of it is used and no more.
        assert!((delivered - 100.0).abs() < 1e-6, "delivered {delivered}");
        for (s, sub) in engine.layout().iter() {
            if !sub.has_canal {
                assert_eq!(daily.canal_volume[s], 0.0);
            }
        }
    }
}

#[test]
fn diesel_cost_scales_with_depth_and_volume() {
    let params = SimConfig::default().pumping_cost;
    let cost = diesel_pump_cost(&params, 10.0, 100.0, 60.0);
    assert!((cost - 44.9787).abs() < 1e-3, "got {cost}");
    assert!(diesel_pump_cost(&params, 20.0, 100.0, 60.0) > cost);
    assert_eq!(diesel_pump_cost(&params, 10.0, 0.0, 60.0), 0.0);
}

#[test]
fn unmet_demand_accumulates_and_resets_on_the_first_day() {
    let mut config = SimConfig::default_test();
    // No savings, so nobody drills and the dry bracket stays populated.
    config.accounting.initial_savings_per_farm = 0.0;
    config.accounting.savings_rate = 0.0;
    let mut engine = build_one_cell("reset", config);
    let mut forcing = ConstantForcing::dry();

    // 2000 is a leap year: tick 366 is 31 December.
    engine.run_ticks(366, &mut forcing).unwrap();
    let cell = &engine.cells()[0];
    let dry_farms = engine.layout().index_of(0, 0, false);
    assert!(cell.farm_count[dry_farms] > 0.0);
    assert_eq!(cell.water[dry_farms].unmet_demand_days, 366);
    assert!(cell.water[dry_farms].cumulative_unmet_demand > 0.0);

    let events = engine.tick(&mut forcing).unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, SimEvent::WaterAccountsReset { cumulative_unmet_demand, .. } if *cumulative_unmet_demand > 0.0)));

    let cell = &engine.cells()[0];
    assert_eq!(cell.water[dry_farms].unmet_demand_days, 1);
}

#[test]
fn rationed_depth_is_never_above_the_request() {
    let mut engine = build_one_cell("clip", SimConfig::default_test());
    let mut forcing = ConstantForcing {
        supply: supply(5_000.0, 8.0),
        ..ConstantForcing::dry()
    };

    for _ in 0..20 {
        engine.tick(&mut forcing).unwrap();
        let daily = &engine.cells()[0].daily;
        for (realized, requested) in daily.realized_depth.iter().zip(&daily.requested_depth) {
            assert!(*realized <= *requested + 1e-12);
            assert!(*realized >= 0.0);
        }
    }
}

#[test]
fn reset_zeroes_every_tally() {
    let mut accounts = vec![
        CropWaterAccount { cumulative_unmet_demand: 12.5, unmet_demand_days: 3 },
        CropWaterAccount { cumulative_unmet_demand: 0.5, unmet_demand_days: 1 },
    ];
    let cleared = reset_water_accounts(&mut accounts);

    assert_eq!(cleared, 13.0);
    assert!(accounts.iter().all(|a| *a == CropWaterAccount::default()));
}
