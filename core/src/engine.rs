//! The simulation engine: one call per simulated day.
//!
//! EXECUTION ORDER (fixed, documented, never reordered), per cell:
//!   1. Ownership subsystem    (irrigated / rainfed area)
//!   2. Irrigation subsystem   (canal + groundwater rationing)
//!   3. Income subsystem       (crop income for the rationed depth)
//!   4. Accounting subsystem   (daily credit; year-end settlement)
//!   5. Investment subsystem   (year-end tubewell installation)
//!
//! RULES:
//!   - Each tick reads the prior tick's complete state.
//!   - Cells are independent; a cell's state is exclusively borrowed
//!     while its subsystems run.
//!   - Settlement always precedes investment on the last day of the
//!     agricultural year.
//!   - The core never samples; randomness lives in the forcing.

use crate::{
    accounting_subsystem::AccountLedger,
    clock::SimClock,
    config::SimConfig,
    error::{SimError, SimResult},
    event::SimEvent,
    forcing::Forcing,
    income_subsystem::IncomeTracker,
    investment_subsystem::InvestmentEngine,
    irrigation_subsystem::IrrigationRationer,
    ownership_subsystem::OwnershipTracker,
    snapshot::SimSnapshot,
    state::{CategorySetup, CellSetup, CellState},
    subcategory::SubcategoryLayout,
    subsystem::{DayContext, SimSubsystem},
    types::{RunId, Tick},
};

pub struct SimEngine {
    pub run_id: RunId,
    pub clock:  SimClock,
    seed:       u64,
    config:     SimConfig,
    layout:     SubcategoryLayout,
    cells:      Vec<CellState>,
    subsystems: Vec<Box<dyn SimSubsystem>>,
}

impl SimEngine {
    /// Build a fully wired engine: validate configuration, lay out the
    /// subcategories, initialize every cell and register the subsystems.
    ///
    /// `seed` is recorded with the run and in snapshots; the core itself
    /// does not draw from it.
    pub fn build(
        run_id: RunId,
        seed: u64,
        config: SimConfig,
        cells: &[CellSetup],
    ) -> SimResult<Self> {
        config.validate()?;
        let layout = SubcategoryLayout::new(&config.max_tubewells());
        let states = cells
            .iter()
            .enumerate()
            .map(|(id, setup)| CellState::initialize(id, setup, &layout, &config))
            .collect::<SimResult<Vec<_>>>()?;

        let clock = SimClock::new(
            run_id.clone(),
            config.calendar.start_date,
            config.calendar.start_of_agricultural_year,
        );
        Ok(Self::assemble(run_id, seed, config, layout, clock, states))
    }

    /// Engine over two small test cells with `SimConfig::default_test()`.
    pub fn build_test(run_id: RunId, seed: u64) -> SimResult<Self> {
        Self::build(run_id, seed, SimConfig::default_test(), &test_cells())
    }

    /// Resume a run from a snapshot. The configuration must describe
    /// the same subcategory layout and crop count as the snapshot, and
    /// every cell must match that layout.
    pub fn restore(config: SimConfig, snapshot: SimSnapshot) -> SimResult<Self> {
        config.validate()?;
        let layout = SubcategoryLayout::new(&config.max_tubewells());
        if layout != snapshot.layout {
            return Err(SimError::config(
                "categories",
                "well ceilings differ from the snapshot's subcategory layout",
            ));
        }
        if let Some(cell) = snapshot.cells.iter().find(|c| c.crop_count != config.crop_count()) {
            return Err(SimError::config(
                "crops",
                format!(
                    "snapshot cell {} tracks {} crops, configuration defines {}",
                    cell.cell_id,
                    cell.crop_count,
                    config.crop_count()
                ),
            ));
        }
        for cell in &snapshot.cells {
            cell.check_shape(&layout)?;
        }
        log::info!(
            "restoring run {} at tick {} with {} cells",
            snapshot.run_id,
            snapshot.tick,
            snapshot.cells.len()
        );
        Ok(Self::assemble(
            snapshot.run_id,
            snapshot.seed,
            config,
            layout,
            snapshot.clock,
            snapshot.cells,
        ))
    }

    fn assemble(
        run_id: RunId,
        seed: u64,
        config: SimConfig,
        layout: SubcategoryLayout,
        clock: SimClock,
        cells: Vec<CellState>,
    ) -> Self {
        let mut engine = Self {
            run_id,
            clock,
            seed,
            layout,
            cells,
            subsystems: Vec::new(),
            config,
        };

        // EXECUTION ORDER: fixed, documented, never reordered.
        engine.register(Box::new(OwnershipTracker::new()));
        engine.register(Box::new(IrrigationRationer::new(
            engine.config.tubewell.clone(),
            engine.config.pumping_cost.clone(),
        )));
        engine.register(Box::new(IncomeTracker::new()));
        engine.register(Box::new(AccountLedger::new(engine.config.accounting.clone())));
        engine.register(Box::new(InvestmentEngine::new(
            engine.config.tubewell.clone(),
            engine.config.investment.clone(),
        )));
        engine
    }

    fn register(&mut self, subsystem: Box<dyn SimSubsystem>) {
        self.subsystems.push(subsystem);
    }

    /// Advance one tick. This is the core simulation step.
    pub fn tick(&mut self, forcing: &mut dyn Forcing) -> SimResult<Vec<SimEvent>> {
        let day = self.clock.advance();
        let mut tick_events = vec![SimEvent::TickStarted { tick: day.tick }];

        if day.is_first_day_of_year {
            log::info!("tick={} agricultural year starts on {}", day.tick, day.date);
            tick_events.push(SimEvent::AgriculturalYearStarted {
                tick: day.tick,
                date: day.date,
            });
        }

        let mut ctx = DayContext {
            day,
            layout: &self.layout,
            forcing,
        };
        for cell in &mut self.cells {
            for subsystem in &mut self.subsystems {
                let new_events = subsystem.update(&mut ctx, cell)?;
                tick_events.extend(new_events);
            }
        }

        tick_events.push(SimEvent::TickCompleted { tick: day.tick });
        Ok(tick_events)
    }

    /// Run n ticks in a loop. Returns every event emitted.
    pub fn run_ticks(&mut self, n: u64, forcing: &mut dyn Forcing) -> SimResult<Vec<SimEvent>> {
        let mut events = Vec::new();
        if self.clock.current_tick == 0 {
            events.push(SimEvent::RunInitialized {
                run_id: self.run_id.clone(),
                seed: self.seed,
                cells: self.cells.len(),
                farms: self.cells.iter().flat_map(|c| c.farm_count.iter()).sum(),
            });
        }
        for _ in 0..n {
            events.extend(self.tick(forcing)?);
        }
        Ok(events)
    }

    pub fn snapshot(&self) -> SimSnapshot {
        SimSnapshot {
            run_id: self.run_id.clone(),
            tick:   self.clock.current_tick,
            seed:   self.seed,
            clock:  self.clock.clone(),
            layout: self.layout.clone(),
            cells:  self.cells.clone(),
        }
    }

    pub fn current_tick(&self) -> Tick {
        self.clock.current_tick
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn layout(&self) -> &SubcategoryLayout {
        &self.layout
    }

    pub fn cells(&self) -> &[CellState] {
        &self.cells
    }

    /// Mutable access for callers that own checkpointing or scenario edits.
    pub fn cells_mut(&mut self) -> &mut [CellState] {
        &mut self.cells
    }
}

/// Two cells: a mixed landscape and one where the large category is empty.
fn test_cells() -> Vec<CellSetup> {
    vec![
        CellSetup {
            categories: vec![
                CategorySetup {
                    farm_area: 10_000.0,
                    category_area: 500_000.0,
                    canal_access_fraction: 0.4,
                    tubewell_ownership_rate: 0.5,
                },
                CategorySetup {
                    farm_area: 50_000.0,
                    category_area: 1_000_000.0,
                    canal_access_fraction: 0.6,
                    tubewell_ownership_rate: 1.2,
                },
            ],
        },
        CellSetup {
            categories: vec![
                CategorySetup {
                    farm_area: 8_000.0,
                    category_area: 236_000.0,
                    canal_access_fraction: 0.1,
                    tubewell_ownership_rate: 0.2,
                },
                CategorySetup {
                    farm_area: 0.0,
                    category_area: 0.0,
                    canal_access_fraction: 0.0,
                    tubewell_ownership_rate: 0.0,
                },
            ],
        },
    ]
}
