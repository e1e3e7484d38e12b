//! Socio-economic core of a smallholder irrigation simulator.
//!
//! Per grid cell and per day, the core tracks how many farms of each
//! size category own how many tubewells, rations canal water and
//! groundwater against crop demand, keeps the farms' cash accounts,
//! and once a year lets farms that can afford it drill another well.
//! Soil physics and crop growth are external; they talk to the core
//! through the [`forcing::Forcing`] trait.

pub mod accounting_subsystem;
pub mod clock;
pub mod config;
pub mod distribution;
pub mod engine;
pub mod error;
pub mod event;
pub mod forcing;
pub mod income_subsystem;
pub mod investment_subsystem;
pub mod irrigation_subsystem;
pub mod ownership_subsystem;
pub mod rng;
pub mod snapshot;
pub mod state;
pub mod subcategory;
pub mod subsystem;
pub mod types;
