//! Snapshot serialization: full simulation state to/from JSON.
//!
//! A snapshot captures everything needed to resume a run from its
//! tick without replaying from tick 1. Where it is written is the
//! caller's business; the engine only produces and consumes it.

use crate::{
    clock::SimClock,
    error::SimResult,
    state::CellState,
    subcategory::SubcategoryLayout,
    types::{RunId, Tick},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SimSnapshot {
    pub run_id: RunId,
    pub tick:   Tick,
    pub seed:   u64,
    pub clock:  SimClock,
    pub layout: SubcategoryLayout,
    pub cells:  Vec<CellState>,
}

impl SimSnapshot {
    pub fn to_json(&self) -> SimResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    pub fn from_json(json: &str) -> SimResult<Self> {
        Ok(serde_json::from_str(json)?)
    }
}
