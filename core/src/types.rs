//! Shared primitive types used across the entire simulation.

/// A simulation tick. One tick = one simulated day.
pub type Tick = u64;

/// Index of a grid cell in the run's cell list.
pub type CellId = usize;

/// Index of a farm-size category (smallholder, medium, large, ...).
pub type CategoryId = usize;

/// Index into the ordered subcategory list of a run.
pub type SubcategoryIndex = usize;

/// The canonical run identifier.
pub type RunId = String;
