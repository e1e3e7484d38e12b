//! Farm subcategories: the (category × well count × canal access) strata.
//!
//! Layout: categories are concatenated; inside a category the
//! subcategory with `w` wells and canal flag `canal` sits at
//! `2·w + canal`. The next well bracket in the same canal branch is
//! therefore always two slots further on.
//!
//! The builder runs once per cell at initialization:
//!   1. truncated, renormalized Poisson masses over well counts
//!   2. split by canal access (independent of ownership)
//!   3. scale to fractional farm counts
//!   4. largest-remainder rounding to the category's integer total

use crate::{
    distribution::{safe_div, truncated_poisson},
    state::CategorySetup,
    types::{CategoryId, SubcategoryIndex},
};
use serde::{Deserialize, Serialize};
use std::ops::Range;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Subcategory {
    pub category:  CategoryId,
    pub wells:     u32,
    pub has_canal: bool,
}

impl Subcategory {
    pub fn has_irrigation(&self) -> bool {
        self.has_canal || self.wells > 0
    }
}

/// The ordered subcategory list shared by every cell of a run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubcategoryLayout {
    subcategories:   Vec<Subcategory>,
    category_ranges: Vec<Range<usize>>,
    max_tubewells:   Vec<u32>,
}

impl SubcategoryLayout {
    pub fn new(max_tubewells: &[u32]) -> Self {
        let mut subcategories = Vec::new();
        let mut category_ranges = Vec::with_capacity(max_tubewells.len());
        for (category, &max_wells) in max_tubewells.iter().enumerate() {
            let start = subcategories.len();
            for wells in 0..=max_wells {
                for has_canal in [false, true] {
                    subcategories.push(Subcategory { category, wells, has_canal });
                }
            }
            category_ranges.push(start..subcategories.len());
        }
        Self {
            subcategories,
            category_ranges,
            max_tubewells: max_tubewells.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.subcategories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.subcategories.is_empty()
    }

    pub fn category_count(&self) -> usize {
        self.category_ranges.len()
    }

    pub fn get(&self, index: SubcategoryIndex) -> Subcategory {
        self.subcategories[index]
    }

    pub fn iter(&self) -> impl Iterator<Item = (SubcategoryIndex, Subcategory)> + '_ {
        self.subcategories.iter().copied().enumerate()
    }

    pub fn category_range(&self, category: CategoryId) -> Range<usize> {
        self.category_ranges[category].clone()
    }

    pub fn max_tubewells(&self, category: CategoryId) -> u32 {
        self.max_tubewells[category]
    }

    pub fn index_of(&self, category: CategoryId, wells: u32, has_canal: bool) -> SubcategoryIndex {
        self.category_ranges[category].start + 2 * wells as usize + usize::from(has_canal)
    }

    /// Subcategory one well bracket up, same category and canal branch.
    /// None when the source already sits at the category's ceiling.
    pub fn next_bracket(&self, index: SubcategoryIndex) -> Option<SubcategoryIndex> {
        let sub = self.subcategories[index];
        if sub.wells >= self.max_tubewells[sub.category] {
            return None;
        }
        Some(index + 2)
    }
}

/// Builds initial farm counts per subcategory for one cell.
pub struct SubcategoryBuilder<'a> {
    layout: &'a SubcategoryLayout,
}

impl<'a> SubcategoryBuilder<'a> {
    pub fn new(layout: &'a SubcategoryLayout) -> Self {
        Self { layout }
    }

    /// Farm counts over the whole layout for one cell.
    /// `categories` must hold one entry per layout category.
    pub fn build(&self, categories: &[CategorySetup]) -> Vec<f64> {
        let mut counts = vec![0.0; self.layout.len()];
        for (category, setup) in categories.iter().enumerate() {
            let range = self.layout.category_range(category);
            let category_counts = self.category_counts(setup, self.layout.max_tubewells(category));
            counts[range].copy_from_slice(&category_counts);
        }
        counts
    }

    /// Integer farm counts for one category, ordered `2·w + canal`.
    pub fn category_counts(&self, setup: &CategorySetup, max_tubewells: u32) -> Vec<f64> {
        let ownership = truncated_poisson(setup.tubewell_ownership_rate, max_tubewells);
        let canal = setup.canal_access_fraction.clamp(0.0, 1.0);

        let mut fractional = Vec::with_capacity(ownership.len() * 2);
        for mass in &ownership {
            for weight in [1.0 - canal, canal] {
                let share_area = mass * weight * setup.category_area;
                fractional.push(safe_div(share_area, setup.farm_area).max(0.0));
            }
        }

        largest_remainder(&fractional, setup.farm_total())
    }
}

/// Round `values` to integers summing exactly to `target`.
///
/// Floors every value, then hands the `target − Σfloor` leftover units
/// to the entries with the largest fractional remainders; equal
/// remainders go to the lower index first.
pub fn largest_remainder(values: &[f64], target: u64) -> Vec<f64> {
    if values.is_empty() {
        return Vec::new();
    }

    let floors: Vec<f64> = values.iter().map(|v| v.max(0.0).floor()).collect();
    let floor_sum: f64 = floors.iter().sum();
    let mut residual = (target as f64 - floor_sum).max(0.0) as usize;

    let mut order: Vec<usize> = (0..values.len()).collect();
    // Stable sort keeps index order for ties.
    order.sort_by(|&a, &b| {
        let ra = values[a].max(0.0) - floors[a];
        let rb = values[b].max(0.0) - floors[b];
        rb.partial_cmp(&ra).unwrap_or(std::cmp::Ordering::Equal)
    });

    let mut rounded = floors;
    // A residual larger than the entry count only happens with
    // inconsistent inputs; keep cycling so the total still matches.
    while residual > 0 {
        for &i in order.iter().take(residual) {
            rounded[i] += 1.0;
        }
        residual = residual.saturating_sub(order.len());
    }
    rounded
}
