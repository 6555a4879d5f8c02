//! Selection defaults. Turns raw widget values into the explicit value sets
//! handed to the Filter Engine.
//!
//! An empty user selection means "use the default set". That substitution
//! happens here and nowhere else; the Filter Engine treats an empty set as
//! "match nothing".

use crate::aggregate::top_n_by_frequency;
use chrono::{DateTime, Utc};
use sales_core::types::{DashboardVariant, Dataset, Dimension, DimensionKey, FilterCriteria};
use serde::{Deserialize, Serialize};

/// Values as picked in the sidebar. Empty lists mean "no explicit choice".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSelection {
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub stores: Vec<String>,
    #[serde(default)]
    pub brands: Vec<String>,
    /// How many of the most frequent categories (or brands) form the default set.
    #[serde(default)]
    pub top_n: Option<usize>,
}

/// Option lists for the selection widgets, derived from the full dataset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectionDefaults {
    pub top_categories: Vec<String>,
    /// Every store, most frequent first.
    pub stores: Vec<String>,
    pub top_brands: Vec<String>,
    /// Every brand, in order of first appearance.
    pub brands: Vec<String>,
    pub category_count: usize,
    pub store_count: usize,
    pub brand_count: usize,
}

impl SelectionDefaults {
    pub fn from_dataset(dataset: &Dataset, top_n: usize) -> Self {
        let brands = labels(dataset.distinct(Dimension::Brand));
        let category_count = dataset.distinct(Dimension::Category).len();
        let stores = labels(top_n_by_frequency(dataset, Dimension::Store, usize::MAX));
        Self {
            top_categories: labels(top_n_by_frequency(dataset, Dimension::Category, top_n)),
            store_count: stores.len(),
            stores,
            top_brands: labels(top_n_by_frequency(dataset, Dimension::Brand, top_n)),
            brand_count: brands.len(),
            brands,
            category_count,
        }
    }
}

/// The value sets actually in force for one analysis.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "variant", rename_all = "snake_case")]
pub enum ActiveSelection {
    CategoryStore {
        categories: Vec<String>,
        stores: Vec<String>,
    },
    Brand {
        brands: Vec<String>,
    },
}

impl ActiveSelection {
    /// Values of the variant's primary dimension.
    pub fn primary_values(&self) -> &[String] {
        match self {
            ActiveSelection::CategoryStore { categories, .. } => categories,
            ActiveSelection::Brand { brands } => brands,
        }
    }

    pub fn criteria(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> FilterCriteria {
        let criteria = FilterCriteria::between(start, end);
        match self {
            ActiveSelection::CategoryStore { categories, stores } => criteria
                .allow(Dimension::Category, categories)
                .allow(Dimension::Store, stores),
            ActiveSelection::Brand { brands } => criteria.allow(Dimension::Brand, brands),
        }
    }
}

/// Substitute defaults for every dimension the user left empty.
pub fn resolve(
    variant: DashboardVariant,
    user: &UserSelection,
    defaults: &SelectionDefaults,
) -> ActiveSelection {
    match variant {
        DashboardVariant::CategoryStore => ActiveSelection::CategoryStore {
            categories: or_default(&user.categories, &defaults.top_categories),
            stores: or_default(&user.stores, &defaults.stores),
        },
        DashboardVariant::Brand => ActiveSelection::Brand {
            brands: or_default(&user.brands, &defaults.brands),
        },
    }
}

fn or_default(chosen: &[String], default: &[String]) -> Vec<String> {
    if chosen.is_empty() {
        default.to_vec()
    } else {
        chosen.to_vec()
    }
}

fn labels(keys: Vec<DimensionKey>) -> Vec<String> {
    keys.iter()
        .filter_map(|k| k.as_label().map(str::to_string))
        .collect()
}
