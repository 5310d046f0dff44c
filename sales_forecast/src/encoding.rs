//! Categorical group ids for matrix rows
//!
//! Every row of the sales matrix is assigned one group id per
//! [`GroupAxis`]. Ids number the distinct labels of an axis in ascending
//! order starting from zero, so the encoding only depends on the set of rows
//! and the catalogs, never on input order.

use crate::data::{ItemCatalog, StoreCatalog};
use crate::error::{ForecastError, Result};
use crate::reshape::RowKey;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::fmt;
use std::str::FromStr;
use tracing::{info, warn};

/// Label used for rows whose item or store is missing from its catalog
pub const UNKNOWN_LABEL: &str = "UNKNOWN";

/// Dense id of a group within one axis
pub type GroupId = u32;

/// Attribute along which rows are grouped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GroupAxis {
    Class,
    Family,
    Item,
    Store,
    State,
    City,
    Type,
    Cluster,
}

impl GroupAxis {
    /// Every axis, in the order used for feature names
    pub const ALL: [GroupAxis; 8] = [
        GroupAxis::Class,
        GroupAxis::Family,
        GroupAxis::Item,
        GroupAxis::Store,
        GroupAxis::State,
        GroupAxis::City,
        GroupAxis::Type,
        GroupAxis::Cluster,
    ];

    /// Name of the axis as used in feature names and configuration
    pub fn name(&self) -> &'static str {
        match self {
            GroupAxis::Class => "class",
            GroupAxis::Family => "family",
            GroupAxis::Item => "item",
            GroupAxis::Store => "store",
            GroupAxis::State => "state",
            GroupAxis::City => "city",
            GroupAxis::Type => "type",
            GroupAxis::Cluster => "cluster",
        }
    }

    fn position(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for GroupAxis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for GroupAxis {
    type Err = ForecastError;

    fn from_str(s: &str) -> Result<Self> {
        GroupAxis::ALL
            .iter()
            .copied()
            .find(|axis| axis.name() == s)
            .ok_or_else(|| ForecastError::InvalidParameter(format!("Unknown grouping axis: {}", s)))
    }
}

/// Value a row takes along one axis.
///
/// Ordering puts numeric ids first (numerically), then names (lexically),
/// then the unknown label.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum GroupLabel {
    Id(u64),
    Name(String),
    Unknown,
}

impl fmt::Display for GroupLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupLabel::Id(id) => write!(f, "{}", id),
            GroupLabel::Name(name) => f.write_str(name),
            GroupLabel::Unknown => f.write_str(UNKNOWN_LABEL),
        }
    }
}

/// Group ids of a single row, one per axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RowGroups {
    ids: [GroupId; 8],
}

impl RowGroups {
    /// Group id along `axis`
    pub fn get(&self, axis: GroupAxis) -> GroupId {
        self.ids[axis.position()]
    }
}

/// Read-only group assignment for every matrix row
#[derive(Debug, Clone)]
pub struct CategoricalGroupings {
    rows: Vec<RowKey>,
    groups: HashMap<RowKey, RowGroups>,
    labels: [Vec<GroupLabel>; 8],
    class_family: BTreeMap<GroupId, GroupId>,
}

impl CategoricalGroupings {
    /// Row keys in the order they were encoded
    pub fn rows(&self) -> &[RowKey] {
        &self.rows
    }

    /// Number of encoded rows
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Check if no rows were encoded
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// All group ids of a row
    pub fn row_groups(&self, key: &RowKey) -> Option<&RowGroups> {
        self.groups.get(key)
    }

    /// Group id of a row along one axis
    pub fn group(&self, key: &RowKey, axis: GroupAxis) -> Option<GroupId> {
        self.groups.get(key).map(|g| g.get(axis))
    }

    /// Number of distinct groups along an axis
    pub fn n_groups(&self, axis: GroupAxis) -> usize {
        self.labels[axis.position()].len()
    }

    /// Label behind a group id
    pub fn label(&self, axis: GroupAxis, id: GroupId) -> Option<&GroupLabel> {
        self.labels[axis.position()].get(id as usize)
    }

    /// Family group of a class group
    pub fn family_of_class(&self, class: GroupId) -> Option<GroupId> {
        self.class_family.get(&class).copied()
    }

    /// Class group to family group lookup
    pub fn class_families(&self) -> &BTreeMap<GroupId, GroupId> {
        &self.class_family
    }
}

/// Encode every row along every axis.
///
/// Items or stores absent from their catalog fall under [`GroupLabel::Unknown`]
/// for the catalog-derived axes; the item and store axes always use the row's
/// own numbers.
pub fn encode(rows: &[RowKey], items: &ItemCatalog, stores: &StoreCatalog) -> CategoricalGroupings {
    let mut missing_items = BTreeSet::new();
    let mut missing_stores = BTreeSet::new();

    let row_labels: Vec<[GroupLabel; 8]> = rows
        .iter()
        .map(|key| {
            let item = items.get(key.item);
            let store = stores.get(key.store);
            if item.is_none() {
                missing_items.insert(key.item);
            }
            if store.is_none() {
                missing_stores.insert(key.store);
            }

            [
                item.map_or(GroupLabel::Unknown, |i| GroupLabel::Id(i.class as u64)),
                item.map_or(GroupLabel::Unknown, |i| GroupLabel::Name(i.family.clone())),
                GroupLabel::Id(key.item),
                GroupLabel::Id(key.store as u64),
                store.map_or(GroupLabel::Unknown, |s| GroupLabel::Name(s.state.clone())),
                store.map_or(GroupLabel::Unknown, |s| GroupLabel::Name(s.city.clone())),
                store.map_or(GroupLabel::Unknown, |s| GroupLabel::Name(s.store_type.clone())),
                store.map_or(GroupLabel::Unknown, |s| GroupLabel::Id(s.cluster as u64)),
            ]
        })
        .collect();

    if !missing_items.is_empty() {
        warn!("{} items missing from the item catalog", missing_items.len());
    }
    if !missing_stores.is_empty() {
        warn!("{} stores missing from the store catalog", missing_stores.len());
    }

    let labels: [Vec<GroupLabel>; 8] = std::array::from_fn(|axis| {
        row_labels
            .iter()
            .map(|labels| labels[axis].clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    });
    let (groups, class_family) = {
        let codes: [HashMap<&GroupLabel, GroupId>; 8] = std::array::from_fn(|axis| {
            labels[axis]
                .iter()
                .enumerate()
                .map(|(id, label)| (label, id as GroupId))
                .collect()
        });

        let mut groups = HashMap::with_capacity(rows.len());
        let mut class_family = BTreeMap::new();
        for (key, labels_of_row) in rows.iter().zip(row_labels.iter()) {
            let ids: [GroupId; 8] =
                std::array::from_fn(|axis| codes[axis][&labels_of_row[axis]]);
            let row_groups = RowGroups { ids };
            // First item of a class in row order decides its family
            class_family
                .entry(row_groups.get(GroupAxis::Class))
                .or_insert(row_groups.get(GroupAxis::Family));
            groups.insert(*key, row_groups);
        }
        (groups, class_family)
    };

    info!(
        "Encoded {} rows: {} classes, {} families, {} stores",
        rows.len(),
        labels[GroupAxis::Class.position()].len(),
        labels[GroupAxis::Family.position()].len(),
        labels[GroupAxis::Store.position()].len()
    );

    CategoricalGroupings {
        rows: rows.to_vec(),
        groups,
        labels,
        class_family,
    }
}
