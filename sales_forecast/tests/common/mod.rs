#![allow(dead_code)]

use chrono::{Duration, NaiveDate};
use sales_forecast::data::{
    ItemCatalog, ItemInfo, PromoSchedule, ScheduleRecord, StoreCatalog, StoreInfo,
    TransactionLog, TransactionRecord,
};

pub fn date(s: &str) -> NaiveDate {
    s.parse().unwrap()
}

pub fn sale(day: &str, store_nbr: u32, item_nbr: u64, unit_sales: f64, onpromotion: bool) -> TransactionRecord {
    TransactionRecord {
        date: date(day),
        store_nbr,
        item_nbr,
        unit_sales,
        onpromotion,
    }
}

pub fn scheduled(id: u64, day: NaiveDate, store_nbr: u32, item_nbr: u64, onpromotion: bool) -> ScheduleRecord {
    ScheduleRecord {
        id: Some(id),
        date: day,
        store_nbr,
        item_nbr,
        onpromotion,
    }
}

pub fn item(item_nbr: u64, family: &str, class: u32, perishable: bool) -> ItemInfo {
    ItemInfo {
        item_nbr,
        family: family.to_string(),
        class,
        perishable,
    }
}

pub fn store(store_nbr: u32, city: &str, state: &str, store_type: &str, cluster: u32) -> StoreInfo {
    StoreInfo {
        store_nbr,
        city: city.to_string(),
        state: state.to_string(),
        store_type: store_type.to_string(),
        cluster,
    }
}

/// Items 101 (GROCERY I) and 102 (DAIRY, perishable)
pub fn items() -> ItemCatalog {
    ItemCatalog::new(vec![
        item(101, "GROCERY I", 1040, false),
        item(102, "DAIRY", 2712, true),
    ])
}

/// Stores 1 (Pichincha) and 2 (Guayas)
pub fn stores() -> StoreCatalog {
    StoreCatalog::new(vec![
        store(1, "Quito", "Pichincha", "D", 13),
        store(2, "Guayaquil", "Guayas", "A", 17),
    ])
}

pub const HISTORY_START: &str = "2017-01-01";

/// Deterministic unit sales of one (store, item) pair on day `d`
pub fn units(store_nbr: u32, item_nbr: u64, d: i64) -> f64 {
    ((store_nbr as i64 * 7 + item_nbr as i64 * 3 + d) % 5) as f64
}

/// `days` days of sales for stores {1, 2} and items {101, 102}, no promotions
pub fn deterministic_history(days: i64) -> TransactionLog {
    let start = date(HISTORY_START);
    let mut records = Vec::new();
    for d in 0..days {
        for store_nbr in [1, 2] {
            for item_nbr in [101, 102] {
                records.push(TransactionRecord {
                    date: start + Duration::days(d),
                    store_nbr,
                    item_nbr,
                    unit_sales: units(store_nbr, item_nbr, d),
                    onpromotion: false,
                });
            }
        }
    }
    TransactionLog::new(records)
}

/// 16 scheduled days from `anchor` for the same four pairs, no promotions
pub fn horizon_schedule(anchor: NaiveDate) -> PromoSchedule {
    let mut records = Vec::new();
    let mut id = 0;
    for h in 0..16 {
        for store_nbr in [1, 2] {
            for item_nbr in [101, 102] {
                records.push(scheduled(id, anchor + Duration::days(h), store_nbr, item_nbr, false));
                id += 1;
            }
        }
    }
    PromoSchedule::new(records)
}
