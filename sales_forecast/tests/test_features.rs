mod common;

use approx::assert_abs_diff_eq;
use chrono::Duration;
use common::{date, deterministic_history, item, items, sale, scheduled, store, stores, HISTORY_START};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use rstest::rstest;
use sales_forecast::data::{ItemCatalog, PromoSchedule, StoreCatalog, TransactionLog};
use sales_forecast::encoding::{encode, GroupAxis};
use sales_forecast::error::ForecastError;
use sales_forecast::features::{
    FeatureConfig, FeatureExtractor, FeaturePlan, FeatureTable, Granularity, Normalization,
    PromoFeatureDef, PromoSpan, SalesFeatureDef, SalesStatistic,
};
use sales_forecast::pipeline::PreparedData;
use sales_forecast::reshape::RowKey;

const SERIES: [f64; 5] = [0.0, 1.0, 2.0, 0.0, 4.0];

#[rstest]
#[case::mean(SalesStatistic::Mean, 3, 2.0)]
#[case::decay_mean(SalesStatistic::DecayMean { decay: 0.5 }, 3, 4.5 / 1.75)]
#[case::median(SalesStatistic::Median, 3, 2.0)]
#[case::min(SalesStatistic::Min, 3, 0.0)]
#[case::max(SalesStatistic::Max, 3, 4.0)]
#[case::std(SalesStatistic::Std, 3, (8.0f64 / 3.0).sqrt())]
#[case::sale_days(SalesStatistic::SaleDays, 5, 3.0)]
#[case::last_sale_age(SalesStatistic::LastSaleAge, 5, 1.0)]
#[case::first_sale_age(SalesStatistic::FirstSaleAge, 5, 4.0)]
fn test_sales_statistic(#[case] statistic: SalesStatistic, #[case] window: usize, #[case] expected: f64) {
    let def = SalesFeatureDef::new(Granularity::ItemStore, window, statistic);
    assert_abs_diff_eq!(def.evaluate(&SERIES, 5).unwrap(), expected, epsilon = 1e-12);
}

#[test]
fn test_sale_ages_without_sales() {
    let series = [0.0; 10];
    let last = SalesFeatureDef::new(Granularity::ItemStore, 7, SalesStatistic::LastSaleAge);
    let first = SalesFeatureDef::new(Granularity::ItemStore, 7, SalesStatistic::FirstSaleAge);

    assert_eq!(last.evaluate(&series, 10).unwrap(), 7.0);
    assert_eq!(first.evaluate(&series, 10).unwrap(), 7.0);
}

#[test]
fn test_sale_ages_without_sales_are_capped_by_history() {
    let series = [0.0; 30];

    for statistic in [SalesStatistic::LastSaleAge, SalesStatistic::FirstSaleAge] {
        let wide = SalesFeatureDef::new(Granularity::ItemStore, 140, statistic);
        let exact = SalesFeatureDef::new(Granularity::ItemStore, 30, statistic);
        assert_eq!(wide.evaluate(&series, 30).unwrap(), 30.0);
        assert_eq!(exact.evaluate(&series, 30).unwrap(), 30.0);
    }
}

#[test]
fn test_weekday_mean() {
    let series: Vec<f64> = (0..28).map(|d| d as f64).collect();

    let same_day = SalesFeatureDef::new(Granularity::ItemStore, 4, SalesStatistic::WeekdayMean { offset: 0 });
    // Days 21, 14, 7 and 0
    assert_abs_diff_eq!(same_day.evaluate(&series, 28).unwrap(), 10.5, epsilon = 1e-12);

    let two_ahead = SalesFeatureDef::new(Granularity::ItemStore, 2, SalesStatistic::WeekdayMean { offset: 2 });
    // Days 23 and 16
    assert_abs_diff_eq!(two_ahead.evaluate(&series, 28).unwrap(), 19.5, epsilon = 1e-12);
}

#[test]
fn test_sales_features_ignore_days_from_anchor() {
    let def = SalesFeatureDef::new(Granularity::ItemStore, 7, SalesStatistic::Mean);
    let mut series = vec![1.0; 20];
    let before = def.evaluate(&series, 10).unwrap();
    for value in series.iter_mut().skip(10) {
        *value = 100.0;
    }
    assert_eq!(def.evaluate(&series, 10).unwrap(), before);
}

#[test]
fn test_anchor_after_history_end_counts_gap_days_as_zero() {
    // 2017-01-01 is a Sunday; only Sundays sell
    let history = TransactionLog::new(
        (0..28)
            .map(|d| {
                let day = date("2017-01-01") + Duration::days(d);
                sale(&day.to_string(), 1, 101, if d % 7 == 0 { 10.0 } else { 0.0 }, false)
            })
            .collect(),
    );
    let prepared = PreparedData::new(&history, &PromoSchedule::empty(), &items(), &stores()).unwrap();
    let plan = FeaturePlan::new(
        vec![
            SalesFeatureDef::new(Granularity::ItemStore, 4, SalesStatistic::WeekdayMean { offset: 0 }),
            SalesFeatureDef::new(Granularity::ItemStore, 10, SalesStatistic::Mean),
            SalesFeatureDef::new(Granularity::ItemStore, 10, SalesStatistic::LastSaleAge),
        ],
        vec![PromoFeatureDef::sum(Granularity::ItemStore, PromoSpan::Before(14))],
    )
    .unwrap();
    let extractor = FeatureExtractor::new(plan);

    let sunday = extractor
        .sales(&prepared.data, &prepared.groupings, date("2017-01-29"))
        .unwrap();
    assert_abs_diff_eq!(sunday.column("item_store_dow0_mean_4w").unwrap()[0], 11.0f64.ln(), epsilon = 1e-12);

    let wednesday = extractor
        .sales(&prepared.data, &prepared.groupings, date("2017-02-01"))
        .unwrap();
    assert_eq!(wednesday.column("item_store_dow0_mean_4w").unwrap(), &[0.0]);
    // Jan 22..28 plus the unrecorded Jan 29..31, whose Sunday counts as no sale
    assert_abs_diff_eq!(wednesday.column("item_store_mean_10").unwrap()[0], 11.0f64.ln() / 10.0, epsilon = 1e-12);
    assert_eq!(wednesday.column("item_store_last_sale_age_10").unwrap(), &[10.0]);

    let promo = extractor
        .promo(&prepared.data, &prepared.groupings, date("2017-02-01"))
        .unwrap();
    assert_eq!(promo.column("promo_sum_before_14").unwrap(), &[0.0]);
}

#[test]
fn test_feature_names() {
    let mean = SalesFeatureDef::new(Granularity::ItemStore, 30, SalesStatistic::Mean);
    let dow = SalesFeatureDef::new(Granularity::StoreClass, 20, SalesStatistic::WeekdayMean { offset: 6 });
    assert_eq!(mean.name, "item_store_mean_30");
    assert_eq!(dow.name, "store_class_dow6_mean_20w");

    assert_eq!(PromoFeatureDef::sum(Granularity::ItemStore, PromoSpan::Before(14)).name, "promo_sum_before_14");
    assert_eq!(PromoFeatureDef::sum(Granularity::ItemStore, PromoSpan::Day(3)).name, "promo_day_3");
    assert_eq!(
        PromoFeatureDef::group_mean(Granularity::ItemStore, PromoSpan::After(16), GroupAxis::Class).name,
        "promo_class_mean_after_16"
    );
    assert_eq!(PromoFeatureDef::sum(Granularity::Item, PromoSpan::After(16)).name, "item_promo_sum_after_16");
}

#[test]
fn test_default_plan() {
    let plan = FeaturePlan::from_config(&FeatureConfig::default()).unwrap();

    // 36 window statistics, 15 sale-day statistics, 14 weekday means per granularity
    assert_eq!(plan.sales().len(), 3 * 65);
    // 4 sums, 16 days, 8 axes x 4 spans x 2 statistics
    assert_eq!(plan.promo().len(), 84);
    let names = plan.names();
    assert_eq!(names.len(), plan.len());
    for expected in [
        "item_store_mean_30",
        "item_decay_mean_140",
        "store_class_sale_days_7",
        "item_store_dow0_mean_4w",
        "promo_sum_before_140",
        "promo_sum_after_16",
        "promo_day_15",
        "promo_cluster_count_before_60",
        "promo_item_mean_after_16",
    ] {
        assert!(names.iter().any(|n| n == expected), "missing {}", expected);
    }
}

#[test]
fn test_plan_rejects_duplicates_and_bad_decay() {
    let config = FeatureConfig {
        windows: vec![7, 7],
        ..FeatureConfig::default()
    };
    assert!(matches!(
        FeaturePlan::from_config(&config),
        Err(ForecastError::InvalidParameter(_))
    ));

    let config = FeatureConfig {
        decay: 1.5,
        ..FeatureConfig::default()
    };
    assert!(FeaturePlan::from_config(&config).is_err());
}

#[test]
fn test_promo_spans() {
    let series = [1.0, 0.0, 1.0, 1.0, 0.0, 1.0];

    assert_eq!(PromoSpan::Before(3).slice(&series, 4), &[0.0, 1.0, 1.0]);
    assert_eq!(PromoSpan::Before(10).slice(&series, 4), &[1.0, 0.0, 1.0, 1.0]);
    assert_eq!(PromoSpan::After(16).slice(&series, 4), &[0.0, 1.0]);
    assert_eq!(PromoSpan::Day(1).slice(&series, 4), &[1.0]);
    assert!(PromoSpan::Day(5).slice(&series, 4).is_empty());

    assert_eq!(PromoSpan::Before(3).days_available(6, 4), 3);
    assert_eq!(PromoSpan::Before(10).days_available(6, 4), 4);
    assert_eq!(PromoSpan::After(16).days_available(6, 4), 2);
    assert_eq!(PromoSpan::Day(5).days_available(6, 4), 0);
}

#[test]
fn test_promo_group_statistics() {
    let counts = [2.0, 0.0, 3.0, 1.0];
    let groups = [0, 0, 1, 0];

    let sum = PromoFeatureDef::sum(Granularity::ItemStore, PromoSpan::Before(4));
    let count = PromoFeatureDef::group_count(Granularity::ItemStore, PromoSpan::Before(4), GroupAxis::Store);
    let mean = PromoFeatureDef::group_mean(Granularity::ItemStore, PromoSpan::Before(4), GroupAxis::Store);

    assert_eq!(sum.evaluate(&counts, &[], 4), vec![2.0, 0.0, 3.0, 1.0]);
    assert_eq!(count.evaluate(&counts, &groups, 4), vec![3.0, 3.0, 3.0, 3.0]);
    assert_eq!(mean.evaluate(&counts, &groups, 4), vec![0.25, 0.25, 0.75, 0.25]);
    // No days in the span means no promo share
    assert_eq!(mean.evaluate(&counts, &groups, 0), vec![0.0; 4]);
}

fn promo_fixture() -> (TransactionLog, PromoSchedule, ItemCatalog, StoreCatalog) {
    let mut records = Vec::new();
    for day in ["2017-01-01", "2017-01-02", "2017-01-03", "2017-01-04"] {
        records.push(sale(day, 1, 101, 1.0, day == "2017-01-03"));
        records.push(sale(day, 1, 102, 1.0, false));
        records.push(sale(day, 2, 101, 1.0, true));
    }
    let anchor = date("2017-01-05");
    let schedule = PromoSchedule::new(vec![
        scheduled(0, anchor, 1, 101, true),
        scheduled(1, anchor + Duration::days(1), 1, 101, true),
        scheduled(2, anchor, 2, 101, false),
        scheduled(3, anchor, 1, 102, true),
    ]);
    (TransactionLog::new(records), schedule, items(), stores())
}

#[test]
fn test_promo_features_at_anchor() {
    let (log, schedule, items, stores) = promo_fixture();
    let prepared = PreparedData::new(&log, &schedule, &items, &stores).unwrap();
    let plan = FeaturePlan::new(
        Vec::new(),
        vec![
            PromoFeatureDef::sum(Granularity::ItemStore, PromoSpan::Before(14)),
            PromoFeatureDef::sum(Granularity::ItemStore, PromoSpan::After(16)),
            PromoFeatureDef::sum(Granularity::ItemStore, PromoSpan::Day(1)),
            PromoFeatureDef::group_count(Granularity::ItemStore, PromoSpan::Before(14), GroupAxis::Item),
            PromoFeatureDef::group_mean(Granularity::ItemStore, PromoSpan::Before(14), GroupAxis::Item),
        ],
    )
    .unwrap();
    let extractor = FeatureExtractor::new(plan);

    let table = extractor
        .promo(&prepared.data, &prepared.groupings, date("2017-01-05"))
        .unwrap();

    // Rows: (1, 101), (1, 102), (2, 101)
    assert_eq!(table.rows(), &[RowKey::new(1, 101), RowKey::new(1, 102), RowKey::new(2, 101)]);
    assert_eq!(table.column("promo_sum_before_14").unwrap(), &[1.0, 0.0, 4.0]);
    assert_eq!(table.column("promo_sum_after_16").unwrap(), &[2.0, 1.0, 0.0]);
    assert_eq!(table.column("promo_day_1").unwrap(), &[1.0, 0.0, 0.0]);
    assert_eq!(table.column("promo_item_count_before_14").unwrap(), &[5.0, 0.0, 5.0]);
    // Item 101: 5 promo days over 2 rows x 4 available days
    assert_eq!(table.column("promo_item_mean_before_14").unwrap(), &[0.625, 0.0, 0.625]);
}

#[test]
fn test_granularity_averages_and_broadcasts() {
    let log = TransactionLog::new(vec![
        sale("2017-01-01", 1, 101, 1.0, false),
        sale("2017-01-01", 2, 101, 3.0, false),
        sale("2017-01-01", 1, 102, 7.0, false),
    ]);
    let prepared = PreparedData::new(&log, &PromoSchedule::empty(), &items(), &stores()).unwrap();
    let plan = FeaturePlan::new(
        vec![
            SalesFeatureDef::new(Granularity::Item, 1, SalesStatistic::Mean),
            SalesFeatureDef::new(Granularity::Store, 1, SalesStatistic::Mean),
        ],
        Vec::new(),
    )
    .unwrap();

    let table = FeatureExtractor::new(plan)
        .sales(&prepared.data, &prepared.groupings, date("2017-01-02"))
        .unwrap();

    let log_item_101 = (2.0f64.ln() + 4.0f64.ln()) / 2.0;
    let item_mean = table.column("item_mean_1").unwrap();
    // Rows: (1, 101), (1, 102), (2, 101)
    assert_abs_diff_eq!(item_mean[0], log_item_101, epsilon = 1e-12);
    assert_abs_diff_eq!(item_mean[1], 8.0f64.ln(), epsilon = 1e-12);
    assert_abs_diff_eq!(item_mean[2], log_item_101, epsilon = 1e-12);

    let store_mean = table.column("store_mean_1").unwrap();
    assert_abs_diff_eq!(store_mean[0], (2.0f64.ln() + 8.0f64.ln()) / 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(store_mean[2], 4.0f64.ln(), epsilon = 1e-12);
}

#[test]
fn test_store_class_granularity_uses_catalog_class() {
    let items = ItemCatalog::new(vec![
        item(101, "GROCERY I", 1040, false),
        item(102, "GROCERY I", 1040, false),
        item(103, "DAIRY", 2712, true),
    ]);
    let stores = StoreCatalog::new(vec![store(1, "Quito", "Pichincha", "D", 13)]);
    let log = TransactionLog::new(vec![
        sale("2017-01-01", 1, 101, 1.0, false),
        sale("2017-01-01", 1, 102, 3.0, false),
        sale("2017-01-01", 1, 103, 9.0, false),
    ]);
    let prepared = PreparedData::new(&log, &PromoSchedule::empty(), &items, &stores).unwrap();
    let plan = FeaturePlan::new(
        vec![SalesFeatureDef::new(Granularity::StoreClass, 1, SalesStatistic::Max)],
        Vec::new(),
    )
    .unwrap();

    let table = FeatureExtractor::new(plan)
        .sales(&prepared.data, &prepared.groupings, date("2017-01-02"))
        .unwrap();

    let values = table.column("store_class_max_1").unwrap();
    let class_1040 = (2.0f64.ln() + 4.0f64.ln()) / 2.0;
    assert_abs_diff_eq!(values[0], class_1040, epsilon = 1e-12);
    assert_abs_diff_eq!(values[1], class_1040, epsilon = 1e-12);
    assert_abs_diff_eq!(values[2], 10.0f64.ln(), epsilon = 1e-12);
}

#[test]
fn test_extract_covers_every_row_and_feature() {
    let log = deterministic_history(30);
    let anchor = date(HISTORY_START) + Duration::days(30);
    let prepared = PreparedData::new(&log, &PromoSchedule::empty(), &items(), &stores()).unwrap();
    let plan = FeaturePlan::from_config(&FeatureConfig::default()).unwrap();
    let extractor = FeatureExtractor::new(plan.clone());

    let table = extractor.extract(&prepared.data, &prepared.groupings, anchor).unwrap();

    assert_eq!(table.n_rows(), 4);
    assert_eq!(table.names(), plan.names().as_slice());
    for name in table.names() {
        assert!(table.column(name).unwrap().iter().all(|v| v.is_finite()), "{}", name);
    }
}

#[test]
fn test_table_merge_requires_same_rows() {
    let mut a = FeatureTable::new(vec![RowKey::new(1, 1), RowKey::new(1, 2)]);
    a.push_column("x", vec![1.0, 2.0]).unwrap();
    let mut b = FeatureTable::new(vec![RowKey::new(1, 2), RowKey::new(1, 1)]);
    b.push_column("y", vec![3.0, 4.0]).unwrap();

    assert!(matches!(a.clone().merge(b), Err(ForecastError::RowMismatch(_))));

    let mut c = FeatureTable::new(vec![RowKey::new(1, 1), RowKey::new(1, 2)]);
    c.push_column("x", vec![5.0, 6.0]).unwrap();
    assert!(matches!(a.clone().merge(c), Err(ForecastError::FeatureMismatch(_))));

    assert!(a.push_column("z", vec![1.0]).is_err());
    assert!(matches!(a.require("missing"), Err(ForecastError::FeatureMismatch(_))));
}

#[test]
fn test_normalization_leaves_constant_columns() {
    let mut table = FeatureTable::new(vec![RowKey::new(1, 1), RowKey::new(1, 2), RowKey::new(1, 3)]);
    table.push_column("varying", vec![2.0, 4.0, 6.0]).unwrap();
    table.push_column("constant", vec![5.0, 5.0, 5.0]).unwrap();

    let mut raw = table.clone();
    assert_eq!(raw.normalize(Normalization::Disabled), 0);
    assert_eq!(raw, table);

    assert_eq!(table.normalize(Normalization::BatchMinMax), 1);
    assert_eq!(table.column("varying").unwrap(), &[0.0, 0.5, 1.0]);
    assert_eq!(table.column("constant").unwrap(), &[5.0, 5.0, 5.0]);
}

#[test]
fn test_stack_appends_rows() {
    let mut a = FeatureTable::new(vec![RowKey::new(1, 1)]);
    a.push_column("x", vec![1.0]).unwrap();
    let mut b = FeatureTable::new(vec![RowKey::new(1, 1)]);
    b.push_column("x", vec![2.0]).unwrap();

    let stacked = FeatureTable::stack(vec![a, b]).unwrap();
    assert_eq!(stacked.n_rows(), 2);
    assert_eq!(stacked.column("x").unwrap(), &[1.0, 2.0]);
}

proptest! {
    #[test]
    fn prop_window_wider_than_history_equals_history_window(
        series in prop::collection::vec(0.0f64..5.0, 1..40),
        extra in 1usize..200,
    ) {
        let len = series.len();
        for statistic in [
            SalesStatistic::Mean,
            SalesStatistic::DecayMean { decay: 0.9 },
            SalesStatistic::Median,
            SalesStatistic::Min,
            SalesStatistic::Max,
            SalesStatistic::Std,
            SalesStatistic::SaleDays,
            SalesStatistic::LastSaleAge,
            SalesStatistic::FirstSaleAge,
            SalesStatistic::WeekdayMean { offset: 3 },
        ] {
            let wide = SalesFeatureDef::new(Granularity::ItemStore, len + extra, statistic);
            let exact = SalesFeatureDef::new(Granularity::ItemStore, len, statistic);
            prop_assert_eq!(
                wide.evaluate(&series, len).unwrap(),
                exact.evaluate(&series, len).unwrap()
            );
        }
    }
}
