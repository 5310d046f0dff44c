use chrono::{Duration, NaiveDate};
use sales_forecast::aggregate::Summaries;
use sales_forecast::data::{
    ItemCatalog, ItemInfo, PromoSchedule, ScheduleRecord, StoreCatalog, StoreInfo,
    TransactionLog, TransactionRecord,
};
use sales_forecast::features::{FeatureConfig, FeaturePlan, Normalization};
use sales_forecast::models::ModelKind;
use sales_forecast::pipeline::ForecastPipeline;
use sales_forecast::HORIZON;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Sales Forecast: Basic Forecasting Example");
    println!("=========================================\n");

    // Create sample data
    println!("Creating sample data...");
    let start = NaiveDate::from_ymd_opt(2017, 1, 1).ok_or("bad start date")?;
    let history = create_sample_history(start, 90);
    let anchor = start + Duration::days(90);
    let schedule = create_sample_schedule(anchor);
    let (items, stores) = create_sample_catalogs();
    println!(
        "Sample data created: {} sales records, {} scheduled rows\n",
        history.len(),
        schedule.len()
    );

    // One ridge model per horizon day, fitted on four weekly anchors
    println!("Training models...");
    let plan = FeaturePlan::from_config(&FeatureConfig::default())?;
    println!("Feature plan: {} features", plan.len());
    let pipeline = ForecastPipeline::new(plan, Normalization::BatchMinMax);
    let (models, report) =
        pipeline.train(&history, &items, &stores, &ModelKind::Ridge { lambda: 1.0 }, None, 4)?;
    for fit in report.horizons.iter().step_by(5) {
        println!("  day {:>2}: RMSE {:.4} (weighted {:.4})", fit.horizon, fit.rmse, fit.weighted_rmse);
    }
    println!("Models trained successfully\n");

    // Generate forecasts
    println!("Generating forecasts from {}...", anchor);
    let prediction = pipeline.predict(&history, &schedule, &items, &stores, &models, None)?;
    for row in prediction.rows.iter().take(6) {
        println!(
            "  {} store {} item {}: {:.2}",
            row.date, row.store_nbr, row.item_nbr, row.unit_sales
        );
    }

    let summaries = Summaries::build(&prediction.rows, &items, &stores, 3);
    println!("\nSummaries:\n{}", serde_json::to_string_pretty(&summaries)?);

    Ok(())
}

fn create_sample_history(start: NaiveDate, days: i64) -> TransactionLog {
    let mut records = Vec::new();
    for d in 0..days {
        let date = start + Duration::days(d);
        for store_nbr in 1..=3u32 {
            for item_nbr in [96995u64, 99197, 103665] {
                // Weekly cycle plus a store effect
                let weekly = [4.0, 3.0, 3.0, 4.0, 6.0, 9.0, 8.0][(d % 7) as usize];
                let onpromotion = (d + item_nbr as i64) % 11 == 0;
                let unit_sales = weekly * store_nbr as f64 / 2.0 + if onpromotion { 5.0 } else { 0.0 };
                records.push(TransactionRecord {
                    date,
                    store_nbr,
                    item_nbr,
                    unit_sales,
                    onpromotion,
                });
            }
        }
    }
    TransactionLog::new(records)
}

fn create_sample_schedule(anchor: NaiveDate) -> PromoSchedule {
    let mut records = Vec::new();
    let mut id = 0;
    for h in 0..HORIZON as i64 {
        for store_nbr in 1..=3u32 {
            for item_nbr in [96995u64, 99197, 103665] {
                records.push(ScheduleRecord {
                    id: Some(id),
                    date: anchor + Duration::days(h),
                    store_nbr,
                    item_nbr,
                    onpromotion: h % 5 == 0,
                });
                id += 1;
            }
        }
    }
    PromoSchedule::new(records)
}

fn create_sample_catalogs() -> (ItemCatalog, StoreCatalog) {
    let items = ItemCatalog::new(vec![
        ItemInfo {
            item_nbr: 96995,
            family: "GROCERY I".to_string(),
            class: 1093,
            perishable: false,
        },
        ItemInfo {
            item_nbr: 99197,
            family: "GROCERY I".to_string(),
            class: 1067,
            perishable: false,
        },
        ItemInfo {
            item_nbr: 103665,
            family: "BREAD/BAKERY".to_string(),
            class: 2712,
            perishable: true,
        },
    ]);
    let stores = StoreCatalog::new(vec![
        StoreInfo {
            store_nbr: 1,
            city: "Quito".to_string(),
            state: "Pichincha".to_string(),
            store_type: "D".to_string(),
            cluster: 13,
        },
        StoreInfo {
            store_nbr: 2,
            city: "Quito".to_string(),
            state: "Pichincha".to_string(),
            store_type: "D".to_string(),
            cluster: 13,
        },
        StoreInfo {
            store_nbr: 3,
            city: "Guayaquil".to_string(),
            state: "Guayas".to_string(),
            store_type: "D".to_string(),
            cluster: 8,
        },
    ]);
    (items, stores)
}
