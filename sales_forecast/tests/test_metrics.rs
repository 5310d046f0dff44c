use approx::assert_abs_diff_eq;
use sales_forecast::metrics::{evaluate_forecast, weighted_rmse, PERISHABLE_WEIGHT};

#[test]
fn test_regression_metrics() {
    let actual = vec![10.0, 20.0, 30.0, 40.0, 50.0];
    let predicted = vec![12.0, 18.0, 33.0, 37.0, 52.0];

    let accuracy = evaluate_forecast(&predicted, &actual).unwrap();

    assert_abs_diff_eq!(accuracy.mae, 2.4, epsilon = 1e-12);
    assert_abs_diff_eq!(accuracy.median_ae, 2.0, epsilon = 1e-12);
    assert_abs_diff_eq!(accuracy.mse, 6.0, epsilon = 1e-12);
    assert_abs_diff_eq!(accuracy.rmse, 6.0f64.sqrt(), epsilon = 1e-12);
    assert!(accuracy.to_string().contains("RMSE"));
}

#[test]
fn test_metrics_reject_mismatched_lengths() {
    assert!(evaluate_forecast(&[1.0], &[1.0, 2.0]).is_err());
    assert!(evaluate_forecast(&[], &[]).is_err());
    assert!(weighted_rmse(&[1.0], &[1.0], &[1.0, 1.0]).is_err());
    assert!(weighted_rmse(&[1.0], &[1.0], &[0.0]).is_err());
}

#[test]
fn test_weighted_rmse_favours_perishables() {
    let actual = [1.0, 1.0];
    let predicted = [1.0, 3.0];

    let unweighted = weighted_rmse(&predicted, &actual, &[1.0, 1.0]).unwrap();
    let weighted = weighted_rmse(&predicted, &actual, &[1.0, PERISHABLE_WEIGHT]).unwrap();

    assert_abs_diff_eq!(unweighted, 2.0f64.sqrt(), epsilon = 1e-12);
    assert_abs_diff_eq!(weighted, (4.0 * 1.25 / 2.25f64).sqrt(), epsilon = 1e-12);
    assert!(weighted > unweighted);
}
