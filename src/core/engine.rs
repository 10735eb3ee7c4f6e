use super::analytics::calculate_metrics;
use super::clock::Clock;
use super::recurrence::applies;
use super::types::{ProjectionParameters, ProjectionPoint, ProjectionReport, YearMonth};

/// Projects the curve anchored at the clock's current year.
pub fn project(
    params: &ProjectionParameters,
    clock: &(impl Clock + ?Sized),
) -> Vec<ProjectionPoint> {
    simulate(params, clock.current_year())
}

/// Projects the curve and summarises it in one pass.
pub fn project_with_metrics(
    params: &ProjectionParameters,
    clock: &(impl Clock + ?Sized),
) -> ProjectionReport {
    let anchor_year = clock.current_year();
    let points = simulate(params, anchor_year);
    let metrics = calculate_metrics(&points, params.initial_value);
    ProjectionReport {
        anchor_year,
        points,
        metrics,
    }
}

/// Walks the horizon month by month from `anchor_year`.
///
/// The first point is the untouched initial value at `anchor_year`; growth and
/// events start in January of the following year. The curve has
/// `projection_years + 1` points and never goes below zero.
pub fn simulate(params: &ProjectionParameters, anchor_year: i32) -> Vec<ProjectionPoint> {
    let monthly_rate = params.annual_interest_rate / 12.0;
    let mut value = params.initial_value;
    let mut points = Vec::with_capacity(params.projection_years as usize + 1);

    for year_offset in 0..=params.projection_years {
        let target_year = anchor_year + year_offset as i32;
        if year_offset > 0 {
            for month in 1..=12 {
                let target = YearMonth::new(target_year, month);
                value = step_month(params, value, monthly_rate, target);
            }
        }
        points.push(ProjectionPoint {
            year: target_year,
            projected_value: round2(value),
        });
    }

    log::debug!(
        "projected {} years from {} with {} events, final value {:.2}",
        params.projection_years,
        anchor_year,
        params.events.len(),
        value
    );
    points
}

fn step_month(
    params: &ProjectionParameters,
    value: f64,
    monthly_rate: f64,
    month: YearMonth,
) -> f64 {
    let mut value = value * (1.0 + monthly_rate);
    for event in params.events.iter().filter(|e| applies(e, month)) {
        value += event.signed_amount();
    }
    value.max(0.0)
}

pub(crate) fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::clock::FixedClock;
    use crate::core::types::{CashFlowEvent, EventKind, Recurrence};
    use chrono::NaiveDate;
    use proptest::prelude::{prop_assert, prop_assert_eq, proptest};
    use proptest::strategy::Strategy;

    const ANCHOR: i32 = 2024;

    fn assert_approx_tol(actual: f64, expected: f64, tol: f64) {
        assert!(
            (actual - expected).abs() <= tol,
            "expected {expected}, got {actual}, tolerance {tol}"
        );
    }

    fn date(year: i32, month: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(year, month, 1).expect("valid date")
    }

    fn params(
        initial_value: f64,
        rate: f64,
        years: u32,
        events: Vec<CashFlowEvent>,
    ) -> ProjectionParameters {
        ProjectionParameters {
            initial_value,
            annual_interest_rate: rate,
            events,
            projection_years: years,
        }
    }

    fn values(points: &[ProjectionPoint]) -> Vec<f64> {
        points.iter().map(|p| p.projected_value).collect()
    }

    #[test]
    fn zero_horizon_returns_only_the_baseline() {
        let p = params(1234.567, 0.05, 0, Vec::new());
        let curve = simulate(&p, ANCHOR);
        assert_eq!(
            curve,
            vec![ProjectionPoint {
                year: ANCHOR,
                projected_value: 1234.57
            }]
        );
    }

    #[test]
    fn baseline_year_is_not_simulated() {
        let events = vec![CashFlowEvent::new(
            EventKind::Income,
            1_000.0,
            Recurrence::Monthly,
            date(ANCHOR, 1),
        )];
        let curve = simulate(&params(5_000.0, 0.12, 1, events), ANCHOR);
        assert_eq!(curve[0].year, ANCHOR);
        assert_eq!(curve[0].projected_value, 5_000.0);
        assert_eq!(curve[1].year, ANCHOR + 1);
    }

    #[test]
    fn years_are_consecutive_from_anchor() {
        let curve = simulate(&params(100.0, 0.0, 5, Vec::new()), ANCHOR);
        let years = curve.iter().map(|p| p.year).collect::<Vec<_>>();
        assert_eq!(years, (ANCHOR..=ANCHOR + 5).collect::<Vec<_>>());
    }

    #[test]
    fn pure_compounding_matches_closed_form() {
        let curve = simulate(&params(100_000.0, 0.04, 10, Vec::new()), ANCHOR);
        for (offset, point) in curve.iter().enumerate() {
            let expected = 100_000.0 * (1.0 + 0.04 / 12.0_f64).powi(12 * offset as i32);
            assert_approx_tol(point.projected_value, expected, 0.011);
        }
    }

    #[test]
    fn monthly_income_compounds_on_top_of_contributions() {
        let income = CashFlowEvent::new(
            EventKind::Income,
            500.0,
            Recurrence::Monthly,
            date(ANCHOR + 1, 1),
        );
        let without = simulate(&params(10_000.0, 0.06, 1, Vec::new()), ANCHOR);
        let with = simulate(&params(10_000.0, 0.06, 1, vec![income]), ANCHOR);
        assert!(with[1].projected_value - without[1].projected_value > 12.0 * 500.0);
    }

    #[test]
    fn once_event_contributes_exactly_once() {
        let bonus = CashFlowEvent::new(EventKind::Bonus, 100.0, Recurrence::Once, date(ANCHOR + 2, 6));
        let curve = simulate(&params(0.0, 0.0, 4, vec![bonus]), ANCHOR);
        assert_eq!(values(&curve), vec![0.0, 0.0, 100.0, 100.0, 100.0]);
    }

    #[test]
    fn once_event_in_baseline_year_never_fires() {
        let inheritance = CashFlowEvent::new(
            EventKind::Inheritance,
            50_000.0,
            Recurrence::Once,
            date(ANCHOR, 11),
        );
        let curve = simulate(&params(1_000.0, 0.0, 3, vec![inheritance]), ANCHOR);
        assert!(curve.iter().all(|p| p.projected_value == 1_000.0));
    }

    #[test]
    fn outflows_reduce_value_by_kind() {
        for kind in [EventKind::Expense, EventKind::Withdrawal, EventKind::Loan] {
            let e = CashFlowEvent::new(kind, 10.0, Recurrence::Monthly, date(ANCHOR + 1, 1));
            let curve = simulate(&params(1_000.0, 0.0, 1, vec![e]), ANCHOR);
            assert_eq!(curve[1].projected_value, 880.0, "{kind:?}");
        }
        for kind in [
            EventKind::Income,
            EventKind::Bonus,
            EventKind::Inheritance,
            EventKind::Investment,
        ] {
            let e = CashFlowEvent::new(kind, 10.0, Recurrence::Monthly, date(ANCHOR + 1, 1));
            let curve = simulate(&params(1_000.0, 0.0, 1, vec![e]), ANCHOR);
            assert_eq!(curve[1].projected_value, 1_120.0, "{kind:?}");
        }
    }

    #[test]
    fn clamp_applies_after_all_events_of_the_month() {
        let events = vec![
            CashFlowEvent::new(EventKind::Loan, 1e9, Recurrence::Once, date(ANCHOR + 1, 1)),
            CashFlowEvent::new(EventKind::Income, 10.0, Recurrence::Monthly, date(ANCHOR + 1, 1)),
        ];
        let curve = simulate(&params(1_000.0, 0.0, 1, events), ANCHOR);
        // January floors to zero, February..December add 10 each.
        assert_eq!(curve[1].projected_value, 110.0);
    }

    #[test]
    fn negative_carry_is_not_remembered() {
        let events = vec![
            CashFlowEvent::new(EventKind::Withdrawal, 5_000.0, Recurrence::Once, date(ANCHOR + 1, 3)),
            CashFlowEvent::new(EventKind::Income, 100.0, Recurrence::Once, date(ANCHOR + 1, 4)),
        ];
        let curve = simulate(&params(1_000.0, 0.0, 1, events), ANCHOR);
        assert_eq!(curve[1].projected_value, 100.0);
    }

    #[test]
    fn quarterly_events_fire_four_times_a_year() {
        let e = CashFlowEvent::new(EventKind::Investment, 250.0, Recurrence::Quarterly, date(ANCHOR + 1, 2));
        let curve = simulate(&params(0.0, 0.0, 2, vec![e]), ANCHOR);
        assert_eq!(values(&curve), vec![0.0, 1_000.0, 2_000.0]);
    }

    #[test]
    fn end_date_stops_recurring_events() {
        let e = CashFlowEvent::new(EventKind::Expense, 100.0, Recurrence::Monthly, date(ANCHOR + 1, 1))
            .ending(date(ANCHOR + 1, 6));
        let curve = simulate(&params(10_000.0, 0.0, 2, vec![e]), ANCHOR);
        assert_eq!(values(&curve), vec![10_000.0, 9_400.0, 9_400.0]);
    }

    #[test]
    fn events_started_before_anchor_keep_recurring() {
        let e = CashFlowEvent::new(EventKind::Income, 1_000.0, Recurrence::Annually, date(ANCHOR - 5, 12));
        let curve = simulate(&params(0.0, 0.0, 2, vec![e]), ANCHOR);
        assert_eq!(values(&curve), vec![0.0, 1_000.0, 2_000.0]);
    }

    #[test]
    fn rounding_happens_only_at_snapshots() {
        // 0.004 a month would round away to nothing if rounded monthly.
        let e = CashFlowEvent::new(EventKind::Income, 0.004, Recurrence::Monthly, date(ANCHOR + 1, 1));
        let curve = simulate(&params(0.0, 0.0, 1, vec![e]), ANCHOR);
        assert_eq!(curve[1].projected_value, 0.05);
    }

    #[test]
    fn project_uses_clock_year_as_anchor() {
        let p = params(100.0, 0.0, 2, Vec::new());
        let curve = project(&p, &FixedClock(2030));
        assert_eq!(curve.first().map(|pt| pt.year), Some(2030));
        assert_eq!(curve.last().map(|pt| pt.year), Some(2032));
    }

    #[test]
    fn project_with_metrics_summarises_curve() {
        let p = params(100_000.0, 0.12, 3, Vec::new());
        let report = project_with_metrics(&p, &FixedClock(2024));
        assert_eq!(report.anchor_year, 2024);
        assert_eq!(report.points.len(), 4);
        let metrics = report.metrics.expect("non-empty curve has metrics");
        assert_eq!(metrics.projection_years, 3);
        assert_eq!(metrics.final_value, report.points[3].projected_value);
        assert!(metrics.cagr > 12.0 && metrics.cagr < 13.0);
    }

    #[test]
    fn round2_rounds_half_away_from_zero() {
        assert_eq!(round2(1.005_000_1), 1.01);
        assert_eq!(round2(2.344), 2.34);
        assert_eq!(round2(0.0), 0.0);
    }

    fn event_strategy() -> impl Strategy<Value = CashFlowEvent> {
        (0usize..7, 0u32..2_000_000, 0usize..4, 0i32..240, proptest::option::of(0i32..120)).prop_map(
            |(kind_idx, amount, recurrence_idx, start_offset, duration)| {
                let kind = [
                    EventKind::Income,
                    EventKind::Expense,
                    EventKind::Investment,
                    EventKind::Withdrawal,
                    EventKind::Bonus,
                    EventKind::Inheritance,
                    EventKind::Loan,
                ][kind_idx];
                let recurrence = [
                    Recurrence::Once,
                    Recurrence::Monthly,
                    Recurrence::Quarterly,
                    Recurrence::Annually,
                ][recurrence_idx];
                let start_months = (ANCHOR - 2) * 12 + start_offset;
                let start = date(start_months / 12, (start_months % 12) as u32 + 1);
                let mut event = CashFlowEvent::new(kind, amount as f64 / 100.0, recurrence, start);
                if let Some(duration) = duration {
                    let end_months = start_months + duration;
                    event = event.ending(date(end_months / 12, (end_months % 12) as u32 + 1));
                }
                event
            },
        )
    }

    proptest! {
        #![proptest_config(proptest::test_runner::Config::with_cases(64))]

        #[test]
        fn prop_curve_length_and_floor_hold(
            initial_cents in 0u64..1_000_000_000,
            rate_bp in -2_000i32..3_000,
            years in 0u32..51,
            events in proptest::collection::vec(event_strategy(), 0..12)
        ) {
            let p = params(initial_cents as f64 / 100.0, rate_bp as f64 / 10_000.0, years, events);
            let curve = simulate(&p, ANCHOR);
            prop_assert_eq!(curve.len(), years as usize + 1);
            for point in &curve {
                prop_assert!(point.projected_value.is_finite());
                prop_assert!(point.projected_value >= 0.0);
            }
            prop_assert_eq!(curve[0].projected_value, round2(p.initial_value));
        }

        #[test]
        fn prop_once_event_shifts_curve_exactly_once(
            year_offset in 1i32..10,
            month in 1u32..13,
            amount_cents in 1u32..10_000_000
        ) {
            let amount = amount_cents as f64 / 100.0;
            let e = CashFlowEvent::new(EventKind::Income, amount, Recurrence::Once, date(ANCHOR + year_offset, month));
            let curve = simulate(&params(0.0, 0.0, 10, vec![e]), ANCHOR);
            for (offset, point) in curve.iter().enumerate() {
                let expected = if (offset as i32) < year_offset { 0.0 } else { round2(amount) };
                prop_assert_eq!(point.projected_value, expected);
            }
        }
    }
}
