use super::engine::round2;
use super::types::{ContributionSuggestion, PortfolioMetrics, ProjectionPoint, SuggestionType};

/// Planning assumption for contribution sizing, independent of any simulated rate.
pub const PLANNING_ANNUAL_RATE: f64 = 0.04;
/// Floor for the accelerated-plan horizon, in months.
pub const MIN_ACCELERATED_MONTHS: f64 = 24.0;
/// Share of the full horizon used by the accelerated plan.
pub const ACCELERATED_HORIZON_SHARE: f64 = 0.7;
/// Gap-to-target ratio above which an allocation review is suggested.
pub const ALLOCATION_GAP_THRESHOLD: f64 = 0.5;

pub fn generate_suggestions(
    current_patrimony: f64,
    target_patrimony: f64,
    time_horizon_years: u32,
    current_monthly_contribution: f64,
) -> Vec<ContributionSuggestion> {
    let gap = target_patrimony - current_patrimony;
    if gap <= 0.0 {
        return vec![ContributionSuggestion {
            suggestion_type: SuggestionType::Congratulations,
            description: "Your current patrimony already meets the target.".to_string(),
            suggested_value: Some(0.0),
            suggested_period: Some(0),
        }];
    }

    let monthly_rate = PLANNING_ANNUAL_RATE / 12.0;
    let months_remaining = time_horizon_years as f64 * 12.0;
    let mut suggestions = Vec::new();

    let required = required_monthly_contribution(gap, monthly_rate, months_remaining);
    let additional = required - current_monthly_contribution;
    if additional > 0.0 {
        suggestions.push(increase_contribution(additional, months_remaining));

        let shorter_period =
            MIN_ACCELERATED_MONTHS.max(months_remaining * ACCELERATED_HORIZON_SHARE);
        let accelerated = required_monthly_contribution(gap, monthly_rate, shorter_period);
        if accelerated > required {
            suggestions.push(increase_contribution(
                accelerated - current_monthly_contribution,
                shorter_period,
            ));
        }
    }

    if target_patrimony > 0.0 && gap / target_patrimony > ALLOCATION_GAP_THRESHOLD {
        suggestions.push(ContributionSuggestion {
            suggestion_type: SuggestionType::AdjustAllocation,
            description: format!(
                "The gap is {:.0}% of the target. Review the portfolio allocation for assets with higher expected returns.",
                gap / target_patrimony * 100.0
            ),
            suggested_value: None,
            suggested_period: None,
        });
    }

    suggestions
}

fn increase_contribution(additional: f64, months: f64) -> ContributionSuggestion {
    let months = months.round() as u32;
    let value = round2(additional);
    ContributionSuggestion {
        suggestion_type: SuggestionType::IncreaseContribution,
        description: format!(
            "Increase the monthly contribution by {value:.2} to reach the target in {months} months."
        ),
        suggested_value: Some(value),
        suggested_period: Some(months),
    }
}

/// Future value of a level contribution of 1 per month over `months`.
fn annuity_factor(monthly_rate: f64, months: f64) -> f64 {
    if months <= 0.0 {
        return 0.0;
    }
    if monthly_rate.abs() < 1e-12 {
        return months;
    }
    ((1.0 + monthly_rate).powf(months) - 1.0) / monthly_rate
}

fn required_monthly_contribution(gap: f64, monthly_rate: f64, months: f64) -> f64 {
    let factor = annuity_factor(monthly_rate, months);
    if factor <= 0.0 {
        // No time left: the whole gap is due at once.
        return gap;
    }
    gap / factor
}

pub fn calculate_metrics(
    curve: &[ProjectionPoint],
    initial_value: f64,
) -> Option<PortfolioMetrics> {
    let last = curve.last()?;
    let final_value = last.projected_value;
    let total_years = (curve.len() - 1) as u32;

    let cagr = if total_years > 0 && initial_value > 0.0 {
        (final_value / initial_value).powf(1.0 / total_years as f64) - 1.0
    } else {
        0.0
    };
    let total_gain = final_value - initial_value;
    let total_gain_percent = if initial_value > 0.0 {
        total_gain / initial_value * 100.0
    } else {
        0.0
    };

    Some(PortfolioMetrics {
        final_value: round2(final_value),
        total_gain: round2(total_gain),
        total_gain_percent: round2(total_gain_percent),
        cagr: round2(cagr * 100.0),
        projection_years: total_years,
    })
}
