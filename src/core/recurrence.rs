use super::types::{CashFlowEvent, Recurrence, YearMonth};

/// Whether `event` fires during `target`.
///
/// Dates are compared at month resolution: an event starting on the 20th still
/// fires in its start month, and an event ending on the 3rd still fires in its
/// end month.
pub fn applies(event: &CashFlowEvent, target: YearMonth) -> bool {
    let start = YearMonth::of(event.start_date);
    if start > target {
        return false;
    }
    if let Some(end) = event.end_date {
        if YearMonth::of(end) < target {
            return false;
        }
    }

    match event.recurrence {
        Recurrence::Once => start == target,
        Recurrence::Monthly => true,
        // Cadence follows the event's own start month, not calendar quarters.
        Recurrence::Quarterly => target.months_since(start) % 3 == 0,
        Recurrence::Annually => target.month == start.month,
    }
}
