mod analytics;
mod clock;
mod engine;
mod recurrence;
mod types;

pub use analytics::{
    ACCELERATED_HORIZON_SHARE, ALLOCATION_GAP_THRESHOLD, MIN_ACCELERATED_MONTHS,
    PLANNING_ANNUAL_RATE, calculate_metrics, generate_suggestions,
};
pub use clock::{Clock, FixedClock, SystemClock};
pub use engine::{project, project_with_metrics, simulate};
pub use recurrence::applies;
pub use types::{
    CashFlowEvent, ContributionSuggestion, EventKind, PortfolioMetrics, ProjectionParameters,
    ProjectionPoint, ProjectionReport, Recurrence, SuggestionType, YearMonth,
};
