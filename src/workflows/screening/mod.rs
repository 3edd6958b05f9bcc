//! Cash-flow tenant screening: intake validation, score interpretation, legacy vs. candidate
//! model comparison, and the session-scoped cache that ties the steps together.
//!
//! The metric, interpretation, comparison, and breakdown modules are pure. The only
//! suspension points are the two outbound scoring requests made by [`ScreeningService`].

pub mod breakdown;
pub mod client;
pub mod comparison;
pub mod domain;
pub mod impact;
pub mod intake;
pub mod interpretation;
pub mod metrics;
pub mod router;
pub mod service;
pub mod session;
pub(crate) mod submission;

#[cfg(test)]
mod tests;

pub use breakdown::{rank_breakdown, BreakdownView};
pub use client::{HttpScoringClient, ScoringClientError, ScoringService};
pub use comparison::{
    compare_models, ComparisonDimension, ComparisonEngine, ComparisonView, DimensionChange,
    Improvement,
};
pub use domain::{
    CompareModelResult, CompareResult, FeatureExplanation, FeatureStatus, RiskLevel,
    ScoreResult, SessionId, TenantInputPayload,
};
pub use impact::{extract_impact, ImpactFieldAliases, ImpactMetrics};
pub use intake::{IntakeField, SubmissionInput, TenantInputForm, ValidationErrors};
pub use interpretation::{interpret, Interpretation, ScoreBand};
pub use router::{screening_router, SESSION_HEADER};
pub use service::{
    ComparisonReport, EvaluationView, ResultSource, ScreeningService, ScreeningServiceError,
};
pub use session::{
    FileSessionStore, InMemorySessionStore, NavigationState, SessionError, SessionSnapshot,
    SessionStore,
};
