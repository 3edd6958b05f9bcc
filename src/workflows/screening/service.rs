use std::sync::Arc;

use chrono::{Duration, Utc};
use serde::Serialize;
use tracing::{debug, info, warn};

use super::breakdown::BreakdownView;
use super::client::{ScoringClientError, ScoringService};
use super::comparison::{ComparisonEngine, ComparisonView};
use super::domain::{RiskLevel, ScoreResult, SessionId, TenantInputPayload};
use super::intake::{validate_payload, SubmissionInput, ValidationErrors};
use super::interpretation::{interpret, Interpretation};
use super::session::{
    resolve_submission, NavigationState, ResolvedSubmission, SessionError, SessionSnapshot,
    SessionStore,
};
use super::submission::SubmissionTracker;

pub const NO_RESULTS_MESSAGE: &str = "No results yet. Run an evaluation first.";
pub const NO_COMPARISON_MESSAGE: &str =
    "No comparison available. Run an evaluation first so we can compare models.";

/// Where the data behind a view came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResultSource {
    Fresh,
    Navigation,
    Cached,
}

/// Single-model result page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EvaluationView {
    pub source: ResultSource,
    pub risk_level: Option<RiskLevel>,
    pub interpretation: Interpretation,
    pub breakdown: BreakdownView,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payload: Option<TenantInputPayload>,
}

impl EvaluationView {
    pub fn build(
        source: ResultSource,
        result: &ScoreResult,
        payload: Option<TenantInputPayload>,
    ) -> Self {
        Self {
            source,
            risk_level: result.risk_level,
            interpretation: interpret(result.score, result.risk_level),
            breakdown: BreakdownView::from_upstream(result.breakdown.as_deref()),
            payload,
        }
    }
}

/// Legacy vs. candidate page: the derived view plus a reading of each side.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ComparisonReport {
    pub source: ResultSource,
    pub payload: TenantInputPayload,
    pub view: ComparisonView,
    pub legacy: Interpretation,
    pub candidate: Interpretation,
    pub legacy_breakdown: BreakdownView,
    pub candidate_breakdown: BreakdownView,
}

/// Composes intake validation, the scoring client, the session cache, and comparison.
pub struct ScreeningService<S, C> {
    scoring: Arc<S>,
    sessions: Arc<C>,
    tracker: SubmissionTracker,
    engine: ComparisonEngine,
    session_ttl: Duration,
}

impl<S, C> ScreeningService<S, C>
where
    S: ScoringService + 'static,
    C: SessionStore + 'static,
{
    pub fn new(scoring: Arc<S>, sessions: Arc<C>, session_ttl: Duration) -> Self {
        Self {
            scoring,
            sessions,
            tracker: SubmissionTracker::default(),
            engine: ComparisonEngine::default(),
            session_ttl,
        }
    }

    pub fn with_engine(mut self, engine: ComparisonEngine) -> Self {
        self.engine = engine;
        self
    }

    pub fn sessions(&self) -> &Arc<C> {
        &self.sessions
    }

    #[cfg(test)]
    pub(crate) fn in_flight_sessions(&self) -> usize {
        self.tracker.tracked_sessions()
    }

    /// Validate, score, and cache a submission. A response that arrives after a newer
    /// submission for the same session is dropped.
    pub async fn evaluate(
        &self,
        session: &SessionId,
        input: SubmissionInput,
    ) -> Result<EvaluationView, ScreeningServiceError> {
        let payload = input.into_payload()?;
        let pending = self.tracker.begin(session);
        let ticket = pending.ticket();
        debug!(session = %session.0, sequence = ticket.sequence(), "scoring submission");

        let result = self.scoring.score(&payload).await.map_err(|error| {
            warn!(session = %session.0, %error, "scoring request failed");
            error
        })?;

        let snapshot =
            SessionSnapshot::new(Some(payload.clone()), Some(result.clone()), Utc::now());
        match self
            .tracker
            .complete_if_current(ticket, || self.sessions.save(session, snapshot))
        {
            Some(saved) => saved?,
            None => {
                info!(
                    session = %session.0,
                    sequence = ticket.sequence(),
                    "dropping superseded scoring response"
                );
                return Err(ScreeningServiceError::Superseded);
            }
        }

        info!(
            session = %session.0,
            score = result.score,
            "submission scored"
        );
        Ok(EvaluationView::build(
            ResultSource::Fresh,
            &result,
            Some(payload),
        ))
    }

    /// Results page: navigation state first, then the session cache.
    pub fn results(
        &self,
        session: &SessionId,
        navigation: NavigationState,
    ) -> Result<EvaluationView, ScreeningServiceError> {
        let now = Utc::now();
        let cached = self.sessions.load(session)?;

        let (source, result, payload) =
            match resolve_submission(Some(navigation), cached.clone(), now, self.session_ttl) {
                ResolvedSubmission::Navigation(NavigationState {
                    result: Some(result),
                    payload,
                }) => {
                    let payload = payload.or_else(|| {
                        cached
                            .as_ref()
                            .filter(|snapshot| !snapshot.is_expired(now, self.session_ttl))
                            .and_then(|snapshot| snapshot.payload.clone())
                    });
                    let snapshot = SessionSnapshot::new(payload.clone(), Some(result.clone()), now);
                    self.sessions.save(session, snapshot)?;
                    (ResultSource::Navigation, result, payload)
                }
                _ => match resolve_submission(None, cached, now, self.session_ttl) {
                    ResolvedSubmission::Cached(SessionSnapshot {
                        score: Some(score),
                        payload,
                        ..
                    }) => (ResultSource::Cached, score, payload),
                    _ => return Err(ScreeningServiceError::NoData(NO_RESULTS_MESSAGE)),
                },
            };

        Ok(EvaluationView::build(source, &result, payload))
    }

    /// Re-serve the cached evaluation, e.g. after a reload.
    pub fn last(&self, session: &SessionId) -> Result<EvaluationView, ScreeningServiceError> {
        self.results(session, NavigationState::default())
    }

    /// Score the resolved payload against both models and build the comparison.
    pub async fn compare(
        &self,
        session: &SessionId,
        navigation: NavigationState,
    ) -> Result<ComparisonReport, ScreeningServiceError> {
        let now = Utc::now();
        let cached = self.sessions.load(session)?;

        let (source, payload) =
            match resolve_submission(Some(navigation), cached.clone(), now, self.session_ttl) {
                ResolvedSubmission::Navigation(NavigationState {
                    payload: Some(payload),
                    ..
                }) => (ResultSource::Navigation, payload),
                _ => match resolve_submission(None, cached, now, self.session_ttl) {
                    ResolvedSubmission::Cached(SessionSnapshot {
                        payload: Some(payload),
                        ..
                    }) => (ResultSource::Cached, payload),
                    _ => return Err(ScreeningServiceError::NoData(NO_COMPARISON_MESSAGE)),
                },
            };
        validate_payload(&payload)?;

        let compared = self.scoring.compare(&payload).await.map_err(|error| {
            warn!(session = %session.0, %error, "comparison request failed");
            error
        })?;

        let view = self.engine.compare(&compared.legacy, &compared.candidate);
        info!(
            session = %session.0,
            score_delta = view.score_delta,
            headline = %view.headline,
            "models compared"
        );

        Ok(ComparisonReport {
            source,
            legacy: interpret(compared.legacy.score, compared.legacy.risk_level),
            candidate: interpret(compared.candidate.score, compared.candidate.risk_level),
            legacy_breakdown: BreakdownView::from_upstream(compared.legacy.breakdown.as_deref()),
            candidate_breakdown: BreakdownView::from_upstream(
                compared.candidate.breakdown.as_deref(),
            ),
            payload,
            view,
        })
    }
}

/// Error raised by the screening service.
#[derive(Debug, thiserror::Error)]
pub enum ScreeningServiceError {
    #[error(transparent)]
    Validation(#[from] ValidationErrors),
    #[error(transparent)]
    Scoring(#[from] ScoringClientError),
    #[error(transparent)]
    Session(#[from] SessionError),
    #[error("a newer submission replaced this one")]
    Superseded,
    #[error("{0}")]
    NoData(&'static str),
}

impl ScreeningServiceError {
    /// Message safe to show an operator.
    pub fn user_message(&self) -> String {
        match self {
            Self::Scoring(error) => error.user_message(),
            other => other.to_string(),
        }
    }
}
