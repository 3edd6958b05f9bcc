use std::collections::{BTreeMap, VecDeque};
use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::Duration;
use serde_json::Value;
use tokio::sync::oneshot;

use crate::workflows::screening::client::{ScoringClientError, ScoringService};
use crate::workflows::screening::domain::{
    CompareModelResult, CompareResult, FeatureExplanation, FeatureStatus, RiskLevel, ScoreResult,
    SessionId, TenantInputPayload,
};
use crate::workflows::screening::service::ScreeningService;
use crate::workflows::screening::session::{
    InMemorySessionStore, SessionError, SessionSnapshot, SessionStore,
};

pub(super) fn payload() -> TenantInputPayload {
    TenantInputPayload {
        monthly_income: 4800.0,
        monthly_rent: 1500.0,
        liquid_savings: 3000.0,
        monthly_debt: 250.0,
        income_history: Some(vec![4700.0, 4800.0, 4900.0]),
    }
}

pub(super) fn feature(name: &str, status: FeatureStatus) -> FeatureExplanation {
    FeatureExplanation {
        name: name.to_string(),
        value: "n/a".to_string(),
        status,
        explanation: format!("{name} explanation"),
    }
}

pub(super) fn score_result(score: f64) -> ScoreResult {
    ScoreResult {
        score,
        risk_level: Some(RiskLevel::Medium),
        breakdown: Some(vec![
            feature("Savings Runway", FeatureStatus::Good),
            feature("Income-to-Rent Ratio", FeatureStatus::Risk),
            feature("Debt Load", FeatureStatus::Moderate),
        ]),
    }
}

pub(super) fn model(score: f64, loss: f64, missed: f64) -> CompareModelResult {
    let mut impact = BTreeMap::new();
    impact.insert("expected_annual_loss".to_string(), loss);
    impact.insert("expected_missed_months".to_string(), missed);
    CompareModelResult {
        score,
        risk_level: Some(RiskLevel::Medium),
        impact: Some(impact),
        breakdown: None,
    }
}

pub(super) fn compare_result() -> CompareResult {
    CompareResult {
        legacy: model(60.0, 1000.0, 2.0),
        candidate: model(78.0, 500.0, 1.5),
    }
}

pub(super) fn session(name: &str) -> SessionId {
    SessionId(name.to_string())
}

pub(super) fn ttl() -> Duration {
    Duration::minutes(30)
}

/// Scripted scoring service. Score responses are served in order, then the last one repeats.
#[derive(Default)]
pub(super) struct StubScoringService {
    scores: Mutex<VecDeque<ScoreResult>>,
    compare: Mutex<Option<CompareResult>>,
    failure: Mutex<Option<(u16, String)>>,
    gate: Mutex<Option<oneshot::Receiver<()>>>,
    pub(super) score_calls: AtomicUsize,
    pub(super) compare_calls: AtomicUsize,
    pub(super) last_payload: Mutex<Option<TenantInputPayload>>,
}

impl StubScoringService {
    pub(super) fn with_scores(scores: Vec<ScoreResult>) -> Self {
        let stub = Self::default();
        *stub.scores.lock().expect("stub mutex poisoned") = scores.into();
        *stub.compare.lock().expect("stub mutex poisoned") = Some(compare_result());
        stub
    }

    pub(super) fn failing(status: u16, body: &str) -> Self {
        let stub = Self::default();
        *stub.failure.lock().expect("stub mutex poisoned") = Some((status, body.to_string()));
        stub
    }

    /// The next score call waits until the returned sender fires.
    pub(super) fn hold_next_score(&self) -> oneshot::Sender<()> {
        let (sender, receiver) = oneshot::channel();
        *self.gate.lock().expect("stub mutex poisoned") = Some(receiver);
        sender
    }

    fn failure(&self) -> Option<ScoringClientError> {
        self.failure
            .lock()
            .expect("stub mutex poisoned")
            .clone()
            .map(|(status, body)| ScoringClientError::Status { status, body })
    }

    fn next_score(&self) -> ScoreResult {
        let mut scores = self.scores.lock().expect("stub mutex poisoned");
        if scores.len() > 1 {
            scores.pop_front().expect("queue is non-empty")
        } else {
            scores.front().cloned().unwrap_or_else(|| score_result(72.0))
        }
    }
}

impl ScoringService for StubScoringService {
    fn score(
        &self,
        payload: &TenantInputPayload,
    ) -> impl Future<Output = Result<ScoreResult, ScoringClientError>> + Send {
        self.score_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_payload.lock().expect("stub mutex poisoned") = Some(payload.clone());
        let gate = self.gate.lock().expect("stub mutex poisoned").take();
        let outcome = match self.failure() {
            Some(error) => Err(error),
            None => Ok(self.next_score()),
        };

        async move {
            if let Some(gate) = gate {
                let _ = gate.await;
            }
            outcome
        }
    }

    fn compare(
        &self,
        payload: &TenantInputPayload,
    ) -> impl Future<Output = Result<CompareResult, ScoringClientError>> + Send {
        self.compare_calls.fetch_add(1, Ordering::SeqCst);
        *self.last_payload.lock().expect("stub mutex poisoned") = Some(payload.clone());
        let outcome = match self.failure() {
            Some(error) => Err(error),
            None => Ok(self
                .compare
                .lock()
                .expect("stub mutex poisoned")
                .clone()
                .unwrap_or_else(compare_result)),
        };

        async move { outcome }
    }
}

/// Session store that always fails, for error-path coverage.
pub(super) struct UnavailableSessions;

impl SessionStore for UnavailableSessions {
    fn load(&self, _session: &SessionId) -> Result<Option<SessionSnapshot>, SessionError> {
        Err(SessionError::Unavailable("cache offline".to_string()))
    }

    fn save(&self, _session: &SessionId, _snapshot: SessionSnapshot) -> Result<(), SessionError> {
        Err(SessionError::Unavailable("cache offline".to_string()))
    }

    fn clear(&self, _session: &SessionId) -> Result<(), SessionError> {
        Err(SessionError::Unavailable("cache offline".to_string()))
    }
}

pub(super) fn build_service(
    stub: StubScoringService,
) -> (
    ScreeningService<StubScoringService, InMemorySessionStore>,
    Arc<StubScoringService>,
    Arc<InMemorySessionStore>,
) {
    let scoring = Arc::new(stub);
    let sessions = Arc::new(InMemorySessionStore::default());
    let service = ScreeningService::new(scoring.clone(), sessions.clone(), ttl());
    (service, scoring, sessions)
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
