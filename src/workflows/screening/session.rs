use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use super::domain::{ScoreResult, SessionId, TenantInputPayload};

const SESSION_ID_MAX_LEN: usize = 128;

/// Last submitted payload and its score, scoped to one operator session.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionSnapshot {
    #[serde(default)]
    pub payload: Option<TenantInputPayload>,
    #[serde(default)]
    pub score: Option<ScoreResult>,
    pub saved_at: DateTime<Utc>,
}

impl SessionSnapshot {
    pub fn new(
        payload: Option<TenantInputPayload>,
        score: Option<ScoreResult>,
        saved_at: DateTime<Utc>,
    ) -> Self {
        Self {
            payload,
            score,
            saved_at,
        }
    }

    pub fn is_expired(&self, now: DateTime<Utc>, ttl: Duration) -> bool {
        now.signed_duration_since(self.saved_at) > ttl
    }

    pub fn is_empty(&self) -> bool {
        self.payload.is_none() && self.score.is_none()
    }
}

/// Session cache abstraction; implementations must be safe to share across requests.
pub trait SessionStore: Send + Sync {
    fn load(&self, session: &SessionId) -> Result<Option<SessionSnapshot>, SessionError>;
    fn save(&self, session: &SessionId, snapshot: SessionSnapshot) -> Result<(), SessionError>;
    fn clear(&self, session: &SessionId) -> Result<(), SessionError>;
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("invalid session id `{0}`")]
    InvalidId(String),
    #[error("session storage unavailable: {0}")]
    Unavailable(String),
    #[error("session file {path} could not be accessed: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("session snapshot could not be encoded: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Accept an optional header value as a session id; blank selects the default session.
pub fn session_from_header(value: Option<&str>) -> Result<SessionId, SessionError> {
    match value.map(str::trim) {
        None | Some("") => Ok(SessionId::default_session()),
        Some(raw) => validate_session_id(raw).map(|()| SessionId(raw.to_string())),
    }
}

fn validate_session_id(raw: &str) -> Result<(), SessionError> {
    let valid = !raw.is_empty()
        && raw.len() <= SESSION_ID_MAX_LEN
        && raw
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_');
    if valid {
        Ok(())
    } else {
        Err(SessionError::InvalidId(raw.to_string()))
    }
}

/// Process-local cache, the default for the served API and tests.
///
/// With a TTL, every save also drops snapshots that have expired relative to the new one.
#[derive(Debug, Default, Clone)]
pub struct InMemorySessionStore {
    snapshots: Arc<Mutex<HashMap<SessionId, SessionSnapshot>>>,
    ttl: Option<Duration>,
}

impl InMemorySessionStore {
    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            snapshots: Arc::default(),
            ttl: Some(ttl),
        }
    }

    pub fn len(&self) -> Result<usize, SessionError> {
        Ok(self.guard()?.len())
    }

    pub fn is_empty(&self) -> Result<bool, SessionError> {
        Ok(self.guard()?.is_empty())
    }

    fn guard(
        &self,
    ) -> Result<std::sync::MutexGuard<'_, HashMap<SessionId, SessionSnapshot>>, SessionError> {
        self.snapshots
            .lock()
            .map_err(|_| SessionError::Unavailable("session mutex poisoned".to_string()))
    }
}

impl SessionStore for InMemorySessionStore {
    fn load(&self, session: &SessionId) -> Result<Option<SessionSnapshot>, SessionError> {
        Ok(self.guard()?.get(session).cloned())
    }

    fn save(&self, session: &SessionId, snapshot: SessionSnapshot) -> Result<(), SessionError> {
        let mut snapshots = self.guard()?;
        if let Some(ttl) = self.ttl {
            let now = snapshot.saved_at;
            let before = snapshots.len();
            snapshots.retain(|_, cached| !cached.is_expired(now, ttl));
            let evicted = before - snapshots.len();
            if evicted > 0 {
                debug!(evicted, "evicted expired session snapshots");
            }
        }
        snapshots.insert(session.clone(), snapshot);
        Ok(())
    }

    fn clear(&self, session: &SessionId) -> Result<(), SessionError> {
        self.guard()?.remove(session);
        Ok(())
    }
}

/// One JSON file per session, used by the CLI so `compare` can reuse the last `score` run.
#[derive(Debug, Clone)]
pub struct FileSessionStore {
    directory: PathBuf,
}

impl FileSessionStore {
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    pub fn directory(&self) -> &Path {
        &self.directory
    }

    fn path_for(&self, session: &SessionId) -> Result<PathBuf, SessionError> {
        validate_session_id(&session.0)?;
        Ok(self.directory.join(format!("{}.json", session.0)))
    }
}

impl SessionStore for FileSessionStore {
    fn load(&self, session: &SessionId) -> Result<Option<SessionSnapshot>, SessionError> {
        let path = self.path_for(session)?;
        let raw = match fs::read(&path) {
            Ok(raw) => raw,
            Err(error) if error.kind() == ErrorKind::NotFound => return Ok(None),
            Err(source) => return Err(SessionError::Io { path, source }),
        };

        match serde_json::from_slice(&raw) {
            Ok(snapshot) => Ok(Some(snapshot)),
            Err(error) => {
                warn!(path = %path.display(), %error, "ignoring unreadable session snapshot");
                Ok(None)
            }
        }
    }

    fn save(&self, session: &SessionId, snapshot: SessionSnapshot) -> Result<(), SessionError> {
        let path = self.path_for(session)?;
        let encoded = serde_json::to_vec_pretty(&snapshot)?;
        fs::create_dir_all(&self.directory).map_err(|source| SessionError::Io {
            path: self.directory.clone(),
            source,
        })?;
        fs::write(&path, encoded).map_err(|source| SessionError::Io { path, source })
    }

    fn clear(&self, session: &SessionId) -> Result<(), SessionError> {
        let path = self.path_for(session)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(()),
            Err(error) if error.kind() == ErrorKind::NotFound => Ok(()),
            Err(source) => Err(SessionError::Io { path, source }),
        }
    }
}

/// State handed directly from the submission step to the results or comparison step.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NavigationState {
    #[serde(default)]
    pub result: Option<ScoreResult>,
    #[serde(default)]
    pub payload: Option<TenantInputPayload>,
}

impl NavigationState {
    pub fn with_payload(payload: TenantInputPayload) -> Self {
        Self {
            result: None,
            payload: Some(payload),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.result.is_none() && self.payload.is_none()
    }

    /// Accepts the tagged `{result, payload}` shape, or a bare score result from older callers.
    pub fn from_legacy_value(value: Value) -> Result<Self, serde_json::Error> {
        let tagged = value
            .as_object()
            .is_some_and(|map| map.contains_key("result") || map.contains_key("payload"));

        if tagged || value.is_null() {
            return serde_json::from_value::<Option<Self>>(value).map(Option::unwrap_or_default);
        }

        let result: ScoreResult = serde_json::from_value(value)?;
        Ok(Self {
            result: Some(result),
            payload: None,
        })
    }
}

/// Where a resolved submission came from.
#[derive(Debug, Clone, PartialEq)]
pub enum ResolvedSubmission {
    Navigation(NavigationState),
    Cached(SessionSnapshot),
    NoData,
}

impl ResolvedSubmission {
    pub fn payload(&self) -> Option<&TenantInputPayload> {
        match self {
            Self::Navigation(state) => state.payload.as_ref(),
            Self::Cached(snapshot) => snapshot.payload.as_ref(),
            Self::NoData => None,
        }
    }

    pub fn score(&self) -> Option<&ScoreResult> {
        match self {
            Self::Navigation(state) => state.result.as_ref(),
            Self::Cached(snapshot) => snapshot.score.as_ref(),
            Self::NoData => None,
        }
    }
}

/// Navigation state wins over the cache; an expired or empty cache counts as no data.
pub fn resolve_submission(
    navigation: Option<NavigationState>,
    cached: Option<SessionSnapshot>,
    now: DateTime<Utc>,
    ttl: Duration,
) -> ResolvedSubmission {
    if let Some(state) = navigation.filter(|state| !state.is_empty()) {
        return ResolvedSubmission::Navigation(state);
    }

    match cached {
        Some(snapshot) if !snapshot.is_empty() && !snapshot.is_expired(now, ttl) => {
            ResolvedSubmission::Cached(snapshot)
        }
        _ => ResolvedSubmission::NoData,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn payload() -> TenantInputPayload {
        TenantInputPayload {
            monthly_income: 4800.0,
            monthly_rent: 1500.0,
            liquid_savings: 3000.0,
            monthly_debt: 200.0,
            income_history: Some(vec![4700.0, 4800.0, 4900.0]),
        }
    }

    fn score(value: f64) -> ScoreResult {
        ScoreResult {
            score: value,
            risk_level: None,
            breakdown: None,
        }
    }

    fn at(minutes: i64) -> DateTime<Utc> {
        DateTime::<Utc>::from_timestamp(1_760_000_000, 0).expect("valid timestamp")
            + Duration::minutes(minutes)
    }

    #[test]
    fn navigation_state_takes_precedence() {
        let cached = SessionSnapshot::new(Some(payload()), Some(score(40.0)), at(0));
        let navigation = NavigationState {
            result: Some(score(75.0)),
            payload: None,
        };

        let resolved = resolve_submission(
            Some(navigation),
            Some(cached),
            at(1),
            Duration::minutes(30),
        );

        assert!(matches!(resolved, ResolvedSubmission::Navigation(_)));
        assert_eq!(resolved.score().map(|s| s.score), Some(75.0));
        assert!(resolved.payload().is_none());
    }

    #[test]
    fn falls_back_to_fresh_cache_then_no_data() {
        let cached = SessionSnapshot::new(Some(payload()), Some(score(40.0)), at(0));
        let ttl = Duration::minutes(30);

        let fresh = resolve_submission(
            Some(NavigationState::default()),
            Some(cached.clone()),
            at(30),
            ttl,
        );
        assert_eq!(fresh, ResolvedSubmission::Cached(cached.clone()));

        let expired = resolve_submission(None, Some(cached), at(31), ttl);
        assert_eq!(expired, ResolvedSubmission::NoData);

        let empty = SessionSnapshot::new(None, None, at(0));
        assert_eq!(
            resolve_submission(None, Some(empty), at(1), ttl),
            ResolvedSubmission::NoData
        );
        assert_eq!(
            resolve_submission(None, None, at(1), ttl),
            ResolvedSubmission::NoData
        );
    }

    #[test]
    fn legacy_adapter_accepts_both_shapes() {
        let tagged = NavigationState::from_legacy_value(json!({
            "result": {"score": 81.0, "risk_level": "low"},
            "payload": {
                "monthly_income": 4800.0,
                "monthly_rent": 1500.0,
                "liquid_savings": 3000.0,
                "monthly_debt": 200.0
            }
        }))
        .expect("tagged shape");
        assert_eq!(tagged.result.map(|r| r.score), Some(81.0));
        assert_eq!(tagged.payload.map(|p| p.monthly_rent), Some(1500.0));

        let bare = NavigationState::from_legacy_value(json!({
            "score": 55.0,
            "risk_level": "medium",
            "breakdown": []
        }))
        .expect("bare result");
        assert_eq!(bare.result.as_ref().map(|r| r.score), Some(55.0));
        assert!(bare.payload.is_none());

        let empty = NavigationState::from_legacy_value(Value::Null).expect("null is empty");
        assert!(empty.is_empty());

        assert!(NavigationState::from_legacy_value(json!({"unexpected": true})).is_err());
    }

    #[test]
    fn header_values_map_to_session_ids() {
        assert_eq!(
            session_from_header(None).expect("default"),
            SessionId::default_session()
        );
        assert_eq!(
            session_from_header(Some("  ")).expect("blank is default"),
            SessionId::default_session()
        );
        assert_eq!(
            session_from_header(Some("desk-7_a")).expect("valid"),
            SessionId("desk-7_a".to_string())
        );
        assert!(matches!(
            session_from_header(Some("../etc/passwd")),
            Err(SessionError::InvalidId(_))
        ));
    }

    #[test]
    fn in_memory_store_round_trips_per_session() {
        let store = InMemorySessionStore::default();
        let first = SessionId("first".to_string());
        let second = SessionId("second".to_string());
        let snapshot = SessionSnapshot::new(Some(payload()), Some(score(62.0)), at(0));

        store.save(&first, snapshot.clone()).expect("save");
        assert_eq!(store.load(&first).expect("load"), Some(snapshot));
        assert_eq!(store.load(&second).expect("load"), None);

        store.clear(&first).expect("clear");
        assert_eq!(store.load(&first).expect("load"), None);
    }

    #[test]
    fn in_memory_store_reclaims_expired_sessions_on_save() {
        let store = InMemorySessionStore::with_ttl(Duration::minutes(30));
        for index in 0..50 {
            let walk_in = SessionId(format!("walk-in-{index}"));
            store
                .save(&walk_in, SessionSnapshot::new(Some(payload()), None, at(0)))
                .expect("save");
        }
        let recent = SessionId("recent".to_string());
        store
            .save(&recent, SessionSnapshot::new(None, Some(score(70.0)), at(20)))
            .expect("save");
        assert_eq!(store.len().expect("len"), 51);

        let desk = SessionId("desk".to_string());
        store
            .save(&desk, SessionSnapshot::new(Some(payload()), None, at(45)))
            .expect("save");

        assert_eq!(store.len().expect("len"), 2);
        assert!(store.load(&recent).expect("load").is_some());
        assert!(store
            .load(&SessionId("walk-in-0".to_string()))
            .expect("load")
            .is_none());
    }

    #[test]
    fn file_store_persists_and_ignores_corrupt_files() {
        let directory = std::env::temp_dir().join(format!(
            "fair-tenant-session-test-{}",
            std::process::id()
        ));
        let store = FileSessionStore::new(&directory);
        let session = SessionId("operator-1".to_string());
        let snapshot = SessionSnapshot::new(Some(payload()), Some(score(71.5)), at(0));

        assert_eq!(store.load(&session).expect("missing file"), None);
        store.save(&session, snapshot.clone()).expect("save");
        assert_eq!(store.load(&session).expect("load"), Some(snapshot));

        fs::write(directory.join("operator-1.json"), b"{not json").expect("overwrite");
        assert_eq!(store.load(&session).expect("corrupt file"), None);

        store.clear(&session).expect("clear");
        store.clear(&session).expect("clear twice");
        assert!(matches!(
            store.load(&SessionId("bad/id".to_string())),
            Err(SessionError::InvalidId(_))
        ));

        let _ = fs::remove_dir_all(&directory);
    }
}
