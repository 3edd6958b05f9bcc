use fair_tenant::config::AppConfig;
use fair_tenant::error::AppError;
use fair_tenant::workflows::screening::session::session_from_header;
use fair_tenant::workflows::screening::{
    FileSessionStore, HttpScoringClient, InMemorySessionStore, ScreeningService,
    ScreeningServiceError, SessionId,
};
use metrics_exporter_prometheus::PrometheusHandle;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

pub(crate) type ServedScreeningService = ScreeningService<HttpScoringClient, InMemorySessionStore>;
pub(crate) type CliScreeningService = ScreeningService<HttpScoringClient, FileSessionStore>;

/// Served API: sessions live in memory, keyed by the session header, and expire after the TTL.
pub(crate) fn served_service(config: &AppConfig) -> Result<ServedScreeningService, AppError> {
    let scoring = Arc::new(HttpScoringClient::new(&config.scoring)?);
    let sessions = Arc::new(InMemorySessionStore::with_ttl(config.session.ttl));
    Ok(ScreeningService::new(scoring, sessions, config.session.ttl))
}

/// CLI: sessions persist on disk so `compare` can follow an earlier `score` run.
pub(crate) fn cli_service(config: &AppConfig) -> Result<CliScreeningService, AppError> {
    let scoring = Arc::new(HttpScoringClient::new(&config.scoring)?);
    let sessions = Arc::new(FileSessionStore::new(&config.session.directory));
    Ok(ScreeningService::new(scoring, sessions, config.session.ttl))
}

pub(crate) fn cli_session(flag: Option<&str>) -> Result<SessionId, AppError> {
    session_from_header(flag).map_err(|err| ScreeningServiceError::Session(err).into())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cli_session_defaults_and_rejects_paths() {
        assert_eq!(
            cli_session(None).expect("default session"),
            SessionId::default_session()
        );
        assert_eq!(
            cli_session(Some("desk-3")).expect("named session"),
            SessionId("desk-3".to_string())
        );
        assert!(cli_session(Some("../outside")).is_err());
    }
}
