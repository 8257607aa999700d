use std::sync::Arc;

use trafo_auth::{AuthHeaderProvider, NoAuthHeaders, PrincipalId, ServiceTokenMinter, StaticBearerToken};
use trafo_execution::ExecutionEngine;
use trafo_infra::{
    config::ServiceConfig,
    execution::ExecutionService,
    external::{CallbackDispatcher, RemoteRuntimeEngine},
    jobs::BackgroundJobRunner,
    revision_store::{InMemoryRevisionStore, RevisionStore},
};

/// Everything the handlers need, shared behind one `Arc`.
pub struct AppServices {
    pub store: Arc<dyn RevisionStore>,
    pub execution: ExecutionService,
    pub runner: BackgroundJobRunner,
}

impl AppServices {
    /// Wire services around an arbitrary engine (tests substitute their own).
    pub fn new(
        store: Arc<dyn RevisionStore>,
        engine: Arc<dyn ExecutionEngine>,
        outgoing_auth: Arc<dyn AuthHeaderProvider>,
        config: &ServiceConfig,
    ) -> Self {
        let execution = ExecutionService::new(
            engine,
            store.clone(),
            config.advanced_performance_measurement_active,
        );
        let dispatcher = Arc::new(CallbackDispatcher::new(outgoing_auth, config.callback_settings()));
        let runner = BackgroundJobRunner::new(execution.clone(), dispatcher);

        Self {
            store,
            execution,
            runner,
        }
    }

    /// Production wiring: in-memory store and the remote runtime engine.
    pub fn from_config(config: &ServiceConfig) -> anyhow::Result<Self> {
        let store: Arc<dyn RevisionStore> = Arc::new(InMemoryRevisionStore::new());
        let outgoing = outgoing_auth(config);
        let engine = Arc::new(RemoteRuntimeEngine::new(
            &config.runtime_engine_url,
            store.clone(),
            outgoing.clone(),
            config.verify_certs,
        )?);

        tracing::info!(runtime_url = %engine.runtime_url(), "using remote runtime engine");
        Ok(Self::new(store, engine, outgoing, config))
    }
}

/// Outgoing auth: a configured service token wins over a minted one.
pub fn outgoing_auth(config: &ServiceConfig) -> Arc<dyn AuthHeaderProvider> {
    if let Some(token) = &config.service_token {
        Arc::new(StaticBearerToken::new(token.clone()))
    } else if let Some(secret) = &config.jwt_secret {
        Arc::new(ServiceTokenMinter::new(secret.as_bytes().to_vec(), PrincipalId::new()))
    } else {
        Arc::new(NoAuthHeaders)
    }
}
