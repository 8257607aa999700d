use std::sync::Arc;

use tracing::{debug, error};
use url::Url;

use trafo_auth::{AuthHeaderProvider, AuthHeaders};
use trafo_execution::ExecutionOutcome;

use crate::config::CallbackSettings;

/// Result of one delivery attempt. Failures are logged, never raised.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DeliveryReport {
    Delivered { status: u16 },
    Failed,
}

/// POSTs execution outcomes to caller-supplied callback URLs.
///
/// Each delivery uses its own client, scoped to that delivery. There is no
/// retry; a failed attempt is logged and reported.
pub struct CallbackDispatcher {
    auth: Arc<dyn AuthHeaderProvider>,
    settings: CallbackSettings,
}

impl CallbackDispatcher {
    pub fn new(auth: Arc<dyn AuthHeaderProvider>, settings: CallbackSettings) -> Self {
        Self { auth, settings }
    }

    pub async fn deliver(&self, callback_url: &Url, outcome: &ExecutionOutcome) -> DeliveryReport {
        let job_id = outcome.job_id;

        let headers = match self.auth.auth_headers(true).await {
            Ok(headers) => headers,
            Err(e) => {
                error!(
                    job_id = %job_id,
                    callback_url = %callback_url,
                    error = %e,
                    "failed to obtain auth headers for callback; sending without authentication"
                );
                AuthHeaders::empty()
            }
        };

        let client = match reqwest::Client::builder()
            .danger_accept_invalid_certs(!self.settings.verify_certs)
            .timeout(self.settings.timeout)
            .build()
        {
            Ok(client) => client,
            Err(e) => {
                error!(job_id = %job_id, callback_url = %callback_url, error = %e, "failed to build callback client");
                return DeliveryReport::Failed;
            }
        };

        let mut request = client.post(callback_url.clone()).json(outcome);
        for (name, value) in headers.iter() {
            request = request.header(name, value);
        }

        match request.send().await.and_then(|resp| resp.error_for_status()) {
            Ok(resp) => {
                let status = resp.status().as_u16();
                debug!(job_id = %job_id, callback_url = %callback_url, status, "callback delivered");
                DeliveryReport::Delivered { status }
            }
            Err(e) => {
                error!(
                    job_id = %job_id,
                    callback_url = %callback_url,
                    error = %e,
                    "failure connecting to callback url"
                );
                DeliveryReport::Failed
            }
        }
    }
}
