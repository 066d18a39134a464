//! Request runner: the loop, the 401 retry, condition capture and persistence

use std::sync::Arc;
use tracing::{debug, info};

use crate::condition::{evaluate, ConditionResult};
use crate::output::write_lines;
use crate::sink::{LogSink, TracingSink};
use crate::token::SharedToken;
use crate::transport::{Headers, HttpResponse, HttpTransport, Payload};

use super::config::{RunSettings, UNAUTHORIZED};
use super::progress::RunProgress;
use super::request::RequestSpec;
use super::{DispatchError, DispatchResult};

/// Replays a request spec against one endpoint
pub struct RequestRunner {
    spec: RequestSpec,
    settings: RunSettings,
    transport: Arc<dyn HttpTransport>,
    token: Option<SharedToken>,
    sink: Arc<dyn LogSink>,
    progress: RunProgress,
    results: Vec<String>,
    condition_results: Vec<ConditionResult>,
}

impl RequestRunner {
    /// Create a runner. The total number of dispatches is fixed here.
    pub fn new(spec: RequestSpec, settings: RunSettings, transport: Arc<dyn HttpTransport>) -> Self {
        let total = RunProgress::total_for(spec.is_post(), spec.payloads().len(), settings.loops);
        let condition_results = settings
            .conditions
            .iter()
            .cloned()
            .map(ConditionResult::new)
            .collect();

        Self {
            spec,
            settings,
            transport,
            token: None,
            sink: Arc::new(TracingSink),
            progress: RunProgress::new(total),
            results: Vec::new(),
            condition_results,
        }
    }

    /// Attach a token; the runner shares it with the caller
    pub fn with_token(mut self, token: SharedToken) -> Self {
        self.token = Some(token);
        self
    }

    /// Replace the log sink
    pub fn with_sink(mut self, sink: Arc<dyn LogSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Dispatches finished so far
    pub fn completed_requests(&self) -> u64 {
        self.progress.completed()
    }

    /// Dispatches expected for the whole run
    pub fn total_requests(&self) -> u64 {
        self.progress.total()
    }

    /// Progress tracker
    pub fn progress(&self) -> &RunProgress {
        &self.progress
    }

    /// Collected bodies (empty unless output saving is on)
    pub fn results(&self) -> &[String] {
        &self.results
    }

    /// One result per configured condition, in configuration order
    pub fn condition_results(&self) -> &[ConditionResult] {
        &self.condition_results
    }

    /// Current request headers
    pub fn headers(&self) -> &Headers {
        self.spec.headers()
    }

    /// Run every loop to completion, then write the output files
    pub async fn run(&mut self) {
        info!(
            method = %self.spec.method(),
            url = %self.spec.url(),
            loops = self.settings.loops,
            total = self.progress.total(),
            "starting run"
        );

        for _ in 0..self.settings.loops {
            if self.spec.is_post() {
                let payloads = self.spec.payloads().to_vec();
                for payload in &payloads {
                    self.dispatch_and_count(payload).await;
                }
            } else {
                self.dispatch_and_count(&Payload::new()).await;
            }
        }

        if self.settings.output.save_output {
            self.save_results();
        }
        self.save_condition_results();

        info!(
            completed = self.progress.completed(),
            elapsed_ms = self.progress.elapsed().as_millis() as u64,
            rate = self.progress.rate(),
            "run finished"
        );
    }

    async fn dispatch_and_count(&mut self, payload: &Payload) {
        match self.dispatch_one(payload).await {
            Ok(response) => self.process_response(response),
            Err(e) => self.sink.error(&format!("Error during request: {e}")),
        }

        self.progress.record();
        self.sink.info(&self.progress.format_progress());

        if !self.settings.sleep_time.is_zero() {
            tokio::time::sleep(self.settings.sleep_time).await;
        }
    }

    async fn dispatch_one(&mut self, payload: &Payload) -> DispatchResult<HttpResponse> {
        let observed = self.apply_access_token().await;

        let response = self.send(payload).await?;
        if response.status != UNAUTHORIZED {
            return Ok(response);
        }

        let Some(token) = self.token.clone() else {
            return Ok(response);
        };

        debug!("received 401, refreshing access token");
        let bearer = self.refresh(&token, observed.as_deref()).await?;
        self.spec.set_authorization(bearer);

        self.send(payload).await
    }

    /// Put the current access token on the request, if there is one.
    /// Returns the access token seen, for refresh coalescing.
    async fn apply_access_token(&mut self) -> Option<String> {
        let token = self.token.as_ref()?;
        let (access, bearer) = {
            let guard = token.lock().await;
            (guard.access_token().to_string(), guard.bearer())
        };
        if !access.is_empty() {
            self.spec.set_authorization(bearer);
        }
        Some(access)
    }

    /// Refresh under the token lock and return the new bearer value.
    ///
    /// If another holder of the token replaced the access token after this
    /// request was built, that token is reused without a second refresh.
    async fn refresh(&self, token: &SharedToken, observed: Option<&str>) -> DispatchResult<String> {
        let mut guard = token.lock().await;

        if guard.is_authenticated() && observed.is_some_and(|seen| seen != guard.access_token()) {
            debug!("access token already refreshed by another runner");
            return Ok(guard.bearer());
        }

        guard
            .refresh_access_token(self.transport.as_ref(), self.spec.headers(), self.sink.as_ref())
            .await
            .map_err(DispatchError::from)?;
        Ok(guard.bearer())
    }

    async fn send(&self, payload: &Payload) -> DispatchResult<HttpResponse> {
        let request = self.spec.build(payload, self.settings.verify_tls);
        Ok(self.transport.send(&request).await?)
    }

    fn process_response(&mut self, response: HttpResponse) {
        debug!(status = response.status, bytes = response.body.len(), "processing response");

        for result in &mut self.condition_results {
            evaluate(result, &response);
        }

        if self.settings.output.save_output {
            self.results.push(response.body);
        }
    }

    fn save_results(&self) {
        let path = &self.settings.output.output_file;
        match write_lines(path, &self.results, self.settings.output.append) {
            Ok(_) => self
                .sink
                .info(&format!("All results saved to {}", path.display())),
            Err(e) => self.sink.error(&format!("Error saving results: {e}")),
        }
    }

    fn save_condition_results(&self) {
        for result in self.condition_results.iter().filter(|r| r.has_matches()) {
            let path = result.output_file();
            match write_lines(path, result.matched_bodies(), self.settings.output.append) {
                Ok(_) => self
                    .sink
                    .info(&format!("Condition results saved to {}", path.display())),
                Err(e) => self.sink.error(&format!(
                    "Error saving condition results to {}: {e}",
                    path.display()
                )),
            }
        }
    }
}
