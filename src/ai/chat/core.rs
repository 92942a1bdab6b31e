use std::sync::Arc;

use super::error::ChatError;
use super::models::{Entry, Submission};
use super::session::{ChatSession, RunGuard, SessionConfig};
use crate::ai::provider::{CompletionProvider, SharedProvider};

/// Runs user submissions against a session, either through the single
/// selected model or through the configured chain of models.
///
/// In chain mode each model is called exactly once, in order, with the
/// full output of the previous step as its entire input. Every step's
/// entry is appended before the next call is issued so the transcript
/// order always matches chain order. Only one call is ever in flight.
///
/// Use `Orchestrator::builder()` to construct one.
pub struct Orchestrator {
    provider: SharedProvider,
}

/// A submission that holds its session's busy flag but hasn't appended
/// anything yet. Dropping it without calling `Orchestrator::execute`
/// releases the session.
pub struct PendingRun {
    run: RunGuard,
    submission: Submission,
    config: SessionConfig,
}

impl PendingRun {
    pub fn session_id(&self) -> &str {
        self.run.session_id()
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }
}

impl Orchestrator {
    pub fn builder() -> OrchestratorBuilder {
        OrchestratorBuilder::default()
    }

    /// Submit using the session's current configuration and wait for
    /// the run to finish.
    ///
    /// Returns the model entries appended by this run.
    pub async fn submit(
        &self,
        session: &ChatSession,
        submission: &Submission,
    ) -> Result<Vec<Entry>, ChatError> {
        let pending = self.start(session, submission)?;
        self.execute(session, pending).await
    }

    /// Validate the submission, snapshot the session's configuration and
    /// claim the busy flag, all without suspending. Callers that hand the
    /// run to another task use this to report `Busy` up front.
    ///
    /// An empty submission is rejected before anything is appended and
    /// without touching the busy flag.
    pub fn start(
        &self,
        session: &ChatSession,
        submission: &Submission,
    ) -> Result<PendingRun, ChatError> {
        if submission.is_empty() {
            return Err(ChatError::EmptySubmission);
        }
        // Edits made mid-run apply to the next submission
        let config = session.config();
        let run = session.begin(config.plan().len())?;
        Ok(PendingRun {
            run,
            submission: submission.clone(),
            config,
        })
    }

    /// Run a started submission on the session it was started on.
    pub async fn execute(
        &self,
        session: &ChatSession,
        pending: PendingRun,
    ) -> Result<Vec<Entry>, ChatError> {
        debug_assert_eq!(pending.session_id(), session.id());
        let PendingRun {
            run,
            submission,
            config,
        } = pending;

        let chained = config.chain.is_active();
        let plan = config.plan();

        session.append(Entry::user(&submission.display_text()));
        tracing::info!(
            "Session {} running {} [{}]",
            session.id(),
            if chained { "chain" } else { "single" },
            plan.join(" -> ")
        );

        // Attachment names only go into the displayed entry. The provider
        // sees the typed text.
        let mut current_input = submission.text;
        let mut produced = Vec::with_capacity(plan.len());

        for (i, model) in plan.iter().enumerate() {
            let step = i + 1;
            run.step(step);
            tracing::debug!("Step {}/{}: invoking {}", step, plan.len(), model);

            match self.provider.invoke(model, &current_input).await {
                Ok(response) => {
                    let entry = Entry::model(model, &response, chained);
                    session.append(entry.clone());
                    produced.push(entry);
                    current_input = response;
                }
                Err(e) => {
                    tracing::error!(
                        "Session {} step {} ({}) failed: {}. Root cause: {}",
                        session.id(),
                        step,
                        model,
                        e,
                        e.root_cause()
                    );
                    run.fail(step, model, &e.to_string());
                    return Err(ChatError::ProviderFailure {
                        step,
                        model: model.clone(),
                        source: e,
                    });
                }
            }
        }

        run.done();
        Ok(produced)
    }
}

#[derive(Default)]
pub struct OrchestratorBuilder {
    provider: Option<SharedProvider>,
}

impl OrchestratorBuilder {
    pub fn provider<P>(mut self, provider: P) -> Self
    where
        P: CompletionProvider + Send + Sync + 'static,
    {
        self.provider = Some(Arc::new(provider));
        self
    }

    pub fn shared_provider(mut self, provider: SharedProvider) -> Self {
        self.provider = Some(provider);
        self
    }

    pub fn build(self) -> anyhow::Result<Orchestrator> {
        let provider = self
            .provider
            .ok_or_else(|| anyhow::anyhow!("Orchestrator requires a completion provider"))?;
        Ok(Orchestrator { provider })
    }
}
