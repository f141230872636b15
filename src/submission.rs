use crate::errors::ResultExt;
use crate::form_controller::{FormController, FormPhase};
use crate::models::FormField;
use crate::submission_client::SubmissionPayload;
use chrono::Utc;
use serde::Serialize;

/// What happened to a submit request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum SubmitOutcome {
    /// The payload was sent (or attempted) and the confirmation is showing.
    Confirmed,
    /// Required fields are blank; nothing was sent and no state changed.
    Blocked { missing: Vec<FormField> },
    /// A submission is already running or the confirmation is up.
    Ignored { phase: FormPhase },
}

impl FormController {
    /// Submit the active record.
    ///
    /// Delivery failures (transport errors, non-success statuses) are logged
    /// and never reported: after the artificial delay the form always moves to
    /// `Confirmed`, then back to `Editing` once the dwell time has passed.
    pub async fn submit(&self) -> SubmitOutcome {
        let payload = {
            let mut state = self.lock();
            if state.phase != FormPhase::Editing {
                tracing::debug!("Submit ignored while {:?}", state.phase);
                return SubmitOutcome::Ignored { phase: state.phase };
            }

            let record = state.active_record();
            let missing = record.missing_required();
            if !missing.is_empty() {
                tracing::debug!("Submit blocked, missing fields: {:?}", missing);
                return SubmitOutcome::Blocked { missing };
            }

            state.phase = FormPhase::Submitting;
            SubmissionPayload::new(record, Utc::now())
        };

        match self
            .webhook
            .send(&payload)
            .await
            .context("Erro ao enviar cadastro")
        {
            Ok(()) => {}
            Err(e) => tracing::error!("{}", e),
        }

        tokio::time::sleep(self.submit_delay).await;

        let epoch = {
            let mut state = self.lock();
            state.phase = FormPhase::Confirmed;
            state.confirmation_epoch += 1;
            state.confirmation_epoch
        };
        tracing::info!("Registration confirmed ({})", payload.tipo_contato);

        self.schedule_return_to_editing(epoch);
        SubmitOutcome::Confirmed
    }

    fn schedule_return_to_editing(&self, epoch: u64) {
        let controller = self.clone();
        let dwell = self.confirmation_dwell;
        tokio::spawn(async move {
            tokio::time::sleep(dwell).await;
            let mut state = controller.lock();
            if state.phase == FormPhase::Confirmed && state.confirmation_epoch == epoch {
                state.phase = FormPhase::Editing;
                tracing::debug!("Confirmation dismissed, back to editing");
            }
        });
    }
}
