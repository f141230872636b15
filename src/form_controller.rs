//! Form session state: two records, the active mode, loading flags and the
//! submission phase, plus the wiring from field changes to lookups.

use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::formatters::{
    format_phone, format_postal_code, format_tax_id, has_digit_count, CEP_DIGITS, CNPJ_DIGITS,
};
use crate::models::{
    Address, BusinessRecord, ContactRecord, FormField, IndividualRecord, PersonType,
};
use crate::services::{CnpjaService, ViaCepService};
use crate::submission_client::WebhookClient;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::task::JoinHandle;

/// Where the form is in its submit cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FormPhase {
    #[default]
    Editing,
    Submitting,
    Confirmed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LookupKind {
    PostalCode,
    TaxId,
}

/// A lookup slot: one per kind and record, each with its own in-flight token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct LookupSlot {
    kind: LookupKind,
    mode: PersonType,
}

#[derive(Debug, Default)]
pub(crate) struct FormState {
    pub(crate) mode: PersonType,
    pub(crate) phase: FormPhase,
    pub(crate) individual: IndividualRecord,
    pub(crate) business: BusinessRecord,
    cep_in_flight: usize,
    cnpj_in_flight: usize,
    generations: HashMap<LookupSlot, u64>,
    /// Bumped on every confirmation so only the latest dwell timer resets the phase.
    pub(crate) confirmation_epoch: u64,
}

impl FormState {
    pub(crate) fn active_record(&self) -> ContactRecord {
        match self.mode {
            PersonType::Individual => ContactRecord::Individual(self.individual.clone()),
            PersonType::Business => ContactRecord::Business(self.business.clone()),
        }
    }

    fn address_mut(&mut self, mode: PersonType) -> &mut Address {
        match mode {
            PersonType::Individual => &mut self.individual.address,
            PersonType::Business => &mut self.business.address,
        }
    }

    fn field_mut(&mut self, field: FormField) -> Option<&mut String> {
        match self.mode {
            PersonType::Individual => self.individual.field_mut(field),
            PersonType::Business => self.business.field_mut(field),
        }
    }

    fn in_flight_mut(&mut self, kind: LookupKind) -> &mut usize {
        match kind {
            LookupKind::PostalCode => &mut self.cep_in_flight,
            LookupKind::TaxId => &mut self.cnpj_in_flight,
        }
    }

    fn next_generation(&mut self, slot: LookupSlot) -> u64 {
        let generation = self.generations.entry(slot).or_insert(0);
        *generation += 1;
        *generation
    }

    fn current_generation(&self, slot: LookupSlot) -> u64 {
        self.generations.get(&slot).copied().unwrap_or(0)
    }
}

/// Keeps a loading flag raised until dropped, whatever way the lookup ends.
struct LoadingGuard {
    state: Arc<Mutex<FormState>>,
    kind: LookupKind,
}

impl LoadingGuard {
    /// Raise the flag on an already-locked state.
    fn acquire(shared: &Arc<Mutex<FormState>>, state: &mut FormState, kind: LookupKind) -> Self {
        *state.in_flight_mut(kind) += 1;
        Self {
            state: Arc::clone(shared),
            kind,
        }
    }
}

impl Drop for LoadingGuard {
    fn drop(&mut self) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let counter = state.in_flight_mut(self.kind);
        *counter = counter.saturating_sub(1);
    }
}

/// A lookup that has been registered (token issued, loading raised) but not
/// yet sent.
pub struct PendingLookup {
    slot: LookupSlot,
    generation: u64,
    identifier: String,
    _loading: LoadingGuard,
}

impl PendingLookup {
    pub fn kind(&self) -> LookupKind {
        self.slot.kind
    }

    pub fn identifier(&self) -> &str {
        &self.identifier
    }
}

/// Serializable view of the whole form.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormSnapshot {
    pub mode: PersonType,
    pub phase: FormPhase,
    pub loading_cep: bool,
    pub loading_cnpj: bool,
    pub individual: IndividualRecord,
    pub business: BusinessRecord,
}

/// One form session.
///
/// Cheap to clone; clones share the same state. The lock is never held
/// across an `.await`.
#[derive(Clone)]
pub struct FormController {
    pub(crate) state: Arc<Mutex<FormState>>,
    via_cep: ViaCepService,
    cnpja: CnpjaService,
    pub(crate) webhook: WebhookClient,
    pub(crate) submit_delay: Duration,
    pub(crate) confirmation_dwell: Duration,
    discard_stale_lookups: bool,
}

impl FormController {
    pub fn new(config: &Config) -> Result<Self, AppError> {
        let webhook = WebhookClient::new(&config.submission_webhook_url)
            .context("Failed to create webhook client")?;

        Ok(Self {
            state: Arc::new(Mutex::new(FormState::default())),
            via_cep: ViaCepService::new(config),
            cnpja: CnpjaService::new(config),
            webhook,
            submit_delay: config.submit_delay(),
            confirmation_dwell: config.confirmation_dwell(),
            discard_stale_lookups: config.discard_stale_lookups,
        })
    }

    pub(crate) fn lock(&self) -> MutexGuard<'_, FormState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn mode(&self) -> PersonType {
        self.lock().mode
    }

    pub fn phase(&self) -> FormPhase {
        self.lock().phase
    }

    pub fn is_loading(&self, kind: LookupKind) -> bool {
        *self.lock().in_flight_mut(kind) > 0
    }

    pub fn individual(&self) -> IndividualRecord {
        self.lock().individual.clone()
    }

    pub fn business(&self) -> BusinessRecord {
        self.lock().business.clone()
    }

    pub fn active_record(&self) -> ContactRecord {
        self.lock().active_record()
    }

    pub fn snapshot(&self) -> FormSnapshot {
        let state = self.lock();
        FormSnapshot {
            mode: state.mode,
            phase: state.phase,
            loading_cep: state.cep_in_flight > 0,
            loading_cnpj: state.cnpj_in_flight > 0,
            individual: state.individual.clone(),
            business: state.business.clone(),
        }
    }

    /// Switch the active record. Neither record is cleared.
    pub fn set_mode(&self, mode: PersonType) -> Result<(), AppError> {
        let mut state = self.lock();
        if state.phase == FormPhase::Confirmed {
            return Err(AppError::BadRequest(
                "Form is showing the confirmation".to_string(),
            ));
        }
        if state.mode != mode {
            tracing::debug!("Switching form mode to {}", mode.label());
            state.mode = mode;
        }
        Ok(())
    }

    /// Write a field on the active record, applying its input mask.
    ///
    /// Returns the lookup to run when the masked value just reached the
    /// identifier length (8 digits for CEP, 14 for CNPJ).
    pub fn apply_field_change(
        &self,
        field: FormField,
        value: &str,
    ) -> Result<Option<PendingLookup>, AppError> {
        let mut state = self.lock();
        let mode = state.mode;

        if state.phase == FormPhase::Confirmed {
            return Err(AppError::BadRequest(
                "Form is showing the confirmation".to_string(),
            ));
        }
        if !field.applies_to(mode) {
            return Err(AppError::BadRequest(format!(
                "Field '{}' does not belong to {}",
                field.key(),
                mode.label()
            )));
        }

        let formatted = match field {
            FormField::Cep => format_postal_code(value),
            FormField::Telefone => format_phone(value),
            FormField::Cnpj => format_tax_id(value),
            _ => value.to_string(),
        };

        let Some(slot_value) = state.field_mut(field) else {
            return Err(AppError::InternalError(format!(
                "Field '{}' has no storage on {}",
                field.key(),
                mode.label()
            )));
        };
        *slot_value = formatted.clone();

        let kind = match field {
            FormField::Cep if has_digit_count(&formatted, CEP_DIGITS) => LookupKind::PostalCode,
            FormField::Cnpj if has_digit_count(&formatted, CNPJ_DIGITS) => LookupKind::TaxId,
            _ => return Ok(None),
        };

        Ok(Some(self.register_lookup(&mut state, kind, mode, formatted)))
    }

    /// Apply a field change and start the resulting lookup, if any, as an
    /// independent task. Earlier lookups are not cancelled.
    pub fn handle_field_change(
        &self,
        field: FormField,
        value: &str,
    ) -> Result<Option<JoinHandle<()>>, AppError> {
        let pending = self.apply_field_change(field, value)?;
        Ok(pending.map(|lookup| {
            let controller = self.clone();
            tokio::spawn(async move { controller.run_lookup(lookup).await })
        }))
    }

    /// Look up a CEP and merge the address into the `mode` record.
    /// Does nothing unless the value carries exactly 8 digits.
    pub async fn lookup_postal_code(&self, mode: PersonType, cep: &str) {
        if !has_digit_count(cep, CEP_DIGITS) {
            return;
        }
        let pending = {
            let mut state = self.lock();
            self.register_lookup(&mut state, LookupKind::PostalCode, mode, cep.to_string())
        };
        self.run_lookup(pending).await;
    }

    /// Look up a CNPJ and merge the company into the business record.
    /// Does nothing unless the value carries exactly 14 digits.
    pub async fn lookup_tax_id(&self, cnpj: &str) {
        if !has_digit_count(cnpj, CNPJ_DIGITS) {
            return;
        }
        let pending = {
            let mut state = self.lock();
            self.register_lookup(
                &mut state,
                LookupKind::TaxId,
                PersonType::Business,
                cnpj.to_string(),
            )
        };
        self.run_lookup(pending).await;
    }

    fn register_lookup(
        &self,
        state: &mut FormState,
        kind: LookupKind,
        mode: PersonType,
        identifier: String,
    ) -> PendingLookup {
        let slot = LookupSlot { kind, mode };
        let generation = state.next_generation(slot);
        let loading = LoadingGuard::acquire(&self.state, state, kind);
        PendingLookup {
            slot,
            generation,
            identifier,
            _loading: loading,
        }
    }

    /// Send a registered lookup and merge its result. Failures are logged
    /// and leave the record untouched; the loading flag drops with `lookup`.
    pub async fn run_lookup(&self, lookup: PendingLookup) {
        match lookup.slot.kind {
            LookupKind::PostalCode => {
                let result = self
                    .via_cep
                    .lookup(&lookup.identifier)
                    .await
                    .with_context(|| format!("Erro ao buscar CEP {}", lookup.identifier));
                match result {
                    Ok(Some(address)) => self.commit(&lookup, |state| {
                        state
                            .address_mut(lookup.slot.mode)
                            .apply_address_lookup(&address)
                    }),
                    Ok(None) => {}
                    Err(e) => tracing::error!("{}", e),
                }
            }
            LookupKind::TaxId => {
                let result = self
                    .cnpja
                    .lookup(&lookup.identifier)
                    .await
                    .with_context(|| format!("Erro ao buscar CNPJ {}", lookup.identifier));
                match result {
                    Ok(Some(company)) => {
                        self.commit(&lookup, |state| state.business.apply_company_lookup(&company))
                    }
                    Ok(None) => {}
                    Err(e) => tracing::error!("{}", e),
                }
            }
        }
    }

    fn commit(&self, lookup: &PendingLookup, apply: impl FnOnce(&mut FormState)) {
        let mut state = self.lock();
        if self.discard_stale_lookups && state.current_generation(lookup.slot) != lookup.generation
        {
            tracing::debug!(
                "Discarding superseded {:?} result for {}",
                lookup.slot.kind,
                lookup.identifier
            );
            return;
        }
        apply(&mut state);
    }
}
