//! Enablement state machine for a single flow.
//!
//! Drives a [`FlowDescriptor`] between enabled and disabled through an
//! optional confirmation prompt, one remote call, and outcome handling. The
//! visible `enabled` flag only changes after the backend reports success.
use crate::client::{EnablementClient, Outcome, GENERIC_FAILURE_MESSAGE, GENERIC_RETRY_MESSAGE};
use crate::flow::{FlowDescriptor, FlowKind, FlowListing};
use crate::modal::{ButtonAction, ModalController, PendingCommand, TitleColor};
use crate::notify::{NotificationSink, ToastPosition};
use anyhow::{anyhow, Result};
use std::fmt;

pub const QUOTA_TITLE: &str = "You've reached your connections limit!";
pub const QUOTA_BODY: &str = "Scripts are a paid feature. You can only use them with 3 connections or less. Upgrade or delete some connections to activate this script.";
pub const QUOTA_OK_LABEL: &str = "Upgrade";
pub const QUOTA_CANCEL_LABEL: &str = "Learn more";

const ENABLE_SYNC_BODY: &str =
    "Records will start syncing potentially for multiple connections. This will impact your billing.";
const DISABLE_SYNC_TITLE: &str = "Disable sync? (destructive action)";
const DISABLE_SYNC_BODY: &str = "Disabling this sync will result in the deletion of all related synced records potentially for multiple connections. The endpoints to fetch these records will no longer work.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnablementState {
    Disabled,
    AwaitingEnableConfirm,
    Enabling,
    Enabled,
    AwaitingDisableConfirm,
    Disabling,
}

impl EnablementState {
    pub fn as_str(&self) -> &'static str {
        match self {
            EnablementState::Disabled => "disabled",
            EnablementState::AwaitingEnableConfirm => "awaiting_enable_confirm",
            EnablementState::Enabling => "enabling",
            EnablementState::Enabled => "enabled",
            EnablementState::AwaitingDisableConfirm => "awaiting_disable_confirm",
            EnablementState::Disabling => "disabling",
        }
    }

    fn settled(enabled: bool) -> Self {
        if enabled {
            EnablementState::Enabled
        } else {
            EnablementState::Disabled
        }
    }
}

impl fmt::Display for EnablementState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Integration-level inputs needed to address the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleContext {
    /// Overrides the provider name as the flow's public route.
    pub raw_name: Option<String>,
    /// Every connection of the integration; disabling cascades to all.
    pub connection_ids: Vec<String>,
}

/// Result of a toggle request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToggleEffect {
    /// A confirmation prompt is now visible.
    Prompted,
    /// The remote call ran without confirmation.
    Completed(Outcome),
}

/// Result of pressing the modal's ok button.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Completed(Outcome),
    /// The button is a link; the caller opens it and the modal stays.
    Navigate(String),
}

pub struct EnablementController<C> {
    flow: FlowDescriptor,
    state: EnablementState,
    modal: ModalController,
    client: C,
    context: ToggleContext,
    notifier: Box<dyn NotificationSink>,
    reload: Box<dyn FnMut()>,
    enabling_observer: Option<Box<dyn FnMut(bool)>>,
}

impl<C: EnablementClient> EnablementController<C> {
    /// Start from the descriptor's `enabled` flag. Apply any live listing to
    /// the descriptor before constructing the controller.
    pub fn new(
        flow: FlowDescriptor,
        context: ToggleContext,
        client: C,
        notifier: Box<dyn NotificationSink>,
        reload: Box<dyn FnMut()>,
    ) -> Self {
        let state = EnablementState::settled(flow.enabled);
        Self {
            flow,
            state,
            modal: ModalController::new(),
            client,
            context,
            notifier,
            reload,
            enabling_observer: None,
        }
    }

    /// Receive `true` when an enable call is issued and `false` once it settles.
    pub fn with_enabling_observer(mut self, observer: Box<dyn FnMut(bool)>) -> Self {
        self.enabling_observer = Some(observer);
        self
    }

    pub fn state(&self) -> EnablementState {
        self.state
    }

    pub fn flow(&self) -> &FlowDescriptor {
        &self.flow
    }

    pub fn modal(&self) -> &ModalController {
        &self.modal
    }

    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn is_enabled(&self) -> bool {
        self.flow.enabled
    }

    /// The toggle control must be inert while a prompt is open or a call is
    /// pending.
    pub fn toggle_available(&self) -> bool {
        !self.modal.is_busy() && !self.modal.is_visible()
    }

    /// The inline spinner next to the toggle shows only for flows never
    /// deployed (no script version) while a call is in flight.
    pub fn show_inline_spinner(&self, show_spinner: bool) -> bool {
        show_spinner && self.flow.version.is_none() && self.modal.is_busy()
    }

    /// Overlay a freshly fetched integration listing, typically after the
    /// reload callback fired. Adopts the identity the backend assigned on
    /// creation and re-derives the settled state. Returns true when the
    /// listing holds a record for this flow.
    pub fn refresh(&mut self, listing: &FlowListing) -> Result<bool> {
        let found = self.flow.apply_live_state(listing)?;
        if matches!(
            self.state,
            EnablementState::Enabled | EnablementState::Disabled
        ) {
            self.transition(EnablementState::settled(self.flow.enabled));
        }
        Ok(found)
    }

    pub fn toggle(&mut self) -> Result<ToggleEffect> {
        if !self.toggle_available() {
            return Err(anyhow!(
                "toggle unavailable for {} {} while a prompt is open",
                self.flow.kind,
                self.flow.name
            ));
        }
        match (self.state, self.flow.kind) {
            (EnablementState::Disabled, FlowKind::Action) => {
                let outcome = self.run_enable(self.flow.clone());
                Ok(ToggleEffect::Completed(outcome))
            }
            (EnablementState::Disabled, FlowKind::Sync) => {
                self.modal.reset();
                self.modal.configure(
                    format!("Enable {}?", self.flow.kind),
                    ENABLE_SYNC_BODY,
                    Some(PendingCommand::EnableFlow(self.flow.clone())),
                    TitleColor::Neutral,
                );
                self.transition(EnablementState::AwaitingEnableConfirm);
                self.modal.show();
                Ok(ToggleEffect::Prompted)
            }
            (EnablementState::Enabled, FlowKind::Action) => {
                let outcome = self.run_disable(self.flow.clone());
                Ok(ToggleEffect::Completed(outcome))
            }
            (EnablementState::Enabled, FlowKind::Sync) => {
                self.modal.reset();
                self.modal.configure(
                    DISABLE_SYNC_TITLE,
                    DISABLE_SYNC_BODY,
                    Some(PendingCommand::DisableFlow(self.flow.clone())),
                    TitleColor::Destructive,
                );
                self.transition(EnablementState::AwaitingDisableConfirm);
                self.modal.show();
                Ok(ToggleEffect::Prompted)
            }
            (state, _) => Err(anyhow!("cannot toggle {} while {state}", self.flow.name)),
        }
    }

    /// Press the ok button of the visible modal.
    pub fn confirm(&mut self) -> Result<Resolution> {
        if !self.modal.is_visible() {
            return Err(anyhow!("no prompt to confirm for {}", self.flow.name));
        }
        if let ButtonAction::Navigate(link) = self.modal.ok_action() {
            return Ok(Resolution::Navigate(link));
        }
        let command = self
            .modal
            .take_pending()
            .ok_or_else(|| anyhow!("prompt for {} has no pending command", self.flow.name))?;
        let outcome = match command {
            PendingCommand::EnableFlow(flow) => self.run_enable(flow),
            PendingCommand::DisableFlow(flow) => self.run_disable(flow),
        };
        Ok(Resolution::Completed(outcome))
    }

    /// Press the cancel button. Returns the link to open when the cancel
    /// button is a navigation link. No backend call is made.
    pub fn cancel(&mut self) -> Option<String> {
        let link = match self.modal.cancel_action() {
            ButtonAction::Navigate(link) => Some(link),
            ButtonAction::Confirm => None,
        };
        self.modal.hide();
        self.modal.reset();
        self.transition(EnablementState::settled(self.flow.enabled));
        link
    }

    fn run_enable(&mut self, target: FlowDescriptor) -> Outcome {
        self.transition(EnablementState::Enabling);
        self.modal.set_busy(true);
        self.signal_enabling(true);

        let payload = target.to_payload(self.context.raw_name.as_deref());
        let outcome = match target.identity() {
            Some(id) => self.client.re_enable(id, &payload),
            None => self.client.create(&payload),
        };

        self.modal.set_busy(false);
        self.signal_enabling(false);
        tracing::info!(
            flow = %target.name,
            kind = %target.kind,
            outcome = outcome.label(),
            "enable settled"
        );

        match &outcome {
            Outcome::Success => {
                self.flow.enabled = true;
                self.modal.hide();
                self.transition(EnablementState::Enabled);
                (self.reload)();
            }
            Outcome::QuotaExceeded {
                upgrade_url,
                docs_url,
            } => {
                self.transition(EnablementState::Disabled);
                self.modal.reset();
                self.modal
                    .configure(QUOTA_TITLE, QUOTA_BODY, None, TitleColor::Neutral);
                self.modal.set_labels(QUOTA_OK_LABEL, QUOTA_CANCEL_LABEL);
                self.modal
                    .set_links(Some(upgrade_url.clone()), Some(docs_url.clone()));
                self.modal.show();
            }
            Outcome::Failure { message } => {
                self.modal.hide();
                self.transition(EnablementState::Disabled);
                self.notifier.notify(message, ToastPosition::BottomCenter);
            }
            Outcome::TransportFailure { .. } => {
                self.modal.hide();
                self.transition(EnablementState::Disabled);
                self.notifier
                    .notify(GENERIC_RETRY_MESSAGE, ToastPosition::BottomCenter);
            }
        }
        outcome
    }

    fn run_disable(&mut self, target: FlowDescriptor) -> Outcome {
        let Some(id) = target.identity() else {
            tracing::warn!(flow = %target.name, "disable requested for a flow without identity");
            self.modal.hide();
            self.transition(EnablementState::Enabled);
            self.notifier
                .notify(GENERIC_FAILURE_MESSAGE, ToastPosition::BottomCenter);
            return Outcome::Failure {
                message: GENERIC_FAILURE_MESSAGE.to_string(),
            };
        };

        self.transition(EnablementState::Disabling);
        self.modal.set_busy(true);

        let payload = target.to_payload(self.context.raw_name.as_deref());
        let outcome = self
            .client
            .disable(id, &target.name, &self.context.connection_ids, &payload);

        self.modal.set_busy(false);
        self.modal.hide();
        tracing::info!(
            flow = %target.name,
            kind = %target.kind,
            connections = self.context.connection_ids.len(),
            outcome = outcome.label(),
            "disable settled"
        );

        if outcome.is_success() {
            self.flow.enabled = false;
            self.transition(EnablementState::Disabled);
            (self.reload)();
        } else {
            self.transition(EnablementState::Enabled);
            self.notifier
                .notify(GENERIC_FAILURE_MESSAGE, ToastPosition::BottomCenter);
        }
        outcome
    }

    fn signal_enabling(&mut self, enabling: bool) {
        if let Some(observer) = self.enabling_observer.as_mut() {
            observer(enabling);
        }
    }

    fn transition(&mut self, next: EnablementState) {
        tracing::debug!(flow = %self.flow.name, from = %self.state, to = %next, "state transition");
        self.state = next;
    }
}

#[cfg(test)]
#[path = "controller_tests.rs"]
mod tests;
