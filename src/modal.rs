//! Confirmation dialog state.
//!
//! The modal never runs anything itself. It holds a [`PendingCommand`] that
//! the controller takes and executes when the user confirms, so the confirm
//! step can be inspected without the calling context.
use crate::flow::FlowDescriptor;

pub const DEFAULT_OK_LABEL: &str = "Confirm";
pub const DEFAULT_CANCEL_LABEL: &str = "Cancel";

/// Semantic accent for the modal title.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TitleColor {
    #[default]
    Neutral,
    Destructive,
}

/// Deferred operation bound to the confirm button.
#[derive(Debug, Clone, PartialEq)]
pub enum PendingCommand {
    EnableFlow(FlowDescriptor),
    DisableFlow(FlowDescriptor),
}

/// What pressing a modal button does.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ButtonAction {
    /// Run the pending command (ok) or dismiss the prompt (cancel).
    Confirm,
    Navigate(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ModalState {
    pub title: String,
    pub body: String,
    pub ok_label: String,
    pub cancel_label: String,
    pub ok_link: Option<String>,
    pub cancel_link: Option<String>,
    pub pending: Option<PendingCommand>,
    pub busy: bool,
    pub title_color: TitleColor,
    pub visible: bool,
}

impl Default for ModalState {
    fn default() -> Self {
        Self {
            title: String::new(),
            body: String::new(),
            ok_label: DEFAULT_OK_LABEL.to_string(),
            cancel_label: DEFAULT_CANCEL_LABEL.to_string(),
            ok_link: None,
            cancel_link: None,
            pending: None,
            busy: false,
            title_color: TitleColor::Neutral,
            visible: false,
        }
    }
}

#[derive(Debug, Default)]
pub struct ModalController {
    state: ModalState,
}

impl ModalController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> &ModalState {
        &self.state
    }

    pub fn is_visible(&self) -> bool {
        self.state.visible
    }

    pub fn is_busy(&self) -> bool {
        self.state.busy
    }

    /// Restore every content field to its default. Visibility is untouched.
    pub fn reset(&mut self) {
        let visible = self.state.visible;
        self.state = ModalState {
            visible,
            ..ModalState::default()
        };
    }

    /// Set prompt content and the command to run on confirm. Does not show
    /// the modal.
    pub fn configure(
        &mut self,
        title: impl Into<String>,
        body: impl Into<String>,
        pending: Option<PendingCommand>,
        title_color: TitleColor,
    ) {
        self.state.title = title.into();
        self.state.body = body.into();
        self.state.pending = pending;
        self.state.title_color = title_color;
    }

    pub fn set_labels(&mut self, ok: impl Into<String>, cancel: impl Into<String>) {
        self.state.ok_label = ok.into();
        self.state.cancel_label = cancel.into();
    }

    /// A link turns its button into navigation instead of confirm/cancel.
    pub fn set_links(&mut self, ok: Option<String>, cancel: Option<String>) {
        self.state.ok_link = ok;
        self.state.cancel_link = cancel;
    }

    pub fn show(&mut self) {
        self.state.visible = true;
    }

    /// Hide the modal. Displayed content stays until the next reset, but the
    /// pending command is dropped since it may only exist while visible.
    pub fn hide(&mut self) {
        self.state.visible = false;
        self.state.pending = None;
    }

    pub fn set_busy(&mut self, busy: bool) {
        self.state.busy = busy;
    }

    pub fn take_pending(&mut self) -> Option<PendingCommand> {
        self.state.pending.take()
    }

    pub fn ok_action(&self) -> ButtonAction {
        match &self.state.ok_link {
            Some(link) => ButtonAction::Navigate(link.clone()),
            None => ButtonAction::Confirm,
        }
    }

    pub fn cancel_action(&self) -> ButtonAction {
        match &self.state.cancel_link {
            Some(link) => ButtonAction::Navigate(link.clone()),
            None => ButtonAction::Confirm,
        }
    }
}
