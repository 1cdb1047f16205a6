use anyhow::{anyhow, Result};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};

use crate::error::require;
use crate::models::{Model, REJECTION_REASONS};

/// Render `field_name: value`, highlighting the focused field. Secret values
/// are shown as one `*` per character.
pub(crate) fn field_line(
    field_name: &str,
    value: &str,
    is_active: bool,
    secret: bool,
) -> Line<'static> {
    let display = if value.is_empty() {
        "<required>".to_string()
    } else if secret {
        "*".repeat(value.chars().count())
    } else {
        value.to_string()
    };

    let style = if is_active {
        Style::default().fg(Color::Yellow)
    } else if value.is_empty() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default()
    };

    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, style),
    ])
}

/// Render a picker row as `field_name: < value >`.
fn choice_line(field_name: &str, value: Option<&str>, is_active: bool) -> Line<'static> {
    let (display, style) = match value {
        Some(value) if is_active => (format!("< {value} >"), Style::default().fg(Color::Yellow)),
        Some(value) => (value.to_string(), Style::default()),
        None if is_active => (
            "< select with \u{2190}/\u{2192} >".to_string(),
            Style::default().fg(Color::Yellow),
        ),
        None => ("<select>".to_string(), Style::default().fg(Color::DarkGray)),
    };
    Line::from(vec![
        Span::raw(format!("{field_name}: ")),
        Span::styled(display, style),
    ])
}

fn accepts(ch: char) -> bool {
    !ch.is_control()
}

/// Username + password pair, used for logging in and for registering
/// operators.
#[derive(Default, Clone)]
pub(crate) struct CredentialForm {
    pub(crate) username: String,
    pub(crate) password: String,
    pub(crate) active: CredentialField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum CredentialField {
    #[default]
    Username,
    Password,
}

impl CredentialForm {
    pub(crate) fn with_username(username: &str) -> Self {
        Self {
            username: username.to_string(),
            active: if username.is_empty() {
                CredentialField::Username
            } else {
                CredentialField::Password
            },
            ..Self::default()
        }
    }

    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            CredentialField::Username => CredentialField::Password,
            CredentialField::Password => CredentialField::Username,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if !accepts(ch) {
            return false;
        }
        match self.active {
            CredentialField::Username => self.username.push(ch),
            CredentialField::Password => self.password.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            CredentialField::Username => {
                self.username.pop();
            }
            CredentialField::Password => {
                self.password.pop();
            }
        }
    }

    /// Drop the typed password after a failed attempt.
    pub(crate) fn clear_password(&mut self) {
        self.password.clear();
        self.active = CredentialField::Password;
    }

    pub(crate) fn parse_inputs(&self) -> Result<(String, String)> {
        if self.username.trim().is_empty() || self.password.is_empty() {
            return Err(anyhow!("Username & Password required."));
        }
        Ok((self.username.trim().to_string(), self.password.clone()))
    }

    pub(crate) fn build_line(&self, field: CredentialField) -> Line<'static> {
        match field {
            CredentialField::Username => field_line(
                "Username",
                &self.username,
                self.active == CredentialField::Username,
                false,
            ),
            CredentialField::Password => field_line(
                "Password",
                &self.password,
                self.active == CredentialField::Password,
                true,
            ),
        }
    }

    pub(crate) fn value_len(&self, field: CredentialField) -> usize {
        match field {
            CredentialField::Username => self.username.chars().count(),
            CredentialField::Password => self.password.chars().count(),
        }
    }
}

/// First-run admin password: typed twice.
#[derive(Default, Clone)]
pub(crate) struct AdminSetupForm {
    pub(crate) password: String,
    pub(crate) confirm: String,
    pub(crate) active: SetupField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default)]
pub(crate) enum SetupField {
    #[default]
    Password,
    Confirm,
}

impl AdminSetupForm {
    pub(crate) fn toggle_field(&mut self) {
        self.active = match self.active {
            SetupField::Password => SetupField::Confirm,
            SetupField::Confirm => SetupField::Password,
        };
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if !accepts(ch) {
            return false;
        }
        match self.active {
            SetupField::Password => self.password.push(ch),
            SetupField::Confirm => self.confirm.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            SetupField::Password => {
                self.password.pop();
            }
            SetupField::Confirm => {
                self.confirm.pop();
            }
        }
    }

    pub(crate) fn parse_inputs(&self) -> Result<String> {
        if self.password.is_empty() {
            return Err(anyhow!("Password cannot be empty."));
        }
        if self.password != self.confirm {
            return Err(anyhow!("Passwords do not match."));
        }
        Ok(self.password.clone())
    }

    pub(crate) fn build_line(&self, field: SetupField) -> Line<'static> {
        match field {
            SetupField::Password => field_line(
                "Password",
                &self.password,
                self.active == SetupField::Password,
                true,
            ),
            SetupField::Confirm => field_line(
                "Confirm",
                &self.confirm,
                self.active == SetupField::Confirm,
                true,
            ),
        }
    }

    pub(crate) fn value_len(&self, field: SetupField) -> usize {
        match field {
            SetupField::Password => self.password.chars().count(),
            SetupField::Confirm => self.confirm.chars().count(),
        }
    }
}

/// What the admin password re-check unlocks.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum AdminPurpose {
    ViewOperators,
    ClearData,
}

impl AdminPurpose {
    pub(crate) fn title(self) -> &'static str {
        match self {
            AdminPurpose::ViewOperators => "View Operator List",
            AdminPurpose::ClearData => "Clear All Data",
        }
    }
}

#[derive(Clone)]
pub(crate) struct AdminCheck {
    pub(crate) purpose: AdminPurpose,
    pub(crate) password: String,
    pub(crate) error: Option<String>,
}

impl AdminCheck {
    pub(crate) fn new(purpose: AdminPurpose) -> Self {
        Self {
            purpose,
            password: String::new(),
            error: None,
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if accepts(ch) {
            self.password.push(ch);
            true
        } else {
            false
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.password.pop();
    }

    pub(crate) fn build_line(&self) -> Line<'static> {
        field_line("Admin password", &self.password, true, true)
    }
}

#[derive(Default, Clone)]
pub(crate) struct ModelForm {
    pub(crate) name: String,
    pub(crate) error: Option<String>,
}

impl ModelForm {
    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if accepts(ch) {
            self.name.push(ch);
            true
        } else {
            false
        }
    }

    pub(crate) fn backspace(&mut self) {
        self.name.pop();
    }

    pub(crate) fn parse_inputs(&self) -> Result<String> {
        Ok(require("Model name", &self.name)?.to_string())
    }

    pub(crate) fn build_line(&self) -> Line<'static> {
        field_line("Model name", &self.name, true, false)
    }
}

/// New rejected-PCB entry. Model and rejection reason are pickers over fixed
/// lists, the other two are free text.
#[derive(Clone)]
pub(crate) struct EntryForm {
    pub(crate) pcb_id: String,
    pub(crate) stage: String,
    pub(crate) models: Vec<String>,
    pub(crate) model_idx: Option<usize>,
    pub(crate) reason_idx: Option<usize>,
    pub(crate) active: EntryField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub(crate) enum EntryField {
    PcbId,
    Model,
    Stage,
    Reason,
}

impl EntryForm {
    pub(crate) fn new(models: &[Model]) -> Self {
        Self {
            pcb_id: String::new(),
            stage: String::new(),
            models: models.iter().map(|model| model.name.clone()).collect(),
            model_idx: None,
            reason_idx: None,
            active: EntryField::PcbId,
            error: None,
        }
    }

    pub(crate) fn next_field(&mut self) {
        self.active = match self.active {
            EntryField::PcbId => EntryField::Model,
            EntryField::Model => EntryField::Stage,
            EntryField::Stage => EntryField::Reason,
            EntryField::Reason => EntryField::PcbId,
        };
    }

    pub(crate) fn previous_field(&mut self) {
        self.active = match self.active {
            EntryField::PcbId => EntryField::Reason,
            EntryField::Model => EntryField::PcbId,
            EntryField::Stage => EntryField::Model,
            EntryField::Reason => EntryField::Stage,
        };
    }

    /// Step the focused picker. Text fields ignore this.
    pub(crate) fn cycle_choice(&mut self, delta: isize) {
        match self.active {
            EntryField::Model => {
                self.model_idx = step(self.model_idx, delta, self.models.len());
            }
            EntryField::Reason => {
                self.reason_idx = step(self.reason_idx, delta, REJECTION_REASONS.len());
            }
            EntryField::PcbId | EntryField::Stage => {}
        }
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if !accepts(ch) {
            return false;
        }
        match self.active {
            EntryField::PcbId => self.pcb_id.push(ch),
            EntryField::Stage => self.stage.push(ch),
            EntryField::Model | EntryField::Reason => return false,
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            EntryField::PcbId => {
                self.pcb_id.pop();
            }
            EntryField::Stage => {
                self.stage.pop();
            }
            EntryField::Model => self.model_idx = None,
            EntryField::Reason => self.reason_idx = None,
        }
    }

    pub(crate) fn selected_model(&self) -> Option<&str> {
        self.model_idx
            .and_then(|idx| self.models.get(idx))
            .map(String::as_str)
    }

    pub(crate) fn selected_reason(&self) -> Option<&'static str> {
        self.reason_idx
            .and_then(|idx| REJECTION_REASONS.get(idx))
            .copied()
    }

    /// Validated `(pcb_id, model, stage, reason)`.
    pub(crate) fn parse_inputs(&self) -> Result<(String, String, String, String)> {
        let pcb_id = require("PCB ID", &self.pcb_id)?;
        let model = self
            .selected_model()
            .ok_or_else(|| anyhow!("Please select a model."))?;
        let stage = require("Rejection stage", &self.stage)?;
        let reason = self
            .selected_reason()
            .ok_or_else(|| anyhow!("Please select a rejection reason."))?;
        Ok((
            pcb_id.to_string(),
            model.to_string(),
            stage.to_string(),
            reason.to_string(),
        ))
    }

    pub(crate) fn build_line(&self, field: EntryField) -> Line<'static> {
        let is_active = self.active == field;
        match field {
            EntryField::PcbId => field_line("PCB ID", &self.pcb_id, is_active, false),
            EntryField::Model => choice_line("Model", self.selected_model(), is_active),
            EntryField::Stage => field_line("Rejection stage", &self.stage, is_active, false),
            EntryField::Reason => {
                choice_line("Rejection reason", self.selected_reason(), is_active)
            }
        }
    }

    pub(crate) fn value_len(&self, field: EntryField) -> usize {
        match field {
            EntryField::PcbId => self.pcb_id.chars().count(),
            EntryField::Stage => self.stage.chars().count(),
            EntryField::Model | EntryField::Reason => 0,
        }
    }
}

fn step(current: Option<usize>, delta: isize, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    let len = len as isize;
    let next = match current {
        Some(idx) => (idx as isize + delta).rem_euclid(len),
        None if delta < 0 => len - 1,
        None => 0,
    };
    Some(next as usize)
}

/// Inputs on the "Do Rework" screen.
#[derive(Default, Clone)]
pub(crate) struct ReworkForm {
    pub(crate) pcb_id: String,
    pub(crate) action: String,
    pub(crate) active: ReworkField,
    pub(crate) error: Option<String>,
}

#[derive(Copy, Clone, PartialEq, Eq, Default, Debug)]
pub(crate) enum ReworkField {
    #[default]
    PcbId,
    Action,
}

impl ReworkForm {
    pub(crate) fn focus(&mut self, field: ReworkField) {
        self.active = field;
    }

    pub(crate) fn push_char(&mut self, ch: char) -> bool {
        if !accepts(ch) {
            return false;
        }
        match self.active {
            ReworkField::PcbId => self.pcb_id.push(ch),
            ReworkField::Action => self.action.push(ch),
        }
        true
    }

    pub(crate) fn backspace(&mut self) {
        match self.active {
            ReworkField::PcbId => {
                self.pcb_id.pop();
            }
            ReworkField::Action => {
                self.action.pop();
            }
        }
    }

    pub(crate) fn build_line(&self, field: ReworkField) -> Line<'static> {
        match field {
            ReworkField::PcbId => field_line(
                "PCB ID",
                &self.pcb_id,
                self.active == ReworkField::PcbId,
                false,
            ),
            ReworkField::Action => field_line(
                "Rework action",
                &self.action,
                self.active == ReworkField::Action,
                false,
            ),
        }
    }

    pub(crate) fn value_len(&self, field: ReworkField) -> usize {
        match field {
            ReworkField::PcbId => self.pcb_id.chars().count(),
            ReworkField::Action => self.action.chars().count(),
        }
    }
}
