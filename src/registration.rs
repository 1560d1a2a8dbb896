//! Event registration form with a simulated submission round-trip.

use std::time::Duration;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use serde_json::json;
use thiserror::Error;

use crate::Result;
use crate::logging::{LogLevel, Logger, emit, json_kv};
use crate::runtime::focus::SharedFocus;
use crate::runtime::{EventFlow, PagePlugin, RuntimeContext, RuntimeEvent};

const REGISTRATION_TARGET: &str = "eppa::registration";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FormField {
    Name,
    Email,
}

impl FormField {
    fn other(self) -> Self {
        match self {
            FormField::Name => FormField::Email,
            FormField::Email => FormField::Name,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStatus {
    Idle,
    Submitting { waited: Duration },
    Confirmed,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FormError {
    #[error("Informe seu nome.")]
    MissingName,
    #[error("Informe um e-mail válido.")]
    InvalidEmail,
}

/// One `@`, a non-empty local part, and a dotted domain with no empty labels.
pub fn validate_email(email: &str) -> bool {
    let mut parts = email.split('@');
    let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
        return false;
    };
    !local.is_empty()
        && !email.chars().any(char::is_whitespace)
        && domain.contains('.')
        && domain.split('.').all(|label| !label.is_empty())
}

#[derive(Debug, Clone)]
pub struct RegistrationForm {
    name: String,
    email: String,
    field: FormField,
    status: SubmissionStatus,
    error: Option<FormError>,
    latency: Duration,
}

impl RegistrationForm {
    pub fn new(latency: Duration) -> Self {
        Self {
            name: String::new(),
            email: String::new(),
            field: FormField::Name,
            status: SubmissionStatus::Idle,
            error: None,
            latency,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn email(&self) -> &str {
        &self.email
    }

    pub fn field(&self) -> FormField {
        self.field
    }

    pub fn status(&self) -> SubmissionStatus {
        self.status
    }

    pub fn error(&self) -> Option<&FormError> {
        self.error.as_ref()
    }

    pub fn switch_field(&mut self) {
        self.field = self.field.other();
    }

    fn editable(&self) -> bool {
        self.status == SubmissionStatus::Idle
    }

    fn current_mut(&mut self) -> &mut String {
        match self.field {
            FormField::Name => &mut self.name,
            FormField::Email => &mut self.email,
        }
    }

    pub fn push_char(&mut self, ch: char) {
        if self.editable() {
            self.current_mut().push(ch);
            self.error = None;
        }
    }

    pub fn pop_char(&mut self) {
        if self.editable() {
            self.current_mut().pop();
        }
    }

    /// Start a submission. Ignored unless the form is idle.
    pub fn submit(&mut self) -> std::result::Result<bool, FormError> {
        if !self.editable() {
            return Ok(false);
        }
        let outcome = if self.name.trim().is_empty() {
            Err(FormError::MissingName)
        } else if !validate_email(self.email.trim()) {
            Err(FormError::InvalidEmail)
        } else {
            Ok(())
        };
        match outcome {
            Ok(()) => {
                self.error = None;
                self.status = SubmissionStatus::Submitting {
                    waited: Duration::ZERO,
                };
                Ok(true)
            }
            Err(err) => {
                self.error = Some(err.clone());
                Err(err)
            }
        }
    }

    /// Advance simulated latency; returns true when the submission confirms.
    pub fn advance(&mut self, elapsed: Duration) -> bool {
        let SubmissionStatus::Submitting { waited } = self.status else {
            return false;
        };
        let waited = waited + elapsed;
        if waited >= self.latency {
            self.status = SubmissionStatus::Confirmed;
            true
        } else {
            self.status = SubmissionStatus::Submitting { waited };
            false
        }
    }

    pub fn reset(&mut self) {
        *self = Self::new(self.latency);
    }
}

pub struct RegistrationPlugin {
    form: RegistrationForm,
    zone: String,
    focus: SharedFocus,
    logger: Option<Logger>,
    needs_draw: bool,
}

impl RegistrationPlugin {
    pub fn new(form: RegistrationForm, focus: SharedFocus) -> Self {
        Self {
            form,
            zone: "eppa:form".to_string(),
            focus,
            logger: None,
            needs_draw: true,
        }
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn form(&self) -> &RegistrationForm {
        &self.form
    }

    fn log(&self, level: LogLevel, message: &str, fields: Vec<(String, serde_json::Value)>) {
        emit(self.logger.as_ref(), level, REGISTRATION_TARGET, message, fields);
    }

    fn handle_key(&mut self, key: &KeyEvent) -> EventFlow {
        if key.kind == KeyEventKind::Release
            || key.modifiers.contains(KeyModifiers::CONTROL)
            || !self.focus.is_focused(&self.zone)
        {
            return EventFlow::Continue;
        }

        match (self.form.status(), key.code) {
            (SubmissionStatus::Confirmed, KeyCode::Char('r')) => {
                self.form.reset();
                self.log(LogLevel::Debug, "form_reset", Vec::new());
            }
            (SubmissionStatus::Idle, KeyCode::Up | KeyCode::Down) => self.form.switch_field(),
            (SubmissionStatus::Idle, KeyCode::Backspace) => self.form.pop_char(),
            (SubmissionStatus::Idle, KeyCode::Char(ch)) => self.form.push_char(ch),
            (_, KeyCode::Enter) => match self.form.submit() {
                Ok(true) => self.log(LogLevel::Info, "form_submitted", Vec::new()),
                Ok(false) => {}
                Err(err) => self.log(
                    LogLevel::Debug,
                    "form_rejected",
                    vec![json_kv("reason", json!(err.to_string()))],
                ),
            },
            _ => return EventFlow::Continue,
        }
        self.needs_draw = true;
        EventFlow::Consumed
    }

    fn render(&self) -> String {
        match self.form.status() {
            SubmissionStatus::Confirmed => {
                "Inscrição Confirmada!\nEnviamos os detalhes para o seu e-mail.\n[r] Cadastrar outro e-mail"
                    .to_string()
            }
            SubmissionStatus::Submitting { .. } => "Inscrevendo...".to_string(),
            SubmissionStatus::Idle => {
                let focused = self.focus.is_focused(&self.zone);
                let line = |field: FormField, label: &str, value: &str, placeholder: &str| {
                    let marker = if focused && self.form.field() == field { '▸' } else { ' ' };
                    let shown = if value.is_empty() { placeholder } else { value };
                    format!("{marker} {label}: {shown}")
                };
                let mut lines = vec![
                    line(FormField::Name, "Nome", self.form.name(), "Seu nome completo"),
                    line(FormField::Email, "E-mail", self.form.email(), "seu@email.com"),
                    "[Enter] Inscrever-se".to_string(),
                ];
                if let Some(err) = self.form.error() {
                    lines.push(err.to_string());
                }
                lines.join("\n")
            }
        }
    }
}

impl PagePlugin for RegistrationPlugin {
    fn name(&self) -> &str {
        "eppa.registration"
    }

    fn on_event(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        let flow = match event {
            RuntimeEvent::Key(key) => self.handle_key(key),
            RuntimeEvent::Tick { elapsed } => {
                if self.form.advance(*elapsed) {
                    self.log(
                        LogLevel::Info,
                        "form_confirmed",
                        vec![json_kv("email_domain", json!(self.form.email().rsplit('@').next()))],
                    );
                    self.needs_draw = true;
                }
                EventFlow::Continue
            }
            _ => EventFlow::Continue,
        };
        if self.needs_draw {
            ctx.request_render();
        }
        Ok(flow)
    }

    fn before_render(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        // Focus markers depend on the shell, so redraw every frame; the
        // registry drops unchanged content.
        self.needs_draw = false;
        ctx.set_zone(self.zone.clone(), self.render());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use crate::runtime::focus::FocusRegistry;
    use crate::{AnsiRenderer, Constraint, Direction, LayoutNode, LayoutTree, PageRuntime, Size};
    use std::sync::Arc;

    fn filled_form() -> RegistrationForm {
        let mut form = RegistrationForm::new(Duration::from_secs(2));
        "Ana".chars().for_each(|ch| form.push_char(ch));
        form.switch_field();
        "ana@eppa.com.br".chars().for_each(|ch| form.push_char(ch));
        form
    }

    #[test]
    fn email_validation() {
        assert!(validate_email("ana@eppa.com"));
        assert!(!validate_email("ana.eppa.com"));
        assert!(!validate_email("@eppa.com"));
        assert!(!validate_email("ana@eppa"));
        assert!(!validate_email("ana@@eppa.com"));
        assert!(!validate_email("ana@eppa..com"));
        assert!(!validate_email("a na@eppa.com"));
    }

    #[test]
    fn invalid_submission_stays_idle() {
        let mut form = RegistrationForm::new(Duration::from_secs(2));
        assert_eq!(form.submit(), Err(FormError::MissingName));
        form.push_char('A');
        assert_eq!(form.submit(), Err(FormError::InvalidEmail));
        assert_eq!(form.status(), SubmissionStatus::Idle);
        assert_eq!(form.error(), Some(&FormError::InvalidEmail));
    }

    #[test]
    fn submission_confirms_after_latency() {
        let mut form = filled_form();
        assert_eq!(form.submit(), Ok(true));
        assert!(!form.advance(Duration::from_millis(1500)));
        assert!(matches!(form.status(), SubmissionStatus::Submitting { .. }));
        assert_eq!(form.submit(), Ok(false));
        assert!(form.advance(Duration::from_millis(500)));
        assert_eq!(form.status(), SubmissionStatus::Confirmed);
    }

    #[test]
    fn reset_clears_fields() {
        let mut form = filled_form();
        form.submit().unwrap();
        form.advance(Duration::from_secs(3));
        form.reset();
        assert_eq!(form.status(), SubmissionStatus::Idle);
        assert!(form.name().is_empty());
        assert!(form.email().is_empty());
        assert_eq!(form.field(), FormField::Name);
    }

    #[test]
    fn plugin_flow_through_runtime() {
        let focus = Arc::new(FocusRegistry::new());
        focus.set_focus("test", "eppa:form");
        let sink = MemorySink::new();
        let layout = LayoutTree::new(LayoutNode::container(
            "root",
            Direction::Column,
            vec![Constraint::Flex(1)],
            vec![LayoutNode::leaf("eppa:form")],
        ));
        let mut runtime = PageRuntime::new(layout, AnsiRenderer::new(), Size::new(60, 6)).unwrap();
        runtime.register_plugin(
            RegistrationPlugin::new(RegistrationForm::new(Duration::from_millis(500)), focus)
                .with_logger(Logger::new(sink.clone())),
        );

        let key = |code| RuntimeEvent::Key(KeyEvent::new(code, KeyModifiers::NONE));
        let mut events: Vec<_> = "Bia".chars().map(|ch| key(KeyCode::Char(ch))).collect();
        events.push(key(KeyCode::Down));
        events.extend("bia@eppa.org".chars().map(|ch| key(KeyCode::Char(ch))));
        events.push(key(KeyCode::Enter));

        let mut output = Vec::new();
        runtime.run_scripted(&mut output, events).unwrap();
        assert_eq!(runtime.zone_content("eppa:form"), Some("Inscrevendo..."));

        let tick = RuntimeEvent::Tick {
            elapsed: Duration::from_millis(250),
        };
        runtime
            .run_scripted(&mut output, [tick.clone(), tick])
            .unwrap();
        assert!(runtime
            .zone_content("eppa:form")
            .unwrap()
            .starts_with("Inscrição Confirmada!"));
        assert!(sink.messages().contains(&"form_confirmed".to_string()));

        runtime
            .run_scripted(&mut output, [key(KeyCode::Char('r'))])
            .unwrap();
        assert!(runtime
            .zone_content("eppa:form")
            .unwrap()
            .contains("Seu nome completo"));
    }
}
