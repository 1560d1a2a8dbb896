use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use serde_json::json;

use crate::Result;
use crate::logging::{LogLevel, Logger, emit, json_kv};
use crate::render::wrap_to_width;
use crate::runtime::focus::SharedFocus;
use crate::runtime::{EventFlow, PagePlugin, RuntimeContext, RuntimeEvent};

use super::worker::ChatWorker;

const GREETING: &str = "Olá. Respire fundo. Como posso ajudar com o EPPA 2025?";
const PENDING_MARKER: &str = "respirando...";

#[derive(Debug, Clone)]
pub struct ChatZones {
    pub log: String,
    pub input: String,
}

impl Default for ChatZones {
    fn default() -> Self {
        Self {
            log: "eppa:chat.log".to_string(),
            input: "eppa:chat.input".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Speaker {
    Visitor,
    Assistant,
}

/// Transcript plus input line. Only one request is in flight at a time.
pub struct ChatPlugin {
    worker: ChatWorker,
    focus: SharedFocus,
    zones: ChatZones,
    transcript: Vec<(Speaker, String)>,
    input: String,
    pending: bool,
    needs_draw: bool,
    logger: Option<Logger>,
}

impl ChatPlugin {
    pub fn new(worker: ChatWorker, focus: SharedFocus) -> Self {
        Self {
            worker,
            focus,
            zones: ChatZones::default(),
            transcript: vec![(Speaker::Assistant, GREETING.to_string())],
            input: String::new(),
            pending: false,
            needs_draw: true,
            logger: None,
        }
    }

    pub fn with_zones(mut self, zones: ChatZones) -> Self {
        self.zones = zones;
        self
    }

    pub fn with_logger(mut self, logger: Logger) -> Self {
        self.logger = Some(logger);
        self
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }

    fn focused(&self) -> bool {
        self.focus.is_focused(&self.zones.input) || self.focus.is_focused(&self.zones.log)
    }

    fn submit(&mut self) {
        if self.pending {
            return;
        }
        let prompt = self.input.trim().to_string();
        if prompt.is_empty() {
            self.input.clear();
            return;
        }
        match self.worker.submit(prompt.clone()) {
            Ok(()) => {
                self.transcript.push((Speaker::Visitor, prompt));
                self.input.clear();
                self.pending = true;
            }
            Err(err) => emit(
                self.logger.as_ref(),
                LogLevel::Error,
                "eppa::chat",
                "chat_submit_failed",
                [json_kv("error", json!(err.to_string()))],
            ),
        }
        self.needs_draw = true;
    }

    fn handle_key(&mut self, key: &KeyEvent) -> EventFlow {
        if key.kind == KeyEventKind::Release || !self.focused() {
            return EventFlow::Continue;
        }
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            return EventFlow::Continue;
        }
        match key.code {
            KeyCode::Enter => self.submit(),
            KeyCode::Backspace => {
                self.input.pop();
            }
            KeyCode::Esc => self.input.clear(),
            KeyCode::Char(ch) => self.input.push(ch),
            _ => return EventFlow::Continue,
        }
        self.needs_draw = true;
        EventFlow::Consumed
    }

    fn poll_reply(&mut self) {
        if !self.pending {
            return;
        }
        if let Some(reply) = self.worker.try_reply() {
            self.transcript.push((Speaker::Assistant, reply.text));
            self.pending = false;
            self.needs_draw = true;
        }
    }

    /// Wrap the transcript to the zone and keep the newest rows at the bottom.
    fn render_log(&self, width: usize, height: usize) -> String {
        let text = self
            .transcript
            .iter()
            .map(|(speaker, text)| match speaker {
                Speaker::Visitor => format!("Você: {text}"),
                Speaker::Assistant => format!("Zen: {text}"),
            })
            .collect::<Vec<_>>()
            .join("\n");
        let lines = wrap_to_width(&text, width.max(1));
        let skip = lines.len().saturating_sub(height.max(1));
        lines[skip..].join("\n")
    }

    fn render_input(&self) -> String {
        if self.pending {
            format!("> {PENDING_MARKER}")
        } else if self.focused() {
            format!("> {}_", self.input)
        } else {
            format!("> {}", self.input)
        }
    }
}

impl PagePlugin for ChatPlugin {
    fn name(&self) -> &str {
        "eppa.chat"
    }

    fn on_event(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        let flow = match event {
            RuntimeEvent::Key(key) => self.handle_key(key),
            RuntimeEvent::Paste(data) if self.focused() && !self.pending => {
                self.input.push_str(data.trim_end_matches(['\r', '\n']));
                self.needs_draw = true;
                EventFlow::Consumed
            }
            RuntimeEvent::Tick { .. } => {
                self.poll_reply();
                EventFlow::Continue
            }
            RuntimeEvent::Resize(_) => {
                self.needs_draw = true;
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
        // Focus moves through the shell, so the caret is redrawn every frame.
        let (width, height) = ctx
            .rect(&self.zones.log)
            .map(|rect| (rect.width as usize, rect.height as usize))
            .unwrap_or((1, 1));
        if self.needs_draw {
            ctx.set_zone(self.zones.log.clone(), self.render_log(width, height));
            self.needs_draw = false;
        }
        ctx.set_zone(self.zones.input.clone(), self.render_input());
        Ok(())
    }
}
