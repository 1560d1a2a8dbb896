use serde_json::json;

use crate::Result;
use crate::logging::{LogLevel, Logger, event_with_fields, json_kv};

use super::{EventFlow, PagePlugin, RuntimeContext, RuntimeEvent};

/// Logs input and lifecycle events for debugging sessions.
pub struct LifecycleLoggerPlugin {
    logger: Logger,
    level: LogLevel,
    log_keys: bool,
    log_mouse: bool,
    log_ticks: bool,
}

impl LifecycleLoggerPlugin {
    pub fn new(logger: Logger) -> Self {
        Self {
            logger,
            level: LogLevel::Debug,
            log_keys: true,
            log_mouse: true,
            log_ticks: false,
        }
    }

    pub fn with_level(mut self, level: LogLevel) -> Self {
        self.level = level;
        self
    }

    pub fn log_keys(mut self, enabled: bool) -> Self {
        self.log_keys = enabled;
        self
    }

    pub fn log_mouse(mut self, enabled: bool) -> Self {
        self.log_mouse = enabled;
        self
    }

    pub fn log_ticks(mut self, enabled: bool) -> Self {
        self.log_ticks = enabled;
        self
    }

    fn emit(&self, message: &str, fields: impl IntoIterator<Item = (String, serde_json::Value)>) {
        let event = event_with_fields(self.level, "eppa::runtime.lifecycle", message, fields);
        let _ = self.logger.log_event(event);
    }
}

impl PagePlugin for LifecycleLoggerPlugin {
    fn name(&self) -> &str {
        "diagnostics.lifecycle_logger"
    }

    fn init(&mut self, _ctx: &mut RuntimeContext<'_>) -> Result<()> {
        self.emit(
            "plugin_initialized",
            [json_kv("logger_level", json!(format!("{:?}", self.level)))],
        );
        Ok(())
    }

    fn on_event(
        &mut self,
        _ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        match event {
            RuntimeEvent::Key(key) if self.log_keys => {
                self.emit(
                    "event.key",
                    [
                        json_kv("code", json!(format!("{:?}", key.code))),
                        json_kv("modifiers", json!(format!("{:?}", key.modifiers))),
                    ],
                );
            }
            RuntimeEvent::Mouse(mouse) if self.log_mouse => {
                self.emit(
                    "event.mouse",
                    [
                        json_kv("kind", json!(format!("{:?}", mouse.kind))),
                        json_kv("column", json!(mouse.column)),
                        json_kv("row", json!(mouse.row)),
                    ],
                );
            }
            RuntimeEvent::Paste(data) => {
                self.emit("event.paste", [json_kv("chars", json!(data.chars().count()))]);
            }
            RuntimeEvent::Tick { elapsed } if self.log_ticks => {
                self.emit(
                    "event.tick",
                    [json_kv("elapsed_ms", json!(elapsed.as_millis() as u64))],
                );
            }
            RuntimeEvent::Resize(size) => {
                self.emit(
                    "event.resize",
                    [
                        json_kv("width", json!(size.width)),
                        json_kv("height", json!(size.height)),
                    ],
                );
            }
            _ => {}
        }

        Ok(EventFlow::Continue)
    }
}
