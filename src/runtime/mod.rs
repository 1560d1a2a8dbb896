use std::collections::HashMap;
use std::io::Write;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, MouseEvent};
use serde_json::json;

use crate::logging::{emit, json_kv};
use crate::{
    AnsiRenderer, LayoutTree, LogLevel, Logger, Rect, Result, RuntimeMetrics, Size, ZoneRegistry,
};

pub mod diagnostics;
pub mod driver;
pub mod focus;

const RUNTIME_TARGET: &str = "eppa::runtime";

/// Configuration knobs for the runtime loop.
#[derive(Clone)]
pub struct RuntimeConfig {
    /// Interval between synthetic tick events.
    pub tick_interval: Duration,
    /// Optional structured logger used by the runtime.
    pub logger: Option<Logger>,
    /// Metrics accumulator used for periodic snapshots.
    pub metrics: Option<Arc<Mutex<RuntimeMetrics>>>,
    /// Interval between metrics snapshot emissions. Zero disables snapshots.
    pub metrics_interval: Duration,
    /// Target field used when emitting metrics snapshots.
    pub metrics_target: String,
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            tick_interval: Duration::from_millis(250),
            logger: None,
            metrics: None,
            metrics_interval: Duration::from_secs(5),
            metrics_target: "eppa::runtime.metrics".to_string(),
        }
    }
}

impl RuntimeConfig {
    /// Enable metrics collection if it has not already been configured.
    pub fn enable_metrics(&mut self) {
        if self.metrics.is_none() {
            self.metrics = Some(Arc::new(Mutex::new(RuntimeMetrics::new())));
        }
    }

    /// Access the shared metrics handle if metrics are enabled.
    pub fn metrics_handle(&self) -> Option<Arc<Mutex<RuntimeMetrics>>> {
        self.metrics.as_ref().map(Arc::clone)
    }
}

/// High-level events delivered to plugins.
#[derive(Debug, Clone)]
pub enum RuntimeEvent {
    Tick { elapsed: Duration },
    Key(KeyEvent),
    Mouse(MouseEvent),
    Paste(String),
    FocusGained,
    FocusLost,
    Resize(Size),
}

impl RuntimeEvent {
    fn describe(&self) -> &'static str {
        match self {
            RuntimeEvent::Tick { .. } => "tick",
            RuntimeEvent::Key(_) => "key",
            RuntimeEvent::Mouse(_) => "mouse",
            RuntimeEvent::Paste(_) => "paste",
            RuntimeEvent::FocusGained => "focus_gained",
            RuntimeEvent::FocusLost => "focus_lost",
            RuntimeEvent::Resize(_) => "resize",
        }
    }
}

/// Control the propagation of an event across plugins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventFlow {
    Continue,
    Consumed,
}

/// Context passed to plugins so they can interact with the runtime safely.
pub struct RuntimeContext<'a> {
    rects: &'a HashMap<String, Rect>,
    zone_updates: Vec<ZoneUpdate>,
    redraw_requested: bool,
    exit_requested: bool,
}

struct ZoneUpdate {
    zone_id: String,
    content: String,
    pre_rendered: bool,
}

impl<'a> RuntimeContext<'a> {
    fn new(rects: &'a HashMap<String, Rect>) -> Self {
        Self {
            rects,
            zone_updates: Vec::new(),
            redraw_requested: false,
            exit_requested: false,
        }
    }

    /// Queue new wrapped text for a zone. Applied after the plugin returns.
    pub fn set_zone(&mut self, zone_id: impl Into<String>, content: impl Into<String>) {
        self.queue(zone_id.into(), content.into(), false);
    }

    /// Queue content that is already laid out line by line for the zone.
    pub fn set_zone_pre_rendered(
        &mut self,
        zone_id: impl Into<String>,
        content: impl Into<String>,
    ) {
        self.queue(zone_id.into(), content.into(), true);
    }

    fn queue(&mut self, zone_id: String, content: String, pre_rendered: bool) {
        self.zone_updates.push(ZoneUpdate {
            zone_id,
            content,
            pre_rendered,
        });
        self.redraw_requested = true;
    }

    /// Request that the renderer runs even if no zones changed.
    pub fn request_render(&mut self) {
        self.redraw_requested = true;
    }

    /// Signal to the runtime that execution should terminate at the end of the frame.
    pub fn request_exit(&mut self) {
        self.exit_requested = true;
    }

    /// Fetch the solved rectangle for a zone if available.
    pub fn rect(&self, zone_id: &str) -> Option<&Rect> {
        self.rects.get(zone_id)
    }

    fn into_outcome(self) -> ContextOutcome {
        ContextOutcome {
            zone_updates: self.zone_updates,
            redraw_requested: self.redraw_requested,
            exit_requested: self.exit_requested,
        }
    }
}

struct ContextOutcome {
    zone_updates: Vec<ZoneUpdate>,
    redraw_requested: bool,
    exit_requested: bool,
}

/// Behaviour injection point for the runtime.
pub trait PagePlugin: Send {
    fn name(&self) -> &str {
        "page_plugin"
    }

    fn init(&mut self, _ctx: &mut RuntimeContext<'_>) -> Result<()> {
        Ok(())
    }

    fn on_event(
        &mut self,
        _ctx: &mut RuntimeContext<'_>,
        _event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        Ok(EventFlow::Continue)
    }

    fn before_render(&mut self, _ctx: &mut RuntimeContext<'_>) -> Result<()> {
        Ok(())
    }
}

struct RegisteredPlugin {
    priority: i32,
    plugin: Box<dyn PagePlugin>,
}

pub struct PageRuntime {
    layout: LayoutTree,
    rects: HashMap<String, Rect>,
    registry: ZoneRegistry,
    renderer: AnsiRenderer,
    plugins: Vec<RegisteredPlugin>,
    config: RuntimeConfig,
    should_exit: bool,
    redraw_requested: bool,
    start_instant: Option<Instant>,
    last_metrics_emit: Option<Instant>,
}

impl PageRuntime {
    pub fn new(layout: LayoutTree, renderer: AnsiRenderer, initial_size: Size) -> Result<Self> {
        Self::with_config(layout, renderer, initial_size, RuntimeConfig::default())
    }

    pub fn with_config(
        layout: LayoutTree,
        renderer: AnsiRenderer,
        initial_size: Size,
        config: RuntimeConfig,
    ) -> Result<Self> {
        let mut registry = ZoneRegistry::new();
        let rects = layout.solve(initial_size)?;
        registry.sync_layout(&rects);

        Ok(Self {
            layout,
            rects,
            registry,
            renderer,
            plugins: Vec::new(),
            config,
            should_exit: false,
            redraw_requested: true,
            start_instant: None,
            last_metrics_emit: None,
        })
    }

    pub fn config_mut(&mut self) -> &mut RuntimeConfig {
        &mut self.config
    }

    pub fn register_plugin<P>(&mut self, plugin: P)
    where
        P: PagePlugin + 'static,
    {
        self.register_plugin_with_priority(plugin, 0);
    }

    /// Lower priorities see events first; equal priorities keep registration order.
    pub fn register_plugin_with_priority<P>(&mut self, plugin: P, priority: i32)
    where
        P: PagePlugin + 'static,
    {
        self.plugins.push(RegisteredPlugin {
            priority,
            plugin: Box::new(plugin),
        });
        self.plugins.sort_by_key(|entry| entry.priority);
    }

    /// Current content of a zone, as last applied by a plugin.
    pub fn zone_content(&self, zone_id: &str) -> Option<&str> {
        self.registry.content_of(zone_id)
    }

    pub fn zone_rect(&self, zone_id: &str) -> Option<Rect> {
        self.registry.rect_of(zone_id)
    }

    pub fn run(&mut self, stdout: &mut impl Write) -> Result<()> {
        self.bootstrap(stdout)?;
        let mut last_tick = Instant::now();

        while !self.should_exit {
            let timeout = self
                .config
                .tick_interval
                .checked_sub(last_tick.elapsed())
                .unwrap_or_default();

            if event::poll(timeout)? {
                let runtime_event = self.map_event(event::read()?)?;
                self.dispatch_event(runtime_event)?;
                self.render_if_needed(stdout)?;
                if self.should_exit {
                    break;
                }
            }

            if last_tick.elapsed() >= self.config.tick_interval {
                let now = Instant::now();
                let elapsed = now.duration_since(last_tick);
                last_tick = now;
                self.dispatch_event(RuntimeEvent::Tick { elapsed })?;
                self.render_if_needed(stdout)?;
            }
        }

        self.finalize();
        Ok(())
    }

    /// Drive the runtime from a fixed event script instead of the terminal.
    pub fn run_scripted<I>(&mut self, stdout: &mut impl Write, events: I) -> Result<()>
    where
        I: IntoIterator<Item = RuntimeEvent>,
    {
        self.bootstrap(stdout)?;
        for event in events {
            if let RuntimeEvent::Resize(size) = event {
                self.resize(size)?;
            }
            self.dispatch_event(event)?;
            self.render_if_needed(stdout)?;
            if self.should_exit {
                break;
            }
        }
        self.finalize();
        Ok(())
    }

    /// Headless run: `ticks` synthetic ticks at the configured interval.
    pub fn run_headless(&mut self, stdout: &mut impl Write, ticks: u32) -> Result<()> {
        let elapsed = self.config.tick_interval;
        self.run_scripted(stdout, (0..ticks).map(|_| RuntimeEvent::Tick { elapsed }))
    }

    pub fn resize(&mut self, size: Size) -> Result<()> {
        self.rects = self.layout.solve(size)?;
        self.registry.sync_layout(&self.rects);
        self.redraw_requested = true;
        self.log(
            LogLevel::Info,
            "resized",
            [
                json_kv("width", json!(size.width)),
                json_kv("height", json!(size.height)),
            ],
        );
        Ok(())
    }

    fn dispatch_event(&mut self, event: RuntimeEvent) -> Result<()> {
        let mut consumed = false;
        for idx in 0..self.plugins.len() {
            let (flow, outcome) = {
                let mut ctx = RuntimeContext::new(&self.rects);
                let flow = self.plugins[idx].plugin.on_event(&mut ctx, &event)?;
                (flow, ctx.into_outcome())
            };
            self.apply_outcome(outcome)?;
            if flow == EventFlow::Consumed {
                consumed = true;
                break;
            }
        }
        self.with_metrics(|metrics| metrics.record_event());
        self.log(
            LogLevel::Trace,
            "event_dispatched",
            [
                json_kv("event", json!(event.describe())),
                json_kv("consumed", json!(consumed)),
            ],
        );
        self.maybe_emit_metrics();
        Ok(())
    }

    fn render_if_needed(&mut self, stdout: &mut impl Write) -> Result<()> {
        if !self.redraw_requested {
            return Ok(());
        }

        for idx in 0..self.plugins.len() {
            let outcome = {
                let mut ctx = RuntimeContext::new(&self.rects);
                self.plugins[idx].plugin.before_render(&mut ctx)?;
                ctx.into_outcome()
            };
            self.apply_outcome(outcome)?;
        }
        // Updates queued by `before_render` land in this frame.
        self.redraw_requested = false;

        let dirty = self.registry.take_dirty();
        if !dirty.is_empty() {
            self.renderer.render(stdout, &dirty)?;
            self.with_metrics(|metrics| metrics.record_render(dirty.len()));
            self.log(
                LogLevel::Trace,
                "render_completed",
                [json_kv("dirty_zones", json!(dirty.len()))],
            );
        }
        Ok(())
    }

    fn apply_outcome(&mut self, outcome: ContextOutcome) -> Result<()> {
        let ContextOutcome {
            zone_updates,
            redraw_requested,
            exit_requested,
        } = outcome;

        let update_count = zone_updates.len();
        for update in zone_updates {
            if update.pre_rendered {
                self.registry
                    .apply_pre_rendered(&update.zone_id, update.content)?;
            } else {
                self.registry.apply_content(&update.zone_id, update.content)?;
            }
        }
        if update_count > 0 {
            self.with_metrics(|metrics| metrics.record_zone_updates(update_count));
        }

        if redraw_requested {
            self.redraw_requested = true;
        }

        if exit_requested && !self.should_exit {
            self.should_exit = true;
            self.log(LogLevel::Info, "exit_requested", std::iter::empty());
        }

        Ok(())
    }

    fn map_event(&mut self, event: CrosstermEvent) -> Result<RuntimeEvent> {
        Ok(match event {
            CrosstermEvent::Key(key) => RuntimeEvent::Key(key),
            CrosstermEvent::Mouse(mouse) => RuntimeEvent::Mouse(mouse),
            CrosstermEvent::Paste(data) => RuntimeEvent::Paste(data),
            CrosstermEvent::FocusGained => RuntimeEvent::FocusGained,
            CrosstermEvent::FocusLost => RuntimeEvent::FocusLost,
            CrosstermEvent::Resize(width, height) => {
                let size = Size::new(width, height);
                self.resize(size)?;
                RuntimeEvent::Resize(size)
            }
        })
    }

    fn bootstrap(&mut self, stdout: &mut impl Write) -> Result<()> {
        self.should_exit = false;
        self.redraw_requested = true;
        if self.config.metrics_interval > Duration::ZERO {
            self.config.enable_metrics();
        }
        let now = Instant::now();
        self.start_instant = Some(now);
        self.last_metrics_emit = Some(now);
        self.log(
            LogLevel::Info,
            "runtime_started",
            [
                json_kv("plugins", json!(self.plugins.len())),
                json_kv("zones", json!(self.rects.len())),
            ],
        );

        for idx in 0..self.plugins.len() {
            let (plugin_name, outcome) = {
                let mut ctx = RuntimeContext::new(&self.rects);
                let plugin = &mut self.plugins[idx].plugin;
                plugin.init(&mut ctx)?;
                (plugin.name().to_string(), ctx.into_outcome())
            };
            self.apply_outcome(outcome)?;
            self.log(
                LogLevel::Debug,
                "plugin_initialized",
                [json_kv("plugin", json!(plugin_name))],
            );
        }

        self.render_if_needed(stdout)
    }

    fn finalize(&mut self) {
        let uptime_ms = self
            .start_instant
            .map(|start| start.elapsed().as_millis() as u64)
            .unwrap_or(0);
        self.log(
            LogLevel::Info,
            "runtime_stopped",
            [
                json_kv("uptime_ms", json!(uptime_ms)),
                json_kv("frames", json!(self.renderer.frames())),
            ],
        );
    }

    fn log<I>(&self, level: LogLevel, message: &str, fields: I)
    where
        I: IntoIterator<Item = (String, serde_json::Value)>,
    {
        emit(self.config.logger.as_ref(), level, RUNTIME_TARGET, message, fields);
    }

    fn with_metrics(&self, record: impl FnOnce(&mut RuntimeMetrics)) {
        if let Some(metrics) = self.config.metrics.as_ref() {
            if let Ok(mut guard) = metrics.lock() {
                record(&mut guard);
            }
        }
    }

    fn maybe_emit_metrics(&mut self) {
        if self.config.metrics_interval.is_zero() {
            return;
        }

        let now = Instant::now();
        if let Some(last) = self.last_metrics_emit {
            if now.duration_since(last) < self.config.metrics_interval {
                return;
            }
        }
        self.last_metrics_emit = Some(now);

        let uptime = self
            .start_instant
            .map(|start| now.duration_since(start))
            .unwrap_or_default();

        if let (Some(logger), Some(metrics)) =
            (self.config.logger.as_ref(), self.config.metrics.as_ref())
        {
            if let Ok(guard) = metrics.lock() {
                let event = guard.snapshot(uptime).to_log_event(&self.config.metrics_target);
                let _ = logger.log_event(event);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::MemorySink;
    use crate::{Constraint, Direction, LayoutNode};
    use crossterm::event::{KeyCode, KeyModifiers};

    fn two_zone_layout() -> LayoutTree {
        LayoutTree::new(LayoutNode::container(
            "root",
            Direction::Column,
            vec![Constraint::Fixed(1), Constraint::Flex(1)],
            vec![LayoutNode::leaf("top"), LayoutNode::leaf("bottom")],
        ))
    }

    struct Echo {
        zone: &'static str,
        consume: bool,
        seen: usize,
    }

    impl PagePlugin for Echo {
        fn init(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
            ctx.set_zone(self.zone, "ready");
            Ok(())
        }

        fn on_event(
            &mut self,
            ctx: &mut RuntimeContext<'_>,
            event: &RuntimeEvent,
        ) -> Result<EventFlow> {
            if let RuntimeEvent::Key(key) = event {
                self.seen += 1;
                if key.code == KeyCode::Esc {
                    ctx.request_exit();
                }
                ctx.set_zone(self.zone, format!("keys {}", self.seen));
                if self.consume {
                    return Ok(EventFlow::Consumed);
                }
            }
            Ok(EventFlow::Continue)
        }
    }

    fn key(code: KeyCode) -> RuntimeEvent {
        RuntimeEvent::Key(KeyEvent::new(code, KeyModifiers::NONE))
    }

    #[test]
    fn consumed_events_stop_at_lower_priority_plugin() {
        let mut runtime =
            PageRuntime::new(two_zone_layout(), AnsiRenderer::new(), Size::new(20, 4)).unwrap();
        runtime.register_plugin_with_priority(
            Echo {
                zone: "bottom",
                consume: false,
                seen: 0,
            },
            10,
        );
        runtime.register_plugin_with_priority(
            Echo {
                zone: "top",
                consume: true,
                seen: 0,
            },
            -10,
        );

        let mut output = Vec::new();
        runtime
            .run_scripted(&mut output, [key(KeyCode::Char('a'))])
            .unwrap();

        assert_eq!(runtime.zone_content("top"), Some("keys 1"));
        assert_eq!(runtime.zone_content("bottom"), Some("ready"));
        assert!(!output.is_empty());
    }

    #[test]
    fn exit_request_stops_script() {
        let mut runtime =
            PageRuntime::new(two_zone_layout(), AnsiRenderer::new(), Size::new(20, 4)).unwrap();
        runtime.register_plugin(Echo {
            zone: "top",
            consume: false,
            seen: 0,
        });

        let mut output = Vec::new();
        runtime
            .run_scripted(
                &mut output,
                [key(KeyCode::Esc), key(KeyCode::Char('z'))],
            )
            .unwrap();
        assert_eq!(runtime.zone_content("top"), Some("keys 1"));
    }

    #[test]
    fn resize_resolves_layout_and_logs() {
        let sink = MemorySink::new();
        let config = RuntimeConfig {
            logger: Some(Logger::new(sink.clone())),
            ..RuntimeConfig::default()
        };
        let mut runtime = PageRuntime::with_config(
            two_zone_layout(),
            AnsiRenderer::new(),
            Size::new(20, 4),
            config,
        )
        .unwrap();

        let mut output = Vec::new();
        runtime
            .run_scripted(&mut output, [RuntimeEvent::Resize(Size::new(30, 10))])
            .unwrap();

        assert_eq!(runtime.zone_rect("bottom"), Some(Rect::new(0, 1, 30, 9)));
        let messages = sink.messages();
        assert!(messages.contains(&"runtime_started".to_string()));
        assert!(messages.contains(&"resized".to_string()));
        assert!(messages.contains(&"runtime_stopped".to_string()));
    }

    #[test]
    fn headless_run_dispatches_ticks() {
        struct TickCounter(u32);
        impl PagePlugin for TickCounter {
            fn on_event(
                &mut self,
                ctx: &mut RuntimeContext<'_>,
                event: &RuntimeEvent,
            ) -> Result<EventFlow> {
                if matches!(event, RuntimeEvent::Tick { .. }) {
                    self.0 += 1;
                    ctx.set_zone("top", format!("ticks {}", self.0));
                }
                Ok(EventFlow::Continue)
            }
        }

        let mut runtime =
            PageRuntime::new(two_zone_layout(), AnsiRenderer::new(), Size::new(20, 4)).unwrap();
        runtime.register_plugin(TickCounter(0));
        let mut output = Vec::new();
        runtime.run_headless(&mut output, 3).unwrap();
        assert_eq!(runtime.zone_content("top"), Some("ticks 3"));
    }
}
