//! Page assembly: the layout, the shell plugin that owns section focus, and
//! the wiring of every section plugin into one runtime.

use std::sync::Arc;
use std::sync::mpsc::Receiver;

use crossterm::event::{KeyCode, KeyEventKind, KeyModifiers};

use crate::chat::{ChatPlugin, ChatRelay, ChatWorker};
use crate::config::AppConfig;
use crate::countdown::{Countdown, CountdownPlugin};
use crate::lineup::{Lineup, LineupPlugin};
use crate::location::{Location, LocationPlugin};
use crate::registration::{RegistrationForm, RegistrationPlugin};
use crate::runtime::diagnostics::LifecycleLoggerPlugin;
use crate::runtime::focus::{FocusRegistry, FocusRing, SharedFocus};
use crate::runtime::{EventFlow, PagePlugin, RuntimeConfig, RuntimeContext, RuntimeEvent};
use crate::tickets::{TicketList, TicketsPlugin};
use crate::venue::{AreaCatalog, MapChange, VenueMap, VenueMapPlugin};
use crate::{
    AnsiRenderer, Constraint, Direction, LayoutNode, LayoutTree, Logger, PageRuntime, Result, Size,
};

pub const HEADER_ZONE: &str = "eppa:header";
pub const COUNTDOWN_ZONE: &str = "eppa:countdown";
pub const MAP_CONTROLS_ZONE: &str = "eppa:map.controls";
pub const MAP_PLATE_ZONE: &str = "eppa:map.plate";
pub const MAP_CARD_ZONE: &str = "eppa:map.card";
pub const LINEUP_ZONE: &str = "eppa:lineup";
pub const LOCATION_ZONE: &str = "eppa:location";
pub const TICKETS_ZONE: &str = "eppa:tickets";
pub const FORM_ZONE: &str = "eppa:form";
pub const CHAT_LOG_ZONE: &str = "eppa:chat.log";
pub const CHAT_INPUT_ZONE: &str = "eppa:chat.input";
pub const STATUS_ZONE: &str = "eppa:status";

const HEADER: &str = "EPPA 2025 · Respire\nEncontro de Publicidade e Propaganda Acadêmico · Hotel Bourbon, Joinville";

pub fn build_layout() -> LayoutTree {
    let map_row = LayoutNode::container(
        "eppa:map",
        Direction::Row,
        vec![Constraint::Fixed(22), Constraint::Flex(1)],
        vec![
            LayoutNode::leaf(MAP_CONTROLS_ZONE),
            LayoutNode::leaf(MAP_PLATE_ZONE),
        ],
    );
    let left = LayoutNode::container(
        "eppa:left",
        Direction::Column,
        vec![Constraint::Flex(1), Constraint::Fixed(11), Constraint::Fixed(5)],
        vec![
            map_row,
            LayoutNode::leaf(LINEUP_ZONE),
            LayoutNode::leaf(LOCATION_ZONE),
        ],
    )
    .with_gap(1);
    let right = LayoutNode::container(
        "eppa:right",
        Direction::Column,
        vec![
            Constraint::Fixed(7),
            Constraint::Fixed(5),
            Constraint::Fixed(5),
            Constraint::Flex(1),
            Constraint::Fixed(1),
        ],
        vec![
            LayoutNode::leaf(MAP_CARD_ZONE),
            LayoutNode::leaf(TICKETS_ZONE),
            LayoutNode::leaf(FORM_ZONE),
            LayoutNode::leaf(CHAT_LOG_ZONE),
            LayoutNode::leaf(CHAT_INPUT_ZONE),
        ],
    );
    let body = LayoutNode::container(
        "eppa:body",
        Direction::Row,
        vec![Constraint::Percent(62), Constraint::Flex(1)],
        vec![left, right],
    )
    .with_gap(2);

    LayoutTree::new(LayoutNode::container(
        "eppa:root",
        Direction::Column,
        vec![
            Constraint::Fixed(2),
            Constraint::Fixed(2),
            Constraint::Flex(1),
            Constraint::Fixed(1),
        ],
        vec![
            LayoutNode::leaf(HEADER_ZONE),
            LayoutNode::leaf(COUNTDOWN_ZONE),
            body,
            LayoutNode::leaf(STATUS_ZONE),
        ],
    ))
}

fn describe_change(change: &MapChange) -> String {
    match change {
        MapChange::FloorChanged { floor, .. } => {
            format!("nível {:02} · {}", floor.number(), floor.label())
        }
        MapChange::AreaSelected { area_id } => format!("área {area_id}"),
        MapChange::SelectionCleared { area_id } => format!("{area_id} fechada"),
    }
}

/// Header, status line and section focus. Registered ahead of the sections
/// so Tab and Ctrl+C never reach them.
pub struct ShellPlugin {
    ring: FocusRing,
    map_changes: Receiver<MapChange>,
    last_change: Option<String>,
}

impl ShellPlugin {
    pub fn new(focus: SharedFocus, map_changes: Receiver<MapChange>) -> Self {
        let ring = FocusRing::new("shell", focus)
            .with_stop(MAP_PLATE_ZONE, "mapa")
            .with_stop(LINEUP_ZONE, "lineup")
            .with_stop(TICKETS_ZONE, "ingressos")
            .with_stop(FORM_ZONE, "inscrição")
            .with_stop(CHAT_INPUT_ZONE, "assistente");
        Self {
            ring,
            map_changes,
            last_change: None,
        }
    }

    fn drain_changes(&mut self) {
        if let Some(change) = self.map_changes.try_iter().last() {
            self.last_change = Some(describe_change(&change));
        }
    }

    fn status_line(&self) -> String {
        let focus = self.ring.current_label().unwrap_or("-");
        let mut line = format!("Foco: {focus} · Tab alterna · Ctrl+C sai");
        if let Some(change) = &self.last_change {
            line.push_str(" · ");
            line.push_str(change);
        }
        line
    }
}

impl PagePlugin for ShellPlugin {
    fn name(&self) -> &str {
        "eppa.shell"
    }

    fn init(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        self.ring.ensure_focus();
        ctx.set_zone(HEADER_ZONE, HEADER);
        Ok(())
    }

    fn on_event(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        let RuntimeEvent::Key(key) = event else {
            return Ok(EventFlow::Continue);
        };
        if key.kind == KeyEventKind::Release {
            return Ok(EventFlow::Continue);
        }

        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                ctx.request_exit();
            }
            KeyCode::Tab => self.ring.advance(),
            KeyCode::BackTab => self.ring.retreat(),
            _ => return Ok(EventFlow::Continue),
        }
        ctx.request_render();
        Ok(EventFlow::Consumed)
    }

    fn before_render(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        self.drain_changes();
        ctx.set_zone(STATUS_ZONE, self.status_line());
        Ok(())
    }
}

/// Chat worker for the configured backend.
pub fn spawn_chat(config: &AppConfig, logger: Option<Logger>) -> Result<ChatWorker> {
    let relay = ChatRelay::from_settings(&config.chat, logger)?;
    Ok(ChatWorker::spawn(relay)?)
}

/// Assemble the full page runtime.
pub fn build_runtime(
    config: &AppConfig,
    logger: Option<Logger>,
    chat: ChatWorker,
    size: Size,
) -> Result<PageRuntime> {
    let runtime_config = RuntimeConfig {
        tick_interval: config.tick_interval(),
        logger: logger.clone(),
        ..RuntimeConfig::default()
    };
    let mut runtime =
        PageRuntime::with_config(build_layout(), AnsiRenderer::new(), size, runtime_config)?;

    let focus: SharedFocus = Arc::new(FocusRegistry::new());
    let mut map = VenueMap::new(AreaCatalog::eppa_default());
    if let Some(logger) = &logger {
        map = map.with_logger(logger.clone());
    }
    let map_changes = map.subscribe();

    let mut registration = RegistrationPlugin::new(
        RegistrationForm::new(config.submit_latency()),
        focus.clone(),
    );
    let mut chat = ChatPlugin::new(chat, focus.clone());
    if let Some(logger) = &logger {
        registration = registration.with_logger(logger.clone());
        chat = chat.with_logger(logger.clone());
        runtime.register_plugin_with_priority(
            LifecycleLoggerPlugin::new(logger.clone()).log_keys(false),
            -200,
        );
    }

    runtime.register_plugin_with_priority(ShellPlugin::new(focus.clone(), map_changes), -100);
    runtime.register_plugin(VenueMapPlugin::new(map, focus.clone()));
    runtime.register_plugin(LineupPlugin::new(Lineup::eppa_default(), focus.clone()));
    runtime.register_plugin(TicketsPlugin::new(TicketList::eppa_default(), focus));
    runtime.register_plugin(LocationPlugin::new(Location::eppa_default()));
    runtime.register_plugin(registration);
    runtime.register_plugin(chat);
    runtime.register_plugin(CountdownPlugin::new(Countdown::new(config.event_start()?)));
    Ok(runtime)
}
