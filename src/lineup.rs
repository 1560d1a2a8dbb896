use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::Result;
use crate::runtime::focus::SharedFocus;
use crate::runtime::{EventFlow, PagePlugin, RuntimeContext, RuntimeEvent};

/// Talks take place in the main hall.
const STAGE: &str = "Santuário Criativo";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventDay {
    First,
    Second,
}

impl EventDay {
    pub fn label(self) -> &'static str {
        match self {
            EventDay::First => "DIA 14",
            EventDay::Second => "DIA 15",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Speaker {
    pub id: String,
    pub name: String,
    pub topic: String,
    pub day: EventDay,
    pub description: String,
}

impl Speaker {
    pub fn new(
        id: &str,
        name: &str,
        topic: &str,
        day: EventDay,
        description: &str,
    ) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            topic: topic.to_string(),
            day,
            description: description.to_string(),
        }
    }
}

/// Ordered speaker list with at most one opened detail.
#[derive(Debug, Clone)]
pub struct Lineup {
    speakers: Vec<Speaker>,
    opened: Option<String>,
}

impl Lineup {
    pub fn new(speakers: Vec<Speaker>) -> Self {
        Self {
            speakers,
            opened: None,
        }
    }

    pub fn eppa_default() -> Self {
        use EventDay::{First, Second};
        Self::new(vec![
            Speaker::new("1", "Ana Silva", "Slow Branding", First, "Construindo marcas que respeitam o tempo do consumidor."),
            Speaker::new("2", "Carlos Mendez", "Saúde Mental", First, "Como criar sem exaurir: o fim da cultura do burnout nas agências."),
            Speaker::new("3", "Júlia Costa", "Dados Humanos", Second, "Olhando para os números com empatia e propósito real."),
            Speaker::new("4", "Roberto Chang", "Eco Design", Second, "Criatividade sustentável: do conceito à execução."),
            Speaker::new("5", "Marina Luz", "Narrativas Longas", Second, "O retorno do storytelling profundo na era do conteúdo rápido."),
            Speaker::new("6", "Pedro Santos", "Cultura de Paz", First, "Gestão de conflitos e comunicação não-violenta em times criativos."),
        ])
    }

    pub fn speakers(&self) -> &[Speaker] {
        &self.speakers
    }

    pub fn for_day(&self, day: EventDay) -> impl Iterator<Item = &Speaker> + '_ {
        self.speakers.iter().filter(move |speaker| speaker.day == day)
    }

    pub fn opened(&self) -> Option<&Speaker> {
        let id = self.opened.as_deref()?;
        self.speakers.iter().find(|speaker| speaker.id == id)
    }

    /// Open the detail for `id`, or close it when already open. Unknown ids
    /// are ignored.
    pub fn toggle(&mut self, id: &str) -> bool {
        if !self.speakers.iter().any(|speaker| speaker.id == id) {
            return false;
        }
        if self.opened.as_deref() == Some(id) {
            self.opened = None;
        } else {
            self.opened = Some(id.to_string());
        }
        true
    }

    pub fn close(&mut self) -> bool {
        self.opened.take().is_some()
    }
}

pub struct LineupPlugin {
    lineup: Lineup,
    zone: String,
    focus: SharedFocus,
    cursor: usize,
}

impl LineupPlugin {
    pub fn new(lineup: Lineup, focus: SharedFocus) -> Self {
        Self {
            lineup,
            zone: "eppa:lineup".to_string(),
            focus,
            cursor: 0,
        }
    }

    pub fn lineup(&self) -> &Lineup {
        &self.lineup
    }

    fn handle_key(&mut self, key: &KeyEvent) -> EventFlow {
        if key.kind == KeyEventKind::Release
            || key.modifiers.contains(KeyModifiers::CONTROL)
            || !self.focus.is_focused(&self.zone)
        {
            return EventFlow::Continue;
        }
        let count = self.lineup.speakers().len();
        if count == 0 {
            return EventFlow::Continue;
        }

        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.cursor = (self.cursor + 1) % count,
            KeyCode::Up | KeyCode::Char('k') => self.cursor = (self.cursor + count - 1) % count,
            KeyCode::Enter | KeyCode::Char(' ') => {
                let id = self.lineup.speakers()[self.cursor].id.clone();
                self.lineup.toggle(&id);
            }
            KeyCode::Esc => {
                self.lineup.close();
            }
            _ => return EventFlow::Continue,
        }
        EventFlow::Consumed
    }

    fn render(&self) -> String {
        let focused = self.focus.is_focused(&self.zone);
        let mut lines: Vec<String> = self
            .lineup
            .speakers()
            .iter()
            .enumerate()
            .map(|(idx, speaker)| {
                let marker = if focused && idx == self.cursor { '▸' } else { ' ' };
                format!(
                    "{marker} {} · {} · {}",
                    speaker.day.label(),
                    speaker.name,
                    speaker.topic
                )
            })
            .collect();

        if let Some(speaker) = self.lineup.opened() {
            lines.push(String::new());
            lines.push(format!("{} · {}", speaker.topic, speaker.name));
            lines.push(format!("{} • {STAGE}", speaker.day.label()));
            lines.push(speaker.description.clone());
        }
        lines.join("\n")
    }
}

impl PagePlugin for LineupPlugin {
    fn name(&self) -> &str {
        "eppa.lineup"
    }

    fn on_event(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        let flow = match event {
            RuntimeEvent::Key(key) => self.handle_key(key),
            _ => EventFlow::Continue,
        };
        if flow == EventFlow::Consumed {
            ctx.request_render();
        }
        Ok(flow)
    }

    fn before_render(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        ctx.set_zone(self.zone.clone(), self.render());
        Ok(())
    }
}
