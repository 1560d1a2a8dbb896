use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::Result;
use crate::runtime::focus::SharedFocus;
use crate::runtime::{EventFlow, PagePlugin, RuntimeContext, RuntimeEvent};

const HEADING: &str = "Ingressos · lugares limitados";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub id: String,
    pub name: String,
    /// Whole reais.
    pub price: u32,
    pub description: String,
}

impl Ticket {
    pub fn new(id: &str, name: &str, price: u32, description: &str) -> Self {
        Self {
            id: id.to_string(),
            name: name.to_string(),
            price,
            description: description.to_string(),
        }
    }

    pub fn price_label(&self) -> String {
        format!("R${}", self.price)
    }
}

/// Ticket tiers in display order, with at most one chosen.
#[derive(Debug, Clone)]
pub struct TicketList {
    tickets: Vec<Ticket>,
    chosen: Option<String>,
}

impl TicketList {
    pub fn new(tickets: Vec<Ticket>) -> Self {
        Self {
            tickets,
            chosen: None,
        }
    }

    pub fn eppa_default() -> Self {
        Self::new(vec![
            Ticket::new("estudante", "Estudante", 49, "Acesso às palestras + Certificado Digital"),
            Ticket::new("profissional", "Profissional", 149, "Acesso total + Kit de Boas-vindas"),
            Ticket::new("vip", "Imersão VIP", 299, "Acesso total + Jantar com Palestrantes + Mentoria"),
        ])
    }

    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    pub fn get(&self, id: &str) -> Option<&Ticket> {
        self.tickets.iter().find(|ticket| ticket.id == id)
    }

    pub fn chosen(&self) -> Option<&Ticket> {
        self.chosen.as_deref().and_then(|id| self.get(id))
    }

    /// Choose `id`, or drop the choice when it is already chosen. Unknown ids
    /// are ignored.
    pub fn toggle(&mut self, id: &str) -> bool {
        if self.get(id).is_none() {
            return false;
        }
        if self.chosen.as_deref() == Some(id) {
            self.chosen = None;
        } else {
            self.chosen = Some(id.to_string());
        }
        true
    }

    pub fn clear(&mut self) -> bool {
        self.chosen.take().is_some()
    }
}

pub struct TicketsPlugin {
    tickets: TicketList,
    zone: String,
    focus: SharedFocus,
    cursor: usize,
}

impl TicketsPlugin {
    pub fn new(tickets: TicketList, focus: SharedFocus) -> Self {
        Self {
            tickets,
            zone: "eppa:tickets".to_string(),
            focus,
            cursor: 0,
        }
    }

    pub fn tickets(&self) -> &TicketList {
        &self.tickets
    }

    fn handle_key(&mut self, key: &KeyEvent) -> EventFlow {
        if key.kind == KeyEventKind::Release
            || key.modifiers.contains(KeyModifiers::CONTROL)
            || !self.focus.is_focused(&self.zone)
        {
            return EventFlow::Continue;
        }
        let count = self.tickets.tickets().len();
        if count == 0 {
            return EventFlow::Continue;
        }

        match key.code {
            KeyCode::Down | KeyCode::Char('j') => self.cursor = (self.cursor + 1) % count,
            KeyCode::Up | KeyCode::Char('k') => self.cursor = (self.cursor + count - 1) % count,
            KeyCode::Enter | KeyCode::Char(' ') => {
                let id = self.tickets.tickets()[self.cursor].id.clone();
                self.tickets.toggle(&id);
            }
            KeyCode::Esc => {
                self.tickets.clear();
            }
            _ => return EventFlow::Continue,
        }
        EventFlow::Consumed
    }

    fn render(&self) -> String {
        let chosen = self.tickets.chosen().map(|ticket| ticket.id.as_str());
        let mut lines = vec![HEADING.to_string()];
        lines.extend(self.tickets.tickets().iter().enumerate().map(|(idx, ticket)| {
            let marker = if idx == self.cursor { '▸' } else { ' ' };
            let mark = if chosen == Some(ticket.id.as_str()) { " ●" } else { "" };
            format!("{marker} {} · {}{mark}", ticket.name, ticket.price_label())
        }));
        // Detail line follows the cursor, like hovering a tier.
        if self.focus.is_focused(&self.zone) {
            if let Some(ticket) = self.tickets.tickets().get(self.cursor) {
                lines.push(ticket.description.clone());
            }
        }
        lines.join("\n")
    }
}

impl PagePlugin for TicketsPlugin {
    fn name(&self) -> &str {
        "eppa.tickets"
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
