use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, MouseButton, MouseEventKind};

use crate::Result;
use crate::runtime::focus::SharedFocus;
use crate::runtime::{EventFlow, PagePlugin, RuntimeContext, RuntimeEvent};
use crate::width::truncate_display;
use crate::Rect;

use super::area::{Area, Floor, PlateRect};
use super::model::VenueMap;

const FOCUS_OWNER: &str = "venue";
const SELECTED_LIFT: u16 = 30;

/// Zone identifiers the map plugin draws into.
#[derive(Debug, Clone)]
pub struct VenueZones {
    pub controls: String,
    pub plate: String,
    pub card: String,
}

impl Default for VenueZones {
    fn default() -> Self {
        Self {
            controls: "eppa:map.controls".to_string(),
            plate: "eppa:map.plate".to_string(),
            card: "eppa:map.card".to_string(),
        }
    }
}

/// Project a percentage rectangle onto a plate of `width` x `height` cells.
/// The result is local to the plate, at least one cell in each direction and
/// never extends past the plate edge.
pub fn project_plate(plate: PlateRect, width: u16, height: u16) -> Rect {
    if width == 0 || height == 0 {
        return Rect::default();
    }
    let scale = |percent: u8, total: u16| (u32::from(percent.min(100)) * u32::from(total) / 100) as u16;

    let x = scale(plate.x, width).min(width - 1);
    let y = scale(plate.y, height).min(height - 1);
    let w = scale(plate.w, width).max(1).min(width - x);
    let h = scale(plate.h, height).max(1).min(height - y);
    Rect::new(x, y, w, h)
}

fn effective_depth(area: &Area, selected: Option<&str>) -> u16 {
    let lift = if selected == Some(area.id.as_str()) {
        SELECTED_LIFT
    } else {
        0
    };
    u16::from(area.depth) + lift
}

/// Topmost area under a plate-local cell. Later declarations win ties, which
/// matches paint order.
fn area_at<'a>(
    areas: &[&'a Area],
    selected: Option<&str>,
    width: u16,
    height: u16,
    column: u16,
    row: u16,
) -> Option<&'a Area> {
    areas
        .iter()
        .copied()
        .filter(|area| project_plate(area.plate, width, height).contains(column, row))
        .max_by_key(|area| effective_depth(area, selected))
}

struct Canvas {
    width: usize,
    cells: Vec<Vec<char>>,
}

impl Canvas {
    fn new(width: u16, height: u16) -> Self {
        Self {
            width: width as usize,
            cells: vec![vec![' '; width as usize]; height as usize],
        }
    }

    fn put(&mut self, x: usize, y: usize, ch: char) {
        if let Some(cell) = self.cells.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = ch;
        }
    }

    fn write(&mut self, x: usize, y: usize, text: &str) {
        for (offset, ch) in text.chars().enumerate() {
            self.put(x + offset, y, ch);
        }
    }

    fn boxed(&mut self, rect: Rect, double: bool) {
        let [tl, tr, bl, br, horizontal, vertical] = if double {
            ['╔', '╗', '╚', '╝', '═', '║']
        } else {
            ['┌', '┐', '└', '┘', '─', '│']
        };
        let (x0, y0) = (rect.x as usize, rect.y as usize);
        let (x1, y1) = (
            (rect.right() as usize).saturating_sub(1),
            (rect.bottom() as usize).saturating_sub(1),
        );

        for y in y0..=y1 {
            for x in x0..=x1 {
                self.put(x, y, ' ');
            }
        }
        if rect.width < 2 || rect.height < 2 {
            return;
        }
        for x in x0 + 1..x1 {
            self.put(x, y0, horizontal);
            self.put(x, y1, horizontal);
        }
        for y in y0 + 1..y1 {
            self.put(x0, y, vertical);
            self.put(x1, y, vertical);
        }
        self.put(x0, y0, tl);
        self.put(x1, y0, tr);
        self.put(x0, y1, bl);
        self.put(x1, y1, br);
    }

    fn into_content(self) -> String {
        let width = self.width;
        self.cells
            .into_iter()
            .map(|row| row.into_iter().take(width).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Renders the venue map and turns keys and clicks into map transitions.
pub struct VenueMapPlugin {
    map: VenueMap,
    zones: VenueZones,
    focus: SharedFocus,
    cursor: usize,
    needs_draw: bool,
}

impl VenueMapPlugin {
    pub fn new(map: VenueMap, focus: SharedFocus) -> Self {
        Self {
            map,
            zones: VenueZones::default(),
            focus,
            cursor: 0,
            needs_draw: true,
        }
    }

    pub fn with_zones(mut self, zones: VenueZones) -> Self {
        self.zones = zones;
        self
    }

    pub fn map(&self) -> &VenueMap {
        &self.map
    }

    fn cursor_area(&self) -> Option<&Area> {
        self.map.active_areas().get(self.cursor).copied()
    }

    fn move_cursor(&mut self, forward: bool) {
        let count = self.map.active_areas().len();
        if count == 0 {
            return;
        }
        self.cursor = if forward {
            (self.cursor + 1) % count
        } else {
            (self.cursor + count - 1) % count
        };
        self.needs_draw = true;
    }

    fn select_floor(&mut self, floor: Floor) {
        self.map.select_floor(floor);
        self.cursor = 0;
        self.needs_draw = true;
    }

    fn toggle_cursor(&mut self) {
        if let Some(id) = self.cursor_area().map(|area| area.id.clone()) {
            self.needs_draw |= self.map.select_area(&id);
        }
    }

    fn handle_key(&mut self, key: &KeyEvent) -> EventFlow {
        if key.kind == KeyEventKind::Release || !self.focus.is_focused(&self.zones.plate) {
            return EventFlow::Continue;
        }

        match key.code {
            KeyCode::Char(ch) if ch.is_ascii_digit() => {
                let floor = ch
                    .to_digit(10)
                    .and_then(|digit| u8::try_from(digit).ok())
                    .and_then(Floor::from_number);
                match floor {
                    Some(floor) => self.select_floor(floor),
                    None => return EventFlow::Continue,
                }
            }
            KeyCode::Left | KeyCode::Char('h') => self.move_cursor(false),
            KeyCode::Right | KeyCode::Char('l') => self.move_cursor(true),
            KeyCode::Enter | KeyCode::Char(' ') => self.toggle_cursor(),
            KeyCode::Esc | KeyCode::Char('x') => {
                self.needs_draw |= self.map.clear_selection();
            }
            _ => return EventFlow::Continue,
        }
        EventFlow::Consumed
    }

    fn handle_click(&mut self, plate: Rect, column: u16, row: u16) -> EventFlow {
        if !plate.contains(column, row) {
            return EventFlow::Continue;
        }
        if !self.focus.is_focused(&self.zones.plate) {
            self.focus.set_focus(FOCUS_OWNER, self.zones.plate.clone());
            self.needs_draw = true;
        }

        let hit = {
            let areas = self.map.active_areas();
            area_at(
                &areas,
                self.map.active_area(),
                plate.width,
                plate.height,
                column - plate.x,
                row - plate.y,
            )
            .map(|area| area.id.clone())
        };
        if let Some(id) = hit {
            if let Some(idx) = self.map.active_areas().iter().position(|area| area.id == id) {
                self.cursor = idx;
            }
            self.needs_draw |= self.map.select_area(&id);
        }
        EventFlow::Consumed
    }

    fn render_controls(&self) -> String {
        let active = self.map.active_floor();
        let mut lines = vec!["Níveis".to_string()];
        for floor in Floor::ALL.iter().rev() {
            let marker = if *floor == active { " ●" } else { "" };
            lines.push(format!("[{}] {}{}", floor.number(), floor.label(), marker));
        }
        lines.push(format!("Nível {:02} // {}", active.number(), active.theme()));
        lines.join("\n")
    }

    fn render_plate(&self, rect: Rect) -> String {
        let mut canvas = Canvas::new(rect.width, rect.height);
        let selected = self.map.active_area();
        let cursor = if self.focus.is_focused(&self.zones.plate) {
            self.cursor_area().map(|area| area.id.as_str())
        } else {
            None
        };

        let mut areas = self.map.active_areas();
        areas.sort_by_key(|area| effective_depth(area, selected));

        for area in areas {
            let cell = project_plate(area.plate, rect.width, rect.height);
            let is_selected = selected == Some(area.id.as_str());
            canvas.boxed(cell, is_selected);

            let inner = cell.inset(1);
            if inner.is_empty() {
                continue;
            }
            let pointer = if cursor == Some(area.id.as_str()) { '▸' } else { area.icon.glyph() };
            let label = format!("{pointer} {}", area.label);
            canvas.write(
                inner.x as usize,
                inner.y as usize,
                &truncate_display(&label, inner.width as usize),
            );
        }
        canvas.into_content()
    }

    fn render_card(&self) -> String {
        match self.map.describe_selection() {
            Some(summary) => format!(
                "{}\n\n{}\n{}\n\n[x] Fechar",
                summary.floor.label(),
                summary.label,
                summary.description
            ),
            None => "Selecione uma área do mapa.\n←/→ percorrer · Enter abrir · 1/2 nível"
                .to_string(),
        }
    }
}

impl PagePlugin for VenueMapPlugin {
    fn name(&self) -> &str {
        "eppa.venue_map"
    }

    fn init(&mut self, _ctx: &mut RuntimeContext<'_>) -> Result<()> {
        self.needs_draw = true;
        Ok(())
    }

    fn on_event(
        &mut self,
        ctx: &mut RuntimeContext<'_>,
        event: &RuntimeEvent,
    ) -> Result<EventFlow> {
        let flow = match event {
            RuntimeEvent::Key(key) => self.handle_key(key),
            RuntimeEvent::Mouse(mouse) if mouse.kind == MouseEventKind::Down(MouseButton::Left) => {
                match ctx.rect(&self.zones.plate).copied() {
                    Some(plate) => self.handle_click(plate, mouse.column, mouse.row),
                    None => EventFlow::Continue,
                }
            }
            RuntimeEvent::Resize(_) => {
                self.needs_draw = true;
                EventFlow::Continue
            }
            _ => EventFlow::Continue,
        };
        if flow == EventFlow::Consumed || self.needs_draw {
            ctx.request_render();
        }
        Ok(flow)
    }

    fn before_render(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        if !self.needs_draw {
            return Ok(());
        }
        self.needs_draw = false;

        ctx.set_zone(self.zones.controls.clone(), self.render_controls());
        if let Some(rect) = ctx.rect(&self.zones.plate).copied() {
            ctx.set_zone_pre_rendered(self.zones.plate.clone(), self.render_plate(rect));
        }
        ctx.set_zone(self.zones.card.clone(), self.render_card());
        Ok(())
    }
}
