use crate::Result;
use crate::runtime::{PagePlugin, RuntimeContext};

/// Where the event happens and how to get there.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    pub venue: String,
    pub street: String,
    pub city: String,
    pub note: String,
    pub directions_url: String,
}

impl Location {
    pub fn eppa_default() -> Self {
        Self {
            venue: "Hotel Bourbon Joinville".to_string(),
            street: "Rua Visconde de Taunay, 88 - Centro".to_string(),
            city: "Joinville - SC".to_string(),
            note: "Espaços de silêncio e jardins internos disponíveis para todos os participantes durante o evento."
                .to_string(),
            directions_url: "https://www.google.com/maps/dir//Bourbon+Joinville+Convention+Hotel"
                .to_string(),
        }
    }

    pub fn address(&self) -> String {
        format!("{}, {}", self.street, self.city)
    }

    pub fn render(&self) -> String {
        [
            format!("{} · {}", self.venue, self.address()),
            self.note.clone(),
            format!("Ver no Mapa: {}", self.directions_url),
        ]
        .join("\n")
    }
}

/// Static block written once at startup.
pub struct LocationPlugin {
    location: Location,
    zone: String,
}

impl LocationPlugin {
    pub fn new(location: Location) -> Self {
        Self {
            location,
            zone: "eppa:location".to_string(),
        }
    }
}

impl PagePlugin for LocationPlugin {
    fn name(&self) -> &str {
        "eppa.location"
    }

    fn init(&mut self, ctx: &mut RuntimeContext<'_>) -> Result<()> {
        ctx.set_zone(self.zone.clone(), self.location.render());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{AnsiRenderer, Constraint, Direction, LayoutNode, LayoutTree, PageRuntime, Size};

    #[test]
    fn default_location_points_at_the_hotel() {
        let location = Location::eppa_default();
        assert_eq!(
            location.address(),
            "Rua Visconde de Taunay, 88 - Centro, Joinville - SC"
        );
        assert!(location.directions_url.ends_with("Bourbon+Joinville+Convention+Hotel"));
    }

    #[test]
    fn plugin_fills_its_zone_on_init() {
        let layout = LayoutTree::new(LayoutNode::container(
            "root",
            Direction::Column,
            vec![Constraint::Flex(1)],
            vec![LayoutNode::leaf("eppa:location")],
        ));
        let mut runtime = PageRuntime::new(layout, AnsiRenderer::new(), Size::new(80, 6)).unwrap();
        runtime.register_plugin(LocationPlugin::new(Location::eppa_default()));

        let mut output = Vec::new();
        runtime.run_scripted(&mut output, std::iter::empty()).unwrap();
        let content = runtime.zone_content("eppa:location").unwrap();
        assert!(content.starts_with("Hotel Bourbon Joinville · Rua Visconde de Taunay"));
        assert!(content.contains("Ver no Mapa: https://www.google.com/maps/dir//"));
        assert!(String::from_utf8_lossy(&output).contains("Hotel Bourbon Joinville"));
    }
}
