//! Venue floor map: the area catalogue, the map view state and the plugin
//! that draws both into the page.

mod area;
mod model;
mod plugin;

pub use area::{Area, AreaCatalog, AreaIcon, CatalogError, Floor, PlateRect};
pub use model::{MapChange, MapViewState, SelectionSummary, VenueMap};
pub use plugin::{VenueMapPlugin, VenueZones, project_plate};
