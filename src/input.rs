//! Loaders for the four input files.

mod cities;
mod geo;
mod states;

pub use cities::{CityRow, load_cities, read_cities};
pub use geo::{GeoDocument, load_geojson};
pub use states::{StateRow, load_states, read_states};

use crate::Result;
use crate::config::InputFiles;

/// Everything the map is built from.
#[derive(Debug, Clone)]
pub struct Inputs {
    pub cities: Vec<CityRow>,
    pub states: Vec<StateRow>,
    pub states_geo: GeoDocument,
    pub oceans: GeoDocument,
}

impl Inputs {
    pub fn load(files: &InputFiles) -> Result<Self> {
        let cities = load_cities(&files.cities)?;
        tracing::debug!(rows = cities.len(), path = %files.cities.display(), "loaded cities");

        let states = load_states(&files.states)?;
        tracing::debug!(rows = states.len(), path = %files.states.display(), "loaded states");

        let states_geo = load_geojson(&files.states_geo)?;
        let oceans = load_geojson(&files.oceans)?;
        tracing::debug!(
            state_features = states_geo.features().len(),
            ocean_features = oceans.features().len(),
            "loaded geometry"
        );

        Ok(Self {
            cities,
            states,
            states_geo,
            oceans,
        })
    }
}
