/// Upstream APIs: URL construction and boundary payload types.
pub mod blynk;
pub mod bmkg;
pub mod nominatim;
pub mod open_meteo;

#[cfg(test)]
pub(crate) mod fixtures;
