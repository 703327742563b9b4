//! Local-journalism "news desert" explorer for Latin America: dataset
//! model, hash-route resolution, peer aggregates, stripplot layout,
//! exports and static page generation, plus the braille map used by the
//! terminal front-end.

pub mod braille;
pub mod config;
pub mod data;
pub mod export;
pub mod labels;
pub mod logging;
pub mod map;
pub mod normalize;
pub mod route;
pub mod site;
pub mod stats;
pub mod stripplot;

#[cfg(test)]
mod testdata;
