//! Charts module - Static chart rendering

mod renderer;

pub use renderer::{
    ChartRenderer, COMPARISON_FILE, DISTRIBUTION_FILE, TOP_COUNTRIES_FILE, TRENDS_FILE,
};
