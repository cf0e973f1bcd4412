pub mod energy_source;
pub mod forecast;
pub mod reading;
pub mod timestamp;

pub use energy_source::{parse_sources, EnergySource};
pub use forecast::{DailyAverage, ForecastPoint};
pub use reading::{Reading, ReadingTable};
