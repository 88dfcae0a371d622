mod fauna;
mod flora;
mod weather;

pub use fauna::FaunaSystem;
pub use flora::FloraSystem;
pub use weather::WeatherSystem;
