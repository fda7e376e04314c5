pub mod places;
pub mod tavily;
pub mod unavailable;

pub use places::GooglePlacesLookup;
pub use tavily::TavilySearch;
pub use unavailable::Unavailable;
