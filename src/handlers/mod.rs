pub mod health;
pub mod payments;
pub mod settings;
pub mod statistics;

pub use health::*;
pub use payments::*;
pub use settings::*;
pub use statistics::*;
