pub mod payment;
pub mod response;
pub mod settings;

pub use payment::*;
pub use response::*;
pub use settings::*;
