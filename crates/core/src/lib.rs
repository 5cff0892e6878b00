pub mod builder;
pub mod error;
pub mod export;
pub mod human;
pub mod logging;
pub mod model;
pub mod progress;
pub mod scanner;
pub mod search;
pub mod stats;

pub use builder::*;
pub use error::*;
pub use model::*;
pub use progress::*;
pub use scanner::*;
