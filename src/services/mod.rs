pub mod bet_service;
pub mod payment_service;
pub mod profile_service;
pub mod wager_service;

pub use bet_service::*;
pub use payment_service::*;
pub use profile_service::*;
pub use wager_service::*;
