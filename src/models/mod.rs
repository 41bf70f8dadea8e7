pub mod bet;
pub mod common;
pub mod payment;
pub mod profile;
pub mod transaction;
pub mod wager;

pub use bet::*;
pub use common::*;
pub use payment::*;
pub use profile::*;
pub use transaction::*;
pub use wager::*;
