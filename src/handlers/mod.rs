pub mod game;
pub mod payment;
pub mod profile;
pub mod webhook;

pub use game::game_config;
pub use payment::payment_config;
pub use profile::profile_config;
pub use webhook::webhook_config;
