pub mod mailer;
pub mod pagseguro;

pub use mailer::*;
pub use pagseguro::*;
