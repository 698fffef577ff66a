mod note;
mod session;
mod user;

pub use note::*;
pub use session::*;
pub use user::*;
