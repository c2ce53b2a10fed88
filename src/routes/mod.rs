mod health_check;
mod send_guide;
mod subscribe;

pub use health_check::*;
pub use send_guide::*;
pub use subscribe::*;
