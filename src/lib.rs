mod config;
mod envelopes;
mod instruments;
#[cfg(feature = "live")]
mod live;
mod modifier;
mod signal;
#[cfg(feature = "wav")]
mod wav;

pub use config::*;
pub use envelopes::*;
pub use instruments::*;
#[cfg(feature = "live")]
pub use live::*;
pub use modifier::*;
pub use signal::*;
#[cfg(feature = "wav")]
pub use wav::*;
