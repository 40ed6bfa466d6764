//! Bearer-token models, token providers, and the cached authentication state.

pub mod oauth;
pub mod provider;
pub mod state;
pub mod token;

pub use oauth::*;
pub use provider::*;
pub use state::*;
pub use token::*;
