//! Registration flow — state machine, lexicon, prompts, and registry.

pub mod lexicon;
pub mod machine;
pub mod model;
pub mod prompts;
pub mod registry;
pub mod signin;
pub mod state;

pub use machine::Outcome;
pub use model::UserRegistration;
pub use prompts::Prompts;
pub use registry::Registry;
pub use signin::SigninLinks;
pub use state::RegistrationState;
