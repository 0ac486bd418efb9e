pub mod errors;
pub mod events;
pub mod interaction;
pub mod models;
pub mod providers;
pub mod runs;
pub mod validation;
