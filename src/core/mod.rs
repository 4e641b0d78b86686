pub mod auth;
pub mod training;
pub mod zip_inspect;

pub use auth::AuthService;
pub use training::TrainingService;
