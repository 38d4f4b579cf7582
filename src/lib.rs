pub mod config;
pub mod database;
pub mod export;
pub mod models;

pub use config::AppConfig;
pub use models::{Attempt, Card, Category, QuizMode, QuizSession, StatsReport};
