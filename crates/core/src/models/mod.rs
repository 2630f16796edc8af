pub mod budget;
pub mod item;
pub mod record;
pub mod settings;
pub mod stats;
