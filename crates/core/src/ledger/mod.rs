pub mod bucket;
pub mod view;
