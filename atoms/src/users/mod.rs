pub mod model;

pub use model::Principal;
