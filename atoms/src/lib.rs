pub mod media;
pub mod reports;
pub mod users;
