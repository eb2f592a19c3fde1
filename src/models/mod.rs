pub mod profile;
pub mod recommendation;
pub mod search;
pub mod session;
pub mod trip;
pub mod user;
