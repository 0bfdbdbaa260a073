pub mod check;
pub mod preview;
pub mod schema;
pub mod score;
pub mod signals;
