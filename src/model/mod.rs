mod player;
mod team;
mod tournament;

pub use player::*;
pub use team::*;
pub use tournament::*;
