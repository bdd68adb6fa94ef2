pub mod flashcard;
pub mod history;
pub mod material;
pub mod schedule;

pub use flashcard::*;
pub use history::*;
pub use material::*;
pub use schedule::*;
