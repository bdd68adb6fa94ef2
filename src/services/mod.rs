pub mod cards;
pub mod oracle;
pub mod recall;
pub mod scheduler;
