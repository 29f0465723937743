pub mod confusion;
pub mod hierarchy;
pub mod skill;
