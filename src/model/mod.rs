pub mod character;
pub mod journey;
pub mod message;
pub mod participant;
pub mod scenario;
pub mod skills;
pub mod survey;
