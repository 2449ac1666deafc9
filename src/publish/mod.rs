pub mod collaborators;
pub mod guard;
pub mod metadata;
