pub mod derive;
pub mod noise;
pub mod random;
