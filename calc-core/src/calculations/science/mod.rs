pub mod decay;
pub mod physics;
