pub mod ranges;
pub mod split;
