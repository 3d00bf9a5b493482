pub mod diff;
pub mod status_bar;
pub mod tree;
