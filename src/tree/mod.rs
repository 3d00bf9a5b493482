pub mod cache;
pub mod controller;
pub mod merge;
pub mod node;
pub mod policy;
pub mod view;
