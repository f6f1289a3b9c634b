//! Small support structures.

pub mod btree;

pub use btree::BTree;
