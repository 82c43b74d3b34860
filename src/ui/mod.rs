pub mod input;
pub mod pipe;
pub mod styles;
pub mod terminal;
pub mod view;
