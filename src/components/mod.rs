pub mod widget;
pub mod window;
