//! # Presentation Surfaces
//!
//! The two ways content reaches a page: inline tags expanded inside a text
//! body, and saved sidebar widgets.

pub mod shortcode;
pub mod widget;

pub use shortcode::{expand, render_shortcode};
pub use widget::{WidgetChrome, WidgetSettings, render_widget};
