//! Terminal UI module using ratatui.
//!
//! - `render`: Frame layout for each route and the modal overlays
//! - `input`: Keyboard event handling
//! - `styles`: Color palette and text styling
//! - `screens`: Content of the pages reachable from the drawer

pub mod input;
pub mod render;
pub mod screens;
pub mod styles;
