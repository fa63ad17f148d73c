//! Terminal UI module using ratatui.
//!
//! This module provides the TUI rendering and input handling:
//!
//! - `render`: Main frame rendering, layout and overlays
//! - `input`: Keyboard event handling
//! - `prompt`: Blocking session renewal dialog
//! - `styles`: Color schemes and text styling
//! - `views`: Tab content and form dialogs (projects, access, account)

pub mod input;
pub mod prompt;
pub mod render;
pub mod styles;
pub mod views;
