//! Views and the structural controllers that own them.
//!
//! A [`ViewFactory`](view::ViewFactory) holds compiled instructions; each
//! call to `create` yields an unbound [`View`](view::View) with one binding
//! or controller per instruction. Controllers place their child views in a
//! [`RenderSlot`](render_slot::RenderSlot).

pub mod diff;
pub mod if_controller;
pub mod render_slot;
pub mod repeat;
pub mod view;
