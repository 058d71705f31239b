//! Property and collection change notification.

pub mod collection_observer;
pub mod observer_locator;
pub mod property_observer;
pub mod subscriber;
