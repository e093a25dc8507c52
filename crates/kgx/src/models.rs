//! These models represent the values passed between the pipeline stages and the model gateway
//!
//! A [`triple::Triple`] is the only domain entity. A [`message::Message`] is built fresh for every
//! model call and never outlives it.
pub mod message;
pub mod triple;
