//! # Built-in Theory Models
//!
//! Reference implementations of the model plug-in contract. User models
//! live outside the crate and join the registry through
//! [`register_model`](crate::theories::register_model) or
//! [`register_fn`](crate::theories::register_fn); the models here ship
//! pre-registered.
//!
//! - [`WilsonLt`] - modified classical laminate theory for circular
//!   biaxial flexure disks, registered as `"wilson_lt"`.

pub mod wilson_lt;

pub use wilson_lt::WilsonLt;
