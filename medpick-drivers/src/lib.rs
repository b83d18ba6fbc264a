//! Hardware driver implementations
//!
//! This crate provides concrete implementations of the traits defined
//! in medpick-core on top of `embedded-hal` 1.0:
//!
//! - Step/dir stepper drivers (A4988, DRV8825, TMC2209 in standalone mode)
//! - Mechanical and optical limit switches

#![no_std]
#![deny(unsafe_code)]

pub mod sensor;
pub mod stepper;
