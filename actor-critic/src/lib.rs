//! Convolutional-recurrent actor-critic network built on burn layer primitives.
//!
//! The crate defines topology only: training loops, optimizers, environments
//! and checkpointing are external collaborators.

pub mod module;
