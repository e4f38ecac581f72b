//! Viewer data structures: models, textures and instances.
//!
//! This module contains the core data types for scene representation:
//!
//! - `model` contains mesh and PBR material definitions, GPU resources for 3D models
//! - `texture` contains GPU texture wrapper and creation utilities
//! - `instance` holds the placement of the displayed model

pub mod instance;
pub mod model;
pub mod texture;
