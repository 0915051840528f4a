//! Pure simulation logic for Hamlet.
//!
//! This crate contains the village rules that are independent of any ECS,
//! renderer, or runtime. Functions take plain data plus an injected random
//! number generator and return plain data, which keeps them unit-testable
//! and deterministic under a fixed seed.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`beds`] | Non-overlapping sleep slots inside a building footprint |
//! | [`building`] | Size classes, building types, occupancy caps, footprints |
//! | [`clock`] | 24-hour world clock, day periods, light and shadow curves |
//! | [`config`] | Simulation configuration loaded from JSON |
//! | [`geometry`] | 2D points and rectangles in pixel space |
//! | [`housing`] | Home/workplace allocation, external workplaces, house naming |
//! | [`jobs`] | Villager roles, workplace table, activity catalogs, sleep windows |
//! | [`schedule`] | Daily activity schedules with the home activity last |

pub mod beds;
pub mod building;
pub mod clock;
pub mod config;
pub mod geometry;
pub mod housing;
pub mod jobs;
pub mod schedule;
