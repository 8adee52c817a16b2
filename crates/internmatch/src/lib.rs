//! Seat allocation engine for internship placements.
//!
//! Candidates submit ranked (sector, role, location) preferences; opportunities
//! carry finite seat capacities and qualifying requirements. The [`placement`]
//! module scores every candidate/opportunity pairing, fills seats in score
//! order, waitlists the overflow, and cascades reallocation whenever an offer
//! is accepted or rejected.

pub mod config;
pub mod error;
pub mod placement;
pub mod telemetry;
