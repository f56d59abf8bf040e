//! Application layer: collaborator traits and the delivery facade.

pub mod delivery;
pub mod repos;

pub use delivery::{ContentDeliveryService, DeliveryParts};
pub use repos::{AccessChecker, ContentRepo, SiteRepo};
