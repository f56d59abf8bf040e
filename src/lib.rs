//! Vetrina: conversion and cache-invalidation core for a headless content
//! delivery API.
//!
//! The crate maps polymorphic content entities into JSON-shaped DTOs
//! through pluggable, priority-ordered converters ([`convert`]), records
//! every content/site reference touched along the way, turns that record
//! into cacheability verdicts with deterministic ETags and exact
//! dependency-key sets, and evicts precisely those keys when the
//! repository mutates ([`cache`]).
//!
//! Persistence, authentication, and the HTTP transport are collaborators,
//! not residents: the core consumes them through the traits in
//! [`application::repos`] and exposes [`application::ContentDeliveryService`]
//! to whatever serves the wire.

pub mod application;
pub mod cache;
pub mod config;
pub mod convert;
pub mod domain;
