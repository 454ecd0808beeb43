//! Coursedeck - session gateway and course proxy in front of a headless CMS
//!
//! This library provides the HTTP layer, the CMS client and the services
//! that sit between the course frontend and the CMS.

pub mod api;
pub mod cms;
pub mod config;
pub mod guard;
pub mod models;
pub mod services;
