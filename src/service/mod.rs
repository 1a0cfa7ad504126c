pub mod relay_service;
pub mod transcoder;
