pub mod media_service;
pub mod object_store;
