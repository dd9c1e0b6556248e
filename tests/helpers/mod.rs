#![allow(dead_code)]

pub mod mock_config;
pub mod mock_stores;
