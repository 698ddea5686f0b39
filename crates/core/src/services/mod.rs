pub mod api_service;
pub mod data_service;
pub mod group_service;
pub mod message_service;
pub mod task_service;
