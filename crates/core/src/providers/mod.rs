pub mod traits;

pub mod http_source;
pub mod mock_assistant;
pub mod directory_source;
