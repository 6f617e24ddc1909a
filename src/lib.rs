pub mod fetch;
pub mod layout;
pub mod output;
pub mod publish;
pub mod reshape;
pub mod server;
pub mod table;
pub mod version;
