pub mod intake_api_client;

pub use intake_api_client::IntakeApiClient;
