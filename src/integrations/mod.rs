//! External service integrations.

pub mod services {
    pub use crate::services::*;
}

pub mod submission_client {
    pub use crate::submission_client::*;
}
