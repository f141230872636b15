// Form logic shared by the host and library users
pub mod formatters {
    pub use crate::formatters::*;
}

pub mod models {
    pub use crate::models::*;
}

pub mod form_controller {
    pub use crate::form_controller::*;
}

pub mod submission {
    pub use crate::submission::*;
}

pub mod errors {
    pub use crate::errors::*;
}
