mod coach;
mod init;
mod session;
mod sync;

pub use coach::execute_coach;
pub use init::execute_init;
pub use session::{
    execute_login, execute_logout, execute_register, execute_reset_password, execute_status,
};
pub use sync::execute_sync;
