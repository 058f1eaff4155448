/// General command and message handlers
pub mod handlers;
