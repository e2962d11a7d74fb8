mod compile;
mod digest;
mod resolve;
mod status;

pub use compile::cmd_compile;
pub use digest::cmd_digest;
pub use resolve::{ResolveTarget, cmd_resolve};
pub use status::cmd_status;
