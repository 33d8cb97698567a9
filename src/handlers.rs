mod common;
mod stream;

pub use common::{health, root};
pub use stream::get_stream;
