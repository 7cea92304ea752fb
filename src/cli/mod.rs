pub mod args;

pub use args::{ActionArgs, ActionServer, Args, BatchArgs, BitbucketArgs, Command, ExportArgs};
