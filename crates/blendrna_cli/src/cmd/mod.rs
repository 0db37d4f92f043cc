/// Layout table summary command.
pub mod layout;
/// Stored instance read command.
pub mod read;
/// Member path resolution command.
pub mod resolve;
/// Manifest registration and accessor planning command.
pub mod schema;

mod util;

#[cfg(test)]
mod test_support;
