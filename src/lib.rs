//! Lantern - single-request static file responder
//!
//! Serves HTML and a handful of image types from a local directory, one
//! request per connection, rewriting `<cs371date>` and `<cs371server>` tags
//! in HTML output.

pub mod config;
pub mod http;
pub mod server;
