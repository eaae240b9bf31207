//! Named routes over `/`-separated path templates.
//!
//! A [`router::Route`] describes one endpoint and leaves the match decision to
//! an injected [`router::RequestMatcher`]. Path segments starting with `:` are
//! named variables, e.g. `/users/:id`.

pub mod cli;
pub mod request;
pub mod router;
