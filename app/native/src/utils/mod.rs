//! Small helpers shared by the gateway and the icon resolver.

pub mod path;
