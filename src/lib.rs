pub mod error;
pub mod export;
pub mod images;
pub mod local;
pub mod model;
pub mod normalize;
pub mod remote;
pub mod session;
pub mod store;
