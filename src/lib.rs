pub mod config;
pub mod error;
pub mod observability;
pub mod router;
pub mod state;

pub mod crypto {
    pub mod hmac;
    pub mod params;
    pub mod signer;
}

pub mod handlers {
    pub mod service;
    pub mod subscription;
}

pub mod provider {
    pub mod client;
    pub mod request;
    pub mod target;
}
