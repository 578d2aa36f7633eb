pub mod errors;
pub mod modules;
pub mod polling;
pub mod routes {
    pub mod proxy;
    pub mod api {
        pub mod kart;
        pub mod session;
    }
}
