pub mod dcps;
pub mod health;
pub mod live;
pub mod opcrs;
pub mod security;
pub mod users;
