// Durable user store: the "Users" table behind PostgREST or a direct Postgres pool.

pub mod models;
pub mod repositories;

pub use models::user::{NewUser, UserEntity};
pub use repositories::user::UserStore;
