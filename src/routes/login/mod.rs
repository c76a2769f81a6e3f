mod handler;
mod model;

pub use handler::{external_callback, facebook_login, login_page, logout};
pub use model::{CallbackQuery, FacebookLoginRequest, FacebookLoginResponse, LoginPageQuery, LoginPageResponse};

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";
